use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::settings::SettingsOverrides;

/// Tailwind CSS CLI manager - downloads the standalone Tailwind CSS CLI and
/// builds or watches the stylesheets of a Django project
#[derive(Parser, Debug)]
#[command(name = "tailwind")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a minified production stylesheet
    Build(BuildArgs),
    /// Rebuild the stylesheet whenever templates or sources change
    Watch(WatchArgs),
    /// Download the Tailwind CSS CLI, replacing a managed copy
    #[command(name = "download_cli", alias = "download-cli")]
    DownloadCli,
    /// Remove the managed Tailwind CSS CLI
    #[command(name = "remove_cli", alias = "remove-cli")]
    RemoveCli,
    /// List the templates of the project
    #[command(name = "list_templates", alias = "list-templates")]
    ListTemplates(ListTemplatesArgs),
    /// Run the development server and the watcher side by side
    Runserver(RunserverArgs),
}

/// Settings given on the command line. Each flag can also be set through
/// its `TAILWIND_CLI_*` environment variable.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Settings file (YAML or JSON)
    #[arg(long = "settings", value_name = "PATH", env = "TAILWIND_CLI_SETTINGS", global = true)]
    pub settings_file: Option<PathBuf>,

    /// Tailwind CSS version, a semantic version or `latest`
    #[arg(long = "tailwind-version", value_name = "VERSION", env = "TAILWIND_CLI_VERSION", global = true)]
    pub tailwind_version: Option<String>,

    /// Repository publishing the CLI releases
    #[arg(long, value_name = "OWNER/REPO", env = "TAILWIND_CLI_SRC_REPO", global = true)]
    pub src_repo: Option<String>,

    /// Base name of the release assets
    #[arg(long, value_name = "NAME", env = "TAILWIND_CLI_ASSET_NAME", global = true)]
    pub asset_name: Option<String>,

    /// Download directory, or path of a pre-installed CLI
    #[arg(long, value_name = "PATH", env = "TAILWIND_CLI_PATH", global = true)]
    pub cli_path: Option<PathBuf>,

    /// Download the CLI when it is missing
    #[arg(
        long,
        value_name = "BOOL",
        env = "TAILWIND_CLI_AUTOMATIC_DOWNLOAD",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub automatic_download: Option<bool>,

    /// Source stylesheet, relative to the first static files directory
    #[arg(long, value_name = "PATH", env = "TAILWIND_CLI_SRC_CSS", global = true)]
    pub src_css: Option<String>,

    /// Output stylesheet, relative to the first static files directory
    #[arg(long, value_name = "PATH", env = "TAILWIND_CLI_DIST_CSS", global = true)]
    pub dist_css: Option<String>,

    /// Tailwind CSS 3.x config file, relative to the base directory
    #[arg(long, value_name = "PATH", env = "TAILWIND_CLI_CONFIG_FILE", global = true)]
    pub config_file: Option<String>,

    /// Add the daisyUI plugin to a new source stylesheet
    #[arg(
        long,
        value_name = "BOOL",
        env = "TAILWIND_CLI_USE_DAISY_UI",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub use_daisy_ui: Option<bool>,

    /// Project root
    #[arg(long, value_name = "PATH", env = "TAILWIND_CLI_BASE_DIR", global = true)]
    pub base_dir: Option<PathBuf>,

    /// Static files directories, comma separated
    #[arg(
        long = "staticfiles-dirs",
        value_name = "PATHS",
        env = "TAILWIND_CLI_STATICFILES_DIRS",
        value_delimiter = ',',
        global = true
    )]
    pub staticfiles_dirs: Vec<PathBuf>,
}

impl SettingsArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            version: self.tailwind_version.clone(),
            src_repo: self.src_repo.clone(),
            asset_name: self.asset_name.clone(),
            cli_path: self.cli_path.clone(),
            automatic_download: self.automatic_download,
            src_css: self.src_css.clone(),
            dist_css: self.dist_css.clone(),
            config_file: self.config_file.clone(),
            use_daisy_ui: self.use_daisy_ui,
            base_dir: self.base_dir.clone(),
            staticfiles_dirs: self.staticfiles_dirs.clone(),
        }
    }
}

/// Arguments for the build command
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Build even when the output is newer than its sources
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// Arguments for the watch command
#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Enable verbose output
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// Arguments for the list_templates command
#[derive(Args, Debug, Clone, Default)]
pub struct ListTemplatesArgs {
    /// Show the scanned directories and scan errors
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// Arguments for the runserver command, forwarded to the server command
#[derive(Args, Debug, Clone, Default)]
pub struct RunserverArgs {
    /// Optional port number, or ipaddr:port
    #[arg(value_name = "ADDRPORT")]
    pub addrport: Option<String>,

    /// Use an IPv6 address
    #[arg(short = '6', long)]
    pub ipv6: bool,

    /// Disable threading in the development server
    #[arg(long)]
    pub nothreading: bool,

    /// Do not serve static files
    #[arg(long)]
    pub nostatic: bool,

    /// Disable the auto-reloader
    #[arg(long)]
    pub noreload: bool,

    /// Skip system checks
    #[arg(long)]
    pub skip_checks: bool,
}

impl RunserverArgs {
    /// Extra arguments appended to the configured server command
    pub fn server_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.ipv6 {
            args.push("--ipv6".to_string());
        }
        if self.nothreading {
            args.push("--nothreading".to_string());
        }
        if self.nostatic {
            args.push("--nostatic".to_string());
        }
        if self.noreload {
            args.push("--noreload".to_string());
        }
        if self.skip_checks {
            args.push("--skip-checks".to_string());
        }
        if let Some(addrport) = &self.addrport {
            args.push(addrport.clone());
        }
        args
    }
}

impl Commands {
    /// The command asked for verbose output
    pub fn verbose(&self) -> bool {
        match self {
            Self::Build(args) => args.verbose,
            Self::Watch(args) => args.verbose,
            Self::ListTemplates(args) => args.verbose,
            Self::DownloadCli | Self::RemoveCli | Self::Runserver(_) => false,
        }
    }
}
