pub mod args;
pub mod commands;
pub mod config;
pub mod errors;
pub mod http;
pub mod installer;
pub mod platform;
pub mod process;
pub mod scaffold;
pub mod settings;
pub mod templates;
pub mod version;

pub use args::{Cli, Commands};
pub use commands::{CliInvocation, Mode};
pub use config::{Config, CssLayout};
pub use errors::{Result, TailwindCliError};
pub use http::{GithubReleases, ReleaseClient};
pub use installer::{
    BinaryLocation, BinaryVerifier, DownloadPolicy, HelpFlagVerifier, InstallMode, InstallState,
    Installer, Removal,
};
pub use platform::{Host, PlatformTag};
pub use process::{BuildOutput, ProcessManager};
pub use scaffold::ScaffoldOutcome;
pub use settings::{Settings, SettingsOverrides};
pub use templates::TemplateScan;
pub use version::{ResolvedVersion, VersionOrigin, VersionSpec};

use std::time::Duration;
use tracing::debug;

/// Delay between starting the watcher and the development server
const SERVER_START_DELAY: Duration = Duration::from_secs(1);

/// Configuration, version and stylesheet layout of one command invocation
#[derive(Debug, Clone)]
pub struct Session {
    pub config: Config,
    pub version: ResolvedVersion,
    pub layout: CssLayout,
}

impl Session {
    /// Validate `settings` and resolve the version to use.
    ///
    /// With a pre-installed binary `latest` is not looked up; the layout is
    /// derived from [`ResolvedVersion::assumed`] instead.
    pub fn open(settings: Settings, installer: &Installer<'_>) -> Result<Self> {
        let config = Config::from_settings(settings)?;

        let version = match (&config.version, installer.pre_installed(&config)) {
            (VersionSpec::Latest, Some(location)) => {
                debug!(path = %location.path.display(), "Pre-installed CLI, not resolving latest");
                ResolvedVersion::assumed()
            }
            _ => version::resolve(&config, installer.client()),
        };

        let layout = config.layout(&version.version)?;
        Ok(Self {
            config,
            version,
            layout,
        })
    }

    /// Locate the binary, downloading it according to the configuration
    pub fn ensure_binary(&self, installer: &Installer<'_>) -> Result<BinaryLocation> {
        installer.ensure(&self.config, &self.version, DownloadPolicy::from_config(&self.config))
    }

    /// Create the missing source stylesheet and config file
    pub fn scaffold(&self) -> Result<Vec<ScaffoldOutcome>> {
        scaffold::ensure_scaffold(&self.layout, self.config.use_daisy_ui)
    }
}

/// Whether a build ran
#[derive(Debug)]
pub enum BuildOutcome {
    Built(BuildOutput),
    /// The output stylesheet is newer than its sources
    UpToDate,
}

/// Result of the build command
#[derive(Debug)]
pub struct BuildReport {
    pub location: BinaryLocation,
    pub invocation: CliInvocation,
    pub scaffolded: Vec<ScaffoldOutcome>,
    pub outcome: BuildOutcome,
}

/// Build the production stylesheet
pub fn build(session: &Session, installer: &Installer<'_>, force: bool) -> Result<BuildReport> {
    let location = session.ensure_binary(installer)?;
    let scaffolded = session.scaffold()?;
    let invocation =
        CliInvocation::build(&location.path, &session.layout, &session.config.base_dir);

    let outcome = if force || commands::should_rebuild(&session.layout) {
        BuildOutcome::Built(process::run_build(&invocation)?)
    } else {
        debug!(output = %session.layout.dist_css.display(), "Output is up to date");
        BuildOutcome::UpToDate
    };

    Ok(BuildReport {
        location,
        invocation,
        scaffolded,
        outcome,
    })
}

/// Install the binary and scaffold files and return the watch invocation.
///
/// Runs before any async runtime exists, the installer uses blocking HTTP.
pub fn prepare_watch(session: &Session, installer: &Installer<'_>) -> Result<CliInvocation> {
    let location = session.ensure_binary(installer)?;
    session.scaffold()?;
    Ok(CliInvocation::watch(&location.path, &session.layout, &session.config.base_dir))
}

/// Download the binary even when a managed copy exists
pub fn download_cli(session: &Session, installer: &Installer<'_>) -> Result<BinaryLocation> {
    installer.ensure(&session.config, &session.version, DownloadPolicy::Force)
}

/// Remove the managed binary
pub fn remove_cli(session: &Session, installer: &Installer<'_>) -> Result<Removal> {
    installer.remove(&session.config, &session.version)
}

/// Find the templates in the configured template directories, plus the
/// per-app `templates` directories when none are configured
pub fn list_templates(config: &Config) -> Result<TemplateScan> {
    let mut dirs = config.template_dirs.clone();
    if config.app_templates {
        dirs.extend(templates::app_template_dirs(&config.base_dir)?);
    }
    templates::scan_templates(&dirs)
}

/// Development server command with the extra runserver arguments appended
pub fn server_command(config: &Config, extra_args: &[String]) -> Result<tokio::process::Command> {
    let (program, args) = config
        .server_command
        .split_first()
        .ok_or_else(|| TailwindCliError::config("server_command must not be empty."))?;

    let mut command = tokio::process::Command::new(program);
    command.args(args).args(extra_args).current_dir(&config.base_dir);
    Ok(command)
}

/// Run the watcher and the development server until Ctrl-C or until one
/// of them fails.
pub async fn runserver(watch: &CliInvocation, server: tokio::process::Command) -> Result<()> {
    let mut manager = ProcessManager::new();
    manager.spawn("tailwind watch", watch.async_command())?;
    tokio::time::sleep(SERVER_START_DELAY).await;
    manager.spawn("development server", server)?;
    manager.supervise().await
}
