use semver::Version;
use std::path::{Path, PathBuf};

use crate::errors::{Result, TailwindCliError};
use crate::settings::Settings;
use crate::version::VersionSpec;

/// Default source stylesheet for Tailwind CSS 4.x
pub const DEFAULT_SRC_CSS: &str = "css/source.css";

/// Default config file for Tailwind CSS 3.x
pub const DEFAULT_CONFIG_FILE: &str = "tailwind.config.js";

/// Validated configuration, built once per command invocation and passed
/// explicitly to every component.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Requested version
    pub version: VersionSpec,

    /// Repository publishing the releases, e.g. `tailwindlabs/tailwindcss`
    pub src_repo: String,

    /// Release asset base name, e.g. `tailwindcss`
    pub asset_name: String,

    /// Managed download directory or pre-installed binary (`~` expanded)
    pub cli_path: PathBuf,

    pub automatic_download: bool,

    /// Configured source stylesheet, relative to the static directory
    pub src_css: Option<String>,

    /// Output stylesheet, relative to the static directory
    pub dist_css: String,

    /// Configured legacy config file, relative to the base directory
    pub config_file: Option<String>,

    pub use_daisy_ui: bool,

    pub base_dir: PathBuf,

    /// First static files directory, receives the stylesheets
    pub static_dir: PathBuf,

    pub template_dirs: Vec<PathBuf>,

    /// Also scan `<base_dir>/*/templates`, set when no template
    /// directories are configured
    pub app_templates: bool,

    pub server_command: Vec<String>,
}

/// Stylesheet and config file locations for a concrete major version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssLayout {
    pub major: u64,
    pub src_css: Option<PathBuf>,
    pub dist_css: PathBuf,
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Validate and normalise raw settings.
    ///
    /// Pure: no network access and no filesystem access. Version-dependent
    /// rules are checked here for pinned versions and again by
    /// [`Config::layout`] once `latest` has been resolved.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let version: VersionSpec = settings.version.parse()?;

        let src_repo = required(settings.src_repo, "src_repo")?;
        let asset_name = required(settings.asset_name, "asset_name")?;
        let dist_css = required(settings.dist_css, "dist_css")?;

        let base_dir = settings.base_dir.unwrap_or_else(|| PathBuf::from("."));

        let static_dir = settings
            .staticfiles_dirs
            .first()
            .map(|dir| base_dir.join(dir))
            .ok_or_else(|| {
                TailwindCliError::config(
                    "staticfiles_dirs is empty. Please add a path to your static files.",
                )
            })?;

        let cli_path = match settings.cli_path {
            Some(path) => expand_home(&path),
            None => base_dir.clone(),
        };

        let app_templates = settings.template_dirs.is_empty();
        let template_dirs = if app_templates {
            vec![base_dir.join("templates")]
        } else {
            settings.template_dirs.iter().map(|dir| base_dir.join(dir)).collect()
        };

        let config = Self {
            version,
            src_repo,
            asset_name,
            cli_path,
            automatic_download: settings.automatic_download,
            src_css: settings.src_css,
            dist_css,
            config_file: settings.config_file,
            use_daisy_ui: settings.use_daisy_ui,
            base_dir,
            static_dir,
            template_dirs,
            app_templates,
            server_command: settings.server_command,
        };

        if let VersionSpec::Pinned(version) = &config.version {
            config.layout(version)?;
        }

        Ok(config)
    }

    /// Stylesheet locations for `version`.
    ///
    /// Tailwind CSS 4.x needs a source stylesheet and rejects the legacy
    /// config file; 3.x needs the config file and treats the source
    /// stylesheet as optional.
    pub fn layout(&self, version: &Version) -> Result<CssLayout> {
        let dist_css = self.static_dir.join(&self.dist_css);

        if version.major >= 4 {
            if self.config_file.is_some() {
                return Err(TailwindCliError::config(
                    "config_file is not used with Tailwind CSS >= 4.x. Remove it and configure \
                     Tailwind in the source stylesheet instead.",
                ));
            }
            let src_css = match self.src_css.as_deref() {
                None => DEFAULT_SRC_CSS,
                Some("") => return Err(TailwindCliError::config("src_css must not be empty.")),
                Some(src_css) => src_css,
            };

            Ok(CssLayout {
                major: version.major,
                src_css: Some(self.static_dir.join(src_css)),
                dist_css,
                config_file: None,
            })
        } else {
            let config_file = match self.config_file.as_deref() {
                None => DEFAULT_CONFIG_FILE,
                Some("") => return Err(TailwindCliError::config("config_file must not be empty.")),
                Some(config_file) => config_file,
            };
            let src_css = self
                .src_css
                .as_deref()
                .filter(|src_css| !src_css.is_empty())
                .map(|src_css| self.static_dir.join(src_css));

            Ok(CssLayout {
                major: version.major,
                src_css,
                dist_css,
                config_file: Some(self.base_dir.join(config_file)),
            })
        }
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(TailwindCliError::config(format!("{} must not be empty.", key))),
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
