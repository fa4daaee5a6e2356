use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{Result, TailwindCliError};

/// File names looked up in the working directory when no settings file is given
pub const SETTINGS_FILE_NAMES: [&str; 3] = ["tailwind-cli.yaml", "tailwind-cli.yml", "tailwind-cli.json"];

/// Raw, flat settings as supplied by the project.
///
/// `None` means "not configured" for optional keys. An empty string is an
/// explicit but invalid value and is rejected when the [`Config`] is built.
///
/// [`Config`]: crate::config::Config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Version specifier: a semantic version or `latest`
    pub version: String,

    /// GitHub repository publishing the CLI releases
    pub src_repo: Option<String>,

    /// Base name of the release assets
    pub asset_name: Option<String>,

    /// Directory for managed downloads, or the path of a pre-installed CLI
    pub cli_path: Option<PathBuf>,

    /// Download the CLI when it is missing
    pub automatic_download: bool,

    /// Source stylesheet, relative to the first static files directory
    pub src_css: Option<String>,

    /// Output stylesheet, relative to the first static files directory
    pub dist_css: Option<String>,

    /// Tailwind 3.x config file, relative to the base directory
    pub config_file: Option<String>,

    /// Add the daisyUI plugin to the generated source stylesheet
    pub use_daisy_ui: bool,

    /// Project root, defaults to the working directory
    pub base_dir: Option<PathBuf>,

    /// Static files directories; the first one receives the stylesheets
    pub staticfiles_dirs: Vec<PathBuf>,

    /// Template directories scanned by `list_templates`
    pub template_dirs: Vec<PathBuf>,

    /// Development server started next to the watcher by `runserver`
    pub server_command: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: "latest".to_string(),
            src_repo: Some("tailwindlabs/tailwindcss".to_string()),
            asset_name: Some("tailwindcss".to_string()),
            cli_path: Some(PathBuf::from("~/.local/bin/")),
            automatic_download: true,
            src_css: None,
            dist_css: Some("css/tailwind.css".to_string()),
            config_file: None,
            use_daisy_ui: false,
            base_dir: None,
            staticfiles_dirs: Vec::new(),
            template_dirs: Vec::new(),
            server_command: vec![
                "python".to_string(),
                "manage.py".to_string(),
                "runserver".to_string(),
            ],
        }
    }
}

/// Values given on the command line or through `TAILWIND_CLI_*` variables.
/// Every `Some` replaces the corresponding settings value.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub version: Option<String>,
    pub src_repo: Option<String>,
    pub asset_name: Option<String>,
    pub cli_path: Option<PathBuf>,
    pub automatic_download: Option<bool>,
    pub src_css: Option<String>,
    pub dist_css: Option<String>,
    pub config_file: Option<String>,
    pub use_daisy_ui: Option<bool>,
    pub base_dir: Option<PathBuf>,
    pub staticfiles_dirs: Vec<PathBuf>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = read_settings_file(path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            TailwindCliError::config(format!("Failed to parse YAML settings {}: {}", path.display(), e))
        })
    }

    /// Load settings from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = read_settings_file(path)?;
        serde_json::from_str(&content).map_err(|e| {
            TailwindCliError::config(format!("Failed to parse JSON settings {}: {}", path.display(), e))
        })
    }

    /// Load settings from a file (auto-detect format)
    pub fn from_file(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(TailwindCliError::config(format!(
                "Unsupported settings file format: {}. Use .yaml, .yml, or .json",
                path.display()
            ))),
        }
    }

    /// Load the explicit settings file, or the first well-known file found in
    /// `dir`, or fall back to the defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "Loading settings file");
            return Self::from_file(path);
        }

        for name in SETTINGS_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "Found settings file");
                return Self::from_file(&candidate);
            }
        }

        debug!("No settings file found, using defaults");
        Ok(Self::default())
    }

    /// Apply command-line / environment overrides
    pub fn merge(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(version) = overrides.version {
            self.version = version;
        }
        if overrides.src_repo.is_some() {
            self.src_repo = overrides.src_repo;
        }
        if overrides.asset_name.is_some() {
            self.asset_name = overrides.asset_name;
        }
        if overrides.cli_path.is_some() {
            self.cli_path = overrides.cli_path;
        }
        if let Some(automatic_download) = overrides.automatic_download {
            self.automatic_download = automatic_download;
        }
        if overrides.src_css.is_some() {
            self.src_css = overrides.src_css;
        }
        if overrides.dist_css.is_some() {
            self.dist_css = overrides.dist_css;
        }
        if overrides.config_file.is_some() {
            self.config_file = overrides.config_file;
        }
        if let Some(use_daisy_ui) = overrides.use_daisy_ui {
            self.use_daisy_ui = use_daisy_ui;
        }
        if overrides.base_dir.is_some() {
            self.base_dir = overrides.base_dir;
        }
        if !overrides.staticfiles_dirs.is_empty() {
            self.staticfiles_dirs = overrides.staticfiles_dirs;
        }

        self
    }
}

fn read_settings_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        TailwindCliError::config(format!("Failed to read settings file {}: {}", path.display(), e))
    })
}
