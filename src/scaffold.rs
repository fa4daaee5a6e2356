//! Default source stylesheet and config file for new projects.
//!
//! Files are only ever created. Anything already on disk belongs to the
//! project and is left untouched.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::CssLayout;
use crate::errors::{Result, TailwindCliError};

/// Source stylesheet for Tailwind CSS 4.x
pub const DEFAULT_SOURCE_CSS: &str = "@import \"tailwindcss\";\n";

/// Source stylesheet for Tailwind CSS 4.x with the daisyUI plugin
pub const DAISY_UI_SOURCE_CSS: &str = "@import \"tailwindcss\";\n@plugin \"daisyui\";\n";

/// Source stylesheet for Tailwind CSS 3.x
pub const LEGACY_SOURCE_CSS: &str = "@tailwind base;\n@tailwind components;\n@tailwind utilities;\n";

/// `tailwind.config.js` for Tailwind CSS 3.x
pub const LEGACY_CONFIG_JS: &str = r#"/** @type {import('tailwindcss').Config} */
const plugin = require("tailwindcss/plugin");

module.exports = {
  content: ["./templates/**/*.html", "./**/templates/**/*.html"],
  theme: {
    extend: {},
  },
  plugins: [
    plugin(function ({ addVariant }) {
      addVariant("htmx-settling", ["&.htmx-settling", ".htmx-settling &"]);
      addVariant("htmx-request", ["&.htmx-request", ".htmx-request &"]);
      addVariant("htmx-swapping", ["&.htmx-swapping", ".htmx-swapping &"]);
      addVariant("htmx-added", ["&.htmx-added", ".htmx-added &"]);
    }),
  ],
};
"#;

/// What happened to one scaffold file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldOutcome {
    Created(PathBuf),
    Kept(PathBuf),
}

impl ScaffoldOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(path) | Self::Kept(path) => path,
        }
    }
}

/// Source stylesheet template for a major version
pub fn source_css_template(major: u64, use_daisy_ui: bool) -> &'static str {
    match (major >= 4, use_daisy_ui) {
        (true, true) => DAISY_UI_SOURCE_CSS,
        (true, false) => DEFAULT_SOURCE_CSS,
        (false, _) => LEGACY_SOURCE_CSS,
    }
}

/// Create the missing scaffold files for `layout`.
///
/// Covers the legacy config file (3.x only, as [`CssLayout`] never carries
/// one for 4.x) and the source stylesheet when the layout has one.
pub fn ensure_scaffold(layout: &CssLayout, use_daisy_ui: bool) -> Result<Vec<ScaffoldOutcome>> {
    let mut outcomes = Vec::new();

    if let Some(config_file) = &layout.config_file {
        outcomes.push(create_if_missing(config_file, LEGACY_CONFIG_JS)?);
    }

    if let Some(src_css) = &layout.src_css {
        let template = source_css_template(layout.major, use_daisy_ui);
        outcomes.push(create_if_missing(src_css, template)?);
    }

    Ok(outcomes)
}

/// Write `content` to `path` unless the file exists.
pub fn create_if_missing(path: &Path, content: &str) -> Result<ScaffoldOutcome> {
    let write_error = |source: io::Error| TailwindCliError::ScaffoldWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            debug!(path = %path.display(), "Keeping existing file");
            return Ok(ScaffoldOutcome::Kept(path.to_path_buf()));
        }
        Err(e) => return Err(write_error(e)),
    };

    file.write_all(content.as_bytes()).map_err(write_error)?;
    debug!(path = %path.display(), "Created default file");
    Ok(ScaffoldOutcome::Created(path.to_path_buf()))
}
