//! Argument sets for invoking the Tailwind CSS CLI.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::CssLayout;

/// One-shot build or continuous watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Build,
    Watch,
}

/// Program, arguments and working directory of a Tailwind CSS CLI run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Project root; content globs and source detection resolve against it
    pub working_dir: PathBuf,
    pub mode: Mode,
}

impl CliInvocation {
    /// `<cli> [-i <src>] -o <dist> [-c <config>] --minify`, run in `working_dir`
    pub fn build(cli: &Path, layout: &CssLayout, working_dir: &Path) -> Self {
        Self::new(cli, layout, working_dir, Mode::Build)
    }

    /// `<cli> [-i <src>] -o <dist> [-c <config>] --watch`, run in `working_dir`
    pub fn watch(cli: &Path, layout: &CssLayout, working_dir: &Path) -> Self {
        Self::new(cli, layout, working_dir, Mode::Watch)
    }

    // Paths are made absolute so they survive the change of directory
    fn new(cli: &Path, layout: &CssLayout, working_dir: &Path, mode: Mode) -> Self {
        let mut args: Vec<OsString> = Vec::new();

        if let Some(src_css) = &layout.src_css {
            args.push("-i".into());
            args.push(anchored(src_css).into());
        }

        args.push("-o".into());
        args.push(anchored(&layout.dist_css).into());

        if let Some(config_file) = &layout.config_file {
            args.push("-c".into());
            args.push(anchored(config_file).into());
        }

        args.push(match mode {
            Mode::Build => "--minify".into(),
            Mode::Watch => "--watch".into(),
        });

        Self {
            program: anchored(cli),
            args,
            working_dir: anchored(working_dir),
            mode,
        }
    }

    /// `std` command for this invocation
    pub fn command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args).current_dir(&self.working_dir);
        command
    }

    /// `tokio` command for this invocation
    pub fn async_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args).current_dir(&self.working_dir);
        command
    }
}

fn anchored(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl fmt::Display for CliInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Whether the output stylesheet is missing or older than its sources.
///
/// The source stylesheet and the legacy config file count as sources. When
/// the layout has no source at all the build always runs.
pub fn should_rebuild(layout: &CssLayout) -> bool {
    let Some(built) = modified(&layout.dist_css) else {
        return true;
    };

    let sources: Vec<&PathBuf> = layout.src_css.iter().chain(layout.config_file.iter()).collect();
    if sources.is_empty() {
        return true;
    }

    sources
        .into_iter()
        .any(|source| modified(source).map_or(true, |changed| changed > built))
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn layout(major: u64) -> CssLayout {
        if major >= 4 {
            CssLayout {
                major,
                src_css: Some(PathBuf::from("/app/assets/css/source.css")),
                dist_css: PathBuf::from("/app/assets/css/tailwind.css"),
                config_file: None,
            }
        } else {
            CssLayout {
                major,
                src_css: None,
                dist_css: PathBuf::from("/app/assets/css/tailwind.css"),
                config_file: Some(PathBuf::from("/app/tailwind.config.js")),
            }
        }
    }

    #[test]
    fn test_build_invocation() {
        let invocation =
            CliInvocation::build(Path::new("/bin/tailwindcss"), &layout(4), Path::new("/app"));
        insta::assert_snapshot!(
            invocation.to_string(),
            @"/bin/tailwindcss -i /app/assets/css/source.css -o /app/assets/css/tailwind.css --minify"
        );
    }

    #[test]
    fn test_watch_invocation_for_tailwind_3() {
        let invocation =
            CliInvocation::watch(Path::new("/bin/tailwindcss"), &layout(3), Path::new("/app"));
        assert_eq!(invocation.mode, Mode::Watch);
        insta::assert_snapshot!(
            invocation.to_string(),
            @"/bin/tailwindcss -o /app/assets/css/tailwind.css -c /app/tailwind.config.js --watch"
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_commands_run_in_project_root() {
        let invocation =
            CliInvocation::build(Path::new("/bin/tailwindcss"), &layout(4), Path::new("/srv/project"));
        assert_eq!(invocation.command().get_current_dir(), Some(Path::new("/srv/project")));
        assert_eq!(
            invocation.async_command().as_std().get_current_dir(),
            Some(Path::new("/srv/project"))
        );
    }

    #[test]
    fn test_relative_paths_are_anchored() {
        let layout = CssLayout {
            major: 4,
            src_css: Some(PathBuf::from("proj/assets/css/source.css")),
            dist_css: PathBuf::from("proj/assets/css/tailwind.css"),
            config_file: None,
        };
        let invocation =
            CliInvocation::watch(Path::new("proj/tailwindcss"), &layout, Path::new("proj"));
        let cwd = std::env::current_dir().unwrap();

        assert_eq!(invocation.program, cwd.join("proj/tailwindcss"));
        assert_eq!(invocation.working_dir, cwd.join("proj"));
        assert_eq!(invocation.args[1], cwd.join("proj/assets/css/source.css").into_os_string());
    }

    #[test]
    fn test_should_rebuild() {
        let dir = TempDir::new().unwrap();
        let layout = CssLayout {
            major: 4,
            src_css: Some(dir.path().join("source.css")),
            dist_css: dir.path().join("tailwind.css"),
            config_file: None,
        };

        fs::write(dir.path().join("source.css"), "@import \"tailwindcss\";").unwrap();
        assert!(should_rebuild(&layout), "missing output");

        fs::write(dir.path().join("tailwind.css"), "").unwrap();
        let past = SystemTime::now() - Duration::from_secs(60);
        fs::File::options()
            .write(true)
            .open(dir.path().join("source.css"))
            .unwrap()
            .set_modified(past)
            .unwrap();
        assert!(!should_rebuild(&layout), "output newer than source");

        let future = SystemTime::now() + Duration::from_secs(60);
        fs::File::options()
            .write(true)
            .open(dir.path().join("source.css"))
            .unwrap()
            .set_modified(future)
            .unwrap();
        assert!(should_rebuild(&layout), "source changed after build");
    }
}
