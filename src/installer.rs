//! Locating and installing the Tailwind CSS CLI binary.
//!
//! Installation is an explicit state machine:
//!
//! ```text
//! Start ──pre-installed──────────────▶ Ready
//!   │ managed: path is executable ───▶ Ready
//!   │ managed: download disabled ────▶ MissingFatal
//!   └ managed: otherwise ────────────▶ Downloading ──ok──▶ Ready
//!                                           └──error──▶ DownloadFailed
//! ```
//!
//! `Ready`, `MissingFatal` and `DownloadFailed` are terminal. Nothing is
//! retried and no other version is substituted once a download fails.

use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{Result, TailwindCliError};
use crate::http::{release_asset_url, ReleaseClient};
use crate::platform::{Host, PlatformTag};
use crate::version::ResolvedVersion;

/// Who owns the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Downloaded into the configured directory by this crate
    Managed,
    /// Supplied by the user as an exact path, never modified
    PreInstalled,
}

/// Final location of the CLI binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryLocation {
    pub path: PathBuf,
    pub mode: InstallMode,
}

impl BinaryLocation {
    /// The binary exists and is executable
    pub fn is_ready(&self) -> bool {
        is_executable(&self.path)
    }
}

/// What to do when the managed binary is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPolicy {
    /// Download missing binaries
    Automatic,
    /// Fail with [`TailwindCliError::MissingBinary`] instead of downloading
    Disabled,
    /// Download even when the managed binary already exists
    Force,
}

impl DownloadPolicy {
    pub fn from_config(config: &Config) -> Self {
        if config.automatic_download {
            Self::Automatic
        } else {
            Self::Disabled
        }
    }
}

/// Installer state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    Start,
    Ready(BinaryLocation),
    Downloading { url: String, path: PathBuf },
    MissingFatal { path: PathBuf },
    DownloadFailed { url: String, path: PathBuf, message: String },
}

impl InstallState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Ready(_) | Self::MissingFatal { .. } | Self::DownloadFailed { .. }
        )
    }
}

/// Outcome of removing the managed binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed(PathBuf),
    NothingInstalled(PathBuf),
    /// The configured path is a user-supplied binary and was left in place
    PreInstalledKept(PathBuf),
}

/// Checks that a freshly downloaded binary actually runs
pub trait BinaryVerifier {
    fn verify(&self, path: &Path) -> Result<()>;
}

/// Runs `<binary> --help` and requires a zero exit status
#[derive(Debug, Default, Clone, Copy)]
pub struct HelpFlagVerifier;

impl BinaryVerifier for HelpFlagVerifier {
    fn verify(&self, path: &Path) -> Result<()> {
        let status = Command::new(path)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(TailwindCliError::CommandFailed {
                message: format!("'{} --help' did not succeed", path.display()),
                detail: status.to_string(),
            })
        }
    }
}

/// Binary locator and installer
pub struct Installer<'a> {
    client: &'a dyn ReleaseClient,
    verifier: &'a dyn BinaryVerifier,
    host: Host,
    show_progress: bool,
}

impl<'a> Installer<'a> {
    pub fn new(client: &'a dyn ReleaseClient, verifier: &'a dyn BinaryVerifier) -> Self {
        Self {
            client,
            verifier,
            host: Host::current(),
            show_progress: true,
        }
    }

    /// Install for another platform than the running one
    pub fn with_host(mut self, host: Host) -> Self {
        self.host = host;
        self
    }

    /// Hide the download progress bar
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn client(&self) -> &'a dyn ReleaseClient {
        self.client
    }

    /// The configured path is an existing executable supplied by the user
    pub fn pre_installed(&self, config: &Config) -> Option<BinaryLocation> {
        if config.cli_path.is_file() && is_executable(&config.cli_path) {
            Some(BinaryLocation {
                path: config.cli_path.clone(),
                mode: InstallMode::PreInstalled,
            })
        } else {
            None
        }
    }

    /// Path of the managed binary:
    /// `<cli_path>/<asset>-<version>-<platform token>`
    pub fn managed_path(&self, config: &Config, version: &ResolvedVersion) -> Result<PathBuf> {
        let platform = PlatformTag::for_host(&self.host)?;
        Ok(managed_path(config, version, &platform))
    }

    /// Advance the state machine by one transition.
    ///
    /// Platform errors are fatal and returned as `Err`; every other failure
    /// is a terminal state.
    pub fn step(
        &self,
        state: InstallState,
        config: &Config,
        version: &ResolvedVersion,
        policy: DownloadPolicy,
    ) -> Result<InstallState> {
        match state {
            InstallState::Start => {
                if let Some(location) = self.pre_installed(config) {
                    debug!(path = %location.path.display(), "Using pre-installed Tailwind CSS CLI");
                    return Ok(InstallState::Ready(location));
                }

                let platform = PlatformTag::for_host(&self.host)?;
                let path = managed_path(config, version, &platform);

                if policy != DownloadPolicy::Force && is_executable(&path) {
                    debug!(path = %path.display(), "Tailwind CSS CLI already installed");
                    return Ok(InstallState::Ready(BinaryLocation {
                        path,
                        mode: InstallMode::Managed,
                    }));
                }

                if policy == DownloadPolicy::Disabled {
                    return Ok(InstallState::MissingFatal { path });
                }

                let asset_file = format!("{}-{}", config.asset_name, platform.token());
                let url = release_asset_url(
                    self.client.base_url(),
                    &config.src_repo,
                    &version.tag(),
                    &asset_file,
                );
                Ok(InstallState::Downloading { url, path })
            }
            InstallState::Downloading { url, path } => {
                let platform = PlatformTag::for_host(&self.host)?;
                match self.fetch(&url, &path, &platform) {
                    Ok(()) => {
                        info!(path = %path.display(), "Installed Tailwind CSS CLI");
                        Ok(InstallState::Ready(BinaryLocation {
                            path,
                            mode: InstallMode::Managed,
                        }))
                    }
                    Err(e) => Ok(InstallState::DownloadFailed {
                        url,
                        path,
                        message: e.to_string(),
                    }),
                }
            }
            terminal => Ok(terminal),
        }
    }

    /// Run the state machine to a terminal state and return the binary.
    pub fn ensure(
        &self,
        config: &Config,
        version: &ResolvedVersion,
        policy: DownloadPolicy,
    ) -> Result<BinaryLocation> {
        let mut state = InstallState::Start;
        loop {
            state = match self.step(state, config, version, policy)? {
                InstallState::Ready(location) => return Ok(location),
                InstallState::MissingFatal { path } => {
                    return Err(TailwindCliError::MissingBinary { path })
                }
                InstallState::DownloadFailed { url, path, message } => {
                    return Err(TailwindCliError::DownloadFailed { url, path, message })
                }
                next => next,
            };
        }
    }

    /// Delete the managed binary for `version`. A pre-installed binary is
    /// never deleted.
    pub fn remove(&self, config: &Config, version: &ResolvedVersion) -> Result<Removal> {
        if let Some(location) = self.pre_installed(config) {
            return Ok(Removal::PreInstalledKept(location.path));
        }

        let path = self.managed_path(config, version)?;
        if path.is_file() {
            fs::remove_file(&path)?;
            info!(path = %path.display(), "Removed Tailwind CSS CLI");
            Ok(Removal::Removed(path))
        } else {
            Ok(Removal::NothingInstalled(path))
        }
    }

    /// Stream `url` into a temp file next to `path`, make it executable,
    /// verify it runs, then move it into place.
    fn fetch(&self, url: &str, path: &Path, platform: &PlatformTag) -> Result<()> {
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        info!(%url, "Downloading Tailwind CSS CLI");
        let download = self.client.download(url)?;

        let progress = self.progress_bar(download.content_length);
        let mut temp = tempfile::Builder::new()
            .prefix(".tailwindcss-download-")
            .suffix(platform.extension())
            .tempfile_in(dir)?;
        let written = io::copy(&mut progress.wrap_read(download.body), temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        progress.finish_and_clear();
        debug!(bytes = written, "Download finished");

        // Closes the handle; executing a file open for writing fails on Linux
        let temp_path = temp.into_temp_path();
        set_executable(&temp_path)?;
        self.verifier.verify(&temp_path)?;

        temp_path.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn progress_bar(&self, content_length: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        match content_length {
            Some(len) => {
                let pb = ProgressBar::new(len);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({msg})")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▉▊▋▌▍▎▏  "),
                );
                pb.set_message("Downloading Tailwind CSS CLI");
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_message("Downloading Tailwind CSS CLI");
                pb
            }
        }
    }
}

/// `<dir>/<asset>-<version>-<platform token>`
pub fn managed_path(config: &Config, version: &ResolvedVersion, platform: &PlatformTag) -> PathBuf {
    config.cli_path.join(format!(
        "{}-{}-{}",
        config.asset_name,
        version.version,
        platform.token()
    ))
}

/// The path is a regular file with an execute bit set
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Download;
    use crate::settings::Settings;
    use semver::Version;
    use std::cell::{Cell, RefCell};
    use std::io::Cursor;
    use tempfile::TempDir;

    /// Serves a fixed payload and counts requests
    struct FakeReleases {
        payload: Option<Vec<u8>>,
        downloads: Cell<usize>,
    }

    impl FakeReleases {
        fn serving(payload: &[u8]) -> Self {
            Self {
                payload: Some(payload.to_vec()),
                downloads: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                payload: None,
                downloads: Cell::new(0),
            }
        }
    }

    impl ReleaseClient for FakeReleases {
        fn base_url(&self) -> &str {
            "https://releases.invalid"
        }

        fn latest_release_location(&self, _repo: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn download(&self, url: &str) -> Result<Download> {
            self.downloads.set(self.downloads.get() + 1);
            match &self.payload {
                Some(bytes) => Ok(Download {
                    content_length: Some(bytes.len() as u64),
                    body: Box::new(Cursor::new(bytes.clone())),
                }),
                None => Err(TailwindCliError::Http {
                    url: url.to_string(),
                    message: "unexpected HTTP status 404 Not Found".to_string(),
                }),
            }
        }
    }

    struct AcceptAll;

    impl BinaryVerifier for AcceptAll {
        fn verify(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    /// Accepts everything and remembers what it was asked to run
    #[derive(Default)]
    struct RecordingVerifier {
        verified: RefCell<Option<PathBuf>>,
    }

    impl BinaryVerifier for RecordingVerifier {
        fn verify(&self, path: &Path) -> Result<()> {
            *self.verified.borrow_mut() = Some(path.to_path_buf());
            Ok(())
        }
    }

    struct RejectAll;

    impl BinaryVerifier for RejectAll {
        fn verify(&self, path: &Path) -> Result<()> {
            Err(TailwindCliError::CommandFailed {
                message: format!("'{} --help' did not succeed", path.display()),
                detail: "exit status: 1".to_string(),
            })
        }
    }

    fn config_in(dir: &Path, automatic_download: bool) -> Config {
        Config::from_settings(Settings {
            version: "4.1.3".to_string(),
            cli_path: Some(dir.to_path_buf()),
            automatic_download,
            staticfiles_dirs: vec![dir.join("assets")],
            ..Settings::default()
        })
        .unwrap()
    }

    fn version() -> ResolvedVersion {
        ResolvedVersion::pinned(Version::new(4, 1, 3))
    }

    fn linux() -> Host {
        Host::new("linux", "x86_64")
    }

    #[test]
    fn test_start_transitions() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"binary");
        let installer = Installer::new(&client, &AcceptAll).with_host(linux()).quiet();

        let config = config_in(dir.path(), true);
        let state = installer
            .step(InstallState::Start, &config, &version(), DownloadPolicy::Automatic)
            .unwrap();
        assert_eq!(
            state,
            InstallState::Downloading {
                url: "https://releases.invalid/tailwindlabs/tailwindcss/releases/download/v4.1.3/tailwindcss-linux-x64".to_string(),
                path: dir.path().join("tailwindcss-4.1.3-linux-x64"),
            }
        );

        let state = installer
            .step(InstallState::Start, &config, &version(), DownloadPolicy::Disabled)
            .unwrap();
        assert_eq!(
            state,
            InstallState::MissingFatal {
                path: dir.path().join("tailwindcss-4.1.3-linux-x64")
            }
        );
        assert_eq!(client.downloads.get(), 0);
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        let client = FakeReleases::failing();
        let installer = Installer::new(&client, &AcceptAll).with_host(linux()).quiet();
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path(), true);

        let missing = InstallState::MissingFatal {
            path: PathBuf::from("/nowhere"),
        };
        assert!(missing.is_terminal());
        let next = installer
            .step(missing.clone(), &config, &version(), DownloadPolicy::Automatic)
            .unwrap();
        assert_eq!(next, missing);
    }

    #[test]
    #[cfg(unix)]
    fn test_download_installs_executable() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"#!/bin/sh\nexit 0\n");
        let installer = Installer::new(&client, &AcceptAll).with_host(linux()).quiet();
        let config = config_in(&dir.path().join("bin"), true);

        let location = installer
            .ensure(&config, &version(), DownloadPolicy::Automatic)
            .unwrap();

        assert_eq!(location.mode, InstallMode::Managed);
        assert_eq!(location.path, dir.path().join("bin/tailwindcss-4.1.3-linux-x64"));
        assert!(location.is_ready());
        assert_eq!(fs::read(&location.path).unwrap(), b"#!/bin/sh\nexit 0\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_second_ensure_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"binary");
        let installer = Installer::new(&client, &AcceptAll).with_host(linux()).quiet();
        let config = config_in(dir.path(), true);

        installer.ensure(&config, &version(), DownloadPolicy::Automatic).unwrap();
        installer.ensure(&config, &version(), DownloadPolicy::Automatic).unwrap();
        assert_eq!(client.downloads.get(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn test_force_downloads_again() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"binary");
        let installer = Installer::new(&client, &AcceptAll).with_host(linux()).quiet();
        let config = config_in(dir.path(), true);

        installer.ensure(&config, &version(), DownloadPolicy::Automatic).unwrap();
        installer.ensure(&config, &version(), DownloadPolicy::Force).unwrap();
        assert_eq!(client.downloads.get(), 2);
    }

    #[test]
    fn test_missing_binary_with_download_disabled() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"binary");
        let installer = Installer::new(&client, &AcceptAll).with_host(linux()).quiet();
        let config = config_in(dir.path(), false);

        let err = installer
            .ensure(&config, &version(), DownloadPolicy::from_config(&config))
            .unwrap_err();
        match err {
            TailwindCliError::MissingBinary { path } => {
                assert_eq!(path, dir.path().join("tailwindcss-4.1.3-linux-x64"));
            }
            other => panic!("expected MissingBinary, got {:?}", other),
        }
        assert_eq!(client.downloads.get(), 0);
    }

    #[test]
    fn test_http_failure_is_download_failed() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::failing();
        let installer = Installer::new(&client, &AcceptAll).with_host(linux()).quiet();
        let config = config_in(dir.path(), true);

        let err = installer
            .ensure(&config, &version(), DownloadPolicy::Automatic)
            .unwrap_err();
        assert!(matches!(err, TailwindCliError::DownloadFailed { .. }));
        assert!(err.to_string().contains("releases/download/v4.1.3/tailwindcss-linux-x64"));
        assert!(!dir.path().join("tailwindcss-4.1.3-linux-x64").exists());
    }

    #[test]
    fn test_failed_verification_leaves_no_binary() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"not a program");
        let installer = Installer::new(&client, &RejectAll).with_host(linux()).quiet();
        let config = config_in(dir.path(), true);

        let err = installer
            .ensure(&config, &version(), DownloadPolicy::Automatic)
            .unwrap_err();
        assert!(matches!(err, TailwindCliError::DownloadFailed { .. }));

        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "temp file left behind: {:?}", leftovers);
    }

    #[test]
    #[cfg(unix)]
    fn test_pre_installed_binary_is_never_downloaded_or_removed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("tailwindcss");
        fs::write(&binary, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();

        let config = Config::from_settings(Settings {
            version: "3.4.17".to_string(),
            cli_path: Some(binary.clone()),
            staticfiles_dirs: vec![dir.path().join("assets")],
            ..Settings::default()
        })
        .unwrap();

        let client = FakeReleases::serving(b"binary");
        // Even an unsupported host does not matter for a pre-installed binary
        let installer = Installer::new(&client, &AcceptAll)
            .with_host(Host::new("plan9", "mips"))
            .quiet();

        for policy in [DownloadPolicy::Automatic, DownloadPolicy::Disabled, DownloadPolicy::Force] {
            let location = installer.ensure(&config, &version(), policy).unwrap();
            assert_eq!(location.path, binary);
            assert_eq!(location.mode, InstallMode::PreInstalled);
        }
        assert_eq!(client.downloads.get(), 0);

        assert_eq!(
            installer.remove(&config, &version()).unwrap(),
            Removal::PreInstalledKept(binary.clone())
        );
        assert!(binary.exists());
    }

    #[test]
    fn test_unsupported_platform_is_fatal_in_managed_mode() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"binary");
        let installer = Installer::new(&client, &AcceptAll)
            .with_host(Host::new("freebsd", "x86_64"))
            .quiet();
        let config = config_in(dir.path(), true);

        let err = installer
            .ensure(&config, &version(), DownloadPolicy::Automatic)
            .unwrap_err();
        assert!(matches!(err, TailwindCliError::UnsupportedPlatform { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"binary");
        let installer = Installer::new(&client, &AcceptAll).with_host(linux()).quiet();
        let config = config_in(dir.path(), true);
        let expected = dir.path().join("tailwindcss-4.1.3-linux-x64");

        assert_eq!(
            installer.remove(&config, &version()).unwrap(),
            Removal::NothingInstalled(expected.clone())
        );

        installer.ensure(&config, &version(), DownloadPolicy::Automatic).unwrap();
        assert_eq!(
            installer.remove(&config, &version()).unwrap(),
            Removal::Removed(expected.clone())
        );
        assert!(!expected.exists());
    }

    #[test]
    fn test_windows_asset_names() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"binary");
        let installer = Installer::new(&client, &AcceptAll)
            .with_host(Host::new("Windows", "AMD64"))
            .quiet();
        let config = config_in(dir.path(), true);

        let state = installer
            .step(InstallState::Start, &config, &version(), DownloadPolicy::Automatic)
            .unwrap();
        match state {
            InstallState::Downloading { url, path } => {
                assert!(url.ends_with("/v4.1.3/tailwindcss-windows-x64.exe"));
                assert!(path.ends_with("tailwindcss-4.1.3-windows-x64.exe"));
            }
            other => panic!("expected Downloading, got {:?}", other),
        }
    }

    #[test]
    fn test_downloaded_binary_is_verified_with_platform_extension() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"binary");
        let verifier = RecordingVerifier::default();
        let installer = Installer::new(&client, &verifier)
            .with_host(Host::new("Windows", "AMD64"))
            .quiet();
        let config = config_in(dir.path(), true);

        let location = installer
            .ensure(&config, &version(), DownloadPolicy::Automatic)
            .unwrap();
        assert!(location.path.ends_with("tailwindcss-4.1.3-windows-x64.exe"));

        let verified = verifier.verified.borrow().clone().unwrap();
        assert_eq!(verified.parent(), Some(dir.path()));
        assert!(verified.to_string_lossy().ends_with(".exe"));
        assert_ne!(verified, location.path);
    }

    #[test]
    fn test_downloaded_binary_has_no_extension_off_windows() {
        let dir = TempDir::new().unwrap();
        let client = FakeReleases::serving(b"binary");
        let verifier = RecordingVerifier::default();
        let installer = Installer::new(&client, &verifier).with_host(linux()).quiet();
        let config = config_in(dir.path(), true);

        installer
            .ensure(&config, &version(), DownloadPolicy::Automatic)
            .unwrap();

        let verified = verifier.verified.borrow().clone().unwrap();
        assert!(verified.extension().is_none());
    }
}
