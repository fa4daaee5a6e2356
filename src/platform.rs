//! Maps the host operating system and CPU architecture onto the naming
//! scheme of the Tailwind CSS release assets (`linux-x64`, `macos-arm64`,
//! `windows-x64.exe`, ...).

use std::fmt;

use crate::errors::{Result, TailwindCliError};

/// Operating system family, named as in the release assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Macos,
    Windows,
}

impl Os {
    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "darwin" | "macos" => Some(Self::Macos),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Macos => write!(f, "macos"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// CPU architecture, named as in the release assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    Arm64,
    Armv7,
}

impl Arch {
    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Self::X64),
            "aarch64" | "arm64" => Some(Self::Arm64),
            "armv7" | "armv7l" | "arm" => Some(Self::Armv7),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X64 => write!(f, "x64"),
            Self::Arm64 => write!(f, "arm64"),
            Self::Armv7 => write!(f, "armv7"),
        }
    }
}

/// Raw host description, as reported by the running system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub os: String,
    pub arch: String,
}

impl Host {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this binary was compiled for
    #[must_use]
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }
}

/// Supported (OS, architecture) pair with a published release asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformTag {
    pub os: Os,
    pub arch: Arch,
}

impl PlatformTag {
    /// Identify the release platform for an OS and architecture name.
    ///
    /// Fails with [`TailwindCliError::UnsupportedPlatform`] when no release
    /// asset exists for the combination.
    pub fn identify(os_name: &str, arch_name: &str) -> Result<Self> {
        let unsupported = || TailwindCliError::UnsupportedPlatform {
            os: os_name.to_string(),
            arch: arch_name.to_string(),
        };

        let os = Os::parse(os_name).ok_or_else(unsupported)?;
        let arch = Arch::parse(arch_name).ok_or_else(unsupported)?;

        match (os, arch) {
            (Os::Linux, _)
            | (Os::Macos, Arch::X64 | Arch::Arm64)
            | (Os::Windows, Arch::X64 | Arch::Arm64) => Ok(Self { os, arch }),
            _ => Err(unsupported()),
        }
    }

    pub fn for_host(host: &Host) -> Result<Self> {
        Self::identify(&host.os, &host.arch)
    }

    /// Executable suffix of the release asset
    pub fn extension(&self) -> &'static str {
        match self.os {
            Os::Windows => ".exe",
            _ => "",
        }
    }

    /// Token used in asset names, e.g. `macos-arm64` or `windows-x64.exe`
    pub fn token(&self) -> String {
        format!("{}-{}{}", self.os, self.arch, self.extension())
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}
