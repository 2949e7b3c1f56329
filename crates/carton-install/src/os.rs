//! Host operating system detection.

use std::fmt;

use crate::kind::FileKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Macos,
    Linux,
    Unknown,
}

impl HostOs {
    pub fn current() -> Self { Self::from_name(std::env::consts::OS) }

    /// Maps an OS identifier such as `std::env::consts::OS`.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("win") && !name.contains("darwin") {
            Self::Windows
        } else if name.contains("mac") || name.contains("darwin") {
            Self::Macos
        } else if ["nix", "nux", "aix"].iter().any(|s| name.contains(s)) {
            Self::Linux
        } else {
            Self::Unknown
        }
    }

    pub fn arch() -> &'static str { std::env::consts::ARCH }

    /// Whether distributions of `kind` are launched natively on this host.
    pub fn runs_natively(self, kind: FileKind) -> bool {
        matches!(
            (self, kind),
            (Self::Windows, FileKind::WindowsExecutable) | (Self::Macos, FileKind::MacPackage)
        )
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOs::Windows => write!(f, "windows"),
            HostOs::Macos => write!(f, "macos"),
            HostOs::Linux => write!(f, "linux"),
            HostOs::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(HostOs::from_name("windows"), HostOs::Windows);
        assert_eq!(HostOs::from_name("Windows 11"), HostOs::Windows);
        assert_eq!(HostOs::from_name("macos"), HostOs::Macos);
        assert_eq!(HostOs::from_name("Darwin"), HostOs::Macos);
        assert_eq!(HostOs::from_name("linux"), HostOs::Linux);
        assert_eq!(HostOs::from_name("aix"), HostOs::Linux);
        assert_eq!(HostOs::from_name("haiku"), HostOs::Unknown);
    }

    #[test]
    fn test_current_matches_target() {
        let os = HostOs::current();
        if cfg!(windows) {
            assert_eq!(os, HostOs::Windows);
        } else if cfg!(target_os = "linux") {
            assert_eq!(os, HostOs::Linux);
        }
        assert!(!HostOs::arch().is_empty());
    }

    #[test]
    fn test_runs_natively() {
        assert!(HostOs::Windows.runs_natively(FileKind::WindowsExecutable));
        assert!(!HostOs::Linux.runs_natively(FileKind::WindowsExecutable));
        assert!(HostOs::Macos.runs_natively(FileKind::MacPackage));
        assert!(!HostOs::Windows.runs_natively(FileKind::Archive));
    }
}
