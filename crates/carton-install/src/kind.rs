use std::fmt;
use std::path::Path;

/// Distribution format, as told by the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `exe`, `msi`
    WindowsExecutable,
    /// `pkg`
    MacPackage,
    /// `zip`, `tgz`, `tar.gz`
    Archive,
    Other,
}

impl FileKind {
    /// Classifies a bare extension, with or without the leading dot.
    pub fn from_extension(extension: &str) -> Self {
        let bare = extension.strip_prefix('.').unwrap_or(extension);
        match bare.to_ascii_lowercase().as_str() {
            "exe" | "msi" => Self::WindowsExecutable,
            "pkg" => Self::MacPackage,
            "zip" | "tgz" | "tar.gz" => Self::Archive,
            _ => Self::Other,
        }
    }

    /// Classifies by the known suffix the file name ends with, so
    /// `tool.tar.gz` is an archive and `setup-1.2.3.msi` is an executable.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        extension_of(path.as_ref()).map_or(Self::Other, |ext| Self::from_extension(&ext))
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::WindowsExecutable => write!(f, "Windows executable"),
            FileKind::MacPackage => write!(f, "macOS package"),
            FileKind::Archive => write!(f, "archive"),
            FileKind::Other => write!(f, "unknown"),
        }
    }
}

/// Multi-part suffixes first.
const KNOWN_SUFFIXES: &[&str] = &["tar.gz", "tgz", "zip", "exe", "msi", "pkg"];

/// The known suffix ending the file name, else the part after its last dot.
pub fn extension_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let lower = name.to_ascii_lowercase();
    let known = KNOWN_SUFFIXES.iter().find(|suffix| {
        lower.len() > suffix.len()
            && lower.ends_with(*suffix)
            && lower.as_bytes()[lower.len() - suffix.len() - 1] == b'.'
    });
    match known {
        Some(suffix) => Some(name[name.len() - suffix.len()..].to_string()),
        None => name.rsplit_once('.').map(|(_, ext)| ext.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(FileKind::from_extension("exe"), FileKind::WindowsExecutable);
        assert_eq!(FileKind::from_extension(".MSI"), FileKind::WindowsExecutable);
        assert_eq!(FileKind::from_extension("pkg"), FileKind::MacPackage);
        assert_eq!(FileKind::from_extension("tar.gz"), FileKind::Archive);
        assert_eq!(FileKind::from_extension("tgz"), FileKind::Archive);
        assert_eq!(FileKind::from_extension("zip"), FileKind::Archive);
        assert_eq!(FileKind::from_extension("deb"), FileKind::Other);
        assert_eq!(FileKind::from_extension(""), FileKind::Other);
    }

    #[test]
    fn test_from_path_matches_suffix() {
        assert_eq!(FileKind::from_path("/tmp/dist/setup1234.msi"), FileKind::WindowsExecutable);
        assert_eq!(FileKind::from_path("/tmp/dist/setup-1.2.3a8Zk2q.MSI"), FileKind::WindowsExecutable);
        assert_eq!(FileKind::from_path("tool.v2.exe"), FileKind::WindowsExecutable);
        assert_eq!(FileKind::from_path("tool-0.9.tar.gz"), FileKind::Archive);
        assert_eq!(FileKind::from_path("notes.exe.txt"), FileKind::Other);
        assert_eq!(FileKind::from_path("README"), FileKind::Other);
        assert_eq!(FileKind::from_path(".exe"), FileKind::WindowsExecutable);
        assert_eq!(FileKind::from_path("setupexe"), FileKind::Other);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b/tool.tar.gz")).as_deref(), Some("tar.gz"));
        assert_eq!(extension_of(Path::new("a/b/Tool-1.2.MSI")).as_deref(), Some("MSI"));
        assert_eq!(extension_of(Path::new("a/b/data.1.gz")).as_deref(), Some("gz"));
        assert_eq!(extension_of(Path::new("a/b/tool")), None);
        assert_eq!(extension_of(Path::new("/")), None);
    }
}
