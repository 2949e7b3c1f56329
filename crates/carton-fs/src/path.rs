//! Temp directory resolution and file name rules.

use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;

use crate::{Error, Result};

static SYSTEM_TEMP_ROOT: Lazy<PathBuf> = Lazy::new(std::env::temp_dir);

const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// The OS temp root, read once per process.
pub fn system_temp_root() -> &'static Path { SYSTEM_TEMP_ROOT.as_path() }

/// Joins `segments` under `root` and creates every missing directory.
///
/// A segment may hold several components (`"dist/x64"`), but never a root,
/// a prefix, `.` or `..`.
pub fn resolve_dir<S: AsRef<str>>(root: &Path, segments: &[S]) -> Result<PathBuf> {
    let mut dir = root.to_path_buf();
    for segment in segments {
        let segment = segment.as_ref();
        check_segment(segment)?;
        dir.push(segment);
    }

    std::fs::create_dir_all(&dir).map_err(|source| Error::Filesystem {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

fn check_segment(segment: &str) -> Result<()> {
    let invalid = |reason| {
        Err(Error::InvalidSegment {
            segment: segment.to_string(),
            reason,
        })
    };

    if segment.is_empty() {
        return invalid("empty segment");
    }
    if segment.chars().any(|c| c == '\0' || c.is_control()) {
        return invalid("contains control characters");
    }
    for component in Path::new(segment).components() {
        match component {
            Component::Normal(part) => {
                if part.to_string_lossy().contains(RESERVED_CHARS) {
                    return invalid("contains reserved characters");
                }
            }
            Component::CurDir | Component::ParentDir => return invalid("relative navigation"),
            Component::RootDir | Component::Prefix(_) => return invalid("absolute path"),
        }
    }
    Ok(())
}

/// Checks that `name` can be used as the stem of a file on any supported host.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason| {
        Err(Error::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("empty name");
    }
    if name == "." || name == ".." {
        return invalid("relative navigation");
    }
    if name.chars().any(|c| c.is_control()) {
        return invalid("contains control characters");
    }
    if name.contains(RESERVED_CHARS) {
        return invalid("contains path separators or reserved characters");
    }
    if name.ends_with('.') || name.ends_with(' ') {
        return invalid("trailing dot or space");
    }
    let stem = name.split('.').next().unwrap_or(name);
    if RESERVED_DEVICE_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
    {
        return invalid("reserved device name");
    }
    Ok(())
}

/// Renders an extension with exactly one leading dot.
///
/// `None` falls back to `default`.
pub fn normalize_extension(extension: Option<&str>, default: &str) -> Result<String> {
    let raw = extension.unwrap_or(default);
    let bare = raw.strip_prefix('.').unwrap_or(raw);
    if bare.is_empty() {
        return Err(Error::InvalidName {
            name: raw.to_string(),
            reason: "empty extension",
        });
    }
    if bare.contains(RESERVED_CHARS) || bare.chars().any(|c| c.is_control()) {
        return Err(Error::InvalidName {
            name: raw.to_string(),
            reason: "extension contains reserved characters",
        });
    }
    if bare.ends_with('.') || bare.ends_with(' ') {
        return Err(Error::InvalidName {
            name: raw.to_string(),
            reason: "trailing dot or space",
        });
    }
    Ok(format!(".{bare}"))
}
