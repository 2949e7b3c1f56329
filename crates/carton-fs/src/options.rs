use std::path::PathBuf;

pub const DEFAULT_EXTENSION: &str = "tmp";

/// Naming parameters for a new temp file.
///
/// The file lands in `<root>/<segments...>/<base_name><random><extension>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TempFileSpec {
    base_name: String,
    extension: Option<String>,
    segments:  Vec<String>,
}

impl TempFileSpec {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            extension: None,
            segments:  Vec::new(),
        }
    }

    /// With or without the leading dot.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn maybe_extension(mut self, extension: Option<impl Into<String>>) -> Self {
        self.extension = extension.map(Into::into);
        self
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }

    pub fn base_name(&self) -> &str { &self.base_name }

    pub fn extension_str(&self) -> Option<&str> { self.extension.as_deref() }

    pub fn segment_list(&self) -> &[String] { &self.segments }
}

#[derive(Clone, Debug)]
pub struct RegistryOptions {
    root:              Option<PathBuf>,
    default_extension: String,
}

impl Default for RegistryOptions {
    fn default() -> Self { Self::new() }
}

impl RegistryOptions {
    pub fn new() -> Self {
        Self {
            root:              None,
            default_extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Overrides the OS temp root.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn maybe_root(mut self, root: Option<PathBuf>) -> Self {
        self.root = root;
        self
    }

    pub fn default_extension(mut self, extension: impl Into<String>) -> Self {
        self.default_extension = extension.into();
        self
    }

    pub fn get_root(&self) -> Option<&PathBuf> { self.root.as_ref() }

    pub fn get_default_extension(&self) -> &str { &self.default_extension }
}
