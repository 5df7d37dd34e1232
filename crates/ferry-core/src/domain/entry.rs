use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// File extensions the remote pipeline knows how to process.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "pdf", "txt", "md", "jpg", "jpeg", "png", "mp3", "m4a", "wav", "docx", "ics", "eml",
];

/// Opaque locator the byte reader resolves to content.
///
/// This is never the content itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the caller hands to `enqueue`: where the bytes are and what to call them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestEntry {
    pub source_ref: SourceRef,
    pub display_name: String,
}

impl IngestEntry {
    pub fn new(source_ref: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            source_ref: SourceRef::new(source_ref),
            display_name: display_name.into(),
        }
    }

    /// Build an entry for a filesystem path, labelled with its file name.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(path.display().to_string(), display_name)
    }
}

/// Whether the path carries one of [`SUPPORTED_EXTENSIONS`] (case-insensitive).
pub fn is_supported(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Keep only processable paths and turn them into entries, preserving order.
///
/// `extensions` overrides the default list when non-empty. Entries may carry a
/// leading dot (`.pdf`) or not (`pdf`).
pub fn scan_paths<I, P>(paths: I, extensions: &[String]) -> Vec<IngestEntry>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .filter(|path| {
            if extensions.is_empty() {
                return is_supported(path);
            }
            let Some(ext) = path.as_ref().extension().and_then(|ext| ext.to_str()) else {
                return false;
            };
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .map(IngestEntry::from_path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("notes/today.md", true)]
    #[case("scan.PDF", true)]
    #[case("voice memo.m4a", true)]
    #[case("archive.zip", false)]
    #[case("Makefile", false)]
    fn supported_extensions(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_supported(path), expected);
    }

    #[test]
    fn from_path_uses_file_name_as_label() {
        let entry = IngestEntry::from_path("/home/me/docs/invoice.pdf");
        assert_eq!(entry.display_name, "invoice.pdf");
        assert_eq!(entry.source_ref.as_str(), "/home/me/docs/invoice.pdf");
    }

    #[test]
    fn scan_keeps_order_and_drops_unsupported() {
        let entries = scan_paths(["b.txt", "a.exe", "c.png"], &[]);
        let names: Vec<_> = entries.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "c.png"]);
    }

    #[test]
    fn scan_honours_extension_override() {
        let entries = scan_paths(["b.txt", "a.exe", "c.png"], &[".exe".to_string()]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name, "a.exe");
    }
}
