//! Path helpers for output naming

use std::path::{Path, PathBuf};

/// Directory containing `source`; empty for a bare file name so joins stay relative
pub fn source_directory(source: &Path) -> PathBuf {
    source
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// True when `name` ends in `.<extension>`, ignoring ASCII case
pub fn has_extension_ignore_case(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

/// Hidden temporary name next to `output`, used for atomic writes
pub fn temp_sibling_prefix(output: &Path) -> String {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    format!(".{}.partial-", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_directory() {
        assert_eq!(source_directory(Path::new("/videos/a.mkv")), PathBuf::from("/videos"));
        assert_eq!(source_directory(Path::new("a.mkv")), PathBuf::new());
    }

    #[test]
    fn test_has_extension_ignore_case() {
        assert!(has_extension_ignore_case("clip.mp4", "mp4"));
        assert!(has_extension_ignore_case("clip.Mp4", "mp4"));
        assert!(!has_extension_ignore_case("clip.mp4.mkv", "mp4"));
        assert!(!has_extension_ignore_case("clip", "mp4"));
        assert!(!has_extension_ignore_case("mp4", "mp4"));
    }

    #[test]
    fn test_temp_sibling_prefix() {
        assert_eq!(temp_sibling_prefix(Path::new("/v/clip.mp4")), ".clip.partial-");
    }
}
