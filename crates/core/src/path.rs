//! Path grammar for context trees.
//!
//! Paths are `/`-delimited; empty segments are ignored, so `"//a///b/"` and
//! `"/a/b"` name the same position. The literal root path is `/`, and the
//! empty string resolves to the root as well.

/// The root path.
pub const ROOT_PATH: &str = "/";

/// Path separator.
pub const SEPARATOR: char = '/';

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// True when the path names the root.
pub fn is_root(path: &str) -> bool {
    segments(path).is_empty()
}

/// Canonical form of a path: leading `/`, single separators, no trailing `/`.
pub fn normalize(path: &str) -> String {
    join(&segments(path))
}

/// Build a canonical path from segments.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    if segments.is_empty() {
        return ROOT_PATH.to_string();
    }
    let mut out = String::new();
    for segment in segments {
        out.push(SEPARATOR);
        out.push_str(segment.as_ref());
    }
    out
}

/// The last segment of a path, if any.
pub fn basename(path: &str) -> Option<&str> {
    segments(path).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_segments_are_dropped() {
        assert_eq!(segments("//a///b/"), vec!["a", "b"]);
        assert!(segments("/").is_empty());
        assert!(segments("").is_empty());
    }

    #[test]
    fn root_detection() {
        assert!(is_root("/"));
        assert!(is_root(""));
        assert!(is_root("///"));
        assert!(!is_root("/a"));
    }

    #[test]
    fn normalize_canonicalizes() {
        assert_eq!(normalize("a/b/"), "/a/b");
        assert_eq!(normalize("//"), "/");
    }

    #[test]
    fn basename_is_last_segment() {
        assert_eq!(basename("/a/b"), Some("b"));
        assert_eq!(basename("/"), None);
    }
}
