// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Component, Path, PathBuf};

/// Lexically clean a path: drop `.` segments, fold `dir/..`, and strip
/// trailing separators. An empty result becomes `.`.
///
/// Nothing touches the filesystem, so symlinks are not resolved.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// String flavour of [`clean_path`].
pub fn clean_str(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    clean_path(Path::new(path)).to_string_lossy().into_owned()
}

/// Forward-slash form of a path, used for glob matching and templates.
pub fn to_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

/// Parent directory, with `.` standing in for "no parent component".
pub fn parent_or_dot(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
        Some(parent) => parent.to_path_buf(),
        None => path.to_path_buf(),
    }
}

/// Final element of a slash-separated path, ignoring trailing slashes.
/// `""` gives `"."` and an all-slash path gives `"/"`.
pub fn base_name(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Everything but the final element, cleaned. `"a.py"` gives `"."`.
pub fn dir_name(path: &str) -> String {
    match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => clean_str(&path[..idx]),
        None => ".".to_string(),
    }
}

/// Extension of the final element including its dot, or `""`.
///
/// `"a/b.tar.gz"` gives `".gz"`; `".bashrc"` gives `".bashrc"`.
pub fn extension_with_dot(path: &str) -> &str {
    let name_start = path.rfind('/').map_or(0, |idx| idx + 1);
    match path[name_start..].rfind('.') {
        Some(idx) => &path[name_start + idx..],
        None => "",
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(non_empty(to_slash(rel)));
    }

    // macOS reports /private/var/... for /var/... and similar.
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(non_empty(to_slash(rel)));
        }
    }

    None
}

fn non_empty(s: String) -> String {
    if s.is_empty() { ".".to_string() } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_path_folds_dots() {
        assert_eq!(clean_str("./a.py"), "a.py");
        assert_eq!(clean_str("src/../lib/x.rs"), "lib/x.rs");
        assert_eq!(clean_str("../aaa/./bbb/"), "../aaa/bbb");
        assert_eq!(clean_str("/aaa/../.."), "/");
        assert_eq!(clean_str("."), ".");
        assert_eq!(clean_str("src/**/*.go"), "src/**/*.go");
    }

    #[test]
    fn parent_or_dot_handles_bare_names() {
        assert_eq!(parent_or_dot(Path::new("a.py")), PathBuf::from("."));
        assert_eq!(parent_or_dot(Path::new("src/a.py")), PathBuf::from("src"));
        assert_eq!(parent_or_dot(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn name_parts() {
        assert_eq!(base_name("/full/path/test.txt.bak"), "test.txt.bak");
        assert_eq!(base_name("src/"), "src");
        assert_eq!(base_name("/"), "/");
        assert_eq!(dir_name("/full/path/test.txt.bak"), "/full/path");
        assert_eq!(dir_name("a.py"), ".");
        assert_eq!(dir_name("/a.py"), "/");
        assert_eq!(extension_with_dot("/full/path/test.txt.bak"), ".bak");
        assert_eq!(extension_with_dot("dir.d/Makefile"), "");
        assert_eq!(extension_with_dot(".bashrc"), ".bashrc");
    }

    #[test]
    fn relative_str_strips_root() {
        let rel = relative_str(Path::new("/work/proj"), Path::new("/work/proj/src/a.rs"));
        assert_eq!(rel.as_deref(), Some("src/a.rs"));
        assert_eq!(relative_str(Path::new("/nope-a"), Path::new("/nope-b/x")), None);
    }
}
