use tracing::trace;

/// Quote a path for the device shell: wrap in single quotes and turn every
/// embedded `'` into `'\''`.
pub fn shell_safe(path: &str) -> String {
    let quoted = format!("'{}'", path.replace('\'', r"'\''"));
    trace!("shell_safe: {} -> {}", path, quoted);
    quoted
}

/// Join a device directory and an entry name.
pub fn join_remote(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Parent of a device path, `/` for top-level paths and for `/` itself.
pub fn remote_parent(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => trimmed[..idx].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_safe_plain_path() {
        assert_eq!(shell_safe("/sdcard/My Files"), "'/sdcard/My Files'");
    }

    #[test]
    fn test_shell_safe_embedded_quote() {
        assert_eq!(shell_safe("/sdcard/it's"), r"'/sdcard/it'\''s'");
    }

    #[test]
    fn test_join_remote() {
        assert_eq!(join_remote("/sdcard", "a.txt"), "/sdcard/a.txt");
        assert_eq!(join_remote("/", "sdcard"), "/sdcard");
    }

    #[test]
    fn test_remote_parent() {
        assert_eq!(remote_parent("/sdcard/Download"), "/sdcard");
        assert_eq!(remote_parent("/sdcard/Download/"), "/sdcard");
        assert_eq!(remote_parent("/sdcard"), "/");
        assert_eq!(remote_parent("/"), "/");
    }
}
