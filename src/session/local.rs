use std::fs;
use std::path::Path;

use tracing::debug;

use super::entry::DirEntry;
use crate::error::SessionError;

/// Read a local directory. Adds `..` unless `path` is the filesystem root.
/// Symlinks to directories count as folders.
pub fn read_local_directory(path: &Path) -> Result<Vec<DirEntry>, SessionError> {
    let listing_error = |source| SessionError::LocalListing {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    if path.parent().is_some() {
        entries.push(DirEntry::parent());
    }

    for entry in fs::read_dir(path).map_err(listing_error)? {
        let entry = entry.map_err(listing_error)?;
        let name = entry.file_name().to_string_lossy().to_string();
        let is_folder = fs::metadata(entry.path())
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
        entries.push(DirEntry::new(name, is_folder));
    }

    debug!("Read {} local entries from {}", entries.len(), path.display());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_files_and_folders() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("photos")).unwrap();
        fs::write(dir.path().join("a.txt"), b"hi").unwrap();

        let mut entries = read_local_directory(dir.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 3);
        assert!(entries.iter().any(|e| e.name == ".." && e.is_folder));
        assert!(entries.iter().any(|e| e.name == "photos" && e.is_folder));
        assert!(entries.iter().any(|e| e.name == "a.txt" && !e.is_folder));
    }

    #[test]
    fn test_root_has_no_parent_entry() {
        let entries = read_local_directory(Path::new("/")).unwrap();
        assert!(entries.iter().all(|e| e.name != ".."));
    }

    #[test]
    fn test_missing_directory_is_a_listing_error() {
        let err = read_local_directory(Path::new("/no/such/dir/here")).unwrap_err();
        assert!(matches!(err, SessionError::LocalListing { .. }));
    }
}
