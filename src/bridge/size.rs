use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::executor::CommandRunner;
use super::shell::shell_safe;
use crate::error::BridgeError;

/// Bytes on disk under a local path: the file length, or the sum of every
/// file below a directory. Missing paths count as zero.
pub fn local_size(path: &Path) -> u64 {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return 0,
    };
    if !metadata.is_dir() {
        return metadata.len();
    }

    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("size probe skipped an entry: {}", e);
                None
            }
        })
        .filter_map(|entry| entry.metadata().ok())
        .filter(|metadata| metadata.is_file())
        .map(|metadata| metadata.len())
        .sum()
}

pub fn local_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// `du -sb` on the device. Unparseable output (a missing path) is zero.
pub fn remote_size(runner: &dyn CommandRunner, path: &str) -> Result<u64, BridgeError> {
    let output = runner.shell(&format!("du -sb {} | cut -f1", shell_safe(path)))?;
    let size = output.trim().parse::<u64>().unwrap_or(0);
    debug!("remote size of {}: {}", path, size);
    Ok(size)
}

pub fn remote_exists(runner: &dyn CommandRunner, path: &str) -> Result<bool, BridgeError> {
    let output = runner.shell(&format!(
        "test -e {} && echo 1 || echo 0",
        shell_safe(path)
    ))?;
    Ok(output.trim() == "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::fake::FakeBridge;
    use std::fs;

    #[test]
    fn test_local_size_of_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.bin"), vec![0u8; 1000]).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.bin"), vec![0u8; 24]).unwrap();

        assert_eq!(local_size(&dir.path().join("a.bin")), 1000);
        assert_eq!(local_size(dir.path()), 1024);
        assert_eq!(local_size(&dir.path().join("missing")), 0);
    }

    #[test]
    fn test_remote_size_parses_du_output() {
        let bridge = FakeBridge::new().shell("du -sb '/sdcard/a.mp4' | cut -f1", "4096\n");
        assert_eq!(remote_size(&bridge, "/sdcard/a.mp4").unwrap(), 4096);
    }

    #[test]
    fn test_remote_size_of_missing_path_is_zero() {
        let bridge = FakeBridge::new().shell(
            "du -sb '/sdcard/nope' | cut -f1",
            "du: /sdcard/nope: No such file or directory\n",
        );
        assert_eq!(remote_size(&bridge, "/sdcard/nope").unwrap(), 0);
    }

    #[test]
    fn test_remote_exists() {
        let bridge = FakeBridge::new()
            .shell("test -e '/sdcard/a' && echo 1 || echo 0", "1\n")
            .shell("test -e '/sdcard/b' && echo 1 || echo 0", "0\n");
        assert!(remote_exists(&bridge, "/sdcard/a").unwrap());
        assert!(!remote_exists(&bridge, "/sdcard/b").unwrap());
    }
}
