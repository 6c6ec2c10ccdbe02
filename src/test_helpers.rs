//! Test utilities for creating temporary files that grow, shrink and disappear.

#[cfg(test)]
use std::fs::{File, OpenOptions};
#[cfg(test)]
use std::io::Write;
#[cfg(test)]
use std::path::{Path, PathBuf};

#[cfg(test)]
pub struct TempFollowFile {
    pub path: PathBuf,
    temp_dir: tempfile::TempDir,
}

#[cfg(test)]
impl TempFollowFile {
    /// Create a new empty file inside its own temporary directory
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("followed.log");

        File::create(&path)?;

        Ok(Self { path, temp_dir })
    }

    /// Create a temporary file with initial content
    pub fn with_bytes(content: &[u8]) -> std::io::Result<Self> {
        let temp_file = Self::new()?;
        temp_file.append_bytes(content)?;
        Ok(temp_file)
    }

    /// Append raw bytes, flushed before returning
    pub fn append_bytes(&self, content: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.write_all(content)?;
        file.flush()?;
        Ok(())
    }

    /// Truncate the file to zero length (simulate log rotation)
    pub fn truncate(&self) -> std::io::Result<()> {
        File::create(&self.path)?;
        Ok(())
    }

    /// Delete the file, leaving its directory in place
    pub fn remove(&self) -> std::io::Result<()> {
        std::fs::remove_file(&self.path)
    }

    /// Write a sibling file in the same directory
    pub fn write_sibling(&self, name: &str, content: &[u8]) -> std::io::Result<PathBuf> {
        let sibling = self.temp_dir.path().join(name);
        std::fs::write(&sibling, content)?;
        Ok(sibling)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_file_creation() {
        let temp_file = TempFollowFile::new().unwrap();
        assert!(temp_file.path().exists());
        assert_eq!(std::fs::metadata(temp_file.path()).unwrap().len(), 0);
    }

    #[test]
    fn test_append_bytes() {
        let temp_file = TempFollowFile::with_bytes(b"line 1\n").unwrap();
        temp_file.append_bytes(b"line 2\n").unwrap();

        let content = std::fs::read(temp_file.path()).unwrap();
        assert_eq!(content, b"line 1\nline 2\n");
    }

    #[test]
    fn test_truncate() {
        let temp_file = TempFollowFile::with_bytes(b"initial content").unwrap();
        temp_file.truncate().unwrap();

        let content = std::fs::read(temp_file.path()).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_remove_and_recreate() {
        let temp_file = TempFollowFile::with_bytes(b"old").unwrap();
        temp_file.remove().unwrap();
        assert!(!temp_file.path().exists());

        temp_file.append_bytes(b"new").unwrap();
        assert_eq!(std::fs::read(temp_file.path()).unwrap(), b"new");
    }

    #[test]
    fn test_write_sibling() {
        let temp_file = TempFollowFile::new().unwrap();
        let sibling = temp_file.write_sibling("other.log", b"noise").unwrap();

        assert_eq!(sibling.parent(), Some(temp_file.dir()));
        assert_eq!(std::fs::read(&sibling).unwrap(), b"noise");
    }
}
