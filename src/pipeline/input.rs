//! Input validation for direct mode: check an operator-supplied PDF path.
//!
//! The check runs before any model call so a typo on the command line costs
//! nothing. We validate the PDF magic bytes (`%PDF`) as well, because sending
//! an arbitrary file to the model just produces a confusing API error.

use crate::error::Strip2DescError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, Strip2DescError> {
    let path = path.as_ref().to_path_buf();

    // A directory opens fine on Unix, so check for a regular file explicitly.
    if !path.is_file() {
        return Err(Strip2DescError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(f) => {
            // Files shorter than the magic are rejected too; missing bytes read as zero.
            let mut head = Vec::with_capacity(4);
            if let Err(e) = f.take(4).read_to_end(&mut head) {
                debug!("Could not read {}: {}", path.display(), e);
            }
            if head != b"%PDF" {
                let mut magic = [0u8; 4];
                magic[..head.len()].copy_from_slice(&head);
                return Err(Strip2DescError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Strip2DescError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Strip2DescError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_reported() {
        let err = resolve_local("/definitely/not/a/real/file.pdf").unwrap_err();
        assert!(matches!(err, Strip2DescError::FileNotFound { .. }));
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.4\n...").unwrap();
        assert_eq!(resolve_local(f.path()).unwrap(), f.path());
    }

    #[test]
    fn non_pdf_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"<html>").unwrap();
        match resolve_local(f.path()) {
            Err(Strip2DescError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"<htm"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn file_shorter_than_magic_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%P").unwrap();
        match resolve_local(f.path()) {
            Err(Strip2DescError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"%P\0\0"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_rejected() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            resolve_local(f.path()),
            Err(Strip2DescError::NotAPdf { .. })
        ));
    }

    #[test]
    fn directory_is_not_a_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_local(dir.path()).is_err());
    }
}
