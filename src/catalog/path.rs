//! Track path checks.
//!
//! Paths come from a hand-edited document and end up passed to decoders on
//! every platform, so they are restricted to printable ASCII and must point
//! at a real file.

use std::io;
use std::path::{Path, PathBuf};

/// Bytes accepted even though they are not graphic characters.
const ALLOWED_SPECIAL: &[u8] = b". /";

/// Graphic characters that Windows refuses in file names.
const DISALLOWED_PUNCTUATION: &[u8] = b"<>\"|?*";

/// Returns the first byte of `path` that is not allowed, if any.
///
/// Allowed bytes are `.`, space, `/` and any printable non-space ASCII
/// character other than `< > " | ? *`. Control characters and non-ASCII
/// bytes are rejected.
pub fn find_disallowed_byte(path: &str) -> Option<u8> {
    path.bytes().find(|&b| {
        if ALLOWED_SPECIAL.contains(&b) {
            return false;
        }
        !b.is_ascii_graphic() || DISALLOWED_PUNCTUATION.contains(&b)
    })
}

/// Why a track path failed the file check.
#[derive(Debug)]
pub enum FileProblem {
    /// Nothing exists at the path.
    Missing,
    /// The path itself is a symbolic link.
    Symlink,
    /// The path exists but is a directory or special file.
    NotRegular,
    /// The metadata lookup failed for another reason (e.g. permissions).
    Inaccessible(io::Error),
}

/// Checks that `path` exists, is not a symlink and is a regular file.
///
/// Uses `symlink_metadata` so that a link is reported as such rather than
/// followed.
pub fn check_track_file(path: &Path) -> Result<(), FileProblem> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(FileProblem::Missing),
        Err(e) => return Err(FileProblem::Inaccessible(e)),
    };

    if meta.file_type().is_symlink() {
        return Err(FileProblem::Symlink);
    }
    if !meta.is_file() {
        return Err(FileProblem::NotRegular);
    }
    Ok(())
}

/// Resolves a path from the document against the document's directory.
pub fn resolve(base_dir: Option<&Path>, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn accepts_plain_paths() {
        assert_eq!(find_disallowed_byte("music/stage 01.ogg"), None);
        assert_eq!(find_disallowed_byte("./a-b_c(1)[2]{3}.brstm"), None);
        assert_eq!(find_disallowed_byte("C:/Music/theme.mp3"), None);
    }

    #[test]
    fn rejects_control_and_non_ascii() {
        assert_eq!(find_disallowed_byte("a\tb.ogg"), Some(b'\t'));
        assert_eq!(find_disallowed_byte("a\nb.ogg"), Some(b'\n'));
        assert_eq!(find_disallowed_byte("a\x7fb.ogg"), Some(0x7f));
        // first byte of a UTF-8 sequence
        assert_eq!(find_disallowed_byte("曲.ogg"), Some(0xe6));
    }

    #[test]
    fn rejects_windows_reserved_punctuation() {
        for bad in ["a<b", "a>b", "a\"b", "a|b", "a?b", "a*b"] {
            assert!(find_disallowed_byte(bad).is_some(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn regular_file_passes() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.ogg");
        std::fs::write(&file, b"").unwrap();
        assert!(check_track_file(&file).is_ok());
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nope.ogg");
        assert!(matches!(check_track_file(&file), Err(FileProblem::Missing)));
    }

    #[test]
    fn directory_fails() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            check_track_file(dir.path()),
            Err(FileProblem::NotRegular)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_fails() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.ogg");
        let link = dir.path().join("link.ogg");
        std::fs::write(&file, b"").unwrap();
        std::os::unix::fs::symlink(&file, &link).unwrap();
        assert!(matches!(check_track_file(&link), Err(FileProblem::Symlink)));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_relative_against_base() {
        let base = Path::new("/etc/bgm");
        assert_eq!(resolve(Some(base), "a.ogg"), PathBuf::from("/etc/bgm/a.ogg"));
        assert_eq!(resolve(Some(base), "/abs/a.ogg"), PathBuf::from("/abs/a.ogg"));
        assert_eq!(resolve(None, "a.ogg"), PathBuf::from("a.ogg"));
    }
}
