//! Collision resolution: canonical path in, guaranteed-fresh path out.

use crate::error::{ImcapError, ImcapResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Trailing disambiguation marker: exactly one `(n)` group at the end of the
/// stem, `n` a positive integer. `sample(2)(3)` parses as base `sample(2)`,
/// n = 3; nested markers are never interpreted.
static SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(?P<base>.*)\((?P<num>[1-9][0-9]*)\)$").expect("suffix marker regex is valid")
});

/// A disambiguated output path, valid at the moment it was published.
///
/// Superseded, never mutated: each recomputation produces a fresh value.
/// The non-existence guarantee is best effort only; the existence check and
/// the eventual file write are not atomic, so an external writer can still
/// race the capture (surfaced later as `StillCaptureFailed`, never silently
/// overwritten by this core).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueCandidatePath {
    /// Parent directory (`root/initials/experiment/<batch>_<date>`).
    pub directory: PathBuf,
    /// File stem, possibly carrying a `(n)` suffix.
    pub stem: String,
    /// Extension including the leading dot (empty when the path has none).
    pub extension: String,
    /// Fully resolved target path.
    pub path: PathBuf,
}

impl UniqueCandidatePath {
    fn new(directory: PathBuf, stem: String, extension: String) -> Self {
        let path = directory.join(format!("{stem}{extension}"));
        Self {
            directory,
            stem,
            extension,
            path,
        }
    }
}

/// Finds the lowest-numbered variant of a canonical path that does not exist
/// on the filesystem.
///
/// The search is strictly increasing from the parsed (or starting) `n` and
/// the allocator remembers the highest suffix it has issued per
/// (directory, base, extension): a lower number is never reused within the
/// allocator's lifetime even if the file holding it disappears. Repeated
/// allocation with an unchanged filesystem is idempotent. Allocation never
/// mutates the filesystem.
#[derive(Debug, Default)]
pub struct UniquePathAllocator {
    issued: HashMap<(PathBuf, String, String), u32>,
}

impl UniquePathAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `canonical` to a path that does not currently exist.
    ///
    /// Fails with [`ImcapError::Allocation`] when existence cannot be
    /// determined (e.g. permission denied on the parent directory).
    pub fn allocate(&mut self, canonical: &Path) -> ImcapResult<UniqueCandidatePath> {
        let directory = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = canonical
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = canonical
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        if !exists(canonical)? {
            return Ok(UniqueCandidatePath::new(directory, stem, extension));
        }

        let (base, start) = match SUFFIX_RE.captures(&stem) {
            Some(caps) => {
                let base = caps["base"].to_string();
                let n = caps["num"].parse::<u32>().unwrap_or(1);
                (base, n)
            }
            None => (stem.clone(), 1),
        };

        let key = (directory.clone(), base.clone(), extension.clone());
        let floor = self.issued.get(&key).copied().unwrap_or(0);
        let mut n = start.max(floor);

        loop {
            let candidate_stem = format!("{base}({n})");
            let candidate = directory.join(format!("{candidate_stem}{extension}"));
            if !exists(&candidate)? {
                tracing::debug!(path = %candidate.display(), "allocated unique capture path");
                self.issued.insert(key, n);
                return Ok(UniqueCandidatePath::new(directory, candidate_stem, extension));
            }
            n += 1;
        }
    }
}

fn exists(path: &Path) -> ImcapResult<bool> {
    path.try_exists().map_err(|source| ImcapError::Allocation {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn free_canonical_path_is_returned_unchanged() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().join("Unnamed.png");

        let mut alloc = UniquePathAllocator::new();
        let got = alloc.allocate(&canonical).unwrap();

        assert_eq!(got.path, canonical);
        assert_eq!(got.stem, "Unnamed");
        assert_eq!(got.extension, ".png");
    }

    #[test]
    fn colliding_path_gets_first_numbered_variant() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().join("Unnamed.png");
        touch(&canonical);

        let mut alloc = UniquePathAllocator::new();
        let got = alloc.allocate(&canonical).unwrap();

        assert_eq!(got.path, dir.path().join("Unnamed(1).png"));
    }

    #[test]
    fn allocation_is_idempotent_on_unchanged_filesystem() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().join("Unnamed.png");
        touch(&canonical);

        let mut alloc = UniquePathAllocator::new();
        let first = alloc.allocate(&canonical).unwrap();
        let second = alloc.allocate(&canonical).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn marker_in_stem_resumes_the_search() {
        let dir = tempdir().unwrap();
        let published = dir.path().join("sample(2).png");
        touch(&published);

        let mut alloc = UniquePathAllocator::new();
        let got = alloc.allocate(&published).unwrap();

        assert_eq!(got.path, dir.path().join("sample(3).png"));
    }

    #[test]
    fn freed_lower_index_is_never_reissued() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().join("sample.png");
        touch(&canonical);

        let mut alloc = UniquePathAllocator::new();
        let first = alloc.allocate(&canonical).unwrap();
        assert_eq!(first.path, dir.path().join("sample(1).png"));

        // The capture consumes (1); the next allocation moves to (2).
        touch(&first.path);
        let second = alloc.allocate(&canonical).unwrap();
        assert_eq!(second.path, dir.path().join("sample(2).png"));

        // Deleting (1) does not make the allocator walk backwards.
        fs::remove_file(&first.path).unwrap();
        let third = alloc.allocate(&canonical).unwrap();
        assert_eq!(third.path, dir.path().join("sample(2).png"));
    }

    #[test]
    fn only_the_trailing_marker_is_parsed() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().join("run(2)(3).png");
        touch(&canonical);

        let mut alloc = UniquePathAllocator::new();
        let got = alloc.allocate(&canonical).unwrap();

        assert_eq!(got.path, dir.path().join("run(2)(4).png"));
    }

    #[test]
    fn search_skips_over_existing_candidates() {
        let dir = tempdir().unwrap();
        let canonical = dir.path().join("shot.png");
        touch(&canonical);
        touch(&dir.path().join("shot(1).png"));
        touch(&dir.path().join("shot(2).png"));

        let mut alloc = UniquePathAllocator::new();
        let got = alloc.allocate(&canonical).unwrap();

        assert_eq!(got.path, dir.path().join("shot(3).png"));
    }

    #[test]
    fn missing_parent_directory_is_not_an_error() {
        // The batch directory is created lazily at capture time; allocation
        // before that must still succeed.
        let dir = tempdir().unwrap();
        let canonical = dir.path().join("AB/3/A_today/Unnamed.png");

        let mut alloc = UniquePathAllocator::new();
        let got = alloc.allocate(&canonical).unwrap();
        assert_eq!(got.path, canonical);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_parent_propagates_allocation_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let canonical = locked.join("shot.png");
        touch(&canonical);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores directory permissions; nothing to assert in that case.
        if canonical.try_exists().is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut alloc = UniquePathAllocator::new();
        let result = alloc.allocate(&canonical);

        // Restore permissions so the tempdir can be cleaned up.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(ImcapError::Allocation { .. })));
    }
}
