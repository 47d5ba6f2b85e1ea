//! File-access resolution: turn an opaque file reference into a readable path.
//!
//! References arrive from outside the process's guaranteed ownership —
//! sandboxed pickers, share sheets, cloud placeholders — and a plain
//! `File::open` on them can silently fail. The resolver runs an ordered
//! chain of escalating strategies; the first one that succeeds wins and no
//! further strategies run. The chain is strictly sequential because every
//! strategy past the first has side effects (token acquisition, temp-file
//! creation) that must not overlap.
//!
//! 1. **direct** — the reference already lives in the private storage area;
//!    verify it is readable and non-empty and return it unchanged.
//! 2. **scoped-copy** — acquire a scoped-access token, copy the bytes into a
//!    private temp directory while it is held, release, return the copy.
//! 3. **sanitized-copy** — same, but sanitise the file name first (some
//!    copies fail purely because of the name) and add a random disambiguator.
//! 4. **bookmark** — derive a renewed path from a durable bookmark of the
//!    reference and use it if not stale.
//! 5. **passthrough** — hand the original reference back and let the caller's
//!    read surface the real error.
//!
//! Temp copies are owned by the returned [`ResolvedFile`]: dropping it (when
//! extraction finishes, success or failure) removes them.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::FileAccessError;

/// Longest sanitised file-name stem the resolver will produce.
const MAX_SANITIZED_STEM: usize = 64;

/// Platform hook for scoped (security-scoped) file access.
///
/// On an ordinary filesystem this is a no-op ([`OpenAccess`]); sandboxed
/// hosts implement it with their acquire/release pair. The guard returned by
/// [`ScopedAccess::begin`] releases on drop, so the token is released on
/// every exit path of a strategy attempt, including error paths, and is
/// never held across pipeline stages.
pub trait ScopedAccess: Send + Sync {
    fn begin(&self, path: &Path) -> Result<Box<dyn ScopedGuard>, FileAccessError>;
}

/// Held while scoped access is active; releases on drop.
pub trait ScopedGuard: Send {}

/// No-op scoped access for ordinary filesystems.
pub struct OpenAccess;

struct OpenGuard;
impl ScopedGuard for OpenGuard {}

impl ScopedAccess for OpenAccess {
    fn begin(&self, _path: &Path) -> Result<Box<dyn ScopedGuard>, FileAccessError> {
        Ok(Box::new(OpenGuard))
    }
}

/// Platform hook for durable-bookmark resolution.
///
/// Returns a renewed, resolvable path for the original reference, or `None`
/// when no bookmark exists or the bookmark is stale.
pub trait BookmarkResolver: Send + Sync {
    fn resolve(&self, original: &Path) -> Option<PathBuf>;
}

/// Default resolver: no bookmarks.
pub struct NoBookmarks;

impl BookmarkResolver for NoBookmarks {
    fn resolve(&self, _original: &Path) -> Option<PathBuf> {
        None
    }
}

/// A readable path, plus ownership of any temp copy backing it.
///
/// The `TempDir` is kept alive so the copy survives until extraction
/// completes; dropping the `ResolvedFile` removes it.
pub struct ResolvedFile {
    path: PathBuf,
    _temp: Option<TempDir>,
}

impl ResolvedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this resolution created a private temp copy.
    pub fn is_copy(&self) -> bool {
        self._temp.is_some()
    }
}

type Strategy = fn(&FileAccessResolver, &Path) -> Result<ResolvedFile, FileAccessError>;

/// Resolves file references through the escalating strategy chain.
pub struct FileAccessResolver {
    private_dir: PathBuf,
    scoped: Arc<dyn ScopedAccess>,
    bookmarks: Arc<dyn BookmarkResolver>,
}

impl FileAccessResolver {
    pub fn new(
        private_dir: PathBuf,
        scoped: Arc<dyn ScopedAccess>,
        bookmarks: Arc<dyn BookmarkResolver>,
    ) -> Self {
        Self {
            private_dir,
            scoped,
            bookmarks,
        }
    }

    /// The ordered chain. Short-circuits on the first success; the last
    /// strategy (passthrough) always succeeds, so resolution itself never
    /// fails — a truly unreadable reference surfaces at read time instead.
    const STRATEGIES: &'static [(&'static str, Strategy)] = &[
        ("direct", Self::direct),
        ("scoped-copy", Self::scoped_copy),
        ("sanitized-copy", Self::sanitized_copy),
        ("bookmark", Self::bookmark),
        ("passthrough", Self::passthrough),
    ];

    /// Resolve `reference` to a byte-readable path.
    pub fn resolve(&self, reference: &Path) -> Result<ResolvedFile, FileAccessError> {
        let mut last_err: Option<FileAccessError> = None;
        for (name, strategy) in Self::STRATEGIES {
            match strategy(self, reference) {
                Ok(resolved) => {
                    debug!(
                        "resolved '{}' via {} strategy → '{}'",
                        reference.display(),
                        name,
                        resolved.path().display()
                    );
                    return Ok(resolved);
                }
                Err(e) => {
                    debug!("{} strategy failed for '{}': {}", name, reference.display(), e);
                    last_err = Some(e);
                }
            }
        }
        // Unreachable in practice: passthrough cannot fail.
        Err(last_err.unwrap_or(FileAccessError::NotFound {
            path: reference.to_path_buf(),
        }))
    }

    // ── Strategy 1: direct access ────────────────────────────────────────

    fn direct(&self, reference: &Path) -> Result<ResolvedFile, FileAccessError> {
        if !reference.starts_with(&self.private_dir) {
            return Err(FileAccessError::Denied {
                path: reference.to_path_buf(),
            });
        }
        verify_readable(reference)?;
        Ok(ResolvedFile {
            path: reference.to_path_buf(),
            _temp: None,
        })
    }

    // ── Strategies 2–3: scoped copy ──────────────────────────────────────

    fn scoped_copy(&self, reference: &Path) -> Result<ResolvedFile, FileAccessError> {
        let name = file_name_of(reference);
        self.copy_while_scoped(reference, &name)
    }

    fn sanitized_copy(&self, reference: &Path) -> Result<ResolvedFile, FileAccessError> {
        let name = sanitize_file_name(&file_name_of(reference));
        self.copy_while_scoped(reference, &name)
    }

    /// Acquire the scoped token, copy while it is held, release, return the
    /// copy. The guard's drop is the release; it runs on every exit path.
    fn copy_while_scoped(
        &self,
        reference: &Path,
        copy_name: &str,
    ) -> Result<ResolvedFile, FileAccessError> {
        let _guard = self.scoped.begin(reference)?;

        if !reference.exists() {
            return Err(FileAccessError::NotFound {
                path: reference.to_path_buf(),
            });
        }

        let temp = TempDir::new_in(&self.private_dir).map_err(|e| FileAccessError::Corrupted {
            path: reference.to_path_buf(),
            detail: format!("temp dir: {e}"),
        })?;
        let copy_path = temp.path().join(copy_name);

        fs::copy(reference, &copy_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => FileAccessError::Denied {
                path: reference.to_path_buf(),
            },
            std::io::ErrorKind::NotFound => FileAccessError::NotFound {
                path: reference.to_path_buf(),
            },
            _ => FileAccessError::Corrupted {
                path: reference.to_path_buf(),
                detail: e.to_string(),
            },
        })?;

        verify_readable(&copy_path)?;

        Ok(ResolvedFile {
            path: copy_path,
            _temp: Some(temp),
        })
    }

    // ── Strategy 4: bookmark resolution ──────────────────────────────────

    fn bookmark(&self, reference: &Path) -> Result<ResolvedFile, FileAccessError> {
        let renewed = self
            .bookmarks
            .resolve(reference)
            .ok_or_else(|| FileAccessError::NotFound {
                path: reference.to_path_buf(),
            })?;
        verify_readable(&renewed)?;
        Ok(ResolvedFile {
            path: renewed,
            _temp: None,
        })
    }

    // ── Strategy 5: last-resort passthrough ──────────────────────────────

    fn passthrough(&self, reference: &Path) -> Result<ResolvedFile, FileAccessError> {
        warn!(
            "all access strategies failed for '{}'; passing the reference through",
            reference.display()
        );
        Ok(ResolvedFile {
            path: reference.to_path_buf(),
            _temp: None,
        })
    }
}

/// Existence + readability + non-zero size.
fn verify_readable(path: &Path) -> Result<(), FileAccessError> {
    let meta = fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FileAccessError::NotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => FileAccessError::Denied {
            path: path.to_path_buf(),
        },
        _ => FileAccessError::Corrupted {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;
    if meta.len() == 0 {
        return Err(FileAccessError::Corrupted {
            path: path.to_path_buf(),
            detail: "empty file".into(),
        });
    }
    let mut probe = [0u8; 1];
    fs::File::open(path)
        .and_then(|mut f| f.read(&mut probe))
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => FileAccessError::Denied {
                path: path.to_path_buf(),
            },
            _ => FileAccessError::Corrupted {
                path: path.to_path_buf(),
                detail: e.to_string(),
            },
        })?;
    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string())
}

/// Sanitise a file name so the copy cannot fail on the name alone: strip
/// path-hostile characters, collapse whitespace, cap the stem length, and
/// suffix a random disambiguator. The extension is preserved.
pub fn sanitize_file_name(name: &str) -> String {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() => (s, Some(e)),
        _ => (name, None),
    };

    let cleaned: String = stem
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(MAX_SANITIZED_STEM).collect();
    let base = if capped.is_empty() {
        "untitled".to_string()
    } else {
        capped
    };

    let suffix = Uuid::new_v4().simple().to_string();
    match ext {
        Some(ext) => format!("{base}-{}.{ext}", &suffix[..8]),
        None => format!("{base}-{}", &suffix[..8]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts acquire/release pairs for asserting scoped-token discipline.
    struct CountingAccess {
        acquired: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    struct CountingGuard {
        released: Arc<AtomicUsize>,
    }

    impl ScopedGuard for CountingGuard {}

    impl Drop for CountingGuard {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ScopedAccess for CountingAccess {
        fn begin(&self, _path: &Path) -> Result<Box<dyn ScopedGuard>, FileAccessError> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingGuard {
                released: Arc::clone(&self.released),
            }))
        }
    }

    fn counting_resolver(private_dir: PathBuf) -> (FileAccessResolver, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let acquired = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicUsize::new(0));
        let resolver = FileAccessResolver::new(
            private_dir,
            Arc::new(CountingAccess {
                acquired: Arc::clone(&acquired),
                released: Arc::clone(&released),
            }),
            Arc::new(NoBookmarks),
        );
        (resolver, acquired, released)
    }

    #[test]
    fn direct_access_short_circuits_without_token_or_copy() {
        let private = tempfile::tempdir().unwrap();
        let file = private.path().join("inside.txt");
        fs::write(&file, b"content").unwrap();

        let (resolver, acquired, _) = counting_resolver(private.path().to_path_buf());
        let resolved = resolver.resolve(&file).unwrap();

        assert_eq!(resolved.path(), file.as_path());
        assert!(!resolved.is_copy());
        assert_eq!(acquired.load(Ordering::SeqCst), 0, "no scoped token acquired");
    }

    #[test]
    fn outside_private_dir_uses_scoped_copy_and_releases_token() {
        let private = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let file = outside.path().join("report.txt");
        fs::write(&file, b"outside bytes").unwrap();

        let (resolver, acquired, released) = counting_resolver(private.path().to_path_buf());
        let resolved = resolver.resolve(&file).unwrap();

        assert!(resolved.is_copy());
        assert!(resolved.path().starts_with(private.path()));
        assert_eq!(fs::read(resolved.path()).unwrap(), b"outside bytes");
        assert_eq!(acquired.load(Ordering::SeqCst), 1);
        assert_eq!(released.load(Ordering::SeqCst), 1, "token released before return");
    }

    #[test]
    fn temp_copy_removed_when_resolved_file_drops() {
        let private = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let file = outside.path().join("doc.txt");
        fs::write(&file, b"bytes").unwrap();

        let (resolver, _, _) = counting_resolver(private.path().to_path_buf());
        let resolved = resolver.resolve(&file).unwrap();
        let copy_path = resolved.path().to_path_buf();
        assert!(copy_path.exists());

        drop(resolved);
        assert!(!copy_path.exists(), "copy cleaned up on drop");
    }

    #[test]
    fn missing_file_falls_through_to_passthrough() {
        let private = tempfile::tempdir().unwrap();
        let (resolver, _, _) = counting_resolver(private.path().to_path_buf());

        let ghost = private.path().join("nope").join("ghost.pdf");
        let resolved = resolver.resolve(&ghost).unwrap();
        assert_eq!(resolved.path(), ghost.as_path());
        assert!(!resolved.is_copy());
    }

    #[test]
    fn bookmark_strategy_recovers_a_moved_file() {
        struct FixedBookmark(PathBuf);
        impl BookmarkResolver for FixedBookmark {
            fn resolve(&self, _original: &Path) -> Option<PathBuf> {
                Some(self.0.clone())
            }
        }

        /// Denies every scoped acquisition so strategies 2–3 cannot run.
        struct DenyAll;
        impl ScopedAccess for DenyAll {
            fn begin(&self, path: &Path) -> Result<Box<dyn ScopedGuard>, FileAccessError> {
                Err(FileAccessError::Denied {
                    path: path.to_path_buf(),
                })
            }
        }

        let private = tempfile::tempdir().unwrap();
        let new_home = private.path().join("renewed.txt");
        fs::write(&new_home, b"found me").unwrap();

        let resolver = FileAccessResolver::new(
            private.path().to_path_buf(),
            Arc::new(DenyAll),
            Arc::new(FixedBookmark(new_home.clone())),
        );

        let stale = Path::new("/gone/original.txt");
        let resolved = resolver.resolve(stale).unwrap();
        assert_eq!(resolved.path(), new_home.as_path());
    }

    #[test]
    fn sanitize_strips_hostile_characters_and_keeps_extension() {
        let out = sanitize_file_name("my: weird//file??name.pdf");
        assert!(out.ends_with(".pdf"));
        for c in ['/', ':', '?', '*', '<', '>', '|'] {
            assert!(!out.contains(c), "should not contain {c:?}: {out}");
        }
    }

    #[test]
    fn sanitize_collapses_whitespace_and_caps_length() {
        let long = format!("{}   spaced\t\tname.docx", "x".repeat(200));
        let out = sanitize_file_name(&long);
        assert!(out.ends_with(".docx"));
        // 64-char stem cap + "-" + 8-char suffix + ".docx"
        assert!(out.len() <= MAX_SANITIZED_STEM + 1 + 8 + 5);
        assert!(!out.contains('\t'));
        assert!(!out.contains("  "));
    }

    #[test]
    fn sanitize_is_randomised_per_call() {
        let a = sanitize_file_name("same.pdf");
        let b = sanitize_file_name("same.pdf");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_file_rejected_by_direct_strategy() {
        let private = tempfile::tempdir().unwrap();
        let file = private.path().join("empty.txt");
        fs::write(&file, b"").unwrap();

        let (resolver, _, _) = counting_resolver(private.path().to_path_buf());
        // Direct fails (zero bytes); scoped copy of the empty file fails the
        // same verification; chain falls through to passthrough.
        let resolved = resolver.resolve(&file).unwrap();
        assert_eq!(resolved.path(), file.as_path());
        assert!(!resolved.is_copy());
    }
}
