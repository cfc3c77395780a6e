//! Static asset resolution module
//!
//! Maps URL paths onto files under a fixed root directory, refusing anything
//! that would escape the root.

use crate::http::mime;
use crate::logger;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// A resolved static asset
pub struct StaticAsset {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Resolves URL paths to files under an immutable root directory.
///
/// The root is fixed at startup and treated as read-only input. Every lookup
/// outcome other than "regular file inside the root" is a miss; the resolver
/// does not distinguish missing from unreadable.
pub struct StaticAssetResolver {
    root: PathBuf,
}

impl StaticAssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a URL path to a file under the root.
    ///
    /// Returns `None` for directories, missing files, paths that would escape
    /// the root, and any filesystem error.
    pub async fn resolve(&self, path: &str) -> Option<StaticAsset> {
        let relative = sanitize_request_path(path)?;
        let bytes = self.read_relative(&relative).await?;
        let content_type = mime::content_type_for(relative.extension().and_then(|e| e.to_str()));
        Some(StaticAsset {
            bytes,
            content_type,
        })
    }

    /// Read a fixed document (page bodies, 404/500 documents) from the root.
    ///
    /// Same miss semantics as `resolve`; the caller decides how to degrade.
    pub async fn read_document(&self, name: &str) -> Option<Vec<u8>> {
        let relative = sanitize_request_path(name)?;
        self.read_relative(&relative).await
    }

    /// Read a root-relative file after confirming it stays under the root.
    async fn read_relative(&self, relative: &Path) -> Option<Vec<u8>> {
        let file_path = self.root.join(relative);

        let root_canonical = self.root.canonicalize().ok()?;
        // Missing files fail to canonicalize; that is a routine miss, not an
        // error worth logging.
        let Ok(file_canonical) = file_path.canonicalize() else {
            return None;
        };
        if !file_canonical.starts_with(&root_canonical) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {}",
                file_path.display()
            ));
            return None;
        }
        if !file_canonical.is_file() {
            return None;
        }

        fs::read(&file_canonical).await.ok()
    }
}

/// Strip the leading slash and refuse parent-directory components.
///
/// Returns the root-relative path, or `None` when the path is empty or steps
/// upward. Canonicalization in `read_relative` is the second guard, covering
/// symlinks that point outside the root.
fn sanitize_request_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let relative = Path::new(trimmed);
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return None,
        }
    }

    Some(relative.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_accepts_normal_paths() {
        assert_eq!(
            sanitize_request_path("/styles/main.css"),
            Some(PathBuf::from("styles/main.css"))
        );
        assert_eq!(
            sanitize_request_path("index.html"),
            Some(PathBuf::from("index.html"))
        );
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert_eq!(sanitize_request_path("/../etc/passwd"), None);
        assert_eq!(sanitize_request_path("/styles/../../secret"), None);
        assert_eq!(sanitize_request_path("../.."), None);
    }

    #[test]
    fn test_sanitize_rejects_empty() {
        assert_eq!(sanitize_request_path(""), None);
        assert_eq!(sanitize_request_path("/"), None);
    }

    #[tokio::test]
    async fn test_resolve_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("styles")).unwrap();
        std::fs::write(dir.path().join("styles/main.css"), b"body {}").unwrap();

        let resolver = StaticAssetResolver::new(dir.path());
        let asset = resolver.resolve("/styles/main.css").await.unwrap();
        assert_eq!(asset.bytes, b"body {}");
        assert_eq!(asset.content_type, "text/css");
    }

    #[tokio::test]
    async fn test_resolve_misses_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = StaticAssetResolver::new(dir.path());
        assert!(resolver.resolve("/missing.css").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_misses_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();

        let resolver = StaticAssetResolver::new(dir.path());
        assert!(resolver.resolve("/assets").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_misses_when_root_is_absent() {
        let resolver = StaticAssetResolver::new("/does/not/exist");
        assert!(resolver.resolve("/index.html").await.is_none());
    }

    #[tokio::test]
    async fn test_read_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("404.html"), b"<h1>gone</h1>").unwrap();

        let resolver = StaticAssetResolver::new(dir.path());
        assert_eq!(
            resolver.read_document("404.html").await,
            Some(b"<h1>gone</h1>".to_vec())
        );
        assert!(resolver.read_document("500.html").await.is_none());
    }
}
