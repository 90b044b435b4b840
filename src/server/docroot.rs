//! Mapping request paths onto files below the document root.
//!
//! Resolution happens in two steps: a lexical join that refuses `..`
//! segments, then a canonicalization that refuses anything (for example a
//! symlink) landing outside the canonical root.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::ServerError;

#[derive(Debug, Clone)]
pub struct DocRoot {
    root: PathBuf,
    index_file: String,
}

impl DocRoot {
    /// `root` must be an existing directory; `index_file` a bare file name.
    pub fn new(root: impl AsRef<Path>, index_file: &str) -> Result<Self, ServerError> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root).map_err(|e| {
            ServerError::usage(format!("document root {}: {}", root.display(), e))
        })?;
        if !canonical.is_dir() {
            return Err(ServerError::usage(format!(
                "document root {} is not a directory",
                root.display()
            )));
        }

        let mut components = Path::new(index_file).components();
        let plain_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !plain_name {
            return Err(ServerError::usage(format!(
                "index file must be a plain file name: {:?}",
                index_file
            )));
        }

        Ok(Self {
            root: canonical,
            index_file: index_file.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_file(&self) -> &str {
        &self.index_file
    }

    /// Lexically joins `path` (already stripped of query and fragment)
    /// onto the root. Returns `None` if any segment could escape it.
    pub fn candidate(&self, path: &str) -> Option<PathBuf> {
        let relative = path.strip_prefix('/')?;
        let mut resolved = self.root.clone();

        for segment in relative.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return None,
                s if s.contains(['\\', '\0']) => return None,
                s => resolved.push(s),
            }
        }

        if path.ends_with('/') {
            resolved.push(&self.index_file);
        }

        Some(resolved)
    }

    /// Resolves `path` to a regular file inside the root, following
    /// symlinks only as long as they stay inside it.
    pub async fn resolve(&self, path: &str) -> Option<PathBuf> {
        let candidate = self.candidate(path)?;

        let canonical = match tokio::fs::canonicalize(&candidate).await {
            Ok(p) => p,
            Err(e) => {
                debug!(path = %candidate.display(), error = %e, "resource not found");
                return None;
            }
        };

        if !canonical.starts_with(&self.root) {
            debug!(path = %canonical.display(), "resource escapes document root");
            return None;
        }

        match tokio::fs::metadata(&canonical).await {
            Ok(meta) if meta.is_file() => Some(canonical),
            _ => None,
        }
    }
}
