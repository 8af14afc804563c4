use anyhow::anyhow;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use super::bounded;
use crate::error::{Error, Result};
use crate::naming::sanitize;
use crate::storage::{FolderId, HierarchyStore};

/// Ordered folder names from the top of the hierarchy down
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderPath(Vec<String>);

impl FolderPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// `[app root, semester, class, topic]` with the free-text labels sanitized
    pub fn lecture(app_root: &str, semester: &str, class_name: &str, topic: &str) -> Self {
        Self::new([
            app_root.to_string(),
            semester.to_string(),
            sanitize(class_name),
            sanitize(topic),
        ])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" / "))
    }
}

/// Walks a [`FolderPath`] with lookup-before-create at every segment.
///
/// Resolving a fully materialized path only performs lookups. A failure
/// aborts the walk; folders created so far are left in place and reused by
/// the next resolution. Two resolvers racing on a missing segment can both
/// create it, leaving same-named siblings.
pub struct FolderResolver<'a> {
    store: &'a dyn HierarchyStore,
    call_timeout: Duration,
}

impl<'a> FolderResolver<'a> {
    pub fn new(store: &'a dyn HierarchyStore, call_timeout: Duration) -> Self {
        Self {
            store,
            call_timeout,
        }
    }

    /// Resolve `path` below `root_parent` (the store root when `None`) to the
    /// identifier of its last segment.
    pub async fn resolve(&self, path: &FolderPath, root_parent: Option<&FolderId>) -> Result<FolderId> {
        let mut parent = root_parent.cloned();

        for segment in path.segments() {
            let found = bounded(self.call_timeout, self.store.find_folder(segment, parent.as_ref()))
                .await
                .map_err(|source| Error::FolderResolutionFailure {
                    segment: segment.clone(),
                    source,
                })?;

            let next = match found {
                Some(id) => {
                    debug!("Found folder '{}' ({})", segment, id);
                    id
                }
                None => {
                    let id = bounded(
                        self.call_timeout,
                        self.store.create_folder(segment, parent.as_ref()),
                    )
                    .await
                    .map_err(|source| Error::FolderResolutionFailure {
                        segment: segment.clone(),
                        source,
                    })?;
                    info!("Created folder '{}' ({})", segment, id);
                    id
                }
            };

            parent = Some(next);
        }

        parent.ok_or_else(|| Error::FolderResolutionFailure {
            segment: String::new(),
            source: anyhow!("empty folder path with no root parent"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lecture_path_sanitizes_labels() {
        let path = FolderPath::lecture("Study Buddy", "2024_Spring", "Math/101", "  ");
        assert_eq!(
            path.segments(),
            &["Study Buddy", "2024_Spring", "Math101", "Untitled"]
        );
        assert_eq!(path.to_string(), "Study Buddy / 2024_Spring / Math101 / Untitled");
    }
}
