//! Object key derivation: `{namespace}/{category}/{filename}`.

use std::fmt::{self, Display, Formatter};
use std::path::Path;

use url::Url;

use crate::error::{StorageError, StorageResult};

/// Location of an uploaded artifact inside the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    namespace: String,
    category: String,
    filename: String,
}

impl ObjectKey {
    /// Derive the key for `file`.
    ///
    /// The category falls back to `default_category` when absent or blank.
    /// Nested categories (`movies/hd`) become nested prefixes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` when the namespace or default category
    /// is blank, or the file has no name.
    pub fn derive(
        namespace: &str,
        category: Option<&str>,
        default_category: &str,
        file: &Path,
    ) -> StorageResult<Self> {
        let namespace = clean_prefix(namespace).ok_or(StorageError::InvalidKey {
            field: "namespace",
            reason: "empty",
        })?;
        let category = category
            .and_then(clean_prefix)
            .or_else(|| clean_prefix(default_category))
            .ok_or(StorageError::InvalidKey {
                field: "category",
                reason: "empty",
            })?;
        let filename = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.trim().is_empty())
            .ok_or(StorageError::InvalidKey {
                field: "filename",
                reason: "missing",
            })?;

        Ok(Self {
            namespace,
            category,
            filename,
        })
    }

    /// Category segment used in the key.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// File name segment used in the key.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Public download link under `base`, each segment percent-encoded.
    #[must_use]
    pub fn public_url(&self, base: &Url) -> Option<Url> {
        let mut url = base.clone();
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments.pop_if_empty();
            segments.extend(self.segments());
        }
        Some(url)
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.namespace
            .split('/')
            .chain(self.category.split('/'))
            .chain(std::iter::once(self.filename.as_str()))
    }
}

impl Display for ObjectKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}/{}/{}",
            self.namespace, self.category, self.filename
        )
    }
}

fn clean_prefix(raw: &str) -> Option<String> {
    let parts: Vec<&str> = raw
        .split('/')
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
