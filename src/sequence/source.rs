//! Where raw structure records come from.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::error::MorphError;

/// Resolves an identifier (compound name, file stem, path) to the raw text
/// of one structure record.
pub trait StructureSource {
    /// Fetch the record for `id`.
    ///
    /// # Errors
    ///
    /// [`MorphError::NotFound`] when the source does not know `id`,
    /// [`MorphError::SourceUnavailable`] when it cannot be reached or read.
    fn fetch(&self, id: &str) -> Result<String, MorphError>;
}

impl<S: StructureSource + ?Sized> StructureSource for Box<S> {
    fn fetch(&self, id: &str) -> Result<String, MorphError> {
        (**self).fetch(id)
    }
}

/// Records held in memory, keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: FxHashMap<String, String>,
}

impl MemorySource {
    /// Empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `record` under `id`, returning the record it replaced.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        record: impl Into<String>,
    ) -> Option<String> {
        self.records.insert(id.into(), record.into())
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, record: impl Into<String>) -> Self {
        let _ = self.insert(id, record);
        self
    }
}

impl StructureSource for MemorySource {
    fn fetch(&self, id: &str) -> Result<String, MorphError> {
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| MorphError::NotFound(id.to_owned()))
    }
}

/// Records stored as files. `id` is either a literal path to an existing
/// file or a stem looked up as `<root>/<id>.<extension>`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extension: String,
}

impl DirectorySource {
    /// Source rooted at `root`, reading `.sdf` files.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "sdf".to_owned(),
        }
    }

    /// Use `extension` (without the dot) instead of `sdf`.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Path `id` resolves to.
    #[must_use]
    pub fn path_for(&self, id: &str) -> PathBuf {
        let literal = Path::new(id);
        if literal.is_file() {
            return literal.to_path_buf();
        }
        self.root.join(format!("{id}.{}", self.extension))
    }
}

impl StructureSource for DirectorySource {
    fn fetch(&self, id: &str) -> Result<String, MorphError> {
        let path = self.path_for(id);
        log::debug!("reading structure '{id}' from {}", path.display());
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MorphError::NotFound(id.to_owned()),
            _ => MorphError::SourceUnavailable {
                id: id.to_owned(),
                reason: format!("{}: {e}", path.display()),
            },
        })
    }
}

#[cfg(feature = "fetch")]
pub use pubchem::PubChemSource;

#[cfg(feature = "fetch")]
mod pubchem {
    use std::path::PathBuf;

    use super::StructureSource;
    use crate::error::MorphError;

    const PUBCHEM_REST: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";

    /// Blocking PubChem PUG-REST client resolving compound names to their
    /// 3D conformer record, with an optional on-disk cache.
    #[derive(Debug, Clone)]
    pub struct PubChemSource {
        base_url: String,
        cache_dir: Option<PathBuf>,
    }

    impl Default for PubChemSource {
        fn default() -> Self {
            Self::new()
        }
    }

    impl PubChemSource {
        /// Client against the public PubChem endpoint, no cache.
        #[must_use]
        pub fn new() -> Self {
            Self {
                base_url: PUBCHEM_REST.to_owned(),
                cache_dir: None,
            }
        }

        /// Store downloaded records in `dir` and reuse them on later
        /// fetches.
        #[must_use]
        pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
            self.cache_dir = Some(dir.into());
            self
        }

        /// Point the client at another PUG-REST compatible server.
        #[must_use]
        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = base_url.into();
            self
        }

        /// Request URL for compound `name`.
        #[must_use]
        pub fn url_for(&self, name: &str) -> String {
            format!(
                "{}/compound/name/{}/SDF?record_type=3d",
                self.base_url.trim_end_matches('/'),
                encode_path_segment(name.trim())
            )
        }

        fn cache_path(&self, name: &str) -> Option<PathBuf> {
            let file: String = name
                .trim()
                .to_lowercase()
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            self.cache_dir
                .as_ref()
                .map(|dir| dir.join(format!("{file}.sdf")))
        }

        fn download(&self, name: &str) -> Result<String, MorphError> {
            let url = self.url_for(name);
            log::info!("Downloading '{name}' from PubChem...");
            let response = ureq::get(&url).call().map_err(|e| match e {
                ureq::Error::StatusCode(404) => {
                    MorphError::NotFound(name.to_owned())
                }
                other => MorphError::SourceUnavailable {
                    id: name.to_owned(),
                    reason: other.to_string(),
                },
            })?;
            response.into_body().read_to_string().map_err(|e| {
                MorphError::SourceUnavailable {
                    id: name.to_owned(),
                    reason: format!("failed to read response: {e}"),
                }
            })
        }
    }

    impl StructureSource for PubChemSource {
        fn fetch(&self, id: &str) -> Result<String, MorphError> {
            let cache_path = self.cache_path(id);
            if let Some(path) = &cache_path {
                if let Ok(content) = std::fs::read_to_string(path) {
                    log::debug!("'{id}' served from {}", path.display());
                    return Ok(content);
                }
            }

            let content = self.download(id)?;

            if let Some(path) = cache_path {
                let written = path
                    .parent()
                    .map_or(Ok(()), std::fs::create_dir_all)
                    .and_then(|()| std::fs::write(&path, &content));
                match written {
                    Ok(()) => log::info!("Cached to {}", path.display()),
                    Err(e) => log::warn!(
                        "could not cache '{id}' at {}: {e}",
                        path.display()
                    ),
                }
            }
            Ok(content)
        }
    }

    /// Percent-encode everything outside the RFC 3986 unreserved set.
    fn encode_path_segment(segment: &str) -> String {
        let mut out = String::with_capacity(segment.len());
        for byte in segment.bytes() {
            if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
                out.push(char::from(byte));
            } else {
                out.push_str(&format!("%{byte:02X}"));
            }
        }
        out
    }

}
