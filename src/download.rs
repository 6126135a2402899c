//! Download/extract collaborator.
//!
//! Retrieval and archive handling live outside this crate. A provider only has
//! to map source locators to extracted local roots, in the same order.

use log::info;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::transcoder::RootSet;

/// Published CORD archives. The second one carries the images the first is missing.
pub const CORD_SOURCES: [&str; 2] = [
    "https://drive.google.com/uc?id=1MqhTbcj-AHXOqYoeoh12aRUwIprzTJYI",
    "https://drive.google.com/uc?id=1wYdp5nC9LnHQZ2FcmOoC0eClyWvcuARU",
];

pub trait DownloadProvider {
    /// Return one extracted root per source, in source order.
    fn download_and_extract(&self, sources: &[&str]) -> Result<Vec<PathBuf>>;
}

/// Provider for archives that were already downloaded and extracted.
#[derive(Debug, Clone, Default)]
pub struct ExtractedRoots {
    by_source: HashMap<String, PathBuf>,
}

impl ExtractedRoots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map each source to the matching path, pairwise.
    pub fn from_pairs<I, S, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            by_source: pairs
                .into_iter()
                .map(|(source, path)| (source.into(), path.into()))
                .collect(),
        }
    }

    /// Bind the published CORD sources to local directories, in order.
    ///
    /// There must be exactly one directory per source.
    pub fn for_cord(roots: &[PathBuf]) -> Result<Self> {
        if roots.len() != CORD_SOURCES.len() {
            return Err(Error::invalid_roots(format!(
                "expected {} roots, got {}",
                CORD_SOURCES.len(),
                roots.len()
            )));
        }
        Ok(Self::from_pairs(
            CORD_SOURCES.iter().copied().zip(roots.iter().cloned()),
        ))
    }

    pub fn insert(&mut self, source: impl Into<String>, path: impl Into<PathBuf>) {
        self.by_source.insert(source.into(), path.into());
    }
}

impl DownloadProvider for ExtractedRoots {
    fn download_and_extract(&self, sources: &[&str]) -> Result<Vec<PathBuf>> {
        sources
            .iter()
            .map(|source| {
                let path = self
                    .by_source
                    .get(*source)
                    .ok_or_else(|| Error::invalid_roots(format!("no local root for {}", source)))?;
                if !path.is_dir() {
                    return Err(Error::invalid_roots(format!(
                        "{} is not a directory",
                        path.display()
                    )));
                }
                info!("Using extracted root {} for {}", path.display(), source);
                Ok(path.clone())
            })
            .collect()
    }
}

/// Fetch the CORD sources through `provider` and build the root set.
pub fn fetch_cord_roots(provider: &dyn DownloadProvider) -> Result<RootSet> {
    RootSet::from_paths(provider.download_and_extract(&CORD_SOURCES)?)
}
