//! Lazy conversion of CORD annotation files into [`Record`]s.
//!
//! A [`Transcoder`] is a factory: every call to [`Transcoder::examples`] returns
//! a fresh forward-only iterator whose id counter starts over at zero. Nothing
//! is read before the iterator is pulled, and dropping it early leaves no work
//! behind.

use log::{debug, info, warn};
use std::ffi::OsString;
use std::fs;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use crate::annotation::read_annotation;
use crate::config::ImageNaming;
use crate::error::{Error, Result};
use crate::types::{ProcessingStats, Record};

const ANNOTATION_DIR: &str = "json";
const IMAGE_DIR: &str = "image";

/// The two extracted download roots. CORD ships its images split across both
/// archives, so an annotation under one root may point at an image under the
/// other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSet {
    roots: [PathBuf; 2],
}

impl RootSet {
    pub fn new(first: impl Into<PathBuf>, second: impl Into<PathBuf>) -> Self {
        Self {
            roots: [first.into(), second.into()],
        }
    }

    /// Build a root set from provider output, which must hold exactly two paths.
    pub fn from_paths(paths: Vec<PathBuf>) -> Result<Self> {
        let count = paths.len();
        let roots: [PathBuf; 2] = paths
            .try_into()
            .map_err(|_| Error::invalid_roots(format!("expected 2 roots, got {}", count)))?;
        Ok(Self { roots })
    }

    pub fn get(&self, index: usize) -> &Path {
        &self.roots[index]
    }

    // Index of the root searched when an image is missing under `index` (0 or 1)
    fn other_index(index: usize) -> usize {
        1 - index
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeOptions {
    pub image_naming: ImageNaming,
    /// Fail instead of emitting a path that exists under neither root
    pub validate_images: bool,
}

/// `root` joined with the split subpath. Split paths are written with a leading
/// slash (`/CORD/train`) and are always treated as relative to the root.
pub fn split_dir(root: &Path, split: &str) -> PathBuf {
    root.join(split.trim_start_matches('/'))
}

/// Derive the image file name for an annotation file name.
pub fn image_file_name(annotation_file: &str, naming: ImageNaming) -> String {
    match naming {
        ImageNaming::Literal => annotation_file.replace("json", "png"),
        ImageNaming::Extension => Path::new(annotation_file)
            .with_extension("png")
            .to_string_lossy()
            .into_owned(),
    }
}

/// Produces records for one split over a [`RootSet`].
#[derive(Debug, Clone)]
pub struct Transcoder {
    roots: RootSet,
    split: String,
    options: TranscodeOptions,
}

impl Transcoder {
    pub fn new(roots: RootSet, split: impl Into<String>) -> Self {
        Self {
            roots,
            split: split.into(),
            options: TranscodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TranscodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn roots(&self) -> &RootSet {
        &self.roots
    }

    pub fn split(&self) -> &str {
        &self.split
    }

    /// Start a new pass over the split.
    pub fn examples(&self) -> Examples<'_> {
        Examples {
            transcoder: self,
            next_root: 0,
            current_root: 0,
            pending: Vec::new().into_iter(),
            guid: -1,
            stats: ProcessingStats::new(),
            finished: false,
        }
    }

    /// Count annotation files across both roots without parsing them.
    pub fn count_annotation_files(&self) -> Result<usize> {
        let mut total = 0;
        for root in self.roots.iter() {
            let ann_dir = split_dir(root, &self.split).join(ANNOTATION_DIR);
            if ann_dir.exists() {
                total += fs::read_dir(&ann_dir)?.count();
            }
        }
        Ok(total)
    }

    /// Resolve the image path for `file_name` found under root `root_index`.
    ///
    /// Returns the path and whether the other root had to be used.
    fn resolve_image_path(&self, root_index: usize, file_name: &str) -> Result<(PathBuf, bool)> {
        let image_name = image_file_name(file_name, self.options.image_naming);
        let candidate = self.image_dir(root_index).join(&image_name);
        if candidate.exists() {
            return Ok((candidate, false));
        }

        let fallback = self
            .image_dir(RootSet::other_index(root_index))
            .join(&image_name);
        if !fallback.exists() && self.options.validate_images {
            return Err(Error::UnresolvableImagePath { path: fallback });
        }
        Ok((fallback, true))
    }

    fn image_dir(&self, root_index: usize) -> PathBuf {
        split_dir(self.roots.get(root_index), &self.split).join(IMAGE_DIR)
    }

    /// Sorted annotation file names under a root, or `None` if the split is
    /// not present there.
    fn list_annotations(&self, root_index: usize) -> Result<Option<Vec<OsString>>> {
        let folder = split_dir(self.roots.get(root_index), &self.split);
        info!("Generating examples from = {}", folder.display());

        let ann_dir = folder.join(ANNOTATION_DIR);
        if !ann_dir.exists() {
            debug!("No annotation directory at {}, skipping", ann_dir.display());
            return Ok(None);
        }

        let mut names = fs::read_dir(&ann_dir)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();
        Ok(Some(names))
    }
}

/// Convenience wrapper: a default-option transcoder over `roots` and `split`.
pub fn transcode(roots: RootSet, split: &str) -> Transcoder {
    Transcoder::new(roots, split)
}

/// Iterator over `(id, Record)` pairs for one split.
///
/// The first error ends the iteration.
#[derive(Debug)]
pub struct Examples<'a> {
    transcoder: &'a Transcoder,
    next_root: usize,
    current_root: usize,
    pending: std::vec::IntoIter<OsString>,
    guid: i64,
    stats: ProcessingStats,
    finished: bool,
}

impl Examples<'_> {
    /// Statistics for the records yielded so far.
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    fn transcode_file(&mut self, file_name: &OsString) -> Result<Record> {
        let transcoder = self.transcoder;
        let ann_dir = split_dir(transcoder.roots.get(self.current_root), &transcoder.split)
            .join(ANNOTATION_DIR);
        let annotation = read_annotation(&ann_dir.join(file_name))?;

        let file_name = file_name.to_string_lossy();
        let (image_path, used_fallback) =
            transcoder.resolve_image_path(self.current_root, &file_name)?;
        if used_fallback {
            if image_path.exists() {
                self.stats.image_fallbacks += 1;
            } else {
                warn!("Image for {} not found under either root", file_name);
                self.stats.unresolved_images += 1;
            }
        }

        let record = Record::from_annotation(self.guid as u64, &annotation, &image_path);
        self.stats.total_files_processed += 1;
        self.stats.records_written += 1;
        self.stats.tokens += record.len();
        self.stats.skipped_empty_words += annotation.empty_word_count();
        Ok(record)
    }
}

impl Iterator for Examples<'_> {
    type Item = Result<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            if let Some(file_name) = self.pending.next() {
                self.guid += 1;
                return match self.transcode_file(&file_name) {
                    Ok(record) => Some(Ok((self.guid as u64, record))),
                    Err(e) => {
                        self.finished = true;
                        Some(Err(e))
                    }
                };
            }

            if self.next_root >= 2 {
                self.finished = true;
                break;
            }

            let root_index = self.next_root;
            self.next_root += 1;
            match self.transcoder.list_annotations(root_index) {
                Ok(Some(names)) => {
                    self.current_root = root_index;
                    self.pending = names.into_iter();
                }
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl FusedIterator for Examples<'_> {}
