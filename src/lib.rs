//! CORD to NER record converter
//!
//! This library turns the CORD receipt dataset (per-image JSON annotations plus
//! images spread over two download roots) into flat token / bounding-box / tag
//! records for token classification.

pub mod annotation;
pub mod config;
pub mod dataset;
pub mod download;
pub mod error;
pub mod io;
pub mod labels;
pub mod ner_dataset;
pub mod transcoder;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use config::{Args, ImageNaming, Split};
pub use dataset::{split_generators, CordDataset, DatasetInfo};
pub use error::{Error, Result};
pub use ner_dataset::process_dataset;
pub use transcoder::{transcode, Examples, RootSet, TranscodeOptions, Transcoder};
pub use types::{CordAnnotation, Record};
