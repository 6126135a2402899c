//! Dataset registration: metadata, split generators and tag validation.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Split;
use crate::error::Result;
use crate::labels::tag_vocabulary;
use crate::transcoder::{Examples, RootSet, TranscodeOptions, Transcoder};
use crate::types::{EncodedRecord, ProcessingStats, Record};

pub const DESCRIPTION: &str = "https://github.com/clovaai/cord";
pub const HOMEPAGE: &str = "https://github.com/clovaai/cord";
pub const VERSION: &str = "1.0.0";
pub const CITATION: &str = r#"@article{park2019cord,
  title={CORD: A Consolidated Receipt Dataset for Post-OCR Parsing},
  author={Park, Seunghyun and Shin, Seung and Lee, Bado and Lee, Junyeop and Surh, Jaeheung and Seo, Minjoon and Lee, Hwalsuk}
  booktitle={Document Intelligence Workshop at Neural Information Processing Systems}
  year={2019}
}"#;

/// Dataset-level metadata written next to the exported splits.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub homepage: String,
    pub citation: String,
    pub features: BTreeMap<String, String>,
    pub ner_tags: Vec<String>,
}

impl Default for DatasetInfo {
    fn default() -> Self {
        let features = [
            ("id", "string"),
            ("tokens", "sequence<string>"),
            ("bboxes", "sequence<sequence<int64>>"),
            ("roi", "sequence<sequence<int64>>"),
            ("ner_tags", "sequence<class_label>"),
            ("image_path", "string"),
        ]
        .into_iter()
        .map(|(name, kind)| (name.to_string(), kind.to_string()))
        .collect();

        Self {
            name: "cord".to_string(),
            version: VERSION.to_string(),
            description: DESCRIPTION.to_string(),
            homepage: HOMEPAGE.to_string(),
            citation: CITATION.to_string(),
            features,
            ner_tags: tag_vocabulary().names().to_vec(),
        }
    }
}

/// A named split bound to its path relative to each download root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitGenerator {
    pub split: Split,
    pub path: &'static str,
}

pub fn split_generators() -> Vec<SplitGenerator> {
    Split::ALL
        .iter()
        .map(|&split| SplitGenerator {
            split,
            path: split_path(split),
        })
        .collect()
}

pub fn split_path(split: Split) -> &'static str {
    match split {
        Split::Train => "/CORD/train",
        Split::Test => "/CORD/test",
        Split::Validation => "/CORD/dev",
    }
}

/// Check a record's tags against the CORD vocabulary.
pub fn validate_record(record: &Record) -> Result<()> {
    let vocab = tag_vocabulary();
    for tag in &record.ner_tags {
        vocab.str2int(tag)?;
    }
    Ok(())
}

pub fn encode_record(record: Record) -> Result<EncodedRecord> {
    let ner_tags = tag_vocabulary().encode(&record.ner_tags)?;
    Ok(EncodedRecord {
        id: record.id,
        tokens: record.tokens,
        bboxes: record.bboxes,
        ner_tags,
        roi: record.roi,
        image_path: record.image_path,
    })
}

/// The registered CORD dataset over one set of extracted roots.
#[derive(Debug, Clone)]
pub struct CordDataset {
    roots: RootSet,
    options: TranscodeOptions,
}

impl CordDataset {
    pub fn new(roots: RootSet) -> Self {
        Self {
            roots,
            options: TranscodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TranscodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn info(&self) -> DatasetInfo {
        DatasetInfo::default()
    }

    pub fn transcoder(&self, split: Split) -> Transcoder {
        Transcoder::new(self.roots.clone(), split_path(split)).with_options(self.options)
    }

    /// Generate tag-validated examples from a transcoder built by
    /// [`CordDataset::transcoder`].
    pub fn generate_examples(transcoder: &Transcoder) -> ValidatedExamples<'_> {
        ValidatedExamples {
            inner: transcoder.examples(),
            failed: false,
        }
    }
}

/// [`Examples`] with every record checked against the tag vocabulary.
#[derive(Debug)]
pub struct ValidatedExamples<'a> {
    inner: Examples<'a>,
    failed: bool,
}

impl ValidatedExamples<'_> {
    pub fn stats(&self) -> &ProcessingStats {
        self.inner.stats()
    }
}

impl Iterator for ValidatedExamples<'_> {
    type Item = Result<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self
            .inner
            .next()?
            .and_then(|(id, record)| validate_record(&record).map(|_| (id, record)));
        if item.is_err() {
            self.failed = true;
        }
        Some(item)
    }
}
