use dashmap::DashMap;
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Split;
use crate::dataset::{encode_record, DatasetInfo};
use crate::error::Result;
use crate::types::{ProcessingStats, Record};

pub const DATASET_INFO_FILE: &str = "dataset_info.json";

// Per-split outcome of an export
#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    pub split: Split,
    pub path: PathBuf,
    pub num_examples: usize,
    pub stats: ProcessingStats,
}

#[derive(Serialize)]
struct DatasetInfoFile<'a> {
    #[serde(flatten)]
    info: &'a DatasetInfo,
    splits: BTreeMap<&'static str, &'a SplitSummary>,
    tag_counts: BTreeMap<String, usize>,
}

/// Path of the JSON Lines file for a split
pub fn split_file(output_dir: &Path, split: Split) -> PathBuf {
    output_dir.join(format!("{}.jsonl", split.name()))
}

/// Write records as JSON Lines, counting tags into `tag_counts`.
///
/// Stops at the first error from `records`; the partially written file is
/// left in place.
pub fn write_records_jsonl<I>(
    path: &Path,
    records: I,
    tag_ids: bool,
    tag_counts: &DashMap<String, usize>,
    pb: &ProgressBar,
) -> Result<usize>
where
    I: Iterator<Item = Result<(u64, Record)>>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    let mut written = 0;

    for item in records {
        let (_, record) = item?;
        for tag in &record.ner_tags {
            *tag_counts.entry(tag.clone()).or_insert(0) += 1;
        }

        if tag_ids {
            serde_json::to_writer(&mut writer, &encode_record(record)?)?;
        } else {
            serde_json::to_writer(&mut writer, &record)?;
        }
        writer.write_all(b"\n")?;
        written += 1;
        pb.inc(1);
    }

    writer.flush()?;
    Ok(written)
}

/// Write `dataset_info.json` with metadata, split summaries and tag counts.
pub fn write_dataset_info(
    output_dir: &Path,
    info: &DatasetInfo,
    summaries: &[SplitSummary],
    tag_counts: &DashMap<String, usize>,
) -> Result<PathBuf> {
    let path = output_dir.join(DATASET_INFO_FILE);
    let contents = DatasetInfoFile {
        info,
        splits: summaries
            .iter()
            .map(|summary| (summary.split.name(), summary))
            .collect(),
        tag_counts: tag_counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect(),
    };

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, &contents)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;

    fn record(id: u64, tags: &[&str]) -> Record {
        Record {
            id: id.to_string(),
            tokens: tags.iter().map(|_| "tok".to_string()).collect(),
            bboxes: tags.iter().map(|_| [1, 2, 3, 4]).collect(),
            ner_tags: tags.iter().map(|t| t.to_string()).collect(),
            roi: vec![],
            image_path: format!("/img/{}.png", id),
        }
    }

    #[test]
    fn test_write_records_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.jsonl");
        let counts = DashMap::new();
        let records = vec![
            Ok((0, record(0, &["menu.nm", "menu.price"]))),
            Ok((1, record(1, &["menu.nm"]))),
        ];

        let written =
            write_records_jsonl(&path, records.into_iter(), false, &counts, &ProgressBar::hidden())
                .unwrap();

        assert_eq!(written, 2);
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Record = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, record(0, &["menu.nm", "menu.price"]));
        assert_eq!(*counts.get("menu.nm").unwrap(), 2);
        assert_eq!(*counts.get("menu.price").unwrap(), 1);
    }

    #[test]
    fn test_write_records_with_tag_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.jsonl");
        let records = vec![Ok((0, record(0, &["menu.cnt", "menu.nm"])))];

        write_records_jsonl(
            &path,
            records.into_iter(),
            true,
            &DashMap::new(),
            &ProgressBar::hidden(),
        )
        .unwrap();

        let line = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["ner_tags"], serde_json::json!([0, 4]));
    }

    #[test]
    fn test_write_records_stops_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.jsonl");
        let records = vec![
            Ok((0, record(0, &["menu.nm"]))),
            Err(Error::malformed("b.json", "missing field `roi`")),
            Ok((2, record(2, &["menu.nm"]))),
        ];

        let result = write_records_jsonl(
            &path,
            records.into_iter(),
            false,
            &DashMap::new(),
            &ProgressBar::hidden(),
        );
        assert!(matches!(result, Err(Error::MalformedAnnotation { .. })));
    }

    #[test]
    fn test_write_dataset_info() {
        let dir = tempfile::tempdir().unwrap();
        let counts = DashMap::new();
        counts.insert("menu.nm".to_string(), 3);
        let summaries = vec![SplitSummary {
            split: Split::Validation,
            path: split_file(dir.path(), Split::Validation),
            num_examples: 2,
            stats: ProcessingStats::default(),
        }];

        let path = write_dataset_info(dir.path(), &DatasetInfo::default(), &summaries, &counts)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["name"], "cord");
        assert_eq!(value["splits"]["validation"]["num_examples"], 2);
        assert_eq!(value["splits"]["validation"]["split"], "validation");
        assert_eq!(value["tag_counts"]["menu.nm"], 3);
    }
}
