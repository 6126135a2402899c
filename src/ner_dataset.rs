use dashmap::DashMap;
use indicatif::MultiProgress;
use log::info;
use rayon::prelude::*;
use std::path::Path;

use crate::config::{Args, Split};
use crate::dataset::CordDataset;
use crate::download::{fetch_cord_roots, ExtractedRoots};
use crate::error::Result;
use crate::io::{split_file, write_dataset_info, write_records_jsonl, SplitSummary};
use crate::types::ProcessingStats;
use crate::utils::{create_output_directory, create_progress_bar};

/// Export one split of `dataset` into `output_dir`, drawing its progress bar
/// under `progress`.
pub fn export_split(
    dataset: &CordDataset,
    split: Split,
    output_dir: &Path,
    tag_ids: bool,
    tag_counts: &DashMap<String, usize>,
    progress: &MultiProgress,
) -> Result<SplitSummary> {
    let transcoder = dataset.transcoder(split);
    let pb = progress.add(create_progress_bar(
        transcoder.count_annotation_files()? as u64,
        split.name(),
    ));

    let path = split_file(output_dir, split);
    let mut examples = CordDataset::generate_examples(&transcoder);
    let num_examples = write_records_jsonl(&path, examples.by_ref(), tag_ids, tag_counts, &pb)?;
    pb.finish_with_message(format!("{} processing complete", split));

    Ok(SplitSummary {
        split,
        path,
        num_examples,
        stats: examples.stats().clone(),
    })
}

/// Main dataset processing pipeline
pub fn process_dataset(args: &Args) -> Result<Vec<SplitSummary>> {
    let provider = ExtractedRoots::for_cord(&args.roots)?;
    let roots = fetch_cord_roots(&provider)?;
    let dataset = CordDataset::new(roots).with_options(args.to_transcode_options());

    let output_dir = create_output_directory(&args.output_dir())?;
    let tag_counts = DashMap::new();
    // Splits run concurrently, so their bars share one draw target
    let progress = MultiProgress::new();

    // Every split owns its transcoder, so ids stay per split
    let summaries = args
        .selected_splits()
        .par_iter()
        .map(|&split| {
            export_split(
                &dataset,
                split,
                &output_dir,
                args.tag_ids,
                &tag_counts,
                &progress,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let mut total = ProcessingStats::new();
    for summary in &summaries {
        info!(
            "{}: {} examples written to {}",
            summary.split,
            summary.num_examples,
            summary.path.display()
        );
        total.merge(&summary.stats);
    }
    total.print_summary();

    info!("Creating {} ...", crate::io::DATASET_INFO_FILE);
    write_dataset_info(&output_dir, &dataset.info(), &summaries, &tag_counts)?;
    info!("Conversion process completed successfully.");

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcoder::RootSet;
    use indicatif::ProgressDrawTarget;
    use std::fs;

    fn write_split(root: &Path, split_dir: &str, name: &str) {
        let dir = root.join(split_dir).join("json");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(name),
            r#"{"roi": null, "valid_line": [{"category": "menu.nm", "words": [{"text": "TEA", "quad": {"x1": 1, "y1": 2, "x3": 3, "y3": 4}}]}]}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_concurrent_splits_share_progress() {
        let r0 = tempfile::tempdir().unwrap();
        let r1 = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_split(r0.path(), "CORD/train", "a.json");
        write_split(r0.path(), "CORD/train", "b.json");
        write_split(r1.path(), "CORD/dev", "c.json");

        let dataset = CordDataset::new(RootSet::new(r0.path(), r1.path()));
        let tag_counts = DashMap::new();
        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());

        let summaries = [Split::Train, Split::Validation]
            .par_iter()
            .map(|&split| export_split(&dataset, split, out.path(), false, &tag_counts, &progress))
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(summaries[0].split, Split::Train);
        assert_eq!(summaries[0].num_examples, 2);
        assert_eq!(summaries[1].split, Split::Validation);
        assert_eq!(summaries[1].num_examples, 1);
        assert_eq!(*tag_counts.get("menu.nm").unwrap(), 3);
    }
}
