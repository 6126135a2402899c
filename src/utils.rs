use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(&format!(
        "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
        label
    )) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Create the output directory if needed. Existing split files in it are
/// overwritten by the export, never the directory itself.
pub fn create_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        log::warn!(
            "Directory {:?} already exists. Existing split files will be overwritten.",
            path
        );
    } else {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_output_directory_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("CORDDataset");

        create_output_directory(&out).unwrap();
        fs::write(out.join("keep.txt"), "x").unwrap();
        create_output_directory(&out).unwrap();

        assert!(out.join("keep.txt").exists());
    }

    #[test]
    fn test_progress_bar_length() {
        let pb = create_progress_bar(12, "Train");
        assert_eq!(pb.length(), Some(12));
    }
}
