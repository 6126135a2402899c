use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::transcoder::TranscodeOptions;

/// Command-line arguments for converting the CORD dataset into NER records.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Extracted CORD download root; pass it twice, in download order
    #[arg(
        short = 'r',
        long = "root",
        num_args = 1,
        action = ArgAction::Append,
        required = true,
        value_name = "DIR",
        value_parser = validate_dir
    )]
    pub roots: Vec<PathBuf>,

    /// Output directory for the JSON Lines files (defaults to CORDDataset under the first root)
    #[arg(short = 'o', long = "output_dir")]
    pub output_dir: Option<PathBuf>,

    /// Splits to generate; all of them when omitted
    #[arg(long = "splits", value_enum, value_delimiter = ',')]
    pub splits: Vec<Split>,

    /// How image file names are derived from annotation file names
    #[arg(long = "image_naming", value_enum, default_value = "literal")]
    pub image_naming: ImageNaming,

    /// Fail when an image exists under neither root instead of passing the path through
    #[arg(long = "validate_images")]
    pub validate_images: bool,

    /// Write ner_tags as vocabulary ids instead of tag names
    #[arg(long = "tag_ids")]
    pub tag_ids: bool,
}

impl Args {
    pub fn selected_splits(&self) -> Vec<Split> {
        if self.splits.is_empty() {
            Split::ALL.to_vec()
        } else {
            let mut splits = self.splits.clone();
            splits.sort();
            splits.dedup();
            splits
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => self
                .roots
                .first()
                .cloned()
                .unwrap_or_default()
                .join("CORDDataset"),
        }
    }

    pub fn to_transcode_options(&self) -> TranscodeOptions {
        TranscodeOptions {
            image_naming: self.image_naming,
            validate_images: self.validate_images,
        }
    }
}

/// The three published CORD splits
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
    Validation,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Test, Split::Validation];

    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
            Split::Validation => "validation",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Image file name derivation from an annotation file name
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default)]
pub enum ImageNaming {
    /// Replace every "json" substring with "png" (matches published loaders)
    #[default]
    Literal,
    /// Replace only the file extension
    Extension,
}

// Validate that the path is an existing directory
fn validate_dir(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("{} is not a directory", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_dir(dir.path().to_str().unwrap()).is_ok());
        assert!(validate_dir(dir.path().join("missing").to_str().unwrap()).is_err());
    }

    #[test]
    fn test_parse_args() {
        let r0 = tempfile::tempdir().unwrap();
        let r1 = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "cord2ner",
            "--root",
            r0.path().to_str().unwrap(),
            "--root",
            r1.path().to_str().unwrap(),
            "--splits",
            "train,validation",
            "--image_naming",
            "extension",
            "--tag_ids",
        ])
        .unwrap();

        assert_eq!(args.roots, vec![r0.path().to_path_buf(), r1.path().to_path_buf()]);
        assert_eq!(args.selected_splits(), vec![Split::Train, Split::Validation]);
        assert_eq!(args.image_naming, ImageNaming::Extension);
        assert!(args.tag_ids);
        assert!(!args.validate_images);
        assert_eq!(args.output_dir(), r0.path().join("CORDDataset"));
    }

    #[test]
    fn test_default_splits() {
        let r0 = tempfile::tempdir().unwrap();
        let r1 = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "cord2ner",
            "-r",
            r0.path().to_str().unwrap(),
            "-r",
            r1.path().to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(args.selected_splits(), Split::ALL.to_vec());
        assert_eq!(args.image_naming, ImageNaming::Literal);
    }

    #[test]
    fn test_root_is_required() {
        assert!(Args::try_parse_from(["cord2ner"]).is_err());
    }

    #[test]
    fn test_root_takes_one_value_per_flag() {
        let r0 = tempfile::tempdir().unwrap();
        let r1 = tempfile::tempdir().unwrap();
        let result = Args::try_parse_from([
            "cord2ner",
            "--root",
            r0.path().to_str().unwrap(),
            r1.path().to_str().unwrap(),
        ]);
        assert!(result.is_err());
    }
}
