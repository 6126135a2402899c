use serde::{Deserialize, Serialize};
use std::path::Path;

/// A `[x, y]` point in image pixel coordinates.
pub type Point = [i64; 2];

/// An axis-aligned `[x1, y1, x3, y3]` box (top-left and bottom-right corners).
pub type BBox = [i64; 4];

// The four-corner quad of a single word. Only the top-left (x1, y1) and the
// bottom-right (x3, y3) corners are consumed; the rest are ignored on load.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Quad {
    pub x1: i64,
    pub y1: i64,
    pub x3: i64,
    pub y3: i64,
}

impl Quad {
    pub fn to_bbox(&self) -> BBox {
        [self.x1, self.y1, self.x3, self.y3]
    }
}

// A single OCR word inside a line item
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub quad: Quad,
}

// A line item: words sharing one semantic category
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub category: String,
    pub words: Vec<Word>,
}

/// Region of interest: the receipt quadrilateral inside the image, with its
/// corners labelled clockwise from the top-left.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
    pub x3: i64,
    pub y3: i64,
    pub x4: i64,
    pub y4: i64,
}

impl Roi {
    /// Corners in reading order: top-left, top-right, bottom-right, bottom-left.
    pub fn to_polygon(&self) -> [Point; 4] {
        let top_left = [self.x1, self.y1];
        let top_right = [self.x2, self.y2];
        let bottom_right = [self.x3, self.y3];
        let bottom_left = [self.x4, self.y4];
        [top_left, top_right, bottom_right, bottom_left]
    }
}

/// One parsed CORD annotation file.
///
/// `roi` is `None` when the source value is null or empty. Both keys are
/// required; see [`crate::annotation`] for how the document is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CordAnnotation {
    pub roi: Option<Roi>,
    pub valid_line: Vec<LineItem>,
}

impl CordAnnotation {
    /// Words with non-empty text, paired with the category of their line item.
    pub fn tagged_words(&self) -> impl Iterator<Item = (&Word, &str)> + '_ {
        self.valid_line.iter().flat_map(|item| {
            item.words
                .iter()
                .filter(|word| !word.text.is_empty())
                .map(move |word| (word, item.category.as_str()))
        })
    }

    /// Number of words dropped because their text is empty.
    pub fn empty_word_count(&self) -> usize {
        self.valid_line
            .iter()
            .flat_map(|item| item.words.iter())
            .filter(|word| word.text.is_empty())
            .count()
    }

    pub fn roi_polygon(&self) -> Vec<Point> {
        self.roi
            .map(|roi| roi.to_polygon().to_vec())
            .unwrap_or_default()
    }
}

/// A flat token-classification example built from one annotation file.
///
/// `tokens`, `bboxes` and `ner_tags` are parallel and always the same length.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub tokens: Vec<String>,
    pub bboxes: Vec<BBox>,
    pub ner_tags: Vec<String>,
    pub roi: Vec<Point>,
    pub image_path: String,
}

impl Record {
    pub fn from_annotation(id: u64, annotation: &CordAnnotation, image_path: &Path) -> Self {
        let mut tokens = Vec::new();
        let mut bboxes = Vec::new();
        let mut ner_tags = Vec::new();

        for (word, category) in annotation.tagged_words() {
            tokens.push(word.text.clone());
            bboxes.push(word.quad.to_bbox());
            ner_tags.push(category.to_string());
        }

        Self {
            id: id.to_string(),
            tokens,
            bboxes,
            ner_tags,
            roi: annotation.roi_polygon(),
            image_path: image_path.to_string_lossy().into_owned(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A [`Record`] whose tags have been mapped to vocabulary ids.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EncodedRecord {
    pub id: String,
    pub tokens: Vec<String>,
    pub bboxes: Vec<BBox>,
    pub ner_tags: Vec<usize>,
    pub roi: Vec<Point>,
    pub image_path: String,
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingStats {
    pub total_files_processed: usize,
    pub records_written: usize,
    pub tokens: usize,
    pub skipped_empty_words: usize,
    pub image_fallbacks: usize,
    pub unresolved_images: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: &ProcessingStats) {
        self.total_files_processed += other.total_files_processed;
        self.records_written += other.records_written;
        self.tokens += other.tokens;
        self.skipped_empty_words += other.skipped_empty_words;
        self.image_fallbacks += other.image_fallbacks;
        self.unresolved_images += other.unresolved_images;
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Total files processed: {}", self.total_files_processed);
        log::info!("Records written: {}", self.records_written);
        log::info!("Tokens: {}", self.tokens);
        log::info!("Skipped empty words: {}", self.skipped_empty_words);
        log::info!(
            "Images resolved under the other root: {}",
            self.image_fallbacks
        );

        if self.unresolved_images > 0 {
            log::warn!(
                "Images missing under both roots: {} (paths emitted unchanged)",
                self.unresolved_images
            );
        }
    }
}
