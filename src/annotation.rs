use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{CordAnnotation, LineItem, Roi};

impl<'de> Deserialize<'de> for CordAnnotation {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CordAnnotationVisitor;

        impl<'de> Visitor<'de> for CordAnnotationVisitor {
            type Value = CordAnnotation;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("struct CordAnnotation")
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<CordAnnotation, V::Error>
            where
                V: MapAccess<'de>,
            {
                // Outer Option tracks presence, inner Option an empty roi
                let mut roi: Option<Option<Roi>> = None;
                let mut valid_line: Option<Vec<LineItem>> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "roi" => {
                            let value: Value = map.next_value()?;
                            roi = Some(roi_from_value::<V::Error>(value)?);
                        }
                        "valid_line" => {
                            valid_line = Some(map.next_value()?);
                        }
                        _ => {
                            // meta, dontcare, etc. are not consumed
                            map.next_value::<de::IgnoredAny>()?;
                        }
                    }
                }

                let roi = roi.ok_or_else(|| de::Error::missing_field("roi"))?;
                let valid_line = valid_line.ok_or_else(|| de::Error::missing_field("valid_line"))?;

                Ok(CordAnnotation { roi, valid_line })
            }
        }

        const FIELDS: &[&str] = &["roi", "valid_line"];
        deserializer.deserialize_struct("CordAnnotation", FIELDS, CordAnnotationVisitor)
    }
}

/// Interpret a raw `roi` value. Null and empty values (`{}`, `[]`, `""`,
/// `false`, `0`) mean the annotation has no region of interest.
fn roi_from_value<E: de::Error>(value: Value) -> std::result::Result<Option<Roi>, E> {
    let is_empty = match &value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    };
    if is_empty {
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| E::custom(format!("invalid roi: {}", e)))
}

/// Parse an annotation from any reader.
pub fn parse_annotation<R: Read>(reader: R) -> serde_json::Result<CordAnnotation> {
    serde_json::from_reader(reader)
}

/// Read and parse a single annotation file.
///
/// The file handle is closed before this returns. Unreadable files, invalid
/// JSON and missing `roi`/`valid_line` keys are all reported as
/// [`Error::MalformedAnnotation`].
pub fn read_annotation(path: &Path) -> Result<CordAnnotation> {
    let file = File::open(path).map_err(|e| Error::malformed(path, e))?;
    parse_annotation(BufReader::new(file)).map_err(|e| Error::malformed(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> serde_json::Result<CordAnnotation> {
        parse_annotation(json.as_bytes())
    }

    #[test]
    fn test_parse_full_annotation() {
        let json = r#"{
            "dontcare": [],
            "valid_line": [
                {
                    "words": [
                        {
                            "quad": {"x2": 40, "y3": 30, "x3": 40, "y4": 30, "x1": 10, "y1": 12, "x4": 10, "y2": 12},
                            "is_key": 0,
                            "row_id": 2179893,
                            "text": "ICED"
                        }
                    ],
                    "category": "menu.nm",
                    "group_id": 3,
                    "sub_group_id": 0
                }
            ],
            "meta": {"version": "v0.0", "image_id": 0},
            "roi": {"x2": 10, "y3": 10, "x3": 10, "y4": 10, "x1": 0, "y1": 0, "x4": 0, "y2": 0}
        }"#;

        let annotation = parse(json).unwrap();
        assert_eq!(annotation.valid_line.len(), 1);
        assert_eq!(annotation.valid_line[0].category, "menu.nm");
        assert_eq!(annotation.valid_line[0].words[0].text, "ICED");
        assert_eq!(annotation.valid_line[0].words[0].quad.to_bbox(), [10, 12, 40, 30]);
        assert_eq!(
            annotation.roi_polygon(),
            vec![[0, 0], [10, 0], [10, 10], [0, 10]]
        );
    }

    #[test]
    fn test_empty_roi_values() {
        for roi in ["null", "{}", "[]", "\"\"", "false", "0"] {
            let json = format!(r#"{{"roi": {}, "valid_line": []}}"#, roi);
            let annotation = parse(&json).unwrap();
            assert_eq!(annotation.roi, None, "roi = {}", roi);
            assert!(annotation.roi_polygon().is_empty());
        }
    }

    #[test]
    fn test_missing_required_keys() {
        let err = parse(r#"{"valid_line": []}"#).unwrap_err();
        assert!(err.to_string().contains("roi"));

        let err = parse(r#"{"roi": null}"#).unwrap_err();
        assert!(err.to_string().contains("valid_line"));
    }

    #[test]
    fn test_incomplete_roi_is_rejected() {
        let err = parse(r#"{"roi": {"x1": 0, "y1": 0}, "valid_line": []}"#).unwrap_err();
        assert!(err.to_string().contains("invalid roi"));
    }

    #[test]
    fn test_word_without_quad_is_rejected() {
        let json = r#"{"roi": null, "valid_line": [{"category": "menu.nm", "words": [{"text": "A"}]}]}"#;
        assert!(parse(json).is_err());
    }

    #[test]
    fn test_read_annotation_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        match read_annotation(&path) {
            Err(Error::MalformedAnnotation { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected MalformedAnnotation, got {:?}", other),
        }
    }
}
