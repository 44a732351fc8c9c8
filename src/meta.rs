use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ── Data Model ──────────────────────────────────────────────────────────────

/// Pixel position. Serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl From<[u32; 2]> for Point {
    fn from([x, y]: [u32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [u32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// A labelled region in original-image pixels. `coords[0].x <= coords[1].x`
/// always holds; the y values keep the order they were clicked in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insert {
    pub coords: [Point; 2],
}

/// Sorted so that serializing the same set twice is byte-identical.
pub type InsertSet = BTreeMap<String, Insert>;

/// The `.meme` sidecar document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemeMeta {
    pub inserts: InsertSet,
}

impl MemeMeta {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = self.to_json()?;
        std::fs::write(path, data).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| Error::Metadata {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `template.png` -> `template.meme`
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("meme")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemeMeta {
        let mut inserts = InsertSet::new();
        inserts.insert(
            "topbox".to_string(),
            Insert {
                coords: [Point::new(300, 300), Point::new(900, 1200)],
            },
        );
        MemeMeta { inserts }
    }

    #[test]
    fn sidecar_replaces_extension() {
        assert_eq!(
            sidecar_path(Path::new("/memes/drake.png")),
            PathBuf::from("/memes/drake.meme")
        );
        assert_eq!(
            sidecar_path(Path::new("memes/archive.tar.jpg")),
            PathBuf::from("memes/archive.tar.meme")
        );
        assert_eq!(
            sidecar_path(Path::new("noext")),
            PathBuf::from("noext.meme")
        );
    }

    #[test]
    fn json_shape_uses_two_space_indent() {
        let expected = r#"{
  "inserts": {
    "topbox": {
      "coords": [
        [
          300,
          300
        ],
        [
          900,
          1200
        ]
      ]
    }
  }
}"#;
        assert_eq!(sample().to_json().unwrap(), expected);
    }

    #[test]
    fn empty_set_serializes_as_empty_object() {
        let json = MemeMeta::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({ "inserts": {} }));
    }

    #[test]
    fn load_reads_what_save_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drake.meme");
        sample().save(&path).unwrap();

        assert_eq!(MemeMeta::load(&path).unwrap(), sample());
    }

    #[test]
    fn load_rejects_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.meme");
        std::fs::write(&path, r#"{"inserts": {"a": {"coords": [[1, 2]]}}}"#).unwrap();

        assert!(matches!(
            MemeMeta::load(&path),
            Err(Error::Metadata { .. })
        ));
    }
}
