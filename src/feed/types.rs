use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors reported by a [`FeedSource`](super::FeedSource).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body was not the expected JSON shape
    #[error("Invalid response: {0}")]
    Decode(String),
    /// The source refused the request (no dataset, bad page number, ...)
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Items
// ============================================================================

/// Stable identifier of a sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One sample of the dataset.
///
/// The feed controller only looks at `id`; `labels` is payload for the
/// overlay transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub filepath: String,
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// A group of detections attached to a sample (one label field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// A single detection with a relative `[x, y, width, height]` box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub bounding_box: [f64; 4],
    #[serde(default)]
    pub confidence: Option<f64>,
}

// ============================================================================
// Source Responses
// ============================================================================

/// Dataset currently served by the source.
///
/// `revision` changes whenever the dataset's content changes; a new
/// `(name, revision)` pair invalidates every loaded page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    pub count: u64,
    #[serde(default)]
    pub revision: u64,
}

impl DatasetInfo {
    /// True if both describe the same dataset generation.
    pub fn same_generation(&self, other: &DatasetInfo) -> bool {
        self.name == other.name && self.revision == other.revision
    }
}

/// One page of items plus the source's current total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Item>,
    #[serde(rename = "total")]
    pub total_count: u64,
}

/// Acknowledgement of a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionAck {
    pub selected_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_deserializes_without_labels() {
        let item: Item =
            serde_json::from_str(r#"{"id": "abc", "filepath": "/data/abc.jpg"}"#).unwrap();
        assert_eq!(item.id, ItemId::new("abc"));
        assert!(item.labels.is_empty());
    }

    #[test]
    fn test_page_uses_total_key() {
        let page: Page = serde_json::from_str(
            r#"{"items": [{"id": "a", "filepath": "a.jpg",
                "labels": [{"detections": [{"label": "cat", "bounding_box": [0.1, 0.2, 0.3, 0.4]}]}]}],
                "total": 45}"#,
        )
        .unwrap();
        assert_eq!(page.total_count, 45);
        assert_eq!(page.items[0].labels[0].detections[0].label, "cat");
    }

    #[test]
    fn test_dataset_generation_ignores_count() {
        let a = DatasetInfo {
            name: "quickstart".into(),
            count: 10,
            revision: 3,
        };
        let mut b = a.clone();
        b.count = 11;
        assert!(a.same_generation(&b));
        b.revision = 4;
        assert!(!a.same_generation(&b));
    }
}
