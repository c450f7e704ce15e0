//! Annotation to overlay conversion.
//!
//! Detections store relative `[x, y, width, height]` boxes; the focused view
//! draws corner coordinates instead.

use crate::feed::Label;

/// A point in relative image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One labelled box ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub label: String,
    pub top_left: Point,
    pub bottom_right: Point,
    pub confidence: Option<f64>,
}

impl OverlayBox {
    pub fn width(&self) -> f64 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> f64 {
        self.bottom_right.y - self.top_left.y
    }
}

/// Flatten every detection of every label into corner-form boxes, in label
/// order then detection order.
pub fn to_overlay(labels: &[Label]) -> Vec<OverlayBox> {
    labels
        .iter()
        .flat_map(|label| label.detections.iter())
        .map(|detection| {
            let [x, y, w, h] = detection.bounding_box;
            OverlayBox {
                label: detection.label.clone(),
                top_left: Point { x, y },
                bottom_right: Point { x: x + w, y: y + h },
                confidence: detection.confidence,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Detection;

    fn detection(label: &str, bb: [f64; 4]) -> Detection {
        Detection {
            label: label.to_string(),
            bounding_box: bb,
            confidence: None,
        }
    }

    #[test]
    fn test_box_corners() {
        let labels = vec![Label {
            field: None,
            detections: vec![detection("cat", [0.1, 0.2, 0.3, 0.4])],
        }];
        let boxes = to_overlay(&labels);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].label, "cat");
        assert_eq!(boxes[0].top_left, Point { x: 0.1, y: 0.2 });
        assert!((boxes[0].bottom_right.x - 0.4).abs() < 1e-9);
        assert!((boxes[0].bottom_right.y - 0.6).abs() < 1e-9);
        assert!((boxes[0].width() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_order_across_labels() {
        let labels = vec![
            Label {
                field: Some("gt".into()),
                detections: vec![detection("a", [0.0; 4]), detection("b", [0.0; 4])],
            },
            Label {
                field: Some("pred".into()),
                detections: vec![detection("c", [0.0; 4])],
            },
        ];
        let names: Vec<_> = to_overlay(&labels).into_iter().map(|b| b.label).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_no_labels() {
        assert!(to_overlay(&[]).is_empty());
    }
}
