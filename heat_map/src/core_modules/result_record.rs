use crate::core_modules::detection::{BBox, Point};
use serde::Serialize;

/// The detections of one frame, in the representation the pipeline runs in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecordDetections {
    #[serde(rename = "bboxes")]
    BBoxes(Vec<BBox>),
    #[serde(rename = "positions")]
    Positions(Vec<Point>),
}

impl RecordDetections {
    pub fn len(&self) -> usize {
        match self {
            RecordDetections::BBoxes(boxes) => boxes.len(),
            RecordDetections::Positions(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

/// Output of one `process` call: the frame's detections and an owned copy of the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatMapRecord {
    pub number_of_detects: usize,
    #[serde(flatten)]
    pub detections: RecordDetections,
    /// `griddata[v][h]`, detached from the live grid.
    pub griddata: Vec<Vec<i32>>,
    /// Detections refused by validation. Omitted from JSON when zero.
    #[serde(skip_serializing_if = "is_zero")]
    pub rejected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HeatMapRecord {
    pub fn new(detections: RecordDetections, griddata: Vec<Vec<i32>>, rejected: usize) -> Self {
        Self {
            number_of_detects: detections.len(),
            detections,
            griddata,
            rejected,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rectangle_record_uses_bboxes_key() {
        let record = HeatMapRecord::new(
            RecordDetections::BBoxes(vec![BBox::new(0, 0, 100, 100)]),
            vec![vec![1, 0], vec![0, 0]],
            0,
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "number_of_detects": 1,
                "bboxes": [{"left": 0, "top": 0, "right": 100, "bottom": 100}],
                "griddata": [[1, 0], [0, 0]],
            })
        );
    }

    #[test]
    fn point_record_carries_rejections_and_timestamp() {
        let record = HeatMapRecord::new(
            RecordDetections::Positions(vec![Point::new(5, 9), Point::new(1, 2)]),
            vec![vec![2]],
            1,
        )
        .with_timestamp(Some("20230101T000000".to_string()));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "number_of_detects": 2,
                "positions": [{"x": 5, "y": 9}, {"x": 1, "y": 2}],
                "griddata": [[2]],
                "rejected": 1,
                "timestamp": "20230101T000000",
            })
        );
    }
}
