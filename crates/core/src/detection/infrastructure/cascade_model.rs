use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::shared::error::StreamError;

/// A weighted rectangle of a Haar-like feature, in detection-window
/// coordinates.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WeightedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f64,
}

/// A Haar-like feature: the weighted sum of two or three rectangles.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HaarFeature {
    pub rects: Vec<WeightedRect>,
}

/// A depth-one decision stump over a single feature.
///
/// The feature value is compared against `threshold` scaled by the
/// window's intensity standard deviation; the stump contributes either
/// `left_value` or `right_value` to its stage sum.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WeakClassifier {
    pub feature: HaarFeature,
    pub threshold: f64,
    pub left_value: f64,
    pub right_value: f64,
}

/// One rejection stage: a boosted sum of stumps against a stage threshold.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Stage {
    pub threshold: f64,
    pub classifiers: Vec<WeakClassifier>,
}

/// A pre-trained frontal-face cascade, serialized as JSON.
///
/// Loaded once at startup; a missing or malformed asset is fatal, there is
/// no mid-run reload.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CascadeModel {
    pub window_width: u32,
    pub window_height: u32,
    pub stages: Vec<Stage>,
}

impl CascadeModel {
    pub fn load(path: &Path) -> Result<Self, StreamError> {
        let raw = fs::read_to_string(path).map_err(|source| StreamError::ModelRead {
            path: path.to_path_buf(),
            source,
        })?;
        let model: CascadeModel =
            serde_json::from_str(&raw).map_err(|source| StreamError::ModelParse {
                path: path.to_path_buf(),
                source,
            })?;
        model.validate(path)?;
        Ok(model)
    }

    /// Rejects degenerate models up front so the detection hot loop can
    /// trust window and rect bounds.
    fn validate(&self, path: &Path) -> Result<(), StreamError> {
        let invalid = |msg: &str| StreamError::ModelRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, msg),
        };

        if self.window_width == 0 || self.window_height == 0 {
            return Err(invalid("detection window has zero extent"));
        }
        if self.stages.is_empty() {
            return Err(invalid("cascade has no stages"));
        }
        for stage in &self.stages {
            for wc in &stage.classifiers {
                for rect in &wc.feature.rects {
                    if rect.x + rect.width > self.window_width
                        || rect.y + rect.height > self.window_height
                    {
                        return Err(invalid("feature rect exceeds detection window"));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "window_width": 24,
            "window_height": 24,
            "stages": [
                {
                    "threshold": 0.5,
                    "classifiers": [
                        {
                            "feature": {
                                "rects": [
                                    {"x": 0, "y": 0, "width": 24, "height": 12, "weight": 1.0},
                                    {"x": 0, "y": 12, "width": 24, "height": 12, "weight": -1.0}
                                ]
                            },
                            "threshold": 0.0,
                            "left_value": -1.0,
                            "right_value": 1.0
                        }
                    ]
                }
            ]
        }"#
    }

    fn write_model(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_parses_well_formed_model() {
        let file = write_model(sample_json());
        let model = CascadeModel::load(file.path()).unwrap();
        assert_eq!(model.window_width, 24);
        assert_eq!(model.stages.len(), 1);
        assert_eq!(model.stages[0].classifiers[0].feature.rects.len(), 2);
    }

    #[test]
    fn load_missing_file_is_model_read_error() {
        let err = CascadeModel::load(Path::new("/nonexistent/cascade.json")).unwrap_err();
        assert!(matches!(err, StreamError::ModelRead { .. }));
    }

    #[test]
    fn load_malformed_json_is_model_parse_error() {
        let file = write_model("{ not json");
        let err = CascadeModel::load(file.path()).unwrap_err();
        assert!(matches!(err, StreamError::ModelParse { .. }));
    }

    #[test]
    fn load_rejects_rect_outside_window() {
        let bad = sample_json().replace(r#""width": 24, "height": 12"#, r#""width": 25, "height": 12"#);
        let file = write_model(&bad);
        assert!(CascadeModel::load(file.path()).is_err());
    }

    #[test]
    fn load_rejects_empty_cascade() {
        let file = write_model(r#"{"window_width": 24, "window_height": 24, "stages": []}"#);
        assert!(CascadeModel::load(file.path()).is_err());
    }
}
