//! Forest adapter: Implementation of `DietPredictor` for gradient-boosted
//! tree ensembles.
//!
//! The offline training pipeline exports a multi-class boosted forest as JSON.
//! Every tree contributes to the margin of exactly one class; the predicted
//! class is the one with the largest summed margin.
//!
//! # Security
//!
//! - When `manifest.json` and `model.sig` sit next to the artifact, the
//!   Ed25519 signature and the artifact's SHA-256 are verified before parsing
//! - `SignaturePolicy::require_signature` refuses unsigned artifacts entirely
//!
//! # Thread Safety
//!
//! A loaded `ForestPredictor` is immutable and can be shared behind an `Arc`.

pub mod manifest;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::FeatureRecord;
use crate::ports::{DietPredictor, PredictorError};

pub use manifest::{ModelManifest, SignaturePolicy};

/// File name of the model artifact inside the models directory.
pub const DEFAULT_MODEL_FILE: &str = "diet_recommendation_model.json";

/// Only export layout understood by this adapter.
pub const FORMAT_VERSION: u32 = 1;

/// A tree node as exported by the training pipeline.
///
/// Children always sit at larger indices than their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go `left` when `features[feature] < threshold` (or is not finite), else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { leaf: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedTree {
    /// Class whose margin this tree contributes to.
    pub class_id: usize,
    pub nodes: Vec<TreeNode>,
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedForest {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub n_classes: usize,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<ExportedTree>,
}

impl ExportedForest {
    /// Structural checks that make traversal infallible for well-sized rows.
    ///
    /// # Errors
    /// Returns `PredictorError::Malformed` describing the first problem found.
    pub fn validate(&self) -> Result<(), PredictorError> {
        let malformed = |msg: String| Err(PredictorError::Malformed(msg));

        if self.format_version != FORMAT_VERSION {
            return malformed(format!(
                "unsupported format_version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        if self.feature_names.is_empty() {
            return malformed("feature_names is empty".into());
        }
        if self.n_classes < 2 {
            return malformed(format!("n_classes must be at least 2, got {}", self.n_classes));
        }
        if !self.base_score.is_finite() {
            return malformed("base_score is not finite".into());
        }
        if self.trees.is_empty() {
            return malformed("model contains no trees".into());
        }

        let n_features = self.feature_names.len();
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.class_id >= self.n_classes {
                return malformed(format!(
                    "tree {t}: class_id {} >= n_classes {}",
                    tree.class_id, self.n_classes
                ));
            }
            if tree.nodes.is_empty() {
                return malformed(format!("tree {t}: no nodes"));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match *node {
                    TreeNode::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if feature >= n_features {
                            return malformed(format!(
                                "tree {t} node {i}: feature index {feature} out of range"
                            ));
                        }
                        if threshold.is_nan() {
                            return malformed(format!("tree {t} node {i}: NaN threshold"));
                        }
                        for child in [left, right] {
                            if child <= i || child >= tree.nodes.len() {
                                return malformed(format!(
                                    "tree {t} node {i}: invalid child index {child}"
                                ));
                            }
                        }
                    }
                    TreeNode::Leaf { leaf } => {
                        if !leaf.is_finite() {
                            return malformed(format!("tree {t} node {i}: leaf is not finite"));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Tree-ensemble classifier loaded from a JSON artifact.
#[derive(Debug, Clone)]
pub struct ForestPredictor {
    forest: ExportedForest,
    source: Option<PathBuf>,
}

impl ForestPredictor {
    /// Load and verify a model artifact.
    ///
    /// # Errors
    /// Returns `ModelNotFound` if the file is absent, `Signature` if the
    /// signature policy is not met, `Io`/`Malformed` for unreadable or invalid
    /// artifacts.
    pub fn load(path: &Path, policy: &SignaturePolicy) -> Result<Self, PredictorError> {
        if !path.is_file() {
            tracing::error!("Model artifact not found at {:?}", path);
            return Err(PredictorError::ModelNotFound(path.to_path_buf()));
        }

        manifest::verify_artifact(path, policy)?;

        let content = std::fs::read_to_string(path)?;
        let forest: ExportedForest = serde_json::from_str(&content)
            .map_err(|e| PredictorError::Malformed(e.to_string()))?;

        let mut predictor = Self::from_forest(forest)?;
        predictor.source = Some(path.to_path_buf());

        tracing::info!(
            "Loaded model from {:?} (n_trees={}, n_classes={}, n_features={})",
            path,
            predictor.forest.trees.len(),
            predictor.forest.n_classes,
            predictor.forest.feature_names.len()
        );
        Ok(predictor)
    }

    /// Wrap an in-memory forest after validating it.
    ///
    /// # Errors
    /// Returns `PredictorError::Malformed` if the forest fails validation.
    pub fn from_forest(forest: ExportedForest) -> Result<Self, PredictorError> {
        forest.validate()?;
        Ok(Self {
            forest,
            source: None,
        })
    }

    /// Path the model was loaded from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.forest.n_classes
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.forest.trees.len()
    }

    /// Per-class margins for a raw feature row.
    ///
    /// # Errors
    /// Returns `PredictorError::Prediction` if the row length does not match
    /// the model's feature count.
    pub fn margins(&self, row: &[f64]) -> Result<Vec<f64>, PredictorError> {
        let expected = self.forest.feature_names.len();
        if row.len() != expected {
            return Err(PredictorError::Prediction(format!(
                "feature count mismatch: got {}, expected {expected}",
                row.len()
            )));
        }

        let mut margins = vec![self.forest.base_score; self.forest.n_classes];
        for tree in &self.forest.trees {
            margins[tree.class_id] += Self::leaf_value(tree, row)?;
        }
        Ok(margins)
    }

    fn leaf_value(tree: &ExportedTree, row: &[f64]) -> Result<f64, PredictorError> {
        let mut idx = 0;
        loop {
            let node = tree.nodes.get(idx).ok_or_else(|| {
                PredictorError::Prediction(format!("node index {idx} out of range"))
            })?;
            match *node {
                TreeNode::Leaf { leaf } => return Ok(leaf),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row[feature];
                    idx = if !x.is_finite() || x < threshold { left } else { right };
                }
            }
        }
    }
}

impl DietPredictor for ForestPredictor {
    fn feature_names(&self) -> &[String] {
        &self.forest.feature_names
    }

    fn predict(&self, features: &FeatureRecord) -> Result<i64, PredictorError> {
        let margins = self.margins(&features.to_vec())?;

        // Strict comparison keeps the lowest index on ties.
        let mut best = 0;
        for (class, margin) in margins.iter().enumerate().skip(1) {
            if *margin > margins[best] {
                best = class;
            }
        }

        tracing::debug!("Class margins: {:?} -> {}", margins, best);
        i64::try_from(best).map_err(|e| PredictorError::Prediction(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::FEATURE_NAMES;

    fn stump(class_id: usize, feature: &str, threshold: f64, below: f64, above: f64) -> ExportedTree {
        let feature = FEATURE_NAMES
            .iter()
            .position(|n| *n == feature)
            .expect("known feature");
        ExportedTree {
            class_id,
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { leaf: below },
                TreeNode::Leaf { leaf: above },
            ],
        }
    }

    /// Three stumps: healthy BMI favours Balanced, high blood pressure favours
    /// Low_Sodium, high glucose favours Low_Carb.
    pub fn demo_forest() -> ExportedForest {
        ExportedForest {
            format_version: FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            n_classes: 3,
            base_score: 0.5,
            trees: vec![
                stump(0, "bmi", 25.0, 1.0, -1.0),
                stump(1, "blood_pressure", 140.0, -0.5, 2.0),
                stump(2, "glucose", 126.0, -0.5, 1.5),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::manifest::test_support::{pubkey_b64, signing_key, write_signed_manifest};
    use super::test_support::demo_forest;
    use super::*;
    use crate::domain::{encode, RawInput};
    use tempfile::tempdir;

    fn write_model(dir: &Path, forest: &ExportedForest) -> PathBuf {
        let path = dir.join(DEFAULT_MODEL_FILE);
        let json = serde_json::to_string(forest).expect("serialize model");
        std::fs::write(&path, json).expect("write model");
        path
    }

    #[test]
    fn test_predicts_expected_classes() {
        let predictor = ForestPredictor::from_forest(demo_forest()).expect("valid forest");

        let healthy = encode(&RawInput::default());
        assert_eq!(predictor.predict(&healthy).expect("predict"), 0);

        let hypertensive = encode(&RawInput {
            blood_pressure: 170,
            weight_kg: 95.0,
            ..RawInput::default()
        });
        assert_eq!(predictor.predict(&hypertensive).expect("predict"), 1);

        let diabetic = encode(&RawInput {
            glucose: 180,
            weight_kg: 95.0,
            ..RawInput::default()
        });
        assert_eq!(predictor.predict(&diabetic).expect("predict"), 2);
    }

    #[test]
    fn test_ties_resolve_to_lowest_class() {
        let mut forest = demo_forest();
        forest.trees = vec![
            ExportedTree {
                class_id: 1,
                nodes: vec![TreeNode::Leaf { leaf: 0.7 }],
            },
            ExportedTree {
                class_id: 2,
                nodes: vec![TreeNode::Leaf { leaf: 0.7 }],
            },
        ];
        let predictor = ForestPredictor::from_forest(forest).expect("valid forest");
        let record = encode(&RawInput::default());
        assert_eq!(predictor.predict(&record).expect("predict"), 1);
    }

    #[test]
    fn test_margins_reject_wrong_row_length() {
        let predictor = ForestPredictor::from_forest(demo_forest()).expect("valid forest");
        let err = predictor.margins(&[1.0, 2.0]).expect_err("must fail");
        assert!(matches!(err, PredictorError::Prediction(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let temp = tempdir().expect("tempdir");
        let path = write_model(temp.path(), &demo_forest());

        let predictor =
            ForestPredictor::load(&path, &SignaturePolicy::default()).expect("load model");
        assert_eq!(predictor.n_trees(), 3);
        assert_eq!(predictor.n_classes(), 3);
        assert_eq!(predictor.source(), Some(path.as_path()));
    }

    #[test]
    fn test_missing_artifact_is_model_not_found() {
        let temp = tempdir().expect("tempdir");
        let err = ForestPredictor::load(
            &temp.path().join(DEFAULT_MODEL_FILE),
            &SignaturePolicy::default(),
        )
        .expect_err("must fail");
        assert!(matches!(err, PredictorError::ModelNotFound(_)));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(DEFAULT_MODEL_FILE);
        std::fs::write(&path, "not json").expect("write");
        let err = ForestPredictor::load(&path, &SignaturePolicy::default()).expect_err("must fail");
        assert!(matches!(err, PredictorError::Malformed(_)));
    }

    #[test]
    fn test_validation_rejects_bad_structure() {
        let mut backwards = demo_forest();
        backwards.trees[0].nodes[0] = TreeNode::Split {
            feature: 0,
            threshold: 1.0,
            left: 0,
            right: 2,
        };
        assert!(backwards.validate().is_err());

        let mut bad_feature = demo_forest();
        bad_feature.trees[0].nodes[0] = TreeNode::Split {
            feature: 99,
            threshold: 1.0,
            left: 1,
            right: 2,
        };
        assert!(bad_feature.validate().is_err());

        let mut bad_class = demo_forest();
        bad_class.trees[0].class_id = 3;
        assert!(bad_class.validate().is_err());

        let mut bad_version = demo_forest();
        bad_version.format_version = 2;
        assert!(bad_version.validate().is_err());

        let mut no_trees = demo_forest();
        no_trees.trees.clear();
        assert!(no_trees.validate().is_err());
    }

    #[test]
    fn test_node_json_shapes() {
        let split: TreeNode =
            serde_json::from_str(r#"{"feature":15,"threshold":25.0,"left":1,"right":2}"#)
                .expect("split");
        assert!(matches!(split, TreeNode::Split { feature: 15, .. }));
        let leaf: TreeNode = serde_json::from_str(r#"{"leaf":-0.12}"#).expect("leaf");
        assert_eq!(leaf, TreeNode::Leaf { leaf: -0.12 });
    }

    #[test]
    fn test_load_signed_model() {
        let temp = tempdir().expect("tempdir");
        let path = write_model(temp.path(), &demo_forest());
        let bytes = std::fs::read(&path).expect("read model");

        let key = signing_key();
        write_signed_manifest(temp.path(), &key, &[(DEFAULT_MODEL_FILE, bytes)]);

        let policy = SignaturePolicy {
            require_signature: true,
            verifying_key_b64: Some(pubkey_b64(&key)),
        };
        ForestPredictor::load(&path, &policy).expect("signed model loads");
    }

    #[test]
    fn test_required_signature_missing_fails_closed() {
        let temp = tempdir().expect("tempdir");
        let path = write_model(temp.path(), &demo_forest());
        let policy = SignaturePolicy {
            require_signature: true,
            verifying_key_b64: None,
        };
        let err = ForestPredictor::load(&path, &policy).expect_err("must fail");
        assert!(matches!(err, PredictorError::Signature(_)));
    }
}
