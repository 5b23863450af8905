//! Downloadable result documents.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Answer;
use crate::proctor::ProctorSummary;

/// A graded attempt as written to disk for the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultExport {
    pub quiz_title: String,
    pub answers: Vec<Answer>,
    pub score: u32,
    pub proctor: ProctorSummary,
}

impl ResultExport {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize result export")
    }

    /// Save the export as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
        Ok(())
    }

    /// Load an export from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read results from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse results JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerValue, QuestionType};

    #[test]
    fn save_and_load() {
        let export = ResultExport {
            quiz_title: "Rust".into(),
            answers: vec![Answer {
                question_id: "q1".into(),
                question_type: QuestionType::Text,
                value: Some(AnswerValue::Text("moves ownership".into())),
                correct: None,
                points_awarded: 0,
            }],
            score: 0,
            proctor: ProctorSummary::default(),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("result.json");
        export.save_json(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["quizTitle"], "Rust");
        assert_eq!(raw["answers"][0]["questionId"], "q1");
        assert_eq!(raw["answers"][0]["type"], "text");
        assert!(raw["answers"][0]["correct"].is_null());
        assert_eq!(raw["answers"][0]["pointsAwarded"], 0);
        assert_eq!(raw["proctor"]["enabled"], false);

        assert_eq!(ResultExport::load_json(&path).unwrap(), export);
    }
}
