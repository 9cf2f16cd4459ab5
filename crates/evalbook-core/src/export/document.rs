use crate::fingerprint::sha256_hex;
use crate::model::{
    Evaluation, EvaluationSet, Model, Problem, ProblemSet, Submission, SubmissionSet,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One root collection and everything reachable below it, each entity once.
///
/// Sequence order is first-seen order from a single traversal of the root's
/// members. Kinds that cannot occur under the root are absent, not empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub meta: ExportMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<ModelNode>>,
    pub problem_sets: Vec<ProblemSetNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_sets: Option<Vec<SubmissionSetNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_sets: Option<Vec<EvaluationSetNode>>,
    pub problems: Vec<ProblemNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMeta {
    pub data_exported_at: DateTime<Utc>,
    pub problems_listed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submissions_listed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluations_listed: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    pub name: String,
    pub notes: Value,
    #[serde(default)]
    pub is_example: bool,
    pub model_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSetNode {
    pub name: String,
    pub notes: Value,
    pub problem_set_size: usize,
    pub problem_set_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSetNode {
    pub name: String,
    pub notes: Value,
    #[serde(default)]
    pub is_example: bool,
    pub submission_set_size: usize,
    pub submission_set_id: i64,
    pub model_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSetNode {
    pub name: String,
    pub notes: Value,
    #[serde(default)]
    pub is_example: bool,
    pub evaluation_set_size: usize,
    pub evaluation_set_id: i64,
    pub model_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemNode {
    pub input: String,
    pub ideal: String,
    pub rubric: String,
    pub notes: Value,
    pub problem_id: i64,
    pub problem_set_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submissions: Option<Vec<SubmissionNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionNode {
    pub completion: Value,
    pub message: String,
    pub score: f64,
    pub notes: Value,
    pub is_example: bool,
    pub submission_id: i64,
    pub problem_id: i64,
    pub submission_set_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluations: Option<Vec<EvaluationNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationNode {
    pub completion: Value,
    pub message: String,
    pub score: f64,
    pub notes: Value,
    pub evaluation_id: i64,
    pub submission_id: i64,
    pub evaluation_set_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Model> for ModelNode {
    fn from(m: &Model) -> Self {
        Self {
            name: m.name.clone(),
            notes: m.notes.clone(),
            is_example: m.is_example,
            model_id: m.id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl ProblemSetNode {
    pub fn new(ps: &ProblemSet, size: usize) -> Self {
        Self {
            name: ps.name.clone(),
            notes: ps.notes.clone(),
            problem_set_size: size,
            problem_set_id: ps.id,
            created_at: ps.created_at,
            updated_at: ps.updated_at,
        }
    }
}

impl SubmissionSetNode {
    pub fn new(ss: &SubmissionSet, size: usize) -> Self {
        Self {
            name: ss.name.clone(),
            notes: ss.notes.clone(),
            is_example: ss.is_example,
            submission_set_size: size,
            submission_set_id: ss.id,
            model_id: ss.model_id,
            created_at: ss.created_at,
            updated_at: ss.updated_at,
        }
    }
}

impl EvaluationSetNode {
    pub fn new(es: &EvaluationSet, size: usize) -> Self {
        Self {
            name: es.name.clone(),
            notes: es.notes.clone(),
            is_example: es.is_example,
            evaluation_set_size: size,
            evaluation_set_id: es.id,
            model_id: es.model_id,
            created_at: es.created_at,
            updated_at: es.updated_at,
        }
    }
}

impl From<&Problem> for ProblemNode {
    fn from(p: &Problem) -> Self {
        Self {
            input: p.input.clone(),
            ideal: p.ideal.clone(),
            rubric: p.rubric.clone(),
            notes: p.notes.clone(),
            problem_id: p.id,
            problem_set_id: p.problem_set_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
            submissions: None,
        }
    }
}

impl From<&Submission> for SubmissionNode {
    fn from(s: &Submission) -> Self {
        Self {
            completion: s.completion.clone(),
            message: s.message.clone(),
            score: s.score,
            notes: s.notes.clone(),
            is_example: s.is_example,
            submission_id: s.id,
            problem_id: s.problem_id,
            submission_set_id: s.submission_set_id,
            created_at: s.created_at,
            updated_at: s.updated_at,
            evaluations: None,
        }
    }
}

impl From<&Evaluation> for EvaluationNode {
    fn from(e: &Evaluation) -> Self {
        Self {
            completion: e.completion.clone(),
            message: e.message.clone(),
            score: e.score,
            notes: e.notes.clone(),
            evaluation_id: e.id,
            submission_id: e.submission_id,
            evaluation_set_id: e.evaluation_set_id,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Yaml,
    Json,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yaml" | "yml" => Some(ExportFormat::Yaml),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }
}

impl ExportDocument {
    /// Multi-line text (inputs, rubrics, messages) comes out as literal
    /// block scalars.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to serialize export document as YAML")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize export document as JSON")
    }

    pub fn from_yaml(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).context("failed to parse export document YAML")
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("failed to parse export document JSON")
    }

    pub fn render(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Yaml => self.to_yaml(),
            ExportFormat::Json => self.to_json(),
        }
    }

    /// Writes the document in one go; nothing is written if rendering fails.
    pub fn write_to(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let text = self.render(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)
            .with_context(|| format!("failed to write export document: {}", path.display()))?;
        tracing::info!(
            event = "evalbook.export.written",
            path = %path.display(),
            format = ?format
        );
        Ok(())
    }

    /// Reads a document, picking the codec from the extension (YAML otherwise).
    pub fn read_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read export document: {}", path.display()))?;
        match ExportFormat::from_path(path).unwrap_or_default() {
            ExportFormat::Yaml => Self::from_yaml(&raw),
            ExportFormat::Json => Self::from_json(&raw),
        }
    }

    /// Structural identity of the export: sha256 over canonical JSON with the
    /// export timestamp left out.
    pub fn fingerprint(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Some(meta) = value.get_mut("meta").and_then(Value::as_object_mut) {
            meta.remove("data_exported_at");
        }
        Ok(sha256_hex(&serde_json::to_string(&value)?))
    }
}
