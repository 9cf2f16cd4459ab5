use crate::errors::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Model,
    ProblemSet,
    Problem,
    SubmissionSet,
    Submission,
    EvaluationSet,
    Evaluation,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Model => "models",
            EntityKind::ProblemSet => "problem_sets",
            EntityKind::Problem => "problems",
            EntityKind::SubmissionSet => "submission_sets",
            EntityKind::Submission => "submissions",
            EntityKind::EvaluationSet => "evaluation_sets",
            EntityKind::Evaluation => "evaluations",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Model => "model",
            EntityKind::ProblemSet => "problem_set",
            EntityKind::Problem => "problem",
            EntityKind::SubmissionSet => "submission_set",
            EntityKind::Submission => "submission",
            EntityKind::EvaluationSet => "evaluation_set",
            EntityKind::Evaluation => "evaluation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which members of a collection an export walks.
///
/// `Owned` follows the owning foreign key only. `OwnedAndLinked` also walks
/// the collection's association table, after the owned members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    #[default]
    Owned,
    OwnedAndLinked,
}

// ---------------------------------------------------------------------------
// Structured value codec (notes / completion columns)
// ---------------------------------------------------------------------------

/// Default content of a notes or completion column: the encoded empty string.
pub fn empty_structured() -> Value {
    Value::String(String::new())
}

pub fn encode_structured(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Blank column text decodes to the empty string rather than failing.
pub fn decode_structured(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(empty_structured());
    }
    Ok(serde_json::from_str(raw)?)
}

fn is_empty_structured(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Columns and the record contract
// ---------------------------------------------------------------------------

/// One named column value taken from a typed field set.
///
/// `empty` marks values that an update skips unless null overwrites are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub value: SqlValue,
    pub empty: bool,
}

impl Column {
    pub fn text(name: &'static str, value: &str) -> Self {
        Self {
            name,
            value: SqlValue::Text(value.to_string()),
            empty: value.is_empty(),
        }
    }

    pub fn integer(name: &'static str, value: i64) -> Self {
        Self {
            name,
            value: SqlValue::Integer(value),
            empty: false,
        }
    }

    pub fn real(name: &'static str, value: f64) -> Self {
        Self {
            name,
            value: SqlValue::Real(value),
            empty: false,
        }
    }

    pub fn boolean(name: &'static str, value: bool) -> Self {
        Self {
            name,
            value: SqlValue::Integer(i64::from(value)),
            empty: false,
        }
    }

    pub fn structured(name: &'static str, value: &Value) -> Result<Self> {
        Ok(Self {
            name,
            value: SqlValue::Text(encode_structured(value)?),
            empty: is_empty_structured(value),
        })
    }

    pub(crate) fn describe(&self) -> String {
        match &self.value {
            SqlValue::Null => format!("{}=null", self.name),
            SqlValue::Integer(i) => format!("{}={}", self.name, i),
            SqlValue::Real(r) => format!("{}={}", self.name, r),
            SqlValue::Text(t) => format!("{}={:?}", self.name, t),
            SqlValue::Blob(b) => format!("{}=<{} bytes>", self.name, b.len()),
        }
    }
}

pub(crate) fn describe_columns(cols: &[Column]) -> String {
    let parts: Vec<String> = cols.iter().map(Column::describe).collect();
    format!("{{{}}}", parts.join(", "))
}

/// A typed set of optional column values, used both as search criteria and
/// as fill criteria. Unset fields are not mentioned at all.
pub trait FieldSet {
    fn columns(&self) -> Result<Vec<Column>>;
}

/// A persisted row kind.
///
/// Rows are read as `id, created_at, updated_at` followed by `COLUMNS`.
pub trait Record: Sized {
    const KIND: EntityKind;
    const COLUMNS: &'static [&'static str];
    /// Columns that must be supplied when a row is created.
    const REQUIRED: &'static [&'static str];

    type Fields: FieldSet + Default;

    fn id(&self) -> i64;
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
}

/// Singular parent edge (`child.<relation>`).
pub trait BelongsTo<P: Record>: Record {
    const RELATION: &'static str;
    fn parent_id(&self) -> i64;
}

/// Child collection edge, keyed by the child's foreign key column.
pub trait HasMany<C: Record>: Record {
    const FOREIGN_KEY: &'static str;
}

/// Many-to-many association between a collection and its members.
pub trait Collects<M: Record>: HasMany<M> {
    const LINK_TABLE: &'static str;
    const SET_COLUMN: &'static str;
    const MEMBER_COLUMN: &'static str;
}

pub(crate) fn timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn structured(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Value> {
    let raw: String = row.get(idx)?;
    decode_structured(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A named generator or grader, e.g. one LLM configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub notes: Value,
    pub is_example: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelFields {
    pub name: Option<String>,
    pub notes: Option<Value>,
    pub is_example: Option<bool>,
}

impl ModelFields {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn notes(mut self, notes: Value) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn is_example(mut self, is_example: bool) -> Self {
        self.is_example = Some(is_example);
        self
    }
}

impl FieldSet for ModelFields {
    fn columns(&self) -> Result<Vec<Column>> {
        let mut cols = Vec::new();
        if let Some(v) = &self.name {
            cols.push(Column::text("name", v));
        }
        if let Some(v) = &self.notes {
            cols.push(Column::structured("notes_json", v)?);
        }
        if let Some(v) = self.is_example {
            cols.push(Column::boolean("is_example", v));
        }
        Ok(cols)
    }
}

impl Record for Model {
    const KIND: EntityKind = EntityKind::Model;
    const COLUMNS: &'static [&'static str] = &["name", "notes_json", "is_example"];
    const REQUIRED: &'static [&'static str] = &["name"];
    type Fields = ModelFields;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: timestamp(row, 1)?,
            updated_at: timestamp(row, 2)?,
            name: row.get(3)?,
            notes: structured(row, 4)?,
            is_example: row.get(5)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ProblemSet / Problem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSet {
    pub id: i64,
    pub name: String,
    pub notes: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemSetFields {
    pub name: Option<String>,
    pub notes: Option<Value>,
}

impl ProblemSetFields {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn notes(mut self, notes: Value) -> Self {
        self.notes = Some(notes);
        self
    }
}

impl FieldSet for ProblemSetFields {
    fn columns(&self) -> Result<Vec<Column>> {
        let mut cols = Vec::new();
        if let Some(v) = &self.name {
            cols.push(Column::text("name", v));
        }
        if let Some(v) = &self.notes {
            cols.push(Column::structured("notes_json", v)?);
        }
        Ok(cols)
    }
}

impl Record for ProblemSet {
    const KIND: EntityKind = EntityKind::ProblemSet;
    const COLUMNS: &'static [&'static str] = &["name", "notes_json"];
    const REQUIRED: &'static [&'static str] = &["name"];
    type Fields = ProblemSetFields;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: timestamp(row, 1)?,
            updated_at: timestamp(row, 2)?,
            name: row.get(3)?,
            notes: structured(row, 4)?,
        })
    }
}

/// One task instance. Owned by exactly one problem set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub problem_set_id: i64,
    pub input: String,
    pub ideal: String,
    pub rubric: String,
    pub notes: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemFields {
    pub problem_set_id: Option<i64>,
    pub input: Option<String>,
    pub ideal: Option<String>,
    pub rubric: Option<String>,
    pub notes: Option<Value>,
}

impl ProblemFields {
    pub fn problem_set_id(mut self, id: i64) -> Self {
        self.problem_set_id = Some(id);
        self
    }

    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn ideal(mut self, ideal: impl Into<String>) -> Self {
        self.ideal = Some(ideal.into());
        self
    }

    pub fn rubric(mut self, rubric: impl Into<String>) -> Self {
        self.rubric = Some(rubric.into());
        self
    }

    pub fn notes(mut self, notes: Value) -> Self {
        self.notes = Some(notes);
        self
    }
}

impl FieldSet for ProblemFields {
    fn columns(&self) -> Result<Vec<Column>> {
        let mut cols = Vec::new();
        if let Some(v) = self.problem_set_id {
            cols.push(Column::integer("problem_set_id", v));
        }
        if let Some(v) = &self.input {
            cols.push(Column::text("input", v));
        }
        if let Some(v) = &self.ideal {
            cols.push(Column::text("ideal", v));
        }
        if let Some(v) = &self.rubric {
            cols.push(Column::text("rubric", v));
        }
        if let Some(v) = &self.notes {
            cols.push(Column::structured("notes_json", v)?);
        }
        Ok(cols)
    }
}

impl Record for Problem {
    const KIND: EntityKind = EntityKind::Problem;
    const COLUMNS: &'static [&'static str] =
        &["problem_set_id", "input", "ideal", "rubric", "notes_json"];
    const REQUIRED: &'static [&'static str] = &["problem_set_id"];
    type Fields = ProblemFields;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: timestamp(row, 1)?,
            updated_at: timestamp(row, 2)?,
            problem_set_id: row.get(3)?,
            input: row.get(4)?,
            ideal: row.get(5)?,
            rubric: row.get(6)?,
            notes: structured(row, 7)?,
        })
    }
}

// ---------------------------------------------------------------------------
// SubmissionSet / Submission
// ---------------------------------------------------------------------------

/// A named run: every submission one model produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSet {
    pub id: i64,
    pub model_id: i64,
    pub name: String,
    pub notes: Value,
    pub is_example: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionSetFields {
    pub model_id: Option<i64>,
    pub name: Option<String>,
    pub notes: Option<Value>,
    pub is_example: Option<bool>,
}

impl SubmissionSetFields {
    pub fn model_id(mut self, id: i64) -> Self {
        self.model_id = Some(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn notes(mut self, notes: Value) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn is_example(mut self, is_example: bool) -> Self {
        self.is_example = Some(is_example);
        self
    }
}

impl FieldSet for SubmissionSetFields {
    fn columns(&self) -> Result<Vec<Column>> {
        let mut cols = Vec::new();
        if let Some(v) = self.model_id {
            cols.push(Column::integer("model_id", v));
        }
        if let Some(v) = &self.name {
            cols.push(Column::text("name", v));
        }
        if let Some(v) = &self.notes {
            cols.push(Column::structured("notes_json", v)?);
        }
        if let Some(v) = self.is_example {
            cols.push(Column::boolean("is_example", v));
        }
        Ok(cols)
    }
}

impl Record for SubmissionSet {
    const KIND: EntityKind = EntityKind::SubmissionSet;
    const COLUMNS: &'static [&'static str] = &["model_id", "name", "notes_json", "is_example"];
    const REQUIRED: &'static [&'static str] = &["model_id", "name"];
    type Fields = SubmissionSetFields;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: timestamp(row, 1)?,
            updated_at: timestamp(row, 2)?,
            model_id: row.get(3)?,
            name: row.get(4)?,
            notes: structured(row, 5)?,
            is_example: row.get(6)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub problem_id: i64,
    pub submission_set_id: i64,
    pub completion: Value,
    pub message: String,
    pub score: f64,
    pub notes: Value,
    pub is_example: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionFields {
    pub problem_id: Option<i64>,
    pub submission_set_id: Option<i64>,
    pub completion: Option<Value>,
    pub message: Option<String>,
    pub score: Option<f64>,
    pub notes: Option<Value>,
    pub is_example: Option<bool>,
}

impl SubmissionFields {
    pub fn problem_id(mut self, id: i64) -> Self {
        self.problem_id = Some(id);
        self
    }

    pub fn submission_set_id(mut self, id: i64) -> Self {
        self.submission_set_id = Some(id);
        self
    }

    pub fn completion(mut self, completion: Value) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn notes(mut self, notes: Value) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn is_example(mut self, is_example: bool) -> Self {
        self.is_example = Some(is_example);
        self
    }
}

impl FieldSet for SubmissionFields {
    fn columns(&self) -> Result<Vec<Column>> {
        let mut cols = Vec::new();
        if let Some(v) = self.problem_id {
            cols.push(Column::integer("problem_id", v));
        }
        if let Some(v) = self.submission_set_id {
            cols.push(Column::integer("submission_set_id", v));
        }
        if let Some(v) = &self.completion {
            cols.push(Column::structured("completion_json", v)?);
        }
        if let Some(v) = &self.message {
            cols.push(Column::text("message", v));
        }
        if let Some(v) = self.score {
            cols.push(Column::real("score", v));
        }
        if let Some(v) = &self.notes {
            cols.push(Column::structured("notes_json", v)?);
        }
        if let Some(v) = self.is_example {
            cols.push(Column::boolean("is_example", v));
        }
        Ok(cols)
    }
}

impl Record for Submission {
    const KIND: EntityKind = EntityKind::Submission;
    const COLUMNS: &'static [&'static str] = &[
        "problem_id",
        "submission_set_id",
        "completion_json",
        "message",
        "score",
        "notes_json",
        "is_example",
    ];
    const REQUIRED: &'static [&'static str] = &["problem_id", "submission_set_id"];
    type Fields = SubmissionFields;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: timestamp(row, 1)?,
            updated_at: timestamp(row, 2)?,
            problem_id: row.get(3)?,
            submission_set_id: row.get(4)?,
            completion: structured(row, 5)?,
            message: row.get(6)?,
            score: row.get(7)?,
            notes: structured(row, 8)?,
            is_example: row.get(9)?,
        })
    }
}

// ---------------------------------------------------------------------------
// EvaluationSet / Evaluation
// ---------------------------------------------------------------------------

/// A named grading run: every evaluation one grader model produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSet {
    pub id: i64,
    pub model_id: i64,
    pub name: String,
    pub notes: Value,
    pub is_example: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationSetFields {
    pub model_id: Option<i64>,
    pub name: Option<String>,
    pub notes: Option<Value>,
    pub is_example: Option<bool>,
}

impl EvaluationSetFields {
    pub fn model_id(mut self, id: i64) -> Self {
        self.model_id = Some(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn notes(mut self, notes: Value) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn is_example(mut self, is_example: bool) -> Self {
        self.is_example = Some(is_example);
        self
    }
}

impl FieldSet for EvaluationSetFields {
    fn columns(&self) -> Result<Vec<Column>> {
        let mut cols = Vec::new();
        if let Some(v) = self.model_id {
            cols.push(Column::integer("model_id", v));
        }
        if let Some(v) = &self.name {
            cols.push(Column::text("name", v));
        }
        if let Some(v) = &self.notes {
            cols.push(Column::structured("notes_json", v)?);
        }
        if let Some(v) = self.is_example {
            cols.push(Column::boolean("is_example", v));
        }
        Ok(cols)
    }
}

impl Record for EvaluationSet {
    const KIND: EntityKind = EntityKind::EvaluationSet;
    const COLUMNS: &'static [&'static str] = &["model_id", "name", "notes_json", "is_example"];
    const REQUIRED: &'static [&'static str] = &["model_id", "name"];
    type Fields = EvaluationSetFields;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: timestamp(row, 1)?,
            updated_at: timestamp(row, 2)?,
            model_id: row.get(3)?,
            name: row.get(4)?,
            notes: structured(row, 5)?,
            is_example: row.get(6)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: i64,
    pub submission_id: i64,
    pub evaluation_set_id: i64,
    pub completion: Value,
    pub message: String,
    pub score: f64,
    pub notes: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationFields {
    pub submission_id: Option<i64>,
    pub evaluation_set_id: Option<i64>,
    pub completion: Option<Value>,
    pub message: Option<String>,
    pub score: Option<f64>,
    pub notes: Option<Value>,
}

impl EvaluationFields {
    pub fn submission_id(mut self, id: i64) -> Self {
        self.submission_id = Some(id);
        self
    }

    pub fn evaluation_set_id(mut self, id: i64) -> Self {
        self.evaluation_set_id = Some(id);
        self
    }

    pub fn completion(mut self, completion: Value) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn notes(mut self, notes: Value) -> Self {
        self.notes = Some(notes);
        self
    }
}

impl FieldSet for EvaluationFields {
    fn columns(&self) -> Result<Vec<Column>> {
        let mut cols = Vec::new();
        if let Some(v) = self.submission_id {
            cols.push(Column::integer("submission_id", v));
        }
        if let Some(v) = self.evaluation_set_id {
            cols.push(Column::integer("evaluation_set_id", v));
        }
        if let Some(v) = &self.completion {
            cols.push(Column::structured("completion_json", v)?);
        }
        if let Some(v) = &self.message {
            cols.push(Column::text("message", v));
        }
        if let Some(v) = self.score {
            cols.push(Column::real("score", v));
        }
        if let Some(v) = &self.notes {
            cols.push(Column::structured("notes_json", v)?);
        }
        Ok(cols)
    }
}

impl Record for Evaluation {
    const KIND: EntityKind = EntityKind::Evaluation;
    const COLUMNS: &'static [&'static str] = &[
        "submission_id",
        "evaluation_set_id",
        "completion_json",
        "message",
        "score",
        "notes_json",
    ];
    const REQUIRED: &'static [&'static str] = &["submission_id", "evaluation_set_id"];
    type Fields = EvaluationFields;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: timestamp(row, 1)?,
            updated_at: timestamp(row, 2)?,
            submission_id: row.get(3)?,
            evaluation_set_id: row.get(4)?,
            completion: structured(row, 5)?,
            message: row.get(6)?,
            score: row.get(7)?,
            notes: structured(row, 8)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

impl BelongsTo<ProblemSet> for Problem {
    const RELATION: &'static str = "problem_set";
    fn parent_id(&self) -> i64 {
        self.problem_set_id
    }
}

impl BelongsTo<Model> for SubmissionSet {
    const RELATION: &'static str = "model";
    fn parent_id(&self) -> i64 {
        self.model_id
    }
}

impl BelongsTo<Problem> for Submission {
    const RELATION: &'static str = "problem";
    fn parent_id(&self) -> i64 {
        self.problem_id
    }
}

impl BelongsTo<SubmissionSet> for Submission {
    const RELATION: &'static str = "submission_set";
    fn parent_id(&self) -> i64 {
        self.submission_set_id
    }
}

impl BelongsTo<Model> for EvaluationSet {
    const RELATION: &'static str = "model";
    fn parent_id(&self) -> i64 {
        self.model_id
    }
}

impl BelongsTo<Submission> for Evaluation {
    const RELATION: &'static str = "submission";
    fn parent_id(&self) -> i64 {
        self.submission_id
    }
}

impl BelongsTo<EvaluationSet> for Evaluation {
    const RELATION: &'static str = "evaluation_set";
    fn parent_id(&self) -> i64 {
        self.evaluation_set_id
    }
}

impl HasMany<SubmissionSet> for Model {
    const FOREIGN_KEY: &'static str = "model_id";
}

impl HasMany<EvaluationSet> for Model {
    const FOREIGN_KEY: &'static str = "model_id";
}

impl HasMany<Problem> for ProblemSet {
    const FOREIGN_KEY: &'static str = "problem_set_id";
}

impl HasMany<Submission> for Problem {
    const FOREIGN_KEY: &'static str = "problem_id";
}

impl HasMany<Submission> for SubmissionSet {
    const FOREIGN_KEY: &'static str = "submission_set_id";
}

impl HasMany<Evaluation> for Submission {
    const FOREIGN_KEY: &'static str = "submission_id";
}

impl HasMany<Evaluation> for EvaluationSet {
    const FOREIGN_KEY: &'static str = "evaluation_set_id";
}

impl Collects<Problem> for ProblemSet {
    const LINK_TABLE: &'static str = "problem_set_problems";
    const SET_COLUMN: &'static str = "problem_set_id";
    const MEMBER_COLUMN: &'static str = "problem_id";
}

impl Collects<Submission> for SubmissionSet {
    const LINK_TABLE: &'static str = "submission_set_submissions";
    const SET_COLUMN: &'static str = "submission_set_id";
    const MEMBER_COLUMN: &'static str = "submission_id";
}

impl Collects<Evaluation> for EvaluationSet {
    const LINK_TABLE: &'static str = "evaluation_set_evaluations";
    const SET_COLUMN: &'static str = "evaluation_set_id";
    const MEMBER_COLUMN: &'static str = "evaluation_id";
}
