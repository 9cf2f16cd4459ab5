//! Loads an export document back into a store.
//!
//! Rows get fresh ids; every reference inside the document is remapped
//! through the ids assigned here, so a reference to anything the document
//! does not carry fails the whole import.

use crate::errors::{Result, StoreError};
use crate::export::{ExportDocument, ProblemNode, SubmissionNode};
use crate::model::{
    EntityKind, Evaluation, EvaluationFields, EvaluationSet, EvaluationSetFields, FieldSet, Model,
    ModelFields, Problem, ProblemFields, ProblemSet, ProblemSetFields, Record, Submission,
    SubmissionFields, SubmissionSet, SubmissionSetFields,
};
use crate::storage::store::insert_row;
use crate::storage::Store;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub models: usize,
    pub problem_sets: usize,
    pub problems: usize,
    pub submission_sets: usize,
    pub submissions: usize,
    pub evaluation_sets: usize,
    pub evaluations: usize,
}

/// Inserts every node of `doc` in one transaction. Nothing is written when
/// any reference fails to resolve.
pub fn import_document(store: &Store, doc: &ExportDocument) -> Result<ImportSummary> {
    let summary = store.transaction(|conn| Importer::new(conn).run(doc))?;
    tracing::info!(
        event = "evalbook.import.completed",
        models = summary.models,
        problems = summary.problems,
        submissions = summary.submissions,
        evaluations = summary.evaluations
    );
    Ok(summary)
}

/// Old id -> new id, per kind.
#[derive(Default)]
struct IdMap(HashMap<i64, i64>);

impl IdMap {
    fn insert(&mut self, kind: EntityKind, old: i64, new: i64) -> Result<()> {
        match self.0.insert(old, new) {
            None => Ok(()),
            Some(_) => Err(StoreError::Document(format!(
                "{kind} {old} appears more than once in the document"
            ))),
        }
    }

    fn resolve(&self, from: EntityKind, from_id: i64, to: EntityKind, old: i64) -> Result<i64> {
        self.0.get(&old).copied().ok_or_else(|| {
            StoreError::Document(format!(
                "{from} {from_id} references {to} {old}, which the document does not contain"
            ))
        })
    }
}

struct Importer<'c> {
    conn: &'c Connection,
    models: IdMap,
    problem_sets: IdMap,
    problems: IdMap,
    submission_sets: IdMap,
    submissions: IdMap,
    evaluation_sets: IdMap,
    evaluations: IdMap,
    summary: ImportSummary,
}

impl<'c> Importer<'c> {
    fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            models: IdMap::default(),
            problem_sets: IdMap::default(),
            problems: IdMap::default(),
            submission_sets: IdMap::default(),
            submissions: IdMap::default(),
            evaluation_sets: IdMap::default(),
            evaluations: IdMap::default(),
            summary: ImportSummary::default(),
        }
    }

    fn insert<R: Record>(
        &self,
        fields: &R::Fields,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<i64> {
        let row: R = insert_row(self.conn, &fields.columns()?, created_at, updated_at)?;
        Ok(row.id())
    }

    fn run(mut self, doc: &ExportDocument) -> Result<ImportSummary> {
        for m in doc.models.iter().flatten() {
            let fields = ModelFields::default()
                .name(m.name.as_str())
                .notes(m.notes.clone())
                .is_example(m.is_example);
            let id = self.insert::<Model>(&fields, m.created_at, m.updated_at)?;
            self.models.insert(EntityKind::Model, m.model_id, id)?;
            self.summary.models += 1;
        }

        for ps in &doc.problem_sets {
            let fields = ProblemSetFields::default()
                .name(ps.name.as_str())
                .notes(ps.notes.clone());
            let id = self.insert::<ProblemSet>(&fields, ps.created_at, ps.updated_at)?;
            self.problem_sets.insert(EntityKind::ProblemSet, ps.problem_set_id, id)?;
            self.summary.problem_sets += 1;
        }

        for p in &doc.problems {
            self.problem(p)?;
        }

        for ss in doc.submission_sets.iter().flatten() {
            let model_id = self.models.resolve(
                EntityKind::SubmissionSet,
                ss.submission_set_id,
                EntityKind::Model,
                ss.model_id,
            )?;
            let fields = SubmissionSetFields::default()
                .model_id(model_id)
                .name(ss.name.as_str())
                .notes(ss.notes.clone())
                .is_example(ss.is_example);
            let id = self.insert::<SubmissionSet>(&fields, ss.created_at, ss.updated_at)?;
            self.submission_sets.insert(EntityKind::SubmissionSet, ss.submission_set_id, id)?;
            self.summary.submission_sets += 1;
        }

        for es in doc.evaluation_sets.iter().flatten() {
            let model_id = self.models.resolve(
                EntityKind::EvaluationSet,
                es.evaluation_set_id,
                EntityKind::Model,
                es.model_id,
            )?;
            let fields = EvaluationSetFields::default()
                .model_id(model_id)
                .name(es.name.as_str())
                .notes(es.notes.clone())
                .is_example(es.is_example);
            let id = self.insert::<EvaluationSet>(&fields, es.created_at, es.updated_at)?;
            self.evaluation_sets.insert(EntityKind::EvaluationSet, es.evaluation_set_id, id)?;
            self.summary.evaluation_sets += 1;
        }

        // Submissions need their set rows, so they go after the set pass.
        for p in &doc.problems {
            for s in p.submissions.iter().flatten() {
                self.submission(p, s)?;
            }
        }

        Ok(self.summary)
    }

    fn problem(&mut self, p: &ProblemNode) -> Result<()> {
        let problem_set_id = self.problem_sets.resolve(
            EntityKind::Problem,
            p.problem_id,
            EntityKind::ProblemSet,
            p.problem_set_id,
        )?;
        let fields = ProblemFields::default()
            .problem_set_id(problem_set_id)
            .input(p.input.as_str())
            .ideal(p.ideal.as_str())
            .rubric(p.rubric.as_str())
            .notes(p.notes.clone());
        let id = self.insert::<Problem>(&fields, p.created_at, p.updated_at)?;
        self.problems.insert(EntityKind::Problem, p.problem_id, id)?;
        self.summary.problems += 1;
        Ok(())
    }

    fn submission(&mut self, p: &ProblemNode, s: &SubmissionNode) -> Result<()> {
        if s.problem_id != p.problem_id {
            return Err(StoreError::Document(format!(
                "submission {} is nested under problem {} but references problem {}",
                s.submission_id, p.problem_id, s.problem_id
            )));
        }
        let problem_id = self.problems.resolve(
            EntityKind::Submission,
            s.submission_id,
            EntityKind::Problem,
            s.problem_id,
        )?;
        let submission_set_id = self.submission_sets.resolve(
            EntityKind::Submission,
            s.submission_id,
            EntityKind::SubmissionSet,
            s.submission_set_id,
        )?;
        let fields = SubmissionFields::default()
            .problem_id(problem_id)
            .submission_set_id(submission_set_id)
            .completion(s.completion.clone())
            .message(s.message.as_str())
            .score(s.score)
            .notes(s.notes.clone())
            .is_example(s.is_example);
        let id = self.insert::<Submission>(&fields, s.created_at, s.updated_at)?;
        self.submissions.insert(EntityKind::Submission, s.submission_id, id)?;
        self.summary.submissions += 1;

        for e in s.evaluations.iter().flatten() {
            if e.submission_id != s.submission_id {
                return Err(StoreError::Document(format!(
                    "evaluation {} is nested under submission {} but references submission {}",
                    e.evaluation_id, s.submission_id, e.submission_id
                )));
            }
            let evaluation_set_id = self.evaluation_sets.resolve(
                EntityKind::Evaluation,
                e.evaluation_id,
                EntityKind::EvaluationSet,
                e.evaluation_set_id,
            )?;
            let fields = EvaluationFields::default()
                .submission_id(id)
                .evaluation_set_id(evaluation_set_id)
                .completion(e.completion.clone())
                .message(e.message.as_str())
                .score(e.score)
                .notes(e.notes.clone());
            let new_id = self.insert::<Evaluation>(&fields, e.created_at, e.updated_at)?;
            self.evaluations.insert(EntityKind::Evaluation, e.evaluation_id, new_id)?;
            self.summary.evaluations += 1;
        }
        Ok(())
    }
}
