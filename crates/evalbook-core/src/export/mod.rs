//! Flattens a root collection into one deduplicated, nested document.
//!
//! The graph under an evaluation set is a DAG: many evaluations can share a
//! submission and many submissions a problem. The export walks the root's
//! members once, in primary-key order, and records every ancestor on first
//! encounter only, so each entity appears once and later encounters only add
//! nested children.

mod accumulator;
pub mod document;

pub use document::{
    EvaluationNode, EvaluationSetNode, ExportDocument, ExportFormat, ExportMeta, ModelNode,
    ProblemNode, ProblemSetNode, SubmissionNode, SubmissionSetNode,
};

use crate::errors::{Result, StoreError};
use crate::model::{
    EntityKind, Evaluation, EvaluationSet, Membership, Model, Problem, ProblemSet, Submission,
    SubmissionSet,
};
use crate::storage::Store;
use accumulator::Keyed;
use chrono::Utc;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub membership: Membership,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportRoot {
    ProblemSet(i64),
    SubmissionSet(i64),
    EvaluationSet(i64),
}

pub fn export(store: &Store, root: ExportRoot, opts: ExportOptions) -> Result<ExportDocument> {
    match root {
        ExportRoot::ProblemSet(id) => export_problem_set(store, &store.get(id)?, opts),
        ExportRoot::SubmissionSet(id) => export_submission_set(store, &store.get(id)?, opts),
        ExportRoot::EvaluationSet(id) => export_evaluation_set(store, &store.get(id)?, opts),
    }
}

pub fn export_problem_set(
    store: &Store,
    root: &ProblemSet,
    opts: ExportOptions,
) -> Result<ExportDocument> {
    let mut lineage = Lineage::new(store, opts.membership);
    let problems: Vec<Problem> = store.members(root, opts.membership)?;
    lineage
        .problem_sets
        .record(root.id, ProblemSetNode::new(root, problems.len()));

    for problem in &problems {
        lineage.problem_set_of(problem)?;
        lineage.problems.record(problem.id, ProblemEntry::new(problem));
    }

    Ok(lineage.finish(Depth::Problems, root.id))
}

pub fn export_submission_set(
    store: &Store,
    root: &SubmissionSet,
    opts: ExportOptions,
) -> Result<ExportDocument> {
    let mut lineage = Lineage::new(store, opts.membership);
    let submissions: Vec<Submission> = store.members(root, opts.membership)?;
    lineage
        .submission_sets
        .record(root.id, SubmissionSetNode::new(root, submissions.len()));
    lineage.model(EntityKind::SubmissionSet, root.id, root.model_id)?;

    for submission in &submissions {
        let model_id = lineage.submission_set_of(submission)?;
        lineage.model(EntityKind::SubmissionSet, submission.submission_set_id, model_id)?;

        lineage.submissions_seen.insert(submission.id);
        lineage
            .problem_entry(submission)?
            .submissions
            .get_or_insert_with(submission.id, || SubmissionEntry::new(submission));
    }

    Ok(lineage.finish(Depth::Submissions, root.id))
}

pub fn export_evaluation_set(
    store: &Store,
    root: &EvaluationSet,
    opts: ExportOptions,
) -> Result<ExportDocument> {
    let mut lineage = Lineage::new(store, opts.membership);
    let evaluations: Vec<Evaluation> = store.members(root, opts.membership)?;
    lineage
        .evaluation_sets
        .record(root.id, EvaluationSetNode::new(root, evaluations.len()));

    for evaluation in &evaluations {
        let submission: Submission = store.parent(evaluation)?;

        // Ancestors: submission set, its model, then the grading model.
        let run_model = lineage.submission_set_of(&submission)?;
        lineage.model(EntityKind::SubmissionSet, submission.submission_set_id, run_model)?;
        let grader_model = lineage.evaluation_set_of(evaluation)?;
        lineage.model(EntityKind::EvaluationSet, evaluation.evaluation_set_id, grader_model)?;

        lineage.submissions_seen.insert(submission.id);
        lineage.evaluations_seen.insert(evaluation.id);
        lineage
            .problem_entry(&submission)?
            .submissions
            .get_or_insert_with(submission.id, || SubmissionEntry::new(&submission))
            .evaluations
            .get_or_insert_with(evaluation.id, || EvaluationNode::from(evaluation));
    }

    // The root's grader must resolve even when no evaluation reached it.
    lineage.model(EntityKind::EvaluationSet, root.id, root.model_id)?;

    Ok(lineage.finish(Depth::Evaluations, root.id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Depth {
    Problems,
    Submissions,
    Evaluations,
}

impl Depth {
    fn root_kind(self) -> EntityKind {
        match self {
            Depth::Problems => EntityKind::ProblemSet,
            Depth::Submissions => EntityKind::SubmissionSet,
            Depth::Evaluations => EntityKind::EvaluationSet,
        }
    }
}

struct ProblemEntry {
    node: ProblemNode,
    submissions: Keyed<SubmissionEntry>,
}

impl ProblemEntry {
    fn new(problem: &Problem) -> Self {
        Self {
            node: ProblemNode::from(problem),
            submissions: Keyed::default(),
        }
    }

    fn finish(self, depth: Depth) -> ProblemNode {
        let mut node = self.node;
        if depth >= Depth::Submissions {
            node.submissions = Some(
                self.submissions
                    .into_vec()
                    .into_iter()
                    .map(|s| s.finish(depth))
                    .collect(),
            );
        }
        node
    }
}

struct SubmissionEntry {
    node: SubmissionNode,
    evaluations: Keyed<EvaluationNode>,
}

impl SubmissionEntry {
    fn new(submission: &Submission) -> Self {
        Self {
            node: SubmissionNode::from(submission),
            evaluations: Keyed::default(),
        }
    }

    fn finish(self, depth: Depth) -> SubmissionNode {
        let mut node = self.node;
        if depth >= Depth::Evaluations {
            node.evaluations = Some(self.evaluations.into_vec());
        }
        node
    }
}

/// The keyed accumulators for one traversal.
struct Lineage<'a> {
    store: &'a Store,
    membership: Membership,
    models: Keyed<ModelNode>,
    problem_sets: Keyed<ProblemSetNode>,
    submission_sets: Keyed<SubmissionSetNode>,
    evaluation_sets: Keyed<EvaluationSetNode>,
    problems: Keyed<ProblemEntry>,
    submissions_seen: HashSet<i64>,
    evaluations_seen: HashSet<i64>,
}

impl<'a> Lineage<'a> {
    fn new(store: &'a Store, membership: Membership) -> Self {
        Self {
            store,
            membership,
            models: Keyed::default(),
            problem_sets: Keyed::default(),
            submission_sets: Keyed::default(),
            evaluation_sets: Keyed::default(),
            problems: Keyed::default(),
            submissions_seen: HashSet::new(),
            evaluations_seen: HashSet::new(),
        }
    }

    fn model(&mut self, owner: EntityKind, owner_id: i64, model_id: i64) -> Result<()> {
        if self.models.contains(model_id) {
            return Ok(());
        }
        let model: Model = self.store.get(model_id).map_err(|e| match e {
            StoreError::NotFound { .. } => StoreError::Integrity {
                kind: owner,
                id: owner_id,
                relation: "model",
            },
            other => other,
        })?;
        self.models.record(model.id, ModelNode::from(&model));
        Ok(())
    }

    fn problem_set_of(&mut self, problem: &Problem) -> Result<()> {
        if self.problem_sets.contains(problem.problem_set_id) {
            return Ok(());
        }
        let ps: ProblemSet = self.store.parent(problem)?;
        let size = self.store.member_count::<ProblemSet, Problem>(&ps, self.membership)? as usize;
        self.problem_sets.record(ps.id, ProblemSetNode::new(&ps, size));
        Ok(())
    }

    /// Records the submission's set on first sight; returns that set's model id.
    fn submission_set_of(&mut self, submission: &Submission) -> Result<i64> {
        if let Some(node) = self.submission_sets.get(submission.submission_set_id) {
            return Ok(node.model_id);
        }
        let ss: SubmissionSet = self.store.parent(submission)?;
        let size =
            self.store.member_count::<SubmissionSet, Submission>(&ss, self.membership)? as usize;
        self.submission_sets
            .record(ss.id, SubmissionSetNode::new(&ss, size));
        Ok(ss.model_id)
    }

    /// Records the evaluation's set on first sight; returns that set's model id.
    fn evaluation_set_of(&mut self, evaluation: &Evaluation) -> Result<i64> {
        if let Some(node) = self.evaluation_sets.get(evaluation.evaluation_set_id) {
            return Ok(node.model_id);
        }
        let es: EvaluationSet = self.store.parent(evaluation)?;
        let size =
            self.store.member_count::<EvaluationSet, Evaluation>(&es, self.membership)? as usize;
        self.evaluation_sets
            .record(es.id, EvaluationSetNode::new(&es, size));
        Ok(es.model_id)
    }

    /// The problem node a submission nests under, created (with its problem
    /// set) on first sight.
    fn problem_entry(&mut self, submission: &Submission) -> Result<&mut ProblemEntry> {
        if !self.problems.contains(submission.problem_id) {
            let problem: Problem = self.store.parent(submission)?;
            self.problem_set_of(&problem)?;
            self.problems.record(problem.id, ProblemEntry::new(&problem));
        }
        self.problems
            .get_mut(submission.problem_id)
            .ok_or(StoreError::Integrity {
                kind: EntityKind::Submission,
                id: submission.id,
                relation: "problem",
            })
    }

    fn finish(self, depth: Depth, root_id: i64) -> ExportDocument {
        let Lineage {
            models,
            problem_sets,
            submission_sets,
            evaluation_sets,
            problems,
            submissions_seen,
            evaluations_seen,
            ..
        } = self;

        let problems: Vec<ProblemNode> = problems
            .into_vec()
            .into_iter()
            .map(|p| p.finish(depth))
            .collect();

        let meta = ExportMeta {
            data_exported_at: Utc::now(),
            problems_listed: problems.len(),
            submissions_listed: (depth >= Depth::Submissions).then_some(submissions_seen.len()),
            evaluations_listed: (depth >= Depth::Evaluations).then_some(evaluations_seen.len()),
        };

        tracing::info!(
            event = "evalbook.export.completed",
            kind = %depth.root_kind(),
            id = root_id,
            models = models.len(),
            problem_sets = problem_sets.len(),
            problems = meta.problems_listed,
            submissions = ?meta.submissions_listed,
            evaluations = ?meta.evaluations_listed,
        );

        ExportDocument {
            meta,
            models: (depth >= Depth::Submissions).then(|| models.into_vec()),
            problem_sets: problem_sets.into_vec(),
            submission_sets: (depth >= Depth::Submissions).then(|| submission_sets.into_vec()),
            evaluation_sets: (depth >= Depth::Evaluations).then(|| evaluation_sets.into_vec()),
            problems,
        }
    }
}
