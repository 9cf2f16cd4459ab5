#![allow(dead_code)]

use evalbook_core::model::{
    Evaluation, EvaluationFields, EvaluationSet, EvaluationSetFields, Model, ModelFields, Problem,
    ProblemFields, ProblemSet, ProblemSetFields, Submission, SubmissionFields, SubmissionSet,
    SubmissionSetFields,
};
use evalbook_core::{get_or_create, ResolveOptions, Store};
use serde_json::json;

pub fn memory_store() -> Store {
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    store
}

/// One grading run over one problem: two submissions to problem A, each
/// graded once in evaluation set E1.
pub struct Graded {
    pub run_model: Model,
    pub grader: Model,
    pub problem_set: ProblemSet,
    pub problem_a: Problem,
    pub run: SubmissionSet,
    pub sub1: Submission,
    pub sub2: Submission,
    pub e1: EvaluationSet,
    pub ev1: Evaluation,
    pub ev2: Evaluation,
}

pub fn model(store: &Store, name: &str) -> Model {
    get_or_create(
        store,
        &ModelFields::default().name(name),
        &ModelFields::default(),
        ResolveOptions::default(),
    )
    .unwrap()
}

pub fn problem_set(store: &Store, name: &str) -> ProblemSet {
    get_or_create(
        store,
        &ProblemSetFields::default().name(name),
        &ProblemSetFields::default().notes(json!({"source": "fixture"})),
        ResolveOptions::default(),
    )
    .unwrap()
}

pub fn problem(store: &Store, ps: &ProblemSet, input: &str) -> Problem {
    get_or_create(
        store,
        &ProblemFields::default().problem_set_id(ps.id).input(input),
        &ProblemFields::default()
            .ideal("4")
            .rubric("Award 1.0 for the right number.\nAward 0.5 if only the working is right."),
        ResolveOptions::default(),
    )
    .unwrap()
}

pub fn submission_set(store: &Store, model: &Model, name: &str) -> SubmissionSet {
    get_or_create(
        store,
        &SubmissionSetFields::default().model_id(model.id).name(name),
        &SubmissionSetFields::default(),
        ResolveOptions::default(),
    )
    .unwrap()
}

pub fn submission(
    store: &Store,
    set: &SubmissionSet,
    problem: &Problem,
    answer: &str,
) -> Submission {
    get_or_create(
        store,
        &SubmissionFields::default()
            .submission_set_id(set.id)
            .problem_id(problem.id)
            .completion(json!({"answer": answer})),
        &SubmissionFields::default().message(format!("answered {answer}")),
        ResolveOptions::default(),
    )
    .unwrap()
}

pub fn evaluation_set(store: &Store, grader: &Model, name: &str) -> EvaluationSet {
    get_or_create(
        store,
        &EvaluationSetFields::default().model_id(grader.id).name(name),
        &EvaluationSetFields::default(),
        ResolveOptions::default(),
    )
    .unwrap()
}

pub fn evaluation(store: &Store, set: &EvaluationSet, sub: &Submission, score: f64) -> Evaluation {
    get_or_create(
        store,
        &EvaluationFields::default()
            .evaluation_set_id(set.id)
            .submission_id(sub.id),
        &EvaluationFields::default()
            .score(score)
            .message("graded against rubric"),
        ResolveOptions::default(),
    )
    .unwrap()
}

pub fn graded(store: &Store) -> Graded {
    let run_model = model(store, "gpt-run");
    let grader = model(store, "grader");
    let problem_set = problem_set(store, "arithmetic");
    let problem_a = problem(store, &problem_set, "What is 2+2?\nShow your work.");
    let run = submission_set(store, &run_model, "run-1");
    let sub1 = submission(store, &run, &problem_a, "4");
    let sub2 = submission(store, &run, &problem_a, "5");
    let e1 = evaluation_set(store, &grader, "E1");
    let ev1 = evaluation(store, &e1, &sub1, 1.0);
    let ev2 = evaluation(store, &e1, &sub2, 0.0);
    Graded {
        run_model,
        grader,
        problem_set,
        problem_a,
        run,
        sub1,
        sub2,
        e1,
        ev1,
        ev2,
    }
}
