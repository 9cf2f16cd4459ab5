mod common;

use common::{memory_store, model, problem, problem_set, submission_set};
use evalbook_core::model::{
    EntityKind, Model, ModelFields, Problem, ProblemFields, Submission, SubmissionFields,
};
use evalbook_core::{get_or_create, update_or_create, ResolveOptions, StoreError};
use serde_json::json;
use std::thread::sleep;
use std::time::Duration;

#[test]
fn get_or_create_is_idempotent() {
    let store = memory_store();

    let first = model(&store, "gpt-4o");
    let second = model(&store, "gpt-4o");

    assert_eq!(first.id, second.id);
    assert_eq!(first, second);
    assert_eq!(store.count::<Model>().unwrap(), 1);
}

#[test]
fn fill_is_applied_on_create_only() {
    let store = memory_store();
    let search = ModelFields::default().name("grader");

    let created: Model = get_or_create(
        &store,
        &search,
        &ModelFields::default().notes(json!({"temperature": 0})),
        ResolveOptions::default(),
    )
    .unwrap();
    assert_eq!(created.notes, json!({"temperature": 0}));

    let again: Model = get_or_create(
        &store,
        &search,
        &ModelFields::default().notes(json!({"temperature": 1})),
        ResolveOptions::default(),
    )
    .unwrap();
    assert_eq!(again.id, created.id);
    assert_eq!(again.notes, json!({"temperature": 0}));
}

#[test]
fn update_overwrites_named_fields_and_refreshes_updated_at() {
    let store = memory_store();
    let ps = problem_set(&store, "geo");
    let p = problem(&store, &ps, "Capital of France?");
    let before = p.clone();

    sleep(Duration::from_millis(5));

    let updated: Problem = update_or_create(
        &store,
        &ProblemFields::default()
            .problem_set_id(ps.id)
            .input("Capital of France?"),
        &ProblemFields::default().ideal("Paris"),
        false,
    )
    .unwrap();

    assert_eq!(updated.id, before.id);
    assert_eq!(updated.ideal, "Paris");
    assert_eq!(updated.rubric, before.rubric);
    assert_eq!(updated.created_at, before.created_at);
    assert!(updated.updated_at > before.updated_at);
    assert_eq!(store.count::<Problem>().unwrap(), 1);
}

#[test]
fn empty_fill_values_are_skipped_unless_allowed() {
    let store = memory_store();
    let run_model = model(&store, "m");
    let run = submission_set(&store, &run_model, "run");
    let ps = problem_set(&store, "ps");
    let p = problem(&store, &ps, "q");

    let search = SubmissionFields::default()
        .submission_set_id(run.id)
        .problem_id(p.id);
    let original: Submission = get_or_create(
        &store,
        &search,
        &SubmissionFields::default()
            .message("first try")
            .notes(json!({"tokens": 12})),
        ResolveOptions::default(),
    )
    .unwrap();

    let blank = SubmissionFields::default().message("").notes(json!(null));

    let kept: Submission = update_or_create(&store, &search, &blank, false).unwrap();
    assert_eq!(kept.id, original.id);
    assert_eq!(kept.message, "first try");
    assert_eq!(kept.notes, json!({"tokens": 12}));

    let cleared: Submission = update_or_create(&store, &search, &blank, true).unwrap();
    assert_eq!(cleared.id, original.id);
    assert_eq!(cleared.message, "");
    assert_eq!(cleared.notes, json!(null));
}

#[test]
fn search_matching_several_rows_is_ambiguous() {
    let store = memory_store();
    let run_model = model(&store, "m");
    let ps = problem_set(&store, "ps");
    let p = problem(&store, &ps, "q");
    let run = submission_set(&store, &run_model, "run");

    for answer in ["a", "b"] {
        store
            .insert::<Submission>(
                &SubmissionFields::default()
                    .submission_set_id(run.id)
                    .problem_id(p.id)
                    .message(answer),
            )
            .unwrap();
    }

    let err = get_or_create::<Submission>(
        &store,
        &SubmissionFields::default().submission_set_id(run.id),
        &SubmissionFields::default(),
        ResolveOptions::default(),
    )
    .unwrap_err();

    match err {
        StoreError::AmbiguousMatch { kind, criteria } => {
            assert_eq!(kind, EntityKind::Submission);
            assert!(criteria.contains("submission_set_id"));
        }
        other => panic!("expected AmbiguousMatch, got {other:?}"),
    }
    assert_eq!(store.count::<Submission>().unwrap(), 2);
}

#[test]
fn missing_required_field_fails_validation() {
    let store = memory_store();

    let err = get_or_create::<Problem>(
        &store,
        &ProblemFields::default().input("orphan"),
        &ProblemFields::default(),
        ResolveOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        StoreError::Validation {
            kind: EntityKind::Problem,
            field: "problem_set_id"
        }
    ));
    assert_eq!(store.count::<Problem>().unwrap(), 0);
}

#[test]
fn concurrent_callers_create_one_row() {
    let store = memory_store();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || model(&store, "shared").id)
        })
        .collect();
    let ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(store.count::<Model>().unwrap(), 1);
}
