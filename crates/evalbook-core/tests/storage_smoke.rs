mod common;

use common::graded;
use evalbook_core::model::{
    EntityKind, Evaluation, EvaluationSet, Model, ModelFields, Problem, ProblemFields, ProblemSet,
    Submission, SubmissionSet,
};
use evalbook_core::storage::Store;
use evalbook_core::StoreError;
use serde_json::json;
use tempfile::tempdir;

#[test]
fn test_storage_smoke_lifecycle() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("evalbook.db");

    let store = Store::open(&db_path)?;
    store.init_schema()?;
    let g = graded(&store);

    // Relations in both directions.
    let ps: ProblemSet = store.parent(&g.problem_a)?;
    assert_eq!(ps.id, g.problem_set.id);
    let run_model: Model = store.parent(&g.run)?;
    assert_eq!(run_model.name, "gpt-run");
    let subs: Vec<Submission> = store.children(&g.problem_a)?;
    assert_eq!(subs.len(), 2);
    let evals: Vec<Evaluation> = store.children(&g.e1)?;
    assert_eq!(
        evals.iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![g.ev1.id, g.ev2.id]
    );
    let runs: Vec<SubmissionSet> = store.children(&g.run_model)?;
    assert_eq!(runs.len(), 1);
    let gradings: Vec<EvaluationSet> = store.children(&g.grader)?;
    assert_eq!(gradings.len(), 1);

    // Structured columns round-trip unchanged.
    let sub1: Submission = store.get(g.sub1.id)?;
    assert_eq!(sub1.completion, json!({"answer": "4"}));
    assert_eq!(sub1.notes, json!(""));

    // Reopen and check the data survived.
    drop(store);
    let reopened = Store::open(&db_path)?;
    reopened.init_schema()?;
    let stats = reopened.stats()?;
    assert_eq!(stats.models, 2);
    assert_eq!(stats.problem_sets, 1);
    assert_eq!(stats.problems, 1);
    assert_eq!(stats.submission_sets, 1);
    assert_eq!(stats.submissions, 2);
    assert_eq!(stats.evaluation_sets, 1);
    assert_eq!(stats.evaluations, 2);
    assert_eq!(stats.version, Some(3));

    Ok(())
}

#[test]
fn update_of_missing_row_is_not_found() {
    let store = common::memory_store();
    let err = store
        .update::<Model>(5, &ModelFields::default().name("ghost"))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            kind: EntityKind::Model,
            id: 5
        }
    ));
}

#[test]
fn find_all_returns_rows_in_id_order() {
    let store = common::memory_store();
    let g = graded(&store);

    let all = store.find_all::<Problem>(&ProblemFields::default()).unwrap();
    assert_eq!(all.len(), 1);

    let one = store.find_one::<Model>(&ModelFields::default().name("grader")).unwrap();
    assert_eq!(one.map(|m| m.id), Some(g.grader.id));
    assert!(store
        .find_one::<Model>(&ModelFields::default().name("nobody"))
        .unwrap()
        .is_none());
}

#[test]
fn older_files_gain_the_example_flag() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("old.db");
    {
        let conn = rusqlite::Connection::open(&db_path)?;
        conn.execute_batch(
            "CREATE TABLE models (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                notes_json TEXT NOT NULL DEFAULT '\"\"'
            );
            CREATE TABLE submission_sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                model_id INTEGER NOT NULL REFERENCES models(id),
                name TEXT NOT NULL,
                notes_json TEXT NOT NULL DEFAULT '\"\"',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            INSERT INTO models (created_at, updated_at, name)
                VALUES ('2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z', 'legacy');
            INSERT INTO submission_sets (model_id, name, created_at, updated_at)
                VALUES (1, 'old run', '2024-01-01T00:00:00.000000Z',
                        '2024-01-01T00:00:00.000000Z');",
        )?;
    }

    let store = Store::open(&db_path)?;
    store.init_schema()?;
    let legacy: Model = store.get(1)?;
    assert_eq!(legacy.name, "legacy");
    assert!(!legacy.is_example);
    let run: SubmissionSet = store.get(1)?;
    assert_eq!(run.name, "old run");
    assert!(!run.is_example);
    Ok(())
}
