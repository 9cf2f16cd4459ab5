mod common;

use common::{graded, memory_store};
use evalbook_core::model::{Evaluation, EvaluationSet, EvaluationSetFields, Model, Submission};
use evalbook_core::{
    export, import_document, ExportDocument, ExportFormat, ExportOptions, ExportRoot, StoreError,
};
use tempfile::tempdir;

#[test]
fn import_into_fresh_store_reproduces_the_export() {
    let source = memory_store();
    let g = graded(&source);
    let original = export(&source, ExportRoot::EvaluationSet(g.e1.id), ExportOptions::default())
        .unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("out/e1.yaml");
    original.write_to(&path, ExportFormat::Yaml).unwrap();
    let loaded = ExportDocument::read_from(&path).unwrap();

    let target = memory_store();
    let summary = import_document(&target, &loaded).unwrap();
    assert_eq!(summary.models, 2);
    assert_eq!(summary.problems, 1);
    assert_eq!(summary.submissions, 2);
    assert_eq!(summary.evaluations, 2);

    let again = export(&target, ExportRoot::EvaluationSet(g.e1.id), ExportOptions::default())
        .unwrap();
    assert_eq!(again.fingerprint().unwrap(), original.fingerprint().unwrap());
}

#[test]
fn json_documents_round_trip_through_files() {
    let store = memory_store();
    let g = graded(&store);
    let doc =
        export(&store, ExportRoot::SubmissionSet(g.run.id), ExportOptions::default()).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("run.json");
    doc.write_to(&path, ExportFormat::Json).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.trim_start().starts_with('{'));
    assert_eq!(ExportDocument::read_from(&path).unwrap(), doc);
}

#[test]
fn second_import_gets_fresh_ids() {
    let source = memory_store();
    let g = graded(&source);
    let doc = export(&source, ExportRoot::EvaluationSet(g.e1.id), ExportOptions::default())
        .unwrap();

    let target = memory_store();
    import_document(&target, &doc).unwrap();
    import_document(&target, &doc).unwrap();

    assert_eq!(target.count::<Model>().unwrap(), 4);
    assert_eq!(target.count::<Submission>().unwrap(), 4);
    assert_eq!(target.count::<Evaluation>().unwrap(), 4);
}

#[test]
fn reference_outside_the_document_rolls_back() {
    let source = memory_store();
    let g = graded(&source);
    let mut doc = export(&source, ExportRoot::EvaluationSet(g.e1.id), ExportOptions::default())
        .unwrap();
    if let Some(sets) = doc.submission_sets.as_mut() {
        sets[0].model_id = 777;
    }

    let target = memory_store();
    let err = import_document(&target, &doc).unwrap_err();
    match err {
        StoreError::Document(msg) => assert!(msg.contains("777"), "{msg}"),
        other => panic!("expected Document, got {other:?}"),
    }

    let stats = target.stats().unwrap();
    assert_eq!(stats.models, 0);
    assert_eq!(stats.problems, 0);
}

#[test]
fn evaluation_nested_under_the_wrong_submission_is_rejected() {
    let source = memory_store();
    let g = graded(&source);
    let mut doc = export(&source, ExportRoot::EvaluationSet(g.e1.id), ExportOptions::default())
        .unwrap();
    let subs = doc.problems[0].submissions.as_mut().unwrap();
    let under_sub2 = subs
        .iter_mut()
        .find(|s| s.submission_id == g.sub2.id)
        .unwrap();
    under_sub2.evaluations.as_mut().unwrap()[0].submission_id = g.sub1.id;

    let target = memory_store();
    let err = import_document(&target, &doc).unwrap_err();
    match err {
        StoreError::Document(msg) => {
            assert!(msg.contains("nested under submission"), "{msg}");
            assert!(msg.contains(&g.ev2.id.to_string()), "{msg}");
        }
        other => panic!("expected Document, got {other:?}"),
    }

    let stats = target.stats().unwrap();
    assert_eq!(stats.submissions, 0);
    assert_eq!(stats.evaluations, 0);
}

#[test]
fn repeated_evaluation_node_is_rejected() {
    let source = memory_store();
    let g = graded(&source);
    let mut doc = export(&source, ExportRoot::EvaluationSet(g.e1.id), ExportOptions::default())
        .unwrap();
    let subs = doc.problems[0].submissions.as_mut().unwrap();
    let evaluations = subs[0].evaluations.as_mut().unwrap();
    let copy = evaluations[0].clone();
    assert_eq!(copy.evaluation_id, g.ev1.id);
    evaluations.push(copy);

    let target = memory_store();
    let err = import_document(&target, &doc).unwrap_err();
    match err {
        StoreError::Document(msg) => assert!(msg.contains("appears more than once"), "{msg}"),
        other => panic!("expected Document, got {other:?}"),
    }
    assert_eq!(target.count::<Evaluation>().unwrap(), 0);
}

#[test]
fn example_flag_on_sets_survives_import() {
    let source = memory_store();
    let g = graded(&source);
    source
        .update::<EvaluationSet>(g.e1.id, &EvaluationSetFields::default().is_example(true))
        .unwrap();
    let doc = export(&source, ExportRoot::EvaluationSet(g.e1.id), ExportOptions::default())
        .unwrap();
    assert!(doc.evaluation_sets.as_ref().unwrap()[0].is_example);
    assert!(!doc.submission_sets.as_ref().unwrap()[0].is_example);

    let target = memory_store();
    import_document(&target, &doc).unwrap();
    let imported = target
        .find_all::<EvaluationSet>(&EvaluationSetFields::default().name("E1"))
        .unwrap();
    assert_eq!(imported.len(), 1);
    assert!(imported[0].is_example);
}
