mod common;

use common::{graded, memory_store};
use evalbook_core::{export, ExportOptions, ExportRoot};
use std::sync::{Arc, Mutex};

#[test]
fn export_emits_structured_completion_event() {
    let store = memory_store();
    let g = graded(&store);

    let buffer = Arc::new(Mutex::new(Vec::new()));
    let buffer_clone = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(move || MockWriter(buffer_clone.clone()))
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        export(&store, ExportRoot::EvaluationSet(g.e1.id), ExportOptions::default()).unwrap();
    });

    let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(output.contains("\"event\":\"evalbook.export.completed\""), "{output}");
    assert!(output.contains("\"kind\":\"evaluation_set\""), "{output}");
    assert!(output.contains("\"problems\":1"), "{output}");
    assert!(output.contains("\"timestamp\""));
}

#[test]
fn init_refuses_a_second_global_subscriber() {
    // A bad filter falls back to info.
    assert!(evalbook_core::logging::init("not a filter [").is_ok());
    assert!(evalbook_core::logging::init("info").is_err());
}

struct MockWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
