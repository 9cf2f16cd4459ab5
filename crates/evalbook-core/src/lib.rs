pub mod config;
pub mod errors;
pub mod export;
pub mod fingerprint;
pub mod import;
pub mod logging;
pub mod model;
pub mod resolver;
pub mod storage;

pub use errors::{ConfigError, StoreError};
pub use export::{export, ExportDocument, ExportFormat, ExportOptions, ExportRoot};
pub use import::{import_document, ImportSummary};
pub use resolver::{get_or_create, update_or_create, ResolveOptions};
pub use storage::Store;
