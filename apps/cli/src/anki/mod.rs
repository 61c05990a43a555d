//! Anki `.apkg` export.

mod collection;
pub mod model;
mod package;
mod schema;

pub use model::{DEFAULT_CSS, MODEL_NAME};
pub use package::{AnkiPackage, PackageSummary};
