pub mod nem12_file;
pub mod plan_file;

pub use nem12_file::Nem12FileSource;
pub use plan_file::{parse_plan_document, PlanFileSource};
