mod filter;
mod summary;
mod value;

pub use filter::is_internal_name;
pub use summary::{build_locals_summary, LocalSummaryEntry, LocalsSnapshot};
pub use value::LocalValue;
