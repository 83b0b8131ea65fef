pub mod candidate;
pub mod loaders;
pub mod record;

pub use candidate::{CandidateFields, DocumentUpload};
pub use loaders::{load_batch_file, parse_batch};
pub use record::{BatchSummary, Record, RecordEvent, RecordId, RecordState, Transition};
