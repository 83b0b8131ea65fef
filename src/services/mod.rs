pub mod failure_writer;
pub mod progress_reporter;
pub mod record_store;
pub mod remote_gateway;
pub mod validation;

pub use failure_writer::FailureWriter;
pub use progress_reporter::{
    spawn_progress_log, ProgressEvent, ProgressReporter, ProgressView, TransitionEvent,
};
pub use record_store::RecordStore;
pub use remote_gateway::{HttpGateway, RemoteGateway};
pub use validation::validate_candidate;
