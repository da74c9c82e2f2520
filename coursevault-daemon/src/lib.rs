//! Background scheduler: daily timer + socket trigger feeding one sync queue.

mod error;
pub mod log_rotation;
pub mod paths;
pub mod protocol;
mod runtime;
pub mod schedule;

pub use error::DaemonError;
pub use protocol::{
    request_status, request_stop, request_sync, send_request, DaemonRequest, DaemonResponse,
};
pub use runtime::{run, run_with, start_blocking, SyncRunner, SyncSummary};
pub use schedule::next_run_after;
