mod sync_log;
mod visit;
mod visit_status;

pub use sync_log::{
    truncate_chars, NewSyncLogEntry, SyncAction, SyncLogEntry, SyncLogStatus,
    MAX_ERROR_MESSAGE_CHARS, MAX_WEBHOOK_MESSAGE_CHARS,
};
pub(crate) use visit::non_empty;
pub use visit::{NewVisit, Visit};
pub use visit_status::VisitStatus;
