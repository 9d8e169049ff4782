//! Service layer
//!
//! Services contain the book's behaviour. They orchestrate repositories to
//! decide where pages are loaded from, mirror every save to the cloud, follow
//! realtime updates, pair couples, and back up local data.
//!
//! Services depend on repository traits so tests can swap in memory stores.

mod backup;
mod couple;
mod sync;

pub use backup::{BackupService, ClearOutcome};
pub use couple::CoupleService;
pub use sync::{LoadSource, Loaded, RemoteApply, SaveOutcome, SyncService};
