//! Services for fetching, normalizing and publishing snapshots

pub mod coordinator;
pub mod eta;
pub mod extractor;
pub mod fetcher;
pub mod lookup;
pub mod store;

pub use coordinator::{assemble, Coordinator, CyclePhase, CycleReport, SourceOutcome, SourceStatus};
pub use eta::{Clock, Eta, FixedClock, SystemClock};
pub use fetcher::HttpFetcher;
pub use lookup::{lookup_stop, LookupResponse};
pub use store::SnapshotStore;
