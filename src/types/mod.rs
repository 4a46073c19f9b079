//! Type definitions for navaja

mod error;
mod snapshot;
mod subscription;

pub use error::*;
pub use snapshot::*;
pub use subscription::SubscriptionList;
