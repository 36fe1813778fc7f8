//! Test utilities
//!
//! In-memory implementations of every port plus fixtures for unit testing.
//!
//! The repositories keep rows behind `RwLock`s; the booking and equipment
//! repositories can publish to a `ChangeFeed` so realtime consumers see the
//! same events they would get from PostgreSQL. `RecordingNotifier` stands in
//! for the notification service when only the requests matter.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
