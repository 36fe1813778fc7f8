//! Realtime change feed
//!
//! Repositories publish INSERT/UPDATE/DELETE events after each committed
//! write. Consumers open a channel on a table with an optional row filter and
//! event mask, and receive one callback per matching event.

pub mod event;
pub mod feed;
pub mod filter;
pub mod subscription;

pub use event::{ChangeEvent, EventKind, EventMask};
pub use feed::ChangeFeed;
pub use filter::{FilterOp, RowFilter};
pub use subscription::{ChangeHandler, ChannelStatus, Subscription};

/// Table names used on the feed
pub mod tables {
    pub const BOOKINGS: &str = "bookings";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const VEHICLES: &str = "vehicles";
    pub const CAMPAIGNS: &str = "campaigns";
    pub const EQUIPMENT: &str = "equipment";
    pub const INVOICES: &str = "invoices";
    pub const ADS: &str = "ads";
}
