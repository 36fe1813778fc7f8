//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.
//! Writes to realtime tables are published to the `ChangeFeed` after commit.

pub mod ad_repo;
pub mod booking_repo;
pub mod campaign_repo;
pub mod equipment_repo;
pub mod invoice_repo;
pub mod notification_repo;
pub mod preferences_repo;
pub mod user_repo;
pub mod vehicle_repo;


pub use ad_repo::PostgresAdRepository;
pub use booking_repo::PostgresBookingRepository;
pub use campaign_repo::PostgresCampaignRepository;
pub use equipment_repo::PostgresEquipmentRepository;
pub use invoice_repo::PostgresInvoiceRepository;
pub use notification_repo::PostgresNotificationRepository;
pub use preferences_repo::PostgresPreferencesRepository;
pub use user_repo::PostgresUserRepository;
pub use vehicle_repo::PostgresVehicleRepository;
