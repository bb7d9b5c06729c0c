pub mod auth_gateway;
pub mod camera;
pub mod connectivity;
pub mod notification_gateway;
pub mod object_store;
pub mod record_table;

pub use auth_gateway::AuthGateway;
pub use camera::{Camera, CapturedPhoto};
pub use connectivity::Connectivity;
pub use notification_gateway::NotificationGateway;
pub use object_store::ObjectStore;
pub use record_table::RecordTable;
