pub mod auth_gateway;
pub mod client;
pub mod notification_gateway;
pub mod object_store;
pub mod record_table;

pub use client::RemoteClient;
