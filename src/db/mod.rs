pub mod admin;
pub mod attendance;
pub mod connection;
pub mod groups;
pub mod models;
pub mod stats;
pub mod users;

pub use connection::*;
pub use models::*;
pub use admin::AdminCredentials;
pub use groups::GroupDeletion;
