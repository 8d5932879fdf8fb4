pub mod connection;
pub mod controller;
pub mod state;

pub use connection::Connection;
pub use controller::SessionController;
pub use state::{spawn_report_forwarder, spawn_state_task};
