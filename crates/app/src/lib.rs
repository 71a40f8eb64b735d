//! The sealdrop daemon: HTTP boundary, session tokens and process wiring
//! over the access core in `common`.

pub mod daemon;
pub mod state;

pub use daemon::http_server;
pub use daemon::session;
pub use daemon::spawn_service;
pub use daemon::ServiceConfig;
pub use daemon::ServiceState;
