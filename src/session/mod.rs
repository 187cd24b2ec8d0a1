//! Session management
//!
//! `state` holds the session value the rest of the application reads;
//! `manager` owns it and runs the host and local authentication paths.

pub mod manager;
pub mod state;

pub use manager::SessionManager;
pub use state::{AuthMode, Session, SessionState};
