//! hubshell - Offline-first application shell
//!
//! Versioned offline resource cache with network fallback, a connectivity
//! state machine driving a transient status indicator, and once-per-session
//! notification permission negotiation.

pub mod cache;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fetch;
pub mod network;
pub mod notify;
pub mod shell;
pub mod status;
pub mod ui;

pub use error::{ShellError, ShellResult};
pub use shell::{Capabilities, Registration, Running, Shell};
