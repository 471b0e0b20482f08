// ABOUTME: Main library module that exports the public API
// Central module for the Loan Desk admin console

pub mod app;
pub mod data;
pub mod status;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use app::{AppConfig, AppEvent, AppState, Tab};
pub use status::{Status, StatusCode, StatusKind, StatusNotifier, StatusStore, Visibility};
pub use utils::{LoanDeskError, Result};
