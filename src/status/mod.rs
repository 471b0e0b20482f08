pub mod notifier;
pub mod store;

pub use notifier::{StatusNotifier, Visibility, DEFAULT_DISPLAY_DURATION};
pub use store::{Status, StatusCode, StatusKind, StatusStore};
