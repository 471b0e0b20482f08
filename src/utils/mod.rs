pub mod error;
pub mod format;

pub use error::{LoanDeskError, Result};
pub use format::{format_amount, format_optional, truncate};
