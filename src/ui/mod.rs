pub mod console;
pub mod form;

pub use console::{Console, Mode};
pub use form::{FormOutcome, FormPurpose, FormState};
