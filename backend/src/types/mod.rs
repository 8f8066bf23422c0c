mod environment;
mod error;
mod extractors;

pub use environment::Environment;
pub use error::{AppError, INTERNAL_ERROR_MESSAGE};
pub use extractors::{InvalidBodyMessage, ValidatedJson};
