//! Small shared helpers: date parsing and target-address validation.

mod dates;
mod url_validator;

pub use dates::parse_epoch_ms;
pub use url_validator::{validate_url, UrlValidationError};
