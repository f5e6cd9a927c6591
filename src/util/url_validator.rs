use thiserror::Error;
use url::Url;

/// Errors that can occur while validating a feed target address.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The address could not be parsed as a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The address uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Validates a target address before a fetch is issued.
///
/// Only parseability and an http/https scheme are checked; any host the HTTP
/// client would reach is allowed, LAN and loopback addresses included, since
/// feed targets legitimately live there.
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}
