use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ServerUrlError {
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Server URL has no host")]
    MissingHost,
    #[error("Server URL must not carry a query or fragment")]
    UnexpectedSuffix,
}

/// Parse the dataset server address.
///
/// Unlike URLs taken from remote content, the server is chosen by the user
/// and is usually local, so loopback and private addresses are accepted.
pub fn validate_server_url(raw: &str) -> Result<Url, ServerUrlError> {
    let url = Url::parse(raw.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(ServerUrlError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ServerUrlError::MissingHost);
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ServerUrlError::UnexpectedSuffix);
    }
    Ok(url)
}
