use thiserror::Error;

/// Failures that can occur while building or validating policy XML.
///
/// This is the leaf error type owned by this crate; `shield-core` wraps it
/// into the broader pipeline error taxonomy (`ConfigError`/`IoError`/... from
/// spec §7) since those outer variants depend on ingestion and enforcement
/// concerns this crate knows nothing about.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("malformed policy XML: {0}")]
    Malformed(#[from] quick_xml::DeError),

    #[error("invalid policy XML: {0}")]
    InvalidPolicyXml(String),

    #[error("endpoint '{0}' is not a valid ADDR[/PREFIX][:PORT] or opaque token")]
    InvalidEndpoint(String),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
