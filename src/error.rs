use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Main error type covering every way a sitemap generation run can fail
#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("Malformed URL: {url} - {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("Storage error: {path} - {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML serialization error: {0}")]
    Serialization(String),

    #[error("Schema violation: {file} - {details}")]
    SchemaViolation { file: PathBuf, details: String },

    #[error("Sitemap index parse error: {file} - {details}")]
    IndexParse { file: PathBuf, details: String },

    #[error("No URL entries to write")]
    NoEntries,

    #[error("Invalid input file: {path} - {details}")]
    InvalidInput { path: PathBuf, details: String },

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SitemapError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SitemapError::Storage {
            path: path.into(),
            source,
        }
    }

    /// True when the written output exists but is not protocol-conformant
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, SitemapError::SchemaViolation { .. })
    }
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: null pointer returned")]
    SchemaParseFailed,

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("File validation failed with code {code}: {file}")]
    ValidationFailed { code: i32, file: PathBuf },

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,
}

impl From<LibXml2Error> for SitemapError {
    fn from(err: LibXml2Error) -> Self {
        SitemapError::LibXml2Internal {
            details: err.to_string(),
        }
    }
}

impl From<ConfigError> for SitemapError {
    fn from(err: ConfigError) -> Self {
        SitemapError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SitemapError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sitemap_error_display() {
        let malformed = SitemapError::MalformedUrl {
            url: "http://[::1".to_string(),
            reason: "invalid IPv6 address".to_string(),
        };
        assert!(malformed.to_string().contains("Malformed URL"));
        assert!(malformed.to_string().contains("http://[::1"));

        let violation = SitemapError::SchemaViolation {
            file: PathBuf::from("/out/sitemap_2.xml"),
            details: "Element 'changefreq': 'sometimes' is not a valid value".to_string(),
        };
        assert!(violation.to_string().contains("Schema violation"));
        assert!(violation.to_string().contains("sitemap_2.xml"));
        assert!(violation.to_string().contains("sometimes"));

        let index = SitemapError::IndexParse {
            file: PathBuf::from("sitemap_index.xml"),
            details: "unexpected EOF".to_string(),
        };
        assert!(index.to_string().contains("index parse error"));
    }

    #[test]
    fn test_storage_error_source_chain() {
        use std::error::Error;

        let err = SitemapError::storage(
            "/readonly/sitemap.xml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Access denied"),
        );

        assert!(err.to_string().contains("/readonly/sitemap.xml"));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "Access denied");
    }

    #[test]
    fn test_schema_violation_is_distinct() {
        let violation = SitemapError::SchemaViolation {
            file: PathBuf::from("sitemap.xml"),
            details: "bad".to_string(),
        };
        assert!(violation.is_schema_violation());

        let storage = SitemapError::storage(
            "sitemap.xml",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert!(!storage.is_schema_violation());
        assert!(!SitemapError::NoEntries.is_schema_violation());
    }

    #[test]
    fn test_libxml2_error_conversion() {
        let err: SitemapError = LibXml2Error::SchemaParseFailed.into();
        match err {
            SitemapError::LibXml2Internal { details } => {
                assert!(details.contains("Schema parsing failed"))
            }
            _ => panic!("Expected SitemapError::LibXml2Internal"),
        }
    }

    #[test]
    fn test_config_error_conversion() {
        let err: SitemapError = ConfigError::Validation("bad limit".to_string()).into();
        match err {
            SitemapError::Config(msg) => assert!(msg.contains("bad limit")),
            _ => panic!("Expected SitemapError::Config"),
        }
    }
}
