use thiserror::Error;

use crate::xml::Element;

#[derive(Debug, Error)]
pub enum SoapError {
    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {status}")]
    HttpNotOk { status: u16, body: String },

    #[error("response content type \"{0}\" is not text/xml")]
    InvalidMimeType(String),

    #[error("document is not well-formed XML: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("SOAP fault {code}: {message}")]
    Fault {
        code: String,
        message: String,
        actor: Option<String>,
        detail: Option<Element>,
    },

    #[error("failed to deserialize {path}: {reason}")]
    Deserialization { path: String, reason: String },
}

impl SoapError {
    pub fn deserialization(
        path: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Deserialization {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
