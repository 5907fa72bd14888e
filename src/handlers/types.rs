// src/handlers/types.rs

use serde::Serialize;
use thiserror::Error;

use crate::directory_browser::XML_DECLARATION;

#[derive(Debug, Error)]
#[error("unable to marshal XML: {0}")]
pub struct XmlError(String);

/// Body of every error response, serialised with the same XML conventions
/// as bucket listings.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename = "ErrorResponse")]
pub struct ErrorResponse {
    #[serde(rename = "Message")]
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn to_xml(&self) -> Result<String, XmlError> {
        let body = quick_xml::se::to_string(self).map_err(|e| XmlError(e.to_string()))?;
        Ok(format!("{}\n{}", XML_DECLARATION, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_xml() {
        let xml = ErrorResponse::new("file <not> found").to_xml().unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<ErrorResponse><Message>file &lt;not&gt; found</Message></ErrorResponse>"));
    }
}
