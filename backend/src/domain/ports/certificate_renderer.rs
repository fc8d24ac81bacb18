//! Port rendering a certificate into a downloadable document.

use crate::domain::CertificateDocument;

use super::define_port_error;

define_port_error! {
    /// Errors raised while rendering a certificate.
    pub enum CertificateRenderError {
        /// The document could not be produced.
        Render { message: String } as Failed => "certificate rendering failed: {message}",
    }
}

/// Synchronous renderer; documents are small and built in memory.
#[cfg_attr(test, mockall::automock)]
pub trait CertificateRenderer: Send + Sync {
    /// MIME type of the rendered bytes.
    fn content_type(&self) -> &'static str;

    fn render(&self, document: &CertificateDocument) -> Result<Vec<u8>, CertificateRenderError>;
}
