//! Driving port for certificate reads, verification, and downloads.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Certificate, CertificateStats, CertificateVerification, Error};

/// Rendered certificate ready to send as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateQuery: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Certificate, Error>;

    async fn for_user(&self, user_id: Uuid) -> Result<Vec<Certificate>, Error>;

    async fn for_course(&self, course_id: Uuid) -> Result<Vec<Certificate>, Error>;

    /// Look up a certificate number; unknown numbers are reported invalid,
    /// not as errors.
    async fn verify(&self, number: String) -> Result<CertificateVerification, Error>;

    async fn stats(&self) -> Result<CertificateStats, Error>;

    async fn download(&self, id: Uuid) -> Result<CertificateFile, Error>;
}
