//! Port for certificate persistence and numbering.
//!
//! [`CertificateRepository::issue`] owns the whole issuance step so adapters
//! can lock the enrollment, re-check for an existing certificate, bump the
//! month's sequence counter, and insert inside one unit of work. Numbers
//! within a month are therefore unique and strictly increasing even when
//! requests race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Certificate, IssuedCertificate};

use super::define_port_error;

define_port_error! {
    /// Errors raised by certificate repository adapters.
    pub enum CertificateRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } as Unavailable => "certificate repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } as Failed => "certificate repository query failed: {message}",
        /// The enrollment does not exist.
        Missing { message: String } as Missing => "{message}",
        /// The enrollment is not eligible for a certificate.
        Rejected { message: String } as Rejected => "{message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Issue the certificate for a completed enrollment, or return the one
    /// already issued.
    async fn issue(
        &self,
        enrollment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<IssuedCertificate, CertificateRepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Certificate>, CertificateRepositoryError>;

    async fn find_by_number(
        &self,
        number: &str,
    ) -> Result<Option<Certificate>, CertificateRepositoryError>;

    /// Certificates for a user, newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError>;

    /// Certificates for a course, newest first.
    async fn list_for_course(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError>;

    async fn list_all(&self) -> Result<Vec<Certificate>, CertificateRepositoryError>;
}
