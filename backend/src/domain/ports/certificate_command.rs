//! Driving port for certificate issuance.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Certificate, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateCommand: Send + Sync {
    /// Issue a certificate for a COMPLETED enrollment. Repeated calls return
    /// the same certificate.
    async fn issue(&self, enrollment_id: Uuid) -> Result<Certificate, Error>;
}
