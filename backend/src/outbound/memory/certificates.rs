use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{CertificateRepository, CertificateRepositoryError};
use crate::domain::{
    Certificate, CertificateNumber, EnrollmentStatus, IssuancePeriod, IssuedCertificate,
    NotCompleted,
};

use super::{MemoryStore, newest_first};

fn newest_issued(mut certificates: Vec<Certificate>) -> Vec<Certificate> {
    newest_first(&mut certificates, |c| (c.issued_at, c.id));
    certificates
}

#[async_trait]
impl CertificateRepository for MemoryStore {
    async fn issue(
        &self,
        enrollment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<IssuedCertificate, CertificateRepositoryError> {
        let mut state = self.state.write().await;
        let enrollment = state.enrollments.get(&enrollment_id).cloned().ok_or_else(|| {
            CertificateRepositoryError::missing(format!("enrollment {enrollment_id} not found"))
        })?;
        if let Some(existing) = state
            .certificates
            .values()
            .find(|certificate| certificate.enrollment_id == enrollment_id)
        {
            return Ok(IssuedCertificate {
                certificate: existing.clone(),
                newly_issued: false,
            });
        }
        if enrollment.status() != EnrollmentStatus::Completed {
            let refusal = NotCompleted {
                status: enrollment.status(),
            };
            return Err(CertificateRepositoryError::rejected(refusal.to_string()));
        }

        let period = IssuancePeriod::containing(now);
        let sequence = state
            .certificate_sequences
            .get(&period.key())
            .copied()
            .unwrap_or_default()
            .saturating_add(1);
        let number = CertificateNumber::new(period, sequence);
        let certificate = Certificate::issue(&enrollment, number, now)
            .map_err(|err| CertificateRepositoryError::rejected(err.to_string()))?;
        state.certificate_sequences.insert(period.key(), sequence);
        state
            .certificates
            .insert(certificate.id, certificate.clone());
        Ok(IssuedCertificate {
            certificate,
            newly_issued: true,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Certificate>, CertificateRepositoryError> {
        Ok(self.state.read().await.certificates.get(&id).cloned())
    }

    async fn find_by_number(
        &self,
        number: &str,
    ) -> Result<Option<Certificate>, CertificateRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .certificates
            .values()
            .find(|certificate| certificate.certificate_number.as_str() == number)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError> {
        let state = self.state.read().await;
        Ok(newest_issued(
            state
                .certificates
                .values()
                .filter(|certificate| certificate.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_course(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError> {
        let state = self.state.read().await;
        Ok(newest_issued(
            state
                .certificates
                .values()
                .filter(|certificate| certificate.course_id == course_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<Certificate>, CertificateRepositoryError> {
        let state = self.state.read().await;
        Ok(newest_issued(state.certificates.values().cloned().collect()))
    }
}
