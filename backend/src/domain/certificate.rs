//! Completion certificates and their month-scoped numbering.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enrollment::{Enrollment, EnrollmentStatus};

/// Raised when a certificate is requested for an unfinished enrollment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("certificates are only issued for COMPLETED enrollments; enrollment is {status}")]
pub struct NotCompleted {
    pub status: EnrollmentStatus,
}

/// Calendar month (UTC) that scopes a certificate sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssuancePeriod {
    year: i32,
    month: u32,
}

impl IssuancePeriod {
    pub fn containing(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Storage key for the month's counter row, e.g. `"202605"`.
    pub fn key(self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

/// Certificate number `CERT-{YYYY}{MM}-{NNNN}`.
///
/// The sequence is zero-padded to at least four digits and grows wider past
/// 9999 rather than wrapping.
///
/// # Examples
/// ```
/// use academy_backend::domain::{CertificateNumber, IssuancePeriod};
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2026, 5, 3, 0, 0, 0).single().expect("valid");
/// let number = CertificateNumber::new(IssuancePeriod::containing(at), 7);
/// assert_eq!(number.as_str(), "CERT-202605-0007");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateNumber(String);

impl CertificateNumber {
    pub fn new(period: IssuancePeriod, sequence: u32) -> Self {
        Self(format!("CERT-{}-{sequence:04}", period.key()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a stored number without reformatting.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for CertificateNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Proof of course completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub certificate_number: CertificateNumber,
    pub issued_at: DateTime<Utc>,
    pub pdf_url: String,
}

/// Download route for a certificate document.
pub fn certificate_pdf_url(id: Uuid) -> String {
    format!("/api/v1/pdf/certificates/{id}/download")
}

impl Certificate {
    /// Mint a certificate for a completed enrollment.
    pub fn issue(
        enrollment: &Enrollment,
        number: CertificateNumber,
        now: DateTime<Utc>,
    ) -> Result<Self, NotCompleted> {
        if enrollment.status() != EnrollmentStatus::Completed {
            return Err(NotCompleted {
                status: enrollment.status(),
            });
        }
        let id = Uuid::new_v4();
        Ok(Self {
            id,
            enrollment_id: enrollment.id(),
            user_id: enrollment.user_id(),
            course_id: enrollment.course_id(),
            certificate_number: number,
            issued_at: now,
            pdf_url: certificate_pdf_url(id),
        })
    }
}

/// Result of an issuance attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    /// `false` when an existing certificate was returned.
    pub newly_issued: bool,
}

/// Names printed on a certificate and shown by verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDocument {
    pub certificate_number: CertificateNumber,
    pub student_name: String,
    pub course_title: String,
    pub instructor_name: String,
    pub issued_at: DateTime<Utc>,
}

/// Public verification view of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCertificate {
    pub id: Uuid,
    #[serde(flatten)]
    pub document: CertificateDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateVerification {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<VerifiedCertificate>,
}

impl CertificateVerification {
    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            certificate: None,
        }
    }

    pub fn valid(certificate: VerifiedCertificate) -> Self {
        Self {
            is_valid: true,
            certificate: Some(certificate),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateStats {
    pub total_certificates: u64,
    pub certificates_this_month: u64,
    pub certificates_this_year: u64,
}

impl CertificateStats {
    pub fn from_certificates<'a>(
        certificates: impl IntoIterator<Item = &'a Certificate>,
        now: DateTime<Utc>,
    ) -> Self {
        let current = IssuancePeriod::containing(now);
        let mut stats = Self::default();
        for certificate in certificates {
            stats.total_certificates += 1;
            let period = IssuancePeriod::containing(certificate.issued_at);
            if period.year() == current.year() {
                stats.certificates_this_year += 1;
                if period == current {
                    stats.certificates_this_month += 1;
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;
    use crate::domain::Progress;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    #[case(1, "CERT-202601-0001")]
    #[case(42, "CERT-202601-0042")]
    #[case(12_345, "CERT-202601-12345")]
    fn number_format(#[case] sequence: u32, #[case] expected: &str) {
        let number = CertificateNumber::new(IssuancePeriod::containing(at(2026, 1, 31)), sequence);
        assert_eq!(number.as_str(), expected);
    }

    #[rstest]
    fn numbers_order_by_sequence_within_month() {
        let period = IssuancePeriod::containing(at(2026, 2, 1));
        assert!(CertificateNumber::new(period, 9) < CertificateNumber::new(period, 10));
    }

    #[rstest]
    fn issue_requires_completion() {
        let now = at(2026, 3, 3);
        let mut enrollment = Enrollment::new_active(Uuid::new_v4(), Uuid::new_v4(), now);
        let number = CertificateNumber::new(IssuancePeriod::containing(now), 1);
        assert_eq!(
            Certificate::issue(&enrollment, number.clone(), now),
            Err(NotCompleted {
                status: EnrollmentStatus::Active
            })
        );
        enrollment
            .apply_progress(Progress::COMPLETE, now)
            .expect("complete");
        let certificate = Certificate::issue(&enrollment, number, now).expect("issue");
        assert_eq!(certificate.pdf_url, certificate_pdf_url(certificate.id));
        assert_eq!(certificate.user_id, enrollment.user_id());
    }

    #[rstest]
    fn stats_bucket_by_month_and_year() {
        let now = at(2026, 7, 15);
        let make = |issued_at| Certificate {
            id: Uuid::new_v4(),
            enrollment_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            certificate_number: CertificateNumber::from_stored("CERT-X"),
            issued_at,
            pdf_url: String::new(),
        };
        let certificates = [make(at(2026, 7, 1)), make(at(2026, 1, 9)), make(at(2025, 7, 1))];
        let stats = CertificateStats::from_certificates(&certificates, now);
        assert_eq!(stats.total_certificates, 3);
        assert_eq!(stats.certificates_this_year, 2);
        assert_eq!(stats.certificates_this_month, 1);
    }
}
