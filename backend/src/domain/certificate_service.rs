//! Certificate issuance, verification, and document rendering.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::ports::{
    CertificateCommand, CertificateFile, CertificateQuery, CertificateRenderer,
    CertificateRepository, CourseRepository, UserRepository,
};
use crate::domain::{
    Certificate, CertificateDocument, CertificateStats, CertificateVerification, Error,
    VerifiedCertificate,
};

const UNKNOWN_INSTRUCTOR: &str = "Unknown instructor";

/// Collaborators of [`CertificateService`].
pub struct CertificateServiceDeps<R, C, U, D> {
    pub certificates: Arc<R>,
    pub courses: Arc<C>,
    pub users: Arc<U>,
    pub renderer: Arc<D>,
    pub clock: Arc<dyn Clock>,
}

/// Certificate service implementing the certificate driving ports.
#[derive(Clone)]
pub struct CertificateService<R, C, U, D> {
    certificates: Arc<R>,
    courses: Arc<C>,
    users: Arc<U>,
    renderer: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<R, C, U, D> CertificateService<R, C, U, D> {
    pub fn new(deps: CertificateServiceDeps<R, C, U, D>) -> Self {
        Self {
            certificates: deps.certificates,
            courses: deps.courses,
            users: deps.users,
            renderer: deps.renderer,
            clock: deps.clock,
        }
    }
}

impl<R, C, U, D> CertificateService<R, C, U, D>
where
    R: CertificateRepository,
    C: CourseRepository,
    U: UserRepository,
    D: CertificateRenderer,
{
    async fn find(&self, id: Uuid) -> Result<Certificate, Error> {
        self.certificates
            .find_by_id(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("certificate {id} not found")))
    }

    /// Resolve the names printed on a certificate.
    async fn document_for(&self, certificate: &Certificate) -> Result<CertificateDocument, Error> {
        let student = self
            .users
            .find_by_id(certificate.user_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("user {} not found", certificate.user_id)))?;
        let course = self
            .courses
            .find_by_id(certificate.course_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| {
                Error::not_found(format!("course {} not found", certificate.course_id))
            })?;
        let instructor_name = self
            .users
            .find_by_id(course.instructor_id)
            .await
            .map_err(Error::from)?
            .map_or_else(|| UNKNOWN_INSTRUCTOR.to_owned(), |user| user.display_name());

        Ok(CertificateDocument {
            certificate_number: certificate.certificate_number.clone(),
            student_name: student.display_name(),
            course_title: course.title,
            instructor_name,
            issued_at: certificate.issued_at,
        })
    }
}

#[async_trait]
impl<R, C, U, D> CertificateCommand for CertificateService<R, C, U, D>
where
    R: CertificateRepository,
    C: CourseRepository,
    U: UserRepository,
    D: CertificateRenderer,
{
    async fn issue(&self, enrollment_id: Uuid) -> Result<Certificate, Error> {
        let issued = self
            .certificates
            .issue(enrollment_id, self.clock.utc())
            .await
            .map_err(Error::from)?;
        if issued.newly_issued {
            info!(
                %enrollment_id,
                certificate_id = %issued.certificate.id,
                certificate_number = %issued.certificate.certificate_number,
                "certificate issued"
            );
        } else {
            debug!(%enrollment_id, "certificate already issued");
        }
        Ok(issued.certificate)
    }
}

#[async_trait]
impl<R, C, U, D> CertificateQuery for CertificateService<R, C, U, D>
where
    R: CertificateRepository,
    C: CourseRepository,
    U: UserRepository,
    D: CertificateRenderer,
{
    async fn get(&self, id: Uuid) -> Result<Certificate, Error> {
        self.find(id).await
    }

    async fn for_user(&self, user_id: Uuid) -> Result<Vec<Certificate>, Error> {
        self.certificates
            .list_for_user(user_id)
            .await
            .map_err(Error::from)
    }

    async fn for_course(&self, course_id: Uuid) -> Result<Vec<Certificate>, Error> {
        self.certificates
            .list_for_course(course_id)
            .await
            .map_err(Error::from)
    }

    async fn verify(&self, number: String) -> Result<CertificateVerification, Error> {
        let found = self
            .certificates
            .find_by_number(number.trim())
            .await
            .map_err(Error::from)?;
        let Some(certificate) = found else {
            debug!(certificate_number = %number, "certificate number not recognised");
            return Ok(CertificateVerification::invalid());
        };
        let document = self.document_for(&certificate).await?;
        Ok(CertificateVerification::valid(VerifiedCertificate {
            id: certificate.id,
            document,
        }))
    }

    async fn stats(&self) -> Result<CertificateStats, Error> {
        let certificates = self
            .certificates
            .list_all()
            .await
            .map_err(Error::from)?;
        Ok(CertificateStats::from_certificates(
            &certificates,
            self.clock.utc(),
        ))
    }

    async fn download(&self, id: Uuid) -> Result<CertificateFile, Error> {
        let certificate = self.find(id).await?;
        let document = self.document_for(&certificate).await?;
        let bytes = self.renderer.render(&document).map_err(Error::from)?;
        Ok(CertificateFile {
            file_name: format!("certificate-{}.pdf", certificate.certificate_number),
            content_type: self.renderer.content_type(),
            bytes,
        })
    }
}

#[cfg(test)]
#[path = "certificate_service_tests.rs"]
mod tests;
