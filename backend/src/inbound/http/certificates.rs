//! Certificate issuance, verification and PDF download handlers.
//!
//! ```text
//! POST /api/v1/pdf/certificates {"enrollmentId":"..."}
//! GET /api/v1/pdf/certificates/verify/CERT-202604-0001
//! GET /api/v1/pdf/certificates/{id}/download
//! ```

use actix_web::http::header::{CONTENT_DISPOSITION, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Certificate, CertificateStats, CertificateVerification};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    CertificateSchema, CertificateStatsSchema, CertificateVerificationSchema, ErrorSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCertificateRequest {
    pub enrollment_id: String,
}

/// Issue the certificate for a COMPLETED enrollment.
///
/// Repeating the call returns the certificate issued the first time.
#[utoipa::path(
    post,
    path = "/api/v1/pdf/certificates",
    request_body = IssueCertificateRequest,
    responses(
        (status = 201, description = "Certificate", body = CertificateSchema),
        (status = 400, description = "Enrollment not completed", body = ErrorSchema),
        (status = 404, description = "Enrollment not found", body = ErrorSchema)
    ),
    tags = ["certificates"],
    operation_id = "issueCertificate"
)]
#[post("/pdf/certificates")]
pub async fn issue_certificate(
    state: web::Data<HttpState>,
    payload: web::Json<IssueCertificateRequest>,
) -> ApiResult<HttpResponse> {
    let enrollment_id = parse_uuid(&payload.enrollment_id, FieldName::new("enrollmentId"))?;
    let certificate = state.certificates_command.issue(enrollment_id).await?;
    Ok(HttpResponse::Created().json(certificate))
}

#[utoipa::path(
    get,
    path = "/api/v1/pdf/certificates/stats",
    responses(
        (status = 200, description = "Issuance counters", body = CertificateStatsSchema)
    ),
    tags = ["certificates"],
    operation_id = "certificateStats"
)]
#[get("/pdf/certificates/stats")]
pub async fn certificate_stats(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<CertificateStats>> {
    Ok(web::Json(state.certificates.stats().await?))
}

/// Public verification by certificate number; unknown numbers are not errors.
#[utoipa::path(
    get,
    path = "/api/v1/pdf/certificates/verify/{number}",
    params(("number" = String, Path, description = "Certificate number, e.g. CERT-202604-0001")),
    responses(
        (status = 200, description = "Verification result", body = CertificateVerificationSchema)
    ),
    tags = ["certificates"],
    operation_id = "verifyCertificate"
)]
#[get("/pdf/certificates/verify/{number}")]
pub async fn verify_certificate(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<CertificateVerification>> {
    Ok(web::Json(state.certificates.verify(path.into_inner()).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/pdf/certificates/user/{userId}",
    params(("userId" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The user's certificates", body = [CertificateSchema]),
        (status = 400, description = "Invalid id", body = ErrorSchema)
    ),
    tags = ["certificates"],
    operation_id = "certificatesForUser"
)]
#[get("/pdf/certificates/user/{user_id}")]
pub async fn certificates_for_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Certificate>>> {
    let user_id = parse_uuid(&path, FieldName::new("userId"))?;
    Ok(web::Json(state.certificates.for_user(user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/pdf/certificates/course/{courseId}",
    params(("courseId" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Certificates for the course", body = [CertificateSchema]),
        (status = 400, description = "Invalid id", body = ErrorSchema)
    ),
    tags = ["certificates"],
    operation_id = "certificatesForCourse"
)]
#[get("/pdf/certificates/course/{course_id}")]
pub async fn certificates_for_course(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Certificate>>> {
    let course_id = parse_uuid(&path, FieldName::new("courseId"))?;
    Ok(web::Json(state.certificates.for_course(course_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/pdf/certificates/{id}",
    params(("id" = String, Path, description = "Certificate id")),
    responses(
        (status = 200, description = "Certificate", body = CertificateSchema),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["certificates"],
    operation_id = "getCertificate"
)]
#[get("/pdf/certificates/{id}")]
pub async fn get_certificate(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Certificate>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    Ok(web::Json(state.certificates.get(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/pdf/certificates/{id}/download",
    params(("id" = String, Path, description = "Certificate id")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["certificates"],
    operation_id = "downloadCertificate"
)]
#[get("/pdf/certificates/{id}/download")]
pub async fn download_certificate(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    let file = state.certificates.download(id).await?;
    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(file.file_name)],
    };
    Ok(HttpResponse::Ok()
        .content_type(file.content_type)
        .insert_header((CONTENT_DISPOSITION, disposition))
        .body(file.bytes))
}

/// Register certificate routes; literal segments come before `{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(issue_certificate)
        .service(certificate_stats)
        .service(verify_certificate)
        .service(certificates_for_user)
        .service(certificates_for_course)
        .service(get_certificate)
        .service(download_certificate);
}
