//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every handler in the inbound HTTP layer and the
//! schema wrappers from [`crate::inbound::http::schemas`], which describe
//! domain types without coupling them to utoipa. Swagger UI serves the
//! document in debug builds and `cargo run --bin openapi-dump` prints it.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::auth::IDENTITY_SIGNATURE_HEADER;
use crate::inbound::http::payments::PAYMENT_SIGNATURE_HEADER;
use crate::inbound::http::schemas::{
    CertificateSchema, CertificateStatsSchema, CertificateVerificationSchema,
    CheckoutSessionSchema, CourseAnalyticsSchema, CourseDetailSchema,
    CourseProgressSummarySchema, CourseSchema, CourseStatsSchema, CourseStatusSchema,
    CourseWithEnrollmentsSchema, DashboardSchema, EnrollmentSchema, EnrollmentStatsSchema,
    EnrollmentStatusSchema, ErrorCodeSchema, ErrorSchema, LessonCompletionSchema,
    LessonProgressSchema, LessonSchema, PaymentSchema, PaymentStatsSchema, PaymentStatusSchema,
    PopularCourseSchema, RevenueReportSchema, UserAnalyticsSchema, UserRoleSchema, UserSchema,
    VerifiedCertificateSchema, WebhookAckSchema,
};

/// Documents the two webhook signature headers as API key schemes.
struct WebhookSignatureAddon;

impl Modify for WebhookSignatureAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "PaymentSignature",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                PAYMENT_SIGNATURE_HEADER,
                "t=<unix>,v1=<hex HMAC-SHA256 of \"t.body\"> signed by the payment processor.",
            ))),
        );
        components.add_security_scheme(
            "IdentitySignature",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                IDENTITY_SIGNATURE_HEADER,
                "Same format as PaymentSignature; enforced when a secret is configured.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&WebhookSignatureAddon),
    info(
        title = "Academy backend API",
        description = "Course catalogue, enrollments, payments, certificates and analytics."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::courses::create_course,
        crate::inbound::http::courses::list_courses,
        crate::inbound::http::courses::search_courses,
        crate::inbound::http::courses::popular_courses,
        crate::inbound::http::courses::get_course_by_slug,
        crate::inbound::http::courses::courses_by_instructor,
        crate::inbound::http::courses::get_course,
        crate::inbound::http::courses::course_stats,
        crate::inbound::http::courses::update_course,
        crate::inbound::http::courses::delete_course,
        crate::inbound::http::courses::create_lesson,
        crate::inbound::http::courses::update_lesson,
        crate::inbound::http::courses::delete_lesson,
        crate::inbound::http::enrollments::enroll,
        crate::inbound::http::enrollments::list_enrollments,
        crate::inbound::http::enrollments::enrollment_stats,
        crate::inbound::http::enrollments::enrollments_for_user,
        crate::inbound::http::enrollments::enrollments_for_course,
        crate::inbound::http::enrollments::get_enrollment,
        crate::inbound::http::enrollments::update_enrollment,
        crate::inbound::http::enrollments::update_progress,
        crate::inbound::http::enrollments::complete_lesson,
        crate::inbound::http::enrollments::delete_enrollment,
        crate::inbound::http::payments::create_checkout,
        crate::inbound::http::payments::payment_webhook,
        crate::inbound::http::payments::payment_stats,
        crate::inbound::http::payments::payment_by_session,
        crate::inbound::http::payments::payments_for_user,
        crate::inbound::http::payments::payments_for_course,
        crate::inbound::http::payments::get_payment,
        crate::inbound::http::payments::refund_payment,
        crate::inbound::http::certificates::issue_certificate,
        crate::inbound::http::certificates::certificate_stats,
        crate::inbound::http::certificates::verify_certificate,
        crate::inbound::http::certificates::certificates_for_user,
        crate::inbound::http::certificates::certificates_for_course,
        crate::inbound::http::certificates::get_certificate,
        crate::inbound::http::certificates::download_certificate,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::search_users,
        crate::inbound::http::users::get_user_by_email,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::user_enrollments,
        crate::inbound::http::users::user_courses,
        crate::inbound::http::users::user_progress,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::auth::identity_webhook,
        crate::inbound::http::analytics::dashboard,
        crate::inbound::http::analytics::popular_courses,
        crate::inbound::http::analytics::course_analytics,
        crate::inbound::http::analytics::user_analytics,
        crate::inbound::http::analytics::revenue,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        UserSchema,
        UserRoleSchema,
        CourseSchema,
        CourseStatusSchema,
        CourseDetailSchema,
        CourseWithEnrollmentsSchema,
        CourseStatsSchema,
        LessonSchema,
        EnrollmentSchema,
        EnrollmentStatusSchema,
        EnrollmentStatsSchema,
        LessonProgressSchema,
        LessonCompletionSchema,
        CourseProgressSummarySchema,
        PaymentSchema,
        PaymentStatusSchema,
        PaymentStatsSchema,
        CheckoutSessionSchema,
        WebhookAckSchema,
        CertificateSchema,
        VerifiedCertificateSchema,
        CertificateVerificationSchema,
        CertificateStatsSchema,
        DashboardSchema,
        CourseAnalyticsSchema,
        UserAnalyticsSchema,
        PopularCourseSchema,
        RevenueReportSchema,
    )),
    tags(
        (name = "courses", description = "Course catalogue and lessons"),
        (name = "enrollments", description = "Enrollment lifecycle and lesson progress"),
        (name = "payments", description = "Checkout, processor webhook and refunds"),
        (name = "certificates", description = "Completion certificates"),
        (name = "users", description = "User directory"),
        (name = "auth", description = "Identity provider synchronisation"),
        (name = "analytics", description = "Read-only reports"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Schema field structure and route coverage of the generated document.

    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    fn schema(name: &str) -> RefOr<Schema> {
        let doc = ApiDoc::openapi();
        doc.components
            .expect("components")
            .schemas
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("{name} schema registered"))
    }

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("Error", "code")]
    #[case("Error", "traceId")]
    #[case("User", "externalId")]
    #[case("Enrollment", "progress")]
    #[case("Payment", "amountCents")]
    #[case("Certificate", "certificateNumber")]
    fn wrapper_schemas_use_wire_names(#[case] name: &str, #[case] field: &str) {
        assert_object_schema_has_field(&schema(name), field);
    }

    #[rstest]
    #[case("/api/v1/courses/{id}/lessons")]
    #[case("/api/v1/enrollments/{id}/lessons/{lessonId}/complete")]
    #[case("/api/v1/payments/webhook")]
    #[case("/api/v1/pdf/certificates/{id}/download")]
    #[case("/api/v1/users/{id}/progress")]
    #[case("/api/v1/auth/webhook")]
    #[case("/api/v1/analytics/revenue")]
    #[case("/health/ready")]
    fn routes_are_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn webhook_signature_schemes_are_registered() {
        let doc = ApiDoc::openapi();
        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("PaymentSignature"));
        assert!(schemes.contains_key("IdentitySignature"));
    }
}
