//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay free of utoipa derives. The wrappers below mirror their
//! JSON shape and register under the domain names, so handlers can reference
//! them in `#[utoipa::path]` responses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stable machine-readable error codes.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// A webhook signature is missing or wrong.
    Unauthorized,
    Forbidden,
    /// The referenced resource does not exist.
    NotFound,
    /// The request clashes with existing state.
    Conflict,
    /// A dependency such as the database is unavailable.
    ServiceUnavailable,
    InternalError,
}

/// Error envelope returned by every failing endpoint.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Error)]
pub struct ErrorSchema {
    #[schema(example = "not_found")]
    code: ErrorCodeSchema,
    #[schema(example = "course 3fa85f64-5717-4562-b3fc-2c963f66afa6 not found")]
    message: String,
    /// Correlates the response with server logs.
    #[schema(example = "0f0f2f55-5a7c-4d3b-9d6c-3f2e7f1f8a10")]
    trace_id: Option<String>,
    /// Machine-readable context, e.g. `{field, value, code}` for validation.
    #[schema(value_type = Object)]
    details: Option<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[schema(as = UserRole)]
pub enum UserRoleSchema {
    Student,
    Instructor,
    Admin,
}

/// Platform user synchronised from the identity provider.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = User)]
pub struct UserSchema {
    id: Uuid,
    /// Identity-provider user id.
    external_id: String,
    #[schema(example = "ada@example.com")]
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: Option<String>,
    role: UserRoleSchema,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[schema(as = CourseStatus)]
pub enum CourseStatusSchema {
    Draft,
    Published,
}

/// Course in the catalogue.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Course)]
pub struct CourseSchema {
    id: Uuid,
    title: String,
    #[schema(example = "analytical-engines")]
    slug: String,
    description: String,
    short_description: Option<String>,
    /// Price in minor units.
    #[schema(example = 4900)]
    price_cents: i64,
    #[schema(example = "USD")]
    currency: String,
    image_url: Option<String>,
    instructor_id: Uuid,
    status: CourseStatusSchema,
    keywords: Vec<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Lesson)]
pub struct LessonSchema {
    id: Uuid,
    course_id: Uuid,
    title: String,
    content: String,
    video_url: Option<String>,
    duration_minutes: Option<i32>,
    position: i32,
    is_preview: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Course fields plus its lessons ordered by position.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = CourseDetail)]
pub struct CourseDetailSchema {
    #[serde(flatten)]
    course: CourseSchema,
    lessons: Vec<LessonSchema>,
}

/// Course fields plus its enrollment count.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = CourseWithEnrollments)]
pub struct CourseWithEnrollmentsSchema {
    #[serde(flatten)]
    course: CourseSchema,
    enrollments: u64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = CourseStats)]
pub struct CourseStatsSchema {
    total_enrollments: u64,
    active_enrollments: u64,
    completed_enrollments: u64,
    total_lessons: u64,
    completion_rate: u32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[schema(as = EnrollmentStatus)]
pub enum EnrollmentStatusSchema {
    Pending,
    Active,
    Completed,
    Cancelled,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Enrollment)]
pub struct EnrollmentSchema {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    status: EnrollmentStatusSchema,
    /// Whole percentage in `0..=100`.
    #[schema(minimum = 0, maximum = 100)]
    progress: u8,
    enrolled_at: DateTime<Utc>,
    /// Set once the enrollment is COMPLETED.
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = LessonProgress)]
pub struct LessonProgressSchema {
    id: Uuid,
    enrollment_id: Uuid,
    lesson_id: Uuid,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = LessonCompletion)]
pub struct LessonCompletionSchema {
    lesson_progress: LessonProgressSchema,
    enrollment: EnrollmentSchema,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = EnrollmentStats)]
pub struct EnrollmentStatsSchema {
    total: u64,
    active: u64,
    completed: u64,
    pending: u64,
    cancelled: u64,
    average_progress: u32,
    completion_rate: u32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = CourseProgressSummary)]
pub struct CourseProgressSummarySchema {
    enrollment_id: Uuid,
    course_id: Uuid,
    course_title: String,
    status: EnrollmentStatusSchema,
    progress: u8,
    completed_lessons: u64,
    total_lessons: u64,
    progress_percentage: u8,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[schema(as = PaymentStatus)]
pub enum PaymentStatusSchema {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Payment)]
pub struct PaymentSchema {
    id: Uuid,
    enrollment_id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    amount_cents: i64,
    currency: String,
    status: PaymentStatusSchema,
    checkout_session_id: Option<String>,
    payment_intent_id: Option<String>,
    receipt_url: Option<String>,
    failure_reason: Option<String>,
    refund_id: Option<String>,
    refunded_amount_cents: Option<i64>,
    #[schema(example = "requested_by_customer")]
    refund_reason: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    refunded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = PaymentStats)]
pub struct PaymentStatsSchema {
    total_payments: u64,
    pending_payments: u64,
    successful_payments: u64,
    failed_payments: u64,
    refunded_payments: u64,
    total_revenue_cents: i64,
    success_rate: u32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = CheckoutSession)]
pub struct CheckoutSessionSchema {
    session_id: String,
    /// Hosted payment page to redirect the student to.
    payment_url: String,
    payment_id: Uuid,
}

/// Acknowledgement returned to webhook senders.
#[derive(Serialize, ToSchema)]
#[schema(as = WebhookAck)]
pub struct WebhookAckSchema {
    received: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Certificate)]
pub struct CertificateSchema {
    id: Uuid,
    enrollment_id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    #[schema(example = "CERT-202604-0007")]
    certificate_number: String,
    issued_at: DateTime<Utc>,
    /// Download route for the PDF document.
    pdf_url: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = VerifiedCertificate)]
pub struct VerifiedCertificateSchema {
    id: Uuid,
    certificate_number: String,
    student_name: String,
    course_title: String,
    instructor_name: String,
    issued_at: DateTime<Utc>,
}

/// Unknown numbers report `isValid: false` without a certificate.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = CertificateVerification)]
pub struct CertificateVerificationSchema {
    is_valid: bool,
    certificate: Option<VerifiedCertificateSchema>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = CertificateStats)]
pub struct CertificateStatsSchema {
    total_certificates: u64,
    certificates_this_month: u64,
    certificates_this_year: u64,
}

/// Platform overview, last-30-day activity and monthly figures.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Dashboard)]
pub struct DashboardSchema {
    #[schema(value_type = Object)]
    overview: serde_json::Value,
    #[schema(value_type = Object)]
    recent_activity: serde_json::Value,
    #[schema(value_type = Vec<Object>)]
    monthly_stats: Vec<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = CourseAnalytics)]
pub struct CourseAnalyticsSchema {
    #[schema(value_type = Object)]
    course: serde_json::Value,
    enrollment_stats: EnrollmentStatsSchema,
    #[schema(value_type = Object)]
    revenue: serde_json::Value,
    #[schema(value_type = Vec<Object>)]
    recent_enrollments: Vec<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = UserAnalytics)]
pub struct UserAnalyticsSchema {
    #[schema(value_type = Object)]
    user: serde_json::Value,
    #[schema(value_type = Object)]
    enrollment_stats: serde_json::Value,
    #[schema(value_type = Object)]
    financials: serde_json::Value,
    #[schema(value_type = Vec<Object>)]
    recent_enrollments: Vec<serde_json::Value>,
    #[schema(value_type = Vec<Object>)]
    certificates: Vec<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = PopularCourse)]
pub struct PopularCourseSchema {
    id: Uuid,
    title: String,
    slug: String,
    price_cents: i64,
    currency: String,
    enrollments: u64,
    completions: u64,
    /// Mean progress of completed enrollments.
    average_progress: u32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = RevenueReport)]
pub struct RevenueReportSchema {
    #[schema(value_type = Object)]
    summary: serde_json::Value,
    #[schema(value_type = Vec<Object>)]
    daily_revenue: Vec<serde_json::Value>,
    #[schema(value_type = Vec<Object>)]
    top_courses: Vec<serde_json::Value>,
}
