//! Domain primitives, aggregates, and use-case services.
//!
//! Purpose: define strongly typed entities for the learning platform and the
//! services that drive their lifecycles. Types here are transport agnostic;
//! inbound adapters translate them to HTTP and outbound adapters persist
//! them through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Course, Lesson, Enrollment, Payment, Certificate: entities.
//! - `*Service`: use-case implementations of the driving ports.
//! - analytics: pure report builders over an `AnalyticsSnapshot`.

pub mod analytics;
pub mod certificate;
pub mod course;
pub mod enrollment;
pub mod error;
pub mod money;
pub mod pagination;
pub mod payment;
pub mod ports;
pub mod trace_id;
pub mod user;

mod analytics_service;
mod certificate_service;
mod course_service;
mod enrollment_service;
mod payment_service;
#[cfg(test)]
mod service_test_support;
mod user_service;

pub use self::analytics::{AnalyticsSnapshot, RevenuePeriod, UnknownPeriod};
pub use self::analytics_service::AnalyticsService;
pub use self::certificate::{
    Certificate, CertificateDocument, CertificateNumber, CertificateStats,
    CertificateVerification, IssuancePeriod, IssuedCertificate, NotCompleted,
    VerifiedCertificate, certificate_pdf_url,
};
pub use self::certificate_service::{CertificateService, CertificateServiceDeps};
pub use self::course::{
    Course, CourseDetail, CourseStatus, CourseUpdate, CourseValidationError, Lesson,
    LessonUpdate, NewCourse, NewLesson,
};
pub use self::course_service::CourseService;
pub use self::enrollment::{
    CourseProgressSummary, Enrollment, EnrollmentRecord, EnrollmentStats, EnrollmentStatus,
    EnrollmentTransitionError, LessonCompletion, LessonProgress, LessonTally, Progress,
};
pub use self::enrollment_service::EnrollmentService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::money::{Currency, InvalidCurrency};
pub use self::pagination::PageRequest;
pub use self::payment::{
    CheckoutSession, Payment, PaymentEvent, PaymentLookup, PaymentRuleError, PaymentStats,
    PaymentStatus, REFUND_CLAIM_TTL, ReconcileOutcome, RefundClaim, RefundReason, RefundReceipt,
    apply_event, settle_refund,
};
pub use self::payment_service::{PaymentService, PaymentServiceDeps};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EmailAddress, IdentityProfile, User, UserRole, UserUpdate, UserValidationError,
};
pub use self::user_service::UserService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use academy_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
