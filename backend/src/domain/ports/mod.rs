//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, payment gateway, certificate renderer) are
//! implemented by outbound adapters. Driving ports (`*Command`, `*Query`) are
//! implemented by the domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;
pub use macros::PortErrorKind;

mod analytics_query;
mod analytics_repository;
mod certificate_command;
mod certificate_query;
mod certificate_renderer;
mod certificate_repository;
mod course_command;
mod course_query;
mod course_repository;
mod enrollment_command;
mod enrollment_query;
mod enrollment_repository;
mod payment_command;
mod payment_gateway;
mod payment_query;
mod payment_repository;
mod user_command;
mod user_query;
mod user_repository;

#[cfg(test)]
pub use analytics_query::MockAnalyticsQuery;
pub use analytics_query::{AnalyticsQuery, POPULAR_MAX_LIMIT};
#[cfg(test)]
pub use analytics_repository::MockAnalyticsRepository;
pub use analytics_repository::{AnalyticsRepository, AnalyticsRepositoryError};
pub use certificate_command::CertificateCommand;
#[cfg(test)]
pub use certificate_command::MockCertificateCommand;
#[cfg(test)]
pub use certificate_query::MockCertificateQuery;
pub use certificate_query::{CertificateFile, CertificateQuery};
#[cfg(test)]
pub use certificate_renderer::MockCertificateRenderer;
pub use certificate_renderer::{CertificateRenderError, CertificateRenderer};
#[cfg(test)]
pub use certificate_repository::MockCertificateRepository;
pub use certificate_repository::{CertificateRepository, CertificateRepositoryError};
pub use course_command::CourseCommand;
#[cfg(test)]
pub use course_command::MockCourseCommand;
#[cfg(test)]
pub use course_query::MockCourseQuery;
pub use course_query::{CourseQuery, CourseStats, POPULAR_DEFAULT_LIMIT, SEARCH_LIMIT};
#[cfg(test)]
pub use course_repository::MockCourseRepository;
pub use course_repository::{
    CourseFilter, CourseRepository, CourseRepositoryError, CourseWithEnrollments,
};
#[cfg(test)]
pub use enrollment_command::MockEnrollmentCommand;
pub use enrollment_command::{EnrollmentCommand, UpdateEnrollmentRequest};
pub use enrollment_query::EnrollmentQuery;
#[cfg(test)]
pub use enrollment_query::MockEnrollmentQuery;
#[cfg(test)]
pub use enrollment_repository::MockEnrollmentRepository;
pub use enrollment_repository::{
    EnrollmentChange, EnrollmentFilter, EnrollmentRepository, EnrollmentRepositoryError,
};
#[cfg(test)]
pub use payment_command::MockPaymentCommand;
pub use payment_command::{CheckoutCommand, PaymentCommand, RefundCommand, WebhookAck};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    CheckoutRequest, GatewaySession, PaymentGateway, PaymentGatewayError, RefundRequest,
};
#[cfg(test)]
pub use payment_query::MockPaymentQuery;
pub use payment_query::PaymentQuery;
#[cfg(test)]
pub use payment_repository::MockPaymentRepository;
pub use payment_repository::{
    PaymentFilter, PaymentRepository, PaymentRepositoryError, Reconciliation,
};
#[cfg(test)]
pub use user_command::MockUserCommand;
pub use user_command::{IdentityEvent, UserCommand};
#[cfg(test)]
pub use user_query::MockUserQuery;
pub use user_query::{USER_SEARCH_LIMIT, UserQuery};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
