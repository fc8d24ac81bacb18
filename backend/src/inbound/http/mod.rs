//! HTTP inbound adapter exposing the REST API under `/api/v1`.

pub mod analytics;
pub mod auth;
pub mod certificates;
pub mod courses;
pub mod enrollments;
pub mod error;
pub mod health;
pub mod payments;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub(crate) mod validation;
pub mod webhook_signature;

use actix_web::error::JsonPayloadError;
use actix_web::{HttpRequest, web};

use crate::domain::Error;

pub use error::ApiResult;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid JSON body: {err}")).into()
}

/// Register every API route plus a JSON extractor that reports malformed
/// bodies in the standard error envelope. Mount inside the `/api/v1` scope.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use academy_backend::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .configure(courses::configure)
        .configure(enrollments::configure)
        .configure(payments::configure)
        .configure(certificates::configure)
        .configure(users::configure)
        .configure(auth::configure)
        .configure(analytics::configure);
}
