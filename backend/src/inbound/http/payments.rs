//! Payment API handlers and the processor webhook.
//!
//! ```text
//! POST /api/v1/payments/checkout {"courseId":"...","userId":"...","successUrl":"...","cancelUrl":"..."}
//! POST /api/v1/payments/webhook   (raw body, `stripe-signature` header)
//! POST /api/v1/payments/{id}/refund {"reason":"duplicate"}
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CheckoutCommand, PaymentFilter, RefundCommand, WebhookAck};
use crate::domain::{CheckoutSession, Error, Payment, PaymentEvent, PaymentStats, RefundReason};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    CheckoutSessionSchema, ErrorSchema, PaymentSchema, PaymentStatsSchema, WebhookAckSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_optional_enum, parse_optional_uuid, parse_uuid, require_text,
};

/// Header carrying the processor's webhook signature.
pub const PAYMENT_SIGNATURE_HEADER: &str = "stripe-signature";

const REFUND_REASONS: &str = "requested_by_customer, duplicate, fraudulent";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub course_id: String,
    pub user_id: String,
    /// Where the processor sends the student after paying.
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    /// Partial amount in minor units; the full amount when omitted.
    pub amount_cents: Option<i64>,
    #[schema(example = "requested_by_customer")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaymentStatsQuery {
    pub course_id: Option<String>,
    pub user_id: Option<String>,
}

/// Processor event envelope: `{"type": "...", "data": {"object": {...}}}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookData {
    #[schema(value_type = Object)]
    pub object: Value,
}

fn object_str(object: &Value, pointer: &str) -> Option<String> {
    object
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn required_object_id(object: &Value, event_type: &str) -> Result<String, Error> {
    object_str(object, "/id").ok_or_else(|| {
        Error::invalid_request(format!("{event_type} event is missing data.object.id"))
    })
}

impl TryFrom<WebhookEnvelope> for PaymentEvent {
    type Error = Error;

    fn try_from(envelope: WebhookEnvelope) -> Result<Self, Self::Error> {
        let WebhookEnvelope { event_type, data } = envelope;
        let object = data.object;
        let event = match event_type.as_str() {
            "checkout.session.completed" => Self::CheckoutSessionCompleted {
                session_id: required_object_id(&object, &event_type)?,
                payment_intent_id: object_str(&object, "/payment_intent"),
                receipt_url: object_str(&object, "/receipt_url"),
            },
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded {
                payment_intent_id: required_object_id(&object, &event_type)?,
                receipt_url: object_str(&object, "/receipt_url"),
            },
            "payment_intent.payment_failed" => Self::PaymentIntentFailed {
                payment_intent_id: required_object_id(&object, &event_type)?,
                failure_message: object_str(&object, "/last_payment_error/message"),
            },
            _ => Self::Unrecognised { event_type },
        };
        Ok(event)
    }
}

/// Create a PENDING payment and enrollment and a hosted checkout session.
#[utoipa::path(
    post,
    path = "/api/v1/payments/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Checkout session created", body = CheckoutSessionSchema),
        (status = 400, description = "Invalid request or free course", body = ErrorSchema),
        (status = 404, description = "User or course not found", body = ErrorSchema),
        (status = 409, description = "Already enrolled", body = ErrorSchema),
        (status = 503, description = "Payment processor unavailable", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "createCheckout"
)]
#[post("/payments/checkout")]
pub async fn create_checkout(
    state: web::Data<HttpState>,
    payload: web::Json<CheckoutRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let command = CheckoutCommand {
        course_id: parse_uuid(&body.course_id, FieldName::new("courseId"))?,
        user_id: parse_uuid(&body.user_id, FieldName::new("userId"))?,
        success_url: require_text(body.success_url, FieldName::new("successUrl"))?,
        cancel_url: require_text(body.cancel_url, FieldName::new("cancelUrl"))?,
    };
    let session: CheckoutSession = state.payments_command.create_checkout(command).await?;
    Ok(HttpResponse::Created().json(session))
}

/// Reconcile a processor event. Unknown event types are acknowledged.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body = WebhookEnvelope,
    params(("stripe-signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")),
    responses(
        (status = 200, description = "Event received", body = WebhookAckSchema),
        (status = 400, description = "Malformed event", body = ErrorSchema),
        (status = 401, description = "Signature missing or invalid", body = ErrorSchema),
        (status = 404, description = "No payment for the event", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "paymentWebhook"
)]
#[post("/payments/webhook")]
pub async fn payment_webhook(
    state: web::Data<HttpState>,
    request: HttpRequest,
    body: web::Bytes,
) -> ApiResult<web::Json<WebhookAck>> {
    let signature = request
        .headers()
        .get(PAYMENT_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(err) = state
        .webhooks
        .payments
        .verify(signature, &body, state.clock.utc())
    {
        warn!(error = %err, "payment webhook rejected");
        return Err(err.into());
    }

    let envelope: WebhookEnvelope = serde_json::from_slice(&body)
        .map_err(|err| Error::invalid_request(format!("invalid webhook payload: {err}")))?;
    let event = PaymentEvent::try_from(envelope)?;
    debug!(event_type = event.event_type(), "payment webhook verified");
    Ok(web::Json(state.payments_command.handle_event(event).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/stats",
    params(PaymentStatsQuery),
    responses(
        (status = 200, description = "Counts, revenue and success rate", body = PaymentStatsSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "paymentStats"
)]
#[get("/payments/stats")]
pub async fn payment_stats(
    state: web::Data<HttpState>,
    query: web::Query<PaymentStatsQuery>,
) -> ApiResult<web::Json<PaymentStats>> {
    let filter = PaymentFilter {
        user_id: parse_optional_uuid(query.user_id.as_deref(), FieldName::new("userId"))?,
        course_id: parse_optional_uuid(query.course_id.as_deref(), FieldName::new("courseId"))?,
    };
    Ok(web::Json(state.payments.stats(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/session/{sessionId}",
    params(("sessionId" = String, Path, description = "Checkout session id")),
    responses(
        (status = 200, description = "Payment", body = PaymentSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "paymentBySession"
)]
#[get("/payments/session/{session_id}")]
pub async fn payment_by_session(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Payment>> {
    Ok(web::Json(state.payments.by_session(path.into_inner()).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/user/{userId}",
    params(("userId" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The user's payments", body = [PaymentSchema]),
        (status = 400, description = "Invalid id", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "paymentsForUser"
)]
#[get("/payments/user/{user_id}")]
pub async fn payments_for_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Payment>>> {
    let user_id = parse_uuid(&path, FieldName::new("userId"))?;
    Ok(web::Json(state.payments.for_user(user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/course/{courseId}",
    params(("courseId" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course's payments", body = [PaymentSchema]),
        (status = 400, description = "Invalid id", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "paymentsForCourse"
)]
#[get("/payments/course/{course_id}")]
pub async fn payments_for_course(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Payment>>> {
    let course_id = parse_uuid(&path, FieldName::new("courseId"))?;
    Ok(web::Json(state.payments.for_course(course_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    params(("id" = String, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment", body = PaymentSchema),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "getPayment"
)]
#[get("/payments/{id}")]
pub async fn get_payment(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Payment>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    Ok(web::Json(state.payments.get(id).await?))
}

/// Refund a SUCCEEDED payment in full or in part.
#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/refund",
    params(("id" = String, Path, description = "Payment id")),
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Refunded payment", body = PaymentSchema),
        (status = 400, description = "Payment is not refundable", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "A refund is already in progress", body = ErrorSchema),
        (status = 503, description = "Payment processor unavailable", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "refundPayment"
)]
#[post("/payments/{id}/refund")]
pub async fn refund_payment(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: Option<web::Json<RefundRequest>>,
) -> ApiResult<web::Json<Payment>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    let body = payload.map(web::Json::into_inner).unwrap_or_default();
    let command = RefundCommand {
        amount_cents: body.amount_cents,
        reason: parse_optional_enum::<RefundReason>(
            body.reason.as_deref(),
            FieldName::new("reason"),
            REFUND_REASONS,
        )?,
    };
    Ok(web::Json(state.payments_command.refund(id, command).await?))
}

/// Register payment routes; literal segments come before `{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_checkout)
        .service(payment_webhook)
        .service(payment_stats)
        .service(payment_by_session)
        .service(payments_for_user)
        .service(payments_for_course)
        .service(get_payment)
        .service(refund_payment);
}

#[cfg(test)]
#[path = "payments_tests.rs"]
mod tests;
