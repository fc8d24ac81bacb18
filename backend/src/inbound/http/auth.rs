//! Identity-provider webhook.
//!
//! The provider posts `user.created`, `user.updated` and `user.deleted`
//! events; the handler maps them onto [`IdentityEvent`] and keeps the local
//! user directory in step. When an identity webhook secret is configured the
//! `webhook-signature` header must carry a valid signature.

use actix_web::{HttpRequest, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::ports::{IdentityEvent, WebhookAck};
use crate::domain::{EmailAddress, Error, IdentityProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, WebhookAckSchema};
use crate::inbound::http::state::HttpState;

/// Header carrying the identity provider's signature.
pub const IDENTITY_SIGNATURE_HEADER: &str = "webhook-signature";

/// Provider payload: `{"type": "user.created", "data": {...}}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IdentityWebhookPayload {
    #[serde(rename = "type")]
    #[schema(example = "user.created")]
    pub event_type: String,
    pub data: IdentityWebhookUser,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct IdentityWebhookUser {
    /// Provider user id.
    pub id: Option<String>,
    pub email_addresses: Vec<IdentityWebhookEmail>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct IdentityWebhookEmail {
    pub email_address: String,
}

fn required_user_id(data: &IdentityWebhookUser) -> Result<String, Error> {
    data.id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::invalid_request("identity event is missing data.id"))
}

impl TryFrom<IdentityWebhookPayload> for IdentityEvent {
    type Error = Error;

    fn try_from(payload: IdentityWebhookPayload) -> Result<Self, Self::Error> {
        let IdentityWebhookPayload { event_type, data } = payload;
        match event_type.as_str() {
            "user.created" | "user.updated" => {
                let external_id = required_user_id(&data)?;
                let raw_email = data
                    .email_addresses
                    .first()
                    .map(|entry| entry.email_address.as_str())
                    .ok_or_else(|| {
                        Error::invalid_request("identity event has no email address")
                    })?;
                let email = EmailAddress::new(raw_email).map_err(|err| {
                    Error::invalid_request(err.to_string()).with_details(json!({
                        "field": "email_addresses",
                        "value": raw_email,
                        "code": "invalid_email",
                    }))
                })?;
                Ok(Self::Upsert {
                    event_type,
                    profile: IdentityProfile {
                        external_id,
                        email,
                        first_name: data.first_name,
                        last_name: data.last_name,
                        image_url: data.image_url,
                    },
                })
            }
            "user.deleted" => Ok(Self::Deleted {
                external_id: required_user_id(&data)?,
            }),
            _ => Ok(Self::Unrecognised { event_type }),
        }
    }
}

/// Synchronise the user directory with the identity provider.
#[utoipa::path(
    post,
    path = "/api/v1/auth/webhook",
    request_body = IdentityWebhookPayload,
    params(("webhook-signature" = Option<String>, Header, description = "Required when a secret is configured")),
    responses(
        (status = 200, description = "Event received", body = WebhookAckSchema),
        (status = 400, description = "Malformed event", body = ErrorSchema),
        (status = 401, description = "Signature missing or invalid", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "identityWebhook"
)]
#[post("/auth/webhook")]
pub async fn identity_webhook(
    state: web::Data<HttpState>,
    request: HttpRequest,
    body: web::Bytes,
) -> ApiResult<web::Json<WebhookAck>> {
    let verifier = &state.webhooks.identity;
    if verifier.is_configured() {
        let signature = request
            .headers()
            .get(IDENTITY_SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());
        if let Err(err) = verifier.verify(signature, &body, state.clock.utc()) {
            warn!(error = %err, "identity webhook rejected");
            return Err(err.into());
        }
    }

    let payload: IdentityWebhookPayload = serde_json::from_slice(&body)
        .map_err(|err| Error::invalid_request(format!("invalid webhook payload: {err}")))?;
    let event = IdentityEvent::try_from(payload)?;
    Ok(web::Json(state.users_command.sync_identity(event).await?))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(identity_webhook);
}
