use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::{error_chain_fmt, AppJson};
use crate::{
    domain::{NewSubscriber, SubscriberEmail, SubscriberName},
    startup::AppState,
    store::StoreError,
};

/// Request bodies larger than this are refused before they are buffered.
pub const MAX_BODY_BYTES: usize = 1_000_000;

/// Body of `POST /subscribe`.
///
/// Only a JSON object is accepted; going through `Map` keeps serde from
/// filling the fields positionally out of an array.
#[derive(serde::Deserialize, Debug)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct SubscribeBody {
    email: Option<String>,
    name: Option<String>,
}

#[derive(serde::Deserialize)]
struct SubscribeFields {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for SubscribeBody {
    type Error = serde_json::Error;

    fn try_from(object: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let SubscribeFields { email, name } =
            serde_json::from_value(serde_json::Value::Object(object))?;
        Ok(Self { email, name })
    }
}

impl TryFrom<SubscribeBody> for NewSubscriber {
    type Error = String;
    fn try_from(value: SubscribeBody) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(value.email.as_deref().unwrap_or_default())?;
        let name = SubscriberName::parse(value.name.as_deref());
        Ok(Self { email, name })
    }
}

#[derive(Serialize)]
pub struct SubscribeResponse {
    message: &'static str,
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(state, body),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    State(state): State<AppState>,
    AppJson(body): AppJson<SubscribeBody>,
) -> Result<AppJson<SubscribeResponse>, SubscribeError> {
    let new_subscriber: NewSubscriber = body.try_into()?;
    tracing::Span::current().record(
        "subscriber_email",
        tracing::field::display(&new_subscriber.email),
    );

    if already_subscribed(&state, &new_subscriber.email).await? {
        return Err(SubscribeError::AlreadySubscribed);
    }

    state
        .writer
        .append(new_subscriber)
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => SubscribeError::AlreadySubscribed,
            e => SubscribeError::StorageError(e),
        })?;

    tracing::info!("New subscriber has been saved");
    Ok(AppJson(SubscribeResponse {
        message: "Subscription successful.",
    }))
}

// Fast path only; the writer re-checks before it writes.
async fn already_subscribed(
    state: &AppState,
    email: &SubscriberEmail,
) -> Result<bool, SubscribeError> {
    match state.store.exists(email.as_ref()).await {
        Ok(exists) => Ok(exists),
        Err(e @ StoreError::Corrupt { .. }) => {
            tracing::warn!(
                error.cause_chain = ?e,
                "Subscriber store is unreadable, treating it as empty"
            );
            Ok(false)
        }
        Err(e) => Err(SubscribeError::StorageError(e)),
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    MalformedBody(#[source] JsonRejection),
    #[error("payload too large")]
    PayloadTooLarge(#[source] JsonRejection),
    #[error("already subscribed")]
    AlreadySubscribed,
    #[error("Failed to store the new subscriber.")]
    StorageError(#[source] StoreError),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<String> for SubscribeError {
    fn from(e: String) -> Self {
        Self::ValidationError(e)
    }
}

impl From<JsonRejection> for SubscribeError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(rejection)
        } else {
            Self::MalformedBody(rejection)
        }
    }
}

impl IntoResponse for SubscribeError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, error) = match &self {
            SubscribeError::ValidationError(_) | SubscribeError::MalformedBody(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            SubscribeError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            SubscribeError::AlreadySubscribed => (StatusCode::CONFLICT, self.to_string()),
            SubscribeError::StorageError(_) => {
                tracing::error!(
                    error.cause_chain = ?self,
                    error.message = %self,
                    "Failed to handle a subscription"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, AppJson(ErrorResponse { error })).into_response()
    }
}
