use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::dispatch::{self, RequestContext, method_handler};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Scorix",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Single RPC endpoint: every method call is a POST with a JSON envelope.
pub async fn method(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    let mut ctx = RequestContext::new(request_id);

    let parsed: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(request_id = %ctx.request_id, error = %err, "unparsable body");
            return envelope(Value::Null, dispatch::BAD_REQUEST);
        }
    };

    match method_handler(&parsed, &mut ctx, state.store.as_ref(), &state.auth).await {
        Ok((payload, code)) => {
            tracing::info!(
                request_id = %ctx.request_id,
                code,
                has = ?ctx.has,
                nclients = ctx.nclients,
                "method handled"
            );
            envelope(payload, code)
        }
        Err(err) => {
            tracing::error!(request_id = %ctx.request_id, error = %err, "method failed");
            envelope(Value::Null, dispatch::INTERNAL_ERROR)
        }
    }
}

/// Every unknown path answers with the same 404 envelope.
pub async fn unknown_path() -> impl IntoResponse {
    envelope(Value::Null, dispatch::NOT_FOUND)
}

/// Wrap a handler payload into the response envelope. Success carries
/// the payload under `response`; failures carry a message under `error`,
/// falling back to the code's reason phrase when the handler gave none.
fn envelope(payload: Value, code: u16) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = if code < 400 {
        json!({ "response": payload, "code": code })
    } else {
        let error = match payload {
            Value::String(message) => message,
            _ => dispatch::reason(code).to_string(),
        };
        json!({ "error": error, "code": code })
    };
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_carries_the_payload() {
        let (status, Json(body)) = envelope(json!({"score": 3.0}), dispatch::OK);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"response": {"score": 3.0}, "code": 200}));
    }

    #[test]
    fn error_envelope_prefers_the_handler_message() {
        let (status, Json(body)) = envelope(json!("phone: invalid"), dispatch::INVALID_REQUEST);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, json!({"error": "phone: invalid", "code": 422}));
    }

    #[test]
    fn error_envelope_falls_back_to_the_reason_phrase() {
        let (status, Json(body)) = envelope(Value::Null, dispatch::FORBIDDEN);
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "Forbidden", "code": 403}));
    }
}
