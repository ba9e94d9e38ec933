//! String-keyed dispatcher from envelope to business method.
//!
//! The handler returns a payload plus an application status code; the
//! transport layer wraps both into the response envelope. Client-side
//! problems (bad token, bad arguments, unknown method) are encoded in
//! the status code, never as `Err` — only infrastructure failures
//! escape through [`HandlerError`].

use scorix_core::{ClientsInterestsRequest, MethodRequest, OnlineScoreRequest};
use scorix_store::{Store, StoreError};
use serde_json::{Value, json};
use thiserror::Error;

use crate::auth::{AuthConfig, check_auth};
use crate::scoring::{ADMIN_SCORE, get_all_interests, get_score};

pub const OK: u16 = 200;
pub const BAD_REQUEST: u16 = 400;
pub const FORBIDDEN: u16 = 403;
pub const NOT_FOUND: u16 = 404;
pub const INVALID_REQUEST: u16 = 422;
pub const INTERNAL_ERROR: u16 = 500;

/// Human-readable name for an application status code.
pub fn reason(code: u16) -> &'static str {
    match code {
        BAD_REQUEST => "Bad Request",
        FORBIDDEN => "Forbidden",
        NOT_FOUND => "Not Found",
        INVALID_REQUEST => "Invalid Request",
        INTERNAL_ERROR => "Internal Server Error",
        _ => "Unknown Error",
    }
}

/// Per-request context threaded through the dispatcher, mirrored into
/// the access log and (for scores) into the response handling.
#[derive(Debug, Default)]
pub struct RequestContext {
    pub request_id: String,
    /// Field names supplied to `online_score`, in schema order.
    pub has: Vec<String>,
    /// Number of client ids passed to `clients_interests`.
    pub nclients: usize,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }
}

/// Infrastructure failures the dispatcher cannot express as a status code.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stored payload decode failed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Validate the envelope, authenticate, and route to the named method.
pub async fn method_handler(
    body: &Value,
    ctx: &mut RequestContext,
    store: &dyn Store,
    auth: &AuthConfig,
) -> Result<(Value, u16), HandlerError> {
    let request = match MethodRequest::parse(body) {
        Ok(request) => request,
        Err(result) => return Ok((json!(result.message()), INVALID_REQUEST)),
    };

    if !check_auth(&request, auth) {
        tracing::warn!(request_id = %ctx.request_id, login = %request.login, "auth failed");
        return Ok((Value::Null, FORBIDDEN));
    }

    match request.method.as_str() {
        "online_score" => online_score(&request, ctx, store).await,
        "clients_interests" => clients_interests(&request, ctx, store).await,
        other => Ok((json!(format!("unknown method: {other}")), NOT_FOUND)),
    }
}

async fn online_score(
    request: &MethodRequest,
    ctx: &mut RequestContext,
    store: &dyn Store,
) -> Result<(Value, u16), HandlerError> {
    let args = match OnlineScoreRequest::parse(&request.arguments) {
        Ok(args) => args,
        Err(result) => return Ok((json!(result.message()), INVALID_REQUEST)),
    };
    ctx.has = args.supplied().to_vec();

    let score = if request.is_admin() {
        ADMIN_SCORE
    } else {
        get_score(store, &args).await
    };
    Ok((json!({ "score": score }), OK))
}

async fn clients_interests(
    request: &MethodRequest,
    ctx: &mut RequestContext,
    store: &dyn Store,
) -> Result<(Value, u16), HandlerError> {
    let args = match ClientsInterestsRequest::parse(&request.arguments) {
        Ok(args) => args,
        Err(result) => return Ok((json!(result.message()), INVALID_REQUEST)),
    };
    ctx.nclients = args.client_ids.len();

    let interests = get_all_interests(store, &args).await?;
    Ok((Value::Object(interests), OK))
}
