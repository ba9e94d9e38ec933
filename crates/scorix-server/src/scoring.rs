//! Business methods: score computation and interests lookup.

use scorix_core::{ClientsInterestsRequest, OnlineScoreRequest};
use scorix_store::Store;
use sha2::{Digest, Sha512};
use time::macros::format_description;

use crate::dispatch::HandlerError;

/// Admins always get this score, no lookup performed.
pub const ADMIN_SCORE: f64 = 42.0;

/// Cache key for a score request, stable across retries of the same
/// identity. Birthday is folded in as `YYYYMMDD`.
pub(crate) fn score_key(request: &OnlineScoreRequest) -> String {
    let birthday = request
        .birthday
        .map(|d| {
            d.format(format_description!("[year][month][day]"))
                .unwrap_or_default()
        })
        .unwrap_or_default();
    let mut hasher = Sha512::new();
    hasher.update(request.first_name.as_deref().unwrap_or_default());
    hasher.update(request.last_name.as_deref().unwrap_or_default());
    hasher.update(request.phone.as_deref().unwrap_or_default());
    hasher.update(birthday);
    format!("uid:{}", hex::encode(hasher.finalize()))
}

/// Compute the score for a request, consulting the cache first.
///
/// Cache misses and cache write failures are tolerated; only the fresh
/// computation below is authoritative.
pub async fn get_score(store: &dyn Store, request: &OnlineScoreRequest) -> f64 {
    let key = score_key(request);
    match store.cache_get(&key).await {
        Ok(Some(cached)) => {
            if let Ok(score) = cached.parse::<f64>() {
                return score;
            }
            tracing::warn!(key = %key, "cached score is not a number, recomputing");
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "cache read failed, recomputing");
        }
    }

    let mut score = 0.0;
    if request.phone.is_some() {
        score += 1.5;
    }
    if request.email.is_some() {
        score += 1.5;
    }
    if request.birthday.is_some() && request.gender.is_some() {
        score += 1.5;
    }
    if request.first_name.is_some() && request.last_name.is_some() {
        score += 0.5;
    }

    if let Err(err) = store.cache_set(&key, &score.to_string()).await {
        tracing::warn!(key = %key, error = %err, "cache write failed");
    }
    score
}

/// Interests of a single client, read from the primary partition.
///
/// An absent client id yields an empty list; store outages and entries
/// that do not decode as JSON propagate.
pub async fn get_interests(store: &dyn Store, client_id: i64) -> Result<Vec<String>, HandlerError> {
    let raw = match store.get(&format!("i:{client_id}")).await {
        Ok(raw) => raw,
        Err(err) if err.is_not_found() => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    Ok(serde_json::from_str(&raw)?)
}

/// Interests for every requested client id, keyed by the id's decimal form.
pub async fn get_all_interests(
    store: &dyn Store,
    request: &ClientsInterestsRequest,
) -> Result<serde_json::Map<String, serde_json::Value>, HandlerError> {
    let mut interests = serde_json::Map::new();
    for &cid in &request.client_ids {
        let list = get_interests(store, cid).await?;
        interests.insert(cid.to_string(), serde_json::json!(list));
    }
    Ok(interests)
}
