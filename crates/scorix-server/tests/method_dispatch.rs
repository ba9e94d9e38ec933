use scorix_server::auth::{AuthConfig, admin_digest, user_digest};
use scorix_server::dispatch::{
    FORBIDDEN, INVALID_REQUEST, NOT_FOUND, OK, RequestContext, method_handler,
};
use scorix_store::{MemoryStore, Store};
use serde_json::{Value, json};

fn auth() -> AuthConfig {
    AuthConfig::default()
}

/// Envelope with a valid user token for the given method and arguments.
fn valid_request(method: &str, arguments: Value) -> Value {
    let cfg = auth();
    json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "token": user_digest(Some("horns&hoofs"), "h&f", &cfg),
        "method": method,
        "arguments": arguments,
    })
}

async fn dispatch(body: Value, store: &MemoryStore) -> (Value, u16, RequestContext) {
    let mut ctx = RequestContext::new("test");
    let (payload, code) = method_handler(&body, &mut ctx, store, &auth())
        .await
        .expect("handler should not fail on an available store");
    (payload, code, ctx)
}

#[tokio::test]
async fn empty_envelope_is_invalid() {
    let store = MemoryStore::default();
    let (payload, code, _) = dispatch(json!({}), &store).await;
    assert_eq!(code, INVALID_REQUEST);
    let message = payload.as_str().unwrap();
    assert!(message.contains("login"));
    assert!(message.contains("token"));
    assert!(message.contains("method"));
}

#[tokio::test]
async fn non_object_envelope_is_invalid() {
    let store = MemoryStore::default();
    let (_, code, _) = dispatch(json!([1, 2, 3]), &store).await;
    assert_eq!(code, INVALID_REQUEST);
}

#[tokio::test]
async fn bad_token_is_forbidden() {
    let store = MemoryStore::default();
    let body = json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "token": "sdd",
        "method": "online_score",
        "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"},
    });
    let (payload, code, _) = dispatch(body, &store).await;
    assert_eq!(code, FORBIDDEN);
    assert_eq!(payload, Value::Null);
}

#[tokio::test]
async fn expired_admin_token_is_forbidden() {
    let store = MemoryStore::default();
    let body = json!({
        "login": "admin",
        "token": "f".repeat(128),
        "method": "online_score",
        "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"},
    });
    let (_, code, _) = dispatch(body, &store).await;
    assert_eq!(code, FORBIDDEN);
}

#[tokio::test]
async fn unknown_method_is_not_found() {
    let store = MemoryStore::default();
    let (payload, code, _) = dispatch(valid_request("online_scoring", json!({})), &store).await;
    assert_eq!(code, NOT_FOUND);
    assert_eq!(payload, json!("unknown method: online_scoring"));
}

#[tokio::test]
async fn score_for_phone_and_email() {
    let store = MemoryStore::default();
    let args = json!({"phone": "79175002040", "email": "stupnikov@otus.ru"});
    let (payload, code, ctx) = dispatch(valid_request("online_score", args), &store).await;
    assert_eq!(code, OK);
    assert_eq!(payload, json!({"score": 3.0}));
    // Supplied fields surface in the request context, in schema order.
    assert_eq!(ctx.has, vec!["email".to_string(), "phone".to_string()]);
}

#[tokio::test]
async fn score_for_full_profile() {
    let store = MemoryStore::default();
    let args = json!({
        "gender": 1,
        "birthday": "01.01.2000",
        "first_name": "a",
        "last_name": "b",
        "phone": "79175002040",
        "email": "stupnikov@otus.ru",
    });
    let (payload, code, ctx) = dispatch(valid_request("online_score", args), &store).await;
    assert_eq!(code, OK);
    assert_eq!(payload, json!({"score": 5.0}));
    assert_eq!(ctx.has.len(), 6);
}

#[tokio::test]
async fn gender_zero_counts_as_supplied() {
    let store = MemoryStore::default();
    let args = json!({"gender": 0, "birthday": "01.01.2000"});
    let (payload, code, ctx) = dispatch(valid_request("online_score", args), &store).await;
    assert_eq!(code, OK);
    assert_eq!(payload, json!({"score": 1.5}));
    assert!(ctx.has.contains(&"gender".to_string()));
}

#[tokio::test]
async fn admin_always_scores_forty_two() {
    let store = MemoryStore::default();
    let cfg = auth();
    let body = json!({
        "login": "admin",
        "token": admin_digest(&cfg),
        "method": "online_score",
        "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"},
    });
    let (payload, code, _) = dispatch(body, &store).await;
    assert_eq!(code, OK);
    assert_eq!(payload, json!({"score": 42.0}));
}

#[tokio::test]
async fn invalid_score_arguments_name_the_fields() {
    let store = MemoryStore::default();
    let cases = [
        json!({}),
        json!({"phone": "79175002040"}),
        json!({"phone": "89175002040", "email": "stupnikov@otus.ru"}),
        json!({"phone": "79175002040", "email": "stupnikovotus.ru"}),
        json!({"phone": "79175002040", "email": "stupnikov@otus.ru", "gender": -1}),
        json!({"phone": "79175002040", "email": "stupnikov@otus.ru", "gender": "1", "birthday": "XXX"}),
        json!({"first_name": "s", "last_name": ["b"]}),
        json!({"birthday": "01.01.1890", "gender": 1}),
    ];
    for args in cases {
        let (payload, code, _) = dispatch(valid_request("online_score", args.clone()), &store).await;
        assert_eq!(code, INVALID_REQUEST, "arguments: {args}");
        assert!(payload.is_string(), "arguments: {args}");
    }
}

#[tokio::test]
async fn score_arguments_as_json_string_are_accepted() {
    let store = MemoryStore::default();
    let args = json!(r#"{"phone": "79175002040", "email": "stupnikov@otus.ru"}"#);
    let (payload, code, _) = dispatch(valid_request("online_score", args), &store).await;
    assert_eq!(code, OK);
    assert_eq!(payload, json!({"score": 3.0}));
}

#[tokio::test]
async fn interests_come_back_per_client() {
    let store = MemoryStore::default();
    store.set("i:1", r#"["books", "travel"]"#).await.unwrap();
    store.set("i:3", r#"["music"]"#).await.unwrap();
    let args = json!({"client_ids": [1, 2, 3], "date": "19.07.2017"});
    let (payload, code, ctx) = dispatch(valid_request("clients_interests", args), &store).await;
    assert_eq!(code, OK);
    assert_eq!(
        payload,
        json!({"1": ["books", "travel"], "2": [], "3": ["music"]})
    );
    assert_eq!(ctx.nclients, 3);
}

#[tokio::test]
async fn invalid_interests_arguments_are_rejected() {
    let store = MemoryStore::default();
    let cases = [
        json!({}),
        json!({"date": "20.07.2017"}),
        json!({"client_ids": [], "date": "20.07.2017"}),
        json!({"client_ids": [1, 2], "date": "XXX"}),
        json!({"client_ids": {"1": 2}, "date": "20.07.2017"}),
        json!({"client_ids": ["1", "2"], "date": "20.07.2017"}),
    ];
    for args in cases {
        let (payload, code, _) =
            dispatch(valid_request("clients_interests", args.clone()), &store).await;
        assert_eq!(code, INVALID_REQUEST, "arguments: {args}");
        assert!(payload.is_string(), "arguments: {args}");
    }
}

#[tokio::test]
async fn undecodable_stored_interests_fail_the_request() {
    let store = MemoryStore::default();
    store.set("i:1", "{not json").await.unwrap();
    let mut ctx = RequestContext::new("test");
    let args = json!({"client_ids": [1]});
    let err = method_handler(&valid_request("clients_interests", args), &mut ctx, &store, &auth())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("decode failed"));
}

#[tokio::test]
async fn store_outage_fails_interests_but_not_scores() {
    let store = MemoryStore::default();
    store.set_available(false);

    let mut ctx = RequestContext::new("test");
    let args = json!({"client_ids": [1, 2]});
    let err = method_handler(&valid_request("clients_interests", args), &mut ctx, &store, &auth())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unavailable"));

    // Scores only use the store as a cache, so they survive the outage.
    let args = json!({"phone": "79175002040", "email": "stupnikov@otus.ru"});
    let (payload, code, _) = dispatch(valid_request("online_score", args), &store).await;
    assert_eq!(code, OK);
    assert_eq!(payload, json!({"score": 3.0}));
}
