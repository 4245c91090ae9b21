//! Integration tests for native-http driven by the fake networking module

use std::time::Duration;

use native_http::{
    get, post, CachePolicy, ErrorKind, EventName, HttpClient, Method, NativeEvent, NativeResponse,
    Platform, Query, RequestBodyType, RequestOptions, ResponseBodyType, Token,
};
use native_http_fake::{FakeNetworking, FakeReply, TokenDelivery, CANCELED_MESSAGE};
use serde::Deserialize;
use serde_json::{json, Value};

const ITEMS_URL: &str = "https://api.test/items";

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: u32,
    name: String,
}

fn client(fake: &FakeNetworking) -> HttpClient {
    native_http_log::init_logging("native_http=debug");
    HttpClient::new(fake.bridge())
}

// === Request parameters ===

#[tokio::test]
async fn test_get_sends_coerced_query_and_defaults() {
    let fake = FakeNetworking::new(Platform::Android)
        .with_reply(ITEMS_URL, FakeReply::success(json!({"items": []})));
    let client = client(&fake);

    let query = Query::from([
        ("page".to_string(), json!(2)),
        ("active".to_string(), Value::Null),
    ]);
    let response = get(&client, ITEMS_URL, Some(query), RequestOptions::new())
        .expect("valid request")
        .await
        .expect("scripted success");

    assert_eq!(response.data(), &json!({"items": []}));

    let sent = fake.last_request().expect("request recorded");
    assert_eq!(sent.url, ITEMS_URL);
    assert_eq!(sent.params.method, Method::Get);
    assert_eq!(
        sent.params.query,
        Some([("page".to_string(), "2".to_string())].into())
    );
    assert_eq!(sent.params.timeout, 30.0);
    assert_eq!(sent.params.cache_policy, CachePolicy::UseCache);
    assert_eq!(sent.params.request_body_type, RequestBodyType::Form);
    assert_eq!(sent.params.response_body_type, ResponseBodyType::Text);
}

#[tokio::test]
async fn test_post_json_body_crosses_bridge() {
    let fake = FakeNetworking::new(Platform::Ios)
        .with_reply(ITEMS_URL, FakeReply::success(json!({"id": 7, "name": "new"})));
    let client = client(&fake);

    let options = RequestOptions::new()
        .request_body_type(RequestBodyType::Json)
        .response_body_type(ResponseBodyType::Json)
        .header("X-Trace", "abc")
        .timeout(Duration::from_secs(5));
    let response = post(
        &client,
        ITEMS_URL,
        Some(json!({"name": "new"})),
        None,
        options,
    )
    .expect("valid request")
    .await
    .expect("scripted success");

    let item: Item = response.json().expect("item payload");
    assert_eq!(
        item,
        Item {
            id: 7,
            name: "new".to_string()
        }
    );

    let sent = fake.last_request().expect("request recorded");
    assert_eq!(sent.params.method, Method::Post);
    assert_eq!(sent.params.request_body, Some(json!({"name": "new"})));
    assert_eq!(sent.params.timeout, 5.0);
    assert_eq!(
        sent.params.accept_content_types,
        Some(vec!["text/json".to_string(), "application/json".to_string()])
    );
    assert_eq!(
        sent.params.headers.as_ref().and_then(|h| h.get("X-Trace")),
        Some(&"abc".to_string())
    );
}

#[tokio::test]
async fn test_fetch_deserializes_payload() {
    let fake = FakeNetworking::new(Platform::Android).with_reply(
        ITEMS_URL,
        FakeReply::success(json!([{"id": 1, "name": "first"}])),
    );

    let items: Vec<Item> = client(&fake).fetch(ITEMS_URL).await.expect("fetch");
    assert_eq!(
        items,
        vec![Item {
            id: 1,
            name: "first".to_string()
        }]
    );
}

#[tokio::test]
async fn test_invalid_options_never_reach_native_layer() {
    let fake = FakeNetworking::new(Platform::Ios);
    let client = client(&fake);

    let options = RequestOptions::from_json(json!({"responseBodyType": "blob"}))
        .expect("known keys");
    assert!(client.request(ITEMS_URL, options).is_err());
    assert!(RequestOptions::from_json(json!({"retries": 3})).is_err());
    assert!(fake.requests().is_empty());
}

// === Payload handling ===

#[tokio::test]
async fn test_android_null_payload_becomes_empty_object() {
    let fake = FakeNetworking::new(Platform::Android).with_reply(
        ITEMS_URL,
        FakeReply::Raw(NativeResponse::with_data(json!("null"))),
    );

    let response = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .await
        .expect("null decodes");
    assert_eq!(response.data(), &json!({}));
}

#[tokio::test]
async fn test_android_undecodable_payload_fails_to_parse() {
    let fake = FakeNetworking::new(Platform::Android).with_reply(
        ITEMS_URL,
        FakeReply::Raw(NativeResponse::with_data(json!("<html>")).field("statusCode", 200)),
    );

    let error = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .await
        .expect_err("payload is not JSON");
    assert_eq!(error.kind, ErrorKind::ParseResponseFailed);
    assert_eq!(error.user_info.get("data"), Some(&json!("<html>")));
    assert_eq!(error.user_info.get("statusCode"), Some(&json!(200)));
}

#[tokio::test]
async fn test_ios_payload_kept_as_delivered() {
    let fake = FakeNetworking::new(Platform::Ios)
        .with_reply(ITEMS_URL, FakeReply::success(json!("plain text")));

    let response = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .await
        .expect("scripted success");
    assert_eq!(response.text(), Some("plain text"));
}

#[tokio::test]
async fn test_success_without_payload_fails() {
    let fake = FakeNetworking::new(Platform::Ios).with_reply(
        ITEMS_URL,
        FakeReply::Raw(NativeResponse::default().field("statusCode", 204)),
    );

    let error = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .await
        .expect_err("no payload");
    assert_eq!(error.kind, ErrorKind::RequestFailed);
    assert_eq!(error.user_info.get("statusCode"), Some(&json!(204)));
}

// === Error translation ===

#[tokio::test]
async fn test_android_timeout_is_translated() {
    let fake = FakeNetworking::new(Platform::Android).with_reply(
        ITEMS_URL,
        FakeReply::failure("IOException", -1002, "timeout"),
    );

    let error = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .await
        .expect_err("scripted failure");
    assert_eq!(error.kind, ErrorKind::TimedOut);
    assert_eq!(error.code, 0);
    assert_eq!(error.message, "timeout");

    let native = error.native_error().expect("native error kept");
    assert_eq!(native.error_type, "IOException");
    assert_eq!(native.code, -1002);
}

#[tokio::test]
async fn test_ios_untrusted_certificate_is_translated() {
    let fake = FakeNetworking::new(Platform::Ios).with_reply(
        ITEMS_URL,
        FakeReply::failure("NSURLErrorDomain", -1201, "bad cert"),
    );

    let error = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .await
        .expect_err("scripted failure");
    assert_eq!(error.kind, ErrorKind::ServerCertificateUntrusted);
}

#[tokio::test]
async fn test_ios_serialization_failure_is_translated() {
    let fake = FakeNetworking::new(Platform::Ios).with_reply(
        ITEMS_URL,
        FakeReply::failure("com.alamofire.error.serialization.response", -1016, "bad"),
    );

    let error = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .await
        .expect_err("scripted failure");
    assert_eq!(error.kind, ErrorKind::ParseResponseFailed);
}

#[tokio::test]
async fn test_other_io_failure_is_request_failed() {
    let fake = FakeNetworking::new(Platform::Android).with_reply(
        ITEMS_URL,
        FakeReply::failure("IOException", -1, "connection reset"),
    );

    let error = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .await
        .expect_err("scripted failure");
    assert_eq!(error.kind, ErrorKind::RequestFailed);
}

#[tokio::test]
async fn test_foreign_error_type_is_unknown() {
    let fake = FakeNetworking::new(Platform::Android).with_reply(
        ITEMS_URL,
        FakeReply::failure("HttpException", 500, "server error"),
    );

    let error = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .await
        .expect_err("scripted failure");
    assert_eq!(error.kind, ErrorKind::Unknown);
    assert_eq!(error.message, "server error");
}

// === Event correlation ===

#[tokio::test]
async fn test_events_for_other_tokens_are_ignored() {
    let fake = FakeNetworking::new(Platform::Ios);
    let pending = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request");
    let token = fake.token(0).expect("issued");

    fake.emit(
        EventName::Success,
        &NativeEvent::success("unrelated", json!({"wrong": true})),
    );
    fake.succeed(&token, json!({"right": true})).expect("known token");

    let response = pending.await.expect("matched success");
    assert_eq!(response.data(), &json!({"right": true}));
}

#[tokio::test]
async fn test_second_event_after_completion_is_ignored() {
    let fake = FakeNetworking::new(Platform::Ios);
    let pending = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request");
    let token = fake.token(0).expect("issued");

    assert_eq!(fake.succeed(&token, json!(1)).expect("known token"), 1);
    // Listeners are gone once the request finished
    assert_eq!(
        fake.fail(&token, "NSURLErrorDomain", -1001, "late")
            .expect("known token"),
        0
    );

    assert_eq!(pending.await.expect("first event wins").data(), &json!(1));
    assert_eq!(fake.events().listener_count(EventName::Success), 0);
    assert_eq!(fake.events().listener_count(EventName::Error), 0);
}

#[tokio::test]
async fn test_event_before_token_is_replayed() {
    let fake = FakeNetworking::new(Platform::Android)
        .with_token_delivery(TokenDelivery::Deferred)
        .with_reply(ITEMS_URL, FakeReply::success(json!({"early": true})));

    let pending = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request");
    assert_eq!(fake.release_tokens(), 1);

    let response = pending.await.expect("buffered success");
    assert_eq!(response.data(), &json!({"early": true}));
}

#[tokio::test]
async fn test_concurrent_requests_resolve_independently() {
    let fake = FakeNetworking::new(Platform::Ios);
    let client = client(&fake);

    let first = client
        .get("https://api.test/a", None, RequestOptions::new())
        .expect("valid request");
    let second = client
        .get("https://api.test/b", None, RequestOptions::new())
        .expect("valid request");

    let first_token = fake.token(0).expect("issued");
    let second_token = fake.token(1).expect("issued");
    fake.fail(&second_token, "NSURLErrorDomain", -1009, "offline")
        .expect("known token");
    fake.succeed(&first_token, json!("a")).expect("known token");

    assert_eq!(first.await.expect("first succeeds").data(), &json!("a"));
    assert_eq!(
        second.await.expect_err("second fails").kind,
        ErrorKind::NotConnectedToInternet
    );
}

// === Cancellation ===

#[tokio::test]
async fn test_cancel_after_token() {
    let fake = FakeNetworking::new(Platform::Ios).with_reply(ITEMS_URL, FakeReply::Silent);
    let (result, cancel) = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .into_parts();

    cancel.cancel();
    cancel.cancel();

    let error = result.await.expect_err("canceled");
    assert!(error.is_canceled());
    assert_eq!(error.message, CANCELED_MESSAGE);
    assert_eq!(fake.cancelled(), vec![Token::from(1u64)]);
}

#[tokio::test]
async fn test_cancel_before_token_is_deferred() {
    let fake = FakeNetworking::new(Platform::Android)
        .with_token_delivery(TokenDelivery::Deferred)
        .with_reply(ITEMS_URL, FakeReply::Silent);
    let (result, cancel) = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .into_parts();

    cancel.cancel();
    assert!(cancel.is_cancel_requested());
    assert!(fake.cancelled().is_empty());

    fake.release_tokens();
    assert_eq!(fake.cancelled(), vec![Token::from(1u64)]);

    let error = result.await.expect_err("canceled");
    assert_eq!(error.kind, ErrorKind::Canceled);
    assert_eq!(
        error.native_error().map(|native| native.code),
        Some(-1000)
    );
}

#[tokio::test]
async fn test_cancel_after_completion_is_noop() {
    let fake = FakeNetworking::new(Platform::Ios)
        .with_reply(ITEMS_URL, FakeReply::success(json!({"done": true})));
    let (result, cancel) = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .into_parts();

    assert!(result.await.is_ok());
    cancel.cancel();
    assert!(fake.cancelled().is_empty());
}

#[tokio::test]
async fn test_cancel_races_delayed_reply() {
    let fake = FakeNetworking::new(Platform::Ios).with_delayed_reply(
        ITEMS_URL,
        FakeReply::success(json!("too late")),
        Duration::from_millis(50),
    );
    let (result, cancel) = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .into_parts();

    cancel.cancel();
    let error = result.await.expect_err("cancel wins");
    assert!(error.is_canceled());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fake.in_flight(), 0);
}

#[tokio::test]
async fn test_delayed_reply_resolves() {
    let fake = FakeNetworking::new(Platform::Android).with_delayed_reply(
        ITEMS_URL,
        FakeReply::success(json!({"slow": true})),
        Duration::from_millis(10),
    );

    let response = client(&fake)
        .get(ITEMS_URL, None, RequestOptions::new())
        .expect("valid request")
        .await
        .expect("delayed success");
    assert_eq!(response.data(), &json!({"slow": true}));
}
