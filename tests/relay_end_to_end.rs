//! End-to-end relay tests: client → fetch-relay → mock upstream.

use fetch_relay::config::RelayConfig;
use fetch_relay::HeaderBlocklist;

mod common;

use common::MockReply;

#[tokio::test]
async fn test_relays_status_body_and_allowed_headers() {
    let upstream = common::start_programmable_backend(|_| async {
        MockReply::new(201, "created")
            .header("Content-Type", "text/plain")
            .header("X-Custom", "1")
            .header("Set-Cookie", "a=1")
            .header("Set-Cookie", "b=2")
            .header("Via", "1.1 upstream-cache")
    })
    .await;
    let (relay, shutdown) = common::start_relay(upstream).await;

    let res = common::client()
        .get(format!("http://{}/items", relay))
        .send()
        .await
        .expect("relay unreachable");

    assert_eq!(res.status(), 201);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert_eq!(res.headers()["x-custom"], "1");
    assert!(res.headers().get("via").is_none());
    let cookies: Vec<_> = res.headers().get_all("set-cookie").iter().collect();
    assert_eq!(cookies.len(), 2);
    assert_eq!(res.text().await.unwrap(), "created");

    shutdown.trigger();
}

#[tokio::test]
async fn test_projects_request_headers() {
    let upstream = common::start_programmable_backend(|head| async move { MockReply::new(200, head) }).await;
    let (relay, shutdown) = common::start_relay(upstream).await;

    let res = common::client()
        .get(format!("http://{}/echo?x=1", relay))
        .header("Cookie", "session=abc")
        .header("User-Agent", "relay-test")
        .header("Referer", "https://app.example/")
        .header("X-Trace", "t1")
        .header("Via", "1.1 edge")
        .header("DNT", "1")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let head = res.text().await.unwrap().to_ascii_lowercase();

    assert!(head.starts_with("get /echo?x=1 http/1.1"), "unexpected head: {head}");
    assert!(head.contains("cookie: session=abc"));
    assert!(head.contains("user-agent: relay-test"));
    assert!(head.contains("referer: https://app.example/"));
    assert!(head.contains("x-trace: t1"));
    assert!(head.contains("x-request-id: "));
    assert!(!head.contains("via:"));
    assert!(!head.contains("dnt:"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_custom_blocklist_applies_both_ways() {
    let upstream = common::start_programmable_backend(|head| async move {
        MockReply::new(200, head).header("X-Internal", "secret")
    })
    .await;

    let mut config = RelayConfig::default();
    config.headers.blocklist = Some(HeaderBlocklist::new(["authorization", "x-internal"]));
    let (relay, shutdown) = common::start_relay_with(upstream, config).await;

    let res = common::client()
        .get(format!("http://{}/", relay))
        .header("Authorization", "Bearer token")
        .header("Via", "1.1 edge")
        .send()
        .await
        .unwrap();

    assert!(res.headers().get("x-internal").is_none());
    let head = res.text().await.unwrap().to_ascii_lowercase();
    assert!(!head.contains("authorization:"));
    // The default policy was replaced, so via now passes.
    assert!(head.contains("via: 1.1 edge"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_not_ok_returns_status_without_body() {
    let upstream = common::start_programmable_backend(|_| async {
        MockReply::new(404, "no such thing").header("X-Custom", "1")
    })
    .await;
    let (relay, shutdown) = common::start_relay(upstream).await;

    let res = common::client()
        .get(format!("http://{}/missing", relay))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert!(res.headers().get("x-custom").is_none());
    assert!(res.bytes().await.unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let upstream = common::closed_port().await;
    let (relay, shutdown) = common::start_relay(upstream).await;

    let res = common::client()
        .get(format!("http://{}/", relay))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    assert!(res.bytes().await.unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_truncated_upstream_body_ends_response() {
    let upstream = common::start_programmable_backend(|_| async {
        MockReply::new(200, "partial").truncated(1024)
    })
    .await;
    let (relay, shutdown) = common::start_relay(upstream).await;

    let res = common::client()
        .get(format!("http://{}/stream", relay))
        .send()
        .await
        .unwrap();

    // Headers were already committed; the caller gets what arrived.
    assert_eq!(res.status(), 200);
    let body = tokio::time::timeout(std::time::Duration::from_secs(5), res.bytes())
        .await
        .expect("relay hung on a failed upstream body")
        .unwrap();
    assert_eq!(&body[..], b"partial");

    shutdown.trigger();
}

#[tokio::test]
async fn test_follows_upstream_redirect() {
    let upstream = common::start_programmable_backend(|head| async move {
        if head.starts_with("GET /old ") {
            MockReply::new(302, "").header("Location", "/elsewhere?from=old")
        } else if head.starts_with("GET /elsewhere?from=old ") {
            MockReply::new(200, "landed").header("Content-Type", "text/plain")
        } else {
            MockReply::new(404, "")
        }
    })
    .await;
    let (relay, shutdown) = common::start_relay(upstream).await;

    let res = common::client()
        .get(format!("http://{}/old", relay))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert_eq!(res.text().await.unwrap(), "landed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_see_other_after_post_continues_as_get() {
    let upstream = common::start_programmable_backend(|head| async move {
        if head.starts_with("POST /submit ") {
            MockReply::new(303, "").header("Location", "/result")
        } else {
            // Echo what the second hop looked like.
            MockReply::new(200, head)
        }
    })
    .await;
    let (relay, shutdown) = common::start_relay(upstream).await;

    let res = common::client()
        .post(format!("http://{}/submit", relay))
        .header("Content-Type", "application/json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let head = res.text().await.unwrap().to_ascii_lowercase();
    assert!(head.starts_with("get /result http/1.1"), "unexpected head: {head}");
    assert!(!head.contains("content-type:"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_redirect_loop_is_bad_gateway() {
    let upstream = common::start_programmable_backend(|_| async {
        MockReply::new(302, "").header("Location", "/again")
    })
    .await;

    let mut config = RelayConfig::default();
    config.upstream.max_redirects = 3;
    let (relay, shutdown) = common::start_relay_with(upstream, config).await;

    let res = common::client()
        .get(format!("http://{}/again", relay))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    assert!(res.bytes().await.unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_redirect_not_followed_when_disabled() {
    let upstream = common::start_programmable_backend(|_| async {
        MockReply::new(302, "").header("Location", "/elsewhere")
    })
    .await;

    let mut config = RelayConfig::default();
    config.upstream.follow_redirects = false;
    let (relay, shutdown) = common::start_relay_with(upstream, config).await;

    let res = common::client()
        .get(format!("http://{}/old", relay))
        .send()
        .await
        .unwrap();

    // Not ok, so only the status crosses back.
    assert_eq!(res.status(), 302);
    assert!(res.headers().get("location").is_none());

    shutdown.trigger();
}
