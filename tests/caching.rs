//! End-to-end caching behaviour against a live proxy and mock origins.

use std::time::Duration;

use caching_proxy::ProxyConfig;
use reqwest::StatusCode;

mod common;

use common::{client, start_origin, start_proxy, Reply};

#[tokio::test]
async fn test_repeated_requests_served_from_cache() {
    let origin = start_origin(|n| {
        Reply::ok(format!("origin response {n}"))
            .status(203)
            .header("Content-Type", "text/plain")
            .header("Set-Cookie", "a=1")
            .header("Set-Cookie", "b=2")
    })
    .await;
    let proxy = start_proxy(ProxyConfig::default()).await;
    let client = client();

    let mut seen = Vec::new();
    for _ in 0..3 {
        let res = client.get(proxy.go(&origin.url("/page"))).send().await.unwrap();
        let status = res.status();
        let cookies: Vec<String> = res
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        let body = res.text().await.unwrap();
        seen.push((status, cookies, body));
    }

    assert_eq!(origin.hits(), 1, "only the first request should reach the origin");
    assert_eq!(proxy.transport.calls(), 1);
    for (status, cookies, body) in &seen {
        assert_eq!(*status, StatusCode::NON_AUTHORITATIVE_INFORMATION);
        assert_eq!(cookies, &["a=1", "b=2"]);
        assert_eq!(body, "origin response 1");
    }
}

#[tokio::test]
async fn test_go_and_legacy_paths_share_cache_entry() {
    let origin = start_origin(|n| Reply::ok(format!("v{n}"))).await;
    let proxy = start_proxy(ProxyConfig::default()).await;
    let client = client();

    let target = origin.url("/x");
    let via_go = client.get(proxy.go(&target)).send().await.unwrap();
    assert_eq!(via_go.text().await.unwrap(), "v1");

    let via_legacy = client.get(proxy.url(&format!("/{target}"))).send().await.unwrap();
    assert_eq!(via_legacy.text().await.unwrap(), "v1");

    assert_eq!(origin.hits(), 1);
    assert!(proxy.pipeline.cache().get(&target).is_some());
}

#[tokio::test]
async fn test_query_string_is_part_of_the_key() {
    let origin = start_origin(|n| Reply::ok(format!("v{n}"))).await;
    let proxy = start_proxy(ProxyConfig::default()).await;
    let client = client();

    let a = client.get(proxy.go(&origin.url("/q?page=1"))).send().await.unwrap();
    let b = client.get(proxy.go(&origin.url("/q?page=2"))).send().await.unwrap();
    assert_eq!(a.text().await.unwrap(), "v1");
    assert_eq!(b.text().await.unwrap(), "v2");

    let requests = origin.requests();
    assert!(requests[0].starts_with("GET /q?page=") && requests[1].starts_with("GET /q?page="));
    assert_eq!(origin.hits(), 2);
}

#[tokio::test]
async fn test_entry_refreshed_after_ttl() {
    let origin = start_origin(|n| Reply::ok(format!("generation {n}"))).await;
    let mut config = ProxyConfig::default();
    config.cache.ttl_secs = 1;
    let proxy = start_proxy(config).await;
    let client = client();

    let target = origin.url("/fresh");
    let first = client.get(proxy.go(&target)).send().await.unwrap();
    assert_eq!(first.text().await.unwrap(), "generation 1");

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let second = client.get(proxy.go(&target)).send().await.unwrap();
    assert_eq!(second.text().await.unwrap(), "generation 2");
    assert_eq!(origin.hits(), 2, "exactly one new dispatch after expiry");

    let third = client.get(proxy.go(&target)).send().await.unwrap();
    assert_eq!(third.text().await.unwrap(), "generation 2");
    assert_eq!(origin.hits(), 2);
}

#[tokio::test]
async fn test_inbound_request_forwarded_verbatim() {
    let origin = start_origin(|_| Reply::ok("created").status(201)).await;
    let proxy = start_proxy(ProxyConfig::default()).await;

    let res = client()
        .post(proxy.go(&origin.url("/submit")))
        .header("X-Multi", "one")
        .header("X-Multi", "two")
        .header("Authorization", "Bearer token")
        .body("payload-bytes")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let head = origin.requests().remove(0).to_lowercase();
    assert!(head.starts_with("post /submit http/1.1"));
    assert!(head.contains("x-multi: one"));
    assert!(head.contains("x-multi: two"));
    assert!(head.contains("authorization: bearer token"));
    assert!(head.contains(&format!("host: {}", origin.addr)));
}

#[tokio::test]
async fn test_binary_body_survives_cache() {
    let payload: Vec<u8> = (0..=255u8).rev().collect();
    let expected = payload.clone();
    let origin = start_origin(move |_| {
        Reply::ok(payload.clone()).header("Content-Type", "application/octet-stream")
    })
    .await;
    let proxy = start_proxy(ProxyConfig::default()).await;
    let client = client();

    for _ in 0..2 {
        let res = client.get(proxy.go(&origin.url("/blob"))).send().await.unwrap();
        assert_eq!(res.bytes().await.unwrap().as_ref(), expected.as_slice());
    }
    assert_eq!(origin.hits(), 1);
}

#[tokio::test]
async fn test_origin_error_status_is_cached_as_is() {
    let origin = start_origin(|_| Reply::ok("gone").status(404)).await;
    let proxy = start_proxy(ProxyConfig::default()).await;
    let client = client();

    for _ in 0..2 {
        let res = client.get(proxy.go(&origin.url("/missing"))).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.text().await.unwrap(), "gone");
    }
    assert_eq!(origin.hits(), 1);
}

#[tokio::test]
async fn test_cache_status_header_when_enabled() {
    let origin = start_origin(|_| Reply::ok("body")).await;
    let mut config = ProxyConfig::default();
    config.cache.status_header = true;
    let proxy = start_proxy(config).await;
    let client = client();

    let miss = client.get(proxy.go(&origin.url("/s"))).send().await.unwrap();
    assert_eq!(miss.headers()["x-cache-status"], "MISS");

    let hit = client.get(proxy.go(&origin.url("/s"))).send().await.unwrap();
    assert_eq!(hit.headers()["x-cache-status"], "HIT");
}

#[tokio::test]
async fn test_no_cache_header_by_default() {
    let origin = start_origin(|_| Reply::ok("body")).await;
    let proxy = start_proxy(ProxyConfig::default()).await;

    let res = client().get(proxy.go(&origin.url("/plain"))).send().await.unwrap();
    assert!(res.headers().get("x-cache-status").is_none());
}
