use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tokio::{net::TcpListener, sync::oneshot};

use streamvault::relay::{RelayClient, RelayEndpoint, RelayStyle};
use streamvault::{Config, Platform, Quality, RelayConfig, Resolution, ResolutionRequest, Resolver};

async fn spawn_server(router: Router) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener
        .local_addr()
        .expect("listener should expose local address");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let server = axum::serve(listener, router).with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });
    tokio::spawn(async move {
        let _ = server.await;
    });
    (addr, shutdown_tx)
}

/// Endpoint nothing listens on; connections fail immediately
fn dead_endpoint(name: &str) -> RelayEndpoint {
    RelayEndpoint::new(name, "http://127.0.0.1:9/?url=", RelayStyle::Query)
}

/// Configuration that cannot reach the public internet
fn offline_config() -> Config {
    let mut config = Config::default();
    config.relay.fetch_relays = vec![dead_endpoint("fetch")];
    config.relay.media_relays = vec![dead_endpoint("media")];
    config.relay.fetch_timeout = Duration::from_secs(2);
    config.relay.probe_timeout = Duration::from_secs(2);
    config.invidious_instances = vec!["http://127.0.0.1:9".to_string()];
    config.cobalt_instances = vec!["http://127.0.0.1:9/".to_string()];
    config.instagram_mirror = "mirror.invalid".to_string();
    config.ytdlp.enabled = false;
    config
}

// ── Scenario A: direct media file ───────────────────────────────────────────

#[tokio::test]
async fn direct_file_resolves_without_extraction() {
    let resolver = Resolver::new(offline_config());
    let result = resolver
        .resolve("https://example.com/clip.mp4", Quality::Q720)
        .await;
    assert_eq!(
        result,
        Resolution::Direct {
            url: "https://example.com/clip.mp4".to_string(),
            needs_relay: false,
        }
    );
}

#[tokio::test]
async fn embed_only_platform_resolves_without_extractors() {
    let resolver = Resolver::new(offline_config());
    let result = resolver
        .resolve(
            "https://open.spotify.com/track/3n3Ppam7vgaVa1iaRUc9Lp",
            Quality::Q720,
        )
        .await;
    assert_eq!(result, Resolution::EmbedOnly);
}

// ── Scenario B: mirror scrape + relay wrap ──────────────────────────────────

#[tokio::test]
async fn instagram_scrape_yields_a_relay_wrapped_stream() {
    let html = concat!(
        "<html><body><video>",
        "<source src=\"https://cdn.example/raw.mp4\" type=\"video/mp4\">",
        "</video></body></html>"
    );
    let router = Router::new().route("/get", get(move || async move { html }));
    let (addr, shutdown) = spawn_server(router).await;

    let mut config = offline_config();
    config.relay.fetch_relays = vec![RelayEndpoint::new(
        "mock",
        format!("http://{addr}/get?url="),
        RelayStyle::Query,
    )];
    config.relay.media_relays = vec![RelayEndpoint::new(
        "relay",
        "https://relay.example/?url=",
        RelayStyle::Query,
    )];

    let resolver = Resolver::new(config);
    let result = resolver
        .resolve("https://www.instagram.com/reel/Cxyz123/", Quality::Q720)
        .await;
    assert_eq!(
        result,
        Resolution::Direct {
            url: "https://relay.example/?url=https%3A%2F%2Fcdn.example%2Fraw.mp4".to_string(),
            needs_relay: true,
        }
    );

    let _ = shutdown.send(());
}

// ── Scenario C: delegated resolver picker ───────────────────────────────────

#[tokio::test]
async fn cobalt_picker_surfaces_all_candidates() {
    let router = Router::new().route(
        "/",
        post(|| async {
            (
                StatusCode::OK,
                r#"{"status": "picker", "picker": [{"url": "a"}, {"url": "b"}]}"#,
            )
        }),
    );
    let (addr, shutdown) = spawn_server(router).await;

    let mut config = offline_config();
    config.cobalt_instances = vec![format!("http://{addr}/")];

    let resolver = Resolver::new(config);
    let result = resolver
        .resolve("https://www.tiktok.com/@user/video/7123456789", Quality::Q720)
        .await;
    match result {
        Resolution::Picker { items } => {
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].url, "a");
            assert_eq!(items[1].url, "b");
            assert_eq!(items[0].thumbnail, None);
        }
        other => panic!("expected a picker, got {other:?}"),
    }

    let _ = shutdown.send(());
}

#[tokio::test]
async fn cobalt_tunnel_is_relay_wrapped() {
    let router = Router::new().route(
        "/",
        post(|| async {
            (
                StatusCode::OK,
                r#"{"status": "tunnel", "url": "https://cdn.example/t.mp4"}"#,
            )
        }),
    );
    let (addr, shutdown) = spawn_server(router).await;

    let mut config = offline_config();
    config.cobalt_instances = vec![format!("http://{addr}/")];
    config.relay.media_relays = vec![RelayEndpoint::new(
        "relay",
        "https://relay.example/?url=",
        RelayStyle::Query,
    )];

    let resolver = Resolver::new(config);
    let result = resolver
        .resolve("https://x.com/user/status/123", Quality::Q720)
        .await;
    assert_eq!(
        result,
        Resolution::Direct {
            url: "https://relay.example/?url=https%3A%2F%2Fcdn.example%2Ft.mp4".to_string(),
            needs_relay: true,
        }
    );

    let _ = shutdown.send(());
}

// ── Scenario D: total failure stays a value, not a panic ────────────────────

#[tokio::test]
async fn exhausting_every_strategy_returns_failure() {
    let resolver = Resolver::new(offline_config());
    let result = resolver
        .resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Quality::Q720)
        .await;
    assert_eq!(result, Resolution::Failure);
}

// ── Relay chain fallback ────────────────────────────────────────────────────

#[tokio::test]
async fn relay_chain_falls_through_to_the_secondary() {
    let payload = "<html><body>the actual page body, long enough to matter</body></html>";
    let router = Router::new()
        .route(
            "/fail",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/ok",
            get(move || async move {
                (
                    StatusCode::OK,
                    format!(r#"{{"contents": "{payload}", "status": {{"http_code": 200}}}}"#),
                )
            }),
        );
    let (addr, shutdown) = spawn_server(router).await;

    let mut relay_config = RelayConfig::default();
    relay_config.fetch_relays = vec![
        RelayEndpoint::new("primary", format!("http://{addr}/fail?url="), RelayStyle::Query),
        RelayEndpoint::new("secondary", format!("http://{addr}/ok?url="), RelayStyle::Query),
    ];
    relay_config.fetch_timeout = Duration::from_secs(2);

    let client = RelayClient::new(relay_config);
    let body = client.fetch_text("https://target.example/page").await;
    assert_eq!(body.as_deref(), Some(payload));

    let _ = shutdown.send(());
}

#[tokio::test]
async fn short_relay_responses_are_rejected() {
    let router = Router::new().route("/get", get(|| async { "tiny" }));
    let (addr, shutdown) = spawn_server(router).await;

    let mut relay_config = RelayConfig::default();
    relay_config.fetch_relays = vec![RelayEndpoint::new(
        "mock",
        format!("http://{addr}/get?url="),
        RelayStyle::Query,
    )];
    relay_config.fetch_timeout = Duration::from_secs(2);

    let client = RelayClient::new(relay_config);
    assert_eq!(client.fetch_text("https://target.example/page").await, None);

    let _ = shutdown.send(());
}

// ── Media relay probing ─────────────────────────────────────────────────────

#[tokio::test]
async fn media_probe_accepts_a_healthy_relay() {
    let router = Router::new().route("/media", get(|| async { "ok" }));
    let (addr, shutdown) = spawn_server(router).await;

    let mut relay_config = RelayConfig::default();
    relay_config.media_relays = vec![RelayEndpoint::new(
        "mock",
        format!("http://{addr}/media?url="),
        RelayStyle::Query,
    )];
    relay_config.probe_timeout = Duration::from_secs(2);

    let client = RelayClient::new(relay_config);
    let wrapped = client.media_url("https://cdn.example/raw.mp4").await;
    assert_eq!(
        wrapped,
        format!("http://{addr}/media?url=https%3A%2F%2Fcdn.example%2Fraw.mp4")
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn media_probe_rejections_fall_back_to_the_primary() {
    let router = Router::new().route(
        "/media",
        get(|| async { (StatusCode::NOT_FOUND, "nope") }),
    );
    let (addr, shutdown) = spawn_server(router).await;

    let primary_base = format!("http://{addr}/media?url=");
    let mut relay_config = RelayConfig::default();
    relay_config.media_relays = vec![
        RelayEndpoint::new("primary", primary_base.clone(), RelayStyle::Query),
        RelayEndpoint::new("also-404", format!("http://{addr}/media?u2="), RelayStyle::Query),
    ];
    relay_config.probe_timeout = Duration::from_secs(2);

    let client = RelayClient::new(relay_config);
    let wrapped = client.media_url("https://cdn.example/raw.mp4").await;
    // every probe got a definitive rejection: the primary is still the answer
    assert_eq!(
        wrapped,
        format!("{primary_base}https%3A%2F%2Fcdn.example%2Fraw.mp4")
    );

    let _ = shutdown.send(());
}

// ── Nearest-quality selection end to end ────────────────────────────────────

#[tokio::test]
async fn invidious_nearest_quality_flows_through_the_router() {
    let body = serde_json::json!({
        "title": "clip",
        "formatStreams": [
            {"url": "https://rr1.googlevideo.com/videoplayback?itag=360", "type": "video/mp4", "quality": "360p"},
            {"url": "https://rr1.googlevideo.com/videoplayback?itag=480", "type": "video/mp4", "quality": "480p"},
            {"url": "https://rr1.googlevideo.com/videoplayback?itag=720", "type": "video/mp4", "quality": "720p"},
            {"url": "https://rr1.googlevideo.com/videoplayback?itag=1080", "type": "video/mp4", "quality": "1080p"}
        ]
    })
    .to_string();
    let router = Router::new().route(
        "/get",
        get(move || {
            let body = body.clone();
            async move { body }
        }),
    );
    let (addr, shutdown) = spawn_server(router).await;

    let mut config = offline_config();
    config.relay.fetch_relays = vec![RelayEndpoint::new(
        "mock",
        format!("http://{addr}/get?url="),
        RelayStyle::Query,
    )];
    config.invidious_instances = vec!["https://inv.example".to_string()];

    let resolver = Resolver::new(config);
    let result = resolver
        .resolve("https://youtu.be/dQw4w9WgXcQ", Quality::Q480)
        .await;
    // googlevideo is CORS-open: the chosen URL comes back unwrapped
    assert_eq!(
        result,
        Resolution::Direct {
            url: "https://rr1.googlevideo.com/videoplayback?itag=480".to_string(),
            needs_relay: false,
        }
    );

    let _ = shutdown.send(());
}

// ── Reddit direct-fetch path ────────────────────────────────────────────────

#[tokio::test]
async fn reddit_direct_fetch_finds_the_bundled_rendition() {
    let body = r#"[
        {"data": {"children": [{"data": {
            "title": "clip",
            "media": {"reddit_video": {"fallback_url": "https://v.redd.it/x/DASH_720.mp4?source=fallback"}}
        }}]}},
        {"data": {"children": []}}
    ]"#;
    let router = Router::new().route(
        "/r/videos/comments/abc/title.json",
        get(move || async move { body }),
    );
    let (addr, shutdown) = spawn_server(router).await;

    let mut config = offline_config();
    config.relay.media_relays = vec![RelayEndpoint::new(
        "relay",
        "https://relay.example/?url=",
        RelayStyle::Query,
    )];

    let resolver = Resolver::new(config);
    // the post URL points at the mock, so the anonymous direct fetch path
    // is the one under test; platform comes in pre-classified
    let request = ResolutionRequest::new(
        format!("http://{addr}/r/videos/comments/abc/title/"),
        Platform::Reddit,
        Quality::Q720,
    );
    let result = resolver.resolve_request(request).await;
    assert_eq!(
        result,
        Resolution::Direct {
            url: "https://relay.example/?url=https%3A%2F%2Fv.redd.it%2Fx%2FDASH_720.mp4".to_string(),
            needs_relay: true,
        }
    );

    let _ = shutdown.send(());
}
