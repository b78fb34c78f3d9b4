use index_host::config::{AppState, Config};
use index_host::handler::IndexHandler;
use index_host::server;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    shutdown: Arc<Notify>,
    handle: JoinHandle<io::Result<()>>,
    _root: tempfile::TempDir,
}

async fn start(page: Option<&[u8]>, params: &[(&str, &str)], spa_fallback: bool) -> TestServer {
    start_with(page, |cfg| {
        cfg.index.spa_fallback = spa_fallback;
        for (name, value) in params {
            cfg.index.params.insert((*name).to_string(), (*value).to_string());
        }
    })
    .await
}

async fn start_with(page: Option<&[u8]>, tweak: impl FnOnce(&mut Config)) -> TestServer {
    let root = tempfile::tempdir().unwrap();
    if let Some(page) = page {
        std::fs::write(root.path().join("index.html"), page).unwrap();
    }

    let mut cfg = Config::load_from(&root.path().join("absent").to_string_lossy()).unwrap();
    cfg.server.port = 0;
    cfg.logging.access_log = false;
    cfg.index.resource_root = Some(root.path().to_string_lossy().into_owned());
    tweak(&mut cfg);

    let index = IndexHandler::from_config(&cfg.index);
    let listener = server::create_reusable_listener(cfg.get_socket_addr().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(&cfg, index));
    let shutdown = Arc::new(Notify::new());

    let handle = tokio::spawn(server::start_server_loop(listener, state, Arc::clone(&shutdown)));

    TestServer {
        addr,
        shutdown,
        handle,
        _root: root,
    }
}

type Reply = (String, Vec<String>, Vec<u8>);

/// Send one request and return (status line, lowercased header lines, body)
async fn send(addr: SocketAddr, method: &str, path: &str) -> Reply {
    try_send(addr, method, path)
        .await
        .expect("server answered with a complete response head")
}

/// Like `send`, but `None` when the server closes the connection unanswered
async fn try_send(addr: SocketAddr, method: &str, path: &str) -> Option<Reply> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    // A rejected connection may already be reset
    stream.write_all(request.as_bytes()).await.ok()?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.ok()?;

    let split = raw.windows(4).position(|w| w == b"\r\n\r\n")?;
    let head = String::from_utf8(raw[..split].to_vec()).unwrap();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status = lines.next().unwrap().to_string();
    let headers = lines.map(str::to_ascii_lowercase).collect();
    Some((status, headers, body))
}

/// Read until the server closes, treating a reset as a close
async fn drain(stream: &mut TcpStream) -> Vec<u8> {
    let mut raw = Vec::new();
    let _ = stream.read_to_end(&mut raw).await;
    raw
}

fn header<'a>(headers: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("{name}: ");
    headers
        .iter()
        .find_map(|h| h.strip_prefix(prefix.as_str()))
}

#[tokio::test]
async fn serves_index_with_policy_headers() {
    let page = b"<!doctype html><html><body>app</body></html>";
    let server = start(
        Some(page.as_slice()),
        &[
            ("content-security-policy", "  default-src 'self'  "),
            ("Content-Security-Policy-Report-Only", "   "),
        ],
        false,
    )
    .await;

    let (status, headers, body) = send(server.addr, "GET", "/index.html").await;
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body, page);
    assert_eq!(header(&headers, "content-type"), Some("text/html; charset=utf-8"));
    assert_eq!(
        header(&headers, "content-length"),
        Some(page.len().to_string().as_str())
    );
    assert_eq!(
        header(&headers, "content-security-policy"),
        Some("default-src 'self'")
    );
    assert!(header(&headers, "content-security-policy-report-only").is_none());

    server.shutdown.notify_one();
}

#[tokio::test]
async fn missing_index_is_500() {
    let server = start(None, &[], false).await;

    let (status, _headers, body) = send(server.addr, "GET", "/index.html").await;
    assert_eq!(status, "HTTP/1.1 500 Internal Server Error");
    assert_eq!(body, b"No index.html deployed as static file in application");

    server.shutdown.notify_one();
}

#[tokio::test]
async fn repeated_requests_are_identical() {
    let server = start(
        Some(b"<p>stable</p>".as_slice()),
        &[("Content-Security-Policy", "img-src *")],
        false,
    )
    .await;

    let first = send(server.addr, "GET", "/index.html").await;
    for _ in 0..3 {
        let (status, headers, body) = send(server.addr, "GET", "/index.html").await;
        assert_eq!(status, first.0);
        assert_eq!(body, first.2);
        assert_eq!(
            header(&headers, "content-security-policy"),
            header(&first.1, "content-security-policy")
        );
    }

    server.shutdown.notify_one();
}

#[tokio::test]
async fn unknown_path_and_fallback() {
    let plain = start(Some(b"spa".as_slice()), &[], false).await;
    let (status, _, _) = send(plain.addr, "GET", "/settings/profile").await;
    assert_eq!(status, "HTTP/1.1 404 Not Found");
    plain.shutdown.notify_one();

    let fallback = start(Some(b"spa".as_slice()), &[], true).await;
    let (status, _, body) = send(fallback.addr, "GET", "/settings/profile").await;
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body, b"spa");
    fallback.shutdown.notify_one();
}

#[tokio::test]
async fn head_and_post() {
    let server = start(Some(b"0123456789".as_slice()), &[], false).await;

    let (status, headers, body) = send(server.addr, "HEAD", "/index.html").await;
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(header(&headers, "content-length"), Some("10"));
    assert!(body.is_empty());

    let (status, headers, _) = send(server.addr, "POST", "/index.html").await;
    assert_eq!(status, "HTTP/1.1 405 Method Not Allowed");
    assert_eq!(header(&headers, "allow"), Some("get, head, options"));

    server.shutdown.notify_one();
}

#[tokio::test]
async fn loop_stops_on_shutdown() {
    let server = start(Some(b"x".as_slice()), &[], false).await;
    let (status, _, _) = send(server.addr, "GET", "/index.html").await;
    assert_eq!(status, "HTTP/1.1 200 OK");

    server.shutdown.notify_one();
    let joined = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("accept loop exits after shutdown");
    assert!(joined.unwrap().is_ok());
}

#[tokio::test]
async fn connection_limit_frees_slot() {
    let server = start_with(Some(b"limited".as_slice()), |cfg| {
        cfg.performance.max_connections = Some(1);
    })
    .await;

    // Holds the only slot without sending anything
    let held = TcpStream::connect(server.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut rejected = TcpStream::connect(server.addr).await.unwrap();
    let raw = tokio::time::timeout(Duration::from_secs(5), drain(&mut rejected))
        .await
        .expect("rejected connection is closed");
    assert!(raw.is_empty());

    drop(held);

    let mut served = None;
    for _ in 0..50 {
        if let Some(reply) = try_send(server.addr, "GET", "/index.html").await {
            served = Some(reply);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let (status, _, body) = served.expect("slot is released once the held connection closes");
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body, b"limited");

    server.shutdown.notify_one();
}

#[tokio::test]
async fn idle_connection_times_out() {
    let server = start_with(Some(b"x".as_slice()), |cfg| {
        cfg.performance.read_timeout = 1;
        cfg.performance.write_timeout = 1;
    })
    .await;

    let mut idle = TcpStream::connect(server.addr).await.unwrap();
    let raw = tokio::time::timeout(Duration::from_secs(5), drain(&mut idle))
        .await
        .expect("idle connection is closed by the server");
    assert!(raw.is_empty());

    server.shutdown.notify_one();
}
