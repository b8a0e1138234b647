//! End-to-end tests: a real server on a loopback port, raw HTTP over TCP.

use super::content::SNIPPET_MARKER;
use super::*;
use crate::config::WatchConfig;
use crate::utils::mime;
use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(10);

const INDEX: &str = "<!doctype html><html><head><title>t</title></head>\
                     <body><h1>home</h1></body></html>";
const STYLE: &[u8] = b"body { color: red; }\n/* </body> */\n";

struct TestServer {
    server: Arc<Server>,
    addr: SocketAddr,
    broadcaster: Broadcaster,
    dir: TempDir,
    thread: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start(live_reload: bool) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), INDEX).unwrap();
        fs::write(dir.path().join("style.css"), STYLE).unwrap();
        Self::start_in(dir, live_reload)
    }

    fn start_in(dir: TempDir, live_reload: bool) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let broadcaster = Broadcaster::new();
        let context = Arc::new(ServeContext {
            root: ServedRoot::new(dir.path(), "index.html").unwrap(),
            broadcaster: broadcaster.clone(),
            live_reload,
        });

        let loop_server = Arc::clone(&server);
        let thread = thread::spawn(move || {
            run_request_loop(&loop_server, context, 2, &InFlight::default()).unwrap();
        });

        Self {
            server,
            addr,
            broadcaster,
            dir,
            thread: Some(thread),
        }
    }

    fn connect(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(TIMEOUT)).unwrap();
        stream
    }

    /// Send one request with `Connection: close` and read the whole reply.
    fn request(&self, method: &str, target: &str) -> Reply {
        let mut stream = self.connect();
        write!(
            stream,
            "{method} {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        )
        .unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).unwrap();
        Reply::parse(&raw)
    }

    fn get(&self, target: &str) -> Reply {
        self.request("GET", target)
    }

    /// Open an event stream and wait for its `connected` frame.
    fn subscribe(&self) -> EventStream {
        let mut stream = self.connect();
        write!(stream, "GET {ENDPOINT} HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
        let mut events = EventStream {
            stream,
            buffer: String::new(),
        };
        events.wait_for("data: connected\n\n");
        events
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct Reply {
    status: u16,
    head: String,
    body: Vec<u8>,
}

impl Reply {
    fn parse(raw: &[u8]) -> Self {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has a head");
        let head = String::from_utf8_lossy(&raw[..split]).to_string();
        let status = head
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .expect("status code");
        Self {
            status,
            head,
            body: raw[split + 4..].to_vec(),
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    fn text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }
}

struct EventStream {
    stream: TcpStream,
    buffer: String,
}

impl EventStream {
    /// Read until `needle` has arrived, failing after the timeout.
    fn wait_for(&mut self, needle: &str) {
        let deadline = Instant::now() + TIMEOUT;
        let mut chunk = [0u8; 1024];
        while !self.buffer.contains(needle) {
            assert!(Instant::now() < deadline, "no {needle:?} in {:?}", self.buffer);
            let n = self.stream.read(&mut chunk).unwrap();
            assert!(n > 0, "stream closed before {needle:?}: {:?}", self.buffer);
            self.buffer.push_str(&String::from_utf8_lossy(&chunk[..n]));
        }
    }
}

// ============================================================================
// static files
// ============================================================================

#[test]
fn test_index_gets_one_snippet_before_body_close() {
    let server = TestServer::start(true);
    let reply = server.get("/");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some(mime::types::HTML));
    assert_eq!(
        reply.header("Cache-Control"),
        Some("no-cache, no-store, must-revalidate")
    );

    let body = reply.text();
    assert_eq!(body.matches(SNIPPET_MARKER).count(), 1);
    assert!(body.find(SNIPPET_MARKER).unwrap() < body.rfind("</body>").unwrap());
    assert!(body.contains(ENDPOINT));
}

#[test]
fn test_non_html_is_byte_identical() {
    let server = TestServer::start(true);
    let reply = server.get("/style.css");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some(mime::types::CSS));
    assert_eq!(reply.body, STYLE);
}

#[test]
fn test_no_snippet_without_live_reload() {
    let server = TestServer::start(false);
    let reply = server.get("/index.html");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.text(), INDEX);
}

#[test]
fn test_repeated_requests_are_identical() {
    let server = TestServer::start(true);
    let first = server.get("/");
    let second = server.get("/");
    assert_eq!(first.body, second.body);
}

#[test]
fn test_query_string_ignored() {
    let server = TestServer::start(true);
    assert_eq!(server.get("/style.css?v=3").body, STYLE);
}

#[test]
fn test_missing_file_is_404_with_snippet() {
    let server = TestServer::start(true);
    let reply = server.get("/missing.png");

    assert_eq!(reply.status, 404);
    assert_eq!(reply.header("Content-Type"), Some(mime::types::HTML));
    assert!(reply.text().contains("/missing.png"));
    assert_eq!(reply.text().matches(SNIPPET_MARKER).count(), 1);
}

#[test]
fn test_traversal_is_404() {
    let server = TestServer::start(true);
    assert_eq!(server.get("/../../etc/passwd").status, 404);
    assert_eq!(server.get("/%2e%2e/%2e%2e/etc/passwd").status, 404);
}

#[test]
fn test_directory_serves_index() {
    let server = TestServer::start(true);
    fs::create_dir(server.dir.path().join("docs")).unwrap();
    fs::write(server.dir.path().join("docs/index.html"), "<body>docs</body>").unwrap();

    let reply = server.get("/docs/");
    assert_eq!(reply.status, 200);
    assert!(reply.text().starts_with("<body>docs<script"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_500_with_cause() {
    use std::os::unix::fs::PermissionsExt;

    let server = TestServer::start(true);
    let path = server.dir.path().join("it's.html");
    fs::write(&path, "<body>secret</body>").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&path).is_ok() {
        // Running as root: permissions are not enforced.
        return;
    }

    let reply = server.get("/it's.html");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(reply.status, 500);
    assert_eq!(reply.header("Content-Type"), Some(mime::types::HTML));
    assert_eq!(
        reply.header("Cache-Control"),
        Some("no-cache, no-store, must-revalidate")
    );
    let body = reply.text();
    assert!(body.contains("failed to read"), "{body}");
    assert!(body.contains("it&#39;s.html"), "{body}");
    assert!(!body.contains("it's.html"), "{body}");
    assert!(!body.contains("secret"));
    assert_eq!(body.matches(SNIPPET_MARKER).count(), 1);
}

#[test]
fn test_new_file_served_without_restart() {
    let server = TestServer::start(true);
    assert_eq!(server.get("/late.js").status, 404);

    fs::write(server.dir.path().join("late.js"), "console.log(1)").unwrap();
    let reply = server.get("/late.js");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.text(), "console.log(1)");
}

// ============================================================================
// methods
// ============================================================================

#[test]
fn test_head_has_no_body() {
    let server = TestServer::start(true);
    let reply = server.request("HEAD", "/style.css");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some(mime::types::CSS));
    assert!(reply.body.is_empty());
}

#[test]
fn test_head_on_endpoint_does_not_subscribe() {
    let server = TestServer::start(true);
    let reply = server.request("HEAD", ENDPOINT);

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some(mime::types::EVENT_STREAM));
    assert_eq!(reply.header("Cache-Control"), Some("no-cache"));
    assert_eq!(reply.header("Access-Control-Allow-Origin"), Some("*"));
    assert!(reply.body.is_empty());
    assert!(server.broadcaster.is_empty());
}

#[test]
fn test_options_preflight() {
    let server = TestServer::start(true);
    let reply = server.request("OPTIONS", "/");

    assert_eq!(reply.status, 204);
    assert_eq!(reply.header("Access-Control-Allow-Origin"), Some("*"));
}

#[test]
fn test_other_methods_rejected() {
    let server = TestServer::start(true);
    let reply = server.request("POST", "/");

    assert_eq!(reply.status, 405);
    assert_eq!(reply.header("Allow"), Some("GET, HEAD, OPTIONS"));
}

// ============================================================================
// event stream
// ============================================================================

#[test]
fn test_subscribe_then_reload() {
    let server = TestServer::start(true);
    let mut events = server.subscribe();

    assert!(events.buffer.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(events.buffer.contains("Content-Type: text/event-stream"));
    assert!(events.buffer.contains("Access-Control-Allow-Origin: *"));
    assert_eq!(server.broadcaster.len(), 1);

    let delivery = server.broadcaster.notify_reload();
    assert_eq!(delivery.delivered, 1);
    events.wait_for("data: reload\n\n");
}

#[test]
fn test_reload_reaches_every_subscriber() {
    let server = TestServer::start(true);
    let mut a = server.subscribe();
    let mut b = server.subscribe();

    assert_eq!(server.broadcaster.notify_reload().delivered, 2);
    a.wait_for("data: reload\n\n");
    b.wait_for("data: reload\n\n");
}

#[test]
fn test_streams_do_not_hold_workers() {
    // Two workers, three open streams: files must still be served.
    let server = TestServer::start(true);
    let _streams: Vec<_> = (0..3).map(|_| server.subscribe()).collect();

    assert_eq!(server.get("/style.css").status, 200);
}

#[test]
fn test_close_all_releases_streams() {
    let server = TestServer::start(true);
    let _events = server.subscribe();

    assert_eq!(server.broadcaster.close_all(), 1);
    assert!(server.broadcaster.is_empty());
    assert_eq!(server.broadcaster.notify_reload().delivered, 0);
}

#[test]
fn test_closed_client_pruned_by_heartbeat() {
    let server = TestServer::start(true);
    let events = server.subscribe();
    let _open = server.subscribe();
    assert_eq!(server.broadcaster.len(), 2);

    drop(events);

    // The first write after the peer closes may still succeed; the next fails.
    let mut heartbeats = 0;
    while server.broadcaster.len() > 1 && heartbeats < 10 {
        thread::sleep(Duration::from_millis(50));
        server.broadcaster.heartbeat();
        heartbeats += 1;
    }

    assert_eq!(server.broadcaster.len(), 1, "after {heartbeats} heartbeats");
    assert_eq!(server.broadcaster.notify_reload().delivered, 1);
}

#[test]
fn test_heartbeat_actor_prunes_closed_client() {
    let server = TestServer::start(true);

    let (shutdown_tx, shutdown_rx) = channel::unbounded();
    let coordinator = Coordinator::new(
        server.broadcaster.clone(),
        Some(Duration::from_millis(50)),
    )
    .with_shutdown_signal(shutdown_rx);
    let actors = lifecycle::spawn_actors(coordinator);

    drop(server.subscribe());
    let deadline = Instant::now() + TIMEOUT;
    while !server.broadcaster.is_empty() {
        assert!(Instant::now() < deadline, "closed stream never pruned");
        thread::sleep(Duration::from_millis(20));
    }

    shutdown_tx.send(()).unwrap();
    lifecycle::wait_for_shutdown(actors);
}

// ============================================================================
// full pipeline
// ============================================================================

#[test]
fn test_file_change_reloads_subscriber() {
    let server = TestServer::start(true);
    let root = server.dir.path().canonicalize().unwrap();

    let (shutdown_tx, shutdown_rx) = channel::unbounded();
    let coordinator = Coordinator::new(server.broadcaster.clone(), None)
        .watch(&root, &WatchConfig::default())
        .unwrap()
        .with_shutdown_signal(shutdown_rx);
    let actors = lifecycle::spawn_actors(coordinator);
    assert!(actors.is_some());

    let mut events = server.subscribe();
    fs::write(root.join("index.html"), "<body>changed</body>").unwrap();
    events.wait_for("data: reload\n\n");

    shutdown_tx.send(()).unwrap();
    lifecycle::wait_for_shutdown(actors);
    assert!(server.broadcaster.is_empty());
}
