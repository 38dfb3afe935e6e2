//! Minimal HTTP/1.1 server that impersonates a Wayback archive for
//! integration tests.
//!
//! Routes:
//! - `GET /cdx/search/cdx?url=<u>&output=json...` returns the CDX JSON
//!   timeline for `u` (header row first).
//! - `GET /web/<ts>id_/<u>` returns the raw capture with its headers, or 404
//!   when the capture is marked evicted.
//! - any other path is the live resource at that path (404 if none).
//!
//! Captures and live bodies are keyed by URL path, so resource URLs can point
//! at the server itself (`{base}files/a.pdf`). Every request path is recorded.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct Capture {
    pub path: &'static str,
    pub timestamp: &'static str,
    pub body: Vec<u8>,
    pub headers: Vec<(&'static str, &'static str)>,
    /// Listed in the timeline but no longer served.
    pub evicted: bool,
}

impl Capture {
    pub fn new(path: &'static str, timestamp: &'static str, body: &[u8]) -> Self {
        Self {
            path,
            timestamp,
            body: body.to_vec(),
            headers: Vec::new(),
            evicted: false,
        }
    }

    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn evicted(mut self) -> Self {
        self.evicted = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveFixture {
    /// Timeline order is the order captures are added (duplicates allowed).
    pub captures: Vec<Capture>,
    pub live: HashMap<&'static str, Vec<u8>>,
    /// Paths whose CDX query answers 500.
    pub broken_timelines: Vec<&'static str>,
}

impl ArchiveFixture {
    pub fn capture(mut self, capture: Capture) -> Self {
        self.captures.push(capture);
        self
    }

    pub fn live(mut self, path: &'static str, body: &[u8]) -> Self {
        self.live.insert(path, body.to_vec());
        self
    }

    pub fn broken_timeline(mut self, path: &'static str) -> Self {
        self.broken_timelines.push(path);
        self
    }
}

pub struct ArchiveServer {
    /// e.g. "http://127.0.0.1:12345/"
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ArchiveServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Every request path (with query) received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn snapshot_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|p| p.starts_with("/web/"))
            .count()
    }

    pub fn timeline_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|p| p.starts_with("/cdx/"))
            .count()
    }

    pub fn live_requests(&self, path: &str) -> usize {
        self.requests().iter().filter(|p| p.as_str() == path).count()
    }
}

/// Starts the server in a background thread. Runs until the process exits.
pub fn start(fixture: ArchiveFixture) -> ArchiveServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base_url = format!("http://127.0.0.1:{}/", port);
    let fixture = Arc::new(fixture);
    let requests = Arc::new(Mutex::new(Vec::new()));
    {
        let requests = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let fixture = Arc::clone(&fixture);
                let requests = Arc::clone(&requests);
                thread::spawn(move || handle(stream, &fixture, &requests));
            }
        });
    }
    ArchiveServer { base_url, requests }
}

fn handle(mut stream: std::net::TcpStream, fixture: &ArchiveFixture, requests: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("").to_string();
    requests.lock().unwrap().push(target.clone());

    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", &[], b"");
        return;
    }

    if target.starts_with("/cdx/") {
        let Some(path) = query_url_path(&target) else {
            respond(&mut stream, "400 Bad Request", &[], b"");
            return;
        };
        if fixture.broken_timelines.iter().any(|p| *p == path) {
            respond(&mut stream, "500 Internal Server Error", &[], b"");
            return;
        }
        let body = cdx_json(fixture, &path, &original_url(&target));
        respond(&mut stream, "200 OK", &[("Content-Type", "application/json")], body.as_bytes());
        return;
    }

    if let Some(rest) = target.strip_prefix("/web/") {
        let Some((ts, original)) = rest.split_once("id_/") else {
            respond(&mut stream, "400 Bad Request", &[], b"");
            return;
        };
        let path = url::Url::parse(original)
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        let capture = fixture
            .captures
            .iter()
            .find(|c| c.timestamp == ts && c.path == path && !c.evicted);
        match capture {
            Some(c) => respond(&mut stream, "200 OK", &c.headers, &c.body),
            None => respond(&mut stream, "404 Not Found", &[], b""),
        }
        return;
    }

    let path = target.split('?').next().unwrap_or("");
    match fixture.live.get(path) {
        Some(body) => respond(
            &mut stream,
            "200 OK",
            &[("Last-Modified", "Mon, 02 Jan 2006 15:04:05 GMT")],
            body,
        ),
        None => respond(&mut stream, "404 Not Found", &[], b""),
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, headers: &[(&str, &str)], body: &[u8]) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Value of the `url` query parameter.
fn original_url(target: &str) -> String {
    url::Url::parse(&format!("http://archive.invalid{}", target))
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "url")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_default()
}

/// Path of the resource named by the `url` query parameter.
fn query_url_path(target: &str) -> Option<String> {
    url::Url::parse(&original_url(target))
        .ok()
        .map(|u| u.path().to_string())
}

fn cdx_json(fixture: &ArchiveFixture, path: &str, original: &str) -> String {
    let mut rows = vec![r#"["timestamp","original","statuscode"]"#.to_string()];
    for c in fixture.captures.iter().filter(|c| c.path == path) {
        rows.push(format!(r#"["{}","{}","200"]"#, c.timestamp, original));
    }
    if rows.len() == 1 {
        return "[]".to_string();
    }
    format!("[{}]", rows.join(","))
}
