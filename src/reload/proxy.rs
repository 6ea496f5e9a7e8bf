//! Live reload HTTP proxy.
//!
//! Forwards every request to the upstream site and injects the reload
//! client into HTML responses. The client itself is served from memory at
//! [`RELOAD_JS_PATH`].

use std::io::{Cursor, Read};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use url::Url;

use crate::embed::serve::{RELOAD_JS, RELOAD_JS_PATH, ReloadVars, script_tag};
use crate::utils::mime;
use crate::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

const WORKERS: usize = 4;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers that describe one connection, not the message.
const HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "content-length",
    "host",
    // the body must stay uncompressed for injection
    "accept-encoding",
];

/// Shared state of the request handlers.
struct Upstream {
    base: Url,
    agent: ureq::Agent,
    ws_port: u16,
}

/// Bound proxy, ready to serve.
pub struct ProxyServer {
    server: Arc<Server>,
    addr: SocketAddr,
    upstream: Arc<Upstream>,
}

impl ProxyServer {
    /// Bind near `port` on `interface`, forwarding to `upstream`.
    pub fn bind(interface: IpAddr, port: u16, upstream: &str, ws_port: u16) -> Result<Self> {
        let base = Url::parse(upstream).with_context(|| format!("invalid proxy url `{upstream}`"))?;
        let (server, addr) = bind_with_retry(interface, port)?;
        let agent = ureq::AgentBuilder::new()
            .redirects(0)
            .timeout(UPSTREAM_TIMEOUT)
            .build();

        Ok(Self {
            server: Arc::new(server),
            addr,
            upstream: Arc::new(Upstream {
                base,
                agent,
                ws_port,
            }),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle for unblocking the request loop on shutdown.
    pub fn handle(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Serve until the server is unblocked.
    pub fn run(self) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(WORKERS)
            .thread_name(|i| format!("proxy-{i}"))
            .build()
            .context("failed to create proxy thread pool")?;

        for request in self.server.incoming_requests() {
            let upstream = Arc::clone(&self.upstream);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &upstream) {
                    log!("proxy"; "request error: {e}");
                }
            });
        }
        debug!("proxy"; "stopped");
        Ok(())
    }
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match Server::http(SocketAddr::new(interface, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(interface, port));
                if offset > 0 {
                    log!("proxy"; "port {} in use, using {} instead", base_port, addr.port());
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow::anyhow!(
        "failed to bind proxy after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

fn handle_request(request: Request, upstream: &Upstream) -> Result<()> {
    if crate::core::is_shutdown() {
        return send(request, 503, mime::types::PLAIN, b"503 Service Unavailable".to_vec());
    }

    if request.method() == &Method::Get && request.url() == RELOAD_JS_PATH {
        let js = RELOAD_JS.render(&ReloadVars {
            ws_port: upstream.ws_port,
        });
        return send(request, 200, mime::types::JAVASCRIPT, js.into_bytes());
    }

    forward(request, upstream)
}

/// Relay one request upstream and its response back.
fn forward(mut request: Request, upstream: &Upstream) -> Result<()> {
    let target = upstream
        .base
        .join(request.url())
        .with_context(|| format!("bad request path `{}`", request.url()))?;

    let mut outgoing = upstream
        .agent
        .request(request.method().as_str(), target.as_str());
    for header in request.headers() {
        let name = header.field.as_str().as_str();
        if !is_hop_header(name) {
            outgoing = outgoing.set(name, header.value.as_str());
        }
    }

    let mut body = Vec::new();
    request
        .as_reader()
        .read_to_end(&mut body)
        .context("failed to read request body")?;

    let result = if body.is_empty() {
        outgoing.call()
    } else {
        outgoing.send_bytes(&body)
    };

    let response = match result {
        Ok(response) | Err(ureq::Error::Status(_, response)) => response,
        Err(e) => {
            log!("proxy"; "{} {}: {}", request.method(), target, e);
            let message = format!("502 Bad Gateway\n\n{target}: {e}");
            return send(request, 502, mime::types::PLAIN, message.into_bytes());
        }
    };

    debug!("proxy"; "{} {} -> {}", request.method(), request.url(), response.status());
    relay(request, response, upstream)
}

fn relay(request: Request, response: ureq::Response, upstream: &Upstream) -> Result<()> {
    let status = response.status();
    let mut headers = Vec::new();
    for name in response.headers_names() {
        if is_hop_header(&name) {
            continue;
        }
        for value in response.all(&name) {
            let value = if name.eq_ignore_ascii_case("location") {
                rewrite_location(value, &upstream.base)
            } else {
                value.to_string()
            };
            if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                headers.push(header);
            }
        }
    }

    let is_html = response
        .header("content-type")
        .is_some_and(mime::is_html);
    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .context("failed to read upstream body")?;
    if is_html {
        body = inject_reload_script(&body);
    }

    let length = body.len();
    let response = Response::new(
        StatusCode(status),
        headers,
        Cursor::new(body),
        Some(length),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn is_hop_header(name: &str) -> bool {
    HOP_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Make upstream redirects stay on the proxy.
fn rewrite_location(location: &str, base: &Url) -> String {
    match Url::parse(location) {
        Ok(url) if url.origin() == base.origin() => {
            let mut local = url.path().to_string();
            if let Some(query) = url.query() {
                local.push('?');
                local.push_str(query);
            }
            local
        }
        _ => location.to_string(),
    }
}

/// Insert the reload client before the last `</body>`, or append it.
fn inject_reload_script(content: &[u8]) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";
    let tag = script_tag();
    let tag = tag.as_bytes();

    let pos = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + tag.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(tag);
    result.extend_from_slice(&content[pos..]);
    result
}

fn send(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let mut response = Response::from_data(body).with_status_code(StatusCode(status));
    if let Ok(header) = Header::from_bytes("Content-Type", content_type) {
        response.add_header(header);
    }
    request.respond(response)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn test_inject_before_body_close() {
        let out = inject_reload_script(b"<html><body><p>hi</p></BODY></html>");
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("<html><body><p>hi</p><script"));
        assert!(out.ends_with("</script></BODY></html>"));
    }

    #[test]
    fn test_inject_without_body_appends() {
        let out = String::from_utf8(inject_reload_script(b"<p>fragment</p>")).unwrap();
        assert!(out.starts_with("<p>fragment</p><script"));
    }

    #[test]
    fn test_hop_headers() {
        assert!(is_hop_header("Host"));
        assert!(is_hop_header("Accept-Encoding"));
        assert!(!is_hop_header("Cookie"));
    }

    #[test]
    fn test_rewrite_location() {
        let base = Url::parse("http://localdomain.local").unwrap();
        assert_eq!(
            rewrite_location("http://localdomain.local/login?next=%2F", &base),
            "/login?next=%2F"
        );
        assert_eq!(
            rewrite_location("https://accounts.example.com/", &base),
            "https://accounts.example.com/"
        );
        assert_eq!(rewrite_location("/relative", &base), "/relative");
    }

    /// Upstream answering a single request with `body` as HTML.
    fn upstream_once(body: &'static str) -> (SocketAddr, std::thread::JoinHandle<String>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let handle = std::thread::spawn(move || {
            let request = server.recv().unwrap();
            let path = request.url().to_string();
            let response = Response::from_string(body)
                .with_header(Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap());
            request.respond(response).unwrap();
            path
        });
        (addr, handle)
    }

    #[test]
    fn test_proxy_injects_client_into_html() {
        let (upstream_addr, upstream) = upstream_once("<html><body>shop</body></html>");
        let proxy =
            ProxyServer::bind(LOCALHOST, 0, &format!("http://{upstream_addr}"), 35729).unwrap();
        let addr = proxy.addr();
        let server = proxy.handle();
        let serving = std::thread::spawn(move || proxy.run());

        let body = ureq::get(&format!("http://{addr}/products?page=2"))
            .call()
            .unwrap()
            .into_string()
            .unwrap();

        assert!(body.contains("shop"));
        assert!(body.contains(RELOAD_JS_PATH));
        assert_eq!(upstream.join().unwrap(), "/products?page=2");

        server.unblock();
        serving.join().unwrap().unwrap();
    }

    #[test]
    fn test_proxy_serves_reload_client() {
        let proxy = ProxyServer::bind(LOCALHOST, 0, "http://127.0.0.1:9", 35731).unwrap();
        let addr = proxy.addr();
        let server = proxy.handle();
        let serving = std::thread::spawn(move || proxy.run());

        let js = ureq::get(&format!("http://{addr}{RELOAD_JS_PATH}"))
            .call()
            .unwrap()
            .into_string()
            .unwrap();
        assert!(js.contains("35731"));

        server.unblock();
        serving.join().unwrap().unwrap();
    }

    #[test]
    fn test_unreachable_upstream_is_bad_gateway() {
        // port 9 (discard) is closed on test machines
        let proxy = ProxyServer::bind(LOCALHOST, 0, "http://127.0.0.1:9", 35729).unwrap();
        let addr = proxy.addr();
        let server = proxy.handle();
        let serving = std::thread::spawn(move || proxy.run());

        let status = match ureq::get(&format!("http://{addr}/")).call() {
            Err(ureq::Error::Status(code, _)) => code,
            other => panic!("expected an error status, got {other:?}"),
        };
        assert_eq!(status, 502);

        server.unblock();
        serving.join().unwrap().unwrap();
    }
}
