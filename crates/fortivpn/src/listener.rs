//! Local HTTP listener that captures the IdP's browser redirect.
//!
//! The gateway sends the browser to `http://127.0.0.1:<port>/?id=<auth id>` once
//! the IdP assertion has been accepted. [`CallbackListener::start`] binds that
//! address and serves requests on a background thread until the first matching
//! one arrives; the identifier is handed to [`ListenerHandle::await_token`]
//! through a single-slot channel.

use crate::error::LoginError;
use crate::token::AuthIdentifier;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};
use url::Url;

const ACK_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Fortigate VPN login</title></head>
<body style="font-family: sans-serif; text-align: center; margin-top: 4em;">
  <h2>Authentication complete</h2>
  <p>You may close this window.</p>
</body>
</html>"#;

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub host: String,
    /// `0` binds an ephemeral port.
    pub port: u16,
    pub callback_path: String,
    pub id_param: String,
    pub timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8020,
            callback_path: "/".to_string(),
            id_param: "id".to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Something that can open a callback listener. The orchestrator only talks to this seam.
pub trait CallbackBinder {
    fn start(&self) -> Result<ListenerHandle, LoginError>;
}

pub struct CallbackListener {
    config: ListenerConfig,
}

impl CallbackListener {
    pub fn new(config: ListenerConfig) -> Self {
        Self { config }
    }
}

impl CallbackBinder for CallbackListener {
    fn start(&self) -> Result<ListenerHandle, LoginError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let server = Server::http(&addr).map_err(|e| LoginError::Bind {
            addr: addr.clone(),
            message: e.to_string(),
        })?;
        let local_addr = server.server_addr().to_ip().ok_or_else(|| LoginError::Bind {
            addr: addr.clone(),
            message: "not an IP socket".to_string(),
        })?;

        let server = Arc::new(server);
        let (tx, rx) = crossbeam_channel::bounded(1);

        let worker_server = Arc::clone(&server);
        let callback_path = self.config.callback_path.clone();
        let id_param = self.config.id_param.clone();
        let worker = thread::Builder::new()
            .name("saml-callback".to_string())
            .spawn(move || serve_until_captured(&worker_server, &callback_path, &id_param, tx))
            .map_err(|e| LoginError::Listener {
                message: format!("failed to spawn listener thread: {}", e),
            })?;

        info!("[*] Waiting for the SAML callback on http://{}", local_addr);

        Ok(ListenerHandle {
            server: Some(server),
            worker: Some(worker),
            receiver: Some(rx),
            local_addr,
            callback_path: self.config.callback_path.clone(),
            timeout: self.config.timeout,
        })
    }
}

/// A running listener. The socket is released by [`ListenerHandle::stop`] or on drop.
pub struct ListenerHandle {
    server: Option<Arc<Server>>,
    worker: Option<JoinHandle<()>>,
    receiver: Option<Receiver<AuthIdentifier>>,
    local_addr: SocketAddr,
    callback_path: String,
    timeout: Duration,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn callback_url(&self) -> String {
        format!("http://{}{}", self.local_addr, self.callback_path)
    }

    /// Blocks until the callback arrives or the timeout elapses.
    ///
    /// Only the first call can succeed; the identifier is delivered at most once.
    pub fn await_token(&mut self) -> Result<AuthIdentifier, LoginError> {
        let receiver = self.receiver.take().ok_or_else(|| LoginError::Listener {
            message: "the callback token was already awaited".to_string(),
        })?;

        match receiver.recv_timeout(self.timeout) {
            Ok(id) => Ok(id),
            Err(RecvTimeoutError::Timeout) => Err(LoginError::Timeout {
                waited: self.timeout,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(LoginError::Listener {
                message: "listener stopped before a callback arrived".to_string(),
            }),
        }
    }

    /// Stops serving and releases the socket. Safe to call more than once.
    pub fn stop(&mut self) {
        let Some(server) = self.server.take() else {
            return;
        };
        server.unblock();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("[!] Callback listener thread panicked");
            }
        }
        drop(server);
        debug!("[*] Callback listener on {} closed", self.local_addr);
    }

    pub fn is_stopped(&self) -> bool {
        self.server.is_none()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn serve_until_captured(
    server: &Server,
    callback_path: &str,
    id_param: &str,
    tx: Sender<AuthIdentifier>,
) {
    loop {
        // Err here means stop() unblocked us or the socket died.
        let request = match server.recv() {
            Ok(request) => request,
            Err(e) => {
                debug!("[*] Callback listener exiting: {}", e);
                return;
            }
        };

        if *request.method() != Method::Get {
            respond(request, text_response(405, "Method not allowed"));
            continue;
        }

        match parse_callback(request.url(), callback_path, id_param) {
            Some(id) => {
                info!("[✓] SAML callback received");
                respond(request, html_response(200, ACK_PAGE));
                let _ = tx.send(id);
                return;
            }
            None => {
                debug!("[*] Ignoring request for {}", request.url());
                respond(request, text_response(404, "Not found"));
            }
        }
    }
}

/// Extracts the identifier from a request target such as `/?id=ABC123`.
///
/// Returns `None` for other paths. A matching path without a usable
/// parameter yields the invalid sentinel.
fn parse_callback(target: &str, callback_path: &str, id_param: &str) -> Option<AuthIdentifier> {
    let url = Url::parse(&format!("http://localhost{}", target)).ok()?;
    if url.path() != callback_path {
        return None;
    }
    let id = url
        .query_pairs()
        .find(|(key, _)| key == id_param)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty());
    Some(id.map(AuthIdentifier::new).unwrap_or_else(AuthIdentifier::invalid))
}

fn respond(request: Request, response: Response<Cursor<Vec<u8>>>) {
    if let Err(e) = request.respond(response) {
        debug!("[!] Failed to answer callback request: {}", e);
    }
}

fn text_response(status: u16, body: &str) -> Response<Cursor<Vec<u8>>> {
    with_content_type(
        Response::from_string(body).with_status_code(status),
        "text/plain; charset=utf-8",
    )
}

fn html_response(status: u16, html: &str) -> Response<Cursor<Vec<u8>>> {
    with_content_type(
        Response::from_string(html).with_status_code(status),
        "text/html; charset=utf-8",
    )
}

fn with_content_type(
    response: Response<Cursor<Vec<u8>>>,
    content_type: &str,
) -> Response<Cursor<Vec<u8>>> {
    match Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}
