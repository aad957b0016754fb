use std::fmt;
use std::time::Duration;

use log::debug;
use reqwest::Method;

use crate::error::{DropboxError, Result};

const USER_AGENT: &str = concat!("dropcli/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl ApiRequest {
    pub fn post(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    #[cfg(test)]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

/// Sends one request and hands back the raw response.
///
/// Implementations own credentials; callers never see them.
pub trait Transport {
    fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Blocking HTTP transport that injects a bearer token into every request.
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    access_token: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("token", &mask_token(&self.access_token))
            .finish()
    }
}

impl HttpTransport {
    pub fn new(access_token: &str) -> Result<Self> {
        if access_token.trim().is_empty() {
            return Err(DropboxError::input("access token is empty"));
        }
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DropboxError::Transport {
                url: String::new(),
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            http,
            access_token: access_token.trim().to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let ApiRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;
        debug!("{} {}", method, url);

        let mut rb = self
            .http
            .request(method, &url)
            .bearer_auth(&self.access_token)
            .timeout(timeout);
        for (name, value) in &headers {
            rb = rb.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            rb = rb.body(body);
        }

        let response = rb.send().map_err(|e| classify(&url, timeout, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| classify(&url, timeout, e))?
            .to_vec();
        debug!("{} -> {} ({} bytes)", url, status, body.len());
        Ok(ApiResponse { status, body })
    }
}

fn classify(url: &str, timeout: Duration, err: reqwest::Error) -> DropboxError {
    if err.is_timeout() {
        DropboxError::Timeout {
            url: url.to_string(),
            secs: timeout.as_secs(),
        }
    } else {
        DropboxError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

fn mask_token(token: &str) -> String {
    if token.len() <= 8 || !token.is_ascii() {
        "****".into()
    } else {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::thread;

    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0_u8; 4096];
        loop {
            let n = stream.read(&mut buf).expect("read failed");
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&data);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if data.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    fn serve_once(status: &str, body: &'static str) -> (SocketAddr, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind failed");
        let addr = listener.local_addr().expect("no addr");
        let status = status.to_string();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");
            let req = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).expect("write failed");
            req
        });
        (addr, server)
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(
            HttpTransport::new("  "),
            Err(DropboxError::Input(_))
        ));
    }

    #[test]
    fn debug_masks_token() {
        let t = HttpTransport::new("sl.abcdefghijklmnop").unwrap();
        let dbg = format!("{:?}", t);
        assert!(dbg.contains("sl.a...mnop"));
        assert!(!dbg.contains("abcdefghijkl"));
    }

    #[test]
    fn injects_bearer_token_and_headers() {
        let (addr, server) = serve_once("200 OK", r#"{"ok":true}"#);
        let transport = HttpTransport::new("tok-123").unwrap();

        let request = ApiRequest::post(format!("http://{addr}/2/files/get_metadata"), DEFAULT_TIMEOUT)
            .header("Content-Type", "application/json")
            .body(br#"{"path":"/a"}"#.to_vec());
        let response = transport.send(request).unwrap();
        let raw = server.join().unwrap();

        assert!(response.ok());
        assert_eq!(response.text(), r#"{"ok":true}"#);
        assert!(raw.starts_with("POST /2/files/get_metadata"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer tok-123"));
        assert!(raw.ends_with(r#"{"path":"/a"}"#));
    }

    #[test]
    fn non_success_status_is_returned_not_raised() {
        let (addr, server) = serve_once("409 Conflict", r#"{"error_summary":"path/not_found/"}"#);
        let transport = HttpTransport::new("tok-123").unwrap();

        let response = transport
            .send(ApiRequest::post(format!("http://{addr}/x"), DEFAULT_TIMEOUT))
            .unwrap();
        server.join().unwrap();

        assert!(!response.ok());
        assert_eq!(response.status, 409);
    }

    #[test]
    fn slow_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let _ = read_request(&mut stream);
            thread::sleep(Duration::from_secs(3));
        });

        let transport = HttpTransport::new("tok-123").unwrap();
        let err = transport
            .send(ApiRequest::post(format!("http://{addr}/slow"), Duration::from_secs(1)))
            .unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, DropboxError::Timeout { secs: 1, .. }));
    }

    #[test]
    fn refused_connection_is_transport_error() {
        let transport = HttpTransport::new("tok-123").unwrap();
        let err = transport
            .send(ApiRequest::post("http://127.0.0.1:9/x", Duration::from_secs(2)))
            .unwrap_err();
        assert!(matches!(err, DropboxError::Transport { .. }));
    }
}
