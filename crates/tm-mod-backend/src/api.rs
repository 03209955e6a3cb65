use reqwest::blocking::Client;
use std::time::Duration;

use tm_base::config::constants::{CHECK_RESULT_PATH, QUERY_PATH};

use crate::error::BackendError;
use crate::types::{CheckReply, QueryReply, QueryRequest};

/// The two calls the session core makes against the query-answering service.
pub trait QueryBackend: Send + Sync {
    /// `POST /query`. A reply with an `error` field is still `Ok`.
    fn query(&self, content_id: &str, query: &str) -> Result<QueryReply, BackendError>;

    /// `GET /check_result` for a previously deferred query.
    fn check_result(&self, content_id: &str, query: &str) -> Result<CheckReply, BackendError>;
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| BackendError::Client(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl QueryBackend for HttpBackend {
    fn query(&self, content_id: &str, query: &str) -> Result<QueryReply, BackendError> {
        tracing::debug!(content_id, query, "POST {}", QUERY_PATH);
        let resp = self
            .client
            .post(self.url(QUERY_PATH))
            .header("Accept", "application/json")
            .json(&QueryRequest::new(content_id, query))
            .send()?;

        let status = resp.status().as_u16();
        let body = resp.text()?;
        parse_query_reply(status, &body)
    }

    fn check_result(&self, content_id: &str, query: &str) -> Result<CheckReply, BackendError> {
        tracing::debug!(content_id, query, "GET {}", CHECK_RESULT_PATH);
        let resp = self
            .client
            .get(self.url(CHECK_RESULT_PATH))
            .header("Accept", "application/json")
            .query(&[("contentId", content_id), ("videoId", content_id), ("query", query)])
            .send()?;

        let status = resp.status().as_u16();
        let body = resp.text()?;
        if !(200..=299).contains(&status) {
            return Err(BackendError::Status { status, body: truncate(&body, 200).to_string() });
        }
        serde_json::from_str(&body).map_err(|e| BackendError::Parse(format!("check_result: {}", e)))
    }
}

/// Error statuses from the backend usually still carry a JSON body
/// (`{"error": ...}` or `{"detail": ...}`) meant for the user, so the body
/// is tried first and the status only matters when it is unreadable.
///
/// Any JSON that is not a usable reply object (`[]`, `"text"`, a numeric
/// `answer`) is an empty reply, which shows as the "No response" text.
fn parse_query_reply(status: u16, body: &str) -> Result<QueryReply, BackendError> {
    let value = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value,
        Err(e) if (200..=299).contains(&status) => return Err(BackendError::Parse(format!("query: {}", e))),
        Err(_) => return Err(BackendError::Status { status, body: truncate(body, 200).to_string() }),
    };
    if !(200..=299).contains(&status) {
        tracing::warn!(status, "backend returned error status with JSON body");
    }
    if !value.is_object() {
        tracing::warn!(status, "query reply is not a JSON object");
        return Ok(QueryReply::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!(status, error = %e, "query reply has unexpected field types");
        QueryReply::default()
    }))
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// Serve exactly one HTTP response and hand back the raw request text.
    fn spawn_one_shot_server(status_line: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = mpsc::channel();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().expect("accept");
            socket.set_read_timeout(Some(Duration::from_secs(2))).expect("set read timeout");

            let mut bytes = Vec::new();
            let mut chunk = [0_u8; 4096];
            let mut expected_len: Option<usize> = None;
            loop {
                match socket.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => bytes.extend_from_slice(&chunk[..n]),
                }
                let Some(header_end) = bytes.windows(4).position(|w| w == b"\r\n\r\n") else { continue };
                if expected_len.is_none() {
                    let head = String::from_utf8_lossy(&bytes[..header_end]).to_ascii_lowercase();
                    let len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    expected_len = Some(header_end + 4 + len);
                }
                if expected_len.is_some_and(|total| bytes.len() >= total) {
                    break;
                }
            }

            tx.send(String::from_utf8_lossy(&bytes).to_string()).expect("send captured request");
            socket.write_all(response.as_bytes()).expect("write response");
            socket.flush().expect("flush response");
        });

        (format!("http://{}", addr), rx)
    }

    fn backend(base_url: &str) -> HttpBackend {
        HttpBackend::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn query_posts_json_and_reads_answer() {
        let (url, requests) = spawn_one_shot_server("200 OK", r#"{"answer":"42"}"#);
        let reply = backend(&url).query("abc123", "what is the answer").unwrap();
        assert_eq!(reply, QueryReply::answer("42"));

        let raw = requests.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(raw.starts_with("POST /query "));
        assert!(raw.contains(r#""contentId":"abc123""#));
        assert!(raw.contains(r#""videoId":"abc123""#));
        assert!(raw.contains(r#""query":"what is the answer""#));
    }

    #[test]
    fn query_error_status_with_detail_is_a_reply() {
        let (url, _requests) = spawn_one_shot_server("500 Internal Server Error", r#"{"detail":"transcript failed"}"#);
        let reply = backend(&url).query("abc123", "q").unwrap();
        assert_eq!(reply.into_text("No response"), "transcript failed");
    }

    #[test]
    fn query_error_status_without_json_is_an_error() {
        let (url, _requests) = spawn_one_shot_server("502 Bad Gateway", "upstream down");
        let err = backend(&url).query("abc123", "q").unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 502, .. }));
    }

    #[test]
    fn non_object_json_reads_as_empty_reply() {
        for body in ["[]", r#""text""#, "null", r#"{"answer":42}"#] {
            let reply = parse_query_reply(200, body).unwrap();
            assert_eq!(reply, QueryReply::default(), "{body}");
            assert_eq!(reply.into_text("No response"), "No response");
        }
    }

    #[test]
    fn query_with_array_body_over_http_is_no_response() {
        let (url, _requests) = spawn_one_shot_server("200 OK", "[]");
        let reply = backend(&url).query("abc123", "q").unwrap();
        assert_eq!(reply.into_text("No response"), "No response");
    }

    #[test]
    fn non_json_success_body_is_parse_error() {
        assert!(matches!(parse_query_reply(200, "<html>"), Err(BackendError::Parse(_))));
    }

    #[test]
    fn check_result_encodes_query_string() {
        let (url, requests) = spawn_one_shot_server("200 OK", r#"{"found":true,"answer":"final text"}"#);
        let reply = backend(&url).check_result("abc123", "why & how?").unwrap();
        assert_eq!(reply, CheckReply::found("final text"));

        let raw = requests.recv_timeout(Duration::from_secs(2)).unwrap();
        let request_line = raw.lines().next().unwrap();
        assert!(request_line.starts_with("GET /check_result?"));
        assert!(request_line.contains("contentId=abc123"));
        assert!(request_line.contains("videoId=abc123"));
        assert!(request_line.contains("query=why+%26+how%3F"));
    }

    #[test]
    fn unreachable_backend_is_network_error() {
        // Bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let err = backend(&format!("http://127.0.0.1:{}", port)).query("abc", "q").unwrap_err();
        assert!(matches!(err, BackendError::Network(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(backend("http://localhost:5000/").base_url(), "http://localhost:5000");
    }
}
