//! Booking backend REST client.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{BackendReply, BookingApi};
use crate::{
    booking::{BookingRecord, BookingRequest},
    config::BackendCfg,
    error::BookingsRejected,
};

/// Response of the bookings list endpoint.
#[derive(Debug, Deserialize)]
struct MyBookingsResp {
    #[serde(default)]
    bookings: Vec<BookingRecord>,
    #[serde(default)]
    error: Option<String>,
}

pub struct BackendClient {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl BackendClient {
    pub fn new(http: Client, cfg: &BackendCfg) -> Self {
        Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            auth_token: cfg.auth_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BookingApi for BackendClient {
    async fn create_booking(&self, request: &BookingRequest) -> Result<BackendReply> {
        let resp = self
            .http
            .post(self.url("/api/bookings/create"))
            .json(request)
            .send()
            .await?;
        let status = resp.status().as_u16();
        // Rejection bodies are shown verbatim; a body that cannot be read
        // counts as no response.
        let body = resp.text().await?;
        Ok(BackendReply { status, body })
    }

    async fn my_bookings(&self) -> Result<Vec<BookingRecord>> {
        let mut req = self.http.get(self.url("/api/bookings/mybookings"));
        if let Some(token) = &self.auth_token {
            req = req.header(reqwest::header::AUTHORIZATION, token);
        }
        let resp = req.send().await?;
        let ok = resp.status().is_success();
        let parsed = resp.json::<MyBookingsResp>().await?;
        if ok {
            Ok(parsed.bookings)
        } else {
            let msg = parsed
                .error
                .unwrap_or_else(|| "Failed to fetch bookings".into());
            Err(BookingsRejected(msg).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::SubmitError, worker::submit_booking};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        sync::oneshot,
    };

    /// Read one HTTP request (headers plus `Content-Length` body).
    async fn read_request(sock: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = sock.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let len = text[..end]
                    .lines()
                    .find_map(|l| {
                        l.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answer a single connection with a raw reply, then close it.
    async fn serve_once(reply: String) -> (BackendClient, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut sock).await;
            let _ = tx.send(request);
            let _ = sock.write_all(reply.as_bytes()).await;
            let _ = sock.shutdown().await;
        });
        let http = Client::builder().no_proxy().build().expect("client");
        let client = BackendClient::new(
            http,
            &BackendCfg {
                base_url: format!("http://{addr}"),
                auth_token: Some("token-123".into()),
            },
        );
        (client, rx)
    }

    fn request() -> BookingRequest {
        BookingRequest {
            name: "Asha".into(),
            phone: "9876543210".into(),
            service: "Fan Repair".into(),
            date: "2025-01-10".into(),
            time: "10:30".into(),
            address: "12 Lane".into(),
        }
    }

    #[tokio::test]
    async fn test_create_posts_json_and_keeps_rejection_body() {
        let (client, seen) = serve_once(
            "HTTP/1.1 409 Conflict\r\nContent-Length: 16\r\nConnection: close\r\n\r\nslot unavailable"
                .into(),
        )
        .await;

        let reply = client.create_booking(&request()).await.expect("reply");
        assert_eq!(
            reply,
            BackendReply {
                status: 409,
                body: "slot unavailable".into()
            }
        );

        let raw = seen.await.expect("request captured");
        assert!(raw.starts_with("POST /api/bookings/create "), "{raw}");
        assert!(raw.contains(r#""phone":"9876543210""#), "{raw}");
        assert!(raw.contains(r#""date":"2025-01-10""#), "{raw}");
    }

    #[tokio::test]
    async fn test_truncated_rejection_body_is_server_error() {
        let (client, _seen) =
            serve_once("HTTP/1.1 409 Conflict\r\nContent-Length: 100\r\n\r\nslot".into()).await;

        assert_eq!(
            submit_booking(&client, &request()).await,
            Err(SubmitError::Network)
        );
    }

    #[tokio::test]
    async fn test_list_rejection_carries_server_message() {
        let body = r#"{"error":"Unauthorized"}"#;
        let reply = format!(
            "HTTP/1.1 401 Unauthorized\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (client, seen) = serve_once(reply).await;

        let err = client.my_bookings().await.expect_err("rejected");
        assert_eq!(
            err.downcast_ref::<BookingsRejected>(),
            Some(&BookingsRejected("Unauthorized".into()))
        );

        let raw = seen.await.expect("request captured");
        assert!(raw.starts_with("GET /api/bookings/mybookings "), "{raw}");
        assert!(raw.to_ascii_lowercase().contains("authorization: token-123"), "{raw}");
    }

    #[test]
    fn test_base_url_trailing_slash_is_ignored() {
        let client = BackendClient::new(
            Client::new(),
            &BackendCfg {
                base_url: "http://localhost:5000/".into(),
                auth_token: None,
            },
        );
        assert_eq!(
            client.url("/api/bookings/create"),
            "http://localhost:5000/api/bookings/create"
        );
    }

    #[test]
    fn test_list_error_body_parses() {
        let parsed: MyBookingsResp =
            serde_json::from_str(r#"{"error":"Unauthorized"}"#).expect("parse");
        assert!(parsed.bookings.is_empty());
        assert_eq!(parsed.error.as_deref(), Some("Unauthorized"));
    }
}
