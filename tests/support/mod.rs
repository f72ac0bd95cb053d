//! Shared helpers for integration tests that need control over body timing.
//!
//! wiremock delays whole responses only, so these serve a raw HTTP/1.1
//! response over a TCP socket and pace the body by hand.

#![allow(dead_code)]

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// How the body is delivered after the response head.
pub struct BodyPlan {
    /// Value sent in the `Content-Length` header.
    pub content_length: usize,
    /// Body chunks, written in order.
    pub chunks: Vec<Vec<u8>>,
    /// Pause before each chunk.
    pub gap: Duration,
    /// Keep the connection open, sending nothing, after the last chunk.
    pub stall: bool,
}

impl BodyPlan {
    /// `len` single-byte chunks, `gap` apart, then a clean end.
    pub fn trickle(len: usize, gap: Duration) -> Self {
        Self {
            content_length: len,
            chunks: (0..len).map(|i| vec![b'a' + (i % 26) as u8]).collect(),
            gap,
            stall: false,
        }
    }

    /// `first` is sent straight away, then the connection goes silent even
    /// though `content_length` promises more.
    pub fn stalled(content_length: usize, first: &[u8]) -> Self {
        Self {
            content_length,
            chunks: vec![first.to_vec()],
            gap: Duration::ZERO,
            stall: true,
        }
    }
}

/// Serves `plan` to the first connection and returns the server base URL.
pub async fn serve_paced(plan: BodyPlan) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\n\r\n",
            plan.content_length
        );
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }

        for chunk in plan.chunks {
            tokio::time::sleep(plan.gap).await;
            if socket.write_all(&chunk).await.is_err() || socket.flush().await.is_err() {
                return;
            }
        }

        if plan.stall {
            std::future::pending::<()>().await;
        }
    });

    format!("http://{addr}")
}
