//! Shared test helpers: record builders and a tiny local HTTP responder.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::records::LawsuitRecord;

pub fn record(year: &str, plaintiff: &str, defendant: &str, citation: &str) -> LawsuitRecord {
    LawsuitRecord {
        year: year.to_string(),
        plaintiff: plaintiff.to_string(),
        defendant: defendant.to_string(),
        citation: citation.to_string(),
    }
}

/// A complete HTTP/1.1 response. `extra` is zero or more `Name: value\r\n` lines.
pub fn response(status: &str, content_type: &str, extra: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n{extra}Connection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Serve canned responses keyed by request path on 127.0.0.1. Unknown paths
/// hold the connection open without answering. Returns the base URL.
pub async fn serve(routes: Vec<(&'static str, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let mut seen = Vec::new();
                let mut buf = [0u8; 1024];
                while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => seen.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&seen);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                match routes.iter().find(|(p, _)| *p == path) {
                    Some((_, resp)) => {
                        let _ = socket.write_all(resp.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                    None => tokio::time::sleep(Duration::from_secs(30)).await,
                }
            });
        }
    });

    format!("http://{}", addr)
}
