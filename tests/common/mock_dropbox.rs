//! Tiny HTTP/1.1 server that answers Dropbox API calls from a closure.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use dbx_transfer::api::ApiClient;
use dbx_transfer::store::DropboxStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const TEST_TOKEN: &str = "test-token";

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request target, e.g. "/2/files/get_metadata"
    pub path: String,
    pub authorization: Option<String>,
    /// Raw `Dropbox-API-Arg` header value
    pub api_arg: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("JSON request body")
    }

    pub fn json_arg(&self) -> serde_json::Value {
        let arg = self.api_arg.as_deref().expect("Dropbox-API-Arg header");
        serde_json::from_str(arg).expect("JSON in Dropbox-API-Arg")
    }
}

/// Status code and response body.
pub type Reply = (u16, Vec<u8>);

type Handler = Arc<dyn Fn(&RecordedRequest) -> Reply + Send + Sync>;

pub struct MockDropbox {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockDropbox {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handler: Handler = Arc::new(handler);
        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = Arc::clone(&handler);
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let _ = serve(stream, handler, recorded).await;
                });
            }
        });

        Self { addr, requests }
    }

    /// Stands in for both the RPC and the content host.
    pub fn base_url(&self) -> String {
        format!("http://{}/2", self.addr)
    }

    pub fn store(&self) -> DropboxStore {
        let base = self.base_url();
        DropboxStore::new(ApiClient::new(TEST_TOKEN).with_base_urls(&base, &base))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

pub fn reply_json(status: u16, value: serde_json::Value) -> Reply {
    (status, value.to_string().into_bytes())
}

/// A 409 endpoint error with the given summary.
pub fn endpoint_error(summary: &str) -> Reply {
    reply_json(409, serde_json::json!({ "error_summary": summary, "error": {} }))
}

async fn serve(
    mut stream: TcpStream,
    handler: Handler,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let path = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    let mut api_arg = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse().unwrap_or(0);
        } else if name.eq_ignore_ascii_case("authorization") {
            authorization = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("dropbox-api-arg") {
            api_arg = Some(value.to_string());
        }
    }

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    let request = RecordedRequest {
        path,
        authorization,
        api_arg,
        body,
    };
    let (status, payload) = handler(&request);
    recorded.lock().unwrap().push(request);

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason(status),
        payload.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&payload).await?;
    stream.shutdown().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        409 => "Conflict",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
