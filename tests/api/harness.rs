//! Test server harness.

use std::net::SocketAddr;

use planroom::config::{Auth, Config, Database, Server as ServerConfig};
use planroom::store::users;
use planroom::{Principal, SystemRole, api, auth, db, server};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const SECRET: &str = "test-secret-that-is-at-least-32b!";

/// A running server plus direct access to its database.
pub struct App {
    pub server: server::Server,
    pub db: planroom::DbHandle,
    pub config: Config,
    _dir: tempfile::TempDir,
}

/// A parsed HTTP response.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub headers: String,
    pub body: Value,
}

impl App {
    pub async fn start() -> App {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planroom.db");
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: Database {
                url: path.to_str().unwrap().to_string(),
            },
            auth: Auth {
                jwt_secret: SECRET.to_string(),
                token_expiry_days: 1,
            },
            ..Default::default()
        };

        let handle = db::open(&config.database.url).await.unwrap();
        let server = server::start(
            config.clone(),
            Some(handle.clone()),
            api::router().into_handle(),
        )
        .await
        .expect("failed to start test server");

        App {
            server,
            db: handle,
            config,
            _dir: dir,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.server.addr()
    }

    /// Register a user directly in the directory and mint a token for them.
    pub async fn user(&self, email: &str, role: SystemRole) -> (Principal, String) {
        let conn = db::connection(&self.db).unwrap();
        let user = users::create(&conn, email, role).await.unwrap();
        let token = auth::create_token(&self.config.auth, &user.id).unwrap();
        (user, token)
    }

    pub async fn deactivate(&self, user_id: &str) {
        let conn = db::connection(&self.db).unwrap();
        users::update(&conn, user_id, None, Some(false))
            .await
            .unwrap();
    }

    pub async fn call(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        let auth = token
            .map(|t| format!("Authorization: Bearer {t}\r\n"))
            .unwrap_or_default();
        let request = format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
             Content-Type: application/json\r\nContent-Length: {}\r\n{auth}\r\n{body}",
            body.len()
        );
        parse(&raw_request(self.addr(), request.as_bytes()).await)
    }

    pub async fn stop(self) {
        self.server.shutdown().await.unwrap();
    }
}

/// Send a raw HTTP/1.1 request with `Connection: close` and read the full response.
pub async fn raw_request(addr: SocketAddr, payload: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.expect("failed to connect");
    stream.write_all(payload).await.expect("failed to write");

    let mut buf = Vec::new();
    let _ = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        stream.read_to_end(&mut buf),
    )
    .await;
    buf
}

fn parse(raw: &[u8]) -> Reply {
    let text = String::from_utf8_lossy(raw);
    let (head, body) = text.split_once("\r\n\r\n").unwrap_or((text.as_ref(), ""));
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or_else(|| panic!("malformed response:\n{text}"));
    let body = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).unwrap_or_else(|e| panic!("non-JSON body ({e}):\n{body}"))
    };
    Reply {
        status,
        headers: head.to_ascii_lowercase(),
        body,
    }
}
