//! Shared fixtures and helpers for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use microsoft_jwt::{Fetch, FetchError};
use serde_json::Value;

/// Key id published by the JWKS fixture.
pub const KID: &str = "test-signing-key";

/// Issuer published by the AD FS metadata fixture.
pub const ADFS_ISSUER: &str = "http://your_domain/adfs/services/trust";

pub const JWKS_JSON: &str = include_str!("../fixtures/jwks.json");
pub const ADFS_METADATA: &str = include_str!("../fixtures/adfs_metadata.json");
pub const AZURE_AD_METADATA: &str = include_str!("../fixtures/azure_ad_metadata.json");

/// Private key matching the JWKS fixture.
pub const RSA_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/rsa_private.pem");

/// A second private key with no counterpart in the JWKS fixture.
pub const OTHER_RSA_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/rsa_private_other.pem");

/// Writes the JWKS fixture and a metadata fixture (with its `jwks_uri`
/// pointed at the written JWKS file) into `dir`, returning the metadata
/// path.
pub fn write_fixtures(dir: &Path, metadata_template: &str) -> PathBuf {
    let jwks_path = dir.join("jwks.json");
    fs::write(&jwks_path, JWKS_JSON).unwrap();

    let metadata = metadata_template.replace("{jwks_uri}", jwks_path.to_str().unwrap());
    let metadata_path = dir.join("metadata.json");
    fs::write(&metadata_path, metadata).unwrap();

    metadata_path
}

/// Like [`write_fixtures`], but lets the test patch the metadata document
/// before it is written.
pub fn write_fixtures_with(
    dir: &Path,
    metadata_template: &str,
    patch: impl FnOnce(&mut serde_json::Map<String, Value>),
) -> PathBuf {
    let jwks_path = dir.join("jwks.json");
    fs::write(&jwks_path, JWKS_JSON).unwrap();

    let metadata = metadata_template.replace("{jwks_uri}", jwks_path.to_str().unwrap());
    let mut doc: Value = serde_json::from_str(&metadata).unwrap();
    patch(doc.as_object_mut().unwrap());

    let metadata_path = dir.join("metadata.json");
    fs::write(&metadata_path, doc.to_string()).unwrap();

    metadata_path
}

/// Signs `claims` with the fixture key, under the fixture kid.
pub fn mint_token(claims: &Value) -> String {
    mint_token_with(claims, RSA_PRIVATE_KEY_PEM, Some(KID))
}

/// Signs `claims` with an arbitrary key and kid.
pub fn mint_token_with(claims: &Value, pem: &str, kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    jsonwebtoken::encode(&header, claims, &key).unwrap()
}

/// Unix timestamp `offset` seconds from now.
pub fn now_plus(offset: i64) -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp() + offset
}

/// Serves `body` over HTTP on a loopback port, for GET requests to
/// `/metadata`; any other path gets a 404. Returns the metadata URL. The
/// server thread lives for the rest of the test process.
pub fn serve_metadata(body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            let response = if request.starts_with(b"GET /metadata ") {
                let mut response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                )
                .into_bytes();
                response.extend_from_slice(&body);
                response
            } else {
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec()
            };
            let _ = stream.write_all(&response);
        }
    });

    format!("http://{addr}/metadata")
}

/// Fetcher that counts how many fetches reach the filesystem/network.
pub struct CountingFetcher {
    inner: microsoft_jwt::DefaultFetcher,
    count: Arc<AtomicUsize>,
}

impl CountingFetcher {
    pub fn new(count: Arc<AtomicUsize>) -> Self {
        Self {
            inner: microsoft_jwt::DefaultFetcher::new(),
            count,
        }
    }
}

impl Fetch for CountingFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(uri)
    }
}
