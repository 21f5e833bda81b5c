// ============================================================================
// RTO Security - Hawk Authentication
// File: crates/rto-security/src/hawk.rs
// Description: Hawk (sha256) request verification and response signing
// ============================================================================
//! Hawk HTTP authentication for the activity stream.
//!
//! Requests carry `Authorization: Hawk id="..", ts="..", nonce="..",
//! hash="..", mac=".."`. The MAC covers timestamp, nonce, method, resource,
//! host, port and payload hash. Each nonce is accepted once within the
//! timestamp window.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HawkError {
    #[error("Missing Hawk authorization header")]
    MissingHeader,
    #[error("Malformed Hawk header: {0}")]
    MalformedHeader(String),
    #[error("Unknown Hawk id")]
    UnknownId,
    #[error("Stale timestamp")]
    StaleTimestamp,
    #[error("Nonce already used")]
    ReplayedNonce,
    #[error("Payload hash mismatch")]
    HashMismatch,
    #[error("Invalid MAC")]
    InvalidMac,
    #[error("HMAC error: {0}")]
    HmacError(String),
}

#[derive(Debug, Clone)]
pub struct HawkCredentials {
    pub id: String,
    pub key: String,
}

/// The parts of an HTTP request Hawk signs.
#[derive(Debug, Clone)]
pub struct HawkRequest<'a> {
    pub method: &'a str,
    /// Path plus query string, as sent on the request line.
    pub resource: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub content_type: &'a str,
    pub body: &'a [u8],
}

/// Values from a verified request, needed to sign the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HawkArtifacts {
    pub id: String,
    pub ts: i64,
    pub nonce: String,
    pub method: String,
    pub resource: String,
    pub host: String,
    pub port: u16,
    pub ext: String,
}

pub struct HawkAuthenticator {
    credentials: HawkCredentials,
    skew_seconds: i64,
    /// `id:nonce` → timestamp of first use.
    seen_nonces: DashMap<String, i64>,
}

/// Lower-cased media type without parameters.
fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn payload_hash(content_type: &str, body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"hawk.1.payload\n");
    hasher.update(normalize_content_type(content_type).as_bytes());
    hasher.update(b"\n");
    hasher.update(body);
    hasher.update(b"\n");
    BASE64.encode(hasher.finalize())
}

fn normalized_string(kind: &str, artifacts: &HawkArtifacts, hash: &str) -> String {
    format!(
        "hawk.1.{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
        kind,
        artifacts.ts,
        artifacts.nonce,
        artifacts.method.to_ascii_uppercase(),
        artifacts.resource,
        artifacts.host.to_ascii_lowercase(),
        artifacts.port,
        hash,
        artifacts.ext
    )
}

fn keyed_mac(key: &str, message: &str) -> Result<HmacSha256, HawkError> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| HawkError::HmacError(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(mac)
}

fn sign(key: &str, message: &str) -> Result<String, HawkError> {
    Ok(BASE64.encode(keyed_mac(key, message)?.finalize().into_bytes()))
}

/// Parses `Hawk k1="v1", k2="v2"` into its attributes.
fn parse_header(header: &str) -> Result<HashMap<String, String>, HawkError> {
    let rest = header
        .trim()
        .strip_prefix("Hawk ")
        .ok_or_else(|| HawkError::MalformedHeader("scheme is not Hawk".to_string()))?;

    let mut attributes = HashMap::new();
    for part in rest.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| HawkError::MalformedHeader(format!("bad attribute '{}'", part)))?;
        let value = value
            .trim()
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .ok_or_else(|| HawkError::MalformedHeader(format!("unquoted value for '{}'", key)))?;
        if attributes
            .insert(key.trim().to_string(), value.to_string())
            .is_some()
        {
            return Err(HawkError::MalformedHeader(format!(
                "duplicate attribute '{}'",
                key
            )));
        }
    }
    Ok(attributes)
}

fn required<'a>(attributes: &'a HashMap<String, String>, key: &str) -> Result<&'a str, HawkError> {
    attributes
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| HawkError::MalformedHeader(format!("missing '{}'", key)))
}

impl HawkAuthenticator {
    pub fn new(credentials: HawkCredentials, skew_seconds: i64) -> Self {
        Self {
            credentials,
            skew_seconds,
            seen_nonces: DashMap::new(),
        }
    }

    /// Verifies the `Authorization` header of a request at time `now`
    /// (unix seconds).
    pub fn authenticate(
        &self,
        authorization: Option<&str>,
        request: &HawkRequest<'_>,
        now: i64,
    ) -> Result<HawkArtifacts, HawkError> {
        let header = authorization.ok_or(HawkError::MissingHeader)?;
        let attributes = parse_header(header)?;

        let id = required(&attributes, "id")?;
        if id != self.credentials.id {
            warn!("Hawk request with unknown id");
            return Err(HawkError::UnknownId);
        }

        let ts: i64 = required(&attributes, "ts")?
            .parse()
            .map_err(|_| HawkError::MalformedHeader("ts is not a number".to_string()))?;
        let nonce = required(&attributes, "nonce")?;
        let mac = required(&attributes, "mac")?;
        let hash = required(&attributes, "hash")?;

        let artifacts = HawkArtifacts {
            id: id.to_string(),
            ts,
            nonce: nonce.to_string(),
            method: request.method.to_string(),
            resource: request.resource.to_string(),
            host: request.host.to_string(),
            port: request.port,
            ext: attributes.get("ext").cloned().unwrap_or_default(),
        };

        let provided = BASE64
            .decode(mac)
            .map_err(|_| HawkError::MalformedHeader("mac is not base64".to_string()))?;
        keyed_mac(
            &self.credentials.key,
            &normalized_string("header", &artifacts, hash),
        )?
        .verify_slice(&provided)
        .map_err(|_| {
            warn!("Hawk MAC mismatch for {}", request.resource);
            HawkError::InvalidMac
        })?;

        if hash != payload_hash(request.content_type, request.body) {
            warn!("Hawk payload hash mismatch for {}", request.resource);
            return Err(HawkError::HashMismatch);
        }

        if (now - ts).abs() > self.skew_seconds {
            warn!("Hawk timestamp outside the {}s window", self.skew_seconds);
            return Err(HawkError::StaleTimestamp);
        }

        self.remember_nonce(id, nonce, ts, now)?;

        debug!("Hawk request authenticated for {}", request.resource);
        Ok(artifacts)
    }

    fn remember_nonce(&self, id: &str, nonce: &str, ts: i64, now: i64) -> Result<(), HawkError> {
        let window = self.skew_seconds;
        self.seen_nonces
            .retain(|_, first_seen| (now - *first_seen).abs() <= window);

        match self.seen_nonces.entry(format!("{}:{}", id, nonce)) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                warn!("Hawk nonce replayed");
                Err(HawkError::ReplayedNonce)
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(ts);
                Ok(())
            }
        }
    }

    /// `Server-Authorization` header value for a response to a verified request.
    pub fn response_header(
        &self,
        artifacts: &HawkArtifacts,
        content_type: &str,
        body: &[u8],
    ) -> Result<String, HawkError> {
        let hash = payload_hash(content_type, body);
        let mac = sign(
            &self.credentials.key,
            &normalized_string("response", artifacts, &hash),
        )?;
        Ok(format!("Hawk mac=\"{}\", hash=\"{}\"", mac, hash))
    }
}

/// Builds a client `Authorization` header, as a consumer of the feed would.
pub fn client_header(
    credentials: &HawkCredentials,
    request: &HawkRequest<'_>,
    ts: i64,
    nonce: &str,
) -> Result<String, HawkError> {
    let artifacts = HawkArtifacts {
        id: credentials.id.clone(),
        ts,
        nonce: nonce.to_string(),
        method: request.method.to_string(),
        resource: request.resource.to_string(),
        host: request.host.to_string(),
        port: request.port,
        ext: String::new(),
    };
    let hash = payload_hash(request.content_type, request.body);
    let mac = sign(
        &credentials.key,
        &normalized_string("header", &artifacts, &hash),
    )?;
    Ok(format!(
        "Hawk id=\"{}\", ts=\"{}\", nonce=\"{}\", hash=\"{}\", mac=\"{}\"",
        credentials.id, ts, nonce, hash, mac
    ))
}
