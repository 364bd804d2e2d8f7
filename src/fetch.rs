use std::io::Read;

use bytes::Bytes;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use log::debug;
use reqwest::{
    header::{
        HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
        CONTENT_ENCODING, USER_AGENT,
    },
    redirect::Policy,
    Client,
};

use crate::config::FetcherConfig;

const TIMEOUT_MULTIPLIER: u32 = 5;
const SNIPPET_LEN: usize = 512;
/// Status reported when the redirect chain never reaches a final response.
pub const UNRESOLVED_REDIRECT: u16 = 302;
/// Status reported when no response was received at all.
pub const NO_RESPONSE: u16 = 0;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:25.0) Gecko/20100101 Firefox/25.0";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, timeout or body read error.
    Network,
    /// Redirect chain did not resolve.
    Redirect,
    /// Final status outside `200..300`.
    Http,
    /// Compressed body could not be decoded.
    Decode,
}

#[derive(Debug)]
pub enum FetchResult {
    Success {
        bytes: Bytes,
    },
    Failure {
        kind: FailureKind,
        status: u16,
        message: String,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Self::Success { bytes } => Some(bytes),
            Self::Failure { .. } => None,
        }
    }

    fn failure(kind: FailureKind, status: u16, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            status,
            message: message.into(),
        }
    }
}

pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentEncoding {
    Identity,
    Gzip,
    Deflate,
    Other(String),
}

impl ContentEncoding {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let value = match headers.get(CONTENT_ENCODING).and_then(|v| v.to_str().ok()) {
            Some(value) => value.trim().to_ascii_lowercase(),
            None => return Self::Identity,
        };
        match value.as_str() {
            "" | "identity" => Self::Identity,
            "gzip" | "x-gzip" => Self::Gzip,
            "deflate" => Self::Deflate,
            _ => Self::Other(value),
        }
    }

    /// Undo the encoding. Unknown encodings are passed through as is.
    pub fn decode(&self, body: Bytes) -> std::io::Result<Bytes> {
        let mut buffer = Vec::new();
        match self {
            Self::Identity | Self::Other(_) => return Ok(body),
            Self::Gzip => {
                GzDecoder::new(&body[..]).read_to_end(&mut buffer)?;
            }
            Self::Deflate => {
                // Servers disagree on whether `deflate` carries the zlib wrapper.
                if ZlibDecoder::new(&body[..]).read_to_end(&mut buffer).is_err() {
                    buffer.clear();
                    DeflateDecoder::new(&body[..]).read_to_end(&mut buffer)?;
                }
            }
        }
        Ok(Bytes::from(buffer))
    }
}

/// Browser-like header set sent with every request.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn new(config: &FetcherConfig) -> reqwest::Result<Self> {
        Ok(Self::from_client(Self::client_with_config(config)?))
    }

    pub fn client_with_config(config: &FetcherConfig) -> reqwest::Result<Client> {
        Client::builder()
            .default_headers(default_headers())
            .redirect(Policy::limited(config.max_redirects))
            .connect_timeout(config.connection_timeout)
            .timeout(config.connection_timeout * TIMEOUT_MULTIPLIER)
            .build()
    }

    /// Single GET attempt. Every problem comes back as [`FetchResult::Failure`].
    pub async fn get(&self, url: &str) -> FetchResult {
        debug!("GET {url}.");
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) if err.is_redirect() => {
                return FetchResult::failure(
                    FailureKind::Redirect,
                    UNRESOLVED_REDIRECT,
                    format!("Redirect from {url} did not resolve: {err}"),
                )
            }
            Err(err) => {
                return FetchResult::failure(
                    FailureKind::Network,
                    NO_RESPONSE,
                    format!("Failed to execute GET request to {url}: {err}"),
                )
            }
        };
        let status = response.status().as_u16();
        let encoding = ContentEncoding::from_headers(response.headers());
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                return FetchResult::failure(
                    FailureKind::Network,
                    NO_RESPONSE,
                    format!("Failed to read body from {url}: {err}"),
                )
            }
        };
        if !is_success_status(status) {
            let kind = if (300..400).contains(&status) {
                FailureKind::Redirect
            } else {
                FailureKind::Http
            };
            // Error pages may be compressed too.
            let body = encoding.decode(body.clone()).unwrap_or(body);
            return FetchResult::failure(kind, status, snippet(&body));
        }
        debug!("{url}: {status}, {} bytes, {encoding:?}.", body.len());
        match encoding.decode(body) {
            Ok(bytes) => FetchResult::Success { bytes },
            Err(err) => FetchResult::failure(
                FailureKind::Decode,
                status,
                format!("Error decoding {encoding:?} data from {url}: {err}"),
            ),
        }
    }
}

fn snippet(body: &[u8]) -> String {
    let end = body.len().min(SNIPPET_LEN);
    String::from_utf8_lossy(&body[..end]).into_owned()
}
