use std::error::Error as StdError;
use std::io;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use podcast_core::FailureKind;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Response, Url};

use crate::config::HttpSettings;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("server disconnected: {0}")]
    Disconnected(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("http status {0}")]
    Status(u16),
    #[error("more than {0} redirects")]
    RedirectLimitExceeded(usize),
    #[error("response too large (max {max_bytes}, actual {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("payload error: {0}")]
    Payload(String),
    #[error("network error: {0}")]
    Network(String),
}

impl HttpError {
    /// The remote side closed the connection mid-request. The only class worth retrying.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, HttpError::Disconnected(_))
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            HttpError::InvalidUrl { .. } => FailureKind::InvalidUrl,
            HttpError::Disconnected(_) => FailureKind::Network,
            HttpError::Timeout(_) => FailureKind::Timeout,
            HttpError::Status(code) => FailureKind::HttpStatus(*code),
            HttpError::RedirectLimitExceeded(_) => FailureKind::RedirectLimitExceeded,
            HttpError::TooLarge { max_bytes, actual } => FailureKind::TooLarge {
                max_bytes: *max_bytes,
                actual: *actual,
            },
            HttpError::Payload(_) => FailureKind::Payload,
            HttpError::Network(_) => FailureKind::Network,
        }
    }

    pub(crate) fn invalid_url(url: &str, err: impl ToString) -> Self {
        HttpError::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// A fully read HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: Url,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// One connection pool, header set and TLS context shared by every request of a crawl.
///
/// Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: reqwest::Client,
    settings: HttpSettings,
}

impl HttpSession {
    pub fn new(settings: HttpSettings) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| HttpError::Network(err.to_string()))?;
        Ok(Self { client, settings })
    }

    /// GET an HTML page without following redirects and read the whole body.
    pub async fn get_page(&self, url: &Url) -> Result<FetchedPage, HttpError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = require_success(response)?;
        let content_type = content_type_of(&response);
        let url = response.url().clone();
        let bytes = self.read_body(response).await?;
        Ok(FetchedPage {
            url,
            content_type,
            bytes,
        })
    }

    /// GET `url`, following up to `redirect_limit` redirects by hand.
    ///
    /// Returns the first non-redirect response, which must be a success.
    /// Only the client's read timeout applies, so a large body that keeps
    /// arriving is never cut off by a total deadline.
    pub async fn get_following_redirects(&self, url: Url) -> Result<Response, HttpError> {
        let mut current = url;
        for _ in 0..=self.settings.redirect_limit {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(map_send_error)?;
            let status = response.status();
            if !status.is_redirection() {
                return require_success(response);
            }
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or(HttpError::Status(status.as_u16()))?;
            current = current
                .join(location)
                .map_err(|err| HttpError::invalid_url(location, err))?;
        }
        Err(HttpError::RedirectLimitExceeded(self.settings.redirect_limit))
    }

    /// Read the complete body, enforcing `max_bytes`.
    pub async fn read_body(&self, response: Response) -> Result<Bytes, HttpError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(HttpError::TooLarge {
                    max_bytes,
                    actual: Some(content_len),
                });
            }
        }

        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_body_error)?;
            let next_len = buffer.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(HttpError::TooLarge {
                    max_bytes,
                    actual: Some(next_len),
                });
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }
}

pub(crate) fn content_type_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn require_success(response: Response) -> Result<Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(HttpError::Status(status.as_u16()))
    }
}

fn map_send_error(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        return HttpError::Timeout(err.to_string());
    }
    if is_disconnect(&err) {
        return HttpError::Disconnected(err.to_string());
    }
    if err.is_builder() {
        let url = err.url().map(Url::to_string).unwrap_or_default();
        return HttpError::invalid_url(&url, &err);
    }
    HttpError::Network(err.to_string())
}

fn map_body_error(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        return HttpError::Timeout(err.to_string());
    }
    HttpError::Payload(err.to_string())
}

/// Walks the source chain looking for a peer that hung up on us.
fn is_disconnect(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_closed() {
                return true;
            }
        }
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        current = err.source();
    }
    false
}
