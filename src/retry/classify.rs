//! Map Google API client errors onto retry classifications.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use thiserror::Error;

/// High-level classification of a failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The service answered with a status worth retrying (429, 5xx, rate-limited 403).
    #[error("HTTP {code} (transient): {message}")]
    Transient { code: u16, message: String },

    /// The service rejected the request for good.
    #[error("HTTP {code}: {message}")]
    Permanent { code: u16, message: String },

    /// The request never got a complete answer.
    #[error("{kind}: {message}")]
    Transport { kind: TransportKind, message: String },

    /// Client-side failure with no status (missing token, decode error, ...).
    #[error("{message}")]
    Other { message: String },
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Transient { .. } | ErrorKind::Transport { .. }
        )
    }

    /// HTTP status, when the service responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ErrorKind::Transient { code, .. } | ErrorKind::Permanent { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    ConnectionReset,
    UnexpectedEof,
    Network,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::ConnectionReset => write!(f, "connection reset"),
            TransportKind::UnexpectedEof => write!(f, "unexpected end of stream"),
            TransportKind::Network => write!(f, "network error"),
        }
    }
}

const RATE_LIMIT_MESSAGE: &str = "Rate Limit Exceeded";

/// Classify an HTTP status and the service's error message.
pub fn classify_status(code: u16, message: &str) -> ErrorKind {
    let message = message.to_string();
    match code {
        429 | 500..=599 => ErrorKind::Transient { code, message },
        // Drive reports per-user quota exhaustion as a 403
        403 if message.eq_ignore_ascii_case(RATE_LIMIT_MESSAGE) => {
            ErrorKind::Transient { code, message }
        }
        _ => ErrorKind::Permanent { code, message },
    }
}

/// Classify an error returned by a `google-sheets4` / `google-drive3` call.
pub fn classify(err: &google_sheets4::Error) -> ErrorKind {
    use google_sheets4::Error as ApiError;

    match err {
        ApiError::BadRequest(body) => classify_body(body),
        // Only non-JSON error bodies end up here and reading one needs an
        // await, so the reason phrase stands in for the message. A quota 403
        // without a JSON body therefore stays permanent.
        ApiError::Failure(response) => {
            let status = response.status();
            classify_status(status.as_u16(), status.canonical_reason().unwrap_or_default())
        }
        ApiError::HttpError(e) => ErrorKind::Transport {
            kind: transport_kind(e).unwrap_or(TransportKind::Network),
            message: e.to_string(),
        },
        ApiError::Io(e) => match transport_kind(e) {
            Some(kind) => ErrorKind::Transport {
                kind,
                message: e.to_string(),
            },
            None => ErrorKind::Other {
                message: e.to_string(),
            },
        },
        other => ErrorKind::Other {
            message: other.to_string(),
        },
    }
}

/// Error bodies look like `{"error": {"code": 429, "message": "...", ...}}`.
fn classify_body(body: &serde_json::Value) -> ErrorKind {
    let error = &body["error"];
    let code = error["code"]
        .as_u64()
        .and_then(|code| u16::try_from(code).ok());

    match code {
        Some(code) => classify_status(code, error["message"].as_str().unwrap_or_default()),
        None => ErrorKind::Other {
            message: body.to_string(),
        },
    }
}

/// Walk the source chain looking for a network-level cause.
fn transport_kind(err: &(dyn StdError + 'static)) -> Option<TransportKind> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionReset => return Some(TransportKind::ConnectionReset),
                io::ErrorKind::UnexpectedEof => return Some(TransportKind::UnexpectedEof),
                io::ErrorKind::ConnectionAborted
                | io::ErrorKind::ConnectionRefused
                | io::ErrorKind::NotConnected
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::TimedOut => return Some(TransportKind::Network),
                _ => {}
            }
        }

        let text = e.to_string().to_ascii_lowercase();
        if text.contains("connection reset") {
            return Some(TransportKind::ConnectionReset);
        }
        if text.contains("unexpected eof") || text.contains("unexpected end of file") {
            return Some(TransportKind::UnexpectedEof);
        }

        current = e.source();
    }
    None
}
