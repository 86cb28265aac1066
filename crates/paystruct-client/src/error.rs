//! Error type for `paystruct-client`.

use thiserror::Error;

/// Every failure the client can report. Cloneable so a cache can keep its
/// last error and hand copies to every reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
  /// No token is stored; the request was never sent.
  #[error("not signed in")]
  Unauthorized,

  #[error("session expired, sign in again")]
  Expired,

  /// Non-2xx response. `message` is the server's, or a per-resource fallback.
  #[error("{message}")]
  Http { status: u16, message: String },

  #[error("{0}")]
  Format(String),

  #[error("request failed: {0}")]
  Transport(String),

  #[error(transparent)]
  Validation(#[from] paystruct_core::Error),

  /// The fetch was abandoned by its owner; the result was discarded.
  #[error("request cancelled")]
  Cancelled,

  #[error("token storage: {0}")]
  Storage(String),
}

impl ClientError {
  /// Toast text for a failed create: `"{status} | {message}"` for HTTP
  /// failures, the plain message otherwise.
  pub fn toast(&self) -> String {
    match self {
      ClientError::Http { status, message } => format!("{status} | {message}"),
      other => other.to_string(),
    }
  }
}

impl From<reqwest::Error> for ClientError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      ClientError::Format(err.to_string())
    } else {
      ClientError::Transport(err.to_string())
    }
  }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
