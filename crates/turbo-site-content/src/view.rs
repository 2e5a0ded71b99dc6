//! Helpers for request handlers rendering content that may be invalid.

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use turbo_content::{FailureKind, LoadError, Outcome};

/// Content ready to render, or a degraded placeholder.
///
/// Pages keep rendering when a content document is broken; the broken
/// section shows `message` instead.
#[derive(Debug, Clone)]
pub enum ContentView<T> {
    Ready(Arc<T>),
    Degraded {
        message: String,
        error: Arc<LoadError>,
    },
}

impl<T> ContentView<T> {
    /// Build a view from a load outcome, using `message` when it is invalid.
    pub fn from_outcome(outcome: Outcome<T>, message: impl Into<String>) -> Self {
        match outcome {
            Outcome::Valid(content) => Self::Ready(content),
            Outcome::Invalid(error) => Self::Degraded {
                message: message.into(),
                error,
            },
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(content) => Some(content.as_ref()),
            Self::Degraded { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// User-facing message for a degraded view.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Degraded { message, .. } => Some(message.as_str()),
        }
    }

    /// HTTP status a handler serving this view directly should use.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ready(_) => StatusCode::OK,
            Self::Degraded { error, .. } => status_code(error),
        }
    }
}

/// JSON body for a degraded response.
#[derive(Debug, Serialize)]
pub struct DegradedBody<'a> {
    pub message: &'a str,
    pub failure: FailureKind,
}

impl<T> ContentView<T> {
    pub fn degraded_body(&self) -> Option<DegradedBody<'_>> {
        match self {
            Self::Ready(_) => None,
            Self::Degraded { message, error } => Some(DegradedBody {
                message,
                failure: error.kind(),
            }),
        }
    }
}

/// HTTP status for a content failure: 404 when the document does not exist,
/// 500 for everything else.
pub fn status_code(err: &LoadError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
