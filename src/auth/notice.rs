//! Request-scoped notices ("flash now").

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient message shown to the user once.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

/// Notices collected while handling a single request.
///
/// A `Flash` is created per request and rendered into that request's response,
/// so nothing carries over to the next request.
#[derive(Debug, Default)]
pub struct Flash {
    notices: Vec<Notice>,
}

impl Flash {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notice for the response currently being built.
    pub fn now(&mut self, severity: Severity, message: impl Into<String>) {
        self.notices.push(Notice {
            severity,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain the notices for rendering.
    pub fn take(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
