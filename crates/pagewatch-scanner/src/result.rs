//! Caller-facing scan result.
//!
//! Callers only ever see a [`ScanResult`]; internal errors are folded into a
//! result code and message here.

use crate::error::ScanError;
use pagewatch_core::{Issue, ScriptRecord, Website};
use serde::{Deserialize, Serialize};

/// Scan finished.
pub const CODE_OK: u16 = 200;
/// Target did not render in time, or the engine refused the call.
pub const CODE_TIMEOUT: u16 = 300;
/// Target URL is unusable.
pub const CODE_INVALID_TARGET: u16 = 404;
/// Caller exceeded its admission budget.
pub const CODE_RATE_LIMITED: u16 = 429;
/// Anything else.
pub const CODE_FAILURE: u16 = 500;

/// Website record returned for a scan, with the page's issues and script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanData {
    /// Website merged with the scanned page state
    #[serde(flatten)]
    pub website: Website,
    /// Issues, possibly limited to a preview
    pub issues: Vec<Issue>,
    /// Generated fix script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptRecord>,
}

/// Outcome of a scan as seen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub data: Option<ScanData>,
    pub code: u16,
    pub success: bool,
    pub message: String,
}

impl ScanResult {
    #[must_use]
    pub fn ok(data: ScanData) -> Self {
        Self {
            data: Some(data),
            code: CODE_OK,
            success: true,
            message: "Success".to_string(),
        }
    }

    /// The target did not render within `ceiling_ms`.
    #[must_use]
    pub fn timeout(ceiling_ms: u64) -> Self {
        Self {
            data: None,
            code: CODE_TIMEOUT,
            success: false,
            message: format!(
                "Website timeout exceeded threshold for scan, website rendered too slow over {ceiling_ms} ms"
            ),
        }
    }

    /// Fold an error into a result code and message.
    #[must_use]
    pub fn from_error(err: &ScanError, ceiling_ms: u64) -> Self {
        let (code, message) = match err {
            ScanError::RenderTimeout => return Self::timeout(ceiling_ms),
            ScanError::InvalidTarget(reason) => (CODE_INVALID_TARGET, reason.clone()),
            ScanError::RateLimited { retry_after } => (
                CODE_RATE_LIMITED,
                format!(
                    "Too many requests, please try again in {} seconds",
                    retry_after.as_secs().max(1)
                ),
            ),
            ScanError::Unreachable(_) => (
                CODE_FAILURE,
                "Scan service unavailable, please try again later".to_string(),
            ),
            _ => (CODE_FAILURE, "An error occurred during the scan".to_string()),
        };

        Self {
            data: None,
            code,
            success: false,
            message,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.code == CODE_TIMEOUT
    }
}
