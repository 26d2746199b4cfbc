//! Issue preview truncation for unprivileged callers.

use pagewatch_core::Issue;

/// Issues shown to free-tier and anonymous callers.
pub const DEFAULT_PREVIEW_CAP: usize = 2;

/// Output of [`IssueLimiter::limit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitedIssues {
    pub issues: Vec<Issue>,
    /// True when the list went through truncation
    pub limited_count: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueLimiter {
    cap: usize,
}

impl IssueLimiter {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Keep the first `cap` issues for unprivileged callers.
    ///
    /// Engine order is preserved. Privileged callers get the full list.
    #[must_use]
    pub fn limit(&self, mut issues: Vec<Issue>, privileged: bool) -> LimitedIssues {
        if privileged {
            return LimitedIssues {
                issues,
                limited_count: false,
            };
        }

        issues.truncate(self.cap);
        LimitedIssues {
            issues,
            limited_count: true,
        }
    }
}

impl Default for IssueLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_CAP)
    }
}
