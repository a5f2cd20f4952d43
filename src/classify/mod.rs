//! Error classification and retry policy for bridge failures.
//!
//! Raw failure text from the CLI, the bridge, or the transport is matched
//! against an ordered rule table and folded into a bounded category set,
//! so consumers can branch on category instead of scraping strings.

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Category of classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The Claude Code CLI binary is missing on the bridge host.
    CliNotFound,
    /// Credentials are missing, invalid, or expired.
    Authentication,
    /// The API refused the request due to rate or quota limits.
    RateLimit,
    /// The bridge or API could not be reached.
    Network,
    /// Filesystem or API permission was denied.
    Permission,
    /// The referenced session is gone or invalid.
    Session,
    /// The request or stream took too long.
    Timeout,
    /// A payload or request failed validation.
    Validation,
    /// Nothing matched; the original message is all we know.
    Unknown,
}

/// How loudly a classified error should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Something is broken and needs attention.
    Error,
    /// Transient; the session may still succeed on retry.
    Warning,
}

/// Retry ceiling applied to the backoff schedule.
const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Base delay for rate-limited errors.
const RATE_LIMIT_BASE_MS: u64 = 5_000;

/// Base delay for every other retryable error.
const DEFAULT_BASE_MS: u64 = 1_000;

/// A failure folded into the bounded taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedError {
    /// The raw failure text, verbatim.
    pub original_message: String,
    /// Human-readable summary for this category.
    pub message: String,
    /// Matched category.
    pub category: ErrorCategory,
    /// Display severity.
    pub severity: Severity,
    /// What the user can do about it, when we know.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Documentation link, when one exists for this category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
    /// Whether retrying could ever help.
    pub recoverable: bool,
    /// Machine code that accompanied the failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Error type for classifier construction.
#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    /// Invalid regex pattern.
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A single classification rule: pattern plus the category it implies.
#[derive(Debug, Clone)]
pub struct ClassifyRule {
    category: ErrorCategory,
    pattern: Regex,
    message: String,
    suggestion: Option<String>,
    help_url: Option<String>,
}

impl ClassifyRule {
    /// Create a new rule. Patterns match case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError::InvalidPattern` if the regex is invalid.
    pub fn new(
        category: ErrorCategory,
        pattern: &str,
        message: impl Into<String>,
    ) -> Result<Self, ClassifyError> {
        Ok(Self {
            category,
            pattern: Regex::new(&format!("(?i){pattern}"))?,
            message: message.into(),
            suggestion: None,
            help_url: None,
        })
    }

    /// Attach a user-facing suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach a documentation link.
    #[must_use]
    pub fn with_help_url(mut self, url: impl Into<String>) -> Self {
        self.help_url = Some(url.into());
        self
    }

    /// Check if the failure text matches this rule.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Get the rule category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Get the summary message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the pattern string (for debugging/display).
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Ordered collection of classification rules; first match wins.
#[derive(Debug, Clone, Default)]
pub struct ErrorClassifier {
    rules: Vec<ClassifyRule>,
}

impl ErrorClassifier {
    /// Create an empty classifier. Everything classifies as `Unknown`.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a classifier with the default rule table.
    #[must_use]
    pub fn with_default_rules() -> Self {
        let rules = Self::default_rules()
            .into_iter()
            .filter_map(|result| match result {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to compile default classify rule");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Append a rule. Later rules only see what earlier ones rejected.
    pub fn add_rule(&mut self, rule: ClassifyRule) {
        self.rules.push(rule);
    }

    /// Classify a failure into the bounded taxonomy.
    ///
    /// Rules are tried in table order against the message, then the
    /// machine code if one accompanied it. No match falls back to
    /// `Unknown`, which is always recoverable.
    #[must_use]
    pub fn classify(&self, message: &str, code: Option<&str>) -> ClassifiedError {
        let matched = self
            .rules
            .iter()
            .find(|rule| rule.matches(message) || code.is_some_and(|c| rule.matches(c)));

        match matched {
            Some(rule) => ClassifiedError {
                original_message: message.to_string(),
                message: rule.message.clone(),
                category: rule.category,
                severity: severity_of(rule.category),
                suggestion: rule.suggestion.clone(),
                help_url: rule.help_url.clone(),
                recoverable: recoverable_of(rule.category),
                code: code.map(String::from),
            },
            None => ClassifiedError {
                original_message: message.to_string(),
                message: "An unexpected error occurred".to_string(),
                category: ErrorCategory::Unknown,
                severity: Severity::Error,
                suggestion: None,
                help_url: None,
                recoverable: true,
                code: code.map(String::from),
            },
        }
    }

    /// Check if the classifier has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Get the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Get all rules in match order.
    #[must_use]
    pub fn rules(&self) -> &[ClassifyRule] {
        &self.rules
    }

    /// Build the default rule table. Specific wins over general: the
    /// quota rule sits ahead of the generic rate-limit rule, timeouts
    /// ahead of the broader network rule.
    #[allow(clippy::too_many_lines)]
    fn default_rules() -> Vec<Result<ClassifyRule, ClassifyError>> {
        vec![
            ClassifyRule::new(
                ErrorCategory::CliNotFound,
                r"command not found|enoent|claude.*not (found|installed)|not recognized as an internal",
                "Claude Code CLI not found",
            )
            .map(|rule| {
                rule.with_suggestion("Install the Claude Code CLI and make sure it is on PATH")
                    .with_help_url("https://docs.anthropic.com/en/docs/claude-code/setup")
            }),
            ClassifyRule::new(
                ErrorCategory::Authentication,
                r"authentication|unauthorized|401|invalid api key|api key.*(missing|invalid|expired)|not logged in|login required",
                "Authentication failed",
            )
            .map(|rule| {
                rule.with_suggestion("Run `claude login` or check your API key")
                    .with_help_url("https://docs.anthropic.com/en/docs/claude-code/troubleshooting")
            }),
            ClassifyRule::new(
                ErrorCategory::RateLimit,
                r"quota exceeded|usage limit|out of credits|credit balance",
                "Usage quota exceeded",
            )
            .map(|rule| rule.with_suggestion("Check your plan limits or wait for the quota to reset")),
            ClassifyRule::new(
                ErrorCategory::RateLimit,
                r"rate limit|too many requests|429|overloaded",
                "Rate limited by the API",
            )
            .map(|rule| rule.with_suggestion("Wait a moment before retrying")),
            ClassifyRule::new(
                ErrorCategory::Timeout,
                r"timed? ?out|deadline exceeded",
                "Request timed out",
            )
            .map(|rule| rule.with_suggestion("Check your connection and try again")),
            ClassifyRule::new(
                ErrorCategory::Network,
                r"connection (refused|reset|closed)|network|dns|socket|econn|failed to connect|unreachable",
                "Could not reach the bridge server",
            )
            .map(|rule| rule.with_suggestion("Check that the bridge server is running and reachable")),
            ClassifyRule::new(
                ErrorCategory::Permission,
                r"permission denied|403|forbidden|eacces|operation not permitted",
                "Permission denied",
            )
            .map(|rule| rule.with_suggestion("Check file permissions and API access for this resource")),
            ClassifyRule::new(
                ErrorCategory::Session,
                r"session.*(not found|expired|invalid)|no conversation found|unknown session",
                "Session is no longer available",
            )
            .map(|rule| rule.with_suggestion("Start a new session")),
            ClassifyRule::new(
                ErrorCategory::Validation,
                r"invalid json|malformed|parse error|unexpected (token|end)|missing.*field|invalid request|400",
                "Received data the engine could not understand",
            )
            .map(|rule| rule.with_suggestion("This may indicate a bridge/CLI version mismatch")),
        ]
    }
}

/// Severity implied by a category: transient categories warn, the rest
/// are errors.
#[must_use]
pub fn severity_of(category: ErrorCategory) -> Severity {
    match category {
        ErrorCategory::RateLimit | ErrorCategory::Network | ErrorCategory::Timeout => {
            Severity::Warning
        }
        ErrorCategory::CliNotFound
        | ErrorCategory::Authentication
        | ErrorCategory::Permission
        | ErrorCategory::Session
        | ErrorCategory::Validation
        | ErrorCategory::Unknown => Severity::Error,
    }
}

/// Whether retrying could ever help for a category.
#[must_use]
pub fn recoverable_of(category: ErrorCategory) -> bool {
    !matches!(
        category,
        ErrorCategory::CliNotFound | ErrorCategory::Authentication | ErrorCategory::Permission
    )
}

/// Whether an automatic retry is worthwhile.
///
/// Only transient categories qualify, and never a non-recoverable error.
#[must_use]
pub fn should_retry(error: &ClassifiedError) -> bool {
    error.recoverable
        && matches!(
            error.category,
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::RateLimit
        )
}

/// Backoff before retry `attempt` (1-based): the category base doubles
/// with each attempt, capped at 30 seconds.
#[must_use]
pub fn retry_delay(error: &ClassifiedError, attempt: u32) -> Duration {
    let base = match error.category {
        ErrorCategory::RateLimit => RATE_LIMIT_BASE_MS,
        _ => DEFAULT_BASE_MS,
    };
    let exponent = attempt.saturating_sub(1).min(10);
    let delay = base.saturating_mul(1 << exponent).min(MAX_RETRY_DELAY_MS);
    Duration::from_millis(delay)
}
