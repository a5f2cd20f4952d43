//! Integration tests for error classification and retry policy.

use std::time::Duration;

use claude_bridge::classify::{
    retry_delay, should_retry, ClassifiedError, ErrorCategory, ErrorClassifier, Severity,
};

#[test]
fn classifier_never_leaves_the_closed_category_set() {
    let classifier = ErrorClassifier::with_default_rules();
    let messages = [
        "",
        "    ",
        "complete gibberish",
        "ошибка без категории",
        "emoji 💥 failure",
        "[weird (regex) chars \\ $ ^",
        "rate limit exceeded",
        "claude: command not found",
    ];

    for message in messages {
        let error = classifier.classify(message, None);
        assert!(matches!(
            error.category,
            ErrorCategory::CliNotFound
                | ErrorCategory::Authentication
                | ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Permission
                | ErrorCategory::Session
                | ErrorCategory::Timeout
                | ErrorCategory::Validation
                | ErrorCategory::Unknown
        ));
        assert_eq!(error.original_message, message);
    }
}

#[test]
fn classifier_unmatched_messages_fall_back_to_recoverable_unknown() {
    let classifier = ErrorClassifier::with_default_rules();

    let error = classifier.classify("something nobody anticipated", None);
    assert_eq!(error.category, ErrorCategory::Unknown);
    assert!(error.recoverable);
    assert_eq!(error.severity, Severity::Error);
    assert_eq!(error.original_message, "something nobody anticipated");
    assert!(error.suggestion.is_none());
}

#[test]
fn classifier_default_rules_cover_real_failure_text() {
    let classifier = ErrorClassifier::with_default_rules();
    let cases = [
        ("claude: command not found", ErrorCategory::CliNotFound),
        ("claude is not installed", ErrorCategory::CliNotFound),
        ("401 Unauthorized", ErrorCategory::Authentication),
        ("You are not logged in", ErrorCategory::Authentication),
        ("Your credit balance is too low", ErrorCategory::RateLimit),
        ("429 Too Many Requests", ErrorCategory::RateLimit),
        ("Request timed out", ErrorCategory::Timeout),
        ("deadline exceeded", ErrorCategory::Timeout),
        ("Connection refused (os error 111)", ErrorCategory::Network),
        ("dns lookup failed", ErrorCategory::Network),
        ("EACCES: permission denied", ErrorCategory::Permission),
        ("403 Forbidden", ErrorCategory::Permission),
        ("session not found", ErrorCategory::Session),
        ("No conversation found with that ID", ErrorCategory::Session),
        ("unexpected end of JSON input", ErrorCategory::Validation),
        ("malformed payload", ErrorCategory::Validation),
    ];

    for (message, expected) in cases {
        let error = classifier.classify(message, None);
        assert_eq!(error.category, expected, "message: {message}");
    }
}

#[test]
fn classifier_non_recoverable_categories_carry_a_suggestion() {
    let classifier = ErrorClassifier::with_default_rules();
    let fatal = [
        "claude: command not found",
        "invalid api key",
        "permission denied",
    ];

    for message in fatal {
        let error = classifier.classify(message, None);
        assert!(!error.recoverable, "message: {message}");
        assert!(error.suggestion.is_some(), "message: {message}");
        assert!(!should_retry(&error), "message: {message}");
    }
}

#[test]
fn classifier_table_order_governs_code_matches_too() {
    let classifier = ErrorClassifier::with_default_rules();

    // The CLI-not-found rule sits first and matches the code, so it
    // outranks the later permission rule matching the message.
    let error = classifier.classify("permission denied", Some("ENOENT"));
    assert_eq!(error.category, ErrorCategory::CliNotFound);
    assert_eq!(error.code.as_deref(), Some("ENOENT"));
}

#[test]
fn session_errors_are_recoverable_but_not_retryable() {
    let classifier = ErrorClassifier::with_default_rules();

    let error = classifier.classify("session expired", None);
    assert_eq!(error.category, ErrorCategory::Session);
    assert!(error.recoverable);
    assert!(!should_retry(&error));
}

#[test]
fn retry_is_refused_when_recoverable_is_false_regardless_of_category() {
    let error = ClassifiedError {
        original_message: "network down".to_string(),
        message: "Could not reach the bridge server".to_string(),
        category: ErrorCategory::Network,
        severity: Severity::Warning,
        suggestion: None,
        help_url: None,
        recoverable: false,
        code: None,
    };

    assert!(!should_retry(&error));
}

#[test]
fn retry_delay_treats_attempt_zero_as_the_first() {
    let classifier = ErrorClassifier::with_default_rules();
    let network = classifier.classify("connection refused", None);

    assert_eq!(retry_delay(&network, 0), Duration::from_millis(1_000));
    assert_eq!(retry_delay(&network, 1), Duration::from_millis(1_000));
}

#[test]
fn retry_delay_saturates_for_huge_attempt_numbers() {
    let classifier = ErrorClassifier::with_default_rules();

    let rate_limited = classifier.classify("rate limit exceeded", None);
    assert_eq!(
        retry_delay(&rate_limited, u32::MAX),
        Duration::from_millis(30_000)
    );

    let timeout = classifier.classify("request timed out", None);
    assert_eq!(retry_delay(&timeout, 1_000), Duration::from_millis(30_000));
}

#[test]
fn transient_categories_warn_instead_of_erroring() {
    let classifier = ErrorClassifier::with_default_rules();

    for message in ["rate limit exceeded", "connection refused", "timed out"] {
        let error = classifier.classify(message, None);
        assert_eq!(error.severity, Severity::Warning, "message: {message}");
        assert!(should_retry(&error), "message: {message}");
    }
}

#[test]
fn classified_error_serializes_with_snake_case_and_skips_absent_fields() {
    let classifier = ErrorClassifier::with_default_rules();

    let error = classifier.classify("rate limit exceeded", None);
    let json = serde_json::to_value(&error).unwrap();

    assert_eq!(json["category"], "rate_limit");
    assert_eq!(json["severity"], "warning");
    assert_eq!(json["recoverable"], true);
    assert_eq!(json["original_message"], "rate limit exceeded");
    assert!(json["suggestion"].is_string());
    // The rate-limit rule carries no help URL, and no code accompanied
    // the message.
    assert!(json.get("help_url").is_none());
    assert!(json.get("code").is_none());
}

#[test]
fn classified_error_round_trips_through_json() {
    let classifier = ErrorClassifier::with_default_rules();
    let original = classifier.classify("invalid api key", Some("E401"));

    let json = serde_json::to_string(&original).unwrap();
    let restored: ClassifiedError = serde_json::from_str(&json).unwrap();

    assert_eq!(original, restored);
}
