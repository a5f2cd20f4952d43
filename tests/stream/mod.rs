//! Stream engine tests.

mod classify_test;

/// Verify all public engine types are exported from the library.
#[test]
fn test_all_engine_types_exported() {
    use claude_bridge::classify::{
        ClassifiedError, ClassifyError, ClassifyRule, ErrorCategory, ErrorClassifier, Severity,
    };
    use claude_bridge::protocol::{
        BlockKind, EventDispatcher, FrameReassembler, Framing, ParsedUnit, StreamEvent,
        StreamHandler,
    };
    use claude_bridge::transport::{
        HttpTransport, StreamClient, StreamRequest, TransportError, TransportSignal,
    };

    // Verify types are constructible
    let _ = ErrorClassifier::with_default_rules();
    let _ = FrameReassembler::new(Framing::Lines);
    let _ = StreamRequest::new("hello");
    let _ = HttpTransport::new("http://127.0.0.1:8765/api/stream");
    let _ = StreamClient::new(HttpTransport::new("http://127.0.0.1:8765/api/stream"));

    // Verify error and rule types exist
    let _: fn(&str) -> Result<ClassifyRule, ClassifyError> =
        |pattern| ClassifyRule::new(ErrorCategory::Network, pattern, "test");
    let _: fn() -> TransportError = || TransportError::Timeout;

    // Verify enum variants
    let _ = ParsedUnit::Ignorable;
    let _ = StreamEvent::MessageStop;
    let _ = BlockKind::Text;
    let _ = Severity::Warning;
    let _ = TransportSignal::StreamComplete { exit_code: 0 };

    // Verify the handler trait is implementable with no overrides
    struct Noop;
    impl StreamHandler for Noop {}
    let mut dispatcher = EventDispatcher::new(Noop);
    dispatcher.dispatch(&StreamEvent::MessageStop);
    let _: ClassifiedError = ErrorClassifier::with_default_rules().classify("boom", None);
}
