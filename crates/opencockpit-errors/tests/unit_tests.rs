//! Unit tests for all error variants.
//!
//! Tests Display implementations, std::error::Error implementations,
//! and severity classification.

use opencockpit_errors::{
    config::ConfigError, decode::DecodeError, observer::ObserverError, severity::ErrorSeverity,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

mod decode_error_tests {
    use super::*;

    #[test]
    fn test_all_variants_display() -> TestResult {
        let variants = vec![
            DecodeError::Empty,
            DecodeError::NotUtf8("invalid utf-8 sequence of 1 bytes from index 0".into()),
            DecodeError::invalid_json(1, 2, "expected value"),
            DecodeError::NotADocument,
            DecodeError::MetadataOverflow { limit: 1000 },
            DecodeError::TruncatedRecord {
                address: 0x7408,
                declared: 8,
                received: 2,
            },
        ];

        for variant in variants {
            let msg = variant.to_string();
            assert!(!msg.is_empty(), "DecodeError should have display message");
            assert_eq!(variant.severity(), ErrorSeverity::Warning);
            assert!(variant.severity().is_recoverable());
        }
        Ok(())
    }

    #[test]
    fn test_std_error_impl() -> TestResult {
        let err = DecodeError::NotADocument;
        let _: &dyn std::error::Error = &err;
        Ok(())
    }

    #[test]
    fn test_overflow_mentions_limit() -> TestResult {
        let err = DecodeError::MetadataOverflow { limit: 1000 };
        assert!(err.to_string().contains("1000"));
        assert_eq!(err.kind(), "metadata_overflow");
        Ok(())
    }
}

mod observer_error_tests {
    use super::*;

    #[test]
    fn test_constructors() -> TestResult {
        assert_eq!(
            ObserverError::type_mismatch("number", "bool"),
            ObserverError::TypeMismatch {
                expected: "number",
                found: "bool"
            }
        );
        assert_eq!(
            ObserverError::failed("boom"),
            ObserverError::Failed("boom".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_type_mismatch_is_a_warning() -> TestResult {
        let err = ObserverError::type_mismatch("register", "text");
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.to_string().contains("register"));
        Ok(())
    }
}

mod config_error_tests {
    use super::*;

    #[test]
    fn test_invalid_display() -> TestResult {
        let err = ConfigError::invalid("bridge.active_tick_ms", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'bridge.active_tick_ms': must be greater than zero"
        );
        Ok(())
    }

    #[test]
    fn test_read_keeps_source() -> TestResult {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ConfigError::read("/etc/opencockpit.yaml", io);
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
        Ok(())
    }
}
