/*!
 * Tests for error types and conversions
 */

use cleansound_translate::errors::{AppError, ProviderError, TranslationError};

#[test]
fn test_providerErrorApiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 503,
        message: "Service unavailable".to_string(),
    };
    let display = error.to_string();
    assert!(display.contains("503"));
    assert!(display.contains("Service unavailable"));
}

#[test]
fn test_providerErrorIsTransient_shouldMatchRetryPolicy() {
    assert!(ProviderError::RateLimitExceeded("slow down".into()).is_transient());
    assert!(ProviderError::ConnectionError("reset".into()).is_transient());
    assert!(!ProviderError::RequestFailed("bad url".into()).is_transient());
    assert!(!ProviderError::Timeout(60).is_transient());
    assert!(
        !ProviderError::ApiError {
            status_code: 404,
            message: "missing".into()
        }
        .is_transient()
    );
}

#[test]
fn test_translationErrorTokenizationViolation_shouldReportLengths() {
    let error = TranslationError::TokenizationInvariantViolation {
        expected_len: 120,
        actual_len: 118,
    };
    let display = error.to_string();
    assert!(display.contains("120"));
    assert!(display.contains("118"));
}

#[test]
fn test_translationErrorIsUnsupportedPair_shouldOnlyMatchPairRejections() {
    let pair = TranslationError::ProviderRejected {
        reason: "ja is not available".into(),
        unsupported_pair: true,
    };
    let other = TranslationError::ProviderRejected {
        reason: "bad request".into(),
        unsupported_pair: false,
    };
    assert!(pair.is_unsupported_pair());
    assert!(!other.is_unsupported_pair());
    assert!(!TranslationError::DocumentNotFound("x".into()).is_unsupported_pair());
}

#[test]
fn test_appErrorFromLayerErrors_shouldWrap() {
    let app: AppError = TranslationError::PersistenceConflict("locked".into()).into();
    assert!(matches!(app, AppError::Translation(_)));
    assert!(app.to_string().contains("locked"));

    let app: AppError = ProviderError::ParseError("eof".into()).into();
    assert!(matches!(app, AppError::Provider(_)));

    let app: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "conf.json").into();
    assert!(matches!(app, AppError::File(_)));
}
