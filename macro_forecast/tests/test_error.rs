use macro_forecast::ForecastError;
use macro_math::MathError;
use polars::prelude::PolarsError;
use std::io;

#[test]
fn test_error_conversion() {
    let err = ForecastError::from(io::Error::new(io::ErrorKind::NotFound, "file not found"));
    assert!(matches!(err, ForecastError::Io(_)));

    let err = ForecastError::from(PolarsError::ComputeError("bad frame".into()));
    match err {
        ForecastError::Polars(reason) => assert!(reason.contains("bad frame")),
        other => panic!("expected Polars variant, got {other:?}"),
    }

    let err = ForecastError::from(MathError::InvalidInput("NaN".to_string()));
    assert!(matches!(err, ForecastError::Math(_)));

    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(ForecastError::from(json), ForecastError::Json(_)));
}

#[test]
fn test_error_display() {
    let err = ForecastError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
    let message = err.to_string();
    assert!(message.contains("IO error"));
    assert!(message.contains("denied"));

    let err = ForecastError::InsufficientHistory {
        indicator: "GDP".to_string(),
        required: 3,
        actual: 2,
    };
    assert_eq!(err.indicator(), Some("GDP"));
    assert!(err.to_string().contains("need 3 observations, have 2"));

    assert_eq!(ForecastError::Polars("x".to_string()).indicator(), None);
}
