//! Tests for error types

use sysmetrics_store::{Error, ErrorKind};

#[test]
fn test_invalid_environment_error() {
    let error = Error::InvalidEnvironment("environment closed".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("invalid environment"));
    assert!(error_str.contains("environment closed"));
    assert_eq!(error.kind(), ErrorKind::InvalidEnvironment);
}

#[test]
fn test_invalid_configuration_error() {
    let error = Error::InvalidConfiguration("bucket not set".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("invalid configuration"));
    assert!(error_str.contains("system_metrics_bucket"));
    assert_eq!(error.kind(), ErrorKind::InvalidConfiguration);
}

#[test]
fn test_record_not_found_error() {
    let error = Error::RecordNotFound("DNE".to_string());
    assert!(format!("{error}").contains("'DNE' not found"));
    assert_eq!(error.kind(), ErrorKind::RecordNotFound);
}

#[test]
fn test_mixed_record_ids_error() {
    let error = Error::MixedRecordIds {
        bound: "aaa".to_string(),
        received: "bbb".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("aaa"));
    assert!(error_str.contains("bbb"));
    assert_eq!(error.kind(), ErrorKind::MixedRecordIds);
}

#[test]
fn test_empty_stream_error() {
    let error = Error::EmptyStream;
    assert!(format!("{error}").contains("before any system metrics chunk"));
    assert_eq!(error.kind(), ErrorKind::EmptyStream);
}

#[test]
fn test_unsupported_schema_error() {
    let error = Error::UnsupportedSchema(7);
    assert!(format!("{error}").contains("schema version 7"));
    assert_eq!(error.kind(), ErrorKind::UnsupportedSchema);
}

#[test]
fn test_session_ended_error() {
    let error = Error::SessionEnded("chunk received after close".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("session ended"));
    assert!(error_str.contains("after close"));
    assert_eq!(error.kind(), ErrorKind::SessionEnded);
}

#[test]
fn test_storage_write_failed_error() {
    let error = Error::StorageWriteFailed("disk full".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("storage write failed"));
    assert!(error_str.contains("disk full"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    assert!(format!("{error}").contains("IO error"));
    assert_eq!(error.kind(), ErrorKind::Internal);
}

#[test]
fn test_serialization_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("serialization error"));
    assert_eq!(error.kind(), ErrorKind::Internal);
}

#[test]
fn test_support_errors_are_internal() {
    for error in [
        Error::Metadata("x".to_string()),
        Error::Blob("x".to_string()),
        Error::Transport("x".to_string()),
        Error::Config("x".to_string()),
    ] {
        assert_eq!(error.kind(), ErrorKind::Internal, "{error}");
    }
}

#[test]
fn test_error_debug() {
    let error = Error::Cancelled;
    assert!(format!("{error:?}").contains("Cancelled"));
}
