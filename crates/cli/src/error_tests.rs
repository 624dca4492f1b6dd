// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn test_error_not_initialized_display() {
    let err = Error::NotInitialized;
    assert!(err.to_string().contains("not initialized"));
    assert!(err.to_string().contains("tack init"));
}

#[test]
fn test_error_already_initialized_display() {
    let err = Error::AlreadyInitialized("/srv/shop/.tack".to_string());
    assert!(err.to_string().contains("already initialized"));
    assert!(err.to_string().contains("/srv/shop/.tack"));
}

#[test]
fn test_error_invalid_backend_url_has_hint() {
    let err = Error::InvalidBackendUrl("http://crm.local".to_string());
    let msg = err.to_string();
    assert!(msg.contains("http://crm.local"));
    assert!(msg.contains("ws:// or wss://"));
}

#[test]
fn test_core_errors_are_transparent() {
    let err: Error = tack_core::Error::OperationNotFound("42-0".to_string()).into();
    assert_eq!(
        err.to_string(),
        tack_core::Error::OperationNotFound("42-0".to_string()).to_string()
    );
}

#[test]
fn test_io_error_from() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(_)));
    assert!(err.to_string().contains("denied"));
}
