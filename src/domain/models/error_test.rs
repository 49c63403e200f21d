use super::ClientError;

#[test]
fn it_prefers_backend_detail() {
    let err = ClientError::Backend {
        status: 400,
        detail: Some("No database loaded. Please upload files first.".to_string()),
    };

    assert_eq!(
        err.user_message("Failed to get response"),
        "No database loaded. Please upload files first."
    );
}

#[test]
fn it_falls_back_without_detail() {
    let err = ClientError::Backend {
        status: 502,
        detail: None,
    };

    assert_eq!(err.user_message("Upload failed"), "Upload failed");
    insta::assert_snapshot!(err.to_string(), @"Backend failed with status 502: no detail");
}

#[test]
fn it_reports_transport_as_unreachable() {
    let err = ClientError::Transport("connection refused".to_string());

    assert!(err.user_message("Upload failed").starts_with("Backend unreachable"));
    assert!(!err.is_authentication());
}

#[test]
fn it_flags_authentication() {
    let err = ClientError::Authentication(None);

    assert!(err.is_authentication());
    insta::assert_snapshot!(err.to_string(), @"Authentication failed: credentials were rejected");
}
