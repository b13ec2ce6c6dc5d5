use learnshelf::types::errors::*;

// === MaterialsError Tests ===

#[test]
fn materials_error_auth_missing_display() {
    assert_eq!(
        MaterialsError::AuthMissing(MaterialAction::Upload).to_string(),
        "You must be logged in to upload materials."
    );
    assert_eq!(
        MaterialsError::AuthMissing(MaterialAction::View).to_string(),
        "You must be logged in to view materials."
    );
    assert_eq!(
        MaterialsError::AuthMissing(MaterialAction::Delete).to_string(),
        "You must be logged in to delete materials."
    );
}

#[test]
fn materials_error_identifier_extraction_display() {
    let err = MaterialsError::IdentifierExtraction {
        action: MaterialAction::Download,
        file_url: "https://example.com".to_string(),
    };
    assert_eq!(err.to_string(), "Could not determine the file ID for download.");

    let err = MaterialsError::IdentifierExtraction {
        action: MaterialAction::View,
        file_url: "https://example.com".to_string(),
    };
    assert_eq!(err.to_string(), "Could not determine the file ID for viewing.");
}

#[test]
fn materials_error_network_keeps_source() {
    use std::error::Error;

    let err = MaterialsError::Network {
        message: "File download failed".to_string(),
        source: ApiError::Status {
            status: 404,
            message: None,
        },
    };
    assert_eq!(err.to_string(), "File download failed");
    let source = err.source().expect("network errors carry their cause");
    assert_eq!(source.to_string(), "Server returned 404: no message");
}

#[test]
fn materials_error_category_display() {
    let err = MaterialsError::Category {
        action: CategoryAction::Update,
        message: "Category not found: 3".to_string(),
    };
    assert_eq!(err.to_string(), "Failed to update category: Category not found: 3");
}

#[test]
fn materials_error_present_is_transparent() {
    let err: MaterialsError = PresentError::Failed("no window".to_string()).into();
    assert_eq!(err.to_string(), "Failed to present file: no window");
}

// === ApiError Tests ===

#[test]
fn api_error_status_display() {
    let err = ApiError::Status {
        status: 413,
        message: Some("File too large".to_string()),
    };
    assert_eq!(err.to_string(), "Server returned 413: File too large");
    assert_eq!(err.server_message(), Some("File too large"));
    assert!(ApiError::Decode("eof".to_string()).server_message().is_none());
}

// === GenerativeError Tests ===

#[test]
fn generative_error_api_display() {
    let err = GenerativeError::Api {
        status: 500,
        body: "internal".to_string(),
    };
    assert_eq!(err.to_string(), "Generative API error 500: internal");
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::InvalidKey("x".to_string()).to_string(),
        "Invalid settings key: x"
    );
    assert_eq!(
        SettingsError::IoError("denied".to_string()).to_string(),
        "Settings I/O error: denied"
    );
}

#[test]
fn action_display_and_purpose() {
    assert_eq!(MaterialAction::Delete.to_string(), "delete");
    assert_eq!(MaterialAction::Delete.purpose(), "deletion");
    assert_eq!(CategoryAction::Add.to_string(), "add");
}
