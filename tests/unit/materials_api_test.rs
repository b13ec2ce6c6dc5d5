//! HTTP-level tests for `HttpMaterialsApi` against a wiremock server.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use learnshelf::services::materials_api::{HttpMaterialsApi, MaterialsApiTrait, UploadForm};
use learnshelf::types::errors::ApiError;
use learnshelf::types::material::{FileBlob, UploadDraft};

const TOKEN: &str = "secret";

async fn api() -> (MockServer, HttpMaterialsApi) {
    let server = MockServer::start().await;
    let api = HttpMaterialsApi::new(&format!("{}/", server.uri()));
    (server, api)
}

#[tokio::test]
async fn test_base_url_trailing_slash_is_trimmed() {
    let (server, api) = api().await;
    assert_eq!(api.base_url(), server.uri());
}

#[tokio::test]
async fn test_list_documents_sends_bearer_and_decodes() {
    let (server, api) = api().await;
    Mock::given(method("GET"))
        .and(path("/api/materials/documents"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [
                {"id": 1, "title": "Intro", "category_id": null, "file_size": "10",
                 "file_url": "https://drive.google.com/file/d/abc/view"},
                {"id": "2", "title": "Next", "category_id": 5, "tags": ["x"], "bookmarked": true}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = api.list_documents(TOKEN).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "1");
    assert_eq!(records[0].category_id, None);
    assert_eq!(records[0].file_size, 10);
    assert_eq!(records[1].category_id.as_deref(), Some("5"));
    assert_eq!(records[1].bookmarked, Some(true));
}

#[tokio::test]
async fn test_non_success_status_keeps_server_message() {
    let (server, api) = api().await;
    Mock::given(method("GET"))
        .and(path("/api/materials/documents"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .mount(&server)
        .await;

    let err = api.list_documents(TOKEN).await.unwrap_err();
    match &err {
        ApiError::Status { status, message } => {
            assert_eq!(*status, 401);
            assert_eq!(message.as_deref(), Some("Token expired"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.server_message(), Some("Token expired"));
}

#[tokio::test]
async fn test_non_json_error_body_has_no_message() {
    let (server, api) = api().await;
    Mock::given(method("DELETE"))
        .and(path("/api/materials/7"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = api.delete(TOKEN, "7").await.unwrap_err();
    assert!(err.server_message().is_none());
    assert_eq!(err.to_string(), "Server returned 500: no message");
}

#[tokio::test]
async fn test_delete_success() {
    let (server, api) = api().await;
    Mock::given(method("DELETE"))
        .and(path("/api/materials/7"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    api.delete(TOKEN, "7").await.unwrap();
}

#[tokio::test]
async fn test_delete_encodes_id_as_single_segment() {
    let (server, api) = api().await;
    Mock::given(method("DELETE"))
        .and(path("/api/materials/a%2Fb%3Fx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    api.delete(TOKEN, "a/b?x").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/api/materials/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documents": []})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpMaterialsApi::new(&format!("{}/v1/", server.uri()));
    assert!(api.list_documents(TOKEN).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unparseable_base_url_is_invalid_request() {
    let api = HttpMaterialsApi::new("not a url");
    let err = api.delete(TOKEN, "7").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_upload_posts_multipart_and_returns_document() {
    let (server, api) = api().await;
    Mock::given(method("POST"))
        .and(path("/api/materials/upload"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "document": {"id": 99, "title": "Notes", "category_id": null, "tags": ["a", "b"],
                         "file_name": "notes.pdf", "file_size": 8}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let draft = UploadDraft {
        title: "Notes".to_string(),
        tags: "a, b".to_string(),
        file: Some(FileBlob::new("notes.pdf", Some("application/pdf".to_string()), b"%PDF-1.7".to_vec())),
        ..UploadDraft::default()
    };
    let form = UploadForm::from_draft(&draft).unwrap();
    let record = api.upload(TOKEN, form).await.unwrap();
    assert_eq!(record.id, "99");
    assert_eq!(record.tags, Some(vec!["a".to_string(), "b".to_string()]));

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\"; filename=\"notes.pdf\""));
    assert!(body.contains("name=\"category_id\""));
    assert!(body.contains("null"));
    assert!(body.contains("[\"a\",\"b\"]"));
}

#[tokio::test]
async fn test_download_returns_bytes_and_content_type() {
    let (server, api) = api().await;
    Mock::given(method("GET"))
        .and(path("/api/materials/download/FILE1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF".to_vec()),
        )
        .mount(&server)
        .await;

    let payload = api.download(TOKEN, "FILE1").await.unwrap();
    assert_eq!(&payload.bytes[..], b"%PDF");
    assert_eq!(payload.content_type.as_deref(), Some("application/pdf"));
}

#[tokio::test]
async fn test_view_requests_inline() {
    let (server, api) = api().await;
    Mock::given(method("GET"))
        .and(path("/api/materials/view/FILE2"))
        .and(query_param("inline", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let payload = api.view(TOKEN, "FILE2").await.unwrap();
    assert_eq!(&payload.bytes[..], b"img");
}

#[test]
fn test_upload_form_requires_file() {
    let draft = UploadDraft {
        title: "No file".to_string(),
        ..UploadDraft::default()
    };
    assert!(UploadForm::from_draft(&draft).is_none());
}
