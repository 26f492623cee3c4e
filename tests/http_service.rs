//! HTTP Adapter Integration Tests
//!
//! Runs `HttpItemService` and `PasswordLogin` against a wiremock server.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ytsprint::adapters::{HttpItemService, ItemService, ServiceError};
use ytsprint::auth::{AuthError, Authenticator, Identity, PasswordLogin, PasswordMode};
use ytsprint::core::{extract_video_id, Board, SubmissionWorkflow, WorkflowError};
use ytsprint::domain::{
    Attachment, ContentType, ExportFilter, ItemFilter, ItemId, ItemPayload, ItemSubmission, Status,
};

fn identity() -> Identity {
    Identity::email("a@adda247.com")
}

fn service(server: &MockServer) -> HttpItemService {
    HttpItemService::new(format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
}

fn item_json(id: &str, owner: &str) -> serde_json::Value {
    json!({
        "id": id,
        "verificationLink": "https://youtu.be/dQw4w9WgXcQ",
        "youtube_id": "dQw4w9WgXcQ",
        "contentType": "Exam_Information",
        "vertical": "SSC",
        "exam": "CGL",
        "subject": "",
        "status": "Draft",
        "created_by": owner,
        "created_at": "2024-05-01T10:00:00.123456",
    })
}

fn draft_submission() -> ItemSubmission {
    ItemSubmission {
        payload: ItemPayload {
            email: "a@adda247.com".to_string(),
            verification_link: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            content_type: Some(ContentType::ExamInformation),
            vertical: "SSC".to_string(),
            exam: "CGL".to_string(),
            subject: String::new(),
            status: Some(Status::Draft),
            content_subcategory: String::new(),
        },
        video_file: None,
        files: Vec::new(),
    }
}

#[tokio::test]
async fn test_options_sent_with_email_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/options"))
        .and(header("X-User-Email", "a@adda247.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "verticals": ["SSC"],
            "categories_by_vertical": {"SSC": ["CGL"]},
            "subcategories_by_vertical": {"SSC": ["Maths"]},
            "content_subcategories": ["Current Affairs"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = service(&server).fetch_options(&identity()).await.unwrap();

    assert_eq!(options.verticals, vec!["SSC".to_string()]);
    assert_eq!(options.exams_for("SSC"), ["CGL".to_string()]);
    assert_eq!(options.subjects_for("SSC"), ["Maths".to_string()]);
}

#[tokio::test]
async fn test_named_identity_sends_name_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/options"))
        .and(header("X-User-Name", "ravi"))
        .and(header("Authorization", "Bearer t0k3n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verticals": []})))
        .expect(1)
        .mount(&server)
        .await;

    let named = Identity::Named {
        name: "ravi".to_string(),
        token: Some("t0k3n".to_string()),
    };
    let options = service(&server).fetch_options(&named).await.unwrap();
    assert!(options.is_empty());
}

#[tokio::test]
async fn test_list_sends_filter_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/metadata"))
        .and(query_param("vertical", "SSC"))
        .and(query_param("category", "CGL"))
        .and(query_param("user_only", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [item_json("1", "a@adda247.com")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filter = ItemFilter::new()
        .with_vertical("SSC")
        .with_category("CGL")
        .mine_only(true);
    let items = service(&server)
        .list_items(&identity(), &filter)
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, ItemId::new("1"));
    assert!(items[0].subject.is_none());
    assert!(items[0].created_at.is_some());
}

#[tokio::test]
async fn test_list_keeps_rows_with_unrecognised_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/options"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verticals": ["SSC"]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "1", "status": "Draft"},
                {"id": "item_7", "status": "Edited", "contentType": "Podcast"}
            ]
        })))
        .mount(&server)
        .await;

    let items = service(&server)
        .list_items(&identity(), &ItemFilter::new())
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].status, Some(Status::Draft));
    assert_eq!(items[1].id, ItemId::new("item_7"));
    assert_eq!(items[1].status, None);
    assert_eq!(items[1].content_type, None);

    let mut board = Board::new(Arc::new(service(&server)), identity());
    let report = board.refresh().await;
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(board.items().len(), 2);
}

#[tokio::test]
async fn test_undecodable_list_is_not_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/options"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verticals": ["SSC"]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let mut board = Board::new(Arc::new(service(&server)), identity());
    let report = board.refresh().await;

    assert!(report.options_error.is_none());
    assert!(matches!(
        report.items_error,
        Some(WorkflowError::SubmissionFailed { .. })
    ));
    assert!(board.items().is_empty());
    assert_eq!(board.options().verticals, vec!["SSC".to_string()]);
}

#[tokio::test]
async fn test_duplicate_check_parses_owner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/check-duplicate/dQw4w9WgXcQ"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "exists": true,
            "item": item_json("7", "b@studyiq.com"),
            "message": "Video already exists! Uploaded by: b@studyiq.com"
        })))
        .mount(&server)
        .await;

    let video_id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
    let check = service(&server)
        .check_duplicate(&identity(), &video_id)
        .await
        .unwrap();

    assert!(check.exists);
    assert_eq!(check.owner(), "b@studyiq.com");
    assert_eq!(check.existing_id(), Some(&ItemId::new("7")));
}

#[tokio::test]
async fn test_create_without_files_sends_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/item"))
        .and(header("X-User-Email", "a@adda247.com"))
        .and(body_partial_json(json!({
            "email": "a@adda247.com",
            "verificationLink": "https://youtu.be/dQw4w9WgXcQ",
            "contentType": "Exam_Information",
            "status": "Draft"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"item": item_json("9", "a@adda247.com")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let item = service(&server)
        .create_item(&identity(), &draft_submission())
        .await
        .unwrap();
    assert_eq!(item.id, ItemId::new("9"));
}

#[tokio::test]
async fn test_create_with_files_sends_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/item"))
        .respond_with(ResponseTemplate::new(201).set_body_json(item_json("10", "a@adda247.com")))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let video_path = temp.path().join("clip.mp4");
    std::fs::write(&video_path, b"fake video bytes").unwrap();
    let notes_path = temp.path().join("notes.pdf");
    std::fs::write(&notes_path, b"%PDF").unwrap();

    let mut submission = draft_submission();
    submission.payload.status = Some(Status::ReEdit);
    submission.video_file = Some(Attachment::from_path(&video_path).await.unwrap());
    submission.files = vec![Attachment::from_path(&notes_path).await.unwrap()];

    let item = service(&server)
        .create_item(&identity(), &submission)
        .await
        .unwrap();
    assert_eq!(item.id, ItemId::new("10"));

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let content_type = request
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains(r#"name="videoFile"; filename="clip.mp4""#));
    assert!(body.contains(r#"name="files"; filename="notes.pdf""#));
    assert!(body.contains("fake video bytes"));
    assert!(body.contains(r#"name="status""#));
    assert!(body.contains("Re-edit"));
}

#[tokio::test]
async fn test_forbidden_update_maps_to_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/item/9"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Not authorized"})))
        .mount(&server)
        .await;

    let err = service(&server)
        .update_item(&identity(), &ItemId::new("9"), &draft_submission())
        .await
        .unwrap_err();

    match err {
        ServiceError::Forbidden(message) => assert_eq!(message, "Not authorized"),
        other => panic!("expected Forbidden, got {:?}", other),
    }
}

#[tokio::test]
async fn test_payload_too_large_maps_to_413_variant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/item"))
        .respond_with(ResponseTemplate::new(413).set_body_string("Request Entity Too Large"))
        .mount(&server)
        .await;

    let err = service(&server)
        .create_item(&identity(), &draft_submission())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PayloadTooLarge(_)));
}

#[tokio::test]
async fn test_other_failures_keep_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/item"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "Video already exists! Uploaded by: b@studyiq.com"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/item/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = service(&server);
    let err = service
        .create_item(&identity(), &draft_submission())
        .await
        .unwrap_err();
    assert_eq!(
        err.server_message(),
        Some("Video already exists! Uploaded by: b@studyiq.com")
    );

    let err = service
        .delete_item(&identity(), &ItemId::new("3"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Status {
            code: 500,
            message: None
        }
    ));
}

#[tokio::test]
async fn test_unreachable_store_is_network_error() {
    let service = HttpItemService::new("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
    let err = service.fetch_options(&identity()).await.unwrap_err();
    assert!(err.is_network(), "{:?}", err);
}

#[tokio::test]
async fn test_transfers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/export"))
        .and(query_param("vertical", "SSC"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id,vertical\n1,SSC\n"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/bulk-upload"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Successfully uploaded 2 items",
            "items_created": 2
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/item/1/download/uploads/1/clip.mp4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"url": "https://cdn/clip.mp4?sig=x"})),
        )
        .mount(&server)
        .await;

    let service = service(&server);

    let filter = ExportFilter {
        vertical: "SSC".to_string(),
        ..Default::default()
    };
    let csv = service.export_csv(&identity(), &filter).await.unwrap();
    assert_eq!(csv, b"id,vertical\n1,SSC\n");

    let temp = TempDir::new().unwrap();
    let csv_path = temp.path().join("items.csv");
    std::fs::write(&csv_path, "verificationLink,vertical\n").unwrap();
    let summary = service
        .bulk_upload(&identity(), &Attachment::from_path(&csv_path).await.unwrap())
        .await
        .unwrap();
    assert_eq!(summary.items_created, 2);

    let body = String::from_utf8_lossy(&server.received_requests().await.unwrap()[1].body)
        .to_string();
    assert!(body.contains(r#"name="file"; filename="items.csv""#));

    let url = service
        .download_url(&identity(), &ItemId::new("1"), "uploads/1/clip.mp4")
        .await
        .unwrap();
    assert_eq!(url, "https://cdn/clip.mp4?sig=x");
}

#[tokio::test]
async fn test_workflow_classifies_http_403() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/item/1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Not authorized"})))
        .mount(&server)
        .await;

    let service = Arc::new(service(&server));
    let other = Identity::email("b@adda247.com");
    let mut board = Board::new(service.clone(), other.clone());
    let mut workflow = SubmissionWorkflow::new(service, other);

    let item = serde_json::from_value(item_json("1", "a@adda247.com")).unwrap();
    workflow.edit(item);
    let err = workflow.submit(&mut board).await.unwrap_err();

    assert_eq!(
        err,
        WorkflowError::NotAuthorized {
            message: "Not authorized".to_string()
        }
    );
    assert!(workflow.is_open());
}

#[tokio::test]
async fn test_password_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_partial_json(json!({"name": "ravi", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login successful",
            "user": {"name": "ravi"},
            "token": "abc"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_partial_json(json!({"password": "wrong"})))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/signup"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "User already exists"})))
        .mount(&server)
        .await;

    let base = format!("{}/api", server.uri());

    let identity = PasswordLogin::new(&base, "ravi", "secret", PasswordMode::Login)
        .authenticate()
        .await
        .unwrap();
    assert_eq!(
        identity,
        Identity::Named {
            name: "ravi".to_string(),
            token: Some("abc".to_string())
        }
    );

    let err = PasswordLogin::new(&base, "ravi", "wrong", PasswordMode::Login)
        .authenticate()
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let err = PasswordLogin::new(&base, "ravi", "secret", PasswordMode::Signup)
        .authenticate()
        .await
        .unwrap_err();
    match err {
        AuthError::Service(message) => assert_eq!(message, "User already exists"),
        other => panic!("expected Service error, got {:?}", other),
    }
}
