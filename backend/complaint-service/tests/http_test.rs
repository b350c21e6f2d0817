mod common;

use actix_web::{http::StatusCode, test, web, App};
use common::harness;
use complaint_service::handlers::{self, actor::*};
use complaint_service::models::{Administration, ComplaintStatus, Governorate};
use serde_json::{json, Value};
use uuid::Uuid;

macro_rules! app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::from($h.service.clone()))
                .configure(handlers::configure),
        )
        .await
    };
}

fn submission(email: &str, description: &str) -> Value {
    json!({
        "submitterName": "Karim",
        "email": email,
        "governorate": Governorate::Sohag.as_str(),
        "administration": Administration::Education.as_str(),
        "description": description,
        "attachments": { "images": [], "location": { "latitude": 26.55, "longitude": 31.69 } }
    })
}

#[actix_rt::test]
async fn test_health_and_metrics() {
    let h = harness();
    let app = app!(h);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_submit_list_and_transition() {
    let h = harness();
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/complaints")
        .insert_header((ACTOR_EMAIL, "karim@example.com"))
        .set_json(submission("karim@example.com", "School roof leaking"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let receipt: Value = test::read_body_json(resp).await;
    let id = receipt["id"].as_str().unwrap().to_string();
    let reference = receipt["complaintId"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/complaints/track/{}", reference))
        .insert_header((ACTOR_EMAIL, "karim@example.com"))
        .to_request();
    let found: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["status"], ComplaintStatus::Submitted.as_str());

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/complaints/{}/status", id))
        .insert_header((ACTOR_ID, Uuid::new_v4().to_string()))
        .insert_header((ACTOR_ROLE, "department"))
        .insert_header((ACTOR_ADMINISTRATION, Administration::Education.as_str()))
        .insert_header((ACTOR_GOVERNORATE, Governorate::Sohag.as_str()))
        .set_json(json!({ "status": ComplaintStatus::InProgress.as_str() }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["status"], ComplaintStatus::InProgress.as_str());
    assert_eq!(updated["complaintId"], reference.as_str());
}

#[actix_rt::test]
async fn test_governorate_staff_transition_is_forbidden() {
    let h = harness();
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/complaints")
        .set_json(submission("a@example.com", "No teachers"))
        .to_request();
    let receipt: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/complaints/{}/status", receipt["id"].as_str().unwrap()))
        .insert_header((ACTOR_ROLE, "governorate"))
        .insert_header((ACTOR_GOVERNORATE, Governorate::Sohag.as_str()))
        .set_json(json!({ "status": ComplaintStatus::Rejected.as_str() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "unauthorized");
}

#[actix_rt::test]
async fn test_abusive_and_banned_responses() {
    let h = harness();
    h.classifier.script("insults", 0.99);
    let app = app!(h);
    let account = Uuid::new_v4();

    let mut codes = Vec::new();
    for _ in 0..4 {
        let req = test::TestRequest::post()
            .uri("/api/v1/complaints")
            .insert_header((ACTOR_ID, account.to_string()))
            .insert_header((ACTOR_EMAIL, "loud@example.com"))
            .set_json(submission("loud@example.com", "insults"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        codes.push((status, body["code"].as_str().unwrap().to_string()));
    }

    assert_eq!(codes[0], (StatusCode::UNPROCESSABLE_ENTITY, "abusive_content".to_string()));
    assert_eq!(codes[1], (StatusCode::UNPROCESSABLE_ENTITY, "abusive_content".to_string()));
    assert_eq!(codes[2], (StatusCode::FORBIDDEN, "banned".to_string()));
    assert_eq!(codes[3], (StatusCode::FORBIDDEN, "banned".to_string()));

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/accounts/{}", account))
        .insert_header((ACTOR_ROLE, "moderator"))
        .to_request();
    let overview: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(overview["account"]["banned"], true);
    assert_eq!(overview["abuseAttempts"].as_array().unwrap().len(), 3);
    assert_eq!(overview["bans"].as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_moderator_duplicate_and_ban_endpoints() {
    let h = harness();
    let app = app!(h);
    let moderator = Uuid::new_v4().to_string();
    let account = Uuid::new_v4();

    let mut ids = Vec::new();
    for text in ["Broken bench", "Bench still broken"] {
        let req = test::TestRequest::post()
            .uri("/api/v1/complaints")
            .insert_header((ACTOR_ID, account.to_string()))
            .insert_header((ACTOR_EMAIL, "bench@example.com"))
            .set_json(submission("bench@example.com", text))
            .to_request();
        let receipt: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(receipt["id"].as_str().unwrap().to_string());
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/complaints/{}/duplicate", ids[1]))
        .insert_header((ACTOR_ID, moderator.clone()))
        .insert_header((ACTOR_ROLE, "admin"))
        .set_json(json!({ "originalComplaintId": ids[0] }))
        .to_request();
    let marked: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(marked["isDuplicate"], true);
    assert_eq!(marked["reviewed"], true);
    assert_eq!(marked["originalComplaintId"], ids[0].as_str());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/complaints/{}/duplicate", ids[1]))
        .insert_header((ACTOR_ROLE, "moderator"))
        .to_request();
    let cleared: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cleared["isDuplicate"], false);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/accounts/{}/ban", account))
        .insert_header((ACTOR_ID, moderator.clone()))
        .insert_header((ACTOR_ROLE, "moderator"))
        .set_json(json!({ "reason": "Spam" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/accounts/{}/ban", account))
        .insert_header((ACTOR_ROLE, "moderator"))
        .set_json(json!({ "reason": "Spam again" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["alreadyBanned"], true);
}

#[actix_rt::test]
async fn test_bad_payload_is_bad_request() {
    let h = harness();
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/complaints")
        .set_json(json!({ "submitterName": "X", "governorate": "Atlantis" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
