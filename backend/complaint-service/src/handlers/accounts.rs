//! Submitter account moderation endpoints
//!
//! GET  /api/v1/accounts/{id}      - Account counters with abuse and ban logs
//! POST /api/v1/accounts/{id}/ban  - Manual ban

use crate::error::Result;
use crate::models::Actor;
use crate::services::ComplaintService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub reason: String,
}

pub async fn get_account(
    service: web::Data<ComplaintService>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let overview = service.account_overview(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(overview))
}

pub async fn ban_account(
    service: web::Data<ComplaintService>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<BanRequest>,
) -> Result<HttpResponse> {
    match service
        .ban_account(path.into_inner(), &body.reason, &actor)
        .await?
    {
        Some(ban) => Ok(HttpResponse::Created().json(ban)),
        None => Ok(HttpResponse::Ok().json(serde_json::json!({ "alreadyBanned": true }))),
    }
}
