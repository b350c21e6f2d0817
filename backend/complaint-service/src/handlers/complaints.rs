//! Complaint endpoints
//!
//! POST   /api/v1/complaints                         - Submit a complaint
//! GET    /api/v1/complaints                         - List complaints visible to the actor
//! GET    /api/v1/complaints/track/{complaint_id}    - Look up by citizen-facing reference
//! GET    /api/v1/complaints/{id}                    - Get one complaint
//! PATCH  /api/v1/complaints/{id}/description        - Edit the description
//! POST   /api/v1/complaints/{id}/status             - Change status
//! POST   /api/v1/complaints/{id}/duplicate          - Mark duplicate
//! DELETE /api/v1/complaints/{id}/duplicate          - Clear duplicate mark
//! POST   /api/v1/complaints/{id}/abuse              - Flag abusive
//! DELETE /api/v1/complaints/{id}/abuse              - Clear abuse flag

use crate::error::Result;
use crate::models::{Actor, ComplaintStatus, NewComplaint};
use crate::services::ComplaintService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct DescriptionRequest {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ComplaintStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateRequest {
    #[serde(default)]
    pub original_complaint_id: Option<Uuid>,
}

pub async fn submit_complaint(
    service: web::Data<ComplaintService>,
    actor: Actor,
    body: web::Json<NewComplaint>,
) -> Result<HttpResponse> {
    let receipt = service
        .submit_complaint(body.into_inner(), actor.as_submitter())
        .await?;
    Ok(HttpResponse::Created().json(receipt))
}

pub async fn list_complaints(
    service: web::Data<ComplaintService>,
    actor: Actor,
) -> Result<HttpResponse> {
    let complaints = service.list_complaints(&actor).await?;
    Ok(HttpResponse::Ok().json(complaints))
}

pub async fn get_complaint(
    service: web::Data<ComplaintService>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let complaint = service.get_complaint(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(complaint))
}

pub async fn track_complaint(
    service: web::Data<ComplaintService>,
    actor: Actor,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let complaints = service.track_complaint(&path, &actor).await?;
    Ok(HttpResponse::Ok().json(complaints))
}

pub async fn edit_description(
    service: web::Data<ComplaintService>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<DescriptionRequest>,
) -> Result<HttpResponse> {
    let complaint = service
        .edit_description(path.into_inner(), &body.description, &actor)
        .await?;
    Ok(HttpResponse::Ok().json(complaint))
}

pub async fn transition_status(
    service: web::Data<ComplaintService>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<StatusRequest>,
) -> Result<HttpResponse> {
    let complaint = service
        .transition_status(path.into_inner(), body.status, &actor)
        .await?;
    Ok(HttpResponse::Ok().json(complaint))
}

pub async fn mark_duplicate(
    service: web::Data<ComplaintService>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: Option<web::Json<DuplicateRequest>>,
) -> Result<HttpResponse> {
    let original = body.and_then(|b| b.into_inner().original_complaint_id);
    let complaint = service
        .mark_duplicate(path.into_inner(), original, &actor)
        .await?;
    Ok(HttpResponse::Ok().json(complaint))
}

pub async fn unmark_duplicate(
    service: web::Data<ComplaintService>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let complaint = service.unmark_duplicate(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(complaint))
}

pub async fn flag_abusive(
    service: web::Data<ComplaintService>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let complaint = service.flag_abusive(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(complaint))
}

pub async fn unflag_abusive(
    service: web::Data<ComplaintService>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let complaint = service.unflag_abusive(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(complaint))
}
