use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::catalog::Catalog;
use super::domain::{
    Application, ApplicationId, ApplicationStatusView, MentorDecision, NewOpportunity,
    Opportunity, OpportunityId, UserId,
};
use super::error::PortalError;
use super::service::{PlacementPortal, Recommendation};

type Portal<C> = State<Arc<PlacementPortal<C>>>;

/// Router exposing the portal operations over HTTP.
pub fn portal_router<C>(portal: Arc<PlacementPortal<C>>) -> Router
where
    C: Catalog + 'static,
{
    Router::new()
        .route(
            "/api/v1/opportunities",
            get(list_opportunities::<C>).post(post_opportunity::<C>),
        )
        .route(
            "/api/v1/students/:student_id/recommendations",
            get(recommendations::<C>),
        )
        .route(
            "/api/v1/students/:student_id/applications",
            get(student_applications::<C>),
        )
        .route(
            "/api/v1/mentors/pending-approvals",
            get(pending_approvals::<C>),
        )
        .route("/api/v1/applications", post(apply::<C>))
        .route(
            "/api/v1/applications/:application_id",
            get(application::<C>),
        )
        .route(
            "/api/v1/applications/:application_id/mentor-decision",
            post(mentor_decision::<C>),
        )
        .route(
            "/api/v1/applications/:application_id/acknowledge",
            post(acknowledge::<C>),
        )
        .route(
            "/api/v1/applications/:application_id/interview",
            post(schedule_interview::<C>),
        )
        .route(
            "/api/v1/applications/:application_id/offer",
            post(extend_offer::<C>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject::<C>),
        )
        .route(
            "/api/v1/applications/:application_id/complete",
            post(complete::<C>),
        )
        .with_state(portal)
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostOpportunityRequest {
    pub(crate) author_id: UserId,
    #[serde(flatten)]
    pub(crate) opportunity: NewOpportunity,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyRequest {
    pub(crate) student_id: UserId,
    pub(crate) opportunity_id: OpportunityId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MentorDecisionRequest {
    pub(crate) mentor_id: UserId,
    pub(crate) decision: MentorDecision,
    #[serde(default)]
    pub(crate) comments: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorRequest {
    pub(crate) actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InterviewRequest {
    pub(crate) actor_id: UserId,
    pub(crate) date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompleteRequest {
    pub(crate) actor_id: UserId,
    pub(crate) rating: i64,
    #[serde(default)]
    pub(crate) comments: String,
}

pub(crate) async fn list_opportunities<C: Catalog + 'static>(
    State(portal): Portal<C>,
) -> Result<Json<Vec<Opportunity>>, PortalError> {
    Ok(Json(portal.opportunities()?))
}

pub(crate) async fn post_opportunity<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Json(request): Json<PostOpportunityRequest>,
) -> Result<(StatusCode, Json<Opportunity>), PortalError> {
    let opportunity = portal.post_opportunity(&request.author_id, request.opportunity)?;
    Ok((StatusCode::CREATED, Json(opportunity)))
}

pub(crate) async fn recommendations<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<Recommendation>>, PortalError> {
    Ok(Json(portal.recommendations(&UserId(student_id))?))
}

pub(crate) async fn student_applications<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<ApplicationStatusView>>, PortalError> {
    let student_id = UserId(student_id);
    portal.user(&student_id)?;
    let views = portal
        .applications_for_student(&student_id)?
        .iter()
        .map(Application::status_view)
        .collect();
    Ok(Json(views))
}

pub(crate) async fn pending_approvals<C: Catalog + 'static>(
    State(portal): Portal<C>,
) -> Result<Json<Vec<Application>>, PortalError> {
    Ok(Json(portal.pending_mentor_approvals()?))
}

pub(crate) async fn apply<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Json(request): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<Application>), PortalError> {
    let application = portal.apply(&request.student_id, &request.opportunity_id)?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn application<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Path(application_id): Path<String>,
) -> Result<Json<Application>, PortalError> {
    Ok(Json(portal.application(&ApplicationId(application_id))?))
}

pub(crate) async fn mentor_decision<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Path(application_id): Path<String>,
    Json(request): Json<MentorDecisionRequest>,
) -> Result<Json<Application>, PortalError> {
    let application = portal.decide_mentor_approval(
        &ApplicationId(application_id),
        &request.mentor_id,
        request.decision,
        request.comments,
    )?;
    Ok(Json(application))
}

pub(crate) async fn acknowledge<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Path(application_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<Application>, PortalError> {
    Ok(Json(portal.acknowledge(
        &ApplicationId(application_id),
        &request.actor_id,
    )?))
}

pub(crate) async fn schedule_interview<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Path(application_id): Path<String>,
    Json(request): Json<InterviewRequest>,
) -> Result<Json<Application>, PortalError> {
    Ok(Json(portal.schedule_interview(
        &ApplicationId(application_id),
        &request.actor_id,
        request.date,
    )?))
}

pub(crate) async fn extend_offer<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Path(application_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<Application>, PortalError> {
    Ok(Json(portal.extend_offer(
        &ApplicationId(application_id),
        &request.actor_id,
    )?))
}

pub(crate) async fn reject<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Path(application_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<Application>, PortalError> {
    Ok(Json(portal.reject(
        &ApplicationId(application_id),
        &request.actor_id,
    )?))
}

pub(crate) async fn complete<C: Catalog + 'static>(
    State(portal): Portal<C>,
    Path(application_id): Path<String>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<Application>, PortalError> {
    Ok(Json(portal.complete_with_feedback(
        &ApplicationId(application_id),
        &request.actor_id,
        request.rating,
        request.comments,
    )?))
}
