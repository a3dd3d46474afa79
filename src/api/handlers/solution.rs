use crate::api::dto::solution::{
    NamespaceCleanupResponse, RunSolutionBody, SolutionResponse, SolutionsListResponse,
};
use crate::api::extract::UserId;
use crate::api::routes::AppState;
use crate::error::Result;
use crate::models::{OwnedResources, ResourceKind, SolutionInstance};
use crate::services::RunSolutionResult;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

fn list_response(instances: Vec<SolutionInstance>) -> Result<Json<SolutionsListResponse>> {
    let solutions = instances
        .into_iter()
        .map(SolutionResponse::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(SolutionsListResponse { solutions }))
}

pub async fn list_user_solutions(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<SolutionsListResponse>> {
    list_response(state.solution_service.list_for_user(&user_id).await?)
}

pub async fn list_namespace_solutions(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<SolutionsListResponse>> {
    list_response(state.solution_service.list_for_namespace(&namespace).await?)
}

pub async fn run_solution(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(namespace): Path<String>,
    Json(body): Json<RunSolutionBody>,
) -> Result<(StatusCode, Json<RunSolutionResult>)> {
    let result = state
        .solution_service
        .run_solution(&user_id, body.into_request(namespace))
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn delete_namespace_solutions(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<NamespaceCleanupResponse>> {
    let removed = state
        .solution_service
        .delete_namespace_solutions(&namespace)
        .await?;
    Ok(Json(NamespaceCleanupResponse { removed }))
}

pub async fn get_solution(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<SolutionResponse>> {
    let instance = state.solution_service.get_solution(&namespace, &name).await?;
    Ok(Json(SolutionResponse::try_from(instance)?))
}

pub async fn delete_solution(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<StatusCode> {
    state
        .solution_service
        .delete_solution(&namespace, &name)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn list_solution_deployments(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<OwnedResources>> {
    let owned = state
        .solution_service
        .list_owned(&namespace, &name, ResourceKind::Deployment)
        .await?;
    Ok(Json(owned))
}

pub async fn list_solution_services(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<OwnedResources>> {
    let owned = state
        .solution_service
        .list_owned(&namespace, &name, ResourceKind::Service)
        .await?;
    Ok(Json(owned))
}
