use crate::api::dto::template::{
    BranchQuery, CreateTemplateBody, TemplateEnvResponse, TemplateResourcesResponse,
    TemplateResponse, TemplatesListResponse,
};
use crate::api::extract::UserRole;
use crate::api::routes::AppState;
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

pub async fn list_templates(
    State(state): State<AppState>,
    role: UserRole,
) -> Result<Json<TemplatesListResponse>> {
    let templates = state.template_service.list_templates(role.admin).await?;
    let data = templates.into_iter().map(TemplateResponse::from).collect();
    Ok(Json(TemplatesListResponse { data }))
}

pub async fn create_template(
    State(state): State<AppState>,
    role: UserRole,
    Json(body): Json<CreateTemplateBody>,
) -> Result<(StatusCode, Json<TemplateResponse>)> {
    role.require_admin()?;
    let template = state.template_service.create_template(body.into()).await?;
    Ok((StatusCode::CREATED, Json(TemplateResponse::from(template))))
}

pub async fn get_template_env(
    State(state): State<AppState>,
    Path(template): Path<String>,
    Query(query): Query<BranchQuery>,
) -> Result<Json<TemplateEnvResponse>> {
    let env = state
        .template_service
        .template_env(&template, query.branch.as_deref())
        .await?;
    Ok(Json(TemplateEnvResponse { env }))
}

pub async fn get_template_resources(
    State(state): State<AppState>,
    Path(template): Path<String>,
    Query(query): Query<BranchQuery>,
) -> Result<Json<TemplateResourcesResponse>> {
    let resources = state
        .template_service
        .template_resources(&template, query.branch.as_deref())
        .await?;
    Ok(Json(TemplateResourcesResponse { resources }))
}

pub async fn activate_template(
    State(state): State<AppState>,
    role: UserRole,
    Path(template): Path<String>,
) -> Result<StatusCode> {
    role.require_admin()?;
    state.template_service.activate_template(&template).await?;
    Ok(StatusCode::OK)
}

pub async fn deactivate_template(
    State(state): State<AppState>,
    role: UserRole,
    Path(template): Path<String>,
) -> Result<StatusCode> {
    role.require_admin()?;
    state.template_service.deactivate_template(&template).await?;
    Ok(StatusCode::OK)
}

pub async fn delete_template(
    State(state): State<AppState>,
    role: UserRole,
    Path(template): Path<String>,
) -> Result<StatusCode> {
    role.require_admin()?;
    state.template_service.delete_template(&template).await?;
    Ok(StatusCode::NO_CONTENT)
}
