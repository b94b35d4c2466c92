//! 团队管理的 HTTP 处理器

use crate::{
    auth::AuthContext,
    error::AppError,
    extractors::{AppJson, AppPath, ValidatedJson},
    middleware::AppState,
    models::{
        team::{AddMemberRequest, CreateTeamRequest, Team, TeamResponse, UpdateTeamRequest},
        user::UserResponse,
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// 组装带成员列表的团队响应
async fn team_response(state: &AppState, team: Team) -> Result<TeamResponse, AppError> {
    let members = state.stores.teams.members(team.id).await?;

    Ok(TeamResponse {
        id: team.id,
        name: team.name,
        members: members.into_iter().map(UserResponse::from).collect(),
    })
}

async fn find_team(state: &AppState, id: Uuid) -> Result<Team, AppError> {
    state
        .stores
        .teams
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Team"))
}

/// 列出当前用户所在的团队
pub async fn list_teams(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let teams = state
        .stores
        .teams
        .list_for_member(auth_context.user_id)
        .await?;

    let mut responses = Vec::with_capacity(teams.len());
    for team in teams {
        responses.push(team_response(&state, team).await?);
    }

    Ok(Json(responses))
}

/// 创建团队（创建者不会自动成为成员）
pub async fn create_team(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let team = state.stores.teams.create(&req.name, &req.members).await?;

    tracing::info!(team_id = %team.id, created_by = %auth_context.user_id, "Team created");

    Ok((StatusCode::CREATED, Json(team_response(&state, team).await?)))
}

/// 获取团队详情
pub async fn get_team(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let team = find_team(&state, id).await?;

    Ok(Json(team_response(&state, team).await?))
}

/// 重命名团队
pub async fn update_team(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let team = state
        .stores
        .teams
        .rename(id, &req.name)
        .await?
        .ok_or(AppError::NotFound("Team"))?;

    Ok(Json(team_response(&state, team).await?))
}

/// 删除团队（级联删除其作品集）
pub async fn delete_team(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.stores.teams.delete(id).await? {
        return Err(AppError::NotFound("Team"));
    }

    tracing::info!(team_id = %id, deleted_by = %auth_context.user_id, "Team deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// 添加成员（幂等）
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<AddMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    let team = find_team(&state, id).await?;
    state.stores.teams.add_member(team.id, req.user_id).await?;

    Ok(Json(team_response(&state, team).await?))
}

/// 移除成员
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    AppPath((id, user_id)): AppPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let team = find_team(&state, id).await?;
    if state.stores.users.find_by_id(user_id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }
    state.stores.teams.remove_member(team.id, user_id).await?;

    Ok(Json(team_response(&state, team).await?))
}
