// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, NewQuestion},
        user::UpdateRoleRequest,
    },
    state::AppState,
    utils::{html::clean_html, jwt::Claims},
};

/// Lists all users in the system, newest first.
/// Admin only.
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.users.list_users().await?;
    Ok(Json(users))
}

/// Assigns a role to a user.
/// Admin only. Prevents changing one's own role.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let current_user_id = claims.user_id()?;
    if id == current_user_id {
        return Err(AppError::BadRequest("Cannot change your own role".to_string()));
    }

    if !state.users.update_role(id, payload.role).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = id, role = %payload.role, "User role updated");
    Ok(StatusCode::OK)
}

/// Lists the whole question bank, newest first.
/// Admin only.
pub async fn list_questions(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let questions = state.questions.list_recent().await?;
    Ok(Json(questions))
}

/// Creates a new question.
/// Admin only.
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut question = NewQuestion::from(payload);
    question.text = clean_html(&question.text);
    if question.text.trim().is_empty() {
        return Err(AppError::BadRequest("Question text is empty after sanitisation".to_string()));
    }

    let created = state.questions.insert(question).await?;
    tracing::info!(question_id = created.id, "Question created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// Deletes a question by ID.
/// Admin only. Exams that already contain it keep their snapshot.
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.questions.delete(id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    tracing::info!(question_id = id, "Question deleted");
    Ok(StatusCode::NO_CONTENT)
}
