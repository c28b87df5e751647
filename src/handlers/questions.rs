// src/handlers/questions.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError, models::question::FilterSpec, services::find_questions, state::AppState,
};

/// Browses the question bank.
///
/// Query parameters `exam_board`, `subject`, `difficulty` and `year` are all
/// optional; an empty value means "any".
pub async fn list_questions(
    State(state): State<AppState>,
    Query(filter): Query<FilterSpec>,
) -> Result<impl IntoResponse, AppError> {
    let questions = find_questions(state.questions.as_ref(), filter).await?;
    Ok(Json(questions))
}
