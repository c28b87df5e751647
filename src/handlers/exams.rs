// src/handlers/exams.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::exam::{ExamConfig, StatsResponse, UpdateExamStatusRequest},
    services::{ExamAssembler, ExamLifecycle},
    state::AppState,
    utils::jwt::Claims,
};

/// Assembles a new simulated exam for the caller.
///
/// * Filters the bank with the supplied `FilterSpec`.
/// * Samples up to `question_count` questions uniformly at random.
/// * Stores the exam as `pending` and returns it with 201 Created.
///
/// Returns 422 when no question matches the filters.
pub async fn create_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(config): Json<ExamConfig>,
) -> Result<impl IntoResponse, AppError> {
    config.validate()?;
    let owner_id = claims.user_id()?;

    let assembler = ExamAssembler::new(state.questions.as_ref(), state.exams.as_ref());
    let exam = assembler.assemble(&config, owner_id).await?;

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Lists the caller's exams, newest first.
pub async fn list_exams(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.user_id()?;
    let exams = ExamLifecycle::new(state.exams.as_ref())
        .list_exams(owner_id)
        .await?;

    Ok(Json(exams))
}

/// Fetches one of the caller's exams.
pub async fn get_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.user_id()?;
    let exam = ExamLifecycle::new(state.exams.as_ref())
        .get_exam(id, owner_id)
        .await?;

    Ok(Json(exam))
}

/// Moves an exam to a new status (start, finish or cancel).
/// Returns 409 Conflict for transitions the status machine forbids.
pub async fn update_exam_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateExamStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.user_id()?;
    let exam = ExamLifecycle::new(state.exams.as_ref())
        .transition(id, owner_id, req.status)
        .await?;

    Ok(Json(exam))
}

/// Dashboard counters: questions in the bank and the caller's exams.
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.user_id()?;
    let questions = state.questions.count().await?;
    let exams = ExamLifecycle::new(state.exams.as_ref())
        .count_exams(owner_id)
        .await?;

    Ok(Json(StatsResponse { questions, exams }))
}
