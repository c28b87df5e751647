// src/services/questions.rs

use crate::{
    error::ExamError,
    models::question::{FilterSpec, Question},
    repository::QuestionRepository,
};

/// Returns every question matching `filter`, in storage order.
///
/// Empty filter values are dropped first, so `exam_board=""` means "any
/// board". Values outside the known vocabulary simply match nothing.
pub async fn find_questions(
    repo: &dyn QuestionRepository,
    filter: FilterSpec,
) -> Result<Vec<Question>, ExamError> {
    let filter = filter.normalized();
    let questions = repo.find_questions(&filter).await?;
    tracing::debug!(?filter, matches = questions.len(), "Question bank queried");
    Ok(questions)
}
