// src/repository/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, prelude::FromRow, types::Json};

use crate::{
    error::ExamError,
    models::{
        exam::{ExamStatus, NewExam, SimulatedExam, StatusUpdate},
        question::{FilterSpec, NewQuestion, Question, QuestionSnapshot},
        user::{Role, User},
    },
    repository::{ExamStore, QuestionRepository, UserRepository},
};

const QUESTION_COLUMNS: &str =
    "id, text, alternatives, exam_board, subject, difficulty, year, created_at";

const EXAM_COLUMNS: &str = "id, owner_id, exam_board, subject, question_count, time_limit, \
     questions, status, created_at, started_at, finished_at";

/// PostgreSQL-backed implementation of every store seam.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw 'simulated_exams' row; `status` is TEXT in the database.
#[derive(FromRow)]
struct ExamRow {
    id: i64,
    owner_id: i64,
    exam_board: Option<String>,
    subject: Option<String>,
    question_count: i32,
    time_limit: i32,
    questions: Json<Vec<QuestionSnapshot>>,
    status: String,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<ExamRow> for SimulatedExam {
    type Error = ExamError;

    fn try_from(row: ExamRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<ExamStatus>().map_err(ExamError::Repository)?;
        Ok(SimulatedExam {
            id: row.id,
            owner_id: row.owner_id,
            exam_board: row.exam_board,
            subject: row.subject,
            question_count: row.question_count,
            time_limit: row.time_limit,
            questions: row.questions.0,
            status,
            created_at: row.created_at,
            started_at: row.started_at,
            finished_at: row.finished_at,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            role: Role::parse_lossy(&row.role),
            created_at: row.created_at,
        }
    }
}

fn read_error(context: &str, e: sqlx::Error) -> ExamError {
    tracing::error!("{}: {:?}", context, e);
    ExamError::Repository(e.to_string())
}

fn write_error(context: &str, e: sqlx::Error) -> ExamError {
    tracing::error!("{}: {:?}", context, e);
    ExamError::Persistence(e.to_string())
}

/// Builds the conjunctive `WHERE` clause for a filter.
fn filtered_questions_query(filter: &FilterSpec) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM questions WHERE TRUE", QUESTION_COLUMNS));

    if let Some(board) = &filter.exam_board {
        builder.push(" AND exam_board = ");
        builder.push_bind(board.clone());
    }

    if let Some(subject) = &filter.subject {
        builder.push(" AND subject = ");
        builder.push_bind(subject.clone());
    }

    if let Some(difficulty) = &filter.difficulty {
        builder.push(" AND difficulty = ");
        builder.push_bind(difficulty.clone());
    }

    if let Some(year) = filter.year {
        builder.push(" AND year = ");
        builder.push_bind(year);
    }

    builder
}

#[async_trait]
impl QuestionRepository for PgStore {
    async fn find_questions(&self, filter: &FilterSpec) -> Result<Vec<Question>, ExamError> {
        filtered_questions_query(filter)
            .build_query_as::<Question>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error("Failed to query questions", e))
    }

    async fn list_recent(&self) -> Result<Vec<Question>, ExamError> {
        sqlx::query_as::<_, Question>(&format!(
            "SELECT {} FROM questions ORDER BY created_at DESC, id DESC",
            QUESTION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error("Failed to list questions", e))
    }

    async fn count(&self) -> Result<i64, ExamError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| read_error("Failed to count questions", e))
    }

    async fn insert(&self, question: NewQuestion) -> Result<Question, ExamError> {
        sqlx::query_as::<_, Question>(&format!(
            r#"
            INSERT INTO questions
            (text, alternatives, exam_board, subject, difficulty, year)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        ))
        .bind(question.text)
        .bind(Json(question.alternatives))
        .bind(question.exam_board)
        .bind(question.subject)
        .bind(question.difficulty)
        .bind(question.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("Failed to create question", e))
    }

    async fn delete(&self, id: i64) -> Result<bool, ExamError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error("Failed to delete question", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ExamStore for PgStore {
    async fn insert(&self, exam: NewExam) -> Result<SimulatedExam, ExamError> {
        let question_count = exam.question_count();

        let row = sqlx::query_as::<_, ExamRow>(&format!(
            r#"
            INSERT INTO simulated_exams
            (owner_id, exam_board, subject, question_count, time_limit, questions, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            EXAM_COLUMNS
        ))
        .bind(exam.owner_id)
        .bind(exam.exam_board)
        .bind(exam.subject)
        .bind(question_count)
        .bind(exam.time_limit)
        .bind(Json(exam.questions))
        .bind(exam.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("Failed to insert simulated exam", e))?;

        row.try_into()
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<SimulatedExam>, ExamError> {
        let rows = sqlx::query_as::<_, ExamRow>(&format!(
            r#"
            SELECT {}
            FROM simulated_exams
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
            EXAM_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error("Failed to list simulated exams", e))?;

        rows.into_iter().map(SimulatedExam::try_from).collect()
    }

    async fn find(&self, id: i64) -> Result<Option<SimulatedExam>, ExamError> {
        let row = sqlx::query_as::<_, ExamRow>(&format!(
            "SELECT {} FROM simulated_exams WHERE id = $1",
            EXAM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_error("Failed to fetch simulated exam", e))?;

        row.map(SimulatedExam::try_from).transpose()
    }

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, ExamError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM simulated_exams WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| read_error("Failed to count simulated exams", e))
    }

    async fn update_status(&self, id: i64, update: StatusUpdate) -> Result<bool, ExamError> {
        // Compare-and-set on the previous status so concurrent transitions
        // cannot overwrite each other.
        let result = sqlx::query(
            r#"
            UPDATE simulated_exams
            SET status = $1,
                started_at = COALESCE($2, started_at),
                finished_at = COALESCE($3, finished_at)
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(update.next.as_str())
        .bind(update.started_at)
        .bind(update.finished_at)
        .bind(id)
        .bind(update.expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("Failed to update exam status", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn list_users(&self) -> Result<Vec<User>, ExamError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, role, created_at FROM users ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error("Failed to list users", e))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_role(&self, id: i64, role: Role) -> Result<bool, ExamError> {
        let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error("Failed to update user role", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    #[test]
    fn unconstrained_filter_is_a_full_scan() {
        let mut builder = filtered_questions_query(&FilterSpec::default());
        let sql = builder.build().sql().to_string();
        assert!(sql.ends_with("FROM questions WHERE TRUE"));
    }

    #[test]
    fn each_present_field_adds_an_equality_predicate() {
        let filter = FilterSpec {
            exam_board: Some("CESPE".to_string()),
            subject: None,
            difficulty: Some("hard".to_string()),
            year: Some(2023),
        };
        let mut builder = filtered_questions_query(&filter);
        let sql = builder.build().sql().to_string();
        assert!(sql.contains("AND exam_board = $1"));
        assert!(sql.contains("AND difficulty = $2"));
        assert!(sql.contains("AND year = $3"));
        assert!(!sql.contains("subject ="));
        assert!(!sql.contains("ORDER BY"));
    }
}
