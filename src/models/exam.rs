// src/models/exam.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    config::{
        DEFAULT_QUESTION_COUNT, DEFAULT_TIME_LIMIT_MINUTES, MAX_EXAM_QUESTIONS,
        MAX_TIME_LIMIT_MINUTES,
    },
    models::question::{FilterSpec, QuestionSnapshot},
};

/// Status of a simulated exam.
///
/// `pending -> in_progress -> completed`, with `cancelled` reachable from
/// either non-terminal state. Nothing moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ExamStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExamStatus::Pending => "pending",
            ExamStatus::InProgress => "in_progress",
            ExamStatus::Completed => "completed",
            ExamStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ExamStatus::Completed | ExamStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: ExamStatus) -> bool {
        matches!(
            (self, next),
            (ExamStatus::Pending, ExamStatus::InProgress)
                | (ExamStatus::InProgress, ExamStatus::Completed)
                | (ExamStatus::Pending, ExamStatus::Cancelled)
                | (ExamStatus::InProgress, ExamStatus::Cancelled)
        )
    }
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExamStatus::Pending),
            "in_progress" => Ok(ExamStatus::InProgress),
            "completed" => Ok(ExamStatus::Completed),
            "cancelled" => Ok(ExamStatus::Cancelled),
            other => Err(format!("unknown exam status '{}'", other)),
        }
    }
}

/// A persisted simulated exam ('simulated_exams' table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedExam {
    pub id: i64,
    pub owner_id: i64,
    pub exam_board: Option<String>,
    pub subject: Option<String>,

    /// Number of questions actually included, which may be lower than requested.
    pub question_count: i32,

    /// Minutes.
    pub time_limit: i32,

    /// Questions in presentation order. Never changes after creation.
    pub questions: Vec<QuestionSnapshot>,

    pub status: ExamStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SimulatedExam {
    /// Moment the time limit runs out, once the exam has been started.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.started_at
            .map(|started| started + Duration::minutes(i64::from(self.time_limit)))
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == ExamStatus::InProgress && self.deadline().is_some_and(|d| now >= d)
    }
}

/// An assembled exam that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewExam {
    pub owner_id: i64,
    pub exam_board: Option<String>,
    pub subject: Option<String>,
    pub time_limit: i32,
    pub questions: Vec<QuestionSnapshot>,
    pub status: ExamStatus,
}

impl NewExam {
    pub fn pending(
        owner_id: i64,
        filter: &FilterSpec,
        time_limit: i32,
        questions: Vec<QuestionSnapshot>,
    ) -> Self {
        Self {
            owner_id,
            exam_board: filter.exam_board.clone(),
            subject: filter.subject.clone(),
            time_limit,
            questions,
            status: ExamStatus::Pending,
        }
    }

    pub fn question_count(&self) -> i32 {
        i32::try_from(self.questions.len()).unwrap_or(i32::MAX)
    }
}

/// Field changes applied by a status transition.
///
/// The store only applies it while the exam is still in `expected`.
#[derive(Debug, Clone, Copy)]
pub struct StatusUpdate {
    pub expected: ExamStatus,
    pub next: ExamStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    pub fn new(expected: ExamStatus, next: ExamStatus, at: DateTime<Utc>) -> Self {
        Self {
            expected,
            next,
            started_at: (next == ExamStatus::InProgress).then_some(at),
            finished_at: next.is_terminal().then_some(at),
        }
    }

    pub fn apply(&self, exam: &mut SimulatedExam) {
        exam.status = self.next;
        if self.started_at.is_some() {
            exam.started_at = self.started_at;
        }
        if self.finished_at.is_some() {
            exam.finished_at = self.finished_at;
        }
    }
}

/// Request body for assembling a new exam.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExamConfig {
    #[serde(default)]
    pub filter: FilterSpec,

    /// Target number of questions; fewer are used when the bank runs short.
    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, max = MAX_EXAM_QUESTIONS, message = "question_count is out of range"))]
    pub question_count: u32,

    /// Minutes.
    #[serde(default = "default_time_limit")]
    #[validate(range(min = 1, max = MAX_TIME_LIMIT_MINUTES, message = "time_limit is out of range"))]
    pub time_limit: u32,
}

fn default_question_count() -> u32 {
    DEFAULT_QUESTION_COUNT
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_MINUTES
}

/// DTO for `PATCH /api/exams/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateExamStatusRequest {
    pub status: ExamStatus,
}

/// Dashboard counters.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub questions: i64,
    pub exams: i64,
}
