// src/repository/memory.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;

use crate::{
    error::ExamError,
    models::{
        exam::{NewExam, SimulatedExam, StatusUpdate},
        question::{FilterSpec, NewQuestion, Question},
        user::{Role, User},
    },
    repository::{ExamStore, QuestionRepository, UserRepository},
};

/// In-process store holding questions, exams and users.
///
/// Every write happens under a single lock, so each insert or status change
/// is atomic like a single-row statement would be.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    questions: Vec<Question>,
    exams: Vec<SimulatedExam>,
    users: Vec<User>,
    next_question_id: i64,
    next_exam_id: i64,
    next_user_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_question(&self, question: NewQuestion) -> Question {
        let mut state = self.state();
        state.next_question_id += 1;
        let question = Question {
            id: state.next_question_id,
            text: question.text,
            alternatives: Json(question.alternatives),
            exam_board: question.exam_board,
            subject: question.subject,
            difficulty: question.difficulty,
            year: question.year,
            created_at: Utc::now(),
        };
        state.questions.push(question.clone());
        question
    }

    /// Registers an account the way the identity provider would.
    pub fn add_user(&self, email: &str, role: Role) -> User {
        let mut state = self.state();
        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        user
    }

    /// Mutates a stored question in place.
    pub fn edit_question(&self, id: i64, edit: impl FnOnce(&mut Question)) -> bool {
        match self.state().questions.iter_mut().find(|q| q.id == id) {
            Some(question) => {
                edit(question);
                true
            }
            None => false,
        }
    }

    pub fn exam_count(&self) -> usize {
        self.state().exams.len()
    }
}

#[async_trait]
impl QuestionRepository for MemoryStore {
    async fn find_questions(&self, filter: &FilterSpec) -> Result<Vec<Question>, ExamError> {
        Ok(self
            .state()
            .questions
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect())
    }

    async fn list_recent(&self) -> Result<Vec<Question>, ExamError> {
        let mut questions = self.state().questions.clone();
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(questions)
    }

    async fn count(&self) -> Result<i64, ExamError> {
        Ok(self.state().questions.len() as i64)
    }

    async fn insert(&self, question: NewQuestion) -> Result<Question, ExamError> {
        Ok(self.add_question(question))
    }

    async fn delete(&self, id: i64) -> Result<bool, ExamError> {
        let mut state = self.state();
        let before = state.questions.len();
        state.questions.retain(|q| q.id != id);
        Ok(state.questions.len() != before)
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn insert(&self, exam: NewExam) -> Result<SimulatedExam, ExamError> {
        let mut state = self.state();
        state.next_exam_id += 1;
        let stored = SimulatedExam {
            id: state.next_exam_id,
            owner_id: exam.owner_id,
            exam_board: exam.exam_board.clone(),
            subject: exam.subject.clone(),
            question_count: exam.question_count(),
            time_limit: exam.time_limit,
            questions: exam.questions,
            status: exam.status,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };
        state.exams.push(stored.clone());
        Ok(stored)
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<SimulatedExam>, ExamError> {
        let mut exams: Vec<SimulatedExam> = self
            .state()
            .exams
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        exams.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(exams)
    }

    async fn find(&self, id: i64) -> Result<Option<SimulatedExam>, ExamError> {
        Ok(self.state().exams.iter().find(|e| e.id == id).cloned())
    }

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, ExamError> {
        Ok(self
            .state()
            .exams
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .count() as i64)
    }

    async fn update_status(&self, id: i64, update: StatusUpdate) -> Result<bool, ExamError> {
        let mut state = self.state();
        match state
            .exams
            .iter_mut()
            .find(|e| e.id == id && e.status == update.expected)
        {
            Some(exam) => {
                update.apply(exam);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, ExamError> {
        let mut users = self.state().users.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn update_role(&self, id: i64, role: Role) -> Result<bool, ExamError> {
        match self.state().users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
