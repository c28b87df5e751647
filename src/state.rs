use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    config::Config,
    repository::{ExamStore, MemoryStore, PgStore, QuestionRepository, UserRepository},
};

#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<dyn QuestionRepository>,
    pub exams: Arc<dyn ExamStore>,
    pub users: Arc<dyn UserRepository>,
    pub config: Config,
}

impl AppState {
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            questions: store.clone(),
            exams: store.clone(),
            users: store,
            config,
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>, config: Config) -> Self {
        Self {
            questions: store.clone(),
            exams: store.clone(),
            users: store,
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
