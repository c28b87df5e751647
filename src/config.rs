// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Upper bound for `ExamConfig::question_count`.
pub const MAX_EXAM_QUESTIONS: u32 = 100;
/// Upper bound for `ExamConfig::time_limit`, in minutes.
pub const MAX_TIME_LIMIT_MINUTES: u32 = 600;
pub const DEFAULT_QUESTION_COUNT: u32 = 10;
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Shared secret used to verify tokens issued by the identity provider.
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            database_url,
            jwt_secret,
            rust_log,
            port,
        }
    }
}
