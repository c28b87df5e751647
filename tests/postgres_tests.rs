// tests/postgres_tests.rs
//
// Runs against a live database:
// DATABASE_URL=postgres://... cargo test -- --ignored

use simulado::{
    error::ExamError,
    models::{
        exam::{ExamConfig, ExamStatus},
        question::{FilterSpec, NewQuestion},
    },
    repository::{PgStore, QuestionRepository},
    services::{ExamAssembler, ExamLifecycle},
};
use sqlx::postgres::PgPoolOptions;

async fn connect() -> PgStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    PgStore::new(pool)
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn assemble_and_transition_round_trip() {
    let store = connect().await;
    // Unique board so reruns do not see rows from earlier runs
    let board = format!("BOARD_{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default());

    for i in 0..4 {
        store
            .insert(NewQuestion {
                text: format!("Questão {}", i),
                alternatives: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                exam_board: board.clone(),
                subject: "Direito Penal".to_string(),
                difficulty: "easy".to_string(),
                year: 2023,
            })
            .await
            .unwrap();
    }

    let config = ExamConfig {
        filter: FilterSpec {
            exam_board: Some(board.clone()),
            subject: Some("Direito Penal".to_string()),
            ..Default::default()
        },
        question_count: 10,
        time_limit: 60,
    };

    let owner_id = 4242;
    let exam = ExamAssembler::new(&store, &store)
        .assemble(&config, owner_id)
        .await
        .unwrap();
    assert_eq!(exam.question_count, 4);
    assert_eq!(exam.status, ExamStatus::Pending);

    let lifecycle = ExamLifecycle::new(&store);
    let listed = lifecycle.list_exams(owner_id).await.unwrap();
    assert_eq!(listed[0].id, exam.id);
    assert_eq!(listed[0].questions, exam.questions);

    lifecycle
        .transition(exam.id, owner_id, ExamStatus::InProgress)
        .await
        .unwrap();
    lifecycle
        .transition(exam.id, owner_id, ExamStatus::Completed)
        .await
        .unwrap();
    let err = lifecycle
        .transition(exam.id, owner_id, ExamStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, ExamError::IllegalTransition { .. }));

    let missing = FilterSpec {
        exam_board: Some(format!("{}_MISSING", board)),
        ..Default::default()
    };
    assert!(store.find_questions(&missing).await.unwrap().is_empty());
}
