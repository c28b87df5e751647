// src/services/mod.rs

pub mod assembly;
pub mod lifecycle;
pub mod questions;

pub use assembly::ExamAssembler;
pub use lifecycle::ExamLifecycle;
pub use questions::find_questions;
