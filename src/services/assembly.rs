// src/services/assembly.rs

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use validator::Validate;

use crate::{
    error::ExamError,
    models::{
        exam::{ExamConfig, NewExam, SimulatedExam},
        question::{Question, QuestionSnapshot},
    },
    repository::{ExamStore, QuestionRepository},
    services::{lifecycle::ExamLifecycle, questions::find_questions},
};

/// Picks up to `desired` questions uniformly at random, without replacement.
///
/// The whole candidate list gets a Fisher-Yates shuffle and the prefix is
/// kept, so every subset and every ordering of it is equally likely. The
/// returned order is the presentation order.
pub fn select_questions<R: Rng + ?Sized>(
    mut candidates: Vec<Question>,
    desired: usize,
    rng: &mut R,
) -> Vec<Question> {
    candidates.shuffle(rng);
    candidates.truncate(desired);
    candidates
}

/// Turns an `ExamConfig` into a stored, pending simulated exam.
pub struct ExamAssembler<'a> {
    questions: &'a dyn QuestionRepository,
    lifecycle: ExamLifecycle<'a>,
}

impl<'a> ExamAssembler<'a> {
    pub fn new(questions: &'a dyn QuestionRepository, exams: &'a dyn ExamStore) -> Self {
        Self {
            questions,
            lifecycle: ExamLifecycle::new(exams),
        }
    }

    pub async fn assemble(
        &self,
        config: &ExamConfig,
        owner_id: i64,
    ) -> Result<SimulatedExam, ExamError> {
        let mut rng = StdRng::from_os_rng();
        self.assemble_with_rng(config, owner_id, &mut rng).await
    }

    /// Same as `assemble` with a caller-supplied random source.
    ///
    /// Nothing is written unless sampling succeeded, and the write is a single
    /// insert, so a failure or an abandoned call never leaves a partial exam.
    pub async fn assemble_with_rng<R: Rng + Send>(
        &self,
        config: &ExamConfig,
        owner_id: i64,
        rng: &mut R,
    ) -> Result<SimulatedExam, ExamError> {
        if let Err(e) = config.validate() {
            tracing::info!(owner_id, error = %e, "Rejected exam configuration");
            return Err(ExamError::InvalidConfig(e.to_string()));
        }

        let filter = config.filter.clone().normalized();
        let candidates = find_questions(self.questions, filter.clone()).await?;

        if candidates.is_empty() {
            tracing::info!(owner_id, ?filter, "No questions match exam filters");
            return Err(ExamError::NoCandidates);
        }

        let desired = config.question_count as usize;
        if candidates.len() < desired {
            tracing::warn!(
                owner_id,
                requested = desired,
                available = candidates.len(),
                "Fewer questions available than requested, assembling a shorter exam"
            );
        }

        let selected = select_questions(candidates, desired, rng);
        let snapshots: Vec<QuestionSnapshot> = selected.iter().map(QuestionSnapshot::from).collect();

        let time_limit = i32::try_from(config.time_limit).unwrap_or(i32::MAX);

        self.lifecycle
            .create(NewExam::pending(owner_id, &filter, time_limit, snapshots))
            .await
    }
}
