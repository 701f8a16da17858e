use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::thread_rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::attempt::{Attempt, SurveyStep};
use super::catalog::Catalog;
use super::domain::{Section, SurveyError, SurveyVariant};
use super::report::ScoreReport;
use super::scoring::{score_responses, synthetic_responses};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub String);

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub id: AttemptId,
    pub attempt: Attempt,
}

/// Storage seam for attempts. One record per respondent session; no
/// cross-session sharing.
pub trait AttemptStore: Send + Sync {
    fn insert(&self, record: AttemptRecord) -> Result<(), StoreError>;
    fn update(&self, record: AttemptRecord) -> Result<(), StoreError>;
    fn fetch(&self, id: &AttemptId) -> Result<Option<AttemptRecord>, StoreError>;
    fn remove(&self, id: &AttemptId) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("attempt not found")]
    NotFound,
    #[error("attempt id already in use")]
    Conflict,
}

static ATTEMPT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_attempt_id() -> AttemptId {
    let id = ATTEMPT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AttemptId(format!("attempt-{id:06}"))
}

/// One recorded answer as submitted by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: String,
    pub value: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
}

/// What the presentation layer renders next: the active section with
/// its items and progress counters, or the completion marker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SectionView {
    Section {
        section: Section,
        section_label: &'static str,
        index: usize,
        total: usize,
        answered: usize,
        questions: Vec<QuestionView>,
    },
    Complete,
}

/// Service composing the memoized catalogs, an attempt store, and the
/// scoring engine. Catalogs are loaded once per variant and shared
/// read-only across every attempt.
pub struct SurveyService<S> {
    lite: Arc<Catalog>,
    full: Arc<Catalog>,
    store: Arc<S>,
    preview_password: Option<String>,
}

impl<S> SurveyService<S>
where
    S: AttemptStore + 'static,
{
    pub fn new(
        lite: Arc<Catalog>,
        full: Arc<Catalog>,
        store: Arc<S>,
        preview_password: Option<String>,
    ) -> Self {
        Self {
            lite,
            full,
            store,
            preview_password,
        }
    }

    pub fn catalog(&self, variant: SurveyVariant) -> &Arc<Catalog> {
        match variant {
            SurveyVariant::Lite => &self.lite,
            SurveyVariant::Full => &self.full,
        }
    }

    /// Create a fresh attempt for the chosen variant. Switching variant
    /// means starting over with a new attempt id.
    pub fn start(&self, variant: SurveyVariant) -> Result<(AttemptId, SectionView), ServiceError> {
        let id = next_attempt_id();
        let attempt = Attempt::new(variant);
        let view = self.view_of(&attempt);

        self.store.insert(AttemptRecord {
            id: id.clone(),
            attempt,
        })?;
        info!(attempt = %id.0, variant = variant.label(), "attempt started");
        Ok((id, view))
    }

    /// Drop the attempt entirely; a restart allocates a new id.
    pub fn abandon(&self, id: &AttemptId) -> Result<(), ServiceError> {
        self.store.remove(id)?;
        info!(attempt = %id.0, "attempt abandoned");
        Ok(())
    }

    pub fn section(&self, id: &AttemptId) -> Result<SectionView, ServiceError> {
        let record = self.fetch(id)?;
        Ok(self.view_of(&record.attempt))
    }

    /// Record a batch of answers. Nothing is persisted if any answer is
    /// rejected, so a failed submit leaves the attempt untouched.
    pub fn record_answers(
        &self,
        id: &AttemptId,
        answers: &[AnswerSubmission],
    ) -> Result<SectionView, ServiceError> {
        let mut record = self.fetch(id)?;
        let catalog = self.catalog(record.attempt.variant()).clone();

        for answer in answers {
            record
                .attempt
                .record(&catalog, &answer.question_id, answer.value)?;
        }

        let view = self.view_of(&record.attempt);
        self.store.update(record)?;
        Ok(view)
    }

    pub fn advance(&self, id: &AttemptId) -> Result<SectionView, ServiceError> {
        let mut record = self.fetch(id)?;
        let catalog = self.catalog(record.attempt.variant()).clone();

        record.attempt.advance(&catalog)?;

        let view = self.view_of(&record.attempt);
        self.store.update(record)?;
        Ok(view)
    }

    /// Score a completed attempt. Until the sequencer reaches
    /// `Complete`, the active section is reported as incomplete.
    pub fn result(&self, id: &AttemptId, top: Option<usize>) -> Result<ScoreReport, ServiceError> {
        let record = self.fetch(id)?;
        let catalog = self.catalog(record.attempt.variant());

        if let SurveyStep::Section(section) = record.attempt.current(catalog) {
            let missing = record.attempt.missing_in(catalog, section);
            return Err(SurveyError::IncompleteSection { section, missing }.into());
        }

        let result = score_responses(catalog, record.attempt.responses());
        info!(
            attempt = %id.0,
            subjects = result.ranking.len(),
            low_variance = result.low_variance,
            "attempt scored"
        );
        Ok(ScoreReport::build(catalog, &result, top))
    }

    /// Operator-only bypass: synthesize a uniformly random full response
    /// set and push it through the ordinary scoring path. Gated by the
    /// shared preview password; disabled when none is configured.
    pub fn preview(
        &self,
        variant: SurveyVariant,
        password: Option<&str>,
        top: Option<usize>,
    ) -> Result<ScoreReport, ServiceError> {
        let expected = self
            .preview_password
            .as_deref()
            .ok_or(ServiceError::PreviewDenied)?;
        if password != Some(expected) {
            return Err(ServiceError::PreviewDenied);
        }

        let catalog = self.catalog(variant);
        let responses = synthetic_responses(catalog, &mut thread_rng());
        let result = score_responses(catalog, &responses);
        info!(
            variant = variant.label(),
            answers = responses.len(),
            "preview scored a synthetic attempt"
        );
        Ok(ScoreReport::build(catalog, &result, top))
    }

    fn fetch(&self, id: &AttemptId) -> Result<AttemptRecord, ServiceError> {
        Ok(self.store.fetch(id)?.ok_or(StoreError::NotFound)?)
    }

    fn view_of(&self, attempt: &Attempt) -> SectionView {
        let catalog = self.catalog(attempt.variant());
        match attempt.current(catalog) {
            SurveyStep::Complete => SectionView::Complete,
            SurveyStep::Section(section) => {
                let questions = catalog
                    .section_questions(section)
                    .into_iter()
                    .map(|question| QuestionView {
                        id: question.id.clone(),
                        text: question.text.clone(),
                    })
                    .collect();

                SectionView::Section {
                    section,
                    section_label: section.label(),
                    index: attempt.section_index(),
                    total: catalog.sections().len(),
                    answered: attempt.answered_in(catalog, section),
                    questions,
                }
            }
        }
    }
}

/// Error raised by the survey service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Survey(#[from] SurveyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("preview mode is disabled or the password was rejected")]
    PreviewDenied,
}
