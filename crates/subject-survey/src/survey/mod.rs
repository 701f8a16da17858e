pub mod attempt;
pub mod catalog;
pub mod domain;
pub mod report;
pub mod scoring;
pub mod service;

pub use attempt::{Attempt, SurveyStep};
pub use catalog::{Catalog, CatalogError, CatalogImporter};
pub use domain::{
    subject_position, Question, ScaleDirection, Section, SubjectLink, SurveyError, SurveyVariant,
    SUBJECT_ORDER,
};
pub use report::{RankedSubjectView, ScoreReport, SectionGroupView};
pub use scoring::{low_variance, score_responses, synthetic_responses, ScoreResult, SubjectScore};
pub use service::{
    AnswerSubmission, AttemptId, AttemptRecord, AttemptStore, QuestionView, SectionView,
    ServiceError, StoreError, SurveyService,
};
