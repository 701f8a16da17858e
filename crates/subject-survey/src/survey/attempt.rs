use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::catalog::Catalog;
use super::domain::{Section, SurveyError, SurveyVariant};

/// Where the respondent currently is in the survey flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "section")]
pub enum SurveyStep {
    Section(Section),
    Complete,
}

/// One respondent's pass through the survey: the chosen variant, the
/// section cursor, and the accumulated responses. All engine operations
/// take the attempt explicitly; there is no ambient session state.
#[derive(Debug, Clone)]
pub struct Attempt {
    variant: SurveyVariant,
    started_at: DateTime<Utc>,
    section_index: usize,
    responses: BTreeMap<String, u8>,
}

impl Attempt {
    pub fn new(variant: SurveyVariant) -> Self {
        Self {
            variant,
            started_at: Utc::now(),
            section_index: 0,
            responses: BTreeMap::new(),
        }
    }

    pub fn variant(&self) -> SurveyVariant {
        self.variant
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Answers recorded so far, keyed by question id. Unanswered
    /// questions are simply absent.
    pub fn responses(&self) -> &BTreeMap<String, u8> {
        &self.responses
    }

    pub fn current(&self, catalog: &Catalog) -> SurveyStep {
        match catalog.sections().get(self.section_index) {
            Some(section) => SurveyStep::Section(*section),
            None => SurveyStep::Complete,
        }
    }

    pub fn is_complete(&self, catalog: &Catalog) -> bool {
        self.section_index >= catalog.sections().len()
    }

    /// Record one answer. Unknown ids and out-of-range values are
    /// integration errors between presentation and engine; re-recording
    /// a question before advancing overwrites the prior value.
    pub fn record(
        &mut self,
        catalog: &Catalog,
        question_id: &str,
        value: u8,
    ) -> Result<(), SurveyError> {
        if catalog.question(question_id).is_none() {
            return Err(SurveyError::UnknownQuestion(question_id.to_owned()));
        }
        if !(1..=5).contains(&value) {
            return Err(SurveyError::InvalidAnswer {
                question_id: question_id.to_owned(),
                value,
            });
        }

        self.responses.insert(question_id.to_owned(), value);
        Ok(())
    }

    /// Advance to the next section once every question in the active
    /// section has an answer. The cursor only ever moves forward, and
    /// the transition to `Complete` happens exactly once.
    pub fn advance(&mut self, catalog: &Catalog) -> Result<SurveyStep, SurveyError> {
        let SurveyStep::Section(section) = self.current(catalog) else {
            return Err(SurveyError::AlreadyComplete);
        };

        let missing = self.missing_in(catalog, section);
        if missing > 0 {
            return Err(SurveyError::IncompleteSection { section, missing });
        }

        self.section_index += 1;
        Ok(self.current(catalog))
    }

    pub fn answered_in(&self, catalog: &Catalog, section: Section) -> usize {
        catalog
            .section_questions(section)
            .iter()
            .filter(|question| self.responses.contains_key(&question.id))
            .count()
    }

    pub fn missing_in(&self, catalog: &Catalog, section: Section) -> usize {
        catalog
            .section_questions(section)
            .iter()
            .filter(|question| !self.responses.contains_key(&question.id))
            .count()
    }

    pub fn section_index(&self) -> usize {
        self.section_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::domain::{Question, ScaleDirection, SubjectLink};

    fn question(id: &str, section: Section, subject: &str) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Item {id}"),
            section,
            links: vec![SubjectLink {
                subject: subject.to_string(),
                direction: ScaleDirection::Normal,
            }],
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_questions(vec![
            question("q1", Section::Basic, "korean"),
            question("q2", Section::Basic, "math"),
            question("q3", Section::Science, "physics"),
        ])
        .expect("catalog builds")
    }

    #[test]
    fn advance_requires_every_answer_in_the_section() {
        let catalog = catalog();
        let mut attempt = Attempt::new(SurveyVariant::Lite);
        attempt.record(&catalog, "q1", 4).expect("records");

        let error = attempt.advance(&catalog).expect_err("section incomplete");
        match error {
            SurveyError::IncompleteSection { section, missing } => {
                assert_eq!(section, Section::Basic);
                assert_eq!(missing, 1);
            }
            other => panic!("expected incomplete section, got {other:?}"),
        }
        assert_eq!(attempt.section_index(), 0);
    }

    #[test]
    fn resubmitting_a_question_overwrites_the_answer() {
        let catalog = catalog();
        let mut attempt = Attempt::new(SurveyVariant::Lite);
        attempt.record(&catalog, "q1", 2).expect("records");
        attempt.record(&catalog, "q1", 5).expect("overwrites");
        assert_eq!(attempt.responses().get("q1"), Some(&5));
    }

    #[test]
    fn answers_are_accepted_in_any_order() {
        let catalog = catalog();
        let mut attempt = Attempt::new(SurveyVariant::Lite);
        attempt.record(&catalog, "q2", 3).expect("records");
        attempt.record(&catalog, "q1", 3).expect("records");
        assert!(matches!(
            attempt.advance(&catalog).expect("advances"),
            SurveyStep::Section(Section::Science)
        ));
    }

    #[test]
    fn completion_happens_exactly_once() {
        let catalog = catalog();
        let mut attempt = Attempt::new(SurveyVariant::Lite);
        for id in ["q1", "q2"] {
            attempt.record(&catalog, id, 3).expect("records");
        }
        attempt.advance(&catalog).expect("into science");
        attempt.record(&catalog, "q3", 3).expect("records");

        assert!(matches!(
            attempt.advance(&catalog).expect("completes"),
            SurveyStep::Complete
        ));
        assert!(attempt.is_complete(&catalog));
        assert!(matches!(
            attempt.advance(&catalog),
            Err(SurveyError::AlreadyComplete)
        ));
    }

    #[test]
    fn record_rejects_unknown_ids_and_out_of_range_values() {
        let catalog = catalog();
        let mut attempt = Attempt::new(SurveyVariant::Lite);

        assert!(matches!(
            attempt.record(&catalog, "nope", 3),
            Err(SurveyError::UnknownQuestion(_))
        ));
        assert!(matches!(
            attempt.record(&catalog, "q1", 0),
            Err(SurveyError::InvalidAnswer { .. })
        ));
        assert!(matches!(
            attempt.record(&catalog, "q1", 6),
            Err(SurveyError::InvalidAnswer { .. })
        ));
        assert!(attempt.responses().is_empty());
    }
}
