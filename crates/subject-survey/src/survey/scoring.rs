//! Per-subject preference scoring.
//!
//! The pass over a response set goes: accumulate transformed answer
//! values into per-subject totals, divide by the whole-catalog link
//! count for each subject, rank descending with canonical-order tie
//! breaks. Subjects the catalog never probes, or that no recorded
//! answer touches, are omitted from the result rather than reported as
//! zero — a zero would read as "lowest preference" for a subject the
//! respondent was never asked about.

use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

use super::catalog::Catalog;
use super::domain::subject_position;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectScore {
    pub subject: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    /// Normalized score per subject; only subjects with at least one
    /// answered, linked question appear.
    pub per_subject: BTreeMap<String, f64>,
    /// Subjects ordered by score descending, ties broken by canonical
    /// subject order. Deterministic for identical inputs.
    pub ranking: Vec<SubjectScore>,
    /// Advisory flag; never alters the scores themselves.
    pub low_variance: bool,
}

/// Score a fully- or partially-completed response set against the
/// catalog it was collected for.
pub fn score_responses(catalog: &Catalog, responses: &BTreeMap<String, u8>) -> ScoreResult {
    let mut totals: BTreeMap<&str, u32> = BTreeMap::new();

    for (question_id, value) in responses {
        // Ids are validated at record time; a stale id is skipped rather
        // than poisoning the whole result.
        let Some(question) = catalog.question(question_id) else {
            continue;
        };
        for link in &question.links {
            *totals.entry(link.subject.as_str()).or_insert(0) +=
                u32::from(link.direction.transform(*value));
        }
    }

    let mut per_subject = BTreeMap::new();
    for (subject, total) in totals {
        let Some(count) = catalog.question_counts().get(subject) else {
            continue;
        };
        per_subject.insert(subject.to_owned(), f64::from(total) / *count as f64);
    }

    let mut ranking: Vec<SubjectScore> = per_subject
        .iter()
        .map(|(subject, score)| SubjectScore {
            subject: subject.clone(),
            score: *score,
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.score.total_cmp(&a.score).then_with(|| {
            subject_position(&a.subject)
                .unwrap_or(usize::MAX)
                .cmp(&subject_position(&b.subject).unwrap_or(usize::MAX))
        })
    });

    ScoreResult {
        per_subject,
        ranking,
        low_variance: low_variance(responses),
    }
}

/// True when every recorded answer carries the same value. A flat
/// response set usually means the respondent clicked through.
pub fn low_variance(responses: &BTreeMap<String, u8>) -> bool {
    let mut values = responses.values();
    match values.next() {
        Some(first) => values.all(|value| value == first),
        None => false,
    }
}

/// Uniform random full response set, used by the operator preview mode.
/// Synthetic sets flow through the exact same scoring path as real ones.
pub fn synthetic_responses<R: Rng + ?Sized>(
    catalog: &Catalog,
    rng: &mut R,
) -> BTreeMap<String, u8> {
    catalog
        .questions()
        .iter()
        .map(|question| (question.id.clone(), rng.gen_range(1..=5)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::domain::{Question, ScaleDirection, Section, SubjectLink};

    fn link(subject: &str, direction: ScaleDirection) -> SubjectLink {
        SubjectLink {
            subject: subject.to_string(),
            direction,
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_questions(vec![
            Question {
                id: "q1".into(),
                text: "Enjoys proofs.".into(),
                section: Section::Basic,
                links: vec![link("math", ScaleDirection::Normal)],
            },
            Question {
                id: "q2".into(),
                text: "Avoids word problems.".into(),
                section: Section::Basic,
                links: vec![
                    link("math", ScaleDirection::Reverse),
                    link("english", ScaleDirection::Normal),
                ],
            },
        ])
        .expect("catalog builds")
    }

    #[test]
    fn worked_example_matches_hand_computation() {
        let catalog = catalog();
        let responses = BTreeMap::from([("q1".to_string(), 4u8), ("q2".to_string(), 2u8)]);

        let result = score_responses(&catalog, &responses);

        // math: 4 + (6 - 2) = 8 over 2 linked questions; english: 2 over 1.
        assert_eq!(result.per_subject.get("math"), Some(&4.0));
        assert_eq!(result.per_subject.get("english"), Some(&2.0));
        assert_eq!(result.ranking[0].subject, "math");
        assert_eq!(result.ranking[1].subject, "english");
        assert!(!result.low_variance);
    }

    #[test]
    fn partial_response_sets_still_score() {
        let catalog = catalog();
        let responses = BTreeMap::from([("q1".to_string(), 5u8)]);

        let result = score_responses(&catalog, &responses);

        // Denominator stays the whole-catalog count even when only one
        // of the two math questions was answered.
        assert_eq!(result.per_subject.get("math"), Some(&2.5));
        assert!(!result.per_subject.contains_key("english"));
    }

    #[test]
    fn low_variance_requires_at_least_one_answer() {
        assert!(!low_variance(&BTreeMap::new()));
        assert!(low_variance(&BTreeMap::from([("q1".to_string(), 3u8)])));
        assert!(low_variance(&BTreeMap::from([
            ("q1".to_string(), 3u8),
            ("q2".to_string(), 3u8),
        ])));
        assert!(!low_variance(&BTreeMap::from([
            ("q1".to_string(), 3u8),
            ("q2".to_string(), 4u8),
        ])));
    }

    #[test]
    fn synthetic_responses_cover_every_question_in_range() {
        let catalog = catalog();
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let responses = synthetic_responses(&catalog, &mut rng);

        assert_eq!(responses.len(), catalog.len());
        assert!(responses.values().all(|value| (1..=5).contains(value)));
    }
}
