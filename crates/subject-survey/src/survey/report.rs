use serde::Serialize;

use super::catalog::Catalog;
use super::domain::Section;
use super::scoring::ScoreResult;

#[derive(Debug, Clone, Serialize)]
pub struct RankedSubjectView {
    pub rank: usize,
    pub subject: String,
    pub score: f64,
    pub section: Section,
    pub section_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionGroupView {
    pub section: Section,
    pub section_label: &'static str,
    pub subjects: Vec<RankedSubjectView>,
}

/// Presentation projection of a [`ScoreResult`]: the (optionally
/// truncated) ranking plus the same entries partitioned by owning
/// section. Building a report never re-scores or re-sorts; section
/// groups keep the fixed section order and the rank order within.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub ranking: Vec<RankedSubjectView>,
    pub sections: Vec<SectionGroupView>,
    pub low_variance: bool,
}

impl ScoreReport {
    pub fn build(catalog: &Catalog, result: &ScoreResult, top: Option<usize>) -> Self {
        let limit = top.unwrap_or(result.ranking.len());
        let ranking: Vec<RankedSubjectView> = result
            .ranking
            .iter()
            .take(limit)
            .enumerate()
            .filter_map(|(index, entry)| {
                let section = catalog.subject_section(&entry.subject)?;
                Some(RankedSubjectView {
                    rank: index + 1,
                    subject: entry.subject.clone(),
                    score: entry.score,
                    section,
                    section_label: section.label(),
                })
            })
            .collect();

        let sections = catalog
            .sections()
            .iter()
            .filter_map(|section| {
                let subjects: Vec<RankedSubjectView> = ranking
                    .iter()
                    .filter(|entry| entry.section == *section)
                    .cloned()
                    .collect();
                if subjects.is_empty() {
                    None
                } else {
                    Some(SectionGroupView {
                        section: *section,
                        section_label: section.label(),
                        subjects,
                    })
                }
            })
            .collect();

        Self {
            ranking,
            sections,
            low_variance: result.low_variance,
        }
    }
}
