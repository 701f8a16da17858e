mod normalizer;
mod parser;

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use crate::survey::domain::{Question, Section};

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumn(&'static str),
    DuplicateQuestion(String),
    UnknownSection { question_id: String, value: String },
    MissingSubject { question_id: String },
    TooManySubjects { question_id: String },
    NoSections,
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "failed to read catalog: {}", err),
            CatalogError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogError::MissingColumn(column) => {
                write!(f, "catalog schema is missing the required column '{}'", column)
            }
            CatalogError::DuplicateQuestion(id) => {
                write!(f, "question id {} appears more than once", id)
            }
            CatalogError::UnknownSection { question_id, value } => write!(
                f,
                "question {} names unrecognized section '{}'",
                question_id, value
            ),
            CatalogError::MissingSubject { question_id } => write!(
                f,
                "question {} has no recognized subject link",
                question_id
            ),
            CatalogError::TooManySubjects { question_id } => write!(
                f,
                "question {} links more than three subjects",
                question_id
            ),
            CatalogError::NoSections => {
                write!(f, "catalog contains no questions in any recognized section")
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads catalog sheets into an immutable [`Catalog`].
pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Catalog, CatalogError> {
        Catalog::from_questions(parser::parse_questions(reader)?)
    }
}

/// The immutable set of survey questions plus everything scoring needs
/// precomputed: per-subject link counts (normalization denominators),
/// the derived subject-to-section map, and the present sections in
/// display order.
#[derive(Debug, Clone)]
pub struct Catalog {
    questions: Vec<Question>,
    by_id: HashMap<String, usize>,
    sections: Vec<Section>,
    question_counts: BTreeMap<String, usize>,
    subject_sections: BTreeMap<String, Section>,
}

impl Catalog {
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(questions.len());
        let mut question_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut subject_sections: BTreeMap<String, Section> = BTreeMap::new();

        for (index, question) in questions.iter().enumerate() {
            if question.links.is_empty() {
                return Err(CatalogError::MissingSubject {
                    question_id: question.id.clone(),
                });
            }
            if question.links.len() > 3 {
                return Err(CatalogError::TooManySubjects {
                    question_id: question.id.clone(),
                });
            }
            if by_id.insert(question.id.clone(), index).is_some() {
                return Err(CatalogError::DuplicateQuestion(question.id.clone()));
            }

            for link in &question.links {
                *question_counts.entry(link.subject.clone()).or_insert(0) += 1;
                // First definition wins; later rows never remap a subject.
                subject_sections
                    .entry(link.subject.clone())
                    .or_insert(question.section);
            }
        }

        let sections: Vec<Section> = Section::ordered()
            .into_iter()
            .filter(|section| questions.iter().any(|question| question.section == *section))
            .collect();
        if sections.is_empty() {
            return Err(CatalogError::NoSections);
        }

        Ok(Self {
            questions,
            by_id,
            sections,
            question_counts,
            subject_sections,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.by_id.get(id).map(|index| &self.questions[*index])
    }

    /// Sections actually present in this catalog, in display order.
    /// Absent sections are skipped, never errors.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_questions(&self, section: Section) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|question| question.section == section)
            .collect()
    }

    /// Whole-catalog link occurrences per subject, the normalization
    /// denominator for scoring.
    pub fn question_counts(&self) -> &BTreeMap<String, usize> {
        &self.question_counts
    }

    pub fn subject_section(&self, subject: &str) -> Option<Section> {
        self.subject_sections.get(subject).copied()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::domain::ScaleDirection;
    use std::io::Cursor;

    const HEADER: &str = "id,text,section,subject,scale,subject2,scale2,subject3,scale3\n";

    fn import(rows: &str) -> Result<Catalog, CatalogError> {
        CatalogImporter::from_reader(Cursor::new(format!("{HEADER}{rows}")))
    }

    #[test]
    fn importer_builds_counts_and_section_map() {
        let catalog = import(
            "q1,Reads closely.,basic,korean,normal,,,,\n\
             q2,Enjoys proofs.,basic,math,normal,,,,\n\
             q3,Likes motion problems.,science,physics,normal,math,normal,,\n",
        )
        .expect("catalog imports");

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.sections(), &[Section::Basic, Section::Science]);
        assert_eq!(catalog.question_counts().get("math"), Some(&2));
        assert_eq!(catalog.question_counts().get("physics"), Some(&1));
        assert_eq!(catalog.subject_section("physics"), Some(Section::Science));
    }

    #[test]
    fn importer_expands_abbreviations_and_trims_cells() {
        let catalog = import("q1,Watches tadpoles., science , bio , reverse ,,,,\n")
            .expect("catalog imports");

        let question = catalog.question("q1").expect("question present");
        assert_eq!(question.links.len(), 1);
        assert_eq!(question.links[0].subject, "biology");
        assert_eq!(question.links[0].direction, ScaleDirection::Reverse);
    }

    #[test]
    fn normalizer_admits_only_canonical_subjects() {
        assert_eq!(
            normalizer::canonical_for_tests(" Soc "),
            Some("social-studies".to_string())
        );
        assert_eq!(normalizer::canonical_for_tests("earth"), Some("earth-science".to_string()));
        assert_eq!(normalizer::canonical_for_tests("alchemy"), None);
        assert_eq!(normalizer::canonical_for_tests("  "), None);
    }

    #[test]
    fn missing_required_column_aborts_the_load() {
        let error = CatalogImporter::from_reader(Cursor::new(
            "id,text,section,subject\nq1,Text.,basic,korean\n",
        ))
        .expect_err("schema error expected");

        match error {
            CatalogError::MissingColumn("scale") => {}
            other => panic!("expected missing scale column, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_question_ids_are_rejected() {
        let error = import(
            "q1,First.,basic,korean,normal,,,,\n\
             q1,Second.,basic,math,normal,,,,\n",
        )
        .expect_err("duplicate id expected");

        match error {
            CatalogError::DuplicateQuestion(id) => assert_eq!(id, "q1"),
            other => panic!("expected duplicate question error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_section_is_rejected() {
        let error = import("q1,Text.,arts,korean,normal,,,,\n").expect_err("section error");
        match error {
            CatalogError::UnknownSection { question_id, value } => {
                assert_eq!(question_id, "q1");
                assert_eq!(value, "arts");
            }
            other => panic!("expected unknown section error, got {other:?}"),
        }
    }

    #[test]
    fn question_with_only_unrecognized_subjects_is_rejected() {
        let error = import("q1,Text.,basic,alchemy,normal,,,,\n").expect_err("subject error");
        match error {
            CatalogError::MissingSubject { question_id } => assert_eq!(question_id, "q1"),
            other => panic!("expected missing subject error, got {other:?}"),
        }
    }

    #[test]
    fn empty_sheet_has_no_sections() {
        let error = import("").expect_err("empty catalog");
        match error {
            CatalogError::NoSections => {}
            other => panic!("expected no-sections error, got {other:?}"),
        }
    }

    #[test]
    fn first_section_definition_wins_for_a_subject() {
        // q2 links ethics from the social section after q1 already mapped
        // it via a science-row link; the first mapping sticks.
        let catalog = import(
            "q1,Thinks about research ethics.,science,physics,normal,ethics,normal,,\n\
             q2,Debates fairness.,social,ethics,normal,,,,\n",
        )
        .expect("catalog imports");

        assert_eq!(catalog.subject_section("ethics"), Some(Section::Science));
    }

    #[test]
    fn importer_from_path_propagates_io_errors() {
        let error =
            CatalogImporter::from_path("./does-not-exist.csv").expect_err("expected io error");
        match error {
            CatalogError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
