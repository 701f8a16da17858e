use serde::{Deserialize, Serialize};
use std::fmt;

/// Curriculum areas. Each present section is one step of the survey, in
/// this fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Basic,
    SecondLanguage,
    Science,
    Social,
}

impl Section {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Basic,
            Self::SecondLanguage,
            Self::Science,
            Self::Social,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "Core Academics",
            Self::SecondLanguage => "Second Language",
            Self::Science => "Science",
            Self::Social => "Social Studies",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" | "core" => Some(Self::Basic),
            "second-language" | "second_language" | "language" => Some(Self::SecondLanguage),
            "science" => Some(Self::Science),
            "social" => Some(Self::Social),
            _ => None,
        }
    }
}

/// Canonical subject order. Ranking tie-breaks and chart layout both
/// follow the position in this list.
pub const SUBJECT_ORDER: [&str; 14] = [
    "korean",
    "math",
    "english",
    "german",
    "chinese",
    "japanese",
    "physics",
    "chemistry",
    "biology",
    "earth-science",
    "social-studies",
    "history",
    "ethics",
    "geography",
];

pub fn subject_position(subject: &str) -> Option<usize> {
    SUBJECT_ORDER.iter().position(|s| *s == subject)
}

/// Whether a raw answer counts toward or against the linked subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleDirection {
    Normal,
    Reverse,
}

impl ScaleDirection {
    /// Reverse coding for a five-point Likert scale. The `6 - value`
    /// constant is tied to the 1..=5 range and must be re-derived for
    /// any other scale.
    pub const fn transform(self, value: u8) -> u8 {
        match self {
            Self::Normal => value,
            Self::Reverse => 6 - value,
        }
    }

    /// Only the literal `reverse` token reverses; every other cell value
    /// scores normally, matching the original catalog convention.
    pub(crate) fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reverse" | "rev" => Self::Reverse,
            _ => Self::Normal,
        }
    }
}

/// A (subject, direction) pairing attached to a question. A question
/// carries one to three of these; slot order is irrelevant to scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectLink {
    pub subject: String,
    pub direction: ScaleDirection,
}

/// One survey item. Immutable once the catalog is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub section: Section,
    pub links: Vec<SubjectLink>,
}

/// Which catalog the respondent opted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyVariant {
    Lite,
    Full,
}

impl SurveyVariant {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lite => "lite",
            Self::Full => "full",
        }
    }
}

#[derive(Debug)]
pub enum SurveyError {
    UnknownQuestion(String),
    InvalidAnswer { question_id: String, value: u8 },
    IncompleteSection { section: Section, missing: usize },
    AlreadyComplete,
}

impl fmt::Display for SurveyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveyError::UnknownQuestion(id) => {
                write!(f, "question {} is not part of the active catalog", id)
            }
            SurveyError::InvalidAnswer { question_id, value } => write!(
                f,
                "answer {} for question {} is outside the 1..=5 scale",
                value, question_id
            ),
            SurveyError::IncompleteSection { section, missing } => write!(
                f,
                "{} unanswered question(s) remain in the {} section",
                missing,
                section.label()
            ),
            SurveyError::AlreadyComplete => write!(f, "the survey is already complete"),
        }
    }
}

impl std::error::Error for SurveyError {}
