use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::normalizer::canonical_subject;
use super::CatalogError;
use crate::survey::domain::{Question, ScaleDirection, Section, SubjectLink};

/// Columns the catalog sheet must declare. Their absence is a schema
/// problem and aborts the load before any row is parsed.
pub(crate) const REQUIRED_COLUMNS: [&str; 5] = ["id", "text", "section", "subject", "scale"];

pub(crate) fn parse_questions<R: Read>(reader: R) -> Result<Vec<Question>, CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(CatalogError::MissingColumn(column));
        }
    }

    let mut questions = Vec::new();
    for record in csv_reader.deserialize::<CatalogRow>() {
        questions.push(record?.into_question()?);
    }

    Ok(questions)
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: String,
    text: String,
    section: String,
    subject: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    scale: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    subject2: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    scale2: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    subject3: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    scale3: Option<String>,
}

impl CatalogRow {
    fn into_question(self) -> Result<Question, CatalogError> {
        let section = Section::parse(&self.section).ok_or_else(|| CatalogError::UnknownSection {
            question_id: self.id.clone(),
            value: self.section.clone(),
        })?;

        // The sheet exposes up to three subject/scale slot pairs; slot 1
        // carries unsuffixed column names.
        let slots: [(Option<&str>, Option<&str>); 3] = [
            (Some(self.subject.as_str()), self.scale.as_deref()),
            (self.subject2.as_deref(), self.scale2.as_deref()),
            (self.subject3.as_deref(), self.scale3.as_deref()),
        ];

        let mut links = Vec::new();
        for (subject, scale) in slots {
            let Some(raw) = subject else { continue };
            if raw.trim().is_empty() {
                continue;
            }
            match canonical_subject(raw) {
                Some(subject) => links.push(SubjectLink {
                    subject,
                    direction: scale
                        .map(ScaleDirection::parse)
                        .unwrap_or(ScaleDirection::Normal),
                }),
                None => tracing::warn!(
                    question_id = %self.id,
                    subject = raw,
                    "dropping link to unrecognized subject"
                ),
            }
        }

        if links.is_empty() {
            return Err(CatalogError::MissingSubject {
                question_id: self.id,
            });
        }

        Ok(Question {
            id: self.id,
            text: self.text,
            section,
            links,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
