//! CSV rendering of a session record
//!
//! One row per image rating, joined by position with the opinion response at
//! the same index. Responses left over after the last rating get their own
//! rows with the image columns blank. The join is positional only: a rating
//! row's question columns do not describe the question the image came from.

use crate::error::ExportError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use study_core::{ImageRating, OpinionResponse, SessionRecord};

/// Column names, in file order
pub const HEADER: [&str; 13] = [
    "id_uczestnika",
    "grupa",
    "id_pytania",
    "ocena_pytania",
    "sciezka_zdjecia",
    "prawdopodobienstwo_ai",
    "rzeczywiscie_ai",
    "wiek",
    "plec",
    "wyksztalcenie",
    "czas_rozpoczecia",
    "czas_zakonczenia",
    "czas_trwania_minuty",
];

/// Columns repeated on every row
struct SessionColumns {
    participant_id: String,
    group: &'static str,
    age: u32,
    gender: &'static str,
    education: &'static str,
    start: String,
    end: String,
    duration: i64,
}

impl SessionColumns {
    fn of(record: &SessionRecord) -> Self {
        let demographics = record.demographics();
        Self {
            participant_id: record.participant_id().to_string(),
            group: record.group().as_str(),
            age: demographics.map_or(0, |d| d.age),
            gender: demographics.map_or("", |d| d.gender.as_str()),
            education: demographics.map_or("", |d| d.education.as_str()),
            start: timestamp(record.start_time()),
            end: record.end_time().map(timestamp).unwrap_or_default(),
            duration: record.duration_minutes(),
        }
    }

    fn row(&self, response: Option<&OpinionResponse>, rating: Option<&ImageRating>) -> String {
        let fields = [
            self.participant_id.clone(),
            self.group.to_string(),
            response.map(|r| r.question_id.to_string()).unwrap_or_default(),
            response.map(|r| r.rating.to_string()).unwrap_or_default(),
            rating.map(|r| quoted(&r.image_path)).unwrap_or_default(),
            rating.map(|r| r.ai_probability.to_string()).unwrap_or_default(),
            rating.map(|r| r.is_actually_ai.to_string()).unwrap_or_default(),
            self.age.to_string(),
            quoted(self.gender),
            quoted(self.education),
            self.start.clone(),
            self.end.clone(),
            self.duration.to_string(),
        ];
        fields.join(",")
    }
}

fn quoted(value: &str) -> String {
    format!("\"{value}\"")
}

/// ISO-8601 UTC with milliseconds, e.g. `2024-05-01T10:00:00.000Z`
#[must_use]
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render the record; rows are joined by `\n` with no trailing newline
#[must_use]
pub fn export_csv(record: &SessionRecord) -> String {
    let columns = SessionColumns::of(record);
    let responses = record.opinion_responses();
    let ratings = record.image_ratings();

    let mut rows = Vec::with_capacity(1 + ratings.len().max(responses.len()));
    rows.push(HEADER.join(","));
    rows.extend(
        ratings
            .iter()
            .enumerate()
            .map(|(i, rating)| columns.row(responses.get(i), Some(rating))),
    );
    rows.extend(
        responses
            .iter()
            .skip(ratings.len())
            .map(|response| columns.row(Some(response), None)),
    );
    rows.join("\n")
}

/// Export file name for a record
#[must_use]
pub fn file_name(record: &SessionRecord) -> String {
    format!("experiment-data-{}.csv", record.participant_id())
}

/// Write the CSV into `dir`, creating it if needed
pub fn write_csv(record: &SessionRecord, dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(file_name(record));
    fs::write(&path, export_csv(record)).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!("Exported session {} to {}", record.participant_id(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_has_millis_and_z() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(timestamp(at), "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn header_row_is_exact() {
        assert_eq!(
            HEADER.join(","),
            "id_uczestnika,grupa,id_pytania,ocena_pytania,sciezka_zdjecia,prawdopodobienstwo_ai,\
             rzeczywiscie_ai,wiek,plec,wyksztalcenie,czas_rozpoczecia,czas_zakonczenia,czas_trwania_minuty"
        );
    }

    #[test]
    fn fresh_record_is_header_only() {
        let record = SessionRecord::new(
            study_core::ParticipantId::new("P1"),
            study_core::ExperimentalGroup::PretestMatching,
            Utc::now(),
        );
        assert_eq!(export_csv(&record), HEADER.join(","));
        assert_eq!(file_name(&record), "experiment-data-P1.csv");
    }
}
