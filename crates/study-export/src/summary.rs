//! Completion summary shown to the participant

use std::fmt;
use study_core::{average_rating, ExperimentalGroup, ParticipantId, SessionRecord};

/// Figures reported on the completion screen
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    /// Participant identifier
    pub participant_id: ParticipantId,
    /// Assigned group
    pub group: ExperimentalGroup,
    /// Questionnaire answers given
    pub responses: usize,
    /// Images rated
    pub ratings: usize,
    /// Rounded minutes, 0 while incomplete
    pub duration_minutes: i64,
    /// Mean opinion rating, `None` without responses
    pub average_rating: Option<f64>,
    /// Mean AI-probability estimate, `None` without ratings
    pub average_probability: Option<f64>,
}

impl SessionSummary {
    /// Summarize a record
    #[must_use]
    pub fn from_record(record: &SessionRecord) -> Self {
        let responses = record.opinion_responses();
        let ratings = record.image_ratings();
        let average_probability = (!ratings.is_empty()).then(|| {
            let sum: u32 = ratings.iter().map(|r| u32::from(r.ai_probability)).sum();
            #[allow(clippy::cast_precision_loss)]
            let mean = f64::from(sum) / ratings.len() as f64;
            mean
        });

        Self {
            participant_id: record.participant_id().clone(),
            group: record.group(),
            responses: responses.len(),
            ratings: ratings.len(),
            duration_minutes: record.duration_minutes(),
            average_rating: (!responses.is_empty()).then(|| average_rating(responses)),
            average_probability,
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Podsumowanie badania")?;
        writeln!(f, "  Uczestnik:              {}", self.participant_id)?;
        writeln!(f, "  Grupa:                  {}", self.group)?;
        writeln!(f, "  Odpowiedzi na pytania:  {}", self.responses)?;
        writeln!(f, "  Ocenione zdjęcia:       {}", self.ratings)?;
        if let Some(avg) = self.average_rating {
            writeln!(f, "  Średnia ocena pytań:    {avg:.2}")?;
        }
        if let Some(avg) = self.average_probability {
            writeln!(f, "  Średnie prawd. AI:      {avg:.1}%")?;
        }
        if self.duration_minutes > 0 {
            writeln!(f, "  Czas trwania:           {} minut", self.duration_minutes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn empty_record_has_no_averages() {
        let record = SessionRecord::new(
            ParticipantId::new("P1"),
            ExperimentalGroup::AllImagesNoQuestionnaire,
            Utc::now(),
        );
        let summary = SessionSummary::from_record(&record);
        assert_eq!(summary.responses, 0);
        assert_eq!(summary.average_rating, None);
        assert_eq!(summary.average_probability, None);
        assert!(!summary.to_string().contains("Czas trwania"));
    }
}
