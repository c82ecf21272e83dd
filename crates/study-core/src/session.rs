//! Session record
//!
//! The single aggregate holding everything one participant produced. Only the
//! flow engine mutates it; everything else reads it.

use crate::types::{
    Demographics, ExperimentalGroup, ImageRating, OpinionResponse, ParticipantId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated data of one participant's run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    participant_id: ParticipantId,
    group: ExperimentalGroup,
    opinion_responses: Vec<OpinionResponse>,
    image_ratings: Vec<ImageRating>,
    demographics: Option<Demographics>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Start a new record
    #[must_use]
    pub fn new(
        participant_id: ParticipantId,
        group: ExperimentalGroup,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            participant_id,
            group,
            opinion_responses: Vec::new(),
            image_ratings: Vec::new(),
            demographics: None,
            start_time,
            end_time: None,
        }
    }

    /// Participant identifier
    #[inline]
    #[must_use]
    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// Assigned group
    #[inline]
    #[must_use]
    pub fn group(&self) -> ExperimentalGroup {
        self.group
    }

    /// Opinion responses in presentation order
    #[inline]
    #[must_use]
    pub fn opinion_responses(&self) -> &[OpinionResponse] {
        &self.opinion_responses
    }

    /// Image ratings in presentation order
    #[inline]
    #[must_use]
    pub fn image_ratings(&self) -> &[ImageRating] {
        &self.image_ratings
    }

    /// Demographics, once submitted
    #[inline]
    #[must_use]
    pub fn demographics(&self) -> Option<&Demographics> {
        self.demographics.as_ref()
    }

    /// Session start
    #[inline]
    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Session end, once completed
    #[inline]
    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Whether the end timestamp has been stamped
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }

    /// Duration in whole minutes (rounded), 0 while incomplete
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        self.end_time.map_or(0, |end| {
            let millis = (end - self.start_time).num_milliseconds();
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let minutes = (millis as f64 / 60_000.0).round() as i64;
            minutes
        })
    }

    pub(crate) fn set_opinion_responses(&mut self, responses: Vec<OpinionResponse>) {
        self.opinion_responses = responses;
    }

    pub(crate) fn push_rating(&mut self, rating: ImageRating) {
        self.image_ratings.push(rating);
    }

    pub(crate) fn set_demographics(&mut self, demographics: Demographics) {
        self.demographics = Some(demographics);
    }

    /// Stamp the end time once; never earlier than the start
    pub(crate) fn complete(&mut self, at: DateTime<Utc>) -> DateTime<Utc> {
        *self.end_time.get_or_insert(at.max(self.start_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> SessionRecord {
        SessionRecord::new(
            ParticipantId::new("P1"),
            ExperimentalGroup::NoPretestMatching,
            "2024-05-01T10:00:00Z".parse().unwrap(),
        )
    }

    #[test]
    fn end_time_is_stamped_once() {
        let mut r = record();
        let first = r.start_time() + Duration::minutes(12);
        assert_eq!(r.complete(first), first);
        assert_eq!(r.complete(first + Duration::minutes(5)), first);
        assert_eq!(r.end_time(), Some(first));
        assert!(r.is_complete());
    }

    #[test]
    fn end_time_never_precedes_start() {
        let mut r = record();
        let end = r.complete(r.start_time() - Duration::seconds(30));
        assert_eq!(end, r.start_time());
        assert_eq!(r.duration_minutes(), 0);
    }

    #[test]
    fn duration_rounds_to_nearest_minute() {
        let mut r = record();
        assert_eq!(r.duration_minutes(), 0);
        r.complete(r.start_time() + Duration::seconds(9 * 60 + 31));
        assert_eq!(r.duration_minutes(), 10);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["participantId"], "P1");
        assert_eq!(json["group"], "no-pretest-matching");
        assert!(json["endTime"].is_null());
    }
}
