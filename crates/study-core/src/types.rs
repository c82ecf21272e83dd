//! Core types for a study session
//!
//! Defines the data the flow engine works with:
//! - Participant identity and experimental group
//! - Opinion responses and questionnaire items
//! - Image stimuli and the ratings elicited for them
//! - Demographic answers
//! - The steps a participant walks through

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Unique participant identifier (`P` followed by a ULID)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap an existing identifier string
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an identifier from a ULID
    #[inline]
    #[must_use]
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(format!("P{ulid}"))
    }

    /// Get identifier as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Experimental condition, fixed at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperimentalGroup {
    /// Pretest, then images with matching polarity
    PretestMatching,
    /// Pretest, then images with opposite polarity
    PretestNotMatching,
    /// Questionnaire, then images with matching polarity
    NoPretestMatching,
    /// Questionnaire, then images with opposite polarity
    NoPretestNotMatching,
    /// Every image of both polarities, no questionnaire
    AllImagesNoQuestionnaire,
}

impl ExperimentalGroup {
    /// All groups, in assignment order
    pub const ALL: [ExperimentalGroup; 5] = [
        ExperimentalGroup::PretestMatching,
        ExperimentalGroup::PretestNotMatching,
        ExperimentalGroup::NoPretestMatching,
        ExperimentalGroup::NoPretestNotMatching,
        ExperimentalGroup::AllImagesNoQuestionnaire,
    ];

    /// Wire name of the group
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PretestMatching => "pretest-matching",
            Self::PretestNotMatching => "pretest-not-matching",
            Self::NoPretestMatching => "no-pretest-matching",
            Self::NoPretestNotMatching => "no-pretest-not-matching",
            Self::AllImagesNoQuestionnaire => "all-images-no-questionnaire",
        }
    }

    /// Bucketing polarity, `None` for the all-images group
    #[must_use]
    pub const fn polarity(&self) -> Option<Polarity> {
        match self {
            Self::PretestMatching | Self::NoPretestMatching => Some(Polarity::Matching),
            Self::PretestNotMatching | Self::NoPretestNotMatching => Some(Polarity::Opposite),
            Self::AllImagesNoQuestionnaire => None,
        }
    }

    /// Whether the group rates the fixed pretest images first
    #[inline]
    #[must_use]
    pub const fn has_pretest(&self) -> bool {
        matches!(self, Self::PretestMatching | Self::PretestNotMatching)
    }
}

impl fmt::Display for ExperimentalGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperimentalGroup {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s.trim())
            .ok_or_else(|| InputError::UnknownGroup(s.to_string()))
    }
}

/// How agreement maps onto image buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    /// High agreement shows matching images
    Matching,
    /// High agreement shows not-matching images
    Opposite,
}

impl Polarity {
    /// Bucket for a response with the given agreement
    #[must_use]
    pub const fn bucket(&self, agreement: Agreement) -> Bucket {
        match (self, agreement) {
            (Self::Matching, Agreement::High) | (Self::Opposite, Agreement::Low) => {
                Bucket::Matching
            }
            (Self::Matching, Agreement::Low) | (Self::Opposite, Agreement::High) => {
                Bucket::NotMatching
            }
        }
    }
}

/// Agreement class of an opinion rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Agreement {
    /// Rating 3 or 4
    High,
    /// Rating 1 or 2
    Low,
}

impl Agreement {
    /// Classify a 1-4 rating
    #[inline]
    #[must_use]
    pub const fn from_rating(rating: u8) -> Self {
        if rating >= 3 {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// Image folder family a stimulus is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// `matching-*` folders
    Matching,
    /// `not-matching-*` folders
    NotMatching,
}

impl Bucket {
    /// Folder prefix
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Matching => "matching",
            Self::NotMatching => "not-matching",
        }
    }
}

/// Questionnaire item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable item identifier
    pub id: u32,
    /// Statement shown to the participant
    pub statement: String,
}

/// Answer to one questionnaire item (rating on a 1-4 scale)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpinionResponse {
    /// Question answered
    pub question_id: u32,
    /// Rating, 1 = strongly disagree, 4 = strongly agree
    pub rating: u8,
}

impl OpinionResponse {
    /// Lowest rating on the scale
    pub const MIN_RATING: u8 = 1;
    /// Highest rating on the scale
    pub const MAX_RATING: u8 = 4;
    /// Slider position before the participant touches it
    pub const DEFAULT_RATING: u8 = 2;

    /// Create response
    #[inline]
    #[must_use]
    pub const fn new(question_id: u32, rating: u8) -> Self {
        Self {
            question_id,
            rating,
        }
    }

    /// Agreement class of this response
    #[inline]
    #[must_use]
    pub const fn agreement(&self) -> Agreement {
        Agreement::from_rating(self.rating)
    }
}

/// Image shown to the participant with its hidden ground truth
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStimulus {
    /// Path of the image asset
    pub image_path: String,
    /// Whether the image is actually AI-generated
    #[serde(rename = "isActuallyAI")]
    pub is_actually_ai: bool,
}

impl ImageStimulus {
    /// Create stimulus
    #[inline]
    #[must_use]
    pub fn new(image_path: impl Into<String>, is_actually_ai: bool) -> Self {
        Self {
            image_path: image_path.into(),
            is_actually_ai,
        }
    }
}

/// Elicited AI-probability estimate for one stimulus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRating {
    /// Path of the rated image
    pub image_path: String,
    /// Estimate in percent, 0 = surely real, 100 = surely AI
    pub ai_probability: u8,
    /// Ground truth copied from the stimulus
    #[serde(rename = "isActuallyAI")]
    pub is_actually_ai: bool,
}

impl ImageRating {
    /// Highest probability value
    pub const MAX_PROBABILITY: u8 = 100;
    /// Slider position before the participant touches it
    pub const DEFAULT_PROBABILITY: u8 = 50;

    /// Build a rating for the stimulus on screen
    #[must_use]
    pub fn for_stimulus(stimulus: &ImageStimulus, ai_probability: u8) -> Self {
        Self {
            image_path: stimulus.image_path.clone(),
            ai_probability,
            is_actually_ai: stimulus.is_actually_ai,
        }
    }
}

/// Gender options offered on the demographics form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    /// Mężczyzna
    Male,
    /// Kobieta
    Female,
    /// Niebinarna
    NonBinary,
    /// Wolę nie odpowiadać
    PreferNotToSay,
    /// Inna
    Other,
}

impl Gender {
    /// Options in form order
    pub const ALL: [Gender; 5] = [
        Gender::Male,
        Gender::Female,
        Gender::NonBinary,
        Gender::PreferNotToSay,
        Gender::Other,
    ];

    /// Stored value
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::NonBinary => "non-binary",
            Self::PreferNotToSay => "prefer-not-to-say",
            Self::Other => "other",
        }
    }

    /// Label shown to the participant
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Male => "Mężczyzna",
            Self::Female => "Kobieta",
            Self::NonBinary => "Niebinarna",
            Self::PreferNotToSay => "Wolę nie odpowiadać",
            Self::Other => "Inna",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InputError::EmptySelection("gender"));
        }
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| InputError::UnknownOption {
                field: "gender",
                value: s.to_string(),
            })
    }
}

/// Highest completed (or current) education level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Education {
    /// Podstawowe
    Podstawowe,
    /// Zawodowe
    Zawodowe,
    /// Średnie
    Srednie,
    /// Ukończone studia pierwszego stopnia
    StudiaPierwszegoStopnia,
    /// Ukończone studia drugiego stopnia
    StudiaDrugiegoStopnia,
    /// Ukończony doktorat
    Doktorat,
    /// Aktualnie studiuję
    AktualnieStudiuje,
    /// Aktualnie robię doktorat
    AktualnieDoktorat,
}

impl Education {
    /// Options in form order
    pub const ALL: [Education; 8] = [
        Education::Podstawowe,
        Education::Zawodowe,
        Education::Srednie,
        Education::StudiaPierwszegoStopnia,
        Education::StudiaDrugiegoStopnia,
        Education::Doktorat,
        Education::AktualnieStudiuje,
        Education::AktualnieDoktorat,
    ];

    /// Stored value
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Podstawowe => "podstawowe",
            Self::Zawodowe => "zawodowe",
            Self::Srednie => "srednie",
            Self::StudiaPierwszegoStopnia => "studia-pierwszego-stopnia",
            Self::StudiaDrugiegoStopnia => "studia-drugiego-stopnia",
            Self::Doktorat => "doktorat",
            Self::AktualnieStudiuje => "aktualnie-studiuje",
            Self::AktualnieDoktorat => "aktualnie-doktorat",
        }
    }

    /// Label shown to the participant
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Podstawowe => "Podstawowe",
            Self::Zawodowe => "Zawodowe",
            Self::Srednie => "Średnie",
            Self::StudiaPierwszegoStopnia => "Ukończone studia pierwszego stopnia",
            Self::StudiaDrugiegoStopnia => "Ukończone studia drugiego stopnia",
            Self::Doktorat => "Ukończony doktorat",
            Self::AktualnieStudiuje => "Aktualnie studiuję",
            Self::AktualnieDoktorat => "Aktualnie robię doktorat",
        }
    }
}

impl fmt::Display for Education {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Education {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InputError::EmptySelection("education"));
        }
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| InputError::UnknownOption {
                field: "education",
                value: s.to_string(),
            })
    }
}

/// Demographic answers, collected once before completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    /// Age in years
    pub age: u32,
    /// Selected gender
    pub gender: Gender,
    /// Selected education level
    pub education: Education,
    /// Legacy field, no longer asked
    #[serde(default)]
    pub occupation: String,
}

impl Demographics {
    /// Create record with an empty occupation
    #[must_use]
    pub fn new(age: u32, gender: Gender, education: Education) -> Self {
        Self {
            age,
            gender,
            education,
            occupation: String::new(),
        }
    }
}

/// Step of the guided flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Consent and instructions
    Instructions,
    /// Fixed pretest image ratings
    Pretest,
    /// Opinion questionnaire
    Questionnaire,
    /// Main image ratings
    Images,
    /// Demographic form
    Demographics,
    /// Terminal step, data ready for export
    Complete,
}

impl Step {
    /// Wire name of the step
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Instructions => "instructions",
            Self::Pretest => "pretest",
            Self::Questionnaire => "questionnaire",
            Self::Images => "images",
            Self::Demographics => "demographics",
            Self::Complete => "complete",
        }
    }

    /// Whether the step walks through a stimulus list
    #[inline]
    #[must_use]
    pub const fn is_rating_step(&self) -> bool {
        matches!(self, Self::Pretest | Self::Images)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
