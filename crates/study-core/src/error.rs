//! Error types for the study engine
//!
//! Three kinds of failure exist:
//! - Input errors, raised at the collection boundary before an action is dispatched
//! - Contract violations, an action dispatched on a step that does not accept it
//! - Ambient failures (configuration, catalog, persistence)

use crate::flow::ActionKind;
use crate::types::Step;
use std::path::PathBuf;

/// Main study error type
#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    /// Flow contract violated
    #[error("flow error: {0}")]
    Flow(#[from] FlowError),

    /// Participant input rejected
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Question catalog could not be loaded
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Session snapshot could not be stored
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl StudyError {
    /// Check if error is a programming-contract violation
    #[inline]
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Flow(_))
    }

    /// Check if the participant can simply be asked again
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Store(_))
    }
}

/// Flow state machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// Action not accepted on the current step
    #[error("action `{action}` is not valid on step `{step}`")]
    IllegalAction {
        /// Step the flow was on
        step: Step,
        /// Action that was dispatched
        action: ActionKind,
    },
}

/// Input validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// Age missing or outside the accepted range
    #[error("age {age} outside {min}..={max}")]
    AgeOutOfRange { age: u32, min: u32, max: u32 },

    /// Required selection left empty
    #[error("no {0} selected")]
    EmptySelection(&'static str),

    /// Selection not among the offered options
    #[error("unknown {field} option: {value}")]
    UnknownOption { field: &'static str, value: String },

    /// Text where a number was expected
    #[error("not a number: {0}")]
    NotANumber(String),

    /// Opinion rating outside 1-4
    #[error("rating {rating} for question {question_id} outside 1..=4")]
    RatingOutOfRange { question_id: u32, rating: u32 },

    /// AI probability outside 0-100
    #[error("probability {0} outside 0..=100")]
    ProbabilityOutOfRange(u32),

    /// Catalog question without an answer
    #[error("question {0} not answered")]
    MissingResponse(u32),

    /// Answer for a question not in the catalog
    #[error("question {0} is not in the catalog")]
    UnknownQuestion(u32),

    /// Two answers for the same question
    #[error("question {0} answered twice")]
    DuplicateResponse(u32),

    /// Group name not recognised
    #[error("unknown group: {0}")]
    UnknownGroup(String),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this configuration
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values are inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Question catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not a JSON list of questions
    #[error("invalid catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Catalog has no questions
    #[error("catalog is empty")]
    Empty,

    /// Same id used twice
    #[error("duplicate question id {0}")]
    DuplicateId(u32),
}

/// Session store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be (de)serialized
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No snapshot for the participant
    #[error("no session stored for {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_violation_is_not_recoverable() {
        let err = StudyError::from(FlowError::IllegalAction {
            step: Step::Complete,
            action: ActionKind::Begin,
        });
        assert!(err.is_contract_violation());
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "flow error: action `begin` is not valid on step `complete`"
        );
    }

    #[test]
    fn input_error_is_recoverable() {
        let err = StudyError::from(InputError::MissingResponse(3));
        assert!(err.is_recoverable());
        assert!(!err.is_contract_violation());
    }
}
