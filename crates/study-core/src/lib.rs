//! Study Core - experiment flow engine
//!
//! Drives one participant through the AI-image perception study:
//! - Assigns an experimental group and participant identifier
//! - Sequences the steps the group visits
//! - Selects and shuffles the image stimuli to rate
//! - Accumulates everything into a single session record
//!
//! # Example
//!
//! ```rust,ignore
//! use study_core::prelude::*;
//!
//! let config = StudyConfig::new();
//! let catalog = QuestionCatalog::builtin();
//! let mut flow = ExperimentFlow::new(&config, &catalog);
//!
//! flow.dispatch(Action::Begin)?;
//! while let Some(stimulus) = flow.current_stimulus() {
//!     println!("rate {}", stimulus.image_path);
//!     flow.dispatch(Action::AdvanceStimulus { ai_probability: 50 })?;
//! }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod catalog;
pub mod config;
pub mod error;
pub mod flow;
pub mod random;
pub mod session;
pub mod stimulus;
pub mod store;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use catalog::QuestionCatalog;
pub use config::StudyConfig;
pub use error::{CatalogError, ConfigError, FlowError, InputError, StoreError, StudyError};
pub use flow::{
    accepted_action, next_step, step_sequence, validate_action, Action, ActionKind,
    ExperimentFlow,
};
pub use random::{
    assign_group, assign_group_with, average_rating, generate_participant_id,
    generate_participant_id_with, shuffle, shuffled,
};
pub use session::SessionRecord;
pub use stimulus::StimulusSelector;
pub use store::{JsonFileStore, MemoryStore, SessionStore};
pub use types::{
    Agreement, Bucket, Demographics, Education, ExperimentalGroup, Gender, ImageRating,
    ImageStimulus, OpinionResponse, ParticipantId, Polarity, Question, Step,
};
pub use validation::{DemographicsDraft, QuestionnaireDraft};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a session
    pub use crate::{
        Action, Demographics, Education, ExperimentFlow, ExperimentalGroup, Gender,
        ImageStimulus, OpinionResponse, QuestionCatalog, SessionRecord, Step, StudyConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check if illegal actions panic instead of returning an error
#[must_use]
pub const fn strict_debug() -> bool {
    cfg!(feature = "strict-debug")
}
