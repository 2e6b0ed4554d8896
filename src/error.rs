//! Errors surfaced by the session controller and the question service client.

use thiserror::Error;

use crate::game;

/// Everything that can go wrong while playing a round
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The question service could not be reached
    #[error("question service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    /// The question service answered with a body that could not be read
    #[error("question service sent an unreadable response: {0}")]
    Decode(reqwest::Error),
    /// The question service answered with a non-success status
    #[error("question service returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    /// No question has been published yet
    #[error("no questions are available yet")]
    EmptyArchive,
    /// The state machine rejected an event
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] game::Error),
    /// Question metadata failed validation
    #[error("invalid question: {0}")]
    InvalidQuestion(garde::Report),
    /// The guess failed validation
    #[error("invalid guess: {0}")]
    InvalidGuess(garde::Report),
    /// A correct verdict did not say which answer it matched
    #[error("correct verdict is missing its answer")]
    MalformedVerdict,
}
