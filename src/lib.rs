//! # Feud Game Library
//!
//! This library provides the core game logic for a daily trivia "feud":
//! a player guesses the hidden answers to a prompt, earns the points of
//! every answer they find, and loses the round after three wrong guesses.
//! It handles the round state machine, the session controller that talks
//! to the question service, the paced reveal of missed answers, and the
//! shareable results summary.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
use serde::{Deserialize, Serialize};

pub mod api;
pub mod constants;
pub mod error;
pub mod game;
pub mod question_id;
pub mod results;
pub mod schedule;
pub mod session;

pub use api::{ApiConfig, FeudApi, HttpApi};
pub use error::Error;
pub use game::{Answer, AnswerUpdate, Event, GameSession, GameStatus, reduce};
pub use question_id::QuestionId;
pub use results::Results;
pub use session::{Session, Tunnel};

/// Alarm messages for timed events of the end-of-round reveal
///
/// Alarms are scheduled by the session controller and turned back into
/// state machine events when they fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Disclose one missed answer
    Reveal(AnswerUpdate),
    /// Finish the round after the last disclosure
    EndGame,
}

impl From<AlarmMessage> for Event {
    fn from(alarm: AlarmMessage) -> Self {
        match alarm {
            AlarmMessage::Reveal(update) => Event::UpdateAnswer(update),
            AlarmMessage::EndGame => Event::EndGame,
        }
    }
}

/// Sound cues matching the outcome of a guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    /// The guess matched an answer
    Correct,
    /// The guess was wrong
    Wrong,
}

/// A transient notification for the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Text shown to the player
    pub message: String,
}

impl Toast {
    /// Creates a notification describing an error
    pub fn from_error(error: &Error) -> Self {
        Self {
            message: error.to_string(),
        }
    }
}

/// Messages sent alongside state snapshots
///
/// Update messages describe things that happen once, such as a sound to
/// play or an error to show, rather than the state of the board.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, derive_more::From)]
pub enum UpdateMessage {
    /// Play a sound for a judged guess
    Cue(Cue),
    /// Show a notification
    Toast(Toast),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}
