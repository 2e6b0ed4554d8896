//! Core game state and the state machine that drives it
//!
//! A round moves through `LOADING`, `PLAYING`, `REVEALING` and `GAME_OVER`.
//! All progression happens through [`reduce`], a pure function from the
//! current [`GameSession`] and an [`Event`] to the next session. Network
//! calls and timers never happen here; the session controller performs
//! them and reports their outcomes back as events.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::game::MAX_STRIKES;

/// The phase a round is currently in
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Waiting for the question metadata to arrive
    #[default]
    #[display("LOADING")]
    Loading,
    /// Accepting guesses
    #[display("PLAYING")]
    Playing,
    /// The round has ended and missed answers are being disclosed
    #[display("REVEALING")]
    Revealing,
    /// Every answer is visible and the results are available
    #[display("GAME_OVER")]
    GameOver,
}

/// One hidden slot on the board
///
/// `text` and `value` only carry meaning once the answer is revealed.
/// An answer is correct only if the player guessed it; answers disclosed
/// at the end of a round are revealed but not correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// 1-based rank of the answer on the board
    position: usize,
    /// Upper-cased answer text, empty until revealed
    text: String,
    /// Points awarded for the answer, 0 until revealed
    value: u32,
    /// Whether the answer is visible on the board
    is_revealed: bool,
    /// Whether the player guessed the answer
    is_correct: bool,
}

impl Answer {
    /// Creates an unrevealed answer at the given board position
    fn hidden(position: usize) -> Self {
        Self {
            position,
            text: String::new(),
            value: 0,
            is_revealed: false,
            is_correct: false,
        }
    }

    /// Returns a revealed copy of this answer
    fn revealed(&self, update: &AnswerUpdate) -> Self {
        Self {
            position: self.position,
            text: update.text.to_uppercase(),
            value: update.value,
            is_revealed: true,
            is_correct: update.is_correct,
        }
    }

    /// 1-based rank of the answer on the board
    pub fn position(&self) -> usize {
        self.position
    }

    /// Upper-cased answer text, empty until revealed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Points for this answer, 0 until revealed
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Whether the answer is visible on the board
    pub fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    /// Whether the player guessed the answer
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

/// Everything needed to draw one round
///
/// A session is never reset in place: playing another question creates a
/// new session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    /// The question text, as received
    prompt: String,
    /// The board, fixed in length once the question is loaded
    answers: Vec<Answer>,
    /// Number of confirmed wrong guesses
    strikes: u32,
    /// Upper-cased contents of the guess input
    guess: String,
    /// Current phase of the round
    game_status: GameStatus,
    /// Whether the results modal is shown
    results_modal_is_open: bool,
}

/// Payload of an [`Event::UpdateAnswer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerUpdate {
    /// 1-based board position to reveal
    pub position: usize,
    /// Answer text, upper-cased when applied
    pub text: String,
    /// Points for the answer
    pub value: u32,
    /// `true` when the player guessed it, `false` for a forced reveal
    pub is_correct: bool,
}

/// Everything that can happen to a round
///
/// Events use the `{"type": ..., "payload": ...}` shape on the wire, so a
/// front end can forward them as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Event {
    /// Question metadata arrived
    #[serde(rename_all = "camelCase")]
    InitQuestion {
        /// The question text
        prompt: String,
        /// Number of slots on the board
        answer_count: usize,
    },
    /// The guess input changed
    UpdateGuess(String),
    /// A guess was confirmed wrong
    AddStrike,
    /// An answer was guessed or force-revealed
    UpdateAnswer(AnswerUpdate),
    /// The round ended and missed answers should be disclosed
    RevealAnswers,
    /// Every missed answer has been disclosed
    EndGame,
    /// The results modal was opened or closed
    ToggleResultsModal,
}

impl Event {
    /// Parses an event from its JSON representation
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEvent`] if the message does not name a known
    /// event type or its payload does not match that type.
    pub fn from_message(message: &str) -> Result<Self, Error> {
        serde_json::from_str(message).map_err(|e| Error::UnknownEvent(e.to_string()))
    }

    /// The wire name of the event type
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitQuestion { .. } => "init_question",
            Self::UpdateGuess(_) => "update_guess",
            Self::AddStrike => "add_strike",
            Self::UpdateAnswer(_) => "update_answer",
            Self::RevealAnswers => "reveal_answers",
            Self::EndGame => "end_game",
            Self::ToggleResultsModal => "toggle_results_modal",
        }
    }
}

/// Programming faults detected by the state machine
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The event is not defined for the current phase
    #[error("event `{event}` is not allowed while {status}")]
    InvalidTransition {
        /// Phase the session was in
        status: GameStatus,
        /// Wire name of the rejected event
        event: &'static str,
    },
    /// The message did not describe a known event
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

/// Computes the session that follows `state` once `event` happens
///
/// Transitions:
///
/// | From | Event | To |
/// |---|---|---|
/// | `LOADING` | `init_question` | `PLAYING` |
/// | `PLAYING` | `update_guess`, `add_strike`, `update_answer` | `PLAYING` |
/// | `PLAYING` | `reveal_answers` | `REVEALING` |
/// | `REVEALING` | `update_answer` (not correct) | `REVEALING` |
/// | `REVEALING` | `end_game` | `GAME_OVER` |
/// | any | `toggle_results_modal` | unchanged |
///
/// `update_answer` only replaces the answer whose position matches; every
/// other answer is carried over unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidTransition`] for any event the table above does
/// not allow in the current phase. No next state is produced in that case.
pub fn reduce(state: &GameSession, event: &Event) -> Result<GameSession, Error> {
    use GameStatus::{GameOver, Loading, Playing, Revealing};

    match (state.game_status, event) {
        (
            Loading,
            Event::InitQuestion {
                prompt,
                answer_count,
            },
        ) => Ok(GameSession {
            prompt: prompt.clone(),
            answers: (1..=*answer_count).map(Answer::hidden).collect_vec(),
            game_status: Playing,
            ..state.clone()
        }),
        (Playing, Event::UpdateGuess(text)) => Ok(GameSession {
            guess: text.to_uppercase(),
            ..state.clone()
        }),
        (Playing, Event::AddStrike) => Ok(GameSession {
            strikes: state.strikes.saturating_add(1),
            ..state.clone()
        }),
        (Playing | Revealing, Event::UpdateAnswer(update))
            if state.game_status == Playing || !update.is_correct =>
        {
            Ok(GameSession {
                answers: state
                    .answers
                    .iter()
                    .map(|answer| {
                        if answer.position == update.position {
                            answer.revealed(update)
                        } else {
                            answer.clone()
                        }
                    })
                    .collect_vec(),
                ..state.clone()
            })
        }
        (Playing, Event::RevealAnswers) => Ok(GameSession {
            game_status: Revealing,
            ..state.clone()
        }),
        (Revealing, Event::EndGame) => Ok(GameSession {
            guess: String::new(),
            game_status: GameOver,
            results_modal_is_open: !state.results_modal_is_open,
            ..state.clone()
        }),
        (_, Event::ToggleResultsModal) => Ok(GameSession {
            results_modal_is_open: !state.results_modal_is_open,
            ..state.clone()
        }),
        (status, event) => Err(Error::InvalidTransition {
            status,
            event: event.name(),
        }),
    }
}

impl GameSession {
    /// Creates a session waiting for its question
    pub fn new() -> Self {
        Self::default()
    }

    /// The question text, as received
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The board in position order
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Number of confirmed wrong guesses
    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    /// Upper-cased contents of the guess input
    pub fn guess(&self) -> &str {
        &self.guess
    }

    /// Current phase of the round
    pub fn game_status(&self) -> GameStatus {
        self.game_status
    }

    /// Whether the results modal is shown
    pub fn results_modal_is_open(&self) -> bool {
        self.results_modal_is_open
    }

    /// Sum of the values of every answer the player guessed
    ///
    /// The score is always derived from the board so that it can never
    /// disagree with it.
    pub fn score(&self) -> u32 {
        self.answers
            .iter()
            .filter(|answer| answer.is_correct)
            .map(|answer| answer.value)
            .sum()
    }

    /// Whether each answer, in board order, was guessed by the player
    pub fn correct_flags(&self) -> Vec<bool> {
        self.answers.iter().map(Answer::is_correct).collect_vec()
    }

    /// Whether the answer at `position` was guessed by the player
    pub fn is_solved(&self, position: usize) -> bool {
        self.answers
            .iter()
            .any(|answer| answer.position == position && answer.is_correct)
    }

    /// Whether the round has met an end condition
    ///
    /// A round ends once every answer has been guessed or the strike limit
    /// is reached. A board that has not been loaded never counts as solved.
    pub fn is_round_over(&self) -> bool {
        let all_guessed =
            !self.answers.is_empty() && self.answers.iter().all(|answer| answer.is_correct);

        all_guessed || self.strikes >= MAX_STRIKES
    }

    /// Whether the current guess may be submitted
    pub fn can_guess(&self) -> bool {
        self.game_status == GameStatus::Playing && !self.guess.trim().is_empty()
    }

    /// Hint shown in the guess input for the current phase
    pub fn placeholder(&self) -> &'static str {
        match self.game_status {
            GameStatus::Playing => "ENTER A GUESS...",
            GameStatus::Loading => "LOADING...",
            GameStatus::Revealing | GameStatus::GameOver => "GAME OVER",
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn apply(state: &GameSession, event: Event) -> GameSession {
        reduce(state, &event).unwrap()
    }

    fn playing(prompt: &str, answer_count: usize) -> GameSession {
        apply(
            &GameSession::new(),
            Event::InitQuestion {
                prompt: prompt.to_string(),
                answer_count,
            },
        )
    }

    fn guessed(position: usize, text: &str, value: u32) -> Event {
        Event::UpdateAnswer(AnswerUpdate {
            position,
            text: text.to_string(),
            value,
            is_correct: true,
        })
    }

    fn disclosed(position: usize, text: &str, value: u32) -> Event {
        Event::UpdateAnswer(AnswerUpdate {
            position,
            text: text.to_string(),
            value,
            is_correct: false,
        })
    }

    #[test]
    fn test_new_session_is_loading() {
        let session = GameSession::new();
        assert_eq!(session.game_status(), GameStatus::Loading);
        assert!(session.answers().is_empty());
        assert_eq!(session.strikes(), 0);
        assert!(!session.results_modal_is_open());
    }

    #[test]
    fn test_init_question_allocates_unrevealed_answers() {
        let session = playing("FRUITS", 4);

        assert_eq!(session.game_status(), GameStatus::Playing);
        assert_eq!(session.prompt(), "FRUITS");
        assert_eq!(session.answers().len(), 4);
        for (index, answer) in session.answers().iter().enumerate() {
            assert_eq!(answer.position(), index + 1);
            assert!(!answer.is_revealed());
            assert!(!answer.is_correct());
            assert_eq!(answer.text(), "");
            assert_eq!(answer.value(), 0);
        }
    }

    #[test]
    fn test_init_question_keeps_prompt_raw() {
        let session = playing("Name a fruit", 3);
        assert_eq!(session.prompt(), "Name a fruit");
    }

    #[test]
    fn test_update_guess_uppercases() {
        let session = apply(&playing("FRUITS", 4), Event::UpdateGuess("apple pie".into()));
        assert_eq!(session.guess(), "APPLE PIE");
    }

    #[test]
    fn test_correct_guess_reveals_only_target() {
        let before = playing("FRUITS", 4);
        let after = apply(&before, guessed(2, "apple", 30));

        let target = &after.answers()[1];
        assert!(target.is_revealed());
        assert!(target.is_correct());
        assert_eq!(target.text(), "APPLE");
        assert_eq!(target.value(), 30);

        for index in [0, 2, 3] {
            assert_eq!(after.answers()[index], before.answers()[index]);
        }
    }

    #[test]
    fn test_update_answer_sequence_never_touches_other_answers() {
        let events = [
            guessed(3, "banana", 20),
            guessed(1, "apple", 35),
            guessed(4, "grape", 10),
        ];

        let mut state = playing("FRUITS", 4);
        for event in events {
            let Event::UpdateAnswer(update) = &event else {
                unreachable!()
            };
            let target = update.position;
            let next = apply(&state, event.clone());

            for (old, new) in state.answers().iter().zip(next.answers()) {
                if old.position() != target {
                    assert_eq!(old, new);
                }
            }
            state = next;
        }
    }

    #[test]
    fn test_update_answer_unknown_position_changes_nothing() {
        let before = playing("FRUITS", 4);
        let after = apply(&before, guessed(9, "kiwi", 5));
        assert_eq!(after.answers(), before.answers());
    }

    #[test]
    fn test_add_strike_increments() {
        let mut state = playing("FRUITS", 4);
        for expected in 1..=3 {
            let next = apply(&state, Event::AddStrike);
            assert_eq!(next.strikes(), expected);
            assert!(next.strikes() >= state.strikes());
            state = next;
        }
    }

    #[test]
    fn test_three_strikes_end_the_round() {
        let mut state = playing("FRUITS", 4);
        state = apply(&state, Event::AddStrike);
        state = apply(&state, Event::AddStrike);
        assert!(!state.is_round_over());

        state = apply(&state, Event::AddStrike);
        assert_eq!(state.strikes(), 3);
        assert!(state.is_round_over());
    }

    #[test]
    fn test_all_correct_ends_the_round() {
        let mut state = playing("FRUITS", 2);
        state = apply(&state, guessed(1, "apple", 60));
        assert!(!state.is_round_over());

        state = apply(&state, guessed(2, "banana", 40));
        assert!(state.is_round_over());
    }

    #[test]
    fn test_forced_reveals_do_not_count_as_solved() {
        let mut state = playing("FRUITS", 2);
        state = apply(&state, Event::RevealAnswers);
        state = apply(&state, disclosed(1, "apple", 60));
        state = apply(&state, disclosed(2, "banana", 40));

        assert!(state.answers().iter().all(Answer::is_revealed));
        assert!(!state.is_round_over());
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_unloaded_board_is_not_solved() {
        assert!(!GameSession::new().is_round_over());
    }

    #[test]
    fn test_score_sums_correct_answers_only() {
        let mut state = playing("FRUITS", 4);
        state = apply(&state, guessed(1, "apple", 35));
        state = apply(&state, guessed(3, "banana", 20));
        state = apply(&state, Event::RevealAnswers);
        state = apply(&state, disclosed(2, "orange", 25));

        assert_eq!(state.score(), 55);
        assert_eq!(state.correct_flags(), vec![true, false, true, false]);
        assert!(state.is_solved(3));
        assert!(!state.is_solved(2));
    }

    #[test]
    fn test_toggle_results_modal_is_idempotent_in_pairs() {
        let state = apply(&playing("FRUITS", 4), guessed(1, "apple", 35));
        let once = apply(&state, Event::ToggleResultsModal);
        let twice = apply(&once, Event::ToggleResultsModal);

        assert_ne!(once.results_modal_is_open(), state.results_modal_is_open());
        assert_eq!(twice.results_modal_is_open(), state.results_modal_is_open());
        assert_eq!(once.score(), state.score());
        assert_eq!(twice, state);
    }

    #[test]
    fn test_toggle_results_modal_allowed_while_loading() {
        let state = apply(&GameSession::new(), Event::ToggleResultsModal);
        assert!(state.results_modal_is_open());
        assert_eq!(state.game_status(), GameStatus::Loading);
    }

    #[test]
    fn test_full_round_reaches_game_over() {
        let mut state = playing("FRUITS", 2);
        state = apply(&state, Event::UpdateGuess("apple".into()));
        state = apply(&state, guessed(1, "apple", 60));
        state = apply(&state, Event::RevealAnswers);
        assert_eq!(state.game_status(), GameStatus::Revealing);

        state = apply(&state, disclosed(2, "banana", 40));
        state = apply(&state, Event::EndGame);

        assert_eq!(state.game_status(), GameStatus::GameOver);
        assert_eq!(state.guess(), "");
        assert!(state.results_modal_is_open());
        assert_eq!(state.answers()[1].text(), "BANANA");
        assert!(!state.answers()[1].is_correct());
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let loading = GameSession::new();
        assert_eq!(
            reduce(&loading, &Event::AddStrike),
            Err(Error::InvalidTransition {
                status: GameStatus::Loading,
                event: "add_strike",
            })
        );

        let playing = playing("FRUITS", 4);
        assert!(reduce(&playing, &Event::EndGame).is_err());
        assert!(
            reduce(
                &playing,
                &Event::InitQuestion {
                    prompt: "AGAIN".into(),
                    answer_count: 2,
                }
            )
            .is_err()
        );

        let revealing = apply(&playing, Event::RevealAnswers);
        assert!(reduce(&revealing, &Event::AddStrike).is_err());
        assert!(reduce(&revealing, &Event::UpdateGuess("x".into())).is_err());
        assert!(reduce(&revealing, &guessed(1, "apple", 30)).is_err());

        let over = apply(&revealing, Event::EndGame);
        assert!(reduce(&over, &disclosed(1, "apple", 30)).is_err());
        assert!(reduce(&over, &Event::RevealAnswers).is_err());
    }

    #[test]
    fn test_can_guess_and_placeholder() {
        let loading = GameSession::new();
        assert!(!loading.can_guess());
        assert_eq!(loading.placeholder(), "LOADING...");

        let blank = apply(&playing("FRUITS", 4), Event::UpdateGuess("   ".into()));
        assert!(!blank.can_guess());
        assert_eq!(blank.placeholder(), "ENTER A GUESS...");

        let ready = apply(&blank, Event::UpdateGuess("apple".into()));
        assert!(ready.can_guess());

        let revealing = apply(&ready, Event::RevealAnswers);
        assert!(!revealing.can_guess());
        assert_eq!(revealing.placeholder(), "GAME OVER");
    }

    #[test]
    fn test_event_from_message() {
        let event = Event::from_message(
            r#"{"type":"init_question","payload":{"prompt":"FRUITS","answerCount":4}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            Event::InitQuestion {
                prompt: "FRUITS".into(),
                answer_count: 4,
            }
        );

        let event = Event::from_message(r#"{"type":"add_strike"}"#).unwrap();
        assert_eq!(event, Event::AddStrike);

        let event = Event::from_message(
            r#"{"type":"update_answer","payload":{"position":2,"text":"apple","value":30,"isCorrect":true}}"#,
        )
        .unwrap();
        assert_eq!(event, guessed(2, "apple", 30));
    }

    #[test]
    fn test_event_from_message_unknown_type() {
        let result = Event::from_message(r#"{"type":"fill_answers","payload":[]}"#);
        assert!(matches!(result, Err(Error::UnknownEvent(_))));
    }

    #[test]
    fn test_game_status_display_matches_wire_name() {
        assert_eq!(GameStatus::GameOver.to_string(), "GAME_OVER");
        assert_eq!(
            serde_json::to_string(&GameStatus::GameOver).unwrap(),
            "\"GAME_OVER\""
        );
    }
}
