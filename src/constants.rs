//! Configuration constants for the feud game
//!
//! This module contains the limits and pacing values used throughout the
//! game so that the board layout, the guess input and the reveal sequence
//! all agree on the same numbers.

/// Board and round configuration constants
pub mod game {
    /// Number of strikes that ends a round
    pub const MAX_STRIKES: u32 = 3;
    /// Minimum number of answers a question can have
    pub const MIN_ANSWER_COUNT: usize = 1;
    /// Maximum number of answers a question can have (a full 4x2 board)
    pub const MAX_ANSWER_COUNT: usize = 8;
    /// Maximum length of a question prompt in characters
    pub const MAX_PROMPT_LENGTH: usize = 200;
    /// Maximum length of a guess in characters
    pub const MAX_GUESS_LENGTH: usize = 32;
    /// Total points available for a question, used in the share summary
    pub const MAX_SCORE: u32 = 100;
}

/// Reveal sequencing constants
pub mod reveal {
    use std::time::Duration;

    /// Gap between two consecutive forced reveals (and before the first)
    pub const INTERVAL: Duration = Duration::from_millis(500);
    /// Gap between the last forced reveal and the end of the game
    pub const GAME_OVER_DELAY: Duration = Duration::from_millis(750);
}

/// Results sharing constants
pub mod results {
    /// Number of rows in the results grid
    pub const ROWS: usize = 4;
    /// Glyph for an answer the player guessed
    pub const CORRECT_GLYPH: &str = "✅";
    /// Glyph for an answer the player missed
    pub const MISSED_GLYPH: &str = "❌";
    /// Title used in the share summary
    pub const TITLE: &str = "DailyFeud";
}
