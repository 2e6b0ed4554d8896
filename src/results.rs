//! End-of-round results and the shareable summary
//!
//! The summary lays the board out the same way it is drawn: four rows of
//! two columns, where the left column holds positions 1-4 and the right
//! column positions 5-8.

use std::fmt::Display;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    constants::{
        game::MAX_SCORE,
        results::{CORRECT_GLYPH, MISSED_GLYPH, ROWS, TITLE},
    },
    game::GameSession,
    question_id::QuestionId,
};

/// Renders which answers were guessed as a grid of glyphs
///
/// Row `r` holds the answers at indices `r` and `r + 4`; cells past the end
/// of the board are left out. Columns are separated by a space and rows by
/// a newline.
///
/// # Arguments
///
/// * `is_correct` - For each answer in board order, whether it was guessed
pub fn results_grid(is_correct: &[bool]) -> String {
    (0..ROWS)
        .map(|row| {
            [row, row + ROWS]
                .into_iter()
                .filter_map(|index| is_correct.get(index))
                .map(|&correct| if correct { CORRECT_GLYPH } else { MISSED_GLYPH })
                .join(" ")
        })
        .join("\n")
}

/// Final outcome of a round, ready to be shared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Results {
    /// Question the round was played on
    id: QuestionId,
    /// Points earned from guessed answers
    score: u32,
    /// Number of wrong guesses
    strikes: u32,
    /// Which answers were guessed, in board order
    is_correct: Vec<bool>,
}

impl Results {
    /// Captures the results of a session
    pub fn new(id: QuestionId, session: &GameSession) -> Self {
        Self {
            id,
            score: session.score(),
            strikes: session.strikes(),
            is_correct: session.correct_flags(),
        }
    }

    /// Points earned from guessed answers
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Number of wrong guesses
    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    /// The glyph grid for this round
    pub fn grid(&self) -> String {
        results_grid(&self.is_correct)
    }
}

impl Display for Results {
    /// Formats the summary that players copy and share
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{TITLE} {}: {}/{MAX_SCORE}", self.id, self.score)?;
        writeln!(f, "Strikes Used: {}", self.strikes)?;
        write!(f, "{}", self.grid())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::game::{AnswerUpdate, Event, reduce};

    #[test]
    fn test_alternating_full_board() {
        let grid = results_grid(&[true, false, true, false, true, false, true, false]);
        assert_eq!(grid, "✅ ✅\n❌ ❌\n✅ ✅\n❌ ❌");
        assert_eq!(grid.lines().count(), 4);
        assert!(grid.lines().all(|row| row.split(' ').count() == 2));
    }

    #[test]
    fn test_partial_board_skips_missing_cells() {
        let grid = results_grid(&[true, true, false, true, false]);
        assert_eq!(grid, "✅ ❌\n✅\n❌\n✅");
    }

    #[test]
    fn test_short_board_leaves_empty_rows() {
        let grid = results_grid(&[false, true]);
        assert_eq!(grid, "❌\n✅\n\n");
    }

    #[test]
    fn test_summary_text() {
        let mut session = reduce(
            &GameSession::new(),
            &Event::InitQuestion {
                prompt: "FRUITS".into(),
                answer_count: 4,
            },
        )
        .unwrap();
        session = reduce(
            &session,
            &Event::UpdateAnswer(AnswerUpdate {
                position: 2,
                text: "apple".into(),
                value: 30,
                is_correct: true,
            }),
        )
        .unwrap();
        session = reduce(&session, &Event::AddStrike).unwrap();

        let results = Results::new(QuestionId::new(7), &session);
        assert_eq!(results.score(), 30);
        assert_eq!(results.strikes(), 1);
        assert_eq!(
            results.to_string(),
            "DailyFeud 7: 30/100\nStrikes Used: 1\n❌\n✅\n❌\n❌"
        );
    }
}
