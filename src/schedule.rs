//! Pacing of the end-of-round reveal
//!
//! Once a round ends, the answers the player missed are disclosed one at a
//! time. Each forced reveal is scheduled [`INTERVAL`] after the previous
//! one (the first one [`INTERVAL`] after the reveal starts), and the game
//! ends [`GAME_OVER_DELAY`] after the last reveal.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::{
    AlarmMessage,
    api::RevealedAnswer,
    constants::reveal::{GAME_OVER_DELAY, INTERVAL},
    game::{AnswerUpdate, GameSession},
};

/// An alarm and the delay after which it should fire
///
/// Delays are measured from the moment the reveal starts, not from the
/// previous alarm.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAlarm {
    /// What happens when the alarm fires
    pub message: AlarmMessage,
    /// Time between the start of the reveal and the alarm
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub delay: Duration,
}

/// Plans the reveal of every answer the player did not guess
///
/// Answers are disclosed in the order the answer list lists them. An answer
/// counts as missed when the board slot at its position was not guessed
/// correctly. The returned alarms are sorted by delay and always end with
/// [`AlarmMessage::EndGame`].
///
/// # Arguments
///
/// * `session` - The session whose round just ended
/// * `answers` - The authoritative answer list for the question
pub fn reveal_plan(session: &GameSession, answers: &[RevealedAnswer]) -> Vec<ScheduledAlarm> {
    let mut plan = answers
        .iter()
        .filter(|answer| !session.is_solved(answer.position))
        .zip(1u32..)
        .map(|(answer, step)| ScheduledAlarm {
            message: AlarmMessage::Reveal(AnswerUpdate {
                position: answer.position,
                text: answer.answer.clone(),
                value: answer.points,
                is_correct: false,
            }),
            delay: INTERVAL * step,
        })
        .collect_vec();

    let last_delay = plan.last().map_or(Duration::ZERO, |alarm| alarm.delay);
    plan.push(ScheduledAlarm {
        message: AlarmMessage::EndGame,
        delay: last_delay + GAME_OVER_DELAY,
    });

    plan
}
