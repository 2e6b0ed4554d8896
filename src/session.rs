//! Session controller
//!
//! A [`Session`] plays one round of one question. It owns every side
//! effect of the round: fetching the question, submitting guesses,
//! fetching the answers once the round ends, and pacing their reveal.
//! Outcomes are fed back into the state machine as events, one inbox
//! message at a time, and every new state is pushed to a [`Tunnel`].
//!
//! Background work runs on tokio tasks that only ever send messages to the
//! session inbox; the session itself is the only writer of the game state.

use std::{future::Future, sync::Arc};

use garde::Validate;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, error, info, instrument, warn};

use super::{
    Cue, Toast, UpdateMessage,
    api::{FeudApi, GuessRequest, QuestionMetadata, RevealedAnswer, Verdict, resolve_question_id},
    error::Error,
    game::{Event, GameSession, GameStatus, reduce},
    question_id::QuestionId,
    results::Results,
    schedule::{ScheduledAlarm, reveal_plan},
};

/// Trait for pushing session output to whoever draws the game
///
/// Implementations might re-render a terminal UI, forward JSON over a
/// WebSocket, or simply record what happened.
pub trait Tunnel {
    /// Sends a one-off update such as a sound cue or a notification
    fn send_message(&self, message: &UpdateMessage);

    /// Sends the latest state of the round
    ///
    /// Called after every state transition, so the receiver always sees
    /// the states in the order they were produced.
    fn send_state(&self, state: &GameSession);

    /// Closes the tunnel once the session is torn down
    fn close(&self);
}

/// Outcomes of background work, delivered to the session one at a time
#[derive(Debug)]
enum Inbox {
    /// The question metadata request finished
    Question(Result<QuestionMetadata, Error>),
    /// A guess request finished; `ticket` identifies the submission
    Verdict {
        ticket: u64,
        result: Result<Verdict, Error>,
    },
    /// The answer list request finished
    Answers(Result<Vec<RevealedAnswer>, Error>),
    /// A reveal alarm fired
    Alarm(crate::AlarmMessage),
}

/// One round of the game, tied to a single question
///
/// All tasks a session spawns are aborted when it is torn down or dropped,
/// so a discarded session can never be changed afterwards.
pub struct Session<A, T> {
    /// Question being played
    id: QuestionId,
    /// Question service
    api: Arc<A>,
    /// Output channel for states and notifications
    tunnel: T,
    /// Current state of the round
    state: GameSession,
    /// Handed to background tasks so they can report back
    sender: mpsc::UnboundedSender<Inbox>,
    /// Messages from background tasks, in arrival order
    inbox: mpsc::UnboundedReceiver<Inbox>,
    /// The guess request whose verdict is still awaited
    guess: Option<JoinHandle<()>>,
    /// Ticket of the most recent guess submission
    guess_ticket: u64,
    /// Guess input as typed, before upper-casing
    input: String,
    /// Fetches and alarms that have not finished yet
    pending: Vec<JoinHandle<()>>,
}

impl<A, T> std::fmt::Debug for Session<A, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<A: FeudApi + 'static, T: Tunnel> Session<A, T> {
    /// Starts a round for the given question
    ///
    /// The initial `LOADING` state is sent right away and the question is
    /// fetched in the background. Must be called from within a tokio
    /// runtime.
    ///
    /// # Arguments
    ///
    /// * `id` - Question to play
    /// * `api` - Question service
    /// * `tunnel` - Receiver of states and notifications
    pub fn start(id: QuestionId, api: Arc<A>, tunnel: T) -> Self {
        let (sender, inbox) = mpsc::unbounded_channel();
        let mut session = Self {
            id,
            api,
            tunnel,
            state: GameSession::new(),
            sender,
            inbox,
            guess: None,
            guess_ticket: 0,
            input: String::new(),
            pending: Vec::new(),
        };

        session.tunnel.send_state(&session.state);

        let api = Arc::clone(&session.api);
        session.spawn(async move { Inbox::Question(api.fetch_question(id).await) });

        info!(%id, "session started");
        session
    }

    /// Starts a round for the most recently published question
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyArchive`] if no question has been published, or
    /// the service error if the lookup fails. The error is also reported
    /// through the tunnel.
    pub async fn start_latest(api: Arc<A>, tunnel: T) -> Result<Self, Error> {
        match resolve_question_id(api.as_ref(), None).await {
            Ok(id) => Ok(Self::start(id, api, tunnel)),
            Err(error) => {
                warn!(%error, "could not find a question to play");
                tunnel.send_message(&Toast::from_error(&error).into());
                Err(error)
            }
        }
    }

    /// Question being played
    pub fn id(&self) -> QuestionId {
        self.id
    }

    /// Current state of the round
    pub fn state(&self) -> &GameSession {
        &self.state
    }

    /// Results of the round as they currently stand
    pub fn results(&self) -> Results {
        Results::new(self.id, &self.state)
    }

    /// Updates the guess input
    ///
    /// Ignored unless the round is accepting guesses.
    pub fn update_guess(&mut self, text: &str) -> Result<(), Error> {
        if self.state.game_status() != GameStatus::Playing {
            debug!(status = %self.state.game_status(), "guess input is disabled");
            return Ok(());
        }
        self.dispatch(Event::UpdateGuess(text.to_owned()))?;
        text.clone_into(&mut self.input);
        Ok(())
    }

    /// Submits the current guess
    ///
    /// The input is cleared immediately. Any guess still awaiting its
    /// verdict is cancelled, so only the newest submission can change the
    /// board.
    ///
    /// # Returns
    ///
    /// `true` if a request was sent, `false` if there was nothing to submit
    /// or the round is not accepting guesses.
    pub fn submit_guess(&mut self) -> Result<bool, Error> {
        if !self.state.can_guess() {
            return Ok(false);
        }

        // Length limits apply to the text as typed; upper-casing can grow it.
        let mut request = GuessRequest {
            id: self.id,
            guess: self.input.trim().to_owned(),
        };
        if let Err(report) = request.validate() {
            self.report(Error::InvalidGuess(report));
            return Ok(false);
        }
        request.guess = request.guess.to_uppercase();

        self.dispatch(Event::UpdateGuess(String::new()))?;
        self.input.clear();

        if let Some(previous) = self.guess.take() {
            debug!(ticket = self.guess_ticket, "superseding in-flight guess");
            previous.abort();
        }
        self.guess_ticket += 1;

        let ticket = self.guess_ticket;
        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        self.guess = Some(tokio::spawn(async move {
            let result = api.submit_guess(request).await;
            let _ = sender.send(Inbox::Verdict { ticket, result });
        }));

        Ok(true)
    }

    /// Opens or closes the results modal
    pub fn toggle_results_modal(&mut self) -> Result<(), Error> {
        self.dispatch(Event::ToggleResultsModal)
    }

    /// Waits for the next background outcome and applies it
    ///
    /// Failed requests are reported through the tunnel and leave the state
    /// unchanged; they are not errors of this method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if the state machine rejects the
    /// resulting event.
    pub async fn next(&mut self) -> Result<(), Error> {
        // The session holds a sender, so the inbox never closes.
        match self.inbox.recv().await {
            Some(message) => self.handle(message),
            None => Ok(()),
        }
    }

    /// Applies the next background outcome if one is already waiting
    ///
    /// # Returns
    ///
    /// `true` if a message was applied.
    pub fn try_next(&mut self) -> Result<bool, Error> {
        match self.inbox.try_recv() {
            Ok(message) => self.handle(message).map(|()| true),
            Err(_) => Ok(false),
        }
    }

    /// Applies background outcomes until the round is over
    ///
    /// This never returns if the round gets stuck on a failed request, so
    /// callers usually race it against their own shutdown signal.
    pub async fn run_until_over(&mut self) -> Result<(), Error> {
        while self.state.game_status() != GameStatus::GameOver {
            self.next().await?;
        }
        Ok(())
    }

    /// Cancels the session and closes its tunnel
    pub fn teardown(mut self) {
        self.cancel_pending();
        self.tunnel.close();
        info!(id = %self.id, "session torn down");
    }

    #[instrument(level = "debug", skip_all, fields(id = %self.id))]
    fn handle(&mut self, message: Inbox) -> Result<(), Error> {
        match message {
            Inbox::Question(Ok(metadata)) => {
                if let Err(report) = metadata.validate() {
                    self.report(Error::InvalidQuestion(report));
                    return Ok(());
                }
                self.dispatch(Event::InitQuestion {
                    prompt: metadata.prompt,
                    answer_count: metadata.count,
                })
            }
            Inbox::Verdict { ticket, .. } if ticket != self.guess_ticket => {
                debug!(ticket, "dropping stale verdict");
                Ok(())
            }
            Inbox::Verdict { result, .. } => {
                self.guess = None;
                self.apply_verdict(result)
            }
            Inbox::Answers(Ok(answers)) => {
                self.schedule_reveal(&answers);
                Ok(())
            }
            Inbox::Question(Err(error)) | Inbox::Answers(Err(error)) => {
                self.report(error);
                Ok(())
            }
            Inbox::Alarm(alarm) => self.dispatch(alarm.into()),
        }
    }

    fn apply_verdict(&mut self, result: Result<Verdict, Error>) -> Result<(), Error> {
        if self.state.game_status() != GameStatus::Playing {
            debug!(status = %self.state.game_status(), "ignoring verdict after round end");
            return Ok(());
        }

        let verdict = match result {
            Ok(verdict) => verdict,
            Err(error) => {
                self.report(error);
                return Ok(());
            }
        };

        match verdict.into_update() {
            Ok(Some(update)) => {
                self.dispatch(Event::UpdateAnswer(update))?;
                self.tunnel.send_message(&Cue::Correct.into());
            }
            Ok(None) => {
                self.dispatch(Event::AddStrike)?;
                self.tunnel.send_message(&Cue::Wrong.into());
            }
            Err(error) => self.report(error),
        }

        self.check_round_end()
    }

    /// Ends the round once every answer is guessed or the strikes run out
    fn check_round_end(&mut self) -> Result<(), Error> {
        if self.state.game_status() != GameStatus::Playing || !self.state.is_round_over() {
            return Ok(());
        }

        info!(
            score = self.state.score(),
            strikes = self.state.strikes(),
            "round over, revealing answers"
        );
        self.dispatch(Event::RevealAnswers)?;

        let api = Arc::clone(&self.api);
        let id = self.id;
        self.spawn(async move { Inbox::Answers(api.fetch_answers(id).await) });
        Ok(())
    }

    /// Schedules an alarm for every missed answer and the end of the game
    fn schedule_reveal(&mut self, answers: &[RevealedAnswer]) {
        if self.state.game_status() != GameStatus::Revealing {
            return;
        }

        let start = Instant::now();
        let plan = reveal_plan(&self.state, answers);
        debug!(alarms = plan.len(), "scheduling reveal");

        for ScheduledAlarm { message, delay } in plan {
            let deadline = start + delay;
            self.spawn(async move {
                sleep_until(deadline).await;
                Inbox::Alarm(message)
            });
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Inbox> + Send + 'static,
    {
        self.pending.retain(|handle| !handle.is_finished());

        let sender = self.sender.clone();
        self.pending.push(tokio::spawn(async move {
            let _ = sender.send(task.await);
        }));
    }

    fn dispatch(&mut self, event: Event) -> Result<(), Error> {
        let next = reduce(&self.state, &event).inspect_err(|fault| {
            error!(%fault, "state machine rejected event");
        })?;
        self.state = next;
        self.tunnel.send_state(&self.state);
        Ok(())
    }

    fn report(&self, error: Error) {
        warn!(%error, id = %self.id, "session operation failed");
        self.tunnel.send_message(&Toast::from_error(&error).into());
    }
}

impl<A, T> Session<A, T> {
    /// Aborts every request and alarm that has not completed yet
    ///
    /// Outcomes already waiting in the inbox are kept; nothing new will
    /// arrive afterwards.
    pub fn cancel_pending(&mut self) {
        if let Some(guess) = self.guess.take() {
            guess.abort();
        }
        for task in self.pending.drain(..) {
            task.abort();
        }
    }
}

impl<A, T> Drop for Session<A, T> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
