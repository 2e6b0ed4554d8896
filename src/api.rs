//! Question service contracts
//!
//! The game consumes a small HTTP service that knows the questions and
//! their answers. This module defines the request and response shapes, the
//! [`FeudApi`] trait the session controller talks to, and [`HttpApi`], the
//! reqwest implementation of that trait.

use std::{env, time::Duration};

use async_trait::async_trait;
use garde::Validate;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_with::skip_serializing_none;
use tracing::{debug, instrument};

use crate::{
    constants::game::{MAX_ANSWER_COUNT, MAX_GUESS_LENGTH, MAX_PROMPT_LENGTH, MIN_ANSWER_COUNT},
    error::Error,
    game::AnswerUpdate,
    question_id::QuestionId,
};

/// Prompt and board size of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuestionMetadata {
    /// The question text
    #[garde(length(chars, min = 1, max = MAX_PROMPT_LENGTH))]
    pub prompt: String,
    /// Number of answers on the board
    #[garde(range(min = MIN_ANSWER_COUNT, max = MAX_ANSWER_COUNT))]
    pub count: usize,
}

/// One entry of the authoritative answer list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAnswer {
    /// 1-based board position
    pub position: usize,
    /// Canonical answer text
    pub answer: String,
    /// Points for the answer
    pub points: u32,
}

/// A guess submitted for judgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct GuessRequest {
    /// Question being guessed
    #[garde(skip)]
    pub id: QuestionId,
    /// The guess text
    #[garde(length(chars, min = 1, max = MAX_GUESS_LENGTH))]
    pub guess: String,
}

/// The service's judgement of a guess
///
/// `position`, `answer` and `value` are only present when the guess is
/// correct.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the guess matched an answer
    pub correct: bool,
    /// Board position of the matched answer
    #[serde(default)]
    pub position: Option<usize>,
    /// Canonical text of the matched answer
    #[serde(default)]
    pub answer: Option<String>,
    /// Points for the matched answer
    #[serde(default)]
    pub value: Option<u32>,
}

impl Verdict {
    /// A verdict matching the answer at `position`
    pub fn correct(position: usize, answer: impl Into<String>, value: u32) -> Self {
        Self {
            correct: true,
            position: Some(position),
            answer: Some(answer.into()),
            value: Some(value),
        }
    }

    /// A verdict rejecting the guess
    pub fn wrong() -> Self {
        Self {
            correct: false,
            position: None,
            answer: None,
            value: None,
        }
    }

    /// Converts a correct verdict into the answer it reveals
    ///
    /// Returns `Ok(None)` for a wrong guess.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedVerdict`] if the verdict is correct but does
    /// not carry the matched answer.
    pub fn into_update(self) -> Result<Option<AnswerUpdate>, Error> {
        if !self.correct {
            return Ok(None);
        }

        match (self.position, self.answer, self.value) {
            (Some(position), Some(text), Some(value)) => Ok(Some(AnswerUpdate {
                position,
                text,
                value,
                is_correct: true,
            })),
            _ => Err(Error::MalformedVerdict),
        }
    }
}

/// The most recently published question, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestQuestion {
    /// `None` when no question has been published
    pub latest_id: Option<QuestionId>,
}

/// An entry of the question archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPrompt {
    /// Question key
    pub id: QuestionId,
    /// The question text
    pub prompt: String,
}

/// Operations the game needs from the question service
#[async_trait]
pub trait FeudApi: Send + Sync {
    /// Fetches the prompt and board size of a question
    async fn fetch_question(&self, id: QuestionId) -> Result<QuestionMetadata, Error>;

    /// Fetches every answer of a question, in board order
    async fn fetch_answers(&self, id: QuestionId) -> Result<Vec<RevealedAnswer>, Error>;

    /// Submits a guess and returns the service's verdict
    async fn submit_guess(&self, request: GuessRequest) -> Result<Verdict, Error>;

    /// Fetches the ID of the most recently published question
    async fn fetch_latest_question_id(&self) -> Result<LatestQuestion, Error>;

    /// Lists every published question
    async fn fetch_archive(&self) -> Result<Vec<QuestionPrompt>, Error>;
}

/// Resolves which question to play
///
/// An explicit ID wins; otherwise the latest published question is used.
///
/// # Errors
///
/// Returns [`Error::EmptyArchive`] when no ID was given and no question has
/// been published, or the service error if the lookup fails.
pub async fn resolve_question_id<A: FeudApi + ?Sized>(
    api: &A,
    id: Option<QuestionId>,
) -> Result<QuestionId, Error> {
    if let Some(id) = id {
        return Ok(id);
    }

    api.fetch_latest_question_id()
        .await?
        .latest_id
        .ok_or(Error::EmptyArchive)
}

/// Connection settings for the question service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// Root URL of the service, without a trailing slash
    pub base_url: String,
    /// Timeout applied to every request
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ApiConfig {
    /// Reads the settings from `FEUD_BASE_URL` and `FEUD_TIMEOUT_MS`
    ///
    /// Unset or unparsable variables fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = env::var("FEUD_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.base_url);
        let timeout = env::var("FEUD_TIMEOUT_MS")
            .ok()
            .and_then(|ms| ms.trim().parse().ok())
            .map_or(defaults.timeout, Duration::from_millis);
        Self { base_url, timeout }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// [`FeudApi`] over HTTP
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: Client,
    config: ApiConfig,
}

impl HttpApi {
    /// Creates a client using the environment configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, Error> {
        Self::new(ApiConfig::from_env())
    }

    /// Creates a client for the given service
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let response = self.client.get(self.config.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        let status = response.status();
        if !status.is_success() {
            debug!(%status, url = %response.url(), "request rejected");
            return Err(Error::HttpStatus(status));
        }
        response.json().await.map_err(Error::Decode)
    }
}

#[async_trait]
impl FeudApi for HttpApi {
    #[instrument(skip(self))]
    async fn fetch_question(&self, id: QuestionId) -> Result<QuestionMetadata, Error> {
        self.get(&format!("get-question-prompt/{id}/")).await
    }

    #[instrument(skip(self))]
    async fn fetch_answers(&self, id: QuestionId) -> Result<Vec<RevealedAnswer>, Error> {
        self.get(&format!("get-all-answers/{id}/")).await
    }

    #[instrument(skip(self, request), fields(id = %request.id))]
    async fn submit_guess(&self, request: GuessRequest) -> Result<Verdict, Error> {
        let response = self
            .client
            .post(self.config.url("submit-guess/"))
            .json(&request)
            .send()
            .await?;
        Self::decode(response).await
    }

    #[instrument(skip(self))]
    async fn fetch_latest_question_id(&self) -> Result<LatestQuestion, Error> {
        self.get("get-latest-question-id/").await
    }

    #[instrument(skip(self))]
    async fn fetch_archive(&self) -> Result<Vec<QuestionPrompt>, Error> {
        self.get("get-all-question-prompts/").await
    }
}
