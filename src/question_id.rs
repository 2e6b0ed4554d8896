//! Question ID parsing and formatting
//!
//! Every round is tied to a single question, identified by the numeric key
//! the question service stores it under. IDs travel as route segments and
//! JSON strings, but the archive listing sends them as plain numbers, so
//! both encodings are accepted when deserializing.

use std::{fmt::Display, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

/// A unique identifier for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuestionId(u32);

impl QuestionId {
    /// Creates a question ID from its numeric key
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the numeric key of the question
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for QuestionId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for QuestionId {
    type Err = ParseIntError;

    /// Parses a question ID from its decimal representation
    ///
    /// Surrounding whitespace is ignored, since IDs often come straight
    /// from a route segment or a text field.
    ///
    /// # Errors
    ///
    /// Returns a `ParseIntError` if the string is not a valid unsigned
    /// decimal number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl Serialize for QuestionId {
    /// Serializes the question ID as a decimal string
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Wire encodings accepted for a question ID
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionIdSerde {
    Number(u32),
    Text(String),
}

impl<'de> Deserialize<'de> for QuestionId {
    /// Deserializes a question ID from either a number or a decimal string
    fn deserialize<D>(deserializer: D) -> Result<QuestionId, D::Error>
    where
        D: Deserializer<'de>,
    {
        match QuestionIdSerde::deserialize(deserializer)? {
            QuestionIdSerde::Number(n) => Ok(Self(n)),
            QuestionIdSerde::Text(s) => {
                QuestionId::from_str(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
            }
        }
    }
}
