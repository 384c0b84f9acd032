//! Join codes.
//!
//! A session is reachable by a six-character code over A-Z and 0-9,
//! announced verbally or on a projector. Codes are stored and compared
//! uppercase; parsing folds case so participants can type them however
//! they like.

use std::fmt;

use rand::Rng;
use thiserror::Error;

/// Characters of a join code.
pub const JOIN_CODE_LEN: usize = 6;

/// Alphabet codes are drawn from.
pub const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A validated, uppercase join code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct JoinCode(String);

/// Rejected join code input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinCodeError {
    #[error("join code must be {JOIN_CODE_LEN} characters, got {0}")]
    WrongLength(usize),
    #[error("join code may only contain letters and digits, found {0:?}")]
    InvalidCharacter(char),
}

impl JoinCode {
    /// Validate and normalize user input into a code.
    ///
    /// Surrounding whitespace is dropped and letters are uppercased, so
    /// `" abc123 "` parses to the same code as `"ABC123"`.
    pub fn parse(input: &str) -> Result<Self, JoinCodeError> {
        let trimmed = input.trim();
        let len = trimmed.chars().count();
        if len != JOIN_CODE_LEN {
            return Err(JoinCodeError::WrongLength(len));
        }
        let mut code = String::with_capacity(JOIN_CODE_LEN);
        for c in trimmed.chars() {
            if !c.is_ascii_alphanumeric() {
                return Err(JoinCodeError::InvalidCharacter(c));
            }
            code.push(c.to_ascii_uppercase());
        }
        Ok(JoinCode(code))
    }

    /// Draw a fresh random code.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..JOIN_CODE_LEN)
            .map(|_| JOIN_CODE_ALPHABET[rng.gen_range(0..JOIN_CODE_ALPHABET.len())] as char)
            .collect();
        JoinCode(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
