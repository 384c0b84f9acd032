//! Perspective-dependent message garbling.
//!
//! Messages are stored exactly as typed; the barrier is applied per viewer
//! when a transcript is rendered. For a given message the outcome depends
//! only on three inputs, checked in order:
//!
//! 1. Either fluency flag unknown (roles not assigned yet) → verbatim.
//! 2. Same fluency on both ends, message not code-switched → verbatim.
//! 3. Code-switched → fully garbled for native viewers, verbatim for
//!    non-native viewers.
//! 4. Otherwise the message crosses the barrier → each eligible word is
//!    independently garbled with probability [`CROSS_FLUENCY_PROBABILITY`].
//!
//! Words of three characters or fewer and all-digit words are never
//! garbled, and sentence punctuation survives inside garbled words, so a
//! distorted line still scans as language rather than line noise.
//!
//! Garbling draws from the caller's RNG, which makes renders
//! non-deterministic between refreshes (deliberate: the barrier should feel
//! noisy) while staying reproducible in tests via a seeded generator.

use rand::Rng;

/// Replacement alphabet for garbled characters.
pub const GARBLE_SYMBOLS: [char; 6] = ['*', '!', '#', '@', '%', '&'];

/// Words of this many characters or fewer pass through untouched.
pub const EXEMPT_WORD_LEN: usize = 3;

/// Per-word garbling probability for a message crossing the fluency barrier.
pub const CROSS_FLUENCY_PROBABILITY: f64 = 0.25;

/// Render `message` as seen by a particular viewer.
///
/// `sender_native` and `viewer_native` are `None` when the corresponding
/// participant has no fluency assigned yet; any unknown flag short-circuits
/// to the verbatim text. `is_code_switched` marks a message deliberately
/// sent in the non-native speakers' own language.
pub fn garble_message<R: Rng + ?Sized>(
    message: &str,
    sender_native: Option<bool>,
    viewer_native: Option<bool>,
    is_code_switched: bool,
    rng: &mut R,
) -> String {
    let (Some(sender), Some(viewer)) = (sender_native, viewer_native) else {
        return message.to_string();
    };

    if sender == viewer && !is_code_switched {
        return message.to_string();
    }

    if is_code_switched {
        // Opaque to natives, clear to the senders' own side.
        if viewer {
            return garble_words(message, 1.0, rng);
        }
        return message.to_string();
    }

    garble_words(message, CROSS_FLUENCY_PROBABILITY, rng)
}

/// Garble each eligible word of `message` independently with `probability`.
///
/// Splitting is on single spaces, so runs of spaces survive as empty words
/// and the output always has the same word count and spacing as the input.
pub fn garble_words<R: Rng + ?Sized>(message: &str, probability: f64, rng: &mut R) -> String {
    let words: Vec<String> = message
        .split(' ')
        .map(|word| {
            if is_exempt(word) || rng.gen::<f64>() >= probability {
                word.to_string()
            } else {
                garble_word(word, rng)
            }
        })
        .collect();
    words.join(" ")
}

/// Short words and bare numbers keep a garbled line readable.
fn is_exempt(word: &str) -> bool {
    word.chars().count() <= EXEMPT_WORD_LEN
        || (!word.is_empty() && word.chars().all(|c| c.is_ascii_digit()))
}

/// Replace every character of `word` with a random symbol, keeping
/// sentence punctuation in place.
fn garble_word<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    word.chars()
        .map(|c| {
            if is_sentence_punctuation(c) {
                c
            } else {
                GARBLE_SYMBOLS[rng.gen_range(0..GARBLE_SYMBOLS.len())]
            }
        })
        .collect()
}

fn is_sentence_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?' | ';' | ':')
}
