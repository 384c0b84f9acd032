//! Answer record - a team's response to one briefing question.

use serde::{Deserialize, Serialize};

/// The CEO briefing: four questions every team answers during the
/// negotiation. Question numbers are 1-based.
pub const BRIEFING_QUESTIONS: [&str; 4] = [
    "What is the primary market opportunity?",
    "What are the key operational challenges?",
    "What is the financial projection for Year 1?",
    "What is the recommended marketing strategy?",
];

/// Number of briefing questions.
pub const QUESTION_COUNT: usize = BRIEFING_QUESTIONS.len();

/// One team's answer to one question. A team holds at most one answer
/// per question; resubmission replaces the text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// Unique identifier
    pub id: String,

    /// Owning session
    pub session_id: String,

    /// Answering team
    pub team_id: String,

    /// 1-based question number
    pub question_number: u8,

    /// Free-text answer
    pub answer_text: String,

    /// Submitting participant (the team's CEO)
    pub submitted_by: String,

    /// Submission instant, unix ms
    pub submitted_at: u64,
}

impl Answer {
    pub fn new(
        id: String,
        session_id: String,
        team_id: String,
        question_number: u8,
        answer_text: String,
        submitted_by: String,
        submitted_at: u64,
    ) -> Self {
        Self {
            id,
            session_id,
            team_id,
            question_number,
            answer_text,
            submitted_by,
            submitted_at,
        }
    }

    /// The question this answer responds to.
    pub fn question(&self) -> Option<&'static str> {
        let index = usize::from(self.question_number).checked_sub(1)?;
        BRIEFING_QUESTIONS.get(index).copied()
    }
}

/// Whether a 1-based question number names a briefing question.
pub fn valid_question_number(n: u8) -> bool {
    (1..=QUESTION_COUNT as u8).contains(&n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_numbers_are_one_based() {
        assert!(valid_question_number(1));
        assert!(valid_question_number(4));
        assert!(!valid_question_number(0));
        assert!(!valid_question_number(5));
    }

    #[test]
    fn answers_resolve_their_question_text() {
        let answer = Answer::new(
            "a1".into(),
            "s1".into(),
            "t1".into(),
            1,
            "Large and underserved.".into(),
            "p1".into(),
            99,
        );
        assert_eq!(answer.question(), Some(BRIEFING_QUESTIONS[0]));

        let out_of_range = Answer { question_number: 9, ..answer };
        assert_eq!(out_of_range.question(), None);
    }
}
