use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {0} has an empty prompt")]
    EmptyPrompt(QuestionId),

    #[error("question {0} has an empty correct answer")]
    EmptyAnswer(QuestionId),

    #[error("question {id} needs at least two options, got {len}")]
    TooFewOptions { id: QuestionId, len: usize },

    #[error("question {0} does not list its correct answer among the options")]
    AnswerNotAnOption(QuestionId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error(transparent)]
    Question(#[from] QuestionError),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it arrives from the bank feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub correct_answer: String,
    pub hint: String,
    pub explanation: String,
    pub options: Vec<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable record.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or answer is blank, fewer than two
    /// options are given, or the correct answer is not one of the options.
    pub fn validate(self) -> Result<QuestionRecord, QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt(self.id));
        }
        if self.correct_answer.trim().is_empty() {
            return Err(QuestionError::EmptyAnswer(self.id));
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                id: self.id,
                len: self.options.len(),
            });
        }
        let correct = self.correct_answer.trim();
        if !self.options.iter().any(|opt| opt.trim() == correct) {
            return Err(QuestionError::AnswerNotAnOption(self.id));
        }

        Ok(QuestionRecord {
            id: self.id,
            prompt: self.prompt,
            correct_answer: self.correct_answer,
            hint: self.hint,
            explanation: self.explanation,
            options: self.options,
        })
    }
}

/// A single quiz question. Owned by the bank and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    id: QuestionId,
    prompt: String,
    correct_answer: String,
    hint: String,
    explanation: String,
    options: Vec<String>,
}

impl QuestionRecord {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn hint(&self) -> &str {
        &self.hint
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Candidate answers in feed order (includes the correct one).
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// True when a picked option is the correct answer, ignoring surrounding whitespace.
    #[must_use]
    pub fn is_correct_option(&self, picked: &str) -> bool {
        picked.trim() == self.correct_answer.trim()
    }

    /// Lenient check for free-form typed answers.
    ///
    /// Case, repeated whitespace and trailing punctuation are ignored.
    #[must_use]
    pub fn matches_typed_answer(&self, typed: &str) -> bool {
        let typed = normalize_typed(typed);
        !typed.is_empty() && typed == normalize_typed(&self.correct_answer)
    }
}

/// Sentence punctuation dropped from the end of a typed answer. Symbols
/// such as `+` and `#` are part of answers like "C++" and are kept.
const TRAILING_PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

fn normalize_typed(raw: &str) -> String {
    raw.trim_end_matches(|c: char| c.is_whitespace() || TRAILING_PUNCTUATION.contains(&c))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// Ordered, read-only question bank loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<QuestionRecord>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionBank {
    /// Build a bank from validated records, keeping feed order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::DuplicateId` if two records share an id.
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self, QuestionBankError> {
        let mut index = HashMap::with_capacity(questions.len());
        for (pos, question) in questions.iter().enumerate() {
            if index.insert(question.id(), pos).is_some() {
                return Err(QuestionBankError::DuplicateId(question.id()));
            }
        }
        Ok(Self { questions, index })
    }

    /// Validate drafts and build a bank in one step.
    ///
    /// # Errors
    ///
    /// Returns the first validation or duplicate-id error encountered.
    pub fn from_drafts(
        drafts: impl IntoIterator<Item = QuestionDraft>,
    ) -> Result<Self, QuestionBankError> {
        let questions = drafts
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.questions.iter()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&QuestionRecord> {
        self.index.get(&id).map(|&pos| &self.questions[pos])
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.index.contains_key(&id)
    }

    /// Questions not in `used`, in bank order.
    #[must_use]
    pub fn excluding(&self, used: &HashSet<QuestionId>) -> Vec<&QuestionRecord> {
        self.questions
            .iter()
            .filter(|q| !used.contains(&q.id()))
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn draft(id: u64) -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Question {id}?"),
            correct_answer: format!("Answer {id}"),
            hint: format!("Hint {id}"),
            explanation: format!("Because {id}."),
            options: vec![
                format!("Answer {id}"),
                "Wrong A".to_string(),
                "Wrong B".to_string(),
                "Wrong C".to_string(),
            ],
        }
    }

    pub(crate) fn bank(size: u64) -> QuestionBank {
        QuestionBank::from_drafts((1..=size).map(draft)).unwrap()
    }

    #[test]
    fn validate_rejects_blank_prompt() {
        let mut d = draft(1);
        d.prompt = "   ".into();
        assert_eq!(
            d.validate().unwrap_err(),
            QuestionError::EmptyPrompt(QuestionId::new(1))
        );
    }

    #[test]
    fn validate_requires_two_options() {
        let mut d = draft(1);
        d.options.truncate(1);
        assert!(matches!(
            d.validate(),
            Err(QuestionError::TooFewOptions { len: 1, .. })
        ));
    }

    #[test]
    fn validate_requires_answer_among_options() {
        let mut d = draft(1);
        d.correct_answer = "Something else".into();
        assert!(matches!(d.validate(), Err(QuestionError::AnswerNotAnOption(_))));
    }

    #[test]
    fn bank_rejects_duplicate_ids() {
        let err = QuestionBank::from_drafts(vec![draft(1), draft(1)]).unwrap_err();
        assert_eq!(err, QuestionBankError::DuplicateId(QuestionId::new(1)));
    }

    #[test]
    fn bank_lookup_and_exclusion() {
        let bank = bank(4);
        assert_eq!(bank.len(), 4);
        assert_eq!(bank.get(QuestionId::new(3)).unwrap().prompt(), "Question 3?");
        assert!(bank.get(QuestionId::new(9)).is_none());

        let used: HashSet<_> = [QuestionId::new(1), QuestionId::new(3)].into_iter().collect();
        let ids: Vec<_> = bank.excluding(&used).iter().map(|q| q.id().value()).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn option_check_trims_whitespace() {
        let q = draft(5).validate().unwrap();
        assert!(q.is_correct_option("  Answer 5 "));
        assert!(!q.is_correct_option("answer 5"));
    }

    #[test]
    fn typed_answer_matching_is_lenient() {
        let q = draft(5).validate().unwrap();
        assert!(q.matches_typed_answer("answer   5."));
        assert!(q.matches_typed_answer("ANSWER 5"));
        assert!(!q.matches_typed_answer("answer 6"));
        assert!(!q.matches_typed_answer("   "));
    }

    #[test]
    fn typed_answer_ignores_space_before_trailing_punctuation() {
        let q = draft(5).validate().unwrap();
        assert!(q.matches_typed_answer("answer 5 !"));
        assert!(q.matches_typed_answer("Answer 5 ?! "));
        assert!(!q.matches_typed_answer("!"));
    }

    #[test]
    fn typed_answer_keeps_symbols_that_belong_to_the_answer() {
        let mut d = draft(7);
        d.correct_answer = "C++".into();
        d.options[0] = "C++".into();
        let q = d.validate().unwrap();
        assert!(q.matches_typed_answer("c++."));
        assert!(!q.matches_typed_answer("c"));
    }
}
