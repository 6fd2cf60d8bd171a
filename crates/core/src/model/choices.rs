use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::question::QuestionRecord;

/// Answer options of one presented question in display order.
///
/// Built once when the question is shown and kept for as long as it stays on
/// screen, feedback phase included, so the correct/incorrect marking always
/// points at the option the learner actually picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledOptions {
    options: Vec<String>,
    correct_index: usize,
}

impl ShuffledOptions {
    /// Uniformly permute the question's options.
    pub fn new<R: Rng + ?Sized>(question: &QuestionRecord, rng: &mut R) -> Self {
        let mut options = question.options().to_vec();
        options.shuffle(rng);
        let correct_index = options
            .iter()
            .position(|opt| question.is_correct_option(opt))
            .unwrap_or_default();
        Self {
            options,
            correct_index,
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::tests::draft;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn shuffle_keeps_every_option_and_tracks_the_answer() {
        let question = draft(1).validate().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = ShuffledOptions::new(&question, &mut rng);

        let mut seen: Vec<_> = shuffled.as_slice().to_vec();
        let mut expected = question.options().to_vec();
        seen.sort();
        expected.sort();
        assert_eq!(seen, expected);
        assert_eq!(
            shuffled.get(shuffled.correct_index()),
            Some(question.correct_answer())
        );
    }

    #[test]
    fn shuffle_produces_varied_orders() {
        let question = draft(1).validate().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let orders: HashSet<Vec<String>> = (0..50)
            .map(|_| ShuffledOptions::new(&question, &mut rng).as_slice().to_vec())
            .collect();
        assert!(orders.len() > 1);
    }
}
