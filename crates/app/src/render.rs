//! Plain-text rendering for the terminal front end.

use quiz_core::metrics::ProgressSnapshot;
use quiz_core::model::{QuestionRecord, SessionScore, ShuffledOptions};
use quiz_core::selection::SelectionWeights;
use services::{AnswerFeedback, QuizKind, SessionProgress};

pub fn dashboard(snapshot: &ProgressSnapshot) -> String {
    let mut out = String::new();
    out.push_str("== Progress ==\n");
    out.push_str(&format!("  Questions       {}\n", snapshot.bank_size));
    out.push_str(&format!("  Studied         {}\n", snapshot.studied));
    out.push_str(&format!("  Mastered        {}\n", snapshot.mastered));
    out.push_str(&format!("  Needs practice  {}\n", snapshot.needs_practice));
    out.push_str(&format!("  Accuracy        {}%\n", snapshot.accuracy));
    out.push_str(&format!("  Current streak  {}\n", snapshot.current_streak));
    out.push_str(&format!("  Best streak     {}\n", snapshot.best_streak));
    out.push('\n');
    out.push_str(&footer(snapshot));
    out
}

fn footer(snapshot: &ProgressSnapshot) -> String {
    let mut lines = vec![format!(
        "You have studied {} of {} questions.",
        snapshot.studied, snapshot.bank_size
    )];
    if snapshot.weak_spot_available() {
        let noun = if snapshot.needs_practice == 1 {
            "question needs"
        } else {
            "questions need"
        };
        lines.push(format!(
            "{} {noun} practice. Try `weak` to drill them.",
            snapshot.needs_practice
        ));
    } else if snapshot.studied == 0 {
        lines.push("Start with `quiz` or `flashcards`.".to_string());
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn question_header(progress: SessionProgress, question: &QuestionRecord) -> String {
    format!(
        "\n[{}/{}] {}",
        progress.answered + 1,
        progress.total,
        question.prompt()
    )
}

pub fn options(options: &ShuffledOptions) -> String {
    options
        .as_slice()
        .iter()
        .enumerate()
        .map(|(i, text)| format!("  {}) {text}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn feedback(feedback: &AnswerFeedback) -> String {
    let verdict = if feedback.was_correct {
        "Correct!".to_string()
    } else {
        format!("Not quite. The answer is: {}", feedback.correct_answer)
    };
    if feedback.explanation.is_empty() {
        verdict
    } else {
        format!("{verdict}\n  {}", feedback.explanation)
    }
}

pub fn session_summary(kind: QuizKind, score: SessionScore, improvement_rate: u32) -> String {
    let mut out = format!(
        "\n{kind} finished: {} of {} correct ({}%).",
        score.correct(),
        score.answered(),
        score.accuracy()
    );
    if kind == QuizKind::WeakSpot {
        out.push_str(&format!(
            "\nImproved on {} weak spots ({improvement_rate}%).",
            score.improved()
        ));
    }
    out
}

pub fn weights(weights: &SelectionWeights) -> String {
    format!(
        "unseen_weight       {}\n\
         base_weight         {}\n\
         gap_weight          {}\n\
         min_weight          {}\n\
         staleness_per_day   {}\n\
         max_staleness_days  {}",
        weights.unseen_weight(),
        weights.base_weight(),
        weights.gap_weight(),
        weights.min_weight(),
        weights.staleness_per_day(),
        weights.max_staleness_days(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(studied: usize, needs_practice: usize) -> ProgressSnapshot {
        ProgressSnapshot {
            bank_size: 12,
            studied,
            mastered: 0,
            needs_practice,
            accuracy: 75,
            current_streak: 2,
            best_streak: 4,
        }
    }

    #[test]
    fn dashboard_reports_studied_out_of_bank() {
        let text = dashboard(&snapshot(5, 0));
        assert!(text.contains("Accuracy        75%"));
        assert!(text.contains("You have studied 5 of 12 questions."));
        assert!(!text.contains("weak"));
    }

    #[test]
    fn footer_nudges_toward_weak_spots() {
        let text = dashboard(&snapshot(5, 1));
        assert!(text.contains("1 question needs practice. Try `weak` to drill them."));

        let text = dashboard(&snapshot(5, 3));
        assert!(text.contains("3 questions need practice."));
    }

    #[test]
    fn empty_progress_suggests_a_first_mode() {
        let text = dashboard(&snapshot(0, 0));
        assert!(text.contains("Start with `quiz`"));
    }

    #[test]
    fn weights_lists_every_field() {
        let text = weights(&SelectionWeights::default());
        for field in services::WEIGHT_FIELDS {
            assert!(text.contains(field), "missing {field}");
        }
    }
}
