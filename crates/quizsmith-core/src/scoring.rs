//! Attempt grading.
//!
//! MCQ answers are all-or-nothing. Text and code answers earn a fraction of
//! the question's points equal to the share of keywords (or expected key
//! points) found as case-insensitive substrings of the submission. This is
//! keyword overlap, not execution. Grading never fails: a question with
//! nothing to grade against yields `correct = None` and zero points.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Answer, AnswerValue, Question, QuestionKind, Quiz};

/// Aggregate outcome of grading one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    /// One entry per question, in quiz order.
    pub answers: Vec<Answer>,
    pub earned: u32,
    pub total: u32,
    /// `round(100 * earned / total)`, 0 when `total` is 0.
    pub score: u32,
    /// `"<type>-<level>"` per question not fully correct; not deduplicated.
    pub weak_areas: Vec<String>,
}

/// Grade submitted answers (keyed by question id) against a quiz.
pub fn grade(quiz: &Quiz, submitted: &HashMap<String, AnswerValue>) -> Grade {
    let mut answers = Vec::with_capacity(quiz.questions.len());
    let mut weak_areas = Vec::new();
    let mut earned = 0u32;
    let mut total = 0u32;

    for question in &quiz.questions {
        let value = submitted.get(&question.id);
        let answer = grade_question(question, value);

        total += question.points;
        earned += answer.points_awarded;
        if answer.correct != Some(true) {
            weak_areas.push(question.weak_area_tag());
        }
        answers.push(answer);
    }

    Grade {
        answers,
        earned,
        total,
        score: percentage(earned, total),
        weak_areas,
    }
}

/// Grade a single question.
pub fn grade_question(question: &Question, value: Option<&AnswerValue>) -> Answer {
    let (correct, points_awarded) = match &question.kind {
        QuestionKind::Mcq { correct_index, .. } => {
            let hit = value
                .and_then(AnswerValue::as_choice)
                .is_some_and(|chosen| chosen == *correct_index as i64);
            (Some(hit), if hit { question.points } else { 0 })
        }
        QuestionKind::Text { keywords } => keyword_score(keywords, value, question.points),
        QuestionKind::Code {
            expected_key_points,
            ..
        } => keyword_score(expected_key_points, value, question.points),
    };

    Answer {
        question_id: question.id.clone(),
        question_type: question.question_type(),
        value: value.cloned(),
        correct,
        points_awarded,
    }
}

fn keyword_score(
    keywords: &[String],
    value: Option<&AnswerValue>,
    points: u32,
) -> (Option<bool>, u32) {
    if keywords.is_empty() {
        return (None, 0);
    }

    let submission = value.map(AnswerValue::as_text).unwrap_or_default().to_lowercase();
    let matched = keywords
        .iter()
        .filter(|k| submission.contains(&k.to_lowercase()))
        .count();

    let fraction = (matched as f64 / keywords.len() as f64).min(1.0);
    let awarded = (fraction * points as f64).round() as u32;
    (Some(awarded == points), awarded)
}

fn percentage(earned: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * earned as f64 / total as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Level;

    fn mcq(id: &str, correct_index: usize, points: u32) -> Question {
        Question {
            id: id.into(),
            q: "pick".into(),
            level: Level::Easy,
            points,
            kind: QuestionKind::Mcq {
                options: ["a", "b", "c", "d"].map(String::from),
                correct_index,
            },
        }
    }

    fn text(id: &str, keywords: &[&str], points: u32) -> Question {
        Question {
            id: id.into(),
            q: "explain".into(),
            level: Level::Medium,
            points,
            kind: QuestionKind::Text {
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            },
        }
    }

    fn quiz(questions: Vec<Question>) -> Quiz {
        Quiz {
            title: "t".into(),
            description: String::new(),
            questions,
        }
    }

    fn answers(pairs: &[(&str, AnswerValue)]) -> HashMap<String, AnswerValue> {
        pairs
            .iter()
            .map(|(id, v)| (id.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn mcq_all_or_nothing() {
        let quiz = quiz(vec![mcq("q1", 1, 1)]);

        let right = grade(&quiz, &answers(&[("q1", AnswerValue::Choice(1))]));
        assert_eq!(right.score, 100);
        assert_eq!(right.answers[0].correct, Some(true));
        assert!(right.weak_areas.is_empty());

        let wrong = grade(&quiz, &answers(&[("q1", AnswerValue::Choice(0))]));
        assert_eq!(wrong.score, 0);
        assert_eq!(wrong.weak_areas, vec!["mcq-easy"]);

        let missing = grade(&quiz, &HashMap::new());
        assert_eq!(missing.score, 0);
        assert_eq!(missing.answers[0].correct, Some(false));
        assert_eq!(missing.answers[0].value, None);
    }

    #[test]
    fn text_partial_credit() {
        let quiz = quiz(vec![text("t1", &["add", "sum"], 2)]);
        let grade = grade(
            &quiz,
            &answers(&[("t1", AnswerValue::Text("Adds two numbers".into()))]),
        );
        assert_eq!(grade.answers[0].points_awarded, 1);
        assert_eq!(grade.answers[0].correct, Some(false));
        assert_eq!(grade.score, 50);
        assert_eq!(grade.weak_areas, vec!["text-medium"]);
    }

    #[test]
    fn text_rounding_can_reach_full_points() {
        // 2 of 3 keywords on a 1-point question rounds to 1.
        let quiz = quiz(vec![text("t1", &["borrow", "move", "lifetime"], 1)]);
        let grade = grade(
            &quiz,
            &answers(&[("t1", AnswerValue::Text("MOVE then BORROW".into()))]),
        );
        assert_eq!(grade.answers[0].points_awarded, 1);
        assert_eq!(grade.answers[0].correct, Some(true));
        assert!(grade.weak_areas.is_empty());
    }

    #[test]
    fn ungradable_counts_in_total_but_not_wrong() {
        let quiz = quiz(vec![mcq("q1", 0, 2), text("t1", &[], 2)]);
        let grade = grade(
            &quiz,
            &answers(&[
                ("q1", AnswerValue::Choice(0)),
                ("t1", AnswerValue::Text("anything".into())),
            ]),
        );
        assert_eq!(grade.answers[1].correct, None);
        assert_eq!(grade.answers[1].points_awarded, 0);
        assert_eq!(grade.total, 4);
        assert_eq!(grade.score, 50);
        assert_eq!(grade.weak_areas, vec!["text-medium"]);
    }

    #[test]
    fn code_matches_expected_key_points() {
        let question = Question {
            id: "c1".into(),
            q: "write add".into(),
            level: Level::Hard,
            points: 3,
            kind: QuestionKind::Code {
                starter_code: Some("fn add() {}".into()),
                expected_key_points: vec!["fn add".into(), "a + b".into(), "i32".into()],
            },
        };
        let answer = grade_question(
            &question,
            Some(&AnswerValue::Text("fn add(a: i32, b: i32) -> i32 { a + b }".into())),
        );
        assert_eq!(answer.points_awarded, 3);
        assert_eq!(answer.correct, Some(true));

        let answer = grade_question(&question, None);
        assert_eq!(answer.points_awarded, 0);
        assert_eq!(answer.correct, Some(false));
    }

    #[test]
    fn weak_areas_are_a_multiset() {
        let quiz = quiz(vec![mcq("a", 0, 1), mcq("b", 0, 1), mcq("c", 0, 1)]);
        let grade = grade(&quiz, &answers(&[("a", AnswerValue::Choice(0))]));
        assert_eq!(grade.weak_areas, vec!["mcq-easy", "mcq-easy"]);
        assert_eq!(grade.score, 33);
    }

    #[test]
    fn mcq_choice_submitted_as_text() {
        let quiz = quiz(vec![mcq("q1", 2, 1)]);
        let grade = grade(&quiz, &answers(&[("q1", AnswerValue::Text("2".into()))]));
        assert_eq!(grade.score, 100);
    }
}
