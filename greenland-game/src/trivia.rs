//! Timed trivia rounds with streak multipliers.
use log::{debug, info};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::{
    TRIVIA_FAILING_GRADE, TRIVIA_GRADE_LADDER, TRIVIA_QUESTIONS_PER_ROUND,
    TRIVIA_SECONDS_PER_QUESTION, TRIVIA_STREAK_CAP, TRIVIA_STREAK_STEP_PCT,
    TRIVIA_TIME_BONUS_PER_SECOND,
};
use crate::error::GameError;
use crate::numbers::pct_of_u32;

const fn default_points() -> u32 {
    100
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct: usize,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub const fn is_correct(&self, option: usize) -> bool {
        self.correct == option
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriviaConfig {
    pub questions_per_round: usize,
    pub seconds_per_question: u32,
    pub time_bonus_per_second: u32,
    /// Multiplier increase per streak step, in percent.
    pub streak_step_pct: u32,
    pub streak_cap: u32,
}

impl Default for TriviaConfig {
    fn default() -> Self {
        Self {
            questions_per_round: TRIVIA_QUESTIONS_PER_ROUND,
            seconds_per_question: TRIVIA_SECONDS_PER_QUESTION,
            time_bonus_per_second: TRIVIA_TIME_BONUS_PER_SECOND,
            streak_step_pct: TRIVIA_STREAK_STEP_PCT,
            streak_cap: TRIVIA_STREAK_CAP,
        }
    }
}

/// Points for a correct answer.
///
/// `floor((base + remaining * bonus) * (100 + step * min(streak_before + 1, cap)) / 100)`
#[must_use]
pub fn score_answer(base: u32, remaining: u32, streak_before: u32, cfg: &TriviaConfig) -> u32 {
    let raw = base.saturating_add(remaining.saturating_mul(cfg.time_bonus_per_second));
    let steps = streak_before.saturating_add(1).min(cfg.streak_cap);
    let multiplier_pct = cfg.streak_step_pct.saturating_mul(steps).saturating_add(100);
    pct_of_u32(raw, multiplier_pct)
}

/// Letter grade for a number of correct answers.
#[must_use]
pub fn grade_for(correct: usize) -> &'static str {
    TRIVIA_GRADE_LADDER
        .iter()
        .find(|(threshold, _)| correct >= *threshold)
        .map_or(TRIVIA_FAILING_GRADE, |&(_, grade)| grade)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TriviaPhase {
    Idle,
    Asking,
    /// Input is locked until `next_question`.
    Revealed {
        correct: bool,
        timed_out: bool,
        points: u32,
    },
    Finished {
        grade: String,
    },
}

impl TriviaPhase {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Asking => "asking",
            Self::Revealed { .. } => "showing an answer",
            Self::Finished { .. } => "finished",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    /// `None` when the countdown expired.
    pub chosen: Option<usize>,
    pub correct: bool,
    pub points: u32,
    pub remaining: u32,
    pub streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running { remaining: u32 },
    TimedOut,
}

/// Question as shown to a player. The answer index is only revealed once locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub category: String,
    pub points: u32,
    pub correct: Option<usize>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaState {
    #[serde(flatten)]
    pub phase: TriviaPhase,
    pub question: Option<QuestionView>,
    pub index: usize,
    pub total: usize,
    pub remaining: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub score: u32,
    pub correct_count: usize,
    pub history: Vec<AnswerRecord>,
}

#[derive(Debug, Clone)]
pub struct TriviaRound {
    bank: Arc<Vec<Question>>,
    cfg: TriviaConfig,
    drawn: Vec<usize>,
    index: usize,
    remaining: u32,
    streak: u32,
    best_streak: u32,
    score: u32,
    correct_count: usize,
    phase: TriviaPhase,
    history: Vec<AnswerRecord>,
}

impl TriviaRound {
    #[must_use]
    pub fn new(bank: Arc<Vec<Question>>, cfg: &TriviaConfig) -> Self {
        Self {
            bank,
            cfg: cfg.clone(),
            drawn: Vec::new(),
            index: 0,
            remaining: 0,
            streak: 0,
            best_streak: 0,
            score: 0,
            correct_count: 0,
            phase: TriviaPhase::Idle,
            history: Vec::new(),
        }
    }

    /// Draw the round's questions without replacement and start the first countdown.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] unless the round is idle.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        if self.phase != TriviaPhase::Idle {
            return Err(self.invalid("start"));
        }
        let mut order: Vec<usize> = (0..self.bank.len()).collect();
        order.shuffle(rng);
        order.truncate(self.cfg.questions_per_round);
        if order.is_empty() {
            return Err(GameError::InvalidTransition {
                action: "start",
                phase: "the question bank is empty",
            });
        }
        debug!("trivia: drew {} of {} questions", order.len(), self.bank.len());
        self.drawn = order;
        self.index = 0;
        self.remaining = self.cfg.seconds_per_question;
        self.phase = TriviaPhase::Asking;
        Ok(())
    }

    /// One second of countdown. Reaching zero resolves the question as a miss.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] when no question is being asked.
    pub fn tick(&mut self) -> Result<Tick, GameError> {
        if self.phase != TriviaPhase::Asking {
            return Err(self.invalid("tick"));
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.resolve(None);
            return Ok(Tick::TimedOut);
        }
        Ok(Tick::Running {
            remaining: self.remaining,
        })
    }

    /// Lock in an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] when input is locked or the round is over,
    /// or [`GameError::UnknownId`] for an option index the question does not have.
    pub fn answer(&mut self, option: usize) -> Result<&AnswerRecord, GameError> {
        if self.phase != TriviaPhase::Asking {
            return Err(self.invalid("answer"));
        }
        let options = self.current().map_or(0, |question| question.options.len());
        if option >= options {
            return Err(GameError::unknown("answer option", option.to_string()));
        }
        Ok(self.resolve(Some(option)))
    }

    fn resolve(&mut self, chosen: Option<usize>) -> &AnswerRecord {
        let (question_id, correct, base) = match self.current() {
            Some(question) => (
                question.id.clone(),
                chosen.is_some_and(|option| question.is_correct(option)),
                question.points,
            ),
            None => (String::new(), false, 0),
        };
        let points = if correct {
            score_answer(base, self.remaining, self.streak, &self.cfg)
        } else {
            0
        };
        if correct {
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
            self.correct_count += 1;
            self.score = self.score.saturating_add(points);
        } else {
            self.streak = 0;
        }
        self.phase = TriviaPhase::Revealed {
            correct,
            timed_out: chosen.is_none(),
            points,
        };
        self.history.push(AnswerRecord {
            question: question_id,
            chosen,
            correct,
            points,
            remaining: self.remaining,
            streak: self.streak,
        });
        let last = self.history.len() - 1;
        &self.history[last]
    }

    /// Unlock and move to the next question, or finish after the last one.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] unless the current question is resolved.
    pub fn next_question(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, TriviaPhase::Revealed { .. }) {
            return Err(self.invalid("move to the next question"));
        }
        self.index += 1;
        if self.index >= self.drawn.len() {
            let grade = grade_for(self.correct_count).to_string();
            info!(
                "trivia: finished {}/{} correct, score {}, grade {grade}",
                self.correct_count,
                self.drawn.len(),
                self.score
            );
            self.phase = TriviaPhase::Finished { grade };
        } else {
            self.remaining = self.cfg.seconds_per_question;
            self.phase = TriviaPhase::Asking;
        }
        Ok(())
    }

    pub fn restart(&mut self) {
        *self = Self::new(Arc::clone(&self.bank), &self.cfg);
    }

    #[must_use]
    pub fn current(&self) -> Option<&Question> {
        if matches!(self.phase, TriviaPhase::Idle | TriviaPhase::Finished { .. }) {
            return None;
        }
        self.drawn
            .get(self.index)
            .and_then(|&position| self.bank.get(position))
    }

    #[must_use]
    pub fn grade(&self) -> Option<&str> {
        match &self.phase {
            TriviaPhase::Finished { grade } => Some(grade),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, TriviaPhase::Finished { .. })
    }

    #[must_use]
    pub const fn phase(&self) -> &TriviaPhase {
        &self.phase
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub const fn correct_count(&self) -> usize {
        self.correct_count
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.drawn.len()
    }

    #[must_use]
    pub fn history(&self) -> &[AnswerRecord] {
        &self.history
    }

    #[must_use]
    pub fn snapshot(&self) -> TriviaState {
        let revealed = matches!(self.phase, TriviaPhase::Revealed { .. });
        TriviaState {
            phase: self.phase.clone(),
            question: self.current().map(|question| QuestionView {
                id: question.id.clone(),
                prompt: question.prompt.clone(),
                options: question.options.clone(),
                category: question.category.clone(),
                points: question.points,
                correct: revealed.then_some(question.correct),
                explanation: if revealed {
                    question.explanation.clone()
                } else {
                    None
                },
            }),
            index: self.index,
            total: self.drawn.len(),
            remaining: self.remaining,
            streak: self.streak,
            best_streak: self.best_streak,
            score: self.score,
            correct_count: self.correct_count,
            history: self.history.clone(),
        }
    }

    fn invalid(&self, action: &'static str) -> GameError {
        GameError::InvalidTransition {
            action,
            phase: self.phase.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn bank(size: usize) -> Arc<Vec<Question>> {
        Arc::new(
            (0..size)
                .map(|n| Question {
                    id: format!("q{n}"),
                    prompt: format!("Question {n}?"),
                    options: vec!["yes".to_string(), "no".to_string()],
                    correct: 0,
                    points: 100,
                    category: "test".to_string(),
                    explanation: None,
                })
                .collect(),
        )
    }

    fn started(size: usize) -> TriviaRound {
        let mut round = TriviaRound::new(bank(size), &TriviaConfig::default());
        round.start(&mut SmallRng::seed_from_u64(3)).unwrap();
        round
    }

    #[test]
    fn worked_scoring_example() {
        let cfg = TriviaConfig::default();
        assert_eq!(score_answer(100, 10, 2, &cfg), 195);
        assert_eq!(score_answer(100, 0, 0, &cfg), 110);
        // The multiplier caps at 1.5x.
        assert_eq!(score_answer(100, 0, 4, &cfg), 150);
        assert_eq!(score_answer(100, 0, 40, &cfg), 150);
    }

    #[test]
    fn streak_and_score_follow_answers() {
        let mut round = started(12);
        for _ in 0..5 {
            round.tick().unwrap();
        }
        let record = round.answer(0).unwrap().clone();
        assert!(record.correct);
        assert_eq!(record.remaining, 10);
        assert_eq!(record.points, 165);
        assert_eq!(round.streak(), 1);

        round.next_question().unwrap();
        round.answer(1).unwrap();
        assert_eq!(round.streak(), 0);
        assert_eq!(round.score(), 165);
    }

    #[test]
    fn answering_while_revealed_is_rejected() {
        let mut round = started(3);
        round.answer(0).unwrap();
        let err = round.answer(0).unwrap_err();
        assert!(err.is_silent());
        assert_eq!(round.history().len(), 1);
    }

    #[test]
    fn countdown_expiry_is_a_miss() {
        let mut round = started(3);
        round.answer(0).unwrap();
        round.next_question().unwrap();
        assert_eq!(round.streak(), 1);
        let mut last = Tick::Running { remaining: 15 };
        for _ in 0..15 {
            last = round.tick().unwrap();
        }
        assert_eq!(last, Tick::TimedOut);
        assert_eq!(round.streak(), 0);
        assert_eq!(round.history()[1].chosen, None);
        assert!(round.tick().is_err());
    }

    #[test]
    fn round_is_capped_and_graded() {
        let mut round = started(14);
        assert_eq!(round.total(), 10);
        let mut seen = std::collections::HashSet::new();
        while !round.is_finished() {
            let id = round.current().unwrap().id.clone();
            assert!(seen.insert(id), "question repeated");
            round.answer(0).unwrap();
            round.next_question().unwrap();
        }
        assert_eq!(round.grade(), Some("A+"));
        assert_eq!(round.correct_count(), 10);
    }

    #[test]
    fn small_bank_plays_every_question() {
        let round = started(4);
        assert_eq!(round.total(), 4);
    }

    #[test]
    fn grade_ladder() {
        assert_eq!(grade_for(10), "A+");
        assert_eq!(grade_for(8), "A");
        assert_eq!(grade_for(7), "B");
        assert_eq!(grade_for(6), "C");
        assert_eq!(grade_for(5), "D");
        assert_eq!(grade_for(4), "F");
    }

    #[test]
    fn snapshot_hides_answer_until_locked() {
        let mut round = started(2);
        assert_eq!(round.snapshot().question.unwrap().correct, None);
        round.answer(1).unwrap();
        assert_eq!(round.snapshot().question.unwrap().correct, Some(0));
    }
}
