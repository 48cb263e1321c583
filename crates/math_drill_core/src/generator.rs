//! crates/math_drill_core/src/generator.rs
//!
//! Procedural question generation.
//!
//! Candidates are drawn at random within the operand bounds of the chosen
//! operator and screened against a set of anti-monotony rules. A candidate
//! that fails a rule is discarded and a new one is drawn, up to a fixed
//! number of attempts. Generation never fails: when every attempt is
//! rejected the last candidate is served anyway, and if no candidate was
//! ever drawn the `1 + 1` fallback is returned.

use std::collections::HashSet;
use tracing::{debug, trace};
use crate::domain::{DifficultyConfig, GameMode, HiddenPart, Operator, Question, QuestionResult};
use crate::ports::RandomSource;

/// How many of the most recent questions are checked for repetition.
pub const DEFAULT_LOOKBACK: usize = 5;

/// Difficulty tiers. At a level above the lowest tier, questions whose
/// magnitude does not exceed the next lower tier are considered too easy.
pub const TIERS: [u32; 5] = [10, 20, 30, 50, 100];

//=========================================================================================
// Policy
//=========================================================================================

/// Tunable constants of the generation loop.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorPolicy {
    /// Upper bound on candidates drawn per question.
    pub max_attempts: u32,
    /// Probability that a trivial candidate (`a - a`, `a * 1`, ...) is kept.
    pub trivial_acceptance: f64,
    /// A repeat of the previous answer is rejected only while fewer than this many attempts were made.
    pub same_answer_retry_limit: u32,
    /// Enables the lower-tier filter (magnitude at or below the lower tier is rejected).
    pub tiering: bool,
    /// The lower-tier filter is lifted after this many attempts.
    pub tiering_retry_limit: u32,
}

impl Default for GeneratorPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            trivial_acceptance: 0.15,
            same_answer_retry_limit: 20,
            tiering: true,
            tiering_retry_limit: 30,
        }
    }
}

/// Why a candidate was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Trivial,
    Repeated,
    SameAnswer,
    Commuted,
    BelowTier,
}

/// The parts of the recent history the screening rules look at.
struct RecentWindow<'a> {
    displays: HashSet<&'a str>,
    last_answer: Option<u32>,
}

impl<'a> RecentWindow<'a> {
    fn new(history: &'a [QuestionResult], lookback: usize) -> Self {
        let window = &history[history.len().saturating_sub(lookback)..];
        Self {
            displays: window.iter().map(|r| r.question.display.as_str()).collect(),
            last_answer: window.last().map(|r| r.question.answer),
        }
    }
}

//=========================================================================================
// Generator
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct QuestionGenerator {
    policy: GeneratorPolicy,
}

impl QuestionGenerator {
    pub fn new(policy: GeneratorPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GeneratorPolicy {
        &self.policy
    }

    /// Produces one question for `config`, avoiding the last `lookback` entries of `history`.
    ///
    /// The configuration is normalized first (see [`DifficultyConfig::normalized`]).
    pub fn generate<R: RandomSource>(
        &self,
        config: &DifficultyConfig,
        history: &[QuestionResult],
        lookback: usize,
        mode: GameMode,
        rng: &mut R,
    ) -> Question {
        let config = config.normalized();
        let recent = RecentWindow::new(history, lookback);
        let lower_tier = if self.policy.tiering { lower_tier(config.max) } else { None };

        let mut last_candidate = None;
        for attempt in 0..self.policy.max_attempts {
            let candidate = draw(&config, mode, rng);
            match self.screen(&candidate, &recent, lower_tier, attempt, rng) {
                None => return candidate,
                Some(rejection) => {
                    trace!(question = %candidate.display, attempt, ?rejection, "candidate rejected");
                    last_candidate = Some(candidate);
                }
            }
        }

        debug!(
            config = %config,
            attempts = self.policy.max_attempts,
            "question generation exhausted its attempts, serving last candidate"
        );
        last_candidate.unwrap_or_else(Question::fallback)
    }

    fn screen<R: RandomSource>(
        &self,
        candidate: &Question,
        recent: &RecentWindow<'_>,
        lower_tier: Option<u32>,
        attempt: u32,
        rng: &mut R,
    ) -> Option<Rejection> {
        if candidate.is_trivial() && rng.unit() >= self.policy.trivial_acceptance {
            return Some(Rejection::Trivial);
        }

        if recent.displays.contains(candidate.display.as_str()) {
            return Some(Rejection::Repeated);
        }

        if recent.last_answer == Some(candidate.answer) && attempt < self.policy.same_answer_retry_limit {
            return Some(Rejection::SameAnswer);
        }

        if candidate.operator.is_commutative()
            && recent.displays.contains(candidate.swapped_display().as_str())
        {
            return Some(Rejection::Commuted);
        }

        if let Some(tier) = lower_tier {
            if attempt < self.policy.tiering_retry_limit && magnitude(candidate) <= tier {
                return Some(Rejection::BelowTier);
            }
        }

        None
    }
}

/// Generates a question with the default policy.
pub fn generate_question<R: RandomSource>(
    config: &DifficultyConfig,
    history: &[QuestionResult],
    lookback: usize,
    mode: GameMode,
    rng: &mut R,
) -> Question {
    QuestionGenerator::default().generate(config, history, lookback, mode, rng)
}

//=========================================================================================
// Candidate Construction
//=========================================================================================

fn draw<R: RandomSource>(config: &DifficultyConfig, mode: GameMode, rng: &mut R) -> Question {
    let operator = *rng.pick(&config.ops);
    let (num1, num2) = operands(operator, config.max, rng);
    let hidden_part = match mode {
        GameMode::Standard => HiddenPart::Answer,
        GameMode::Detective if rng.unit() >= 0.5 => HiddenPart::Num1,
        GameMode::Detective => HiddenPart::Num2,
    };
    Question::new(num1, num2, operator, hidden_part).unwrap_or_else(Question::fallback)
}

/// Draws operands so that the result stays within `[0, max]` and division is exact.
/// `max` is at least 1.
fn operands<R: RandomSource>(operator: Operator, max: u32, rng: &mut R) -> (u32, u32) {
    match operator {
        Operator::Add => {
            if max < 2 {
                return (0, 0);
            }
            let num1 = rng.int_in_range(1, max - 1);
            (num1, rng.int_in_range(1, max - num1))
        }
        Operator::Sub => {
            let num1 = rng.int_in_range(1, max);
            (num1, rng.int_in_range(1, num1))
        }
        Operator::Mul => {
            if max < 4 {
                return (rng.int_in_range(1, max), 1);
            }
            let num1 = rng.int_in_range(2, max / 2);
            (num1, factor_up_to(max / num1, rng))
        }
        Operator::Div => {
            if max < 4 {
                return (1, 1);
            }
            let answer = rng.int_in_range(2, max / 2);
            let divisor = factor_up_to(max / answer, rng);
            (answer * divisor, divisor)
        }
    }
}

fn factor_up_to<R: RandomSource>(cap: u32, rng: &mut R) -> u32 {
    if cap < 2 {
        1
    } else {
        rng.int_in_range(2, cap)
    }
}

fn lower_tier(max: u32) -> Option<u32> {
    TIERS.iter().rev().copied().find(|tier| *tier < max)
}

/// The number the tier filter compares: the result for `+`/`*`, the dividend or minuend otherwise.
fn magnitude(question: &Question) -> u32 {
    match question.operator {
        Operator::Add | Operator::Mul => question.answer,
        Operator::Sub | Operator::Div => question.num1,
    }
}
