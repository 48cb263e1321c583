//! crates/math_drill_core/src/analysis.rs
//!
//! The "smart trainer": aggregates recent sessions per operator and turns the
//! worst error rate into a single practice recommendation.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::debug;
use crate::domain::{DifficultyConfig, Operator, Recommendation, Session};

const TITLE: &str = "Smart trainer suggests";

//=========================================================================================
// Policy
//=========================================================================================

/// Thresholds of the analysis. All are tunable; the defaults favour giving
/// no advice over advice drawn from too little data.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerPolicy {
    /// Only sessions started within this many days are considered.
    pub window_days: i64,
    /// Fewer recent sessions than this yields no recommendation.
    pub min_sessions: usize,
    /// Operators with fewer answered questions than this are ignored.
    pub min_op_samples: usize,
    /// An operator is weak when its error rate is strictly above this.
    pub error_threshold: f64,
    /// Operand ceiling of a weakness drill.
    pub focus_max: u32,
    /// Average seconds per answer above which a speed drill is suggested.
    pub slow_answer_seconds: f64,
    /// Operand ceiling of the "increase challenge" drill.
    pub challenge_max: u32,
}

impl Default for AnalyzerPolicy {
    fn default() -> Self {
        Self {
            window_days: 14,
            min_sessions: 3,
            min_op_samples: 5,
            error_threshold: 0.15,
            focus_max: 30,
            slow_answer_seconds: 6.0,
            challenge_max: 50,
        }
    }
}

//=========================================================================================
// Aggregation
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorStats {
    pub total: usize,
    /// Questions with at least one wrong attempt.
    pub missed: usize,
}

impl OperatorStats {
    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.missed as f64 / self.total as f64
        }
    }
}

/// Totals over a set of sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceSummary {
    pub sessions: usize,
    pub questions: usize,
    pub missed: usize,
    /// Sum of answer times over the questions that carry one.
    pub answer_seconds: f64,
    pub timed_questions: usize,
    pub by_operator: BTreeMap<Operator, OperatorStats>,
}

impl PerformanceSummary {
    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Self {
        let mut summary = Self::default();
        for session in sessions {
            summary.sessions += 1;
            for result in &session.questions {
                let stats = summary.by_operator.entry(result.question.operator).or_default();
                stats.total += 1;
                summary.questions += 1;
                if result.was_missed() {
                    stats.missed += 1;
                    summary.missed += 1;
                }
                if let Some(time) = result.time {
                    summary.answer_seconds += time;
                    summary.timed_questions += 1;
                }
            }
        }
        summary
    }

    pub fn error_rate(&self) -> f64 {
        OperatorStats {
            total: self.questions,
            missed: self.missed,
        }
        .error_rate()
    }

    pub fn average_answer_seconds(&self) -> Option<f64> {
        (self.timed_questions > 0).then(|| self.answer_seconds / self.timed_questions as f64)
    }
}

//=========================================================================================
// Analyzer
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct WeaknessAnalyzer {
    policy: AnalyzerPolicy,
}

impl WeaknessAnalyzer {
    pub fn new(policy: AnalyzerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AnalyzerPolicy {
        &self.policy
    }

    /// Recommends one practice drill from the sessions of the last `window_days` before `now`.
    ///
    /// Returns `None` when there are fewer than `min_sessions` recent sessions with
    /// answered questions. Otherwise a recommendation is always produced: a drill on
    /// the weakest operator if one is above the error threshold, else a filler drill.
    pub fn analyze(&self, sessions: &[Session], now: DateTime<Utc>) -> Option<Recommendation> {
        let cutoff = now - Duration::days(self.policy.window_days);
        let recent: Vec<&Session> = sessions
            .iter()
            .filter(|s| s.date >= cutoff && !s.questions.is_empty())
            .collect();

        if recent.len() < self.policy.min_sessions {
            debug!(
                recent = recent.len(),
                required = self.policy.min_sessions,
                "not enough recent sessions to analyze"
            );
            return None;
        }

        let summary = PerformanceSummary::from_sessions(recent.iter().copied());

        if let Some((operator, rate)) = self.weakest_operator(&summary) {
            debug!(%operator, rate, "weak operator detected");
            return Some(self.weakness_drill(operator, rate));
        }

        match summary.average_answer_seconds() {
            Some(average) if average > self.policy.slow_answer_seconds => {
                most_played_difficulty(&recent).map(|config| self.speed_drill(config, average))
            }
            _ => Some(self.challenge_drill(&summary)),
        }
    }

    /// The operator with the highest error rate above the threshold, among those
    /// with enough samples. Ties keep the first operator in `+ - * /` order.
    fn weakest_operator(&self, summary: &PerformanceSummary) -> Option<(Operator, f64)> {
        let mut weakest: Option<(Operator, f64)> = None;
        for (operator, stats) in &summary.by_operator {
            if stats.total < self.policy.min_op_samples {
                continue;
            }
            let rate = stats.error_rate();
            if rate <= self.policy.error_threshold {
                continue;
            }
            if weakest.map_or(true, |(_, worst)| rate > worst) {
                weakest = Some((*operator, rate));
            }
        }
        weakest
    }

    fn weakness_drill(&self, operator: Operator, rate: f64) -> Recommendation {
        Recommendation {
            id: format!("trainer-weakness-{}", operator.name()),
            title: TITLE.to_string(),
            description: format!("Good work overall, but {} needs extra attention.", operator.name()),
            reason: format!("Error rate in {}: {:.0}%", operator.name(), rate * 100.0),
            config: DifficultyConfig::new(self.policy.focus_max, [operator]),
        }
    }

    fn speed_drill(&self, config: DifficultyConfig, average: f64) -> Recommendation {
        Recommendation {
            id: "trainer-speed".to_string(),
            title: TITLE.to_string(),
            description: format!("You are accurate up to {}. Now let's go faster!", config.max),
            reason: format!("Average time per answer: {:.1}s", average),
            config,
        }
    }

    fn challenge_drill(&self, summary: &PerformanceSummary) -> Recommendation {
        Recommendation {
            id: "trainer-challenge".to_string(),
            title: TITLE.to_string(),
            description: "Great shape! Time to raise the bar.".to_string(),
            reason: format!(
                "No weak spot in {} recent questions (error rate {:.0}%)",
                summary.questions,
                summary.error_rate() * 100.0
            ),
            config: DifficultyConfig::new(self.policy.challenge_max, DifficultyConfig::DEFAULT_OPS),
        }
    }
}

/// The difficulty played in the most sessions. Ties go to the one played most recently.
fn most_played_difficulty(sessions: &[&Session]) -> Option<DifficultyConfig> {
    let mut played: Vec<(DifficultyConfig, usize, DateTime<Utc>)> = Vec::new();
    for session in sessions {
        let config = session.difficulty.normalized();
        match played.iter_mut().find(|(c, _, _)| *c == config) {
            Some((_, count, latest)) => {
                *count += 1;
                *latest = (*latest).max(session.date);
            }
            None => played.push((config, 1, session.date)),
        }
    }
    played
        .into_iter()
        .max_by_key(|(_, count, latest)| (*count, *latest))
        .map(|(config, _, _)| config)
}

/// Analyzes with the default policy.
pub fn analyze_weaknesses(sessions: &[Session], now: DateTime<Utc>) -> Option<Recommendation> {
    WeaknessAnalyzer::default().analyze(sessions, now)
}
