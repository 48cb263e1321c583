//! crates/math_drill_core/src/domain.rs
//!
//! Defines the pure, core data structures for the drill game.
//! The serialized field names follow the shape the game client persists,
//! so stored sessions round-trip through these types unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// Operators and Questions
//=========================================================================================

/// One of the four arithmetic operations a question can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl Operator {
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Short ASCII code, safe in URLs and storage keys.
    pub fn code(self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Sub => "sub",
            Operator::Mul => "mul",
            Operator::Div => "div",
        }
    }

    /// Human-readable name of the operation, used in recommendation texts.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Add => "addition",
            Operator::Sub => "subtraction",
            Operator::Mul => "multiplication",
            Operator::Div => "division",
        }
    }

    /// Evaluates `a <op> b`.
    ///
    /// Returns `None` when the result is not a non-negative integer: a negative
    /// difference, an overflow, or a division that leaves a remainder.
    pub fn apply(self, a: u32, b: u32) -> Option<u32> {
        match self {
            Operator::Add => a.checked_add(b),
            Operator::Sub => a.checked_sub(b),
            Operator::Mul => a.checked_mul(b),
            Operator::Div => {
                if b != 0 && a % b == 0 {
                    Some(a / b)
                } else {
                    None
                }
            }
        }
    }

    pub fn is_commutative(self) -> bool {
        matches!(self, Operator::Add | Operator::Mul)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Which part of the equation the player has to supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HiddenPart {
    Num1,
    Num2,
    #[default]
    Answer,
}

/// The play variant. In detective mode one of the operands is hidden instead of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Standard,
    Detective,
}

/// A single arithmetic problem. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub num1: u32,
    pub num2: u32,
    pub operator: Operator,
    pub answer: u32,
    /// Canonical `"num1 op num2"` text, used for display and de-duplication.
    #[serde(rename = "str", alias = "displayString")]
    pub display: String,
    #[serde(default)]
    pub hidden_part: HiddenPart,
}

impl Question {
    /// Builds a question, computing its answer. Returns `None` if the operands
    /// do not produce a non-negative integer result.
    pub fn new(num1: u32, num2: u32, operator: Operator, hidden_part: HiddenPart) -> Option<Self> {
        let answer = operator.apply(num1, num2)?;
        Some(Self {
            num1,
            num2,
            operator,
            answer,
            display: Self::display_for(num1, operator, num2),
            hidden_part,
        })
    }

    /// The statically known `1 + 1` question.
    pub fn fallback() -> Self {
        Self {
            num1: 1,
            num2: 1,
            operator: Operator::Add,
            answer: 2,
            display: Self::display_for(1, Operator::Add, 1),
            hidden_part: HiddenPart::Answer,
        }
    }

    pub fn display_for(num1: u32, operator: Operator, num2: u32) -> String {
        format!("{} {} {}", num1, operator, num2)
    }

    /// The display string with the operands swapped (`"num2 op num1"`).
    pub fn swapped_display(&self) -> String {
        Self::display_for(self.num2, self.operator, self.num1)
    }

    /// Whether the question is pedagogically degenerate: `a - a`, `a + 0`, `a * 1`, `a / 1`.
    pub fn is_trivial(&self) -> bool {
        match self.operator {
            Operator::Sub => self.num1 == self.num2,
            Operator::Add => self.num1 == 0 || self.num2 == 0,
            Operator::Mul => self.num1 == 1 || self.num2 == 1,
            Operator::Div => self.num2 == 1,
        }
    }
}

//=========================================================================================
// Answered Questions
//=========================================================================================

/// One wrong guess (or a skip) made while a question was on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub value: String,
    /// Seconds since the question was shown.
    pub time: f64,
    /// Seconds since the previous attempt, or since the question was shown.
    pub delta: f64,
}

impl Attempt {
    /// Sentinel `value` recorded when the player skips a question.
    pub const SKIPPED: &'static str = "SKIPPED";

    pub fn is_skip(&self) -> bool {
        self.value == Self::SKIPPED
    }
}

/// A question annotated with how the player handled it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    #[serde(flatten)]
    pub question: Question,
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub is_overtime: bool,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
}

impl QuestionResult {
    pub fn answered(question: Question, time: f64, is_overtime: bool, attempts: Vec<Attempt>) -> Self {
        Self {
            question,
            time: Some(time),
            is_overtime,
            attempts,
        }
    }

    /// True when at least one wrong attempt was recorded.
    pub fn was_missed(&self) -> bool {
        !self.attempts.is_empty()
    }
}

impl From<Question> for QuestionResult {
    fn from(question: Question) -> Self {
        Self {
            question,
            time: None,
            is_overtime: false,
            attempts: Vec::new(),
        }
    }
}

//=========================================================================================
// Difficulty Configuration
//=========================================================================================

/// Operand ceiling and allowed operators for a practice session.
///
/// Deserializes from a bare level (`20`), a legacy numeric string (`"20"`),
/// or an explicit `{ "max": 20, "ops": ["+", "*"] }` object. A bare level
/// implies the `+`/`-` operator set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DifficultyRepr")]
pub struct DifficultyConfig {
    pub max: u32,
    pub ops: Vec<Operator>,
}

impl DifficultyConfig {
    pub const DEFAULT_OPS: [Operator; 2] = [Operator::Add, Operator::Sub];

    pub fn new(max: u32, ops: impl Into<Vec<Operator>>) -> Self {
        Self { max, ops: ops.into() }
    }

    /// Applies the clamping policy: `max` is raised to at least 1, duplicate
    /// operators are dropped (first occurrence wins) and an empty operator
    /// list is replaced with `+`/`-`.
    pub fn normalized(&self) -> Self {
        let mut ops: Vec<Operator> = Vec::with_capacity(self.ops.len());
        for op in &self.ops {
            if !ops.contains(op) {
                ops.push(*op);
            }
        }
        if ops.is_empty() {
            ops.extend(Self::DEFAULT_OPS);
        }
        Self {
            max: self.max.max(1),
            ops,
        }
    }

    pub fn is_normalized(&self) -> bool {
        *self == self.normalized()
    }

    /// True when the operator set is the implicit `+`/`-` of a bare level.
    pub fn has_default_ops(&self) -> bool {
        self.ops.len() == Self::DEFAULT_OPS.len()
            && Self::DEFAULT_OPS.iter().all(|op| self.ops.contains(op))
    }
}

impl From<u32> for DifficultyConfig {
    fn from(max: u32) -> Self {
        Self::new(max, Self::DEFAULT_OPS)
    }
}

impl fmt::Display for DifficultyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops: Vec<&str> = self.ops.iter().map(|op| op.symbol()).collect();
        write!(f, "{} [{}]", self.max, ops.join(" "))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DifficultyRepr {
    Level(i64),
    Text(String),
    Custom {
        max: i64,
        #[serde(default)]
        ops: Vec<Operator>,
    },
}

fn clamp_level(level: i64) -> u32 {
    level.clamp(0, i64::from(u32::MAX)) as u32
}

impl TryFrom<DifficultyRepr> for DifficultyConfig {
    type Error = String;

    fn try_from(repr: DifficultyRepr) -> Result<Self, Self::Error> {
        match repr {
            DifficultyRepr::Level(level) => Ok(Self::from(clamp_level(level))),
            DifficultyRepr::Text(text) => text
                .trim()
                .parse::<i64>()
                .map(|level| Self::from(clamp_level(level)))
                .map_err(|_| format!("'{}' is not a valid difficulty level", text)),
            DifficultyRepr::Custom { max, ops } => Ok(Self::new(clamp_level(max), ops)),
        }
    }
}

//=========================================================================================
// Sessions and Recommendations
//=========================================================================================

/// One play session, as persisted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub difficulty: DifficultyConfig,
    /// Total elapsed seconds. Older clients stored this as a string.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub total_time: f64,
    #[serde(default)]
    pub questions: Vec<QuestionResult>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mode: GameMode,
}

impl Session {
    /// Starts an empty, in-progress session.
    pub fn start(difficulty: DifficultyConfig, mode: GameMode, device: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: now,
            difficulty,
            total_time: 0.0,
            questions: Vec::new(),
            completed: false,
            device: device.into(),
            ip: None,
            last_updated: None,
            mode,
        }
    }

    /// Replaces the question log with the client's latest state.
    pub fn record_progress(
        &mut self,
        questions: Vec<QuestionResult>,
        total_time: f64,
        completed: bool,
        now: DateTime<Utc>,
    ) {
        self.questions = questions;
        self.total_time = total_time;
        self.completed = completed;
        self.last_updated = Some(now);
    }

    /// Number of questions that needed more than one try.
    pub fn mistakes(&self) -> usize {
        self.questions.iter().filter(|q| q.was_missed()).count()
    }
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(f64),
        Text(String),
    }

    Ok(match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => n,
        Seconds::Text(text) => text.trim().parse().unwrap_or_else(|_| {
            warn!(total_time = %text, "unreadable session duration, counting it as zero");
            0.0
        }),
    })
}

/// A single practice suggestion produced by the weakness analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub description: String,
    pub reason: String,
    pub config: DifficultyConfig,
}

//=========================================================================================
// Player Profile
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub question_count: u32,
    pub time_minutes: u32,
    pub dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            question_count: 48,
            time_minutes: 10,
            dark_mode: false,
        }
    }
}

/// Consecutive-day play streak.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub current_streak: u32,
    pub max_streak: u32,
    pub last_played_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub date: DateTime<Utc>,
    /// Total seconds for the game.
    pub time: u32,
    pub mistakes: u32,
}
