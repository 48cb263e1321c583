pub mod analysis;
pub mod domain;
pub mod gamification;
pub mod generator;
pub mod ports;

pub use analysis::{analyze_weaknesses, AnalyzerPolicy, PerformanceSummary, WeaknessAnalyzer};
pub use domain::{
    Attempt, DifficultyConfig, GameMode, HiddenPart, LeaderboardEntry, Operator, Question,
    QuestionResult, Recommendation, Session, Settings, Streak,
};
pub use gamification::{difficulty_key, Leaderboard};
pub use generator::{generate_question, GeneratorPolicy, QuestionGenerator, DEFAULT_LOOKBACK};
pub use ports::{PortError, PortResult, RandomSource, SeededRandom, StorageService, ThreadRandom};
