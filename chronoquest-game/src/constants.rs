//! Centralized balance and tuning constants for ChronoQuest game logic.
//!
//! These values define the deterministic math for the progression and
//! classmate-simulation cores. Keeping them together ensures that gameplay
//! can only be adjusted via code changes reviewed in version control,
//! rather than through external JSON assets.

// Energy & scoring ---------------------------------------------------------
pub const MAX_ENERGY: i32 = 3;
pub const QUIZ_POINTS: u32 = 100;
pub const MATERIAL_POINTS: u32 = 50;
/// Exclusive upper bound of the cosmetic per-advance bot bonus.
pub const BOT_BONUS_POINTS_MAX: u32 = 20;

// Classmate simulation tuning ----------------------------------------------
pub(crate) const MATERIAL_ADVANCE_THRESHOLD: f64 = 0.45;
pub(crate) const QUIZ_ADVANCE_THRESHOLD: f64 = 0.6;
pub(crate) const QUIZ_FAIL_THRESHOLD: f64 = 0.2;
pub const SIM_TICK_MS: u64 = 4_000;
pub const ROSTER_POLL_MS: u64 = 8_000;

// Feedback & transition delays ---------------------------------------------
pub const ADVANCE_DELAY_MS: u64 = 2_000;
pub const RETRY_DELAY_MS: u64 = 3_000;
pub const DEFEAT_DELAY_MS: u64 = 2_000;
pub const ARTIFACT_DELAY_MS: u64 = 1_500;
pub const TRANSITION_EXIT_MS: u64 = 500;
pub const TRANSITION_SETTLE_MS: u64 = 50;

// Chat cadence -------------------------------------------------------------
pub const CHAT_GREETING_DELAY_MS: u64 = 1_000;
pub const CHAT_BEAT_MS: u64 = 15_000;
pub(crate) const CHAT_BEAT_CHANCE: f64 = 0.2;
pub(crate) const CHAT_REPLY_DELAY_MS: u64 = 1_500;
pub(crate) const CHAT_REPLY_JITTER_MS: u64 = 1_000;

// Feed caps ----------------------------------------------------------------
pub(crate) const MONITOR_FEED_CAP: usize = 20;
pub(crate) const CHAT_FEED_CAP: usize = 50;

// Content fallbacks --------------------------------------------------------
pub(crate) const FALLBACK_FACT: &str =
    "Did you know? Cordoba held the largest library of its age.";
pub(crate) const FALLBACK_REPLY: &str = "Focused on the quiz right now!";
pub(crate) const CHAT_GREETING: &str =
    "Comm-link online. Welcome to the class channel.";
