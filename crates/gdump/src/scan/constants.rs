//! Scoring constants for registry detection
//!
//! # Scoring Strategy
//!
//! Every 8-byte aligned address of a data section is read as a hash-table
//! header. Headers with an implausible element count, capacity index or
//! list pointers are rejected outright. Survivors are scored additively:
//!
//! ```text
//!   declared size   500..=2000 → +100   200..=3000 → +50   else → +10
//!   per element     well-known root class → +50
//!                   nested method table plausible → +5
//!                   embedded name equals key → +10
//!                   first node has a predecessor → -20
//!   element totals  valid ≥ 15 → +100   ≥ 10 → +50   else 3 × valid
//!   nested totals   ≥ 10 → +80          ≥ 5 → +40
//! ```
//!
//! Thresholds were tuned against one engine build. A different layout is
//! indistinguishable from a missing registry.

/// Candidates must score strictly above this to be reported
pub const MIN_CANDIDATE_SCORE: i32 = 100;

/// Elements sampled from the candidate's list
pub const MAX_SAMPLED_ELEMENTS: u32 = 20;

/// Sample names kept per candidate
pub const MAX_SAMPLE_NAMES: usize = 5;

/// Accepted declared element counts
pub const MIN_DECLARED_SIZE: u32 = 10;
pub const MAX_DECLARED_SIZE: u32 = 10_000;

/// Capacity index must lie strictly inside this range
pub const MAX_CAPACITY_INDEX: u32 = 30;

/// Typical registry sizes
pub const TYPICAL_SIZE_RANGE: std::ops::RangeInclusive<u32> = 500..=2000;
pub const PLAUSIBLE_SIZE_RANGE: std::ops::RangeInclusive<u32> = 200..=3000;

pub const SCORE_TYPICAL_SIZE: i32 = 100;
pub const SCORE_PLAUSIBLE_SIZE: i32 = 50;
pub const SCORE_OTHER_SIZE: i32 = 10;

pub const PENALTY_HEAD_HAS_PREV: i32 = 20;
pub const SCORE_KNOWN_CLASS: i32 = 50;
pub const SCORE_NESTED_TABLE: i32 = 5;
pub const SCORE_NAME_MATCH: i32 = 10;

/// Nested method tables larger than this are treated as garbage
pub const MAX_NESTED_SIZE: u32 = 1000;

pub const SCORE_MANY_VALID: i32 = 100;
pub const SCORE_SOME_VALID: i32 = 50;
pub const SCORE_PER_VALID: i32 = 3;

pub const SCORE_MANY_NESTED: i32 = 80;
pub const SCORE_SOME_NESTED: i32 = 40;

/// Root classes present in every engine build
pub const KNOWN_CLASSES: &[&str] = &[
    "Object",
    "RefCounted",
    "Resource",
    "Node",
    "Node2D",
    "Node3D",
    "Control",
    "Sprite2D",
    "Camera2D",
    "Camera3D",
    "AudioStreamPlayer",
];

/// Bytes fetched at once while stepping through a section
pub const SCAN_CHUNK_SIZE: u64 = 0x1_0000;
