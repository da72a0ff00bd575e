//! critica-core: critical-thinking analysis engine.
//!
//! Detects rhetorical and argumentative weaknesses in reading passages and
//! student answers, scores them, checks claims against an external
//! fact-check collaborator, sanitizes generated text and parses didactic
//! explanations into sections.

pub mod answer;
pub mod document;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod patterns;
pub mod report;
pub mod sanitize;
pub mod statistics;
pub mod text;
pub mod traits;
pub mod verification;

pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, ProviderError};
pub use patterns::analyze_local_patterns;
