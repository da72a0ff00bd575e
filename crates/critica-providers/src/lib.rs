//! critica-providers: external collaborators for the critica engine.
//!
//! Implements `ClaimVerifier` against the Google Fact Check Tools API and
//! `TextGenerator` against OpenAI-compatible chat completions, plus mocks
//! and the TOML configuration that wires them into an `Engine`.

pub mod config;
pub mod error;
pub mod factcheck;
pub mod mock;
pub mod openai;

pub use config::{
    create_generator, create_verifier, engine_from_config, load_config, load_config_from,
    parse_config, CriticaConfig, FactCheckConfig, GeneratorConfig, SAMPLE_CONFIG,
};
pub use error::ProviderError;
