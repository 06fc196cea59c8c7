//! Designpref - reward shaping and preference data for design suggestions
//!
//! Turns logged design-suggestion interactions and extracted design rules
//! into training data for preference optimization:
//! - Scalar rewards from user responses, edit magnitude and response time
//! - An episode state machine over design snapshots
//! - Heuristic synthetic preference pairs from unlabeled rule batches
//! - Dimension classification with learned per-platform keywords
//! - DPO dataset assembly (real + synthetic, seeded splits)
//!
//! # Architecture
//!
//! - **Types**: Rules, preference pairs, interaction events
//! - **Reward / Environment**: Reward model and episode bookkeeping
//! - **Classifier**: Dimension classifier shared behind a lock
//! - **Generator**: Grouping, pairing strategies, DPO formatting
//! - **Dataset**: JSONL loaders, real pairs, merge/split/export
//!
//! # Example
//!
//! ```ignore
//! use designpref_core::{GeneratorConfig, SharedClassifier, SyntheticPreferenceGenerator};
//!
//! fn main() -> designpref_core::Result<()> {
//!     let config = GeneratorConfig::default();
//!     let generator = SyntheticPreferenceGenerator::new(config, SharedClassifier::default());
//!     let pairs = generator.generate_preferences(&rules, None, None)?;
//!     let dpo = designpref_core::format_for_dpo(&pairs, true, true);
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod environment;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod reward;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use classifier::{ClassificationResult, DimensionClassifier, SharedClassifier};
pub use config::PipelineConfig;
pub use dataset::{DatasetAssembler, DatasetConfig};
pub use environment::DesignEnvironment;
pub use error::{DesignPrefError, Result};
pub use generator::strategies::Strategy;
pub use generator::{
    format_for_dpo, group_statistics, DpoExample, GeneratorConfig, SyntheticPreferenceGenerator,
};
pub use reward::{Reward, RewardModel, RewardWeights};
pub use types::{
    AbstractionLevel, ChangeRecord, PreferenceEvent, PreferencePair, PreferenceSource, Rule,
    RuleScope, TraceBatch, TraceContext, UserResponse,
};
