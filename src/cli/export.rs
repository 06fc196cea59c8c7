//! DPO dataset export command

use super::helpers::{ensure_exists, GlobalArgs};
use anyhow::{Context, Result};
use designpref_core::{
    dataset::{
        loader::{self, SnapshotSource},
        real_pairs_from_events,
    },
    DatasetAssembler, SyntheticPreferenceGenerator,
};
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct ExportArgs {
    pub rules: Option<PathBuf>,
    pub events: Option<PathBuf>,
    pub snapshots: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub no_synthetic: bool,
    pub seed: Option<u64>,
}

/// Handle `export`
pub fn handle(global: &GlobalArgs, args: ExportArgs) -> Result<()> {
    if args.rules.is_none() && args.events.is_none() {
        anyhow::bail!("Nothing to export: pass --rules and/or --events");
    }

    let config = global.load_config()?;
    let mut dataset_config = config.dataset.clone();
    if args.no_synthetic {
        dataset_config.include_synthetic = false;
    }
    if let Some(seed) = args.seed {
        dataset_config.seed = seed;
    }
    let assembler = DatasetAssembler::new(dataset_config);

    let real = match &args.events {
        Some(events_path) => {
            ensure_exists(events_path, "Events file")?;
            let events = loader::load_events(events_path)
                .with_context(|| format!("Failed to read events from {}", events_path.display()))?;
            if args.snapshots.is_empty() {
                warn!("No snapshot sources given; every event will be skipped");
            }
            let sources: Vec<SnapshotSource> =
                args.snapshots.iter().map(SnapshotSource::from_path).collect();
            let snapshots = loader::load_snapshots(&sources);
            real_pairs_from_events(&events, &snapshots)
        }
        None => Vec::new(),
    };

    let synthetic = match &args.rules {
        Some(rules_path) if assembler.config().include_synthetic => {
            ensure_exists(rules_path, "Rules file")?;
            let (classifier, _) = global.open_classifier(&config)?;
            let generator = SyntheticPreferenceGenerator::new(config.generator.clone(), classifier);
            let batches = loader::load_rule_batches(rules_path)
                .with_context(|| format!("Failed to read rules from {}", rules_path.display()))?;
            assembler.synthetic_pairs(&generator, &batches)?
        }
        Some(_) => {
            debug!("Synthetic pairs disabled, ignoring rules file");
            Vec::new()
        }
        None => Vec::new(),
    };

    let metadata = assembler
        .export(real, synthetic, &args.output_dir)
        .with_context(|| format!("Failed to export dataset to {}", args.output_dir.display()))?;

    println!(
        "Exported {} pairs ({} real, {} synthetic) to {}",
        metadata.total_pairs,
        metadata.real_pairs,
        metadata.synthetic_pairs,
        args.output_dir.display()
    );
    println!(
        "  train: {}  val: {}  test: {}",
        metadata.train_count, metadata.val_count, metadata.test_count
    );
    Ok(())
}
