//! Schema validation command

use super::helpers::ensure_exists;
use anyhow::{Context, Result};
use clap::ValueEnum;
use designpref_core::validation::{validate_preferences_file, validate_rules_file};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileKind {
    Rules,
    Preferences,
}

/// Handle `validate`
pub fn handle(file: &Path, kind: FileKind) -> Result<()> {
    ensure_exists(file, "File")?;
    let report = match kind {
        FileKind::Rules => validate_rules_file(file),
        FileKind::Preferences => validate_preferences_file(file),
    }
    .with_context(|| format!("INVALID: {}", file.display()))?;

    if report.is_valid() {
        println!("VALID: {}", file.display());
    } else {
        println!("INVALID: {}", file.display());
        for item in &report.errors {
            println!("  Item {}: {}", item.index, item.errors.join(", "));
        }
    }
    println!("  Valid items: {}/{}", report.valid, report.total);

    report.into_result()?;
    Ok(())
}
