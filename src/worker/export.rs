//! Item-name export service

use crate::config::{ExportConfig, ExportMode};
use anyhow::Context;
use std::fs;
use std::path::PathBuf;

const EXPORT_DIRECTORY: &str = "export";
const EXPORT_FILE: &str = "item_names.csv";
const CACHE_FILE: &str = "cache.txt";

/// One exported row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub key: String,
    pub display_name: String,
    /// Module that contributed the entry
    pub origin: String,
}

/// Supplies the rows to export; queried once on the coordination thread
pub trait ExportSource: Send + Sync {
    fn entries(&self) -> Vec<ExportEntry>;

    /// Changes whenever the exported content would change
    fn fingerprint(&self) -> String;
}

/// Writes a CSV of item names below the recipe directory
///
/// Holds a snapshot of everything it needs, never live configuration.
#[derive(Debug, Clone)]
pub struct ExportProcess {
    recipe_directory: PathBuf,
    config: ExportConfig,
    entries: Vec<ExportEntry>,
    fingerprint: String,
}

impl ExportProcess {
    pub fn new(recipe_directory: PathBuf, config: ExportConfig, source: &dyn ExportSource) -> Self {
        Self {
            recipe_directory,
            config,
            entries: source.entries(),
            fingerprint: source.fingerprint(),
        }
    }

    pub fn export_directory(&self) -> PathBuf {
        self.recipe_directory.join(EXPORT_DIRECTORY)
    }

    /// Returns `true` when the CSV was (re)written
    pub fn run(self) -> anyhow::Result<bool> {
        let directory = self.export_directory();
        let cache_path = directory.join(CACHE_FILE);

        if !self.config.force_refresh {
            if let Ok(cached) = fs::read_to_string(&cache_path) {
                if cached.trim() == self.fingerprint {
                    tracing::info!("Export cache is current, skipping");
                    return Ok(false);
                }
            }
        }

        fs::create_dir_all(&directory)
            .with_context(|| format!("creating {}", directory.display()))?;

        let csv = self.render();
        let export_path = directory.join(EXPORT_FILE);
        fs::write(&export_path, csv).with_context(|| format!("writing {}", export_path.display()))?;
        fs::write(&cache_path, &self.fingerprint)
            .with_context(|| format!("writing {}", cache_path.display()))?;

        tracing::info!(
            "Exported {} entries to {}",
            self.entries.len(),
            export_path.display()
        );
        Ok(true)
    }

    fn render(&self) -> String {
        let debug = self.config.mode == ExportMode::Debug;
        let mut out = String::from(if debug {
            "key,display name,origin\n"
        } else {
            "key,display name\n"
        });

        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        for entry in &entries {
            out.push_str(&escape(&entry.key));
            out.push(',');
            out.push_str(&escape(&entry.display_name));
            if debug {
                out.push(',');
                out.push_str(&escape(&entry.origin));
            }
            out.push('\n');
        }
        out
    }
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
