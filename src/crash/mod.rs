//! Diagnostic callbacks surfaced in host fault reports

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// A named diagnostic callback the host invokes while writing a fault report
pub trait CrashCallable: Send + Sync {
    fn label(&self) -> &str;

    fn call(&self) -> String;
}

/// Append-only registry of crash callables
///
/// Clones share the same registry, so the host keeps one clone while the
/// orchestrator registers into another. Labels are unique: registering a
/// label a second time keeps the first callable.
#[derive(Clone, Default)]
pub struct CrashReporter {
    callables: Arc<DashMap<String, Arc<dyn CrashCallable>>>,
}

impl CrashReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the label was already registered
    pub fn register<C: CrashCallable + 'static>(&self, callable: C) -> bool {
        let label = callable.label().to_string();
        match self.callables.entry(label) {
            Entry::Occupied(entry) => {
                tracing::debug!("Crash callable '{}' already registered", entry.key());
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(callable));
                true
            }
        }
    }

    /// Invoke every callable, sorted by label
    pub fn report(&self) -> Vec<(String, String)> {
        let callables: Vec<_> = self
            .callables
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut lines: Vec<_> = callables
            .into_iter()
            .map(|(label, callable)| (label, callable.call()))
            .collect();
        lines.sort();
        lines
    }

    pub fn contains(&self, label: &str) -> bool {
        self.callables.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.callables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }
}

/// Reports the module's name and version
pub struct ModuleVersionInfo {
    label: String,
    version: String,
}

impl ModuleVersionInfo {
    pub fn new(display_name: &str, version: impl Into<String>) -> Self {
        Self {
            label: format!("{display_name} Version"),
            version: version.into(),
        }
    }
}

impl CrashCallable for ModuleVersionInfo {
    fn label(&self) -> &str {
        &self.label
    }

    fn call(&self) -> String {
        self.version.clone()
    }
}

/// Reports which integrations ended up active
pub struct IntegrationCrashInfo {
    label: String,
    describe: Box<dyn Fn() -> String + Send + Sync>,
}

impl IntegrationCrashInfo {
    pub fn new<F>(display_name: &str, describe: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            label: format!("{display_name} Integration"),
            describe: Box::new(describe),
        }
    }
}

impl CrashCallable for IntegrationCrashInfo {
    fn label(&self) -> &str {
        &self.label
    }

    fn call(&self) -> String {
        (self.describe)()
    }
}
