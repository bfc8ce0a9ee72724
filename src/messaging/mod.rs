//! Inter-module message routing
//!
//! Processors are registered by key when the orchestrator is built. Each
//! delivery constructs a fresh [`ImcHandler`] over that table, so nothing
//! carries over between deliveries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A message sent by another module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImcMessage {
    pub sender: String,
    pub key: String,
    pub value: serde_json::Value,
}

impl ImcMessage {
    pub fn new(sender: impl Into<String>, key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            sender: sender.into(),
            key: key.into(),
            value,
        }
    }
}

/// The batch of messages delivered in one inter-module phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImcEvent {
    pub messages: Vec<ImcMessage>,
}

/// Handles every message sent under one key
pub trait ImcProcessor: Send + Sync {
    fn process(&self, message: &ImcMessage) -> anyhow::Result<()>;
}

/// Key → processor table shared by all handlers
#[derive(Clone, Default)]
pub struct ImcProcessors {
    processors: Arc<HashMap<String, Arc<dyn ImcProcessor>>>,
}

impl ImcProcessors {
    pub fn builder() -> ImcProcessorsBuilder {
        ImcProcessorsBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

#[derive(Default)]
pub struct ImcProcessorsBuilder {
    processors: HashMap<String, Arc<dyn ImcProcessor>>,
}

impl ImcProcessorsBuilder {
    pub fn register(mut self, key: impl Into<String>, processor: Arc<dyn ImcProcessor>) -> Self {
        self.processors.insert(key.into(), processor);
        self
    }

    pub fn build(self) -> ImcProcessors {
        ImcProcessors {
            processors: Arc::new(self.processors),
        }
    }
}

/// Outcome of one delivery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImcSummary {
    pub processed: usize,
    pub unknown: usize,
    pub failed: usize,
}

/// Routes one event's messages to their processors
pub struct ImcHandler<'a> {
    processors: &'a ImcProcessors,
}

impl<'a> ImcHandler<'a> {
    pub fn new(processors: &'a ImcProcessors) -> Self {
        Self { processors }
    }

    pub fn handle(&self, event: &ImcEvent) -> ImcSummary {
        let mut summary = ImcSummary::default();

        for message in &event.messages {
            let Some(processor) = self.processors.processors.get(&message.key) else {
                tracing::warn!(
                    "Bad IMC key '{}' from {}",
                    message.key,
                    message.sender
                );
                summary.unknown += 1;
                continue;
            };

            match processor.process(message) {
                Ok(()) => summary.processed += 1,
                Err(e) => {
                    tracing::error!(
                        "IMC '{}' from {} failed: {:#}",
                        message.key,
                        message.sender,
                        e
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
