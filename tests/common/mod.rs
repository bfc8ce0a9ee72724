//! Shared fakes for lifecycle scenario tests.

#![allow(dead_code)]

use modhost_lifecycle::config::ModuleIdentity;
use modhost_lifecycle::lifecycle::{
    CapabilityProbe, CategoryRegistry, ClientHooks, CommandFactory, HostEnvironment, InitContext,
    IntegrationRegistry, LifecycleError, LifecycleOrchestrator, NetworkRegistry, PostInitContext,
    PreInitContext, ServerCommand, ServerHandle, SlotRegistry, Subsystem, TickScheduler,
    WorldState, WorldStateProvider,
};
use modhost_lifecycle::messaging::{ImcMessage, ImcProcessor};
use modhost_lifecycle::worker::{ExportEntry, ExportSource};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Ordered record of every outbound call the orchestrator makes
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

pub struct FakeProbe {
    loaded: HashSet<String>,
}

impl CapabilityProbe for FakeProbe {
    fn is_module_loaded(&self, module_id: &str) -> bool {
        self.loaded.contains(module_id)
    }
}

pub struct FakeHost {
    client: bool,
    journal: Journal,
}

impl HostEnvironment for FakeHost {
    fn is_client(&self) -> bool {
        self.client
    }

    fn notify_missing_dependency(&self, module_id: &str, dependency: &str) {
        self.journal
            .push(format!("notice:{module_id}:{dependency}"));
    }
}

pub struct FakeCategories(Journal);

impl CategoryRegistry for FakeCategories {
    fn register_main(&self, _module_id: &str) {
        self.0.push("category:main");
    }

    fn register_facades(&self, _module_id: &str) {
        self.0.push("category:facades");
    }
}

pub struct FakeSlots(Journal);

impl SlotRegistry for FakeSlots {
    fn register_slot_type(&self, slot_type: &str) -> bool {
        self.0.push(format!("slot:type:{slot_type}"));
        true
    }

    fn assign_slot(&self, slot_type: &str) -> bool {
        self.0.push(format!("slot:assign:{slot_type}"));
        true
    }
}

pub struct FakeNetwork(Journal);

impl NetworkRegistry for FakeNetwork {
    fn register_gui_handler(&self, module_id: &str) {
        self.0.push(format!("network:gui:{module_id}"));
    }

    fn open_channel(&self, module_id: &str) {
        self.0.push(format!("network:channel:{module_id}"));
    }
}

pub struct FakeIntegrations(Journal);

#[async_trait::async_trait]
impl IntegrationRegistry for FakeIntegrations {
    async fn init(&self) -> anyhow::Result<()> {
        self.0.push("integrations:init");
        Ok(())
    }

    async fn post_init(&self) -> anyhow::Result<()> {
        self.0.push("integrations:post_init");
        Ok(())
    }

    fn describe(&self) -> String {
        "slots: on".to_string()
    }
}

pub struct FakeClient(Journal);

#[async_trait::async_trait]
impl ClientHooks for FakeClient {
    async fn pre_init(&self) -> anyhow::Result<()> {
        self.0.push("client:pre_init");
        Ok(())
    }

    async fn init(&self) -> anyhow::Result<()> {
        self.0.push("client:init");
        Ok(())
    }

    async fn post_init(&self) -> anyhow::Result<()> {
        self.0.push("client:post_init");
        Ok(())
    }
}

pub struct FakeWorld(Journal);

impl WorldState for FakeWorld {
    fn on_server_stopping(&mut self) {
        self.0.push("world:stopping");
    }

    fn on_server_stopped(&mut self) {
        self.0.push("world:stopped");
    }
}

pub struct FakeWorldProvider(Journal);

impl WorldStateProvider for FakeWorldProvider {
    fn on_server_about_to_start(&self) -> Box<dyn WorldState> {
        self.0.push("world:about_to_start");
        Box::new(FakeWorld(self.0.clone()))
    }
}

#[derive(Default)]
pub struct FakeTicker {
    pub shutdowns: AtomicUsize,
}

impl TickScheduler for FakeTicker {
    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct AdminCommand {
    name: String,
}

impl ServerCommand for AdminCommand {
    fn name(&self) -> &str {
        &self.name
    }
}

pub struct FakeCommands;

impl CommandFactory for FakeCommands {
    fn create(&self, _server: &dyn ServerHandle) -> Box<dyn ServerCommand> {
        Box::new(AdminCommand {
            name: "storage".to_string(),
        })
    }
}

pub struct FakeServer(pub Journal);

impl ServerHandle for FakeServer {
    fn name(&self) -> String {
        "integrated".to_string()
    }

    fn register_command(&self, command: Box<dyn ServerCommand>) {
        self.0.push(format!("command:{}", command.name()));
    }
}

pub struct RecordingSubsystem(pub Journal);

#[async_trait::async_trait]
impl Subsystem for RecordingSubsystem {
    async fn pre_init(&mut self, ctx: &PreInitContext<'_>) -> Result<(), LifecycleError> {
        assert!(ctx.config_directory.ends_with("storage"));
        self.0.push("subsystem:pre_init");
        Ok(())
    }

    async fn init(&mut self, ctx: &InitContext<'_>) -> Result<(), LifecycleError> {
        assert!(ctx.recipe_directory.ends_with("recipes"));
        self.0.push("subsystem:init");
        Ok(())
    }

    async fn post_init(&mut self, _ctx: &PostInitContext<'_>) -> Result<(), LifecycleError> {
        self.0.push("subsystem:post_init");
        Ok(())
    }
}

pub struct PanickingSubsystem;

#[async_trait::async_trait]
impl Subsystem for PanickingSubsystem {
    async fn init(&mut self, _ctx: &InitContext<'_>) -> Result<(), LifecycleError> {
        panic!("subsystem bug");
    }
}

pub struct FailingSubsystem;

#[async_trait::async_trait]
impl Subsystem for FailingSubsystem {
    async fn init(&mut self, _ctx: &InitContext<'_>) -> Result<(), LifecycleError> {
        Err(LifecycleError::init_failed("recipe index unreadable"))
    }
}

/// Records every message routed to it
pub struct RecordingProcessor(pub Journal);

impl ImcProcessor for RecordingProcessor {
    fn process(&self, message: &ImcMessage) -> anyhow::Result<()> {
        let name = message
            .value
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("expected a block name"))?;
        self.0.push(format!("imc:{}:{}", message.sender, name));
        Ok(())
    }
}

/// Counts ERROR-level events seen while installed
#[derive(Clone, Default)]
pub struct ErrorCounter(pub Arc<AtomicUsize>);

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub struct FixedExportSource;

impl ExportSource for FixedExportSource {
    fn entries(&self) -> Vec<ExportEntry> {
        vec![ExportEntry {
            key: "storage:cell".to_string(),
            display_name: "Storage Cell".to_string(),
            origin: "storage".to_string(),
        }]
    }

    fn fingerprint(&self) -> String {
        "fixture".to_string()
    }
}

pub fn identity() -> ModuleIdentity {
    ModuleIdentity::new("storage", "1.2.3")
        .with_display_name("Storage")
        .with_required_companion("storage-core")
        .with_slot_integration("slots", "Terminal")
}

/// Knobs for building an orchestrator over fakes
pub struct Fixture {
    pub journal: Journal,
    pub ticker: Arc<FakeTicker>,
    pub loaded: Vec<&'static str>,
    pub client: bool,
    pub export: bool,
    pub panic_in_init: bool,
    pub fail_in_init: bool,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            journal: Journal::default(),
            ticker: Arc::new(FakeTicker::default()),
            loaded: vec!["storage-core"],
            client: false,
            export: false,
            panic_in_init: false,
            fail_in_init: false,
        }
    }
}

impl Fixture {
    pub fn build(&self) -> LifecycleOrchestrator {
        let journal = &self.journal;
        let mut builder = LifecycleOrchestrator::builder(identity())
            .capability_probe(Arc::new(FakeProbe {
                loaded: self.loaded.iter().map(|s| s.to_string()).collect(),
            }))
            .host(Arc::new(FakeHost {
                client: self.client,
                journal: journal.clone(),
            }))
            .categories(Arc::new(FakeCategories(journal.clone())))
            .network(Arc::new(FakeNetwork(journal.clone())))
            .integrations(Arc::new(FakeIntegrations(journal.clone())))
            .world_state(Arc::new(FakeWorldProvider(journal.clone())))
            .tick_scheduler(self.ticker.clone())
            .commands(Arc::new(FakeCommands))
            .slot_registry(Arc::new(FakeSlots(journal.clone())))
            .client_hooks(Arc::new(FakeClient(journal.clone())))
            .imc_processor("register-block", Arc::new(RecordingProcessor(journal.clone())))
            .subsystem(
                Arc::new(RwLock::new(RecordingSubsystem(journal.clone()))),
                "Recording",
            );
        if self.panic_in_init {
            builder = builder.subsystem(Arc::new(RwLock::new(PanickingSubsystem)), "Panicking");
        }
        if self.fail_in_init {
            builder = builder.subsystem(Arc::new(RwLock::new(FailingSubsystem)), "Failing");
        }
        if self.export {
            builder = builder.export_source(Arc::new(FixedExportSource));
        }
        builder.build().unwrap()
    }

    pub fn shutdowns(&self) -> usize {
        self.ticker.shutdowns.load(Ordering::SeqCst)
    }
}
