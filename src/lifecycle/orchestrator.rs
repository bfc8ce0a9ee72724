//! Lifecycle Orchestrator
//!
//! Receives every host callback and fans it out to the owned components in a
//! fixed order. Within a phase each step may rely on the postconditions of the
//! steps before it:
//!
//! ```text
//! PreInit   dependency check → slot integration → config load → features
//!           → categories → client pre-init → subsystems
//! Init      export service → client init → subsystems → integrations
//! PostInit  subsystems → integrations → integration crash info
//!           → client post-init → config save → network/GUI registration
//! ```

use super::{
    BootState, CapabilityProbe, CategoryRegistry, ClientHooks, CommandFactory, HostEnvironment,
    InitContext, IntegrationRegistry, LifecycleError, NetworkRegistry, Phase, PhaseTracker,
    PostInitContext, PreInitContext, PreInitEvent, ServerHandle, ServerLifecycleManager,
    SessionEvent, SlotRegistry, Subsystem, SubsystemRegistrar, TickScheduler, WorldStateProvider,
};
use crate::config::{ConfigLoader, ConfigPaths, ConfigSet, FeatureFlag, FeatureRegistry, ModuleIdentity};
use crate::crash::{CrashReporter, IntegrationCrashInfo, ModuleVersionInfo};
use crate::error::{ModuleError, Result};
use crate::messaging::{ImcEvent, ImcHandler, ImcProcessor, ImcProcessors, ImcProcessorsBuilder, ImcSummary};
use crate::worker::{ExportProcess, ExportSource, ServiceHandle, ServiceLauncher, ServicePriority};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{RwLock, broadcast};
use tracing::Instrument;

/// One host callback with its payload
pub enum HostEvent {
    PreInit(PreInitEvent),
    Init,
    PostInit,
    InterModMessage(ImcEvent),
    ServerAboutToStart,
    ServerStarting(Arc<dyn ServerHandle>),
    ServerStopping,
    ServerStopped,
}

impl HostEvent {
    /// The lifecycle phase this event drives; inter-module messages have none
    pub fn phase(&self) -> Option<Phase> {
        match self {
            HostEvent::PreInit(_) => Some(Phase::PreInit),
            HostEvent::Init => Some(Phase::Init),
            HostEvent::PostInit => Some(Phase::PostInit),
            HostEvent::InterModMessage(_) => None,
            HostEvent::ServerAboutToStart => Some(Phase::ServerAboutToStart),
            HostEvent::ServerStarting(_) => Some(Phase::ServerStarting),
            HostEvent::ServerStopping => Some(Phase::ServerStopping),
            HostEvent::ServerStopped => Some(Phase::ServerStopped),
        }
    }

    pub fn label(&self) -> String {
        self.phase()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "InterModMessage".to_string())
    }
}

/// The top-level coordinator of the hosted module
///
/// Built once by the host entry point through [`LifecycleOrchestrator::builder`]
/// and driven through [`handle`](Self::handle) or the `on_*` methods. No
/// callback returns an error: failures end as log entries, recovered
/// defaults, or the missing-dependency notice.
///
/// # Example
///
/// ```rust,ignore
/// let mut orchestrator = LifecycleOrchestrator::builder(identity)
///     .capability_probe(probe)
///     .host(host)
///     .categories(categories)
///     .network(network)
///     .integrations(integrations)
///     .world_state(world)
///     .tick_scheduler(ticker)
///     .commands(commands)
///     .subsystem(blocks, "Blocks")
///     .build()?;
///
/// orchestrator.handle(HostEvent::PreInit(event)).await;
/// ```
pub struct LifecycleOrchestrator {
    identity: ModuleIdentity,
    probe: Arc<dyn CapabilityProbe>,
    host: Arc<dyn HostEnvironment>,
    categories: Arc<dyn CategoryRegistry>,
    network: Arc<dyn NetworkRegistry>,
    integrations: Arc<dyn IntegrationRegistry>,
    world: Arc<dyn WorldStateProvider>,
    ticker: Arc<dyn TickScheduler>,
    commands: Arc<dyn CommandFactory>,
    slots: Option<Arc<dyn SlotRegistry>>,
    client: Option<Arc<dyn ClientHooks>>,
    export_source: Option<Arc<dyn ExportSource>>,
    imc: ImcProcessors,
    registrar: SubsystemRegistrar,
    loader: ConfigLoader,
    crash: CrashReporter,
    launcher: ServiceLauncher,
    server: ServerLifecycleManager,
    tracker: PhaseTracker,
    config: Option<ConfigSet>,
    features: Option<FeatureRegistry>,
    network_registered: bool,
}

impl LifecycleOrchestrator {
    pub fn builder(identity: ModuleIdentity) -> OrchestratorBuilder {
        OrchestratorBuilder::new(identity)
    }

    /// Dispatch one host callback
    pub async fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::PreInit(event) => self.on_pre_init(&event).await,
            HostEvent::Init => self.on_init().await,
            HostEvent::PostInit => self.on_post_init().await,
            HostEvent::InterModMessage(event) => {
                self.on_inter_mod_message(&event);
            }
            HostEvent::ServerAboutToStart => self.on_server_about_to_start(),
            HostEvent::ServerStarting(server) => self.on_server_starting(server.as_ref()),
            HostEvent::ServerStopping => self.on_server_stopping(),
            HostEvent::ServerStopped => self.on_server_stopped(),
        }
    }

    pub async fn on_pre_init(&mut self, event: &PreInitEvent) {
        if !self.admit(Phase::PreInit) {
            return;
        }

        let start = Instant::now();
        tracing::info!("Pre Initialization ( started )");

        let span = tracing::info_span!("phase", phase = %Phase::PreInit);
        let completed = self.pre_init_steps(event).instrument(span).await;
        if completed {
            self.tracker.complete(Phase::PreInit);
        } else {
            self.tracker.disable();
        }

        tracing::info!(
            "Pre Initialization ( ended after {}ms )",
            start.elapsed().as_millis()
        );
    }

    async fn pre_init_steps(&mut self, event: &PreInitEvent) -> bool {
        let companion = &self.identity.required_companion;
        if !self.probe.is_module_loaded(companion) {
            let err = LifecycleError::missing_dependency(companion);
            tracing::error!("{}; module disabled", err);
            self.host
                .notify_missing_dependency(&self.identity.id, companion);
            return false;
        }

        self.register_slot_integration();

        let directory = self
            .loader
            .resolve_directory(&event.config_root, &self.identity.config_directory);
        let paths = ConfigPaths::new(directory, &self.identity.config_directory);
        let config = self.loader.load(paths);
        let features = FeatureRegistry::from_table(&config.features);
        tracing::debug!("Loaded configuration from {}", config.paths.directory.display());

        self.categories.register_main(&self.identity.id);
        if features.is_enabled(FeatureFlag::Facades) {
            self.categories.register_facades(&self.identity.id);
        }

        if let Some(client) = self.client_hooks() {
            if let Err(e) = client.pre_init().await {
                tracing::error!("Client pre-initialization failed: {:#}", e);
            }
        }

        let ctx = PreInitContext {
            features: &features,
            config_directory: &config.paths.directory,
        };
        if let Err(e) = self.registrar.pre_init(&ctx).await {
            tracing::error!("Subsystem pre-initialization incomplete: {}", e);
        }

        self.config = Some(config);
        self.features = Some(features);
        true
    }

    fn register_slot_integration(&self) {
        let Some(slot) = &self.identity.slot_integration else {
            return;
        };
        let registry = match &self.slots {
            Some(registry) if self.probe.is_module_loaded(&slot.provider) => registry,
            _ => {
                let err = LifecycleError::optional_unavailable(&slot.provider);
                tracing::debug!("{}", err);
                return;
            }
        };

        if !registry.register_slot_type(&slot.slot_type) {
            tracing::debug!("Slot type {} already registered", slot.slot_type);
        }
        if !registry.assign_slot(&slot.slot_type) {
            tracing::debug!("No slot assigned for {}", slot.slot_type);
        }
    }

    pub async fn on_init(&mut self) {
        if !self.admit(Phase::Init) {
            return;
        }

        let start = Instant::now();
        tracing::info!("Initialization ( started )");

        let span = tracing::info_span!("phase", phase = %Phase::Init);
        self.init_steps().instrument(span).await;
        self.tracker.complete(Phase::Init);

        tracing::info!(
            "Initialization ( ended after {}ms )",
            start.elapsed().as_millis()
        );
    }

    async fn init_steps(&mut self) {
        let (Some(config), Some(features)) = (&self.config, &self.features) else {
            tracing::warn!("Initialization skipped: configuration not loaded");
            return;
        };

        if features.is_enabled(FeatureFlag::ExportItemNames) {
            match &self.export_source {
                Some(source) => {
                    let process = ExportProcess::new(
                        config.paths.recipe_directory.clone(),
                        config.recipes.export.clone(),
                        source.as_ref(),
                    );
                    let name = format!("{} CSV Export", self.identity.display_name);
                    if let Err(e) = self.launcher.start(name, ServicePriority::Min, move || {
                        process.run().map(|_| ())
                    }) {
                        tracing::error!("{}", e);
                    }
                }
                None => {
                    let err = LifecycleError::optional_unavailable("export source");
                    tracing::debug!("{}", err);
                }
            }
        }

        if let Some(client) = self.client_hooks() {
            if let Err(e) = client.init().await {
                tracing::error!("Client initialization failed: {:#}", e);
            }
        }

        let ctx = InitContext {
            features,
            recipe_directory: &config.paths.recipe_directory,
            recipes: &config.recipes.recipes,
        };
        if let Err(e) = self.registrar.init(&ctx).await {
            tracing::error!("Subsystem initialization incomplete: {}", e);
        }

        if let Err(e) = self.integrations.init().await {
            tracing::error!("Integration initialization failed: {:#}", e);
        }
    }

    pub async fn on_post_init(&mut self) {
        if !self.admit(Phase::PostInit) {
            return;
        }

        let start = Instant::now();
        tracing::info!("Post Initialization ( started )");

        let span = tracing::info_span!("phase", phase = %Phase::PostInit);
        self.post_init_steps().instrument(span).await;
        self.tracker.complete(Phase::PostInit);

        tracing::info!(
            "Post Initialization ( ended after {}ms )",
            start.elapsed().as_millis()
        );
    }

    async fn post_init_steps(&mut self) {
        let Some(features) = &self.features else {
            tracing::warn!("Post initialization skipped: configuration not loaded");
            return;
        };

        let ctx = PostInitContext { features };
        if let Err(e) = self.registrar.post_init(&ctx).await {
            tracing::error!("Subsystem post-initialization incomplete: {}", e);
        }

        if let Err(e) = self.integrations.post_init().await {
            tracing::error!("Integration post-initialization failed: {:#}", e);
        }
        let integrations = Arc::clone(&self.integrations);
        self.crash.register(IntegrationCrashInfo::new(
            &self.identity.display_name,
            move || integrations.describe(),
        ));

        if let Some(client) = self.client_hooks() {
            if let Err(e) = client.post_init().await {
                tracing::error!("Client post-initialization failed: {:#}", e);
            }
        }

        if let (Some(config), Some(features)) = (self.config.as_mut(), self.features.as_ref()) {
            features.fill_table(&mut config.features);
            config.settings.version = self.identity.version.clone();
            if let Err(e) = self.loader.save(config) {
                tracing::warn!("Failed to save configuration: {}", e);
            }
        }

        self.register_network();
    }

    fn register_network(&mut self) {
        if self.network_registered {
            return;
        }
        self.network.register_gui_handler(&self.identity.id);
        self.network.open_channel(&self.identity.id);
        self.network_registered = true;
        tracing::debug!("Registered network channel {}", self.identity.id);
    }

    /// Route one inter-module delivery through a fresh handler
    pub fn on_inter_mod_message(&self, event: &ImcEvent) -> ImcSummary {
        let summary = ImcHandler::new(&self.imc).handle(event);
        tracing::info!(
            "Processed {} inter-module messages ({} unknown, {} failed)",
            summary.processed,
            summary.unknown,
            summary.failed
        );
        summary
    }

    pub fn on_server_about_to_start(&mut self) {
        if self.server.session().is_some() {
            let err = LifecycleError::RedundantLifecycleCall(Phase::ServerAboutToStart);
            tracing::warn!("{}", err);
            return;
        }
        let world = self.world.on_server_about_to_start();
        self.server.start(world);
    }

    pub fn on_server_starting(&mut self, server: &dyn ServerHandle) {
        let command = self.commands.create(server);
        tracing::debug!("Registering command {} on {}", command.name(), server.name());
        server.register_command(command);
        self.server.activate();
    }

    pub fn on_server_stopping(&mut self) {
        if !self.server.begin_stop() {
            let err = LifecycleError::RedundantLifecycleCall(Phase::ServerStopping);
            tracing::debug!("{}", err);
        }
    }

    /// Tears down world state if a session exists, then always stops ticking
    pub fn on_server_stopped(&mut self) {
        if !self.server.stop() {
            let err = LifecycleError::RedundantLifecycleCall(Phase::ServerStopped);
            tracing::debug!("{}", err);
        }
        self.ticker.shutdown();
    }

    /// Close out a primary phase whose callback unwound part way through
    ///
    /// Steps that had not run yet stay skipped; later phases are admitted as
    /// if the phase had finished.
    pub fn finish_interrupted(&mut self, phase: Phase) {
        if phase.is_primary() && self.tracker.admit(phase).is_ok() {
            tracing::warn!("{} interrupted; continuing with the next phase", phase);
            self.tracker.complete(phase);
        }
    }

        fn admit(&self, phase: Phase) -> bool {
        match self.tracker.admit(phase) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{} ignored: {}", phase, e);
                false
            }
        }
    }

    fn client_hooks(&self) -> Option<Arc<dyn ClientHooks>> {
        if !self.host.is_client() {
            return None;
        }
        self.client.clone()
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    pub fn boot_state(&self) -> BootState {
        self.tracker.state()
    }

    pub fn config(&self) -> Option<&ConfigSet> {
        self.config.as_ref()
    }

    pub fn features(&self) -> Option<&FeatureRegistry> {
        self.features.as_ref()
    }

    /// Shared view of the crash registry for the host's fault reporter
    pub fn crash_reporter(&self) -> CrashReporter {
        self.crash.clone()
    }

    pub fn services(&self) -> &[ServiceHandle] {
        self.launcher.handles()
    }

    pub fn server(&self) -> &ServerLifecycleManager {
        &self.server
    }

    pub fn subscribe_sessions(&self) -> broadcast::Receiver<SessionEvent> {
        self.server.subscribe()
    }
}

/// Builder for [`LifecycleOrchestrator`]
pub struct OrchestratorBuilder {
    identity: ModuleIdentity,
    probe: Option<Arc<dyn CapabilityProbe>>,
    host: Option<Arc<dyn HostEnvironment>>,
    categories: Option<Arc<dyn CategoryRegistry>>,
    network: Option<Arc<dyn NetworkRegistry>>,
    integrations: Option<Arc<dyn IntegrationRegistry>>,
    world: Option<Arc<dyn WorldStateProvider>>,
    ticker: Option<Arc<dyn TickScheduler>>,
    commands: Option<Arc<dyn CommandFactory>>,
    slots: Option<Arc<dyn SlotRegistry>>,
    client: Option<Arc<dyn ClientHooks>>,
    export_source: Option<Arc<dyn ExportSource>>,
    imc: ImcProcessorsBuilder,
    registrar: SubsystemRegistrar,
    crash: CrashReporter,
}

impl OrchestratorBuilder {
    pub fn new(identity: ModuleIdentity) -> Self {
        Self {
            identity,
            probe: None,
            host: None,
            categories: None,
            network: None,
            integrations: None,
            world: None,
            ticker: None,
            commands: None,
            slots: None,
            client: None,
            export_source: None,
            imc: ImcProcessors::builder(),
            registrar: SubsystemRegistrar::new(),
            crash: CrashReporter::new(),
        }
    }

    pub fn capability_probe(mut self, probe: Arc<dyn CapabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn host(mut self, host: Arc<dyn HostEnvironment>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn categories(mut self, categories: Arc<dyn CategoryRegistry>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn network(mut self, network: Arc<dyn NetworkRegistry>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn integrations(mut self, integrations: Arc<dyn IntegrationRegistry>) -> Self {
        self.integrations = Some(integrations);
        self
    }

    pub fn world_state(mut self, world: Arc<dyn WorldStateProvider>) -> Self {
        self.world = Some(world);
        self
    }

    pub fn tick_scheduler(mut self, ticker: Arc<dyn TickScheduler>) -> Self {
        self.ticker = Some(ticker);
        self
    }

    pub fn commands(mut self, commands: Arc<dyn CommandFactory>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn slot_registry(mut self, slots: Arc<dyn SlotRegistry>) -> Self {
        self.slots = Some(slots);
        self
    }

    pub fn client_hooks(mut self, client: Arc<dyn ClientHooks>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn export_source(mut self, source: Arc<dyn ExportSource>) -> Self {
        self.export_source = Some(source);
        self
    }

    pub fn imc_processor(mut self, key: impl Into<String>, processor: Arc<dyn ImcProcessor>) -> Self {
        self.imc = self.imc.register(key, processor);
        self
    }

    /// Register a subsystem; subsystems run in registration order
    pub fn subsystem<T>(mut self, subsystem: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: Subsystem + 'static,
    {
        self.registrar.register(subsystem, name);
        self
    }

    /// Share an existing crash registry, typically the host's
    pub fn crash_reporter(mut self, crash: CrashReporter) -> Self {
        self.crash = crash;
        self
    }

    /// Build the orchestrator and register the version crash callable
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::MissingCollaborator`] if a required collaborator
    /// was not supplied.
    pub fn build(self) -> Result<LifecycleOrchestrator> {
        let orchestrator = LifecycleOrchestrator {
            probe: self.probe.ok_or(ModuleError::MissingCollaborator("capability probe"))?,
            host: self.host.ok_or(ModuleError::MissingCollaborator("host environment"))?,
            categories: self
                .categories
                .ok_or(ModuleError::MissingCollaborator("category registry"))?,
            network: self
                .network
                .ok_or(ModuleError::MissingCollaborator("network registry"))?,
            integrations: self
                .integrations
                .ok_or(ModuleError::MissingCollaborator("integration registry"))?,
            world: self
                .world
                .ok_or(ModuleError::MissingCollaborator("world state provider"))?,
            ticker: self
                .ticker
                .ok_or(ModuleError::MissingCollaborator("tick scheduler"))?,
            commands: self
                .commands
                .ok_or(ModuleError::MissingCollaborator("command factory"))?,
            identity: self.identity,
            slots: self.slots,
            client: self.client,
            export_source: self.export_source,
            imc: self.imc.build(),
            registrar: self.registrar,
            loader: ConfigLoader::new(),
            crash: self.crash,
            launcher: ServiceLauncher::new(),
            server: ServerLifecycleManager::new(),
            tracker: PhaseTracker::new(),
            config: None,
            features: None,
            network_registered: false,
        };

        tracing::debug!(
            "Built orchestrator for {} ({} subsystems, {} IMC processors)",
            orchestrator.identity.id,
            orchestrator.registrar.len(),
            orchestrator.imc.len()
        );
        orchestrator.crash.register(ModuleVersionInfo::new(
            &orchestrator.identity.display_name,
            orchestrator.identity.version.clone(),
        ));
        Ok(orchestrator)
    }
}
