//! Diagram session and command loop
//!
//! [`DiagramSession`] owns everything a loaded diagram needs: the model,
//! the active display mode and width, collapse state and the render
//! surface. [`CommandLoop`] feeds it a closed set of [`Command`]s, each
//! handled to completion before the next is dequeued.
//!
//! Loads are ticketed. Starting a load while another is in flight cancels
//! the earlier one: only the newest ticket's response is applied, and
//! mutations are rejected until it arrives.

use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, error, info, span, warn, Level};

use crate::clipboard::{ActivationTarget, Clipboard, CopyConfirmation, CopyOnDoubleActivation};
use crate::collapse::{CollapseState, CollapseTracker};
use crate::core::{parse_width, Database, DiagramConfig, DiagramError, ExportFormat};
use crate::export::{DrawioExporter, ExportArtifact, RasterExporter, RasterOptions};
use crate::layout::LayoutEngine;
use crate::model::{DiagramModel, DiagramPayload, DisplayMode, DisplayModeRegistry};
use crate::render::{RenderAdapter, RenderSurface, ViewContext};
use crate::source::{DataSource, LayoutParams};

/// Handle identifying one diagram load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

/// Result of completing a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response became the current diagram
    Applied { nodes: usize, edges: usize },
    /// A newer load superseded this one; its response was dropped
    Discarded,
}

#[derive(Debug, Clone)]
struct PendingLoad {
    ticket: LoadTicket,
    module_group: Option<String>,
}

/// Owned state of one interactive diagram
#[derive(Debug)]
pub struct DiagramSession<S> {
    config: DiagramConfig,
    adapter: RenderAdapter,
    registry: DisplayModeRegistry,
    model: DiagramModel,
    collapse: CollapseTracker,
    surface: S,
    width: u32,
    module_group: Option<String>,
    next_ticket: u64,
    pending: Option<PendingLoad>,
}

impl<S: RenderSurface> DiagramSession<S> {
    pub fn new(config: DiagramConfig, registry: DisplayModeRegistry, surface: S) -> Self {
        Self {
            adapter: RenderAdapter::new(LayoutEngine::new(&config)),
            width: config.node_width,
            config,
            registry,
            model: DiagramModel::new(),
            collapse: CollapseTracker::new(),
            surface,
            module_group: None,
            next_ticket: 0,
            pending: None,
        }
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn layout(&self) -> &LayoutEngine {
        self.adapter.layout()
    }

    pub fn model(&self) -> &DiagramModel {
        &self.model
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn registry(&self) -> &DisplayModeRegistry {
        &self.registry
    }

    pub fn active_mode(&self) -> &DisplayMode {
        self.registry.active()
    }

    pub fn collapse(&self) -> &CollapseTracker {
        &self.collapse
    }

    /// Current diagram-wide node width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Module group of the diagram currently shown
    pub fn module_group(&self) -> Option<&str> {
        self.module_group.as_deref()
    }

    /// Module group of the newest load, falling back to the current one
    pub fn requested_module_group(&self) -> Option<&str> {
        match &self.pending {
            Some(pending) => pending.module_group.as_deref(),
            None => self.module_group(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Parameters to request the diagram with
    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            head_height: self.config.header_height,
            port_height: self.config.port_row_height,
            width: self.width,
        }
    }

    /// Start a load of `module_group`, superseding any load in flight
    pub fn begin_load(&mut self, module_group: Option<String>) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        if let Some(previous) = self.pending.replace(PendingLoad {
            ticket,
            module_group,
        }) {
            debug!(superseded = previous.ticket.0, ticket = ticket.0, "Load superseded");
        }
        ticket
    }

    /// Complete the load identified by `ticket`
    ///
    /// Responses to superseded tickets are dropped. A failed fetch or an
    /// invalid payload leaves the previous diagram in place.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        response: anyhow::Result<DiagramPayload>,
    ) -> Result<LoadOutcome, DiagramError> {
        let load_span = span!(Level::INFO, "finish_load", ticket = ticket.0);
        let _enter = load_span.enter();

        let is_current = matches!(&self.pending, Some(p) if p.ticket == ticket);
        if !is_current {
            debug!("Discarding response of a superseded load");
            return Ok(LoadOutcome::Discarded);
        }
        let Some(pending) = self.pending.take() else {
            return Ok(LoadOutcome::Discarded);
        };

        let model = response.and_then(|payload| DiagramModel::from_payload(payload, self.layout(), self.width));
        let model = match model {
            Ok(model) => model,
            Err(e) => {
                error!(error = %e, "Diagram load failed; keeping the previous diagram");
                return Err(DiagramError::load_error(e.to_string()));
            }
        };

        self.model = model;
        self.module_group = pending.module_group;
        self.collapse.reset();
        self.adapter
            .draw(&self.model, self.registry.active(), self.width, &mut self.surface);

        let outcome = LoadOutcome::Applied {
            nodes: self.model.node_count(),
            edges: self.model.edge_count(),
        };
        info!(?outcome, module_group = ?self.module_group, "Diagram loaded");
        Ok(outcome)
    }

    fn ensure_idle(&self) -> Result<(), DiagramError> {
        if self.is_loading() {
            return Err(DiagramError::LoadInFlight);
        }
        Ok(())
    }

    /// Switch the active display mode and relabel the surface
    ///
    /// Only text changes. Collapsed nodes get a new header label; their
    /// ports stay hidden. An unknown name selects the default mode.
    pub fn set_display_mode(&mut self, name: &str) -> Result<&DisplayMode, DiagramError> {
        self.ensure_idle()?;
        let mode = self.registry.select(name).clone();

        for node in self.model.nodes() {
            if self.surface.node(&node.id).is_none() {
                continue;
            }
            let (label, display) = self.adapter.node_label(node, &mode, self.width);
            self.surface.set_node_label(&node.id, label, display)?;
            if !self.collapse.is_collapsed(&node.id) {
                self.surface
                    .set_ports(&node.id, self.adapter.port_views(node, &mode, self.width))?;
            }
        }

        debug!(mode = mode.name.as_str(), "Display mode applied");
        Ok(self.registry.active())
    }

    /// Validate `input` as a width and apply it to every node
    ///
    /// Rejected input leaves everything untouched.
    pub fn set_width(&mut self, input: &str) -> Result<u32, DiagramError> {
        self.ensure_idle()?;
        let width = parse_width(input)?;

        self.width = width;
        self.model.set_width(width);
        let mode = self.registry.active();

        for node in self.model.nodes() {
            if self.surface.node(&node.id).is_none() {
                continue;
            }
            self.surface.set_node_width(&node.id, width)?;
            let (label, display) = self.adapter.node_label(node, mode, width);
            self.surface.set_node_label(&node.id, label, display)?;
            if !self.collapse.is_collapsed(&node.id) {
                self.surface
                    .set_ports(&node.id, self.adapter.port_views(node, mode, width))?;
            }
        }

        debug!(width, "Width applied");
        Ok(width)
    }

    /// Collapse or expand `node_id`
    pub fn toggle_collapse(&mut self, node_id: &str) -> Result<CollapseState, DiagramError> {
        self.ensure_idle()?;
        let ctx = ViewContext {
            model: &self.model,
            mode: self.registry.active(),
            width: self.width,
            adapter: &self.adapter,
        };
        self.collapse.toggle(node_id, ctx, &mut self.surface)
    }

    /// Interchange XML of the full model, regardless of collapse state
    pub fn export_drawio(&self) -> ExportArtifact {
        DrawioExporter::new().artifact(&self.model, self.registry.active())
    }

    /// Feed a label activation to `copier`
    pub fn activate_label<C: Clipboard>(
        &self,
        copier: &mut CopyOnDoubleActivation<C>,
        target: ActivationTarget,
        now: Instant,
    ) -> Option<CopyConfirmation> {
        copier.activate(&self.surface, target, now)
    }
}

/// Commands accepted by the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load (or reload) the current module group
    Load,
    /// Load a module group; `None` means all groups
    Reload(Option<String>),
    SetDisplayMode(String),
    /// Raw width input, validated before use
    SetWidth(String),
    ToggleCollapse(String),
    Export(ExportFormat),
}

/// Successful result of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Loaded(LoadOutcome),
    DisplayModeChanged(String),
    WidthChanged(u32),
    Toggled { node_id: String, state: CollapseState },
    Exported(ExportArtifact),
}

/// Single-threaded command loop around a [`DiagramSession`]
pub struct CommandLoop<D, S> {
    source: D,
    session: DiagramSession<S>,
    module_groups: Vec<String>,
    raster: Option<Box<dyn RasterExporter<S>>>,
    queue: VecDeque<Command>,
}

impl<D: DataSource, S: RenderSurface> CommandLoop<D, S> {
    /// Fetch display modes and module groups, then build an empty session
    pub fn new(source: D, config: DiagramConfig, surface: S) -> Result<Self, DiagramError> {
        let startup_span = span!(Level::INFO, "startup");
        let _enter = startup_span.enter();

        let modes = source.fetch_display_modes().map_err(|e| {
            error!(error = %e, "Failed to fetch display modes");
            DiagramError::load_error(e.to_string())
        })?;
        let registry = DisplayModeRegistry::new(modes)?;

        let module_groups = source.fetch_module_groups().unwrap_or_else(|e| {
            error!(error = %e, "Failed to fetch module groups");
            Vec::new()
        });

        info!(
            modes = registry.len(),
            module_groups = module_groups.len(),
            "Session ready"
        );

        Ok(Self {
            source,
            session: DiagramSession::new(config, registry, surface),
            module_groups,
            raster: None,
            queue: VecDeque::new(),
        })
    }

    /// Register the external renderer used for raster exports
    pub fn with_raster_exporter(mut self, exporter: Box<dyn RasterExporter<S>>) -> Self {
        self.raster = Some(exporter);
        self
    }

    pub fn session(&self) -> &DiagramSession<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DiagramSession<S> {
        &mut self.session
    }

    pub fn module_groups(&self) -> &[String] {
        &self.module_groups
    }

    /// Queue a command
    pub fn submit(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Handle every queued command in order
    pub fn run(&mut self) -> Vec<Result<Outcome, DiagramError>> {
        let mut results = Vec::with_capacity(self.queue.len());
        while let Some(command) = self.queue.pop_front() {
            results.push(self.handle(command));
        }
        results
    }

    /// Handle one command to completion
    pub fn handle(&mut self, command: Command) -> Result<Outcome, DiagramError> {
        let command_span = span!(Level::INFO, "command", ?command);
        let _enter = command_span.enter();

        let result = match command {
            Command::Load => {
                let group = self.session.requested_module_group().map(str::to_string);
                self.load(group)
            }
            Command::Reload(group) => self.load(group),
            Command::SetDisplayMode(name) => self
                .session
                .set_display_mode(&name)
                .map(|mode| Outcome::DisplayModeChanged(mode.name.clone())),
            Command::SetWidth(input) => self.session.set_width(&input).map(Outcome::WidthChanged),
            Command::ToggleCollapse(node_id) => self
                .session
                .toggle_collapse(&node_id)
                .map(|state| Outcome::Toggled { node_id, state }),
            Command::Export(format) => self.export(format).map(Outcome::Exported),
        };

        if let Err(e) = &result {
            warn!(error = %e, "Command failed");
        }
        result
    }

    fn load(&mut self, module_group: Option<String>) -> Result<Outcome, DiagramError> {
        let params = self.session.layout_params();
        let ticket = self.session.begin_load(module_group.clone());
        let response = self.source.fetch_diagram(module_group.as_deref(), &params);
        self.session.finish_load(ticket, response).map(Outcome::Loaded)
    }

    fn export(&self, format: ExportFormat) -> Result<ExportArtifact, DiagramError> {
        match format {
            ExportFormat::Drawio => Ok(self.session.export_drawio()),
            ExportFormat::Png => {
                let raster = self.raster.as_ref().ok_or_else(|| DiagramError::ExportUnavailable {
                    format: format.to_string(),
                })?;
                let bytes = raster
                    .export_raster(self.session.surface(), &RasterOptions::default())
                    .map_err(|e| DiagramError::ExportUnavailable {
                        format: format!("{} ({})", format, e),
                    })?;
                Ok(ExportArtifact::new(format, bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Port, RawNode};
    use crate::render::SceneSurface;
    use crate::source::StaticDataSource;

    fn payload() -> DiagramPayload {
        DiagramPayload {
            nodes: vec![
                RawNode::new("Order")
                    .in_group("sales")
                    .with_property("name", "Order")
                    .with_property("comment", "订单")
                    .with_port(
                        Port::new("id")
                            .with_property("name", "id")
                            .with_property("javaClass", "Long"),
                    )
                    .with_port(
                        Port::new("customer")
                            .with_property("name", "customer")
                            .with_property("javaClass", "Customer"),
                    )
                    .at(0, 0),
                RawNode::new("Customer")
                    .in_group("crm")
                    .with_property("name", "Customer")
                    .with_port(Port::new("id").with_property("name", "id"))
                    .at(300, 0),
            ],
            edges: vec![Edge::new("Order.customer", "Order", "Customer")
                .from_port("customer")
                .with_center_text("1")],
        }
    }

    fn command_loop() -> CommandLoop<StaticDataSource, SceneSurface> {
        let config = DiagramConfig::new(30, 24, 160);
        CommandLoop::new(StaticDataSource::new(payload()), config, SceneSurface::new()).unwrap()
    }

    fn session() -> DiagramSession<SceneSurface> {
        let mut session = DiagramSession::new(
            DiagramConfig::new(30, 24, 160),
            DisplayModeRegistry::builtin(),
            SceneSurface::new(),
        );
        let ticket = session.begin_load(None);
        session.finish_load(ticket, Ok(payload())).unwrap();
        session
    }

    #[test]
    fn test_load_draws_surface() {
        let session = session();
        assert_eq!(session.surface().node_count(), 2);
        assert_eq!(session.surface().edge_count(), 1);
        assert_eq!(session.surface().node("Order").unwrap().label, "Order\n订单");
        assert!(!session.is_loading());
    }

    #[test]
    fn test_stale_load_discarded() {
        let mut session = session();
        let first = session.begin_load(Some("sales".to_string()));
        let second = session.begin_load(Some("crm".to_string()));

        let only_crm = DiagramPayload {
            nodes: vec![RawNode::new("Customer").at(0, 0)],
            edges: vec![],
        };
        assert_eq!(
            session.finish_load(second, Ok(only_crm)).unwrap(),
            LoadOutcome::Applied { nodes: 1, edges: 0 }
        );
        assert_eq!(
            session.finish_load(first, Ok(payload())).unwrap(),
            LoadOutcome::Discarded
        );
        assert_eq!(session.model().node_count(), 1);
        assert_eq!(session.module_group(), Some("crm"));
    }

    #[test]
    fn test_mutations_rejected_while_loading() {
        let mut session = session();
        let ticket = session.begin_load(None);
        assert!(matches!(session.toggle_collapse("Order"), Err(DiagramError::LoadInFlight)));
        assert!(matches!(session.set_width("300"), Err(DiagramError::LoadInFlight)));
        assert!(matches!(
            session.set_display_mode("数据库表"),
            Err(DiagramError::LoadInFlight)
        ));
        session.finish_load(ticket, Ok(payload())).unwrap();
        assert!(session.toggle_collapse("Order").is_ok());
    }

    #[test]
    fn test_failed_load_keeps_previous_diagram() {
        let mut session = session();
        let ticket = session.begin_load(Some("sales".to_string()));
        let err = session
            .finish_load(ticket, Err(anyhow::anyhow!("503 Service Unavailable")))
            .unwrap_err();
        assert!(matches!(err, DiagramError::Load { .. }));
        assert_eq!(session.model().node_count(), 2);
        assert_eq!(session.module_group(), None);
        assert!(!session.is_loading());
    }

    #[test]
    fn test_reload_resets_collapse() {
        let mut session = session();
        session.toggle_collapse("Order").unwrap();
        let ticket = session.begin_load(None);
        session.finish_load(ticket, Ok(payload())).unwrap();
        assert!(!session.collapse().is_collapsed("Order"));
        assert_eq!(session.surface().node("Order").unwrap().ports.len(), 2);
    }

    #[test]
    fn test_invalid_width_is_rejected_without_change() {
        let mut session = session();
        for input in ["49", "501", "abc", ""] {
            assert!(matches!(
                session.set_width(input),
                Err(DiagramError::InvalidWidth { .. })
            ));
        }
        assert_eq!(session.width(), 160);
        assert!(session.surface().nodes().all(|n| n.rect.width == 160));
    }

    #[test]
    fn test_width_applies_to_nodes_and_ports() {
        let mut session = session();
        session.toggle_collapse("Customer").unwrap();
        assert_eq!(session.set_width("300").unwrap(), 300);

        let order = session.surface().node("Order").unwrap();
        assert_eq!(order.rect.width, 300);
        assert_eq!(order.ports[0].rect.width, 300);
        assert_eq!(order.ports[0].split.type_end(), 294.0);
        assert_eq!(order.rect.height, 78);

        let customer = session.surface().node("Customer").unwrap();
        assert_eq!(customer.rect.width, 300);
        assert_eq!(customer.rect.height, 30);
        assert!(customer.ports.is_empty());

        session.toggle_collapse("Customer").unwrap();
        let customer = session.surface().node("Customer").unwrap();
        assert_eq!(customer.ports[0].rect.width, 300);
    }

    #[test]
    fn test_display_mode_keeps_collapsed_ports_hidden() {
        let mut session = session();
        session.toggle_collapse("Customer").unwrap();
        session.set_display_mode("描述-名称").unwrap();

        let customer = session.surface().node("Customer").unwrap();
        assert!(customer.ports.is_empty());
        assert!(session.collapse().is_collapsed("Customer"));
        assert_eq!(session.active_mode().name, "描述-名称");
    }

    #[test]
    fn test_command_loop_processes_in_order() {
        let mut app = command_loop();
        assert_eq!(app.module_groups(), ["crm", "sales"]);

        app.submit(Command::Load);
        app.submit(Command::ToggleCollapse("Order".to_string()));
        app.submit(Command::SetWidth("10".to_string()));
        app.submit(Command::Export(ExportFormat::Drawio));
        assert_eq!(app.pending_commands(), 4);

        let results = app.run();
        assert_eq!(results.len(), 4);
        assert!(matches!(
            results[0],
            Ok(Outcome::Loaded(LoadOutcome::Applied { nodes: 2, edges: 1 }))
        ));
        assert!(matches!(
            &results[1],
            Ok(Outcome::Toggled { state: CollapseState::Collapsed { original_height: 78 }, .. })
        ));
        assert!(matches!(results[2], Err(DiagramError::InvalidWidth { .. })));

        let Ok(Outcome::Exported(artifact)) = &results[3] else {
            panic!("expected export");
        };
        let xml = String::from_utf8(artifact.bytes.clone()).unwrap();
        // collapsed node still exports its ports and edge
        assert!(xml.contains(r#"id="Order-customer""#));
        assert!(xml.contains(r#"source="Order-customer" target="Customer""#));
    }

    #[test]
    fn test_reload_module_group() {
        let mut app = command_loop();
        let outcome = app.handle(Command::Reload(Some("sales".to_string()))).unwrap();
        assert_eq!(outcome, Outcome::Loaded(LoadOutcome::Applied { nodes: 1, edges: 0 }));
        assert_eq!(app.session().module_group(), Some("sales"));

        // Load repeats the current group
        app.handle(Command::Load).unwrap();
        assert_eq!(app.session().model().node_count(), 1);
    }

    #[test]
    fn test_png_export_without_renderer() {
        let mut app = command_loop();
        assert!(matches!(
            app.handle(Command::Export(ExportFormat::Png)),
            Err(DiagramError::ExportUnavailable { .. })
        ));
    }

    struct FakeRaster;

    impl RasterExporter<SceneSurface> for FakeRaster {
        fn export_raster(&self, surface: &SceneSurface, options: &RasterOptions) -> anyhow::Result<Vec<u8>> {
            Ok(vec![surface.node_count() as u8, options.padding as u8])
        }
    }

    #[test]
    fn test_png_export_delegates() {
        let mut app = command_loop().with_raster_exporter(Box::new(FakeRaster));
        app.handle(Command::Load).unwrap();
        let Outcome::Exported(artifact) = app.handle(Command::Export(ExportFormat::Png)).unwrap() else {
            panic!("expected export");
        };
        assert_eq!(artifact.bytes, vec![2, 20]);
        assert_eq!(artifact.file_name, "模型图.png");
    }

    #[test]
    fn test_unknown_display_mode_falls_back() {
        let mut app = command_loop();
        app.handle(Command::Load).unwrap();
        let outcome = app.handle(Command::SetDisplayMode("nope".to_string())).unwrap();
        assert_eq!(outcome, Outcome::DisplayModeChanged("名称-类型".to_string()));
    }
}
