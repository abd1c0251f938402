//! Copy-on-double-activation
//!
//! Two activations on the same label within [`DOUBLE_ACTIVATION_INTERVAL`]
//! copy that label's full text to the clipboard. Clipboard writes are fire
//! and forget: a failure is logged and only the confirmation is missing.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::core::{COPY_CONFIRMATION_DURATION, DOUBLE_ACTIVATION_INTERVAL};
use crate::render::RenderSurface;

/// The label element that was activated
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LabelElement {
    NodeLabel,
    PortName(String),
    PortType(String),
}

/// An activated label on a specific node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivationTarget {
    pub node_id: String,
    pub element: LabelElement,
}

impl ActivationTarget {
    pub fn node_label(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            element: LabelElement::NodeLabel,
        }
    }

    pub fn port_name(node_id: impl Into<String>, port_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            element: LabelElement::PortName(port_id.into()),
        }
    }

    pub fn port_type(node_id: impl Into<String>, port_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            element: LabelElement::PortType(port_id.into()),
        }
    }
}

/// Detects two activations of one target within a threshold
#[derive(Debug, Clone)]
pub struct ActivationDebouncer {
    threshold: Duration,
    last: Option<(Instant, ActivationTarget)>,
}

impl Default for ActivationDebouncer {
    fn default() -> Self {
        Self::new(DOUBLE_ACTIVATION_INTERVAL)
    }
}

impl ActivationDebouncer {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold, last: None }
    }

    /// Record an activation at `now`; true when it completes a double activation
    ///
    /// A completed double activation resets the state, so a third quick
    /// activation starts over.
    pub fn activate(&mut self, target: ActivationTarget, now: Instant) -> bool {
        let is_double = matches!(
            &self.last,
            Some((at, last)) if *last == target && now.saturating_duration_since(*at) < self.threshold
        );
        self.last = if is_double { None } else { Some((now, target)) };
        is_double
    }
}

/// System clipboard
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Clipboard keeping the last written text in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Transient notice shown after a successful copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyConfirmation {
    pub text: String,
    pub visible_for: Duration,
}

/// Full text behind `target`, or `None` if it is not on the surface
pub fn target_text<S: RenderSurface>(surface: &S, target: &ActivationTarget) -> Option<String> {
    let node = surface.node(&target.node_id)?;
    match &target.element {
        LabelElement::NodeLabel => Some(node.label.clone()),
        LabelElement::PortName(port_id) => node.port(port_id).map(|p| p.name_text.clone()),
        LabelElement::PortType(port_id) => node.port(port_id).map(|p| p.type_text.clone()),
    }
}

/// Debouncer and clipboard wired together
#[derive(Debug, Clone, Default)]
pub struct CopyOnDoubleActivation<C> {
    debouncer: ActivationDebouncer,
    clipboard: C,
}

impl<C: Clipboard> CopyOnDoubleActivation<C> {
    pub fn new(clipboard: C) -> Self {
        Self {
            debouncer: ActivationDebouncer::default(),
            clipboard,
        }
    }

    pub fn with_debouncer(mut self, debouncer: ActivationDebouncer) -> Self {
        self.debouncer = debouncer;
        self
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// Feed one activation; returns the confirmation to show when a copy happened
    pub fn activate<S: RenderSurface>(
        &mut self,
        surface: &S,
        target: ActivationTarget,
        now: Instant,
    ) -> Option<CopyConfirmation> {
        if !self.debouncer.activate(target.clone(), now) {
            return None;
        }
        let text = target_text(surface, &target)?;
        debug!(node = target.node_id.as_str(), "Copying label text");

        match self.clipboard.write_text(&text) {
            Ok(()) => {
                info!(chars = text.chars().count(), "Copied to clipboard");
                Some(CopyConfirmation {
                    text,
                    visible_for: COPY_CONFIRMATION_DURATION,
                })
            }
            Err(e) => {
                warn!(error = %e, "Clipboard write failed");
                None
            }
        }
    }
}
