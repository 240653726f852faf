use std::collections::HashSet;

use super::*;

/// Bookkeeping for script-driven page widgets. A modal only gains an
/// instance once it has been shown, mirroring lazy widget construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct WidgetRegistry {
    pub(crate) modals: HashSet<NodeId>,
    pub(crate) tooltips: HashSet<NodeId>,
    pub(crate) popovers: HashSet<NodeId>,
    // Ids of delayed-hide timers still in the queue. May hold ids of timers
    // that already fired; cancelling those is a no-op.
    pub(crate) pending_closes: Vec<u64>,
}

impl WidgetRegistry {
    pub(crate) fn has_modal_instance(&self, node: NodeId) -> bool {
        self.modals.contains(&node)
    }
}

impl Page {
    /// Open the modal matched by `selector`: register its instance, mark it
    /// visible, and fire `shown.bs.modal` on it.
    pub fn show_modal(&mut self, selector: &str) -> Result<()> {
        let modal = self.require_one(selector)?;
        self.widgets.modals.insert(modal);
        self.dom.class_add(modal, "show")?;
        self.dom.style_set(modal, "display", "block")?;
        self.dispatch_event_on(modal, "shown.bs.modal")?;
        Ok(())
    }

    /// Close a modal and drop its instance. A node without an instance is
    /// left untouched.
    pub(crate) fn hide_modal_node(&mut self, modal: NodeId) -> Result<()> {
        if !self.widgets.modals.remove(&modal) {
            return Ok(());
        }
        self.dom.class_remove(modal, "show")?;
        self.dom.style_set(modal, "display", "none")?;
        self.dispatch_event_on(modal, "hidden.bs.modal")?;
        Ok(())
    }

    /// Whether the modal matched by `selector` currently has an instance.
    pub fn modal_is_open(&self, selector: &str) -> Result<bool> {
        let modal = self.require_one(selector)?;
        Ok(self.widgets.has_modal_instance(modal))
    }

    /// Remove an alert element from the tree entirely.
    pub(crate) fn close_alert_node(&mut self, alert: NodeId) -> Result<()> {
        if !self.dom.is_connected(alert) {
            return Ok(());
        }
        self.dom.remove_node(alert)
    }

    /// Number of elements registered for tooltip behavior.
    pub fn tooltip_count(&self) -> usize {
        self.widgets.tooltips.len()
    }

    /// Number of elements registered for popover behavior.
    pub fn popover_count(&self) -> usize {
        self.widgets.popovers.len()
    }
}
