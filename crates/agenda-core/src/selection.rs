use tracing::debug;

use crate::event::CalendarEvent;
use crate::index::EventIndex;

/// At most one selected event, held as an id into the current snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected_event_id: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous selection.
    pub fn select(&mut self, event_id: impl Into<String>) {
        let event_id = event_id.into();
        debug!(event_id = %event_id, "selected event");
        self.selected_event_id = Some(event_id);
    }

    pub fn clear(&mut self) {
        if let Some(previous) = self.selected_event_id.take() {
            debug!(event_id = %previous, "cleared selection");
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_event_id.as_deref()
    }

    pub fn is_selected(&self, event_id: &str) -> bool {
        self.selected_id() == Some(event_id)
    }

    /// `None` when nothing is selected or the id is not in `index`.
    pub fn resolve<'a>(&self, index: &'a EventIndex) -> Option<&'a CalendarEvent> {
        let id = self.selected_id()?;
        let found = index.get(id);
        if found.is_none() {
            debug!(event_id = %id, "selected event not in snapshot");
        }
        found
    }
}
