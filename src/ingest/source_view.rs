//! Selection state of the read-only tool source view

/// Source text of one registered tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSource {
    pub name: String,
    pub code: String,
}

/// Which tool's source is currently shown, if any
#[derive(Debug, Default)]
pub(crate) struct SourceViewer {
    selected: Option<ToolSource>,
}

impl SourceViewer {
    /// Toggle `name` off if it is already shown.
    ///
    /// Returns `true` when the selection was cleared, i.e. no fetch is needed.
    pub(crate) fn deselect_if_selected(&mut self, name: &str) -> bool {
        if self.selected.as_ref().is_some_and(|s| s.name == name) {
            self.selected = None;
            return true;
        }
        false
    }

    pub(crate) fn select(&mut self, source: ToolSource) {
        self.selected = Some(source);
    }

    pub(crate) fn clear(&mut self) {
        self.selected = None;
    }

    pub(crate) fn selected(&self) -> Option<&ToolSource> {
        self.selected.as_ref()
    }
}
