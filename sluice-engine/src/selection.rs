//! Selection model of the pipeline list

use std::collections::HashSet;

/// Ordered set of selected pipeline names
///
/// Names are kept in the order they were selected; bulk actions that act on
/// a single pipeline pick the first one.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    selected: Vec<String>,
    lookup: HashSet<String>,
    all_selected: bool,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.lookup.contains(name)
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn first(&self) -> Option<&str> {
        self.selected.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// True after select-all until an individual toggle or unselect
    pub fn all_selected(&self) -> bool {
        self.all_selected
    }

    /// Flips the selection of one pipeline and returns its new state
    pub fn toggle(&mut self, name: &str) -> bool {
        self.all_selected = false;
        if self.is_selected(name) {
            self.remove(name);
            false
        } else {
            self.insert(name);
            true
        }
    }

    /// Selects one pipeline, extending over a range when `extend_from_shift`
    /// is set
    ///
    /// The range reaches backwards through `visible` from the clicked row and
    /// stops at the nearest row that is already selected. With no selected
    /// row above, it runs to the top of the list.
    pub fn select<S: AsRef<str>>(&mut self, name: &str, extend_from_shift: bool, visible: &[S]) {
        self.insert(name);

        if !extend_from_shift {
            return;
        }

        let Some(index) = visible.iter().position(|n| n.as_ref() == name) else {
            return;
        };

        for previous in visible[..index].iter().rev() {
            let previous = previous.as_ref();
            if self.is_selected(previous) {
                break;
            }
            self.insert(previous);
        }
    }

    pub fn unselect(&mut self, name: &str) {
        self.all_selected = false;
        self.remove(name);
    }

    /// Selects every visible pipeline
    pub fn select_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a str>) {
        self.selected.clear();
        self.lookup.clear();
        for name in visible {
            self.insert(name);
        }
        self.all_selected = true;
    }

    pub fn unselect_all(&mut self) {
        self.selected.clear();
        self.lookup.clear();
        self.all_selected = false;
    }

    fn insert(&mut self, name: &str) {
        if self.lookup.insert(name.to_string()) {
            self.selected.push(name.to_string());
        }
    }

    fn remove(&mut self, name: &str) {
        if self.lookup.remove(name) {
            self.selected.retain(|n| n != name);
        }
    }
}
