//! Per-class visibility and opacity state behind the segmentation sidebar.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPACITY: u8 = 50;
pub const MAX_OPACITY: u8 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassState {
    pub visible: bool,
    /// Percent, always within `0..=100`.
    pub opacity: u8,
}

impl Default for ClassState {
    fn default() -> Self {
        Self { visible: false, opacity: DEFAULT_OPACITY }
    }
}

/// Partial update merged over the current (or default) state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassPatch {
    pub visible: Option<bool>,
    pub opacity: Option<i32>,
}

impl ClassPatch {
    pub fn visible(visible: bool) -> Self {
        Self { visible: Some(visible), opacity: None }
    }

    pub fn opacity(opacity: i32) -> Self {
        Self { visible: None, opacity: Some(opacity) }
    }
}

/// Notification sent to the host after every update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassChange {
    pub class_id: String,
    pub visible: bool,
    pub opacity: u8,
}

pub fn clamp_opacity(value: i32) -> u8 {
    value.clamp(0, i32::from(MAX_OPACITY)) as u8
}

/// Receiver of [`ClassChange`] notifications.
pub trait ClassChangeSink {
    fn class_changed(&mut self, change: ClassChange);
}

impl<F: FnMut(ClassChange)> ClassChangeSink for F {
    fn class_changed(&mut self, change: ClassChange) {
        self(change)
    }
}

impl ClassChangeSink for Vec<ClassChange> {
    fn class_changed(&mut self, change: ClassChange) {
        self.push(change);
    }
}

/// In-memory reducer over class states. Absent classes resolve to the
/// default state; entries are created on first update.
#[derive(Clone, Debug)]
pub struct ClassVisibilityStore<S> {
    states: HashMap<String, ClassState>,
    sink: S,
}

impl<S: ClassChangeSink> ClassVisibilityStore<S> {
    pub fn new(sink: S) -> Self {
        Self { states: HashMap::new(), sink }
    }

    pub fn get(&self, class_id: &str) -> ClassState {
        self.states.get(class_id).copied().unwrap_or_default()
    }

    pub fn update(&mut self, class_id: &str, patch: ClassPatch) -> ClassState {
        let mut state = self.get(class_id);
        if let Some(visible) = patch.visible {
            state.visible = visible;
        }
        if let Some(opacity) = patch.opacity {
            state.opacity = clamp_opacity(opacity);
        }
        self.states.insert(class_id.to_string(), state);
        self.sink.class_changed(ClassChange {
            class_id: class_id.to_string(),
            visible: state.visible,
            opacity: state.opacity,
        });
        state
    }

    pub fn toggle_visibility(&mut self, class_id: &str) -> ClassState {
        let visible = !self.get(class_id).visible;
        self.update(class_id, ClassPatch::visible(visible))
    }

    pub fn set_opacity(&mut self, class_id: &str, value: i32) -> ClassState {
        self.update(class_id, ClassPatch::opacity(value))
    }

    /// If any listed class is visible, hides them all; otherwise shows them
    /// all. One notification per class.
    pub fn toggle_all<I, T>(&mut self, class_ids: I)
    where
        I: IntoIterator<Item = T> + Clone,
        T: AsRef<str>,
    {
        let any_visible = class_ids.clone().into_iter().any(|id| self.get(id.as_ref()).visible);
        for id in class_ids {
            self.update(id.as_ref(), ClassPatch::visible(!any_visible));
        }
    }

    pub fn any_visible<T: AsRef<str>>(&self, class_ids: &[T]) -> bool {
        class_ids.iter().any(|id| self.get(id.as_ref()).visible)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ClassVisibilityStore<Vec<ClassChange>> {
        ClassVisibilityStore::new(Vec::new())
    }

    #[test]
    fn test_unknown_class_has_default_state() {
        let s = store();
        assert_eq!(s.get("liver"), ClassState { visible: false, opacity: 50 });
        assert!(s.sink().is_empty());
    }

    #[test]
    fn test_update_visible_keeps_opacity() {
        let mut s = store();
        s.set_opacity("liver", 20);
        let state = s.update("liver", ClassPatch::visible(true));
        assert_eq!(state, ClassState { visible: true, opacity: 20 });
        assert!(s.get("liver").visible);
    }

    #[test]
    fn test_update_notifies_host() {
        let mut s = store();
        s.toggle_visibility("kidney");
        assert_eq!(
            s.sink(),
            &vec![ClassChange { class_id: "kidney".into(), visible: true, opacity: 50 }]
        );
    }

    #[test]
    fn test_set_opacity_clamps() {
        let mut s = store();
        assert_eq!(s.set_opacity("a", 73).opacity, 73);
        assert_eq!(s.set_opacity("a", 250).opacity, 100);
        assert_eq!(s.set_opacity("a", -4).opacity, 0);
        assert_eq!(s.get("a").opacity, 0);
    }

    #[test]
    fn test_toggle_all_shows_when_none_visible() {
        let mut s = store();
        s.toggle_all(["a", "b", "c"]);
        assert!(["a", "b", "c"].iter().all(|id| s.get(id).visible));
        assert_eq!(s.sink().len(), 3);
    }

    #[test]
    fn test_toggle_all_hides_when_any_visible() {
        let mut s = store();
        s.toggle_visibility("a");
        s.toggle_all(&["a".to_string(), "b".to_string(), "c".to_string()]);
        assert!(["a", "b", "c"].iter().all(|id| !s.get(id).visible));
        // one for the toggle, then one per class
        assert_eq!(s.sink().len(), 4);
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut s = ClassVisibilityStore::new(|c: ClassChange| seen.push(c.class_id));
            s.toggle_visibility("x");
            s.set_opacity("y", 10);
        }
        assert_eq!(seen, vec!["x".to_string(), "y".to_string()]);
    }
}
