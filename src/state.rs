use std::collections::HashMap;

use leptos::prelude::*;
use segview_core::config::ViewerConfig;
use segview_core::segmentation::ClassOverlay;
use segview_core::ViewId;

/// Id of the inline `<script type="application/json">` block holding the
/// viewer configuration.
pub const CONFIG_ELEMENT_ID: &str = "segview-config";

/// What the page was opened with: `?study=<uid>&classes=a,b`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageQuery {
    pub study_uid: Option<String>,
    pub classes: Vec<String>,
}

impl PageQuery {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut query = PageQuery::default();
        for (key, value) in pairs {
            match key {
                "study" if !value.trim().is_empty() => query.study_uid = Some(value.trim().to_string()),
                "classes" => {
                    query.classes = value
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => {}
            }
        }
        query
    }
}

#[derive(Clone, Copy)]
pub struct AppState {
    pub config: StoredValue<ViewerConfig>,
    pub study_uid: RwSignal<Option<String>>,
    pub segmentation_classes: RwSignal<Vec<String>>,
    /// Per-class overlay parameters composed from sidebar notifications.
    pub class_overlays: RwSignal<HashMap<String, ClassOverlay>>,
    pub active_view: RwSignal<ViewId>,
    pub sidebar_collapsed: RwSignal<bool>,
}

impl AppState {
    pub fn new(config: ViewerConfig, query: PageQuery) -> Self {
        Self {
            config: StoredValue::new(config),
            study_uid: RwSignal::new(query.study_uid),
            segmentation_classes: RwSignal::new(query.classes),
            class_overlays: RwSignal::new(HashMap::new()),
            active_view: RwSignal::new(ViewId::Axial),
            sidebar_collapsed: RwSignal::new(false),
        }
    }

    pub fn open_study(&self, study_uid: String) {
        self.class_overlays.set(HashMap::new());
        self.active_view.set(ViewId::Axial);
        self.study_uid.set(Some(study_uid));
    }
}

/// Reads the inline configuration block; falls back to defaults (with a
/// warning) when it is missing or invalid.
pub fn load_config() -> ViewerConfig {
    let text = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
        .and_then(|el| el.text_content());
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        log::info!("No #{CONFIG_ELEMENT_ID} block, using default configuration");
        return ViewerConfig::default();
    };
    match ViewerConfig::from_json_str(&text) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}; using default configuration");
            ViewerConfig::default()
        }
    }
}

pub fn load_query() -> PageQuery {
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    let Ok(params) = web_sys::UrlSearchParams::new_with_str(&search) else {
        return PageQuery::default();
    };
    let study = params.get("study");
    let classes = params.get("classes");
    let mut pairs = Vec::new();
    if let Some(ref s) = study {
        pairs.push(("study", s.as_str()));
    }
    if let Some(ref c) = classes {
        pairs.push(("classes", c.as_str()));
    }
    PageQuery::from_pairs(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs() {
        let q = PageQuery::from_pairs([("study", "1.2.3"), ("classes", "liver, spleen,,kidney")]);
        assert_eq!(q.study_uid.as_deref(), Some("1.2.3"));
        assert_eq!(q.classes, vec!["liver", "spleen", "kidney"]);
    }

    #[test]
    fn test_blank_study_ignored() {
        let q = PageQuery::from_pairs([("study", "  "), ("zoom", "2")]);
        assert_eq!(q, PageQuery::default());
    }
}
