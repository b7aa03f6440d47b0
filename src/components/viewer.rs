use std::collections::HashMap;

use leptos::prelude::*;
use segview_core::segmentation::ClassOverlay;
use segview_core::ViewId;

use crate::components::viewport::Viewport;

/// The 2×2 grid. Owns nothing but which view is active.
#[component]
pub fn ViewerShell(
    #[prop(into)] study_uid: Signal<Option<String>>,
    #[prop(into)] segmentation_classes: Signal<Vec<String>>,
    #[prop(into)] class_overlays: Signal<HashMap<String, ClassOverlay>>,
    active_view: RwSignal<ViewId>,
    #[prop(optional, into)] on_view_activated: Option<Callback<ViewId>>,
) -> impl IntoView {
    let activate = Callback::new(move |view: ViewId| {
        if active_view.get_untracked() != view {
            active_view.set(view);
            if let Some(cb) = on_view_activated {
                cb.run(view);
            }
        }
    });

    let header = move || {
        let classes = segmentation_classes.with(|c| c.len());
        (classes > 0).then(|| {
            let study = study_uid.get().unwrap_or_default();
            view! {
                <div class="viewer-header">
                    <span class="viewer-study">{format!("Study: {study}")}</span>
                    <span class="viewer-classes">{format!("{classes} segmentation classes")}</span>
                </div>
            }
        })
    };

    view! {
        <div class="viewer">
            {header}
            <div class="viewer-grid">
                {ViewId::ALL.into_iter().map(|view| view! {
                    <Viewport
                        view=view
                        study_uid=study_uid
                        segmentation_classes=segmentation_classes
                        class_overlays=class_overlays
                        is_active=Signal::derive(move || active_view.get() == view)
                        on_activate=activate
                    />
                }).collect_view()}
            </div>
        </div>
    }
}
