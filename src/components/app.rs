use leptos::prelude::*;
use segview_core::config::ViewerConfig;
use segview_core::segmentation::{ClassChange, ClassOverlay, ClassState};

use crate::components::sidebar::SegmentationSidebar;
use crate::components::study_list::StudyList;
use crate::components::viewer::ViewerShell;
use crate::state::{AppState, PageQuery};

#[component]
pub fn App(config: ViewerConfig, query: PageQuery) -> impl IntoView {
    let state = AppState::new(config, query);
    provide_context(state);

    // Compose sidebar output into the per-class overlay parameters viewports read
    let on_class_change = Callback::new(move |change: ClassChange| {
        let overlay = ClassOverlay::from(ClassState { visible: change.visible, opacity: change.opacity });
        state.class_overlays.update(|m| {
            m.insert(change.class_id, overlay);
        });
    });

    let has_study = Memo::new(move |_| state.study_uid.with(Option::is_some));

    view! {
        <div class="app">
            {move || if has_study.get() {
                view! {
                    <SegmentationSidebar
                        classes=state.segmentation_classes
                        study_uid=state.study_uid
                        on_class_change=on_class_change
                        collapsed=state.sidebar_collapsed
                    />
                    <div class="main">
                        <ViewerShell
                            study_uid=state.study_uid
                            segmentation_classes=state.segmentation_classes
                            class_overlays=state.class_overlays
                            active_view=state.active_view
                        />
                    </div>
                }.into_any()
            } else {
                view! { <div class="main"><StudyList /></div> }.into_any()
            }}
        </div>
    }
}
