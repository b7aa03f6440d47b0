use leptos::prelude::*;
use segview_core::segmentation::store::MAX_OPACITY;
use segview_core::segmentation::{class_color_css, ClassChange, ClassChangeSink, ClassVisibilityStore};

/// Number of study-id characters shown in the footer.
const STUDY_LABEL_CHARS: usize = 20;

/// Forwards every store change to the host.
#[derive(Clone, Copy)]
pub struct HostNotifier(Callback<ClassChange>);

impl ClassChangeSink for HostNotifier {
    fn class_changed(&mut self, change: ClassChange) {
        self.0.run(change);
    }
}

fn short_study_label(study_uid: &str) -> String {
    if study_uid.chars().count() > STUDY_LABEL_CHARS {
        let head: String = study_uid.chars().take(STUDY_LABEL_CHARS).collect();
        format!("{head}…")
    } else {
        study_uid.to_string()
    }
}

#[component]
pub fn SegmentationSidebar(
    #[prop(into)] classes: Signal<Vec<String>>,
    #[prop(into)] study_uid: Signal<Option<String>>,
    #[prop(into)] on_class_change: Callback<ClassChange>,
    collapsed: RwSignal<bool>,
) -> impl IntoView {
    let store = RwSignal::new(ClassVisibilityStore::new(HostNotifier(on_class_change)));

    let toggle_all = move |_| {
        let ids = classes.get_untracked();
        store.update(|s| s.toggle_all(&ids));
    };
    let any_visible = move || {
        let ids = classes.get();
        store.with(|s| s.any_visible(&ids))
    };

    view! {
        {move || if collapsed.get() {
            view! {
                <div class="sidebar sidebar-collapsed">
                    <button class="sidebar-expand" title="Show segmentation panel" on:click=move |_| collapsed.set(false)>
                        "»"
                    </button>
                    <div class="sidebar-rail-count" title="Segmentation classes">
                        {move || classes.with(|c| c.len())}
                    </div>
                </div>
            }.into_any()
        } else {
            view! {
                <div class="sidebar">
                    <div class="sidebar-header">
                        <span>"Segmentation"</span>
                        <button title="Collapse" on:click=move |_| collapsed.set(true)>"«"</button>
                    </div>
                    <Show
                        when=move || classes.with(|c| !c.is_empty())
                        fallback=|| view! { <div class="sidebar-empty">"No segmentation classes"</div> }
                    >
                        <button
                            class="sidebar-toggle-all"
                            title=move || if any_visible() { "Hide every class" } else { "Show every class" }
                            on:click=toggle_all
                        >
                            "Toggle All"
                        </button>
                        <div class="class-list">
                            {move || classes.get().into_iter().enumerate().map(|(index, class_id)| {
                                view! { <ClassRow store=store index=index class_id=class_id /> }
                            }).collect_view()}
                        </div>
                    </Show>
                    {move || study_uid.get().map(|uid| view! {
                        <div class="sidebar-footer" title=uid.clone()>
                            {format!("Study: {}", short_study_label(&uid))}
                        </div>
                    })}
                </div>
            }.into_any()
        }}
    }
}

#[component]
fn ClassRow(
    store: RwSignal<ClassVisibilityStore<HostNotifier>>,
    index: usize,
    class_id: String,
) -> impl IntoView {
    let id = StoredValue::new(class_id.clone());
    let visible = move || store.with(|s| s.get(&id.get_value()).visible);
    let opacity = move || store.with(|s| s.get(&id.get_value()).opacity);

    let toggle = move || {
        store.update(|s| {
            s.toggle_visibility(&id.get_value());
        });
    };
    let on_opacity = move |ev: leptos::ev::Event| {
        let Ok(value) = event_target_value(&ev).parse::<i32>() else { return };
        store.update(|s| {
            s.set_opacity(&id.get_value(), value);
        });
    };

    view! {
        <div class="class-row" class:visible=visible>
            <label class="class-label">
                <input type="checkbox" prop:checked=visible on:change=move |_| toggle() />
                <span class="swatch" style:background-color=class_color_css(index)></span>
                <span class="class-name">{class_id}</span>
            </label>
            <button class="eye" title=move || if visible() { "Hide" } else { "Show" } on:click=move |_| toggle()>
                {move || if visible() { "👁" } else { "◌" }}
            </button>
            <Show when=visible>
                <div class="opacity-row">
                    <input
                        type="range"
                        min="0"
                        max=MAX_OPACITY.to_string()
                        step="1"
                        prop:value=move || opacity().to_string()
                        on:input=on_opacity
                    />
                    <span class="opacity-value">{move || format!("{}%", opacity())}</span>
                </div>
            </Show>
        </div>
    }
}
