use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

use dicomweb_lib::DicomWebClient;
use leptos::prelude::*;
use segview_core::engine::{EngineBinding, ImageEngine};
use segview_core::interaction::pan::Point;
use segview_core::interaction::{InteractionController, WheelAction, WheelInput};
use segview_core::segmentation::{class_color_css, ClassOverlay, NoDecoder};
use segview_core::series::{load_segmentation, load_study_images};
use segview_core::viewport::{LoadOutcome, LoadPhase, OverlayPhase, ViewportModel};
use segview_core::ViewId;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlElement, MouseEvent, WheelEvent};

use crate::canvas::overlay_renderer;
use crate::components::drag::DocumentDrag;
use crate::engine::CornerstoneEngine;
use crate::state::AppState;

// ── Per-mount runtime ─────────────────────────────────────────────────────────
//
// Browser handles (engine binding, document listeners, interval) are not
// Send, so they live here instead of in signals, keyed by mount id.

struct ViewportRuntime {
    binding: Option<EngineBinding<CornerstoneEngine>>,
    controller: InteractionController,
    drag: Option<DocumentDrag>,
    cine: Option<IntervalHandle>,
    display_gen: u64,
}

thread_local! {
    static RUNTIMES: RefCell<HashMap<u64, ViewportRuntime>> = RefCell::new(HashMap::new());
    static NEXT_MOUNT_ID: Cell<u64> = const { Cell::new(1) };
}

fn register_runtime(controller: InteractionController) -> u64 {
    let id = NEXT_MOUNT_ID.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    });
    let runtime = ViewportRuntime {
        binding: None,
        controller,
        drag: None,
        cine: None,
        display_gen: 0,
    };
    RUNTIMES.with(|r| r.borrow_mut().insert(id, runtime));
    id
}

/// Runs `f` against the runtime of mount `id`; `None` once it is torn down.
fn with_runtime<R>(id: u64, f: impl FnOnce(&mut ViewportRuntime) -> R) -> Option<R> {
    RUNTIMES.with(|r| r.borrow_mut().get_mut(&id).map(f))
}

/// Drops everything the mount holds: the binding is released, listeners
/// detached, the cine interval cleared.
fn teardown_runtime(id: u64) {
    let runtime = RUNTIMES.with(|r| r.borrow_mut().remove(&id));
    if let Some(mut rt) = runtime {
        if let Some(handle) = rt.cine.take() {
            handle.clear();
        }
        if let Some(mut drag) = rt.drag.take() {
            drag.detach();
        }
        if let Some(mut binding) = rt.binding.take() {
            binding.release();
        }
    }
}

fn end_drag(id: u64) {
    let drag = with_runtime(id, |rt| {
        rt.controller.release();
        rt.drag.take()
    })
    .flatten();
    if let Some(drag) = drag {
        drag.finish_deferred();
    }
}

// ── Engine-backed interactions ────────────────────────────────────────────────

fn zoom_wheel(id: u64, direction: i8) {
    with_runtime(id, |rt| {
        if let Some(b) = &rt.binding {
            rt.controller.zoom_by_wheel(b.engine(), b.surface(), direction);
        }
    });
}

fn zoom_button(id: u64, zoom_in: bool) {
    with_runtime(id, |rt| {
        if let Some(b) = &rt.binding {
            if zoom_in {
                rt.controller.zoom_in(b.engine(), b.surface());
            } else {
                rt.controller.zoom_out(b.engine(), b.surface());
            }
        }
    });
}

fn reset_view(id: u64) {
    with_runtime(id, |rt| {
        if let Some(b) = &rt.binding {
            rt.controller.reset(b.engine(), b.surface());
        }
    });
}

fn start_pan(id: u64, at: Point) {
    let started = with_runtime(id, |rt| match &rt.binding {
        Some(b) => rt.controller.press(b.engine(), b.surface(), at),
        None => false,
    })
    .unwrap_or(false);
    if !started {
        return;
    }

    let on_move = move |ev: MouseEvent| {
        let at = Point::new(ev.client_x() as f64, ev.client_y() as f64);
        with_runtime(id, |rt| {
            if let Some(b) = &rt.binding {
                rt.controller.drag_to(b.engine(), b.surface(), at);
            }
        });
    };
    let on_up = move |_: MouseEvent| end_drag(id);

    let Some(drag) = DocumentDrag::attach(on_move, on_up) else {
        with_runtime(id, |rt| rt.controller.release());
        return;
    };
    let previous = with_runtime(id, |rt| rt.drag.replace(drag)).flatten();
    if let Some(mut stale) = previous {
        stale.detach();
    }
}

/// Controls only show on the active cell once it has something to act on.
fn controls_visible(active: bool, image_count: usize) -> bool {
    active && image_count > 0
}

// ── Components ────────────────────────────────────────────────────────────────

/// One cell of the viewer grid: an engine-bound surface for the current
/// slice, a segmentation overlay canvas on top, and the controls around it.
#[component]
pub fn Viewport(
    view: ViewId,
    #[prop(into)] study_uid: Signal<Option<String>>,
    #[prop(into)] segmentation_classes: Signal<Vec<String>>,
    #[prop(into)] class_overlays: Signal<HashMap<String, ClassOverlay>>,
    #[prop(into)] is_active: Signal<bool>,
    #[prop(into)] on_activate: Callback<ViewId>,
) -> impl IntoView {
    let state = expect_context::<AppState>();
    let (base_url, cine_ms, zoom) = state
        .config
        .with_value(|c| (c.metadata_base_url.clone(), c.cine_interval_ms, c.zoom));

    let client = DicomWebClient::new(&base_url);
    let model = RwSignal::new(ViewportModel::new(view));
    let binding_ready = RwSignal::new(false);
    let surface_ref = NodeRef::<leptos::html::Div>::new();
    let overlay_ref = NodeRef::<leptos::html::Canvas>::new();

    let id = register_runtime(InteractionController::new(zoom));
    on_cleanup(move || {
        model.try_update(|m| m.teardown());
        teardown_runtime(id);
    });

    // Bind the surface to the engine once it is in the document
    Effect::new(move || {
        let Some(el) = surface_ref.get() else { return };
        if !view.is_planar() {
            return;
        }
        let el: HtmlElement = el.into();
        let bound = with_runtime(id, |rt| {
            if rt.binding.is_none() {
                rt.binding = EngineBinding::acquire(CornerstoneEngine, el);
            }
            rt.binding.is_some()
        })
        .unwrap_or(false);
        binding_ready.set(bound);
    });

    // (Re)load the series whenever the study changes
    let series_client = client.clone();
    Effect::new(move || {
        let Some(study) = study_uid.get() else { return };
        let Some(ticket) = model.try_update(|m| m.begin_load(&study)).flatten() else { return };
        let client = series_client.clone();
        spawn_local(async move {
            let result = load_study_images(&client, &study).await;
            if let Some(LoadOutcome::Ready { count }) = model.try_update(|m| m.finish_load(ticket, result)) {
                log::info!("{}: {} images for study {}", view.title(), count, study);
            }
        });
    });

    // Overlay load, independent of image display
    let phase = Memo::new(move |_| model.with(|m| m.phase()));
    Effect::new(move || {
        let classes = segmentation_classes.get();
        if !view.is_planar() || phase.get() != LoadPhase::Ready || classes.is_empty() {
            return;
        }
        let Some(study) = model.with_untracked(|m| {
            (m.overlay() == &OverlayPhase::NoOverlay).then(|| m.study_uid().map(str::to_string)).flatten()
        }) else {
            return;
        };
        let Some(ticket) = model.try_update(|m| m.begin_overlay()).flatten() else { return };
        let client = client.clone();
        spawn_local(async move {
            let result = load_segmentation(&client, &study).await;
            model.try_update(|m| m.finish_overlay(ticket, result, &NoDecoder));
        });
    });

    // Display the current slice; a newer slice supersedes a pending load
    let current_image_id = Memo::new(move |_| model.with(|m| m.current_image().map(|img| img.engine_image_id.clone())));
    Effect::new(move || {
        let image_id = current_image_id.get();
        if !binding_ready.get() {
            return;
        }
        let Some(image_id) = image_id else { return };
        let Some(gen) = with_runtime(id, |rt| {
            rt.display_gen += 1;
            rt.display_gen
        }) else {
            return;
        };
        spawn_local(async move {
            let image = CornerstoneEngine.load_image(&image_id).await;
            with_runtime(id, |rt| {
                if rt.display_gen != gen {
                    return;
                }
                match image {
                    Ok(image) => {
                        if let Some(b) = &rt.binding {
                            b.display(&image);
                        }
                    }
                    Err(e) => log::error!("Failed to load {image_id}: {e}"),
                }
            });
        });
    });

    // Composite the overlay over the surface
    Effect::new(move || {
        let classes = segmentation_classes.get();
        let params = class_overlays.get();
        let Some(canvas) = overlay_ref.get() else { return };
        let Some(surface) = surface_ref.get() else { return };
        model.with(|m| match m.visible_overlay() {
            Some(overlay) => overlay_renderer::draw(&canvas, &surface, overlay, &classes, &params),
            None => overlay_renderer::clear(&canvas),
        });
    });

    // Cine playback
    let playing = Memo::new(move |_| model.with(|m| m.is_playing()));
    Effect::new(move || {
        let play = playing.get();
        let previous = with_runtime(id, |rt| rt.cine.take()).flatten();
        if let Some(handle) = previous {
            handle.clear();
        }
        if !play {
            return;
        }
        let tick = move || {
            model.try_update(|m| m.cine_tick());
        };
        match set_interval_with_handle(tick, Duration::from_millis(u64::from(cine_ms))) {
            Ok(handle) => {
                with_runtime(id, |rt| rt.cine = Some(handle));
            }
            Err(e) => log::error!("Failed to start cine playback: {:?}", e),
        }
    });

    let on_wheel = move |ev: WheelEvent| {
        ev.prevent_default();
        let input = WheelInput { delta_y: ev.delta_y(), precision: ev.ctrl_key() };
        match WheelAction::from_input(input) {
            Some(WheelAction::Scrub(delta)) => {
                model.update(|m| {
                    m.step_slice(delta);
                });
            }
            Some(WheelAction::Zoom(direction)) => zoom_wheel(id, direction),
            None => {}
        }
    };

    let on_mousedown = move |ev: MouseEvent| {
        if ev.button() != 0 {
            return;
        }
        ev.prevent_default();
        start_pan(id, Point::new(ev.client_x() as f64, ev.client_y() as f64));
    };

    let is_loading = move || model.with(|m| m.is_loading());
    let image_count = move || model.with(|m| m.images().len());

    view! {
        <div
            class="viewport"
            class:active=move || is_active.get()
            on:click=move |_| on_activate.run(view)
        >
            <div class="viewport-title">{view.title()}</div>
            {if view.is_planar() {
                view! {
                    <div
                        class="viewport-surface"
                        node_ref=surface_ref
                        on:wheel=on_wheel
                        on:mousedown=on_mousedown
                        on:contextmenu=|ev: MouseEvent| ev.prevent_default()
                    ></div>
                    <canvas class="viewport-overlay" node_ref=overlay_ref></canvas>
                    <InfoBox model=model segment_count=Signal::derive(move || segmentation_classes.with(|c| c.len())) />
                    <Show when=move || controls_visible(is_active.get(), image_count())>
                        <ViewportControls model=model mount_id=id />
                    </Show>
                    <ClassLegend classes=segmentation_classes class_overlays=class_overlays />
                }
                    .into_any()
            } else {
                view! { <VolumePlaceholder image_count=Signal::derive(image_count) /> }.into_any()
            }}
            <Show when=is_loading>
                <div class="viewport-loading">"Loading…"</div>
            </Show>
        </div>
    }
}

#[component]
fn InfoBox(model: RwSignal<ViewportModel>, #[prop(into)] segment_count: Signal<usize>) -> impl IntoView {
    let text = move || {
        model.with(|m| {
            let n = m.images().len();
            match (m.slice_index(), m.current_image()) {
                (Some(i), Some(img)) => Some((format!("Image {} / {}", i + 1, n), img.instance_number)),
                _ => None,
            }
        })
    };

    view! {
        {move || text().map(|(position, instance)| {
            let segments = segment_count.get();
            view! {
                <div class="viewport-info">
                    <div>{position}</div>
                    <div>{format!("Instance #{instance}")}</div>
                    {(segments > 0).then(|| view! { <div>{format!("{segments} segments")}</div> })}
                </div>
            }
        })}
    }
}

#[component]
fn ViewportControls(model: RwSignal<ViewportModel>, mount_id: u64) -> impl IntoView {
    let playing = move || model.with(|m| m.is_playing());
    let overlay_shown = move || model.with(|m| m.overlay_shown());
    let has_overlay = move || model.with(|m| matches!(m.overlay(), OverlayPhase::Ready(_)));

    view! {
        <div class="viewport-controls" on:mousedown=|ev: MouseEvent| ev.stop_propagation()>
            <button title="Reset view" on:click=move |_| reset_view(mount_id)>"⟲"</button>
            <button title="Zoom in" on:click=move |_| zoom_button(mount_id, true)>"+"</button>
            <button title="Zoom out" on:click=move |_| zoom_button(mount_id, false)>"−"</button>
            <button
                title=move || if playing() { "Pause" } else { "Play" }
                on:click=move |_| model.update(|m| m.toggle_playing())
            >
                {move || if playing() { "⏸" } else { "▶" }}
            </button>
            <button
                title="Show/hide segmentation"
                class:off=move || !overlay_shown()
                disabled=move || !has_overlay()
                on:click=move |_| model.update(|m| m.toggle_overlay_shown())
            >
                "Seg"
            </button>
        </div>
    }
}

#[component]
fn ClassLegend(
    #[prop(into)] classes: Signal<Vec<String>>,
    #[prop(into)] class_overlays: Signal<HashMap<String, ClassOverlay>>,
) -> impl IntoView {
    let rows = move || {
        let overlays = class_overlays.get();
        classes
            .get()
            .into_iter()
            .enumerate()
            .filter(|(_, name)| overlays.get(name).is_some_and(|o| o.visible))
            .collect::<Vec<_>>()
    };

    view! {
        <Show when=move || !rows().is_empty()>
            <div class="viewport-legend">
                {move || rows().into_iter().map(|(i, name)| view! {
                    <div class="legend-row">
                        <span class="swatch" style:background-color=class_color_css(i)></span>
                        <span>{name}</span>
                    </div>
                }).collect_view()}
            </div>
        </Show>
    }
}

#[component]
fn VolumePlaceholder(#[prop(into)] image_count: Signal<usize>) -> impl IntoView {
    view! {
        <div class="volume-placeholder">
            <div class="volume-icon">"◈"</div>
            <div>"3D reconstruction not available"</div>
            <div class="volume-count">{move || format!("{} slices loaded", image_count.get())}</div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls_need_active_cell_with_images() {
        assert!(controls_visible(true, 3));
        assert!(!controls_visible(true, 0));
        assert!(!controls_visible(false, 3));
    }
}
