//! Mapping raw wheel and pointer input onto engine viewport changes and
//! slice navigation.
//!
//! Engine failures never escape this module: each entry point logs the
//! error and reports `None`/`false`, leaving the viewport as it was.

pub mod pan;

use crate::config::ZoomLimits;
use crate::engine::{EngineViewport, ImageEngine};
use pan::{PanGesture, Point};

/// Scale change per wheel notch while the precision modifier is held.
pub const WHEEL_ZOOM_STEP: f64 = 0.1;
/// Multiplier applied by the zoom-in / zoom-out buttons.
pub const BUTTON_ZOOM_FACTOR: f64 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelInput {
    pub delta_y: f64,
    /// Ctrl held: the wheel zooms instead of scrubbing slices.
    pub precision: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelAction {
    /// Move the slice index by this many steps (±1).
    Scrub(isize),
    /// Zoom in (+1) or out (-1) by one wheel step.
    Zoom(i8),
}

impl WheelAction {
    /// Scrolling down (positive delta) moves back a slice / zooms out.
    /// A zero delta does nothing.
    pub fn from_input(input: WheelInput) -> Option<Self> {
        let direction: i8 = if input.delta_y > 0.0 {
            -1
        } else if input.delta_y < 0.0 {
            1
        } else {
            return None;
        };
        Some(if input.precision {
            WheelAction::Zoom(direction)
        } else {
            WheelAction::Scrub(direction as isize)
        })
    }
}

/// Per-viewport interaction state: the zoom policy and any drag in progress.
#[derive(Clone, Debug)]
pub struct InteractionController {
    limits: ZoomLimits,
    gesture: Option<PanGesture>,
}

impl InteractionController {
    pub fn new(limits: ZoomLimits) -> Self {
        Self { limits, gesture: None }
    }

    pub fn zoom_by_wheel<E: ImageEngine>(
        &self,
        engine: &E,
        surface: &E::Surface,
        direction: i8,
    ) -> Option<EngineViewport> {
        let limits = self.limits;
        update_viewport(engine, surface, "zoom", |vp| {
            vp.scale = limits.clamp(vp.scale + f64::from(direction) * WHEEL_ZOOM_STEP);
        })
    }

    /// Button zoom shares the wheel's clamp range.
    pub fn zoom_in<E: ImageEngine>(&self, engine: &E, surface: &E::Surface) -> Option<EngineViewport> {
        let limits = self.limits;
        update_viewport(engine, surface, "zoom in", |vp| {
            vp.scale = limits.clamp(vp.scale * BUTTON_ZOOM_FACTOR);
        })
    }

    pub fn zoom_out<E: ImageEngine>(&self, engine: &E, surface: &E::Surface) -> Option<EngineViewport> {
        let limits = self.limits;
        update_viewport(engine, surface, "zoom out", |vp| {
            vp.scale = limits.clamp(vp.scale / BUTTON_ZOOM_FACTOR);
        })
    }

    /// Restores the engine's default transform.
    pub fn reset<E: ImageEngine>(&self, engine: &E, surface: &E::Surface) -> bool {
        match engine.reset(surface) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to reset viewport: {e}");
                false
            }
        }
    }

    /// Starts a pan. Returns `false` (and starts nothing) when the engine
    /// viewport cannot be read.
    pub fn press<E: ImageEngine>(&mut self, engine: &E, surface: &E::Surface, at: Point) -> bool {
        match engine.viewport(surface) {
            Ok(vp) => {
                self.gesture = Some(PanGesture::new(at, vp.translation));
                true
            }
            Err(e) => {
                log::warn!("Pan not started: {e}");
                self.gesture = None;
                false
            }
        }
    }

    /// Applies a pointer move to the active gesture; ignored when no
    /// gesture is active.
    pub fn drag_to<E: ImageEngine>(
        &self,
        engine: &E,
        surface: &E::Surface,
        at: Point,
    ) -> Option<EngineViewport> {
        let gesture = self.gesture?;
        update_viewport(engine, surface, "pan", |vp| {
            vp.translation = gesture.translation_at(at);
        })
    }

    /// Ends the gesture. Returns whether one was active.
    pub fn release(&mut self) -> bool {
        self.gesture.take().is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}

/// Read-modify-write of the engine viewport, logging any failure.
fn update_viewport<E: ImageEngine>(
    engine: &E,
    surface: &E::Surface,
    op: &str,
    apply: impl FnOnce(&mut EngineViewport),
) -> Option<EngineViewport> {
    let result = engine.viewport(surface).and_then(|mut vp| {
        apply(&mut vp);
        engine.set_viewport(surface, &vp).map(|()| vp)
    });
    match result {
        Ok(vp) => Some(vp),
        Err(e) => {
            log::error!("Failed to {op}: {e}");
            None
        }
    }
}
