//! Document-level mouse listeners for the lifetime of one drag gesture, so
//! the gesture keeps tracking after the pointer leaves the viewport.

use wasm_bindgen::prelude::*;
use web_sys::{Document, MouseEvent};

pub struct DocumentDrag {
    document: Document,
    on_move: Closure<dyn FnMut(MouseEvent)>,
    on_up: Closure<dyn FnMut(MouseEvent)>,
    attached: bool,
}

impl DocumentDrag {
    /// Registers `mousemove`/`mouseup` on the document.
    pub fn attach(
        on_move: impl FnMut(MouseEvent) + 'static,
        on_up: impl FnMut(MouseEvent) + 'static,
    ) -> Option<Self> {
        let document = web_sys::window()?.document()?;
        let on_move = Closure::<dyn FnMut(MouseEvent)>::new(on_move);
        let on_up = Closure::<dyn FnMut(MouseEvent)>::new(on_up);

        let mut drag = Self { document, on_move, on_up, attached: false };
        let target: &web_sys::EventTarget = drag.document.as_ref();
        let moved = target.add_event_listener_with_callback("mousemove", drag.on_move.as_ref().unchecked_ref());
        let upped = target.add_event_listener_with_callback("mouseup", drag.on_up.as_ref().unchecked_ref());
        // mark attached before checking so a half-registered pair is still removed
        drag.attached = true;
        if let Err(e) = moved.and(upped) {
            log::error!("Failed to attach drag listeners: {:?}", e);
            drag.detach();
            return None;
        }
        Some(drag)
    }

    /// Removes both listeners. Safe to call more than once.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        let target: &web_sys::EventTarget = self.document.as_ref();
        let _ = target.remove_event_listener_with_callback("mousemove", self.on_move.as_ref().unchecked_ref());
        let _ = target.remove_event_listener_with_callback("mouseup", self.on_up.as_ref().unchecked_ref());
    }

    /// Detaches now and frees the closures on a later tick. Use this from
    /// inside one of the drag's own handlers, which must not be dropped
    /// while running.
    pub fn finish_deferred(mut self) {
        self.detach();
        wasm_bindgen_futures::spawn_local(async move {
            drop(self);
        });
    }
}

impl Drop for DocumentDrag {
    fn drop(&mut self) {
        self.detach();
    }
}
