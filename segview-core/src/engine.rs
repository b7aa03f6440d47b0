//! Capability interface of the external image engine.
//!
//! The engine owns DICOM decoding and rendering. This crate only ever reads
//! and writes the viewport scale and translation; every call may fail, and
//! callers turn failures into logged no-ops.

use std::future::Future;
use serde::{Deserialize, Serialize};
use crate::config::EngineConfig;
use crate::error::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub x: f64,
    pub y: f64,
}

/// The subset of the engine's per-surface transform that the viewer touches.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineViewport {
    pub scale: f64,
    pub translation: Translation,
}

impl Default for EngineViewport {
    fn default() -> Self {
        Self { scale: 1.0, translation: Translation::default() }
    }
}

pub trait ImageEngine {
    /// The on-screen element an image is drawn into.
    type Surface;
    /// A decoded image handle returned by `load_image`.
    type Image;

    /// One-time process setup; see [`EngineConfig`].
    fn configure(&self, config: &EngineConfig) -> Result<(), EngineError>;
    fn enable(&self, surface: &Self::Surface) -> Result<(), EngineError>;
    fn disable(&self, surface: &Self::Surface) -> Result<(), EngineError>;
    fn load_image(&self, image_id: &str) -> impl Future<Output = Result<Self::Image, EngineError>>;
    fn display_image(&self, surface: &Self::Surface, image: &Self::Image) -> Result<(), EngineError>;
    fn viewport(&self, surface: &Self::Surface) -> Result<EngineViewport, EngineError>;
    fn set_viewport(&self, surface: &Self::Surface, viewport: &EngineViewport) -> Result<(), EngineError>;
    fn reset(&self, surface: &Self::Surface) -> Result<(), EngineError>;
}

/// A surface enabled on the engine. Released exactly once: either through
/// [`EngineBinding::release`] or on drop, whichever comes first.
pub struct EngineBinding<E: ImageEngine> {
    engine: E,
    surface: E::Surface,
    released: bool,
}

impl<E: ImageEngine> EngineBinding<E> {
    /// Enables `surface`; returns `None` (after logging) if the engine refuses.
    pub fn acquire(engine: E, surface: E::Surface) -> Option<Self> {
        match engine.enable(&surface) {
            Ok(()) => Some(Self { engine, surface, released: false }),
            Err(e) => {
                log::error!("Failed to enable engine surface: {e}");
                None
            }
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn surface(&self) -> &E::Surface {
        &self.surface
    }

    /// Shows an already loaded image; failures are logged.
    pub fn display(&self, image: &E::Image) -> bool {
        if self.released {
            return false;
        }
        match self.engine.display_image(&self.surface, image) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to display image: {e}");
                false
            }
        }
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.engine.disable(&self.surface) {
            log::error!("Failed to disable engine surface: {e}");
        }
    }
}

impl<E: ImageEngine> Drop for EngineBinding<E> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::cell::RefCell;
    use std::future::ready;
    use std::rc::Rc;
    use super::*;

    #[derive(Debug, Default)]
    pub struct Calls {
        pub enabled: usize,
        pub disabled: usize,
        pub displayed: Vec<String>,
        pub set_viewport: usize,
        pub resets: usize,
    }

    /// Engine double with a single surface-independent viewport.
    #[derive(Clone, Default)]
    pub struct MockEngine {
        pub calls: Rc<RefCell<Calls>>,
        pub viewport: Rc<RefCell<EngineViewport>>,
        pub fail: Rc<RefCell<bool>>,
    }

    impl MockEngine {
        pub fn failing() -> Self {
            let engine = Self::default();
            *engine.fail.borrow_mut() = true;
            engine
        }

        pub fn with_scale(scale: f64) -> Self {
            let engine = Self::default();
            engine.viewport.borrow_mut().scale = scale;
            engine
        }

        pub fn current(&self) -> EngineViewport {
            *self.viewport.borrow()
        }

        fn check(&self, op: &'static str) -> Result<(), EngineError> {
            if *self.fail.borrow() {
                Err(EngineError::call(op, "element not enabled"))
            } else {
                Ok(())
            }
        }
    }

    impl ImageEngine for MockEngine {
        type Surface = &'static str;
        type Image = String;

        fn configure(&self, _config: &EngineConfig) -> Result<(), EngineError> {
            self.check("configure")
        }

        fn enable(&self, _surface: &Self::Surface) -> Result<(), EngineError> {
            self.check("enable")?;
            self.calls.borrow_mut().enabled += 1;
            Ok(())
        }

        fn disable(&self, _surface: &Self::Surface) -> Result<(), EngineError> {
            self.calls.borrow_mut().disabled += 1;
            self.check("disable")
        }

        fn load_image(&self, image_id: &str) -> impl Future<Output = Result<Self::Image, EngineError>> {
            ready(self.check("loadImage").map(|()| image_id.to_string()))
        }

        fn display_image(&self, _surface: &Self::Surface, image: &Self::Image) -> Result<(), EngineError> {
            self.check("displayImage")?;
            self.calls.borrow_mut().displayed.push(image.clone());
            Ok(())
        }

        fn viewport(&self, _surface: &Self::Surface) -> Result<EngineViewport, EngineError> {
            self.check("getViewport")?;
            Ok(*self.viewport.borrow())
        }

        fn set_viewport(&self, _surface: &Self::Surface, viewport: &EngineViewport) -> Result<(), EngineError> {
            self.check("setViewport")?;
            self.calls.borrow_mut().set_viewport += 1;
            *self.viewport.borrow_mut() = *viewport;
            Ok(())
        }

        fn reset(&self, _surface: &Self::Surface) -> Result<(), EngineError> {
            self.check("reset")?;
            self.calls.borrow_mut().resets += 1;
            *self.viewport.borrow_mut() = EngineViewport::default();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockEngine;
    use super::*;

    #[test]
    fn test_binding_released_exactly_once() {
        let engine = MockEngine::default();
        let mut binding = EngineBinding::acquire(engine.clone(), "axial").unwrap();
        binding.release();
        binding.release();
        drop(binding);
        let calls = engine.calls.borrow();
        assert_eq!(calls.enabled, 1);
        assert_eq!(calls.disabled, 1);
    }

    #[test]
    fn test_drop_releases_binding() {
        let engine = MockEngine::default();
        {
            let _binding = EngineBinding::acquire(engine.clone(), "coronal").unwrap();
        }
        assert_eq!(engine.calls.borrow().disabled, 1);
    }

    #[test]
    fn test_failed_enable_yields_no_binding() {
        let engine = MockEngine::failing();
        assert!(EngineBinding::acquire(engine.clone(), "axial").is_none());
        assert_eq!(engine.calls.borrow().disabled, 0);
    }

    #[tokio::test]
    async fn test_display_after_release_is_noop() {
        let engine = MockEngine::default();
        let mut binding = EngineBinding::acquire(engine.clone(), "axial").unwrap();
        let image = engine.load_image("wadouri:a").await.unwrap();
        assert!(binding.display(&image));
        binding.release();
        assert!(!binding.display(&image));
        assert_eq!(engine.calls.borrow().displayed, vec!["wadouri:a".to_string()]);
    }
}
