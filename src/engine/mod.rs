//! [`ImageEngine`] implementation over cornerstone.
//!
//! Only `scale` and `translation.{x,y}` of cornerstone's viewport object are
//! read or written; everything else (VOI, inversion, rotation) is left as
//! cornerstone set it.

mod cornerstone;

use std::future::Future;

use js_sys::{Object, Reflect};
use segview_core::config::EngineConfig;
use segview_core::engine::{EngineViewport, ImageEngine, Translation};
use segview_core::EngineError;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlElement;

#[derive(Clone, Copy, Debug, Default)]
pub struct CornerstoneEngine;

fn js_error(op: &'static str, e: JsValue) -> EngineError {
    let message = e
        .as_string()
        .or_else(|| Reflect::get(&e, &"message".into()).ok().and_then(|m| m.as_string()))
        .unwrap_or_else(|| format!("{e:?}"));
    EngineError::call(op, message)
}

fn get_f64(obj: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(obj, &JsValue::from_str(key)).ok()?.as_f64()
}

fn set_f64(obj: &JsValue, key: &str, value: f64) -> Result<(), EngineError> {
    Reflect::set(obj, &JsValue::from_str(key), &JsValue::from_f64(value))
        .map(|_| ())
        .map_err(|e| js_error("setViewport", e))
}

/// Cornerstone returns `undefined` for elements it has not enabled or that
/// have no image yet.
fn engine_viewport(element: &HtmlElement) -> Result<JsValue, EngineError> {
    let vp = cornerstone::get_viewport(element).map_err(|e| js_error("getViewport", e))?;
    if vp.is_undefined() || vp.is_null() {
        return Err(EngineError::Unbound);
    }
    Ok(vp)
}

impl ImageEngine for CornerstoneEngine {
    type Surface = HtmlElement;
    type Image = JsValue;

    fn configure(&self, config: &EngineConfig) -> Result<(), EngineError> {
        let global = js_sys::global();
        let loader = Reflect::get(&global, &"cornerstoneWADOImageLoader".into())
            .map_err(|e| js_error("configure", e))?;
        let cs = Reflect::get(&global, &"cornerstone".into()).map_err(|e| js_error("configure", e))?;
        if loader.is_undefined() || cs.is_undefined() {
            return Err(EngineError::call("configure", "cornerstone scripts not loaded"));
        }

        // the WADO loader needs to know which cornerstone instance to register with
        let external = Reflect::get(&loader, &"external".into()).map_err(|e| js_error("configure", e))?;
        if !external.is_object() {
            return Err(EngineError::call("configure", "cornerstoneWADOImageLoader.external missing"));
        }
        Reflect::set(&external, &"cornerstone".into(), &cs).map_err(|e| js_error("configure", e))?;

        let options = Object::new();
        let decode = Object::new();
        let set = |obj: &Object, key: &str, value: JsValue| {
            Reflect::set(obj, &JsValue::from_str(key), &value).map_err(|e| js_error("configure", e))
        };
        set(&decode, "convertFloatPixelDataToInt", JsValue::from_bool(!config.preserve_float_precision))?;
        set(&options, "useWebWorkers", JsValue::from_bool(config.enable_worker_decoding))?;
        set(&options, "decodeConfig", decode.into())?;
        cornerstone::configure_wado_loader(&options).map_err(|e| js_error("configure", e))
    }

    fn enable(&self, surface: &HtmlElement) -> Result<(), EngineError> {
        cornerstone::enable(surface).map_err(|e| js_error("enable", e))
    }

    fn disable(&self, surface: &HtmlElement) -> Result<(), EngineError> {
        cornerstone::disable(surface).map_err(|e| js_error("disable", e))
    }

    fn load_image(&self, image_id: &str) -> impl Future<Output = Result<JsValue, EngineError>> {
        let promise = cornerstone::load_image(image_id);
        async move {
            let promise = promise.map_err(|e| js_error("loadImage", e))?;
            JsFuture::from(promise).await.map_err(|e| js_error("loadImage", e))
        }
    }

    fn display_image(&self, surface: &HtmlElement, image: &JsValue) -> Result<(), EngineError> {
        cornerstone::display_image(surface, image).map_err(|e| js_error("displayImage", e))
    }

    fn viewport(&self, surface: &HtmlElement) -> Result<EngineViewport, EngineError> {
        let vp = engine_viewport(surface)?;
        let translation = Reflect::get(&vp, &"translation".into()).map_err(|e| js_error("getViewport", e))?;
        Ok(EngineViewport {
            scale: get_f64(&vp, "scale").unwrap_or(1.0),
            translation: Translation {
                x: get_f64(&translation, "x").unwrap_or(0.0),
                y: get_f64(&translation, "y").unwrap_or(0.0),
            },
        })
    }

    fn set_viewport(&self, surface: &HtmlElement, viewport: &EngineViewport) -> Result<(), EngineError> {
        let vp = engine_viewport(surface)?;
        set_f64(&vp, "scale", viewport.scale)?;
        let translation = Object::new();
        set_f64(&translation, "x", viewport.translation.x)?;
        set_f64(&translation, "y", viewport.translation.y)?;
        Reflect::set(&vp, &"translation".into(), &translation).map_err(|e| js_error("setViewport", e))?;
        cornerstone::set_viewport(surface, &vp).map_err(|e| js_error("setViewport", e))
    }

    fn reset(&self, surface: &HtmlElement) -> Result<(), EngineError> {
        cornerstone::reset(surface).map_err(|e| js_error("reset", e))
    }
}

thread_local! {
    static INITIALIZED: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Configures the image loader. Runs once per page; later calls are no-ops.
pub fn initialize(config: &EngineConfig) {
    if INITIALIZED.with(|i| i.replace(true)) {
        return;
    }
    match CornerstoneEngine.configure(config) {
        Ok(()) => log::info!(
            "image engine configured (workers: {}, float precision: {})",
            config.enable_worker_decoding,
            config.preserve_float_precision
        ),
        Err(e) => log::error!("Image engine configuration failed: {e}"),
    }
}
