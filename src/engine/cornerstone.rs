//! Raw bindings to the `cornerstone` and `cornerstoneWADOImageLoader`
//! globals loaded by index.html.

use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = cornerstone, js_name = enable, catch)]
    pub fn enable(element: &HtmlElement) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = cornerstone, js_name = disable, catch)]
    pub fn disable(element: &HtmlElement) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = cornerstone, js_name = loadImage, catch)]
    pub fn load_image(image_id: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = cornerstone, js_name = displayImage, catch)]
    pub fn display_image(element: &HtmlElement, image: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = cornerstone, js_name = getViewport, catch)]
    pub fn get_viewport(element: &HtmlElement) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = cornerstone, js_name = setViewport, catch)]
    pub fn set_viewport(element: &HtmlElement, viewport: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = cornerstone, js_name = reset, catch)]
    pub fn reset(element: &HtmlElement) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = cornerstoneWADOImageLoader, js_name = configure, catch)]
    pub fn configure_wado_loader(options: &JsValue) -> Result<(), JsValue>;
}
