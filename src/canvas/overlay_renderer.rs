use std::collections::HashMap;

use segview_core::segmentation::overlay::{rasterize, RgbaImage};
use segview_core::segmentation::{ClassOverlay, SegmentationOverlay};
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, ImageData};

fn get_canvas_ctx(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()?
        .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
}

/// Matches the overlay canvas' backing size to the engine surface's
/// on-screen size. Returns `None` while the surface has no layout.
fn sync_size(canvas: &HtmlCanvasElement, surface: &HtmlElement) -> Option<(u32, u32)> {
    let rect = surface.get_bounding_client_rect();
    let w = rect.width() as u32;
    let h = rect.height() as u32;
    if w == 0 || h == 0 {
        return None;
    }
    if canvas.width() != w || canvas.height() != h {
        canvas.set_width(w);
        canvas.set_height(h);
    }
    Some((w, h))
}

pub fn clear(canvas: &HtmlCanvasElement) {
    if let Some(ctx) = get_canvas_ctx(canvas) {
        ctx.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
    }
}

/// Rasterises `overlay` with the current class parameters and composites
/// it over the whole canvas at the overlay's opacity.
pub fn draw(
    canvas: &HtmlCanvasElement,
    surface: &HtmlElement,
    overlay: &SegmentationOverlay,
    classes: &[String],
    params: &HashMap<String, ClassOverlay>,
) {
    let Some((cw, ch)) = sync_size(canvas, surface) else { return };
    let Some(ctx) = get_canvas_ctx(canvas) else { return };
    ctx.clear_rect(0.0, 0.0, cw as f64, ch as f64);

    let image = rasterize(overlay, classes, params);
    if image.width == 0 || image.height == 0 {
        return;
    }
    let Some(tmp) = image_canvas(&image) else { return };

    ctx.set_global_alpha(f64::from(overlay.opacity.clamp(0.0, 1.0)));
    let _ = ctx.draw_image_with_html_canvas_element_and_dw_and_dh(&tmp, 0.0, 0.0, cw as f64, ch as f64);
    ctx.set_global_alpha(1.0);
}

/// Puts RGBA pixels into an offscreen canvas so they can be scaled when drawn.
fn image_canvas(image: &RgbaImage) -> Option<HtmlCanvasElement> {
    let data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(&image.pixels[..]), image.width, image.height).ok()?;
    let doc = web_sys::window()?.document()?;
    let tmp = doc.create_element("canvas").ok()?.dyn_into::<HtmlCanvasElement>().ok()?;
    tmp.set_width(image.width);
    tmp.set_height(image.height);
    let tc = get_canvas_ctx(&tmp)?;
    tc.put_image_data(&data, 0.0, 0.0).ok()?;
    Some(tmp)
}
