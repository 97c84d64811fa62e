use crate::input;
use glam::{UVec2, Vec2};
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

pub fn canvas_by_id(id: &str) -> anyhow::Result<web::HtmlCanvasElement> {
    let document = window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    document
        .get_element_by_id(id)
        .ok_or_else(|| anyhow::anyhow!("missing #{id}"))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!("#{id} is not a canvas: {:?}", e))
}

/// Match the canvas backing store to its CSS size times devicePixelRatio.
/// Returns the new backing size.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) -> UVec2 {
    if let Some(w) = web::window() {
        let rect = canvas.get_bounding_client_rect();
        let size = input::backing_size(
            Vec2::new(rect.width() as f32, rect.height() as f32),
            w.device_pixel_ratio(),
        );
        if canvas.width() != size.x {
            canvas.set_width(size.x);
        }
        if canvas.height() != size.y {
            canvas.set_height(size.y);
        }
    }
    input::canvas_size(canvas)
}
