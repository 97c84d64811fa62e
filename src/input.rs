use glam::{UVec2, Vec2, Vec3};
use web_sys as web;

/// Backing-store size for a CSS box at a device pixel ratio. Never zero.
#[inline]
pub fn backing_size(css: Vec2, dpr: f64) -> UVec2 {
    let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
    let w = (css.x as f64 * dpr) as u32;
    let h = (css.y as f64 * dpr) as u32;
    UVec2::new(w.max(1), h.max(1))
}

/// Map a client-space point into canvas backing pixels (origin top-left).
/// `None` while the canvas has no layout box.
#[inline]
pub fn client_to_canvas_px(
    client: Vec2,
    rect_origin: Vec2,
    rect_size: Vec2,
    canvas: UVec2,
) -> Option<Vec2> {
    if rect_size.x <= 0.0 || rect_size.y <= 0.0 {
        return None;
    }
    let css = client - rect_origin;
    Some(css / rect_size * canvas.as_vec2())
}

/// Color channels from JS numbers; anything non-finite becomes 0.
#[inline]
pub fn color_from_js(r: f64, g: f64, b: f64) -> Vec3 {
    let c = |v: f64| if v.is_finite() { v as f32 } else { 0.0 };
    Vec3::new(c(r), c(g), c(b))
}

#[inline]
pub fn canvas_size(canvas: &web::HtmlCanvasElement) -> UVec2 {
    UVec2::new(canvas.width(), canvas.height())
}

pub fn pointer_canvas_px(ev: &web::PointerEvent, canvas: &web::HtmlCanvasElement) -> Option<Vec2> {
    let rect = canvas.get_bounding_client_rect();
    client_to_canvas_px(
        Vec2::new(ev.client_x() as f32, ev.client_y() as f32),
        Vec2::new(rect.left() as f32, rect.top() as f32),
        Vec2::new(rect.width() as f32, rect.height() as f32),
        canvas_size(canvas),
    )
}
