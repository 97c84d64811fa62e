// Host-side tests for pure input functions.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod input {
    include!("../src/input.rs");
}

use glam::{UVec2, Vec2, Vec3};
use input::*;

#[test]
fn backing_size_scales_by_device_pixel_ratio() {
    assert_eq!(backing_size(Vec2::new(800.0, 600.0), 2.0), UVec2::new(1600, 1200));
    assert_eq!(backing_size(Vec2::new(800.0, 600.0), 1.0), UVec2::new(800, 600));
}

#[test]
fn backing_size_never_collapses_to_zero() {
    assert_eq!(backing_size(Vec2::ZERO, 2.0), UVec2::ONE);
    // A bogus ratio falls back to 1.
    assert_eq!(backing_size(Vec2::new(10.0, 20.0), f64::NAN), UVec2::new(10, 20));
    assert_eq!(backing_size(Vec2::new(10.0, 20.0), 0.0), UVec2::new(10, 20));
}

#[test]
fn client_point_maps_into_backing_pixels() {
    // 400x300 CSS box at (100, 50) backed by an 800x600 canvas.
    let px = client_to_canvas_px(
        Vec2::new(300.0, 200.0),
        Vec2::new(100.0, 50.0),
        Vec2::new(400.0, 300.0),
        UVec2::new(800, 600),
    );
    assert_eq!(px, Some(Vec2::new(400.0, 300.0)));
}

#[test]
fn rect_corners_map_to_canvas_corners() {
    let origin = Vec2::new(10.0, 20.0);
    let rect = Vec2::new(200.0, 100.0);
    let canvas = UVec2::new(400, 200);
    assert_eq!(client_to_canvas_px(origin, origin, rect, canvas), Some(Vec2::ZERO));
    assert_eq!(
        client_to_canvas_px(origin + rect, origin, rect, canvas),
        Some(Vec2::new(400.0, 200.0))
    );
}

#[test]
fn unlaid_out_canvas_yields_no_position() {
    let px = client_to_canvas_px(Vec2::ONE, Vec2::ZERO, Vec2::new(0.0, 100.0), UVec2::new(1, 1));
    assert!(px.is_none());
}

#[test]
fn js_colors_drop_non_finite_channels() {
    assert_eq!(color_from_js(0.5, 1.0, 0.25), Vec3::new(0.5, 1.0, 0.25));
    assert_eq!(color_from_js(f64::NAN, f64::INFINITY, 0.3), Vec3::new(0.0, 0.0, 0.3));
}
