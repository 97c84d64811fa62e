use glam::{UVec2, Vec2};
use smoke_core::{FrameDriver, FrameOutcome, PointerTracker, SimulationConfig};
use smoke_gpu::SmokeRenderer;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use winit::{event::*, event_loop::EventLoop, window::WindowBuilder};

/// `smoke-native [config.json]`: the incense preset unless a config file is
/// given. Missing keys fall back to defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::incense());
    };
    let text = std::fs::read_to_string(path)?;
    let config: SimulationConfig = serde_json::from_str(&text)?;
    config.validate()?;
    log::info!("[native] config from {}", path.display());
    Ok(config)
}

fn window_size(window: &winit::window::Window) -> UVec2 {
    let size = window.inner_size();
    UVec2::new(size.width, size.height)
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let arg = std::env::args().nth(1);
    let config = load_config(arg.as_deref().map(Path::new))?;

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Shrine smoke (native)")
            .with_transparent(true)
            .build(&event_loop)?,
    );

    let mut canvas = window_size(&window);
    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(window.clone())?;
    let renderer = pollster::block_on(SmokeRenderer::new(
        &instance,
        surface,
        canvas,
        config.clone(),
    ))?;
    let mut driver = FrameDriver::new(renderer, &config, canvas);
    driver.start()?;

    let mut pointer = PointerTracker::default();
    let mut pressed = false;
    let mut last = Instant::now();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent {
            event: WindowEvent::Resized(size),
            ..
        } => canvas = UVec2::new(size.width, size.height),
        Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } => {
            driver.dispose();
            elwt.exit();
        }
        Event::WindowEvent {
            event:
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                },
            ..
        } => {
            pressed = state == ElementState::Pressed;
        }
        Event::WindowEvent {
            event: WindowEvent::CursorMoved { position, .. },
            ..
        } => {
            // Tracks while hovering so a drag starts from the press point.
            let pos = Vec2::new(position.x as f32, position.y as f32);
            let moved = pointer.move_to(pos, canvas, config.splat_force, smoke_color(&config));
            if let (true, Some(impulse)) = (pressed, moved) {
                driver.queue_impulse(impulse);
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            driver.emit_due(now - last);
            last = now;
            match driver.frame(now, canvas) {
                Ok(FrameOutcome::Continue) => window.request_redraw(),
                Ok(FrameOutcome::Halted) => {}
                Err(e) => {
                    log::error!("[native] {e}");
                    driver.dispose();
                    elwt.exit();
                }
            }
        }
        _ => {}
    })?;
    Ok(())
}

fn smoke_color(config: &SimulationConfig) -> glam::Vec3 {
    config
        .emitter
        .as_ref()
        .map(|e| e.color)
        .unwrap_or(glam::Vec3::splat(smoke_core::constants::SMOKE_GRAY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_config_path_selects_incense() {
        let config = load_config(None).unwrap();
        assert_eq!(config, SimulationConfig::incense());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/smoke.json"))).is_err());
    }
}
