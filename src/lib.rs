#![cfg(target_arch = "wasm32")]
//! Browser front-end: mounts the smoke simulation on a `<canvas>` behind
//! the page content and drives it from requestAnimationFrame.

use glam::{Vec2, Vec3};
use smoke_core::constants::SMOKE_GRAY;
use smoke_core::{FluidEngine, FrameDriver, Impulse, SimulationConfig};
use smoke_gpu::SmokeRenderer;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys as web;

mod dom;
mod events;
mod frame;
mod input;

use frame::{FrameLoop, SharedDriver};

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("smoke-web starting");
    Ok(())
}

/// Mount the simulation on `#canvas_id` and start it.
///
/// `config` is a partial `SimulationConfig` object; `undefined` or `null`
/// selects the incense preset. Initialization failures are logged and leave
/// the canvas transparent: the returned handle is then inert.
#[wasm_bindgen]
pub async fn mount(canvas_id: String, config: JsValue) -> SmokeHandle {
    match init(&canvas_id, config).await {
        Ok(session) => {
            let handle = SmokeHandle {
                session: Some(Rc::new(session)),
            };
            handle.start();
            handle
        }
        Err(e) => {
            log::error!("[mount] smoke disabled: {:?}", e);
            SmokeHandle { session: None }
        }
    }
}

struct Session {
    canvas: web::HtmlCanvasElement,
    driver: SharedDriver,
    frame_loop: RefCell<FrameLoop>,
    listeners: RefCell<Vec<events::Listener>>,
}

fn parse_config(config: JsValue) -> anyhow::Result<SimulationConfig> {
    if config.is_undefined() || config.is_null() {
        return Ok(SimulationConfig::incense());
    }
    let json: String = js_sys::JSON::stringify(&config)
        .map_err(|e| anyhow::anyhow!("config is not serializable: {:?}", e))?
        .into();
    let config: SimulationConfig = serde_json::from_str(&json)?;
    config.validate()?;
    Ok(config)
}

async fn init(canvas_id: &str, config: JsValue) -> anyhow::Result<Session> {
    let config = parse_config(config)?;
    let canvas = dom::canvas_by_id(canvas_id)?;

    let mut listeners = Vec::new();
    listeners.extend(events::wire_canvas_resize(&canvas));
    let size = input::canvas_size(&canvas);

    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
    let renderer = match SmokeRenderer::new(&instance, surface, size, config.clone()).await {
        Ok(r) => r,
        Err(e) => {
            for l in listeners {
                l.remove();
            }
            return Err(e.into());
        }
    };

    let driver: SharedDriver = Rc::new(RefCell::new(FrameDriver::new(renderer, &config, size)));
    let color = config
        .emitter
        .as_ref()
        .map(|e| e.color)
        .unwrap_or(Vec3::splat(SMOKE_GRAY));
    listeners.extend(events::wire_pointer(&canvas, &driver, config.splat_force, color));

    Ok(Session {
        frame_loop: RefCell::new(FrameLoop::new(driver.clone(), canvas.clone())),
        canvas,
        driver,
        listeners: RefCell::new(listeners),
    })
}

/// JS-side control over a mounted simulation.
#[wasm_bindgen]
pub struct SmokeHandle {
    session: Option<Rc<Session>>,
}

#[wasm_bindgen]
impl SmokeHandle {
    pub fn start(&self) {
        let Some(s) = &self.session else {
            return;
        };
        if let Err(e) = s.frame_loop.borrow_mut().start() {
            log::warn!("[mount] start ignored: {e}");
        }
    }

    pub fn stop(&self) {
        if let Some(s) = &self.session {
            s.frame_loop.borrow_mut().stop();
        }
    }

    /// Queue a splat at canvas pixel `(x, y)` with velocity `(dx, dy)`.
    #[allow(clippy::too_many_arguments)]
    pub fn splat(&self, x: f32, y: f32, dx: f32, dy: f32, r: f64, g: f64, b: f64) {
        if let Some(s) = &self.session {
            let color = input::color_from_js(r, g, b);
            let impulse = Impulse::new(Vec2::new(x, y), Vec2::new(dx, dy), color);
            s.driver.borrow_mut().queue_impulse(impulse);
        }
    }

    /// Stop the loop, unhook every listener and release GPU resources.
    /// Idempotent.
    pub fn dispose(&self) {
        let Some(s) = &self.session else {
            return;
        };
        s.frame_loop.borrow_mut().teardown();
        for l in s.listeners.borrow_mut().drain(..) {
            l.remove();
        }
        s.driver.borrow_mut().dispose();
        log::info!("[mount] disposed #{}", s.canvas.id());
    }

    /// `uninitialized`, `ready`, `stepping` or `disposed`.
    pub fn state(&self) -> String {
        match &self.session {
            Some(s) => s.driver.borrow().engine().lifecycle().as_str().to_owned(),
            None => "uninitialized".to_owned(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.driver.borrow().is_running())
    }
}
