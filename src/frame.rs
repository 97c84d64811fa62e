use crate::input;
use instant::Instant;
use smoke_core::{FrameDriver, FrameOutcome, SimError};
use smoke_gpu::SmokeRenderer;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub type SharedDriver = Rc<RefCell<FrameDriver<SmokeRenderer<'static>>>>;

type Tick = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// requestAnimationFrame loop plus the emission timer.
pub struct FrameLoop {
    driver: SharedDriver,
    tick: Tick,
    raf_id: Rc<Cell<Option<i32>>>,
    interval: Option<(i32, Closure<dyn FnMut()>)>,
}

impl FrameLoop {
    pub fn new(driver: SharedDriver, canvas: web::HtmlCanvasElement) -> Self {
        let tick: Tick = Rc::new(RefCell::new(None));
        let raf_id = Rc::new(Cell::new(None));

        let tick_clone = tick.clone();
        let raf_clone = raf_id.clone();
        let driver_tick = driver.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            raf_clone.set(None);
            let size = input::canvas_size(&canvas);
            let outcome = driver_tick.borrow_mut().frame(Instant::now(), size);
            match outcome {
                Ok(FrameOutcome::Continue) => request_frame(&tick_clone, &raf_clone),
                Ok(FrameOutcome::Halted) => {}
                Err(e) => {
                    log::error!("[frame] halting: {e}");
                    driver_tick.borrow_mut().stop();
                }
            }
        }) as Box<dyn FnMut()>));

        Self {
            driver,
            tick,
            raf_id,
            interval: None,
        }
    }

    pub fn start(&mut self) -> Result<(), SimError> {
        self.driver.borrow_mut().start()?;
        if self.raf_id.get().is_none() {
            request_frame(&self.tick, &self.raf_id);
        }
        if self.interval.is_none() {
            self.interval = self.start_interval();
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        self.cancel();
        self.driver.borrow_mut().stop();
    }

    /// Cancel the pending frame and the timer, then drop the loop closure.
    /// The driver is left for the caller to dispose.
    pub fn teardown(&mut self) {
        self.cancel();
        self.tick.borrow_mut().take();
    }

    fn cancel(&mut self) {
        let Some(window) = web::window() else {
            return;
        };
        if let Some(id) = self.raf_id.take() {
            _ = window.cancel_animation_frame(id);
        }
        if let Some((id, _closure)) = self.interval.take() {
            window.clear_interval_with_handle(id);
        }
    }

    fn start_interval(&self) -> Option<(i32, Closure<dyn FnMut()>)> {
        let ms = self.driver.borrow().emit_interval()?.as_millis() as i32;
        let window = web::window()?;
        let driver = self.driver.clone();
        let closure = Closure::wrap(Box::new(move || {
            driver.borrow_mut().emit_scheduled();
        }) as Box<dyn FnMut()>);
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            ms.max(1),
        ) {
            Ok(id) => Some((id, closure)),
            Err(e) => {
                log::warn!("[frame] emission timer unavailable: {:?}", e);
                None
            }
        }
    }
}

fn request_frame(tick: &Tick, raf_id: &Cell<Option<i32>>) {
    let Some(window) = web::window() else {
        return;
    };
    let slot = tick.borrow();
    let Some(cb) = slot.as_ref() else {
        return;
    };
    match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
        Ok(id) => raf_id.set(Some(id)),
        Err(e) => log::error!("[frame] requestAnimationFrame failed: {:?}", e),
    }
}
