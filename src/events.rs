use crate::dom;
use crate::frame::SharedDriver;
use crate::input;
use glam::Vec3;
use smoke_core::PointerTracker;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// A DOM listener that stays registered until `remove` is called.
pub struct Listener {
    target: web::EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web::Event)>,
}

impl Listener {
    fn attach(
        target: &web::EventTarget,
        kind: &'static str,
        handler: impl FnMut(web::Event) + 'static,
    ) -> Option<Self> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
        match target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref()) {
            Ok(()) => Some(Self {
                target: target.clone(),
                kind,
                closure,
            }),
            Err(e) => {
                log::warn!("[events] could not listen for {kind}: {:?}", e);
                None
            }
        }
    }

    pub fn remove(self) {
        _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// Keep the canvas backing store in step with its CSS box. The new size is
/// picked up by the next frame, never mid-step.
pub fn wire_canvas_resize(canvas: &web::HtmlCanvasElement) -> Option<Listener> {
    dom::sync_canvas_backing_size(canvas);
    let window = web::window()?;
    let canvas = canvas.clone();
    Listener::attach(window.as_ref(), "resize", move |_| {
        dom::sync_canvas_backing_size(&canvas);
    })
}

/// Pointer drags splat into the simulation while a button is held.
pub fn wire_pointer(
    canvas: &web::HtmlCanvasElement,
    driver: &SharedDriver,
    force: f32,
    color: Vec3,
) -> Vec<Listener> {
    let tracker = Rc::new(RefCell::new(None::<PointerTracker>));
    let target: &web::EventTarget = canvas.as_ref();
    let mut listeners = Vec::with_capacity(4);

    {
        let tracker = tracker.clone();
        let canvas = canvas.clone();
        listeners.extend(Listener::attach(target, "pointerdown", move |ev| {
            let Some(ev) = ev.dyn_ref::<web::PointerEvent>() else {
                return;
            };
            _ = canvas.set_pointer_capture(ev.pointer_id());
            let mut t = PointerTracker::default();
            if let Some(pos) = input::pointer_canvas_px(ev, &canvas) {
                // Seeds the tracker; the first sample never splats.
                _ = t.move_to(pos, input::canvas_size(&canvas), force, color);
            }
            *tracker.borrow_mut() = Some(t);
        }));
    }

    {
        let tracker = tracker.clone();
        let canvas = canvas.clone();
        let driver = driver.clone();
        listeners.extend(Listener::attach(target, "pointermove", move |ev| {
            let Some(ev) = ev.dyn_ref::<web::PointerEvent>() else {
                return;
            };
            let mut slot = tracker.borrow_mut();
            let Some(t) = slot.as_mut() else {
                return;
            };
            let Some(pos) = input::pointer_canvas_px(ev, &canvas) else {
                return;
            };
            if let Some(impulse) = t.move_to(pos, input::canvas_size(&canvas), force, color) {
                driver.borrow_mut().queue_impulse(impulse);
            }
        }));
    }

    for kind in ["pointerup", "pointerleave", "pointercancel"] {
        let tracker = tracker.clone();
        listeners.extend(Listener::attach(target, kind, move |_| {
            if let Some(mut t) = tracker.borrow_mut().take() {
                t.release();
            }
        }));
    }

    listeners
}
