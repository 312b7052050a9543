//! Pointer state shared between the host and scripts.
//!
//! The host writes from its event loop; scripts read through registered
//! query functions. Both sides go through one mutex-guarded snapshot, so a
//! script always sees a coherent pointer state even mid-frame.

use std::sync::{Arc, Mutex, PoisonError};

use crate::runtime::ScriptRuntime;

pub const BUTTON_LEFT: usize = 0;
pub const BUTTON_MIDDLE: usize = 1;
pub const BUTTON_RIGHT: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub buttons: [bool; 3],
    /// Accumulated scroll distance since startup.
    pub wheel: f32,
}

#[derive(Clone, Default)]
pub struct InputBridge {
    state: Arc<Mutex<PointerState>>,
}

impl InputBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the script-facing query functions on the worker's engine.
    pub fn install(&self, runtime: &ScriptRuntime) {
        let state = Arc::clone(&self.state);
        runtime.dispatch(move |host| {
            let engine = host.engine_mut();
            let s = Arc::clone(&state);
            engine.register_fn("pointer_x", move || lock(&s).x as f64);
            let s = Arc::clone(&state);
            engine.register_fn("pointer_y", move || lock(&s).y as f64);
            let s = Arc::clone(&state);
            engine.register_fn("button_down", move |id: i64| {
                let state = lock(&s);
                usize::try_from(id)
                    .ok()
                    .and_then(|id| state.buttons.get(id).copied())
                    .unwrap_or(false)
            });
            let s = Arc::clone(&state);
            engine.register_fn("wheel_total", move || lock(&s).wheel as f64);
        });
    }

    pub fn mouse_move(&self, x: f32, y: f32) {
        let mut state = lock(&self.state);
        state.x = x;
        state.y = y;
    }

    pub fn mouse_down(&self, button: usize) {
        if let Some(slot) = lock(&self.state).buttons.get_mut(button) {
            *slot = true;
        }
    }

    pub fn mouse_up(&self, button: usize) {
        if let Some(slot) = lock(&self.state).buttons.get_mut(button) {
            *slot = false;
        }
    }

    pub fn mouse_wheel(&self, delta: f32) {
        lock(&self.state).wheel += delta;
    }

    pub fn snapshot(&self) -> PointerState {
        *lock(&self.state)
    }
}

fn lock(state: &Mutex<PointerState>) -> std::sync::MutexGuard<'_, PointerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn sync(runtime: &ScriptRuntime) {
        let (tx, rx) = mpsc::channel();
        runtime.dispatch(move |_| {
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(5))
            .expect("script worker should stay responsive");
    }

    #[test]
    fn host_writes_are_visible_to_scripts() {
        let runtime = ScriptRuntime::new();
        let bridge = InputBridge::new();
        bridge.install(&runtime);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let probe = Arc::clone(&seen);
        runtime.dispatch(move |host| {
            host.engine_mut().register_fn("record", move |value: f64| {
                probe.lock().unwrap().push(value);
            });
        });

        bridge.mouse_move(320.0, 240.0);
        bridge.mouse_down(BUTTON_LEFT);
        bridge.mouse_wheel(-100.0);
        bridge.mouse_wheel(-100.0);

        runtime.dispatch(|host| {
            host.load(
                "probe",
                "record(pointer_x());\n\
                 record(pointer_y());\n\
                 record(if button_down(0) { 1.0 } else { 0.0 });\n\
                 record(if button_down(1) { 1.0 } else { 0.0 });\n\
                 record(wheel_total());",
            )
        });
        sync(&runtime);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![320.0, 240.0, 1.0, 0.0, -200.0]
        );
    }

    #[test]
    fn button_ids_map_left_middle_right() {
        let bridge = InputBridge::new();
        bridge.mouse_down(BUTTON_LEFT);
        bridge.mouse_down(BUTTON_MIDDLE);
        bridge.mouse_down(BUTTON_RIGHT);
        assert_eq!(bridge.snapshot().buttons, [true, true, true]);
        bridge.mouse_up(BUTTON_MIDDLE);
        assert_eq!(bridge.snapshot().buttons, [true, false, true]);
    }

    #[test]
    fn out_of_range_button_is_ignored() {
        let bridge = InputBridge::new();
        bridge.mouse_down(9);
        assert_eq!(bridge.snapshot(), PointerState::default());
    }

    #[test]
    fn unknown_button_reads_false_in_scripts() {
        let runtime = ScriptRuntime::new();
        let bridge = InputBridge::new();
        bridge.install(&runtime);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let probe = Arc::clone(&seen);
        runtime.dispatch(move |host| {
            host.engine_mut().register_fn("record", move |value: bool| {
                probe.lock().unwrap().push(value);
            });
        });
        runtime.dispatch(|host| host.load("probe", "record(button_down(99)); record(button_down(-1));"));
        sync(&runtime);
        assert_eq!(*seen.lock().unwrap(), vec![false, false]);
    }
}
