use super::types::{InputEvent, Key, MouseButton};

/// Input deltas for the frame being built.
///
/// [`InputState`](super::InputState) answers "is it down now"; this type
/// answers "did it change this frame" and preserves the raw event order for
/// consumers that replay events elsewhere. The runtime clears it after each
/// frame callback.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Translated events in arrival order.
    pub events: Vec<InputEvent>,

    keys_pressed: Vec<Key>,
    keys_released: Vec<Key>,
    buttons_pressed: Vec<MouseButton>,
    buttons_released: Vec<MouseButton>,
}

impl InputFrame {
    /// True if `key` went down this frame. Key repeats do not count.
    pub fn pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn released(&self, key: Key) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
    }

    pub(crate) fn record_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    pub(crate) fn record_key(&mut self, key: Key, down: bool) {
        if down {
            self.keys_pressed.push(key);
        } else {
            self.keys_released.push(key);
        }
    }

    pub(crate) fn record_button(&mut self, button: MouseButton, down: bool) {
        if down {
            self.buttons_pressed.push(button);
        } else {
            self.buttons_released.push(button);
        }
    }
}
