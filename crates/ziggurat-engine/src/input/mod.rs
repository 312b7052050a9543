//! Keyboard and pointer input.
//!
//! The runtime translates winit events into the platform-agnostic types
//! here; nothing above this layer sees winit. [`InputState`] accumulates
//! held keys and the pointer, [`InputFrame`] exposes per-frame transitions.

mod frame;
mod state;
mod types;

pub(crate) mod platform;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{
    InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState, MouseWheelDelta,
    PointerButtonEvent, PointerMoveEvent,
};
