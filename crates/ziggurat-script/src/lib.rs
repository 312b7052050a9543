//! Script runtime for the playground.
//!
//! A rhai engine lives on a dedicated worker thread; the host queues work
//! items, ordered script loads, and coalesced per-frame ticks, and reads
//! back scene commands and pointer queries through shared state.

pub mod input;
pub mod loader;
pub mod runtime;
pub mod scene;

pub use input::{BUTTON_LEFT, BUTTON_MIDDLE, BUTTON_RIGHT, InputBridge, PointerState};
pub use loader::ScriptLoader;
pub use runtime::{ScriptHost, ScriptJob, ScriptRuntime};
pub use scene::{SceneApi, SceneCommand};
