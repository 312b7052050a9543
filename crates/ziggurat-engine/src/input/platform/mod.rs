//! Window-system event translation. Currently winit only.

mod winit;

pub(crate) use self::winit::translate_window_event;
