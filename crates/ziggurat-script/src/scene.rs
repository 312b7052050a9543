//! Commands scripts send back to the host scene.
//!
//! Scripts call the registered setters whenever they like; the host drains
//! the accumulated queue once per frame and applies it. Commands keep their
//! emission order, so a script that sets the same thing twice gets the
//! later value.

use std::sync::{Arc, Mutex, PoisonError};

use crate::runtime::ScriptRuntime;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    SetClearColor { r: f32, g: f32, b: f32 },
    SetStatusLine(String),
    SetSpinRate(f32),
}

#[derive(Clone, Default)]
pub struct SceneApi {
    queue: Arc<Mutex<Vec<SceneCommand>>>,
}

impl SceneApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the scene setters on the worker's engine.
    pub fn install(&self, runtime: &ScriptRuntime) {
        let queue = Arc::clone(&self.queue);
        runtime.dispatch(move |host| {
            let engine = host.engine_mut();
            let q = Arc::clone(&queue);
            engine.register_fn("set_clear_color", move |r: f64, g: f64, b: f64| {
                push(&q, SceneCommand::SetClearColor {
                    r: r as f32,
                    g: g as f32,
                    b: b as f32,
                });
            });
            let q = Arc::clone(&queue);
            engine.register_fn("set_status", move |text: &str| {
                push(&q, SceneCommand::SetStatusLine(text.to_owned()));
            });
            let q = Arc::clone(&queue);
            engine.register_fn("set_spin_rate", move |rate: f64| {
                push(&q, SceneCommand::SetSpinRate(rate as f32));
            });
        });
    }

    /// Takes every command queued since the last drain.
    pub fn drain(&self) -> Vec<SceneCommand> {
        let mut queue = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *queue)
    }
}

fn push(queue: &Mutex<Vec<SceneCommand>>, command: SceneCommand) {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(command);
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
    fn commands_drain_in_emission_order() {
        let runtime = ScriptRuntime::new();
        let scene = SceneApi::new();
        scene.install(&runtime);
        runtime.dispatch(|host| {
            host.load(
                "scene",
                "set_clear_color(0.1, 0.2, 0.3);\n\
                 set_status(\"hello\");\n\
                 set_spin_rate(2.5);",
            )
        });
        sync(&runtime);
        assert_eq!(
            scene.drain(),
            vec![
                SceneCommand::SetClearColor { r: 0.1, g: 0.2, b: 0.3 },
                SceneCommand::SetStatusLine("hello".to_owned()),
                SceneCommand::SetSpinRate(2.5),
            ]
        );
    }

    #[test]
    fn drain_empties_the_queue() {
        let runtime = ScriptRuntime::new();
        let scene = SceneApi::new();
        scene.install(&runtime);
        runtime.dispatch(|host| host.load("scene", "set_spin_rate(1.0);"));
        sync(&runtime);
        assert_eq!(scene.drain().len(), 1);
        assert!(scene.drain().is_empty());
    }

    #[test]
    fn later_emissions_come_later() {
        let runtime = ScriptRuntime::new();
        let scene = SceneApi::new();
        scene.install(&runtime);
        runtime.dispatch(|host| {
            host.load("scene", "set_spin_rate(1.0); set_spin_rate(4.0);")
        });
        sync(&runtime);
        let drained = scene.drain();
        assert_eq!(drained.last(), Some(&SceneCommand::SetSpinRate(4.0)));
    }
}
