//! Script worker thread and the host state it owns.
//!
//! The rhai engine is not `Sync`, so it never leaves the worker thread it
//! was created on. Everything else talks to it by sending closures over a
//! channel; the worker applies them to its [`ScriptHost`] in arrival order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

/// Work item applied to the host on the worker thread.
pub type ScriptJob = Box<dyn FnOnce(&mut ScriptHost) + Send + 'static>;

enum Msg {
    Job(ScriptJob),
    Shutdown,
}

// ── host state (worker thread only) ─────────────────────────────────────────

/// Engine, scope, and the merged library of everything loaded so far.
pub struct ScriptHost {
    engine: rhai::Engine,
    scope: rhai::Scope<'static>,
    ast: rhai::AST,
}

impl ScriptHost {
    fn new() -> Self {
        let mut engine = rhai::Engine::new();
        engine.on_print(|text| log::info!("script: {text}"));
        engine.on_debug(|text, _src, pos| log::debug!("script: {text} @ {pos}"));
        Self {
            engine,
            scope: rhai::Scope::new(),
            ast: rhai::AST::empty(),
        }
    }

    /// Compiles and runs a script, then keeps its definitions.
    ///
    /// The file's top-level statements execute immediately against the
    /// persistent scope. Functions from earlier loads stay visible while
    /// they run, so a later file can call anything loaded before it.
    pub fn load(&mut self, name: &str, source: &str) {
        let compiled = match self.engine.compile(source) {
            Ok(ast) => ast,
            Err(err) => {
                log::error!("script '{name}' has syntax errors: {err}");
                return;
            }
        };
        let mut merged = self.ast.clone_functions_only();
        merged += compiled;
        if let Err(err) = self.engine.run_ast_with_scope(&mut self.scope, &merged) {
            log::error!("script '{name}' failed: {err}");
        }
        // Keep whatever did get defined; a partial load can still be useful.
        self.ast = merged;
    }

    /// Calls the script `update(dt)` function if one has been defined.
    pub fn call_update(&mut self, dt: f32) {
        let result =
            self.engine
                .call_fn::<()>(&mut self.scope, &self.ast, "update", (dt as f64,));
        if let Err(err) = result {
            let absent = matches!(
                &*err,
                rhai::EvalAltResult::ErrorFunctionNotFound(sig, _) if sig.starts_with("update")
            );
            if !absent {
                log::error!("script update failed: {err}");
            }
        }
    }

    /// Drops all loaded scripts and scope variables.
    ///
    /// Host functions registered on the engine survive, so plugins do not
    /// need to reinstall after a reload.
    pub fn reset(&mut self) {
        self.scope = rhai::Scope::new();
        self.ast = rhai::AST::empty();
    }

    /// Engine access for plugins that register host functions.
    pub fn engine_mut(&mut self) -> &mut rhai::Engine {
        &mut self.engine
    }
}

// ── runtime handle (host side) ───────────────────────────────────────────────

/// Owns the worker thread and dispatches work to it in FIFO order.
///
/// Dropping the runtime signals the worker and joins it, so queued work
/// finishes before shutdown completes.
pub struct ScriptRuntime {
    sender: mpsc::Sender<Msg>,
    worker: Option<JoinHandle<()>>,
    tick_pending: Arc<AtomicBool>,
}

impl ScriptRuntime {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<Msg>();
        let worker = thread::spawn(move || {
            let mut host = ScriptHost::new();
            log::debug!("script worker started");
            while let Ok(msg) = receiver.recv() {
                match msg {
                    Msg::Job(job) => job(&mut host),
                    Msg::Shutdown => break,
                }
            }
            log::debug!("script worker stopped");
        });
        Self {
            sender,
            worker: Some(worker),
            tick_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queues a closure to run against the host. Returns false if the
    /// worker is gone.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce(&mut ScriptHost) + Send + 'static,
    {
        let sent = self.sender.send(Msg::Job(Box::new(job))).is_ok();
        if !sent {
            log::warn!("script worker unavailable, job dropped");
        }
        sent
    }

    /// Queues one `update(dt)` call, unless the previous one is still
    /// waiting to run. Returns whether a tick was actually dispatched.
    ///
    /// A slow script therefore drops frames instead of building an
    /// ever-growing backlog of stale ticks.
    pub fn tick(&self, dt: f32) -> bool {
        if self.tick_pending.swap(true, Ordering::AcqRel) {
            log::trace!("script tick coalesced");
            return false;
        }
        let pending = Arc::clone(&self.tick_pending);
        let dispatched = self.dispatch(move |host| {
            host.call_update(dt);
            pending.store(false, Ordering::Release);
        });
        if !dispatched {
            self.tick_pending.store(false, Ordering::Release);
        }
        dispatched
    }
}

impl Default for ScriptRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScriptRuntime {
    fn drop(&mut self) {
        let _ = self.sender.send(Msg::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("script worker panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Round-trips a marker job so every previously queued job has run.
    fn sync(runtime: &ScriptRuntime) {
        let (tx, rx) = mpsc::channel();
        runtime.dispatch(move |_| {
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(5))
            .expect("script worker should stay responsive");
    }

    #[test]
    fn jobs_run_in_dispatch_order() {
        let runtime = ScriptRuntime::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for n in 0..4 {
            let seen = Arc::clone(&seen);
            runtime.dispatch(move |_| seen.lock().unwrap().push(n));
        }
        sync(&runtime);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn tick_calls_script_update() {
        let runtime = ScriptRuntime::new();
        let count = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&count);
        runtime.dispatch(move |host| {
            host.engine_mut().register_fn("bump", move || {
                probe.fetch_add(1, Ordering::SeqCst);
            });
        });
        runtime.dispatch(|host| host.load("test", "fn update(dt) { bump(); }"));
        assert!(runtime.tick(0.016));
        sync(&runtime);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tick_without_update_function_is_harmless() {
        let runtime = ScriptRuntime::new();
        runtime.dispatch(|host| host.load("test", "let x = 1;"));
        assert!(runtime.tick(0.016));
        sync(&runtime);
        assert!(runtime.tick(0.016));
        sync(&runtime);
    }

    #[test]
    fn pending_tick_coalesces_the_next_one() {
        let runtime = ScriptRuntime::new();
        let (hold_tx, hold_rx) = mpsc::channel::<()>();
        runtime.dispatch(move |_| {
            let _ = hold_rx.recv_timeout(Duration::from_secs(5));
        });
        assert!(runtime.tick(0.016));
        assert!(!runtime.tick(0.016));
        hold_tx.send(()).expect("worker should be waiting");
        sync(&runtime);
        assert!(runtime.tick(0.016));
    }

    #[test]
    fn later_loads_see_earlier_definitions() {
        let runtime = ScriptRuntime::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let probe = Arc::clone(&seen);
        runtime.dispatch(move |host| {
            host.engine_mut().register_fn("record", move |value: i64| {
                probe.lock().unwrap().push(value);
            });
        });
        runtime.dispatch(|host| host.load("a", "fn double(x) { x * 2 }"));
        runtime.dispatch(|host| host.load("b", "record(double(21));"));
        sync(&runtime);
        assert_eq!(*seen.lock().unwrap(), vec![42]);
    }

    #[test]
    fn scope_persists_across_loads() {
        let runtime = ScriptRuntime::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let probe = Arc::clone(&seen);
        runtime.dispatch(move |host| {
            host.engine_mut().register_fn("record", move |value: i64| {
                probe.lock().unwrap().push(value);
            });
        });
        runtime.dispatch(|host| host.load("a", "let counter = 10;"));
        runtime.dispatch(|host| host.load("b", "counter += 5; record(counter);"));
        sync(&runtime);
        assert_eq!(*seen.lock().unwrap(), vec![15]);
    }

    #[test]
    fn syntax_error_does_not_poison_the_host() {
        let runtime = ScriptRuntime::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let probe = Arc::clone(&seen);
        runtime.dispatch(move |host| {
            host.engine_mut().register_fn("record", move |value: i64| {
                probe.lock().unwrap().push(value);
            });
        });
        runtime.dispatch(|host| host.load("broken", "fn update( {"));
        runtime.dispatch(|host| host.load("ok", "record(7);"));
        sync(&runtime);
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn reset_clears_scripts_but_keeps_host_functions() {
        let runtime = ScriptRuntime::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let probe = Arc::clone(&seen);
        runtime.dispatch(move |host| {
            host.engine_mut().register_fn("record", move |value: i64| {
                probe.lock().unwrap().push(value);
            });
        });
        runtime.dispatch(|host| host.load("a", "fn update(dt) { record(1); }"));
        runtime.dispatch(|host| host.reset());
        assert!(runtime.tick(0.016));
        sync(&runtime);
        // update() is gone after the reset, but record() still works.
        runtime.dispatch(|host| host.load("b", "record(2);"));
        sync(&runtime);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn runtime_error_is_logged_not_fatal() {
        let runtime = ScriptRuntime::new();
        runtime.dispatch(|host| host.load("boom", "let y = undefined_fn();"));
        sync(&runtime);
        runtime.dispatch(|host| host.load("after", "let z = 1;"));
        sync(&runtime);
    }
}
