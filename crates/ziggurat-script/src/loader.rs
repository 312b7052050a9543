//! Ordered script loading.
//!
//! Loads queue behind the runtime's channel, so files land on the worker
//! exactly in the order they were requested here.

use std::path::Path;

use anyhow::Context;

use crate::runtime::ScriptRuntime;

pub struct ScriptLoader<'a> {
    runtime: &'a ScriptRuntime,
}

impl<'a> ScriptLoader<'a> {
    pub fn new(runtime: &'a ScriptRuntime) -> Self {
        Self { runtime }
    }

    /// Queues an inline snippet under a display name used in error logs.
    pub fn eval(&self, name: &str, source: &str) {
        let name = name.to_owned();
        let source = source.to_owned();
        self.runtime.dispatch(move |host| host.load(&name, &source));
    }

    /// Reads a script file and queues it.
    ///
    /// The read happens here so a missing file surfaces immediately to the
    /// caller instead of as a deferred log line.
    pub fn load_script(&self, path: &Path) -> anyhow::Result<()> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        let name = path.display().to_string();
        log::info!("loading script {name}");
        self.runtime.dispatch(move |host| host.load(&name, &source));
        Ok(())
    }
}
