//! Hook registry for storing and dispatching hooks.
//!
//! The registry stores hooks per event and executes them in registration
//! order. Execution is sequential: each hook completes before the next
//! starts, so `PreGenerate` hooks observe the effect of their predecessors.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::RwLock;

use async_trait::async_trait;
use tandem_error::Result;
use tracing::debug;
use tracing::warn;

use crate::context::HookContext;
use crate::event::HookEvent;
use crate::output::HookOutput;

/// A user-supplied lifecycle callback.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Name for logging and identification.
    fn name(&self) -> &str {
        "hook"
    }

    /// Execute the hook.
    async fn run(&self, ctx: &HookContext) -> Result<HookOutput>;
}

type HookFn = dyn Fn(HookContext) -> Pin<Box<dyn Future<Output = Result<HookOutput>> + Send>>
    + Send
    + Sync;

/// A hook built from a closure.
pub struct FnHook {
    name: String,
    f: Box<HookFn>,
}

impl FnHook {
    /// Create a hook from an async closure.
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HookOutput>> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(move |ctx| Box::pin(f(ctx))),
        }
    }
}

#[async_trait]
impl Hook for FnHook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &HookContext) -> Result<HookOutput> {
        (self.f)(ctx.clone()).await
    }
}

/// Central registry that stores hooks and dispatches events.
///
/// Uses interior mutability so hooks can be registered and executed through
/// shared references (`Arc<HookRegistry>`).
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<HookEvent, Vec<Arc<dyn Hook>>>>,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for an event.
    pub fn register(&self, event: HookEvent, hook: Arc<dyn Hook>) {
        debug!(event = %event, name = hook.name(), "Registered hook");
        if let Ok(mut hooks) = self.hooks.write() {
            hooks.entry(event).or_default().push(hook);
        }
    }

    /// The hooks registered for an event, in registration order.
    pub fn hooks_for(&self, event: HookEvent) -> Vec<Arc<dyn Hook>> {
        self.hooks
            .read()
            .map(|hooks| hooks.get(&event).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Whether any hook is registered for an event.
    pub fn has_hooks(&self, event: HookEvent) -> bool {
        !self.hooks_for(event).is_empty()
    }

    /// Execute all hooks for the context's event, sequentially.
    ///
    /// Hook errors propagate to the caller; call sites that must not be
    /// destabilised by observers use [`run_logged`](Self::run_logged).
    pub async fn run(&self, ctx: &HookContext) -> Result<Vec<HookOutput>> {
        let mut outputs = Vec::new();
        for hook in self.hooks_for(ctx.event) {
            let output = hook.run(ctx).await?;
            outputs.push(output);
        }
        Ok(outputs)
    }

    /// Execute all hooks, logging and swallowing individual failures.
    ///
    /// Used for `Post*` and compaction hooks: observability must never derail
    /// the turn.
    pub async fn run_logged(&self, ctx: &HookContext) -> Vec<HookOutput> {
        let mut outputs = Vec::new();
        for hook in self.hooks_for(ctx.event) {
            match hook.run(ctx).await {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    warn!(
                        event = %ctx.event,
                        name = hook.name(),
                        error = %e,
                        "Hook failed; continuing"
                    );
                }
            }
        }
        outputs
    }
}

#[cfg(test)]
#[path = "registry.test.rs"]
mod tests;
