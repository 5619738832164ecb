// Callback Chain - before/around/after hooks wrapping one execution phase

use crate::domain::JobError;
use std::fmt;
use tracing::debug;

/// Decision returned by a before hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// Result of running a chain around a body
#[derive(Debug)]
pub enum ChainOutcome {
    /// The body ran and returned successfully
    Completed,
    /// A hook stopped the chain before the body could complete
    Halted,
    /// The body or a hook failed
    Failed(JobError),
}

/// Continuation handed to an around hook; runs the rest of the chain
pub type Next<'a, C> = &'a mut dyn FnMut(&mut C) -> Result<(), JobError>;

type BeforeHook<C> = Box<dyn Fn(&mut C) -> Result<Flow, JobError> + Send + Sync>;
type AroundHook<C> = Box<dyn Fn(&mut C, Next<'_, C>) -> Result<(), JobError> + Send + Sync>;
type AfterHook<C> = Box<dyn Fn(&mut C) -> Result<(), JobError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Before,
    Around,
    After,
}

enum Hook<C> {
    Before(BeforeHook<C>),
    Around(AroundHook<C>),
    After(AfterHook<C>),
}

impl<C> Hook<C> {
    fn phase(&self) -> HookPhase {
        match self {
            Hook::Before(_) => HookPhase::Before,
            Hook::Around(_) => HookPhase::Around,
            Hook::After(_) => HookPhase::After,
        }
    }
}

/// Ordered hooks for one named phase (e.g. "perform", "execute").
///
/// Before hooks run in registration order, around hooks nest with the first
/// registered outermost, after hooks run in reverse registration order.
pub struct CallbackChain<C> {
    name: &'static str,
    hooks: Vec<Hook<C>>,
}

impl<C> CallbackChain<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            hooks: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn before<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut C) -> Result<Flow, JobError> + Send + Sync + 'static,
    {
        self.hooks.push(Hook::Before(Box::new(hook)));
        self
    }

    /// Register an around hook. The hook must call `next` to let the chain
    /// proceed; returning without calling it halts the chain.
    pub fn around<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut C, Next<'_, C>) -> Result<(), JobError> + Send + Sync + 'static,
    {
        self.hooks.push(Hook::Around(Box::new(hook)));
        self
    }

    pub fn after<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut C) -> Result<(), JobError> + Send + Sync + 'static,
    {
        self.hooks.push(Hook::After(Box::new(hook)));
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn count(&self, phase: HookPhase) -> usize {
        self.hooks.iter().filter(|h| h.phase() == phase).count()
    }

    /// Run the chain around `body`.
    ///
    /// A failing body skips the after hooks, but around hooks already
    /// entered still see the failure returned from `next` and unwind. A
    /// body failure swallowed by an around hook reports `Halted`.
    ///
    /// The body runs at most once: a second call to `next` fails with
    /// `JobError::Callback` instead of re-entering it.
    pub fn run<F>(&self, ctx: &mut C, mut body: F) -> ChainOutcome
    where
        F: FnMut(&mut C) -> Result<(), JobError>,
    {
        for hook in &self.hooks {
            if let Hook::Before(before) = hook {
                match before(ctx) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Halt) => {
                        debug!(chain = self.name, "Before hook halted the chain");
                        return ChainOutcome::Halted;
                    }
                    Err(e) => return ChainOutcome::Failed(e),
                }
            }
        }

        let arounds: Vec<&AroundHook<C>> = self
            .hooks
            .iter()
            .filter_map(|h| match h {
                Hook::Around(around) => Some(around),
                _ => None,
            })
            .collect();

        let mut body_entered = false;
        let mut body_completed = false;
        let mut guarded_body = |ctx: &mut C| -> Result<(), JobError> {
            if body_entered {
                return Err(JobError::Callback(format!(
                    "around hook in '{}' called next more than once",
                    self.name
                )));
            }
            body_entered = true;
            body(ctx)?;
            body_completed = true;
            Ok(())
        };

        if let Err(e) = run_arounds(&arounds, ctx, &mut guarded_body) {
            return ChainOutcome::Failed(e);
        }
        if !body_completed {
            debug!(chain = self.name, "Around hook halted the chain");
            return ChainOutcome::Halted;
        }

        for hook in self.hooks.iter().rev() {
            if let Hook::After(after) = hook {
                if let Err(e) = after(ctx) {
                    return ChainOutcome::Failed(e);
                }
            }
        }
        ChainOutcome::Completed
    }
}

fn run_arounds<C>(
    arounds: &[&AroundHook<C>],
    ctx: &mut C,
    body: Next<'_, C>,
) -> Result<(), JobError> {
    match arounds.split_first() {
        None => body(ctx),
        Some((outer, inner)) => outer(ctx, &mut |ctx: &mut C| run_arounds(inner, ctx, &mut *body)),
    }
}

impl<C> Default for CallbackChain<C> {
    fn default() -> Self {
        Self::new("perform")
    }
}

impl<C> fmt::Debug for CallbackChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackChain")
            .field("name", &self.name)
            .field("before", &self.count(HookPhase::Before))
            .field("around", &self.count(HookPhase::Around))
            .field("after", &self.count(HookPhase::After))
            .finish()
    }
}
