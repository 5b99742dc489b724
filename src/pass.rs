//! Pass declarations and their per-scope instances (spec.md §3, §9).
//!
//! The original system expresses a pass as a setup function pointer, an
//! execute function pointer and an opaque user pointer threaded between the
//! two. Design Notes (spec.md §9) call for re-expressing that as a
//! capability object instead of a raw pointer pair: `Pass` is that object —
//! an interface with a `setup` and an `execute` method, with whatever state
//! the original's `rawptr` captured now living as ordinary struct fields or
//! closure captures.

use std::rc::Rc;

use crate::executor::PassResources;
use crate::pass_setup::PassSetup;
use crate::types::{AccessMode, FrameOffset, PassScope, QueueType};
use crate::gfx::CommandEncoder;

/// A render pass template. One `Pass` expands into one `PassInstance` per
/// active scope target (spec.md §4.3): exactly one for `Global`, one per
/// camera for `PerCamera`, one per light for `PerLight`.
pub trait Pass {
    fn name(&self) -> &str;
    fn scope(&self) -> PassScope;
    fn queue(&self) -> QueueType;

    /// Declares and accesses resources for one instance. Called once per
    /// expanded instance, with `setup` already scoped to that instance
    /// (spec.md §4.2/§4.3).
    fn setup(&self, setup: &mut PassSetup);

    /// Records commands for one instance at one frame. Errors are logged and
    /// do not abort the frame (spec.md §7).
    fn execute(
        &self,
        resources: &PassResources,
        cmd: &mut dyn CommandEncoder,
        frame_index: u64,
    ) -> anyhow::Result<()>;
}

/// A `Pass` built from two closures, for the common case where a pass has no
/// state beyond what its setup/execute closures capture — the teacher's
/// `PassBuilder::render`/`RenderGraphContext::render` both take a bare
/// closure rather than requiring a struct impl.
struct ClosurePass<S, E> {
    name: String,
    scope: PassScope,
    queue: QueueType,
    setup_fn: S,
    execute_fn: E,
}

impl<S, E> Pass for ClosurePass<S, E>
where
    S: Fn(&mut PassSetup) + 'static,
    E: Fn(&PassResources, &mut dyn CommandEncoder, u64) -> anyhow::Result<()> + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }
    fn scope(&self) -> PassScope {
        self.scope
    }
    fn queue(&self) -> QueueType {
        self.queue
    }
    fn setup(&self, setup: &mut PassSetup) {
        (self.setup_fn)(setup)
    }
    fn execute(
        &self,
        resources: &PassResources,
        cmd: &mut dyn CommandEncoder,
        frame_index: u64,
    ) -> anyhow::Result<()> {
        (self.execute_fn)(resources, cmd, frame_index)
    }
}

/// A template handed to `build_graph`. Cheaply cloneable: every expanded
/// instance of a `PER_CAMERA`/`PER_LIGHT` pass shares the same underlying
/// `Pass` object.
#[derive(Clone)]
pub struct PassDecl(pub(crate) Rc<dyn Pass>);

impl PassDecl {
    pub fn new(
        name: impl Into<String>,
        scope: PassScope,
        queue: QueueType,
        setup_fn: impl Fn(&mut PassSetup) + 'static,
        execute_fn: impl Fn(&PassResources, &mut dyn CommandEncoder, u64) -> anyhow::Result<()> + 'static,
    ) -> Self {
        PassDecl(Rc::new(ClosurePass {
            name: name.into(),
            scope,
            queue,
            setup_fn,
            execute_fn,
        }))
    }

    /// For passes that need more state than two closures conveniently carry.
    pub fn from_pass(pass: impl Pass + 'static) -> Self {
        PassDecl(Rc::new(pass))
    }
}

/// One scoped, resolved read or write declared during setup (spec.md §3).
#[derive(Clone, Debug)]
pub(crate) struct ResourceAccess {
    pub name: String,
    pub offset: FrameOffset,
    pub mode: AccessMode,
}

/// One expansion of a `PassDecl` at a concrete scope index (spec.md §3).
pub(crate) struct PassInstance {
    pub name: String,
    pub scope: PassScope,
    pub instance_idx: u32,
    pub queue: QueueType,
    pub pass: Rc<dyn Pass>,
    pub reads: Vec<ResourceAccess>,
    pub writes: Vec<ResourceAccess>,
}

impl PassInstance {
    pub fn base_name(&self) -> &str {
        self.pass.name()
    }
}
