//! Public façade (C11, spec.md §4.11). `Graph` owns everything `build`
//! produces — pass instances, the resource declaration list, the live mask,
//! the scheduled order, per-pass barrier lists and allocated resource
//! instances — and `run` replays it every frame. Directly generalizes the
//! teacher's `RenderGraph` (`rg/src/graph.rs`): where the teacher records
//! passes and resources once and consumes `self` in a single `execute` call,
//! `Graph` is rebuildable (`build` destroys prior state first, spec.md §3
//! "Lifecycle") and `run` borrows rather than consumes, since a frame graph
//! in this spec survives across many frames between rebuilds.

use std::collections::HashMap;

use crate::allocator::{allocate_resources, free_resource_instance};
use crate::barrier::{synthesize_barriers, Barrier};
use crate::compile::CompileContext;
use crate::dead_pass::eliminate_dead_passes;
use crate::dependency::build_edges;
use crate::executor;
use crate::gfx::{CommandEncoder, GpuDevice, PhysicalHandle, TextureManager};
use crate::instantiate::instantiate_passes;
use crate::pass::{PassDecl, PassInstance};
use crate::pass_setup::PassSetup;
use crate::resource_decl::ResourceDecl;
use crate::resource_instance::ResourceInstance;
use crate::topo_sort::topological_sort;
use crate::types::CompileError;
use crate::validate::validate;

pub struct Graph {
    instances: Vec<PassInstance>,
    decl_index: HashMap<String, usize>,
    resource_decls: Vec<ResourceDecl>,
    live: Vec<bool>,
    sorted: Vec<usize>,
    barriers: Vec<Vec<Barrier>>,
    resources: Vec<ResourceInstance>,
    camera_handles: Vec<u32>,
    light_handles: Vec<u32>,
    built: bool,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            instances: Vec::new(),
            decl_index: HashMap::new(),
            resource_decls: Vec::new(),
            live: Vec::new(),
            sorted: Vec::new(),
            barriers: Vec::new(),
            resources: Vec::new(),
            camera_handles: Vec::new(),
            light_handles: Vec::new(),
            built: false,
        }
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Runs C3 through C9 in sequence (spec.md §2 data flow). Rebuilding an
    /// already-built graph destroys its prior state first (spec.md §3); on
    /// any error the graph is left built-empty and safe to `destroy`.
    pub fn build(
        &mut self,
        decls: &[PassDecl],
        ctx: &CompileContext,
        device: &dyn GpuDevice,
        textures: &dyn TextureManager,
    ) -> Result<(), CompileError> {
        if self.built {
            self.destroy(device, textures);
        }

        let mut instances = instantiate_passes(decls, ctx);

        let mut resource_decls: Vec<ResourceDecl> = Vec::new();
        let mut decl_index: HashMap<String, usize> = HashMap::new();
        for (i, inst) in instances.iter_mut().enumerate() {
            let pass = inst.pass.clone();
            let mut setup = PassSetup::new(inst.scope, inst.instance_idx, i, &mut resource_decls, &mut decl_index);
            pass.setup(&mut setup);
            let (reads, writes) = setup.finish();
            inst.reads = reads;
            inst.writes = writes;
        }

        validate(&instances, &decl_index, &resource_decls)?;

        let edges = build_edges(&instances);
        let live = eliminate_dead_passes(&instances, &edges);
        let sorted = topological_sort(&instances, &live, &edges)?;

        let resources = allocate_resources(
            &resource_decls,
            &decl_index,
            &instances,
            &sorted,
            ctx.frames_in_flight,
            device,
            textures,
        )?;

        let barriers = synthesize_barriers(&instances, &sorted, &resource_decls, &decl_index);

        log::debug!(
            "build_graph: {} instances declared, {} live, {} resources allocated",
            instances.len(),
            sorted.len(),
            resources.len()
        );

        self.instances = instances;
        self.decl_index = decl_index;
        self.resource_decls = resource_decls;
        self.live = live;
        self.sorted = sorted;
        self.barriers = barriers;
        self.resources = resources;
        self.camera_handles = ctx.camera_handles.clone();
        self.light_handles = ctx.light_handles.clone();
        self.built = true;

        Ok(())
    }

    /// The executor (spec.md §4.10). A no-op on a never-built graph.
    pub fn run(&self, frame_index: u64, graphics_cmd: &mut dyn CommandEncoder, compute_cmd: &mut dyn CommandEncoder) {
        if !self.built {
            return;
        }
        executor::execute(
            &self.instances,
            &self.sorted,
            &self.barriers,
            &self.resources,
            &self.decl_index,
            &self.camera_handles,
            &self.light_handles,
            frame_index,
            graphics_cmd,
            compute_cmd,
        );
    }

    /// Silent no-op if `name` resolves to nothing (spec.md §4.11).
    pub fn update_external_texture(&mut self, name: &str, handle: PhysicalHandle) {
        self.update_external(name, handle)
    }

    /// Silent no-op if `name` resolves to nothing (spec.md §4.11).
    pub fn update_external_buffer(&mut self, name: &str, handle: PhysicalHandle) {
        self.update_external(name, handle)
    }

    fn update_external(&mut self, name: &str, handle: PhysicalHandle) {
        if let Some(&idx) = self.decl_index.get(name) {
            self.resources[idx].set_external(handle);
        }
    }

    /// Frees every owned GPU resource and clears compiled state. Safe to
    /// call on a graph that was never built, or one left empty by a failed
    /// `build` (spec.md §7 propagation policy).
    pub fn destroy(&mut self, device: &dyn GpuDevice, textures: &dyn TextureManager) {
        for resource in &self.resources {
            free_resource_instance(resource, device, textures);
        }
        self.instances.clear();
        self.decl_index.clear();
        self.resource_decls.clear();
        self.live.clear();
        self.sorted.clear();
        self.barriers.clear();
        self.resources.clear();
        self.camera_handles.clear();
        self.light_handles.clear();
        self.built = false;
    }
}

/// Free-function mirror of `Graph::build`, named after spec.md §4.11's
/// literal façade entry point.
pub fn build_graph(
    graph: &mut Graph,
    decls: &[PassDecl],
    ctx: &CompileContext,
    device: &dyn GpuDevice,
    textures: &dyn TextureManager,
) -> Result<(), CompileError> {
    graph.build(decls, ctx, device, textures)
}

/// Free-function mirror of `Graph::run`.
pub fn run_graph(graph: &Graph, frame_index: u64, graphics_cmd: &mut dyn CommandEncoder, compute_cmd: &mut dyn CommandEncoder) {
    graph.run(frame_index, graphics_cmd, compute_cmd)
}
