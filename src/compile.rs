//! `CompileContext` (spec.md §6.3): the scoping and frame-pacing parameters
//! `build_graph` needs before it can expand `PER_CAMERA`/`PER_LIGHT` passes
//! or size frame-in-flight resource variants.

/// Per-compile scoping input. The host rebuilds this (and calls
/// `build_graph` again) whenever the active camera/light count changes.
pub struct CompileContext {
    pub num_cameras: u32,
    pub num_lights: u32,
    /// Number of frame-in-flight resource variants to allocate for any
    /// resource accessed at a non-`Current` frame offset, or explicitly
    /// marked `double_buffer` (spec.md §4.8).
    pub frames_in_flight: u32,
    /// Opaque host identifiers, one per active camera/light, handed back to
    /// pass `execute` callbacks through `PassResources::camera_handle`/
    /// `light_handle` so a pass can look up the camera/light's own data
    /// without the graph knowing anything about camera/light representation.
    pub camera_handles: Vec<u32>,
    pub light_handles: Vec<u32>,
}

impl CompileContext {
    pub fn global() -> Self {
        CompileContext {
            num_cameras: 0,
            num_lights: 0,
            frames_in_flight: 2,
            camera_handles: Vec::new(),
            light_handles: Vec::new(),
        }
    }
}
