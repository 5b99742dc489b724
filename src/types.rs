//! Type layer (C1): handles, enums and the final error taxonomy shared by
//! every other component.

use std::fmt;

/// Expansion axis for a [`crate::pass::PassDecl`].
///
/// `GLOBAL` yields exactly one [`crate::pass::PassInstance`]; `PER_CAMERA`/`PER_LIGHT`
/// yield one per active camera/light, per [`crate::compile::CompileContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassScope {
    Global,
    PerCamera,
    PerLight,
}

impl PassScope {
    /// Scoped-name suffix rule from spec.md §4.2: `name` for `Global`,
    /// `name_cam_{idx}` / `name_light_{idx}` otherwise.
    pub(crate) fn scoped_name(self, base: &str, instance_idx: u32) -> String {
        match self {
            PassScope::Global => base.to_string(),
            PassScope::PerCamera => format!("{}_cam_{}", base, instance_idx),
            PassScope::PerLight => format!("{}_light_{}", base, instance_idx),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueType {
    Graphics,
    Compute,
}

/// Signed frame-variant selector. `Current` is the common case; `Prev`/`Next`
/// read or write a temporally adjacent frame-in-flight variant and never
/// contribute an execution edge (spec.md §4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameOffset {
    Prev,
    Current,
    Next,
}

impl FrameOffset {
    pub fn as_i64(self) -> i64 {
        match self {
            FrameOffset::Prev => -1,
            FrameOffset::Current => 0,
            FrameOffset::Next => 1,
        }
    }

    pub fn is_temporal(self) -> bool {
        !matches!(self, FrameOffset::Current)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture2D,
    TextureCube,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Texture2D => "texture2d",
            ResourceKind::TextureCube => "texture_cube",
        };
        f.write_str(s)
    }
}

/// `variant_index(frame, offset, F) == ((frame + offset) mod F + F) mod F`,
/// always in `[0, F)` (spec.md §8, testable property 6).
pub fn variant_index(frame_index: u64, offset: FrameOffset, frames_in_flight: u32) -> u32 {
    debug_assert!(frames_in_flight > 0);
    let f = frames_in_flight as i64;
    let raw = frame_index as i64 + offset.as_i64();
    (((raw % f) + f) % f) as u32
}

/// Final error taxonomy (spec.md §7). `build_graph` is the only fallible
/// entry point; the executor never fails.
#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("dependency cycle detected; pass `{pass}` could not be scheduled")]
    CycleDetected { pass: String },

    #[error("dangling read of resource `{resource}` by pass `{pass}`: {detail}")]
    DanglingRead {
        pass: String,
        resource: String,
        detail: String,
    },

    #[error("resource `{name}` used as {expected} but was declared as {actual}")]
    TypeMismatch {
        name: String,
        expected: ResourceKind,
        actual: ResourceKind,
    },

    #[error("invalid frame offset on resource `{resource}`: {detail}")]
    FrameOffsetInvalid { resource: String, detail: String },

    #[error("allocation failed for resource `{resource}`: {source}")]
    AllocationFailed {
        resource: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_names() {
        assert_eq!(PassScope::Global.scoped_name("gbuf", 0), "gbuf");
        assert_eq!(PassScope::PerCamera.scoped_name("gbuf", 2), "gbuf_cam_2");
        assert_eq!(PassScope::PerLight.scoped_name("shadow", 1), "shadow_light_1");
    }

    #[test]
    fn variant_index_wraps_positive() {
        assert_eq!(variant_index(5, FrameOffset::Current, 3), 2);
        assert_eq!(variant_index(5, FrameOffset::Next, 3), 0);
    }

    #[test]
    fn variant_index_wraps_negative() {
        // frame 0, PREV, F=3 -> -1 mod 3 -> 2
        assert_eq!(variant_index(0, FrameOffset::Prev, 3), 2);
    }

    #[test]
    fn variant_index_always_in_range() {
        for frame in 0..16u64 {
            for offset in [FrameOffset::Prev, FrameOffset::Current, FrameOffset::Next] {
                for f in 1..5u32 {
                    let idx = variant_index(frame, offset, f);
                    assert!(idx < f);
                }
            }
        }
    }
}
