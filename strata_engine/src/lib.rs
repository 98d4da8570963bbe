/*!
# Strata Engine

Core types for the Strata frame-orchestration engine.

The engine turns scenes of objects into presented frames with several frames
in flight. Per-object transforms live in one dynamic uniform buffer per scene
and frame slot, addressed by aligned offsets. The GPU is reached only through
the traits in [`strata::render`]; backends (Vulkan) implement them in their
own crate.

## Architecture

- **Engine**: explicit facade owning the device, swapchain, scenes and pipelines
- **GraphicsDevice**: factory trait for GPU resources, command lists and sync objects
- **FrameScheduler**: frame slots, fences and the acquire/record/submit/present loop
- **DynamicBlockLayout / DynamicBlockPacker**: aligned per-object uniform blocks
- **CommandRecorder**: deterministic per-frame command recording
- **SceneRegistry**: ordered world and UI scenes
*/

// Internal modules
mod error;
mod context;
mod config;
mod engine;
mod overlay;
pub mod log;
pub mod graphics_device;
pub mod frame;
pub mod pipeline;
pub mod scene;

// Main strata namespace module
pub mod strata {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine facade and its collaborators
    pub use crate::engine::Engine;
    pub use crate::context::{EngineContext, RendererStats};
    pub use crate::config::{EngineConfig, MAX_FRAMES_IN_FLIGHT};
    pub use crate::overlay::OverlayRenderer;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogFacadeLogger, LogSeverity, Logger};
    }

    // Render sub-module with all device-facing types
    pub mod render {
        pub use crate::graphics_device::*;
    }

    // Frame sub-module
    pub mod frame {
        pub use crate::frame::*;
    }

    // Pipeline sub-module
    pub mod pipeline {
        pub use crate::pipeline::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
