/// Frame module - dynamic block layout, packing, targets, recording and scheduling

pub mod alignment;
pub mod packer;
pub mod targets;
pub mod recorder;
pub mod scheduler;

pub use alignment::{pad_to_alignment, DynamicBlockLayout};
pub use packer::DynamicBlockPacker;
pub use targets::TargetSet;
pub use recorder::{CommandRecorder, FrameStats};
pub use scheduler::{FrameOutcome, FrameScheduler, FrameSlot, SlotPhase};
