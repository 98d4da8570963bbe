/// FrameScheduler — keeps N frames in flight
///
/// Each iteration runs WaitFence -> Acquire -> Record -> Submit -> Present
/// -> Advance on slot `frame_counter % N`. The fence wait is the only thing
/// that keeps the host from writing a buffer the device may still read, so
/// recording is refused for a slot that was not waited on.
///
/// The fence is reset only once an image has been acquired: a stale surface
/// abandons the frame with the fence still signaled, and the next attempt
/// on the same slot does not block.
///
/// If recording or submission fails after an acquire, the acquire semaphore
/// keeps a pending signal and the command list may be left mid-recording.
/// The slot gets a fresh semaphore and command list before the error is
/// returned, and the acquired image is reported as orphaned: it is never
/// presented, so the surface has to be rebuilt to get it back.

use std::sync::Arc;
use crate::context::EngineContext;
use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandList, Fence, GraphicsDevice, PresentStatus, Semaphore, Submission, Swapchain,
    WAIT_FOREVER,
};
use crate::{engine_debug, engine_trace, engine_warn};
use super::recorder::FrameStats;

/// Where a frame slot stands relative to its fence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase {
    /// Work may be outstanding; the fence must be waited on
    Pending,
    /// Fence waited on and still signaled
    Ready,
    /// Fence reset; the slot may be recorded and submitted
    Recording,
}

/// One of the N rotating synchronization contexts
pub struct FrameSlot {
    index: usize,
    image_available: Box<dyn Semaphore>,
    render_finished: Box<dyn Semaphore>,
    in_flight: Box<dyn Fence>,
    command_list: Box<dyn CommandList>,
    phase: SlotPhase,
}

impl FrameSlot {
    pub(crate) fn new(device: &dyn GraphicsDevice, index: usize) -> Result<Self> {
        Ok(Self {
            index,
            image_available: device.create_semaphore()?,
            render_finished: device.create_semaphore()?,
            // Signaled so the first wait on a fresh slot returns at once
            in_flight: device.create_fence(true)?,
            command_list: device.create_command_list()?,
            phase: SlotPhase::Pending,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> SlotPhase {
        self.phase
    }

    pub fn command_list_mut(&mut self) -> &mut dyn CommandList {
        self.command_list.as_mut()
    }

    /// Block until the slot's previous submission completed
    pub(crate) fn wait(&mut self) -> Result<()> {
        if self.phase == SlotPhase::Pending {
            self.in_flight.wait(WAIT_FOREVER)?;
            self.phase = SlotPhase::Ready;
        }
        Ok(())
    }

    /// Replace the objects a failed frame may have left unusable
    ///
    /// The fence is kept: it is either still signaled or reset and waiting
    /// for the next submission, and the phase says which.
    pub(crate) fn recover(&mut self, device: &dyn GraphicsDevice) -> Result<()> {
        self.image_available = device.create_semaphore()?;
        self.command_list = device.create_command_list()?;
        Ok(())
    }

    /// Reset the fence so the next submission can signal it
    pub(crate) fn reset(&mut self) -> Result<()> {
        match self.phase {
            SlotPhase::Pending => Err(Error::FenceNotWaited { slot: self.index }),
            SlotPhase::Ready => {
                self.in_flight.reset()?;
                self.phase = SlotPhase::Recording;
                Ok(())
            }
            SlotPhase::Recording => Ok(()),
        }
    }
}

/// Result of one scheduler iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and queued for presentation
    Presented {
        image_index: u32,
        stats: FrameStats,
        /// The surface still works but should be rebuilt
        suboptimal: bool,
    },
    /// The surface is stale; rebuild it before the next frame
    NeedsRebuild,
}

pub struct FrameScheduler {
    ctx: Arc<EngineContext>,
    slots: Vec<FrameSlot>,
    frame_counter: u64,
    orphaned_image: Option<u32>,
}

impl FrameScheduler {
    pub fn new(ctx: Arc<EngineContext>, device: &dyn GraphicsDevice, frames_in_flight: usize) -> Result<Self> {
        if frames_in_flight == 0 {
            return Err(Error::InitializationFailed("at least one frame in flight is required".to_string()));
        }
        let slots = (0..frames_in_flight)
            .map(|index| FrameSlot::new(device, index))
            .collect::<Result<Vec<_>>>()?;
        engine_debug!(ctx, "strata::FrameScheduler", "Created {} frame slots", frames_in_flight);
        Ok(Self { ctx, slots, frame_counter: 0, orphaned_image: None })
    }

    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Slot the next iteration uses
    pub fn current_slot(&self) -> usize {
        (self.frame_counter % self.slots.len() as u64) as usize
    }

    pub fn slot(&self, index: usize) -> Option<&FrameSlot> {
        self.slots.get(index)
    }

    /// Image acquired by a failed frame and never presented, if any
    ///
    /// Cleared on read; the caller should rebuild the surface.
    pub fn take_orphaned_image(&mut self) -> Option<u32> {
        self.orphaned_image.take()
    }

    /// Run one iteration
    ///
    /// `record` is called with the slot (fence waited on and reset) and the
    /// acquired image index; it must write the slot's buffers and record its
    /// command list.
    pub fn render_frame<F>(
        &mut self,
        device: &dyn GraphicsDevice,
        swapchain: &mut dyn Swapchain,
        record: F,
    ) -> Result<FrameOutcome>
    where
        F: FnOnce(&mut FrameSlot, u32) -> Result<FrameStats>,
    {
        let slot_index = self.current_slot();
        let slot = &mut self.slots[slot_index];

        // WaitFence
        engine_trace!(self.ctx, "strata::FrameScheduler", "Frame {} waiting on slot {}",
            self.frame_counter, slot_index);
        slot.wait()?;

        // AcquireImage
        let image_index = match swapchain.acquire_next_image(slot.image_available.as_ref()) {
            Ok(index) => index,
            Err(Error::SurfaceOutOfDate) => {
                engine_debug!(self.ctx, "strata::FrameScheduler",
                    "Surface out of date on acquire, abandoning frame {}", self.frame_counter);
                self.ctx.record_abandoned_frame();
                return Ok(FrameOutcome::NeedsRebuild);
            }
            Err(e) => return Err(e),
        };

        // Record, Submit
        let stats = match record_and_submit(device, slot, image_index, record) {
            Ok(stats) => stats,
            Err(e) => {
                engine_warn!(self.ctx, "strata::FrameScheduler",
                    "Frame {} failed after acquiring image {}: {}", self.frame_counter, image_index, e);
                self.orphaned_image = Some(image_index);
                if let Err(recover_err) = slot.recover(device) {
                    engine_warn!(self.ctx, "strata::FrameScheduler",
                        "Cannot recover slot {}: {}", slot_index, recover_err);
                }
                return Err(e);
            }
        };

        // Present
        let presented = swapchain.present(image_index, slot.render_finished.as_ref());

        // Advance: the slot's fence is pending whether or not present succeeded
        self.frame_counter += 1;

        match presented {
            Ok(status) => {
                self.ctx.record_frame(&stats);
                Ok(FrameOutcome::Presented {
                    image_index,
                    stats,
                    suboptimal: status == PresentStatus::Suboptimal,
                })
            }
            Err(Error::SurfaceOutOfDate) => {
                engine_debug!(self.ctx, "strata::FrameScheduler", "Surface out of date on present");
                Ok(FrameOutcome::NeedsRebuild)
            }
            Err(e) => Err(e),
        }
    }

    /// Wait on every slot with outstanding work
    ///
    /// Must run before any buffer or synchronization object a slot may
    /// still reference is destroyed.
    pub fn drain(&mut self) -> Result<()> {
        for slot in &mut self.slots {
            slot.wait()?;
        }
        Ok(())
    }
}

fn record_and_submit<F>(
    device: &dyn GraphicsDevice,
    slot: &mut FrameSlot,
    image_index: u32,
    record: F,
) -> Result<FrameStats>
where
    F: FnOnce(&mut FrameSlot, u32) -> Result<FrameStats>,
{
    slot.reset()?;
    let stats = record(slot, image_index)?;
    device.submit(&Submission {
        command_list: slot.command_list.as_ref(),
        wait_semaphore: Some(slot.image_available.as_ref()),
        signal_semaphore: Some(slot.render_finished.as_ref()),
        fence: Some(slot.in_flight.as_ref()),
    })?;
    slot.phase = SlotPhase::Pending;
    Ok(stats)
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        if let Err(e) = self.drain() {
            engine_warn!(self.ctx, "strata::FrameScheduler", "Failed to drain frame slots: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
