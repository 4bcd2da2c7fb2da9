/// FrameManager - bounds how far the CPU may run ahead of the GPU
///
/// Synchronization objects are indexed by frame slot (`current_frame`),
/// command lists by the acquired swapchain image. The two counts are
/// independent, so the manager remembers which slot last recorded into
/// each image: before a slot reuses an image's command list that another
/// slot recorded, `wait_for_image()` waits on the other slot's fence.

use crate::error::{Error, Result};
use crate::graphics_device::{CommandList, Fence, GraphicsDevice, Semaphore};
use crate::{engine_debug, engine_error};

/// Synchronization objects of one frame-in-flight slot
pub struct FrameSynchronization {
    /// Signaled when the slot's last submission has completed (created signaled)
    pub fence: Box<dyn Fence>,
    /// Signaled when the acquired image is ready to be rendered into
    pub image_acquired: Box<dyn Semaphore>,
    /// Signaled when the slot's submission has finished; gates presentation
    pub render_complete: Box<dyn Semaphore>,
}

pub struct FrameManager {
    frames: Vec<FrameSynchronization>,
    command_lists: Vec<Box<dyn CommandList>>,
    /// Frame slot that last recorded into each image
    image_owners: Vec<Option<usize>>,
    current_frame: usize,
    fence_timeout_ns: u64,
}

impl FrameManager {
    /// Create `frame_count` sync slots and `image_count` command lists
    ///
    /// # Errors
    ///
    /// `InvalidResource` for a zero frame count, or backend creation failures.
    pub fn new(
        device: &dyn GraphicsDevice,
        frame_count: usize,
        image_count: usize,
        fence_timeout_ns: u64,
    ) -> Result<Self> {
        if frame_count == 0 {
            return Err(Error::InvalidResource("frame_count must be at least 1".to_string()));
        }

        let mut frames = Vec::with_capacity(frame_count);
        for _ in 0..frame_count {
            frames.push(FrameSynchronization {
                // Signaled so the first wait on each slot returns immediately
                fence: device.create_fence(true)?,
                image_acquired: device.create_semaphore()?,
                render_complete: device.create_semaphore()?,
            });
        }

        let mut manager = Self {
            frames,
            command_lists: Vec::new(),
            image_owners: Vec::new(),
            current_frame: 0,
            fence_timeout_ns,
        };
        manager.reset_command_lists(device, image_count)?;

        engine_debug!(
            "frame_engine::frame",
            "FrameManager created: {} frames in flight, {} command lists",
            frame_count, image_count
        );
        Ok(manager)
    }

    /// Wait until the current slot's previous submission has retired, then reset its fence
    ///
    /// # Errors
    ///
    /// `Timeout` if the GPU does not finish within the fence timeout (fatal).
    pub fn begin_frame(&mut self) -> Result<()> {
        self.wait_current()?;
        self.reset_current()
    }

    /// First half of `begin_frame()`: the slot's semaphores are reusable afterwards
    pub fn wait_current(&self) -> Result<()> {
        self.frames[self.current_frame].fence.wait(self.fence_timeout_ns).map_err(|e| {
            engine_error!("frame_engine::frame", "Frame {} fence wait failed: {}", self.current_frame, e);
            e
        })
    }

    /// Second half of `begin_frame()`
    ///
    /// The scene renderer calls it right before the submit that signals the
    /// fence again, so a frame abandoned before submission leaves it signaled.
    pub fn reset_current(&self) -> Result<()> {
        self.frames[self.current_frame].fence.reset()
    }

    /// Advance to the next frame slot
    pub fn end_frame(&mut self) {
        self.current_frame = (self.current_frame + 1) % self.frames.len();
    }

    /// Make `image_index`'s command list safe to re-record from the current slot
    ///
    /// Called after acquisition and before `CommandList::begin()`.
    pub fn wait_for_image(&mut self, image_index: u32) -> Result<()> {
        let index = image_index as usize;
        let Some(owner) = self.image_owners.get(index).copied() else {
            return Err(Error::InvalidResource(format!(
                "image index {} out of range ({} command lists)",
                image_index,
                self.command_lists.len()
            )));
        };

        if let Some(slot) = owner {
            if slot != self.current_frame {
                self.frames[slot].fence.wait(self.fence_timeout_ns).map_err(|e| {
                    engine_error!("frame_engine::frame", "Waiting for image {} (frame {}) failed: {}", image_index, slot, e);
                    e
                })?;
            }
        }
        self.image_owners[index] = Some(self.current_frame);
        Ok(())
    }

    /// Drop the command list pool and allocate one list per presentable image
    ///
    /// The caller waits for the device to be idle first.
    pub fn reset_command_lists(&mut self, device: &dyn GraphicsDevice, image_count: usize) -> Result<()> {
        self.command_lists.clear();
        for _ in 0..image_count {
            self.command_lists.push(device.create_command_list()?);
        }
        self.image_owners = vec![None; image_count];
        Ok(())
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Synchronization objects of the current slot
    pub fn sync(&self) -> &FrameSynchronization {
        &self.frames[self.current_frame]
    }

    pub fn command_list(&self, image_index: u32) -> Option<&dyn CommandList> {
        self.command_lists.get(image_index as usize).map(|list| list.as_ref())
    }

    pub fn command_list_mut(&mut self, image_index: u32) -> Option<&mut (dyn CommandList + 'static)> {
        self.command_lists.get_mut(image_index as usize).map(|list| list.as_mut())
    }

    pub fn command_list_count(&self) -> usize {
        self.command_lists.len()
    }
}

#[cfg(test)]
#[path = "frame_manager_tests.rs"]
mod tests;
