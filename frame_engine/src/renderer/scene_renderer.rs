/// SceneRenderer - the per-frame loop
///
/// ```text
/// Idle --begin_frame--> Acquired --render--> Recording --end_frame--> Submitted --> Idle
/// ```
///
/// `begin_frame()` waits for the frame slot, acquires an image (recreating
/// the swapchain and retrying once on "out of date"), begins the image's
/// command list and opens the render pass. `end_frame()` closes the pass,
/// submits gated on the acquire semaphore and presents gated on the
/// submit semaphore. Collaborators record through `current_command_list()`
/// between the two and must not begin or end render passes themselves.

use std::sync::Arc;

use glam::Mat4;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame::FrameManager;
use crate::graphics_device::{
    BindingGroup, ClearValue, CommandList, Pipeline, PipelineDesc, PipelineStages,
    PushConstantRange, Rect2D, ShaderStage, SubmitInfo, Viewport,
};
use crate::render_pass::{AttachmentDescriptor, AttachmentRef, CompileOptions, RenderPass, SubpassDescriptor};
use crate::renderer::{Mesh, RenderContext};
use crate::swapchain::SwapchainOutcome;
use crate::target::{RenderTarget, SwapchainTarget, TargetContext};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

/// Size of the model-view-projection push constant
pub const MVP_PUSH_CONSTANT_SIZE: u32 = std::mem::size_of::<Mat4>() as u32;

/// Where the renderer is in the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Acquired,
    Recording,
    Submitted,
}

/// Counters since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_submitted: u64,
    pub swapchain_recreations: u64,
    pub draw_calls: u64,
}

pub struct SceneRenderer {
    // Field order is drop order
    target: SwapchainTarget,
    frame_manager: FrameManager,
    pipeline: Option<Arc<dyn Pipeline>>,
    render_pass: Arc<RenderPass>,
    context: RenderContext,
    /// Clear values re-applied after every rebuild
    configured_clears: ConfiguredClears,
    state: FrameState,
    image_index: u32,
    stats: FrameStats,
}

impl SceneRenderer {
    /// Build the default scene pass: one color attachment in the swapchain
    /// format at `config.sample_count` plus a depth attachment
    pub fn new(context: RenderContext, config: &Config) -> Result<Self> {
        let attachments = [
            AttachmentDescriptor::presentable(context.swapchain().format()),
            AttachmentDescriptor::depth(config.depth_format),
        ];
        let subpasses = [SubpassDescriptor::new(config.sample_count)
            .with_color(AttachmentRef::color(0))
            .with_depth_stencil(AttachmentRef::depth(1))];
        Self::with_render_pass(context, config, &attachments, &subpasses)
    }

    /// Build with a custom attachment/subpass layout (empty lists give the default presentable pass)
    pub fn with_render_pass(
        context: RenderContext,
        config: &Config,
        attachments: &[AttachmentDescriptor],
        subpasses: &[SubpassDescriptor],
    ) -> Result<Self> {
        config.validate()?;

        let options = CompileOptions {
            default_format: context.swapchain().format(),
            depth_sampling: config.depth_sampling,
        };
        let render_pass = Arc::new(RenderPass::new(context.device().as_ref(), attachments, subpasses, options)?);
        let frame_manager = FrameManager::new(
            context.device().as_ref(),
            config.frames_in_flight,
            context.swapchain().image_count(),
            config.fence_timeout_ns,
        )?;
        let mut target = SwapchainTarget::new(render_pass.clone(), context.swapchain());

        let mut configured_clears = ConfiguredClears::default();
        for value in [
            ClearValue::Color(config.clear_color),
            ClearValue::DepthStencil { depth: config.clear_depth, stencil: config.clear_stencil },
        ] {
            target.set_clear_value(None, value)?;
            configured_clears.record(None, value);
        }

        // Built now unless minimized at startup, then on the first frame
        if !context.swapchain().images().is_empty() {
            let ctx = TargetContext::with_swapchain(context.device().as_ref(), context.swapchain());
            target.recreate(&ctx)?;
        }

        engine_info!(
            "frame_engine::renderer",
            "SceneRenderer ready: {} attachments, {} frames in flight, {} images",
            render_pass.attachment_count(), frame_manager.frame_count(), context.swapchain().image_count()
        );

        Ok(Self {
            target,
            frame_manager,
            pipeline: None,
            render_pass,
            context,
            configured_clears,
            state: FrameState::Idle,
            image_index: 0,
            stats: FrameStats::default(),
        })
    }

    /// Push constant range `render()` writes the MVP matrix into
    pub fn mvp_push_constant_range() -> PushConstantRange {
        PushConstantRange { stages: vec![ShaderStage::Vertex], offset: 0, size: MVP_PUSH_CONSTANT_SIZE }
    }

    /// Create the pipeline used by `render()`, against subpass 0
    ///
    /// The sample count is taken from the subpass, and the MVP push constant
    /// range is added if the description has none.
    pub fn setup_pipeline(&mut self, mut desc: PipelineDesc) -> Result<()> {
        desc.subpass = 0;
        desc.samples = self.render_pass.subpass_samples(0);
        if desc.push_constant_ranges.is_empty() {
            desc.push_constant_ranges.push(Self::mvp_push_constant_range());
        }
        let pipeline = self.context.device().create_pipeline(&desc, self.render_pass.handle())?;
        self.pipeline = Some(pipeline);
        engine_debug!("frame_engine::renderer", "Scene pipeline created ({:?})", desc.samples);
        Ok(())
    }

    /// Start a frame
    ///
    /// Returns the acquired image index, or `None` when the surface has zero
    /// area and the frame is skipped.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside `Idle`. Fatal errors for fence timeouts, a
    /// second consecutive acquire failure, or backend failures.
    pub fn begin_frame(&mut self) -> Result<Option<u32>> {
        if self.state != FrameState::Idle {
            engine_error!("frame_engine::renderer", "begin_frame called in state {:?}", self.state);
            return Err(Error::InvalidState(format!("begin_frame in state {:?}", self.state)));
        }

        if self.context.swapchain().is_stale() {
            self.recreate_swapchain()?;
            if self.context.swapchain().is_stale() {
                return Ok(None);
            }
        }

        // A rebuild that failed earlier is retried before an image is taken
        if self.target.is_stale(self.context.swapchain()) {
            self.rebuild_target()?;
        }

        // The fence is reset in end_frame(), right before the submit that signals it
        self.frame_manager.wait_current()?;

        let image_index = match self.acquire()? {
            Some(index) => index,
            None => return Ok(None),
        };

        self.frame_manager.wait_for_image(image_index)?;

        let command_list = self.frame_manager.command_list_mut(image_index)
            .ok_or_else(|| Error::InvalidState(format!("no command list for image {}", image_index)))?;
        command_list.begin()?;
        let ctx = TargetContext::with_swapchain(self.context.device().as_ref(), self.context.swapchain());
        if let Err(e) = self.target.begin_render_target(&ctx, command_list) {
            if let Err(end_error) = command_list.end() {
                engine_warn!("frame_engine::renderer", "Abandoned command list did not end cleanly: {}", end_error);
            }
            return Err(e);
        }

        self.image_index = image_index;
        self.state = FrameState::Acquired;
        Ok(Some(image_index))
    }

    /// Acquire with one recreate-and-retry; `None` if the surface vanished meanwhile
    fn acquire(&mut self) -> Result<Option<u32>> {
        let outcome = self.context.swapchain_mut()
            .acquire_next_image(self.frame_manager.sync().image_acquired.as_ref());
        match outcome {
            SwapchainOutcome::Ok(image) => return Ok(Some(image.index)),
            SwapchainOutcome::Fatal(e) => return Err(e),
            SwapchainOutcome::ShouldRecreate => {}
        }

        self.recreate_swapchain()?;
        if self.context.swapchain().is_stale() {
            return Ok(None);
        }

        let retry = self.context.swapchain_mut()
            .acquire_next_image(self.frame_manager.sync().image_acquired.as_ref());
        match retry {
            SwapchainOutcome::Ok(image) => Ok(Some(image.index)),
            SwapchainOutcome::Fatal(e) => Err(e),
            SwapchainOutcome::ShouldRecreate => {
                engine_error!("frame_engine::renderer", "Acquire failed again after swapchain recreation");
                Err(Error::SurfaceLost("acquire failed after swapchain recreation".to_string()))
            }
        }
    }

    /// Draw `mesh` with the scene pipeline
    ///
    /// Misuse (no pipeline, or outside a frame) is logged and ignored.
    pub fn render(
        &mut self,
        view_projection: Mat4,
        model: Mat4,
        mesh: &Mesh,
        binding_groups: &[Arc<dyn BindingGroup>],
    ) -> Result<()> {
        if !matches!(self.state, FrameState::Acquired | FrameState::Recording) {
            engine_error!("frame_engine::renderer", "render called outside a frame (state {:?})", self.state);
            return Ok(());
        }
        let Some(pipeline) = self.pipeline.as_ref() else {
            engine_error!("frame_engine::renderer", "render called before setup_pipeline");
            return Ok(());
        };
        let Some(command_list) = self.frame_manager.command_list_mut(self.image_index) else {
            engine_error!("frame_engine::renderer", "No command list for image {}", self.image_index);
            return Ok(());
        };

        let extent = self.context.swapchain().extent();
        command_list.set_viewport(Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        })?;
        command_list.set_scissor(Rect2D { x: 0, y: 0, width: extent.width, height: extent.height })?;
        command_list.bind_pipeline(pipeline)?;
        for group in binding_groups {
            command_list.bind_binding_group(pipeline, group.set_index(), group)?;
        }

        let mvp = view_projection * model;
        command_list.push_constants(&[ShaderStage::Vertex], 0, bytemuck::bytes_of(&mvp))?;

        command_list.bind_vertex_buffer(mesh.vertex_buffer(), 0)?;
        match mesh.indices() {
            Some(indices) => {
                command_list.bind_index_buffer(&indices.buffer, 0, indices.index_type)?;
                command_list.draw_indexed(indices.count, 0, 0)?;
            }
            None => command_list.draw(mesh.vertex_count(), 0)?,
        }

        self.stats.draw_calls += 1;
        self.state = FrameState::Recording;
        Ok(())
    }

    /// Close, submit and present the frame
    ///
    /// A suboptimal or out-of-date present, or an image acquired as
    /// suboptimal, recreates the swapchain before returning.
    pub fn end_frame(&mut self) -> Result<()> {
        if !matches!(self.state, FrameState::Acquired | FrameState::Recording) {
            engine_error!("frame_engine::renderer", "end_frame called in state {:?}", self.state);
            return Err(Error::InvalidState(format!("end_frame in state {:?}", self.state)));
        }

        let command_list = self.frame_manager.command_list_mut(self.image_index)
            .ok_or_else(|| Error::InvalidState(format!("no command list for image {}", self.image_index)))?;
        self.target.end_render_target(command_list)?;
        command_list.end()?;

        {
            let sync = self.frame_manager.sync();
            let command_list = self.frame_manager.command_list(self.image_index)
                .ok_or_else(|| Error::InvalidState(format!("no command list for image {}", self.image_index)))?;
            let submit = SubmitInfo {
                command_lists: &[command_list],
                wait_semaphores: &[sync.image_acquired.as_ref()],
                wait_stages: &[PipelineStages::COLOR_ATTACHMENT_OUTPUT],
                signal_semaphores: &[sync.render_complete.as_ref()],
                fence: Some(sync.fence.as_ref()),
            };
            self.frame_manager.reset_current()?;
            self.context.device().graphics_queue().submit(&submit)?;
        }
        self.state = FrameState::Submitted;
        self.stats.frames_submitted += 1;

        let outcome = self.context.swapchain_mut()
            .present(self.image_index, &[self.frame_manager.sync().render_complete.as_ref()]);

        // The slot advances whatever the present result
        self.frame_manager.end_frame();
        self.state = FrameState::Idle;

        match outcome {
            SwapchainOutcome::Ok(()) if self.context.swapchain().is_stale() => self.recreate_swapchain(),
            SwapchainOutcome::Ok(()) => Ok(()),
            SwapchainOutcome::ShouldRecreate => self.recreate_swapchain(),
            SwapchainOutcome::Fatal(e) => Err(e),
        }
    }

    /// Recreate the swapchain and everything sized from it
    ///
    /// Waits for the device, rebuilds the target against the unchanged render
    /// pass, re-applies configured clear values and reallocates one command
    /// list per new image. Does nothing beyond the swapchain while minimized.
    pub fn recreate_swapchain(&mut self) -> Result<()> {
        if !self.context.recreate_swapchain()? {
            engine_debug!("frame_engine::renderer", "Swapchain recreation deferred (zero-sized surface)");
            return Ok(());
        }

        // Sized from the new swapchain even if the target rebuild below fails
        self.frame_manager.reset_command_lists(
            self.context.device().as_ref(),
            self.context.swapchain().image_count(),
        )?;
        self.rebuild_target()?;

        let extent = self.context.swapchain().extent();
        self.stats.swapchain_recreations += 1;
        engine_info!(
            "frame_engine::renderer",
            "Swapchain resources rebuilt at {}x{} ({} recreation(s))",
            extent.width, extent.height, self.stats.swapchain_recreations
        );
        Ok(())
    }

    /// Rebuild the target against the current swapchain and restore clear values
    fn rebuild_target(&mut self) -> Result<()> {
        let extent = self.context.swapchain().extent();
        if self.target.extent() != extent {
            self.target.resize(extent.width, extent.height);
        }

        let ctx = TargetContext::with_swapchain(self.context.device().as_ref(), self.context.swapchain());
        self.target.recreate(&ctx)?;
        for (index, value) in self.configured_clears.iter() {
            self.target.set_clear_value(index, value)?;
        }
        Ok(())
    }

    /// Resize notification; the rebuild happens at the next `begin_frame()`
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.swapchain_mut().set_requested_extent(width, height);
    }

    /// Store a clear value and keep it across rebuilds
    pub fn set_clear_value(&mut self, index: Option<usize>, value: ClearValue) -> Result<()> {
        self.target.set_clear_value(index, value)?;
        self.configured_clears.record(index, value);
        Ok(())
    }

    /// Command list of the frame being recorded
    pub fn current_command_list(&mut self) -> Option<&mut (dyn CommandList + 'static)> {
        if !matches!(self.state, FrameState::Acquired | FrameState::Recording) {
            engine_warn!("frame_engine::renderer", "No command list outside a frame (state {:?})", self.state);
            return None;
        }
        self.state = FrameState::Recording;
        self.frame_manager.command_list_mut(self.image_index)
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Image index of the frame in progress (or the last one)
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    pub fn pipeline(&self) -> Option<&Arc<dyn Pipeline>> {
        self.pipeline.as_ref()
    }

    pub fn render_pass(&self) -> &Arc<RenderPass> {
        &self.render_pass
    }

    pub fn target(&self) -> &SwapchainTarget {
        &self.target
    }

    pub fn frame_manager(&self) -> &FrameManager {
        &self.frame_manager
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.context
    }
}

/// Latest clear value per attachment, plus the latest broadcast of each kind
#[derive(Debug, Default)]
struct ConfiguredClears {
    broadcast_color: Option<ClearValue>,
    broadcast_depth: Option<ClearValue>,
    indexed: Vec<(usize, ClearValue)>,
}

impl ConfiguredClears {
    fn record(&mut self, index: Option<usize>, value: ClearValue) {
        match index {
            None => {
                match value {
                    ClearValue::Color(_) => self.broadcast_color = Some(value),
                    ClearValue::DepthStencil { .. } => self.broadcast_depth = Some(value),
                }
                // A broadcast overwrites earlier per-attachment values of its kind
                self.indexed.retain(|(_, v)| std::mem::discriminant(v) != std::mem::discriminant(&value));
            }
            Some(index) => match self.indexed.iter_mut().find(|(i, _)| *i == index) {
                Some(entry) => entry.1 = value,
                None => self.indexed.push((index, value)),
            },
        }
    }

    /// Broadcasts first so per-attachment values win
    fn iter(&self) -> impl Iterator<Item = (Option<usize>, ClearValue)> + '_ {
        self.broadcast_color.iter()
            .chain(self.broadcast_depth.iter())
            .map(|value| (None, *value))
            .chain(self.indexed.iter().map(|(index, value)| (Some(*index), *value)))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.broadcast_color.is_some() as usize + self.broadcast_depth.is_some() as usize + self.indexed.len()
    }
}

impl Drop for SceneRenderer {
    fn drop(&mut self) {
        // Nothing may be in flight when the fields start dropping
        if self.context.wait_idle().is_err() {
            engine_warn!("frame_engine::renderer", "Dropping SceneRenderer without an idle device");
        }
    }
}

#[cfg(test)]
#[path = "scene_renderer_tests.rs"]
mod tests;
