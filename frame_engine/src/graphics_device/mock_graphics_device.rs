/// Mock graphics device for unit tests (no GPU required)
///
/// Every object created by `MockGraphicsDevice` reports into a shared
/// `MockState`, so tests can observe what the engine asked the backend to
/// do: recorded commands (including clear-value arrays), submissions,
/// presents, live texture/framebuffer/chain counts, and the old-chain
/// hand-off on recreation. Acquire and present results can be scripted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::graphics_device::{
    BindingGroup, BindingResource, Buffer, BufferDesc, ClearValue, ColorSpace,
    CommandList, DeviceSettings, Extent2D, Fence, Framebuffer, FramebufferDesc,
    GraphicsDevice, IndexType, Pipeline, PipelineDesc, PresentMode,
    PresentStatus, PresentationChain, PresentationChainDesc, Queue, Rect2D,
    RenderPass, RenderPassDesc, Semaphore, Shader, ShaderDesc, ShaderStage,
    SubmitInfo, SurfaceCapabilities, SurfaceFormat, Texture, TextureDesc,
    TextureFormat, TextureInfo, TextureUsage, SampleCount, Viewport,
};

// ============================================================================
// Shared state
// ============================================================================

/// A command recorded by a `MockCommandList`
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    Begin,
    End,
    BeginRenderPass { framebuffer: u64, clear_values: Vec<ClearValue> },
    EndRenderPass,
    SetViewport(Viewport),
    SetScissor(Rect2D),
    BindPipeline,
    BindBindingGroup { set_index: u32 },
    PushConstants { offset: u32, data: Vec<u8> },
    BindVertexBuffer,
    BindIndexBuffer(IndexType),
    Draw { vertex_count: u32 },
    DrawIndexed { index_count: u32 },
}

/// Observable state shared by the mock device and everything it creates
#[derive(Default)]
pub struct MockState {
    /// (command list id, command)
    pub commands: Mutex<Vec<(u64, RecordedCommand)>>,
    pub acquire_script: Mutex<VecDeque<Result<PresentStatus>>>,
    pub present_script: Mutex<VecDeque<Result<PresentStatus>>>,
    /// When set, every fence wait fails with this error
    pub fence_wait_error: Mutex<Option<Error>>,
    /// Ids of the old chain passed to each `create_presentation_chain` call
    pub chain_handoffs: Mutex<Vec<Option<u64>>>,
    pub chain_descs: Mutex<Vec<PresentationChainDesc>>,
    pub render_pass_descs: Mutex<Vec<RenderPassDesc>>,
    pub texture_descs: Mutex<Vec<TextureDesc>>,
    /// (image index, number of wait semaphores)
    pub presents: Mutex<Vec<(u32, usize)>>,
    /// Number of command lists per submission
    pub submits: Mutex<Vec<usize>>,
    pub chains_created: AtomicUsize,
    pub chains_dropped: AtomicUsize,
    pub textures_alive: AtomicUsize,
    pub framebuffers_created: AtomicUsize,
    pub framebuffers_alive: AtomicUsize,
    pub command_lists_created: AtomicUsize,
    pub fence_waits: AtomicUsize,
    pub fence_resets: AtomicUsize,
    pub device_idle_waits: AtomicUsize,
}

impl MockState {
    /// Clear-value arrays of every `BeginRenderPass`, in recording order
    pub fn begin_clear_values(&self) -> Vec<Vec<ClearValue>> {
        self.commands.lock().unwrap().iter()
            .filter_map(|(_, cmd)| match cmd {
                RecordedCommand::BeginRenderPass { clear_values, .. } => Some(clear_values.clone()),
                _ => None,
            })
            .collect()
    }

    /// Framebuffer ids of every `BeginRenderPass`, in recording order
    pub fn begin_framebuffers(&self) -> Vec<u64> {
        self.commands.lock().unwrap().iter()
            .filter_map(|(_, cmd)| match cmd {
                RecordedCommand::BeginRenderPass { framebuffer, .. } => Some(*framebuffer),
                _ => None,
            })
            .collect()
    }

    /// All recorded commands without list ids
    pub fn command_kinds(&self) -> Vec<RecordedCommand> {
        self.commands.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn count(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Mock resources
// ============================================================================

pub struct MockTexture {
    pub info: TextureInfo,
    state: Arc<MockState>,
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        if !self.info.presentation_owned {
            self.state.textures_alive.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

pub struct MockBuffer {
    pub size: u64,
}

impl Buffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            return Err(Error::InvalidResource("buffer update out of range".to_string()));
        }
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}

pub struct MockShader {
    pub stage: ShaderStage,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
}

pub struct MockRenderPass {
    pub desc: RenderPassDesc,
}

impl RenderPass for MockRenderPass {
    fn attachment_count(&self) -> usize {
        self.desc.attachments.len()
    }
}

pub struct MockFramebuffer {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub attachment_count: usize,
    state: Arc<MockState>,
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn attachment_count(&self) -> usize {
        self.attachment_count
    }
}

impl Drop for MockFramebuffer {
    fn drop(&mut self) {
        self.state.framebuffers_alive.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockPipeline {
    pub desc: PipelineDesc,
}

impl Pipeline for MockPipeline {
    fn binding_group_layout_count(&self) -> u32 {
        self.desc.binding_group_layouts.len() as u32
    }
}

pub struct MockBindingGroup {
    pub set_index: u32,
}

impl BindingGroup for MockBindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }
}

pub struct MockFence {
    signaled: AtomicBool,
    state: Arc<MockState>,
}

impl Fence for MockFence {
    fn wait(&self, _timeout_ns: u64) -> Result<()> {
        if let Some(err) = self.state.fence_wait_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.state.fence_waits.fetch_add(1, Ordering::SeqCst);
        // Nothing completes on its own: an unsignaled fence never gets signaled by waiting
        if !self.signaled.load(Ordering::SeqCst) {
            return Err(Error::Timeout("mock fence is unsignaled".to_string()));
        }
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        self.signaled.store(false, Ordering::SeqCst);
        self.state.fence_resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_signaled(&self) -> Result<bool> {
        Ok(self.signaled.load(Ordering::SeqCst))
    }
}

impl MockFence {
    /// Signal `fence` as a completed submission would
    pub fn signal(fence: &dyn Fence) {
        let fence = unsafe { &*(fence as *const dyn Fence as *const MockFence) };
        fence.signaled.store(true, Ordering::SeqCst);
    }
}

pub struct MockSemaphore;

impl Semaphore for MockSemaphore {}

// ============================================================================
// Mock command list
// ============================================================================

pub struct MockCommandList {
    pub id: u64,
    state: Arc<MockState>,
}

impl MockCommandList {
    fn record(&self, command: RecordedCommand) -> Result<()> {
        self.state.commands.lock().unwrap().push((self.id, command));
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.record(RecordedCommand::Begin)
    }

    fn end(&mut self) -> Result<()> {
        self.record(RecordedCommand::End)
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        // Every framebuffer seen here was created by MockGraphicsDevice
        let id = unsafe {
            let ptr = framebuffer.as_ref() as *const dyn Framebuffer as *const MockFramebuffer;
            (*ptr).id
        };
        self.record(RecordedCommand::BeginRenderPass {
            framebuffer: id,
            clear_values: clear_values.to_vec(),
        })
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.record(RecordedCommand::EndRenderPass)
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(RecordedCommand::SetViewport(viewport))
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.record(RecordedCommand::SetScissor(scissor))
    }

    fn bind_pipeline(&mut self, _pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.record(RecordedCommand::BindPipeline)
    }

    fn bind_binding_group(
        &mut self,
        _pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        _binding_group: &Arc<dyn BindingGroup>,
    ) -> Result<()> {
        self.record(RecordedCommand::BindBindingGroup { set_index })
    }

    fn push_constants(&mut self, _stages: &[ShaderStage], offset: u32, data: &[u8]) -> Result<()> {
        self.record(RecordedCommand::PushConstants { offset, data: data.to_vec() })
    }

    fn bind_vertex_buffer(&mut self, _buffer: &Arc<dyn Buffer>, _offset: u64) -> Result<()> {
        self.record(RecordedCommand::BindVertexBuffer)
    }

    fn bind_index_buffer(&mut self, _buffer: &Arc<dyn Buffer>, _offset: u64, index_type: IndexType) -> Result<()> {
        self.record(RecordedCommand::BindIndexBuffer(index_type))
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<()> {
        self.record(RecordedCommand::Draw { vertex_count })
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.record(RecordedCommand::DrawIndexed { index_count })
    }
}

// ============================================================================
// Mock queue
// ============================================================================

pub struct MockQueue {
    state: Arc<MockState>,
}

impl Queue for MockQueue {
    fn family_index(&self) -> u32 {
        0
    }

    fn submit(&self, info: &SubmitInfo) -> Result<()> {
        if let Some(fence) = info.fence {
            MockFence::signal(fence);
        }
        self.state.submits.lock().unwrap().push(info.command_lists.len());
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Mock presentation chain
// ============================================================================

pub struct MockPresentationChain {
    pub id: u64,
    images: Vec<Arc<dyn Texture>>,
    surface_format: SurfaceFormat,
    extent: Extent2D,
    next_image: u32,
    state: Arc<MockState>,
}

impl PresentationChain for MockPresentationChain {
    fn images(&self) -> &[Arc<dyn Texture>] {
        &self.images
    }

    fn surface_format(&self) -> SurfaceFormat {
        self.surface_format
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn acquire_next_image(&mut self, _semaphore: &dyn Semaphore, _timeout_ns: u64) -> Result<(u32, PresentStatus)> {
        let scripted = self.state.acquire_script.lock().unwrap().pop_front();
        let status = scripted.unwrap_or(Ok(PresentStatus::Success))?;
        if status == PresentStatus::OutOfDate {
            return Ok((0, status));
        }
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.images.len() as u32;
        Ok((index, status))
    }

    fn present(&mut self, image_index: u32, wait_semaphores: &[&dyn Semaphore]) -> Result<PresentStatus> {
        let scripted = self.state.present_script.lock().unwrap().pop_front();
        let status = scripted.unwrap_or(Ok(PresentStatus::Success))?;
        self.state.presents.lock().unwrap().push((image_index, wait_semaphores.len()));
        Ok(status)
    }
}

impl Drop for MockPresentationChain {
    fn drop(&mut self) {
        self.state.chains_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock device
// ============================================================================

pub struct MockGraphicsDevice {
    pub settings: DeviceSettings,
    pub capabilities: Mutex<SurfaceCapabilities>,
    pub formats: Mutex<Vec<SurfaceFormat>>,
    pub present_modes: Mutex<Vec<PresentMode>>,
    pub state: Arc<MockState>,
    queue: Arc<MockQueue>,
    next_id: AtomicU64,
}

impl MockGraphicsDevice {
    /// 800x600 surface, 2..=8 images, B8G8R8A8 formats, FIFO + Mailbox
    pub fn new() -> Self {
        let state = Arc::new(MockState::default());
        Self {
            settings: DeviceSettings {
                surface_format: SurfaceFormat {
                    format: TextureFormat::B8G8R8A8_SRGB,
                    color_space: ColorSpace::SrgbNonLinear,
                },
                depth_format: TextureFormat::D32_FLOAT,
                present_mode: PresentMode::Mailbox,
                image_count: 3,
            },
            capabilities: Mutex::new(SurfaceCapabilities {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: Some(Extent2D::new(800, 600)),
                min_extent: Extent2D::new(1, 1),
                max_extent: Extent2D::new(4096, 4096),
            }),
            formats: Mutex::new(vec![
                SurfaceFormat { format: TextureFormat::B8G8R8A8_UNORM, color_space: ColorSpace::SrgbNonLinear },
                SurfaceFormat { format: TextureFormat::B8G8R8A8_SRGB, color_space: ColorSpace::SrgbNonLinear },
            ]),
            present_modes: Mutex::new(vec![PresentMode::Fifo, PresentMode::Mailbox]),
            queue: Arc::new(MockQueue { state: state.clone() }),
            state,
            next_id: AtomicU64::new(1),
        }
    }

    /// Same device with different desired image count
    pub fn with_image_count(mut self, image_count: u32) -> Self {
        self.settings.image_count = image_count;
        self
    }

    /// Simulate a window resize
    pub fn set_surface_extent(&self, width: u32, height: u32) {
        self.capabilities.lock().unwrap().current_extent = Some(Extent2D::new(width, height));
    }

    pub fn script_acquire(&self, result: Result<PresentStatus>) {
        self.state.acquire_script.lock().unwrap().push_back(result);
    }

    pub fn script_present(&self, result: Result<PresentStatus>) {
        self.state.present_script.lock().unwrap().push_back(result);
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    fn graphics_queue(&self) -> Arc<dyn Queue> {
        self.queue.clone()
    }

    fn present_queue(&self) -> Arc<dyn Queue> {
        self.queue.clone()
    }

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        Ok(*self.capabilities.lock().unwrap())
    }

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>> {
        Ok(self.formats.lock().unwrap().clone())
    }

    fn surface_present_modes(&self) -> Result<Vec<PresentMode>> {
        Ok(self.present_modes.lock().unwrap().clone())
    }

    fn create_presentation_chain(
        &self,
        desc: &PresentationChainDesc,
        old_chain: Option<&dyn PresentationChain>,
    ) -> Result<Box<dyn PresentationChain>> {
        let old_id = old_chain.map(|chain| unsafe {
            (*(chain as *const dyn PresentationChain as *const MockPresentationChain)).id
        });
        self.state.chain_handoffs.lock().unwrap().push(old_id);
        self.state.chain_descs.lock().unwrap().push(*desc);
        self.state.chains_created.fetch_add(1, Ordering::SeqCst);

        let images = (0..desc.image_count)
            .map(|_| {
                Arc::new(MockTexture {
                    info: TextureInfo {
                        width: desc.extent.width,
                        height: desc.extent.height,
                        format: desc.surface_format.format,
                        samples: SampleCount::S1,
                        usage: TextureUsage::COLOR_ATTACHMENT,
                        presentation_owned: true,
                    },
                    state: self.state.clone(),
                }) as Arc<dyn Texture>
            })
            .collect();

        Ok(Box::new(MockPresentationChain {
            id: self.next_id(),
            images,
            surface_format: desc.surface_format,
            extent: desc.extent,
            next_image: 0,
            state: self.state.clone(),
        }))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource("zero-sized texture".to_string()));
        }
        self.state.texture_descs.lock().unwrap().push(desc.clone());
        self.state.textures_alive.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockTexture {
            info: TextureInfo {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                samples: desc.samples,
                usage: desc.usage,
                presentation_owned: false,
            },
            state: self.state.clone(),
        }))
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>> {
        Ok(Arc::new(MockBuffer { size: desc.size }))
    }

    fn create_shader(&self, desc: &ShaderDesc) -> Result<Arc<dyn Shader>> {
        Ok(Arc::new(MockShader { stage: desc.stage }))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        self.state.render_pass_descs.lock().unwrap().push(desc.clone());
        Ok(Arc::new(MockRenderPass { desc: desc.clone() }))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        if desc.attachments.len() != desc.render_pass.attachment_count() {
            return Err(Error::InvalidResource(format!(
                "framebuffer has {} attachments, render pass expects {}",
                desc.attachments.len(),
                desc.render_pass.attachment_count()
            )));
        }
        for texture in desc.attachments {
            let info = texture.info();
            if info.width != desc.width || info.height != desc.height {
                return Err(Error::InvalidResource(format!(
                    "attachment is {}x{}, framebuffer is {}x{}",
                    info.width, info.height, desc.width, desc.height
                )));
            }
        }
        self.state.framebuffers_created.fetch_add(1, Ordering::SeqCst);
        self.state.framebuffers_alive.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockFramebuffer {
            id: self.next_id(),
            width: desc.width,
            height: desc.height,
            attachment_count: desc.attachments.len(),
            state: self.state.clone(),
        }))
    }

    fn create_pipeline(&self, desc: &PipelineDesc, _render_pass: &Arc<dyn RenderPass>) -> Result<Arc<dyn Pipeline>> {
        Ok(Arc::new(MockPipeline { desc: desc.clone() }))
    }

    fn create_binding_group(
        &self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        _resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>> {
        if set_index >= pipeline.binding_group_layout_count() {
            return Err(Error::InvalidResource(format!("pipeline has no set {}", set_index)));
        }
        Ok(Arc::new(MockBindingGroup { set_index }))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        self.state.command_lists_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCommandList { id: self.next_id(), state: self.state.clone() }))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        Ok(Box::new(MockFence { signaled: AtomicBool::new(signaled), state: self.state.clone() }))
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        Ok(Box::new(MockSemaphore))
    }

    fn wait_idle(&self) -> Result<()> {
        self.state.device_idle_waits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
