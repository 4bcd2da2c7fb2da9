/// BindingGroup - Vulkan descriptor set allocation and writes
///
/// Sets come from a growable list of descriptor pools owned by the device;
/// they are released when the pools are destroyed.

use ash::vk;
use frame_engine::graphics_device::{BindingGroup as EngineBindingGroup, BindingResource, Texture as EngineTexture};
use frame_engine::{engine_err, engine_info, Error, Result};
use std::sync::Mutex;

use crate::vulkan_buffer::vk_buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_texture::vk_texture;

/// Capacity of each descriptor pool
const POOL_MAX_SETS: u32 = 1024;

/// Vulkan binding group
pub struct BindingGroup {
    pub(crate) descriptor_set: vk::DescriptorSet,
    set_index: u32,
}

impl EngineBindingGroup for BindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }
}

pub(crate) fn vk_descriptor_set(binding_group: &dyn EngineBindingGroup) -> vk::DescriptorSet {
    unsafe { (*(binding_group as *const dyn EngineBindingGroup as *const BindingGroup)).descriptor_set }
}

/// Growable list of descriptor pools
pub(crate) struct DescriptorAllocator {
    pools: Mutex<Vec<vk::DescriptorPool>>,
    sampler: vk::Sampler,
}

impl DescriptorAllocator {
    pub(crate) fn new(ctx: &GpuContext) -> Result<Self> {
        let pool = Self::create_pool(ctx)?;
        let sampler_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK);
        let sampler = match unsafe { ctx.device.create_sampler(&sampler_info, None) } {
            Ok(sampler) => sampler,
            Err(e) => {
                unsafe { ctx.device.destroy_descriptor_pool(pool, None) };
                return Err(engine_err!("frame_engine::vulkan", "Failed to create default sampler: {:?}", e));
            }
        };
        Ok(Self { pools: Mutex::new(vec![pool]), sampler })
    }

    fn create_pool(ctx: &GpuContext) -> Result<vk::DescriptorPool> {
        let pool_sizes = [
            vk::DescriptorPoolSize { ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER, descriptor_count: 2 * POOL_MAX_SETS },
            vk::DescriptorPoolSize { ty: vk::DescriptorType::UNIFORM_BUFFER, descriptor_count: POOL_MAX_SETS },
            vk::DescriptorPoolSize { ty: vk::DescriptorType::STORAGE_BUFFER, descriptor_count: POOL_MAX_SETS },
            vk::DescriptorPoolSize { ty: vk::DescriptorType::INPUT_ATTACHMENT, descriptor_count: POOL_MAX_SETS },
        ];
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(POOL_MAX_SETS);
        unsafe { ctx.device.create_descriptor_pool(&info, None) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to create descriptor pool: {:?}", e))
    }

    fn allocate(&self, ctx: &GpuContext, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let layouts = [layout];
        let mut pools = self.pools.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(&pool) = pools.last() {
            let info = vk::DescriptorSetAllocateInfo::default().descriptor_pool(pool).set_layouts(&layouts);
            match unsafe { ctx.device.allocate_descriptor_sets(&info) } {
                Ok(sets) => return Ok(sets[0]),
                Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {}
                Err(e) => return Err(engine_err!("frame_engine::vulkan", "Failed to allocate descriptor set: {:?}", e)),
            }
        }

        let pool = Self::create_pool(ctx)?;
        pools.push(pool);
        engine_info!("frame_engine::vulkan", "Descriptor pool exhausted, created new pool (total: {})", pools.len());

        let info = vk::DescriptorSetAllocateInfo::default().descriptor_pool(pool).set_layouts(&layouts);
        unsafe { ctx.device.allocate_descriptor_sets(&info) }
            .map(|sets| sets[0])
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to allocate descriptor set after pool growth: {:?}", e))
    }

    /// Allocate a set for `set_index` of `pipeline` and write `resources` into it
    pub(crate) fn create_binding_group(
        &self,
        ctx: &GpuContext,
        pipeline: &Pipeline,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<BindingGroup> {
        let layout = *pipeline.descriptor_set_layouts.get(set_index as usize).ok_or_else(|| {
            Error::InvalidResource(format!(
                "binding group set_index {} out of range (pipeline has {} layouts)",
                set_index,
                pipeline.descriptor_set_layouts.len()
            ))
        })?;
        let descriptor_set = self.allocate(ctx, layout)?;

        // Info arrays first: the writes point into them
        let buffer_infos: Vec<Option<vk::DescriptorBufferInfo>> = resources
            .iter()
            .map(|resource| match resource {
                BindingResource::UniformBuffer(buffer) | BindingResource::StorageBuffer(buffer) => {
                    Some(vk::DescriptorBufferInfo::default()
                        .buffer(vk_buffer(*buffer))
                        .offset(0)
                        .range(vk::WHOLE_SIZE))
                }
                _ => None,
            })
            .collect();
        let image_infos: Vec<Option<vk::DescriptorImageInfo>> = resources
            .iter()
            .map(|resource| match resource {
                BindingResource::SampledTexture(texture) => Some(
                    vk::DescriptorImageInfo::default()
                        .image_layout(read_only_layout(*texture))
                        .image_view(vk_texture(*texture).view)
                        .sampler(self.sampler),
                ),
                BindingResource::InputAttachment(texture) => Some(
                    vk::DescriptorImageInfo::default()
                        .image_layout(read_only_layout(*texture))
                        .image_view(vk_texture(*texture).view),
                ),
                _ => None,
            })
            .collect();

        let writes: Vec<vk::WriteDescriptorSet> = resources
            .iter()
            .enumerate()
            .map(|(binding, resource)| {
                let write = vk::WriteDescriptorSet::default()
                    .dst_set(descriptor_set)
                    .dst_binding(binding as u32)
                    .dst_array_element(0);
                match (resource, &buffer_infos[binding], &image_infos[binding]) {
                    (BindingResource::UniformBuffer(_), Some(info), _) => write
                        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                        .buffer_info(std::slice::from_ref(info)),
                    (BindingResource::StorageBuffer(_), Some(info), _) => write
                        .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                        .buffer_info(std::slice::from_ref(info)),
                    (BindingResource::SampledTexture(_), _, Some(info)) => write
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(std::slice::from_ref(info)),
                    (_, _, image_info) => write
                        .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                        .image_info(image_info.as_slice()),
                }
            })
            .collect();

        unsafe { ctx.device.update_descriptor_sets(&writes, &[]) };

        Ok(BindingGroup { descriptor_set, set_index })
    }

    /// Destroy the pools (frees every set) and the default sampler
    pub(crate) fn destroy(&self, ctx: &GpuContext) {
        let mut pools = self.pools.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        unsafe {
            for pool in pools.drain(..) {
                ctx.device.destroy_descriptor_pool(pool, None);
            }
            ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}

fn read_only_layout(texture: &dyn EngineTexture) -> vk::ImageLayout {
    if texture.info().format.is_depth() {
        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
    } else {
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    }
}
