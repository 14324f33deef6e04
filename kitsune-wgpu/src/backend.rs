use std::borrow::Cow;

use glam::{Mat4, Vec3};
use kitsune_gpu_shared::math::normal_matrix;
use kitsune_gpu_shared::shaders::{SHADOW_DEPTH_WGSL, STAGE_WGSL};
use kitsune_gpu_shared::uniforms::{FrameUniforms, ObjectUniforms, SkinnedVertex, MAX_JOINTS};
use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::handle::{Handle, HandleStore};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SHADOW_DEPTH_BIAS: f32 = 0.0015;

/// GPU mesh with interleaved vertex buffer and index buffer.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// GPU texture with associated view and sampler.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

/// A drawable: mesh + per-object uniforms + joint palette + base color texture.
pub struct GpuObject {
    pub mesh: Handle<GpuMesh>,
    pub uniform_buffer: wgpu::Buffer,
    pub joint_buffer: wgpu::Buffer,
    pub joint_capacity: usize,
    pub bind_group: wgpu::BindGroup,
    pub has_texture: bool,
    pub casts_shadow: bool,
    pub visible: bool,
}

/// Single shadow map for the directional light.
pub struct ShadowMap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub resolution: u32,
}

struct DepthTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Surface parameters of one object, written each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    /// Linear rgba.
    pub base_color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub receives_shadow: bool,
    pub casts_shadow: bool,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_color: [1.0; 4],
            metalness: 0.0,
            roughness: 1.0,
            receives_shadow: true,
            casts_shadow: true,
        }
    }
}

/// Light setup for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingDesc {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub light_color: [f32; 3],
    pub light_intensity: f32,
    /// Unit vector from surfaces towards the light.
    pub light_direction: Vec3,
    pub light_view_proj: Mat4,
    pub shadows_enabled: bool,
}

/// Everything the backend needs to draw one frame.
pub struct FrameDesc<'a> {
    pub view_proj: Mat4,
    pub camera_position: Vec3,
    pub lighting: LightingDesc,
    /// Linear rgb.
    pub clear_color: [f64; 3],
    pub objects: &'a [Handle<GpuObject>],
}

/// Stage renderer state. Owns every wgpu resource.
pub struct WgpuBackend {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub width: u32,
    pub height: u32,

    pub meshes: HandleStore<GpuMesh>,
    pub textures: HandleStore<GpuTexture>,
    pub objects: HandleStore<GpuObject>,

    depth: DepthTarget,
    pub shadow: ShadowMap,

    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    shadow_frame_bind_group: wgpu::BindGroup,
    object_bind_group_layout: wgpu::BindGroupLayout,
    stage_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    white_texture: Handle<GpuTexture>,
}

impl WgpuBackend {
    /// Create the backend on a window or canvas surface.
    ///
    /// Async because adapter/device requests cannot block in the browser;
    /// native hosts drive it with `pollster`.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        shadow_map_size: u32,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(target)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Kitsune Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let width = width.max(1);
        let height = height.max(1);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth = create_depth_target(&device, width, height);
        let shadow = create_shadow_map(&device, shadow_map_size.max(1));

        // Per-frame uniforms, shared by both passes
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Frame Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                    // binding 1: shadow depth texture
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Depth,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // binding 2: comparison sampler
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                        count: None,
                    },
                ],
            });

        // The shadow pass cannot bind the texture it renders into
        let shadow_frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Shadow Frame Bind Group Layout"),
                entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
            });

        let object_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Object Bind Group Layout"),
                entries: &[
                    // binding 0: ObjectUniforms
                    uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                    // binding 1: joint palette
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // binding 2: base color map
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // binding 3: sampler
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow.sampler),
                },
            ],
        });

        let shadow_frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Frame Bind Group"),
            layout: &shadow_frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let stage_pipeline = create_stage_pipeline(
            &device,
            &frame_bind_group_layout,
            &object_bind_group_layout,
            surface_format,
        );
        let shadow_pipeline = create_shadow_pipeline(
            &device,
            &shadow_frame_bind_group_layout,
            &object_bind_group_layout,
        );

        log::info!(
            "wgpu backend initialized: {} ({}), surface {width}x{height} {surface_format:?}",
            adapter.get_info().name,
            adapter.get_info().backend.to_str()
        );

        let mut textures = HandleStore::new();
        let white_texture =
            textures.insert(create_texture(&device, &queue, &[255, 255, 255, 255], 1, 1, 4)?);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface,
            surface_config,
            width,
            height,
            meshes: HandleStore::new(),
            textures,
            objects: HandleStore::new(),
            depth,
            shadow,
            frame_buffer,
            frame_bind_group,
            shadow_frame_bind_group,
            object_bind_group_layout,
            stage_pipeline,
            shadow_pipeline,
            white_texture,
        })
    }

    /// Resize the surface and the depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
            self.depth = create_depth_target(&self.device, width, height);
        }
    }

    /// Upload an interleaved mesh.
    pub fn upload_mesh(&mut self, vertices: &[SkinnedVertex], indices: &[u32]) -> Handle<GpuMesh> {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        self.meshes.insert(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }

    /// Upload 8-bit texture data (1, 3 or 4 channels) as sRGB RGBA.
    pub fn upload_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        channels: u32,
    ) -> Result<Handle<GpuTexture>, RenderError> {
        let texture = create_texture(&self.device, &self.queue, pixels, width, height, channels)?;
        Ok(self.textures.insert(texture))
    }

    /// Create a drawable over an uploaded mesh with room for `joint_count` joints.
    ///
    /// The palette starts as identity so rigid meshes need no further setup.
    pub fn create_object(
        &mut self,
        mesh: Handle<GpuMesh>,
        texture: Option<Handle<GpuTexture>>,
        joint_count: usize,
    ) -> Result<Handle<GpuObject>, RenderError> {
        if self.meshes.get(mesh).is_none() {
            return Err(RenderError::UnknownMesh(mesh.id()));
        }

        let joint_capacity = joint_count.clamp(1, MAX_JOINTS);
        let identity = vec![Mat4::IDENTITY.to_cols_array_2d(); joint_capacity];
        let joint_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Joint Palette"),
                contents: bytemuck::cast_slice(&identity),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            });

        let has_texture = texture.is_some_and(|h| self.textures.get(h).is_some());
        let uniforms = object_uniforms(&Mat4::IDENTITY, &MaterialParams::default(), has_texture);
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Object Uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let bound_texture = texture.filter(|h| self.textures.get(*h).is_some());
        let texture_handle = bound_texture.unwrap_or(self.white_texture);
        let gpu_texture = self
            .textures
            .get(texture_handle)
            .ok_or(RenderError::UnknownTexture(texture_handle.id()))?;

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout: &self.object_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: joint_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&gpu_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&gpu_texture.sampler),
                },
            ],
        });

        Ok(self.objects.insert(GpuObject {
            mesh,
            uniform_buffer,
            joint_buffer,
            joint_capacity,
            bind_group,
            has_texture: bound_texture.is_some(),
            casts_shadow: true,
            visible: true,
        }))
    }

    /// Write an object's transform, material and (optionally) joint palette.
    ///
    /// Palettes longer than the object's capacity are truncated.
    pub fn update_object(
        &mut self,
        object: Handle<GpuObject>,
        model: Mat4,
        material: &MaterialParams,
        joints: &[Mat4],
    ) {
        let Some(obj) = self.objects.get_mut(object) else {
            log::warn!("update_object on unknown {object:?}");
            return;
        };

        let uniforms = object_uniforms(&model, material, obj.has_texture);
        self.queue
            .write_buffer(&obj.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        obj.casts_shadow = material.casts_shadow;
        obj.visible = true;

        if !joints.is_empty() {
            let palette: Vec<[[f32; 4]; 4]> = joints
                .iter()
                .take(obj.joint_capacity)
                .map(|m| m.to_cols_array_2d())
                .collect();
            self.queue
                .write_buffer(&obj.joint_buffer, 0, bytemuck::cast_slice(&palette));
        }
    }

    /// Render the shadow pass followed by the lit pass and present.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render(&mut self, frame: &FrameDesc<'_>) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost/outdated, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = frame_uniforms(frame, self.shadow.resolution);
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if frame.lighting.shadows_enabled {
                shadow_pass.set_pipeline(&self.shadow_pipeline);
                shadow_pass.set_bind_group(0, &self.shadow_frame_bind_group, &[]);
                for handle in frame.objects {
                    let Some(obj) = self.objects.get(*handle) else {
                        continue;
                    };
                    if !obj.casts_shadow || !obj.visible {
                        continue;
                    }
                    let Some(mesh) = self.meshes.get(obj.mesh) else {
                        continue;
                    };
                    shadow_pass.set_bind_group(1, &obj.bind_group, &[]);
                    shadow_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    shadow_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    shadow_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        {
            let [r, g, b] = frame.clear_color;
            let mut stage_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Stage Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            stage_pass.set_pipeline(&self.stage_pipeline);
            stage_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for handle in frame.objects {
                let Some(obj) = self.objects.get(*handle) else {
                    continue;
                };
                if !obj.visible {
                    continue;
                }
                let Some(mesh) = self.meshes.get(obj.mesh) else {
                    continue;
                };
                stage_pass.set_bind_group(1, &obj.bind_group, &[]);
                stage_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                stage_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                stage_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Destroy an object; its mesh and texture stay alive.
    pub fn destroy_object(&mut self, handle: Handle<GpuObject>) {
        self.objects.remove(handle);
    }

    pub fn destroy_mesh(&mut self, handle: Handle<GpuMesh>) {
        self.meshes.remove(handle);
    }

    pub fn destroy_texture(&mut self, handle: Handle<GpuTexture>) {
        if handle != self.white_texture {
            self.textures.remove(handle);
        }
    }
}

/// Convert tightly packed 1/3/4-channel pixels to RGBA8.
pub fn expand_to_rgba(
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: u32,
) -> Result<Cow<'_, [u8]>, RenderError> {
    let expected = (width * height * channels) as usize;
    if !matches!(channels, 1 | 3 | 4) {
        return Err(RenderError::UnsupportedChannels(channels));
    }
    if pixels.len() != expected {
        return Err(RenderError::TextureSize {
            expected,
            actual: pixels.len(),
        });
    }

    Ok(match channels {
        4 => Cow::Borrowed(pixels),
        3 => Cow::Owned(
            pixels
                .chunks(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
                .collect(),
        ),
        _ => Cow::Owned(pixels.iter().flat_map(|&g| [g, g, g, 255]).collect()),
    })
}

fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: u32,
) -> Result<GpuTexture, RenderError> {
    let data = expand_to_rgba(pixels, width, height, channels)?;

    let texture_size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Base Color Texture"),
        size: texture_size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        texture_size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Texture Sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    Ok(GpuTexture {
        texture,
        view,
        sampler,
        width,
        height,
    })
}

fn object_uniforms(model: &Mat4, material: &MaterialParams, has_texture: bool) -> ObjectUniforms {
    ObjectUniforms {
        model: model.to_cols_array_2d(),
        normal_matrix: normal_matrix(model).to_cols_array_2d(),
        base_color: material.base_color,
        material: [
            material.metalness,
            material.roughness,
            if has_texture { 1.0 } else { 0.0 },
            if material.receives_shadow { 1.0 } else { 0.0 },
        ],
    }
}

fn frame_uniforms(frame: &FrameDesc<'_>, shadow_resolution: u32) -> FrameUniforms {
    let l = &frame.lighting;
    FrameUniforms {
        view_proj: frame.view_proj.to_cols_array_2d(),
        light_view_proj: l.light_view_proj.to_cols_array_2d(),
        camera_position: frame.camera_position.extend(1.0).to_array(),
        light_direction: l.light_direction.extend(0.0).to_array(),
        light_color: [l.light_color[0], l.light_color[1], l.light_color[2], l.light_intensity],
        ambient: [
            l.ambient_color[0],
            l.ambient_color[1],
            l.ambient_color[2],
            l.ambient_intensity,
        ],
        shadow_params: [
            1.0 / shadow_resolution as f32,
            SHADOW_DEPTH_BIAS,
            if l.shadows_enabled { 1.0 } else { 0.0 },
            0.0,
        ],
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Uint32x4,
        4 => Float32x4
    ];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SkinnedVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

fn create_depth_target(device: &wgpu::Device, width: u32, height: u32) -> DepthTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Buffer"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    DepthTarget {
        _texture: texture,
        view,
    }
}

fn create_shadow_map(device: &wgpu::Device, resolution: u32) -> ShadowMap {
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Shadow Sampler"),
        compare: Some(wgpu::CompareFunction::LessEqual),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Shadow Map"),
        size: wgpu::Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    ShadowMap {
        texture,
        view,
        sampler,
        resolution,
    }
}

fn create_stage_pipeline(
    device: &wgpu::Device,
    frame_layout: &wgpu::BindGroupLayout,
    object_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Stage Shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(STAGE_WGSL)),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Stage Pipeline Layout"),
        bind_group_layouts: &[frame_layout, object_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Stage Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_shadow_pipeline(
    device: &wgpu::Device,
    frame_layout: &wgpu::BindGroupLayout,
    object_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Depth Shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SHADOW_DEPTH_WGSL)),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[frame_layout, object_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Shadow Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── expand_to_rgba ──

    #[test]
    fn test_rgba_passthrough_borrows() {
        let px = [1, 2, 3, 4, 5, 6, 7, 8];
        let out = expand_to_rgba(&px, 2, 1, 4).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(&*out, &px);
    }

    #[test]
    fn test_rgb_gets_opaque_alpha() {
        let out = expand_to_rgba(&[10, 20, 30], 1, 1, 3).unwrap();
        assert_eq!(&*out, &[10, 20, 30, 255]);
    }

    #[test]
    fn test_gray_is_splatted() {
        let out = expand_to_rgba(&[7, 9], 2, 1, 1).unwrap();
        assert_eq!(&*out, &[7, 7, 7, 255, 9, 9, 9, 255]);
    }

    #[test]
    fn test_two_channels_rejected() {
        let err = expand_to_rgba(&[0, 0], 1, 1, 2).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedChannels(2)));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let err = expand_to_rgba(&[0, 0, 0], 2, 2, 4).unwrap_err();
        assert!(matches!(err, RenderError::TextureSize { expected: 16, actual: 3 }));
    }

    // ── uniform packing ──

    #[test]
    fn test_object_uniform_flags() {
        let material = MaterialParams {
            receives_shadow: false,
            ..Default::default()
        };
        let u = object_uniforms(&Mat4::IDENTITY, &material, true);
        assert_eq!(u.material[2], 1.0);
        assert_eq!(u.material[3], 0.0);
    }

    #[test]
    fn test_frame_uniform_shadow_params() {
        let frame = FrameDesc {
            view_proj: Mat4::IDENTITY,
            camera_position: Vec3::new(3.0, 3.0, 3.0),
            lighting: LightingDesc {
                ambient_color: [1.0; 3],
                ambient_intensity: 2.4,
                light_color: [1.0; 3],
                light_intensity: 1.8,
                light_direction: Vec3::Y,
                light_view_proj: Mat4::IDENTITY,
                shadows_enabled: true,
            },
            clear_color: [0.0; 3],
            objects: &[],
        };
        let u = frame_uniforms(&frame, 1024);
        assert_eq!(u.shadow_params[0], 1.0 / 1024.0);
        assert_eq!(u.shadow_params[2], 1.0);
        assert_eq!(u.light_color[3], 1.8);
        assert_eq!(u.ambient[3], 2.4);
        assert_eq!(u.camera_position, [3.0, 3.0, 3.0, 1.0]);
    }
}
