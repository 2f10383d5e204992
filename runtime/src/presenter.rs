//! Window presentation: backbuffer upload and scaled blit
//!
//! The loop renders into a CPU pixel buffer. Each present uploads that
//! buffer to a GPU texture and draws one fullscreen triangle into the
//! window surface, scaled per the configured mode.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use winit::window::Window;

use framelock_core::{PixelFrame, Presenter};

use crate::config::ScaleMode;

pub struct SurfacePresenter {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    /// GPU copy of the CPU backbuffer, sampled by the blit pass
    backbuffer: wgpu::Texture,
    backbuffer_size: (u32, u32),
    blit_pipeline: wgpu::RenderPipeline,
    blit_bind_group: wgpu::BindGroup,
    scale_mode: ScaleMode,
    /// Set when presentation hits an unrecoverable device error
    fatal: bool,
}

impl SurfacePresenter {
    /// Create a presenter for the given window.
    pub fn new(
        window: Arc<Window>,
        backbuffer_width: u32,
        backbuffer_height: u32,
        scale_mode: ScaleMode,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("Failed to find suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Framelock Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            experimental_features: Default::default(),
            trace: wgpu::Trace::Off,
        }))
        .context("Failed to create GPU device")?;

        let size = window.inner_size();
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
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            // Shallow swap chain, the loop does its own pacing
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &surface_config);

        // Pixels are packed 0x00RRGGBB, so the little-endian byte order
        // B,G,R,X matches the Bgra8 texel layout
        let backbuffer = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Backbuffer"),
            size: wgpu::Extent3d {
                width: backbuffer_width,
                height: backbuffer_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let backbuffer_view = backbuffer.create_view(&wgpu::TextureViewDescriptor::default());

        let (blit_pipeline, blit_bind_group) =
            Self::create_blit_pipeline(&device, surface_format, &backbuffer_view);

        info!(
            "Presenter initialized: {}x{} window, {}x{} backbuffer, format: {:?}",
            surface_config.width,
            surface_config.height,
            backbuffer_width,
            backbuffer_height,
            surface_format
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            backbuffer,
            backbuffer_size: (backbuffer_width, backbuffer_height),
            blit_pipeline,
            blit_bind_group,
            scale_mode,
            fatal: false,
        })
    }

    /// Create the blit pipeline for scaling the backbuffer to the window
    fn create_blit_pipeline(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        backbuffer_view: &wgpu::TextureView,
    ) -> (wgpu::RenderPipeline, wgpu::BindGroup) {
        // Nearest neighbor keeps pixel edges sharp at integer scales
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/blit.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Bind Group Layout"),
            entries: &[
                // Backbuffer texture
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(backbuffer_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        (pipeline, bind_group)
    }

    /// Upload the frame and blit it to the window.
    ///
    /// Lost or outdated surfaces are reconfigured and the frame is
    /// skipped; the next present draws normally.
    fn present_frame(&mut self, frame: &PixelFrame) {
        if self.fatal {
            return;
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.backbuffer,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(frame.pixels()),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.pitch_bytes()),
                rows_per_image: Some(frame.height()),
            },
            wgpu::Extent3d {
                width: frame.width(),
                height: frame.height(),
                depth_or_array_layers: 1,
            },
        );

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("Surface out of memory, stopping presentation");
                self.fatal = true;
                return;
            }
            Err(err) => {
                warn!("Skipping frame: {}", err);
                return;
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blit Encoder"),
            });

        let (x, y, width, height) = compute_viewport(
            self.scale_mode,
            self.backbuffer_size,
            (self.surface_config.width, self.surface_config.height),
        );

        {
            let mut blit_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            blit_pass.set_pipeline(&self.blit_pipeline);
            blit_pass.set_bind_group(0, &self.blit_bind_group, &[]);
            blit_pass.set_viewport(x, y, width, height, 0.0, 1.0);
            blit_pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Resize the surface
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
            debug!("Surface resized to {}x{}", width, height);
        }
    }

    /// False once presentation hit an unrecoverable device error
    pub fn is_healthy(&self) -> bool {
        !self.fatal
    }
}

impl Presenter for SurfacePresenter {
    fn present(&mut self, frame: &PixelFrame) {
        self.present_frame(frame);
    }
}

/// Viewport rectangle for the blit, in window pixels
fn compute_viewport(
    scale_mode: ScaleMode,
    backbuffer: (u32, u32),
    window: (u32, u32),
) -> (f32, f32, f32, f32) {
    let render_width = backbuffer.0 as f32;
    let render_height = backbuffer.1 as f32;
    let window_width = window.0 as f32;
    let window_height = window.1 as f32;

    match scale_mode {
        ScaleMode::Stretch => (0.0, 0.0, window_width, window_height),
        ScaleMode::Fit => {
            // Largest scale that fits within the window, keeping aspect ratio
            let scale = (window_width / render_width).min(window_height / render_height);
            let scaled_width = render_width * scale;
            let scaled_height = render_height * scale;

            // Center the viewport (letterbox/pillarbox)
            let x = (window_width - scaled_width) / 2.0;
            let y = (window_height - scaled_height) / 2.0;
            (x, y, scaled_width, scaled_height)
        }
        ScaleMode::PixelPerfect => {
            // Largest integer scale that fits both dimensions, at least 1x
            let scale_x = (window_width / render_width).floor();
            let scale_y = (window_height / render_height).floor();
            let scale = scale_x.min(scale_y).max(1.0);
            let scaled_width = render_width * scale;
            let scaled_height = render_height * scale;

            let x = (window_width - scaled_width) / 2.0;
            let y = (window_height - scaled_height) / 2.0;
            (x, y, scaled_width, scaled_height)
        }
    }
}
