use std::cell::Cell;

/// Leak `make()` the first time `slot` is asked for, then hand back the same
/// reference.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn leak_once<T>(slot: &Cell<Option<&'static T>>, make: impl FnOnce() -> T) -> &'static T {
    if let Some(existing) = slot.get() {
        return existing;
    }
    let leaked: &'static T = Box::leak(Box::new(make()));
    slot.set(Some(leaked));
    leaked
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use std::borrow::Cow;
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use gpu::camera::PerspectiveCamera;
    use gpu::mesh::{MarkerInstance, MeshVertex, StarVertex, unit_box, uv_sphere};
    use gpu::renderer::{RenderCommand, RenderFrame};
    use scene::components::{Blend, Material, RenderLayer, TextureSlot};

    use crate::textures::DecodedTexture;

    thread_local! {
        // Surfaces borrow the instance for their whole life; every mount
        // shares this one.
        static INSTANCE: Cell<Option<&'static ::wgpu::Instance>> = const { Cell::new(None) };
    }

    const DEPTH_FORMAT: ::wgpu::TextureFormat = ::wgpu::TextureFormat::Depth24Plus;
    const SPHERE_SEGMENTS: u32 = 64;
    /// Fixed world-space sun direction; the globe turns under it.
    const LIGHT_DIR: [f32; 4] = [0.6, 0.35, 0.72, 0.0];

    const GLOBALS_WGSL: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    stars_model: mat4x4<f32>,
    light_dir: vec4<f32>,
    camera_pos: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;
"#;

    const SHELL_SHADER: &str = r#"
struct Shell {
    model: mat4x4<f32>,
    tint: vec4<f32>,
    // x: shading mode, y: opacity
    params: vec4<f32>,
};

@group(1) @binding(0) var<uniform> shell: Shell;
@group(1) @binding(1) var base_tex: texture_2d<f32>;
@group(1) @binding(2) var bump_tex: texture_2d<f32>;
@group(1) @binding(3) var tex_sampler: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) world_pos: vec3<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VsOut {
    let world = shell.model * vec4<f32>(position, 1.0);
    let n = normalize((shell.model * vec4<f32>(normal, 0.0)).xyz);
    return VsOut(globals.view_proj * world, n, uv, world.xyz);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let ndotl = max(dot(n, normalize(globals.light_dir.xyz)), 0.0);
    let texel = textureSample(base_tex, tex_sampler, in.uv) * shell.tint;
    let bump = textureSample(bump_tex, tex_sampler, in.uv).r;
    let mode = shell.params.x;
    let opacity = shell.params.y;

    if (mode < 0.5) {
        // Day map.
        let shade = (0.35 + 0.65 * ndotl) * (0.85 + 0.15 * bump);
        return vec4<f32>(texel.rgb * shade, 1.0);
    }
    if (mode < 1.5) {
        // City lights only on the night side.
        return vec4<f32>(texel.rgb * opacity * (1.0 - ndotl), 1.0);
    }
    if (mode < 2.5) {
        return vec4<f32>(texel.rgb * opacity, 1.0);
    }
    // Atmosphere: stronger toward the limb.
    let view_dir = normalize(globals.camera_pos.xyz - in.world_pos);
    let rim = 1.0 - max(dot(n, view_dir), 0.0);
    return vec4<f32>(texel.rgb, opacity * (0.4 + 0.6 * rim));
}
"#;

    const MARKER_SHADER: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) normal: vec3<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(3) m0: vec4<f32>,
    @location(4) m1: vec4<f32>,
    @location(5) m2: vec4<f32>,
    @location(6) m3: vec4<f32>,
    @location(7) color: vec4<f32>,
) -> VsOut {
    let model = mat4x4<f32>(m0, m1, m2, m3);
    let world = model * vec4<f32>(position, 1.0);
    let n = normalize((model * vec4<f32>(normal, 0.0)).xyz);
    return VsOut(globals.view_proj * world, color, n);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let ndotl = max(dot(normalize(in.normal), normalize(globals.light_dir.xyz)), 0.0);
    return vec4<f32>(in.color.rgb * (0.7 + 0.3 * ndotl), in.color.a);
}
"#;

    const STARS_SHADER: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VsOut {
    let world = globals.stars_model * vec4<f32>(position, 1.0);
    return VsOut(globals.view_proj * world, color);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Globals {
        view_proj: [[f32; 4]; 4],
        stars_model: [[f32; 4]; 4],
        light_dir: [f32; 4],
        camera_pos: [f32; 4],
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct ShellUniform {
        model: [[f32; 4]; 4],
        tint: [f32; 4],
        params: [f32; 4],
    }

    #[derive(Debug)]
    struct GpuTexture {
        _texture: ::wgpu::Texture,
        view: ::wgpu::TextureView,
    }

    #[derive(Debug)]
    struct ShellBinding {
        buffer: ::wgpu::Buffer,
        bind_group: ::wgpu::BindGroup,
        textures_generation: u64,
    }

    #[derive(Debug)]
    pub struct WgpuContext {
        pub _instance: &'static ::wgpu::Instance,
        pub surface: ::wgpu::Surface<'static>,
        pub device: ::wgpu::Device,
        pub queue: ::wgpu::Queue,
        pub config: ::wgpu::SurfaceConfiguration,
        pub _canvas: web_sys::HtmlCanvasElement,
        pub clear_color: ::wgpu::Color,
        depth_view: ::wgpu::TextureView,
        globals_buffer: ::wgpu::Buffer,
        globals_bind_group: ::wgpu::BindGroup,
        shell_layout: ::wgpu::BindGroupLayout,
        sampler: ::wgpu::Sampler,
        opaque_pipeline: ::wgpu::RenderPipeline,
        alpha_pipeline: ::wgpu::RenderPipeline,
        additive_pipeline: ::wgpu::RenderPipeline,
        marker_pipeline: ::wgpu::RenderPipeline,
        stars_pipeline: ::wgpu::RenderPipeline,
        sphere_vertex_buffer: ::wgpu::Buffer,
        sphere_index_buffer: ::wgpu::Buffer,
        sphere_index_count: u32,
        box_vertex_buffer: ::wgpu::Buffer,
        box_index_buffer: ::wgpu::Buffer,
        box_index_count: u32,
        marker_instance_buffer: ::wgpu::Buffer,
        marker_capacity: usize,
        stars_vertex_buffer: Option<::wgpu::Buffer>,
        stars_vertex_count: u32,
        textures: BTreeMap<TextureSlot, GpuTexture>,
        white: GpuTexture,
        textures_generation: u64,
        shells: BTreeMap<RenderLayer, ShellBinding>,
    }

    fn create_depth_view(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
    ) -> ::wgpu::TextureView {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("flare-depth"),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        tex.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    fn upload_texture(
        device: &::wgpu::Device,
        queue: &::wgpu::Queue,
        label: &str,
        tex: &DecodedTexture,
    ) -> GpuTexture {
        let texture = device.create_texture_with_data(
            queue,
            &::wgpu::TextureDescriptor {
                label: Some(label),
                size: ::wgpu::Extent3d {
                    width: tex.width,
                    height: tex.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: ::wgpu::TextureDimension::D2,
                format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            ::wgpu::util::TextureDataOrder::LayerMajor,
            &tex.rgba,
        );
        let view = texture.create_view(&::wgpu::TextureViewDescriptor::default());
        GpuTexture {
            _texture: texture,
            view,
        }
    }

    fn additive_blend() -> ::wgpu::BlendState {
        let add = ::wgpu::BlendComponent {
            src_factor: ::wgpu::BlendFactor::One,
            dst_factor: ::wgpu::BlendFactor::One,
            operation: ::wgpu::BlendOperation::Add,
        };
        ::wgpu::BlendState {
            color: add,
            alpha: add,
        }
    }

    fn mesh_vertex_layout() -> ::wgpu::VertexBufferLayout<'static> {
        const ATTRS: [::wgpu::VertexAttribute; 3] =
            ::wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
        ::wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as ::wgpu::BufferAddress,
            step_mode: ::wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }

    fn marker_instance_layout() -> ::wgpu::VertexBufferLayout<'static> {
        const ATTRS: [::wgpu::VertexAttribute; 5] = ::wgpu::vertex_attr_array![
            3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4, 7 => Float32x4
        ];
        ::wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MarkerInstance>() as ::wgpu::BufferAddress,
            step_mode: ::wgpu::VertexStepMode::Instance,
            attributes: &ATTRS,
        }
    }

    fn star_vertex_layout() -> ::wgpu::VertexBufferLayout<'static> {
        const ATTRS: [::wgpu::VertexAttribute; 2] =
            ::wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        ::wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<StarVertex>() as ::wgpu::BufferAddress,
            step_mode: ::wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }

    struct PipelineSpec<'a> {
        label: &'a str,
        layout: &'a ::wgpu::PipelineLayout,
        shader: &'a ::wgpu::ShaderModule,
        buffers: &'a [::wgpu::VertexBufferLayout<'a>],
        topology: ::wgpu::PrimitiveTopology,
        cull_mode: Option<::wgpu::Face>,
        blend: ::wgpu::BlendState,
        depth_write: bool,
    }

    fn create_pipeline(
        device: &::wgpu::Device,
        format: ::wgpu::TextureFormat,
        spec: PipelineSpec<'_>,
    ) -> ::wgpu::RenderPipeline {
        device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some(spec.label),
            layout: Some(spec.layout),
            vertex: ::wgpu::VertexState {
                module: spec.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: spec.buffers,
            },
            fragment: Some(::wgpu::FragmentState {
                module: spec.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format,
                    blend: Some(spec.blend),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: spec.topology,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                cull_mode: spec.cull_mode,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: spec.depth_write,
                depth_compare: ::wgpu::CompareFunction::LessEqual,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn shader_module(device: &::wgpu::Device, label: &str, body: &str) -> ::wgpu::ShaderModule {
        let source = format!("{GLOBALS_WGSL}\n{body}");
        device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
        })
    }

    pub async fn init_wgpu_from_canvas_id(canvas_id: &str) -> Result<WgpuContext, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document missing"))?;
        let canvas_elem = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas missing"))?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let width = canvas_elem.width();
        let height = canvas_elem.height();

        let instance = INSTANCE.with(|slot| {
            super::leak_once(slot, || {
                ::wgpu::Instance::new(&::wgpu::InstanceDescriptor {
                    backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                    ..Default::default()
                })
            })
        });

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas_elem.clone()))
            .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("flare-wgpu-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| JsValue::from_str("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, &config);

        let globals_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("flare-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("flare-globals-bgl"),
            entries: &[::wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: ::wgpu::BindingType::Buffer {
                    ty: ::wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let globals_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("flare-globals-bg"),
            layout: &globals_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let texture_entry = |binding: u32| ::wgpu::BindGroupLayoutEntry {
            binding,
            visibility: ::wgpu::ShaderStages::FRAGMENT,
            ty: ::wgpu::BindingType::Texture {
                sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: ::wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let shell_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("flare-shell-bgl"),
            entries: &[
                ::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: ::wgpu::BindingType::Buffer {
                        ty: ::wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                ::wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
            label: Some("flare-globe-sampler"),
            address_mode_u: ::wgpu::AddressMode::Repeat,
            address_mode_v: ::wgpu::AddressMode::ClampToEdge,
            mag_filter: ::wgpu::FilterMode::Linear,
            min_filter: ::wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shell_pipeline_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("flare-shell-pipeline-layout"),
            bind_group_layouts: &[&globals_layout, &shell_layout],
            immediate_size: 0,
        });
        let globals_pipeline_layout =
            device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                label: Some("flare-globals-pipeline-layout"),
                bind_group_layouts: &[&globals_layout],
                immediate_size: 0,
            });

        let shell_shader = shader_module(&device, "flare-shell-shader", SHELL_SHADER);
        let marker_shader = shader_module(&device, "flare-marker-shader", MARKER_SHADER);
        let stars_shader = shader_module(&device, "flare-stars-shader", STARS_SHADER);

        let mesh_layout = [mesh_vertex_layout()];
        let shell = |label, blend, depth_write| {
            create_pipeline(
                &device,
                config.format,
                PipelineSpec {
                    label,
                    layout: &shell_pipeline_layout,
                    shader: &shell_shader,
                    buffers: &mesh_layout,
                    topology: ::wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(::wgpu::Face::Back),
                    blend,
                    depth_write,
                },
            )
        };
        let opaque_pipeline = shell("flare-opaque-pipeline", ::wgpu::BlendState::REPLACE, true);
        let alpha_pipeline = shell("flare-alpha-pipeline", ::wgpu::BlendState::ALPHA_BLENDING, false);
        let additive_pipeline = shell("flare-additive-pipeline", additive_blend(), false);

        let marker_pipeline = create_pipeline(
            &device,
            config.format,
            PipelineSpec {
                label: "flare-marker-pipeline",
                layout: &globals_pipeline_layout,
                shader: &marker_shader,
                buffers: &[mesh_vertex_layout(), marker_instance_layout()],
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                blend: ::wgpu::BlendState::ALPHA_BLENDING,
                depth_write: true,
            },
        );
        let stars_pipeline = create_pipeline(
            &device,
            config.format,
            PipelineSpec {
                label: "flare-stars-pipeline",
                layout: &globals_pipeline_layout,
                shader: &stars_shader,
                buffers: &[star_vertex_layout()],
                topology: ::wgpu::PrimitiveTopology::PointList,
                cull_mode: None,
                blend: ::wgpu::BlendState::REPLACE,
                depth_write: false,
            },
        );

        let sphere = uv_sphere(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
        let sphere_vertex_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("flare-sphere-vertices"),
            contents: bytemuck::cast_slice(&sphere.vertices),
            usage: ::wgpu::BufferUsages::VERTEX,
        });
        let sphere_index_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("flare-sphere-indices"),
            contents: bytemuck::cast_slice(&sphere.indices),
            usage: ::wgpu::BufferUsages::INDEX,
        });

        let cube = unit_box();
        let box_vertex_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("flare-marker-box-vertices"),
            contents: bytemuck::cast_slice(&cube.vertices),
            usage: ::wgpu::BufferUsages::VERTEX,
        });
        let box_index_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("flare-marker-box-indices"),
            contents: bytemuck::cast_slice(&cube.indices),
            usage: ::wgpu::BufferUsages::INDEX,
        });

        let marker_capacity = 64;
        let marker_instance_buffer = create_instance_buffer(&device, marker_capacity);

        let textures = TextureSlot::ALL
            .iter()
            .map(|&slot| {
                let placeholder = DecodedTexture::placeholder(slot);
                (slot, upload_texture(&device, &queue, "flare-placeholder", &placeholder))
            })
            .collect();
        let white = upload_texture(
            &device,
            &queue,
            "flare-white",
            &DecodedTexture {
                width: 1,
                height: 1,
                rgba: vec![255, 255, 255, 255],
            },
        );

        Ok(WgpuContext {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            _canvas: canvas_elem,
            clear_color: ::wgpu::Color::BLACK,
            depth_view,
            globals_buffer,
            globals_bind_group,
            shell_layout,
            sampler,
            opaque_pipeline,
            alpha_pipeline,
            additive_pipeline,
            marker_pipeline,
            stars_pipeline,
            sphere_vertex_buffer,
            sphere_index_buffer,
            sphere_index_count: sphere.index_count(),
            box_vertex_buffer,
            box_index_buffer,
            box_index_count: cube.index_count(),
            marker_instance_buffer,
            marker_capacity,
            stars_vertex_buffer: None,
            stars_vertex_count: 0,
            textures,
            white,
            textures_generation: 0,
            shells: BTreeMap::new(),
        })
    }

    fn create_instance_buffer(device: &::wgpu::Device, capacity: usize) -> ::wgpu::Buffer {
        device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("flare-marker-instances"),
            size: (capacity.max(1) * std::mem::size_of::<MarkerInstance>()) as u64,
            usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn resize_wgpu(ctx: &mut WgpuContext, width: u32, height: u32) {
        ctx.config.width = width.max(1);
        ctx.config.height = height.max(1);
        ctx.surface.configure(&ctx.device, &ctx.config);
        ctx.depth_view = create_depth_view(&ctx.device, &ctx.config);
    }

    pub fn max_texture_dimension(ctx: &WgpuContext) -> u32 {
        ctx.device.limits().max_texture_dimension_2d
    }

    pub fn set_stars(ctx: &mut WgpuContext, stars: &[StarVertex]) {
        if stars.is_empty() {
            ctx.stars_vertex_buffer = None;
            ctx.stars_vertex_count = 0;
            return;
        }
        ctx.stars_vertex_buffer = Some(ctx.device.create_buffer_init(
            &::wgpu::util::BufferInitDescriptor {
                label: Some("flare-stars-vertices"),
                contents: bytemuck::cast_slice(stars),
                usage: ::wgpu::BufferUsages::VERTEX,
            },
        ));
        ctx.stars_vertex_count = stars.len() as u32;
    }

    /// Swap a placeholder for the decoded asset.
    pub fn set_texture(ctx: &mut WgpuContext, slot: TextureSlot, tex: &DecodedTexture) {
        let uploaded = upload_texture(&ctx.device, &ctx.queue, slot.asset_path(), tex);
        ctx.textures.insert(slot, uploaded);
        ctx.textures_generation += 1;
    }

    /// Shading mode understood by the shell shader.
    fn shell_mode(layer: RenderLayer) -> f32 {
        match layer {
            RenderLayer::Surface => 0.0,
            RenderLayer::NightLights => 1.0,
            RenderLayer::Clouds => 2.0,
            _ => 3.0,
        }
    }

    fn prepare_shell(ctx: &mut WgpuContext, layer: RenderLayer, model: [[f32; 4]; 4], material: &Material) {
        let uniform = ShellUniform {
            model,
            tint: if material.texture.is_some() {
                [1.0, 1.0, 1.0, 1.0]
            } else {
                [material.color.r, material.color.g, material.color.b, 1.0]
            },
            params: [shell_mode(layer), material.opacity, 0.0, 0.0],
        };

        let stale = ctx
            .shells
            .get(&layer)
            .is_none_or(|s| s.textures_generation != ctx.textures_generation);
        if stale {
            let buffer = match ctx.shells.remove(&layer) {
                Some(existing) => existing.buffer,
                None => ctx.device.create_buffer(&::wgpu::BufferDescriptor {
                    label: Some("flare-shell-uniform"),
                    size: std::mem::size_of::<ShellUniform>() as u64,
                    usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
            };
            let base = material
                .texture
                .and_then(|slot| ctx.textures.get(&slot))
                .map_or(&ctx.white.view, |t| &t.view);
            let bump = match layer {
                RenderLayer::Surface => ctx
                    .textures
                    .get(&TextureSlot::BumpMap)
                    .map_or(&ctx.white.view, |t| &t.view),
                _ => &ctx.white.view,
            };
            let bind_group = ctx.device.create_bind_group(&::wgpu::BindGroupDescriptor {
                label: Some("flare-shell-bg"),
                layout: &ctx.shell_layout,
                entries: &[
                    ::wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    ::wgpu::BindGroupEntry {
                        binding: 1,
                        resource: ::wgpu::BindingResource::TextureView(base),
                    },
                    ::wgpu::BindGroupEntry {
                        binding: 2,
                        resource: ::wgpu::BindingResource::TextureView(bump),
                    },
                    ::wgpu::BindGroupEntry {
                        binding: 3,
                        resource: ::wgpu::BindingResource::Sampler(&ctx.sampler),
                    },
                ],
            });
            ctx.shells.insert(
                layer,
                ShellBinding {
                    buffer,
                    bind_group,
                    textures_generation: ctx.textures_generation,
                },
            );
        }

        if let Some(binding) = ctx.shells.get(&layer) {
            ctx.queue
                .write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&uniform));
        }
    }

    fn upload_markers(ctx: &mut WgpuContext, markers: &[MarkerInstance]) {
        if markers.len() > ctx.marker_capacity {
            ctx.marker_capacity = markers.len().next_power_of_two();
            ctx.marker_instance_buffer = create_instance_buffer(&ctx.device, ctx.marker_capacity);
        }
        if !markers.is_empty() {
            ctx.queue
                .write_buffer(&ctx.marker_instance_buffer, 0, bytemuck::cast_slice(markers));
        }
    }

    pub fn render_frame(
        ctx: &mut WgpuContext,
        frame: &RenderFrame,
        camera: &PerspectiveCamera,
    ) -> Result<(), JsValue> {
        let stars_model = frame
            .commands
            .iter()
            .find_map(|c| match c {
                RenderCommand::Stars { model, .. } => Some(*model),
                _ => None,
            })
            .unwrap_or(foundation::math::MAT4_IDENTITY);
        let globals = Globals {
            view_proj: camera.view_proj(),
            stars_model,
            light_dir: LIGHT_DIR,
            camera_pos: {
                let [x, y, z] = camera.position.to_f32();
                [x, y, z, 1.0]
            },
        };
        ctx.queue
            .write_buffer(&ctx.globals_buffer, 0, bytemuck::bytes_of(&globals));

        for command in &frame.commands {
            if let RenderCommand::Sphere {
                layer,
                model,
                material,
            } = command
            {
                prepare_shell(ctx, *layer, *model, material);
            }
        }
        upload_markers(ctx, &frame.markers);

        let surface_frame = ctx
            .surface
            .get_current_texture()
            .map_err(|e| JsValue::from_str(&format!("surface acquire failed: {e}")))?;
        let view = surface_frame
            .texture
            .create_view(&::wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                label: Some("flare-frame-encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("flare-globe-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(ctx.clear_color),
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(1.0),
                        store: ::wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
            rpass.set_bind_group(0, &ctx.globals_bind_group, &[]);

            for command in &frame.commands {
                match command {
                    RenderCommand::Stars { count, .. } => {
                        let Some(buffer) = &ctx.stars_vertex_buffer else {
                            continue;
                        };
                        rpass.set_pipeline(&ctx.stars_pipeline);
                        rpass.set_vertex_buffer(0, buffer.slice(..));
                        rpass.draw(0..(*count).min(ctx.stars_vertex_count), 0..1);
                    }
                    RenderCommand::Sphere {
                        layer, material, ..
                    } => {
                        let Some(shell) = ctx.shells.get(layer) else {
                            continue;
                        };
                        let pipeline = match material.blend {
                            Blend::Opaque => &ctx.opaque_pipeline,
                            Blend::Alpha => &ctx.alpha_pipeline,
                            Blend::Additive => &ctx.additive_pipeline,
                        };
                        rpass.set_pipeline(pipeline);
                        rpass.set_bind_group(1, &shell.bind_group, &[]);
                        rpass.set_vertex_buffer(0, ctx.sphere_vertex_buffer.slice(..));
                        rpass.set_index_buffer(
                            ctx.sphere_index_buffer.slice(..),
                            ::wgpu::IndexFormat::Uint16,
                        );
                        rpass.draw_indexed(0..ctx.sphere_index_count, 0, 0..1);
                    }
                    RenderCommand::Markers { first, count } => {
                        rpass.set_pipeline(&ctx.marker_pipeline);
                        rpass.set_vertex_buffer(0, ctx.box_vertex_buffer.slice(..));
                        rpass.set_vertex_buffer(1, ctx.marker_instance_buffer.slice(..));
                        rpass.set_index_buffer(
                            ctx.box_index_buffer.slice(..),
                            ::wgpu::IndexFormat::Uint16,
                        );
                        rpass.draw_indexed(0..ctx.box_index_count, 0, *first..(*first + *count));
                    }
                }
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        surface_frame.present();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use gpu::camera::PerspectiveCamera;
    use gpu::mesh::StarVertex;
    use gpu::renderer::RenderFrame;
    use scene::components::TextureSlot;
    use wasm_bindgen::prelude::JsValue;

    use crate::textures::DecodedTexture;

    #[derive(Debug, Default)]
    pub struct WgpuContext;

    pub async fn init_wgpu_from_canvas_id(_canvas_id: &str) -> Result<WgpuContext, JsValue> {
        Err(JsValue::from_str(
            "wgpu initialization is only available on wasm32 targets",
        ))
    }

    pub fn resize_wgpu(_ctx: &mut WgpuContext, _width: u32, _height: u32) {}

    pub fn max_texture_dimension(_ctx: &WgpuContext) -> u32 {
        2048
    }

    pub fn set_stars(_ctx: &mut WgpuContext, _stars: &[StarVertex]) {}

    pub fn set_texture(_ctx: &mut WgpuContext, _slot: TextureSlot, _tex: &DecodedTexture) {}

    pub fn render_frame(
        _ctx: &mut WgpuContext,
        _frame: &RenderFrame,
        _camera: &PerspectiveCamera,
    ) -> Result<(), JsValue> {
        Err(JsValue::from_str(
            "wgpu rendering is only available on wasm32 targets",
        ))
    }
}

pub use imp::{
    WgpuContext, init_wgpu_from_canvas_id, max_texture_dimension, render_frame, resize_wgpu,
    set_stars, set_texture,
};
