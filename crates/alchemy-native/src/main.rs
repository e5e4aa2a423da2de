use std::sync::Arc;
use std::time::Duration;
use wgpu::util::DeviceExt;
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use alchemy_core::field::{FieldConfig, ParticleInstance};
use alchemy_core::scry::{scry, PaletteReader};
use alchemy_core::{
    drop_zone_center, pose_cell, AlchemySession, Camera, HandPose, MixEvent, PoseSource,
    PoseWriter, RecipeBook, SessionConfig, SessionEvent, DROP_ZONE_RADIUS, PARTICLE_COUNT,
};
use glam::Vec2;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

// Room for trail, cursor, element orbs and the drop ring on top of the particles.
const OVERLAY_CAPACITY: usize = 256;
const ORB_SIZE: f32 = 0.55;
const DROP_RING_DOTS: usize = 32;
// Pinch strength gained or lost per second while the button changes state.
const PINCH_RAMP_PER_SEC: f32 = 5.0;

#[derive(Debug)]
struct Args {
    particles: usize,
    seed: u64,
    latency: Duration,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut args = Self {
            particles: PARTICLE_COUNT,
            seed: 42,
            latency: Duration::from_millis(600),
        };
        let mut it = std::env::args().skip(1);
        while let Some(flag) = it.next() {
            let mut value = || {
                it.next()
                    .ok_or_else(|| anyhow::anyhow!("{flag} expects a value"))
            };
            match flag.as_str() {
                "--particles" => args.particles = value()?.parse()?,
                "--seed" => args.seed = value()?.parse()?,
                "--latency-ms" => args.latency = Duration::from_millis(value()?.parse()?),
                other => anyhow::bail!("unknown argument: {other}"),
            }
        }
        Ok(args)
    }
}

/// Stands in for a hand tracker: the cursor is the index tip, the left
/// button closes the pinch gradually.
#[derive(Default)]
struct MousePoseSource {
    uv: Vec2,
    inside: bool,
    hand_up: bool,
    pressed: bool,
    pinch: f32,
}

impl MousePoseSource {
    fn new() -> Self {
        Self {
            uv: Vec2::splat(0.5),
            hand_up: true,
            ..Self::default()
        }
    }

    fn step(&mut self, dt_sec: f32) {
        let target = if self.pressed { 1.0 } else { 0.0 };
        let step = PINCH_RAMP_PER_SEC * dt_sec;
        self.pinch = if self.pinch < target {
            (self.pinch + step).min(target)
        } else {
            (self.pinch - step).max(target)
        };
    }
}

impl PoseSource for MousePoseSource {
    fn current_pose(&mut self) -> HandPose {
        if self.inside && self.hand_up {
            HandPose::at(self.uv.x, self.uv.y, self.pinch)
        } else {
            HandPose::inactive()
        }
    }
}

struct GpuState<'w> {
    window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
    instance_vb: wgpu::Buffer,
    instance_capacity: usize,
    bind_group: wgpu::BindGroup,
    camera: Camera,
    last_frame: instant::Instant,
    session: AlchemySession,
    poses: PoseWriter,
    mouse: MousePoseSource,
    instances: Vec<ParticleInstance>,
}

impl<'w> GpuState<'w> {
    async fn new(
        window: &'w winit::window::Window,
        session: AlchemySession,
        poses: PoseWriter,
    ) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particles"),
            source: wgpu::ShaderSource::Wgsl(alchemy_core::PARTICLES_WGSL.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniforms"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // Quad vertices for two triangles
        let quad_vertices: [f32; 12] = [
            -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vb"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let instance_capacity = session.field().instances().len() + OVERLAY_CAPACITY;
        let instance_vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_vb"),
            size: (std::mem::size_of::<ParticleInstance>() * instance_capacity) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffers = [
            // slot 0: quad corners
            wgpu::VertexBufferLayout {
                array_stride: (std::mem::size_of::<f32>() * 2) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            // slot 1: ParticleInstance
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<ParticleInstance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 1,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32,
                        offset: 12,
                        shader_location: 2,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x4,
                        offset: 16,
                        shader_location: 3,
                    },
                ],
            },
        ];
        // Additive: overlapping particles brighten instead of occluding.
        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(additive),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        let mut state = Self {
            window,
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffer,
            quad_vb,
            instance_vb,
            instance_capacity,
            bind_group,
            camera: Camera::default(),
            last_frame: instant::Instant::now(),
            session,
            poses,
            mouse: MousePoseSource::new(),
            instances: Vec::with_capacity(instance_capacity),
        };
        state.resize(size);
        Ok(state)
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.camera.aspect = new_size.width as f32 / new_size.height as f32;
        self.session.field_mut().set_viewport(self.camera.viewport());
    }

    fn cursor_moved(&mut self, x: f64, y: f64) {
        self.mouse.inside = true;
        self.mouse.uv = Vec2::new(
            x as f32 / self.config.width as f32,
            y as f32 / self.config.height as f32,
        );
    }

    fn scry(&self) {
        let vision = scry(self.session.field(), &PaletteReader);
        log::info!("[scry] {vision}");
    }

    /// Element orbs and the drop-zone ring, in world space.
    fn emit_scene_glyphs(&mut self) {
        let viewport = self.camera.viewport();
        let machine = self.session.machine();
        let hovered = machine.hovered().map(|e| e.id);
        let held = machine.held().map(|e| e.id);
        let hand = self.session.field().hand().position;

        let center = drop_zone_center();
        for k in 0..DROP_RING_DOTS {
            let a = k as f32 * std::f32::consts::TAU / DROP_RING_DOTS as f32;
            let p = viewport.to_world(center + Vec2::from_angle(a) * DROP_ZONE_RADIUS);
            let alpha = if held.is_some() { 0.5 } else { 0.15 };
            self.instances.push(ParticleInstance {
                pos: [p.x, p.y, 0.0],
                size: 0.08,
                color: [0.66, 0.33, 0.97, alpha],
            });
        }

        for element in machine.targets() {
            let (p, size) = if Some(element.id) == held {
                (hand, ORB_SIZE * 0.8)
            } else if Some(element.id) == hovered {
                (viewport.to_world(element.position()), ORB_SIZE * 1.3)
            } else {
                (viewport.to_world(element.position()), ORB_SIZE)
            };
            self.instances.push(ParticleInstance {
                pos: [p.x, p.y, 0.0],
                size,
                color: element.accent().extend(0.9).to_array(),
            });
        }
    }

    fn handle_events(&self, events: Vec<SessionEvent>) {
        for ev in events {
            if let SessionEvent::Mix(MixEvent::Composed(name)) = ev {
                self.window.set_title(&format!("Fluid Alchemy: {name}"));
            }
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = instant::Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;

        self.mouse.step(dt.as_secs_f32());
        self.poses.pump(&mut self.mouse);
        let events = self.session.advance(dt);
        self.handle_events(events);

        self.instances.clear();
        self.instances
            .extend_from_slice(self.session.field().instances());
        self.emit_scene_glyphs();
        self.session.field().emit_overlay(&mut self.instances);
        self.instances.truncate(self.instance_capacity);

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: self.camera.view_proj().to_cols_array_2d(),
            }),
        );
        self.queue
            .write_buffer(&self.instance_vb, 0, bytemuck::cast_slice(&self.instances));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rpass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
            rpass.set_vertex_buffer(1, self.instance_vb.slice(..));
            rpass.draw(0..6, 0..self.instances.len() as u32);
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse()?;
    log::info!("[native] {args:?}");

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Fluid Alchemy")
        .build(&event_loop)?;

    // Rest positions are spawned once, so sample them in the real window.
    let size = window.inner_size();
    let camera = Camera {
        aspect: size.width.max(1) as f32 / size.height.max(1) as f32,
        ..Camera::default()
    };

    let composer = Arc::new(RecipeBook::builtin()?.with_latency(args.latency));
    let (poses, pose_reader) = pose_cell();
    let session = AlchemySession::new(
        pose_reader,
        composer,
        SessionConfig {
            field: FieldConfig {
                count: args.particles,
                seed: args.seed,
                viewport: camera.viewport(),
            },
            ..SessionConfig::default()
        },
    );

    let mut state = pollster::block_on(GpuState::new(&window, session, poses))?;
    log::info!("[native] hold the left button to pinch, H hides the hand, S scries");

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::CursorMoved { position, .. } => {
                state.cursor_moved(position.x, position.y)
            }
            WindowEvent::CursorLeft { .. } => state.mouse.inside = false,
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => state.mouse.pressed = button_state == ElementState::Pressed,
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match logical_key.as_ref() {
                Key::Named(NamedKey::Escape) => elwt.exit(),
                Key::Character("h") | Key::Character("H") => {
                    state.mouse.hand_up = !state.mouse.hand_up
                }
                Key::Character("s") | Key::Character("S") => state.scry(),
                _ => {}
            },
            _ => {}
        },
        Event::AboutToWait => match state.render() {
            Ok(_) => state.window.request_redraw(),
            Err(wgpu::SurfaceError::Lost) => state.resize(state.window.inner_size()),
            Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
            Err(_) => {}
        },
        _ => {}
    })?;
    Ok(())
}
