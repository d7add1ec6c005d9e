// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The kernel and the application contract it drives.

use crate::config::EngineConfig;
use anyhow::{Context, Result};
use ember_core::graphic::{ClearFlags, GraphicService, Object, Rect, Submission, SubmitStats};
use ember_data::scene::Scene;
use ember_infra::create_driver;
use glam::Vec4;
use raw_window_handle::RawWindowHandle;
use std::time::Instant;

/// What the application wants after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    /// Keep running.
    #[default]
    Continue,
    /// Stop the loop after this frame.
    Exit,
}

/// User code driven by a [`Kernel`].
pub trait Application {
    /// Called once before the first frame, after both services exist.
    fn start(&mut self, scene: &mut Scene, graphics: &mut GraphicService) -> Result<()> {
        let _ = (scene, graphics);
        Ok(())
    }

    /// Game logic for one frame, run before the scene's systems.
    fn update(&mut self, scene: &mut Scene, delta: f32) -> Control;

    /// Produces the draws of the display pass.
    fn render(&mut self, graphics: &mut GraphicService) -> Vec<Submission>;

    /// Color the display is cleared to at the start of every frame.
    fn clear_color(&self) -> Vec4 {
        Vec4::new(0.0, 0.0, 0.0, 1.0)
    }
}

/// Owns the engine services and runs the frame loop.
#[derive(Debug)]
pub struct Kernel {
    config: EngineConfig,
    graphics: GraphicService,
    scene: Scene,
    frames: u64,
    last_stats: SubmitStats,
}

impl Kernel {
    /// Builds the services described by `config`.
    ///
    /// ## Arguments
    ///
    /// * `config` - Graphics, scene and loop settings.
    /// * `window` - Native window to present into, or `None` for an
    ///   offscreen display.
    pub fn new(config: EngineConfig, window: Option<RawWindowHandle>) -> Result<Self> {
        log::info!("Starting the Ember kernel...");

        // --- 1. Graphics ---
        let settings = &config.graphic;
        let driver = create_driver(settings.backend, window.is_some());
        let mut graphics = GraphicService::new(driver);
        graphics
            .initialize(window, settings.width, settings.height)
            .context("Failed to initialize the graphics service")?;
        if settings.samples > 1 {
            graphics
                .reset(settings.width, settings.height, settings.samples)
                .context("Failed to configure display multisampling")?;
        }

        // --- 2. Scene ---
        let scene = Scene::new(config.scene).context("Failed to create the scene")?;

        log::info!("Kernel ready");
        Ok(Self {
            config,
            graphics,
            scene,
            frames: 0,
            last_stats: SubmitStats::default(),
        })
    }

    /// The configuration the kernel was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The graphics service.
    pub fn graphics(&self) -> &GraphicService {
        &self.graphics
    }

    /// The graphics service, mutably.
    pub fn graphics_mut(&mut self) -> &mut GraphicService {
        &mut self.graphics
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scene, mutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Submit counters of the last presented frame.
    pub fn last_stats(&self) -> SubmitStats {
        self.last_stats
    }

    /// Resizes the display, keeping the configured sample count.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let samples = self.config.graphic.samples;
        self.graphics
            .reset(width, height, samples)
            .context("Failed to resize the display")?;
        self.config.graphic.width = width;
        self.config.graphic.height = height;
        Ok(())
    }

    /// Runs one frame: update, scene tick, then the display pass.
    pub fn frame<A: Application + ?Sized>(&mut self, app: &mut A, delta: f32) -> Result<Control> {
        let control = app.update(&mut self.scene, delta);
        self.scene.tick(delta);

        let submissions = app.render(&mut self.graphics);
        let settings = &self.config.graphic;
        self.graphics.begin(
            Object::NONE,
            Rect::sized(settings.width, settings.height),
            ClearFlags::ALL,
            app.clear_color(),
            1.0,
            0,
        )?;
        let stats = self.graphics.submit(&submissions)?;
        self.graphics.commit(Object::NONE, settings.vsync)?;

        self.frames += 1;
        self.last_stats = stats;
        log::trace!(
            "Frame {}: {} draws, {} state changes",
            self.frames,
            stats.draws,
            stats.state_changes
        );
        Ok(control)
    }

    /// Starts `app` and runs frames until the configured count is reached or
    /// the application asks to exit.
    pub fn run<A: Application + ?Sized>(&mut self, app: &mut A) -> Result<()> {
        app.start(&mut self.scene, &mut self.graphics)
            .context("Application failed to start")?;

        let limit = self.config.frames;
        let mut ran = 0u64;
        let mut last = Instant::now();
        while limit == 0 || ran < limit {
            let now = Instant::now();
            let delta = now.duration_since(last).as_secs_f32();
            last = now;

            ran += 1;
            if self.frame(app, delta)? == Control::Exit {
                log::info!("Application requested exit");
                break;
            }
        }

        log::info!("Kernel stopped after {} frame(s)", self.frames);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::graphic::{
        BufferDescriptor, BufferUsage, GraphicsBackend, PipelineDescriptor, Primitive, Stream,
        VertexAttribute, VertexFormat,
    };
    use ember_data::ecs::Component;

    // --- DUMMY APPLICATION FOR TESTING ---

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Age(f32);
    impl Component for Age {}

    #[derive(Default)]
    struct Triangle {
        updates: u32,
        exit_after: Option<u32>,
        pipeline: Object,
        vertices: Object,
    }

    impl Application for Triangle {
        fn start(&mut self, scene: &mut Scene, graphics: &mut GraphicService) -> Result<()> {
            scene.register_component::<Age>("Age")?;
            let entity = scene.create_entity();
            scene.world_mut().set(entity, Age(0.0))?;
            scene.create_system::<&mut Age, _>("Aging", |world, query, delta| {
                for (_, age) in query.iter(world) {
                    age.0 += delta;
                }
            })?;

            self.vertices = graphics.create_buffer(&BufferDescriptor {
                usage: BufferUsage::Vertex,
                size: 36,
                data: None,
            })?;
            self.pipeline = graphics.create_pipeline(&PipelineDescriptor {
                vertex_shader: vec![1, 2, 3],
                pixel_shader: vec![4, 5, 6],
                attributes: vec![VertexAttribute {
                    semantic: "POSITION".into(),
                    index: 0,
                    format: VertexFormat::Float32x3,
                    stream: 0,
                    offset: 0,
                    per_instance: false,
                }],
                ..Default::default()
            })?;
            Ok(())
        }

        fn update(&mut self, _scene: &mut Scene, _delta: f32) -> Control {
            self.updates += 1;
            match self.exit_after {
                Some(limit) if self.updates >= limit => Control::Exit,
                _ => Control::Continue,
            }
        }

        fn render(&mut self, _graphics: &mut GraphicService) -> Vec<Submission> {
            let mut submission = Submission {
                pipeline: self.pipeline,
                scissor: Rect::sized(64, 64),
                primitive: Primitive {
                    count: 3,
                    ..Default::default()
                },
                ..Default::default()
            };
            submission.vertices[0] = Stream {
                buffer: self.vertices,
                offset: 0,
                stride: 12,
            };
            vec![submission]
        }
    }

    fn config(frames: u64) -> EngineConfig {
        let mut config = EngineConfig {
            frames,
            ..Default::default()
        };
        config.graphic.backend = Some(GraphicsBackend::Headless);
        config.graphic.width = 64;
        config.graphic.height = 64;
        config.scene.threads = 1;
        config
    }

    #[test]
    fn test_run_stops_after_configured_frames() {
        // --- 1. ARRANGE ---
        let mut kernel = Kernel::new(config(3), None).unwrap();
        let mut app = Triangle::default();

        // --- 2. ACT ---
        kernel.run(&mut app).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(app.updates, 3);
        assert_eq!(kernel.frames(), 3);
        assert_eq!(kernel.last_stats().draws, 1);
        assert_eq!(
            kernel.graphics().capabilities().backend,
            GraphicsBackend::Headless
        );
    }

    #[test]
    fn test_unbounded_run_ends_on_exit() {
        let mut kernel = Kernel::new(config(0), None).unwrap();
        let mut app = Triangle {
            exit_after: Some(5),
            ..Default::default()
        };

        kernel.run(&mut app).unwrap();

        assert_eq!(kernel.frames(), 5, "the exiting frame is still presented");
    }

    #[test]
    fn test_frames_tick_scene_systems() {
        let mut kernel = Kernel::new(config(0), None).unwrap();
        let mut app = Triangle::default();
        app.start(&mut kernel.scene, &mut kernel.graphics).unwrap();

        kernel.frame(&mut app, 0.5).unwrap();
        kernel.frame(&mut app, 0.25).unwrap();

        let query = kernel.scene().create_query::<&Age>().unwrap();
        let ages: Vec<f32> = query
            .iter(kernel.scene_mut().world_mut())
            .map(|(_, age)| age.0)
            .collect();
        assert_eq!(ages, vec![0.75]);
        assert_eq!(
            kernel.last_stats().state_changes,
            9,
            "every frame starts its pass from a fresh diff"
        );
    }

    #[test]
    fn test_resize_updates_the_display_viewport() {
        let mut kernel = Kernel::new(config(1), None).unwrap();

        kernel.resize(32, 16).unwrap();

        assert_eq!(kernel.config().graphic.width, 32);
        assert_eq!(kernel.config().graphic.height, 16);
        assert_eq!(kernel.graphics().capabilities().samples, 1);
    }
}
