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

// Ember Sandbox
// Runs the kernel headlessly and round-trips the scene through the binary format.

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use ember_sdk::ember_data::pod_serializable;
use ember_sdk::ember_data::ecs::Traits;
use ember_sdk::prelude::*;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
struct Velocity {
    x: f32,
    y: f32,
}
impl Component for Velocity {}

pod_serializable!(Position, Velocity);

const TRIANGLE: &[[f32; 3]] = &[[0.0, 0.5, 0.0], [0.5, -0.5, 0.0], [-0.5, -0.5, 0.0]];

fn register(scene: &mut Scene) -> Result<()> {
    scene.register_component::<Position>("Position")?.serializable();
    scene
        .register_component::<Velocity>("Velocity")?
        .with(Traits::INHERITABLE)
        .serializable();
    Ok(())
}

#[derive(Default)]
struct SandboxApp {
    pipeline: Object,
    vertices: Object,
    root: Option<Entity>,
}

impl Application for SandboxApp {
    fn start(&mut self, scene: &mut Scene, graphics: &mut GraphicService) -> Result<()> {
        // --- 1. Scene content ---
        register(scene)?;
        let enemy = scene.create_archetype()?;
        let root = scene.create_entity();
        {
            let world = scene.world_mut();
            world.set_name(enemy, "Enemy")?;
            world.set(enemy, Velocity { x: 0.0, y: -1.0 })?;
            world.set_name(root, "Level")?;
            for index in 0..3 {
                let grunt = world.spawn();
                world.is_a(grunt, enemy)?;
                world.child_of(grunt, root)?;
                world.set_name(grunt, &format!("Grunt{index}"))?;
                world.set(grunt, Position { x: index as f32, y: 10.0 })?;
            }
        }
        scene.create_system::<(&mut Position, &Velocity), _>("Move", |world, query, delta| {
            for (_, (position, velocity)) in query.iter(world) {
                position.x += velocity.x * delta;
                position.y += velocity.y * delta;
            }
        })?;
        self.root = Some(root);

        // --- 2. GPU resources ---
        let bytes: &[u8] = bytemuck::cast_slice(TRIANGLE);
        self.vertices = graphics.create_buffer(&BufferDescriptor {
            usage: BufferUsage::Vertex,
            size: bytes.len() as u32,
            data: Some(bytes),
        })?;
        self.pipeline = graphics.create_pipeline(&PipelineDescriptor {
            vertex_shader: b"sandbox.vs".to_vec(),
            pixel_shader: b"sandbox.ps".to_vec(),
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
        Control::Continue
    }

    fn render(&mut self, _graphics: &mut GraphicService) -> Vec<Submission> {
        let mut submission = Submission {
            pipeline: self.pipeline,
            primitive: Primitive {
                count: TRIANGLE.len() as u32,
                ..Default::default()
            },
            ..Default::default()
        };
        submission.vertices[0] = Stream {
            buffer: self.vertices,
            offset: 0,
            stride: std::mem::size_of::<[f32; 3]>() as u32,
        };
        vec![submission]
    }
}

fn main() -> Result<()> {
    ember_sdk::logging::init("info");

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => {
            let mut config = EngineConfig {
                frames: 3,
                ..Default::default()
            };
            config.graphic.backend = Some(GraphicsBackend::Headless);
            config
        }
    };

    let mut kernel = Kernel::new(config, None)?;
    let mut app = SandboxApp::default();
    kernel.run(&mut app)?;

    // Save the level and load it into a fresh scene.
    let root = app.root.context("The sandbox did not build its level")?;
    let scene = kernel.scene();
    let mut writer = Writer::new();
    scene.save_archetypes(&mut writer)?;
    scene.save_entity_hierarchy(root, &mut writer)?;
    log::info!("Saved the level in {} bytes", writer.len());

    let mut copy = Scene::new(kernel.config().scene)?;
    register(&mut copy)?;
    let mut reader = Reader::new(writer.as_slice());
    let archetypes = copy.load_archetypes(&mut reader)?;
    let level = copy.load_entity_hierarchy(&mut reader)?;
    log::info!(
        "Reloaded {} archetype(s) and {} child entities under {:?}",
        archetypes.len(),
        copy.world().children(level).len(),
        copy.world().path(level)
    );
    Ok(())
}
