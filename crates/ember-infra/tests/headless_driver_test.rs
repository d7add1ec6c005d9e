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

use ember_core::graphic::{
    Attachment, BufferDescriptor, BufferUsage, ClearFlags, Command, Driver, GraphicError, Object,
    PassDescriptor, PipelineDescriptor, Primitive, Rect, ResourceKind, Stream, Submission,
    TextureDescriptor, TextureFormat, TextureLayout, TextureOrigin, TextureRegion,
    VertexAttribute, VertexFormat,
};
use ember_infra::HeadlessDriver;
use glam::Vec4;

// --- HELPERS ---

fn driver() -> HeadlessDriver {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut driver = HeadlessDriver::new();
    driver.initialize(None, 64, 64).unwrap();
    driver
}

fn pipeline(vertex_shader: u8) -> PipelineDescriptor {
    PipelineDescriptor {
        vertex_shader: vec![vertex_shader; 4],
        pixel_shader: vec![0xAA; 4],
        attributes: vec![VertexAttribute {
            semantic: "POSITION".into(),
            index: 0,
            format: VertexFormat::Float32x3,
            stream: 0,
            offset: 0,
            per_instance: false,
        }],
        ..Default::default()
    }
}

fn vertex_buffer(driver: &mut HeadlessDriver, id: Object) {
    driver
        .create_buffer(
            id,
            &BufferDescriptor {
                usage: BufferUsage::Vertex,
                size: 36,
                data: None,
            },
        )
        .unwrap();
}

fn draw(pipeline: Object, buffer: Object) -> Submission {
    let mut submission = Submission {
        pipeline,
        scissor: Rect::sized(64, 64),
        primitive: Primitive {
            count: 3,
            ..Default::default()
        },
        ..Default::default()
    };
    submission.vertices[0] = Stream {
        buffer,
        offset: 0,
        stride: 12,
    };
    submission
}

fn begin_display(driver: &mut HeadlessDriver) {
    driver
        .begin(
            Object::NONE,
            Rect::sized(64, 64),
            ClearFlags::ALL,
            Vec4::ZERO,
            1.0,
            0,
        )
        .unwrap();
}

fn render_target(driver: &mut HeadlessDriver, id: Object, width: u32, height: u32) {
    driver
        .create_texture(
            id,
            &TextureDescriptor {
                format: TextureFormat::Rgba8Unorm,
                layout: TextureLayout::Dual,
                width,
                height,
                ..Default::default()
            },
        )
        .unwrap();
}

// --- TESTS ---

#[test]
fn test_resource_calls_require_initialize() {
    // --- 1. ARRANGE ---
    let mut driver = HeadlessDriver::new();

    // --- 2. ACT ---
    let result = driver.create_buffer(
        Object(1),
        &BufferDescriptor {
            usage: BufferUsage::Vertex,
            size: 4,
            data: None,
        },
    );

    // --- 3. ASSERT ---
    assert!(matches!(result, Err(GraphicError::NotInitialized)));
}

#[test]
fn test_buffers_round_uniforms_and_honor_immutability() {
    let mut driver = driver();

    driver
        .create_buffer(
            Object(1),
            &BufferDescriptor {
                usage: BufferUsage::Uniform,
                size: 100,
                data: None,
            },
        )
        .unwrap();
    driver
        .create_buffer(
            Object(2),
            &BufferDescriptor {
                usage: BufferUsage::Index,
                size: 6,
                data: Some(&[0, 0, 1, 0, 2, 0]),
            },
        )
        .unwrap();

    assert_eq!(driver.buffer_data(Object(1)).unwrap().len(), 256);
    assert_eq!(driver.buffer_data(Object(2)).unwrap(), &[0, 0, 1, 0, 2, 0]);

    driver.update_buffer(Object(1), 16, &[7; 4]).unwrap();
    assert_eq!(&driver.buffer_data(Object(1)).unwrap()[16..20], &[7; 4]);

    assert!(
        driver.update_buffer(Object(2), 0, &[1]).is_err(),
        "buffers created with data are immutable"
    );
    assert!(
        driver.update_buffer(Object(1), 250, &[0; 8]).is_err(),
        "updates may not overrun the allocation"
    );
}

#[test]
fn test_handles_are_validated_by_the_tables() {
    let mut driver = driver();
    vertex_buffer(&mut driver, Object(1));

    assert!(matches!(
        driver.create_buffer(
            Object(1),
            &BufferDescriptor {
                usage: BufferUsage::Vertex,
                size: 4,
                data: None
            }
        ),
        Err(GraphicError::HandleInUse { .. })
    ));
    assert!(matches!(
        driver.delete_buffer(Object(5)),
        Err(GraphicError::InvalidHandle {
            kind: ResourceKind::Buffer,
            ..
        })
    ));
    assert!(driver.delete_texture(Object::NONE).is_err());
}

#[test]
fn test_texture_upload_copy_and_readback() {
    // --- 1. ARRANGE ---
    let mut driver = driver();
    let pixels: Vec<u8> = (0..16).collect();
    driver
        .create_texture(
            Object(1),
            &TextureDescriptor {
                width: 2,
                height: 2,
                data: Some(&pixels),
                ..Default::default()
            },
        )
        .unwrap();
    render_target(&mut driver, Object(2), 2, 2);

    // --- 2. ACT ---
    let column = TextureRegion {
        origin: TextureOrigin {
            x: 1,
            ..Default::default()
        },
        width: 1,
        height: 2,
    };
    driver
        .copy_texture(Object(1), &column, Object(2), TextureOrigin::default())
        .unwrap();

    // --- 3. ASSERT ---
    assert_eq!(
        driver.read_texture(Object(1), &TextureRegion::full(2, 2)).unwrap(),
        pixels
    );
    let copied = driver.read_texture(Object(2), &TextureRegion::full(2, 2)).unwrap();
    assert_eq!(&copied[0..4], &pixels[4..8]);
    assert_eq!(&copied[8..12], &pixels[12..16]);
    assert_eq!(&copied[4..8], &[0; 4]);

    let info = driver.query_texture(Object(2)).unwrap();
    assert_eq!((info.width, info.height, info.samples), (2, 2, 1));

    assert!(
        driver
            .update_texture(Object(2), &TextureRegion::full(2, 2), &[0; 4])
            .is_err(),
        "upload size must match the region"
    );
}

#[test]
fn test_mip_chains_are_addressed_per_level() {
    let mut driver = driver();
    let data: Vec<u8> = (0..84).map(|i| i as u8).collect();
    driver
        .create_texture(
            Object(1),
            &TextureDescriptor {
                width: 4,
                height: 4,
                levels: 3,
                data: Some(&data),
                ..Default::default()
            },
        )
        .unwrap();

    let smallest = TextureRegion {
        origin: TextureOrigin {
            level: 2,
            ..Default::default()
        },
        width: 1,
        height: 1,
    };
    assert_eq!(driver.read_texture(Object(1), &smallest).unwrap(), &data[80..84]);

    let wrong_size = driver.create_texture(
        Object(2),
        &TextureDescriptor {
            width: 4,
            height: 4,
            levels: 3,
            data: Some(&data[..64]),
            ..Default::default()
        },
    );
    assert!(wrong_size.is_err());
}

#[test]
fn test_display_clear_and_present() {
    // --- 1. ARRANGE ---
    let mut driver = driver();

    // --- 2. ACT ---
    driver
        .begin(
            Object::NONE,
            Rect::sized(64, 64),
            ClearFlags::COLOR,
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            1.0,
            0,
        )
        .unwrap();
    driver.commit(Object::NONE, true).unwrap();

    // --- 3. ASSERT ---
    let pixel = driver.read_display(&TextureRegion::full(1, 1)).unwrap();
    assert_eq!(pixel, vec![0, 0, 255, 255], "the display is BGRA");
    assert_eq!(driver.frames(), 1);
}

#[test]
fn test_multisampled_pass_resolves_on_commit() {
    // --- 1. ARRANGE ---
    let mut driver = driver();
    render_target(&mut driver, Object(1), 4, 4);
    driver
        .create_pass(
            Object(1),
            &PassDescriptor {
                colors: vec![Attachment::new(Object(1))],
                depth: None,
                samples: 4,
            },
        )
        .unwrap();
    let green = Vec4::new(0.0, 1.0, 0.0, 1.0);

    // --- 2. ACT ---
    driver
        .begin(Object(1), Rect::sized(4, 4), ClearFlags::COLOR, green, 1.0, 0)
        .unwrap();
    let before = driver.read_texture(Object(1), &TextureRegion::full(4, 4)).unwrap();
    driver.commit(Object(1), false).unwrap();
    let after = driver.read_texture(Object(1), &TextureRegion::full(4, 4)).unwrap();

    // --- 3. ASSERT ---
    assert!(before.iter().all(|&byte| byte == 0), "rendering goes to the implicit surface");
    assert_eq!(after, [0u8, 255, 0, 255].repeat(16));
    assert_eq!(driver.frames(), 0, "offscreen passes are not frames");
}

#[test]
fn test_single_sampled_pass_clears_attachment_directly() {
    let mut driver = driver();
    render_target(&mut driver, Object(1), 2, 2);
    driver
        .create_texture(
            Object(2),
            &TextureDescriptor {
                format: TextureFormat::Depth32Float,
                layout: TextureLayout::Destination,
                width: 2,
                height: 2,
                ..Default::default()
            },
        )
        .unwrap();
    driver
        .create_pass(
            Object(1),
            &PassDescriptor {
                colors: vec![Attachment::new(Object(1))],
                depth: Some(Attachment::new(Object(2))),
                samples: 1,
            },
        )
        .unwrap();

    driver
        .begin(Object(1), Rect::sized(2, 2), ClearFlags::ALL, Vec4::ONE, 0.5, 0)
        .unwrap();

    assert_eq!(
        driver.read_texture(Object(1), &TextureRegion::full(2, 2)).unwrap(),
        vec![255; 16]
    );
    assert_eq!(
        driver.read_texture(Object(2), &TextureRegion::full(1, 1)).unwrap(),
        0.5f32.to_le_bytes().to_vec()
    );
}

#[test]
fn test_pass_attachments_must_be_render_targets() {
    let mut driver = driver();
    driver
        .create_texture(
            Object(1),
            &TextureDescriptor {
                layout: TextureLayout::Source,
                ..Default::default()
            },
        )
        .unwrap();

    let result = driver.create_pass(
        Object(1),
        &PassDescriptor {
            colors: vec![Attachment::new(Object(1))],
            depth: None,
            samples: 1,
        },
    );
    assert!(matches!(result, Err(GraphicError::InvalidDescriptor(_))));
}

#[test]
fn test_submit_rebinds_only_changed_state() {
    // --- 1. ARRANGE ---
    let mut driver = driver();
    vertex_buffer(&mut driver, Object(1));
    driver.create_pipeline(Object(1), &pipeline(1)).unwrap();
    driver.create_pipeline(Object(2), &pipeline(2)).unwrap();
    begin_display(&mut driver);

    // --- 2. ACT ---
    let stats = driver
        .submit(&[draw(Object(1), Object(1)), draw(Object(2), Object(1))])
        .unwrap();

    // --- 3. ASSERT ---
    let commands = driver.commands();
    let first_draw = commands.iter().position(Command::is_draw).unwrap();
    let second: Vec<&Command> = commands[first_draw + 1..].iter().collect();
    assert_eq!(second.len(), 3, "{second:?}");
    assert!(matches!(second[0], Command::VertexShader(Some(_))));
    assert!(matches!(second[1], Command::InputLayout(Some(_))));
    assert!(second[2].is_draw());

    // Buffers + scissor + seven pipeline states, then shader + layout.
    assert_eq!(stats.draws, 2);
    assert_eq!(stats.state_changes, 11);
    assert_eq!(driver.pass_stats(), stats);
}

#[test]
fn test_stencil_reference_rebinds_depth_stencil_only() {
    let mut driver = driver();
    vertex_buffer(&mut driver, Object(1));
    driver.create_pipeline(Object(1), &pipeline(1)).unwrap();
    begin_display(&mut driver);

    let first = draw(Object(1), Object(1));
    let second = Submission {
        stencil: 1,
        ..first
    };
    driver.submit(&[first, second]).unwrap();

    let commands = driver.commands();
    let tail = &commands[commands.len() - 2..];
    assert!(matches!(
        tail[0],
        Command::DepthStencilState {
            state: Some(_),
            reference: 1
        }
    ));
    assert!(tail[1].is_draw());
}

#[test]
fn test_diff_chain_spans_submits_and_resets_on_begin() {
    let mut driver = driver();
    vertex_buffer(&mut driver, Object(1));
    driver.create_pipeline(Object(1), &pipeline(1)).unwrap();
    let submission = draw(Object(1), Object(1));

    begin_display(&mut driver);
    let first = driver.submit(&[submission]).unwrap();
    let repeated = driver.submit(&[submission]).unwrap();
    driver.commit(Object::NONE, false).unwrap();

    begin_display(&mut driver);
    let fresh = driver.submit(&[submission]).unwrap();

    assert_eq!(first.state_changes, 9);
    assert_eq!(repeated.state_changes, 0);
    assert_eq!(repeated.draws, 1);
    assert_eq!(fresh, first);
    assert_eq!(driver.frame_stats().draws, 2, "stats of the presented frame");
}

#[test]
fn test_submit_validates_handles_and_pass() {
    let mut driver = driver();
    driver.create_pipeline(Object(1), &pipeline(1)).unwrap();

    assert!(
        driver.submit(&[draw(Object(1), Object::NONE)]).is_err(),
        "no pass begun"
    );

    begin_display(&mut driver);
    let result = driver.submit(&[draw(Object(1), Object(9))]);
    assert!(matches!(
        result,
        Err(GraphicError::InvalidHandle {
            kind: ResourceKind::Buffer,
            ..
        })
    ));
    assert!(driver.commands().is_empty(), "nothing is issued for a rejected batch");
}

#[test]
fn test_deleted_pipelines_release_shared_state() {
    let mut driver = driver();
    driver.create_pipeline(Object(1), &pipeline(1)).unwrap();
    driver.create_pipeline(Object(2), &pipeline(2)).unwrap();
    assert_eq!(driver.states().blend_count(), 1);

    driver.delete_pipeline(Object(1)).unwrap();
    assert_eq!(driver.states().blend_count(), 1);
    driver.delete_pipeline(Object(2)).unwrap();
    assert_eq!(driver.states().blend_count(), 0);
    assert!(driver.delete_pipeline(Object(2)).is_err());
}

#[test]
fn test_reset_resolves_to_supported_sample_counts() {
    let mut driver = driver();

    driver.reset(32, 32, 3).unwrap();
    assert_eq!(driver.capabilities().samples, 2);

    driver.reset(32, 32, 16).unwrap();
    assert_eq!(driver.capabilities().samples, 8);

    driver
        .begin(
            Object::NONE,
            Rect::sized(32, 32),
            ClearFlags::COLOR,
            Vec4::new(0.0, 0.0, 1.0, 1.0),
            1.0,
            0,
        )
        .unwrap();
    driver.commit(Object::NONE, true).unwrap();
    assert_eq!(
        driver.read_display(&TextureRegion::full(1, 1)).unwrap(),
        vec![255, 0, 0, 255]
    );
}
