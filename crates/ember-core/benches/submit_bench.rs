use criterion::{criterion_group, criterion_main, Criterion};
use ember_core::graphic::{
    CommandContext, Object, PipelineBinding, Primitive, Recorder, Rect, ShaderStage, StateKey,
    StateTracker, Stream, Submission, Uniform,
};
use std::hint::black_box;

fn submissions(count: u32, pipelines: u32, sorted: bool) -> Vec<Submission> {
    let mut list: Vec<_> = (0..count)
        .map(|i| {
            let mut submission = Submission {
                pipeline: Object(1 + i % pipelines),
                primitive: Primitive {
                    count: 36,
                    ..Default::default()
                },
                scissor: Rect::sized(1280, 720),
                ..Default::default()
            };
            submission.vertices[0] = Stream {
                buffer: Object(1 + i % 16),
                offset: 0,
                stride: 32,
            };
            submission.stage_mut(ShaderStage::Vertex).uniforms[0] = Uniform {
                buffer: Object(100),
                offset: (i % 64) * 256,
                length: 64,
            };
            submission.stage_mut(ShaderStage::Pixel).textures[0] = Object(1 + i % 8);
            submission
        })
        .collect();
    if sorted {
        list.sort_by_key(|s| (s.pipeline, s.vertices[0].buffer));
    }
    list
}

fn recorder(pipelines: u32) -> Recorder {
    let mut recorder = Recorder::new();
    for id in 1..=pipelines {
        recorder.bind_pipeline(
            Object(id),
            PipelineBinding {
                vertex_shader: Some(StateKey(1)),
                pixel_shader: Some(StateKey(1 + id % 4)),
                blend: Some(StateKey(1 + id % 2)),
                depth_stencil: Some(StateKey(1)),
                rasterizer: Some(StateKey(1)),
                input_layout: Some(StateKey(1)),
                ..Default::default()
            },
        );
    }
    recorder
}

fn bench_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("Submit");

    for (label, sorted) in [("sorted", true), ("unsorted", false)] {
        let list = submissions(10_000, 32, sorted);
        let mut context = recorder(32);
        group.bench_function(format!("10k draws ({label})"), |b| {
            b.iter(|| {
                let mut tracker = StateTracker::new();
                let stats = tracker.submit(&mut context, black_box(&list)).unwrap();
                black_box(stats);
                black_box(context.take().len());
            });
        });
    }

    group.bench_function("pipeline lookup", |b| {
        let context = recorder(32);
        b.iter(|| black_box(context.pipeline(black_box(Object(7))).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_submit);
criterion_main!(benches);
