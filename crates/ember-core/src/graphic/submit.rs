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

//! The state-diffing submission engine.
//!
//! Submissions arrive already sorted by the renderer. Each one is compared
//! with its predecessor (or the zeroed sentinel at the start of a pass) and
//! only the differing state is pushed to the [`CommandContext`].

use crate::graphic::api::{ShaderStage, Submission};
use crate::graphic::error::GraphicError;
use crate::graphic::traits::{CommandContext, PipelineBinding};
use std::ops::{AddAssign, Range};

/// Counters reported by a submit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmitStats {
    /// Draw calls issued.
    pub draws: u32,
    /// State-binding calls issued.
    pub state_changes: u32,
}

impl AddAssign for SubmitStats {
    fn add_assign(&mut self, other: Self) {
        self.draws += other.draws;
        self.state_changes += other.state_changes;
    }
}

/// Returns the smallest slot range covering every position where `previous`
/// and `next` differ.
///
/// Unchanged slots inside the range are rebound too; one call covering the
/// union is cheaper than one call per changed slot.
pub fn changed_range<T: PartialEq>(previous: &[T], next: &[T]) -> Option<Range<usize>> {
    let first = previous.iter().zip(next).position(|(a, b)| a != b)?;
    let last = previous.iter().zip(next).rposition(|(a, b)| a != b)?;
    Some(first..last + 1)
}

/// Remembers the last submission of the current pass and diffs new ones
/// against it.
#[derive(Debug)]
pub struct StateTracker {
    previous: Submission,
    binding: PipelineBinding,
    fresh: bool,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    /// Creates a tracker positioned at the start of a pass.
    pub fn new() -> Self {
        Self {
            previous: Submission::default(),
            binding: PipelineBinding::default(),
            fresh: true,
        }
    }

    /// Forgets all tracked state. Backends call this when a pass begins, after
    /// clearing their own bindings.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The last submission applied in the current pass.
    pub fn previous(&self) -> &Submission {
        &self.previous
    }

    /// Applies `submissions` in order.
    ///
    /// The tracked state carries over between calls until the next
    /// [`reset`](Self::reset), so a pass may be submitted in several slices.
    ///
    /// The whole batch is validated before the first call is issued. Any
    /// error resets the tracker, so the next submission rebinds everything.
    pub fn submit<C: CommandContext + ?Sized>(
        &mut self,
        context: &mut C,
        submissions: &[Submission],
    ) -> Result<SubmitStats, GraphicError> {
        let mut stats = SubmitStats::default();
        let result = submissions
            .iter()
            .try_for_each(|submission| context.validate(submission))
            .and_then(|()| {
                submissions
                    .iter()
                    .try_for_each(|submission| self.apply(context, submission, &mut stats))
            });
        if let Err(error) = result {
            self.reset();
            return Err(error);
        }
        Ok(stats)
    }

    fn apply<C: CommandContext + ?Sized>(
        &mut self,
        context: &mut C,
        next: &Submission,
        stats: &mut SubmitStats,
    ) -> Result<(), GraphicError> {
        let previous = &self.previous;

        if let Some(range) = changed_range(&previous.vertices, &next.vertices) {
            context.set_vertex_buffers(range.start as u32, &next.vertices[range])?;
            stats.state_changes += 1;
        }

        if previous.indices != next.indices {
            context.set_index_buffer(&next.indices)?;
            stats.state_changes += 1;
        }

        if self.fresh || previous.scissor != next.scissor {
            context.set_scissor(&next.scissor)?;
            stats.state_changes += 1;
        }

        let stencil_changed = previous.stencil != next.stencil;
        if previous.pipeline != next.pipeline {
            let binding = context.pipeline(next.pipeline)?;
            let old = self.binding;

            if old.vertex_shader != binding.vertex_shader {
                context.set_vertex_shader(binding.vertex_shader)?;
                stats.state_changes += 1;
            }
            if old.pixel_shader != binding.pixel_shader {
                context.set_pixel_shader(binding.pixel_shader)?;
                stats.state_changes += 1;
            }
            if old.geometry_shader != binding.geometry_shader {
                context.set_geometry_shader(binding.geometry_shader)?;
                stats.state_changes += 1;
            }
            if old.blend != binding.blend {
                context.set_blend_state(binding.blend)?;
                stats.state_changes += 1;
            }
            if old.depth_stencil != binding.depth_stencil || stencil_changed {
                context.set_depth_stencil_state(binding.depth_stencil, next.stencil)?;
                stats.state_changes += 1;
            }
            if old.rasterizer != binding.rasterizer {
                context.set_rasterizer_state(binding.rasterizer)?;
                stats.state_changes += 1;
            }
            if old.input_layout != binding.input_layout {
                context.set_input_layout(binding.input_layout)?;
                stats.state_changes += 1;
            }
            if old.topology != binding.topology {
                context.set_primitive_topology(binding.topology)?;
                stats.state_changes += 1;
            }
            self.binding = binding;
        } else if stencil_changed {
            context.set_depth_stencil_state(self.binding.depth_stencil, next.stencil)?;
            stats.state_changes += 1;
        }

        for stage in ShaderStage::ALL {
            let before = previous.stage(stage);
            let after = next.stage(stage);

            if let Some(range) = changed_range(&before.samplers, &after.samplers) {
                context.set_samplers(stage, range.start as u32, &after.samplers[range])?;
                stats.state_changes += 1;
            }
            if let Some(range) = changed_range(&before.textures, &after.textures) {
                context.set_textures(stage, range.start as u32, &after.textures[range])?;
                stats.state_changes += 1;
            }

            // Compared after rounding to whole constants.
            let (before, after) = (before.constants(), after.constants());
            if let Some(range) = changed_range(&before, &after) {
                context.set_uniforms(stage, range.start as u32, &after[range])?;
                stats.state_changes += 1;
            }
        }

        let primitive = &next.primitive;
        match (next.is_indexed(), next.is_instanced()) {
            (false, false) => context.draw(primitive.count, primitive.offset)?,
            (false, true) => {
                context.draw_instanced(primitive.count, primitive.instances, primitive.offset)?
            }
            (true, false) => {
                context.draw_indexed(primitive.count, primitive.offset, primitive.base)?
            }
            (true, true) => context.draw_indexed_instanced(
                primitive.count,
                primitive.instances,
                primitive.offset,
                primitive.base,
            )?,
        }
        stats.draws += 1;

        self.previous = *next;
        self.fresh = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphic::api::*;
    use crate::graphic::cache::StateKey;
    use crate::graphic::recorder::{Command, Recorder};

    fn binding(seed: u32) -> PipelineBinding {
        PipelineBinding {
            vertex_shader: Some(StateKey(seed)),
            pixel_shader: Some(StateKey(seed + 1)),
            geometry_shader: None,
            blend: Some(StateKey(seed + 2)),
            depth_stencil: Some(StateKey(seed + 3)),
            rasterizer: Some(StateKey(seed + 4)),
            input_layout: Some(StateKey(seed + 5)),
            topology: Some(PrimitiveTopology::TriangleList),
        }
    }

    fn draw(pipeline: u32) -> Submission {
        let mut submission = Submission {
            pipeline: Object(pipeline),
            primitive: Primitive {
                count: 3,
                ..Default::default()
            },
            scissor: Rect::sized(640, 480),
            ..Default::default()
        };
        submission.vertices[0] = Stream {
            buffer: Object(1),
            offset: 0,
            stride: 12,
        };
        submission
    }

    fn recorder() -> Recorder {
        let mut recorder = Recorder::new();
        recorder.bind_pipeline(Object(1), binding(10));
        recorder
    }

    #[test]
    fn test_first_submission_binds_everything_it_uses() {
        let mut recorder = recorder();
        let mut tracker = StateTracker::new();
        let stats = tracker.submit(&mut recorder, &[draw(1)]).unwrap();

        let commands = recorder.take();
        assert_eq!(
            commands[0],
            Command::VertexBuffers {
                first: 0,
                streams: vec![draw(1).vertices[0]]
            }
        );
        assert!(commands.contains(&Command::Scissor(Rect::sized(640, 480))));
        assert!(commands.contains(&Command::BlendState(Some(StateKey(12)))));
        assert!(!commands.iter().any(|c| matches!(c, Command::GeometryShader(_))));
        assert_eq!(
            commands.last(),
            Some(&Command::Draw {
                count: 3,
                first_vertex: 0
            })
        );
        assert_eq!(stats.draws, 1);
        assert_eq!(stats.state_changes as usize, commands.len() - 1);
    }

    #[test]
    fn test_scissor_is_bound_for_the_first_submission_even_when_zero() {
        let mut recorder = Recorder::new();
        let mut tracker = StateTracker::new();
        tracker
            .submit(&mut recorder, &[Submission::default()])
            .unwrap();
        assert_eq!(
            recorder.take(),
            vec![
                Command::Scissor(Rect::default()),
                Command::Draw {
                    count: 0,
                    first_vertex: 0
                }
            ]
        );
    }

    #[test]
    fn test_only_the_differing_pipeline_state_is_rebound() {
        let mut recorder = recorder();
        let mut other = binding(10);
        other.blend = Some(StateKey(99));
        recorder.bind_pipeline(Object(2), other);

        let mut tracker = StateTracker::new();
        tracker.submit(&mut recorder, &[draw(1)]).unwrap();
        recorder.take();

        tracker.submit(&mut recorder, &[draw(2)]).unwrap();
        assert_eq!(
            recorder.take(),
            vec![
                Command::BlendState(Some(StateKey(99))),
                Command::Draw {
                    count: 3,
                    first_vertex: 0
                }
            ]
        );
    }

    #[test]
    fn test_vertex_slots_rebind_as_one_covering_range() {
        let mut recorder = recorder();
        let mut tracker = StateTracker::new();
        let first = draw(1);
        let mut second = first;
        second.vertices[1] = Stream {
            buffer: Object(5),
            offset: 0,
            stride: 8,
        };
        second.vertices[4] = Stream {
            buffer: Object(6),
            offset: 64,
            stride: 4,
        };

        tracker.submit(&mut recorder, &[first, second]).unwrap();
        let commands = recorder.take();
        let vertex_calls: Vec<_> = commands
            .iter()
            .filter(|c| matches!(c, Command::VertexBuffers { .. }))
            .collect();
        assert_eq!(vertex_calls.len(), 2);
        assert_eq!(
            vertex_calls[1],
            &Command::VertexBuffers {
                first: 1,
                streams: second.vertices[1..5].to_vec()
            }
        );
    }

    #[test]
    fn test_stencil_reference_rebinds_without_pipeline_change() {
        let mut recorder = recorder();
        let mut tracker = StateTracker::new();
        let first = draw(1);
        let second = Submission {
            stencil: 7,
            ..first
        };

        tracker.submit(&mut recorder, &[first]).unwrap();
        recorder.take();
        tracker.submit(&mut recorder, &[second]).unwrap();
        assert_eq!(
            recorder.take(),
            vec![
                Command::DepthStencilState {
                    state: Some(StateKey(13)),
                    reference: 7
                },
                Command::Draw {
                    count: 3,
                    first_vertex: 0
                }
            ]
        );
    }

    #[test]
    fn test_uniforms_compare_after_rounding() {
        let mut recorder = recorder();
        let mut tracker = StateTracker::new();
        let mut first = draw(1);
        first.stage_mut(ShaderStage::Vertex).uniforms[0] = Uniform {
            buffer: Object(3),
            offset: 0,
            length: 17,
        };
        let mut second = first;
        second.stage_mut(ShaderStage::Vertex).uniforms[0].length = 32;
        let mut third = second;
        third.stage_mut(ShaderStage::Vertex).uniforms[0].length = 48;

        tracker.submit(&mut recorder, &[first, second]).unwrap();
        let uniform_calls = recorder
            .take()
            .into_iter()
            .filter(|c| matches!(c, Command::Uniforms { .. }))
            .count();
        assert_eq!(uniform_calls, 1, "17 and 32 bytes both span two constants");

        tracker.submit(&mut recorder, &[third]).unwrap();
        assert!(recorder.take().contains(&Command::Uniforms {
            stage: ShaderStage::Vertex,
            first: 0,
            ranges: vec![ConstantRange {
                buffer: Object(3),
                first: 0,
                count: 3
            }]
        }));
    }

    #[test]
    fn test_textures_and_samplers_diff_per_stage() {
        let mut recorder = recorder();
        let mut tracker = StateTracker::new();
        let first = draw(1);
        let mut second = first;
        second.stage_mut(ShaderStage::Pixel).textures[2] = Object(8);
        second.stage_mut(ShaderStage::Pixel).samplers[0] = Some(SamplerDescriptor::LINEAR_WRAP);

        tracker.submit(&mut recorder, &[first, second]).unwrap();
        let commands = recorder.take();
        assert!(commands.contains(&Command::Textures {
            stage: ShaderStage::Pixel,
            first: 2,
            textures: vec![Object(8)]
        }));
        assert!(commands.contains(&Command::Samplers {
            stage: ShaderStage::Pixel,
            first: 0,
            samplers: vec![Some(SamplerDescriptor::LINEAR_WRAP)]
        }));
        assert!(!commands
            .iter()
            .any(|c| matches!(c, Command::Textures { stage: ShaderStage::Vertex, .. })));
    }

    #[test]
    fn test_draw_variant_follows_indices_and_instances() {
        let mut recorder = recorder();
        let mut tracker = StateTracker::new();
        let plain = draw(1);
        let instanced = Submission {
            primitive: Primitive {
                instances: 4,
                ..plain.primitive
            },
            ..plain
        };
        let mut indexed = plain;
        indexed.indices = Stream {
            buffer: Object(2),
            offset: 0,
            stride: 2,
        };
        indexed.primitive.base = -1;
        let indexed_instanced = Submission {
            primitive: Primitive {
                instances: 2,
                ..indexed.primitive
            },
            ..indexed
        };

        tracker
            .submit(&mut recorder, &[plain, instanced, indexed, indexed_instanced])
            .unwrap();
        let draws: Vec<_> = recorder
            .take()
            .into_iter()
            .filter(Command::is_draw)
            .collect();
        assert_eq!(
            draws,
            vec![
                Command::Draw {
                    count: 3,
                    first_vertex: 0
                },
                Command::DrawInstanced {
                    count: 3,
                    instances: 4,
                    first_vertex: 0
                },
                Command::DrawIndexed {
                    count: 3,
                    first_index: 0,
                    base_vertex: -1
                },
                Command::DrawIndexedInstanced {
                    count: 3,
                    instances: 2,
                    first_index: 0,
                    base_vertex: -1
                },
            ]
        );
    }

    #[test]
    fn test_state_carries_across_calls_until_reset() {
        let mut recorder = recorder();
        let mut tracker = StateTracker::new();
        tracker.submit(&mut recorder, &[draw(1)]).unwrap();
        recorder.take();

        let stats = tracker.submit(&mut recorder, &[draw(1)]).unwrap();
        assert_eq!(stats.state_changes, 0);

        tracker.reset();
        let stats = tracker.submit(&mut recorder, &[draw(1)]).unwrap();
        assert!(stats.state_changes > 0);
    }

    #[test]
    fn test_unknown_pipeline_is_reported() {
        let mut recorder = Recorder::new();
        let mut tracker = StateTracker::new();
        let error = tracker.submit(&mut recorder, &[draw(4)]).unwrap_err();
        assert_eq!(
            error,
            GraphicError::InvalidHandle {
                kind: ResourceKind::Pipeline,
                id: Object(4)
            }
        );
    }

    #[test]
    fn test_failed_batch_issues_nothing_and_forces_a_full_rebind() {
        // --- 1. ARRANGE ---
        let mut recorder = recorder();
        let mut tracker = StateTracker::new();
        let first = draw(1);
        let mut broken = draw(99);
        broken.vertices[0].buffer = Object(2);

        let full = tracker.submit(&mut recorder, &[first]).unwrap();
        let full_commands = recorder.take();

        // --- 2. ACT ---
        let error = tracker.submit(&mut recorder, &[first, broken]).unwrap_err();
        let issued = recorder.take();
        let again = tracker.submit(&mut recorder, &[first]).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(
            error,
            GraphicError::InvalidHandle {
                kind: ResourceKind::Pipeline,
                id: Object(99)
            }
        );
        assert!(issued.is_empty(), "nothing is bound before the batch validates");
        assert_eq!(again, full);
        assert_eq!(recorder.take(), full_commands);
    }

    #[test]
    fn test_changed_range_is_the_union() {
        assert_eq!(changed_range(&[1, 2, 3, 4], &[1, 2, 3, 4]), None);
        assert_eq!(changed_range(&[1, 2, 3, 4], &[1, 9, 3, 9]), Some(1..4));
        assert_eq!(changed_range(&[1, 2, 3, 4], &[0, 2, 3, 4]), Some(0..1));
    }
}
