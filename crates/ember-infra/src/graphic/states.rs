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
    BlendState, DepthStencilState, GraphicError, InputLayoutKey, PipelineBinding,
    PipelineDescriptor, RasterizerState, SamplerDescriptor, StateCache, StateKey,
};

/// Creates backend state objects from value descriptors.
///
/// Drivers implement this once; [`PipelineStates`] takes care of interning
/// so equal descriptors share one backend object.
pub trait StateFactory {
    /// Compiled vertex shader.
    type VertexShader;
    /// Compiled pixel shader.
    type PixelShader;
    /// Compiled geometry shader.
    type GeometryShader;
    /// Blend state object.
    type Blend;
    /// Depth-stencil state object.
    type DepthStencil;
    /// Rasterizer state object.
    type Rasterizer;
    /// Input layout object.
    type InputLayout;
    /// Sampler state object.
    type Sampler;

    /// Creates a vertex shader from bytecode.
    fn vertex_shader(&mut self, bytecode: &[u8]) -> Result<Self::VertexShader, GraphicError>;
    /// Creates a pixel shader from bytecode.
    fn pixel_shader(&mut self, bytecode: &[u8]) -> Result<Self::PixelShader, GraphicError>;
    /// Creates a geometry shader from bytecode.
    fn geometry_shader(&mut self, bytecode: &[u8]) -> Result<Self::GeometryShader, GraphicError>;
    /// Creates a blend state. Receives the normalized descriptor.
    fn blend(&mut self, state: &BlendState) -> Result<Self::Blend, GraphicError>;
    /// Creates a depth-stencil state.
    fn depth_stencil(&mut self, state: &DepthStencilState) -> Result<Self::DepthStencil, GraphicError>;
    /// Creates a rasterizer state.
    fn rasterizer(&mut self, state: &RasterizerState) -> Result<Self::Rasterizer, GraphicError>;
    /// Creates an input layout validated against the key's vertex shader.
    fn input_layout(&mut self, key: &InputLayoutKey) -> Result<Self::InputLayout, GraphicError>;
    /// Creates a sampler state.
    fn sampler(&mut self, descriptor: &SamplerDescriptor) -> Result<Self::Sampler, GraphicError>;
}

/// Interned pipeline sub-states of one device.
pub struct PipelineStates<F: StateFactory> {
    vertex_shaders: StateCache<Vec<u8>, F::VertexShader>,
    pixel_shaders: StateCache<Vec<u8>, F::PixelShader>,
    geometry_shaders: StateCache<Vec<u8>, F::GeometryShader>,
    blends: StateCache<BlendState, F::Blend>,
    depth_stencils: StateCache<DepthStencilState, F::DepthStencil>,
    rasterizers: StateCache<RasterizerState, F::Rasterizer>,
    input_layouts: StateCache<InputLayoutKey, F::InputLayout>,
    samplers: StateCache<SamplerDescriptor, F::Sampler>,
}

impl<F: StateFactory> Default for PipelineStates<F> {
    fn default() -> Self {
        Self {
            vertex_shaders: StateCache::new(),
            pixel_shaders: StateCache::new(),
            geometry_shaders: StateCache::new(),
            blends: StateCache::new(),
            depth_stencils: StateCache::new(),
            rasterizers: StateCache::new(),
            input_layouts: StateCache::new(),
            samplers: StateCache::new(),
        }
    }
}

impl<F: StateFactory> std::fmt::Debug for PipelineStates<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStates")
            .field("vertex_shaders", &self.vertex_shaders.len())
            .field("pixel_shaders", &self.pixel_shaders.len())
            .field("blends", &self.blends.len())
            .field("depth_stencils", &self.depth_stencils.len())
            .field("rasterizers", &self.rasterizers.len())
            .field("input_layouts", &self.input_layouts.len())
            .field("samplers", &self.samplers.len())
            .finish()
    }
}

/// A blend equation that writes the source unchanged is the same as blending
/// disabled, so it interns to the default state.
pub fn normalize_blend(state: &BlendState) -> BlendState {
    if state.is_replace() {
        BlendState {
            write_mask: state.write_mask,
            ..BlendState::default()
        }
    } else {
        *state
    }
}

impl<F: StateFactory> PipelineStates<F> {
    /// Creates empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns every sub-state of `descriptor`.
    ///
    /// On failure, the references taken so far are released again.
    pub fn create(
        &mut self,
        factory: &mut F,
        descriptor: &PipelineDescriptor,
    ) -> Result<PipelineBinding, GraphicError> {
        let mut binding = PipelineBinding {
            topology: Some(descriptor.topology),
            ..PipelineBinding::default()
        };
        if let Err(error) = self.intern_all(factory, descriptor, &mut binding) {
            self.release(&binding);
            return Err(error);
        }
        Ok(binding)
    }

    fn intern_all(
        &mut self,
        factory: &mut F,
        descriptor: &PipelineDescriptor,
        binding: &mut PipelineBinding,
    ) -> Result<(), GraphicError> {
        if !descriptor.vertex_shader.is_empty() {
            binding.vertex_shader = Some(
                self.vertex_shaders
                    .intern(&descriptor.vertex_shader, |code| factory.vertex_shader(code))?,
            );
        }
        if !descriptor.pixel_shader.is_empty() {
            binding.pixel_shader = Some(
                self.pixel_shaders
                    .intern(&descriptor.pixel_shader, |code| factory.pixel_shader(code))?,
            );
        }
        if let Some(geometry) = descriptor.geometry_shader.as_ref().filter(|code| !code.is_empty()) {
            binding.geometry_shader = Some(
                self.geometry_shaders
                    .intern(geometry, |code| factory.geometry_shader(code))?,
            );
        }
        let blend = normalize_blend(&descriptor.blend);
        binding.blend = Some(self.blends.intern(&blend, |state| factory.blend(state))?);
        binding.depth_stencil = Some(
            self.depth_stencils
                .intern(&descriptor.depth_stencil, |state| factory.depth_stencil(state))?,
        );
        binding.rasterizer = Some(
            self.rasterizers
                .intern(&descriptor.rasterizer, |state| factory.rasterizer(state))?,
        );
        if !descriptor.attributes.is_empty() {
            let key = InputLayoutKey {
                attributes: descriptor.attributes.clone(),
                vertex_shader: descriptor.vertex_shader.clone(),
            };
            binding.input_layout =
                Some(self.input_layouts.intern(&key, |key| factory.input_layout(key))?);
        }
        Ok(())
    }

    /// Drops the references `binding` holds. Backend objects are destroyed
    /// with their last reference.
    pub fn release(&mut self, binding: &PipelineBinding) {
        if let Some(key) = binding.vertex_shader {
            self.vertex_shaders.release(key);
        }
        if let Some(key) = binding.pixel_shader {
            self.pixel_shaders.release(key);
        }
        if let Some(key) = binding.geometry_shader {
            self.geometry_shaders.release(key);
        }
        if let Some(key) = binding.blend {
            self.blends.release(key);
        }
        if let Some(key) = binding.depth_stencil {
            self.depth_stencils.release(key);
        }
        if let Some(key) = binding.rasterizer {
            self.rasterizers.release(key);
        }
        if let Some(key) = binding.input_layout {
            self.input_layouts.release(key);
        }
    }

    /// The sampler object for `descriptor`, created on first use. Samplers
    /// live until [`clear`](Self::clear).
    pub fn sampler(&mut self, factory: &mut F, descriptor: &SamplerDescriptor) -> Result<&F::Sampler, GraphicError> {
        let key = match self.samplers.find(descriptor) {
            Some(key) => key,
            None => self.samplers.intern(descriptor, |descriptor| factory.sampler(descriptor))?,
        };
        self.samplers
            .get(key)
            .ok_or_else(|| GraphicError::InvalidDescriptor(format!("sampler {key} vanished")))
    }

    /// The vertex shader behind `key`.
    pub fn vertex_shader(&self, key: StateKey) -> Option<&F::VertexShader> {
        self.vertex_shaders.get(key)
    }

    /// The pixel shader behind `key`.
    pub fn pixel_shader(&self, key: StateKey) -> Option<&F::PixelShader> {
        self.pixel_shaders.get(key)
    }

    /// The geometry shader behind `key`.
    pub fn geometry_shader(&self, key: StateKey) -> Option<&F::GeometryShader> {
        self.geometry_shaders.get(key)
    }

    /// The blend state behind `key`.
    pub fn blend(&self, key: StateKey) -> Option<&F::Blend> {
        self.blends.get(key)
    }

    /// The depth-stencil state behind `key`.
    pub fn depth_stencil(&self, key: StateKey) -> Option<&F::DepthStencil> {
        self.depth_stencils.get(key)
    }

    /// The rasterizer state behind `key`.
    pub fn rasterizer(&self, key: StateKey) -> Option<&F::Rasterizer> {
        self.rasterizers.get(key)
    }

    /// The input layout behind `key`.
    pub fn input_layout(&self, key: StateKey) -> Option<&F::InputLayout> {
        self.input_layouts.get(key)
    }

    /// Number of distinct blend states alive.
    pub fn blend_count(&self) -> usize {
        self.blends.len()
    }

    /// Number of distinct depth-stencil states alive.
    pub fn depth_stencil_count(&self) -> usize {
        self.depth_stencils.len()
    }

    /// Number of distinct samplers alive.
    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }

    /// Destroys every cached object.
    pub fn clear(&mut self) {
        self.vertex_shaders.clear();
        self.pixel_shaders.clear();
        self.geometry_shaders.clear();
        self.blends.clear();
        self.depth_stencils.clear();
        self.rasterizers.clear();
        self.input_layouts.clear();
        self.samplers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::graphic::{BlendComponent, BlendOperation};

    // --- DUMMY FACTORY FOR TESTING ---
    #[derive(Default)]
    struct CountingFactory {
        created: usize,
        fail_rasterizer: bool,
    }

    impl StateFactory for CountingFactory {
        type VertexShader = ();
        type PixelShader = ();
        type GeometryShader = ();
        type Blend = BlendState;
        type DepthStencil = ();
        type Rasterizer = ();
        type InputLayout = ();
        type Sampler = ();

        fn vertex_shader(&mut self, _: &[u8]) -> Result<(), GraphicError> {
            self.created += 1;
            Ok(())
        }
        fn pixel_shader(&mut self, _: &[u8]) -> Result<(), GraphicError> {
            self.created += 1;
            Ok(())
        }
        fn geometry_shader(&mut self, _: &[u8]) -> Result<(), GraphicError> {
            self.created += 1;
            Ok(())
        }
        fn blend(&mut self, state: &BlendState) -> Result<BlendState, GraphicError> {
            self.created += 1;
            Ok(*state)
        }
        fn depth_stencil(&mut self, _: &DepthStencilState) -> Result<(), GraphicError> {
            self.created += 1;
            Ok(())
        }
        fn rasterizer(&mut self, _: &RasterizerState) -> Result<(), GraphicError> {
            if self.fail_rasterizer {
                return Err(GraphicError::InvalidDescriptor("rasterizer".into()));
            }
            self.created += 1;
            Ok(())
        }
        fn input_layout(&mut self, _: &InputLayoutKey) -> Result<(), GraphicError> {
            self.created += 1;
            Ok(())
        }
        fn sampler(&mut self, _: &SamplerDescriptor) -> Result<(), GraphicError> {
            self.created += 1;
            Ok(())
        }
    }

    fn descriptor() -> PipelineDescriptor {
        PipelineDescriptor {
            vertex_shader: vec![1, 2, 3],
            pixel_shader: vec![4, 5, 6],
            ..Default::default()
        }
    }

    #[test]
    fn test_equal_pipelines_share_every_key() {
        let mut factory = CountingFactory::default();
        let mut states = PipelineStates::new();

        let first = states.create(&mut factory, &descriptor()).unwrap();
        let second = states.create(&mut factory, &descriptor()).unwrap();

        assert_eq!(first, second);
        assert_eq!(factory.created, 5, "vs, ps, blend, depth-stencil, rasterizer");
        assert!(first.geometry_shader.is_none());
        assert!(first.input_layout.is_none());
    }

    #[test]
    fn test_no_op_blend_equations_intern_together() {
        let mut factory = CountingFactory::default();
        let mut states = PipelineStates::new();
        let subtract = BlendComponent {
            operation: BlendOperation::Subtract,
            ..BlendComponent::REPLACE
        };
        let mut odd = descriptor();
        odd.blend.color = subtract;
        odd.blend.alpha = subtract;

        let plain = states.create(&mut factory, &descriptor()).unwrap();
        let normalized = states.create(&mut factory, &odd).unwrap();

        assert_eq!(plain.blend, normalized.blend);
        assert_eq!(states.blend_count(), 1);
        let stored = states.blend(plain.blend.unwrap()).unwrap();
        assert_eq!(stored.color, BlendComponent::REPLACE);
    }

    #[test]
    fn test_failed_create_releases_partial_state() {
        let mut factory = CountingFactory {
            fail_rasterizer: true,
            ..Default::default()
        };
        let mut states = PipelineStates::new();

        assert!(states.create(&mut factory, &descriptor()).is_err());
        assert_eq!(states.blend_count(), 0);
        assert_eq!(states.depth_stencil_count(), 0);
    }

    #[test]
    fn test_release_destroys_with_last_reference() {
        let mut factory = CountingFactory::default();
        let mut states = PipelineStates::new();
        let first = states.create(&mut factory, &descriptor()).unwrap();
        let second = states.create(&mut factory, &descriptor()).unwrap();

        states.release(&first);
        assert_eq!(states.blend_count(), 1);
        states.release(&second);
        assert_eq!(states.blend_count(), 0);
    }

    #[test]
    fn test_samplers_are_created_once() {
        let mut factory = CountingFactory::default();
        let mut states = PipelineStates::new();

        states.sampler(&mut factory, &SamplerDescriptor::POINT_CLAMP).unwrap();
        states.sampler(&mut factory, &SamplerDescriptor::POINT_CLAMP).unwrap();
        states.sampler(&mut factory, &SamplerDescriptor::LINEAR_WRAP).unwrap();

        assert_eq!(states.sampler_count(), 2);
        assert_eq!(factory.created, 2);
    }
}
