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
    BufferDescriptor, BufferUsage, ClearFlags, GraphicError, GraphicService, GraphicsBackend,
    Object, Rect, TextureDescriptor, TextureRegion,
};
use ember_infra::{create_driver, HeadlessDriver};
use glam::Vec4;

fn service() -> GraphicService {
    let mut service = GraphicService::new(Box::new(HeadlessDriver::new()));
    service.initialize(None, 32, 32).unwrap();
    service
}

fn vertices(size: u32) -> BufferDescriptor<'static> {
    BufferDescriptor {
        usage: BufferUsage::Vertex,
        size,
        data: None,
    }
}

#[test]
fn test_handles_start_at_one_and_are_recycled() {
    // --- 1. ARRANGE ---
    let mut service = service();
    let first = service.create_buffer(&vertices(16)).unwrap();
    let second = service.create_buffer(&vertices(16)).unwrap();

    // --- 2. ACT ---
    service.delete_buffer(first).unwrap();
    let recycled = service.create_buffer(&vertices(16)).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(first, Object(1));
    assert_eq!(second, Object(2));
    assert_eq!(recycled, Object(1), "freed handles are reused first");
}

#[test]
fn test_failed_creation_returns_its_handle() {
    let mut service = service();

    let rejected = service.create_buffer(&vertices(0));
    let accepted = service.create_buffer(&vertices(4)).unwrap();

    assert!(matches!(rejected, Err(GraphicError::InvalidDescriptor(_))));
    assert_eq!(accepted, Object(1));
}

#[test]
fn test_resource_kinds_have_separate_handle_spaces() {
    let mut service = service();

    let buffer = service.create_buffer(&vertices(4)).unwrap();
    let texture = service.create_texture(&TextureDescriptor::default()).unwrap();

    assert_eq!(buffer, Object(1));
    assert_eq!(texture, Object(1));
    assert_eq!(service.query_texture(texture).unwrap().width, 1);

    service.delete_texture(texture).unwrap();
    assert!(service.query_texture(texture).is_err());
    assert!(service.delete_texture(texture).is_err());
}

#[test]
fn test_frame_through_the_service() {
    let mut service = service();

    service
        .begin(
            Object::NONE,
            Rect::sized(32, 32),
            ClearFlags::ALL,
            Vec4::new(0.0, 1.0, 0.0, 1.0),
            1.0,
            0,
        )
        .unwrap();
    let stats = service.submit(&[]).unwrap();
    service.commit(Object::NONE, true).unwrap();

    assert_eq!(stats.draws, 0);
    assert_eq!(service.capabilities().backend, GraphicsBackend::Headless);
    let texels = service
        .read_texture(Object(1), &TextureRegion::full(1, 1))
        .map(|_| ());
    assert!(texels.is_err(), "the display is not a texture handle");
}

#[test]
fn test_selector_builds_a_working_headless_driver() {
    let mut driver = create_driver(Some(GraphicsBackend::Headless), false);
    driver.initialize(None, 8, 8).unwrap();

    assert_eq!(driver.capabilities().backend, GraphicsBackend::Headless);
    assert!(driver.capabilities().adapters[0].software);
}
