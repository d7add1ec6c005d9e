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

//! A fixed-capacity free list of small integer handles.

/// Issues and recycles integer handles from the range `[1, capacity)`.
///
/// Handle `0` is never issued and stands for "invalid". Freed handles are
/// reused most-recent first. The allocator performs no double-free detection,
/// so callers must only free handles they currently own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleAllocator {
    free: Vec<u32>,
    capacity: u32,
}

impl HandleAllocator {
    /// Creates an allocator issuing handles in `[1, capacity)`.
    ///
    /// The free stack is filled in descending order so the first call to
    /// [`allocate`](Self::allocate) returns `1`.
    pub fn new(capacity: u32) -> Self {
        Self {
            free: (1..capacity).rev().collect(),
            capacity,
        }
    }

    /// Pops the most recently freed handle, or `None` once exhausted.
    pub fn allocate(&mut self) -> Option<u32> {
        self.free.pop()
    }

    /// Returns `id` to the pool.
    pub fn free(&mut self, id: u32) {
        debug_assert!(id != 0 && id < self.capacity, "handle {id} out of range");
        self.free.push(id);
    }

    /// Claims a specific handle, for callers that must recreate objects at
    /// known ids (e.g. while loading saved data).
    ///
    /// Returns `false` if the handle is out of range or already taken.
    pub fn reserve(&mut self, id: u32) -> bool {
        match self.free.iter().rposition(|&free| free == id) {
            Some(position) => {
                self.free.remove(position);
                true
            }
            None => false,
        }
    }

    /// Number of handles that can still be allocated.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// The exclusive upper bound of issued handles.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_first_allocation_is_one() {
        let mut allocator = HandleAllocator::new(8);
        assert_eq!(allocator.allocate(), Some(1));
        assert_eq!(allocator.allocate(), Some(2));
    }

    #[test]
    fn test_exhausts_after_capacity_minus_one() {
        let mut allocator = HandleAllocator::new(4);
        let issued: Vec<_> = std::iter::from_fn(|| allocator.allocate()).collect();
        assert_eq!(issued, vec![1, 2, 3]);
        assert_eq!(allocator.allocate(), None);
        assert_eq!(allocator.available(), 0);
    }

    #[test]
    fn test_freed_handles_are_reused_most_recent_first() {
        let mut allocator = HandleAllocator::new(16);
        let a = allocator.allocate().unwrap();
        let b = allocator.allocate().unwrap();
        allocator.free(a);
        allocator.free(b);
        assert_eq!(allocator.allocate(), Some(b));
        assert_eq!(allocator.allocate(), Some(a));
    }

    #[test]
    fn test_live_handles_are_unique_and_in_range() {
        let capacity = 64;
        let mut allocator = HandleAllocator::new(capacity);
        let mut live = HashSet::new();

        // Interleave allocations and frees without ever double-freeing.
        for step in 0..500u32 {
            if step % 3 == 2 && !live.is_empty() {
                let id = *live.iter().next().unwrap();
                live.remove(&id);
                allocator.free(id);
            } else if let Some(id) = allocator.allocate() {
                assert!((1..capacity).contains(&id));
                assert!(live.insert(id), "handle {id} issued twice");
            }
        }
    }

    #[test]
    fn test_reserve_claims_specific_handles() {
        let mut allocator = HandleAllocator::new(8);
        assert!(allocator.reserve(5));
        assert!(!allocator.reserve(5));
        assert!(!allocator.reserve(0));
        assert!(!allocator.reserve(42));

        let issued: Vec<_> = std::iter::from_fn(|| allocator.allocate()).collect();
        assert_eq!(issued, vec![1, 2, 3, 4, 6, 7]);
    }
}
