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

use std::fmt;

/// Components occupy ids `[0, COMPONENT_LIMIT)`.
pub const COMPONENT_LIMIT: u64 = 1024;
/// First id of the archetype range.
pub const ARCHETYPE_BASE: u64 = 1024;
/// First id of the runtime entity range.
pub const ENTITY_BASE: u64 = 65535;
/// Capacity of the archetype handle allocator. Archetype ids are
/// `ARCHETYPE_BASE + n` for `n` in `[1, ARCHETYPE_CAPACITY)`, so offset zero
/// can mean "no archetype" on disk.
pub const ARCHETYPE_CAPACITY: u32 = (ENTITY_BASE - ARCHETYPE_BASE) as u32;

const PAIR_FLAG: u64 = 1 << 63;
const RELATION_MASK: u64 = 0x7FFF_FFFF;
const TARGET_MASK: u64 = 0xFFFF_FFFF;

/// A 64-bit ECS identifier: an entity, a component or a pair.
///
/// Pairs set the top bit and pack the relation in bits `32..63` and the
/// target in bits `0..32`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Entity(u64);

impl Entity {
    /// The null id; never alive.
    pub const NULL: Entity = Entity(0);

    /// Wraps a raw id.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit id.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Encodes a `(relation, target)` pair.
    pub const fn pair(relation: Entity, target: Entity) -> Entity {
        Entity(PAIR_FLAG | ((relation.0 & RELATION_MASK) << 32) | (target.0 & TARGET_MASK))
    }

    /// Returns `true` if the id encodes a pair.
    #[inline]
    pub const fn is_pair(self) -> bool {
        self.0 & PAIR_FLAG != 0
    }

    /// The relation of a pair.
    pub fn relation(self) -> Option<Entity> {
        self.is_pair()
            .then(|| Entity((self.0 >> 32) & RELATION_MASK))
    }

    /// The target of a pair.
    pub fn target(self) -> Option<Entity> {
        self.is_pair().then(|| Entity(self.0 & TARGET_MASK))
    }

    /// Returns `true` for the null id.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the id lies in the component range.
    pub fn is_component_id(self) -> bool {
        !self.is_pair() && self.0 < COMPONENT_LIMIT
    }

    /// Returns `true` if the id lies in the archetype range.
    pub fn is_archetype_id(self) -> bool {
        !self.is_pair() && (ARCHETYPE_BASE..ENTITY_BASE).contains(&self.0)
    }

    /// Returns `true` if the id lies in the runtime entity range.
    pub fn is_runtime_id(self) -> bool {
        !self.is_pair() && self.0 >= ENTITY_BASE
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.relation(), self.target()) {
            (Some(relation), Some(target)) => write!(f, "Pair({}, {})", relation.0, target.0),
            _ => write!(f, "Entity({})", self.0),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.relation(), self.target()) {
            (Some(relation), Some(target)) => write!(f, "({}, {})", relation.0, target.0),
            _ => write!(f, "#{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_round_trip() {
        let relation = Entity::from_raw(3);
        let target = Entity::from_raw(70_000);
        let pair = Entity::pair(relation, target);

        assert!(pair.is_pair());
        assert_eq!(pair.relation(), Some(relation));
        assert_eq!(pair.target(), Some(target));
        assert!(!pair.is_component_id());
        assert!(!pair.is_runtime_id());
        assert_eq!(relation.target(), None);
    }

    #[test]
    fn test_ranges_are_disjoint() {
        assert!(Entity::from_raw(1023).is_component_id());
        assert!(!Entity::from_raw(1023).is_archetype_id());
        assert!(Entity::from_raw(1024).is_archetype_id());
        assert!(Entity::from_raw(65534).is_archetype_id());
        assert!(!Entity::from_raw(65534).is_runtime_id());
        assert!(Entity::from_raw(65535).is_runtime_id());
        assert_eq!(ARCHETYPE_CAPACITY, 64511);
    }
}
