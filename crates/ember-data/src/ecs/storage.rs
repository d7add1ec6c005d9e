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

use super::component::Component;
use super::entity::Entity;
use std::{any::Any, collections::HashMap};

/// Type-erased access to a component column.
///
/// Lets the world move values between entities and hand out `dyn Any` views
/// without knowing the concrete `Column<T>`.
pub(crate) trait ErasedColumn {
    /// Casts the column to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Casts the column to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn contains(&self, entity: Entity) -> bool;

    /// Drops the value of `entity`. Returns `false` if it had none.
    fn remove(&mut self, entity: Entity) -> bool;

    /// Stores a default value for `entity` unless one already exists.
    fn insert_default(&mut self, entity: Entity) -> bool;

    /// Clones the value of `from` onto `to`.
    fn copy_value(&mut self, from: Entity, to: Entity) -> bool;

    fn value(&self, entity: Entity) -> Option<&dyn Any>;

    fn value_mut(&mut self, entity: Entity) -> Option<&mut dyn Any>;
}

/// Densely packed values indexed through a sparse entity map.
#[derive(Debug)]
pub(crate) struct SparseSet<T> {
    dense: Vec<T>,
    entities: Vec<Entity>,
    sparse: HashMap<Entity, usize>,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self {
            dense: Vec::new(),
            entities: Vec::new(),
            sparse: HashMap::new(),
        }
    }
}

impl<T> SparseSet<T> {
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.sparse.get(&entity).map(|&index| &self.dense[index])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let index = *self.sparse.get(&entity)?;
        self.dense.get_mut(index)
    }

    /// Stores `value`, returning the previous one.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        if let Some(&index) = self.sparse.get(&entity) {
            return Some(std::mem::replace(&mut self.dense[index], value));
        }
        self.sparse.insert(entity, self.dense.len());
        self.dense.push(value);
        self.entities.push(entity);
        None
    }

    /// Swap-removes the value of `entity`.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let index = self.sparse.remove(&entity)?;
        let value = self.dense.swap_remove(index);
        self.entities.swap_remove(index);
        if let Some(&moved) = self.entities.get(index) {
            self.sparse.insert(moved, index);
        }
        Some(value)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.sparse.contains_key(&entity)
    }
}

/// Storage for one component id.
///
/// `Packed` values may move when others are removed. `Stable` values are
/// boxed individually and keep their address for the lifetime of the entry.
#[derive(Debug)]
pub(crate) enum Column<T> {
    Packed(SparseSet<T>),
    Stable(HashMap<Entity, Box<T>>),
}

impl<T> Column<T> {
    pub fn new(sparse: bool) -> Self {
        if sparse {
            Column::Stable(HashMap::new())
        } else {
            Column::Packed(SparseSet::default())
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        match self {
            Column::Packed(set) => set.get(entity),
            Column::Stable(map) => map.get(&entity).map(|value| &**value),
        }
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        match self {
            Column::Packed(set) => set.get_mut(entity),
            Column::Stable(map) => map.get_mut(&entity).map(|value| &mut **value),
        }
    }

    pub fn insert(&mut self, entity: Entity, value: T) {
        match self {
            Column::Packed(set) => {
                set.insert(entity, value);
            }
            Column::Stable(map) => match map.get_mut(&entity) {
                // Overwrite in place so the boxed address survives.
                Some(slot) => **slot = value,
                None => {
                    map.insert(entity, Box::new(value));
                }
            },
        }
    }

    pub fn take(&mut self, entity: Entity) -> Option<T> {
        match self {
            Column::Packed(set) => set.remove(entity),
            Column::Stable(map) => map.remove(&entity).map(|value| *value),
        }
    }

    pub fn has(&self, entity: Entity) -> bool {
        match self {
            Column::Packed(set) => set.contains(entity),
            Column::Stable(map) => map.contains_key(&entity),
        }
    }
}

impl<T: Component + Default + Clone> ErasedColumn for Column<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn contains(&self, entity: Entity) -> bool {
        self.has(entity)
    }

    fn remove(&mut self, entity: Entity) -> bool {
        self.take(entity).is_some()
    }

    fn insert_default(&mut self, entity: Entity) -> bool {
        if self.has(entity) {
            return false;
        }
        self.insert(entity, T::default());
        true
    }

    fn copy_value(&mut self, from: Entity, to: Entity) -> bool {
        match self.get(from).cloned() {
            Some(value) => {
                self.insert(to, value);
                true
            }
            None => false,
        }
    }

    fn value(&self, entity: Entity) -> Option<&dyn Any> {
        self.get(entity).map(|value| value as &dyn Any)
    }

    fn value_mut(&mut self, entity: Entity) -> Option<&mut dyn Any> {
        self.get_mut(entity).map(|value| value as &mut dyn Any)
    }
}

/// Column constructor stored in the component registry.
pub(crate) fn new_column<T: Component + Default + Clone>(sparse: bool) -> Box<dyn ErasedColumn> {
    Box::new(Column::<T>::new(sparse))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Health(u32);
    impl Component for Health {}

    fn e(raw: u64) -> Entity {
        Entity::from_raw(raw)
    }

    #[test]
    fn test_swap_remove_keeps_index_consistent() {
        let mut set = SparseSet::default();
        set.insert(e(1), 10);
        set.insert(e(2), 20);
        set.insert(e(3), 30);

        assert_eq!(set.remove(e(1)), Some(10));
        assert_eq!(set.get(e(3)), Some(&30));
        assert_eq!(set.get(e(2)), Some(&20));
        assert_eq!(set.dense.len(), 2);
        assert_eq!(set.remove(e(1)), None);
    }

    #[test]
    fn test_stable_column_keeps_addresses() {
        let mut column = Column::<Health>::new(true);
        column.insert(e(1), Health(1));
        let before = column.get(e(1)).map(|value| value as *const Health);

        for raw in 2..100 {
            column.insert(e(raw), Health(raw as u32));
        }
        column.remove(e(50));
        column.insert(e(1), Health(7));

        let after = column.get(e(1)).map(|value| value as *const Health);
        assert_eq!(before, after);
        assert_eq!(column.get(e(1)), Some(&Health(7)));
    }

    #[test]
    fn test_erased_operations() {
        let mut column = new_column::<Health>(false);
        assert!(column.insert_default(e(1)));
        assert!(!column.insert_default(e(1)));

        if let Some(value) = column.value_mut(e(1)).and_then(|v| v.downcast_mut::<Health>()) {
            value.0 = 42;
        }
        assert!(column.copy_value(e(1), e(2)));
        assert_eq!(
            column.value(e(2)).and_then(|v| v.downcast_ref::<Health>()),
            Some(&Health(42))
        );
        assert!(!column.copy_value(e(9), e(3)));
        assert!(column.contains(e(2)));
        assert!(column.remove(e(1)));
        assert!(!column.contains(e(1)));
    }
}
