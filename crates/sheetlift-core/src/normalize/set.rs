use std::collections::HashMap;

use crate::model::Entity;

/// Entities keyed by natural key. A repeated key replaces the stored entity
/// in place, so the set keeps first-seen order with last-seen values.
#[derive(Debug, Clone, Default)]
pub struct EntitySet {
    entities: Vec<Entity>,
    positions: HashMap<String, usize>,
    replaced: u64,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the key was already present.
    pub fn insert(&mut self, entity: Entity) -> bool {
        let key = entity.natural_key().to_string();
        match self.positions.get(&key) {
            Some(position) => {
                self.entities[*position] = entity;
                self.replaced += 1;
                true
            }
            None => {
                self.positions.insert(key, self.entities.len());
                self.entities.push(entity);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn replaced(&self) -> u64 {
        self.replaced
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub fn into_vec(self) -> Vec<Entity> {
        self.entities
    }
}

impl FromIterator<Entity> for EntitySet {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut set = EntitySet::new();
        for entity in iter {
            set.insert(entity);
        }
        set
    }
}
