// Entity registry - bounded, first-seen-first-admitted set of tracked entities
use super::chart::PALETTE;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_MAX_ENTITIES: usize = 5;

// Bound on how many refused ids are remembered for warn-once logging.
const MAX_REMEMBERED_REFUSALS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntity {
    pub entity_id: String,
    pub ordinal: usize,
    pub color_slot: usize,
}

impl TrackedEntity {
    fn new(entity_id: String, ordinal: usize) -> Self {
        Self {
            entity_id,
            ordinal,
            color_slot: ordinal % PALETTE.len(),
        }
    }
}

#[derive(Debug)]
pub struct EntityRegistry {
    max_entities: usize,
    entities: Vec<TrackedEntity>,
    index: HashMap<String, usize>,
    refused: HashSet<String>,
}

impl EntityRegistry {
    pub fn new(max_entities: usize) -> Self {
        Self {
            max_entities,
            entities: Vec::new(),
            index: HashMap::new(),
            refused: HashSet::new(),
        }
    }

    /// Look up a tracked entity, admitting it if there is room.
    ///
    /// Once the registry is full, unseen ids are refused for its whole
    /// lifetime; existing entities are never evicted.
    pub fn admit_or_lookup(&mut self, entity_id: &str) -> Option<&TrackedEntity> {
        if let Some(&ordinal) = self.index.get(entity_id) {
            return self.entities.get(ordinal);
        }

        if self.entities.len() >= self.max_entities {
            self.note_refusal(entity_id);
            return None;
        }

        let ordinal = self.entities.len();
        self.entities.push(TrackedEntity::new(entity_id.to_string(), ordinal));
        self.index.insert(entity_id.to_string(), ordinal);

        tracing::info!(entity_id, ordinal, "Tracking new entity");
        self.entities.last()
    }

    #[cfg(test)]
    pub fn get(&self, entity_id: &str) -> Option<&TrackedEntity> {
        self.index
            .get(entity_id)
            .and_then(|&ordinal| self.entities.get(ordinal))
    }

    /// Tracked entities in admission order.
    pub fn entities(&self) -> &[TrackedEntity] {
        &self.entities
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn note_refusal(&mut self, entity_id: &str) {
        if self.refused.contains(entity_id) || self.refused.len() >= MAX_REMEMBERED_REFUSALS {
            tracing::debug!(entity_id, "Entity capacity reached, ignoring message");
            return;
        }

        self.refused.insert(entity_id.to_string());
        tracing::warn!(
            entity_id,
            max_entities = self.max_entities,
            "Entity capacity reached, ignoring entity"
        );
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTITIES)
    }
}
