//! The entity registry seam and player controller slots.
//!
//! Connections never hold live entities. They store [`EntityId`]s and go
//! through an [`EntityRegistry`] whenever they need to act on one, so an id
//! whose entity has been destroyed simply fails to resolve.

pub use hlnet_protocol::EntityId;

/// A resolved, live entity as handed out by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    pub id: EntityId,
    /// Registry-defined generation, distinguishing reuses of the same id.
    pub generation: u32,
}

/// External lookup from network ids to live entities, plus the
/// interest-management notifications a connection produces.
///
/// All methods take `&self`; implementations use interior mutability.
pub trait EntityRegistry {
    fn resolve(&self, id: EntityId) -> Option<EntityHandle>;

    /// Drops client authority over a live entity.
    fn clear_client_owner(&self, entity: &EntityHandle);

    /// Stops `connection_id` observing `id`.
    fn remove_observer(&self, id: EntityId, connection_id: i32);

    fn show_for_connection(&self, id: EntityId, connection_id: i32);

    fn hide_for_connection(&self, id: EntityId, connection_id: i32);
}

/// A player slot on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerController {
    pub player_controller_id: i16,
    pub entity_id: EntityId,
}

impl PlayerController {
    pub fn new(player_controller_id: i16, entity_id: EntityId) -> Self {
        Self {
            player_controller_id,
            entity_id,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.entity_id.is_none()
    }
}
