//! Session registry: the only owner of Player entities

use uuid::Uuid;

use super::player::Player;

/// Players keyed by connection id, iterated in join order.
///
/// Join order is the tie-break for every "first match wins" rule (tag swaps),
/// so iteration must stay stable across ticks. Removal keeps the relative
/// order of the remaining players. Player counts are small, so lookups are
/// linear scans.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    players: Vec<Player>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player: Player) {
        debug_assert!(self.get(&player.id).is_none(), "duplicate player id");
        self.players.push(player);
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == *id)?;
        Some(self.players.remove(idx))
    }

    pub fn get(&self, id: &Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == *id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::geometry::Vec2;

    fn runner(id: Uuid) -> Player {
        Player::new_runner(id, "p".into(), "red".into(), Vec2::new(50.0, 50.0), 0)
    }

    #[test]
    fn iteration_follows_join_order_after_removal() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut registry = SessionRegistry::new();
        for id in &ids {
            registry.insert(runner(*id));
        }

        assert!(registry.remove(&ids[1]).is_some());
        let order: Vec<Uuid> = registry.iter().map(|p| p.id).collect();
        assert_eq!(order, vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn removing_unknown_id_is_noop() {
        let mut registry = SessionRegistry::new();
        registry.insert(runner(Uuid::new_v4()));
        assert!(registry.remove(&Uuid::new_v4()).is_none());
        assert_eq!(registry.len(), 1);
    }
}
