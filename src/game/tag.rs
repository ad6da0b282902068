//! Tag rules: who is "it", tag swaps and scoring
//!
//! Tag has no phases. The only state is the current "it" holder, which is
//! set whenever at least one player is connected and cleared when the last
//! one leaves.

use rand::Rng;
use tracing::info;
use uuid::Uuid;

use super::arena::WorldBounds;
use super::geometry::Vec2;
use super::physics::RunnerStats;
use super::registry::SessionRegistry;

/// Distance under which the "it" player tags someone
pub const TAG_RADIUS: f32 = 28.0;
/// Spawn points keep this far from the arena edges
pub const SPAWN_MARGIN: f32 = 20.0;

#[derive(Debug, Clone)]
pub struct TagMode {
    pub bounds: WorldBounds,
    pub stats: RunnerStats,
    pub tag_radius: f32,
    it_id: Option<Uuid>,
}

impl TagMode {
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            stats: RunnerStats::default(),
            tag_radius: TAG_RADIUS,
            it_id: None,
        }
    }

    pub fn it_id(&self) -> Option<Uuid> {
        self.it_id
    }

    /// Uniform spawn inside the arena minus the spawn margin
    pub fn spawn_point<R: Rng>(&self, rng: &mut R) -> Vec2 {
        let (min, max) = self.bounds.inset(SPAWN_MARGIN);
        Vec2::new(rng.gen_range(min.x..=max.x), rng.gen_range(min.y..=max.y))
    }

    /// The first player to arrive in an empty arena becomes "it"
    pub fn on_join(&mut self, registry: &mut SessionRegistry, id: Uuid) {
        if self.it_id.is_some() {
            return;
        }
        if let Some(runner) = registry.get_mut(&id).and_then(|p| p.runner_mut()) {
            runner.is_it = true;
            self.it_id = Some(id);
            info!(player_id = %id, "first player is it");
        }
    }

    /// Called after `removed` has left the registry. Draws a new "it" uniformly
    /// among the remaining players when the holder left, and returns it.
    pub fn on_leave<R: Rng>(
        &mut self,
        registry: &mut SessionRegistry,
        removed: Uuid,
        rng: &mut R,
    ) -> Option<Uuid> {
        if self.it_id != Some(removed) {
            return None;
        }

        self.it_id = None;
        if registry.is_empty() {
            return None;
        }

        let idx = rng.gen_range(0..registry.len());
        let successor = &mut registry.as_mut_slice()[idx];
        if let Some(runner) = successor.runner_mut() {
            runner.is_it = true;
        }
        self.it_id = Some(successor.id);
        info!(player_id = %successor.id, "it left, new it drawn");
        self.it_id
    }

    /// Checks every other player against the "it" player, in join order.
    /// The first one within the tag radius becomes "it" and scores a point.
    /// At most one swap per call; returns the new holder.
    pub fn resolve_tags(&mut self, registry: &mut SessionRegistry) -> Option<Uuid> {
        let it_id = self.it_id?;
        let it_pos = registry.get(&it_id)?.position();

        let tagged = registry
            .iter()
            .filter(|p| p.id != it_id)
            .find(|p| p.position().distance(it_pos) < self.tag_radius)
            .map(|p| p.id)?;

        if let Some(runner) = registry.get_mut(&it_id).and_then(|p| p.runner_mut()) {
            runner.is_it = false;
        }
        if let Some(runner) = registry.get_mut(&tagged).and_then(|p| p.runner_mut()) {
            runner.is_it = true;
            runner.score += 1;
        }
        self.it_id = Some(tagged);

        info!(from = %it_id, to = %tagged, "tag");
        Some(tagged)
    }
}
