//! The simulation world and its fixed-step tick
//!
//! `SimulationWorld` owns every piece of mutable game state: the session
//! registry, the mode state machine and the RNG. Nothing else holds a
//! reference between calls. Every method runs to completion, so whoever owns
//! the world (the game loop task) gets mutual exclusion between message
//! handling and ticks for free.
//!
//! Notifications that must reach clients outside the periodic snapshot
//! (joins, leaves, role changes, race resets) are queued in an outbox and
//! drained by the owner after each call.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::GameMode;
use crate::ws::protocol::{ClientMsg, PlayerSnapshot, RaceStatus, ServerMsg};

use super::arena::{Arena, Track, WorldBounds};
use super::input::{self, InputPayload};
use super::physics::PhysicsSystem;
use super::player::Player;
use super::race::RaceMode;
use super::registry::SessionRegistry;
use super::snapshot::SnapshotBuilder;
use super::tag::TagMode;

/// Mode-specific global state
#[derive(Debug, Clone)]
pub enum ModeState {
    Tag(TagMode),
    Racing(RaceMode),
}

pub struct SimulationWorld {
    tick: u64,
    registry: SessionRegistry,
    mode: ModeState,
    rng: ChaCha8Rng,
    outbox: Vec<ServerMsg>,
}

impl SimulationWorld {
    pub fn new(mode: GameMode, laps_to_win: u32, seed: u64) -> Self {
        match mode {
            GameMode::Tag => Self::tag(WorldBounds::default(), seed),
            GameMode::Racing => Self::racing(Track::default(), laps_to_win, seed),
        }
    }

    pub fn tag(bounds: WorldBounds, seed: u64) -> Self {
        Self::with_mode(ModeState::Tag(TagMode::new(bounds)), seed)
    }

    pub fn racing(track: Track, laps_to_win: u32, seed: u64) -> Self {
        Self::with_mode(ModeState::Racing(RaceMode::new(track, laps_to_win)), seed)
    }

    fn with_mode(mode: ModeState, seed: u64) -> Self {
        Self {
            tick: 0,
            registry: SessionRegistry::new(),
            mode,
            rng: ChaCha8Rng::seed_from_u64(seed),
            outbox: Vec::new(),
        }
    }

    pub fn game_mode(&self) -> GameMode {
        match self.mode {
            ModeState::Tag(_) => GameMode::Tag,
            ModeState::Racing(_) => GameMode::Racing,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn player(&self, id: &Uuid) -> Option<&Player> {
        self.registry.get(id)
    }

    pub fn tag_mode(&self) -> Option<&TagMode> {
        match &self.mode {
            ModeState::Tag(tag) => Some(tag),
            ModeState::Racing(_) => None,
        }
    }

    pub fn race(&self) -> Option<&RaceMode> {
        match &self.mode {
            ModeState::Racing(race) => Some(race),
            ModeState::Tag(_) => None,
        }
    }

    pub fn arena(&self) -> Arena {
        match &self.mode {
            ModeState::Tag(tag) => Arena::Tag(tag.bounds),
            ModeState::Racing(race) => Arena::Racing(race.track.clone()),
        }
    }

    /// Notifications queued since the last drain, oldest first
    pub fn drain_notifications(&mut self) -> Vec<ServerMsg> {
        std::mem::take(&mut self.outbox)
    }

    /// Creates a player for a new connection and returns its welcome message.
    /// Everyone already connected is notified through the outbox.
    pub fn connect(&mut self, now: u64) -> (Uuid, ServerMsg) {
        let id = Uuid::new_v4();
        let ordinal = self.registry.len() + 1;
        let hue = self.rng.gen_range(0..360);

        let player = match &mut self.mode {
            ModeState::Tag(tag) => {
                let spawn = tag.spawn_point(&mut self.rng);
                Player::new_runner(
                    id,
                    format!("P{}", ordinal),
                    format!("hsl({}, 80%, 60%)", hue),
                    spawn,
                    now,
                )
            }
            ModeState::Racing(race) => Player::new_car(
                id,
                format!("Driver {}", ordinal),
                format!("hsl({}, 85%, 55%)", hue),
                &race.track,
                ordinal - 1,
                now,
            ),
        };
        self.registry.insert(player);

        match &mut self.mode {
            ModeState::Tag(tag) => tag.on_join(&mut self.registry, id),
            ModeState::Racing(race) => race.on_join(&mut self.registry, id, now),
        }

        info!(player_id = %id, player_count = self.registry.len(), "player connected");

        if let Some(player) = self.registry.get(&id) {
            self.outbox.push(ServerMsg::PlayerJoined {
                player: PlayerSnapshot::from(player),
            });
        }
        (id, self.welcome(id, now))
    }

    /// Removes the player. Unknown ids are a no-op.
    pub fn disconnect(&mut self, id: &Uuid) -> bool {
        if self.registry.remove(id).is_none() {
            debug!(player_id = %id, "disconnect for unknown player ignored");
            return false;
        }

        info!(player_id = %id, player_count = self.registry.len(), "player disconnected");
        self.outbox.push(ServerMsg::PlayerLeft { id: *id });

        match &mut self.mode {
            ModeState::Tag(tag) => {
                if let Some(new_it) = tag.on_leave(&mut self.registry, *id, &mut self.rng) {
                    self.outbox.push(ServerMsg::RoleChanged { id: new_it });
                }
            }
            ModeState::Racing(race) => {
                if self.registry.is_empty() {
                    race.reset(&mut self.registry);
                }
            }
        }
        true
    }

    pub fn apply_input(&mut self, id: &Uuid, payload: &InputPayload, now: u64) -> bool {
        input::apply_input(&mut self.registry, id, payload, now)
    }

    pub fn set_name(&mut self, id: &Uuid, name: &str) -> bool {
        input::set_name(&mut self.registry, id, name)
    }

    /// Racing start request. Ignored in tag or outside the lobby.
    pub fn request_start(&mut self, now: u64) -> bool {
        match &mut self.mode {
            ModeState::Racing(race) => race.request_start(&self.registry, now),
            ModeState::Tag(_) => false,
        }
    }

    /// Racing reset request, valid from any phase. Ignored in tag.
    pub fn request_reset(&mut self) -> bool {
        match &mut self.mode {
            ModeState::Racing(race) => {
                race.reset(&mut self.registry);
                self.outbox.push(ServerMsg::RaceReset);
                true
            }
            ModeState::Tag(_) => false,
        }
    }

    /// Applies one client message from `id`
    pub fn handle_message(&mut self, id: &Uuid, msg: ClientMsg, now: u64) {
        match msg {
            ClientMsg::SetName { name } => {
                self.set_name(id, &name);
            }
            ClientMsg::Input(payload) => {
                self.apply_input(id, &payload, now);
            }
            ClientMsg::Start => {
                if self.registry.contains(id) {
                    self.request_start(now);
                }
            }
            ClientMsg::Reset => {
                if self.registry.contains(id) {
                    self.request_reset();
                }
            }
            ClientMsg::Ping { .. } => {}
        }
    }

    /// Advances the world by one fixed step and returns the snapshot to
    /// broadcast. Order: clock-driven phase changes, integration of every
    /// player, interactions, snapshot.
    pub fn tick(&mut self, now: u64) -> ServerMsg {
        self.tick += 1;

        match &mut self.mode {
            ModeState::Tag(tag) => {
                for player in self.registry.iter_mut() {
                    PhysicsSystem::update_runner(player, &tag.bounds, &tag.stats);
                }
                if let Some(new_it) = tag.resolve_tags(&mut self.registry) {
                    self.outbox.push(ServerMsg::RoleChanged { id: new_it });
                }
            }
            ModeState::Racing(race) => {
                race.update_phase(&mut self.registry, now);
                // Cars are integrated and checked one by one: off-road friction
                // and checkpoints depend on the position just computed
                race.step(&mut self.registry, now);
            }
        }

        self.snapshot(now)
    }

    /// Current state as a snapshot message. Read-only.
    pub fn snapshot(&self, now: u64) -> ServerMsg {
        SnapshotBuilder::build(self.tick, now, &self.registry, self.race())
    }

    pub fn welcome(&self, id: Uuid, now: u64) -> ServerMsg {
        ServerMsg::Welcome {
            id,
            server_time: now,
            arena: self.arena(),
            race: self.race().map(RaceStatus::from),
            players: SnapshotBuilder::players(&self.registry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::race::RacePhase;

    fn it_count(world: &SimulationWorld) -> usize {
        world.registry().iter().filter(|p| p.is_it()).count()
    }

    #[test]
    fn connect_queues_join_and_returns_welcome() {
        let mut world = SimulationWorld::new(GameMode::Tag, 3, 42);
        let (first, _) = world.connect(0);
        world.drain_notifications();

        let (second, welcome) = world.connect(10);
        match welcome {
            ServerMsg::Welcome { id, players, race, .. } => {
                assert_eq!(id, second);
                assert_eq!(players.len(), 2);
                assert_eq!(players[0].id, first);
                assert!(race.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }

        let notes = world.drain_notifications();
        assert!(matches!(&notes[..], [ServerMsg::PlayerJoined { player }] if player.id == second));
        assert_eq!(world.player(&second).unwrap().name, "P2");
    }

    #[test]
    fn exactly_one_it_through_churn() {
        let mut world = SimulationWorld::new(GameMode::Tag, 3, 9);
        let ids: Vec<Uuid> = (0..5).map(|_| world.connect(0).0).collect();
        assert_eq!(it_count(&world), 1);

        for id in &ids {
            world.disconnect(id);
            world.tick(0);
            let expected = if world.registry().is_empty() { 0 } else { 1 };
            assert_eq!(it_count(&world), expected);
        }
        assert!(world.tag_mode().unwrap().it_id().is_none());
    }

    #[test]
    fn it_leaving_announces_successor() {
        let mut world = SimulationWorld::new(GameMode::Tag, 3, 9);
        let (it, _) = world.connect(0);
        let (other, _) = world.connect(0);
        world.drain_notifications();

        world.disconnect(&it);
        let notes = world.drain_notifications();
        assert!(matches!(notes[0], ServerMsg::PlayerLeft { id } if id == it));
        assert!(matches!(notes[1], ServerMsg::RoleChanged { id } if id == other));
    }

    #[test]
    fn disconnect_unknown_is_noop() {
        let mut world = SimulationWorld::new(GameMode::Racing, 3, 1);
        world.connect(0);
        world.drain_notifications();
        assert!(!world.disconnect(&Uuid::new_v4()));
        assert!(world.drain_notifications().is_empty());
    }

    #[test]
    fn empty_registry_resets_race() {
        let mut world = SimulationWorld::new(GameMode::Racing, 3, 1);
        let (id, _) = world.connect(0);
        assert!(world.request_start(0));
        world.tick(3_000);
        assert_eq!(world.race().unwrap().phase(), RacePhase::Running);

        world.disconnect(&id);
        assert_eq!(world.race().unwrap().phase(), RacePhase::Lobby);
    }

    #[test]
    fn racers_get_grid_slots_in_join_order() {
        let mut world = SimulationWorld::new(GameMode::Racing, 3, 1);
        let ids: Vec<Uuid> = (0..5).map(|_| world.connect(0).0).collect();
        let track = world.race().unwrap().track.clone();
        for (slot, id) in ids.iter().enumerate() {
            assert_eq!(world.player(id).unwrap().position(), track.spawn_slot(slot));
        }
        assert_eq!(world.player(&ids[2]).unwrap().name, "Driver 3");
    }

    #[test]
    fn reset_request_is_broadcast_in_racing_only() {
        let mut racing = SimulationWorld::new(GameMode::Racing, 3, 1);
        let (id, _) = racing.connect(0);
        racing.drain_notifications();
        racing.handle_message(&id, ClientMsg::Reset, 0);
        assert!(matches!(&racing.drain_notifications()[..], [ServerMsg::RaceReset]));

        let mut tag = SimulationWorld::new(GameMode::Tag, 3, 1);
        let (id, _) = tag.connect(0);
        tag.drain_notifications();
        tag.handle_message(&id, ClientMsg::Reset, 0);
        tag.handle_message(&id, ClientMsg::Start, 0);
        assert!(tag.drain_notifications().is_empty());
    }

    #[test]
    fn snapshot_does_not_mutate_state() {
        let mut world = SimulationWorld::new(GameMode::Tag, 3, 5);
        world.connect(0);
        world.connect(0);
        world.drain_notifications();
        world.tick(0);

        let a = world.snapshot(100);
        let b = world.snapshot(100);
        match (a, b) {
            (
                ServerMsg::Snapshot { tick: ta, players: pa, .. },
                ServerMsg::Snapshot { tick: tb, players: pb, .. },
            ) => {
                assert_eq!(ta, tb);
                assert_eq!(pa, pb);
            }
            _ => panic!("expected snapshots"),
        }
        assert_eq!(world.tick_count(), 1);
        assert!(world.drain_notifications().is_empty());
    }

    #[test]
    fn same_seed_spawns_identically() {
        let mut a = SimulationWorld::new(GameMode::Tag, 3, 77);
        let mut b = SimulationWorld::new(GameMode::Tag, 3, 77);
        let (ia, _) = a.connect(0);
        let (ib, _) = b.connect(0);
        let (pa, pb) = (a.player(&ia).unwrap(), b.player(&ib).unwrap());
        assert_eq!(pa.position(), pb.position());
        assert_eq!(pa.color, pb.color);
    }
}
