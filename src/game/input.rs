//! Input ingestion: validate once at the boundary, then write into the player

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::player::{Body, CarControls, TagControls, MAX_NAME_LEN};
use super::registry::SessionRegistry;

/// Inbound control message. Every field is optional on the wire.
///
/// Defaults: missing flags are `false`, missing axes are `0.0`, a missing or
/// zero `seq` keeps the previously recorded sequence number. Tag reads only the
/// flags, racing reads only the axes; the rest is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputPayload {
    #[serde(default)]
    pub seq: Option<u32>,

    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub boost: bool,

    #[serde(default, alias = "t")]
    pub throttle: Option<f32>,
    #[serde(default, alias = "s")]
    pub steer: Option<f32>,
    #[serde(default, alias = "b")]
    pub brake: Option<f32>,
}

impl InputPayload {
    pub fn tag_controls(&self) -> TagControls {
        TagControls {
            up: self.up,
            down: self.down,
            left: self.left,
            right: self.right,
            boost: self.boost,
        }
    }

    pub fn car_controls(&self) -> CarControls {
        CarControls {
            throttle: clamp_axis(self.throttle, 0.0, 1.0),
            steer: clamp_axis(self.steer, -1.0, 1.0),
            brake: clamp_axis(self.brake, 0.0, 1.0),
        }
    }
}

/// Missing or non-finite values read as zero, everything else is clamped
fn clamp_axis(value: Option<f32>, min: f32, max: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() => v.clamp(min, max),
        _ => 0.0,
    }
}

/// Stores the latest intent for `id`. Last write wins; sequence numbers are
/// recorded but never used to reorder or drop messages.
///
/// Returns false when `id` is no longer registered.
pub fn apply_input(registry: &mut SessionRegistry, id: &Uuid, input: &InputPayload, now: u64) -> bool {
    let Some(player) = registry.get_mut(id) else {
        debug!(player_id = %id, "input for unknown player ignored");
        return false;
    };

    if let Some(seq) = input.seq.filter(|s| *s != 0) {
        player.last_input_seq = seq;
    }
    player.last_seen = now;

    match &mut player.body {
        Body::Runner(runner) => runner.controls = input.tag_controls(),
        Body::Car(car) => car.controls = input.car_controls(),
    }
    true
}

/// Renames `id` if the name fits. Over-long names are ignored silently.
pub fn set_name(registry: &mut SessionRegistry, id: &Uuid, name: &str) -> bool {
    if name.chars().count() > MAX_NAME_LEN {
        debug!(player_id = %id, "name too long, ignored");
        return false;
    }
    match registry.get_mut(id) {
        Some(player) => {
            player.name = name.to_string();
            true
        }
        None => false,
    }
}
