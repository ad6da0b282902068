//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::arena::Arena;
use crate::game::input::InputPayload;
use crate::game::race::RacePhase;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Change own display name (ignored if longer than 20 characters)
    SetName { name: String },

    /// Latest control intent, sent at the client's tick rate
    Input(InputPayload),

    /// Racing only: leave the lobby and start the countdown
    Start,

    /// Racing only: back to the lobby from any phase
    Reset,

    /// Ping for latency measurement, answered by the connection itself
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Sent once to a new connection
    Welcome {
        /// Id assigned to this connection
        id: Uuid,
        server_time: u64,
        /// Tag bounds or racing track
        arena: Arena,
        /// Racing only
        #[serde(skip_serializing_if = "Option::is_none")]
        race: Option<RaceStatus>,
        /// Everyone currently connected, the newcomer included
        players: Vec<PlayerSnapshot>,
    },

    /// Another player connected
    PlayerJoined { player: PlayerSnapshot },

    /// A player disconnected
    PlayerLeft { id: Uuid },

    /// Tag only: `id` is now "it"
    RoleChanged { id: Uuid },

    /// Racing only: someone reset the race
    RaceReset,

    /// Full world state, once per tick
    Snapshot {
        tick: u64,
        /// Server wall-clock time in ms
        t: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        race: Option<RaceStatus>,
        players: Vec<PlayerSnapshot>,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Racing phase metadata carried by welcome and snapshot messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceStatus {
    pub phase: RacePhase,
    /// Wall-clock ms of the green light (0 outside a countdown)
    pub countdown_end_at: u64,
    pub laps_to_win: u32,
}

/// Player state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    /// Position X
    pub x: f32,
    /// Position Y
    pub y: f32,
    /// Last input sequence number recorded
    pub last_input_seq: u32,
    #[serde(flatten)]
    pub body: BodySnapshot,
}

/// Mode-specific part of a player snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodySnapshot {
    Runner {
        vel_x: f32,
        vel_y: f32,
        is_it: bool,
        score: u32,
    },
    Car {
        speed: f32,
        /// Heading in radians
        angle: f32,
        lap: u32,
        /// Index of the next waypoint to reach
        checkpoint: usize,
        finished: bool,
        best_lap_ms: Option<u64>,
        last_lap_ms: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_type_tags() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"set_name","name":"Zed"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::SetName { name } if name == "Zed"));

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"start"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Start));

        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"input","seq":3,"left":true,"boost":true}"#).unwrap();
        match msg {
            ClientMsg::Input(input) => {
                assert_eq!(input.seq, Some(3));
                assert!(input.left && input.boost && !input.right);
                assert_eq!(input.throttle, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_string_name_fails_to_parse() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"set_name","name":42}"#).is_err());
    }

    #[test]
    fn player_snapshot_flattens_body_fields() {
        let snapshot = PlayerSnapshot {
            id: Uuid::nil(),
            name: "P1".into(),
            color: "hsl(10, 80%, 60%)".into(),
            x: 1.0,
            y: 2.0,
            last_input_seq: 0,
            body: BodySnapshot::Runner {
                vel_x: 0.0,
                vel_y: 0.0,
                is_it: true,
                score: 4,
            },
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["kind"], "runner");
        assert_eq!(json["is_it"], true);
        assert_eq!(json["score"], 4);
    }

    #[test]
    fn tag_snapshot_omits_race_status() {
        let msg = ServerMsg::Snapshot {
            tick: 1,
            t: 0,
            race: None,
            players: Vec::new(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "snapshot");
        assert!(json.get("race").is_none());
    }
}
