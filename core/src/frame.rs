//! Typed decoding of the engine's action-frame stream.
//!
//! Frames arrive as JSON between turns. Only the breach events are consumed:
//! each entry looks like `[[x, y], damage, unit_type, unit_id, owner_flag]`,
//! where owner flag `1` is the own player and `2` the opponent. Entries with
//! unknown coordinates or owner flags are dropped without failing the frame.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::{arena, CellCoord, Owner};

const OWN_FLAG: u64 = 1;
const OPPONENT_FLAG: u64 = 2;

/// A mobile unit crossing into a player's home edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreachEvent {
    /// Edge cell where the breach happened.
    pub cell: CellCoord,
    /// Owner of the unit that breached.
    pub owner: Owner,
    /// Turn the frame belongs to.
    pub turn: u32,
    /// Index of the frame within the turn.
    pub frame: u32,
}

/// Decoded action frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionFrame {
    /// Turn the frame belongs to.
    pub turn: u32,
    /// Index of the frame within the turn.
    pub frame: u32,
    /// Breaches reported in the frame, in wire order.
    pub breaches: Vec<BreachEvent>,
}

/// Errors that make a whole frame unusable.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The payload was not valid JSON of the expected shape.
    #[error("action frame is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// `turnInfo` did not carry the turn and frame indices.
    #[error("action frame is missing turn information")]
    MissingTurnInfo,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "turnInfo")]
    turn_info: Vec<Value>,
    #[serde(default)]
    events: RawEvents,
}

#[derive(Debug, Default, Deserialize)]
struct RawEvents {
    #[serde(default)]
    breach: Vec<Value>,
}

impl ActionFrame {
    /// Decodes a frame from its JSON representation.
    pub fn decode(raw: &str) -> Result<Self, FrameError> {
        let frame: RawFrame = serde_json::from_str(raw)?;
        let turn = turn_info_field(&frame.turn_info, 1)?;
        let index = turn_info_field(&frame.turn_info, 2)?;

        let breaches = frame
            .events
            .breach
            .iter()
            .filter_map(|entry| {
                let decoded = decode_breach(entry);
                if decoded.is_none() {
                    warn!(turn, frame = index, %entry, "dropping malformed breach entry");
                }
                decoded
            })
            .map(|(cell, owner)| BreachEvent {
                cell,
                owner,
                turn,
                frame: index,
            })
            .collect();

        Ok(Self {
            turn,
            frame: index,
            breaches,
        })
    }

    /// Encodes the frame into the engine's wire format.
    #[must_use]
    pub fn encode(&self) -> String {
        let breaches: Vec<Value> = self
            .breaches
            .iter()
            .map(|breach| {
                let flag = match breach.owner {
                    Owner::Own => OWN_FLAG,
                    Owner::Opponent => OPPONENT_FLAG,
                };
                serde_json::json!([[breach.cell.x(), breach.cell.y()], 1.0, 3, "0", flag])
            })
            .collect();

        serde_json::json!({
            "turnInfo": [1, self.turn, self.frame],
            "events": { "breach": breaches },
        })
        .to_string()
    }

    /// Breaches scored by the opponent's units against the own edge.
    pub fn opponent_breaches(&self) -> impl Iterator<Item = &BreachEvent> {
        self.breaches
            .iter()
            .filter(|breach| breach.owner == Owner::Opponent)
    }
}

fn turn_info_field(turn_info: &[Value], position: usize) -> Result<u32, FrameError> {
    turn_info
        .get(position)
        .and_then(Value::as_u64)
        .and_then(|value| u32::try_from(value).ok())
        .ok_or(FrameError::MissingTurnInfo)
}

fn decode_breach(entry: &Value) -> Option<(CellCoord, Owner)> {
    let fields = entry.as_array()?;
    let location = fields.first()?.as_array()?;
    let x = u32::try_from(location.first()?.as_u64()?).ok()?;
    let y = u32::try_from(location.get(1)?.as_u64()?).ok()?;
    let cell = CellCoord::new(x, y);
    if !arena::contains(cell) {
        return None;
    }

    let owner = match fields.get(4)?.as_u64()? {
        OWN_FLAG => Owner::Own,
        OPPONENT_FLAG => Owner::Opponent,
        _ => return None,
    };
    Some((cell, owner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_breaches_with_owner_flags() {
        let raw = r#"{
            "turnInfo": [1, 7, 42],
            "events": {
                "breach": [
                    [[5, 8], 1.0, 3, "12", 2],
                    [[14, 25], 1.0, 3, "13", 1]
                ],
                "damage": []
            }
        }"#;

        let frame = ActionFrame::decode(raw).expect("frame decodes");
        assert_eq!((frame.turn, frame.frame), (7, 42));
        assert_eq!(frame.breaches.len(), 2);

        let scored: Vec<_> = frame.opponent_breaches().collect();
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].cell, CellCoord::new(5, 8));
        assert_eq!(scored[0].turn, 7);
    }

    #[test]
    fn drops_entries_with_unknown_fields() {
        let raw = r#"{
            "turnInfo": [1, 2, 0],
            "events": {
                "breach": [
                    [[0, 0], 1.0, 3, "1", 2],
                    [[13, 0], 1.0, 3, "2", 9],
                    ["oops"],
                    [[13, 0], 1.0, 3, "3", 2]
                ]
            }
        }"#;

        let frame = ActionFrame::decode(raw).expect("frame decodes");
        assert_eq!(frame.breaches.len(), 1);
        assert_eq!(frame.breaches[0].cell, CellCoord::new(13, 0));
    }

    #[test]
    fn frames_without_events_have_no_breaches() {
        let frame = ActionFrame::decode(r#"{"turnInfo": [1, 0, 3]}"#).expect("frame decodes");
        assert!(frame.breaches.is_empty());
    }

    #[test]
    fn missing_turn_info_fails_the_frame() {
        let result = ActionFrame::decode(r#"{"turnInfo": [1], "events": {}}"#);
        assert!(matches!(result, Err(FrameError::MissingTurnInfo)));
        assert!(matches!(
            ActionFrame::decode("not json"),
            Err(FrameError::InvalidJson(_))
        ));
    }

    #[test]
    fn encoded_frames_decode_to_the_same_breaches() {
        let frame = ActionFrame {
            turn: 4,
            frame: 9,
            breaches: vec![BreachEvent {
                cell: CellCoord::new(0, 13),
                owner: Owner::Opponent,
                turn: 4,
                frame: 9,
            }],
        };
        assert_eq!(ActionFrame::decode(&frame.encode()).expect("decodes"), frame);
    }
}
