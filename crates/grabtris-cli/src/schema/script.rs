use grabtris_engine::{GameConfig, PieceSeed};
use serde::{Deserialize, Serialize};

/// Recorded input for a headless session, replayed event by event.
///
/// `config` and `seed` are optional; command-line options take precedence over them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub config: Option<GameConfig>,
    pub seed: Option<PieceSeed>,
    pub events: Vec<ScriptEvent>,
}

/// One input forwarded to the session. Coordinates are board cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ScriptEvent {
    /// Advance the clock to `at_ms` milliseconds after the session start.
    Tick { at_ms: u64 },
    PointerMoved { x: i32, y: i32 },
    PointerDown { x: i32, y: i32 },
    Rotate,
    Shift { dx: i32 },
    SoftDrop,
    PickFromConveyor { slot: usize },
}

#[cfg(test)]
mod tests {
    use grabtris_engine::SettleMode;

    use super::*;

    #[test]
    fn test_parse_script() {
        let json = r#"{
            "config": { "settle_mode": "await-pickup", "conveyor_slots": 3 },
            "seed": "000102030405060708090a0b0c0d0e0f",
            "events": [
                { "event": "pointer-down", "x": 11, "y": 0 },
                { "event": "pointer-moved", "x": 3, "y": 17 },
                { "event": "tick", "at_ms": 33 },
                { "event": "rotate" },
                { "event": "shift", "dx": -1 },
                { "event": "soft-drop" },
                { "event": "pick-from-conveyor", "slot": 2 }
            ]
        }"#;
        let script: Script = serde_json::from_str(json).unwrap();
        let config = script.config.unwrap();
        assert_eq!(config.settle_mode, SettleMode::AwaitPickup);
        assert_eq!(config.play_width, 10);
        assert_eq!(
            script.seed.unwrap().to_string(),
            "000102030405060708090a0b0c0d0e0f"
        );
        assert_eq!(
            script.events,
            [
                ScriptEvent::PointerDown { x: 11, y: 0 },
                ScriptEvent::PointerMoved { x: 3, y: 17 },
                ScriptEvent::Tick { at_ms: 33 },
                ScriptEvent::Rotate,
                ScriptEvent::Shift { dx: -1 },
                ScriptEvent::SoftDrop,
                ScriptEvent::PickFromConveyor { slot: 2 },
            ]
        );
    }

    #[test]
    fn test_events_only() {
        let script: Script = serde_json::from_str(r#"{ "events": [] }"#).unwrap();
        assert!(script.config.is_none());
        assert!(script.seed.is_none());
        assert!(script.events.is_empty());
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result: Result<Script, _> =
            serde_json::from_str(r#"{ "events": [{ "event": "hold" }] }"#);
        assert!(result.is_err());
    }
}
