use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, core::Shape};

/// What happens to the active piece once it has been committed to the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettleMode {
    /// The next piece spawns immediately after every commit.
    #[default]
    Respawn,
    /// The committed piece stays active and can be picked up again until the next piece
    /// is generated.
    AwaitPickup,
}

/// Session parameters, fixed for the lifetime of a [`GameSession`](super::GameSession).
///
/// Every field has a default, so a partial JSON object is a valid configuration:
///
/// ```
/// use grabtris_engine::{GameConfig, SettleMode};
///
/// let config: GameConfig =
///     serde_json::from_str(r#"{ "staging_width": 0, "settle_mode": "await-pickup" }"#).unwrap();
/// assert_eq!(config.play_width, 10);
/// assert_eq!(config.staging_width, 0);
/// assert_eq!(config.settle_mode, SettleMode::AwaitPickup);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    /// Columns of the play region.
    pub play_width: usize,
    /// Rows of the board.
    pub height: usize,
    /// Columns of the staging region on the right; `0` disables staging.
    pub staging_width: usize,
    /// Time between two gravity steps of a falling piece.
    pub gravity_interval_ms: u64,
    /// Time between two forced piece generations; `None` disables forced generation.
    pub generation_interval_ms: Option<u64>,
    pub settle_mode: SettleMode,
    /// Number of upcoming pieces offered on the conveyor; `0` disables the conveyor.
    pub conveyor_slots: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            play_width: 10,
            height: 20,
            staging_width: 4,
            gravity_interval_ms: 33,
            generation_interval_ms: None,
            settle_mode: SettleMode::Respawn,
            conveyor_slots: 0,
        }
    }
}

impl GameConfig {
    /// Largest supported board dimension (per region and for the height).
    pub const MAX_DIMENSION: usize = 64;

    /// Largest supported conveyor.
    pub const MAX_CONVEYOR_SLOTS: usize = 8;

    /// Checks that the configuration describes a playable board.
    ///
    /// Every region must be able to hold the largest piece, so non-zero widths and the
    /// height start at [`Shape::MAX_SIZE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = Shape::MAX_SIZE;
        let max = Self::MAX_DIMENSION;
        check_range("play_width", self.play_width, min, max)?;
        check_range("height", self.height, min, max)?;
        if self.staging_width != 0 {
            check_range("staging_width", self.staging_width, min, max)?;
        }
        check_range("conveyor_slots", self.conveyor_slots, 0, Self::MAX_CONVEYOR_SLOTS)?;
        if self.gravity_interval_ms == 0 {
            return Err(ConfigError::ZeroGravityInterval);
        }
        if self.generation_interval_ms == Some(0) {
            return Err(ConfigError::ZeroGenerationInterval);
        }
        Ok(())
    }

    #[must_use]
    pub fn gravity_interval(&self) -> Duration {
        Duration::from_millis(self.gravity_interval_ms)
    }

    #[must_use]
    pub fn generation_interval(&self) -> Option<Duration> {
        self.generation_interval_ms.map(Duration::from_millis)
    }

    /// Number of preview slots kept by the piece buffer.
    ///
    /// Without a conveyor a single slot holds the pre-selected next piece.
    #[must_use]
    pub fn preview_slots(&self) -> usize {
        self.conveyor_slots.max(1)
    }
}

fn check_range(name: &'static str, value: usize, min: usize, max: usize) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidDimension {
            name,
            value,
            min,
            max,
        })
    }
}
