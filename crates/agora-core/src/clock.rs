//! World clock and mode schedule.
//!
//! The clock is the single source of truth for the current tick. The tick
//! mode (forage, trade, or both) is derived from the tick counter and the
//! optional [`ModeSchedule`] -- never stored independently.

use agora_types::TickMode;
use serde::Deserialize;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid schedule configuration.
    #[error("invalid mode schedule: {reason}")]
    InvalidSchedule {
        /// Explanation of what is wrong with the schedule.
        reason: String,
    },
}

/// Alternating forage-only and trade-only periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ModeSchedule {
    /// Length of each forage-only period.
    pub forage_ticks: u64,
    /// Length of each trade-only period.
    pub trade_ticks: u64,
    /// Which period the first tick falls in.
    #[serde(default = "default_start_mode")]
    pub start_mode: TickMode,
}

const fn default_start_mode() -> TickMode {
    TickMode::Forage
}

impl ModeSchedule {
    /// Check period lengths and start mode.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidSchedule`] on a zero-length period or a
    /// `both` start mode.
    pub fn validate(&self) -> Result<(), ClockError> {
        if self.forage_ticks == 0 || self.trade_ticks == 0 {
            return Err(ClockError::InvalidSchedule {
                reason: "forage_ticks and trade_ticks must be at least 1".to_owned(),
            });
        }
        if self.start_mode == TickMode::Both {
            return Err(ClockError::InvalidSchedule {
                reason: "start_mode must be forage or trade".to_owned(),
            });
        }
        self.forage_ticks
            .checked_add(self.trade_ticks)
            .ok_or_else(|| ClockError::InvalidSchedule {
                reason: "cycle length overflows".to_owned(),
            })?;
        Ok(())
    }

    /// Mode at a tick. Tick 1 is the first tick of the first period.
    pub fn mode_at(&self, tick: u64) -> TickMode {
        let cycle = self.forage_ticks.saturating_add(self.trade_ticks).max(1);
        let phase = tick.saturating_sub(1).checked_rem(cycle).unwrap_or(0);
        match self.start_mode {
            TickMode::Trade if phase < self.trade_ticks => TickMode::Trade,
            TickMode::Trade => TickMode::Forage,
            _ if phase < self.forage_ticks => TickMode::Forage,
            _ => TickMode::Trade,
        }
    }
}

/// World clock tracking the current tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldClock {
    /// Current tick number (0 before the first tick runs).
    tick: u64,
    /// Optional alternation of forage and trade periods.
    schedule: Option<ModeSchedule>,
}

impl WorldClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidSchedule`] if the schedule is invalid.
    pub fn new(schedule: Option<ModeSchedule>) -> Result<Self, ClockError> {
        if let Some(schedule) = &schedule {
            schedule.validate()?;
        }
        Ok(Self { tick: 0, schedule })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Mode of the current tick.
    pub fn mode(&self) -> TickMode {
        self.schedule
            .map_or(TickMode::Both, |schedule| schedule.mode_at(self.tick))
    }
}
