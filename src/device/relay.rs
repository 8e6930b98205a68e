// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! Relay state codec for the `ENA` write protocol.
//!
//! Each relay's raw value in the CSV is a 2-bit field:
//!
//! | raw | bit 1 (manual) | bit 0 (on) | meaning                  |
//! |-----|----------------|------------|--------------------------|
//! | 0   | 0              | 0          | auto mode, currently off |
//! | 1   | 0              | 1          | auto mode, currently on  |
//! | 2   | 1              | 0          | manual mode, forced off  |
//! | 3   | 1              | 1          | manual mode, forced on   |
//!
//! `/usrcfg.cgi` does not accept per-relay commands: every write carries
//! the complete state of all relays as two packed integers, with bit i
//! mapping to column `RELAY_COLUMNS[i]`. Changing one relay is therefore
//! always a read-modify-write over the full pattern.

use crate::device::csv::StateSnapshot;
use crate::errors::ServiceError;
use strum::{Display, EnumString};

/// Least significant bit: on/off state
pub const RELAY_BIT_ON: i64 = 1;
/// Second bit: manual override / auto schedule
pub const RELAY_BIT_MANUAL: i64 = 2;

/// Every relay column in bit-index order: bit 0 -> col 16 (first internal
/// relay), bit 7 -> col 23, bit 8 -> col 28 (first external relay), ...
pub const RELAY_COLUMNS: [usize; 16] = [
    16, 17, 18, 19, 20, 21, 22, 23, 28, 29, 30, 31, 32, 33, 34, 35,
];

/// Relay operating mode.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum RelayMode {
    /// The device timer/schedule controls the relay
    Auto,
    /// Forced on (manual mode)
    On,
    /// Forced off (manual mode)
    Off,
}

/// Decode a relay's 2-bit raw value.
///
/// The on/off bit only matters once the manual bit is set: a relay in auto
/// mode reports `auto` regardless of its current switching state.
pub fn decode_mode(raw: i64) -> RelayMode {
    if raw & RELAY_BIT_MANUAL == 0 {
        RelayMode::Auto
    } else if raw & RELAY_BIT_ON != 0 {
        RelayMode::On
    } else {
        RelayMode::Off
    }
}

/// Bit index of a relay column in the `ENA` patterns.
pub fn bit_index_for_column(column: usize) -> Result<usize, ServiceError> {
    RELAY_COLUMNS
        .iter()
        .position(|&col| col == column)
        .ok_or_else(|| {
            ServiceError::InvalidRelayRequest(format!(
                "column {column} is not a relay column ({RELAY_COLUMNS:?})"
            ))
        })
}

/// The two packed integers POSTed to `/usrcfg.cgi`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RelayPattern {
    /// Bit i set: relay i is in manual mode (not auto-scheduled)
    pub manual: u16,
    /// Bit i set: relay i is currently on
    pub on: u16,
}

impl RelayPattern {
    /// Rebuild the full write pattern from the current relay states.
    ///
    /// The manual bits start out all-ones over the active width (8 bits
    /// without external relays, 16 with); relays found in auto mode then
    /// clear their bit. The on bits start at zero and relays found on set
    /// theirs. Iteration stops without error when the raw row is shorter
    /// than the relay ranges: older firmware omits trailing columns.
    pub fn from_snapshot(snapshot: &StateSnapshot) -> Self {
        let mut manual: u16 = if snapshot.has_external_relays() {
            0xffff
        } else {
            0xff
        };
        let mut on: u16 = 0;

        for (i, &col) in RELAY_COLUMNS.iter().enumerate() {
            let Some(&raw) = snapshot.raws.get(col) else {
                break;
            };

            let bit = 1u16 << i;
            if raw & RELAY_BIT_MANUAL == 0 {
                // auto mode: the device schedule keeps controlling this relay
                manual &= !bit;
            }
            if raw & RELAY_BIT_ON != 0 {
                on |= bit;
            }
        }

        Self { manual, on }
    }

    /// Return the pattern with one relay switched to `mode`.
    ///
    /// All other bits pass through unchanged.
    pub fn with_mode(self, bit_index: usize, mode: RelayMode) -> Result<Self, ServiceError> {
        if bit_index >= RELAY_COLUMNS.len() {
            return Err(ServiceError::InvalidRelayRequest(format!(
                "relay bit index {bit_index} out of range"
            )));
        }

        let bit = 1u16 << bit_index;
        let (manual, on) = match mode {
            RelayMode::Auto => (self.manual & !bit, self.on & !bit),
            RelayMode::On => (self.manual | bit, self.on | bit),
            RelayMode::Off => (self.manual | bit, self.on & !bit),
        };
        Ok(Self { manual, on })
    }

    /// Full pattern for switching `column` to `mode`, derived from the
    /// latest snapshot.
    pub fn for_update(
        snapshot: &StateSnapshot,
        column: usize,
        mode: RelayMode,
    ) -> Result<Self, ServiceError> {
        Self::from_snapshot(snapshot).with_mode(bit_index_for_column(column)?, mode)
    }

    /// Encode the pattern as the `usrcfg.cgi` form body.
    pub fn ena_body(&self) -> String {
        format!("ENA={},{}&MANUAL=1", self.manual, self.on)
    }
}
