// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! Sensor mapping for numeric channels.
//!
//! Everything that is active and not owned by another platform becomes a
//! sensor: temperatures, pH, redox, analog channels, pressure, flow rate,
//! canister levels and consumption counters. The time column is skipped,
//! it is an internal processing timer with no value to consumers.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::{AvailableEntity, DeviceClass, EntityType, StateClass};
use crate::device::csv::{COL_RANGE_DIGITAL_INPUTS, COL_RANGE_TIME, StateSnapshot};
use crate::device::relay::RELAY_COLUMNS;

lazy_static! {
    /// CSV unit string -> display unit. Units missing here (unknown units
    /// from future firmware) fall through unchanged so no information is
    /// lost.
    static ref UNIT_MAP: HashMap<&'static str, Option<&'static str>> = HashMap::from([
        ("C", Some("°C")),
        ("Bar", Some("bar")),
        ("mV", Some("mV")),
        ("pH", Some("pH")),
        ("%", Some("%")),
        ("ml", Some("mL")),
        ("l/h", Some("L/h")),
        ("h", Some("h")),
        ("--", None),
        ("", None),
    ]);
}

/// Translate a CSV unit string into the display unit.
pub(crate) fn map_unit(csv_unit: &str) -> Option<String> {
    let unit = csv_unit.trim();
    match UNIT_MAP.get(unit) {
        Some(mapped) => mapped.map(str::to_string),
        None => Some(unit.to_string()),
    }
}

fn device_class(unit: &str) -> Option<DeviceClass> {
    match unit {
        "°C" => Some(DeviceClass::Temperature),
        "bar" => Some(DeviceClass::Pressure),
        "mV" => Some(DeviceClass::Voltage),
        _ => None,
    }
}

// The consumption counters only ever grow; they reset when a canister is
// refilled in the device UI, but that reset is not observable via the API.
fn state_class(unit: &str) -> Option<StateClass> {
    match unit {
        "°C" | "bar" | "mV" | "pH" | "%" | "L/h" => Some(StateClass::Measurement),
        "mL" => Some(StateClass::TotalIncreasing),
        _ => None,
    }
}

fn display_precision(unit: &str) -> u8 {
    match unit {
        "bar" => 3,
        "pH" => 2,
        "°C" => 1,
        "mV" | "%" | "mL" | "L/h" | "h" => 0,
        _ => 2,
    }
}

/// `true` for dimensionless digital inputs; those carry a pure on/off
/// signal and are owned by the binary sensor platform.
pub(crate) fn is_binary_digital_input(snapshot: &StateSnapshot, col: usize) -> bool {
    COL_RANGE_DIGITAL_INPUTS.contains(&col) && snapshot.unit(col).trim() == "--"
}

/// One sensor per active numeric column that no other platform owns.
pub(crate) fn sensor_entities(snapshot: &StateSnapshot) -> Vec<AvailableEntity> {
    (0..snapshot.names.len())
        .filter(|&col| {
            !COL_RANGE_TIME.contains(&col)
                && !RELAY_COLUMNS.contains(&col)
                && snapshot.is_active(col)
                && !is_binary_digital_input(snapshot, col)
        })
        .map(|col| {
            let unit = map_unit(snapshot.unit(col));
            AvailableEntity {
                entity_id: format!("sensor_{col}"),
                entity_type: EntityType::Sensor,
                name: snapshot.name(col).to_string(),
                column: col,
                device_class: unit.as_deref().and_then(device_class),
                state_class: unit.as_deref().and_then(state_class),
                precision: Some(unit.as_deref().map(display_precision).unwrap_or(2)),
                unit,
                options: None,
            }
        })
        .collect()
}

/// Current reading, rounded to suppress float noise.
pub(crate) fn sensor_state(snapshot: &StateSnapshot, col: usize) -> Option<f64> {
    snapshot.value(col).map(|value| super::round(value, 6))
}
