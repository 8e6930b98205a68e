// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! Entity catalog derived from state snapshots.
//!
//! Every active CSV column maps to at most one entity: numeric channels
//! become sensors, dimensionless digital inputs become binary sensors and
//! relay channels become three-way selects. The mapping is pure; metadata
//! and state are recomputed from whichever snapshot the caller passes in,
//! so consumers never hold hidden device state.

mod binary_sensor;
mod select;
mod sensor;

pub use select::RELAY_OPTIONS;

use serde_json::{Map, Value};
use strum::Display;

use crate::device::csv::StateSnapshot;

/// Supported entity platforms.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum EntityType {
    Sensor,
    BinarySensor,
    Select,
}

/// Sensor device class derived from the display unit.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum DeviceClass {
    Temperature,
    Pressure,
    Voltage,
}

/// Statistics behavior of a sensor value.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    /// Instantaneous reading
    Measurement,
    /// Cumulative counter that only grows (chemical consumption)
    TotalIncreasing,
}

/// Static entity metadata, one record per active channel.
#[derive(Clone, Debug)]
pub struct AvailableEntity {
    /// Stable per-column id, e.g. `sensor_8`, `di_25`, `relay_16`
    pub entity_id: String,
    pub entity_type: EntityType,
    /// Human readable label from the CSV name row
    pub name: String,
    /// 0-based CSV column backing this entity
    pub column: usize,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    /// Display unit, already translated from the CSV unit string
    pub unit: Option<String>,
    /// Suggested display precision (decimal places)
    pub precision: Option<u8>,
    /// Selectable options for select entities
    pub options: Option<Vec<String>>,
}

/// Current state of one entity in attribute-map form.
#[derive(Clone, Debug)]
pub struct EntityChange {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub attributes: Map<String, Value>,
}

/// All entities derivable from the snapshot.
///
/// Catalog order: sensors, binary sensors, selects.
pub fn available_entities(snapshot: &StateSnapshot) -> Vec<AvailableEntity> {
    let mut entities = sensor::sensor_entities(snapshot);
    entities.extend(binary_sensor::binary_sensor_entities(snapshot));
    entities.extend(select::select_entities(snapshot));
    entities
}

/// Current state of every entity in the catalog.
pub fn state_changes(snapshot: &StateSnapshot) -> Vec<EntityChange> {
    available_entities(snapshot)
        .iter()
        .map(|entity| state_change(snapshot, entity))
        .collect()
}

/// Attribute map of one entity from the given snapshot.
///
/// The `value` attribute is null when the snapshot is shorter than the
/// entity's column (older firmware).
pub fn state_change(snapshot: &StateSnapshot, entity: &AvailableEntity) -> EntityChange {
    let value = match entity.entity_type {
        EntityType::Sensor => sensor::sensor_state(snapshot, entity.column)
            .map(Value::from)
            .unwrap_or(Value::Null),
        EntityType::BinarySensor => binary_sensor::binary_sensor_state(snapshot, entity.column)
            .map(Value::from)
            .unwrap_or(Value::Null),
        EntityType::Select => Value::from(select::select_state(snapshot, entity.column).to_string()),
    };

    let mut attributes = Map::with_capacity(2);
    attributes.insert("value".into(), value);
    if let Some(unit) = &entity.unit {
        attributes.insert("unit".into(), Value::from(unit.as_str()));
    }

    EntityChange {
        entity_id: entity.entity_id.clone(),
        entity_type: entity.entity_type,
        attributes,
    }
}

/// Suppress float noise (22.499999999 -> 22.5) without losing meaningful
/// precision; display rounding is a consumer concern.
fn round(x: f64, decimals: u32) -> f64 {
    let y = 10i64.pow(decimals) as f64;
    (x * y).round() / y
}
