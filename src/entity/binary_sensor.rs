// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! Binary sensor mapping for dimensionless digital inputs.
//!
//! Digital input channels carry either a numeric value with a real unit
//! (flow in `l/h`, handled as a sensor) or a pure on/off signal with unit
//! `--`, e.g. a physical button or a pool cover position switch. Only the
//! latter land here. No device class is assigned: the physical meaning of
//! an input depends entirely on the installation wiring.

use super::sensor::is_binary_digital_input;
use super::{AvailableEntity, EntityType};
use crate::device::csv::{COL_RANGE_DIGITAL_INPUTS, StateSnapshot};

/// One binary sensor per active dimensionless digital input.
pub(crate) fn binary_sensor_entities(snapshot: &StateSnapshot) -> Vec<AvailableEntity> {
    COL_RANGE_DIGITAL_INPUTS
        .filter(|&col| snapshot.is_active(col) && is_binary_digital_input(snapshot, col))
        .map(|col| AvailableEntity {
            entity_id: format!("di_{col}"),
            entity_type: EntityType::BinarySensor,
            name: snapshot.name(col).to_string(),
            column: col,
            device_class: None,
            state_class: None,
            unit: None,
            precision: None,
            options: None,
        })
        .collect()
}

/// Active/high when the raw value is non-zero.
///
/// Typically the device reports 1, but any non-zero value counts as active
/// to stay robust against firmware versions with different active levels.
pub(crate) fn binary_sensor_state(snapshot: &StateSnapshot, col: usize) -> Option<bool> {
    snapshot.raws.get(col).map(|&raw| raw != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::csv::fixtures::pool_snapshot;

    #[test]
    fn binary_catalog_covers_dimensionless_inputs() {
        let snapshot = pool_snapshot();
        let entities = binary_sensor_entities(&snapshot);

        // col 24 has a numeric unit (l/h) and stays a sensor
        assert_eq!(1, entities.len());
        assert_eq!("di_25", entities[0].entity_id);
        assert_eq!("Poolabdeckung", entities[0].name);
        assert_eq!(None, entities[0].unit);
    }

    #[test]
    fn input_state_is_active_on_nonzero_raw() {
        let mut snapshot = pool_snapshot();
        assert_eq!(Some(true), binary_sensor_state(&snapshot, 25));

        snapshot.raws[25] = 0;
        assert_eq!(Some(false), binary_sensor_state(&snapshot, 25));
        assert_eq!(None, binary_sensor_state(&snapshot, 99));
    }
}
