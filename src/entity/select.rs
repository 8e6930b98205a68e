// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! Select mapping for relay channels.
//!
//! A two-state switch can't model the third relay state, `auto`, where the
//! device's own timer and sensor logic controls the output. Each active
//! relay therefore becomes a three-way select, keeping users from
//! accidentally overriding the schedule when they only want to check the
//! current mode.

use super::{AvailableEntity, EntityType};
use crate::device::csv::StateSnapshot;
use crate::device::relay::{RELAY_COLUMNS, RelayMode};

/// Options offered for every relay select; `auto` first so it is the default.
pub const RELAY_OPTIONS: [&str; 3] = ["auto", "on", "off"];

/// One select per active relay channel, internal and external.
pub(crate) fn select_entities(snapshot: &StateSnapshot) -> Vec<AvailableEntity> {
    RELAY_COLUMNS
        .into_iter()
        .filter(|&col| snapshot.is_active(col))
        .map(|col| AvailableEntity {
            entity_id: format!("relay_{col}"),
            entity_type: EntityType::Select,
            name: snapshot.name(col).to_string(),
            column: col,
            device_class: None,
            state_class: None,
            unit: None,
            precision: None,
            options: Some(RELAY_OPTIONS.iter().map(|s| s.to_string()).collect()),
        })
        .collect()
}

/// Currently reported mode of a relay select.
pub(crate) fn select_state(snapshot: &StateSnapshot, col: usize) -> RelayMode {
    snapshot.relay_mode(col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::csv::fixtures::pool_snapshot;

    #[test]
    fn select_catalog_covers_active_relays() {
        let snapshot = pool_snapshot();
        let selects = select_entities(&snapshot);

        let ids: Vec<&str> = selects.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(vec!["relay_16", "relay_17"], ids);
        assert_eq!("FilterPumpe N1", selects[0].name);
        assert_eq!(
            Some(vec!["auto".to_string(), "on".to_string(), "off".to_string()]),
            selects[0].options
        );
    }

    #[test]
    fn select_state_decodes_the_relay_mode() {
        let snapshot = pool_snapshot();
        assert_eq!(RelayMode::Auto, select_state(&snapshot, 16)); // raw 1: auto wins
        assert_eq!(RelayMode::On, select_state(&snapshot, 17)); // raw 3
        assert_eq!(RelayMode::Auto, select_state(&snapshot, 18)); // raw 0
    }
}
