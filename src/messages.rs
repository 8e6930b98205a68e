// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! Actix message definitions exchanged between the coordinator and its
//! subscribers.

use std::sync::Arc;

use actix::prelude::{Message, Recipient};
use strum::Display;

use crate::device::csv::StateSnapshot;
use crate::device::relay::RelayMode;
use crate::errors::ServiceError;

/// Events published by the coordinator to every subscriber.
#[derive(Clone, Debug, Message)]
#[rtype(result = "()")]
pub enum DeviceEvent {
    /// A fresh snapshot was decoded from `GetState.csv`
    Snapshot(Arc<StateSnapshot>),
    /// The device connection state changed
    Connection(DeviceState),
}

/// Device connection states.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DeviceState {
    Connected,
    Disconnected,
}

/// Register a subscriber for [`DeviceEvent`] notifications.
///
/// The current snapshot is delivered immediately when one exists, so late
/// subscribers don't wait a full poll cycle for their first state.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe {
    /// Unique subscriber identifier
    pub id: String,
    pub recipient: Recipient<DeviceEvent>,
}

/// Remove a subscriber.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Unsubscribe {
    pub id: String,
}

/// Latest snapshot held by the coordinator, `None` until the first
/// successful poll.
#[derive(Message)]
#[rtype(result = "Option<Arc<StateSnapshot>>")]
pub struct GetSnapshot;

/// Switch one relay to auto, on or off.
///
/// The write endpoint replaces the state of all relays at once, so the
/// coordinator rebuilds the full bit pattern from the latest snapshot and
/// changes only the targeted relay.
#[derive(Debug, Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct SetRelay {
    /// 0-based CSV column index of the relay (16..=23 or 28..=35)
    pub column: usize,
    pub mode: RelayMode,
}
