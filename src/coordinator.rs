// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! Central coordinator: polls the device and distributes snapshots.
//!
//! One coordinator actor per device is the single network gateway. Every
//! subscriber receives a push notification whenever a poll produces a new
//! snapshot, so only one HTTP request is made per cycle regardless of how
//! many consumers are registered. Relay commands go through the same actor
//! because they need the latest snapshot for the full-pattern write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix::prelude::{Actor, Context, Handler, Message, Recipient};
use actix::{ActorFutureExt, AsyncContext, MessageResult, ResponseActFuture, WrapFuture, fut};
use log::{debug, error, info, warn};

use crate::configuration::DeviceSettings;
use crate::device::DeviceClient;
use crate::device::csv::StateSnapshot;
use crate::device::relay::RelayPattern;
use crate::errors::ServiceError;
use crate::messages::{DeviceEvent, DeviceState, GetSnapshot, SetRelay, Subscribe, Unsubscribe};

/// Internal tick triggering one poll cycle.
#[derive(Message)]
#[rtype(result = "()")]
struct Poll;

pub struct Coordinator {
    device: DeviceClient,
    poll_interval: Duration,
    /// Most recent successfully decoded snapshot.
    /// Kept across failed polls; consumers treat it as stale per their own policy.
    snapshot: Option<Arc<StateSnapshot>>,
    device_state: DeviceState,
    subscribers: HashMap<String, Recipient<DeviceEvent>>,
    /// A fetch is in flight; overlapping ticks are skipped, not queued
    polling: bool,
}

impl Coordinator {
    pub fn new(settings: &DeviceSettings) -> Result<Self, ServiceError> {
        Ok(Self {
            device: DeviceClient::new(settings)?,
            poll_interval: settings.poll_interval,
            snapshot: None,
            device_state: DeviceState::Disconnected,
            subscribers: HashMap::new(),
            polling: false,
        })
    }

    fn broadcast(&self, event: DeviceEvent) {
        for (id, recipient) in &self.subscribers {
            if let Err(e) = recipient.try_send(event.clone()) {
                error!("[{id}] Internal message send error: {e}");
            }
        }
    }

    fn set_device_state(&mut self, state: DeviceState) {
        if self.device_state == state {
            return;
        }
        info!("Device is {state}");
        self.device_state = state;
        self.broadcast(DeviceEvent::Connection(state));
    }

    fn publish_snapshot(&mut self, snapshot: StateSnapshot) {
        let snapshot = Arc::new(snapshot);
        debug!(
            "New snapshot: firmware {}, {} columns",
            snapshot.firmware(),
            snapshot.column_count()
        );
        self.snapshot = Some(snapshot.clone());
        self.set_device_state(DeviceState::Connected);
        self.broadcast(DeviceEvent::Snapshot(snapshot));
    }
}

impl Actor for Coordinator {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Context<Self>) {
        info!("Polling every {:?}", self.poll_interval);
        // first refresh right away, then on every tick
        ctx.notify(Poll);
        ctx.run_interval(self.poll_interval, |_, ctx| ctx.notify(Poll));
    }
}

impl Handler<Poll> for Coordinator {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, _: Poll, _: &mut Context<Self>) -> Self::Result {
        if self.polling {
            debug!("Previous poll still in flight, skipping tick");
            return Box::pin(fut::ready(()));
        }
        self.polling = true;

        let device = self.device.clone();
        Box::pin(
            async move { device.fetch_state().await }
                .into_actor(self)
                .map(|result, act, _| {
                    act.polling = false;
                    match result {
                        Ok(snapshot) => act.publish_snapshot(snapshot),
                        Err(e) => {
                            warn!("Update failed: {e}");
                            act.set_device_state(DeviceState::Disconnected);
                        }
                    }
                }),
        )
    }
}

impl Handler<Subscribe> for Coordinator {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) {
        debug!("[{}] subscribed", msg.id);
        if let Some(snapshot) = &self.snapshot
            && let Err(e) = msg.recipient.try_send(DeviceEvent::Snapshot(snapshot.clone()))
        {
            error!("[{}] Internal message send error: {e}", msg.id);
        }
        self.subscribers.insert(msg.id, msg.recipient);
    }
}

impl Handler<Unsubscribe> for Coordinator {
    type Result = ();

    fn handle(&mut self, msg: Unsubscribe, _: &mut Context<Self>) {
        debug!("[{}] unsubscribed", msg.id);
        self.subscribers.remove(&msg.id);
    }
}

impl Handler<GetSnapshot> for Coordinator {
    type Result = MessageResult<GetSnapshot>;

    fn handle(&mut self, _: GetSnapshot, _: &mut Context<Self>) -> Self::Result {
        MessageResult(self.snapshot.clone())
    }
}

impl Handler<SetRelay> for Coordinator {
    type Result = ResponseActFuture<Self, Result<(), ServiceError>>;

    fn handle(&mut self, msg: SetRelay, _: &mut Context<Self>) -> Self::Result {
        let Some(snapshot) = self.snapshot.clone() else {
            warn!("Cannot set relay col={}: no snapshot received yet", msg.column);
            return Box::pin(fut::result(Err(ServiceError::ServiceUnavailable(
                "no device state received yet".into(),
            ))));
        };

        // full-pattern read-modify-write; the device takes no per-relay deltas
        let pattern = match RelayPattern::for_update(&snapshot, msg.column, msg.mode) {
            Ok(pattern) => pattern,
            Err(e) => return Box::pin(fut::result(Err(e))),
        };

        debug!("Relay col={} -> {} ({})", msg.column, msg.mode, pattern.ena_body());

        let device = self.device.clone();
        Box::pin(
            async move { device.write_relays(pattern).await }
                .into_actor(self)
                .map(move |result, _, ctx| match result {
                    Ok(()) => {
                        // immediate re-poll so subscribers see the change
                        // without waiting for the next scheduled tick
                        ctx.notify(Poll);
                        Ok(())
                    }
                    Err(e) => {
                        error!("Failed to set relay col={}: {e}", msg.column);
                        Err(e)
                    }
                }),
        )
    }
}
