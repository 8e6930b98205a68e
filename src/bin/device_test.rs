// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! ProCon.IP device communication test tool.
//!
//! Polls one snapshot through the coordinator and prints the derived entity
//! catalog with current values. With `--relay` it also switches a relay and
//! shows the refreshed state. Useful to verify address, credentials and
//! wiring before running the service.

use std::time::Duration;

use actix::{Actor, Context, Handler};
use actix_rt::time::sleep;
use clap::{Arg, Command};
use serde_json::Value;

use procon_ip_intg::APP_VERSION;
use procon_ip_intg::configuration::get_configuration;
use procon_ip_intg::coordinator::Coordinator;
use procon_ip_intg::device::relay::RelayMode;
use procon_ip_intg::entity;
use procon_ip_intg::messages::{DeviceEvent, GetSnapshot, SetRelay, Subscribe};

#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    let args = Command::new("device-test")
        .version(APP_VERSION)
        .about("ProCon.IP device communication test")
        .arg(
            Arg::new("host")
                .short('H')
                .help("Device IP address or hostname (overrides configuration)"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .help("Device HTTP port (overrides configuration)"),
        )
        .arg(
            Arg::new("username")
                .short('u')
                .help("Basic-auth username, empty disables authentication (overrides configuration)"),
        )
        .arg(
            Arg::new("password")
                .short('P')
                .help("Basic-auth password (overrides configuration)"),
        )
        .arg(
            Arg::new("relay")
                .long("relay")
                .value_name("COL")
                .help("Switch the relay at this CSV column (16..=23 or 28..=35)"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("MODE")
                .value_parser(["auto", "on", "off"])
                .default_value("auto")
                .help("Relay mode to set with --relay"),
        )
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut cfg = get_configuration(None).expect("Failed to read configuration");
    if let Some(host) = args.get_one::<String>("host") {
        cfg.device.host = host.clone();
    }
    if let Some(port) = args.get_one::<String>("port") {
        cfg.device.port = port.parse()?;
    }
    if let Some(username) = args.get_one::<String>("username") {
        cfg.device.username = username.clone();
    }
    if let Some(password) = args.get_one::<String>("password") {
        cfg.device.password = password.clone();
    }
    let relay_col = args
        .get_one::<String>("relay")
        .map(|col| col.parse::<usize>())
        .transpose()?;
    let mode = args
        .get_one::<String>("mode")
        .map(|mode| mode.parse::<RelayMode>())
        .transpose()?
        .unwrap_or(RelayMode::Auto);

    println!(
        "Connecting to http://{}:{} ...",
        cfg.device.host, cfg.device.port
    );
    let coordinator = Coordinator::new(&cfg.device)?.start();
    let printer = SnapshotPrinter::default().start();
    coordinator
        .send(Subscribe {
            id: "device-test".into(),
            recipient: printer.recipient(),
        })
        .await?;

    // quick and dirty: give the first poll a moment to complete
    sleep(Duration::from_secs(3)).await;

    let Some(snapshot) = coordinator.send(GetSnapshot).await? else {
        eprintln!("No response from the device, check address and credentials");
        std::process::exit(1);
    };

    if let Some(column) = relay_col {
        println!(
            "Switching relay col={column} ({}) to {mode}",
            snapshot.name(column)
        );
        coordinator.send(SetRelay { column, mode }).await??;
        // let the immediate refresh land so the printer shows the new state
        sleep(Duration::from_secs(3)).await;
    }

    Ok(())
}

/// Subscriber printing the entity catalog with current values.
#[derive(Default)]
struct SnapshotPrinter {
    announced: bool,
}

impl Actor for SnapshotPrinter {
    type Context = Context<Self>;
}

impl Handler<DeviceEvent> for SnapshotPrinter {
    type Result = ();

    fn handle(&mut self, msg: DeviceEvent, _: &mut Context<Self>) {
        match msg {
            DeviceEvent::Connection(state) => println!("Device is {state}"),
            DeviceEvent::Snapshot(snapshot) => {
                if !self.announced {
                    self.announced = true;
                    println!(
                        "ProCon.IP firmware {}, device id {}, {} columns",
                        snapshot.firmware(),
                        snapshot.device_id(),
                        snapshot.column_count()
                    );
                } else {
                    println!("Refreshed state:");
                }
                for entity in entity::available_entities(&snapshot) {
                    let change = entity::state_change(&snapshot, &entity);
                    let value = change.attributes.get("value").cloned().unwrap_or(Value::Null);
                    println!(
                        "  {:<13} {:<9} {:<24} {} {}",
                        entity.entity_type.to_string(),
                        entity.entity_id,
                        entity.name,
                        value,
                        entity.unit.unwrap_or_default()
                    );
                }
            }
        }
    }
}
