// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use std::path::Path;

use actix::{Actor, Context, Handler};
use clap::{Arg, Command};
use log::{debug, info};

use procon_ip_intg::APP_VERSION;
use procon_ip_intg::configuration::{DEF_CONFIG_FILE, get_configuration};
use procon_ip_intg::coordinator::Coordinator;
use procon_ip_intg::entity;
use procon_ip_intg::messages::{DeviceEvent, Subscribe};

#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    let args = Command::new("procon-ip-intg")
        .version(APP_VERSION)
        .about("ProCon.IP pool controller integration service")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file"),
        )
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg_file = match args.get_one::<String>("config") {
        None => {
            if Path::new(DEF_CONFIG_FILE).exists() {
                info!("Loading default configuration file: {DEF_CONFIG_FILE}");
                Some(DEF_CONFIG_FILE)
            } else {
                None
            }
        }
        Some(c) => Some(c.as_str()),
    };
    let cfg = get_configuration(cfg_file).expect("Failed to read configuration");

    info!(
        "procon-ip-intg {APP_VERSION} connecting to http://{}:{}",
        cfg.device.host, cfg.device.port
    );

    let coordinator = Coordinator::new(&cfg.device)?.start();
    let logger = StateLogger::default().start();
    coordinator
        .send(Subscribe {
            id: "state-logger".into(),
            recipient: logger.recipient(),
        })
        .await?;

    actix_rt::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}

/// Minimal subscriber logging the device state and entity catalog.
///
/// Stands in for a real consumer registry: anything implementing
/// `Handler<DeviceEvent>` can subscribe the same way.
#[derive(Default)]
struct StateLogger {
    announced: bool,
}

impl Actor for StateLogger {
    type Context = Context<Self>;
}

impl Handler<DeviceEvent> for StateLogger {
    type Result = ();

    fn handle(&mut self, msg: DeviceEvent, _: &mut Context<Self>) {
        match msg {
            DeviceEvent::Connection(state) => info!("Device is {state}"),
            DeviceEvent::Snapshot(snapshot) => {
                if !self.announced {
                    self.announced = true;
                    for entity in entity::available_entities(&snapshot) {
                        info!(
                            "Found {} {}: {} (column {})",
                            entity.entity_type, entity.entity_id, entity.name, entity.column
                        );
                    }
                }
                for change in entity::state_changes(&snapshot) {
                    debug!("[{}] {:?}", change.entity_id, change.attributes);
                }
            }
        }
    }
}
