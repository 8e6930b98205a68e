// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

pub mod configuration;
pub mod coordinator;
pub mod device;
pub mod entity;
pub mod errors;
pub mod messages;

pub use coordinator::Coordinator;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const APP_VERSION: &str = built_info::PKG_VERSION;
