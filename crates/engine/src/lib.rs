// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shepherd-engine: orchestration of a fixed flock of model-serving workers.
//!
//! The [`Shepherd`] owns a configured set of sheep (container, bare-process
//! or dummy workers), feeds queued jobs to them over framed channels, pulls
//! job inputs from storage into per-job scratch directories, pushes results
//! back and keeps every job's status record moving through
//! `queued → processing → {done, failed}`.

pub mod config;
pub mod docker;
pub mod error;
pub mod notifier;
pub mod registry;
pub mod sheep;
pub mod shepherd;
pub mod status_queue;
pub mod workdir;

pub use config::{
    BareSheepConfig, ContainerSheepConfig, DummySheepConfig, RegistryConfig, SheepConfig,
    ShepherdConfig,
};
pub use error::{SheepError, ShepherdError};
pub use notifier::JobDoneNotifier;
pub use sheep::{BareSheep, ContainerSheep, DummySheep, Sheep, SheepHandle};
pub use shepherd::{SheepStatus, Shepherd};
pub use status_queue::{StatusQueue, StatusWriteHandle};
