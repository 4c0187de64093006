//! Behavioral specifications for the shepherd engine.
//!
//! These tests are black-box: they drive a real engine over real TCP
//! channels against a filesystem-backed store and verify the persisted job
//! statuses, outputs and sheep states.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// engine/
#[path = "specs/engine/bare_sheep.rs"]
mod engine_bare_sheep;
#[path = "specs/engine/failures.rs"]
mod engine_failures;
#[path = "specs/engine/happy_path.rs"]
mod engine_happy_path;
#[path = "specs/engine/model_switch.rs"]
mod engine_model_switch;
