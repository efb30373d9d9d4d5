#![doc = include_str!("../README.md")]
//!
//! ## Master API
//!
//! - [`Master::start()`](fn@crate::Master::start)
//! - [`Master::set_pending()`](fn@crate::Master::set_pending)
//! - [`Master::on_irq()`](fn@crate::Master::on_irq)
//! - [`Master::service()`](fn@crate::Master::service)
//! - [`Master::status_snapshot()`](fn@crate::Master::status_snapshot)
//! - [`PollEvent::misdelivered()`](fn@crate::PollEvent::misdelivered)
//! - [`PendingTable`](struct@crate::PendingTable)
//!
//! ## Node API
//!
//! - [`Node::start()`](fn@crate::Node::start)
//! - [`Node::poll()`](fn@crate::Node::poll)
//! - [`Node::on_irq()`](fn@crate::Node::on_irq)
//! - [`Node::service()`](fn@crate::Node::service)
//! - [`Command::decode()`](fn@crate::Command::decode)
//! - [`interpret()`](fn@crate::interpret)
//! - [`Deferred`](struct@crate::Deferred) and [`drain()`](fn@crate::drain)
//!
//! ## Radio API
//!
//! - [`RF24::new()`](fn@crate::radio::RF24::new)
//! - [`RF24::read_register()`](fn@crate::radio::RF24::read_register)
//! - [`RF24::write_register()`](fn@crate::radio::RF24::write_register)
//! - [`RF24::pulse_ce()`](fn@crate::radio::RF24::pulse_ce)
//! - [`RF24::wait_bus_idle()`](fn@crate::radio::RF24::wait_bus_idle)
//! - [`events_pending()`](fn@crate::events_pending)
//! - The [`Esb*` traits](mod@crate::radio::prelude)
//!
#![no_std]

#[macro_use]
mod fmt;

mod types;
pub use types::{CrcLength, NodeId, Packet, Payload, StatusFlags, MAX_PAYLOAD};
mod transport;
pub use transport::{BusLock, Transport, TransportError, DEFAULT_SPIN_LIMIT};
pub mod radio;
mod diagnostics;
pub use diagnostics::{Anomaly, Diagnostics, DiagnosticsSnapshot};
mod pipeline;
pub use pipeline::{events_pending, receive, IrqLine};
mod pending;
pub use pending::{PendingError, PendingTable};
mod command;
pub use command::{
    drain, interpret, opcodes, Actuation, ActuationQueue, Actuator, Command, DecodeError,
    Deferred, Rgb,
};
mod master;
pub use master::{FabricError, Master, PollEvent};
mod node;
pub use node::{IdentitySource, Node};
