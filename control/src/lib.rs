//! Hardware-independent core of the halldrive firmware.
//!
//! Everything in here is pure logic over plain values: hall-triple
//! decoding, commutation tables, step tracking, the periodic control law,
//! command parsing and status formatting.  The firmware crate owns the
//! peripherals and the task structure.

#![no_std]

pub mod command;
pub mod commutation;
pub mod controller;
pub mod melody;
pub mod rotor;
pub mod status;
pub mod tracker;
