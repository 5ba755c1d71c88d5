//! A polled USB full-speed device driver for STM32F0 microcontrollers
//!
//! `stm32f0-usbfs` drives the STM32F0 USB macrocell directly: it performs
//! enumeration (control transfers on endpoint 0) and sustains a bulk
//! IN/OUT exchange on endpoints 1 and 2, with no interrupts and no
//! USB stack. A single non-blocking [`poll()`](Driver::poll) call services
//! bus reset detection and all four endpoint event sources; call it from
//! your main loop as often as you can.
//!
//! To interface the library, you must define a safe implementation of
//! [`Peripherals`]. See the peripherals documentation for more information.
//! Protocol logic never touches memory-mapped addresses itself; it goes
//! through the [`UsbRegisters`] interface, so the whole engine also runs
//! against a simulated register bank on the build host.
//!
//! # Example
//!
//! ```no_run
//! use stm32f0_usbfs::{Driver, Mmio, Peripherals};
//!
//! struct Board;
//!
//! // Safety: addresses are the USB register block and packet memory of an
//! // STM32F042, and nothing else in the program touches them.
//! unsafe impl Peripherals for Board {
//!     fn usb(&self) -> *const () {
//!         0x4000_5C00 as _
//!     }
//!     fn packet_memory(&self) -> *const () {
//!         0x4000_6000 as _
//!     }
//! }
//!
//! let mut usb = Driver::new(Mmio::new(Board));
//! usb.initialize();
//! loop {
//!     let events = usb.poll();
//!     if let Some(flag) = events.bulk_out {
//!         // first byte of the received bulk frame, as a binary signal
//!         let _ = flag;
//!     }
//! }
//! ```

#![no_std]

#[macro_use]
mod log;

mod control;
mod endpoint;
mod pma;
mod setup;

pub mod descriptor;
mod driver;
pub mod ral;

#[cfg(test)]
mod sim;

pub use driver::{Driver, Poll};
pub use endpoint::{Kind, Stat};
pub use ral::{Mmio, Peripherals, UsbRegisters};
