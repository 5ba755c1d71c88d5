//! Endpoint state controller
//!
//! Endpoint registers mix three write behaviors: STAT and DTOG bits toggle
//! when written as 1, the CTR event flags clear when written as 0 and hold
//! when written as 1, and the type/kind/address fields are plain
//! read-write. Hardware flips toggle bits on its own as transfers complete,
//! so every update must be derived from a value read immediately before the
//! write, and must only ever move a toggle field by XOR-ing it with the
//! desired target. The pure functions here express that pattern once;
//! the operations below are each exactly one read-compute-write.

use crate::ral::{epr, UsbRegisters};
use usb_device::UsbDirection;

/// Transfer status of one endpoint direction (the STAT field values)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u16)]
pub enum Stat {
    /// Direction unused; all transactions ignored
    Disabled = 0b00,
    /// Respond with STALL
    Stall = 0b01,
    /// Respond with NAK
    Nak = 0b10,
    /// Ready: buffer available for the next transaction
    Valid = 0b11,
}

impl Stat {
    /// Decode a STAT field value
    pub fn from_bits(bits: u16) -> Stat {
        match bits & 0b11 {
            0b00 => Stat::Disabled,
            0b01 => Stat::Stall,
            0b10 => Stat::Nak,
            _ => Stat::Valid,
        }
    }
}

/// Endpoint type, in EP_TYPE field encoding
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u16)]
pub enum Kind {
    Bulk = 0b00,
    Control = 0b01,
    // Isochronous and interrupt endpoints are not supported
}

const RW: u16 = epr::EP_TYPE::mask | epr::EP_KIND::mask | epr::EA::mask;

/// Bits that, written as-is into a toggle field, move it to `target`
fn toggle_to(current: u16, target: u16, mask: u16) -> u16 {
    (current ^ target) & mask
}

/// Compute the register write that drives one direction's STAT to `target`
///
/// Clears that direction's completion flag, preserves the other direction
/// entirely, and leaves every DTOG bit alone. The result is a pure function
/// of `(current, direction, target)`.
pub(crate) fn drive(current: u16, direction: UsbDirection, target: Stat) -> u16 {
    // Read-write fields are written back unchanged; DTOG bits are written
    // as 0, which holds them.
    let mut value = current & RW;
    match direction {
        UsbDirection::In => {
            // Writing 1 keeps the untouched RX event flag pending.
            value |= epr::CTR_RX::mask;
            value |= toggle_to(current, (target as u16) << epr::STAT_TX::offset, epr::STAT_TX::mask);
        }
        UsbDirection::Out => {
            value |= epr::CTR_TX::mask;
            value |= toggle_to(current, (target as u16) << epr::STAT_RX::offset, epr::STAT_RX::mask);
        }
    }
    value
}

/// Compute the register write that fully (re)configures an endpoint
///
/// Sets the type and address, clears both completion flags, forces both
/// DTOG bits to 0 and both STAT fields to the given absolute values. Used
/// when bringing up the bulk endpoints, where the data toggles must restart
/// from DATA0.
pub(crate) fn configure(current: u16, kind: Kind, address: u8, tx: Stat, rx: Stat) -> u16 {
    ((kind as u16) << epr::EP_TYPE::offset)
        | u16::from(address)
        | toggle_to(current, (tx as u16) << epr::STAT_TX::offset, epr::STAT_TX::mask)
        | toggle_to(current, (rx as u16) << epr::STAT_RX::offset, epr::STAT_RX::mask)
        // writing the current DTOG values toggles them back to zero
        | (current & (epr::DTOG_TX::mask | epr::DTOG_RX::mask))
}

/// Mark the transmit buffer ready; acknowledges the transmit event
pub(crate) fn arm_transmit<R: UsbRegisters>(regs: &R, ep: usize) {
    let current = regs.epr(ep);
    regs.set_epr(ep, drive(current, UsbDirection::In, Stat::Valid));
}

/// Respond to IN transactions with STALL; acknowledges the transmit event
pub(crate) fn stall_transmit<R: UsbRegisters>(regs: &R, ep: usize) {
    let current = regs.epr(ep);
    regs.set_epr(ep, drive(current, UsbDirection::In, Stat::Stall));
}

/// Mark the receive buffer free; acknowledges the receive event
pub(crate) fn arm_receive<R: UsbRegisters>(regs: &R, ep: usize) {
    let current = regs.epr(ep);
    regs.set_epr(ep, drive(current, UsbDirection::Out, Stat::Valid));
}
