//! A simulated register bank for host-side tests
//!
//! [`SimBank`] implements [`UsbRegisters`] over plain memory while
//! reproducing the endpoint registers' write semantics, so the driver's
//! read-modify-write sequences land exactly as they would on hardware.
//! Helper methods play the host's role: delivering setup packets, raising
//! completion flags, and resetting the bus.

use core::cell::{Cell, RefCell};

use crate::endpoint::Stat;
use crate::ral::{daddr, epr, Istr, UsbRegisters};

/// Bits that toggle when written as 1
const TOGGLE: u16 =
    epr::STAT_TX::mask | epr::DTOG_TX::mask | epr::STAT_RX::mask | epr::DTOG_RX::mask;
/// Plain read-write fields
const RW: u16 = epr::EP_TYPE::mask | epr::EP_KIND::mask | epr::EA::mask;
/// Event flags that clear when written as 0 and hold when written as 1
const STICKY: u16 = epr::CTR_TX::mask | epr::CTR_RX::mask;

/// Next state of an endpoint register after a software write
///
/// Applies each field group's write behavior: read-write fields take the
/// written value, toggle bits flip where a 1 was written, the completion
/// flags can only be cleared, and SETUP ignores writes entirely.
pub(crate) fn apply_epr_write(current: u16, written: u16) -> u16 {
    (written & RW)
        | ((current ^ written) & TOGGLE)
        | (current & written & STICKY)
        | (current & epr::SETUP::mask)
}

pub(crate) struct SimBank {
    epr: [Cell<u16>; 8],
    istr: Cell<u16>,
    cntr: Cell<u16>,
    daddr: Cell<u16>,
    btable: Cell<u16>,
    bcdr: Cell<u16>,
    /// Packet memory, one half-word per 2-byte offset
    pma: RefCell<[u16; 256]>,
}

impl SimBank {
    pub fn new() -> Self {
        SimBank {
            epr: Default::default(),
            istr: Cell::new(0),
            cntr: Cell::new(0),
            daddr: Cell::new(0),
            btable: Cell::new(0),
            bcdr: Cell::new(0),
            pma: RefCell::new([0; 256]),
        }
    }

    pub fn pma(&self, offset: u16) -> u16 {
        self.pma.borrow()[usize::from(offset) / 2]
    }

    pub fn set_pma(&self, offset: u16, value: u16) {
        self.pma.borrow_mut()[usize::from(offset) / 2] = value;
    }

    pub fn daddr(&self) -> u16 {
        self.daddr.get()
    }

    pub fn stat_tx(&self, ep: usize) -> Stat {
        Stat::from_bits(self.epr[ep].get() >> epr::STAT_TX::offset)
    }

    pub fn stat_rx(&self, ep: usize) -> Stat {
        Stat::from_bits(self.epr[ep].get() >> epr::STAT_RX::offset)
    }

    pub fn cntr(&self) -> u16 {
        self.cntr.get()
    }

    pub fn btable(&self) -> u16 {
        self.btable.get()
    }

    pub fn bcdr(&self) -> u16 {
        self.bcdr.get()
    }

    pub fn epr_field(&self, ep: usize, mask: u16) -> u16 {
        self.epr[ep].get() & mask
    }

    fn addr_tx(&self, ep: usize) -> u16 {
        self.pma((ep as u16) * 8)
    }

    fn addr_rx(&self, ep: usize) -> u16 {
        self.pma((ep as u16) * 8 + 4)
    }

    /// Read back what the driver queued for transmission on `ep`
    pub fn tx_payload(&self, ep: usize, out: &mut [u8]) -> usize {
        let base = self.addr_tx(ep);
        let count = usize::from(self.pma((ep as u16) * 8 + 2));
        let len = count.min(out.len());
        for (i, byte) in out[..len].iter_mut().enumerate() {
            let half = self.pma(base + (i as u16 & !1));
            *byte = if i % 2 == 0 { half as u8 } else { (half >> 8) as u8 };
        }
        len
    }

    /// Store `data` in `ep`'s receive buffer and set its received count
    fn deliver(&self, ep: usize, data: &[u8]) {
        let base = self.addr_rx(ep);
        for (i, chunk) in data.chunks(2).enumerate() {
            let mut half = u16::from(chunk[0]);
            if let Some(hi) = chunk.get(1) {
                half |= u16::from(*hi) << 8;
            }
            self.set_pma(base + 2 * i as u16, half);
        }
        let count_offset = (ep as u16) * 8 + 6;
        let block_bits = self.pma(count_offset) & !0x3FF;
        self.set_pma(count_offset, block_bits | data.len() as u16);
    }

    /// The host sent a setup packet to the control endpoint
    ///
    /// Hardware raises CTR_RX with the SETUP flag and NAKs both directions
    /// until software responds.
    pub fn setup_packet(&self, data: &[u8; 8]) {
        self.deliver(0, data);
        self.finish_rx(0, true);
    }

    /// A malformed setup transaction that stored fewer than 8 bytes
    pub fn short_setup_packet(&self, len: u16) {
        let count_offset = 6;
        let block_bits = self.pma(count_offset) & !0x3FF;
        self.set_pma(count_offset, block_bits | len);
        self.finish_rx(0, true);
    }

    /// The device's queued IN packet was transmitted and acknowledged
    pub fn complete_tx(&self, ep: usize) {
        let current = self.epr[ep].get();
        let nak = (Stat::Nak as u16) << epr::STAT_TX::offset;
        self.epr[ep].set(
            (current & !epr::STAT_TX::mask) | nak | epr::CTR_TX::mask,
        );
    }

    /// The host sent an OUT packet to `ep`
    pub fn complete_rx(&self, ep: usize, data: &[u8]) {
        self.deliver(ep, data);
        self.finish_rx(ep, false);
    }

    fn finish_rx(&self, ep: usize, setup: bool) {
        let current = self.epr[ep].get();
        let nak = (Stat::Nak as u16) << epr::STAT_RX::offset;
        let mut next =
            (current & !(epr::STAT_RX::mask | epr::SETUP::mask)) | nak | epr::CTR_RX::mask;
        if setup {
            next |= epr::SETUP::mask;
        }
        self.epr[ep].set(next);
    }

    /// The host reset the bus
    ///
    /// The macrocell clears the endpoint registers and the device address,
    /// then raises the reset flag.
    pub fn bus_reset(&self) {
        for epr in &self.epr {
            epr.set(0);
        }
        self.daddr.set(0);
        self.istr.set(self.istr.get() | Istr::RESET.bits());
    }
}

impl UsbRegisters for SimBank {
    fn epr(&self, index: usize) -> u16 {
        self.epr[index].get()
    }
    fn set_epr(&self, index: usize, value: u16) {
        let next = apply_epr_write(self.epr[index].get(), value);
        self.epr[index].set(next);
    }
    fn istr(&self) -> u16 {
        self.istr.get()
    }
    fn set_istr(&self, value: u16) {
        // event flags are write-0-to-clear
        self.istr.set(self.istr.get() & value);
    }
    fn set_cntr(&self, value: u16) {
        self.cntr.set(value);
    }
    fn set_daddr(&self, value: u16) {
        self.daddr.set(value & (daddr::ADD::mask | daddr::EF::mask));
    }
    fn set_btable(&self, value: u16) {
        self.btable.set(value);
    }
    fn set_bcdr(&self, value: u16) {
        self.bcdr.set(value);
    }
    fn pma_read(&self, offset: u16) -> u16 {
        self.pma(offset)
    }
    fn pma_write(&self, offset: u16, value: u16) {
        self.set_pma(offset, value);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn toggle_bits_flip_only_where_written_one() {
        let current = (Stat::Nak as u16) << epr::STAT_TX::offset;
        // writing Nak ^ Valid moves STAT_TX to Valid
        let next = apply_epr_write(current, 0b01 << epr::STAT_TX::offset);
        assert_eq!(
            next & epr::STAT_TX::mask,
            (Stat::Valid as u16) << epr::STAT_TX::offset
        );
        // writing zeros holds everything
        assert_eq!(apply_epr_write(current, 0) & epr::STAT_TX::mask, current);
    }

    #[test]
    fn completion_flags_cannot_be_set_by_software() {
        let next = apply_epr_write(0, epr::CTR_TX::mask | epr::CTR_RX::mask);
        assert_eq!(next & (epr::CTR_TX::mask | epr::CTR_RX::mask), 0);

        // writing 1 holds a pending flag, writing 0 clears it
        let pending = epr::CTR_RX::mask;
        assert_eq!(
            apply_epr_write(pending, epr::CTR_RX::mask) & epr::CTR_RX::mask,
            epr::CTR_RX::mask
        );
        assert_eq!(apply_epr_write(pending, 0) & epr::CTR_RX::mask, 0);
    }

    #[test]
    fn setup_flag_ignores_writes() {
        let pending = epr::SETUP::mask;
        assert_eq!(
            apply_epr_write(pending, 0) & epr::SETUP::mask,
            epr::SETUP::mask
        );
        assert_eq!(apply_epr_write(0, epr::SETUP::mask) & epr::SETUP::mask, 0);
    }

    #[test]
    fn plain_registers_store_the_last_write() {
        let bank = SimBank::new();
        bank.set_cntr(0x0001);
        bank.set_btable(0x0040);
        bank.set_bcdr(0x8000);
        assert_eq!(bank.cntr(), 0x0001);
        assert_eq!(bank.btable(), 0x0040);
        assert_eq!(bank.bcdr(), 0x8000);
    }

    #[test]
    fn istr_is_write_zero_to_clear() {
        let bank = SimBank::new();
        bank.bus_reset();
        assert_ne!(bank.istr() & Istr::RESET.bits(), 0);
        bank.set_istr(0);
        assert_eq!(bank.istr(), 0);
    }
}
