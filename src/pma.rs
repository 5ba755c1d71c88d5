//! Packet memory manager
//!
//! The USB macrocell exchanges packets through a small dedicated SRAM laid
//! out by fixed offsets, established once at configuration time:
//!
//! | offset | size | description                              |
//! |--------|------|------------------------------------------|
//! | 0      | 32   | buffer descriptor table, 4 endpoints     |
//! | 32     | 64   | TX buffer of control endpoint 0          |
//! | 96     | 64   | RX buffer of control endpoint 0          |
//! | 160    | 16   | TX buffer of bulk endpoint 1 (IN)        |
//! | 176    | 16   | RX buffer of bulk endpoint 2 (OUT)       |
//!
//! All offsets are in packet-memory bytes; access goes through
//! [`UsbRegisters::pma_read`]/[`pma_write`](UsbRegisters::pma_write) one
//! half-word at a time.

use crate::ral::UsbRegisters;

pub(crate) const EP0_TX_OFFSET: u16 = 32;
pub(crate) const EP0_TX_LEN: u16 = 64;
pub(crate) const EP0_RX_OFFSET: u16 = 96;
pub(crate) const EP0_RX_LEN: u16 = 64;
pub(crate) const EP1_TX_OFFSET: u16 = 160;
pub(crate) const EP1_TX_LEN: u16 = 16;
pub(crate) const EP2_RX_OFFSET: u16 = 176;
pub(crate) const EP2_RX_LEN: u16 = 16;

/// COUNT_RX encoding for a 64-byte buffer: BLSIZE = 1, NUM_BLOCK = 1
pub(crate) const RX_COUNT_64: u16 = 0x8000 | (1 << 10);
/// COUNT_RX encoding for a 16-byte buffer: BLSIZE = 0, NUM_BLOCK = 8
pub(crate) const RX_COUNT_16: u16 = 8 << 10;

/// Received byte counts occupy the low 10 bits of COUNT_RX
const RX_COUNT_MASK: u16 = 0x3FF;

const fn entry(ep: usize) -> u16 {
    (ep as u16) * 8
}

fn set_tx_addr<R: UsbRegisters>(regs: &R, ep: usize, offset: u16) {
    regs.pma_write(entry(ep), offset);
}

fn set_tx_count<R: UsbRegisters>(regs: &R, ep: usize, count: u16) {
    regs.pma_write(entry(ep) + 2, count);
}

fn set_rx_addr<R: UsbRegisters>(regs: &R, ep: usize, offset: u16) {
    regs.pma_write(entry(ep) + 4, offset);
}

fn set_rx_count<R: UsbRegisters>(regs: &R, ep: usize, value: u16) {
    regs.pma_write(entry(ep) + 6, value);
}

/// Number of bytes the hardware stored in `ep`'s receive buffer
pub(crate) fn rx_count<R: UsbRegisters>(regs: &R, ep: usize) -> usize {
    usize::from(regs.pma_read(entry(ep) + 6) & RX_COUNT_MASK)
}

fn buffers(ep: usize) -> (u16, u16, u16, u16) {
    match ep {
        0 => (EP0_TX_OFFSET, EP0_TX_LEN, EP0_RX_OFFSET, EP0_RX_LEN),
        1 => (EP1_TX_OFFSET, EP1_TX_LEN, 0, 0),
        2 => (0, 0, EP2_RX_OFFSET, EP2_RX_LEN),
        _ => unreachable!("no buffers assigned to endpoint {}", ep),
    }
}

/// Write the control endpoint's buffer descriptors
///
/// The TX count is programmed per transfer by [`write_tx`].
pub(crate) fn init_control<R: UsbRegisters>(regs: &R) {
    set_tx_addr(regs, 0, EP0_TX_OFFSET);
    set_rx_addr(regs, 0, EP0_RX_OFFSET);
    set_rx_count(regs, 0, RX_COUNT_64);
}

/// Write the bulk endpoints' buffer descriptors
pub(crate) fn init_bulk<R: UsbRegisters>(regs: &R) {
    set_tx_addr(regs, 1, EP1_TX_OFFSET);
    set_rx_addr(regs, 2, EP2_RX_OFFSET);
    set_rx_count(regs, 2, RX_COUNT_16);
}

/// Copy `data` into `ep`'s transmit buffer and program its byte count
///
/// `data` longer than the buffer is truncated to the buffer size.
pub(crate) fn write_tx<R: UsbRegisters>(regs: &R, ep: usize, data: &[u8]) {
    let (offset, capacity, _, _) = buffers(ep);
    let len = data.len().min(usize::from(capacity));
    for (i, chunk) in data[..len].chunks(2).enumerate() {
        let mut half = u16::from(chunk[0]);
        if let Some(hi) = chunk.get(1) {
            half |= u16::from(*hi) << 8;
        }
        regs.pma_write(offset + 2 * i as u16, half);
    }
    set_tx_count(regs, ep, len as u16);
}

/// Copy `ep`'s received packet into `buf`, returning its length
///
/// The length is the hardware's received count, capped by the buffer sizes
/// on both sides.
pub(crate) fn read_rx<R: UsbRegisters>(regs: &R, ep: usize, buf: &mut [u8]) -> usize {
    let (_, _, offset, capacity) = buffers(ep);
    let len = rx_count(regs, ep).min(usize::from(capacity)).min(buf.len());
    for (i, chunk) in buf[..len].chunks_mut(2).enumerate() {
        let half = regs.pma_read(offset + 2 * i as u16);
        chunk[0] = half as u8;
        if let Some(hi) = chunk.get_mut(1) {
            *hi = (half >> 8) as u8;
        }
    }
    len
}
