//! Register interface for the STM32F0 USB macrocell
//!
//! The module implements a RAL-compatible register block for the USB
//! peripheral, plus the [`UsbRegisters`] access interface that the rest of
//! the driver is written against. The memory-mapped implementation is
//! [`Mmio`]; tests substitute a simulated bank.

#![allow(non_snake_case, non_upper_case_globals)]

use ral_registers::RWRegister;

/// The USB register block, at offset 0 of the peripheral
///
/// Registers are 16 bits wide but sit on 32-bit word boundaries; only the
/// low half of each word is significant.
#[repr(C)]
pub struct RegisterBlock {
    /// Endpoint registers, one per hardware endpoint slot
    pub EPR: [RWRegister<u32>; 8],
    _reserved: [u32; 8],
    /// Control register
    pub CNTR: RWRegister<u32>,
    /// Interrupt status register
    pub ISTR: RWRegister<u32>,
    /// Frame number register
    pub FNR: RWRegister<u32>,
    /// Device address register
    pub DADDR: RWRegister<u32>,
    /// Buffer table address, relative to the start of packet memory
    pub BTABLE: RWRegister<u32>,
    /// LPM control and status register
    pub LPMCSR: RWRegister<u32>,
    /// Battery charging detector register
    pub BCDR: RWRegister<u32>,
}

/// Endpoint register (EPnR) fields
///
/// Write semantics vary per field group. STAT and DTOG bits toggle when
/// written as 1 and hold when written as 0. CTR bits clear when written as
/// 0 and hold when written as 1. EA, EP_KIND and EP_TYPE are plain
/// read-write. SETUP is read-only.
pub mod epr {
    pub mod EA {
        pub const offset: u16 = 0;
        pub const mask: u16 = 0xF << offset;
    }
    pub mod STAT_TX {
        pub const offset: u16 = 4;
        pub const mask: u16 = 0b11 << offset;
    }
    pub mod DTOG_TX {
        pub const offset: u16 = 6;
        pub const mask: u16 = 1 << offset;
    }
    pub mod CTR_TX {
        pub const offset: u16 = 7;
        pub const mask: u16 = 1 << offset;
    }
    pub mod EP_KIND {
        pub const offset: u16 = 8;
        pub const mask: u16 = 1 << offset;
    }
    pub mod EP_TYPE {
        pub const offset: u16 = 9;
        pub const mask: u16 = 0b11 << offset;
    }
    pub mod SETUP {
        pub const offset: u16 = 11;
        pub const mask: u16 = 1 << offset;
    }
    pub mod STAT_RX {
        pub const offset: u16 = 12;
        pub const mask: u16 = 0b11 << offset;
    }
    pub mod DTOG_RX {
        pub const offset: u16 = 14;
        pub const mask: u16 = 1 << offset;
    }
    pub mod CTR_RX {
        pub const offset: u16 = 15;
        pub const mask: u16 = 1 << offset;
    }
}

/// Control register (CNTR) fields
pub mod cntr {
    pub mod FRES {
        pub const offset: u16 = 0;
        pub const mask: u16 = 1 << offset;
    }
    pub mod PDWN {
        pub const offset: u16 = 1;
        pub const mask: u16 = 1 << offset;
    }
}

/// Device address register (DADDR) fields
pub mod daddr {
    pub mod ADD {
        pub const offset: u16 = 0;
        pub const mask: u16 = 0x7F << offset;
    }
    pub mod EF {
        pub const offset: u16 = 7;
        pub const mask: u16 = 1 << offset;
    }
}

/// Battery charging detector register (BCDR) fields
pub mod bcdr {
    pub mod DPPU {
        pub const offset: u16 = 15;
        pub const mask: u16 = 1 << offset;
    }
}

bitflags::bitflags! {
    /// Interrupt status register (ISTR) event flags
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Istr: u16 {
        const L1REQ = 1 << 7;
        const ESOF = 1 << 8;
        const SOF = 1 << 9;
        const RESET = 1 << 10;
        const SUSP = 1 << 11;
        const WKUP = 1 << 12;
        const ERR = 1 << 13;
        const PMAOVR = 1 << 14;
        const CTR = 1 << 15;
    }
}

/// A type that owns the USB hardware addresses
///
/// # Safety
///
/// `Peripherals` should only be implemented on a type that owns the USB
/// register block and the USB packet memory. The pointers returned by the
/// methods are assumed to be valid for the lifetime of the implementor,
/// and will be cast to register definitions.
pub unsafe trait Peripherals {
    /// Returns the address of the USB register block
    fn usb(&self) -> *const ();
    /// Returns the address of the USB packet memory window
    fn packet_memory(&self) -> *const ();
}

/// Access to the USB registers and packet memory
///
/// All values are the logical 16-bit register contents. Packet memory is
/// addressed by its byte offset as the USB macrocell sees it; accesses are
/// one aligned half-word at a time, the only granularity the bus supports.
///
/// Every operation acts on the live hardware state. Implementations must
/// not cache: toggle and event bits change under our feet as bus traffic
/// completes, and the protocol layers rely on reading the current value
/// immediately before each write.
pub trait UsbRegisters {
    /// Read endpoint register `index`
    fn epr(&self, index: usize) -> u16;
    /// Write endpoint register `index`
    fn set_epr(&self, index: usize, value: u16);
    /// Read the interrupt status register
    fn istr(&self) -> u16;
    /// Write the interrupt status register
    fn set_istr(&self, value: u16);
    /// Write the control register
    fn set_cntr(&self, value: u16);
    /// Write the device address register
    fn set_daddr(&self, value: u16);
    /// Write the buffer table address register
    fn set_btable(&self, value: u16);
    /// Write the battery charging detector register
    fn set_bcdr(&self, value: u16);
    /// Read the packet memory half-word at byte offset `offset`
    fn pma_read(&self, offset: u16) -> u16;
    /// Write the packet memory half-word at byte offset `offset`
    fn pma_write(&self, offset: u16, value: u16);
}

impl<R: UsbRegisters> UsbRegisters for &R {
    fn epr(&self, index: usize) -> u16 {
        (**self).epr(index)
    }
    fn set_epr(&self, index: usize, value: u16) {
        (**self).set_epr(index, value)
    }
    fn istr(&self) -> u16 {
        (**self).istr()
    }
    fn set_istr(&self, value: u16) {
        (**self).set_istr(value)
    }
    fn set_cntr(&self, value: u16) {
        (**self).set_cntr(value)
    }
    fn set_daddr(&self, value: u16) {
        (**self).set_daddr(value)
    }
    fn set_btable(&self, value: u16) {
        (**self).set_btable(value)
    }
    fn set_bcdr(&self, value: u16) {
        (**self).set_bcdr(value)
    }
    fn pma_read(&self, offset: u16) -> u16 {
        (**self).pma_read(offset)
    }
    fn pma_write(&self, offset: u16, value: u16) {
        (**self).pma_write(offset, value)
    }
}

/// The memory-mapped register bank
///
/// Packet memory on this part is addressed in half-words, but the bridge
/// puts each half-word in the low half of a 32-bit word: the half-word at
/// packet-memory offset `o` lives at byte `2 * o` of the window.
pub struct Mmio<P> {
    peripherals: P,
}

impl<P: Peripherals> Mmio<P> {
    pub fn new(peripherals: P) -> Self {
        Mmio { peripherals }
    }

    fn block(&self) -> &RegisterBlock {
        // Safety: Peripherals implementors guarantee the pointer addresses
        // the USB register block.
        unsafe { &*(self.peripherals.usb() as *const RegisterBlock) }
    }

    fn pma_word(&self, offset: u16) -> *mut u32 {
        let base = self.peripherals.packet_memory() as *mut u32;
        // Safety: offset stays inside the packet memory window; see the
        // fixed layout in `pma`.
        unsafe { base.add(usize::from(offset) / 2) }
    }
}

impl<P: Peripherals> UsbRegisters for Mmio<P> {
    fn epr(&self, index: usize) -> u16 {
        self.block().EPR[index].read() as u16
    }
    fn set_epr(&self, index: usize, value: u16) {
        self.block().EPR[index].write(value.into())
    }
    fn istr(&self) -> u16 {
        self.block().ISTR.read() as u16
    }
    fn set_istr(&self, value: u16) {
        self.block().ISTR.write(value.into())
    }
    fn set_cntr(&self, value: u16) {
        self.block().CNTR.write(value.into())
    }
    fn set_daddr(&self, value: u16) {
        self.block().DADDR.write(value.into())
    }
    fn set_btable(&self, value: u16) {
        self.block().BTABLE.write(value.into())
    }
    fn set_bcdr(&self, value: u16) {
        self.block().BCDR.write(value.into())
    }
    fn pma_read(&self, offset: u16) -> u16 {
        unsafe { self.pma_word(offset).read_volatile() as u16 }
    }
    fn pma_write(&self, offset: u16, value: u16) {
        unsafe { self.pma_word(offset).write_volatile(value.into()) }
    }
}
