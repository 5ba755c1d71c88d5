//! The USB device protocol engine
//!
//! [`Driver`] owns the register interface and drives everything from
//! [`poll()`](Driver::poll): bus reset detection, control transfers on
//! endpoint 0, and the bulk exchange on endpoints 1 (IN) and 2 (OUT).
//! Nothing blocks and nothing is interrupt-driven; the expectation is one
//! `poll()` call per main-loop iteration.

use crate::control::{self, InCompleteAction, SetupAction, Stage};
use crate::descriptor;
use crate::endpoint::{self, Kind, Stat};
use crate::pma;
use crate::ral::{bcdr, cntr, daddr, epr, Istr, UsbRegisters};
use crate::setup::SetupPacket;

/// Cycles to wait for the transceiver's t_STARTUP (1 µs at 48 MHz)
const STARTUP_DELAY_CYCLES: u32 = 72;

/// Events observed during one [`Driver::poll`] iteration
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Poll {
    /// A bus reset was observed and the control endpoint reinitialized
    pub reset: bool,
    /// The bulk IN endpoint completed a transmission and was re-armed
    pub bulk_in_done: bool,
    /// A bulk OUT frame arrived; carries its first byte as a binary flag
    pub bulk_out: Option<bool>,
}

/// The USB full-speed device driver
///
/// After construction, call [`initialize()`](Driver::initialize) once, then
/// [`poll()`](Driver::poll) continuously.
pub struct Driver<R> {
    regs: R,
    stage: Stage,
}

impl<R: UsbRegisters> Driver<R> {
    /// Create a new `Driver` over a register interface
    ///
    /// Creation touches no hardware.
    pub fn new(regs: R) -> Self {
        Driver {
            regs,
            stage: Stage::Idle,
        }
    }

    /// Power up the transceiver and enter the post-reset default state
    ///
    /// Assumes the USB clock is already running. Holds the force-reset bit
    /// through the transceiver's startup time, then presents the device to
    /// the host by enabling the D+ pull-up.
    pub fn initialize(&mut self) {
        self.regs.set_cntr(cntr::FRES::mask);
        cortex_m::asm::delay(STARTUP_DELAY_CYCLES);
        self.regs.set_cntr(0);
        self.reset();
        self.regs.set_bcdr(bcdr::DPPU::mask);
    }

    /// Reinitialize the control endpoint to its post-reset default
    ///
    /// Called on every observed bus reset; any in-flight control transfer
    /// is discarded. The endpoint register write is absolute because the
    /// macrocell clears the endpoint registers on reset, so every toggle
    /// bit is known to start from zero.
    pub fn reset(&mut self) {
        self.regs.set_istr(0);
        self.regs.set_btable(0);
        pma::init_control(&self.regs);
        self.regs.set_epr(
            0,
            ((Kind::Control as u16) << epr::EP_TYPE::offset)
                | ((Stat::Valid as u16) << epr::STAT_RX::offset),
        );
        // respond on address 0 until SET_ADDRESS commits a new one
        self.regs.set_daddr(daddr::EF::mask);
        self.stage = Stage::Idle;
        debug!("RESET");
    }

    /// Service the bus and all endpoints; one non-blocking iteration
    pub fn poll(&mut self) -> Poll {
        let mut events = Poll::default();

        let istr = Istr::from_bits_truncate(self.regs.istr());
        if istr.contains(Istr::RESET) {
            self.reset();
            events.reset = true;
            return events;
        }

        let ep0 = self.regs.epr(0);
        if ep0 & epr::CTR_RX::mask != 0 {
            if ep0 & epr::SETUP::mask != 0 {
                self.handle_setup();
            } else {
                self.stage = control::on_out_complete(self.stage);
            }
            // ready for whatever the host sends next
            endpoint::arm_receive(&self.regs, 0);
        }
        if ep0 & epr::CTR_TX::mask != 0 {
            self.handle_in_complete();
        }

        let ep1 = self.regs.epr(1);
        if ep1 & epr::CTR_TX::mask != 0 {
            // continuous one-way reporting: immediately queue the next frame
            self.send(1, &descriptor::DEVICE[..4]);
            events.bulk_in_done = true;
        }

        let ep2 = self.regs.epr(2);
        if ep2 & epr::CTR_RX::mask != 0 {
            let mut frame = [0u8; pma::EP2_RX_LEN as usize];
            let received = pma::read_rx(&self.regs, 2, &mut frame);
            if received > 0 {
                events.bulk_out = Some(frame[0] != 0);
            }
            endpoint::arm_receive(&self.regs, 2);
        }

        events
    }

    /// A setup packet is waiting in the control endpoint's receive buffer
    fn handle_setup(&mut self) {
        if pma::rx_count(&self.regs, 0) < 8 {
            endpoint::stall_transmit(&self.regs, 0);
            return;
        }

        let mut raw = [0u8; 8];
        pma::read_rx(&self.regs, 0, &mut raw);
        let packet = SetupPacket::parse(&raw);
        trace!("EP0 SETUP {:?}", packet);

        let (stage, action) = control::on_setup(self.stage, &packet);
        self.stage = stage;
        match action {
            SetupAction::SendStatus => self.send(0, &[]),
            SetupAction::SendDescriptor(bytes) => self.send(0, bytes),
            SetupAction::Configure => {
                self.configure_endpoints();
                self.send(1, &descriptor::DEVICE[..4]);
                self.send(0, &[]);
            }
            SetupAction::Stall => endpoint::stall_transmit(&self.regs, 0),
        }
    }

    /// The control endpoint finished transmitting
    fn handle_in_complete(&mut self) {
        let (stage, action) = control::on_in_complete(self.stage);
        self.stage = stage;
        match action {
            InCompleteAction::CommitAddress(address) => {
                // the status packet is out; the deferred address applies now
                self.regs.set_daddr(daddr::EF::mask | u16::from(address));
                debug!("ADDRESS {}", address);
                endpoint::stall_transmit(&self.regs, 0);
            }
            InCompleteAction::Stall => endpoint::stall_transmit(&self.regs, 0),
            InCompleteAction::ContinueDataIn => self.send(0, &[]),
        }
    }

    /// Bring up the bulk endpoint pair for the active configuration
    ///
    /// IN starts out stalled (nothing queued yet) and OUT starts ready to
    /// receive; both restart their data toggles at DATA0.
    fn configure_endpoints(&mut self) {
        pma::init_bulk(&self.regs);
        let current = self.regs.epr(1);
        self.regs
            .set_epr(1, endpoint::configure(current, Kind::Bulk, 1, Stat::Stall, Stat::Disabled));
        let current = self.regs.epr(2);
        self.regs
            .set_epr(2, endpoint::configure(current, Kind::Bulk, 2, Stat::Disabled, Stat::Valid));
    }

    /// Load `data` into `ep`'s transmit buffer and mark it ready
    fn send(&self, ep: usize, data: &[u8]) {
        pma::write_tx(&self.regs, ep, data);
        endpoint::arm_transmit(&self.regs, ep);
    }
}
