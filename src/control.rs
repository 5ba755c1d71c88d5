//! Control transfer state machine
//!
//! USB control transfers are staged: setup, an optional data stage, then a
//! zero-length status packet in the opposite direction. The hardware only
//! reports "receive complete" and "transmit complete" per endpoint, so the
//! engine keeps one [`Stage`] value recording what the next completion on
//! the control endpoint means. The transition functions here are pure;
//! the driver executes the returned actions against the hardware.

use crate::descriptor;
use crate::setup::SetupPacket;
use usb_device::control::{Recipient, Request, RequestType};
use usb_device::descriptor::descriptor_type;
use usb_device::UsbDirection;

/// What the next completion event on the control endpoint should do
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Stage {
    /// No transfer in progress; any completion is unexpected
    Idle,
    /// Status packet armed for SET_ADDRESS; commit this address once it
    /// has actually gone out (the deferred-address rule)
    SetAddress(u8),
    /// Status packet armed for a host-to-device request with no data stage
    StatusIn,
    /// Descriptor data armed; the host acknowledges with an empty OUT
    DataIn,
}

/// Hardware action a setup packet dispatch asks for
#[derive(PartialEq, Eq, Debug)]
pub(crate) enum SetupAction {
    /// Arm a zero-length status packet
    SendStatus,
    /// Send descriptor bytes, already truncated to the requested length
    SendDescriptor(&'static [u8]),
    /// Bring up the bulk endpoints, then arm a zero-length status packet
    Configure,
    /// Protocol error: stall the control endpoint
    Stall,
}

/// Hardware action a transmit-complete event asks for
#[derive(PartialEq, Eq, Debug)]
pub(crate) enum InCompleteAction {
    /// The status packet went out: commit the device address, then stall
    /// until the next setup packet
    CommitAddress(u8),
    /// Done (or unexpected): stall until the next setup packet
    Stall,
    /// Data stage continues: arm the next packet
    ///
    /// Always a zero-length packet here, which terminates the stage. This
    /// is only correct for descriptors of at most one max packet; larger
    /// descriptors would need chunked continuation.
    ContinueDataIn,
}

/// Dispatch a setup packet
///
/// Branches on (direction, type, recipient) and the request code. Anything
/// outside the supported set stalls and leaves the stage unchanged.
pub(crate) fn on_setup(stage: Stage, packet: &SetupPacket) -> (Stage, SetupAction) {
    match (
        packet.direction,
        packet.request_type,
        packet.recipient,
        packet.request,
    ) {
        (UsbDirection::Out, RequestType::Standard, Recipient::Device, Request::SET_ADDRESS) => {
            // Stage the address; it must not take effect before the status
            // packet has been transmitted.
            (
                Stage::SetAddress(packet.value as u8),
                SetupAction::SendStatus,
            )
        }
        (
            UsbDirection::Out,
            RequestType::Standard,
            Recipient::Device,
            Request::SET_CONFIGURATION,
        ) => (Stage::StatusIn, SetupAction::Configure),
        (UsbDirection::In, RequestType::Standard, Recipient::Device, Request::GET_DESCRIPTOR) => {
            let table: &'static [u8] = match (packet.value >> 8) as u8 {
                descriptor_type::DEVICE => &descriptor::DEVICE,
                descriptor_type::CONFIGURATION => &descriptor::CONFIGURATION,
                _ => return (stage, SetupAction::Stall),
            };
            let len = table.len().min(usize::from(packet.length));
            (Stage::DataIn, SetupAction::SendDescriptor(&table[..len]))
        }
        (UsbDirection::Out, RequestType::Standard, Recipient::Interface, Request::SET_INTERFACE) => {
            (Stage::StatusIn, SetupAction::SendStatus)
        }
        (UsbDirection::Out, RequestType::Standard, Recipient::Endpoint, Request::CLEAR_FEATURE) => {
            (Stage::StatusIn, SetupAction::SendStatus)
        }
        _ => (stage, SetupAction::Stall),
    }
}

/// A transmit on the control endpoint completed
pub(crate) fn on_in_complete(stage: Stage) -> (Stage, InCompleteAction) {
    match stage {
        Stage::SetAddress(address) => (Stage::Idle, InCompleteAction::CommitAddress(address)),
        Stage::StatusIn => (Stage::Idle, InCompleteAction::Stall),
        Stage::DataIn => (Stage::DataIn, InCompleteAction::ContinueDataIn),
        Stage::Idle => (Stage::Idle, InCompleteAction::Stall),
    }
}

/// A non-setup packet arrived on the control endpoint
///
/// While a descriptor read is in flight this is the host's empty
/// status-stage acknowledgment; otherwise it carries no meaning here.
pub(crate) fn on_out_complete(stage: Stage) -> Stage {
    match stage {
        Stage::DataIn => Stage::Idle,
        other => other,
    }
}
