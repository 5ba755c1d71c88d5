//! Setup packet decoding
//!
//! A control transfer begins with an 8-byte setup packet copied verbatim
//! out of the control endpoint's receive buffer. The packet is little
//! endian: request-type byte, request code, then three 16-bit fields.

use usb_device::control::{Recipient, RequestType};
use usb_device::UsbDirection;

/// A decoded control request
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct SetupPacket {
    pub direction: UsbDirection,
    pub request_type: RequestType,
    pub recipient: Recipient,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    pub(crate) fn parse(buf: &[u8; 8]) -> SetupPacket {
        let rt = buf[0];
        SetupPacket {
            direction: if rt & 0x80 != 0 {
                UsbDirection::In
            } else {
                UsbDirection::Out
            },
            request_type: match (rt >> 5) & 0b11 {
                0 => RequestType::Standard,
                1 => RequestType::Class,
                2 => RequestType::Vendor,
                _ => RequestType::Reserved,
            },
            recipient: match rt & 0x1F {
                0 => Recipient::Device,
                1 => Recipient::Interface,
                2 => Recipient::Endpoint,
                3 => Recipient::Other,
                _ => Recipient::Reserved,
            },
            request: buf[1],
            value: u16::from_le_bytes([buf[2], buf[3]]),
            index: u16::from_le_bytes([buf[4], buf[5]]),
            length: u16::from_le_bytes([buf[6], buf[7]]),
        }
    }
}

impl core::fmt::Debug for SetupPacket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:?} {:?} {:?} request={:#04X} value={:#06X} index={:#06X} length={}",
            self.direction,
            self.request_type,
            self.recipient,
            self.request,
            self.value,
            self.index,
            self.length,
        )
    }
}
