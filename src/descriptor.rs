//! Static USB descriptor tables
//!
//! The device presents a single configuration: one vendor-specific
//! interface with a bulk IN endpoint (0x81) and a bulk OUT endpoint (0x02),
//! 16-byte max packets. All tables are fixed at build time and served
//! byte-for-byte by the control transfer engine.

use usb_device::descriptor::descriptor_type;

/// Vendor ID (STMicroelectronics)
pub const VENDOR_ID: u16 = 0x0483;
/// Product ID
pub const PRODUCT_ID: u16 = 0x5722;

/// Max packet size of the control endpoint
pub const EP0_MAX_PACKET: u8 = 64;
/// Max packet size of the bulk endpoints
pub const BULK_MAX_PACKET: u8 = 16;

const fn lo(word: u16) -> u8 {
    word as u8
}

const fn hi(word: u16) -> u8 {
    (word >> 8) as u8
}

/// Device descriptor, 18 bytes
pub static DEVICE: [u8; 18] = [
    18,                          // bLength
    descriptor_type::DEVICE,     // bDescriptorType
    0x00, 0x02,                  // bcdUSB 2.0
    0xFF,                        // bDeviceClass (vendor specific)
    0xFF,                        // bDeviceSubClass
    0xFF,                        // bDeviceProtocol
    EP0_MAX_PACKET,              // bMaxPacketSize0
    lo(VENDOR_ID), hi(VENDOR_ID),
    lo(PRODUCT_ID), hi(PRODUCT_ID),
    0x00, 0x01,                  // bcdDevice 1.0
    0,                           // iManufacturer
    0,                           // iProduct
    0,                           // iSerialNumber
    1,                           // bNumConfigurations
];

/// Configuration descriptor bundle, 32 bytes:
/// configuration + interface + two endpoint descriptors
pub static CONFIGURATION: [u8; 32] = [
    // configuration descriptor
    9,                              // bLength
    descriptor_type::CONFIGURATION, // bDescriptorType
    32, 0,                          // wTotalLength
    1,                              // bNumInterfaces
    1,                              // bConfigurationValue
    0,                              // iConfiguration
    0x80,                           // bmAttributes: bus powered
    50,                             // bMaxPower: 100 mA
    // interface descriptor
    9,                              // bLength
    descriptor_type::INTERFACE,     // bDescriptorType
    0,                              // bInterfaceNumber
    0,                              // bAlternateSetting
    2,                              // bNumEndpoints
    0xFF,                           // bInterfaceClass (vendor specific)
    0xFF,                           // bInterfaceSubClass
    0xFF,                           // bInterfaceProtocol
    0,                              // iInterface
    // bulk IN endpoint 1
    7,                              // bLength
    descriptor_type::ENDPOINT,      // bDescriptorType
    0x81,                           // bEndpointAddress: IN 1
    0x02,                           // bmAttributes: bulk
    BULK_MAX_PACKET, 0,             // wMaxPacketSize
    1,                              // bInterval
    // bulk OUT endpoint 2
    7,                              // bLength
    descriptor_type::ENDPOINT,      // bDescriptorType
    0x02,                           // bEndpointAddress: OUT 2
    0x02,                           // bmAttributes: bulk
    BULK_MAX_PACKET, 0,             // wMaxPacketSize
    1,                              // bInterval
];
