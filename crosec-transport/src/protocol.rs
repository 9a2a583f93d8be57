//! Protocol constants and packet codec for the ChromeOS EC command interface
//!
//! A command packet is a fixed 256-byte slot used in place for both the
//! request and the response:
//!
//! ```text
//! offset  size  field
//!      0     4  version   (u32 LE)
//!      4     4  command   (u32 LE)
//!      8     4  outsize   (u32 LE)  bytes of request data
//!     12     4  insize    (u32 LE)  bytes of response data accepted
//!     16     4  result    (u32 LE)  0xFF until the EC answers, 0 on success
//!     20   236  data
//! ```

use crate::error::TransportError;
use crate::types::{Rgb, RgbWrite};

/// EC host command ids
pub mod cmd {
    /// EC_CMD_RGBKBD_SET_COLOR
    pub const RGBKBD_SET_COLOR: u16 = 0x013A;

    /// Get human-readable name for a command id
    pub fn name(command: u16) -> &'static str {
        match command {
            RGBKBD_SET_COLOR => "RGBKBD_SET_COLOR",
            _ => "UNKNOWN",
        }
    }
}

/// Packet sizes
pub const MAX_REQUEST_SIZE: usize = 0x100;
pub const HEADER_SIZE: usize = 20;
pub const MAX_PAYLOAD_SIZE: usize = MAX_REQUEST_SIZE - HEADER_SIZE;

/// `result` value written before the call; the EC overwrites it
pub const RESULT_PENDING: u32 = 0xFF;
pub const RESULT_SUCCESS: u32 = 0;

/// RGB keyboard parameters
pub mod rgb {
    /// Maximum LEDs addressed by one RGBKBD_SET_COLOR command
    pub const MAX_KEY_COUNT: usize = 64;
    /// start_key + length
    pub const PAYLOAD_HEADER_SIZE: usize = 2;
    /// Full parameter struct: header + 64 color slots
    pub const PAYLOAD_SIZE: usize = PAYLOAD_HEADER_SIZE + MAX_KEY_COUNT * 3;
}

/// Device identification constants
pub mod device {
    /// cros_ec character device exposed by the Linux cros_ec_dev driver
    pub const LINUX_PATH: &str = "/dev/cros_ec";
    /// Device object exposed by the Framework Windows CrosEC driver
    pub const WINDOWS_PATH: &str = r"\\.\GLOBALROOT\Device\CrosEC";

    /// Path for the current platform
    pub fn default_path() -> &'static str {
        if cfg!(windows) {
            WINDOWS_PATH
        } else {
            LINUX_PATH
        }
    }
}

/// Device control codes
pub mod ioctl {
    /// Linux `_IOC` encoding
    pub const fn ioc(dir: u32, typ: u32, nr: u32, size: u32) -> u32 {
        (dir << 30) | ((size & 0x3FFF) << 16) | (typ << 8) | nr
    }

    /// `CROS_EC_DEV_IOCXCMD`: `_IOWR(0xEC, 0, struct cros_ec_command)`
    ///
    /// The kernel struct ends in a flexible array, so only the header
    /// contributes to the encoded size.
    pub const CROS_EC_DEV_IOCXCMD: u32 = ioc(3, 0xEC, 0, super::HEADER_SIZE as u32);

    /// Windows `CTL_CODE` macro
    pub const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> u32 {
        (device_type << 16) | (access << 14) | (function << 2) | method
    }

    const FILE_DEVICE_CROS_EMBEDDED_CONTROLLER: u32 = 0x80EC;
    const METHOD_BUFFERED: u32 = 0;
    const FILE_READ_DATA: u32 = 0x0001;
    const FILE_WRITE_DATA: u32 = 0x0002;

    /// `IOCTL_CROSEC_XCMD` of the Framework CrosEC driver
    pub const IOCTL_CROSEC_XCMD: u32 = ctl_code(
        FILE_DEVICE_CROS_EMBEDDED_CONTROLLER,
        0x801,
        METHOD_BUFFERED,
        FILE_READ_DATA | FILE_WRITE_DATA,
    );
}

/// Raw packet buffer exchanged with the device
pub type PacketBuffer = [u8; MAX_REQUEST_SIZE];

/// Decoded command packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPacket {
    pub version: u32,
    pub command: u32,
    pub out_size: u32,
    pub in_size: u32,
    pub result: u32,
    pub data: [u8; MAX_PAYLOAD_SIZE],
}

impl CommandPacket {
    /// Build a request: payload copied in, rest zero, result pending
    pub fn request(command: u16, version: u8, payload: &[u8]) -> Result<Self, TransportError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(TransportError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let mut data = [0u8; MAX_PAYLOAD_SIZE];
        data[..payload.len()].copy_from_slice(payload);

        Ok(Self {
            version: version as u32,
            command: command as u32,
            out_size: payload.len() as u32,
            in_size: MAX_PAYLOAD_SIZE as u32,
            result: RESULT_PENDING,
            data,
        })
    }

    /// Request data (the first `out_size` bytes of the data area)
    pub fn payload(&self) -> &[u8] {
        let len = (self.out_size as usize).min(MAX_PAYLOAD_SIZE);
        &self.data[..len]
    }

    /// Serialize to the fixed wire layout
    pub fn encode(&self) -> PacketBuffer {
        let mut buf = [0u8; MAX_REQUEST_SIZE];
        buf[0..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..8].copy_from_slice(&self.command.to_le_bytes());
        buf[8..12].copy_from_slice(&self.out_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.in_size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.result.to_le_bytes());
        buf[HEADER_SIZE..].copy_from_slice(&self.data);
        buf
    }

    /// Parse the fixed wire layout
    pub fn decode(buf: &PacketBuffer) -> Self {
        let word = |offset: usize| {
            u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
        };
        let mut data = [0u8; MAX_PAYLOAD_SIZE];
        data.copy_from_slice(&buf[HEADER_SIZE..]);

        Self {
            version: word(0),
            command: word(4),
            out_size: word(8),
            in_size: word(12),
            result: word(16),
            data,
        }
    }
}

/// Build an RGBKBD_SET_COLOR parameter block
///
/// Format: `[start_key] [length] [R G B] * 64` with unused slots zeroed.
pub fn encode_rgb_payload(start_key: u8, colors: &[Rgb]) -> Result<Vec<u8>, TransportError> {
    if colors.len() > rgb::MAX_KEY_COUNT {
        return Err(TransportError::PayloadTooLarge {
            len: rgb::PAYLOAD_HEADER_SIZE + colors.len() * 3,
            max: rgb::PAYLOAD_SIZE,
        });
    }

    let mut payload = vec![0u8; rgb::PAYLOAD_SIZE];
    payload[0] = start_key;
    payload[1] = colors.len() as u8;
    for (slot, color) in payload[rgb::PAYLOAD_HEADER_SIZE..]
        .chunks_exact_mut(3)
        .zip(colors)
    {
        slot.copy_from_slice(&color.to_bytes());
    }
    Ok(payload)
}

/// Parse an RGBKBD_SET_COLOR parameter block
pub fn decode_rgb_payload(payload: &[u8]) -> Result<RgbWrite, TransportError> {
    if payload.len() < rgb::PAYLOAD_HEADER_SIZE {
        return Err(TransportError::Malformed(format!(
            "RGB payload too short: {} bytes",
            payload.len()
        )));
    }

    let start_key = payload[0];
    let count = payload[1] as usize;
    if count > rgb::MAX_KEY_COUNT {
        return Err(TransportError::Malformed(format!(
            "RGB payload announces {count} colors, maximum is {}",
            rgb::MAX_KEY_COUNT
        )));
    }

    let end = rgb::PAYLOAD_HEADER_SIZE + count * 3;
    if payload.len() < end {
        return Err(TransportError::Malformed(format!(
            "RGB payload announces {count} colors but holds {} bytes",
            payload.len()
        )));
    }

    let colors = payload[rgb::PAYLOAD_HEADER_SIZE..end]
        .chunks_exact(3)
        .map(|c| Rgb::new(c[0], c[1], c[2]))
        .collect();

    Ok(RgbWrite { start_key, colors })
}
