//! Command transport for the ChromeOS embedded controller (CrosEC)
//!
//! This crate frames EC host commands into the fixed-size command packet,
//! exchanges them with the controller through the platform device, and
//! validates the controller's answer. On top of that it provides the
//! chunked RGB color write used by the Framework Desktop fan lighting.
//!
//! Backends:
//!
//! - Linux: `/dev/cros_ec` via the `cros_ec_dev` ioctl
//! - Windows: the Framework CrosEC driver via `DeviceIoControl`
//! - [`MemoryDevice`]: in-process controller for tests and dry runs

pub mod cancel;
pub mod error;
pub mod memory;
pub mod protocol;
pub mod types;

mod device;

pub use cancel::CancelToken;
pub use device::{CrosEcDevice, CrosEcHandle};
pub use error::TransportError;
pub use memory::MemoryDevice;
pub use protocol::{cmd, CommandPacket, PacketBuffer};
pub use types::{Rgb, RgbWrite};

use std::sync::Arc;

use tracing::{debug, trace};

/// A source of EC connections
///
/// Each `open` acquires a fresh handle; the connection is released when the
/// handle is dropped, on every exit path.
pub trait EcDevice: Send + Sync {
    fn open(&self) -> Result<Box<dyn EcHandle>, TransportError>;

    /// Short label for logs and error messages
    fn describe(&self) -> String;
}

/// An open EC connection
pub trait EcHandle {
    /// Run one blocking device call with `packet` as both request and
    /// response buffer
    fn exchange(&mut self, command: u16, packet: &mut PacketBuffer) -> Result<(), TransportError>;
}

/// Type alias for a shared device
pub type SharedDevice = Arc<dyn EcDevice>;

/// Send one EC host command and validate the answer
///
/// Returns the response packet when the controller reports success.
pub fn send_command(
    handle: &mut dyn EcHandle,
    command: u16,
    version: u8,
    payload: &[u8],
) -> Result<CommandPacket, TransportError> {
    let request = CommandPacket::request(command, version, payload)?;
    let mut buf = request.encode();
    debug!(
        "Sending EC command 0x{:04X} ({}) v{} with {} bytes",
        command,
        cmd::name(command),
        version,
        payload.len()
    );
    trace!("Request header: {:02X?}", &buf[..protocol::HEADER_SIZE]);

    handle.exchange(command, &mut buf)?;

    let response = CommandPacket::decode(&buf);
    trace!("Response header: {:02X?}", &buf[..protocol::HEADER_SIZE]);
    if response.result != protocol::RESULT_SUCCESS {
        return Err(TransportError::ControllerRejected {
            status: response.result,
        });
    }
    Ok(response)
}

/// Write `colors` to consecutive LEDs starting at `start_key`
///
/// Colors are split into chunks of at most 64 entries, one command each.
/// Cancellation is checked before every chunk; chunks already sent stay
/// applied. The device is opened once for the whole call.
pub fn set_rgb_colors(
    device: &dyn EcDevice,
    start_key: u8,
    colors: &[Rgb],
    cancel: &CancelToken,
) -> Result<(), TransportError> {
    let last_key = start_key as usize + colors.len();
    if last_key > u8::MAX as usize + 1 {
        return Err(TransportError::StartKeyOutOfRange(last_key - 1));
    }

    let mut handle = device.open()?;
    let mut key = start_key as usize;

    for chunk in colors.chunks(protocol::rgb::MAX_KEY_COUNT) {
        if cancel.is_canceled() {
            debug!("RGB write canceled before key {}", key);
            return Err(TransportError::Canceled);
        }

        let payload = protocol::encode_rgb_payload(key as u8, chunk)?;
        send_command(handle.as_mut(), cmd::RGBKBD_SET_COLOR, 0, &payload)?;
        key += chunk.len();
    }

    Ok(())
}
