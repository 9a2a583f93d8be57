//! In-process embedded controller
//!
//! Decodes every command packet the transport sends and records the RGB
//! writes in arrival order. Failures can be injected at open time, at
//! exchange time, or through the result status the controller answers with.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::TransportError;
use crate::protocol::{self, cmd, CommandPacket, PacketBuffer};
use crate::types::RgbWrite;
use crate::{EcDevice, EcHandle};

/// Callback run after each recorded RGB write (outside the state lock)
pub type WriteHook = Box<dyn Fn(&RgbWrite) + Send + Sync>;

#[derive(Default)]
struct MemoryState {
    writes: Vec<RgbWrite>,
    opens: usize,
    open_handles: usize,
    status: u32,
    open_error: Option<i32>,
    io_error: Option<i32>,
}

/// Recording EC double
#[derive(Clone, Default)]
pub struct MemoryDevice {
    state: Arc<Mutex<MemoryState>>,
    hook: Arc<Mutex<Option<WriteHook>>>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every command with `status` in the result field
    pub fn set_status(&self, status: u32) {
        self.state.lock().status = status;
    }

    /// Make `open` fail with the given OS error code
    pub fn fail_open(&self, code: Option<i32>) {
        self.state.lock().open_error = code;
    }

    /// Make the device call fail with the given OS error code
    pub fn fail_io(&self, code: Option<i32>) {
        self.state.lock().io_error = code;
    }

    /// Run `hook` after each recorded write
    pub fn on_write(&self, hook: impl Fn(&RgbWrite) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }

    /// All RGB writes received so far
    pub fn writes(&self) -> Vec<RgbWrite> {
        self.state.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    /// Number of successful opens
    pub fn open_count(&self) -> usize {
        self.state.lock().opens
    }

    /// Handles opened and not yet dropped
    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }
}

impl EcDevice for MemoryDevice {
    fn open(&self) -> Result<Box<dyn EcHandle>, TransportError> {
        let mut state = self.state.lock();
        if let Some(code) = state.open_error {
            return Err(TransportError::DeviceUnavailable {
                path: self.describe(),
                code,
            });
        }
        state.opens += 1;
        state.open_handles += 1;

        Ok(Box::new(MemoryHandle {
            device: self.clone(),
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

struct MemoryHandle {
    device: MemoryDevice,
}

impl EcHandle for MemoryHandle {
    fn exchange(&mut self, command: u16, packet: &mut PacketBuffer) -> Result<(), TransportError> {
        let request = CommandPacket::decode(packet);
        let recorded = {
            let mut state = self.device.state.lock();
            if let Some(code) = state.io_error {
                return Err(TransportError::Io { command, code });
            }

            let recorded = if request.command == cmd::RGBKBD_SET_COLOR as u32 {
                let write = protocol::decode_rgb_payload(request.payload())?;
                trace!(
                    "memory EC: start_key={} count={}",
                    write.start_key,
                    write.colors.len()
                );
                state.writes.push(write.clone());
                Some(write)
            } else {
                None
            };

            let response = CommandPacket {
                result: state.status,
                ..request
            };
            *packet = response.encode();
            recorded
        };

        if let Some(write) = recorded {
            if let Some(hook) = self.device.hook.lock().as_ref() {
                hook(&write);
            }
        }
        Ok(())
    }
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        self.device.state.lock().open_handles -= 1;
    }
}
