//! Embedded controller device backends

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::TransportError;
use crate::protocol::{self, PacketBuffer};
use crate::{EcDevice, EcHandle};

/// The CrosEC device exposed by the host OS
///
/// Every [`EcDevice::open`] returns a fresh handle; the OS handle is closed
/// when the returned [`CrosEcHandle`] is dropped.
#[derive(Debug, Clone)]
pub struct CrosEcDevice {
    path: PathBuf,
}

impl Default for CrosEcDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosEcDevice {
    /// Device at the platform's well-known path
    pub fn new() -> Self {
        Self::with_path(protocol::device::default_path())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EcDevice for CrosEcDevice {
    fn open(&self) -> Result<Box<dyn EcHandle>, TransportError> {
        Ok(Box::new(CrosEcHandle::open(&self.path)?))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Open OS handle to the CrosEC device
pub struct CrosEcHandle {
    file: File,
    path: PathBuf,
}

impl CrosEcHandle {
    /// Open read+write (shared read+write on Windows)
    pub fn open(path: &Path) -> Result<Self, TransportError> {
        if !cfg!(any(target_os = "linux", windows)) {
            return Err(TransportError::Unsupported);
        }

        let mut options = OpenOptions::new();
        options.read(true).write(true);

        #[cfg(windows)]
        {
            use std::os::windows::fs::OpenOptionsExt;
            use windows_sys::Win32::Storage::FileSystem::{FILE_SHARE_READ, FILE_SHARE_WRITE};
            options.share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE);
        }

        let file = options
            .open(path)
            .map_err(|e| TransportError::DeviceUnavailable {
                path: path.display().to_string(),
                code: e.raw_os_error().unwrap_or(-1),
            })?;
        debug!("Opened EC device {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl EcHandle for CrosEcHandle {
    #[cfg(target_os = "linux")]
    fn exchange(&mut self, command: u16, packet: &mut PacketBuffer) -> Result<(), TransportError> {
        use std::os::unix::io::AsRawFd;

        let fd = self.file.as_raw_fd();
        // SAFETY: the buffer is a full cros_ec_command (20-byte header +
        // 236-byte data area), and insize in the header never exceeds it.
        let ret = unsafe {
            libc::ioctl(
                fd,
                protocol::ioctl::CROS_EC_DEV_IOCXCMD as _,
                packet.as_mut_ptr(),
            )
        };
        if ret < 0 {
            return Err(TransportError::last_os_error(command));
        }
        Ok(())
    }

    #[cfg(windows)]
    fn exchange(&mut self, command: u16, packet: &mut PacketBuffer) -> Result<(), TransportError> {
        use std::os::windows::io::AsRawHandle;
        use windows_sys::Win32::System::IO::DeviceIoControl;

        let size = packet.len() as u32;
        let ptr = packet.as_mut_ptr().cast::<core::ffi::c_void>();
        let mut returned: u32 = 0;
        // SAFETY: METHOD_BUFFERED ioctl; input and output alias the same
        // packet buffer, which outlives the synchronous call.
        let ok = unsafe {
            DeviceIoControl(
                self.file.as_raw_handle() as _,
                protocol::ioctl::IOCTL_CROSEC_XCMD,
                ptr,
                size,
                ptr,
                size,
                &mut returned,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(TransportError::last_os_error(command));
        }
        Ok(())
    }

    #[cfg(not(any(target_os = "linux", windows)))]
    fn exchange(
        &mut self,
        _command: u16,
        _packet: &mut PacketBuffer,
    ) -> Result<(), TransportError> {
        Err(TransportError::Unsupported)
    }
}

impl Drop for CrosEcHandle {
    fn drop(&mut self) {
        trace!("Closing EC device {}", self.path.display());
    }
}
