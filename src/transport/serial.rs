//! # USB Serial Transport
//!
//! Request/response handshake for updating a remote over its USB serial
//! port.
//!
//! ## Protocol
//!
//! The client sends a one-byte command plus a little-endian `u16` word
//! count, then the blob:
//!
//! - `0x10` — write the blob to device flash
//! - `0x20` — verify: the device compares the re-sent blob against flash
//!
//! The device acknowledges the header with a status byte (an echo of the
//! command byte means "ready") and answers the payload with a final
//! status byte (echo = pass, anything else = fail).
//!
//! ## TTY Configuration
//!
//! The serial device is opened in raw mode so binary data passes through
//! unmodified: no input/output processing, no echo, no canonical mode,
//! 8-bit characters, and XON/XOFF flow control disabled (0x11 and 0x13
//! appear freely in packed data).
//!
//! ## Chunked Writes
//!
//! Large blobs are written in chunks with a small delay so the device's
//! serial buffer is never overwhelmed.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

use crate::error::PackError;

/// Default serial device path
pub const DEFAULT_DEVICE: &str = "/dev/ttyACM0";

/// Write the blob to device flash
pub const CMD_WRITE: u8 = 0x10;

/// Verify device flash against a re-sent blob
pub const CMD_VERIFY: u8 = 0x20;

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// Read timeout in tenths of a second (termios VTIME)
const READ_TIMEOUT_DS: u8 = 50;

/// A serial connection to the remote.
pub struct SerialTransport {
    file: File,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl SerialTransport {
    /// Open a serial connection and put the tty into raw mode.
    ///
    /// ## Errors
    ///
    /// Returns an error if the device doesn't exist, permission is denied
    /// (dialout group), or tty configuration fails.
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, PackError> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| PackError::Transport(format!("Failed to open {}: {e}", path.display())))?;

        #[cfg(unix)]
        configure_tty_raw(file.as_raw_fd())?;

        Ok(Self {
            file,
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        })
    }

    /// Open with the default device path.
    pub fn open_default() -> Result<Self, PackError> {
        Self::open(DEFAULT_DEVICE)
    }

    /// Write the blob to the device's flash store.
    pub fn download(&mut self, blob: &[u8]) -> Result<(), PackError> {
        self.send(CMD_WRITE, blob)
    }

    /// Re-send the blob and have the device compare it against flash.
    pub fn verify(&mut self, blob: &[u8]) -> Result<(), PackError> {
        self.send(CMD_VERIFY, blob)
    }

    fn send(&mut self, command: u8, blob: &[u8]) -> Result<(), PackError> {
        let words = word_count(blob.len())?;

        let mut header = vec![command];
        header.extend_from_slice(&words.to_le_bytes());
        self.write_chunked(&header)?;

        let ready = self.read_status()?;
        if ready != command {
            return Err(PackError::Transport(format!(
                "device not ready for command {command:#04x} (got {ready:#04x})"
            )));
        }

        self.write_chunked(blob)?;

        let status = self.read_status()?;
        if status != command {
            return Err(PackError::Transport(match command {
                CMD_VERIFY => format!("verify failed (status {status:#04x})"),
                _ => format!("write failed (status {status:#04x})"),
            }));
        }
        Ok(())
    }

    fn write_chunked(&mut self, data: &[u8]) -> Result<(), PackError> {
        for chunk in data.chunks(self.chunk_size) {
            self.file
                .write_all(chunk)
                .map_err(|e| PackError::Transport(format!("Write failed: {e}")))?;

            if data.len() > self.chunk_size && !self.chunk_delay.is_zero() {
                thread::sleep(self.chunk_delay);
            }
        }
        self.file
            .flush()
            .map_err(|e| PackError::Transport(format!("Flush failed: {e}")))?;
        Ok(())
    }

    fn read_status(&mut self) -> Result<u8, PackError> {
        let mut status = [0u8; 1];
        let n = self
            .file
            .read(&mut status)
            .map_err(|e| PackError::Transport(format!("Read failed: {e}")))?;
        if n == 0 {
            return Err(PackError::Transport("device did not respond".to_string()));
        }
        Ok(status[0])
    }
}

/// Blob length in 32-bit words for the transfer header.
///
/// The header's count field is a `u16`, which caps a transfer at
/// `65535 * 4` bytes; larger blobs are rejected rather than truncated.
fn word_count(len: usize) -> Result<u16, PackError> {
    if len % 4 != 0 {
        return Err(PackError::Transport(format!(
            "blob length {len} is not word aligned"
        )));
    }
    let words = len / 4;
    if words > u16::MAX as usize {
        return Err(PackError::Transport(format!(
            "blob length {len} exceeds the {} byte transfer limit",
            u16::MAX as usize * 4
        )));
    }
    Ok(words as u16)
}

/// Configure a file descriptor for raw TTY mode.
///
/// Disables all input/output processing so binary data passes through
/// unmodified, and arms a read timeout so a silent device surfaces as an
/// error instead of a hang.
#[cfg(unix)]
fn configure_tty_raw(fd: i32) -> Result<(), PackError> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(PackError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    // Input flags: no processing, no XON/XOFF flow control
    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    // Output flags: no post-processing
    termios.c_oflag &= !libc::OPOST;

    // Local flags: no echo, canonical mode or signals
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    // Control flags: 8-bit characters, no parity
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    // Blocking read of up to one byte with a timeout
    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = READ_TIMEOUT_DS;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(PackError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_for_aligned_blob() {
        assert_eq!(word_count(8).unwrap(), 2);
        assert_eq!(word_count(0).unwrap(), 0);
        assert_eq!(word_count(u16::MAX as usize * 4).unwrap(), u16::MAX);
    }

    #[test]
    fn test_unaligned_blob_is_rejected() {
        assert!(matches!(word_count(6), Err(PackError::Transport(_))));
    }

    #[test]
    fn test_oversized_blob_is_rejected_not_truncated() {
        let err = word_count(u16::MAX as usize * 4 + 4).unwrap_err();
        match err {
            PackError::Transport(message) => assert!(message.contains("transfer limit")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
