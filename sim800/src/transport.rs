use embedded_io::{Read, ReadReady, Write};
use heapless::Vec;

use crate::helpers::{LossyStr, LINE_TERM_CHARS};

/// Line oriented link to the module.
///
/// `send` transmits the command bytes verbatim, including any terminator.
/// Received data is handed out one decoded line at a time, in the order it
/// was received, with the `\r`/`\n` framing removed.
pub trait Transport {
    type Error;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Copy the next complete line into `buf`, truncating it to the length
    /// of `buf`. Returns `Ok(None)` if no complete line is available yet.
    /// Must not block.
    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Self::Error>;

    /// Discard any received but not yet consumed data.
    fn clear(&mut self) {}
}

/// [`Transport`] over a serial port implementing the `embedded-io` traits.
///
/// Bytes are pulled from the port only while it reports them as ready, and
/// collected in an `INGRESS_BUF_SIZE` byte buffer until a line terminator
/// arrives. Blank lines are skipped.
pub struct SerialTransport<S, const INGRESS_BUF_SIZE: usize> {
    serial: S,
    buf: Vec<u8, INGRESS_BUF_SIZE>,
}

impl<S, const INGRESS_BUF_SIZE: usize> SerialTransport<S, INGRESS_BUF_SIZE>
where
    S: Read + ReadReady + Write,
{
    pub fn new(serial: S) -> Self {
        Self {
            serial,
            buf: Vec::new(),
        }
    }

    pub fn release(self) -> S {
        self.serial
    }

    /// Move everything the port has ready into the ingress buffer.
    fn fill(&mut self) -> Result<(), S::Error> {
        while self.serial.read_ready()? {
            let mut chunk = [0; 32];
            let received = self.serial.read(&mut chunk)?;
            if received == 0 {
                break;
            }

            if self.buf.extend_from_slice(&chunk[..received]).is_err() {
                error!(
                    "Ingress buffer full, discarding {:?}",
                    LossyStr(&self.buf)
                );
                self.buf.clear();
            }
        }
        Ok(())
    }

    fn consume(&mut self, amount: usize) {
        let remaining = self.buf.len() - amount;
        self.buf.copy_within(amount.., 0);
        self.buf.truncate(remaining);
    }
}

impl<S, const INGRESS_BUF_SIZE: usize> Transport for SerialTransport<S, INGRESS_BUF_SIZE>
where
    S: Read + ReadReady + Write,
{
    type Error = S::Error;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.serial.write_all(bytes)?;
        self.serial.flush()
    }

    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        self.fill()?;

        while let Some(end) = self.buf.iter().position(|c| LINE_TERM_CHARS.contains(c)) {
            let len = end.min(buf.len());
            buf[..len].copy_from_slice(&self.buf[..len]);

            // Swallow the whole terminator sequence, eg. `\r\r\n`
            let next = self.buf[end..]
                .iter()
                .position(|c| !LINE_TERM_CHARS.contains(c))
                .map_or(self.buf.len(), |offset| end + offset);
            self.consume(next);

            if len > 0 {
                return Ok(Some(len));
            }
        }

        Ok(None)
    }

    fn clear(&mut self) {
        if self.fill().is_err() {
            warn!("Serial read error while clearing ingress buffer");
        }
        if !self.buf.is_empty() {
            debug!("Cleared ingress buffer, removed {:?}", LossyStr(&self.buf));
        }
        self.buf.clear();
    }
}
