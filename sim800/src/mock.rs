//! Test doubles: a scripted transport, a serial port, a virtual clock and
//! GPIO lines driven by that clock.

use core::convert::Infallible;
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    vec::Vec,
};

use embedded_hal::{
    delay::DelayNs,
    digital::{self, InputPin, OutputPin, PinState},
};

use crate::transport::Transport;

pub fn setup_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Virtual time in nanoseconds, advanced only by [`SimDelay`].
#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay(self.clone())
    }

    fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

#[derive(Debug, Clone)]
pub struct SimDelay(SimClock);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance_ns(ns.into());
    }

    fn delay_us(&mut self, us: u32) {
        self.0.advance_ns(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance_ns(u64::from(ms) * 1_000_000);
    }
}

/// Input line whose level is a function of virtual time (in ms).
#[derive(Clone)]
pub struct SimInput {
    clock: SimClock,
    level: Rc<dyn Fn(u64) -> bool>,
    samples: Rc<Cell<u32>>,
}

impl SimInput {
    pub fn new(clock: &SimClock, level: impl Fn(u64) -> bool + 'static) -> Self {
        Self {
            clock: clock.clone(),
            level: Rc::new(level),
            samples: Rc::default(),
        }
    }

    pub fn samples(&self) -> u32 {
        self.samples.get()
    }
}

impl digital::ErrorType for SimInput {
    type Error = Infallible;
}

impl InputPin for SimInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.samples.set(self.samples.get() + 1);
        Ok((self.level)(self.clock.now_ms()))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Output line recording every level it is driven to, with the virtual
/// time at which it happened.
#[derive(Debug, Clone)]
pub struct SimOutput {
    clock: SimClock,
    history: Rc<RefCell<Vec<(u64, PinState)>>>,
}

impl SimOutput {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            history: Rc::default(),
        }
    }

    pub fn history(&self) -> Vec<(u64, PinState)> {
        self.history.borrow().clone()
    }
}

impl digital::ErrorType for SimOutput {
    type Error = Infallible;
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.history
            .borrow_mut()
            .push((self.clock.now_ms(), PinState::Low));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.history
            .borrow_mut()
            .push((self.clock.now_ms(), PinState::High));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Script {
    exchanges: VecDeque<(Vec<u8>, Vec<Vec<u8>>)>,
    pending: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    fail_writes: bool,
}

/// Transport answering each expected command with a fixed set of lines.
///
/// Commands must be sent in the order they were expected. A command without
/// an expectation is recorded and never answered.
#[derive(Debug, Clone, Default)]
pub struct MockTransport(Rc<RefCell<Script>>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteError;

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(&self, command: &[u8], lines: &[&[u8]]) -> &Self {
        self.0.borrow_mut().exchanges.push_back((
            command.to_vec(),
            lines.iter().map(|line| line.to_vec()).collect(),
        ));
        self
    }

    /// Deliver `line` without it being requested, eg. a late result code.
    pub fn push_line(&self, line: &[u8]) {
        self.0.borrow_mut().pending.push_back(line.to_vec());
    }

    pub fn fail_writes(&self) {
        self.0.borrow_mut().fail_writes = true;
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.0.borrow().sent.clone()
    }

    pub fn is_done(&self) -> bool {
        self.0.borrow().exchanges.is_empty()
    }
}

impl Transport for MockTransport {
    type Error = WriteError;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut script = self.0.borrow_mut();
        if script.fail_writes {
            return Err(WriteError);
        }
        script.sent.push(bytes.to_vec());

        if let Some((command, lines)) = script.exchanges.pop_front() {
            assert_eq!(
                std::string::String::from_utf8_lossy(&command),
                std::string::String::from_utf8_lossy(bytes),
                "unexpected command"
            );
            script.pending.extend(lines);
        }
        Ok(())
    }

    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        Ok(self.0.borrow_mut().pending.pop_front().map(|line| {
            let len = line.len().min(buf.len());
            buf[..len].copy_from_slice(&line[..len]);
            len
        }))
    }

    fn clear(&mut self) {
        self.0.borrow_mut().pending.clear();
    }
}

/// Serial port backed by in-memory queues.
#[derive(Debug, Clone, Default)]
pub struct SerialMock {
    rx: Rc<RefCell<VecDeque<u8>>>,
    tx: Rc<RefCell<Vec<u8>>>,
}

impl SerialMock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `bytes` available for reading, as if sent by the module.
    pub fn receive(&self, bytes: &[u8]) {
        self.rx.borrow_mut().extend(bytes.iter().copied());
    }

    pub fn written(&self) -> Vec<u8> {
        self.tx.borrow().clone()
    }
}

impl embedded_io::ErrorType for SerialMock {
    type Error = Infallible;
}

impl embedded_io::Read for SerialMock {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut rx = self.rx.borrow_mut();
        let len = buf.len().min(rx.len());
        for (dst, src) in buf.iter_mut().zip(rx.drain(..len)) {
            *dst = src;
        }
        Ok(len)
    }
}

impl embedded_io::ReadReady for SerialMock {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.borrow().is_empty())
    }
}

impl embedded_io::Write for SerialMock {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Wire {
    replies: VecDeque<(Vec<u8>, Vec<(u64, Vec<u8>)>)>,
    scheduled: VecDeque<(u64, Vec<u8>)>,
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

/// Serial port answering each expected command with chunks of bytes, each
/// arriving a given number of ms of virtual time after the command was
/// written.
#[derive(Debug, Clone)]
pub struct ScriptedSerial {
    clock: SimClock,
    wire: Rc<RefCell<Wire>>,
}

impl ScriptedSerial {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            wire: Rc::default(),
        }
    }

    pub fn reply(&self, command: &[u8], chunks: &[(u64, &[u8])]) -> &Self {
        self.wire.borrow_mut().replies.push_back((
            command.to_vec(),
            chunks
                .iter()
                .map(|(after, bytes)| (*after, bytes.to_vec()))
                .collect(),
        ));
        self
    }

    /// Move every chunk that is due by now into the receive queue.
    fn deliver(&self) {
        let now = self.clock.now_ms();
        let mut wire = self.wire.borrow_mut();
        while wire.scheduled.front().is_some_and(|(due, _)| *due <= now) {
            if let Some((_, bytes)) = wire.scheduled.pop_front() {
                wire.rx.extend(bytes);
            }
        }
    }
}

impl embedded_io::ErrorType for ScriptedSerial {
    type Error = Infallible;
}

impl embedded_io::Read for ScriptedSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.deliver();
        let mut wire = self.wire.borrow_mut();
        let len = buf.len().min(wire.rx.len());
        for (dst, src) in buf.iter_mut().zip(wire.rx.drain(..len)) {
            *dst = src;
        }
        Ok(len)
    }
}

impl embedded_io::ReadReady for ScriptedSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.deliver();
        Ok(!self.wire.borrow().rx.is_empty())
    }
}

impl embedded_io::Write for ScriptedSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let now = self.clock.now_ms();
        let mut wire = self.wire.borrow_mut();
        wire.tx.extend_from_slice(buf);

        let answered = wire
            .replies
            .front()
            .is_some_and(|(command, _)| wire.tx.ends_with(command));
        if answered {
            if let Some((_, chunks)) = wire.replies.pop_front() {
                wire.scheduled
                    .extend(chunks.into_iter().map(|(after, bytes)| (now + after, bytes)));
                wire.scheduled.make_contiguous().sort_by_key(|(due, _)| *due);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
