//! A [`Bus`] double which records every transfer, for testing drivers and frame sources
//! without hardware.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::{bus::Bus, command::CONTROL_DATA, error::Error};

/// os error code reported for injected write failures
pub const INJECTED_ERRNO: i32 = 5;

#[derive(Debug, Default)]
struct State {
    writes: Vec<Vec<u8>>,
    attempts: usize,
    fail_write_at: Option<usize>,
    reject_select: bool,
    selected: Option<u8>,
    reads: VecDeque<u8>,
    closed: bool,
    close_calls: usize,
}

/// bus half of the double, hand this to the driver
#[derive(Debug, Clone, Default)]
pub struct RecordingBus {
    state: Rc<RefCell<State>>,
}

/// inspection half of the double, keeps working after the bus was moved into a driver
#[derive(Debug, Clone)]
pub struct Recorder {
    state: Rc<RefCell<State>>,
}

impl RecordingBus {
    pub fn new() -> (Self, Recorder) {
        let bus = Self::default();
        let recorder = Recorder { state: bus.state.clone() };
        (bus, recorder)
    }

    /// fail the `n`th write attempt (1-based), the failing write is counted but not recorded
    pub fn fail_write_at(self, n: usize) -> Self {
        self.state.borrow_mut().fail_write_at = Some(n);
        self
    }

    pub fn reject_select(self) -> Self {
        self.state.borrow_mut().reject_select = true;
        self
    }

    /// queue bytes returned by `read_byte`
    pub fn with_reads(self, bytes: &[u8]) -> Self {
        self.state.borrow_mut().reads.extend(bytes);
        self
    }
}

impl Bus for RecordingBus {
    fn select(&mut self, address: u8) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            Err(Error::HandleClosed)?
        }
        if state.reject_select {
            Err(Error::AddressRejected { address, source: std::io::Error::from_raw_os_error(INJECTED_ERRNO) })?
        }
        state.selected = Some(address);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            Err(Error::HandleClosed)?
        }
        state.attempts += 1;
        if state.fail_write_at == Some(state.attempts) {
            Err(Error::WriteFailed { len: bytes.len(), source: std::io::Error::from_raw_os_error(INJECTED_ERRNO) })?
        }
        state.writes.push(bytes.to_vec());
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            Err(Error::HandleClosed)?
        }
        state.reads.pop_front().ok_or(Error::ReadFailed(std::io::ErrorKind::UnexpectedEof.into()))
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        state.close_calls += 1;
    }
}

impl Recorder {
    /// every successful write in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.borrow().writes.clone()
    }

    /// number of write attempts including failed ones
    pub fn attempts(&self) -> usize {
        self.state.borrow().attempts
    }

    /// the command bytes of all command writes, without control bytes
    pub fn commands(&self) -> Vec<u8> {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|write| write.first() != Some(&CONTROL_DATA))
            .filter_map(|write| write.get(1).copied())
            .collect()
    }

    /// all bulk data writes
    pub fn data_writes(&self) -> Vec<Vec<u8>> {
        self.state.borrow().writes.iter().filter(|write| write.first() == Some(&CONTROL_DATA)).cloned().collect()
    }

    pub fn selected(&self) -> Option<u8> {
        self.state.borrow().selected
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    pub fn close_calls(&self) -> usize {
        self.state.borrow().close_calls
    }

    /// forget recorded writes, attempts are counted from zero again
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.writes.clear();
        state.attempts = 0;
    }
}
