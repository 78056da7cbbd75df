//! In-memory transport for unit tests.
//!
//! Transfers at most [`CHUNK`] bytes per call so every loop in the exchange
//! path sees partial sends and receives.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use crate::budget::Budget;
use crate::error::Error;

use super::Transport;

pub(crate) const CHUNK: usize = 4;

/// What the peer does for one exchange.
pub(crate) enum Step {
    Respond(Vec<u8>),
    /// Never answer; receive times out.
    Silent,
}

#[derive(Default)]
pub(crate) struct Script {
    pub steps: VecDeque<Step>,
    pub refuse_connects: usize,
    pub connects: Vec<SocketAddr>,
    pub sent: Vec<u8>,
    pub closes: usize,
    active: Option<(Step, usize)>,
}

impl Script {
    pub fn respond(&mut self, bytes: &[u8]) {
        self.steps.push_back(Step::Respond(bytes.to_vec()));
    }

    fn active_exhausted(&self) -> bool {
        match &self.active {
            None => true,
            Some((Step::Respond(bytes), pos)) => *pos >= bytes.len(),
            Some((Step::Silent, _)) => false,
        }
    }
}

pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    connected: bool,
}

impl ScriptedTransport {
    pub fn new(script: Arc<Mutex<Script>>) -> Self {
        Self {
            script,
            connected: false,
        }
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self, addr: SocketAddr, budget: &Budget) -> Result<(), Error> {
        budget.check("connect")?;
        let mut script = self.script.lock().unwrap();
        if script.refuse_connects > 0 {
            script.refuse_connects -= 1;
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused).into());
        }
        script.connects.push(addr);
        script.active = None;
        self.connected = true;
        Ok(())
    }

    fn send(&mut self, buf: &[u8], budget: &Budget) -> Result<usize, Error> {
        budget.check("send")?;
        if !self.connected {
            return Err(io::Error::from(io::ErrorKind::NotConnected).into());
        }
        let mut script = self.script.lock().unwrap();
        if script.active_exhausted() {
            script.active = script.steps.pop_front().map(|step| (step, 0));
        }
        let n = buf.len().min(CHUNK);
        script.sent.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn receive(&mut self, buf: &mut [u8], budget: &Budget) -> Result<usize, Error> {
        budget.check("receive")?;
        if !self.connected {
            return Err(io::Error::from(io::ErrorKind::NotConnected).into());
        }
        let mut script = self.script.lock().unwrap();
        match &mut script.active {
            Some((Step::Respond(bytes), pos)) => {
                let n = (bytes.len() - *pos).min(buf.len()).min(CHUNK);
                buf[..n].copy_from_slice(&bytes[*pos..*pos + n]);
                *pos += n;
                Ok(n)
            }
            Some((Step::Silent, _)) | None => Err(budget.timeout("receive")),
        }
    }

    fn close(&mut self) {
        if self.connected {
            self.connected = false;
            self.script.lock().unwrap().closes += 1;
        }
    }
}
