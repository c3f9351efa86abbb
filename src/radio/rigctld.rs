use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{Mode, RadioError, Rig, Vfo};

pub const DEFAULT_RIGCTLD_ADDRESS: &str = "127.0.0.1:4532";

/// Client for Hamlib's `rigctld` daemon.
///
/// Every command waits for its `RPRT` reply; socket timeouts bound how long a
/// hung radio can block the caller. A command that fails on the socket drops
/// the connection, so a late reply is never read as the answer to the next
/// command. Until `close`, the next command reconnects.
pub struct RigctldClient {
    address: String,
    timeout: Duration,
    vfo_mode: bool,
    stream: Option<BufReader<TcpStream>>,
    opened: bool,
}

impl RigctldClient {
    /// `vfo_mode` must match whether rigctld runs with `--vfo`, in which case
    /// every command carries its target VFO.
    pub fn new(address: impl Into<String>, timeout: Duration, vfo_mode: bool) -> Self {
        Self {
            address: address.into(),
            timeout,
            vfo_mode,
            stream: None,
            opened: false,
        }
    }

    fn target(&self, vfo: Vfo) -> String {
        if self.vfo_mode {
            format!("{} ", vfo.token())
        } else {
            String::new()
        }
    }

    fn connect(&mut self) -> Result<(), RadioError> {
        let connect_err = |source: std::io::Error| RadioError::Connect {
            address: self.address.clone(),
            source,
        };
        let addr = self
            .address
            .to_socket_addrs()
            .map_err(connect_err)?
            .next()
            .ok_or_else(|| {
                connect_err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "address resolved to nothing",
                ))
            })?;
        let stream = TcpStream::connect_timeout(&addr, self.timeout).map_err(connect_err)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.set_nodelay(true)?;

        log::info!("Connected to rigctld at {}", self.address);
        self.stream = Some(BufReader::new(stream));
        Ok(())
    }

    fn command(&mut self, line: String) -> Result<(), RadioError> {
        if self.stream.is_none() {
            if !self.opened {
                return Err(RadioError::NotOpen);
            }
            log::info!("Reconnecting to rigctld at {}", self.address);
            self.connect()?;
        }
        let stream = self.stream.as_mut().ok_or(RadioError::NotOpen)?;
        let failed = |reason: String| RadioError::CommandFailed {
            command: line.clone(),
            reason,
        };

        log::debug!("rigctld <- {}", line);
        let code = match exchange(stream, &line) {
            Ok(code) => code,
            Err(e) => {
                log::warn!("Dropping rigctld connection after `{}`: {}", line, e);
                self.stream = None;
                return Err(failed(e.to_string()));
            }
        };
        match code.parse::<i32>() {
            Ok(0) => Ok(()),
            Ok(code) => Err(failed(format!("rigctld returned {}", code))),
            Err(_) => Err(failed(format!("unexpected reply \"RPRT {}\"", code))),
        }
    }
}

/// Sends one command line and returns the code of its `RPRT` reply.
fn exchange(stream: &mut BufReader<TcpStream>, line: &str) -> std::io::Result<String> {
    stream.get_mut().write_all(format!("{}\n", line).as_bytes())?;
    stream.get_mut().flush()?;

    let mut reply = String::new();
    loop {
        reply.clear();
        if stream.read_line(&mut reply)? == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed",
            ));
        }
        let reply = reply.trim();
        log::debug!("rigctld -> {}", reply);
        if let Some(code) = reply.strip_prefix("RPRT ") {
            return Ok(code.trim().to_string());
        }
    }
}

impl Rig for RigctldClient {
    fn open(&mut self) -> Result<(), RadioError> {
        if self.stream.is_none() {
            self.connect()?;
        }
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), RadioError> {
        self.opened = false;
        if let Some(mut stream) = self.stream.take() {
            // rigctld drops the client on `q`, no reply is sent
            let _ = stream.get_mut().write_all(b"q\n");
            log::info!("Disconnected from rigctld at {}", self.address);
        }
        Ok(())
    }

    fn set_vfo(&mut self, vfo: Vfo) -> Result<(), RadioError> {
        self.command(format!("V {}", vfo.token()))
    }

    fn set_mode(&mut self, mode: Mode, passband_hz: u32) -> Result<(), RadioError> {
        let target = self.target(Vfo::Current);
        self.command(format!("M {}{} {}", target, mode.token(), passband_hz))
    }

    /// Without `--vfo` the frequency goes to the selected VFO.
    fn set_frequency(&mut self, vfo: Vfo, frequency_hz: u64) -> Result<(), RadioError> {
        let target = self.target(vfo);
        self.command(format!("F {}{}", target, frequency_hz))
    }

    fn set_split_mode(&mut self, enabled: bool, tx_vfo: Vfo) -> Result<(), RadioError> {
        let target = self.target(Vfo::Current);
        self.command(format!(
            "S {}{} {}",
            target,
            u8::from(enabled),
            tx_vfo.token()
        ))
    }

    fn set_split_frequency(&mut self, frequency_hz: u64) -> Result<(), RadioError> {
        let target = self.target(Vfo::Current);
        self.command(format!("I {}{}", target, frequency_hz))
    }
}

impl Drop for RigctldClient {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
