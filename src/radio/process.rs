use std::{
    fs::OpenOptions,
    io,
    net::TcpStream,
    path::Path,
    process::{Child, Command as StdCommand, Stdio},
    thread,
    time::{Duration, Instant},
};

use super::RigModel;

const READY_POLL: Duration = Duration::from_millis(100);

/// A `rigctld` child process owned by this program; killed on drop.
pub struct RigctldProcess {
    child: Child,
}

impl RigctldProcess {
    /// Starts `binary -m <model> -r <device> -t <port>` with its output
    /// captured in `log_dir`.
    pub fn spawn(
        binary: &str,
        model: RigModel,
        device: &Path,
        port: u16,
        vfo_mode: bool,
        log_dir: &Path,
    ) -> io::Result<Self> {
        let stdout_path = log_dir.join("rigctld_stdout.log");
        let stderr_path = log_dir.join("rigctld_stderr.log");

        let stdout_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&stdout_path)?;

        let stderr_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&stderr_path)?;

        let mut command = StdCommand::new(binary);
        command
            .arg("-m")
            .arg(model.hamlib_id().to_string())
            .arg("-r")
            .arg(device)
            .arg("-t")
            .arg(port.to_string());
        if vfo_mode {
            command.arg("--vfo");
        }

        log::info!(
            "Starting {} for {} (model {}) on {}",
            binary,
            model,
            model.hamlib_id(),
            device.display()
        );

        let child = command
            .stdout(Stdio::from(stdout_file))
            .stderr(Stdio::from(stderr_file))
            .spawn()?;

        log::info!("rigctld spawned (PID: {:?})", child.id());

        Ok(Self { child })
    }

    /// Polls `address` until rigctld accepts connections or `timeout` passes.
    pub fn wait_ready(&mut self, address: &str, timeout: Duration) -> io::Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Err(io::Error::other(format!(
                    "rigctld exited early with {}",
                    status
                )));
            }
            match TcpStream::connect(address) {
                Ok(_) => return Ok(()),
                Err(e) if Instant::now() >= deadline => return Err(e),
                Err(_) => thread::sleep(READY_POLL),
            }
        }
    }
}

impl Drop for RigctldProcess {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            log::warn!("Failed to stop rigctld: {}", e);
        }
        let _ = self.child.wait();
    }
}
