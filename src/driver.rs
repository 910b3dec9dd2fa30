use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::process::{Child, Command};

/// How often to poll a freshly spawned driver for readiness
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A WebDriver server (e.g. chromedriver) owned by a single render
///
/// The child is killed when this value is dropped, so an abandoned render
/// cannot leak a driver or the browser it started.
#[derive(Debug)]
pub struct DriverProcess {
    child: Child,
    port: u16,
}

impl DriverProcess {
    /// Spawn the driver binary on a free local port and wait until it listens
    pub async fn spawn(binary: &Path, ready_timeout: Duration) -> std::io::Result<Self> {
        let port = free_port().await?;

        let child = Command::new(binary)
            .arg(format!("--port={}", port))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let mut driver = Self { child, port };
        ::log::debug!(
            "Spawned WebDriver {} on port {}",
            binary.display(),
            driver.port
        );

        if let Err(e) = driver.wait_until_ready(ready_timeout).await {
            driver.shutdown().await;
            return Err(e);
        }

        Ok(driver)
    }

    /// WebDriver endpoint served by this process
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    async fn wait_until_ready(&mut self, ready_timeout: Duration) -> std::io::Result<()> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.port));
        let deadline = tokio::time::Instant::now() + ready_timeout;

        loop {
            if TcpStream::connect(addr).await.is_ok() {
                return Ok(());
            }
            if let Some(status) = self.child.try_wait()? {
                return Err(std::io::Error::other(format!(
                    "driver exited before accepting connections ({})",
                    status
                )));
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("driver did not listen on port {} in time", self.port),
                ));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Kill the driver and reap it
    pub async fn shutdown(mut self) {
        match self.child.kill().await {
            Ok(()) => ::log::debug!("Stopped WebDriver on port {}", self.port),
            Err(e) => ::log::warn!("Failed to stop WebDriver on port {}: {}", self.port, e),
        }
    }
}

/// Ask the OS for an unused port
///
/// The listener is closed before the driver binds, so another process could
/// grab the port in between; the readiness check would then time out.
async fn free_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    Ok(listener.local_addr()?.port())
}
