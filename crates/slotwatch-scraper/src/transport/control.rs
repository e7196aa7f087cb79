//! Minimal Tor control-port client: authenticate, request `NEWNYM`, quit.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::TransportError;

/// Connection details for the control port.
///
/// A new TCP session is opened per rotation. Rotations are serialized
/// through an internal mutex so concurrent workers never interleave
/// commands on the control protocol.
pub struct ControlChannel {
    addr: SocketAddr,
    password: Option<String>,
    timeout: Duration,
    lock: Mutex<()>,
}

impl ControlChannel {
    #[must_use]
    pub fn new(addr: SocketAddr, password: Option<String>, timeout_secs: u64) -> Self {
        Self {
            addr,
            password,
            timeout: Duration::from_secs(timeout_secs),
            lock: Mutex::new(()),
        }
    }

    /// Asks Tor for a new identity and waits for the `250` acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::IdentityRotation`] if the port is
    /// unreachable, authentication is rejected, `NEWNYM` is refused, or the
    /// exchange takes longer than the configured timeout.
    pub async fn new_identity(&self) -> Result<(), TransportError> {
        let _guard = self.lock.lock().await;

        match tokio::time::timeout(self.timeout, self.exchange()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::IdentityRotation(format!(
                "control channel at {} did not answer within {}s",
                self.addr,
                self.timeout.as_secs()
            ))),
        }
    }

    async fn exchange(&self) -> Result<(), TransportError> {
        let stream = TcpStream::connect(self.addr).await.map_err(|e| {
            TransportError::IdentityRotation(format!(
                "cannot reach control channel at {}: {e}",
                self.addr
            ))
        })?;
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        send(&mut write, &authenticate_command(self.password.as_deref())).await?;
        expect_ok(&mut lines, "AUTHENTICATE").await?;

        send(&mut write, "SIGNAL NEWNYM").await?;
        expect_ok(&mut lines, "SIGNAL NEWNYM").await?;

        // The identity is already switched; a failed QUIT changes nothing.
        let _ = send(&mut write, "QUIT").await;

        tracing::debug!(addr = %self.addr, "tor identity rotated");
        Ok(())
    }
}

fn authenticate_command(password: Option<&str>) -> String {
    match password {
        Some(password) => {
            let escaped = password.replace('\\', "\\\\").replace('"', "\\\"");
            format!("AUTHENTICATE \"{escaped}\"")
        }
        None => "AUTHENTICATE".to_string(),
    }
}

async fn send(write: &mut OwnedWriteHalf, command: &str) -> Result<(), TransportError> {
    write
        .write_all(format!("{command}\r\n").as_bytes())
        .await
        .map_err(|e| TransportError::IdentityRotation(format!("failed to send command: {e}")))
}

/// Reads one (possibly multi-line) reply and requires status `250`.
async fn expect_ok(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
    command: &str,
) -> Result<(), TransportError> {
    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|e| {
                TransportError::IdentityRotation(format!("failed to read reply to {command}: {e}"))
            })?
            .ok_or_else(|| {
                TransportError::IdentityRotation(format!(
                    "control channel closed before replying to {command}"
                ))
            })?;

        // "250-..." and "250+..." continue a multi-line reply; "250 " ends it.
        if line.starts_with("250-") || line.starts_with("250+") {
            continue;
        }
        if line.starts_with("250 ") || line == "250" {
            return Ok(());
        }

        let reason = if command == "AUTHENTICATE" {
            format!("authentication rejected: {line}")
        } else {
            format!("{command} refused: {line}")
        };
        return Err(TransportError::IdentityRotation(reason));
    }
}
