use async_trait::async_trait;
use russh::client;
use russh::keys::PublicKey;
use russh::Disconnect;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};
use tracing::trace;

use super::{HostKeyProber, ProbeError, ProbeOutcome};
use crate::model::HostKey;

/// Handshake errors containing one of these mean the server got far enough
/// to present its host key.
const KEY_OBSERVED_MARKERS: &[&str] = &["unable to authenticate", "no common algorithm"];

/// Learns host keys from the SSH transport handshake.
///
/// The key-check callback accepts whatever key the server offers and hands
/// it back to the probe; no authentication method is ever attempted.
pub struct SshProber {
    port: u16,
    timeout: Duration,
    config: Arc<client::Config>,
}

impl SshProber {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self {
            port,
            timeout,
            config: Arc::new(client::Config::default()),
        }
    }
}

struct KeyCapture {
    sender: Option<oneshot::Sender<HostKey>>,
}

impl client::Handler for KeyCapture {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        if let Some(sender) = self.sender.take() {
            match server_public_key.to_bytes() {
                Ok(blob) => {
                    let key = HostKey::new(server_public_key.algorithm().to_string(), blob);
                    let _ = sender.send(key);
                }
                Err(e) => trace!("Could not encode server key: {}", e),
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl HostKeyProber for SshProber {
    fn name(&self) -> &'static str {
        "SSH"
    }

    async fn probe(&self, address: Ipv4Addr) -> ProbeOutcome {
        let target = SocketAddr::from((address, self.port));
        let (sender, mut receiver) = oneshot::channel();
        let handler = KeyCapture {
            sender: Some(sender),
        };

        // Connect and disconnect share one deadline.
        let deadline = Instant::now() + self.timeout;
        let attempt = timeout_at(
            deadline,
            client::connect(Arc::clone(&self.config), target, handler),
        )
        .await;

        match attempt {
            Err(_elapsed) => ProbeOutcome::ConnectionError(ProbeError::Timeout(self.timeout)),
            Ok(Ok(session)) => {
                let _ = timeout_at(
                    deadline,
                    session.disconnect(Disconnect::ByApplication, "", "en"),
                )
                .await;
                match receiver.try_recv() {
                    Ok(key) => ProbeOutcome::Key(key),
                    Err(_) => ProbeOutcome::NoKey,
                }
            }
            Ok(Err(e)) => classify_handshake_error(&e, receiver.try_recv().ok()),
        }
    }
}

/// Maps a failed handshake to a probe outcome.
///
/// A failed algorithm negotiation counts as a retrieval: it yields the
/// captured key, or [`ProbeOutcome::NoKey`] when none was seen. Other errors
/// go through [`classify_error_message`].
pub fn classify_handshake_error(error: &russh::Error, captured: Option<HostKey>) -> ProbeOutcome {
    match error {
        russh::Error::NoCommonAlgo { .. } => key_or_nothing(captured),
        other => classify_error_message(&other.to_string(), captured),
    }
}

/// Classifies a handshake error by its text.
///
/// Only messages naming an authentication or algorithm-negotiation failure
/// count as a retrieval. Any other error is a connection failure, even if a
/// key was captured before it.
pub fn classify_error_message(message: &str, captured: Option<HostKey>) -> ProbeOutcome {
    let lowered = message.to_lowercase();
    if KEY_OBSERVED_MARKERS.iter().any(|m| lowered.contains(m)) {
        return key_or_nothing(captured);
    }
    ProbeOutcome::ConnectionError(ProbeError::Transport(message.to_string()))
}

fn key_or_nothing(captured: Option<HostKey>) -> ProbeOutcome {
    match captured {
        Some(key) => ProbeOutcome::Key(key),
        None => ProbeOutcome::NoKey,
    }
}
