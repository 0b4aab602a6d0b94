use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A public key presented by an SSH server during the transport handshake.
///
/// The key is kept opaque: the algorithm name and the SSH wire encoding of
/// the key. Only its [`Fingerprint`] is retained once a scan records it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostKey {
    pub algorithm: String,
    pub blob: Vec<u8>,
}

impl HostKey {
    pub fn new(algorithm: impl Into<String>, blob: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: algorithm.into(),
            blob: blob.into(),
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::sha256(&self.blob)
    }
}

/// SHA-256 fingerprint of a host key in OpenSSH form (`SHA256:<base64>`).
///
/// Equal key blobs always produce equal fingerprints, so this is the sole
/// identity used when grouping hosts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a wire-encoded public key.
    pub fn sha256(key_blob: &[u8]) -> Self {
        let digest = Sha256::digest(key_blob);
        Fingerprint(format!("SHA256:{}", STANDARD_NO_PAD.encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Fingerprint(value)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Fingerprint(value.to_string())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
