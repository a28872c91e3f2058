//! Per-invocation flash session
//!
//! The session replaces what the CLI would otherwise keep as loose
//! variables across menu steps: the chosen device, the fetched artifact,
//! and how far the flash has progressed. It exists for one invocation and
//! is never persisted.

use std::fmt;

use crate::artifact::FirmwareArtifact;
use crate::device::DeviceDescriptor;
use crate::error::{Error, Result};

/// Lifecycle of a single flash attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no data sent yet
    Pending,
    /// Image chunks are in flight
    Transferring,
    /// All chunks sent, waiting for device confirmation
    Verifying,
    /// Device confirmed the image
    Succeeded,
    /// Transfer or verification failed; device state indeterminate
    Failed,
}

impl SessionState {
    /// Legal forward edges of the state machine
    pub fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Pending, Transferring)
                | (Pending, Failed)
                | (Transferring, Verifying)
                | (Transferring, Failed)
                | (Verifying, Succeeded)
                | (Verifying, Failed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Pending => "pending",
            SessionState::Transferring => "transferring",
            SessionState::Verifying => "verifying",
            SessionState::Succeeded => "succeeded",
            SessionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One flash attempt against one device with one artifact
#[derive(Debug)]
pub struct FlashSession {
    device: DeviceDescriptor,
    artifact: FirmwareArtifact,
    state: SessionState,
}

impl FlashSession {
    /// Build a session for a fetched artifact.
    ///
    /// An empty artifact is rejected here so the session can never reach
    /// `Transferring` without real data behind it; device presence is
    /// proven later when the transport is opened on the descriptor.
    pub fn new(device: DeviceDescriptor, artifact: FirmwareArtifact) -> Result<Self> {
        if artifact.size_bytes == 0 {
            return Err(Error::Integrity(format!(
                "artifact {} is empty",
                artifact.local_path.display()
            )));
        }
        Ok(Self {
            device,
            artifact,
            state: SessionState::Pending,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Device this session flashes
    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    /// Artifact this session flashes
    pub fn artifact(&self) -> &FirmwareArtifact {
        &self.artifact
    }

    /// Give the artifact back for cleanup once the session is over
    pub fn into_artifact(self) -> FirmwareArtifact {
        self.artifact
    }

    /// Advance the state machine along a legal edge.
    ///
    /// Only the flash engine calls this; an illegal edge is a logic error
    /// in the engine, not a runtime condition.
    pub(crate) fn advance(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal session transition {} -> {}",
            self.state,
            next
        );
        log::debug!(
            "session for {}: {} -> {}",
            self.device.display_name,
            self.state,
            next
        );
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor {
            vendor_id: 0x2DC8,
            product_id: 0x6000,
            display_name: "SN30 Pro".into(),
            path: "/dev/hidraw0".into(),
        }
    }

    fn artifact(size: u64) -> FirmwareArtifact {
        FirmwareArtifact {
            source_url: "http://firmware.test/fw.dat".into(),
            local_path: PathBuf::from("/tmp/fw.dat"),
            size_bytes: size,
            checksum: None,
        }
    }

    #[test]
    fn empty_artifact_is_rejected() {
        let err = FlashSession::new(descriptor(), artifact(0)).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn fresh_session_is_pending() {
        let session = FlashSession::new(descriptor(), artifact(1024)).unwrap();
        assert_eq!(session.state(), SessionState::Pending);
    }

    #[test]
    fn legal_edges() {
        use SessionState::*;
        assert!(Pending.can_advance_to(Transferring));
        assert!(Transferring.can_advance_to(Verifying));
        assert!(Transferring.can_advance_to(Failed));
        assert!(Verifying.can_advance_to(Succeeded));
        assert!(Verifying.can_advance_to(Failed));
    }

    #[test]
    fn illegal_edges() {
        use SessionState::*;
        // Transferring strictly requires a pending session
        assert!(!Succeeded.can_advance_to(Transferring));
        assert!(!Failed.can_advance_to(Transferring));
        // No skipping verification
        assert!(!Transferring.can_advance_to(Succeeded));
        // Terminal states stay terminal
        assert!(!Failed.can_advance_to(Pending));
        assert!(!Succeeded.can_advance_to(Failed));
    }
}
