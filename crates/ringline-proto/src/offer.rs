//! Session description offers.

use serde::{Deserialize, Serialize};

/// SDP session description carried by a call invite.
///
/// This client never negotiates media itself (the SDK owns SDP/ICE); the
/// offer is inspected only to classify the call as voice or video for
/// display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOffer {
    /// Raw SDP body.
    pub sdp: String,
}

impl SessionOffer {
    /// Wrap a raw SDP body.
    pub fn new(sdp: impl Into<String>) -> Self {
        Self { sdp: sdp.into() }
    }

    /// True if the offer declares a video media section.
    ///
    /// Scans for a line starting with `m=video`. An offer that never
    /// declares video is treated as voice-only. Heuristic: it classifies
    /// what the offer asks for, not what was ultimately negotiated.
    #[must_use]
    pub fn has_video_media(&self) -> bool {
        self.sdp.lines().any(|line| line.starts_with("m=video"))
    }
}
