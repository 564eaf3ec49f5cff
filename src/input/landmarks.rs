//! Hand landmark frames and the vision push channel

use std::sync::mpsc::{self, Receiver, Sender};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Joints per tracked hand
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// Fingertips (excluding the thumb) used by fist detection
pub const FINGER_TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Fixed-size landmark set; copied by value, never heap allocated
pub type Landmarks = [Vec3; LANDMARK_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Handedness::Left => 0,
            Handedness::Right => 1,
        }
    }
}

/// One vision inference result for one hand. Coordinates are normalized
/// image space (x right, y down, z relative depth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub timestamp_ms: f64,
    pub handedness: Handedness,
    /// Usually `LANDMARK_COUNT` points; dropouts may deliver fewer
    pub points: Vec<Vec3>,
}

impl LandmarkFrame {
    pub fn new(timestamp_ms: f64, handedness: Handedness, points: Vec<Vec3>) -> Self {
        Self {
            timestamp_ms,
            handedness,
            points,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() >= LANDMARK_COUNT && self.points.iter().all(|p| p.is_finite())
    }

    /// Copy into a fixed array, or `None` for a partial/corrupt frame
    pub fn landmarks(&self) -> Option<Landmarks> {
        if !self.is_complete() {
            return None;
        }
        let mut out = [Vec3::ZERO; LANDMARK_COUNT];
        out.copy_from_slice(&self.points[..LANDMARK_COUNT]);
        Some(out)
    }
}

/// What the vision subsystem pushes each inference tick
#[derive(Debug, Clone, PartialEq)]
pub enum VisionMessage {
    Hand(LandmarkFrame),
    /// No hand of this side was detected
    Lost {
        handedness: Handedness,
        timestamp_ms: f64,
    },
}

/// Cloneable producer half handed to the vision collaborator
#[derive(Debug, Clone)]
pub struct LandmarkSender {
    tx: Sender<VisionMessage>,
}

impl LandmarkSender {
    /// Returns false once the inbox has been dropped
    pub fn send(&self, message: VisionMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// Consumer half owned by the input stage
#[derive(Debug)]
pub struct LandmarkInbox {
    rx: Receiver<VisionMessage>,
    latest: [Option<VisionMessage>; 2],
}

impl LandmarkInbox {
    pub fn channel() -> (LandmarkSender, LandmarkInbox) {
        let (tx, rx) = mpsc::channel();
        (
            LandmarkSender { tx },
            LandmarkInbox {
                rx,
                latest: [None, None],
            },
        )
    }

    /// Drain pending messages, keeping only the newest per hand.
    ///
    /// Vision runs at its own cadence; stale frames queued between admitted
    /// frames are superseded rather than replayed.
    pub fn drain_latest(&mut self) -> impl Iterator<Item = VisionMessage> + '_ {
        while let Ok(msg) = self.rx.try_recv() {
            let hand = match &msg {
                VisionMessage::Hand(f) => f.handedness,
                VisionMessage::Lost { handedness, .. } => *handedness,
            };
            self.latest[hand.index()] = Some(msg);
        }
        self.latest.iter_mut().filter_map(Option::take)
    }
}
