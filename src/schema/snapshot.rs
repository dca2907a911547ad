//! Read-only per-tick view of the population, for renderers and recorders.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a rocket within one generation.
///
/// `Crashed` and `ReachedTarget` are terminal until generation turnover.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RocketStatus {
    #[default]
    Alive = 0,
    Crashed = 1,
    ReachedTarget = 2,
}

impl RocketStatus {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(RocketStatus::Alive),
            1 => Some(RocketStatus::Crashed),
            2 => Some(RocketStatus::ReachedTarget),
            _ => None,
        }
    }

    #[inline]
    pub fn is_alive(self) -> bool {
        self == RocketStatus::Alive
    }
}

/// Render-facing state of one rocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentView {
    /// Top-left of the rocket body.
    pub position: (f32, f32),
    /// Body center, used for fitness.
    pub center: (f32, f32),
    /// Orientation in degrees.
    pub orientation: f32,
    pub speed: f32,
    pub status: RocketStatus,
    /// Collision probes (useful for debug overlays).
    pub probes: [(f32, f32); 3],
}

/// State of every rocket at one tick of the generation loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickSnapshot {
    pub generation: usize,
    pub frame: usize,
    pub agents: Vec<AgentView>,
}
