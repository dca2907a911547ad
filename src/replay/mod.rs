//! Replay recording and playback for training runs.
//!
//! A headless run can capture every tick to disk so that an external
//! renderer can play the flights back later. Nothing in the evolution core
//! reads these files.
//!
//! # File Format
//!
//! The `.rktr` (Rocket Replay) format stores per-tick agent states with
//! optional compression:
//!
//! ```text
//! Header (44 bytes):
//!   Magic: "RKTR" (4 bytes)
//!   Version: u16
//!   Flags: u16 (compression)
//!   Agent count: u32
//!   Frame count: u64
//!   Arena width: f32
//!   Arena height: f32
//!   Reserved: 16 bytes
//!
//! Frame data (variable):
//!   Generation: u32
//!   Frame: u32
//!   Per agent: x f32, y f32, orientation f32, status u8
//!   Optionally LZ4 compressed
//!
//! Frame index table (frame_count * 16 bytes, at end of file):
//!   Offset: u64
//!   Stored size: u64
//! ```

mod format;
mod player;
mod recorder;

pub use format::{
    CompressionType, FrameIndex, REPLAY_MAGIC, REPLAY_VERSION, RecordedAgent, RecordedFrame,
    ReplayFlags, ReplayHeader,
};
pub use player::{FrameIterator, ReplayPlayer};
pub use recorder::{RecorderConfig, ReplayRecorder, ReplayStats};
