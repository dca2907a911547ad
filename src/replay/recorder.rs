//! Replay recorder for capturing training ticks.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use super::format::{
    CompressionType, FrameIndex, ReplayFlags, ReplayHeader, compress_lz4, encode_frame,
};
use crate::schema::{Arena, TickSnapshot};

/// Configuration for replay recording.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Compression type to use.
    pub compression: CompressionType,
    /// Record every Nth tick (1 = every tick).
    pub frame_skip: u32,
    /// Maximum frames to record (0 = unlimited).
    pub max_frames: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::None,
            frame_skip: 1,
            max_frames: 0,
        }
    }
}

/// Writes tick snapshots to a `.rktr` file.
///
/// Usage:
/// ```ignore
/// let mut recorder = ReplayRecorder::new("run.rktr", 100, &arena, Default::default())?;
/// trainer.run_with_observer(|_| {}, |snapshot| {
///     let _ = recorder.record_frame(snapshot);
/// })?;
/// recorder.finalize()?;
/// ```
pub struct ReplayRecorder {
    writer: BufWriter<File>,
    header: ReplayHeader,
    frame_indices: Vec<FrameIndex>,
    config: RecorderConfig,
    frames_written: u64,
    step_counter: u32,
    encode_buffer: Vec<u8>,
}

impl ReplayRecorder {
    /// Create a recorder for a population of `agent_count` rockets.
    pub fn new<P: AsRef<Path>>(
        path: P,
        agent_count: usize,
        arena: &Arena,
        config: RecorderConfig,
    ) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let header = ReplayHeader {
            agent_count: agent_count as u32,
            frame_count: 0, // patched on finalize
            arena_width: arena.width,
            arena_height: arena.height,
            flags: ReplayFlags {
                compression: supported_compression(config.compression),
            },
        };

        header.write_to(&mut writer)?;

        let frame_size = header.frame_size();

        Ok(Self {
            writer,
            header,
            frame_indices: Vec::new(),
            config,
            frames_written: 0,
            step_counter: 0,
            encode_buffer: Vec::with_capacity(frame_size),
        })
    }

    /// Record one tick.
    ///
    /// Returns true if the frame was written (ticks may be skipped per config).
    pub fn record_frame(&mut self, snapshot: &TickSnapshot) -> io::Result<bool> {
        if snapshot.agents.len() != self.header.agent_count as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Snapshot has {} rockets, recorder expects {}",
                    snapshot.agents.len(),
                    self.header.agent_count
                ),
            ));
        }

        self.step_counter += 1;
        if self.step_counter < self.config.frame_skip {
            return Ok(false);
        }
        self.step_counter = 0;

        if self.config.max_frames > 0 && self.frames_written >= self.config.max_frames {
            return Ok(false);
        }

        let offset = self.writer.stream_position()?;
        encode_frame(snapshot, &mut self.encode_buffer);

        let size = match self.header.flags.compression {
            CompressionType::None => {
                self.writer.write_all(&self.encode_buffer)?;
                self.encode_buffer.len()
            }
            CompressionType::Lz4 => {
                let compressed = compress_lz4(&self.encode_buffer)?;
                self.writer.write_all(&compressed)?;
                compressed.len()
            }
        };

        self.frame_indices.push(FrameIndex {
            offset,
            size: size as u64,
        });
        self.frames_written += 1;

        Ok(true)
    }

    /// Write the index table, patch the header and flush.
    pub fn finalize(mut self) -> io::Result<ReplayStats> {
        let index_offset = self.writer.stream_position()?;
        for index in &self.frame_indices {
            index.write_to(&mut self.writer)?;
        }

        self.header.frame_count = self.frames_written;
        self.writer.seek(SeekFrom::Start(0))?;
        self.header.write_to(&mut self.writer)?;
        self.writer.flush()?;

        let total_bytes = index_offset + self.frame_indices.len() as u64 * FrameIndex::SIZE as u64;

        Ok(ReplayStats {
            frame_count: self.frames_written,
            total_bytes,
            average_frame_size: if self.frames_written > 0 {
                index_offset.saturating_sub(ReplayHeader::SIZE as u64) / self.frames_written
            } else {
                0
            },
            compression: self.header.flags.compression,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

/// The compression actually available in this build.
fn supported_compression(requested: CompressionType) -> CompressionType {
    match requested {
        CompressionType::Lz4 if !cfg!(feature = "lz4") => {
            log::warn!("Built without the `lz4` feature; recording replay uncompressed");
            CompressionType::None
        }
        other => other,
    }
}

/// Statistics from a recording session.
#[derive(Debug, Clone)]
pub struct ReplayStats {
    pub frame_count: u64,
    /// Total file size in bytes.
    pub total_bytes: u64,
    pub average_frame_size: u64,
    pub compression: CompressionType,
}

impl std::fmt::Display for ReplayStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames, {} bytes total, {} bytes/frame avg ({:?} compression)",
            self.frame_count, self.total_bytes, self.average_frame_size, self.compression
        )
    }
}
