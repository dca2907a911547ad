//! Binary format definitions for rocket replay files.

use std::io::{self, Read, Write};

use crate::schema::{RocketStatus, TickSnapshot};

/// Magic bytes identifying a rocket replay file.
pub const REPLAY_MAGIC: &[u8; 4] = b"RKTR";

/// Current format version.
pub const REPLAY_VERSION: u16 = 1;

/// Bytes per agent record: x, y, orientation (f32) and status (u8).
pub const AGENT_RECORD_SIZE: usize = 13;

/// Bytes of the per-frame prefix: generation and frame (u32 each).
pub const FRAME_PREFIX_SIZE: usize = 8;

/// Compression type for frame data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// No compression.
    #[default]
    None = 0,
    /// LZ4 fast compression.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }
}

/// Replay file header flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayFlags {
    /// Compression type (lower 4 bits).
    pub compression: CompressionType,
}

impl ReplayFlags {
    pub fn to_u16(self) -> u16 {
        self.compression as u16
    }

    pub fn from_u16(v: u16) -> Self {
        Self {
            compression: CompressionType::from_u8((v & 0x0F) as u8).unwrap_or_default(),
        }
    }
}

/// File header for the replay format.
#[derive(Debug, Clone)]
pub struct ReplayHeader {
    /// Rockets per frame (the population size).
    pub agent_count: u32,
    /// Total number of frames.
    pub frame_count: u64,
    /// Arena width.
    pub arena_width: f32,
    /// Arena height.
    pub arena_height: f32,
    /// Replay flags.
    pub flags: ReplayFlags,
}

impl ReplayHeader {
    /// Size of header in bytes.
    /// Magic(4) + Version(2) + Flags(2) + Agents(4) + FrameCount(8) +
    /// Width(4) + Height(4) + Reserved(16) = 44
    pub const SIZE: usize = 44;

    /// Size of one uncompressed frame in bytes.
    pub fn frame_size(&self) -> usize {
        FRAME_PREFIX_SIZE + self.agent_count as usize * AGENT_RECORD_SIZE
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(REPLAY_MAGIC)?;
        w.write_all(&REPLAY_VERSION.to_le_bytes())?;
        w.write_all(&self.flags.to_u16().to_le_bytes())?;
        w.write_all(&self.agent_count.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&self.arena_width.to_le_bytes())?;
        w.write_all(&self.arena_height.to_le_bytes())?;
        w.write_all(&[0u8; 16])?;
        Ok(())
    }

    /// Read header from input.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != REPLAY_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid RKTR magic bytes",
            ));
        }

        let mut buf2 = [0u8; 2];
        let mut buf4 = [0u8; 4];
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf2)?;
        let version = u16::from_le_bytes(buf2);
        if version != REPLAY_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported RKTR version: {}", version),
            ));
        }

        r.read_exact(&mut buf2)?;
        let flags = ReplayFlags::from_u16(u16::from_le_bytes(buf2));

        r.read_exact(&mut buf4)?;
        let agent_count = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf8)?;
        let frame_count = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf4)?;
        let arena_width = f32::from_le_bytes(buf4);

        r.read_exact(&mut buf4)?;
        let arena_height = f32::from_le_bytes(buf4);

        let mut reserved = [0u8; 16];
        r.read_exact(&mut reserved)?;

        Ok(Self {
            agent_count,
            frame_count,
            arena_width,
            arena_height,
            flags,
        })
    }
}

/// Index entry for a single frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameIndex {
    /// Byte offset from start of file.
    pub offset: u64,
    /// Stored size in bytes (equals uncompressed if no compression).
    pub size: u64,
}

impl FrameIndex {
    /// Size of one index entry in bytes.
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.size.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf8)?;
        let offset = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf8)?;
        let size = u64::from_le_bytes(buf8);

        Ok(Self { offset, size })
    }
}

/// One rocket as stored in a replay frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedAgent {
    pub position: (f32, f32),
    pub orientation: f32,
    pub status: RocketStatus,
}

/// A decoded replay frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub generation: u32,
    pub frame: u32,
    pub agents: Vec<RecordedAgent>,
}

/// Encode a snapshot into `out`, replacing its contents.
pub fn encode_frame(snapshot: &TickSnapshot, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(FRAME_PREFIX_SIZE + snapshot.agents.len() * AGENT_RECORD_SIZE);
    out.extend_from_slice(&(snapshot.generation as u32).to_le_bytes());
    out.extend_from_slice(&(snapshot.frame as u32).to_le_bytes());
    for agent in &snapshot.agents {
        out.extend_from_slice(&agent.position.0.to_le_bytes());
        out.extend_from_slice(&agent.position.1.to_le_bytes());
        out.extend_from_slice(&agent.orientation.to_le_bytes());
        out.push(agent.status as u8);
    }
}

/// Decode a frame holding `agent_count` rockets.
pub fn decode_frame(bytes: &[u8], agent_count: usize) -> io::Result<RecordedFrame> {
    let expected = FRAME_PREFIX_SIZE + agent_count * AGENT_RECORD_SIZE;
    if bytes.len() != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Frame size mismatch: {} bytes vs {} expected",
                bytes.len(),
                expected
            ),
        ));
    }

    let f32_at = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

    let mut agents = Vec::with_capacity(agent_count);
    for a in 0..agent_count {
        let base = FRAME_PREFIX_SIZE + a * AGENT_RECORD_SIZE;
        let status = RocketStatus::from_u8(bytes[base + 12]).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown rocket status byte {}", bytes[base + 12]),
            )
        })?;
        agents.push(RecordedAgent {
            position: (f32_at(base), f32_at(base + 4)),
            orientation: f32_at(base + 8),
            status,
        });
    }

    Ok(RecordedFrame {
        generation: u32_at(0),
        frame: u32_at(4),
        agents,
    })
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(data))
}

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// LZ4 is not compiled in; recorders downgrade to uncompressed instead.
#[cfg(not(feature = "lz4"))]
pub fn compress_lz4(_data: &[u8]) -> io::Result<Vec<u8>> {
    Err(lz4_unavailable())
}

#[cfg(not(feature = "lz4"))]
pub fn decompress_lz4(_data: &[u8]) -> io::Result<Vec<u8>> {
    Err(lz4_unavailable())
}

#[cfg(not(feature = "lz4"))]
fn lz4_unavailable() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "LZ4 replay frames need the `lz4` feature",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AgentView;
    use std::io::Cursor;

    #[test]
    fn test_header_roundtrip() {
        let header = ReplayHeader {
            agent_count: 150,
            frame_count: 1000,
            arena_width: 800.0,
            arena_height: 600.0,
            flags: ReplayFlags {
                compression: CompressionType::Lz4,
            },
        };

        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), ReplayHeader::SIZE);

        let mut cursor = Cursor::new(&buf);
        let decoded = ReplayHeader::read_from(&mut cursor).unwrap();

        assert_eq!(decoded.agent_count, 150);
        assert_eq!(decoded.frame_count, 1000);
        assert_eq!(decoded.arena_width, 800.0);
        assert_eq!(decoded.flags.compression, CompressionType::Lz4);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut cursor = Cursor::new(b"FLWA0000000000000000000000000000000000000000".to_vec());
        let err = ReplayHeader::read_from(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_frame_encoding() {
        let view = |x: f32, status| AgentView {
            position: (x, 300.0),
            center: (x + 25.0, 325.0),
            orientation: -45.0,
            speed: 4.0,
            status,
            probes: [(0.0, 0.0); 3],
        };
        let snapshot = TickSnapshot {
            generation: 12,
            frame: 340,
            agents: vec![
                view(100.0, RocketStatus::Alive),
                view(250.5, RocketStatus::ReachedTarget),
            ],
        };

        let mut bytes = Vec::new();
        encode_frame(&snapshot, &mut bytes);
        assert_eq!(bytes.len(), FRAME_PREFIX_SIZE + 2 * AGENT_RECORD_SIZE);

        let frame = decode_frame(&bytes, 2).unwrap();
        assert_eq!(frame.generation, 12);
        assert_eq!(frame.frame, 340);
        assert_eq!(frame.agents[1].position, (250.5, 300.0));
        assert_eq!(frame.agents[1].orientation, -45.0);
        assert_eq!(frame.agents[1].status, RocketStatus::ReachedTarget);

        assert!(decode_frame(&bytes, 3).is_err());
    }
    #[cfg(feature = "lz4")]
    #[test]
    fn test_lz4_frame_roundtrip() {
        let data: Vec<u8> = (0..200u8).cycle().take(4096).collect();
        let packed = compress_lz4(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(decompress_lz4(&packed).unwrap(), data);
    }

    #[cfg(not(feature = "lz4"))]
    #[test]
    fn test_lz4_without_feature_is_unsupported() {
        let data = [1u8, 2, 3, 4];
        assert_eq!(
            compress_lz4(&data).unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
        assert_eq!(
            decompress_lz4(&data).unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
    }
}
