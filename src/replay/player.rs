//! Replay player for reading back recorded runs.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::format::{
    CompressionType, FrameIndex, RecordedFrame, ReplayHeader, decode_frame, decompress_lz4,
};

/// Random-access reader for `.rktr` files.
///
/// Usage:
/// ```ignore
/// let mut player = ReplayPlayer::open("run.rktr")?;
/// for frame in player.frames() {
///     let frame = frame?;
///     draw(frame.generation, &frame.agents);
/// }
/// ```
pub struct ReplayPlayer {
    reader: BufReader<File>,
    header: ReplayHeader,
    frame_indices: Vec<FrameIndex>,
}

impl ReplayPlayer {
    /// Open a replay file and load its frame index.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let header = ReplayHeader::read_from(&mut reader)?;

        let file_len = reader.seek(SeekFrom::End(0))?;
        let index_start = header
            .frame_count
            .checked_mul(FrameIndex::SIZE as u64)
            .and_then(|index_size| file_len.checked_sub(index_size))
            .filter(|start| *start >= ReplayHeader::SIZE as u64)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Replay file is too short for its frame index",
                )
            })?;

        reader.seek(SeekFrom::Start(index_start))?;

        let mut frame_indices = Vec::with_capacity(header.frame_count as usize);
        for _ in 0..header.frame_count {
            frame_indices.push(FrameIndex::read_from(&mut reader)?);
        }

        Ok(Self {
            reader,
            header,
            frame_indices,
        })
    }

    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    /// Rockets stored per frame.
    pub fn agent_count(&self) -> usize {
        self.header.agent_count as usize
    }

    /// Arena (width, height) the run was recorded in.
    pub fn arena_size(&self) -> (f32, f32) {
        (self.header.arena_width, self.header.arena_height)
    }

    /// Read a specific frame by index.
    pub fn read_frame(&mut self, frame_index: u64) -> io::Result<RecordedFrame> {
        if frame_index >= self.header.frame_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Frame index {} out of range ({} frames)",
                    frame_index, self.header.frame_count
                ),
            ));
        }

        let index = self.frame_indices[frame_index as usize];
        self.reader.seek(SeekFrom::Start(index.offset))?;

        let mut data = vec![0u8; index.size as usize];
        self.reader.read_exact(&mut data)?;

        let raw_data = match self.header.flags.compression {
            CompressionType::None => data,
            CompressionType::Lz4 => decompress_lz4(&data)?,
        };

        decode_frame(&raw_data, self.agent_count())
    }

    /// Iterate over all frames in recording order.
    pub fn frames(&mut self) -> FrameIterator<'_> {
        FrameIterator {
            player: self,
            current: 0,
        }
    }
}

/// Iterator over replay frames.
pub struct FrameIterator<'a> {
    player: &'a mut ReplayPlayer,
    current: u64,
}

impl Iterator for FrameIterator<'_> {
    type Item = io::Result<RecordedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.player.frame_count() {
            return None;
        }

        let result = self.player.read_frame(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.player.frame_count() - self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameIterator<'_> {}
