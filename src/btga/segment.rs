//! Block framing readers.
//!
//! A BTGA file is a run of logical blocks. How those blocks are framed on
//! disk differs between format revisions:
//!
//! - **V1/V2**: each segment starts with `u16 count, u16 pad, u32 length`
//!   followed by `count` u32 block sizes summing to `length`.
//! - **V3**: the same, behind an 8-byte descriptor `(flags_and_count,
//!   length_or_skip)`. A nonzero low byte in the first word redirects:
//!   skip `length_or_skip` bytes and read another descriptor.
//! - **V4**: one descriptor (count in the upper 24 bits) introduces a single
//!   size table for the whole file. Blocks are groups in that table, each
//!   opened by a tag entry in `[-0x10, -0x0E]` and followed by the sizes of
//!   the chunks that make up its payload.

use alloc::boxed::Box;
use alloc::vec::Vec;

use super::Framing;
use crate::error::{BtgaError, FramingError};
use crate::source::{BlockSource, check_range};

/// Redirecting descriptors followed per table load before giving up.
pub const MAX_REDIRECTIONS: u32 = 5;

/// Inclusive range of size-table values that act as V4 block tags.
// Only these three values have been observed; the tag space may be wider.
pub const BLOCK_TAGS: core::ops::RangeInclusive<i32> = -0x10..=-0x0E;

/// One logical block pulled from the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub data: Vec<u8>,
    pub meta: BlockMeta,
}

/// Version-specific framing details of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockMeta {
    /// V1 through V3.
    Sized {
        /// First block after a fresh segment descriptor.
        segment_start: bool,
        /// Total declared length of the enclosing segment.
        segment_len: u32,
    },
    /// V4.
    Grouped {
        /// Number of chunk-size entries that made up the payload.
        entries: u32,
        /// The tag entry that opened the group.
        tag: i32,
    },
}

impl Block {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Pulls one logical block at a time out of a [`BlockSource`].
///
/// State carries over between calls, so one reader serves exactly one file.
pub trait SegmentReader {
    fn next_block(
        &mut self,
        source: &mut dyn BlockSource,
        file_len: u64,
    ) -> Result<Block, BtgaError>;
}

/// Create the reader for a framing revision.
pub fn segment_reader(framing: Framing) -> Box<dyn SegmentReader> {
    match framing {
        Framing::V1V2 => Box::new(SizedFraming::default()),
        Framing::V3 => Box::new(RedirectFraming::default()),
        Framing::V4 => Box::new(GroupedFraming::default()),
    }
}

// ── Shared table handling ───────────────────────────────────────────

#[derive(Debug)]
struct SizeTable {
    entries: Vec<i32>,
    cursor: usize,
    segment_len: u32,
}

fn read_entries(source: &mut dyn BlockSource, count: u32) -> Result<Vec<i32>, BtgaError> {
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        entries.push(source.read_i32_le()?);
    }
    Ok(entries)
}

/// Load a V1–V3 size table once its count and length are known.
///
/// The size entries start at the current position; they and the segment
/// payload must both fit in the file.
fn load_sized_table(
    source: &mut dyn BlockSource,
    file_len: u64,
    count: u32,
    segment_len: u32,
) -> Result<SizeTable, BtgaError> {
    if count == 0 {
        return Err(FramingError::ZeroBlockCount.into());
    }
    if segment_len == 0 {
        return Err(FramingError::ZeroSegmentLength.into());
    }
    let start = source.position();
    check_range(
        start,
        u64::from(count) * 4 + u64::from(segment_len),
        file_len,
    )?;

    let entries = read_entries(source, count)?;
    let actual: u64 = entries.iter().map(|&e| u64::from(e as u32)).sum();
    if actual != u64::from(segment_len) {
        return Err(FramingError::SizeSumMismatch {
            declared: segment_len,
            actual,
        }
        .into());
    }

    tracing::debug!(count, segment_len, offset = start, "loaded segment size table");
    Ok(SizeTable {
        entries,
        cursor: 0,
        segment_len,
    })
}

/// Consume the next entry of a V1–V3 table as one block.
///
/// Clears `table` once its last entry has been consumed so the next call
/// reads a fresh segment descriptor.
fn take_sized_block(
    table: &mut Option<SizeTable>,
    source: &mut dyn BlockSource,
    file_len: u64,
    segment_start: bool,
) -> Result<Block, BtgaError> {
    let current = table.as_mut().ok_or(FramingError::TableExhausted)?;
    let size = current
        .entries
        .get(current.cursor)
        .map(|&e| e as u32)
        .ok_or(FramingError::TableExhausted)?;
    let segment_len = current.segment_len;

    check_range(source.position(), u64::from(size), file_len)?;
    let data = source.read_vec(size as usize)?;

    current.cursor += 1;
    if current.cursor == current.entries.len() {
        *table = None;
    }

    tracing::trace!(size, segment_start, "read sized block");
    Ok(Block {
        data,
        meta: BlockMeta::Sized {
            segment_start,
            segment_len,
        },
    })
}

/// Read an 8-byte V3/V4 descriptor, following redirections.
///
/// Returns `(flags_and_count, length)` of the first non-redirecting
/// descriptor.
fn read_descriptor(
    source: &mut dyn BlockSource,
    file_len: u64,
) -> Result<(u32, u32), BtgaError> {
    let mut redirections = 0;
    loop {
        check_range(source.position(), 8, file_len)?;
        let flags_and_count = source.read_u32_le()?;
        let length_or_skip = source.read_u32_le()?;

        if flags_and_count & 0xFF == 0 {
            return Ok((flags_and_count, length_or_skip));
        }

        redirections += 1;
        if redirections > MAX_REDIRECTIONS {
            return Err(FramingError::RedirectionLimit.into());
        }
        tracing::trace!(
            skip = length_or_skip,
            offset = source.position(),
            "following descriptor redirection"
        );
        source.skip(u64::from(length_or_skip))?;
    }
}

// ── V1/V2 ───────────────────────────────────────────────────────────

/// Framing of format revisions 1 and 2.
#[derive(Debug, Default)]
pub struct SizedFraming {
    table: Option<SizeTable>,
}

impl SegmentReader for SizedFraming {
    fn next_block(
        &mut self,
        source: &mut dyn BlockSource,
        file_len: u64,
    ) -> Result<Block, BtgaError> {
        let segment_start = self.table.is_none();
        if segment_start {
            check_range(source.position(), 8, file_len)?;
            let count = source.read_u16_le()?;
            source.skip(2)?;
            let segment_len = source.read_u32_le()?;
            self.table = Some(load_sized_table(
                source,
                file_len,
                u32::from(count),
                segment_len,
            )?);
        }
        take_sized_block(&mut self.table, source, file_len, segment_start)
    }
}

// ── V3 ──────────────────────────────────────────────────────────────

/// Framing of format revision 3.
#[derive(Debug, Default)]
pub struct RedirectFraming {
    table: Option<SizeTable>,
}

impl SegmentReader for RedirectFraming {
    fn next_block(
        &mut self,
        source: &mut dyn BlockSource,
        file_len: u64,
    ) -> Result<Block, BtgaError> {
        let segment_start = self.table.is_none();
        if segment_start {
            let (flags_and_count, segment_len) = read_descriptor(source, file_len)?;
            self.table = Some(load_sized_table(
                source,
                file_len,
                flags_and_count >> 16,
                segment_len,
            )?);
        }
        take_sized_block(&mut self.table, source, file_len, segment_start)
    }
}

// ── V4 ──────────────────────────────────────────────────────────────

/// Framing of format revision 4.
///
/// The single size table is loaded on the first call and never re-read;
/// asking for a block after it is exhausted is an error.
#[derive(Debug, Default)]
pub struct GroupedFraming {
    table: Option<SizeTable>,
}

fn is_tag(entry: i32) -> bool {
    BLOCK_TAGS.contains(&entry)
}

impl GroupedFraming {
    fn load_table(
        source: &mut dyn BlockSource,
        file_len: u64,
    ) -> Result<SizeTable, BtgaError> {
        let (flags_and_count, length) = read_descriptor(source, file_len)?;
        let count = flags_and_count >> 8;
        if u64::from(count) * 4 != u64::from(length) {
            return Err(FramingError::TableLengthMismatch {
                entries: count,
                length,
            }
            .into());
        }
        check_range(source.position(), u64::from(length), file_len)?;
        let entries = read_entries(source, count)?;
        tracing::debug!(count, "loaded grouped size table");
        Ok(SizeTable {
            entries,
            cursor: 0,
            segment_len: length,
        })
    }
}

impl SegmentReader for GroupedFraming {
    fn next_block(
        &mut self,
        source: &mut dyn BlockSource,
        file_len: u64,
    ) -> Result<Block, BtgaError> {
        if self.table.is_none() {
            self.table = Some(Self::load_table(source, file_len)?);
        }
        let table = self.table.as_mut().ok_or(FramingError::TableExhausted)?;

        let tag = *table
            .entries
            .get(table.cursor)
            .ok_or(FramingError::TableExhausted)?;
        if !is_tag(tag) {
            return Err(FramingError::BadMarker(tag).into());
        }
        table.cursor += 1;

        let mut entries = 0u32;
        let mut len = 0u64;
        while let Some(&size) = table.entries.get(table.cursor) {
            if is_tag(size) {
                break;
            }
            if size < 0 {
                return Err(FramingError::NegativeChunk(size).into());
            }
            len += size as u64;
            entries += 1;
            table.cursor += 1;
        }

        check_range(source.position(), len, file_len)?;
        let data = source.read_vec(len as usize)?;

        tracing::trace!(tag, entries, len, "read grouped block");
        Ok(Block {
            data,
            meta: BlockMeta::Grouped { entries, tag },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SliceSource;
    use alloc::vec;

    fn sized_segment(out: &mut Vec<u8>, sizes: &[u32], declared: u32) {
        out.extend_from_slice(&(sizes.len() as u16).to_le_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&declared.to_le_bytes());
        for s in sizes {
            out.extend_from_slice(&s.to_le_bytes());
        }
    }

    fn v3_descriptor(out: &mut Vec<u8>, word0: u32, word1: u32) {
        out.extend_from_slice(&word0.to_le_bytes());
        out.extend_from_slice(&word1.to_le_bytes());
    }

    fn read_all(
        framing: Framing,
        data: &[u8],
        blocks: usize,
    ) -> Result<Vec<Block>, BtgaError> {
        let mut reader = segment_reader(framing);
        let mut src = SliceSource::new(data);
        let len = data.len() as u64;
        (0..blocks).map(|_| reader.next_block(&mut src, len)).collect()
    }

    #[test]
    fn v1_reads_blocks_across_segments() {
        let mut data = Vec::new();
        sized_segment(&mut data, &[3, 2], 5);
        data.extend_from_slice(&[1, 2, 3, 4, 5]);
        sized_segment(&mut data, &[4], 4);
        data.extend_from_slice(&[6, 7, 8, 9]);

        let blocks = read_all(Framing::V1V2, &data, 3).unwrap();
        assert_eq!(blocks[0].data, vec![1, 2, 3]);
        assert_eq!(
            blocks[0].meta,
            BlockMeta::Sized {
                segment_start: true,
                segment_len: 5
            }
        );
        assert_eq!(blocks[1].data, vec![4, 5]);
        assert_eq!(
            blocks[1].meta,
            BlockMeta::Sized {
                segment_start: false,
                segment_len: 5
            }
        );
        assert_eq!(blocks[2].data, vec![6, 7, 8, 9]);
        assert!(matches!(
            blocks[2].meta,
            BlockMeta::Sized {
                segment_start: true,
                ..
            }
        ));
    }

    #[test]
    fn v1_size_sum_off_by_one() {
        for declared in [4, 6] {
            let mut data = Vec::new();
            sized_segment(&mut data, &[3, 2], declared);
            data.extend_from_slice(&[0; 8]);
            match read_all(Framing::V1V2, &data, 1) {
                Err(BtgaError::Framing(FramingError::SizeSumMismatch { actual: 5, .. })) => {}
                other => panic!("expected SizeSumMismatch, got {other:?}"),
            }
        }
    }

    #[test]
    fn v1_rejects_zero_fields() {
        let mut data = Vec::new();
        sized_segment(&mut data, &[], 4);
        data.extend_from_slice(&[0; 8]);
        assert!(matches!(
            read_all(Framing::V1V2, &data, 1),
            Err(BtgaError::Framing(FramingError::ZeroBlockCount))
        ));

        let mut data = Vec::new();
        sized_segment(&mut data, &[0], 0);
        data.extend_from_slice(&[0; 8]);
        assert!(matches!(
            read_all(Framing::V1V2, &data, 1),
            Err(BtgaError::Framing(FramingError::ZeroSegmentLength))
        ));
    }

    #[test]
    fn v1_segment_must_fit_in_file() {
        let mut data = Vec::new();
        sized_segment(&mut data, &[16], 16);
        data.extend_from_slice(&[0; 15]);
        assert!(matches!(
            read_all(Framing::V1V2, &data, 1),
            Err(BtgaError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn v1_wrapping_sizes_do_not_match() {
        // 0xFFFF_FFFF + 2 wraps to 1 in 32-bit arithmetic
        let mut data = Vec::new();
        sized_segment(&mut data, &[0xFFFF_FFFF, 2], 1);
        data.extend_from_slice(&[0; 4]);
        assert!(matches!(
            read_all(Framing::V1V2, &data, 1),
            Err(BtgaError::Framing(FramingError::SizeSumMismatch { .. }))
        ));
    }

    #[test]
    fn v3_follows_redirections() {
        let mut data = Vec::new();
        v3_descriptor(&mut data, 0x01, 4);
        data.extend_from_slice(&[0xAA; 4]);
        v3_descriptor(&mut data, 0x80, 0);
        v3_descriptor(&mut data, 2 << 16, 6);
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 4, 5, 6]);

        let blocks = read_all(Framing::V3, &data, 2).unwrap();
        assert_eq!(blocks[0].data, vec![1, 2]);
        assert!(matches!(
            blocks[0].meta,
            BlockMeta::Sized {
                segment_start: true,
                segment_len: 6
            }
        ));
        assert_eq!(blocks[1].data, vec![3, 4, 5, 6]);
        assert!(matches!(
            blocks[1].meta,
            BlockMeta::Sized {
                segment_start: false,
                ..
            }
        ));
    }

    #[test]
    fn v3_redirection_limit() {
        let build = |redirects: u32| {
            let mut data = Vec::new();
            for _ in 0..redirects {
                v3_descriptor(&mut data, 0x01, 0);
            }
            v3_descriptor(&mut data, 1 << 16, 2);
            data.extend_from_slice(&2u32.to_le_bytes());
            data.extend_from_slice(&[7, 7]);
            data
        };

        let data = build(MAX_REDIRECTIONS);
        let blocks = read_all(Framing::V3, &data, 1).unwrap();
        assert_eq!(blocks[0].data, vec![7, 7]);

        let data = build(MAX_REDIRECTIONS + 1);
        assert!(matches!(
            read_all(Framing::V3, &data, 1),
            Err(BtgaError::Framing(FramingError::RedirectionLimit))
        ));
    }

    #[test]
    fn v3_redirect_past_end_is_truncation() {
        let mut data = Vec::new();
        v3_descriptor(&mut data, 0x01, 100);
        data.extend_from_slice(&[0; 8]);
        assert!(matches!(
            read_all(Framing::V3, &data, 1),
            Err(BtgaError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn v3_size_sum_mismatch() {
        let mut data = Vec::new();
        v3_descriptor(&mut data, 1 << 16, 3);
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        assert!(matches!(
            read_all(Framing::V3, &data, 1),
            Err(BtgaError::Framing(FramingError::SizeSumMismatch {
                declared: 3,
                actual: 4
            }))
        ));
    }

    #[test]
    fn v3_rejects_zero_fields() {
        let mut data = Vec::new();
        v3_descriptor(&mut data, 0, 4);
        data.extend_from_slice(&[0; 8]);
        assert!(matches!(
            read_all(Framing::V3, &data, 1),
            Err(BtgaError::Framing(FramingError::ZeroBlockCount))
        ));

        let mut data = Vec::new();
        v3_descriptor(&mut data, 1 << 16, 0);
        data.extend_from_slice(&[0; 8]);
        assert!(matches!(
            read_all(Framing::V3, &data, 1),
            Err(BtgaError::Framing(FramingError::ZeroSegmentLength))
        ));
    }

    fn v4_file(entries: &[i32], payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        v3_descriptor(&mut data, (entries.len() as u32) << 8, entries.len() as u32 * 4);
        for e in entries {
            data.extend_from_slice(&e.to_le_bytes());
        }
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn v4_groups_chunks_between_tags() {
        let data = v4_file(&[-0x10, 2, 1, -0x0F, -0x0E, 3], &[1, 2, 3, 4, 5, 6]);
        let blocks = read_all(Framing::V4, &data, 3).unwrap();

        assert_eq!(blocks[0].data, vec![1, 2, 3]);
        assert_eq!(
            blocks[0].meta,
            BlockMeta::Grouped {
                entries: 2,
                tag: -0x10
            }
        );
        // a group with no chunk entries is a legal empty block
        assert!(blocks[1].is_empty());
        assert_eq!(
            blocks[1].meta,
            BlockMeta::Grouped {
                entries: 0,
                tag: -0x0F
            }
        );
        assert_eq!(blocks[2].data, vec![4, 5, 6]);
    }

    #[test]
    fn v4_rejects_non_tag_in_tag_position() {
        for bad in [-0x11, -0x0D, 0, 4] {
            let data = v4_file(&[bad, 1], &[0; 4]);
            match read_all(Framing::V4, &data, 1) {
                Err(BtgaError::Framing(FramingError::BadMarker(v))) => assert_eq!(v, bad),
                other => panic!("expected BadMarker, got {other:?}"),
            }
        }
    }

    #[test]
    fn v4_table_length_must_match_count() {
        let mut data = Vec::new();
        v3_descriptor(&mut data, 2 << 8, 12);
        data.extend_from_slice(&[0; 16]);
        assert!(matches!(
            read_all(Framing::V4, &data, 1),
            Err(BtgaError::Framing(FramingError::TableLengthMismatch {
                entries: 2,
                length: 12
            }))
        ));
    }

    #[test]
    fn v4_empty_table() {
        let mut data = Vec::new();
        v3_descriptor(&mut data, 0, 0);
        data.extend_from_slice(&[0; 8]);
        assert!(matches!(
            read_all(Framing::V4, &data, 1),
            Err(BtgaError::Framing(FramingError::TableExhausted))
        ));
    }

    #[test]
    fn v4_table_is_not_reloaded() {
        let data = v4_file(&[-0x10, 1], &[9, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut reader = segment_reader(Framing::V4);
        let mut src = SliceSource::new(&data);
        let len = data.len() as u64;
        assert_eq!(reader.next_block(&mut src, len).unwrap().data, vec![9]);
        assert!(matches!(
            reader.next_block(&mut src, len),
            Err(BtgaError::Framing(FramingError::TableExhausted))
        ));
    }

    #[test]
    fn v4_payload_must_fit() {
        let data = v4_file(&[-0x10, 8], &[0; 7]);
        assert!(matches!(
            read_all(Framing::V4, &data, 1),
            Err(BtgaError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn v4_negative_chunk_rejected() {
        let data = v4_file(&[-0x10, -3], &[0; 4]);
        assert!(matches!(
            read_all(Framing::V4, &data, 1),
            Err(BtgaError::Framing(FramingError::NegativeChunk(-3)))
        ));
    }

    #[test]
    fn v4_redirects_before_table() {
        let mut data = Vec::new();
        v3_descriptor(&mut data, 0x22, 2);
        data.extend_from_slice(&[0xEE, 0xEE]);
        data.extend_from_slice(&v4_file(&[-0x0E, 2], &[5, 6]));
        let blocks = read_all(Framing::V4, &data, 1).unwrap();
        assert_eq!(blocks[0].data, vec![5, 6]);
    }
}
