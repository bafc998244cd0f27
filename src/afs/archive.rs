//! The AFS2 container: a flat, little-endian archive of aligned sub-file
//! payloads addressed by an identifier table and an offset table.

use crate::error::{Error, Result};
use crate::reader::ByteCursor;
use crate::writer::{round_up, ByteWriter};

const HEADER_SIZE: u64 = 0x10;
const MAGIC: &[u8; 4] = b"AFS2";

/// Which offset vector gets written to the on-disk offset table (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetMode {
    /// Store the unrounded offset immediately following the previous
    /// payload. The final entry is never trailing-padded.
    LastEnd,
    /// Store the alignment-rounded start of each payload. The final entry
    /// is trailing-padded to the alignment boundary.
    Start,
}

/// One archived sub-file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AfsEntry {
    /// Identifier read from the id table. Ignored on build: identifiers are
    /// always written as the entry's ordinal (§1, Non-goals).
    pub id: u32,
    /// Raw sub-file bytes, unrounded (no trailing pad included).
    pub payload: Vec<u8>,
}

/// A parsed or hand-built AFS2 archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AfsArchive {
    pub version: u8,
    /// Width in bytes of each offset table entry; 2 or 4.
    pub offset_width: u8,
    /// Width in bytes of each id table entry; 2 or 4.
    pub id_width: u8,
    /// Alignment every payload's true start is rounded up to.
    pub alignment: u16,
    /// Opaque value carried for a downstream decoder.
    pub subkey: u16,
    pub entries: Vec<AfsEntry>,
}

fn check_width(width: u8) -> Result<()> {
    match width {
        2 | 4 => Ok(()),
        other => Err(Error::UnsupportedWidth(other)),
    }
}

fn read_width_le(cursor: &mut ByteCursor<'_>, width: u8) -> Result<u64> {
    Ok(match width {
        2 => u64::from(cursor.read_u16_le()?),
        4 => u64::from(cursor.read_u32_le()?),
        other => return Err(Error::UnsupportedWidth(other)),
    })
}

fn write_width_le(writer: &mut ByteWriter, width: u8, value: u64) {
    match width {
        2 => writer.write_u16_le(value as u16),
        4 => writer.write_u32_le(value as u32),
        _ => unreachable!("width validated before build"),
    }
}

impl AfsArchive {
    /// Parse an AFS2 archive from `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let magic = cursor.read_bytes(4)?;
        if magic != MAGIC.as_slice() {
            let mut actual = [0u8; 4];
            actual.copy_from_slice(magic);
            return Err(Error::BadMagic {
                expected: MAGIC.as_slice(),
                actual,
            });
        }
        let version = cursor.read_u8()?;
        let offset_width = cursor.read_u8()?;
        check_width(offset_width)?;
        let id_width = cursor.read_u16_le()?;
        if id_width != 2 && id_width != 4 {
            return Err(Error::UnsupportedWidth(id_width as u8));
        }
        let id_width = id_width as u8;
        let entries_count = cursor.read_u32_le()?;
        let alignment = cursor.read_u16_le()?;
        let subkey = cursor.read_u16_le()?;

        let mut ids = Vec::with_capacity(entries_count as usize);
        for _ in 0..entries_count {
            ids.push(read_width_le(&mut cursor, id_width)? as u32);
        }

        let mut offsets = Vec::with_capacity(entries_count as usize + 1);
        for _ in 0..=entries_count {
            offsets.push(read_width_le(&mut cursor, offset_width)?);
        }

        if (cursor.position() as u64) > offsets[0] {
            return Err(Error::HeaderMalformed(format!(
                "header+tables end at {} but offsets[0] is {}",
                cursor.position(),
                offsets[0]
            )));
        }
        let last_offset = offsets[entries_count as usize];
        if (data.len() as u64) < last_offset {
            return Err(Error::HeaderMalformed(format!(
                "archive data is {} bytes, shorter than final offset {last_offset}",
                data.len()
            )));
        }

        let mut entries = Vec::with_capacity(entries_count as usize);
        for i in 0..entries_count as usize {
            let start = round_up(offsets[i], u64::from(alignment)) as usize;
            let end = offsets[i + 1] as usize;
            if start > end || end > data.len() {
                return Err(Error::OffsetOutOfBounds {
                    offset: start,
                    len: end.saturating_sub(start),
                    region_size: data.len(),
                });
            }
            entries.push(AfsEntry {
                id: ids[i],
                payload: data[start..end].to_vec(),
            });
        }

        Ok(Self {
            version,
            offset_width,
            id_width,
            alignment,
            subkey,
            entries,
        })
    }

    /// Build this archive into a self-contained AFS2 byte sequence,
    /// choosing which offset vector is written to the offset table.
    pub fn build(&self, offset_mode: OffsetMode) -> Result<Vec<u8>> {
        check_width(self.offset_width)?;
        check_width(self.id_width)?;

        let n = self.entries.len() as u64;
        let id_capacity = 1u64 << (8 * u64::from(self.id_width));
        if n > id_capacity {
            return Err(Error::HeaderMalformed(format!(
                "entries_count {n} exceeds id_width {} capacity",
                self.id_width
            )));
        }
        if n > u64::from(u32::MAX) {
            return Err(Error::HeaderMalformed(format!(
                "entries_count {n} exceeds u32 range"
            )));
        }
        if self.alignment == 0 {
            return Err(Error::HeaderMalformed(
                "alignment must be >= 1".to_string(),
            ));
        }

        let id_table_size = n * u64::from(self.id_width);
        let offset_table_size = (n + 1) * u64::from(self.offset_width);
        let table_end = HEADER_SIZE + id_table_size + offset_table_size;

        let mut last_end = vec![0u64; self.entries.len() + 1];
        let mut start = vec![0u64; self.entries.len() + 1];
        last_end[0] = table_end;
        for (i, entry) in self.entries.iter().enumerate() {
            start[i] = round_up(last_end[i], u64::from(self.alignment));
            last_end[i + 1] = start[i] + entry.payload.len() as u64;
        }
        let n_idx = self.entries.len();
        start[n_idx] = round_up(last_end[n_idx], u64::from(self.alignment));

        let stored_offsets = match offset_mode {
            OffsetMode::LastEnd => &last_end,
            OffsetMode::Start => &start,
        };

        let total_size = match offset_mode {
            OffsetMode::LastEnd => last_end[n_idx],
            OffsetMode::Start => start[n_idx],
        };
        let max_representable = match self.offset_width {
            2 => u64::from(u16::MAX),
            4 => u64::from(u32::MAX),
            _ => unreachable!("width validated above"),
        };
        if total_size > max_representable {
            return Err(Error::ArchiveTooLarge {
                size: total_size,
                offset_width: self.offset_width,
            });
        }

        let mut w = ByteWriter::with_capacity(total_size as usize);
        w.write_bytes(MAGIC.as_slice());
        w.write_u8(self.version);
        w.write_u8(self.offset_width);
        w.write_u16_le(u16::from(self.id_width));
        w.write_u32_le(self.entries.len() as u32);
        w.write_u16_le(self.alignment);
        w.write_u16_le(self.subkey);

        for (ordinal, _entry) in self.entries.iter().enumerate() {
            write_width_le(&mut w, self.id_width, ordinal as u64);
        }
        for &offset in stored_offsets {
            write_width_le(&mut w, self.offset_width, offset);
        }

        for (i, entry) in self.entries.iter().enumerate() {
            let pad = start[i] - w.len() as u64;
            w.write_bytes(&vec![0u8; pad as usize]);
            w.write_bytes(&entry.payload);

            let is_last = i + 1 == self.entries.len();
            let pad_to = if is_last {
                match offset_mode {
                    OffsetMode::LastEnd => w.len() as u64,
                    OffsetMode::Start => start[i + 1],
                }
            } else {
                start[i + 1]
            };
            if pad_to > w.len() as u64 {
                w.write_bytes(&vec![0u8; (pad_to - w.len() as u64) as usize]);
            }
        }

        Ok(w.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(alignment: u16, sizes: &[usize]) -> AfsArchive {
        AfsArchive {
            version: 1,
            offset_width: 4,
            id_width: 2,
            alignment,
            subkey: 0,
            entries: sizes
                .iter()
                .enumerate()
                .map(|(i, &len)| AfsEntry {
                    id: i as u32,
                    payload: vec![0xAB; len],
                })
                .collect(),
        }
    }

    #[test]
    fn last_end_mode_does_not_trailing_pad_final_entry() {
        let archive = archive(0x20, &[5, 7]);
        let bytes = archive.build(OffsetMode::LastEnd).unwrap();
        assert_eq!(bytes.len(), 0x47);
        let parsed = AfsArchive::parse(&bytes).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].payload, vec![0xAB; 5]);
        assert_eq!(parsed.entries[1].payload, vec![0xAB; 7]);
    }

    #[test]
    fn start_mode_trailing_pads_final_entry() {
        let archive = archive(0x20, &[5, 7]);
        let bytes = archive.build(OffsetMode::Start).unwrap();
        assert_eq!(bytes.len(), 0x60);
        let parsed = AfsArchive::parse(&bytes).unwrap();
        assert_eq!(parsed.entries[0].payload, vec![0xAB; 5]);
        assert_eq!(parsed.entries[1].payload, vec![0xAB; 7]);
    }

    #[test]
    fn build_assigns_ordinal_identifiers() {
        let mut archive = archive(0x20, &[1, 1]);
        archive.entries[0].id = 99;
        archive.entries[1].id = 100;
        let bytes = archive.build(OffsetMode::LastEnd).unwrap();
        let parsed = AfsArchive::parse(&bytes).unwrap();
        assert_eq!(parsed.entries[0].id, 0);
        assert_eq!(parsed.entries[1].id, 1);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let bytes = vec![0u8; 16];
        assert!(matches!(
            AfsArchive::parse(&bytes),
            Err(Error::BadMagic { .. })
        ));
    }

    #[test]
    fn unsupported_width_is_rejected() {
        let mut archive = archive(0x20, &[1]);
        archive.offset_width = 3;
        assert!(matches!(
            archive.build(OffsetMode::LastEnd),
            Err(Error::UnsupportedWidth(3))
        ));
    }

    #[test]
    fn zero_entries_round_trips() {
        let archive = archive(0x20, &[]);
        let bytes = archive.build(OffsetMode::LastEnd).unwrap();
        let parsed = AfsArchive::parse(&bytes).unwrap();
        assert!(parsed.entries.is_empty());
    }
}
