//! @UTF table model, parser, and builder.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::reader::ByteCursor;
use crate::utf::blobs::{read_blob, BlobPool};
use crate::utf::strings::{read_string, StringEncoding, StringPool};
use crate::utf::value::{ColumnStorage, ColumnValue, ValueType};
use crate::writer::{round_up, ByteWriter};

const HEADER_SIZE: u64 = 0x20;
const MAGIC: &[u8; 4] = b"@UTF";
const ENCRYPTED_MAGIC: [u8; 4] = [0x1F, 0x9E, 0xF3, 0xF5];

/// Tunables for [`UtfTable::parse`].
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// String encoding used for the strings pool. Defaults to UTF-8.
    pub encoding: StringEncoding,
    /// Maximum nesting depth for recognising a blob as a nested `@UTF`
    /// table. Defaults to 5, per §4.1.
    pub max_depth: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            encoding: StringEncoding::Utf8,
            max_depth: 5,
        }
    }
}

/// Tunables for [`UtfTable::build`].
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    /// String encoding used to populate the strings pool.
    pub encoding: StringEncoding,
    /// When set, every blob is zero-padded to a multiple of this value
    /// (§4.2), and the strings pool is padded so the blobs region starts on
    /// the same boundary.
    pub blob_alignment: Option<u32>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            encoding: StringEncoding::Utf8,
            blob_alignment: None,
        }
    }
}

/// One column's data, carrying exactly the payload its storage mode allows:
/// nothing for `NameOnly`, one shared value for `Constant`, one value per
/// row for `PerRow` (§3 invariant: exactly one of value/rows is present).
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    NameOnly,
    Constant(ColumnValue),
    PerRow(Vec<ColumnValue>),
}

/// A single column in a [`UtfTable`]'s schema.
#[derive(Debug, Clone, PartialEq)]
pub struct UtfColumn {
    /// Column name (always present, even for `NameOnly` columns).
    pub name: String,
    /// The on-disk type tag. For `Constant`/`PerRow` this must agree with
    /// the runtime type of the carried [`ColumnValue`] (a `BlobOfTable`
    /// agrees with [`ValueType::Blob`]).
    pub value_type: ValueType,
    /// The column's storage mode and payload.
    pub data: ColumnData,
}

impl UtfColumn {
    /// Storage mode, derived from which [`ColumnData`] variant this column
    /// carries.
    #[must_use]
    pub fn storage(&self) -> ColumnStorage {
        match self.data {
            ColumnData::NameOnly => ColumnStorage::NameOnly,
            ColumnData::Constant(_) => ColumnStorage::Constant,
            ColumnData::PerRow(_) => ColumnStorage::PerRow,
        }
    }
}

/// A parsed or hand-built `@UTF` table.
#[derive(Debug, Clone, PartialEq)]
pub struct UtfTable {
    /// Table name, sourced from the strings pool.
    pub table_name: String,
    /// Opaque 16-bit version field.
    pub version: u16,
    /// Number of rows every `PerRow` column carries.
    pub rows_count: u32,
    /// Ordered columns (order is preserved on build).
    pub columns: Vec<UtfColumn>,
}

/// Intermediate result of decoding one schema-region value, before a
/// per-row blob column's nested-table decision (made once, from the first
/// row) has been applied.
enum RawValue {
    Scalar(ColumnValue),
    Blob(Vec<u8>),
}

fn looks_like_nested_table(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == MAGIC
}

fn read_one(
    cursor: &mut ByteCursor<'_>,
    value_type: ValueType,
    strings_region: &[u8],
    blobs_region: &[u8],
    encoding: StringEncoding,
) -> Result<RawValue> {
    Ok(match value_type {
        ValueType::U8 => RawValue::Scalar(ColumnValue::U8(cursor.read_u8()?)),
        ValueType::S8 => RawValue::Scalar(ColumnValue::S8(cursor.read_i8()?)),
        ValueType::U16 => RawValue::Scalar(ColumnValue::U16(cursor.read_u16_be()?)),
        ValueType::S16 => RawValue::Scalar(ColumnValue::S16(cursor.read_i16_be()?)),
        ValueType::U32 => RawValue::Scalar(ColumnValue::U32(cursor.read_u32_be()?)),
        ValueType::S32 => RawValue::Scalar(ColumnValue::S32(cursor.read_i32_be()?)),
        ValueType::U64 => RawValue::Scalar(ColumnValue::U64(cursor.read_u64_be()?)),
        ValueType::S64 => RawValue::Scalar(ColumnValue::S64(cursor.read_i64_be()?)),
        ValueType::F32 => RawValue::Scalar(ColumnValue::F32(cursor.read_f32_be()?)),
        ValueType::F64 => RawValue::Scalar(ColumnValue::F64(cursor.read_f64_be()?)),
        ValueType::String => {
            let offset = cursor.read_u32_be()? as usize;
            RawValue::Scalar(ColumnValue::String(read_string(
                strings_region,
                offset,
                encoding,
            )?))
        }
        ValueType::Blob => {
            let offset = cursor.read_u32_be()? as usize;
            let size = cursor.read_u32_be()? as usize;
            RawValue::Blob(read_blob(blobs_region, offset, size)?.to_vec())
        }
        ValueType::U128 => {
            let bytes = cursor.read_bytes(16)?;
            let mut array = [0u8; 16];
            array.copy_from_slice(bytes);
            RawValue::Scalar(ColumnValue::U128(array))
        }
    })
}

impl UtfTable {
    /// Parse a `@UTF` table from `data` using the given options.
    pub fn parse(data: &[u8], options: ParseOptions) -> Result<Self> {
        Self::parse_at(data, options, 0)
    }

    fn parse_at(data: &[u8], options: ParseOptions, depth: u32) -> Result<Self> {
        if depth > options.max_depth {
            return Err(Error::RecursionDepthExceeded {
                limit: options.max_depth,
            });
        }

        let mut cursor = ByteCursor::new(data);
        let magic = cursor.read_bytes(4)?;
        if magic == ENCRYPTED_MAGIC.as_slice() {
            return Err(Error::EncryptedTable);
        }
        if magic != MAGIC.as_slice() {
            let mut actual = [0u8; 4];
            actual.copy_from_slice(magic);
            return Err(Error::BadMagic {
                expected: MAGIC.as_slice(),
                actual,
            });
        }

        let table_size = u64::from(cursor.read_u32_be()?) + 8;
        let version = cursor.read_u16_be()?;
        let rows_offset = u64::from(cursor.read_u16_be()?) + 8;
        let strings_offset = u64::from(cursor.read_u32_be()?) + 8;
        let blobs_offset = u64::from(cursor.read_u32_be()?) + 8;
        let table_name_offset = cursor.read_u32_be()? as u64;
        let columns_count = cursor.read_u16_be()?;
        let row_width = cursor.read_u16_be()?;
        let rows_count = cursor.read_u32_be()?;

        if table_size > data.len() as u64 {
            return Err(Error::HeaderMalformed(format!(
                "table_size {table_size} exceeds available data {}",
                data.len()
            )));
        }

        let schema_size = rows_offset.checked_sub(HEADER_SIZE).ok_or_else(|| {
            Error::HeaderMalformed(format!("rows_offset {rows_offset} precedes header"))
        })?;
        let rows_size = strings_offset.checked_sub(rows_offset).ok_or_else(|| {
            Error::HeaderMalformed(format!(
                "strings_offset {strings_offset} precedes rows_offset {rows_offset}"
            ))
        })?;
        if rows_size < u64::from(rows_count) * u64::from(row_width) {
            return Err(Error::HeaderMalformed(format!(
                "rows_size {rows_size} smaller than rows_count*row_width {}",
                u64::from(rows_count) * u64::from(row_width)
            )));
        }
        let strings_size = blobs_offset.checked_sub(strings_offset).ok_or_else(|| {
            Error::HeaderMalformed(format!(
                "blobs_offset {blobs_offset} precedes strings_offset {strings_offset}"
            ))
        })?;
        if strings_size < table_name_offset + 1 {
            return Err(Error::HeaderMalformed(format!(
                "strings_size {strings_size} too small for table_name_offset {table_name_offset}"
            )));
        }
        let blobs_size = table_size.checked_sub(blobs_offset).ok_or_else(|| {
            Error::HeaderMalformed(format!(
                "table_size {table_size} precedes blobs_offset {blobs_offset}"
            ))
        })?;
        let _ = blobs_size;

        let schema_region = cursor.read_bytes(schema_size as usize)?;
        let rows_region = cursor.slice(rows_offset as usize, rows_size as usize)?;
        let rows_region = rows_region.as_slice();
        let strings_region =
            cursor.slice(strings_offset as usize, strings_size as usize)?.as_slice();
        let blobs_region = cursor
            .slice(blobs_offset as usize, (table_size - blobs_offset) as usize)?
            .as_slice();

        let table_name = read_string(strings_region, table_name_offset as usize, options.encoding)?;

        let mut schema_cursor = ByteCursor::new(schema_region);
        let mut offset_in_row: u32 = 0;
        let mut columns = Vec::with_capacity(columns_count as usize);

        for _ in 0..columns_count {
            let info = schema_cursor.read_u8()?;
            let name_offset = schema_cursor.read_u32_be()?;
            let storage = ColumnStorage::from_flag(info >> 4)?;
            let value_type = ValueType::from_tag(info & 0x0F)?;
            let name = read_string(strings_region, name_offset as usize, options.encoding)?;

            let data = match storage {
                ColumnStorage::NameOnly => ColumnData::NameOnly,
                ColumnStorage::Constant => {
                    let raw = read_one(
                        &mut schema_cursor,
                        value_type,
                        strings_region,
                        blobs_region,
                        options.encoding,
                    )?;
                    ColumnData::Constant(match raw {
                        RawValue::Scalar(v) => v,
                        RawValue::Blob(bytes) => {
                            resolve_blob(bytes, options, depth)?
                        }
                    })
                }
                ColumnStorage::PerRow => {
                    let width = value_type.encoded_width() as u32;
                    let column_row_offset = offset_in_row;
                    offset_in_row += width;
                    if offset_in_row > u32::from(row_width) {
                        return Err(Error::HeaderMalformed(format!(
                            "row offset {offset_in_row} exceeds row_width {row_width}"
                        )));
                    }

                    if value_type == ValueType::Blob {
                        let mut raw_rows = Vec::with_capacity(rows_count as usize);
                        for row_idx in 0..rows_count {
                            let pos = row_idx as usize * row_width as usize
                                + column_row_offset as usize;
                            let mut row_cursor = ByteCursor::new(rows_region);
                            row_cursor.seek(pos)?;
                            let offset = row_cursor.read_u32_be()? as usize;
                            let size = row_cursor.read_u32_be()? as usize;
                            raw_rows.push(read_blob(blobs_region, offset, size)?.to_vec());
                        }
                        let is_table = !raw_rows.is_empty()
                            && depth < options.max_depth
                            && looks_like_nested_table(&raw_rows[0]);
                        let values = if is_table {
                            raw_rows
                                .into_iter()
                                .map(|bytes| {
                                    UtfTable::parse_at(&bytes, options, depth + 1)
                                        .map(|t| ColumnValue::BlobOfTable(Box::new(t)))
                                })
                                .collect::<Result<Vec<_>>>()?
                        } else {
                            raw_rows.into_iter().map(ColumnValue::Blob).collect()
                        };
                        ColumnData::PerRow(values)
                    } else {
                        let mut values = Vec::with_capacity(rows_count as usize);
                        for row_idx in 0..rows_count {
                            let pos = row_idx as usize * row_width as usize
                                + column_row_offset as usize;
                            let mut row_cursor = ByteCursor::new(rows_region);
                            row_cursor.seek(pos)?;
                            match read_one(
                                &mut row_cursor,
                                value_type,
                                strings_region,
                                blobs_region,
                                options.encoding,
                            )? {
                                RawValue::Scalar(v) => values.push(v),
                                RawValue::Blob(_) => unreachable!("non-blob value_type"),
                            }
                        }
                        ColumnData::PerRow(values)
                    }
                }
            };

            columns.push(UtfColumn {
                name,
                value_type,
                data,
            });
        }

        Ok(Self {
            table_name,
            version,
            rows_count,
            columns,
        })
    }

    /// Build this table into a self-contained `@UTF` byte sequence.
    pub fn build(&self, options: BuildOptions) -> Result<Vec<u8>> {
        let mut schema = ByteWriter::new();
        let mut strings = StringPool::new(options.encoding);
        let mut blobs = BlobPool::new(options.blob_alignment);
        let mut row_buffers: Vec<ByteWriter> =
            (0..self.rows_count).map(|_| ByteWriter::new()).collect();

        let table_name_offset = strings.intern(&self.table_name)?;

        for column in &self.columns {
            let name_offset = strings.intern(&column.name)?;
            schema.write_u8((column.storage().to_flag() << 4) | column.value_type.to_tag());
            schema.write_u32_be(name_offset);

            match &column.data {
                ColumnData::NameOnly => {}
                ColumnData::Constant(value) => {
                    Self::write_value(&mut schema, &mut strings, &mut blobs, value, options)?;
                }
                ColumnData::PerRow(values) => {
                    for (idx, value) in values.iter().enumerate() {
                        if let Some(buf) = row_buffers.get_mut(idx) {
                            Self::write_value(buf, &mut strings, &mut blobs, value, options)?;
                        }
                    }
                }
            }
        }

        let row_width = row_buffers.first().map_or(0, ByteWriter::len);
        for (idx, buf) in row_buffers.iter().enumerate() {
            if buf.len() != row_width {
                return Err(Error::RowWidthMismatch {
                    row: idx,
                    actual: buf.len(),
                    expected: row_width,
                });
            }
        }

        let mut rows = ByteWriter::new();
        for buf in &row_buffers {
            rows.write_bytes(buf.as_slice());
        }

        let schema_size = schema.len() as u64;
        let rows_size = rows.len() as u64;
        let rows_offset = HEADER_SIZE + schema_size;
        let strings_offset = rows_offset + rows_size;

        let mut strings_bytes = strings.into_bytes();
        if let Some(alignment) = options.blob_alignment {
            let unpadded_blobs_offset = strings_offset + strings_bytes.len() as u64;
            let padded_blobs_offset = round_up(unpadded_blobs_offset, u64::from(alignment));
            strings_bytes.resize((padded_blobs_offset - strings_offset) as usize, 0);
        }

        let blobs_offset = strings_offset + strings_bytes.len() as u64;
        let blobs_bytes = blobs.into_bytes();
        let table_size = blobs_offset + blobs_bytes.len() as u64;

        let mut header = ByteWriter::new();
        header.write_bytes(MAGIC.as_slice());
        header.write_u32_be((table_size - 8) as u32);
        header.write_u16_be(self.version);
        header.write_u16_be((rows_offset - 8) as u16);
        header.write_u32_be((strings_offset - 8) as u32);
        header.write_u32_be((blobs_offset - 8) as u32);
        header.write_u32_be(table_name_offset);
        header.write_u16_be(self.columns.len() as u16);
        header.write_u16_be(row_width as u16);
        header.write_u32_be(self.rows_count);

        let mut out = header.into_inner();
        out.extend_from_slice(schema.as_slice());
        out.extend_from_slice(rows.as_slice());
        out.extend_from_slice(&strings_bytes);
        out.extend_from_slice(&blobs_bytes);
        Ok(out)
    }

    fn write_value(
        writer: &mut ByteWriter,
        strings: &mut StringPool,
        blobs: &mut BlobPool,
        value: &ColumnValue,
        options: BuildOptions,
    ) -> Result<()> {
        match value {
            ColumnValue::U8(v) => writer.write_u8(*v),
            ColumnValue::S8(v) => writer.write_i8(*v),
            ColumnValue::U16(v) => writer.write_u16_be(*v),
            ColumnValue::S16(v) => writer.write_i16_be(*v),
            ColumnValue::U32(v) => writer.write_u32_be(*v),
            ColumnValue::S32(v) => writer.write_i32_be(*v),
            ColumnValue::U64(v) => writer.write_u64_be(*v),
            ColumnValue::S64(v) => writer.write_i64_be(*v),
            ColumnValue::F32(v) => writer.write_f32_be(*v),
            ColumnValue::F64(v) => writer.write_f64_be(*v),
            ColumnValue::String(s) => {
                let offset = strings.intern(s)?;
                writer.write_u32_be(offset);
            }
            ColumnValue::Blob(bytes) => {
                let (offset, size) = blobs.append(bytes);
                writer.write_u32_be(offset);
                writer.write_u32_be(size);
            }
            ColumnValue::BlobOfTable(nested) => {
                let bytes = nested.build(options)?;
                let (offset, size) = blobs.append(&bytes);
                writer.write_u32_be(offset);
                writer.write_u32_be(size);
            }
            ColumnValue::U128(_) => {
                return Err(Error::UnsupportedValueType(
                    "U128 has no confirmed on-disk encoding".to_string(),
                ))
            }
        }
        Ok(())
    }

    /// Build a name-to-index map, failing on duplicate names other than the
    /// `"Non"` sentinel.
    pub fn column_names(&self) -> Result<HashMap<&str, usize>> {
        let mut map = HashMap::with_capacity(self.columns.len());
        for (idx, column) in self.columns.iter().enumerate() {
            if map.insert(column.name.as_str(), idx).is_some() && column.name != "Non" {
                return Err(Error::DuplicateColumnName(column.name.clone()));
            }
        }
        Ok(map)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&UtfColumn> {
        let idx = *self
            .column_names()?
            .get(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        Ok(&self.columns[idx])
    }

    /// Read the logical value of column `name` at `row_idx`: `None` for a
    /// `NameOnly` column, the shared value for `Constant`, or that row's
    /// value for `PerRow`.
    pub fn row_value(&self, name: &str, row_idx: u32) -> Result<Option<&ColumnValue>> {
        if row_idx >= self.rows_count {
            return Err(Error::RowIndexOutOfRange {
                index: row_idx,
                rows_count: self.rows_count,
            });
        }
        let column = self.column(name)?;
        Ok(match &column.data {
            ColumnData::NameOnly => None,
            ColumnData::Constant(value) => Some(value),
            ColumnData::PerRow(values) => values.get(row_idx as usize),
        })
    }
}

fn resolve_blob(bytes: Vec<u8>, options: ParseOptions, depth: u32) -> Result<ColumnValue> {
    if depth < options.max_depth && looks_like_nested_table(&bytes) {
        let nested = UtfTable::parse_at(&bytes, options, depth + 1)?;
        Ok(ColumnValue::BlobOfTable(Box::new(nested)))
    } else {
        Ok(ColumnValue::Blob(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn const_u32_table() -> UtfTable {
        UtfTable {
            table_name: "T".to_string(),
            version: 1,
            rows_count: 0,
            columns: vec![UtfColumn {
                name: "n".to_string(),
                value_type: ValueType::U32,
                data: ColumnData::Constant(ColumnValue::U32(0xCAFE_BABE)),
            }],
        }
    }

    #[test]
    fn minimum_table_round_trips() {
        let table = UtfTable {
            table_name: "T".to_string(),
            version: 1,
            rows_count: 0,
            columns: vec![],
        };
        let bytes = table.build(BuildOptions::default()).unwrap();
        assert_eq!(&bytes[0..4], b"@UTF");
        assert_eq!(bytes.len(), 0x21);
        let parsed = UtfTable::parse(&bytes, ParseOptions::default()).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn constant_u32_column_round_trips() {
        let table = const_u32_table();
        let bytes = table.build(BuildOptions::default()).unwrap();
        let parsed = UtfTable::parse(&bytes, ParseOptions::default()).unwrap();
        assert_eq!(parsed, table);
        assert_eq!(
            parsed.column("n").unwrap().data,
            ColumnData::Constant(ColumnValue::U32(0xCAFE_BABE))
        );
    }

    #[test]
    fn per_row_string_column_dedupes_repeats() {
        let table = UtfTable {
            table_name: "T".to_string(),
            version: 0,
            rows_count: 3,
            columns: vec![UtfColumn {
                name: "k".to_string(),
                value_type: ValueType::String,
                data: ColumnData::PerRow(vec![
                    ColumnValue::String("a".to_string()),
                    ColumnValue::String("a".to_string()),
                    ColumnValue::String("b".to_string()),
                ]),
            }],
        };
        let bytes = table.build(BuildOptions::default()).unwrap();
        // "T\0k\0a\0b\0" -- no duplicate "a" entry.
        assert_eq!(&bytes[bytes.len() - 8..], b"T\0k\0a\0b\0");
        let parsed = UtfTable::parse(&bytes, ParseOptions::default()).unwrap();
        assert_eq!(parsed.row_value("k", 0).unwrap(), Some(&ColumnValue::String("a".into())));
        assert_eq!(parsed.row_value("k", 1).unwrap(), Some(&ColumnValue::String("a".into())));
        assert_eq!(parsed.row_value("k", 2).unwrap(), Some(&ColumnValue::String("b".into())));
    }

    #[test]
    fn nested_blob_table_is_recognised_within_depth() {
        let inner = UtfTable {
            table_name: "T".to_string(),
            version: 1,
            rows_count: 0,
            columns: vec![],
        };
        let inner_bytes = inner.build(BuildOptions::default()).unwrap();
        let outer = UtfTable {
            table_name: "Outer".to_string(),
            version: 0,
            rows_count: 0,
            columns: vec![UtfColumn {
                name: "blob".to_string(),
                value_type: ValueType::Blob,
                data: ColumnData::Constant(ColumnValue::Blob(inner_bytes)),
            }],
        };
        let bytes = outer.build(BuildOptions::default()).unwrap();

        let parsed = UtfTable::parse(&bytes, ParseOptions::default()).unwrap();
        match &parsed.column("blob").unwrap().data {
            ColumnData::Constant(ColumnValue::BlobOfTable(nested)) => {
                assert_eq!(nested.table_name, "T");
            }
            other => panic!("expected BlobOfTable, got {other:?}"),
        }

        let shallow = UtfTable::parse(
            &bytes,
            ParseOptions {
                max_depth: 0,
                ..ParseOptions::default()
            },
        )
        .unwrap();
        match &shallow.column("blob").unwrap().data {
            ColumnData::Constant(ColumnValue::Blob(_)) => {}
            other => panic!("expected raw Blob at depth limit 0, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_column_names_are_rejected_except_non() {
        let table = UtfTable {
            table_name: "T".to_string(),
            version: 0,
            rows_count: 0,
            columns: vec![
                UtfColumn {
                    name: "dup".to_string(),
                    value_type: ValueType::U8,
                    data: ColumnData::Constant(ColumnValue::U8(1)),
                },
                UtfColumn {
                    name: "dup".to_string(),
                    value_type: ValueType::U8,
                    data: ColumnData::Constant(ColumnValue::U8(2)),
                },
            ],
        };
        assert!(matches!(
            table.column("dup"),
            Err(Error::DuplicateColumnName(_))
        ));

        let tolerated = UtfTable {
            table_name: "T".to_string(),
            version: 0,
            rows_count: 0,
            columns: vec![
                UtfColumn {
                    name: "Non".to_string(),
                    value_type: ValueType::U8,
                    data: ColumnData::NameOnly,
                },
                UtfColumn {
                    name: "Non".to_string(),
                    value_type: ValueType::U8,
                    data: ColumnData::NameOnly,
                },
            ],
        };
        assert!(tolerated.column_names().is_ok());
    }

    #[test]
    fn row_width_mismatch_is_rejected() {
        let table = UtfTable {
            table_name: "T".to_string(),
            version: 0,
            rows_count: 2,
            columns: vec![UtfColumn {
                name: "a".to_string(),
                value_type: ValueType::U8,
                data: ColumnData::PerRow(vec![ColumnValue::U8(1)]),
            }],
        };
        assert!(matches!(
            table.build(BuildOptions::default()),
            Err(Error::RowWidthMismatch { .. })
        ));
    }

    #[test]
    fn u128_is_accepted_on_parse_but_rejected_on_build() {
        let table = UtfTable {
            table_name: "T".to_string(),
            version: 0,
            rows_count: 0,
            columns: vec![UtfColumn {
                name: "guid".to_string(),
                value_type: ValueType::U128,
                data: ColumnData::Constant(ColumnValue::U128([0xAB; 16])),
            }],
        };
        assert!(matches!(
            table.build(BuildOptions::default()),
            Err(Error::UnsupportedValueType(_))
        ));
    }

    #[test]
    fn encrypted_header_is_rejected() {
        let mut bytes = vec![0x1F, 0x9E, 0xF3, 0xF5];
        bytes.extend_from_slice(&[0u8; 28]);
        assert!(matches!(
            UtfTable::parse(&bytes, ParseOptions::default()),
            Err(Error::EncryptedTable)
        ));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let bytes = vec![0u8; 32];
        assert!(matches!(
            UtfTable::parse(&bytes, ParseOptions::default()),
            Err(Error::BadMagic { .. })
        ));
    }

    #[test]
    fn recursion_guard_rejects_depth_beyond_limit() {
        let bytes = const_u32_table().build(BuildOptions::default()).unwrap();
        assert!(matches!(
            UtfTable::parse_at(&bytes, ParseOptions { max_depth: 1, ..Default::default() }, 5),
            Err(Error::RecursionDepthExceeded { .. })
        ));
    }
}
