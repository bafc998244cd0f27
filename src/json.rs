//! JSON representation of a parsed `@UTF` table (§4.5, §6).
//!
//! A table maps to an object `{tableName, version, rowsCount, columnsCount,
//! columns}`; each column carries its `dataFlag`/`valueType`/`columnName`
//! plus `columnDataConstant` or `columnDataRows`. Blobs become standard
//! (non-URL) base64 strings; a blob recognised as a nested table during
//! parse nests the sub-object directly under the pseudo-tag
//! `COLUMN_TYPE_VLDATA_UTFTABLE` instead of being base64-encoded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::utf::table::{ColumnData, UtfColumn, UtfTable};
use crate::utf::value::{ColumnStorage, ColumnValue, ValueType};

const VLDATA_UTFTABLE_TAG: &str = "COLUMN_TYPE_VLDATA_UTFTABLE";

impl UtfTable {
    /// Map this table to its canonical JSON value tree.
    #[must_use]
    pub fn to_json(&self) -> Value {
        table_to_json(self)
    }

    /// Rebuild a table from its canonical JSON value tree.
    pub fn from_json(value: &Value) -> Result<Self> {
        table_from_json(value)
    }

    /// Render this table's JSON representation as text.
    ///
    /// A thin wrapper around `serde_json`'s own serializer; this crate does
    /// no file I/O of its own (§4.5).
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.to_json())
            .map_err(|_| Error::EncodingError { offset: 0 })
    }

    /// Parse a table from its JSON text representation.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|_| Error::EncodingError { offset: 0 })?;
        Self::from_json(&value)
    }
}

fn table_to_json(table: &UtfTable) -> Value {
    let mut obj = Map::new();
    obj.insert("tableName".into(), Value::String(table.table_name.clone()));
    obj.insert("version".into(), Value::from(table.version));
    obj.insert("rowsCount".into(), Value::from(table.rows_count));
    obj.insert("columnsCount".into(), Value::from(table.columns.len() as u32));
    obj.insert(
        "columns".into(),
        Value::Array(table.columns.iter().map(column_to_json).collect()),
    );
    Value::Object(obj)
}

fn column_carries_table(column: &UtfColumn) -> bool {
    match &column.data {
        ColumnData::Constant(ColumnValue::BlobOfTable(_)) => true,
        ColumnData::PerRow(values) => {
            values.iter().any(|v| matches!(v, ColumnValue::BlobOfTable(_)))
        }
        _ => false,
    }
}

fn column_to_json(column: &UtfColumn) -> Value {
    let mut obj = Map::new();
    obj.insert("dataFlag".into(), Value::from(column.storage().to_flag()));
    let value_type = if column_carries_table(column) {
        VLDATA_UTFTABLE_TAG
    } else {
        column.value_type.json_tag()
    };
    obj.insert("valueType".into(), Value::String(value_type.to_string()));
    obj.insert("columnName".into(), Value::String(column.name.clone()));

    match &column.data {
        ColumnData::NameOnly => {}
        ColumnData::Constant(value) => {
            obj.insert("columnDataConstant".into(), value_to_json(value));
        }
        ColumnData::PerRow(values) => {
            obj.insert(
                "columnDataRows".into(),
                Value::Array(values.iter().map(value_to_json).collect()),
            );
        }
    }
    Value::Object(obj)
}

fn value_to_json(value: &ColumnValue) -> Value {
    match value {
        ColumnValue::U8(v) => Value::from(*v),
        ColumnValue::S8(v) => Value::from(*v),
        ColumnValue::U16(v) => Value::from(*v),
        ColumnValue::S16(v) => Value::from(*v),
        ColumnValue::U32(v) => Value::from(*v),
        ColumnValue::S32(v) => Value::from(*v),
        ColumnValue::U64(v) => Value::from(*v),
        ColumnValue::S64(v) => Value::from(*v),
        ColumnValue::F32(v) => Value::from(f64::from(*v)),
        ColumnValue::F64(v) => Value::from(*v),
        ColumnValue::String(s) => Value::String(s.clone()),
        ColumnValue::Blob(bytes) => Value::String(STANDARD.encode(bytes)),
        ColumnValue::BlobOfTable(nested) => table_to_json(nested),
        ColumnValue::U128(bytes) => Value::String(STANDARD.encode(bytes)),
    }
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| Error::HeaderMalformed(format!("missing JSON field {key:?}")))
}

fn as_str<'a>(value: &'a Value, key: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| Error::HeaderMalformed(format!("field {key:?} is not a string")))
}

fn as_u64(value: &Value, key: &str) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| Error::HeaderMalformed(format!("field {key:?} is not an unsigned integer")))
}

fn table_from_json(value: &Value) -> Result<UtfTable> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::HeaderMalformed("table JSON is not an object".to_string()))?;

    let table_name = as_str(field(obj, "tableName")?, "tableName")?.to_string();
    let version = as_u64(field(obj, "version")?, "version")? as u16;
    let rows_count = as_u64(field(obj, "rowsCount")?, "rowsCount")? as u32;
    let columns_json = field(obj, "columns")?
        .as_array()
        .ok_or_else(|| Error::HeaderMalformed("field \"columns\" is not an array".to_string()))?;

    let columns = columns_json
        .iter()
        .map(|c| column_from_json(c, rows_count))
        .collect::<Result<Vec<_>>>()?;

    Ok(UtfTable {
        table_name,
        version,
        rows_count,
        columns,
    })
}

fn column_from_json(value: &Value, rows_count: u32) -> Result<UtfColumn> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::HeaderMalformed("column JSON is not an object".to_string()))?;

    let flag = as_u64(field(obj, "dataFlag")?, "dataFlag")? as u8;
    let storage = ColumnStorage::from_flag(flag)?;
    let name = as_str(field(obj, "columnName")?, "columnName")?.to_string();
    let tag = as_str(field(obj, "valueType")?, "valueType")?;

    let (value_type, carries_table) = if tag == VLDATA_UTFTABLE_TAG {
        (ValueType::Blob, true)
    } else {
        (ValueType::from_json_tag(tag)?, false)
    };

    let data = match storage {
        ColumnStorage::NameOnly => ColumnData::NameOnly,
        ColumnStorage::Constant => {
            let raw = field(obj, "columnDataConstant")?;
            ColumnData::Constant(value_from_json(raw, value_type, carries_table)?)
        }
        ColumnStorage::PerRow => {
            let raw = field(obj, "columnDataRows")?
                .as_array()
                .ok_or_else(|| Error::HeaderMalformed("\"columnDataRows\" is not an array".to_string()))?;
            if raw.len() != rows_count as usize {
                return Err(Error::HeaderMalformed(format!(
                    "column {name:?} has {} rows, expected {rows_count}",
                    raw.len()
                )));
            }
            let values = raw
                .iter()
                .map(|v| value_from_json(v, value_type, carries_table))
                .collect::<Result<Vec<_>>>()?;
            ColumnData::PerRow(values)
        }
    };

    Ok(UtfColumn {
        name,
        value_type,
        data,
    })
}

fn decode_base64(value: &Value) -> Result<Vec<u8>> {
    let s = value
        .as_str()
        .ok_or_else(|| Error::HeaderMalformed("expected base64 string".to_string()))?;
    STANDARD
        .decode(s)
        .map_err(|_| Error::EncodingError { offset: 0 })
}

fn value_from_json(value: &Value, value_type: ValueType, carries_table: bool) -> Result<ColumnValue> {
    if carries_table {
        return Ok(ColumnValue::BlobOfTable(Box::new(table_from_json(value)?)));
    }

    Ok(match value_type {
        ValueType::U8 => ColumnValue::U8(as_u64(value, "columnData")? as u8),
        ValueType::S8 => ColumnValue::S8(value
            .as_i64()
            .ok_or_else(|| Error::HeaderMalformed("expected signed integer".to_string()))? as i8),
        ValueType::U16 => ColumnValue::U16(as_u64(value, "columnData")? as u16),
        ValueType::S16 => ColumnValue::S16(value
            .as_i64()
            .ok_or_else(|| Error::HeaderMalformed("expected signed integer".to_string()))? as i16),
        ValueType::U32 => ColumnValue::U32(as_u64(value, "columnData")? as u32),
        ValueType::S32 => ColumnValue::S32(value
            .as_i64()
            .ok_or_else(|| Error::HeaderMalformed("expected signed integer".to_string()))? as i32),
        ValueType::U64 => ColumnValue::U64(as_u64(value, "columnData")?),
        ValueType::S64 => ColumnValue::S64(value
            .as_i64()
            .ok_or_else(|| Error::HeaderMalformed("expected signed integer".to_string()))?),
        ValueType::F32 => ColumnValue::F32(value
            .as_f64()
            .ok_or_else(|| Error::HeaderMalformed("expected float".to_string()))? as f32),
        ValueType::F64 => ColumnValue::F64(value
            .as_f64()
            .ok_or_else(|| Error::HeaderMalformed("expected float".to_string()))?),
        ValueType::String => ColumnValue::String(
            value
                .as_str()
                .ok_or_else(|| Error::HeaderMalformed("expected string".to_string()))?
                .to_string(),
        ),
        ValueType::Blob => ColumnValue::Blob(decode_base64(value)?),
        ValueType::U128 => {
            let bytes = decode_base64(value)?;
            let array: [u8; 16] = bytes
                .try_into()
                .map_err(|_| Error::HeaderMalformed("expected 16-byte base64 value".to_string()))?;
            ColumnValue::U128(array)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utf::table::{BuildOptions, ParseOptions};

    fn sample_table() -> UtfTable {
        UtfTable {
            table_name: "T".to_string(),
            version: 3,
            rows_count: 2,
            columns: vec![
                UtfColumn {
                    name: "id".to_string(),
                    value_type: ValueType::U32,
                    data: ColumnData::PerRow(vec![ColumnValue::U32(1), ColumnValue::U32(2)]),
                },
                UtfColumn {
                    name: "tag".to_string(),
                    value_type: ValueType::String,
                    data: ColumnData::Constant(ColumnValue::String("v".to_string())),
                },
                UtfColumn {
                    name: "Non".to_string(),
                    value_type: ValueType::U8,
                    data: ColumnData::NameOnly,
                },
            ],
        }
    }

    #[test]
    fn round_trips_through_json() {
        let table = sample_table();
        let json = table.to_json();
        let back = UtfTable::from_json(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn json_text_round_trips() {
        let table = sample_table();
        let text = table.to_json_string().unwrap();
        let back = UtfTable::from_json_str(&text).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn blob_column_is_base64_in_json() {
        let table = UtfTable {
            table_name: "T".to_string(),
            version: 0,
            rows_count: 0,
            columns: vec![UtfColumn {
                name: "b".to_string(),
                value_type: ValueType::Blob,
                data: ColumnData::Constant(ColumnValue::Blob(vec![1, 2, 3])),
            }],
        };
        let json = table.to_json();
        let constant = &json["columns"][0]["columnDataConstant"];
        assert_eq!(constant.as_str().unwrap(), STANDARD.encode([1, 2, 3]));
        let back = UtfTable::from_json(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn nested_table_uses_vldata_utftable_tag() {
        let inner = UtfTable {
            table_name: "Inner".to_string(),
            version: 0,
            rows_count: 0,
            columns: vec![],
        };
        let outer = UtfTable {
            table_name: "Outer".to_string(),
            version: 0,
            rows_count: 0,
            columns: vec![UtfColumn {
                name: "nested".to_string(),
                value_type: ValueType::Blob,
                data: ColumnData::Constant(ColumnValue::BlobOfTable(Box::new(inner))),
            }],
        };
        let json = outer.to_json();
        assert_eq!(
            json["columns"][0]["valueType"].as_str().unwrap(),
            VLDATA_UTFTABLE_TAG
        );
        assert_eq!(json["columns"][0]["columnDataConstant"]["tableName"], "Inner");
        let back = UtfTable::from_json(&json).unwrap();
        assert_eq!(back, outer);
    }

    #[test]
    fn json_bridge_agrees_with_binary_round_trip() {
        let table = sample_table();
        let bytes = table.build(BuildOptions::default()).unwrap();
        let parsed = UtfTable::parse(&bytes, ParseOptions::default()).unwrap();
        assert_eq!(parsed.to_json(), table.to_json());
    }
}
