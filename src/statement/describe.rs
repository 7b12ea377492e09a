use serde::{Deserialize, Serialize};

use crate::error::WirebindError;
use crate::protocol::{ColumnMeta, ProtocolDiag, StatementHandle};
use crate::types::ColumnType;
use crate::wire::WireType;

/// Description of one result column in the abstract taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
    /// Declared length in bytes; 0 when the protocol cannot bound it.
    pub declared_size: usize,
}

/// Cached result-set metadata, populated on first describe and invalidated
/// only by re-prepare.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultShape {
    columns: Vec<ColumnInfo>,
}

impl ResultShape {
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column at 1-based `position`.
    #[must_use]
    pub fn column(&self, position: usize) -> Option<&ColumnInfo> {
        position.checked_sub(1).and_then(|i| self.columns.get(i))
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }
}

/// Fixed mapping from wire column families to the abstract taxonomy.
/// Everything outside the listed families, including all character kinds,
/// falls back to `Text`.
#[must_use]
pub fn map_wire_type(wire: WireType) -> ColumnType {
    match wire {
        WireType::Date | WireType::Time | WireType::Timestamp => ColumnType::Date,
        WireType::Double | WireType::Decimal | WireType::Float => ColumnType::Double,
        WireType::Tiny | WireType::Short | WireType::Long => ColumnType::Integer,
        WireType::LongLong => ColumnType::BigInt,
        WireType::VarChar | WireType::VarString | WireType::String | WireType::Blob => {
            ColumnType::Text
        }
    }
}

/// Caches one statement's column metadata between re-prepares. All the
/// fields are queried once and served from the cache afterwards.
#[derive(Debug, Default)]
pub(crate) struct ColumnDescriber {
    shape: Option<ResultShape>,
}

impl ColumnDescriber {
    /// Query and cache the metadata. Returns the column count.
    pub(crate) fn prepare_for_describe<H: StatementHandle>(
        &mut self,
        handle: &mut H,
    ) -> Result<usize, ProtocolDiag> {
        if self.shape.is_none() {
            let raw = handle.result_metadata()?;
            let columns = raw
                .into_iter()
                .map(|meta| ColumnInfo {
                    name: meta.name,
                    column_type: map_wire_type(meta.wire_type),
                    declared_size: meta.length,
                })
                .collect();
            self.shape = Some(ResultShape { columns });
        }
        Ok(self
            .shape
            .as_ref()
            .map_or(0, ResultShape::column_count))
    }

    pub(crate) fn shape(&self) -> Option<&ResultShape> {
        self.shape.as_ref()
    }

    /// Cached description of a 1-based column. Calling this before a
    /// successful describe is a usage-contract violation.
    pub(crate) fn describe_column(&self, position: usize) -> Result<&ColumnInfo, WirebindError> {
        let shape = self.shape.as_ref().ok_or_else(|| {
            WirebindError::InternalError(
                "prepare_for_describe not called before describe_column".into(),
            )
        })?;
        shape.column(position).ok_or_else(|| {
            WirebindError::InternalError(format!(
                "getting description of column at position {position}"
            ))
        })
    }

    /// Declared byte width of a 1-based column.
    pub(crate) fn column_size(&self, position: usize) -> Result<usize, WirebindError> {
        let shape = self.shape.as_ref().ok_or_else(|| {
            WirebindError::InternalError(
                "prepare_for_describe not called before column_size".into(),
            )
        })?;
        shape
            .column(position)
            .map(|c| c.declared_size)
            .ok_or_else(|| {
                WirebindError::InternalError(format!(
                    "getting description of column at position {position}"
                ))
            })
    }

    /// Drop the cache; the next describe re-queries the protocol.
    pub(crate) fn invalidate(&mut self) {
        self.shape = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_table_matches_the_fixed_families() {
        assert_eq!(map_wire_type(WireType::Date), ColumnType::Date);
        assert_eq!(map_wire_type(WireType::Time), ColumnType::Date);
        assert_eq!(map_wire_type(WireType::Timestamp), ColumnType::Date);
        assert_eq!(map_wire_type(WireType::Float), ColumnType::Double);
        assert_eq!(map_wire_type(WireType::Decimal), ColumnType::Double);
        assert_eq!(map_wire_type(WireType::Tiny), ColumnType::Integer);
        assert_eq!(map_wire_type(WireType::Long), ColumnType::Integer);
        assert_eq!(map_wire_type(WireType::LongLong), ColumnType::BigInt);
        assert_eq!(map_wire_type(WireType::VarString), ColumnType::Text);
        assert_eq!(map_wire_type(WireType::Blob), ColumnType::Text);
    }

    #[test]
    fn column_lookup_before_describe_is_an_internal_error() {
        let describer = ColumnDescriber::default();
        assert!(matches!(
            describer.column_size(1),
            Err(WirebindError::InternalError(_))
        ));
        assert!(matches!(
            describer.describe_column(1),
            Err(WirebindError::InternalError(_))
        ));
    }
}
