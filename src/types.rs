use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Abstract tag for a bound value's semantic type.
///
/// `Statement`, `RowId` and `Blob` are opaque handle kinds: part of the
/// taxonomy, but no buffer-based binder accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeType {
    Int16,
    Int32,
    Int64,
    UInt64,
    Double,
    /// Single byte character.
    Char,
    Text,
    LongText,
    XmlText,
    Timestamp,
    Statement,
    RowId,
    Blob,
}

impl ExchangeType {
    /// Text kinds share the string wire path.
    #[must_use]
    pub fn is_text(self) -> bool {
        matches!(
            self,
            ExchangeType::Text | ExchangeType::LongText | ExchangeType::XmlText
        )
    }

    /// Opaque handle kinds that cannot travel through exchange buffers.
    #[must_use]
    pub fn is_opaque(self) -> bool {
        matches!(
            self,
            ExchangeType::Statement | ExchangeType::RowId | ExchangeType::Blob
        )
    }
}

/// One scalar exchange value.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeValue {
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    Char(u8),
    Text(String),
    LongText(String),
    XmlText(String),
    Timestamp(NaiveDateTime),
}

impl ExchangeValue {
    #[must_use]
    pub fn exchange_type(&self) -> ExchangeType {
        match self {
            ExchangeValue::Int16(_) => ExchangeType::Int16,
            ExchangeValue::Int32(_) => ExchangeType::Int32,
            ExchangeValue::Int64(_) => ExchangeType::Int64,
            ExchangeValue::UInt64(_) => ExchangeType::UInt64,
            ExchangeValue::Double(_) => ExchangeType::Double,
            ExchangeValue::Char(_) => ExchangeType::Char,
            ExchangeValue::Text(_) => ExchangeType::Text,
            ExchangeValue::LongText(_) => ExchangeType::LongText,
            ExchangeValue::XmlText(_) => ExchangeType::XmlText,
            ExchangeValue::Timestamp(_) => ExchangeType::Timestamp,
        }
    }

    #[must_use]
    pub fn as_int16(&self) -> Option<i16> {
        if let ExchangeValue::Int16(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_int32(&self) -> Option<i32> {
        if let ExchangeValue::Int32(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_int64(&self) -> Option<i64> {
        if let ExchangeValue::Int64(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_uint64(&self) -> Option<u64> {
        if let ExchangeValue::UInt64(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        if let ExchangeValue::Double(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_char(&self) -> Option<u8> {
        if let ExchangeValue::Char(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Text of any of the three string kinds.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExchangeValue::Text(value)
            | ExchangeValue::LongText(value)
            | ExchangeValue::XmlText(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let ExchangeValue::Timestamp(value) = self {
            Some(*value)
        } else {
            None
        }
    }
}

/// One homogeneous vector of exchange values, for bulk binding.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorValue {
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Double(Vec<f64>),
    Char(Vec<u8>),
    Text(Vec<String>),
    LongText(Vec<String>),
    XmlText(Vec<String>),
    Timestamp(Vec<NaiveDateTime>),
}

impl VectorValue {
    /// Freshly initialized vector of `len` default elements; `None` for
    /// opaque handle kinds.
    #[must_use]
    pub fn with_len(ty: ExchangeType, len: usize) -> Option<VectorValue> {
        Some(match ty {
            ExchangeType::Int16 => VectorValue::Int16(vec![0; len]),
            ExchangeType::Int32 => VectorValue::Int32(vec![0; len]),
            ExchangeType::Int64 => VectorValue::Int64(vec![0; len]),
            ExchangeType::UInt64 => VectorValue::UInt64(vec![0; len]),
            ExchangeType::Double => VectorValue::Double(vec![0.0; len]),
            ExchangeType::Char => VectorValue::Char(vec![0; len]),
            ExchangeType::Text => VectorValue::Text(vec![String::new(); len]),
            ExchangeType::LongText => VectorValue::LongText(vec![String::new(); len]),
            ExchangeType::XmlText => VectorValue::XmlText(vec![String::new(); len]),
            ExchangeType::Timestamp => {
                VectorValue::Timestamp(vec![NaiveDateTime::default(); len])
            }
            ExchangeType::Statement | ExchangeType::RowId | ExchangeType::Blob => return None,
        })
    }

    #[must_use]
    pub fn exchange_type(&self) -> ExchangeType {
        match self {
            VectorValue::Int16(_) => ExchangeType::Int16,
            VectorValue::Int32(_) => ExchangeType::Int32,
            VectorValue::Int64(_) => ExchangeType::Int64,
            VectorValue::UInt64(_) => ExchangeType::UInt64,
            VectorValue::Double(_) => ExchangeType::Double,
            VectorValue::Char(_) => ExchangeType::Char,
            VectorValue::Text(_) => ExchangeType::Text,
            VectorValue::LongText(_) => ExchangeType::LongText,
            VectorValue::XmlText(_) => ExchangeType::XmlText,
            VectorValue::Timestamp(_) => ExchangeType::Timestamp,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            VectorValue::Int16(v) => v.len(),
            VectorValue::Int32(v) => v.len(),
            VectorValue::Int64(v) => v.len(),
            VectorValue::UInt64(v) => v.len(),
            VectorValue::Double(v) => v.len(),
            VectorValue::Char(v) => v.len(),
            VectorValue::Text(v) | VectorValue::LongText(v) | VectorValue::XmlText(v) => v.len(),
            VectorValue::Timestamp(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow or shrink to exactly `len` elements.
    pub fn resize(&mut self, len: usize) {
        match self {
            VectorValue::Int16(v) => v.resize(len, 0),
            VectorValue::Int32(v) => v.resize(len, 0),
            VectorValue::Int64(v) => v.resize(len, 0),
            VectorValue::UInt64(v) => v.resize(len, 0),
            VectorValue::Double(v) => v.resize(len, 0.0),
            VectorValue::Char(v) => v.resize(len, 0),
            VectorValue::Text(v) | VectorValue::LongText(v) | VectorValue::XmlText(v) => {
                v.resize(len, String::new());
            }
            VectorValue::Timestamp(v) => v.resize(len, NaiveDateTime::default()),
        }
    }

    #[must_use]
    pub fn as_int16(&self) -> Option<&[i16]> {
        if let VectorValue::Int16(v) = self {
            Some(v)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_int32(&self) -> Option<&[i32]> {
        if let VectorValue::Int32(v) = self {
            Some(v)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_int64(&self) -> Option<&[i64]> {
        if let VectorValue::Int64(v) = self {
            Some(v)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_uint64(&self) -> Option<&[u64]> {
        if let VectorValue::UInt64(v) = self {
            Some(v)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_double(&self) -> Option<&[f64]> {
        if let VectorValue::Double(v) = self {
            Some(v)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_char(&self) -> Option<&[u8]> {
        if let VectorValue::Char(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Elements of any of the three string kinds.
    #[must_use]
    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            VectorValue::Text(v) | VectorValue::LongText(v) | VectorValue::XmlText(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<&[NaiveDateTime]> {
        if let VectorValue::Timestamp(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

/// Caller-visible per-value outcome channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Value exchanged in full.
    Ok,
    /// SQL NULL.
    Null,
    /// Value exchanged, but shortened to fit the buffer.
    Truncated,
}

/// Abstract column taxonomy reported by the describer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Date,
    Double,
    Integer,
    BigInt,
    Text,
}
