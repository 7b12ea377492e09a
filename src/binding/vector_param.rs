use std::borrow::Cow;

use crate::error::WirebindError;
use crate::types::{ExchangeType, Indicator, VectorValue};
use crate::wire::{ParamBinding, ParamBuffer, ParamIndicator, WireTimestamp, WireType};

/// Binds one homogeneous input array as a single wire position for bulk
/// execution.
#[derive(Debug)]
pub(crate) struct VectorParamBinder {
    position: usize,
    values: VectorValue,
    nulls: Option<Vec<bool>>,
    /// Owned conversion storage: packed numerics or wire time structs.
    enc: Vec<u8>,
    lengths: Vec<usize>,
    indicators: Vec<ParamIndicator>,
    wire_type: WireType,
}

impl VectorParamBinder {
    pub(crate) fn new(
        position: usize,
        values: VectorValue,
        indicators: Option<&[Indicator]>,
    ) -> Result<Self, WirebindError> {
        if values.is_empty() {
            return Err(WirebindError::ConfigError(
                "vectors of size 0 are not allowed".into(),
            ));
        }
        let nulls = match indicators {
            Some(inds) => {
                if inds.len() != values.len() {
                    return Err(WirebindError::ConfigError(format!(
                        "indicator array length {} does not match vector length {}",
                        inds.len(),
                        values.len()
                    )));
                }
                Some(inds.iter().map(|i| matches!(i, Indicator::Null)).collect())
            }
            None => None,
        };
        Ok(Self {
            position,
            values,
            nulls,
            enc: Vec::new(),
            lengths: Vec::new(),
            indicators: Vec::new(),
            wire_type: WireType::Long,
        })
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn exchange_type(&self) -> ExchangeType {
        self.values.exchange_type()
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    /// Rebuild buffers, lengths and sentinels for the next execute. Text
    /// contents may have changed since the last run, so nothing is cached.
    pub(crate) fn prepare_buffers(&mut self) {
        let n = self.values.len();
        self.indicators.clear();
        self.indicators.resize(n, ParamIndicator::None);

        let enc = &mut self.enc;
        let lengths = &mut self.lengths;
        enc.clear();
        lengths.clear();
        match &self.values {
            VectorValue::Int16(v) => {
                for x in v {
                    enc.extend_from_slice(&x.to_le_bytes());
                }
                lengths.resize(n, 2);
                self.wire_type = WireType::Short;
            }
            VectorValue::Int32(v) => {
                for x in v {
                    enc.extend_from_slice(&x.to_le_bytes());
                }
                lengths.resize(n, 4);
                self.wire_type = WireType::Long;
            }
            VectorValue::Int64(v) => {
                for x in v {
                    enc.extend_from_slice(&x.to_le_bytes());
                }
                lengths.resize(n, 8);
                self.wire_type = WireType::LongLong;
            }
            VectorValue::UInt64(v) => {
                for x in v {
                    enc.extend_from_slice(&x.to_le_bytes());
                }
                lengths.resize(n, 8);
                self.wire_type = WireType::LongLong;
            }
            VectorValue::Double(v) => {
                for x in v {
                    enc.extend_from_slice(&x.to_le_bytes());
                }
                lengths.resize(n, 8);
                self.wire_type = WireType::Double;
            }
            VectorValue::Char(_) => {
                lengths.resize(n, 1);
                self.wire_type = WireType::String;
            }
            VectorValue::Text(v) | VectorValue::LongText(v) | VectorValue::XmlText(v) => {
                lengths.extend(v.iter().map(String::len));
                self.wire_type = WireType::String;
            }
            VectorValue::Timestamp(v) => {
                // Convert every element up front into one owned contiguous
                // array of wire structs.
                let mut slot = [0u8; WireTimestamp::SIZE];
                for ts in v {
                    WireTimestamp::from_civil(ts).encode(&mut slot);
                    enc.extend_from_slice(&slot);
                }
                lengths.resize(n, WireTimestamp::SIZE);
                self.wire_type = WireType::Timestamp;
            }
        }

        // Non-null text lengths and sentinels were just set above; the null
        // pass only overwrites the slots the caller marked null.
        if let Some(nulls) = &self.nulls {
            for (slot, is_null) in self.indicators.iter_mut().zip(nulls) {
                if *is_null {
                    *slot = ParamIndicator::Null;
                }
            }
        }
    }

    /// Descriptor for the next execute. Text rows borrow each element's
    /// bytes directly; nothing is copied.
    pub(crate) fn to_wire(&self) -> ParamBinding<'_> {
        let (buffer, buffer_length) = match &self.values {
            VectorValue::Int16(_) => (contiguous(&self.enc), 2),
            VectorValue::Int32(_) => (contiguous(&self.enc), 4),
            VectorValue::Int64(_) | VectorValue::UInt64(_) => (contiguous(&self.enc), 8),
            VectorValue::Double(_) => (contiguous(&self.enc), 8),
            VectorValue::Char(v) => (ParamBuffer::Rows(v.chunks(1).collect()), 1),
            VectorValue::Text(v) | VectorValue::LongText(v) | VectorValue::XmlText(v) => (
                ParamBuffer::Rows(v.iter().map(String::as_bytes).collect()),
                0,
            ),
            VectorValue::Timestamp(_) => (
                ParamBuffer::Rows(self.enc.chunks(WireTimestamp::SIZE).collect()),
                WireTimestamp::SIZE,
            ),
        };
        ParamBinding {
            wire_type: self.wire_type,
            buffer,
            buffer_length,
            lengths: self.lengths.clone(),
            indicators: self.indicators.clone(),
            is_unsigned: matches!(self.values, VectorValue::UInt64(_)),
        }
    }

    /// Idempotent release of the conversion storage.
    pub(crate) fn clean_up(&mut self) {
        self.enc = Vec::new();
        self.lengths = Vec::new();
        self.indicators = Vec::new();
    }
}

fn contiguous(enc: &[u8]) -> ParamBuffer<'_> {
    ParamBuffer::Contiguous(Cow::Borrowed(enc))
}
