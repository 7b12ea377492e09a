use std::borrow::Cow;

use crate::types::{ExchangeType, ExchangeValue, Indicator};
use crate::wire::{ParamBinding, ParamBuffer, ParamIndicator, WireTimestamp, WireType};

/// Binds one input value, owning a conversion buffer whenever the exchange
/// representation does not match the wire format byte for byte.
#[derive(Debug)]
pub(crate) struct ScalarParamBinder {
    position: usize,
    value: ExchangeValue,
    is_null: bool,
    /// Base wire sentinel, kept across executions so alternating
    /// null/non-null runs of a reused statement stay correct.
    base_indicator: ParamIndicator,
    buf: Vec<u8>,
    length: usize,
    wire_type: WireType,
    outcome: Option<Indicator>,
}

impl ScalarParamBinder {
    pub(crate) fn new(position: usize, value: ExchangeValue, indicator: Option<Indicator>) -> Self {
        Self {
            position,
            is_null: matches!(indicator, Some(Indicator::Null)),
            base_indicator: ParamIndicator::None,
            buf: Vec::new(),
            length: 0,
            wire_type: WireType::Long,
            value,
            outcome: None,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn exchange_type(&self) -> ExchangeType {
        self.value.exchange_type()
    }

    /// Rebuild the conversion buffer for the next execute.
    pub(crate) fn prepare_buffers(&mut self) {
        self.buf.clear();
        self.base_indicator = ParamIndicator::None;
        match &self.value {
            ExchangeValue::Int16(v) => {
                self.buf.extend_from_slice(&v.to_le_bytes());
                self.wire_type = WireType::Short;
                self.length = 2;
            }
            ExchangeValue::Int32(v) => {
                self.buf.extend_from_slice(&v.to_le_bytes());
                self.wire_type = WireType::Long;
                self.length = 4;
            }
            ExchangeValue::Int64(v) => {
                self.buf.extend_from_slice(&v.to_le_bytes());
                self.wire_type = WireType::LongLong;
                self.length = 8;
            }
            ExchangeValue::UInt64(v) => {
                self.buf.extend_from_slice(&v.to_le_bytes());
                self.wire_type = WireType::LongLong;
                self.length = 8;
            }
            ExchangeValue::Double(v) => {
                self.buf.extend_from_slice(&v.to_le_bytes());
                self.wire_type = WireType::Double;
                self.length = 8;
            }
            ExchangeValue::Char(c) => {
                self.buf.push(*c);
                self.buf.push(0);
                self.wire_type = WireType::String;
                self.base_indicator = ParamIndicator::NullTerminated;
                self.length = 1;
            }
            ExchangeValue::Text(s) | ExchangeValue::LongText(s) | ExchangeValue::XmlText(s) => {
                self.buf.extend_from_slice(s.as_bytes());
                self.buf.push(0);
                self.wire_type = WireType::String;
                self.base_indicator = ParamIndicator::NullTerminated;
                self.length = s.len();
            }
            ExchangeValue::Timestamp(ts) => {
                let mut slot = [0u8; WireTimestamp::SIZE];
                WireTimestamp::from_civil(ts).encode(&mut slot);
                self.buf.extend_from_slice(&slot);
                self.wire_type = WireType::Timestamp;
                self.length = WireTimestamp::SIZE;
            }
        }
    }

    /// Descriptor for the next execute. A caller-null substitutes the
    /// `Null` sentinel here without touching the base sentinel.
    pub(crate) fn to_wire(&self) -> ParamBinding<'_> {
        let indicator = if self.is_null {
            ParamIndicator::Null
        } else {
            self.base_indicator
        };
        ParamBinding {
            wire_type: self.wire_type,
            buffer: ParamBuffer::Contiguous(Cow::Borrowed(&self.buf)),
            buffer_length: self.buf.len(),
            lengths: vec![self.length],
            indicators: vec![indicator],
            is_unsigned: matches!(self.value, ExchangeValue::UInt64(_)),
        }
    }

    /// Classify the execution outcome from the effective sentinel and
    /// release the conversion buffer until the next execute.
    pub(crate) fn post_use(&mut self) {
        self.outcome = Some(if self.is_null {
            Indicator::Null
        } else {
            Indicator::Ok
        });
        self.clean_up();
    }

    pub(crate) fn outcome(&self) -> Option<Indicator> {
        self.outcome
    }

    /// Idempotent release of the conversion buffer.
    pub(crate) fn clean_up(&mut self) {
        self.buf = Vec::new();
        self.length = 0;
    }
}
