use crate::error::WirebindError;
use crate::types::{ExchangeType, ExchangeValue, Indicator};
use crate::wire::{self, ResultBinding, WireTimestamp, WireType};

/// Binds one output column, owning a type-appropriate buffer the protocol
/// fills during fetch.
#[derive(Debug)]
pub(crate) struct ScalarResultBinder {
    position: usize,
    ty: ExchangeType,
    wire_type: WireType,
    buf: Vec<u8>,
    is_null: Vec<bool>,
    is_error: Vec<bool>,
    lengths: Vec<i64>,
    want_indicator: bool,
    indicator: Option<Indicator>,
    value: Option<ExchangeValue>,
}

impl ScalarResultBinder {
    /// Allocate the binding. `text_capacity` is the buffer size for text
    /// kinds (declared column width + 1), ignored for everything else.
    pub(crate) fn define(
        position: usize,
        ty: ExchangeType,
        want_indicator: bool,
        text_capacity: usize,
    ) -> Result<Self, WirebindError> {
        let (wire_type, size) = match ty {
            ExchangeType::Char => (WireType::String, 2),
            ExchangeType::Text | ExchangeType::LongText | ExchangeType::XmlText => {
                (WireType::String, text_capacity)
            }
            ExchangeType::Int16 => (WireType::Short, 2),
            ExchangeType::Int32 => (WireType::Long, 4),
            ExchangeType::Int64 | ExchangeType::UInt64 => (WireType::LongLong, 8),
            ExchangeType::Double => (WireType::Double, 8),
            ExchangeType::Timestamp => (WireType::Timestamp, WireTimestamp::SIZE),
            ExchangeType::Statement | ExchangeType::RowId | ExchangeType::Blob => {
                return Err(WirebindError::ConfigError(format!(
                    "result element used with non-supported type {ty:?}"
                )));
            }
        };
        Ok(Self {
            position,
            ty,
            wire_type,
            buf: vec![0; size],
            is_null: vec![false],
            is_error: vec![false],
            lengths: vec![0],
            want_indicator,
            indicator: None,
            value: None,
        })
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn exchange_type(&self) -> ExchangeType {
        self.ty
    }

    pub(crate) fn wire_slot(&mut self) -> ResultBinding<'_> {
        let stride = self.buf.len();
        ResultBinding {
            wire_type: self.wire_type,
            stride,
            buffer: &mut self.buf,
            is_null: &mut self.is_null,
            is_error: &mut self.is_error,
            lengths: &mut self.lengths,
        }
    }

    /// Materialize the fetched slot, honoring the null contract: a null row
    /// with no indicator sink is a fatal data error.
    pub(crate) fn post_fetch(&mut self) -> Result<(), WirebindError> {
        self.value = None;
        if self.is_null[0] {
            if !self.want_indicator {
                return Err(WirebindError::DataError(
                    "null value fetched and no indicator defined".into(),
                ));
            }
            self.indicator = Some(Indicator::Null);
            return Ok(());
        }
        self.indicator = Some(if self.is_error[0] {
            Indicator::Truncated
        } else {
            Indicator::Ok
        });

        let len = usize::try_from(self.lengths[0])
            .unwrap_or(0)
            .min(self.buf.len());
        let value = match self.ty {
            ExchangeType::Char => ExchangeValue::Char(self.buf[0]),
            ExchangeType::Text => ExchangeValue::Text(text_from(&self.buf[..len])),
            ExchangeType::LongText => ExchangeValue::LongText(text_from(&self.buf[..len])),
            ExchangeType::XmlText => ExchangeValue::XmlText(text_from(&self.buf[..len])),
            ExchangeType::Int16 => ExchangeValue::Int16(wire::read_i16(&self.buf)),
            ExchangeType::Int32 => ExchangeValue::Int32(wire::read_i32(&self.buf)),
            ExchangeType::Int64 => ExchangeValue::Int64(wire::read_i64(&self.buf)),
            ExchangeType::UInt64 => ExchangeValue::UInt64(wire::read_u64(&self.buf)),
            ExchangeType::Double => ExchangeValue::Double(wire::read_f64(&self.buf)),
            ExchangeType::Timestamp => {
                let civil = WireTimestamp::decode(&self.buf)
                    .and_then(|w| w.to_civil())
                    .ok_or_else(|| {
                        WirebindError::DataError("invalid calendar value fetched".into())
                    })?;
                ExchangeValue::Timestamp(civil)
            }
            ExchangeType::Statement | ExchangeType::RowId | ExchangeType::Blob => {
                return Err(WirebindError::InternalError(
                    "opaque type in result binder".into(),
                ));
            }
        };
        self.value = Some(value);
        Ok(())
    }

    pub(crate) fn indicator(&self) -> Option<Indicator> {
        self.indicator
    }

    pub(crate) fn value(&self) -> Option<&ExchangeValue> {
        self.value.as_ref()
    }

    /// Idempotent release of the fetch buffer.
    pub(crate) fn clean_up(&mut self) {
        self.buf = Vec::new();
        self.value = None;
    }
}

fn text_from(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
