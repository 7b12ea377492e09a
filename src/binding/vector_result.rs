use crate::error::WirebindError;
use crate::options::StatementOptions;
use crate::types::{ExchangeType, Indicator, VectorValue};
use crate::wire::{self, ResultBinding, WireTimestamp, WireType};

/// Binds one output column for bulk fetches, owning the destination vector
/// and every parallel indicator/length array.
///
/// Two backing-store shapes exist: one `stride × batch` columnar
/// allocation, or a single-row buffer re-registered before each fetch when
/// the statement has been downgraded to row-at-a-time retrieval.
#[derive(Debug)]
pub(crate) struct VectorResultBinder {
    position: usize,
    ty: ExchangeType,
    wire_type: WireType,
    /// Bytes per element slot.
    col_size: usize,
    buf: Vec<u8>,
    row_mode: bool,
    is_null: Vec<bool>,
    is_error: Vec<bool>,
    lengths: Vec<i64>,
    values: VectorValue,
    indicators: Option<Vec<Indicator>>,
}

impl VectorResultBinder {
    /// Allocate the binding for `len` destination rows. `declared_size` is
    /// the protocol's declared width for text kinds (`Some(0)` = unknown).
    /// Returns the binder plus whether this column forces the statement
    /// into row-at-a-time fetches.
    pub(crate) fn define(
        position: usize,
        ty: ExchangeType,
        len: usize,
        want_indicator: bool,
        declared_size: Option<usize>,
        options: &StatementOptions,
        statement_row_mode: bool,
    ) -> Result<(Self, bool), WirebindError> {
        if len == 0 {
            return Err(WirebindError::ConfigError(
                "vectors of size 0 are not allowed".into(),
            ));
        }
        let (wire_type, col_size, wide) = match ty {
            ExchangeType::Int16 => (WireType::Short, 2, false),
            ExchangeType::Int32 => (WireType::Long, 4, false),
            ExchangeType::Int64 | ExchangeType::UInt64 => (WireType::LongLong, 8, false),
            ExchangeType::Double => (WireType::Double, 8, false),
            ExchangeType::Char => (WireType::String, 2, false),
            ExchangeType::Text | ExchangeType::LongText | ExchangeType::XmlText => {
                let declared = declared_size.unwrap_or(0);
                if declared == 0 {
                    // Unknown width: cap the buffer at one row's worth and
                    // fetch row by row rather than overallocating the batch.
                    (WireType::String, options.unbounded_text_capacity + 1, true)
                } else {
                    (
                        WireType::String,
                        declared + 1,
                        declared > options.columnar_text_limit,
                    )
                }
            }
            ExchangeType::Timestamp => (WireType::Timestamp, WireTimestamp::SIZE, false),
            ExchangeType::Statement | ExchangeType::RowId | ExchangeType::Blob => {
                return Err(WirebindError::ConfigError(format!(
                    "result vector used with non-supported type {ty:?}"
                )));
            }
        };
        let row_mode = statement_row_mode || wide;
        let elements = if row_mode { 1 } else { len };
        let values = VectorValue::with_len(ty, len).ok_or_else(|| {
            WirebindError::ConfigError(format!(
                "result vector used with non-supported type {ty:?}"
            ))
        })?;
        let binder = Self {
            position,
            ty,
            wire_type,
            col_size,
            buf: vec![0; col_size * elements],
            row_mode,
            is_null: vec![false; len],
            is_error: vec![false; len],
            lengths: vec![0; len],
            values,
            indicators: want_indicator.then(|| vec![Indicator::Ok; len]),
        };
        Ok((binder, wide))
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn exchange_type(&self) -> ExchangeType {
        self.ty
    }

    /// Shrink to a single-row backing store after the statement downgrades
    /// to row-at-a-time fetches.
    pub(crate) fn enter_row_mode(&mut self) {
        if !self.row_mode {
            self.row_mode = true;
            self.buf = vec![0; self.col_size];
        }
    }

    /// Keep the destination and every parallel array at exactly `n`
    /// elements; indicator assignment is undefined otherwise.
    pub(crate) fn resize(&mut self, n: usize) {
        self.values.resize(n);
        self.is_null.resize(n, false);
        self.is_error.resize(n, false);
        self.lengths.resize(n, 0);
        if let Some(indicators) = &mut self.indicators {
            indicators.resize(n, Indicator::Ok);
        }
        if !self.row_mode {
            self.buf.resize(self.col_size * n, 0);
        }
    }

    /// Columnar descriptor over the whole batch window.
    pub(crate) fn wire_slot(&mut self) -> ResultBinding<'_> {
        let stride = self.col_size;
        ResultBinding {
            wire_type: self.wire_type,
            stride,
            buffer: &mut self.buf,
            is_null: &mut self.is_null,
            is_error: &mut self.is_error,
            lengths: &mut self.lengths,
        }
    }

    /// Re-register the binding for a single row ahead of one fetch call.
    pub(crate) fn rebind_row(&mut self, row: usize) -> ResultBinding<'_> {
        let stride = self.col_size;
        let window = if self.row_mode {
            0..stride
        } else {
            row * stride..(row + 1) * stride
        };
        ResultBinding {
            wire_type: self.wire_type,
            stride,
            buffer: &mut self.buf[window],
            is_null: &mut self.is_null[row..=row],
            is_error: &mut self.is_error[row..=row],
            lengths: &mut self.lengths[row..=row],
        }
    }

    /// Decode fetched slots `begin..end` into the destination vector. In
    /// row mode the single-row buffer holds the current row's bytes.
    pub(crate) fn materialize_rows(
        &mut self,
        begin: usize,
        end: usize,
    ) -> Result<(), WirebindError> {
        let col_size = self.col_size;
        let row_mode = self.row_mode;
        let buf = &self.buf;
        let lengths = &self.lengths;
        let nulls = &self.is_null;
        let slot = |i: usize| {
            let base = if row_mode { 0 } else { i * col_size };
            &buf[base..base + col_size]
        };
        match &mut self.values {
            VectorValue::Int16(v) => {
                for i in begin..end {
                    v[i] = wire::read_i16(slot(i));
                }
            }
            VectorValue::Int32(v) => {
                for i in begin..end {
                    v[i] = wire::read_i32(slot(i));
                }
            }
            VectorValue::Int64(v) => {
                for i in begin..end {
                    v[i] = wire::read_i64(slot(i));
                }
            }
            VectorValue::UInt64(v) => {
                for i in begin..end {
                    v[i] = wire::read_u64(slot(i));
                }
            }
            VectorValue::Double(v) => {
                for i in begin..end {
                    v[i] = wire::read_f64(slot(i));
                }
            }
            VectorValue::Char(v) => {
                for i in begin..end {
                    v[i] = slot(i)[0];
                }
            }
            VectorValue::Text(v) | VectorValue::LongText(v) | VectorValue::XmlText(v) => {
                for i in begin..end {
                    let len = lengths[i];
                    if len < 0 {
                        // Null slot; the indicator pass reports it.
                        v[i].clear();
                        continue;
                    }
                    let len = usize::try_from(len).unwrap_or(0).min(col_size);
                    let bytes = trim_padding(&slot(i)[..len]);
                    v[i] = String::from_utf8_lossy(bytes).into_owned();
                }
            }
            VectorValue::Timestamp(v) => {
                for i in begin..end {
                    if nulls[i] {
                        continue;
                    }
                    let civil = WireTimestamp::decode(slot(i))
                        .and_then(|w| w.to_civil())
                        .ok_or_else(|| {
                            WirebindError::DataError("invalid calendar value fetched".into())
                        })?;
                    v[i] = civil;
                }
            }
        }
        Ok(())
    }

    /// Assign caller-visible indicators for rows `begin..end`. A null row
    /// with no indicator sink is a fatal data error.
    pub(crate) fn assign_indicators(
        &mut self,
        begin: usize,
        end: usize,
    ) -> Result<(), WirebindError> {
        for i in begin..end {
            if self.is_null[i] {
                let Some(indicators) = &mut self.indicators else {
                    return Err(WirebindError::DataError(
                        "null value fetched and no indicator defined".into(),
                    ));
                };
                indicators[i] = Indicator::Null;
            } else if let Some(indicators) = &mut self.indicators {
                indicators[i] = if self.is_error[i] {
                    Indicator::Truncated
                } else {
                    Indicator::Ok
                };
            }
        }
        Ok(())
    }

    pub(crate) fn values(&self) -> &VectorValue {
        &self.values
    }

    pub(crate) fn indicators(&self) -> Option<&[Indicator]> {
        self.indicators.as_deref()
    }

    /// Idempotent release of the fetch buffer.
    pub(crate) fn clean_up(&mut self) {
        self.buf = Vec::new();
    }
}

/// Strip trailing pad spaces from a fixed-width text slot: scan from the
/// end, stop at the first non-space byte.
fn trim_padding(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b' ' {
        end -= 1;
    }
    &bytes[..end]
}
