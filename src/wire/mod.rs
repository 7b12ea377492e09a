use std::borrow::Cow;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Wire-level type tags, mirroring the client protocol's field-type
/// enumeration. Binding uses a subset; the describer sees the full set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Tiny,
    Short,
    Long,
    LongLong,
    Float,
    Double,
    Decimal,
    Date,
    Time,
    Timestamp,
    VarChar,
    VarString,
    String,
    Blob,
}

impl WireType {
    /// Element byte size for fixed-width tags; `None` for variable width.
    #[must_use]
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            WireType::Tiny => Some(1),
            WireType::Short => Some(2),
            WireType::Long | WireType::Float => Some(4),
            WireType::LongLong | WireType::Double => Some(8),
            WireType::Date | WireType::Time | WireType::Timestamp => Some(WireTimestamp::SIZE),
            WireType::Decimal
            | WireType::VarChar
            | WireType::VarString
            | WireType::String
            | WireType::Blob => None,
        }
    }
}

/// Per-element parameter sentinel, the protocol's indicator values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamIndicator {
    /// Plain value; length taken from the length array.
    #[default]
    None,
    /// Bind SQL NULL regardless of the buffer contents.
    Null,
    /// Value is NUL-terminated in the buffer.
    NullTerminated,
}

/// Parameter-side buffer view. `Contiguous` packs all elements at a fixed
/// stride; `Rows` references each element's bytes separately (the wire
/// protocol's pointer-array layout).
#[derive(Debug)]
pub enum ParamBuffer<'a> {
    Contiguous(Cow<'a, [u8]>),
    Rows(Vec<&'a [u8]>),
}

/// One bound parameter position. Rebuilt from its binder before every
/// execute; never mutated by the protocol layer.
#[derive(Debug)]
pub struct ParamBinding<'a> {
    pub wire_type: WireType,
    pub buffer: ParamBuffer<'a>,
    /// Element byte size; 0 for variable-width row layouts.
    pub buffer_length: usize,
    /// Actual byte length of each element.
    pub lengths: Vec<usize>,
    /// Null/terminator sentinel for each element.
    pub indicators: Vec<ParamIndicator>,
    pub is_unsigned: bool,
}

impl ParamBinding<'_> {
    /// Number of bound elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.indicators.len()
    }

    /// Byte image of one element, regardless of buffer layout.
    #[must_use]
    pub fn element_bytes(&self, index: usize) -> Option<&[u8]> {
        match &self.buffer {
            ParamBuffer::Contiguous(bytes) => {
                if self.buffer_length == 0 {
                    return None;
                }
                let start = index.checked_mul(self.buffer_length)?;
                bytes.get(start..start + self.buffer_length)
            }
            ParamBuffer::Rows(rows) => rows.get(index).copied(),
        }
    }
}

/// One bound result position: a mutable window over binder-owned storage
/// that the protocol fills during fetch.
#[derive(Debug)]
pub struct ResultBinding<'a> {
    pub wire_type: WireType,
    /// Byte stride of one element slot in `buffer`.
    pub stride: usize,
    pub buffer: &'a mut [u8],
    pub is_null: &'a mut [bool],
    /// Truncation flags, one per element.
    pub is_error: &'a mut [bool],
    /// Actual value lengths; -1 denotes null-without-truncation.
    pub lengths: &'a mut [i64],
}

impl ResultBinding<'_> {
    /// Rows this descriptor can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.is_null.len()
    }

    /// Mutable byte slot for one element.
    pub fn element_slot(&mut self, index: usize) -> &mut [u8] {
        let start = index * self.stride;
        &mut self.buffer[start..start + self.stride]
    }
}

/// Fixed-layout calendar value exchanged with the protocol.
///
/// Encoded little-endian as year:u16, month:u8, day:u8, hour:u8,
/// minute:u8, second:u8, pad:u8, microsecond:u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
}

impl WireTimestamp {
    pub const SIZE: usize = 12;

    #[must_use]
    pub fn from_civil(ts: &NaiveDateTime) -> Self {
        Self {
            year: u16::try_from(ts.year()).unwrap_or(0),
            month: ts.month() as u8,
            day: ts.day() as u8,
            hour: ts.hour() as u8,
            minute: ts.minute() as u8,
            second: ts.second() as u8,
            microsecond: (ts.nanosecond() / 1_000).min(999_999),
        }
    }

    /// Recompose the civil-time value. `None` when the wire carries an
    /// invalid calendar combination (e.g. the zero date).
    #[must_use]
    pub fn to_civil(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?;
        date.and_hms_micro_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
            self.microsecond,
        )
    }

    /// Write the fixed layout into `out`, which must hold `SIZE` bytes.
    pub fn encode(&self, out: &mut [u8]) {
        out[0..2].copy_from_slice(&self.year.to_le_bytes());
        out[2] = self.month;
        out[3] = self.day;
        out[4] = self.hour;
        out[5] = self.minute;
        out[6] = self.second;
        out[7] = 0;
        out[8..12].copy_from_slice(&self.microsecond.to_le_bytes());
    }

    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            year: u16::from_le_bytes([bytes[0], bytes[1]]),
            month: bytes[2],
            day: bytes[3],
            hour: bytes[4],
            minute: bytes[5],
            second: bytes[6],
            microsecond: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }
}

pub(crate) fn read_i16(bytes: &[u8]) -> i16 {
    i16::from_le_bytes([bytes[0], bytes[1]])
}

pub(crate) fn read_i32(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

pub(crate) fn read_i64(bytes: &[u8]) -> i64 {
    i64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

pub(crate) fn read_u64(bytes: &[u8]) -> u64 {
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

pub(crate) fn read_f64(bytes: &[u8]) -> f64 {
    f64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}
