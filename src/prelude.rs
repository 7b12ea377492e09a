//! Convenient imports for common functionality.

pub use crate::binding::{BindMode, BindTarget};
pub use crate::error::WirebindError;
pub use crate::options::{RewriteMode, StatementOptions};
pub use crate::protocol::{
    ColumnMeta, ErrorCategory, FetchReply, ProtocolDiag, SessionHandle, StatementHandle,
};
pub use crate::rewrite::{QueryPlan, rewrite_named_placeholders};
pub use crate::statement::describe::{ColumnInfo, ResultShape, map_wire_type};
pub use crate::statement::{ExecuteResult, FetchResult, StatementDriver, StatementState};
pub use crate::types::{ColumnType, ExchangeType, ExchangeValue, Indicator, VectorValue};
pub use crate::wire::{
    ParamBinding, ParamBuffer, ParamIndicator, ResultBinding, WireTimestamp, WireType,
};
