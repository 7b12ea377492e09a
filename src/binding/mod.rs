//! The four binder variants — {parameter, result} × {scalar, vector} —
//! dispatched by the statement driver through two tagged enums.

mod scalar_param;
mod scalar_result;
mod vector_param;
mod vector_result;

pub(crate) use scalar_param::ScalarParamBinder;
pub(crate) use scalar_result::ScalarResultBinder;
pub(crate) use vector_param::VectorParamBinder;
pub(crate) use vector_result::VectorResultBinder;

use crate::error::WirebindError;
use crate::rewrite::QueryPlan;
use crate::types::ExchangeType;
use crate::wire::{ParamBinding, ResultBinding};

/// How a statement's parameters are addressed. The two modes are mutually
/// exclusive for one statement's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindMode {
    #[default]
    Unbound,
    ByPosition,
    ByName,
}

/// Addressing of one parameter bind call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindTarget<'a> {
    /// 1-based placeholder position.
    Position(usize),
    /// Named placeholder, resolved against the query plan's name list.
    Name(&'a str),
}

/// Resolve a bind target to a 1-based position, enforcing mode exclusivity.
pub(crate) fn resolve_target(
    plan: &QueryPlan,
    target: BindTarget<'_>,
    mode: &mut BindMode,
) -> Result<usize, WirebindError> {
    match target {
        BindTarget::Position(position) => {
            if *mode == BindMode::ByName {
                return Err(WirebindError::ConfigError(
                    "binding must be either by position or by name for one statement".into(),
                ));
            }
            if position == 0 {
                return Err(WirebindError::ConfigError(
                    "parameter positions are 1-based".into(),
                ));
            }
            *mode = BindMode::ByPosition;
            Ok(position)
        }
        BindTarget::Name(name) => {
            if *mode == BindMode::ByPosition {
                return Err(WirebindError::ConfigError(
                    "binding must be either by position or by name for one statement".into(),
                ));
            }
            let position = plan.position_of(name).ok_or_else(|| {
                WirebindError::ConfigError(format!("unable to find name '{name}' to bind to"))
            })?;
            *mode = BindMode::ByName;
            Ok(position)
        }
    }
}

/// Parameter binder variants dispatched by the statement driver.
#[derive(Debug)]
pub(crate) enum ParamBinder {
    Scalar(ScalarParamBinder),
    Vector(VectorParamBinder),
}

impl ParamBinder {
    pub(crate) fn position(&self) -> usize {
        match self {
            ParamBinder::Scalar(b) => b.position(),
            ParamBinder::Vector(b) => b.position(),
        }
    }

    pub(crate) fn exchange_type(&self) -> ExchangeType {
        match self {
            ParamBinder::Scalar(b) => b.exchange_type(),
            ParamBinder::Vector(b) => b.exchange_type(),
        }
    }

    pub(crate) fn is_vector(&self) -> bool {
        matches!(self, ParamBinder::Vector(_))
    }

    /// Rebuild conversion buffers and sentinels ahead of an execute.
    pub(crate) fn prepare_buffers(&mut self) {
        match self {
            ParamBinder::Scalar(b) => b.prepare_buffers(),
            ParamBinder::Vector(b) => b.prepare_buffers(),
        }
    }

    pub(crate) fn to_wire(&self) -> ParamBinding<'_> {
        match self {
            ParamBinder::Scalar(b) => b.to_wire(),
            ParamBinder::Vector(b) => b.to_wire(),
        }
    }

    pub(crate) fn post_use(&mut self) {
        if let ParamBinder::Scalar(b) = self {
            b.post_use();
        }
    }

    pub(crate) fn clean_up(&mut self) {
        match self {
            ParamBinder::Scalar(b) => b.clean_up(),
            ParamBinder::Vector(b) => b.clean_up(),
        }
    }
}

/// Result binder variants dispatched by the statement driver.
#[derive(Debug)]
pub(crate) enum ResultBinder {
    Scalar(ScalarResultBinder),
    Vector(VectorResultBinder),
}

impl ResultBinder {
    pub(crate) fn position(&self) -> usize {
        match self {
            ResultBinder::Scalar(b) => b.position(),
            ResultBinder::Vector(b) => b.position(),
        }
    }

    pub(crate) fn exchange_type(&self) -> ExchangeType {
        match self {
            ResultBinder::Scalar(b) => b.exchange_type(),
            ResultBinder::Vector(b) => b.exchange_type(),
        }
    }

    pub(crate) fn is_vector(&self) -> bool {
        matches!(self, ResultBinder::Vector(_))
    }

    /// Keep the destination and every parallel array at `n` elements.
    /// Scalar bindings always hold exactly one row.
    pub(crate) fn resize(&mut self, n: usize) {
        if let ResultBinder::Vector(b) = self {
            b.resize(n);
        }
    }

    pub(crate) fn enter_row_mode(&mut self) {
        if let ResultBinder::Vector(b) = self {
            b.enter_row_mode();
        }
    }

    /// Columnar descriptor over the whole batch window.
    pub(crate) fn wire_slot(&mut self) -> ResultBinding<'_> {
        match self {
            ResultBinder::Scalar(b) => b.wire_slot(),
            ResultBinder::Vector(b) => b.wire_slot(),
        }
    }

    /// Single-row descriptor re-registered before one row-at-a-time fetch.
    pub(crate) fn rebind_row(&mut self, row: usize) -> ResultBinding<'_> {
        match self {
            ResultBinder::Scalar(b) => b.wire_slot(),
            ResultBinder::Vector(b) => b.rebind_row(row),
        }
    }

    /// Materialize fetched rows `begin..end` and assign indicators.
    pub(crate) fn post_fetch_rows(
        &mut self,
        begin: usize,
        end: usize,
    ) -> Result<(), WirebindError> {
        match self {
            ResultBinder::Scalar(b) => {
                if end > begin {
                    b.post_fetch()
                } else {
                    Ok(())
                }
            }
            ResultBinder::Vector(b) => {
                b.materialize_rows(begin, end)?;
                b.assign_indicators(begin, end)
            }
        }
    }

    pub(crate) fn clean_up(&mut self) {
        match self {
            ResultBinder::Scalar(b) => b.clean_up(),
            ResultBinder::Vector(b) => b.clean_up(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::rewrite_named_placeholders;

    #[test]
    fn mixing_modes_is_rejected_both_ways() {
        let plan = rewrite_named_placeholders("select :a, :b");
        let mut mode = BindMode::Unbound;
        assert!(resolve_target(&plan, BindTarget::Position(1), &mut mode).is_ok());
        let err = resolve_target(&plan, BindTarget::Name("b"), &mut mode).unwrap_err();
        assert!(matches!(err, WirebindError::ConfigError(_)));

        let mut mode = BindMode::Unbound;
        assert!(resolve_target(&plan, BindTarget::Name("b"), &mut mode).is_ok());
        let err = resolve_target(&plan, BindTarget::Position(1), &mut mode).unwrap_err();
        assert!(matches!(err, WirebindError::ConfigError(_)));
    }

    #[test]
    fn unresolved_name_is_fatal() {
        let plan = rewrite_named_placeholders("select :a");
        let mut mode = BindMode::Unbound;
        let err = resolve_target(&plan, BindTarget::Name("nope"), &mut mode).unwrap_err();
        assert!(matches!(err, WirebindError::ConfigError(_)));
        assert_eq!(mode, BindMode::Unbound);
    }

    #[test]
    fn first_match_wins_for_repeated_names() {
        let plan = rewrite_named_placeholders("select :a, :b, :a");
        let mut mode = BindMode::Unbound;
        assert_eq!(
            resolve_target(&plan, BindTarget::Name("a"), &mut mode).unwrap(),
            1
        );
    }
}
