use wirebind::prelude::*;
use wirebind::testing::{MemoryCell, MemorySession, MemoryStatement};

fn column(name: &str, wire_type: WireType, length: usize) -> ColumnMeta {
    ColumnMeta {
        name: name.to_string(),
        wire_type,
        length,
    }
}

#[test]
fn describe_maps_wire_families_to_the_abstract_taxonomy() -> Result<(), WirebindError> {
    let columns = vec![
        column("created", WireType::Timestamp, 12),
        column("score", WireType::Decimal, 10),
        column("flags", WireType::Tiny, 1),
        column("id", WireType::LongLong, 8),
        column("payload", WireType::Blob, 0),
    ];
    let mut stmt = StatementDriver::new(MemoryStatement::with_result(columns, Vec::new()));
    stmt.prepare("select created, score, flags, id, payload from t")?;
    let shape = stmt.describe()?;
    assert_eq!(shape.column_count(), 5);
    let types: Vec<ColumnType> = shape.columns().iter().map(|c| c.column_type).collect();
    assert_eq!(
        types,
        [
            ColumnType::Date,
            ColumnType::Double,
            ColumnType::Integer,
            ColumnType::BigInt,
            ColumnType::Text
        ]
    );
    assert_eq!(shape.column(1).unwrap().name, "created");
    assert_eq!(stmt.column_info(5)?.declared_size, 0);
    Ok(())
}

#[test]
fn describe_is_cached_until_reprepare() -> Result<(), WirebindError> {
    let mut stmt = StatementDriver::new(MemoryStatement::with_result(
        vec![column("a", WireType::Long, 4)],
        vec![vec![MemoryCell::from_bytes(7i32.to_le_bytes().to_vec())]],
    ));
    stmt.prepare("select a from t")?;
    assert_eq!(stmt.describe()?.column_count(), 1);

    // Re-scripting the handle does not change the cached shape...
    stmt.handle_mut()
        .set_result(vec![column("x", WireType::String, 3), column("y", WireType::Long, 4)], Vec::new());
    assert_eq!(stmt.describe()?.column_count(), 1);

    // ...but a re-prepare invalidates it and reflects the new query.
    stmt.prepare("select x, y from t")?;
    let shape = stmt.describe()?;
    assert_eq!(shape.column_count(), 2);
    assert_eq!(shape.column(1).unwrap().column_type, ColumnType::Text);
    Ok(())
}

#[test]
fn binding_a_text_result_before_describe_is_an_internal_error() -> Result<(), WirebindError> {
    let mut stmt = StatementDriver::new(MemoryStatement::with_result(
        vec![column("s", WireType::String, 16)],
        Vec::new(),
    ));
    stmt.prepare("select s from t")?;
    let err = stmt.bind_result(1, ExchangeType::Text, false).unwrap_err();
    assert!(matches!(err, WirebindError::InternalError(_)));
    let err = stmt
        .bind_result_vector(1, ExchangeType::Text, 4, false)
        .unwrap_err();
    assert!(matches!(err, WirebindError::InternalError(_)));
    Ok(())
}

#[test]
fn lifecycle_misuse_is_an_internal_error() {
    let mut stmt = StatementDriver::new(MemoryStatement::new());
    assert!(matches!(
        stmt.execute(0),
        Err(WirebindError::InternalError(_))
    ));
    assert!(matches!(
        stmt.describe(),
        Err(WirebindError::InternalError(_))
    ));
    assert!(matches!(
        stmt.bind_parameter(BindTarget::Position(1), ExchangeValue::Int32(1), None),
        Err(WirebindError::InternalError(_))
    ));
    assert!(matches!(
        stmt.fetch(1),
        Err(WirebindError::InternalError(_))
    ));
}

#[test]
fn opaque_exchange_types_are_rejected_by_every_binder() -> Result<(), WirebindError> {
    for ty in [ExchangeType::Statement, ExchangeType::RowId, ExchangeType::Blob] {
        let mut stmt = StatementDriver::new(MemoryStatement::with_result(
            vec![column("n", WireType::Long, 4)],
            Vec::new(),
        ));
        stmt.prepare("select n from t")?;
        assert!(matches!(
            stmt.bind_result(1, ty, false),
            Err(WirebindError::ConfigError(_))
        ));
        assert!(matches!(
            stmt.bind_result_vector(1, ty, 3, false),
            Err(WirebindError::ConfigError(_))
        ));
    }
    Ok(())
}

#[test]
fn release_result_removes_the_binding_from_the_active_list() -> Result<(), WirebindError> {
    let rows = vec![vec![
        MemoryCell::from_bytes(5i32.to_le_bytes().to_vec()),
        MemoryCell::from_bytes(6i32.to_le_bytes().to_vec()),
    ]];
    let columns = vec![column("a", WireType::Long, 4), column("b", WireType::Long, 4)];
    let mut stmt = StatementDriver::new(MemoryStatement::with_result(columns, rows));
    stmt.prepare("select a, b from t")?;
    stmt.bind_result(1, ExchangeType::Int32, false)?;
    stmt.bind_result(2, ExchangeType::Int32, false)?;
    stmt.release_result(2);
    stmt.execute(1)?;
    assert_eq!(stmt.result_value(1)?, Some(&ExchangeValue::Int32(5)));
    assert!(matches!(
        stmt.result_value(2),
        Err(WirebindError::ConfigError(_))
    ));
    // Releasing again is harmless.
    stmt.release_result(2);
    Ok(())
}

#[test]
fn reprepare_clears_binder_registrations() -> Result<(), WirebindError> {
    let mut stmt = StatementDriver::new(MemoryStatement::echo());
    stmt.prepare("select :a")?;
    stmt.bind_parameter(BindTarget::Name("a"), ExchangeValue::Int32(1), None)?;
    stmt.prepare("select :b, :c")?;
    // The old registration is gone: executing now underfills the two
    // placeholders and the assembly check catches it.
    let err = stmt.execute(0).unwrap_err();
    assert!(matches!(err, WirebindError::ProtocolError { .. }));
    // And the binding mode was reset, so the addressing style may change.
    stmt.bind_parameter(BindTarget::Position(1), ExchangeValue::Int32(2), None)?;
    stmt.bind_parameter(BindTarget::Position(2), ExchangeValue::Int32(3), None)?;
    stmt.execute(0)?;
    assert_eq!(stmt.handle().executions(), 1);
    Ok(())
}

#[test]
fn clean_up_is_idempotent_and_closes_the_handle() -> Result<(), WirebindError> {
    let mut stmt = StatementDriver::new(MemoryStatement::echo());
    stmt.prepare("select :v")?;
    stmt.bind_parameter(BindTarget::Name("v"), ExchangeValue::Int32(3), None)?;
    stmt.execute(0)?;
    stmt.clean_up();
    stmt.clean_up();
    assert!(stmt.handle().is_closed());
    assert_eq!(stmt.get_affected_rows(), -1);
    assert!(matches!(
        stmt.execute(0),
        Err(WirebindError::InternalError(_))
    ));
    Ok(())
}

#[test]
fn statements_are_allocated_through_the_session() -> Result<(), WirebindError> {
    let mut session = MemorySession::new();
    let mut stmt = StatementDriver::allocate(&mut session)?;
    stmt.prepare("select 1")?;

    let mut failing = MemorySession::new();
    failing.fail_allocation(ProtocolDiag::new(2006, "server has gone away"));
    let err = StatementDriver::<MemoryStatement>::allocate(&mut failing).unwrap_err();
    assert!(err.is_connection_loss());
    assert!(err.to_string().contains("error allocating statement"));
    Ok(())
}

#[test]
fn invalid_calendar_value_on_the_wire_is_a_data_error() -> Result<(), WirebindError> {
    // The zero date: all calendar fields zero, which no civil time accepts.
    let rows = vec![vec![MemoryCell::from_bytes(vec![0u8; 12])]];
    let columns = vec![column("ts", WireType::Timestamp, 12)];
    let mut stmt = StatementDriver::new(MemoryStatement::with_result(columns, rows));
    stmt.prepare("select ts from t")?;
    stmt.bind_result(1, ExchangeType::Timestamp, true)?;
    stmt.execute(0)?;
    let err = stmt.fetch(1).unwrap_err();
    assert!(matches!(err, WirebindError::DataError(_)));
    Ok(())
}

#[test]
fn reexecution_reuses_the_cached_shape_and_counts_rows() -> Result<(), WirebindError> {
    let rows = vec![vec![MemoryCell::from_bytes(11i32.to_le_bytes().to_vec())]];
    let mut stmt = StatementDriver::new(MemoryStatement::with_result(
        vec![column("n", WireType::Long, 4)],
        rows,
    ));
    stmt.prepare("select n from t")?;
    assert_eq!(stmt.describe()?.column_count(), 1);
    stmt.bind_result(1, ExchangeType::Int32, false)?;

    let exec = stmt.execute(1)?;
    assert!(exec.has_result_set);
    assert_eq!(stmt.get_number_of_rows(), 1);
    assert_eq!(stmt.result_value(1)?, Some(&ExchangeValue::Int32(11)));

    // Execute again without a fresh describe; the cached shape serves.
    let exec = stmt.execute(1)?;
    assert!(exec.has_result_set);
    assert_eq!(stmt.get_number_of_rows(), 1);
    assert_eq!(stmt.result_value(1)?, Some(&ExchangeValue::Int32(11)));
    Ok(())
}
