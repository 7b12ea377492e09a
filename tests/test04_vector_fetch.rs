use wirebind::prelude::*;
use wirebind::testing::{MemoryCell, MemoryStatement};

fn text_column(name: &str, length: usize) -> ColumnMeta {
    ColumnMeta {
        name: name.to_string(),
        wire_type: WireType::String,
        length,
    }
}

fn int_column(name: &str) -> ColumnMeta {
    ColumnMeta {
        name: name.to_string(),
        wire_type: WireType::Long,
        length: 4,
    }
}

fn int_cell(value: i32) -> MemoryCell {
    MemoryCell::from_bytes(value.to_le_bytes().to_vec())
}

#[test]
fn columnar_bulk_fetch_fills_whole_batches() -> Result<(), WirebindError> {
    let rows = (1..=5).map(|i| vec![int_cell(i * 10)]).collect();
    let mut stmt =
        StatementDriver::new(MemoryStatement::with_result(vec![int_column("n")], rows));
    stmt.prepare("select n from t")?;
    stmt.bind_result_vector(1, ExchangeType::Int32, 2, false)?;
    stmt.execute(0)?;

    let first = stmt.fetch(2)?;
    assert_eq!(first.rows_fetched, 2);
    assert!(!first.exhausted);
    assert_eq!(stmt.vector_result(1)?.as_int32(), Some(&[10, 20][..]));

    let second = stmt.fetch(2)?;
    assert_eq!(second.rows_fetched, 2);
    assert_eq!(stmt.vector_result(1)?.as_int32(), Some(&[30, 40][..]));

    // The source runs dry mid-batch: rows actually retrieved, not rows
    // requested.
    let third = stmt.fetch(2)?;
    assert_eq!(third.rows_fetched, 1);
    assert!(third.exhausted);
    assert_eq!(stmt.get_number_of_rows(), 1);
    assert_eq!(stmt.vector_result(1)?.as_int32().unwrap()[0], 50);

    let after = stmt.fetch(2)?;
    assert_eq!(after.rows_fetched, 0);
    assert!(after.exhausted);
    Ok(())
}

#[test]
fn trailing_pad_spaces_are_trimmed_but_embedded_spaces_survive() -> Result<(), WirebindError> {
    let rows = vec![
        vec![MemoryCell::from_text("AB  ")],
        vec![MemoryCell::from_text("A B")],
    ];
    let mut stmt =
        StatementDriver::new(MemoryStatement::with_result(vec![text_column("s", 4)], rows));
    stmt.prepare("select s from t")?;
    stmt.describe()?;
    stmt.bind_result_vector(1, ExchangeType::Text, 2, false)?;
    stmt.execute(0)?;
    stmt.fetch(2)?;
    let values = stmt.vector_result(1)?.as_text().unwrap().to_vec();
    assert_eq!(values, ["AB", "A B"]);
    Ok(())
}

#[test]
fn null_rows_report_null_without_truncation() -> Result<(), WirebindError> {
    let rows = vec![
        vec![MemoryCell::from_text("one")],
        vec![MemoryCell::null()],
        vec![MemoryCell::from_text("three")],
    ];
    let mut stmt =
        StatementDriver::new(MemoryStatement::with_result(vec![text_column("s", 8)], rows));
    stmt.prepare("select s from t")?;
    stmt.describe()?;
    stmt.bind_result_vector(1, ExchangeType::Text, 3, true)?;
    stmt.execute(0)?;
    stmt.fetch(3)?;
    assert_eq!(
        stmt.vector_indicators(1)?.unwrap(),
        [Indicator::Ok, Indicator::Null, Indicator::Ok]
    );
    let values = stmt.vector_result(1)?.as_text().unwrap();
    assert_eq!(values[1], "");
    assert_eq!(values[2], "three");
    Ok(())
}

#[test]
fn null_row_without_indicator_sink_is_a_data_error() -> Result<(), WirebindError> {
    let rows = vec![vec![MemoryCell::null()]];
    let mut stmt =
        StatementDriver::new(MemoryStatement::with_result(vec![int_column("n")], rows));
    stmt.prepare("select n from t")?;
    stmt.bind_result_vector(1, ExchangeType::Int32, 1, false)?;
    stmt.execute(0)?;
    let err = stmt.fetch(1).unwrap_err();
    assert!(matches!(err, WirebindError::DataError(_)));
    Ok(())
}

#[test]
fn oversized_values_come_back_truncated_not_failed() -> Result<(), WirebindError> {
    let rows = vec![vec![MemoryCell::from_text("ABCDEFG")]];
    let mut stmt =
        StatementDriver::new(MemoryStatement::with_result(vec![text_column("s", 4)], rows));
    stmt.prepare("select s from t")?;
    stmt.describe()?;
    stmt.bind_result_vector(1, ExchangeType::Text, 1, true)?;
    stmt.execute(0)?;
    let fetched = stmt.fetch(1)?;
    assert_eq!(fetched.rows_fetched, 1);
    assert_eq!(stmt.vector_indicators(1)?.unwrap(), [Indicator::Truncated]);
    // Stride-limited prefix: declared width + 1 bytes of buffer.
    assert_eq!(stmt.vector_result(1)?.as_text().unwrap()[0], "ABCDE");
    Ok(())
}

#[test]
fn resize_keeps_every_parallel_array_in_lock_step() -> Result<(), WirebindError> {
    let rows = (1..=6).map(|i| vec![int_cell(i)]).collect();
    let mut stmt =
        StatementDriver::new(MemoryStatement::with_result(vec![int_column("n")], rows));
    stmt.prepare("select n from t")?;
    stmt.bind_result_vector(1, ExchangeType::Int32, 2, true)?;
    stmt.execute(0)?;

    // Growing the request grows destination and indicators together.
    stmt.fetch(4)?;
    assert_eq!(stmt.vector_result(1)?.len(), 4);
    assert_eq!(stmt.vector_indicators(1)?.unwrap().len(), 4);

    // Shrinking does too.
    stmt.fetch(1)?;
    assert_eq!(stmt.vector_result(1)?.len(), 1);
    assert_eq!(stmt.vector_indicators(1)?.unwrap().len(), 1);
    Ok(())
}

#[test]
fn multi_column_batches_stay_aligned() -> Result<(), WirebindError> {
    let rows = vec![
        vec![int_cell(1), MemoryCell::from_text("one")],
        vec![int_cell(2), MemoryCell::from_text("two")],
    ];
    let columns = vec![int_column("id"), text_column("name", 8)];
    let mut stmt = StatementDriver::new(MemoryStatement::with_result(columns, rows));
    stmt.prepare("select id, name from t")?;
    stmt.describe()?;
    stmt.bind_result_vector(1, ExchangeType::Int32, 2, false)?;
    stmt.bind_result_vector(2, ExchangeType::Text, 2, false)?;
    stmt.execute(0)?;
    stmt.fetch(2)?;
    assert_eq!(stmt.vector_result(1)?.as_int32(), Some(&[1, 2][..]));
    assert_eq!(
        stmt.vector_result(2)?.as_text().unwrap(),
        ["one", "two"]
    );
    Ok(())
}

#[test]
fn bulk_round_trip_through_the_echo_double() -> Result<(), WirebindError> {
    let mut stmt = StatementDriver::new(MemoryStatement::echo());
    stmt.prepare("select :a, :b")?;
    stmt.bind_parameter_vector(
        BindTarget::Name("a"),
        VectorValue::Int32(vec![7, 8, 9]),
        None,
    )?;
    stmt.bind_parameter_vector(
        BindTarget::Name("b"),
        VectorValue::Text(vec!["ix".to_string(), "x".to_string(), "xi".to_string()]),
        None,
    )?;
    stmt.execute(0)?;
    stmt.describe()?;
    stmt.bind_result_vector(1, ExchangeType::Int32, 3, false)?;
    stmt.bind_result_vector(2, ExchangeType::Text, 3, false)?;
    let fetched = stmt.fetch(3)?;
    assert_eq!(fetched.rows_fetched, 3);
    assert_eq!(stmt.vector_result(1)?.as_int32(), Some(&[7, 8, 9][..]));
    assert_eq!(
        stmt.vector_result(2)?.as_text().unwrap(),
        ["ix", "x", "xi"]
    );
    Ok(())
}

#[test]
fn zero_length_result_vector_fails_at_bind_time() -> Result<(), WirebindError> {
    let mut stmt = StatementDriver::new(MemoryStatement::with_result(
        vec![int_column("n")],
        Vec::new(),
    ));
    stmt.prepare("select n from t")?;
    let err = stmt
        .bind_result_vector(1, ExchangeType::Int32, 0, false)
        .unwrap_err();
    assert!(matches!(err, WirebindError::ConfigError(_)));
    Ok(())
}
