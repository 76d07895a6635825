use crate::error::StoreError;

/// Get a required column value from a row, returning CorruptRow on failure.
pub fn get<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Get an optional column value.
pub fn get_opt<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<Option<T>, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn get_maps_type_mismatch_to_corrupt_row() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT); INSERT INTO t VALUES ('not a number');")
            .unwrap();

        let result: Result<i64, StoreError> = conn
            .query_row("SELECT v FROM t", [], |row| {
                Ok(get::<i64>(row, 0, "t", "v"))
            })
            .unwrap();
        assert!(matches!(
            result,
            Err(StoreError::CorruptRow { table: "t", column: "v", .. })
        ));
    }

    #[test]
    fn get_opt_passes_null_through() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT); INSERT INTO t VALUES (NULL);")
            .unwrap();

        let result: Option<String> = conn
            .query_row("SELECT v FROM t", [], |row| {
                Ok(get_opt::<String>(row, 0, "t", "v").unwrap())
            })
            .unwrap();
        assert!(result.is_none());
    }
}
