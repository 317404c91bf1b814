use crate::db::models::{NewLogRow, NewStateRow};
use crate::schema;
use diesel::PgConnection;
use diesel::prelude::*;

pub fn insert_log_rows(conn: &mut PgConnection, rows: &[NewLogRow]) -> Result<usize, String> {
    if rows.is_empty() {
        return Ok(0);
    }

    use schema::historical_log::dsl as L;

    diesel::insert_into(L::historical_log)
        .values(rows)
        .execute(conn)
        .map_err(|e| format!("insert log rows failed: {}", e))
}

/// Replace the snapshot row of every (parameter, asset) pair in `rows`.
pub fn replace_state(conn: &mut PgConnection, rows: &[NewStateRow]) -> Result<usize, String> {
    if rows.is_empty() {
        return Ok(0);
    }

    use schema::latest_state::dsl as S;

    conn.transaction::<usize, diesel::result::Error, _>(|conn| {
        for row in rows {
            diesel::delete(S::latest_state.filter(S::parameter.eq(&row.parameter).and(S::asset.eq(&row.asset))))
                .execute(conn)?;
        }
        diesel::insert_into(S::latest_state).values(rows).execute(conn)
    })
    .map_err(|e| format!("replace state rows failed: {}", e))
}
