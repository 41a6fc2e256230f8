//! Error mapping shared by the table modules

use sqlx::sqlite::SqliteRow;

use taskmart_types::prelude::*;

pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a driver error; `RowNotFound` becomes `Error::NotFound`
pub(crate) fn db_err(err: sqlx::Error) -> Error {
	match err {
		sqlx::Error::RowNotFound => Error::NotFound,
		err => {
			inspect(&err);
			Error::DbError
		}
	}
}

pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> ClResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(err) => Err(db_err(err)),
	}
}

pub(crate) fn collect_res<T, F>(rows: Vec<SqliteRow>, f: F) -> ClResult<Vec<T>>
where
	F: Fn(SqliteRow) -> Result<T, sqlx::Error>,
{
	rows.into_iter().map(|row| f(row).inspect_err(inspect).map_err(|_| Error::DbError)).collect()
}

// vim: ts=4
