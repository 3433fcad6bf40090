use super::ReplayError;
use crate::mask::{LumiRange, Mask};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, error, info};

pub const SQL_SCHEMA: [&str; 2] = [
    "create table if not exists failed_units (
    id integer primary key,

    reference text not null,
    run integer not null,
    lumi_first integer not null,
    lumi_last integer not null
);",
    "create index if not exists failed_units_reference on failed_units (reference);",
];
pub const SQL_SCHEMA_NUMBER: usize = SQL_SCHEMA.len();

/// SQLite backed replay store
///
/// The execution layer records failed units through `record`; the split
/// engine only ever reads through `failed_units`.
#[derive(Debug)]
pub struct SQLiteReplayStore {
    connection: Connection,
}

impl SQLiteReplayStore {
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        let store = Self {
            connection: Connection::open(path)?,
        };
        store.init()?;

        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, ReplayError> {
        let store = Self {
            connection: Connection::open_in_memory()?,
        };
        store.init()?;

        Ok(store)
    }

    fn init(&self) -> Result<(), ReplayError> {
        let mut counter = 1;

        for table in SQL_SCHEMA {
            match self.connection.execute(table, []) {
                Ok(_) => debug!("Applied SQL schema ({counter}/{SQL_SCHEMA_NUMBER})"),
                Err(error) => {
                    error!(error = ?error, table = table, "Failed to apply SQL schema ({counter}/{SQL_SCHEMA_NUMBER}): {error}");

                    return Err(ReplayError::SQLite(error));
                }
            };

            counter += 1;
        }

        Ok(())
    }

    /// record one failed range, execution layer side
    pub fn record(&self, reference: &str, run: u32, range: LumiRange) -> Result<(), ReplayError> {
        let id: i64 = self
            .connection
            .prepare_cached(
                "insert into failed_units
                 (reference, run, lumi_first, lumi_last)
                 values (?, ?, ?, ?) returning id",
            )?
            .query_row(
                params![reference, run, range.first(), range.last()],
                |row| row.get(0),
            )?;

        debug!(id = id, reference = %reference, "Recorded failed unit");

        Ok(())
    }

    pub fn failed_units(&self, reference: &str) -> Result<Mask, ReplayError> {
        let mut mask = Mask::default();

        let ranges = self
            .connection
            .prepare_cached(
                "select run, lumi_first, lumi_last from failed_units
                 where reference = ? order by run, lumi_first",
            )?
            .query_map(params![reference], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .try_fold(Vec::new(), |mut init, result| {
                init.push(result?);

                Ok::<Vec<(u32, u32, u32)>, ReplayError>(init)
            })?;

        for (run, first, last) in ranges {
            match LumiRange::new(first, last) {
                Ok(range) => mask.add_ranges(run, [range]),
                // an inverted row can only come from a broken writer, skip it loudly
                Err(error) => {
                    error!(error = ?error, run = run, "Dropped malformed failed unit: {error}")
                }
            }
        }

        Ok(mask)
    }

    pub fn close(self) -> Result<(), ReplayError> {
        match self.connection.close() {
            Ok(()) => {
                info!("Closed SQLite replay store");

                Ok(())
            }
            Err((_, error)) => {
                error!(error = ?error, "Failed to close SQLite replay store: {error}");

                Err(ReplayError::SQLite(error))
            }
        }
    }
}
