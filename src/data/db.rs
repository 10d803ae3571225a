use diesel::{
    connection::SimpleConnection,
    r2d2::{ConnectionManager, CustomizeConnection, Pool},
    SqliteConnection,
};

use crate::DbPool;

const SCHEMA: &str = include_str!("schema.sql");

/// Applied to every connection the pool hands out. SQLite keeps these
/// pragmas per connection, so they can't be set once at startup.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn init_pool(database_url: &str, max_size: u32) -> Result<DbPool, r2d2::Error> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
}

/// Creates every table the app needs. Safe to run on each start.
pub fn create_schema(conn: &mut SqliteConnection) -> diesel::QueryResult<()> {
    conn.batch_execute(SCHEMA)
}

#[cfg(test)]
pub fn test_pool() -> DbPool {
    // Every `:memory:` connection is its own database, so the pool must
    // never open a second one.
    let pool = init_pool(":memory:", 1).expect("in-memory pool");
    let mut conn = pool.get().expect("connection");
    create_schema(&mut conn).expect("schema");
    pool
}
