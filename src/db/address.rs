use crate::models::Address;
use sqlx::SqliteConnection;

/// Returns the address row, inserting it first if it does not exist yet.
///
/// The insert runs before the lookup so that, inside a transaction, the write
/// lock is taken up front and concurrent creators fall back to the existing row.
pub async fn get_or_create(
    conn: &mut SqliteConnection,
    chain_name: &str,
    address: &str,
    app_name: &str,
) -> Result<Address, sqlx::Error> {
    sqlx::query(
        "INSERT INTO addresses (chain_name, address, app_name) VALUES (?, ?, ?)
         ON CONFLICT(chain_name, address, app_name) DO NOTHING"
    )
    .bind(chain_name)
    .bind(address)
    .bind(app_name)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, Address>(
        "SELECT id, chain_name, address, app_name FROM addresses
         WHERE chain_name = ? AND address = ? AND app_name = ?"
    )
    .bind(chain_name)
    .bind(address)
    .bind(app_name)
    .fetch_one(&mut *conn)
    .await
}

/// Returns the row that owns the history of `address`, the oldest row with
/// that address value whatever its chain or app. A new row for the given
/// chain and app is inserted only when the address has never been seen.
///
/// Like [`get_or_create`], the first statement is a write.
pub async fn resolve(
    conn: &mut SqliteConnection,
    chain_name: &str,
    address: &str,
    app_name: &str,
) -> Result<Address, sqlx::Error> {
    sqlx::query(
        "INSERT INTO addresses (chain_name, address, app_name)
         SELECT ?, ?, ?
         WHERE NOT EXISTS (SELECT 1 FROM addresses WHERE address = ?)"
    )
    .bind(chain_name)
    .bind(address)
    .bind(app_name)
    .bind(address)
    .execute(&mut *conn)
    .await?;

    find_by_address(conn, address)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_by_address(
    conn: &mut SqliteConnection,
    address: &str,
) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as::<_, Address>(
        "SELECT id, chain_name, address, app_name FROM addresses
         WHERE address = ?
         ORDER BY id ASC
         LIMIT 1"
    )
    .bind(address)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM addresses")
        .fetch_one(&mut *conn)
        .await
}
