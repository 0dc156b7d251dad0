use crate::models::TransactionCount;
use chrono::NaiveDate;
use sqlx::SqliteConnection;

/// Highest cumulative total recorded strictly before `before`, or 0.
pub async fn previous_max_total(
    conn: &mut SqliteConnection,
    address_id: i64,
    before: NaiveDate,
) -> Result<i64, sqlx::Error> {
    let max: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(total_transactions) FROM transaction_counts
         WHERE address_id = ? AND date < ?"
    )
    .bind(address_id)
    .bind(before)
    .fetch_one(&mut *conn)
    .await?;

    Ok(max.unwrap_or(0))
}

/// Inserts the row, replacing any existing row for the same address and day.
pub async fn upsert(conn: &mut SqliteConnection, row: &TransactionCount) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO transaction_counts (address_id, date, total_transactions, daily_transactions)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(address_id, date) DO UPDATE SET
            total_transactions = excluded.total_transactions,
            daily_transactions = excluded.daily_transactions
        "#
    )
    .bind(row.address_id)
    .bind(row.date)
    .bind(row.total_transactions)
    .bind(row.daily_transactions)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts the row unless one already exists for that address and day.
/// Returns whether a row was written.
pub async fn insert_if_absent(
    conn: &mut SqliteConnection,
    row: &TransactionCount,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO transaction_counts (address_id, date, total_transactions, daily_transactions)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(address_id, date) DO NOTHING
        "#
    )
    .bind(row.address_id)
    .bind(row.date)
    .bind(row.total_transactions)
    .bind(row.daily_transactions)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Sum of daily deltas with `start <= date <= end`.
pub async fn sum_daily(
    conn: &mut SqliteConnection,
    address_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(daily_transactions), 0) FROM transaction_counts
         WHERE address_id = ? AND date >= ? AND date <= ?"
    )
    .bind(address_id)
    .bind(start)
    .bind(end)
    .fetch_one(&mut *conn)
    .await
}

pub async fn history(
    conn: &mut SqliteConnection,
    address_id: i64,
) -> Result<Vec<TransactionCount>, sqlx::Error> {
    sqlx::query_as::<_, TransactionCount>(
        "SELECT address_id, date, total_transactions, daily_transactions
         FROM transaction_counts
         WHERE address_id = ?
         ORDER BY date ASC"
    )
    .bind(address_id)
    .fetch_all(&mut *conn)
    .await
}
