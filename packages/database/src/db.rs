//! Database connection utilities.

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::{Credentials, init_sqlite_rusqlite};

use crate::StoreError;

/// Opens a database connection for `url`.
///
/// `postgres://` and `postgresql://` URLs connect to `PostgreSQL` with a
/// 30-second `statement_timeout`. `sqlite://<path>` or a bare path opens
/// (or creates) a `SQLite` file, creating its parent directory if needed.
///
/// # Errors
///
/// Returns [`StoreError::Connection`] if the URL cannot be parsed or the
/// connection fails.
pub async fn connect(url: &str) -> Result<Box<dyn Database>, StoreError> {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return connect_postgres(url).await;
    }

    let path = url.strip_prefix("sqlite://").unwrap_or(url);
    connect_sqlite(Path::new(path))
}

async fn connect_postgres(url: &str) -> Result<Box<dyn Database>, StoreError> {
    // Strip query parameters (e.g., ?sslmode=require) that the Credentials
    // parser doesn't understand. TLS is handled by the native-tls connector.
    let url_base = url.split('?').next().unwrap_or(url);

    let creds = Credentials::from_url(url_base).map_err(|e| StoreError::Connection {
        message: e.to_string(),
    })?;
    let db = switchy_database_connection::init_postgres_raw_native_tls(creds)
        .await
        .map_err(|e| StoreError::Connection {
            message: e.to_string(),
        })?;

    // Report creation waits on the insert; don't let a stalled remote hang it.
    db.exec_raw("SET statement_timeout = '30s'").await?;

    log::info!("Connected to PostgreSQL");
    Ok(db)
}

fn connect_sqlite(path: &Path) -> Result<Box<dyn Database>, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| StoreError::Connection {
        message: e.to_string(),
    })?;

    log::info!("Opened SQLite database at {}", path.display());
    Ok(db)
}
