// shared test helpers - a throwaway sqlite database

#![allow(dead_code)]

use gene::{DatabaseConfig, Db};
use std::time::Duration;
use tempfile::TempDir;

pub struct TempDb {
    pub db: Db,
    // keeps the directory alive for the test
    pub dir: TempDir,
}

pub async fn temp_db() -> TempDb {
    let dir = tempfile::tempdir().unwrap();
    let config =
        DatabaseConfig::sqlite(dir.path().join("test.db")).with_timeout(Duration::from_secs(5));
    let db = Db::connect(&config).await.unwrap();
    TempDb { db, dir }
}

// a small WORKORDER table with three rows
pub async fn workorder_db() -> TempDb {
    let temp = temp_db().await;
    temp.db
        .execute(
            "CREATE TABLE WORKORDER (ID INTEGER PRIMARY KEY, ORGID VARCHAR(20), STATUS VARCHAR(20))",
        )
        .await
        .unwrap();
    temp.db
        .execute(
            "INSERT INTO WORKORDER (ID, ORGID, STATUS) VALUES
                (1, 'ORG-100', 'OPEN'),
                (2, 'ORG-100', 'CLOSED'),
                (3, 'ORG-200', 'OPEN')",
        )
        .await
        .unwrap();
    temp
}
