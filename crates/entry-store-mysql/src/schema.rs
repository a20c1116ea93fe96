//! DDL for the pooled store. Row creation belongs to the import.

pub const CREATE_DATA: &str = "
CREATE TABLE IF NOT EXISTS data (
    reg         VARCHAR(64)  NOT NULL PRIMARY KEY,
    name        VARCHAR(255) NOT NULL,
    email       VARCHAR(255) NULL,
    phone       VARCHAR(32)  NULL,
    gender      VARCHAR(8)   NULL,
    status      TINYINT(1)   NOT NULL DEFAULT 0,
    timestamp   DATETIME(6)  NULL,
    search_str  TEXT         NULL
)";
