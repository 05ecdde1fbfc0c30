pub const SCHEMA: &str = r#"
-- Key-value entries written by the photo store.
-- rowid preserves insertion order for listing.
CREATE TABLE IF NOT EXISTS entries (
    key TEXT NOT NULL UNIQUE,
    value TEXT NOT NULL
);
"#;
