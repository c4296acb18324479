//! Introspection SQL issued by the PostgreSQL tool set.

/// Tables in a schema, name-ordered.
pub const LIST_TABLES_QUERY: &str = "\
SELECT
  table_name,
  table_type
FROM information_schema.tables
WHERE table_schema = $1
ORDER BY table_name";

/// Column layout of one table, in ordinal position order.
pub const DESCRIBE_TABLE_QUERY: &str = "\
SELECT
  column_name,
  data_type,
  is_nullable,
  column_default,
  character_maximum_length,
  numeric_precision,
  numeric_scale
FROM information_schema.columns
WHERE table_schema = $1 AND table_name = $2
ORDER BY ordinal_position";
