//! Metadata SQL for each relational dialect.
//!
//! Entity and database names are always bound as parameters. Describe
//! queries return the same six columns in every dialect so their tables look
//! alike.

use std::fmt;

/// SQL dialect of a relational engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

const POSTGRES_LIST: &str = r#"
SELECT table_name::text
FROM information_schema.tables
WHERE table_schema = current_schema() AND table_type = 'BASE TABLE'
ORDER BY table_name
"#;

const POSTGRES_DESCRIBE: &str = r#"
SELECT
    UPPER(c.column_name::text) AS column_name,
    c.data_type::text AS data_type,
    CASE WHEN c.is_nullable = 'YES' THEN '○' ELSE '●' END AS not_null,
    COALESCE(CAST(c.character_maximum_length AS TEXT), '-') AS length,
    CASE
        WHEN tc.constraint_type = 'PRIMARY KEY' THEN '◆ PRIMARY KEY'
        WHEN tc.constraint_type = 'FOREIGN KEY' THEN '◇ FOREIGN KEY'
        ELSE '-'
    END AS constraint_type,
    CASE
        WHEN tc.constraint_type = 'FOREIGN KEY'
            THEN '→ ' || kcu2.table_name::text || '.' || kcu2.column_name::text
        ELSE '-'
    END AS referenced_table_column
FROM information_schema.columns AS c
LEFT JOIN information_schema.key_column_usage AS kcu
    ON c.column_name = kcu.column_name
    AND c.table_name = kcu.table_name
    AND c.table_schema = kcu.table_schema
LEFT JOIN information_schema.table_constraints AS tc
    ON kcu.constraint_name = tc.constraint_name
    AND kcu.table_schema = tc.table_schema
    AND kcu.table_name = tc.table_name
LEFT JOIN information_schema.referential_constraints AS rc
    ON tc.constraint_name = rc.constraint_name
    AND tc.table_schema = rc.constraint_schema
LEFT JOIN information_schema.key_column_usage AS kcu2
    ON rc.unique_constraint_name = kcu2.constraint_name
    AND rc.unique_constraint_schema = kcu2.table_schema
WHERE c.table_schema = current_schema() AND lower(c.table_name::text) = lower($1)
ORDER BY c.ordinal_position
"#;

const MYSQL_LIST: &str = r#"
SELECT table_name
FROM information_schema.tables
WHERE table_schema = COALESCE(NULLIF(?, ''), DATABASE()) AND table_type = 'BASE TABLE'
ORDER BY table_name
"#;

// MySQL names every primary key constraint PRIMARY, so the referenced
// column comes from key_column_usage instead of referential_constraints.
const MYSQL_DESCRIBE: &str = r#"
SELECT
    UPPER(c.column_name) AS column_name,
    c.data_type AS data_type,
    CASE WHEN c.is_nullable = 'YES' THEN '○' ELSE '●' END AS not_null,
    COALESCE(CAST(c.character_maximum_length AS CHAR), '-') AS length,
    CASE
        WHEN tc.constraint_type = 'PRIMARY KEY' THEN '◆ PRIMARY KEY'
        WHEN tc.constraint_type = 'FOREIGN KEY' THEN '◇ FOREIGN KEY'
        ELSE '-'
    END AS constraint_type,
    CASE
        WHEN tc.constraint_type = 'FOREIGN KEY'
            THEN CONCAT('→ ', kcu.referenced_table_name, '.', kcu.referenced_column_name)
        ELSE '-'
    END AS referenced_table_column
FROM information_schema.columns AS c
LEFT JOIN information_schema.key_column_usage AS kcu
    ON c.column_name = kcu.column_name
    AND c.table_name = kcu.table_name
    AND c.table_schema = kcu.table_schema
LEFT JOIN information_schema.table_constraints AS tc
    ON kcu.constraint_name = tc.constraint_name
    AND kcu.table_schema = tc.table_schema
    AND kcu.table_name = tc.table_name
WHERE c.table_schema = COALESCE(NULLIF(?, ''), DATABASE())
    AND LOWER(c.table_name) = LOWER(?)
ORDER BY c.ordinal_position
"#;

const SQLITE_LIST: &str = r#"
SELECT name
FROM sqlite_master
WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
ORDER BY name
"#;

const SQLITE_DESCRIBE: &str = r#"
SELECT
    UPPER(p.name) AS column_name,
    p.type AS data_type,
    CASE WHEN p."notnull" = 1 OR p.pk > 0 THEN '●' ELSE '○' END AS not_null,
    '-' AS length,
    CASE
        WHEN p.pk > 0 THEN '◆ PRIMARY KEY'
        WHEN fk."from" IS NOT NULL THEN '◇ FOREIGN KEY'
        ELSE '-'
    END AS constraint_type,
    CASE
        WHEN fk."from" IS NOT NULL
            THEN '→ ' || fk."table" || COALESCE('.' || fk."to", '')
        ELSE '-'
    END AS referenced_table_column
FROM pragma_table_info(?1) AS p
LEFT JOIN pragma_foreign_key_list(?1) AS fk ON fk."from" = p.name
ORDER BY p.cid
"#;

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Query returning one entity name per row. Bind [`Self::list_entities_binds`].
    pub fn list_entities_sql(&self) -> &'static str {
        match self {
            Self::Postgres => POSTGRES_LIST,
            Self::MySql => MYSQL_LIST,
            Self::Sqlite => SQLITE_LIST,
        }
    }

    /// Column introspection query. Bind [`Self::describe_entity_binds`].
    pub fn describe_entity_sql(&self) -> &'static str {
        match self {
            Self::Postgres => POSTGRES_DESCRIBE,
            Self::MySql => MYSQL_DESCRIBE,
            Self::Sqlite => SQLITE_DESCRIBE,
        }
    }

    /// Parameters of the list query.
    ///
    /// MySQL scopes metadata by `database`, falling back to the connection's
    /// default database when it is empty. The other dialects ignore it.
    pub fn list_entities_binds<'a>(&self, database: &'a str) -> Vec<&'a str> {
        match self {
            Self::MySql => vec![database],
            Self::Postgres | Self::Sqlite => Vec::new(),
        }
    }

    /// Parameters of the describe query, in placeholder order.
    pub fn describe_entity_binds<'a>(&self, database: &'a str, entity: &'a str) -> Vec<&'a str> {
        match self {
            Self::MySql => vec![database, entity],
            Self::Postgres | Self::Sqlite => vec![entity],
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Dialect; 3] = [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite];

    #[test]
    fn test_describe_queries_bind_the_entity_name() {
        assert!(Dialect::Postgres.describe_entity_sql().contains("$1"));
        assert!(Dialect::MySql.describe_entity_sql().contains("LOWER(?)"));
        assert!(Dialect::Sqlite.describe_entity_sql().contains("pragma_table_info(?1)"));
    }

    #[test]
    fn test_describe_queries_share_column_aliases() {
        for dialect in ALL {
            let sql = dialect.describe_entity_sql();
            for alias in [
                "AS column_name",
                "AS data_type",
                "AS not_null",
                "AS length",
                "AS constraint_type",
                "AS referenced_table_column",
            ] {
                assert!(sql.contains(alias), "{dialect} is missing {alias}");
            }
        }
    }

    #[test]
    fn test_list_query_placeholders_match_binds() {
        assert!(Dialect::MySql.list_entities_sql().contains("NULLIF(?, '')"));
        assert_eq!(Dialect::MySql.list_entities_binds("app"), vec!["app"]);

        for dialect in [Dialect::Postgres, Dialect::Sqlite] {
            let sql = dialect.list_entities_sql();
            assert!(!sql.contains('?') && !sql.contains("$1"), "{dialect}");
            assert!(dialect.list_entities_binds("app").is_empty());
        }
    }

    #[test]
    fn test_describe_binds_follow_placeholder_order() {
        assert_eq!(
            Dialect::MySql.describe_entity_binds("app", "users"),
            vec!["app", "users"]
        );
        assert_eq!(Dialect::MySql.describe_entity_sql().matches('?').count(), 2);
        assert_eq!(Dialect::Postgres.describe_entity_binds("app", "users"), vec!["users"]);
        assert_eq!(Dialect::Sqlite.describe_entity_binds("", "users"), vec!["users"]);
    }

    #[test]
    fn test_nullability_markers() {
        for dialect in ALL {
            let sql = dialect.describe_entity_sql();
            assert!(sql.contains("'○'"), "{dialect}");
            assert!(sql.contains("'●'"), "{dialect}");
        }
    }
}
