use sea_orm::DatabaseBackend;
use wp_connector_api::{SinkReason, SinkResult};

use super::converter::bytea_literal;
use crate::common::RowType;
use crate::jdbc::{JdbcColumnConverter, JdbcConf, JdbcDialect, RowConverter};

const GREENPLUM_JDBC_PREFIX: &str = "jdbc:pivotal:greenplum://";
const POSTGRES_PREFIXES: [&str; 3] = ["jdbc:postgresql://", "postgresql://", "postgres://"];

#[derive(Debug, Default, Clone, Copy)]
pub struct GreenplumDialect;

/// 解析后的连接位置
#[derive(Debug, PartialEq, Eq)]
struct Location {
    credentials: Option<String>,
    host: String,
    database: String,
    query: String,
}

impl GreenplumDialect {
    fn parse_location(raw: &str) -> SinkResult<Location> {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix(GREENPLUM_JDBC_PREFIX) {
            // host:port;DatabaseName=db;key=value
            let mut parts = rest.split(';');
            let host = parts.next().unwrap_or("").trim().to_string();
            let database = parts
                .filter_map(|p| p.split_once('='))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("databasename"))
                .map(|(_, v)| v.trim().to_string())
                .unwrap_or_default();
            return Self::checked(Location {
                credentials: None,
                host,
                database,
                query: String::new(),
            });
        }
        let rest = POSTGRES_PREFIXES
            .iter()
            .find_map(|prefix| raw.strip_prefix(prefix))
            .ok_or_else(|| SinkReason::sink(format!("unsupported greenplum jdbcUrl '{raw}'")))?;
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let (credentials, host) = match authority.rsplit_once('@') {
            Some((creds, host)) => (Some(creds.to_string()), host.to_string()),
            None => (None, authority.to_string()),
        };
        let (database, query) = match path.split_once('?') {
            Some((db, q)) => (db.to_string(), format!("?{q}")),
            None => (path.to_string(), String::new()),
        };
        Self::checked(Location {
            credentials,
            host,
            database,
            query,
        })
    }

    fn checked(location: Location) -> SinkResult<Location> {
        if location.host.is_empty() {
            return Err(SinkReason::sink("greenplum jdbcUrl must name a host").into());
        }
        if location.database.trim().is_empty() {
            return Err(SinkReason::sink("greenplum jdbcUrl must name a database").into());
        }
        Ok(location)
    }
}

impl JdbcDialect for GreenplumDialect {
    fn name(&self) -> &'static str {
        "greenplum"
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn database_url(&self, conf: &JdbcConf) -> SinkResult<String> {
        let location = Self::parse_location(&conf.jdbc_url)?;
        let credentials = if !conf.username.is_empty() {
            let user = urlencoding::encode(&conf.username);
            if conf.password.is_empty() {
                format!("{user}@")
            } else {
                format!("{user}:{}@", urlencoding::encode(&conf.password))
            }
        } else {
            location
                .credentials
                .map(|c| format!("{c}@"))
                .unwrap_or_default()
        };
        Ok(format!(
            "postgres://{credentials}{}/{}{}",
            location.host, location.database, location.query
        ))
    }

    fn column_converter(&self, row_type: &RowType) -> Box<dyn RowConverter> {
        Box::new(JdbcColumnConverter::new(row_type.clone()).with_binary_literal(bytea_literal))
    }

    fn upsert_clause(&self, unique_key: &[String], columns: &[String]) -> Option<String> {
        if unique_key.is_empty() {
            return None;
        }
        let keys = unique_key
            .iter()
            .map(|k| self.quote_identifier(k))
            .collect::<Vec<_>>()
            .join(", ");
        let updates = columns
            .iter()
            .filter(|c| !unique_key.contains(c))
            .map(|c| {
                let col = self.quote_identifier(c);
                format!("{col} = EXCLUDED.{col}")
            })
            .collect::<Vec<_>>();
        if updates.is_empty() {
            return Some(format!("ON CONFLICT ({keys}) DO NOTHING"));
        }
        Some(format!(
            "ON CONFLICT ({keys}) DO UPDATE SET {}",
            updates.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conf(url: &str, username: &str, password: &str) -> JdbcConf {
        JdbcConf {
            jdbc_url: url.into(),
            username: username.into(),
            password: password.into(),
            table: "orders".into(),
            ..JdbcConf::default()
        }
    }

    #[test]
    fn database_url_normalizes_jdbc_forms() {
        let cases = vec![
            (
                "jdbc:pivotal:greenplum://gp:5432;DatabaseName=dw;AuthenticationMethod=x",
                "gp",
                "p@ss",
                "postgres://gp:p%40ss@gp:5432/dw",
            ),
            (
                "jdbc:postgresql://gp:5432/dw?sslmode=disable",
                "gp",
                "",
                "postgres://gp@gp:5432/dw?sslmode=disable",
            ),
            (
                "postgres://old:pw@gp/dw",
                "",
                "",
                "postgres://old:pw@gp/dw",
            ),
            ("postgresql://old:pw@gp/dw", "new", "x", "postgres://new:x@gp/dw"),
        ];
        for (url, user, pass, expected) in cases {
            let got = GreenplumDialect
                .database_url(&conf(url, user, pass))
                .expect(url);
            assert_eq!(got, expected, "[{url}]");
        }
    }

    #[test]
    fn database_url_requires_database_and_known_scheme() {
        let err = GreenplumDialect
            .database_url(&conf("jdbc:pivotal:greenplum://gp:5432", "gp", ""))
            .expect_err("no database");
        assert!(format!("{err}").contains("must name a database"));
        assert!(
            GreenplumDialect
                .database_url(&conf("jdbc:mysql://gp/dw", "gp", ""))
                .is_err()
        );
    }

    #[test]
    fn insert_prefix_quotes_schema_table_and_columns() {
        let cols = vec!["id".to_string(), "Na\"me".to_string()];
        assert_eq!(
            GreenplumDialect.insert_prefix(Some("public"), "orders", &cols),
            "INSERT INTO \"public\".\"orders\" (\"id\", \"Na\"\"me\") VALUES "
        );
        assert_eq!(
            GreenplumDialect.insert_prefix(Some(" "), "orders", &cols[..1]),
            "INSERT INTO \"orders\" (\"id\") VALUES "
        );
    }

    #[test]
    fn upsert_clause_updates_non_key_columns() {
        let cols = vec!["id".to_string(), "amount".to_string()];
        assert_eq!(
            GreenplumDialect
                .upsert_clause(&["id".to_string()], &cols)
                .as_deref(),
            Some("ON CONFLICT (\"id\") DO UPDATE SET \"amount\" = EXCLUDED.\"amount\"")
        );
        assert_eq!(
            GreenplumDialect
                .upsert_clause(&cols, &cols)
                .as_deref(),
            Some("ON CONFLICT (\"id\", \"amount\") DO NOTHING")
        );
        assert!(GreenplumDialect.upsert_clause(&[], &cols).is_none());
    }
}
