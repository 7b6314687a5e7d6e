//! SQL statement construction for principal provisioning
//!
//! Role and grant statements take identifiers, which Postgres cannot bind
//! as parameters, so statements are built as strings from values that have
//! already passed the safe-identifier policy. The quoting helpers here are
//! defense in depth on top of that allow-list, not a substitute for it.

use crate::core::{DatabaseGrant, Principal};

/// A statement plus its log-safe rendering
///
/// `display` is identical to `sql` except that password literals are
/// replaced with a placeholder; it is what error messages and log lines
/// carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Statement text sent to the database
    pub sql: String,
    /// Statement text safe to log
    pub display: String,
}

impl Statement {
    fn plain(sql: String) -> Self {
        Self {
            display: sql.clone(),
            sql,
        }
    }
}

/// Parameterized existence check against `pg_roles`
pub const ROLE_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM pg_roles WHERE rolname = $1)";

/// Quote an identifier for interpolation into DDL
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal for interpolation into DDL
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `CREATE ROLE` or `ALTER ROLE`, depending on whether the role already
/// exists
///
/// Both branches set the same password, which is what makes a re-run with
/// the same derived credential a no-op-equivalent ensure.
#[must_use]
pub fn ensure_role(principal: &Principal, exists: bool) -> Statement {
    let verb = if exists { "ALTER" } else { "CREATE" };
    let suffix = if exists { "" } else { "LOGIN " };
    let name = quote_ident(&principal.username);
    Statement {
        sql: format!(
            "{verb} ROLE {name} WITH {suffix}PASSWORD {}",
            quote_literal(&principal.password)
        ),
        display: format!("{verb} ROLE {name} WITH {suffix}PASSWORD [REDACTED]"),
    }
}

/// The grant batch for one database target, in issue order
///
/// Connect on the database, then usage+create plus full object privileges
/// per schema. Grants cover privileges existing at grant time; objects
/// created later in the schema are not automatically covered.
#[must_use]
pub fn grant_statements(username: &str, grant: &DatabaseGrant) -> Vec<Statement> {
    let role = quote_ident(username);
    let database = quote_ident(&grant.name);

    let mut statements = vec![Statement::plain(format!(
        "GRANT CONNECT ON DATABASE {database} TO {role}"
    ))];

    for schema_name in &grant.schemas {
        let schema = quote_ident(schema_name);
        statements.push(Statement::plain(format!(
            "GRANT USAGE, CREATE ON SCHEMA {schema} TO {role}"
        )));
        statements.push(Statement::plain(format!(
            "GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA {schema} TO {role}"
        )));
        statements.push(Statement::plain(format!(
            "GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA {schema} TO {role}"
        )));
        statements.push(Statement::plain(format!(
            "GRANT ALL PRIVILEGES ON ALL FUNCTIONS IN SCHEMA {schema} TO {role}"
        )));
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn principal() -> Principal {
        Principal {
            username: "svc_1700000000".into(),
            password: "0123abcd".into(),
        }
    }

    #[test]
    fn test_quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_quote_literal_doubles_embedded_quotes() {
        assert_eq!(quote_literal("plain"), "'plain'");
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
    }

    #[test]
    fn test_create_role_when_absent() {
        let stmt = ensure_role(&principal(), false);
        assert_eq!(
            stmt.sql,
            "CREATE ROLE \"svc_1700000000\" WITH LOGIN PASSWORD '0123abcd'"
        );
    }

    #[test]
    fn test_alter_role_when_present() {
        let stmt = ensure_role(&principal(), true);
        assert_eq!(
            stmt.sql,
            "ALTER ROLE \"svc_1700000000\" WITH PASSWORD '0123abcd'"
        );
    }

    #[test]
    fn test_ensure_role_display_redacts_password() {
        for exists in [false, true] {
            let stmt = ensure_role(&principal(), exists);
            assert!(!stmt.display.contains("0123abcd"));
            assert!(stmt.display.contains("[REDACTED]"));
            assert!(stmt.display.contains("svc_1700000000"));
        }
    }

    #[test]
    fn test_grant_batch_for_one_schema() {
        let grant = DatabaseGrant {
            name: "appdb".into(),
            schemas: vec!["public".into()],
        };
        let sql: Vec<String> = grant_statements("svc_1700000000", &grant)
            .into_iter()
            .map(|s| s.sql)
            .collect();

        assert_eq!(
            sql,
            vec![
                "GRANT CONNECT ON DATABASE \"appdb\" TO \"svc_1700000000\"",
                "GRANT USAGE, CREATE ON SCHEMA \"public\" TO \"svc_1700000000\"",
                "GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA \"public\" TO \"svc_1700000000\"",
                "GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA \"public\" TO \"svc_1700000000\"",
                "GRANT ALL PRIVILEGES ON ALL FUNCTIONS IN SCHEMA \"public\" TO \"svc_1700000000\"",
            ]
        );
    }

    #[test]
    fn test_grant_batch_covers_every_schema() {
        let grant = DatabaseGrant {
            name: "appdb".into(),
            schemas: vec!["public".into(), "audit".into()],
        };
        let statements = grant_statements("svc_a", &grant);

        // 1 connect + 4 per schema
        assert_eq!(statements.len(), 9);
        assert!(statements.iter().any(|s| s.sql.contains("\"audit\"")));
    }

    #[test]
    fn test_role_exists_is_parameterized() {
        assert!(ROLE_EXISTS.contains("$1"));
        assert!(!ROLE_EXISTS.contains('\"'));
    }
}
