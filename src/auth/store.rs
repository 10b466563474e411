//! Credential Storage
//! Lookup, existence checks and inserts for the three principal tables.

use crate::auth::models::{CredentialRecord, NewCredential, PrincipalKind, RoleMarker};
use crate::store::{now_rfc3339, Database};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::info;

/// Everything the auth flows need from persistence.
pub trait CredentialStore: Send + Sync {
    fn find_by_email(&self, kind: PrincipalKind, email: &str) -> Result<Option<CredentialRecord>>;

    fn find_by_id(&self, kind: PrincipalKind, id: i64) -> Result<Option<CredentialRecord>>;

    fn count_by_email(&self, kind: PrincipalKind, email: &str) -> Result<i64>;

    /// Insert a principal. A duplicate email surfaces as [`DuplicateEmail`].
    fn insert(&self, kind: PrincipalKind, new: &NewCredential) -> Result<CredentialRecord>;
}

/// Raised by [`CredentialStore::insert`] when the unique email index fires,
/// e.g. two registrations racing past the existence check.
#[derive(Debug)]
pub struct DuplicateEmail;

impl std::fmt::Display for DuplicateEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Email already registered")
    }
}

impl std::error::Error for DuplicateEmail {}

fn select_sql(kind: PrincipalKind, filter: &str) -> String {
    let columns = match kind {
        PrincipalKind::User => {
            "id, nome_completo, email, senha_hash, NULL, NULL, telefone, criado_em"
        }
        PrincipalKind::Employee => "id, nome, email, senha_hash, cargo, NULL, NULL, criado_em",
        PrincipalKind::Administrator => {
            "id, nome, email, senha_hash, NULL, is_admin, NULL, criado_em"
        }
    };
    format!("SELECT {} FROM {} WHERE {} = ?1", columns, kind.table(), filter)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CredentialRecord> {
    let cargo: Option<String> = row.get(4)?;
    let is_admin: Option<bool> = row.get(5)?;
    let role = match (cargo, is_admin) {
        (Some(c), _) => Some(RoleMarker::Cargo(c)),
        (None, Some(flag)) => Some(RoleMarker::Admin(flag)),
        (None, None) => None,
    };

    Ok(CredentialRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role,
        phone: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl CredentialStore for Database {
    fn find_by_email(&self, kind: PrincipalKind, email: &str) -> Result<Option<CredentialRecord>> {
        let conn = self.conn();
        conn.query_row(&select_sql(kind, "email"), params![email], record_from_row)
            .optional()
            .with_context(|| format!("Failed to look up {} by email", kind.table()))
    }

    fn find_by_id(&self, kind: PrincipalKind, id: i64) -> Result<Option<CredentialRecord>> {
        let conn = self.conn();
        conn.query_row(&select_sql(kind, "id"), params![id], record_from_row)
            .optional()
            .with_context(|| format!("Failed to look up {} by id", kind.table()))
    }

    fn count_by_email(&self, kind: PrincipalKind, email: &str) -> Result<i64> {
        let conn = self.conn();
        let sql = format!("SELECT COUNT(*) FROM {} WHERE email = ?1", kind.table());
        conn.query_row(&sql, params![email], |row| row.get(0))
            .context("Failed to check email")
    }

    fn insert(&self, kind: PrincipalKind, new: &NewCredential) -> Result<CredentialRecord> {
        let now = now_rfc3339();
        let conn = self.conn();

        let result = match (kind, &new.role) {
            (PrincipalKind::User, _) => conn.execute(
                "INSERT INTO usuarios (nome_completo, email, senha_hash, telefone, criado_em, atualizado_em)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![new.name, new.email, new.password_hash, new.phone, now],
            ),
            (PrincipalKind::Employee, role) => {
                let cargo = match role {
                    Some(RoleMarker::Cargo(c)) => c.as_str(),
                    _ => "",
                };
                conn.execute(
                    "INSERT INTO funcionarios (nome, cargo, email, senha_hash, criado_em)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![new.name, cargo, new.email, new.password_hash, now],
                )
            }
            (PrincipalKind::Administrator, role) => {
                let is_admin = matches!(role, Some(RoleMarker::Admin(true)));
                conn.execute(
                    "INSERT INTO administradores (nome, email, senha_hash, is_admin, criado_em, atualizado_em)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![new.name, new.email, new.password_hash, is_admin, now],
                )
            }
        };

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(DuplicateEmail.into()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to insert into {}", kind.table()))
            }
        }

        let id = conn.last_insert_rowid();
        let record = conn
            .query_row(&select_sql(kind, "id"), params![id], record_from_row)
            .context("Failed to read back inserted principal")?;

        info!("✅ Created {}: {} ({})", kind.as_str(), record.email, record.id);

        Ok(record)
    }
}

/// Employee listing row (admin only).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmployeeSummary {
    pub id: i64,
    pub nome: String,
    pub cargo: String,
    pub email: String,
    pub criado_em: String,
}

/// User listing row (admin only).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSummary {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
}

impl Database {
    pub fn list_employees(&self) -> Result<Vec<EmployeeSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, nome, cargo, email, criado_em FROM funcionarios ORDER BY nome",
        )?;

        let employees = stmt
            .query_map([], |row| {
                Ok(EmployeeSummary {
                    id: row.get(0)?,
                    nome: row.get(1)?,
                    cargo: row.get(2)?,
                    email: row.get(3)?,
                    criado_em: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list employees")?;

        Ok(employees)
    }

    /// Users ordered by name, optionally filtered by a case-insensitive
    /// substring of email or phone.
    pub fn list_users(&self, search: Option<&str>) -> Result<Vec<UserSummary>> {
        let conn = self.conn();
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        let mut stmt = conn.prepare(
            "SELECT id, nome_completo, email, telefone FROM usuarios
             WHERE ?1 IS NULL OR LOWER(email) LIKE ?1 OR LOWER(COALESCE(telefone, '')) LIKE ?1
             ORDER BY nome_completo ASC, id ASC",
        )?;

        let users = stmt
            .query_map(params![pattern], |row| {
                Ok(UserSummary {
                    id: row.get(0)?,
                    nome: row.get(1)?,
                    email: row.get(2)?,
                    telefone: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list users")?;

        Ok(users)
    }

    /// Whether any other user already holds `email`.
    pub fn user_email_taken_by_other(&self, email: &str, user_id: i64) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM usuarios WHERE email = ?1 AND id != ?2",
                params![email, user_id],
                |row| row.get(0),
            )
            .context("Failed to check new email")?;
        Ok(count > 0)
    }

    pub fn update_user_email(&self, user_id: i64, email: &str) -> Result<()> {
        let conn = self.conn();
        let rows = match conn.execute(
            "UPDATE usuarios SET email = ?1, atualizado_em = ?2 WHERE id = ?3",
            params![email, now_rfc3339(), user_id],
        ) {
            Ok(rows) => rows,
            Err(e) if is_unique_violation(&e) => return Err(DuplicateEmail.into()),
            Err(e) => return Err(e).context("Failed to update email"),
        };

        if rows == 0 {
            anyhow::bail!("User {} not found", user_id);
        }
        Ok(())
    }

    pub fn update_user_phone(&self, user_id: i64, phone: &str) -> Result<()> {
        let conn = self.conn();
        let rows = conn
            .execute(
                "UPDATE usuarios SET telefone = ?1, atualizado_em = ?2 WHERE id = ?3",
                params![phone, now_rfc3339(), user_id],
            )
            .context("Failed to update phone")?;

        if rows == 0 {
            anyhow::bail!("User {} not found", user_id);
        }
        Ok(())
    }

    pub fn count_administrators(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM administradores WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )
        .context("Failed to check for admin users")
    }
}
