//! Support tickets and contact messages.

use super::{now_rfc3339, Database};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

pub const TICKET_STATUSES: &[&str] = &["aberto", "em_andamento", "fechado"];
pub const CONTACT_STATUSES: &[&str] = &["pendente", "respondido", "fechado"];
pub const DEFAULT_INTERACTION: &str = "suporte";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SupportTicket {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub mensagem: String,
    pub status: String,
    pub tipo_interacao: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente_email: Option<String>,
    pub criado_em: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketInput {
    pub nome: String,
    pub email: String,
    pub mensagem: String,
    #[serde(default)]
    pub tipo_interacao: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketFilter {
    pub status: Option<String>,
    pub tipo_interacao: Option<String>,
    pub cliente_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Contact {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub mensagem: String,
    pub status: String,
    pub criado_em: String,
    pub atualizado_em: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactInput {
    pub nome: String,
    pub email: String,
    pub mensagem: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactFilter {
    pub status: Option<String>,
    pub email: Option<String>,
}

const TICKET_COLUMNS: &str =
    "id, nome, email, mensagem, status, tipo_interacao, cliente_email, criado_em";
const CONTACT_COLUMNS: &str = "id, nome, email, mensagem, status, criado_em, atualizado_em";

fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<SupportTicket> {
    Ok(SupportTicket {
        id: row.get(0)?,
        nome: row.get(1)?,
        email: row.get(2)?,
        mensagem: row.get(3)?,
        status: row.get(4)?,
        tipo_interacao: row.get(5)?,
        cliente_email: row.get(6)?,
        criado_em: row.get(7)?,
    })
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        nome: row.get(1)?,
        email: row.get(2)?,
        mensagem: row.get(3)?,
        status: row.get(4)?,
        criado_em: row.get(5)?,
        atualizado_em: row.get(6)?,
    })
}

/// Empty filter values count as absent.
fn filter_value(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Database {
    /// New tickets start `aberto`. `cliente_email` ties the ticket to a
    /// signed-in user when there is one.
    pub fn create_ticket(
        &self,
        input: &TicketInput,
        cliente_email: Option<&str>,
    ) -> Result<SupportTicket> {
        let criado_em = now_rfc3339();
        let tipo = filter_value(&input.tipo_interacao)
            .unwrap_or(DEFAULT_INTERACTION)
            .to_string();

        let conn = self.conn();
        conn.execute(
            "INSERT INTO suporte (nome, email, mensagem, status, tipo_interacao, cliente_email, criado_em)
             VALUES (?1, ?2, ?3, 'aberto', ?4, ?5, ?6)",
            params![
                input.nome.trim(),
                input.email.trim(),
                input.mensagem,
                tipo,
                cliente_email,
                criado_em
            ],
        )
        .context("Failed to create support ticket")?;

        Ok(SupportTicket {
            id: conn.last_insert_rowid(),
            nome: input.nome.trim().to_string(),
            email: input.email.trim().to_string(),
            mensagem: input.mensagem.clone(),
            status: TICKET_STATUSES[0].to_string(),
            tipo_interacao: tipo,
            cliente_email: cliente_email.map(str::to_string),
            criado_em,
        })
    }

    /// Newest first.
    pub fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<SupportTicket>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {} FROM suporte
             WHERE (?1 IS NULL OR status = ?1)
               AND (?2 IS NULL OR tipo_interacao = ?2)
               AND (?3 IS NULL OR cliente_email = ?3)
             ORDER BY criado_em DESC, id DESC",
            TICKET_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let tickets = stmt
            .query_map(
                params![
                    filter_value(&filter.status),
                    filter_value(&filter.tipo_interacao),
                    filter_value(&filter.cliente_email)
                ],
                ticket_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list support tickets")?;
        Ok(tickets)
    }

    pub fn get_ticket(&self, id: i64) -> Result<Option<SupportTicket>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM suporte WHERE id = ?1", TICKET_COLUMNS),
            params![id],
            ticket_from_row,
        )
        .optional()
        .context("Failed to fetch support ticket")
    }

    pub fn update_ticket_status(&self, id: i64, status: &str) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute(
                "UPDATE suporte SET status = ?1 WHERE id = ?2",
                params![status, id],
            )
            .context("Failed to update support ticket")?;
        Ok(rows > 0)
    }

    pub fn delete_ticket(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute("DELETE FROM suporte WHERE id = ?1", params![id])
            .context("Failed to delete support ticket")?;
        Ok(rows > 0)
    }

    /// New contacts start `pendente`.
    pub fn create_contact(&self, input: &ContactInput) -> Result<Contact> {
        let now = now_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO contatos (nome, email, mensagem, status, criado_em, atualizado_em)
             VALUES (?1, ?2, ?3, 'pendente', ?4, ?4)",
            params![input.nome.trim(), input.email.trim(), input.mensagem, now],
        )
        .context("Failed to create contact")?;

        Ok(Contact {
            id: conn.last_insert_rowid(),
            nome: input.nome.trim().to_string(),
            email: input.email.trim().to_string(),
            mensagem: input.mensagem.clone(),
            status: CONTACT_STATUSES[0].to_string(),
            criado_em: now.clone(),
            atualizado_em: now,
        })
    }

    pub fn list_contacts(&self, filter: &ContactFilter) -> Result<Vec<Contact>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {} FROM contatos
             WHERE (?1 IS NULL OR status = ?1)
               AND (?2 IS NULL OR email = ?2)
             ORDER BY criado_em DESC, id DESC",
            CONTACT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let contacts = stmt
            .query_map(
                params![filter_value(&filter.status), filter_value(&filter.email)],
                contact_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list contacts")?;
        Ok(contacts)
    }

    pub fn get_contact(&self, id: i64) -> Result<Option<Contact>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM contatos WHERE id = ?1", CONTACT_COLUMNS),
            params![id],
            contact_from_row,
        )
        .optional()
        .context("Failed to fetch contact")
    }

    pub fn update_contact_status(&self, id: i64, status: &str) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute(
                "UPDATE contatos SET status = ?1, atualizado_em = ?2 WHERE id = ?3",
                params![status, now_rfc3339(), id],
            )
            .context("Failed to update contact")?;
        Ok(rows > 0)
    }

    pub fn delete_contact(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute("DELETE FROM contatos WHERE id = ?1", params![id])
            .context("Failed to delete contact")?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(tipo: Option<&str>) -> TicketInput {
        TicketInput {
            nome: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            mensagem: "Meu PC não liga".to_string(),
            tipo_interacao: tipo.map(str::to_string),
        }
    }

    #[test]
    fn test_ticket_defaults() {
        let db = Database::in_memory().unwrap();
        let created = db.create_ticket(&ticket(None), None).unwrap();
        assert_eq!(created.status, "aberto");
        assert_eq!(created.tipo_interacao, "suporte");
        assert!(created.cliente_email.is_none());
        assert_eq!(db.get_ticket(created.id).unwrap(), Some(created));
    }

    #[test]
    fn test_ticket_filters() {
        let db = Database::in_memory().unwrap();
        let mine = db
            .create_ticket(&ticket(Some("orcamento")), Some("a@x.com"))
            .unwrap();
        let other = db.create_ticket(&ticket(None), Some("b@x.com")).unwrap();
        db.create_ticket(&ticket(None), None).unwrap();

        assert_eq!(db.list_tickets(&TicketFilter::default()).unwrap().len(), 3);

        let by_client = db
            .list_tickets(&TicketFilter {
                cliente_email: Some("a@x.com".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_client, vec![mine.clone()]);

        let by_kind = db
            .list_tickets(&TicketFilter {
                tipo_interacao: Some("orcamento".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_kind.len(), 1);

        assert!(db.update_ticket_status(other.id, "fechado").unwrap());
        let closed = db
            .list_tickets(&TicketFilter {
                status: Some("fechado".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, other.id);

        // Blank filters are ignored.
        let blank = db
            .list_tickets(&TicketFilter {
                status: Some("  ".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(blank.len(), 3);
    }

    #[test]
    fn test_ticket_missing_id() {
        let db = Database::in_memory().unwrap();
        assert!(!db.update_ticket_status(42, "fechado").unwrap());
        assert!(!db.delete_ticket(42).unwrap());
    }

    #[test]
    fn test_contact_lifecycle() {
        let db = Database::in_memory().unwrap();
        let input = ContactInput {
            nome: "Bruno".to_string(),
            email: "bruno@x.com".to_string(),
            mensagem: "Orçamento para rede".to_string(),
        };
        let created = db.create_contact(&input).unwrap();
        assert_eq!(created.status, "pendente");
        assert_eq!(created.criado_em, created.atualizado_em);

        assert!(db.update_contact_status(created.id, "respondido").unwrap());
        let fetched = db.get_contact(created.id).unwrap().unwrap();
        assert_eq!(fetched.status, "respondido");
        assert_eq!(fetched.criado_em, created.criado_em);

        let pending = db
            .list_contacts(&ContactFilter {
                status: Some("pendente".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(pending.is_empty());

        let by_email = db
            .list_contacts(&ContactFilter {
                email: Some("bruno@x.com".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_email.len(), 1);

        assert!(db.delete_contact(created.id).unwrap());
        assert!(db.get_contact(created.id).unwrap().is_none());
    }
}
