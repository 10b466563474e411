//! SQLite storage
//!
//! One connection behind a mutex, shared by the credential store and the
//! resource tables. Locks are held for a single statement or transaction,
//! never across an await or a password hash.

pub mod catalog;
pub mod news;
pub mod tickets;

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const SCHEMA_SQL: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS usuarios (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome_completo TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    senha_hash TEXT NOT NULL,
    telefone TEXT,
    criado_em TEXT NOT NULL,
    atualizado_em TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_usuarios_email ON usuarios(email);

CREATE TABLE IF NOT EXISTS funcionarios (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    cargo TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    senha_hash TEXT NOT NULL,
    criado_em TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_funcionarios_email ON funcionarios(email);
CREATE INDEX IF NOT EXISTS idx_funcionarios_cargo ON funcionarios(cargo);

CREATE TABLE IF NOT EXISTS administradores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    senha_hash TEXT NOT NULL,
    is_admin INTEGER NOT NULL DEFAULT 1,
    criado_em TEXT NOT NULL,
    atualizado_em TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS produtos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    quantidade INTEGER NOT NULL DEFAULT 0,
    preco REAL NOT NULL,
    oferta INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_produtos_oferta ON produtos(oferta);
CREATE INDEX IF NOT EXISTS idx_produtos_nome ON produtos(nome);

CREATE TABLE IF NOT EXISTS servicos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    preco REAL NOT NULL,
    oferta INTEGER NOT NULL DEFAULT 0,
    detalhes TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_servicos_oferta ON servicos(oferta);
CREATE INDEX IF NOT EXISTS idx_servicos_nome ON servicos(nome);

CREATE TABLE IF NOT EXISTS noticias (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    titulo TEXT NOT NULL,
    subtitulo TEXT NOT NULL,
    conteudo TEXT NOT NULL,
    autor TEXT NOT NULL,
    data TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_noticias_data ON noticias(data);

CREATE TABLE IF NOT EXISTS suporte (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    email TEXT NOT NULL,
    mensagem TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'aberto',
    tipo_interacao TEXT NOT NULL DEFAULT 'suporte',
    cliente_email TEXT,
    criado_em TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_suporte_status ON suporte(status);
CREATE INDEX IF NOT EXISTS idx_suporte_cliente_email ON suporte(cliente_email);

CREATE TABLE IF NOT EXISTS contatos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    email TEXT NOT NULL,
    mensagem TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pendente',
    criado_em TEXT NOT NULL,
    atualizado_em TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_contatos_status ON contatos(status);
"#;

/// Shared handle to the relational store.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

        let conn = Connection::open_with_flags(path, flags)
            .with_context(|| format!("Failed to open database at {}", path))?;

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .context("Failed to set journal mode")?;
        if journal_mode.to_lowercase() != "wal" {
            warn!("WAL mode not active, journal_mode = {}", journal_mode);
        }

        let db = Self::from_connection(conn)?;
        info!("📊 Database initialized at: {}", path);
        Ok(db)
    }

    /// Private database, gone when dropped. Used by tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize database schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Row counts for the admin dashboard.
    pub fn dashboard(&self) -> Result<DashboardStats> {
        let conn = self.conn();
        let count = |sql: &str| -> Result<i64> {
            conn.query_row(sql, [], |row| row.get(0))
                .with_context(|| format!("Failed to run count: {}", sql))
        };

        Ok(DashboardStats {
            usuarios: count("SELECT COUNT(*) FROM usuarios")?,
            funcionarios: count("SELECT COUNT(*) FROM funcionarios")?,
            administradores: count("SELECT COUNT(*) FROM administradores")?,
            produtos: count("SELECT COUNT(*) FROM produtos")?,
            servicos: count("SELECT COUNT(*) FROM servicos")?,
            noticias: count("SELECT COUNT(*) FROM noticias")?,
            suporte_abertos: count("SELECT COUNT(*) FROM suporte WHERE status = 'aberto'")?,
            contatos_pendentes: count("SELECT COUNT(*) FROM contatos WHERE status = 'pendente'")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub usuarios: i64,
    pub funcionarios: i64,
    pub administradores: i64,
    pub produtos: i64,
    pub servicos: i64,
    pub noticias: i64,
    pub suporte_abertos: i64,
    pub contatos_pendentes: i64,
}

/// Timestamp format used for every stored `*_em`/`data` column.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
