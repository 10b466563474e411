//! News articles.

use super::{now_rfc3339, Database};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct News {
    pub id: i64,
    pub titulo: String,
    pub subtitulo: String,
    pub conteudo: String,
    pub autor: String,
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsInput {
    pub titulo: String,
    pub subtitulo: String,
    pub conteudo: String,
    pub autor: String,
}

fn news_from_row(row: &Row<'_>) -> rusqlite::Result<News> {
    Ok(News {
        id: row.get(0)?,
        titulo: row.get(1)?,
        subtitulo: row.get(2)?,
        conteudo: row.get(3)?,
        autor: row.get(4)?,
        data: row.get(5)?,
    })
}

impl Database {
    pub fn create_news(&self, input: &NewsInput) -> Result<News> {
        let data = now_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO noticias (titulo, subtitulo, conteudo, autor, data)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                input.titulo.trim(),
                input.subtitulo.trim(),
                input.conteudo,
                input.autor.trim(),
                data
            ],
        )
        .context("Failed to create news")?;

        Ok(News {
            id: conn.last_insert_rowid(),
            titulo: input.titulo.trim().to_string(),
            subtitulo: input.subtitulo.trim().to_string(),
            conteudo: input.conteudo.clone(),
            autor: input.autor.trim().to_string(),
            data,
        })
    }

    /// Newest first.
    pub fn list_news(&self) -> Result<Vec<News>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, titulo, subtitulo, conteudo, autor, data FROM noticias
             ORDER BY data DESC, id DESC",
        )?;
        let news = stmt
            .query_map([], news_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list news")?;
        Ok(news)
    }

    pub fn get_news(&self, id: i64) -> Result<Option<News>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, titulo, subtitulo, conteudo, autor, data FROM noticias WHERE id = ?1",
            params![id],
            news_from_row,
        )
        .optional()
        .context("Failed to fetch news")
    }

    /// Publication date is kept as originally set.
    pub fn update_news(&self, id: i64, input: &NewsInput) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute(
                "UPDATE noticias SET titulo = ?1, subtitulo = ?2, conteudo = ?3, autor = ?4
                 WHERE id = ?5",
                params![
                    input.titulo.trim(),
                    input.subtitulo.trim(),
                    input.conteudo,
                    input.autor.trim(),
                    id
                ],
            )
            .context("Failed to update news")?;
        Ok(rows > 0)
    }

    pub fn delete_news(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute("DELETE FROM noticias WHERE id = ?1", params![id])
            .context("Failed to delete news")?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(titulo: &str) -> NewsInput {
        NewsInput {
            titulo: titulo.to_string(),
            subtitulo: "Sub".to_string(),
            conteudo: "Corpo da notícia".to_string(),
            autor: "Redação".to_string(),
        }
    }

    #[test]
    fn test_news_newest_first() {
        let db = Database::in_memory().unwrap();
        let first = db.create_news(&input("Primeira")).unwrap();
        let second = db.create_news(&input("Segunda")).unwrap();

        let list = db.list_news().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[1].id, first.id);
    }

    #[test]
    fn test_news_update_keeps_date() {
        let db = Database::in_memory().unwrap();
        let created = db.create_news(&input("Original")).unwrap();

        assert!(db.update_news(created.id, &input("Editada")).unwrap());
        let fetched = db.get_news(created.id).unwrap().unwrap();
        assert_eq!(fetched.titulo, "Editada");
        assert_eq!(fetched.data, created.data);

        assert!(db.delete_news(created.id).unwrap());
        assert!(!db.update_news(created.id, &input("x")).unwrap());
    }
}
