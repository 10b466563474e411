//! Products and services.

use super::Database;
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub nome: String,
    pub quantidade: i64,
    pub preco: f64,
    pub oferta: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub nome: String,
    #[serde(default)]
    pub quantidade: i64,
    pub preco: f64,
    #[serde(default)]
    pub oferta: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Service {
    pub id: i64,
    pub nome: String,
    pub preco: f64,
    pub oferta: bool,
    pub detalhes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    pub nome: String,
    pub preco: f64,
    #[serde(default)]
    pub oferta: bool,
    pub detalhes: String,
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        nome: row.get(1)?,
        quantidade: row.get(2)?,
        preco: row.get(3)?,
        oferta: row.get(4)?,
    })
}

fn service_from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        nome: row.get(1)?,
        preco: row.get(2)?,
        oferta: row.get(3)?,
        detalhes: row.get(4)?,
    })
}

impl Database {
    pub fn create_product(&self, input: &ProductInput) -> Result<Product> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO produtos (nome, quantidade, preco, oferta) VALUES (?1, ?2, ?3, ?4)",
            params![input.nome.trim(), input.quantidade, input.preco, input.oferta],
        )
        .context("Failed to create product")?;

        Ok(Product {
            id: conn.last_insert_rowid(),
            nome: input.nome.trim().to_string(),
            quantidade: input.quantidade,
            preco: input.preco,
            oferta: input.oferta,
        })
    }

    /// Products by name; `offers_only` keeps only those on offer.
    pub fn list_products(&self, offers_only: bool) -> Result<Vec<Product>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, nome, quantidade, preco, oferta FROM produtos
             WHERE ?1 = 0 OR oferta = 1
             ORDER BY nome, id",
        )?;
        let products = stmt
            .query_map(params![offers_only], product_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list products")?;
        Ok(products)
    }

    pub fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, nome, quantidade, preco, oferta FROM produtos WHERE id = ?1",
            params![id],
            product_from_row,
        )
        .optional()
        .context("Failed to fetch product")
    }

    /// Returns false when no product has that id.
    pub fn update_product(&self, id: i64, input: &ProductInput) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute(
                "UPDATE produtos SET nome = ?1, quantidade = ?2, preco = ?3, oferta = ?4
                 WHERE id = ?5",
                params![input.nome.trim(), input.quantidade, input.preco, input.oferta, id],
            )
            .context("Failed to update product")?;
        Ok(rows > 0)
    }

    pub fn delete_product(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute("DELETE FROM produtos WHERE id = ?1", params![id])
            .context("Failed to delete product")?;
        Ok(rows > 0)
    }

    pub fn create_service(&self, input: &ServiceInput) -> Result<Service> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO servicos (nome, preco, oferta, detalhes) VALUES (?1, ?2, ?3, ?4)",
            params![input.nome.trim(), input.preco, input.oferta, input.detalhes],
        )
        .context("Failed to create service")?;

        Ok(Service {
            id: conn.last_insert_rowid(),
            nome: input.nome.trim().to_string(),
            preco: input.preco,
            oferta: input.oferta,
            detalhes: input.detalhes.clone(),
        })
    }

    pub fn list_services(&self, offers_only: bool) -> Result<Vec<Service>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, nome, preco, oferta, detalhes FROM servicos
             WHERE ?1 = 0 OR oferta = 1
             ORDER BY nome, id",
        )?;
        let services = stmt
            .query_map(params![offers_only], service_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list services")?;
        Ok(services)
    }

    pub fn get_service(&self, id: i64) -> Result<Option<Service>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, nome, preco, oferta, detalhes FROM servicos WHERE id = ?1",
            params![id],
            service_from_row,
        )
        .optional()
        .context("Failed to fetch service")
    }

    pub fn update_service(&self, id: i64, input: &ServiceInput) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute(
                "UPDATE servicos SET nome = ?1, preco = ?2, oferta = ?3, detalhes = ?4
                 WHERE id = ?5",
                params![input.nome.trim(), input.preco, input.oferta, input.detalhes, id],
            )
            .context("Failed to update service")?;
        Ok(rows > 0)
    }

    pub fn delete_service(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let rows = conn
            .execute("DELETE FROM servicos WHERE id = ?1", params![id])
            .context("Failed to delete service")?;
        Ok(rows > 0)
    }
}
