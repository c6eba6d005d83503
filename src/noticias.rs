use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};

use crate::feed::FeedItem;

pub const API_BASE: &str = "https://lfaftechapi.onrender.com";
pub const DEFAULT_SITE: &str = "noticias.lat";

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: Option<String>,
    pub site: Option<String>,
    pub http_client: Option<HttpClient>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: String,
    site: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("noticias client user agent required");
        }

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(Duration::from_secs(20))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url: config.base_url.unwrap_or_else(|| API_BASE.to_string()),
            site: config.site.unwrap_or_else(|| DEFAULT_SITE.to_string()),
        })
    }

    /// Fetches the newest articles whose short video finished rendering,
    /// ordered by date upstream. This is the one feed request of a session;
    /// the list is immutable afterwards.
    pub fn video_articles(&self, limit: usize) -> Result<Vec<Article>> {
        let url = format!(
            "{}/api/articles?sitio={}&videoStatus=complete&limite={}",
            self.base_url, self.site, limit
        );
        let response: ArticlesResponse = self
            .http
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .send()?
            .json()?;
        Ok(response.articulos)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticlesResponse {
    #[serde(default)]
    pub articulos: Vec<Article>,
    #[serde(default, rename = "totalArticulos")]
    pub total_articulos: i64,
    #[serde(default, rename = "totalPaginas")]
    pub total_paginas: i64,
    #[serde(default, rename = "paginaActual")]
    pub pagina_actual: i64,
}

/// Upstream article record; field names follow the (Spanish) wire format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default, rename = "videoUrl")]
    pub video_url: String,
    #[serde(default)]
    pub categoria: String,
    #[serde(default)]
    pub fuente: String,
    #[serde(default)]
    pub pais: String,
    #[serde(default)]
    pub fecha: Option<DateTime<Utc>>,
}

impl Article {
    /// Converts an article into a playable feed item. Articles without a
    /// video URL (or without a title to show) are skipped.
    pub fn into_item(self) -> Option<FeedItem> {
        let video_url = sanitize_url(&self.video_url);
        if video_url.is_empty() || self.titulo.trim().is_empty() {
            return None;
        }
        Some(FeedItem {
            id: self.id,
            title: self.titulo.trim().to_string(),
            category: self.categoria.trim().to_string(),
            video_url,
            body: self.descripcion,
            published_at: self.fecha.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            source: self.fuente.trim().to_string(),
        })
    }
}

fn sanitize_url(raw: &str) -> String {
    raw.trim().replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "articulos": [
                {
                    "_id": "66f1a2b3c4d5e6f7a8b9c0d1",
                    "titulo": "Elecciones en la región",
                    "descripcion": "Resumen de la jornada electoral.",
                    "videoUrl": "https://cdn.test/embed/abc?token=1&amp;x=2",
                    "categoria": "politica",
                    "fuente": "Agencia Andina",
                    "pais": "pe",
                    "fecha": "2025-09-23T14:00:00Z"
                },
                {
                    "_id": "66f1a2b3c4d5e6f7a8b9c0d2",
                    "titulo": "Sin video todavía",
                    "descripcion": "Pendiente.",
                    "videoUrl": "",
                    "categoria": "economia",
                    "fuente": "Redacción"
                }
            ],
            "totalArticulos": 2,
            "totalPaginas": 1,
            "paginaActual": 1
        }"#
    }

    #[test]
    fn parses_the_wire_format() {
        let response: ArticlesResponse = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(response.articulos.len(), 2);
        assert_eq!(response.total_articulos, 2);
        let first = &response.articulos[0];
        assert_eq!(first.id, "66f1a2b3c4d5e6f7a8b9c0d1");
        assert_eq!(first.categoria, "politica");
        assert!(first.fecha.is_some());
    }

    #[test]
    fn conversion_keeps_only_playable_articles() {
        let response: ArticlesResponse = serde_json::from_str(sample_json()).unwrap();
        let items: Vec<FeedItem> = response
            .articulos
            .into_iter()
            .filter_map(Article::into_item)
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Elecciones en la región");
        assert_eq!(items[0].source, "Agencia Andina");
    }

    #[test]
    fn conversion_unescapes_video_urls() {
        let article = Article {
            id: "a".into(),
            titulo: "Título".into(),
            video_url: "https://cdn.test/v.mp4?a=1&amp;b=2".into(),
            ..Article::default()
        };
        let item = article.into_item().unwrap();
        assert_eq!(item.video_url, "https://cdn.test/v.mp4?a=1&b=2");
    }

    #[test]
    fn missing_date_falls_back_to_epoch() {
        let article = Article {
            id: "a".into(),
            titulo: "Título".into(),
            video_url: "https://cdn.test/v.mp4".into(),
            ..Article::default()
        };
        let item = article.into_item().unwrap();
        assert_eq!(item.published_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn client_requires_a_user_agent() {
        assert!(Client::new(ClientConfig::default()).is_err());
    }
}
