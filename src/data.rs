use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::feed::FeedItem;
use crate::noticias;

pub trait FeedService: Send + Sync {
    fn load_video_feed(&self, limit: usize) -> Result<Vec<FeedItem>>;
}

pub struct NoticiasFeedService {
    client: Arc<noticias::Client>,
}

impl NoticiasFeedService {
    pub fn new(client: Arc<noticias::Client>) -> Self {
        Self { client }
    }
}

impl FeedService for NoticiasFeedService {
    fn load_video_feed(&self, limit: usize) -> Result<Vec<FeedItem>> {
        let articles = self
            .client
            .video_articles(limit)
            .context("fetch video feed")?;
        Ok(articles
            .into_iter()
            .filter_map(noticias::Article::into_item)
            .collect())
    }
}

#[derive(Default)]
pub struct MockFeedService;

impl FeedService for MockFeedService {
    fn load_video_feed(&self, _limit: usize) -> Result<Vec<FeedItem>> {
        Ok(vec![
            sample_item(
                "demo-1",
                "Bienvenido al feed de video",
                "Contenido de muestra para navegar sin conexión.\n\nDesliza hacia abajo para la siguiente historia.",
            ),
            sample_item(
                "demo-2",
                "Atajos de teclado",
                "j o flecha abajo: siguiente · k o flecha arriba: anterior · espacio: pausa · l: me gusta · s: compartir",
            ),
        ])
    }
}

fn sample_item(id: &str, title: &str, body: &str) -> FeedItem {
    FeedItem {
        id: id.to_string(),
        title: title.to_string(),
        category: "general".to_string(),
        video_url: format!("https://cdn.noticias.lat/demo/{id}.mp4"),
        body: body.to_string(),
        published_at: DateTime::<Utc>::UNIX_EPOCH,
        source: "Noticias.lat".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_feed_yields_playable_items() {
        let items = MockFeedService.load_video_feed(5).unwrap();
        assert!(!items.is_empty());
        assert!(items.iter().all(|item| !item.video_url.is_empty()));
    }
}
