use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config;
use crate::data::{self, FeedService};
use crate::noticias;
use crate::player::MpvFactory;
use crate::ui;

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Start the feed at this story id (the `start_id` query parameter of a
    /// shared link).
    pub start_id: Option<String>,
    /// Skip the network and browse the built-in sample stories.
    pub offline: bool,
}

pub fn run(opts: LaunchOptions) -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;

    let status: String;
    let feed_service: Option<Arc<dyn FeedService>>;

    if opts.offline {
        status = "Offline mode: browsing sample stories.".to_string();
        feed_service = Some(Arc::new(data::MockFeedService));
    } else {
        match noticias::Client::new(noticias::ClientConfig {
            user_agent: cfg.feed.user_agent.clone(),
            base_url: Some(cfg.feed.api_url.clone()),
            site: Some(cfg.feed.site.clone()),
            http_client: None,
        }) {
            Ok(client) => {
                status = "Loading the video feed…".to_string();
                feed_service = Some(Arc::new(data::NoticiasFeedService::new(Arc::new(client))));
            }
            Err(err) => {
                status = format!("Feed client unavailable ({err:#}); showing sample stories.");
                feed_service = Some(Arc::new(data::MockFeedService));
            }
        }
    }

    let factory = Box::new(MpvFactory::new(
        cfg.player.mpv_path.clone(),
        cfg.player.loop_videos,
    ));

    let mut model = ui::Model::new(ui::Options {
        status_message: status,
        feed_service,
        factory,
        config: cfg,
        start_id: opts.start_id,
    });
    model.run()
}
