use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use url::Url;

/// Canonical shareable URL for one story: `<base>/feed?start_id=<id>`, the
/// same address the session location mirrors.
pub fn feed_url(base: &str, id: &str) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            url.set_path("/feed");
            url.query_pairs_mut().clear().append_pair("start_id", id);
            url.to_string()
        }
        Err(_) => format!(
            "{}/feed?start_id={}",
            base.trim_end_matches('/'),
            utf8_percent_encode(id, NON_ALPHANUMERIC)
        ),
    }
}

/// WhatsApp deep link carrying the story title and its canonical URL.
pub fn whatsapp_link(title: &str, url: &str) -> String {
    let text = format!("{title} {url}");
    format!(
        "https://wa.me/?text={}",
        utf8_percent_encode(&text, NON_ALPHANUMERIC)
    )
}

pub fn open_external(url: &str) -> Result<()> {
    webbrowser::open(url).with_context(|| format!("open {url} in browser"))
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("create clipboard context")?;
    clipboard
        .set_text(text.to_string())
        .context("copy link to clipboard")?;
    Ok(())
}

/// The session's address line. Replace-only on purpose: one value, no
/// history, so stepping through fifty stories never piles up fifty entries
/// to walk back through.
#[derive(Debug, Default)]
pub struct Location {
    current: Option<String>,
}

impl Location {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, url: String) {
        self.current = Some(url);
    }

    pub fn as_str(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
