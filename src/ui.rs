use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, window_size, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

use crate::config;
use crate::data::FeedService;
use crate::feed::{Controller, FeedItem, Settings};
use crate::input::{self, Aggregator, Intent};
use crate::player::{PlayerFactory, PlayerState, SlideLayout};
use crate::richtext;
use crate::share;
use crate::window::Registry;

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_VIDEO_BG: Color = Color::Rgb(0, 0, 0);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
const COLOR_LIKE: Color = Color::Rgb(243, 139, 168);
const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const EMPTY_FEED_MESSAGE: &str =
    "No hay videos disponibles en este momento. Vuelve a intentarlo más tarde.";
const SWIPE_HINT: &str = "Desliza (o usa j/k) para cambiar de historia";

#[derive(Clone, Copy, PartialEq, Eq)]
struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= Duration::from_millis(120) {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

#[derive(Clone, Copy)]
struct CellMetrics {
    width: f64,
    height: f64,
}

fn terminal_cell_metrics() -> CellMetrics {
    window_size().ok().map_or(
        CellMetrics {
            width: 1.0,
            height: 1.0,
        },
        |size| {
            let columns = size.columns.max(1) as f64;
            let rows = size.rows.max(1) as f64;
            let width = if size.width > 0 {
                f64::from(size.width) / columns
            } else {
                1.0
            };
            let height = if size.height > 0 {
                f64::from(size.height) / rows
            } else {
                1.0
            };
            CellMetrics { width, height }
        },
    )
}

/// Screen regions of one slide. The geometry is independent of navigation
/// direction (both peek strips are always reserved) so the video rectangle
/// never moves between stories and inline players keep their cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Areas {
    peek_top: Rect,
    video: Rect,
    hud: Rect,
    peek_bottom: Rect,
    status: Rect,
    footer: Rect,
}

fn compute_areas(total: Rect) -> Areas {
    let footer_h = 2u16;
    let peek_h = 1u16;
    let body_h = total.height.saturating_sub(footer_h + 2 * peek_h);
    let video_h = (body_h * 11 / 20).max(3).min(body_h);
    let hud_h = body_h.saturating_sub(video_h);

    let x = total.x;
    let w = total.width;
    let mut y = total.y;
    let peek_top = Rect::new(x, y, w, peek_h.min(total.height));
    y = y.saturating_add(peek_h);
    let video = Rect::new(x, y, w, video_h);
    y = y.saturating_add(video_h);
    let hud = Rect::new(x, y, w, hud_h);
    y = y.saturating_add(hud_h);
    let peek_bottom = Rect::new(x, y, w, peek_h);
    y = y.saturating_add(peek_h);
    let status = Rect::new(x, y, w, 1);
    let footer = Rect::new(x, y.saturating_add(1), w, 1);
    // Clamp every region to the terminal so undersized windows degrade to
    // zero-height strips instead of drawing out of bounds.
    Areas {
        peek_top: peek_top.intersection(total),
        video: video.intersection(total),
        hud: hud.intersection(total),
        peek_bottom: peek_bottom.intersection(total),
        status: status.intersection(total),
        footer: footer.intersection(total),
    }
}

fn slide_layout(video: Rect) -> SlideLayout {
    let metrics = terminal_cell_metrics();
    SlideLayout {
        col: video.x,
        row: video.y,
        cols: i32::from(video.width),
        rows: i32::from(video.height),
        pixel_width: (f64::from(video.width) * metrics.width) as i32,
        pixel_height: (f64::from(video.height) * metrics.height) as i32,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let percent_x = percent_x.min(100);
    let percent_y = percent_y.min(100);
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.max(1), height.max(1))
}

enum AsyncResponse {
    Feed { result: Result<Vec<FeedItem>> },
}

pub struct Options {
    pub status_message: String,
    pub feed_service: Option<Arc<dyn FeedService>>,
    pub factory: Box<dyn PlayerFactory>,
    pub config: config::Config,
    pub start_id: Option<String>,
}

pub struct Model {
    controller: Controller,
    aggregator: Aggregator,
    renderer: richtext::Renderer,
    feed_service: Option<Arc<dyn FeedService>>,
    feed_limit: usize,
    start_id: Option<String>,
    wheel_tick_delta: f32,
    status_message: String,
    share_fallback: Option<String>,
    forward_travel: bool,
    needs_redraw: bool,
    spinner: Spinner,
    pending_feed: bool,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let (response_tx, response_rx) = unbounded();
        let controller = Controller::new(
            Registry::new(opts.factory),
            Settings {
                cooldown: opts.config.input.cooldown,
                hint_timeout: opts.config.input.hint_timeout,
                share_base_url: opts.config.feed.share_base_url.clone(),
            },
        );
        let aggregator = Aggregator::new(
            opts.config.input.wheel_threshold,
            opts.config.input.swipe_threshold_rows,
        );

        Self {
            controller,
            aggregator,
            renderer: richtext::Renderer::new(),
            feed_service: opts.feed_service,
            feed_limit: opts.config.feed.limit,
            start_id: opts.start_id,
            wheel_tick_delta: opts.config.input.wheel_tick_delta,
            status_message: opts.status_message,
            share_fallback: None,
            forward_travel: true,
            needs_redraw: true,
            spinner: Spinner::new(),
            pending_feed: false,
            response_tx,
            response_rx,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        self.refresh_layout();
        self.queue_feed_load();

        let result = self.event_loop(&mut terminal);

        self.controller.shutdown();
        disable_raw_mode()?;
        terminal.backend_mut().execute(DisableMouseCapture)?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key.code) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.status_message = format!("Error: {}", err);
                                self.mark_dirty();
                            }
                        }
                    }
                    Event::Mouse(mouse) => {
                        if let Err(err) = self.handle_mouse(mouse) {
                            self.status_message = format!("Error: {}", err);
                            self.mark_dirty();
                        }
                    }
                    Event::Resize(_, _) => {
                        self.refresh_layout();
                        self.mark_dirty();
                    }
                    _ => {}
                }
            }

            if self.poll_async() {
                self.mark_dirty();
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                let mut ticked = self.controller.tick(Instant::now());
                if self.pending_feed {
                    if self.spinner.advance() {
                        ticked = true;
                    }
                } else {
                    self.spinner.reset();
                }
                if ticked {
                    self.mark_dirty();
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn refresh_layout(&mut self) {
        let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        let areas = compute_areas(Rect::new(0, 0, cols, rows));
        self.controller.reflow(slide_layout(areas.video));
    }

    fn queue_feed_load(&mut self) {
        let Some(service) = self.feed_service.clone() else {
            self.controller
                .initialize(Vec::new(), None, Instant::now());
            return;
        };
        self.pending_feed = true;
        self.status_message = "Cargando el feed de video…".to_string();
        let limit = self.feed_limit;
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let result = service.load_video_feed(limit);
            let _ = tx.send(AsyncResponse::Feed { result });
        });
    }

    fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Feed { result } => {
                self.pending_feed = false;
                match result {
                    Ok(items) => {
                        let count = items.len();
                        self.controller.initialize(
                            items,
                            self.start_id.as_deref(),
                            Instant::now(),
                        );
                        self.status_message = if count == 0 {
                            "No stories available right now.".to_string()
                        } else {
                            format!("Loaded {count} video stories.")
                        };
                    }
                    Err(err) => {
                        self.controller.initialize(Vec::new(), None, Instant::now());
                        self.status_message = format!("Error loading the feed: {err:#}");
                    }
                }
            }
        }
    }

    fn active_id(&self) -> Option<String> {
        self.controller.active_item().map(|item| item.id.clone())
    }

    fn modal_open(&self) -> bool {
        self.controller.share_target().is_some()
    }

    fn suppressed(&self, now: Instant) -> bool {
        self.modal_open() || self.controller.is_transitioning(now)
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if self.modal_open() {
            return self.handle_share_key(code);
        }

        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc => {
                if self.share_fallback.take().is_some() {
                    self.mark_dirty();
                } else {
                    return Ok(true);
                }
            }
            KeyCode::Char('l') => {
                if let Some(id) = self.active_id() {
                    self.controller.toggle_like(&id);
                    self.mark_dirty();
                }
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.active_id() {
                    self.controller.toggle_description(&id);
                    self.mark_dirty();
                }
            }
            KeyCode::Char('s') => {
                if let Some(id) = self.active_id() {
                    // A modal is opening; drop any half-finished gesture.
                    self.aggregator.reset();
                    self.controller.request_share(&id);
                    self.mark_dirty();
                }
            }
            other => {
                if let Some(intent) = input::key_intent(other) {
                    self.apply_intent(intent);
                }
            }
        }
        Ok(false)
    }

    fn handle_share_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Char('w') => self.share_open_whatsapp(),
            KeyCode::Char('c') => self.share_copy(),
            KeyCode::Esc | KeyCode::Char('q') => {
                self.controller.clear_share();
                self.mark_dirty();
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Result<()> {
        let now = Instant::now();
        if self.suppressed(now) {
            // Dropped, not queued: suppressed raw events never reach the
            // aggregator, so they do not accumulate either.
            return Ok(());
        }

        match event.kind {
            MouseEventKind::ScrollDown => {
                if let Some(intent) = self.aggregator.wheel(self.wheel_tick_delta) {
                    self.apply_intent(intent);
                }
            }
            MouseEventKind::ScrollUp => {
                if let Some(intent) = self.aggregator.wheel(-self.wheel_tick_delta) {
                    self.apply_intent(intent);
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.aggregator.drag_start(event.row);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(intent) = self.aggregator.drag_end(event.row) {
                    self.apply_intent(intent);
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn apply_intent(&mut self, intent: Intent) {
        let now = Instant::now();
        if self.suppressed(now) {
            return;
        }
        match intent {
            Intent::Advance => {
                if self.controller.advance(now) {
                    self.forward_travel = true;
                }
            }
            Intent::Retreat => {
                if self.controller.retreat(now) {
                    self.forward_travel = false;
                }
            }
            Intent::ToggleInteraction => self.controller.toggle_interaction(now),
        }
        self.mark_dirty();
    }

    fn share_open_whatsapp(&mut self) {
        let Some(target) = self.controller.share_target().cloned() else {
            return;
        };
        let link = share::whatsapp_link(&target.title, &target.url);
        match share::open_external(&link) {
            Ok(()) => {
                self.status_message = "Opened WhatsApp share link in the browser.".to_string();
            }
            Err(err) => {
                self.share_fallback = Some(target.url.clone());
                self.status_message = format!("Could not open the browser: {err:#}");
            }
        }
        self.controller.clear_share();
        self.mark_dirty();
    }

    fn share_copy(&mut self) {
        let Some(target) = self.controller.share_target().cloned() else {
            return;
        };
        match share::copy_to_clipboard(&target.url) {
            Ok(()) => {
                self.status_message = "Link copied to clipboard.".to_string();
            }
            Err(err) => {
                // Clipboard failure degrades to a visible copy-it-yourself
                // prompt with the raw URL.
                self.share_fallback = Some(target.url.clone());
                self.status_message = format!("Clipboard unavailable: {err:#}");
            }
        }
        self.controller.clear_share();
        self.mark_dirty();
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let areas = compute_areas(frame.size());
        frame.render_widget(
            Block::default().style(Style::default().bg(COLOR_BG)),
            frame.size(),
        );

        if self.pending_feed || !self.controller.is_initialized() {
            self.draw_loading(frame, &areas);
        } else if self.controller.is_empty() {
            self.draw_empty(frame, &areas);
        } else {
            self.draw_slide(frame, &areas);
        }

        self.draw_status(frame, areas.status);
        self.draw_footer(frame, areas.footer);

        if self.modal_open() {
            self.draw_share_sheet(frame);
        } else if self.controller.hint_visible() {
            self.draw_hint(frame);
        }
    }

    fn draw_loading(&self, frame: &mut Frame<'_>, areas: &Areas) {
        let text = Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                format!("{} {}", self.spinner.frame(), self.status_message),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )),
        ]);
        frame.render_widget(
            Paragraph::new(text).alignment(Alignment::Center),
            areas.video.union(areas.hud),
        );
    }

    fn draw_empty(&self, frame: &mut Frame<'_>, areas: &Areas) {
        let text = Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                "Noticias en Video",
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(Span::styled(
                EMPTY_FEED_MESSAGE,
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )),
        ]);
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            areas.video.union(areas.hud),
        );
    }

    fn draw_slide(&self, frame: &mut Frame<'_>, areas: &Areas) {
        let Some(item) = self.controller.active_item() else {
            return;
        };

        self.draw_video_area(frame, areas.video);
        self.draw_hud(frame, areas.hud, item);
        self.draw_peeks(frame, areas);
    }

    fn draw_video_area(&self, frame: &mut Frame<'_>, area: Rect) {
        // The inline player overlays these cells; the block is just the
        // letterbox behind it and the placeholder when there is no video.
        let state = self
            .controller
            .registry()
            .state_of(self.controller.active_index());
        let placeholder = match state {
            PlayerState::Loading => Some("cargando video…"),
            PlayerState::Unloaded => Some("video no disponible"),
            _ => None,
        };
        let mut lines = vec![Line::default(); usize::from(area.height / 2)];
        if let Some(message) = placeholder {
            lines.push(Line::from(Span::styled(
                message,
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )));
        }
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .alignment(Alignment::Center)
                .style(Style::default().bg(COLOR_VIDEO_BG)),
            area,
        );
    }

    fn draw_hud(&self, frame: &mut Frame<'_>, area: Rect, item: &FeedItem) {
        let width = usize::from(area.width.saturating_sub(2)).max(10);
        let mut lines: Vec<Line<'static>> = Vec::new();

        let mut meta_spans: Vec<Span<'static>> = Vec::new();
        if !item.category.is_empty() {
            meta_spans.push(Span::styled(
                format!(" {} ", item.category.to_uppercase()),
                Style::default()
                    .fg(COLOR_BG)
                    .bg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            ));
            meta_spans.push(Span::raw(" "));
        }
        meta_spans.push(Span::styled(
            item.source.clone(),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        ));
        meta_spans.push(Span::styled(
            format!(" · {}", item.published_at.format("%d/%m/%Y")),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        ));
        meta_spans.push(Span::styled(
            format!(
                " · historia {} de {}",
                self.controller.active_index() + 1,
                self.controller.len()
            ),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        ));
        lines.push(Line::from(meta_spans));
        lines.push(Line::default());

        for chunk in wrap(&item.title, width) {
            lines.push(Line::from(Span::styled(
                chunk.into_owned(),
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        lines.push(Line::default());

        let liked = self.controller.is_liked(&item.id);
        let heart = if liked { "♥ te gusta" } else { "♡ me gusta (l)" };
        let playback = if self.controller.is_playing() {
            "⏸ pausa (espacio)"
        } else {
            "▶ reproducir (espacio)"
        };
        lines.push(Line::from(vec![
            Span::styled(
                heart,
                Style::default().fg(if liked {
                    COLOR_LIKE
                } else {
                    COLOR_TEXT_SECONDARY
                }),
            ),
            Span::styled("   ", Style::default()),
            Span::styled(playback, Style::default().fg(COLOR_TEXT_SECONDARY)),
            Span::styled("   ", Style::default()),
            Span::styled("⇪ compartir (s)", Style::default().fg(COLOR_TEXT_SECONDARY)),
        ]));
        lines.push(Line::default());

        let expanded = self.controller.expanded_id() == Some(item.id.as_str());
        if expanded {
            let body = self
                .renderer
                .render_clipped(&item.body, richtext::EXPANDED_DESCRIPTION_CHARS);
            lines.extend(body.lines);
            lines.push(Line::from(Span::styled(
                "e: menos",
                Style::default().fg(COLOR_ACCENT),
            )));
        } else if !item.body.trim().is_empty() {
            let summary = richtext::truncate_chars(
                &richtext::plain_text(&item.body),
                richtext::SHORT_DESCRIPTION_CHARS,
            );
            for chunk in wrap(&summary, width) {
                lines.push(Line::from(Span::styled(
                    chunk.into_owned(),
                    Style::default().fg(COLOR_TEXT_SECONDARY),
                )));
            }
            lines.push(Line::from(Span::styled(
                "e: más",
                Style::default().fg(COLOR_ACCENT),
            )));
        }

        frame.render_widget(
            Paragraph::new(Text::from(lines)).block(
                Block::default()
                    .borders(Borders::NONE)
                    .style(Style::default().bg(COLOR_BG)),
            ),
            area.inner(&ratatui::layout::Margin {
                horizontal: 1,
                vertical: 0,
            }),
        );
    }

    /// Only the neighbour in the direction of last travel gets a peek strip;
    /// the other strip stays blank.
    fn draw_peeks(&self, frame: &mut Frame<'_>, areas: &Areas) {
        if self.forward_travel {
            if let Some(next) = self.controller.next_item() {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        format!("▼ siguiente: {}", next.title),
                        Style::default().fg(COLOR_TEXT_SECONDARY),
                    ))
                    .alignment(Alignment::Center),
                    areas.peek_bottom,
                );
            }
        } else if let Some(previous) = self.controller.previous_item() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("▲ anterior: {}", previous.title),
                    Style::default().fg(COLOR_TEXT_SECONDARY),
                ))
                .alignment(Alignment::Center),
                areas.peek_top,
            );
        }
    }

    fn draw_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let (message, style) = if let Some(url) = &self.share_fallback {
            (
                format!("Copia el enlace manualmente: {url}  (Esc para cerrar)"),
                Style::default().fg(COLOR_SUCCESS),
            )
        } else {
            (
                self.status_message.clone(),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )
        };
        frame.render_widget(Paragraph::new(Span::styled(message, style)), area);
    }

    fn draw_footer(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut parts: Vec<String> = Vec::new();
        if let Some(location) = self.controller.location() {
            parts.push(format!("⌂ {location}"));
        }
        parts.push("j/k historia".to_string());
        parts.push("espacio pausa".to_string());
        parts.push("l me gusta".to_string());
        parts.push("e descripción".to_string());
        parts.push("s compartir".to_string());
        parts.push("q salir".to_string());

        let mut text = parts.join(" · ");
        let width = usize::from(area.width);
        while text.width() > width && !text.is_empty() {
            text.pop();
        }
        frame.render_widget(
            Paragraph::new(Span::styled(
                text,
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )),
            area,
        );
    }

    fn draw_hint(&self, frame: &mut Frame<'_>) {
        let area = centered_rect(50, 20, frame.size());
        frame.render_widget(Clear, area);
        let text = Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                SWIPE_HINT,
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )),
        ]);
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .style(Style::default().bg(COLOR_BG).fg(COLOR_ACCENT)),
                ),
            area,
        );
    }

    fn draw_share_sheet(&self, frame: &mut Frame<'_>) {
        let Some(target) = self.controller.share_target() else {
            return;
        };
        let area = centered_rect(70, 30, frame.size());
        frame.render_widget(Clear, area);
        let text = Text::from(vec![
            Line::from(Span::styled(
                target.title.clone(),
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(Span::styled(
                target.url.clone(),
                Style::default().fg(COLOR_ACCENT),
            )),
            Line::default(),
            Line::from(Span::styled(
                "[w] WhatsApp   [c] copiar enlace   [Esc] cerrar",
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )),
        ]);
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Compartir ")
                        .style(Style::default().bg(COLOR_BG).fg(COLOR_TEXT_PRIMARY)),
                ),
            area,
        );
    }
}
