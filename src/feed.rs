use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::player::{debug_log, PlayerState, MAX_VOLUME};
use crate::share::{self, Location};
use crate::window::Registry;

/// One playable story of the video feed. Immutable once loaded; the
/// controller owns the list for the whole session.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub category: String,
    pub video_url: String,
    pub body: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTarget {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Transitioning { from: usize, started: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HintState {
    Hidden,
    Visible { shown_at: Instant },
    Dismissed,
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Settle delay after a navigation; further intents are dropped until it
    /// elapses.
    pub cooldown: Duration,
    /// How long the first-visit swipe hint stays up without interaction.
    pub hint_timeout: Duration,
    /// Base URL the canonical per-item links are built from.
    pub share_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(500),
            hint_timeout: Duration::from_secs(5),
            share_base_url: "https://noticias.lat".to_string(),
        }
    }
}

/// The feed state machine. Externally stable only in `Idle`; every
/// navigation passes through `Transitioning`, which doubles as the cooldown
/// lock that keeps one over-long gesture from skipping several stories.
/// All state mutation happens synchronously inside the caller's event
/// handlers; time is always passed in so tests can fabricate clocks.
pub struct Controller {
    items: Vec<FeedItem>,
    active: usize,
    phase: Phase,
    playing: bool,
    expanded: Option<String>,
    liked: HashSet<String>,
    hint: HintState,
    share_target: Option<ShareTarget>,
    location: Location,
    registry: Registry,
    settings: Settings,
    initialized: bool,
}

impl Controller {
    pub fn new(registry: Registry, settings: Settings) -> Self {
        Self {
            items: Vec::new(),
            active: 0,
            phase: Phase::Idle,
            playing: false,
            expanded: None,
            liked: HashSet::new(),
            hint: HintState::Hidden,
            share_target: None,
            location: Location::new(),
            registry,
            settings,
            initialized: false,
        }
    }

    /// Installs the item list and resolves the optional starting id to its
    /// position (linear scan; unknown ids start at 0). Runs exactly once per
    /// session; repeat calls are no-ops.
    pub fn initialize(&mut self, items: Vec<FeedItem>, start_id: Option<&str>, now: Instant) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.items = items;
        self.active = start_id
            .and_then(|id| self.items.iter().position(|item| item.id == id))
            .unwrap_or(0);

        if self.items.is_empty() {
            return;
        }
        self.hint = HintState::Visible { shown_at: now };
        self.registry.materialize(self.active, &self.items);
        self.playing = true;
        self.arm_active();
        self.sync_location();
    }

    /// Navigates to `target` (clamped, never wrapped). Returns false when the
    /// move is a no-op: same index, out of range collapsing onto the current
    /// index, empty feed, or a transition still in flight.
    pub fn go_to(&mut self, target: usize, now: Instant) -> bool {
        if !self.initialized || self.items.is_empty() {
            return false;
        }
        self.settle(now);
        if self.is_transitioning(now) {
            return false;
        }
        let target = target.min(self.items.len() - 1);
        if target == self.active {
            return false;
        }

        self.phase = Phase::Transitioning {
            from: self.active,
            started: now,
        };
        if let Some(player) = self.registry.player_mut(self.active) {
            // A revisited story always restarts from the beginning, and only
            // the incoming story may hold audio.
            let _ = player.pause();
            let _ = player.rewind();
            let _ = player.set_muted(true);
        }
        self.expanded = None;
        self.active = target;
        self.registry.materialize(target, &self.items);
        self.playing = true;
        self.arm_active();
        self.dismiss_hint();
        self.sync_location();
        true
    }

    pub fn advance(&mut self, now: Instant) -> bool {
        let target = self.active.saturating_add(1);
        self.go_to(target, now)
    }

    pub fn retreat(&mut self, now: Instant) -> bool {
        let target = self.active.saturating_sub(1);
        self.go_to(target, now)
    }

    /// Play/pause of the active story. Play always re-asserts full volume and
    /// unmute; nothing is inherited from the previous story. Dead slides are
    /// inert. Either way the swipe hint is gone for good.
    pub fn toggle_interaction(&mut self, _now: Instant) {
        self.dismiss_hint();
        if self.items.is_empty() {
            return;
        }
        if self.registry.state_of(self.active) == PlayerState::Unloaded {
            return;
        }
        if self.playing {
            if let Some(player) = self.registry.player_mut(self.active) {
                let _ = player.pause();
            }
            self.playing = false;
        } else {
            self.playing = true;
            self.arm_active();
        }
    }

    pub fn toggle_like(&mut self, id: &str) {
        if !self.liked.remove(id) {
            self.liked.insert(id.to_string());
        }
    }

    pub fn is_liked(&self, id: &str) -> bool {
        self.liked.contains(id)
    }

    /// At most one description is expanded at a time, and only for a story
    /// currently on screen (active or adjacent).
    pub fn toggle_description(&mut self, id: &str) {
        if !self.is_on_screen(id) {
            return;
        }
        if self.expanded.as_deref() == Some(id) {
            self.expanded = None;
        } else {
            self.expanded = Some(id.to_string());
        }
    }

    pub fn expanded_id(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    /// Builds the canonical share target for a story and opens the share
    /// sheet. Navigation state is untouched.
    pub fn request_share(&mut self, id: &str) {
        let Some(item) = self.items.iter().find(|item| item.id == id) else {
            return;
        };
        self.share_target = Some(ShareTarget {
            title: item.title.clone(),
            url: share::feed_url(&self.settings.share_base_url, &item.id),
        });
    }

    pub fn clear_share(&mut self) {
        self.share_target = None;
    }

    pub fn share_target(&self) -> Option<&ShareTarget> {
        self.share_target.as_ref()
    }

    /// Periodic housekeeping from the event-loop tick: releases the
    /// transition lock once the cooldown elapsed, expires the swipe hint,
    /// drives player readiness, and arms the active player the moment it
    /// becomes ready. Returns true when something observable changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if matches!(self.phase, Phase::Transitioning { .. }) {
            self.settle(now);
            if matches!(self.phase, Phase::Idle) {
                changed = true;
            }
        }
        if let HintState::Visible { shown_at } = self.hint {
            if now.duration_since(shown_at) >= self.settings.hint_timeout {
                self.hint = HintState::Dismissed;
                changed = true;
            }
        }
        if self.registry.poll() {
            changed = true;
        }
        if self.playing && self.registry.state_of(self.active) == PlayerState::Ready {
            self.arm_active();
            changed = true;
        }
        changed
    }

    pub fn is_transitioning(&self, now: Instant) -> bool {
        match self.phase {
            Phase::Idle => false,
            Phase::Transitioning { started, .. } => {
                now.duration_since(started) < self.settings.cooldown
            }
        }
    }

    pub fn hint_visible(&self) -> bool {
        matches!(self.hint, HintState::Visible { .. })
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_item(&self) -> Option<&FeedItem> {
        self.items.get(self.active)
    }

    pub fn next_item(&self) -> Option<&FeedItem> {
        self.items.get(self.active + 1)
    }

    pub fn previous_item(&self) -> Option<&FeedItem> {
        self.active.checked_sub(1).and_then(|pos| self.items.get(pos))
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_str()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Rebuilds the player window for a new slide geometry (terminal
    /// resize). The active story resumes playing once its fresh player
    /// reports ready.
    pub fn reflow(&mut self, layout: crate::player::SlideLayout) {
        if self.items.is_empty() {
            self.registry.set_layout(layout);
            return;
        }
        self.registry.rebuild(self.active, &self.items, layout);
    }

    pub fn shutdown(&mut self) {
        self.registry.clear();
    }

    fn settle(&mut self, now: Instant) {
        if let Phase::Transitioning { started, .. } = self.phase {
            if now.duration_since(started) >= self.settings.cooldown {
                self.phase = Phase::Idle;
            }
        }
    }

    fn dismiss_hint(&mut self) {
        if !matches!(self.hint, HintState::Hidden) {
            self.hint = HintState::Dismissed;
        }
    }

    fn arm_active(&mut self) {
        let Some(player) = self.registry.player_mut(self.active) else {
            return;
        };
        let results = [
            player.set_volume(MAX_VOLUME),
            player.set_muted(false),
            player.play(),
        ];
        for err in results.into_iter().filter_map(Result::err) {
            debug_log(format!("arm active player: {err}"));
        }
    }

    fn is_on_screen(&self, id: &str) -> bool {
        let lo = self.active.saturating_sub(1);
        let hi = self.active.saturating_add(1);
        self.items
            .iter()
            .enumerate()
            .any(|(pos, item)| pos >= lo && pos <= hi && item.id == id)
    }

    fn sync_location(&mut self) {
        if let Some(item) = self.items.get(self.active) {
            self.location
                .replace(share::feed_url(&self.settings.share_base_url, &item.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerCommand, StubFactory};

    fn items(ids: &[&str]) -> Vec<FeedItem> {
        ids.iter()
            .map(|id| FeedItem {
                id: id.to_string(),
                title: format!("Story {id}"),
                category: "internacional".into(),
                video_url: format!("https://cdn.test/{id}.mp4"),
                body: "Cuerpo de la nota.".into(),
                published_at: Utc::now(),
                source: "Agencia".into(),
            })
            .collect()
    }

    fn controller(factory: &StubFactory) -> Controller {
        Controller::new(
            Registry::new(Box::new(factory.clone())),
            Settings::default(),
        )
    }

    /// Advances the fake clock past the cooldown and runs a tick, like the
    /// event loop would between gestures.
    fn settle(ctl: &mut Controller, now: Instant) -> Instant {
        let later = now + Duration::from_millis(600);
        ctl.tick(later);
        later
    }

    #[test]
    fn initialize_resolves_every_valid_start_id() {
        let all = items(&["a", "b", "c", "d"]);
        for (index, item) in all.iter().enumerate() {
            let factory = StubFactory::new();
            let mut ctl = controller(&factory);
            ctl.initialize(all.clone(), Some(&item.id), Instant::now());
            assert_eq!(ctl.active_index(), index);
            assert_eq!(ctl.active_item().unwrap().id, item.id);
        }
    }

    #[test]
    fn unknown_start_id_defaults_to_first_item() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        ctl.initialize(items(&["a", "b"]), Some("missing"), Instant::now());
        assert_eq!(ctl.active_index(), 0);
    }

    #[test]
    fn initialize_runs_once_per_session() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let now = Instant::now();
        ctl.initialize(items(&["a", "b"]), Some("b"), now);
        ctl.initialize(items(&["x", "y"]), Some("x"), now);
        assert_eq!(ctl.active_item().unwrap().id, "b");
        assert_eq!(ctl.len(), 2);
    }

    #[test]
    fn empty_feed_is_inert_but_never_panics() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let now = Instant::now();
        ctl.initialize(Vec::new(), Some("a"), now);
        assert!(ctl.is_empty());
        assert!(ctl.active_item().is_none());
        assert!(!ctl.advance(now));
        assert!(!ctl.retreat(now));
        ctl.toggle_interaction(now);
        assert!(!ctl.is_playing());
    }

    #[test]
    fn advance_is_monotone_and_clamps_at_the_end() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let mut now = Instant::now();
        ctl.initialize(items(&["a", "b", "c"]), None, now);

        let mut previous = ctl.active_index();
        for _ in 0..6 {
            now = settle(&mut ctl, now);
            ctl.advance(now);
            assert!(ctl.active_index() >= previous);
            assert!(ctl.active_index() <= 2);
            previous = ctl.active_index();
        }
        assert_eq!(ctl.active_index(), 2);
    }

    #[test]
    fn intents_during_cooldown_are_dropped_not_queued() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let now = Instant::now();
        ctl.initialize(items(&["a", "b", "c"]), None, now);

        let now = settle(&mut ctl, now);
        assert!(ctl.advance(now));
        // Still inside the 500ms settle window: both further intents vanish.
        let burst = now + Duration::from_millis(100);
        assert!(!ctl.advance(burst));
        assert!(!ctl.advance(burst));
        assert_eq!(ctl.active_index(), 1);

        let after = settle(&mut ctl, now);
        assert!(ctl.advance(after));
        assert_eq!(ctl.active_index(), 2);
    }

    #[test]
    fn at_most_one_player_is_playing_at_any_point() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let mut now = Instant::now();
        ctl.initialize(items(&["a", "b", "c", "d"]), None, now);

        for _ in 0..5 {
            now = settle(&mut ctl, now);
            assert!(ctl.registry().playing_positions().len() <= 1);
            ctl.advance(now);
            now = settle(&mut ctl, now);
            assert!(
                ctl.registry().playing_positions().len() <= 1,
                "two stories audible at once"
            );
        }
    }

    #[test]
    fn toggle_like_twice_restores_membership() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        ctl.initialize(items(&["a"]), None, Instant::now());
        assert!(!ctl.is_liked("a"));
        ctl.toggle_like("a");
        assert!(ctl.is_liked("a"));
        ctl.toggle_like("a");
        assert!(!ctl.is_liked("a"));
    }

    #[test]
    fn revisited_story_restarts_from_the_beginning() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let mut now = Instant::now();
        ctl.initialize(items(&["a", "b"]), None, now);
        now = settle(&mut ctl, now);

        ctl.advance(now);
        now = settle(&mut ctl, now);
        ctl.retreat(now);
        settle(&mut ctl, now);

        // Leaving "a" paused and rewound it; coming back replays it from
        // zero rather than resuming mid-scrub.
        let commands = factory.commands_for("a");
        let rewind_at = commands
            .iter()
            .position(|cmd| *cmd == PlayerCommand::Rewind)
            .expect("outgoing player was not rewound");
        let replay_at = commands
            .iter()
            .rposition(|cmd| *cmd == PlayerCommand::Play)
            .expect("story was not replayed");
        assert!(rewind_at < replay_at);
    }

    #[test]
    fn scenario_start_at_b_advance_clamp_then_retreat() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let mut now = Instant::now();
        ctl.initialize(items(&["a", "b", "c"]), Some("b"), now);
        assert_eq!(ctl.active_item().unwrap().id, "b");

        now = settle(&mut ctl, now);
        ctl.advance(now);
        assert_eq!(ctl.active_item().unwrap().id, "c");

        now = settle(&mut ctl, now);
        ctl.advance(now);
        assert_eq!(ctl.active_item().unwrap().id, "c", "clamped at the end");

        now = settle(&mut ctl, now);
        ctl.retreat(now);
        settle(&mut ctl, now);
        assert_eq!(ctl.active_item().unwrap().id, "b");
        let commands = factory.commands_for("b");
        assert!(commands.contains(&PlayerCommand::Rewind));
        assert_eq!(commands.last(), Some(&PlayerCommand::Play));
    }

    #[test]
    fn only_one_description_expanded_at_a_time() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        ctl.initialize(items(&["a", "b", "c"]), None, Instant::now());

        ctl.toggle_description("a");
        assert_eq!(ctl.expanded_id(), Some("a"));
        ctl.toggle_description("b");
        assert_eq!(ctl.expanded_id(), Some("b"));
        ctl.toggle_description("b");
        assert_eq!(ctl.expanded_id(), None);
    }

    #[test]
    fn off_screen_descriptions_cannot_be_expanded() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        ctl.initialize(items(&["a", "b", "c", "d"]), None, Instant::now());
        ctl.toggle_description("d");
        assert_eq!(ctl.expanded_id(), None);
    }

    #[test]
    fn navigation_collapses_the_expanded_description() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let now = Instant::now();
        ctl.initialize(items(&["a", "b"]), None, now);
        ctl.toggle_description("a");

        let now = settle(&mut ctl, now);
        ctl.advance(now);
        assert_eq!(ctl.expanded_id(), None);
    }

    #[test]
    fn toggle_interaction_pauses_and_replays_with_full_volume() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let now = Instant::now();
        ctl.initialize(items(&["a"]), None, now);
        let now = settle(&mut ctl, now);
        assert!(ctl.is_playing());

        ctl.toggle_interaction(now);
        assert!(!ctl.is_playing());
        ctl.toggle_interaction(now);
        assert!(ctl.is_playing());

        let commands = factory.commands_for("a");
        let resume = &commands[commands.len() - 3..];
        assert_eq!(
            resume,
            [
                PlayerCommand::SetVolume(100),
                PlayerCommand::SetMuted(false),
                PlayerCommand::Play,
            ]
        );
    }

    #[test]
    fn dead_slide_ignores_play_pause_but_navigation_works() {
        let factory = StubFactory::failing(&["b"]);
        let mut ctl = controller(&factory);
        let mut now = Instant::now();
        ctl.initialize(items(&["a", "b", "c"]), None, now);
        now = settle(&mut ctl, now);

        ctl.advance(now);
        now = settle(&mut ctl, now);
        let was_playing = ctl.is_playing();
        ctl.toggle_interaction(now);
        assert_eq!(ctl.is_playing(), was_playing, "dead slide must stay inert");

        ctl.advance(now);
        settle(&mut ctl, now);
        assert_eq!(ctl.active_item().unwrap().id, "c");
    }

    #[test]
    fn hint_dismisses_after_timeout() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let now = Instant::now();
        ctl.initialize(items(&["a"]), None, now);
        assert!(ctl.hint_visible());

        ctl.tick(now + Duration::from_secs(6));
        assert!(!ctl.hint_visible());
    }

    #[test]
    fn hint_dismisses_on_first_interaction_and_stays_gone() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let now = Instant::now();
        ctl.initialize(items(&["a", "b"]), None, now);
        assert!(ctl.hint_visible());

        ctl.toggle_interaction(now);
        assert!(!ctl.hint_visible());
        ctl.tick(now + Duration::from_millis(50));
        assert!(!ctl.hint_visible());
    }

    #[test]
    fn location_tracks_the_active_story_without_history() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        let now = Instant::now();
        ctl.initialize(items(&["a", "b"]), None, now);
        assert_eq!(
            ctl.location(),
            Some("https://noticias.lat/feed?start_id=a")
        );

        let now = settle(&mut ctl, now);
        ctl.advance(now);
        assert_eq!(
            ctl.location(),
            Some("https://noticias.lat/feed?start_id=b")
        );
    }

    #[test]
    fn share_request_sets_target_without_moving_the_feed() {
        let factory = StubFactory::new();
        let mut ctl = controller(&factory);
        ctl.initialize(items(&["a", "b"]), None, Instant::now());

        ctl.request_share("b");
        let target = ctl.share_target().unwrap();
        assert_eq!(target.title, "Story b");
        assert_eq!(target.url, "https://noticias.lat/feed?start_id=b");
        assert_eq!(ctl.active_index(), 0);

        ctl.clear_share();
        assert!(ctl.share_target().is_none());
    }
}
