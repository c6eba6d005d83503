use std::time::{Duration, Instant};

use chrono::Utc;

use reel_tui::feed::{Controller, FeedItem, Settings};
use reel_tui::player::{PlayerCommand, StubFactory};
use reel_tui::window::Registry;

fn story(id: &str, title: &str) -> FeedItem {
    FeedItem {
        id: id.to_string(),
        title: title.to_string(),
        category: "politica".to_string(),
        video_url: format!("https://cdn.test/{id}.mp4"),
        body: "Resumen de la jornada con detalles adicionales.".to_string(),
        published_at: Utc::now(),
        source: "Agencia Andina".to_string(),
    }
}

fn session(factory: &StubFactory) -> Controller {
    Controller::new(
        Registry::new(Box::new(factory.clone())),
        Settings::default(),
    )
}

fn settle(ctl: &mut Controller, now: Instant) -> Instant {
    let later = now + Duration::from_millis(600);
    ctl.tick(later);
    later
}

#[test]
fn a_full_session_walk() {
    let factory = StubFactory::new();
    let mut ctl = session(&factory);
    let mut now = Instant::now();

    let items = vec![
        story("a", "Elecciones regionales"),
        story("b", "Nueva ley económica"),
        story("c", "Final de la copa"),
    ];
    ctl.initialize(items, Some("b"), now);

    // Shared link resolved in place, hint up, first story armed.
    assert_eq!(ctl.active_item().unwrap().id, "b");
    assert!(ctl.hint_visible());
    assert_eq!(
        ctl.location(),
        Some("https://noticias.lat/feed?start_id=b")
    );

    now = settle(&mut ctl, now);
    assert!(ctl.is_playing());
    assert!(ctl.registry().playing_positions().len() <= 1);

    // Swipe forward to the last story; another swipe clamps.
    assert!(ctl.advance(now));
    assert!(!ctl.hint_visible());
    now = settle(&mut ctl, now);
    assert_eq!(ctl.active_item().unwrap().id, "c");
    assert!(!ctl.advance(now));
    assert_eq!(ctl.active_item().unwrap().id, "c");

    // Like, expand, and share the current story.
    ctl.toggle_like("c");
    assert!(ctl.is_liked("c"));
    ctl.toggle_description("c");
    assert_eq!(ctl.expanded_id(), Some("c"));
    ctl.request_share("c");
    assert_eq!(
        ctl.share_target().unwrap().url,
        "https://noticias.lat/feed?start_id=c"
    );
    ctl.clear_share();

    // Back to "b": the expansion collapsed and the story restarted.
    now = settle(&mut ctl, now);
    assert!(ctl.retreat(now));
    assert_eq!(ctl.expanded_id(), None);
    settle(&mut ctl, now);
    assert_eq!(ctl.active_item().unwrap().id, "b");
    assert_eq!(
        ctl.location(),
        Some("https://noticias.lat/feed?start_id=b")
    );
    let commands = factory.commands_for("b");
    assert!(commands.contains(&PlayerCommand::Rewind));
    assert_eq!(commands.last(), Some(&PlayerCommand::Play));
    assert!(ctl.registry().playing_positions().len() <= 1);

    // The like set survived the navigation; likes are session-local state.
    assert!(ctl.is_liked("c"));
}

#[test]
fn rapid_gestures_move_one_story_per_cooldown() {
    let factory = StubFactory::new();
    let mut ctl = session(&factory);
    let now = Instant::now();
    ctl.initialize(
        vec![
            story("a", "Uno"),
            story("b", "Dos"),
            story("c", "Tres"),
            story("d", "Cuatro"),
        ],
        None,
        now,
    );

    let now = settle(&mut ctl, now);
    // One over-long gesture produces a burst of intents; only the first one
    // inside the cooldown window lands.
    assert!(ctl.advance(now));
    assert!(!ctl.advance(now + Duration::from_millis(50)));
    assert!(!ctl.advance(now + Duration::from_millis(200)));
    assert!(!ctl.advance(now + Duration::from_millis(450)));
    assert_eq!(ctl.active_index(), 1);

    assert!(ctl.advance(now + Duration::from_millis(600)));
    assert_eq!(ctl.active_index(), 2);
}
