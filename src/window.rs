use std::collections::{HashMap, HashSet};

use crate::feed::FeedItem;
use crate::player::{debug_log, PlayerFactory, PlayerHandle, PlayerState, SlideLayout};

/// Owns the live player handles, keyed by feed position. Policy: players are
/// created for the active position and the next one (look-ahead of exactly 1,
/// no look-behind), and any handle further than one position from the active
/// index is torn down. The just-left neighbour therefore survives one step,
/// which makes a single retreat instant, and the total number of live
/// players is bounded at three no matter how long the feed is.
pub struct Registry {
    factory: Box<dyn PlayerFactory>,
    players: HashMap<usize, Box<dyn PlayerHandle>>,
    // Positions whose spawn already failed while inside the window; skipped
    // until they leave the window so a resize rebuild does not hammer mpv.
    failed: HashSet<usize>,
    layout: SlideLayout,
}

impl Registry {
    pub fn new(factory: Box<dyn PlayerFactory>) -> Self {
        Self {
            factory,
            players: HashMap::new(),
            failed: HashSet::new(),
            layout: SlideLayout::default(),
        }
    }

    pub fn set_layout(&mut self, layout: SlideLayout) {
        self.layout = layout;
    }

    pub fn layout(&self) -> SlideLayout {
        self.layout
    }

    /// Makes the handle map match the window around `active`: tears down
    /// everything at distance > 1, then spawns the active and next positions
    /// that are missing.
    pub fn materialize(&mut self, active: usize, items: &[FeedItem]) {
        let stale: Vec<usize> = self
            .players
            .keys()
            .copied()
            .filter(|pos| pos.abs_diff(active) > 1)
            .collect();
        for pos in stale {
            self.teardown(pos);
        }
        self.failed.retain(|pos| pos.abs_diff(active) <= 1);

        for pos in [active, active + 1] {
            if pos >= items.len() || self.players.contains_key(&pos) || self.failed.contains(&pos)
            {
                continue;
            }
            match self.factory.spawn(&items[pos], self.layout) {
                Ok(handle) => {
                    self.players.insert(pos, handle);
                }
                Err(err) => {
                    debug_log(format!("spawn player for position {pos}: {err}"));
                    self.failed.insert(pos);
                }
            }
        }
    }

    fn teardown(&mut self, pos: usize) {
        if let Some(mut handle) = self.players.remove(&pos) {
            let _ = handle.pause();
            let _ = handle.rewind();
        }
    }

    /// Tears down every handle and re-materializes the window. Used when the
    /// slide geometry changes (terminal resize), since inline players are
    /// positioned in absolute cells at spawn time.
    pub fn rebuild(&mut self, active: usize, items: &[FeedItem], layout: SlideLayout) {
        let positions: Vec<usize> = self.players.keys().copied().collect();
        for pos in positions {
            self.teardown(pos);
        }
        self.failed.clear();
        self.layout = layout;
        self.materialize(active, items);
    }

    pub fn clear(&mut self) {
        let positions: Vec<usize> = self.players.keys().copied().collect();
        for pos in positions {
            self.teardown(pos);
        }
        self.failed.clear();
    }

    /// Drives loading handles towards readiness and notices dead ones.
    /// Returns true when any state changed so the caller can redraw.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for handle in self.players.values_mut() {
            let before = handle.state();
            if handle.poll() != before {
                changed = true;
            }
        }
        changed
    }

    pub fn player_mut(&mut self, pos: usize) -> Option<&mut (dyn PlayerHandle + '_)> {
        self.players
            .get_mut(&pos)
            .map(|handle| &mut **handle as &mut dyn PlayerHandle)
    }

    pub fn state_of(&self, pos: usize) -> PlayerState {
        self.players
            .get(&pos)
            .map(|handle| handle.state())
            .unwrap_or(PlayerState::Unloaded)
    }

    pub fn live_positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self.players.keys().copied().collect();
        positions.sort_unstable();
        positions
    }

    pub fn playing_positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .players
            .iter()
            .filter(|(_, handle)| handle.state() == PlayerState::Playing)
            .map(|(pos, _)| *pos)
            .collect();
        positions.sort_unstable();
        positions
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
