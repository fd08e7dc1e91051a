//! Match engine: tile selection, match resolution, combo streaks and the timed
//! caption → fade → reset sequence that blocks input while it runs.
//!
//! A match attempt is two-phase. The click computes the shared layer ids and sets
//! the caption at once; the board only changes when the pending completion fires
//! `match_delay` later (see [`Engine::tick`]). While a completion is pending the
//! engine is *blocking* and ignores every click, so at most one is ever scheduled.

use crate::board::{Board, Coord};
use crate::combo::Combo;
use crate::theme::Theme;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// How long the caption and fade stay up before the board changes.
pub const DEFAULT_MATCH_DELAY: Duration = Duration::from_millis(1750);

/// Caption when a match empties the second tile.
pub const GO_ANYWHERE: &str = "go anywhere";
/// Caption when the two tiles share nothing.
pub const NO_MATCHES: &str = "no matches";

/// Text shown on the active tile while a match attempt resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caption {
    /// Successful match; the streak length after it.
    Streak(u32),
    /// Successful match that left the second tile empty.
    GoAnywhere,
    NoMatches,
}

/// Chip styling bucket for a caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipKind {
    Streak,
    Clear,
    Miss,
}

impl Caption {
    pub fn kind(&self) -> ChipKind {
        match self {
            Self::Streak(_) => ChipKind::Streak,
            Self::GoAnywhere => ChipKind::Clear,
            Self::NoMatches => ChipKind::Miss,
        }
    }
}

impl std::fmt::Display for Caption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Streak(n) => write!(f, "{n}"),
            Self::GoAnywhere => f.write_str(GO_ANYWHERE),
            Self::NoMatches => f.write_str(NO_MATCHES),
        }
    }
}

/// Checkerboard background bucket for a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileShade {
    Primary,
    Secondary,
}

/// What the pending completion will do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Remove the intersecting layers, then chain or deselect.
    Match,
    /// Reset selection; the board is left alone.
    Miss,
}

/// The single scheduled completion of a match attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCompletion {
    pub due: Instant,
    pub resolution: Resolution,
}

/// One notification per logically-atomic state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    BoardLoaded { rows: usize, columns: usize },
    ThemeLoaded { name: String },
    Selected(Coord),
    MatchStarted { first: Coord, second: Coord, ids: Vec<String> },
    MissStarted { first: Coord, second: Coord },
    /// `chained` is true when the second tile became the new first tile.
    MatchResolved { first: Coord, second: Coord, chained: bool },
    MissResolved,
}

type Listener = Box<dyn FnMut(&EngineEvent)>;

/// Game state for one board. The presentation layer reads it through the query
/// methods and forwards clicks to [`Engine::on_tile_click`]; nothing else mutates it.
pub struct Engine {
    board: Option<Board>,
    theme: Option<Theme>,
    first: Option<Coord>,
    second: Option<Coord>,
    /// Tile that shows the caption.
    active: Option<Coord>,
    combo: Combo,
    blocking: bool,
    caption: Option<Caption>,
    disappearing: HashSet<String>,
    /// Most recently computed shared ids, in first-tile order.
    intersecting: Vec<String>,
    pending: Option<PendingCompletion>,
    match_delay: Duration,
    revision: u64,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("board", &self.board.as_ref().map(|b| (b.row_count(), b.column_count())))
            .field("theme", &self.theme.as_ref().map(|t| t.name.as_str()))
            .field("first", &self.first)
            .field("second", &self.second)
            .field("active", &self.active)
            .field("combo", &self.combo)
            .field("blocking", &self.blocking)
            .field("caption", &self.caption)
            .field("disappearing", &self.disappearing)
            .field("intersecting", &self.intersecting)
            .field("pending", &self.pending)
            .field("match_delay", &self.match_delay)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_DELAY)
    }
}

impl Engine {
    /// Empty engine: no board, no theme. Both arrive later through the loader.
    pub fn new(match_delay: Duration) -> Self {
        Self {
            board: None,
            theme: None,
            first: None,
            second: None,
            active: None,
            combo: Combo::new(),
            blocking: false,
            caption: None,
            disappearing: HashSet::new(),
            intersecting: Vec::new(),
            pending: None,
            match_delay,
            revision: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a listener called once per state change.
    pub fn subscribe(&mut self, listener: impl FnMut(&EngineEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, event: EngineEvent) {
        self.revision = self.revision.wrapping_add(1);
        trace!(revision = self.revision, ?event, "engine event");
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn load_board(&mut self, board: Board) {
        let (rows, columns) = (board.row_count(), board.column_count());
        info!(rows, columns, layers = board.layer_count(), "board loaded");
        self.board = Some(board);
        self.notify(EngineEvent::BoardLoaded { rows, columns });
    }

    pub fn load_theme(&mut self, theme: Theme) {
        info!(name = %theme.name, "theme loaded");
        let name = theme.name.clone();
        self.theme = Some(theme);
        self.notify(EngineEvent::ThemeLoaded { name });
    }

    // --- board access ---

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn theme(&self) -> Option<&Theme> {
        self.theme.as_ref()
    }

    /// Layer ids at `coord`; empty before the board loads or out of range.
    pub fn layer_ids_at(&self, coord: Coord) -> Vec<&str> {
        self.board
            .as_ref()
            .map(|board| board.layer_ids_at(coord))
            .unwrap_or_default()
    }

    pub fn is_empty_at(&self, coord: Coord) -> bool {
        self.board.as_ref().is_none_or(|board| board.is_empty_at(coord))
    }

    /// Board loaded and every tile cleared.
    pub fn is_cleared(&self) -> bool {
        self.board.as_ref().is_some_and(Board::is_cleared)
    }

    // --- input ---

    /// Click dispatch: first selection, no-op on the first tile itself, or a match attempt.
    pub fn on_tile_click(&mut self, coord: Coord, now: Instant) {
        if self.blocking {
            trace!(%coord, "click ignored while resolving");
            return;
        }
        if !self.board.as_ref().is_some_and(|board| board.contains(coord)) {
            return;
        }
        match self.first {
            None => self.select_first(coord),
            Some(first) if first == coord => {}
            Some(first) => self.attempt_match(first, coord, now),
        }
    }

    /// Record `coord` as the first tile. No-op while blocking, on an empty tile, or on the current first tile.
    pub fn select_first(&mut self, coord: Coord) {
        if self.blocking || self.is_empty_at(coord) || self.first == Some(coord) {
            return;
        }
        debug!(%coord, "first tile selected");
        self.first = Some(coord);
        self.active = Some(coord);
        self.notify(EngineEvent::Selected(coord));
    }

    fn attempt_match(&mut self, first: Coord, second: Coord, now: Instant) {
        self.second = Some(second);
        self.active = Some(second);
        self.intersecting = self.intersecting_ids(first, second);
        self.blocking = true;

        let resolution = if self.intersecting.is_empty() {
            self.combo.record_miss();
            self.caption = Some(Caption::NoMatches);
            debug!(%first, %second, prior = ?self.combo.prior(), "no shared layers");
            Resolution::Miss
        } else {
            let streak = self.combo.record_hit();
            self.caption = Some(if self.would_empty_second_tile() {
                Caption::GoAnywhere
            } else {
                Caption::Streak(streak)
            });
            self.disappearing = self.intersecting.iter().cloned().collect();
            debug!(%first, %second, ids = ?self.intersecting, streak, "match");
            Resolution::Match
        };

        self.pending = Some(PendingCompletion {
            due: now + self.match_delay,
            resolution,
        });
        let event = match resolution {
            Resolution::Match => EngineEvent::MatchStarted {
                first,
                second,
                ids: self.intersecting.clone(),
            },
            Resolution::Miss => EngineEvent::MissStarted { first, second },
        };
        self.notify(event);
    }

    /// Ids present on both tiles, once each, in the order they first appear on `first`.
    fn intersecting_ids(&self, first: Coord, second: Coord) -> Vec<String> {
        let theirs: HashSet<&str> = self.layer_ids_at(second).into_iter().collect();
        let mut seen = HashSet::new();
        self.layer_ids_at(first)
            .into_iter()
            .filter(|id| theirs.contains(id) && seen.insert(*id))
            .map(str::to_string)
            .collect()
    }

    // --- timing ---

    /// Fire the pending completion if it is due. Returns true when it fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(pending) if now >= pending.due => {
                self.pending = None;
                match pending.resolution {
                    Resolution::Match => self.complete_match(),
                    Resolution::Miss => self.complete_miss(),
                }
                true
            }
            _ => false,
        }
    }

    fn complete_match(&mut self) {
        let (Some(first), Some(second)) = (self.first, self.second) else {
            self.clear_animation();
            return;
        };
        if let Some(board) = self.board.as_mut() {
            board.remove_ids(first, &self.intersecting);
            board.remove_ids(second, &self.intersecting);
        }
        let chained = !self.is_empty_at(second);
        self.first = chained.then_some(second);
        self.active = self.first;
        self.second = None;
        self.clear_animation();
        debug!(%first, %second, chained, "match resolved");
        self.notify(EngineEvent::MatchResolved {
            first,
            second,
            chained,
        });
    }

    fn complete_miss(&mut self) {
        self.caption = None;
        self.active = None;
        self.first = None;
        self.second = None;
        self.blocking = false;
        debug!("miss resolved");
        self.notify(EngineEvent::MissResolved);
    }

    fn clear_animation(&mut self) {
        self.blocking = false;
        self.disappearing.clear();
        self.caption = None;
    }

    pub fn pending(&self) -> Option<&PendingCompletion> {
        self.pending.as_ref()
    }

    pub fn match_delay(&self) -> Duration {
        self.match_delay
    }

    // --- state reads ---

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    pub fn caption(&self) -> Option<Caption> {
        self.caption
    }

    pub fn first_tile(&self) -> Option<Coord> {
        self.first
    }

    pub fn second_tile(&self) -> Option<Coord> {
        self.second
    }

    pub fn active_tile(&self) -> Option<Coord> {
        self.active
    }

    pub fn current_streak(&self) -> u32 {
        self.combo.current()
    }

    pub fn longest_streak(&self) -> u32 {
        self.combo.longest()
    }

    pub fn prior_streaks(&self) -> &[u32] {
        self.combo.prior()
    }

    pub fn intersecting(&self) -> &[String] {
        &self.intersecting
    }

    pub fn disappearing_ids(&self) -> &HashSet<String> {
        &self.disappearing
    }

    /// Bumped once per event; lets pollers skip redraws when nothing changed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- display predicates ---

    pub fn is_first_tile(&self, coord: Coord) -> bool {
        self.first == Some(coord)
    }

    pub fn is_second_tile(&self, coord: Coord) -> bool {
        self.second == Some(coord)
    }

    pub fn is_active_tile(&self, coord: Coord) -> bool {
        self.active == Some(coord)
    }

    /// Only layers on the two tiles in play fade.
    pub fn is_disappearing_layer(&self, coord: Coord, layer_id: &str) -> bool {
        (self.is_first_tile(coord) || self.is_second_tile(coord))
            && self.disappearing.contains(layer_id)
    }

    /// True iff the second tile would have no layers left after removing the shared ids.
    pub fn would_empty_second_tile(&self) -> bool {
        match (self.second, self.board.as_ref()) {
            (Some(second), Some(board)) => {
                board.remaining_after_removal(second, &self.intersecting) == 0
            }
            _ => false,
        }
    }

    pub fn has_matches(&self) -> bool {
        !self.intersecting.is_empty()
    }

    /// Checkerboard: even/even and odd/odd tiles are primary.
    pub fn tile_shade(&self, coord: Coord) -> TileShade {
        if (coord.row + coord.column) % 2 == 0 {
            TileShade::Primary
        } else {
            TileShade::Secondary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tile_of;
    use std::cell::RefCell;
    use std::rc::Rc;

    const A: Coord = Coord::new(0, 0);
    const B: Coord = Coord::new(0, 1);
    const C: Coord = Coord::new(1, 0);
    const D: Coord = Coord::new(1, 1);

    /// Each tile is written as space-separated layer ids; "" is an empty tile.
    fn engine_with(rows: &[&[&str]]) -> Engine {
        let mut engine = Engine::default();
        let board = Board::new(
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|tile| tile_of(&tile.split_whitespace().collect::<Vec<_>>()))
                        .collect()
                })
                .collect(),
        );
        engine.load_board(board);
        engine
    }

    fn ids(engine: &Engine, coord: Coord) -> Vec<String> {
        engine
            .layer_ids_at(coord)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn after_delay(t0: Instant) -> Instant {
        t0 + DEFAULT_MATCH_DELAY
    }

    /// Snapshot of everything a click could change.
    fn snapshot(
        engine: &Engine,
    ) -> (
        Option<Board>,
        Option<Coord>,
        Option<Coord>,
        Option<Coord>,
        u32,
        Vec<u32>,
        bool,
        Option<Caption>,
    ) {
        (
            engine.board().cloned(),
            engine.first_tile(),
            engine.second_tile(),
            engine.active_tile(),
            engine.current_streak(),
            engine.prior_streaks().to_vec(),
            engine.is_blocking(),
            engine.caption(),
        )
    }

    fn assert_streak_invariants(engine: &Engine) {
        assert!(engine.longest_streak() >= engine.current_streak());
        assert!(
            engine
                .prior_streaks()
                .iter()
                .all(|&p| engine.longest_streak() >= p)
        );
    }

    #[test]
    fn test_scenario_a_shared_layer_removed_from_both() {
        let mut engine = engine_with(&[&["a b", "b c"]]);
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);

        assert_eq!(engine.intersecting(), &["b".to_string()]);
        assert!(engine.is_blocking());
        assert_eq!(engine.caption(), Some(Caption::Streak(1)));
        assert_eq!(engine.caption().unwrap().to_string(), "1");
        // Board untouched until the delay elapses.
        assert_eq!(ids(&engine, A), vec!["a", "b"]);
        assert!(!engine.tick(t0 + Duration::from_millis(1749)));
        assert!(engine.is_blocking());

        assert!(engine.tick(after_delay(t0)));
        assert_eq!(ids(&engine, A), vec!["a"]);
        assert_eq!(ids(&engine, B), vec!["c"]);
        assert_eq!(engine.current_streak(), 1);
        assert!(!engine.is_blocking());
        assert_eq!(engine.caption(), None);
        assert!(engine.disappearing_ids().is_empty());
    }

    #[test]
    fn test_scenario_b_emptied_second_tile_deselects() {
        let mut engine = engine_with(&[&["a", "a"]]);
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        assert_eq!(engine.caption(), Some(Caption::GoAnywhere));
        assert!(engine.would_empty_second_tile());

        engine.tick(after_delay(t0));
        assert!(engine.is_empty_at(A));
        assert!(engine.is_empty_at(B));
        assert_eq!(engine.first_tile(), None);
        assert_eq!(engine.second_tile(), None);
        assert_eq!(engine.active_tile(), None);
        assert!(engine.is_cleared());
    }

    #[test]
    fn test_scenario_c_miss_archives_streak_and_leaves_board() {
        let mut engine = engine_with(&[&["x", "x a b"], &["c d", ""]]);
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        engine.tick(after_delay(t0));
        assert_eq!(engine.current_streak(), 1);
        assert_eq!(engine.first_tile(), Some(B));

        let t1 = after_delay(t0);
        let board_before = engine.board().cloned();
        engine.on_tile_click(C, t1);
        assert_eq!(engine.caption(), Some(Caption::NoMatches));
        assert_eq!(engine.caption().unwrap().to_string(), "no matches");
        assert!(!engine.has_matches());
        assert_eq!(engine.current_streak(), 0);
        assert_eq!(engine.prior_streaks(), &[1]);

        engine.tick(after_delay(t1));
        assert_eq!(engine.board().cloned(), board_before);
        assert_eq!(engine.first_tile(), None);
        assert_eq!(engine.second_tile(), None);
        assert_eq!(engine.active_tile(), None);
        assert_eq!(engine.caption(), None);
        assert!(!engine.is_blocking());
        assert_eq!(engine.longest_streak(), 1);
    }

    #[test]
    fn test_scenario_d_chained_match_without_reselecting() {
        let mut engine = engine_with(&[&["a b", "a c"], &["c", ""]]);
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        engine.tick(after_delay(t0));

        assert_eq!(engine.first_tile(), Some(B));
        assert_eq!(engine.active_tile(), Some(B));
        assert_eq!(engine.second_tile(), None);

        let t1 = after_delay(t0);
        engine.on_tile_click(C, t1);
        assert_eq!(engine.caption(), Some(Caption::GoAnywhere));
        engine.tick(after_delay(t1));
        assert!(engine.is_empty_at(B));
        assert!(engine.is_empty_at(C));
        assert_eq!(engine.current_streak(), 2);
        assert_eq!(engine.first_tile(), None);
    }

    #[test]
    fn test_scenario_e_caption_depends_on_second_tile_only() {
        // First tile empties, second keeps a layer: caption is the streak.
        let mut engine = engine_with(&[&["a", "a z"], &["z", ""]]);
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        assert!(!engine.would_empty_second_tile());
        assert_eq!(engine.caption().unwrap().to_string(), "1");
        engine.tick(after_delay(t0));

        // Chained from B; the second tile now empties.
        let t1 = after_delay(t0);
        engine.on_tile_click(C, t1);
        assert_eq!(engine.caption().unwrap().to_string(), "go anywhere");
    }

    #[test]
    fn test_duplicate_ids_are_removed_together() {
        let mut engine = engine_with(&[&["a a b", "a c a"]]);
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        assert_eq!(engine.intersecting(), &["a".to_string()]);
        engine.tick(after_delay(t0));
        assert_eq!(ids(&engine, A), vec!["b"]);
        assert_eq!(ids(&engine, B), vec!["c"]);
    }

    #[test]
    fn test_reclicking_first_tile_is_idempotent() {
        let mut engine = engine_with(&[&["a", "b"]]);
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        let before = snapshot(&engine);
        let revision = engine.revision();
        engine.on_tile_click(A, t0);
        engine.select_first(A);
        assert_eq!(snapshot(&engine), before);
        assert_eq!(engine.revision(), revision);
    }

    #[test]
    fn test_select_first_on_empty_tile_is_noop() {
        let mut engine = engine_with(&[&["", "b"]]);
        engine.select_first(A);
        assert_eq!(engine.first_tile(), None);
        assert_eq!(engine.active_tile(), None);
        engine.on_tile_click(A, Instant::now());
        assert_eq!(engine.first_tile(), None);
    }

    #[test]
    fn test_clicks_while_blocking_change_nothing() {
        let mut engine = engine_with(&[&["a", "a b"], &["b", "c"]]);
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        let before = snapshot(&engine);
        let pending = engine.pending().copied();
        for coord in [A, B, C, D, Coord::new(9, 9)] {
            engine.on_tile_click(coord, t0 + Duration::from_millis(10));
            engine.select_first(coord);
        }
        assert_eq!(snapshot(&engine), before);
        assert_eq!(engine.pending().copied(), pending);
    }

    #[test]
    fn test_prior_streaks_grow_once_per_miss() {
        let mut engine = engine_with(&[&["a", "b"], &["c", "a"]]);
        let mut now = Instant::now();
        for round in 1..=3 {
            engine.on_tile_click(A, now);
            engine.on_tile_click(B, now);
            now = after_delay(now);
            engine.tick(now);
            assert_eq!(engine.prior_streaks().len(), round);
            assert_streak_invariants(&engine);
        }
        // A hit does not touch the history.
        engine.on_tile_click(A, now);
        engine.on_tile_click(D, now);
        engine.tick(after_delay(now));
        assert_eq!(engine.prior_streaks().len(), 3);
        assert_eq!(engine.current_streak(), 1);
        assert_streak_invariants(&engine);
    }

    #[test]
    fn test_empty_second_tile_is_a_miss() {
        let mut engine = engine_with(&[&["a", ""]]);
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        assert_eq!(engine.caption(), Some(Caption::NoMatches));
        engine.tick(after_delay(t0));
        assert_eq!(ids(&engine, A), vec!["a"]);
    }

    #[test]
    fn test_absent_board_and_out_of_range_are_safe() {
        let mut engine = Engine::default();
        assert!(engine.layer_ids_at(A).is_empty());
        assert!(engine.is_empty_at(A));
        assert!(!engine.is_cleared());
        engine.on_tile_click(A, Instant::now());
        assert_eq!(engine.first_tile(), None);
        assert!(!engine.would_empty_second_tile());

        let mut engine = engine_with(&[&["a"]]);
        engine.on_tile_click(A, Instant::now());
        engine.on_tile_click(Coord::new(3, 3), Instant::now());
        assert!(!engine.is_blocking());
        assert_eq!(engine.first_tile(), Some(A));
    }

    #[test]
    fn test_disappearing_layer_only_on_tiles_in_play() {
        let mut engine = engine_with(&[&["a b", "b"], &["b", ""]]);
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        assert!(engine.is_disappearing_layer(A, "b"));
        assert!(engine.is_disappearing_layer(B, "b"));
        assert!(!engine.is_disappearing_layer(A, "a"));
        assert!(!engine.is_disappearing_layer(C, "b"));
        assert!(engine.is_first_tile(A));
        assert!(engine.is_second_tile(B));
        assert!(engine.is_active_tile(B));
    }

    #[test]
    fn test_custom_delay_is_respected() {
        let mut engine = Engine::new(Duration::from_millis(100));
        engine.load_board(Board::new(vec![vec![tile_of(&["a"]), tile_of(&["b"])]]));
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        assert_eq!(engine.pending().unwrap().due, t0 + Duration::from_millis(100));
        assert!(engine.tick(t0 + Duration::from_millis(100)));
        assert!(!engine.tick(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn test_one_event_per_change() {
        let mut engine = Engine::default();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        engine.load_board(Board::new(vec![vec![tile_of(&["a", "b"]), tile_of(&["a"])]]));
        let t0 = Instant::now();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        engine.on_tile_click(A, t0);
        engine.tick(after_delay(t0));

        let events = events.borrow();
        assert_eq!(
            *events,
            vec![
                EngineEvent::BoardLoaded { rows: 1, columns: 2 },
                EngineEvent::Selected(A),
                EngineEvent::MatchStarted {
                    first: A,
                    second: B,
                    ids: vec!["a".to_string()],
                },
                EngineEvent::MatchResolved {
                    first: A,
                    second: B,
                    chained: false,
                },
            ]
        );
        assert_eq!(engine.revision(), 4);
    }

    #[test]
    fn test_miss_path_and_ignored_clicks_notify_exactly_once_per_change() {
        let mut engine = engine_with(&[&["a", "b"]]);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        let start = engine.revision();

        let t0 = Instant::now();
        engine.on_tile_click(Coord::new(4, 4), t0);
        assert_eq!(engine.revision(), start);

        engine.on_tile_click(A, t0);
        engine.on_tile_click(B, t0);
        let blocked_at = engine.revision();
        engine.on_tile_click(A, t0);
        engine.on_tile_click(Coord::new(0, 9), t0);
        assert!(!engine.tick(t0));
        assert_eq!(engine.revision(), blocked_at);

        assert!(engine.tick(after_delay(t0)));
        assert!(!engine.tick(after_delay(t0)));

        assert_eq!(
            *events.borrow(),
            vec![
                EngineEvent::Selected(A),
                EngineEvent::MissStarted { first: A, second: B },
                EngineEvent::MissResolved,
            ]
        );
        assert_eq!(engine.revision(), start + 3);
        assert_eq!(blocked_at, start + 2);
    }

    #[test]
    fn test_tile_shade_checkerboard() {
        let engine = Engine::default();
        assert_eq!(engine.tile_shade(A), TileShade::Primary);
        assert_eq!(engine.tile_shade(B), TileShade::Secondary);
        assert_eq!(engine.tile_shade(C), TileShade::Secondary);
        assert_eq!(engine.tile_shade(D), TileShade::Primary);
    }
}
