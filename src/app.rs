//! App: terminal init, main loop, clicks and key handling.

use crate::GameConfig;
use crate::board::Coord;
use crate::engine::{Engine, EngineEvent};
use crate::input::{Action, key_to_action, mouse_click};
use crate::loader::{LoadRequest, Loader};
use crate::source::LocalSource;
use crate::theme::Colors;
use crate::ui::{self, Fade, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Waiting for the board.
    Loading,
    Playing,
    /// Every tile is empty.
    Cleared,
    /// The board fetch failed; nothing to play.
    Unavailable,
}

pub struct App {
    config: GameConfig,
    source: Arc<LocalSource>,
    runtime: Handle,
    engine: Engine,
    loader: Loader,
    events: UnboundedReceiver<EngineEvent>,
    colors: Colors,
    cursor: Coord,
    fade: Fade,
    /// Where the tiles were drawn last frame, for mouse hit-testing.
    board_rect: Option<Rect>,
}

impl App {
    pub fn new(config: GameConfig, source: Arc<LocalSource>, runtime: Handle) -> Self {
        let (engine, events) = Self::new_engine(&config);
        let loader = Self::spawn_loader(&config, &source, &runtime);
        let colors = Colors::resolve(None, config.palette);
        Self {
            config,
            source,
            runtime,
            engine,
            loader,
            events,
            colors,
            cursor: Coord::new(0, 0),
            fade: Fade::default(),
            board_rect: None,
        }
    }

    fn new_engine(config: &GameConfig) -> (Engine, UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut engine = Engine::new(config.match_delay);
        engine.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (engine, rx)
    }

    fn spawn_loader(config: &GameConfig, source: &Arc<LocalSource>, runtime: &Handle) -> Loader {
        let request = LoadRequest {
            theme: config.theme.clone(),
            rows: config.rows,
            columns: config.columns,
        };
        Loader::spawn(runtime, Arc::clone(source), request)
    }

    /// Fresh engine and a new fetch. Streak history goes with the old engine.
    fn restart(&mut self) {
        info!("new board requested");
        let (engine, events) = Self::new_engine(&self.config);
        self.engine = engine;
        self.events = events;
        self.loader = Self::spawn_loader(&self.config, &self.source, &self.runtime);
        self.colors = Colors::resolve(None, self.config.palette);
        self.cursor = Coord::new(0, 0);
        self.fade = Fade::default();
        self.board_rect = None;
    }

    pub fn screen(&self) -> Screen {
        if self.engine.board().is_none() {
            if self.loader.board_missing() || self.loader.is_finished() {
                Screen::Unavailable
            } else {
                Screen::Loading
            }
        } else if self.engine.is_cleared() && !self.engine.is_blocking() {
            Screen::Cleared
        } else {
            Screen::Playing
        }
    }

    /// React to engine notifications: recolour on theme load, restart the fade per attempt.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            debug!(?event, revision = self.engine.revision(), "engine changed");
            match event {
                EngineEvent::ThemeLoaded { .. } => {
                    self.colors = Colors::resolve(self.engine.theme(), self.config.palette);
                }
                EngineEvent::BoardLoaded { .. } => self.cursor = Coord::new(0, 0),
                EngineEvent::MatchResolved { .. } => {
                    // Follow the chain so the next pick starts from the new first tile.
                    if let Some(active) = self.engine.active_tile() {
                        self.cursor = active;
                    }
                    self.fade = Fade::default();
                }
                EngineEvent::MatchStarted { .. } | EngineEvent::MissResolved => {
                    self.fade = Fade::default();
                }
                EngineEvent::Selected(_) | EngineEvent::MissStarted { .. } => {}
            }
        }
    }

    fn move_cursor(&mut self, d_row: isize, d_column: isize) {
        let Some(board) = self.engine.board() else {
            return;
        };
        let max_row = board.row_count().saturating_sub(1);
        let max_column = board.column_count().saturating_sub(1);
        self.cursor = Coord::new(
            self.cursor.row.saturating_add_signed(d_row).min(max_row),
            self.cursor.column.saturating_add_signed(d_column).min(max_column),
        );
    }

    /// Returns false when the player quits.
    fn apply_action(&mut self, action: Action, now: Instant) -> bool {
        match action {
            Action::Quit => return false,
            Action::Up => self.move_cursor(-1, 0),
            Action::Down => self.move_cursor(1, 0),
            Action::Left => self.move_cursor(0, -1),
            Action::Right => self.move_cursor(0, 1),
            Action::Select => {
                if self.screen() == Screen::Playing {
                    self.engine.on_tile_click(self.cursor, now);
                }
            }
            Action::Restart => {
                if matches!(self.screen(), Screen::Cleared | Screen::Unavailable) {
                    self.restart();
                }
            }
            Action::None => {}
        }
        true
    }

    fn click_cell(&mut self, column: u16, row: u16, now: Instant) {
        let Some(board_rect) = self.board_rect else {
            return;
        };
        if let Some(coord) = ui::tile_at(&self.engine, board_rect, column, row) {
            self.cursor = coord;
            self.engine.on_tile_click(coord, now);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            self.loader.apply(&mut self.engine);
            self.engine.tick(now);
            self.drain_events();

            let view = View {
                engine: &self.engine,
                colors: &self.colors,
                screen: self.screen(),
                cursor: self.cursor,
                theme_name: &self.config.theme,
                no_animation: self.config.no_animation,
                now,
            };
            let fade = &mut self.fade;
            let mut board_rect = None;
            terminal.draw(|f| board_rect = ui::draw(f, &view, fade))?;
            self.board_rect = board_rect;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if !self.apply_action(key_to_action(key), Instant::now()) {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => {
                            if let Some((column, row)) = mouse_click(mouse) {
                                self.click_cell(column, row, Instant::now());
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Palette;
    use crate::source::fixtures::{scratch_dir, write_sample_theme};

    fn config(theme: &str) -> GameConfig {
        GameConfig {
            theme: theme.to_string(),
            rows: 2,
            columns: 2,
            match_delay: Duration::from_millis(50),
            palette: Palette::Normal,
            no_animation: true,
            frame_rate: 30.0,
        }
    }

    /// Poll the loader the way the frame loop does until it is done.
    async fn settle(app: &mut App) {
        for _ in 0..500 {
            app.loader.apply(&mut app.engine);
            app.drain_events();
            if app.loader.is_finished() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("loader did not finish");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_loading_then_playing() {
        let dir = scratch_dir("app");
        write_sample_theme(&dir, "garden");
        let source = Arc::new(LocalSource::new(&dir).with_seed(Some(2)));
        let mut app = App::new(config("garden"), source, Handle::current());
        assert_eq!(app.screen(), Screen::Loading);

        settle(&mut app).await;
        assert_eq!(app.screen(), Screen::Playing);
        assert_ne!(app.colors.app_bg, Colors::onedark_default().app_bg);

        // The cursor stays on the board.
        for _ in 0..5 {
            app.apply_action(Action::Down, Instant::now());
            app.apply_action(Action::Right, Instant::now());
        }
        assert_eq!(app.cursor, Coord::new(1, 1));
        assert!(!app.apply_action(Action::Quit, Instant::now()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_missing_board_is_unavailable_and_restartable() {
        let dir = scratch_dir("app-missing");
        let source = Arc::new(LocalSource::new(&dir));
        let mut app = App::new(config("nowhere"), source, Handle::current());
        settle(&mut app).await;
        assert_eq!(app.screen(), Screen::Unavailable);

        write_sample_theme(&dir, "nowhere");
        assert!(app.apply_action(Action::Restart, Instant::now()));
        settle(&mut app).await;
        assert_eq!(app.screen(), Screen::Playing);
    }
}
