//! Fire-and-forget loading of the theme and board. Fetches run on the tokio runtime;
//! results come back over a channel that the UI loop drains every frame.

use crate::board::Board;
use crate::engine::Engine;
use crate::source::TileSource;
use crate::theme::Theme;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, error::TryRecvError};
use tracing::{debug, info};

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub theme: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug)]
enum Loaded {
    Theme(Option<Theme>),
    Board(Option<Board>),
}

/// In-flight fetches for one engine.
#[derive(Debug)]
pub struct Loader {
    rx: UnboundedReceiver<Loaded>,
    outstanding: usize,
    board_missing: bool,
}

impl Loader {
    /// Start both fetches and return immediately.
    pub fn spawn<S>(handle: &Handle, source: Arc<S>, request: LoadRequest) -> Self
    where
        S: TileSource + Send + Sync + 'static,
    {
        info!(theme = %request.theme, rows = request.rows, columns = request.columns, "loading");
        let (tx, rx) = mpsc::unbounded_channel();

        let theme_tx = tx.clone();
        let theme_source = Arc::clone(&source);
        let theme_name = request.theme.clone();
        handle.spawn(async move {
            let theme = theme_source.fetch_theme(&theme_name).await;
            // Receiver gone means the game was restarted or closed.
            let _ = theme_tx.send(Loaded::Theme(theme));
        });

        handle.spawn(async move {
            let board = source
                .fetch_board(&request.theme, request.rows, request.columns)
                .await;
            let _ = tx.send(Loaded::Board(board));
        });

        Self {
            rx,
            outstanding: 2,
            board_missing: false,
        }
    }

    /// Hand every result that has arrived to `engine`. Returns true if anything changed.
    pub fn apply(&mut self, engine: &mut Engine) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(loaded) => changed |= self.deliver(loaded, engine),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // A task died without sending.
                    if self.outstanding > 0 {
                        self.outstanding = 0;
                        self.board_missing |= engine.board().is_none();
                    }
                    break;
                }
            }
        }
        changed
    }

    fn deliver(&mut self, loaded: Loaded, engine: &mut Engine) -> bool {
        self.outstanding = self.outstanding.saturating_sub(1);
        match loaded {
            Loaded::Theme(Some(theme)) => engine.load_theme(theme),
            Loaded::Board(Some(board)) => engine.load_board(board),
            Loaded::Theme(None) => {
                debug!("no theme; using default colours");
                return false;
            }
            Loaded::Board(None) => {
                self.board_missing = true;
                return false;
            }
        }
        true
    }

    pub fn is_finished(&self) -> bool {
        self.outstanding == 0
    }

    /// The board fetch finished without a board.
    pub fn board_missing(&self) -> bool {
        self.board_missing
    }
}
