//! Layout and drawing: board of tiles, caption chip, sidebar, loading / cleared / unavailable overlays.

use crate::app::Screen;
use crate::board::Coord;
use crate::engine::{ChipKind, Engine, TileShade};
use crate::theme::Colors;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Tile size in terminal cells, border included.
const TILE_WIDTH: u16 = 14;
const SIDEBAR_WIDTH: u16 = 24;
const SIDEBAR_HEIGHT: u16 = 23;

/// Everything a frame needs to know, borrowed from the app.
pub struct View<'a> {
    pub engine: &'a Engine,
    pub colors: &'a Colors,
    pub screen: Screen,
    pub cursor: Coord,
    /// Requested theme; shown until the theme document arrives.
    pub theme_name: &'a str,
    pub no_animation: bool,
    pub now: Instant,
}

/// Fade of the disappearing layers. Reset at the start and end of every match attempt.
#[derive(Default)]
pub struct Fade {
    effect: Option<Effect>,
    processed_at: Option<Instant>,
}

/// `count` tiles of `size` cells each, saturating instead of overflowing.
fn span(count: usize, size: u16) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX).saturating_mul(size)
}

/// One text row per layer. The theme's group count is the number of layers a fresh tile has.
fn tile_height(engine: &Engine) -> u16 {
    let layers = engine
        .theme()
        .map(|theme| theme.layer_groups.len())
        .filter(|&n| n > 0)
        .or_else(|| {
            engine
                .board()
                .map(|board| board.rows().iter().flatten().map(Vec::len).max().unwrap_or(0))
        })
        .unwrap_or(0)
        .max(1);
    u16::try_from(layers).unwrap_or(u16::MAX).saturating_add(2)
}

/// Board block (with border) and sidebar, centered in `area`. None until a board is loaded.
fn game_layout(area: Rect, engine: &Engine) -> Option<(Rect, Rect)> {
    let board = engine.board()?;
    let bw = span(board.column_count(), TILE_WIDTH).saturating_add(2);
    let bh = span(board.row_count(), tile_height(engine)).saturating_add(2);
    let total_w = bw.saturating_add(SIDEBAR_WIDTH);
    let total_h = bh.max(SIDEBAR_HEIGHT);

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert_chunks[1]);

    let board_outer = Rect {
        height: bh.min(inner[0].height),
        ..inner[0]
    };
    Some((board_outer, inner[1]))
}

/// Screen rect of `coord`, clipped to the board.
fn tile_rect(board_rect: Rect, tile_h: u16, coord: Coord) -> Rect {
    let rect = Rect {
        x: board_rect.x.saturating_add(span(coord.column, TILE_WIDTH)),
        y: board_rect.y.saturating_add(span(coord.row, tile_h)),
        width: TILE_WIDTH,
        height: tile_h,
    };
    rect.intersection(board_rect)
}

/// Tile under terminal cell (`x`, `y`), given where the board was drawn.
pub fn tile_at(engine: &Engine, board_rect: Rect, x: u16, y: u16) -> Option<Coord> {
    if !board_rect.contains(Position::new(x, y)) {
        return None;
    }
    let coord = Coord::new(
        ((y - board_rect.y) / tile_height(engine)) as usize,
        ((x - board_rect.x) / TILE_WIDTH) as usize,
    );
    engine.board()?.contains(coord).then_some(coord)
}

/// Cut `text` to `width` columns, marking the cut with an ellipsis.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Draw the current screen. Returns where the tiles went, for mouse hit-testing.
pub fn draw(frame: &mut Frame, view: &View, fade: &mut Fade) -> Option<Rect> {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(view.colors.app_bg))
        .render(area, frame.buffer_mut());

    match view.screen {
        Screen::Loading => {
            draw_loading(frame, view, area);
            None
        }
        Screen::Unavailable => {
            draw_unavailable(frame, view, area);
            None
        }
        Screen::Playing => draw_game(frame, view, area, fade),
        Screen::Cleared => {
            let board_rect = draw_game(frame, view, area, fade);
            draw_cleared(frame, view, area);
            board_rect
        }
    }
}

fn draw_game(frame: &mut Frame, view: &View, area: Rect, fade: &mut Fade) -> Option<Rect> {
    let engine = view.engine;
    let colors = view.colors;
    let board = engine.board()?;
    let (board_outer, sidebar_area) = game_layout(area, engine)?;

    let name = engine.theme().map_or(view.theme_name, |theme| theme.name.as_str());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.div_line).bg(colors.app_bg))
        .title(Span::styled(
            format!(" Tilematch · {name} "),
            Style::default().fg(colors.title),
        ));
    let board_rect = block.inner(board_outer);
    block.render(board_outer, frame.buffer_mut());

    let tile_h = tile_height(engine);
    let mut fading = HashSet::new();
    for row in 0..board.row_count() {
        for column in 0..board.column_count() {
            let coord = Coord::new(row, column);
            let rect = tile_rect(board_rect, tile_h, coord);
            if rect.is_empty() {
                continue;
            }
            draw_tile(frame.buffer_mut(), rect, coord, view, &mut fading);
        }
    }

    if !view.no_animation && !engine.disappearing_ids().is_empty() && !fading.is_empty() {
        apply_fade(frame, view, board_rect, fading, fade);
    }

    draw_sidebar(frame, view, sidebar_area);
    Some(board_rect)
}

fn draw_tile(
    buf: &mut Buffer,
    rect: Rect,
    coord: Coord,
    view: &View,
    fading: &mut HashSet<(u16, u16)>,
) {
    let engine = view.engine;
    let colors = view.colors;
    let bg = match engine.tile_shade(coord) {
        TileShade::Primary => colors.tile_primary,
        TileShade::Secondary => colors.tile_secondary,
    };
    let (border_color, border_type) = if engine.is_first_tile(coord) {
        (colors.title, BorderType::Double)
    } else if engine.is_second_tile(coord) {
        (colors.group_color(3), BorderType::Double)
    } else if coord == view.cursor {
        (colors.font, BorderType::Thick)
    } else {
        (colors.div_line, BorderType::Plain)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(rect);
    block.render(rect, buf);

    if engine.is_empty_at(coord) {
        Paragraph::new("·")
            .alignment(Alignment::Center)
            .style(Style::default().fg(colors.inactive_fg).bg(bg))
            .render(inner, buf);
    } else if let Some(tile) = engine.board().and_then(|board| board.tile(coord)) {
        let width = inner.width as usize;
        for (i, layer) in tile.iter().enumerate() {
            let y = inner.y + i as u16;
            if y >= inner.bottom() {
                break;
            }
            let group = engine
                .theme()
                .and_then(|theme| theme.group_index(&layer.group_name))
                .unwrap_or(i);
            let mut style = Style::default().fg(colors.group_color(group)).bg(bg);
            if engine.is_disappearing_layer(coord, &layer.id) {
                if view.no_animation {
                    style = style.add_modifier(Modifier::CROSSED_OUT | Modifier::DIM);
                } else {
                    style = style.add_modifier(Modifier::BOLD);
                    fading.extend((inner.x..inner.right()).map(|x| (x, y)));
                }
            }
            buf.set_string(inner.x, y, fit(&layer.id, width), style);
        }
    }

    if let Some(caption) = engine.caption().filter(|_| engine.is_active_tile(coord)) {
        let label = fit(&format!(" {caption} "), rect.width.saturating_sub(2) as usize);
        let style = match caption.kind() {
            ChipKind::Streak => Style::default().fg(colors.app_bg).bg(colors.title),
            ChipKind::Clear => Style::default().fg(colors.app_bg).bg(colors.group_color(0)),
            ChipKind::Miss => Style::default().fg(Color::White).bg(colors.group_color(2)),
        }
        .add_modifier(Modifier::BOLD);
        let x = rect.x + rect.width.saturating_sub(label.chars().count() as u16) / 2;
        buf.set_string(x, rect.bottom().saturating_sub(1), label, style);
    }
}

/// Create or advance the fade of disappearing layers. It runs for the whole match delay.
fn apply_fade(
    frame: &mut Frame,
    view: &View,
    board_rect: Rect,
    fading: HashSet<(u16, u16)>,
    fade: &mut Fade,
) {
    let delta = fade
        .processed_at
        .map(|t| view.now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    fade.processed_at = Some(view.now);

    if fade.effect.is_none() {
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            fading.contains(&(pos.x, pos.y))
        }));
        let fade_ms = view.engine.match_delay().as_millis().min(u32::MAX as u128) as u32;
        let bg = view.colors.tile_primary;
        fade.effect = Some(
            fx::fade_to(bg, bg, (fade_ms, Interpolation::Linear))
                .with_filter(filter)
                .with_area(board_rect),
        );
    }

    if let Some(effect) = fade.effect.as_mut() {
        frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let engine = view.engine;
    let colors = view.colors;
    let title_style = Style::default().fg(colors.title);
    let fg_style = Style::default().fg(colors.font);
    let border_style = Style::default().fg(colors.div_line).bg(colors.app_bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Combo (border + current, longest, timer bar)
            Constraint::Length(1),
            Constraint::Length(4), // Streak history
            Constraint::Length(1),
            Constraint::Length(5), // Board
            Constraint::Length(1),
            Constraint::Length(6), // Help
        ])
        .split(area);

    // --- Combo ---
    let combo_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let combo_inner = combo_block.inner(chunks[0]);
    combo_block.render(chunks[0], frame.buffer_mut());
    let combo_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(1)])
        .split(combo_inner);
    Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Combo: ", title_style),
            Span::styled(engine.current_streak().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Longest: ", title_style),
            Span::styled(engine.longest_streak().to_string(), fg_style),
        ]),
    ])
    .render(combo_layout[0], frame.buffer_mut());
    // Time left before the board changes.
    let ratio = engine.pending().map_or(0.0, |pending| {
        let delay = engine.match_delay().as_secs_f64();
        if delay > 0.0 {
            (pending.due.saturating_duration_since(view.now).as_secs_f64() / delay).min(1.0)
        } else {
            0.0
        }
    });
    let bar_color = if engine.has_matches() {
        colors.group_color(0)
    } else {
        colors.group_color(2)
    };
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(bar_color).bg(colors.app_bg))
        .render(combo_layout[1], frame.buffer_mut());

    // --- Streaks ---
    let streaks_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Streaks ", title_style));
    let streaks_inner = streaks_block.inner(chunks[2]);
    streaks_block.render(chunks[2], frame.buffer_mut());
    let prior = engine.prior_streaks();
    let history = if prior.is_empty() {
        Span::styled("none yet", Style::default().fg(colors.inactive_fg))
    } else {
        let shown = prior.len().saturating_sub(6);
        let text = prior[shown..]
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" · ");
        Span::styled(text, fg_style)
    };
    Paragraph::new(Line::from(history)).render(streaks_inner, frame.buffer_mut());

    // --- Board ---
    let board_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let board_inner = board_block.inner(chunks[4]);
    board_block.render(chunks[4], frame.buffer_mut());
    let layers_left = engine.board().map_or(0, |board| board.layer_count());
    let shared = if engine.is_blocking() && engine.has_matches() {
        engine.intersecting().join(", ")
    } else {
        "-".to_string()
    };
    let picked = match (engine.first_tile(), engine.second_tile()) {
        (Some(first), Some(second)) => format!("{first} {second}"),
        (Some(first), None) => first.to_string(),
        _ => "-".to_string(),
    };
    Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Picked: ", title_style),
            Span::styled(picked, fg_style),
        ]),
        Line::from(vec![
            Span::styled("Layers: ", title_style),
            Span::styled(layers_left.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Shared: ", title_style),
            Span::styled(fit(&shared, SIDEBAR_WIDTH as usize - 10), fg_style),
        ]),
    ])
    .render(board_inner, frame.buffer_mut());

    // --- Help ---
    let key_style = Style::default().fg(colors.group_color(3));
    Paragraph::new(vec![
        Line::from(vec![Span::styled(" ←↑↓→ hjkl ", key_style), Span::from("move")]),
        Line::from(vec![Span::styled(" ENTER ", key_style), Span::from("select")]),
        Line::from(vec![Span::styled(" CLICK ", key_style), Span::from("select")]),
        Line::from(vec![Span::styled(" Q ", key_style), Span::from("quit")]),
    ])
    .style(fg_style)
    .render(chunks[6], frame.buffer_mut());
}

fn popup(frame: &mut Frame, view: &View, area: Rect, lines: Vec<Line>) {
    let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 6;
    let rect = centered(area, width.max(30), lines.len() as u16 + 2);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(view.colors.font).bg(view.colors.app_bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(view.colors.div_line).bg(view.colors.app_bg))
                .title(Span::styled(" Tilematch ", Style::default().fg(view.colors.title))),
        )
        .render(rect, frame.buffer_mut());
}

fn draw_loading(frame: &mut Frame, view: &View, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" Loading {}… ", view.theme_name),
            Style::default().fg(view.colors.title),
        )),
        Line::from(""),
    ];
    popup(frame, view, area, lines);
}

fn draw_unavailable(frame: &mut Frame, view: &View, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Board unavailable ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(format!(" Could not load a board for '{}' ", view.theme_name)),
        Line::from(""),
        Line::from(" R — Retry    Q — Quit "),
        Line::from(""),
    ];
    popup(frame, view, area, lines);
}

fn draw_cleared(frame: &mut Frame, view: &View, area: Rect) {
    let engine = view.engine;
    // The streak that cleared the board has not been pushed to history yet.
    let streaks = engine.prior_streaks().len() + usize::from(engine.current_streak() > 0);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Board cleared! ",
            Style::default().fg(Color::Black).bg(view.colors.group_color(0)),
        )),
        Line::from(""),
        Line::from(format!(" Longest streak: {} ", engine.longest_streak())),
        Line::from(format!(" Streaks: {streaks} ")),
        Line::from(""),
        Line::from(" R — New board    Q — Quit "),
        Line::from(""),
    ];
    popup(frame, view, area, lines);
}
