//! Layout and drawing: playfield, sidebar, pause and game-over overlays.
//!
//! Every frame is redrawn from scratch from the game state.

use crate::BoardColors;
use crate::game::{COLS, Cell, GameState, Phase, ROWS, TetrominoKind};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

/// One board cell is two terminal columns by one row, which keeps it roughly square.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;
/// Outline drawn over the filled cell.
const CELL_SYMBOL: &str = "[]";

const SIDEBAR_WIDTH: u16 = 26;

/// Everything the renderer reads.
pub struct View<'a> {
    pub state: &'a GameState,
    pub theme: &'a Theme,
    pub board_colors: BoardColors,
    pub paused: bool,
    /// Non-fatal problem to show in the sidebar (e.g. high score not saved).
    pub status: Option<&'a str>,
}

/// Playfield size in terminal cells, border included.
fn playfield_size() -> (u16, u16) {
    (
        COLS as u16 * CELL_WIDTH + 2,
        ROWS as u16 * CELL_HEIGHT + 2,
    )
}

/// Playfield and sidebar rects, centred in `area`.
fn split_area(area: Rect) -> (Rect, Rect) {
    let (pw, ph) = playfield_size();
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(pw + SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

fn playfield_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" stackfall ", Style::default().fg(theme.title)))
}

/// Draw the whole screen.
pub fn draw(frame: &mut Frame, view: &View) {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(view.theme.bg))
        .render(area, frame.buffer_mut());

    let (playfield, sidebar) = split_area(area);
    draw_playfield(frame.buffer_mut(), view, playfield);
    draw_sidebar(frame.buffer_mut(), view, sidebar);

    if view.state.phase() == Phase::GameOver {
        draw_game_over(frame, view, area);
    } else if view.paused {
        draw_pause_overlay(frame, view, area);
    }
}

fn draw_playfield(buf: &mut Buffer, view: &View, area: Rect) {
    let theme = view.theme;
    let block = playfield_block(theme);
    let board = block.inner(area);
    block.render(area, buf);

    for (y, row) in view.state.board().rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            if let Cell::Filled(kind) = *cell {
                let color = match view.board_colors {
                    BoardColors::Piece => theme.piece_color(kind),
                    BoardColors::Uniform => theme.board,
                };
                put_block(buf, board, x as i32, y as i32, color, theme.outline);
            }
        }
    }

    let piece = view.state.piece();
    let color = theme.piece_color(piece.kind);
    for (x, y) in piece.cells() {
        put_block(buf, board, x, y, color, theme.outline);
    }
}

/// Paint one board cell; cells off the board or outside a clipped rect are skipped.
fn put_block(buf: &mut Buffer, board: Rect, x: i32, y: i32, color: Color, outline: Color) {
    if x < 0 || y < 0 || x >= COLS as i32 || y >= ROWS as i32 {
        return;
    }
    let rx = board.x + x as u16 * CELL_WIDTH;
    let ry = board.y + y as u16 * CELL_HEIGHT;
    if rx + CELL_WIDTH > board.right() || ry + CELL_HEIGHT > board.bottom() {
        return;
    }
    buf.set_string(rx, ry, CELL_SYMBOL, Style::default().fg(outline).bg(color));
}

fn draw_sidebar(buf: &mut Buffer, view: &View, area: Rect) {
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let key_style = Style::default().fg(theme.piece_color(TetrominoKind::J));
    let score = view.state.score();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg));
    let inner = block.inner(area);
    block.render(area, buf);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(score.current.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("High Score: ", title_style),
            Span::styled(score.high.to_string(), fg_style),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(" ←/→ ", key_style), Span::styled("move", fg_style)]),
        Line::from(vec![Span::styled("  ↑  ", key_style), Span::styled("rotate", fg_style)]),
        Line::from(vec![Span::styled("  ↓  ", key_style), Span::styled("soft drop", fg_style)]),
        Line::from(vec![Span::styled("  P  ", key_style), Span::styled("pause", fg_style)]),
        Line::from(vec![Span::styled("  Q  ", key_style), Span::styled("quit", fg_style)]),
    ];
    if let Some(status) = view.status {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(theme.alert),
        )));
    }
    Paragraph::new(lines)
        .wrap(ratatui::widgets::Wrap { trim: true })
        .render(inner, buf);
}

/// Centred popup of the given size, clipped to `area`.
fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, view: &View, area: Rect) {
    let popup = popup_rect(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(view.theme.title),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P Resume    Q Quit ",
            Style::default().fg(view.theme.main_fg),
        )),
    ];
    frame.render_widget(Clear, popup);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(view.theme.div_line).bg(view.theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let popup = popup_rect(area, 32, 8);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(view.theme.alert)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", view.state.score().current),
            Style::default().fg(view.theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Enter or Space to play again ",
            Style::default().fg(view.theme.main_fg),
        )),
    ];
    frame.render_widget(Clear, popup);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(view.theme.alert).bg(view.theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}
