use crate::shared::{note_name, NUM_PADS};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

const COLS: usize = 4;
const ROWS: usize = 4;

pub const PAD_KEYS: [&str; NUM_PADS] = [
    "1", "2", "3", "4",
    "Q", "W", "E", "R",
    "A", "S", "D", "F",
    "Z", "X", "C", "V",
];

pub fn draw_pad_grid(frame: &mut Frame, area: Rect, pads_lit: &[bool; NUM_PADS], notes: &[u8; NUM_PADS]) {
    let row_constraints = [Constraint::Percentage(25); ROWS];
    let col_constraints = [Constraint::Percentage(25); COLS];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (row_idx, row_area) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints)
            .split(*row_area);

        for (col_idx, cell_area) in cols.iter().enumerate() {
            let pad_idx = row_idx * COLS + col_idx;
            let lit = pads_lit[pad_idx];
            let color = if lit {
                Style::default().fg(Color::LightMagenta).bg(Color::Magenta)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let label = format!("{} {}", PAD_KEYS[pad_idx], note_name(notes[pad_idx]));
            let pad = Paragraph::new(label)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).border_style(color))
                .style(color);
            frame.render_widget(pad, *cell_area);
        }
    }
}
