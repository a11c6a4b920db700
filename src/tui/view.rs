use crate::editor::envelope::POINT_NAMES;
use crate::shared::{note_name, DisplayState, NUM_PADS};
use super::grid::draw_pad_grid;
use super::mode::TuiState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &mut TuiState, midi_port: Option<&str>) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // sample + params
            Constraint::Min(8), // waveform + envelope
            Constraint::Length(12), // pad grid
            Constraint::Length(1), // status line
        ])
        .split(area);

    draw_header(frame, sections[0], state);
    draw_editor(frame, sections[1], state, ts);

    let notes: [u8; NUM_PADS] = std::array::from_fn(|i| ts.pad_note(i as u8));
    draw_pad_grid(frame, sections[2], &ts.pads_lit(), &notes);
    draw_status(frame, sections[3], state, midi_port);
}

// editor units for a canvas area: one per cell, origin at the top left
pub fn editor_extent(inner: Rect) -> (f32, f32) {
    (
        inner.width.saturating_sub(1).max(1) as f32,
        inner.height.saturating_sub(1).max(1) as f32,
    )
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let sample = if state.url.is_empty() {
        "no sample".to_string()
    } else if state.loading {
        format!("{} (loading)", state.url)
    } else if state.buffer.is_none() {
        format!("{} (not loaded)", state.url)
    } else {
        state.url.clone()
    };

    let mut params: Vec<Span> = POINT_NAMES
        .iter()
        .zip(state.points)
        .map(|(name, v)| Span::raw(format!("{name} {v:.3}  ")))
        .collect();
    if state.holding {
        params.push(Span::styled("HOLD", Style::default().fg(Color::Yellow)));
    }

    let lines = vec![
        Line::from(Span::styled(sample, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(format!(
            "root {}  pitch {}",
            note_name(state.sample_note),
            state.algorithm.label()
        )),
        Line::from(params),
    ];
    let header = Paragraph::new(lines).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn draw_editor(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &mut TuiState) {
    let block = Block::default().borders(Borders::ALL).title(" envelope ");
    let inner = block.inner(area);
    ts.editor_area = Some(inner);

    let (w, h) = editor_extent(inner);
    let (w, h) = (w as f64, h as f64);
    let peaks = match &state.buffer {
        Some(buffer) => ts.waveform.get(buffer, inner.width as usize).to_vec(),
        None => Vec::new(),
    };
    let handles = state.handles;
    let dragging = state.dragging;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(move |ctx| {
            // waveform, centred
            let mid = h / 2.0;
            let cols = peaks.len().saturating_sub(1).max(1) as f64;
            for (i, &(lo, hi)) in peaks.iter().enumerate() {
                let x = i as f64 * w / cols;
                let y1 = mid + lo as f64 * mid;
                let y2 = mid + hi as f64 * mid;
                ctx.draw(&CanvasLine::new(x, y1, x, y2, Color::DarkGray));
            }
            ctx.layer();

            // editor y grows down, the canvas grows up
            let Some(points) = handles else { return };
            for pair in points.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                ctx.draw(&CanvasLine::new(
                    a.x as f64,
                    h - a.y as f64,
                    b.x as f64,
                    h - b.y as f64,
                    Color::Red,
                ));
            }
            for (i, p) in points.iter().enumerate() {
                let color = if dragging == Some(i) { Color::Yellow } else { Color::LightRed };
                ctx.print(p.x as f64, h - p.y as f64, Span::styled("●", Style::default().fg(color)));
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState, midi_port: Option<&str>) {
    let midi = midi_port.unwrap_or("no midi");
    let text = format!(
        " [ ] root  p pitch  , . octave  esc quit  |  {} voices  |  {midi}",
        state.voices_triggered
    );
    frame.render_widget(Paragraph::new(text).style(Style::default().fg(Color::DarkGray)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::automation::PitchAlgorithm;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn display() -> DisplayState {
        DisplayState {
            url: "kick.wav".into(),
            points: [0.0, 0.1, 0.9, 1.0],
            handles: None,
            sample_note: 60,
            algorithm: PitchAlgorithm::PhaseVocoder,
            holding: false,
            dragging: None,
            buffer: None,
            loading: false,
            voices_triggered: 3,
        }
    }

    #[test]
    fn renders_and_records_editor_area() {
        let mut term = Terminal::new(TestBackend::new(80, 32)).unwrap();
        let mut ts = TuiState::new(48);
        let ds = display();
        term.draw(|frame| render(frame, frame.area(), &ds, &mut ts, Some("keys"))).unwrap();

        let area = ts.editor_area.unwrap();
        assert_eq!(area.x, 1);
        assert_eq!(area.width, 78);

        let buffer = term.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("kick.wav (not loaded)"));
        assert!(text.contains("phase-vocoder"));
        assert!(text.contains("keys"));
    }

    #[test]
    fn extent_is_never_zero() {
        assert_eq!(editor_extent(Rect::new(0, 0, 0, 0)), (1.0, 1.0));
        assert_eq!(editor_extent(Rect::new(3, 3, 41, 11)), (40.0, 10.0));
    }
}
