use crate::animation::Frame as GlobeFrame;
use crate::app::App;
use crate::braille::{BrailleCanvas, BRAILLE_BASE};
use crate::map::{GlobeLayers, Label};
use crate::state::GlobeState;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App, state: &GlobeState, globe: &GlobeFrame) {
    let area = frame.area();

    // Split into globe area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Globe
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_globe(frame, app, globe, chunks[0]);
    render_status_bar(frame, app, state, globe, chunks[1]);
}

fn render_globe(frame: &mut Frame, app: &App, globe: &GlobeFrame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Earth Rotation Speed ",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = app.renderer.render(globe);
    frame.render_widget(GlobeWidget { layers }, inner);
}

/// Composes the braille layers back to front and overlays the handle labels
pub struct GlobeWidget {
    pub layers: GlobeLayers,
}

/// Dot bits of a cell symbol, or 0 if it is not a braille pattern
fn braille_bits(symbol: &str) -> u8 {
    symbol
        .chars()
        .next()
        .map(|c| c as u32)
        .filter(|&c| (BRAILLE_BASE..=BRAILLE_BASE + 0xFF).contains(&c))
        .map_or(0, |c| (c - BRAILLE_BASE) as u8)
}

impl GlobeWidget {
    /// Merge a layer's dots into the buffer. The layer's color wins on shared cells.
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        let rows = canvas.height().min(area.height as usize);
        let cols = canvas.width().min(area.width as usize);

        for cy in 0..rows {
            for cx in 0..cols {
                let bits = canvas.cell(cx, cy);
                if bits == 0 {
                    continue;
                }
                let cell = &mut buf[(area.x + cx as u16, area.y + cy as u16)];
                let merged = braille_bits(cell.symbol()) | bits;
                let ch = char::from_u32(BRAILLE_BASE + merged as u32).unwrap_or(' ');
                cell.set_char(ch).set_fg(color);
            }
        }
    }

    fn render_label(label: &Label, area: Rect, buf: &mut Buffer) {
        if label.row >= area.height {
            return;
        }
        let style = Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD);
        let y = area.y + label.row;

        for (i, ch) in label.text.chars().enumerate() {
            let col = label.col + i as u16;
            if col >= area.width {
                break;
            }
            buf[(area.x + col, y)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for GlobeWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(Color::Black));

        let layers = &self.layers;
        Self::render_layer(&layers.land, Color::White, area, buf);
        Self::render_layer(&layers.parallel, Color::Red, area, buf);
        Self::render_layer(&layers.outline, Color::White, area, buf);
        Self::render_layer(&layers.marker, Color::Red, area, buf);
        Self::render_layer(&layers.handle, Color::Red, area, buf);

        for label in &layers.labels {
            Self::render_label(label, area, buf);
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, state: &GlobeState, globe: &GlobeFrame, area: Rect) {
    let status = Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(
            app.city_label(state),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.latitude_label(globe), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.speed_label(state), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.orientation_label(globe), Style::default().fg(Color::Magenta)),
        Span::styled(
            " | n/p:city 1-9:pick drag:latitude r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers(width: usize, height: usize) -> GlobeLayers {
        GlobeLayers {
            land: BrailleCanvas::new(width, height),
            parallel: BrailleCanvas::new(width, height),
            outline: BrailleCanvas::new(width, height),
            marker: BrailleCanvas::new(width, height),
            handle: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        }
    }

    #[test]
    fn test_braille_bits() {
        assert_eq!(braille_bits("⠁"), 0x01);
        assert_eq!(braille_bits("⣿"), 0xFF);
        assert_eq!(braille_bits(" "), 0);
        assert_eq!(braille_bits("x"), 0);
    }

    #[test]
    fn test_layers_merge_dots_and_last_color_wins() {
        let mut l = layers(2, 1);
        l.land.set_pixel(0, 0);
        l.parallel.set_pixel(1, 0);

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        GlobeWidget { layers: l }.render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "⠉");
        assert_eq!(cell.fg, Color::Red);
        assert_eq!(cell.bg, Color::Black);
        assert_eq!(buf[(1, 0)].symbol(), " ");
    }

    #[test]
    fn test_labels_overlay_and_clip() {
        let mut l = layers(4, 2);
        l.handle.set_pixel(0, 0);
        l.labels.push(Label { col: 2, row: 1, text: "1040".to_string() });

        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        GlobeWidget { layers: l }.render(area, &mut buf);

        assert_eq!(buf[(2, 1)].symbol(), "1");
        assert_eq!(buf[(3, 1)].symbol(), "0");
        assert_eq!(buf[(2, 1)].bg, Color::Red);
        assert_eq!(buf[(0, 0)].symbol(), "⠁");
    }
}
