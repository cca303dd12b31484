use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::dispatch::{DisplayMode, PanelSurface, VisibilityState};

const COLOR_ACCENT: (u8, u8, u8) = (0xDD, 0x66, 0x66);
const COLOR_ERROR: (u8, u8, u8) = (0xB0, 0x5A, 0x7A);
const COLOR_HINT: (u8, u8, u8) = (0x80, 0x80, 0x80);

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// A panel frame recorded during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelFrame {
    pub title: String,
    /// Fixed region, if the dispatcher pinned one.
    pub region: Option<Rect>,
}

/// [`PanelSurface`] for the terminal frontend.
///
/// Pinned panels keep their region. Free panels share the workspace in
/// equal horizontal bands, in the order they were rendered.
#[derive(Debug)]
pub struct TerminalSurface {
    workspace: Rect,
    pinned: Option<Rect>,
    open: Option<PanelFrame>,
    panels: Vec<PanelFrame>,
}

impl TerminalSurface {
    pub fn new(workspace: Rect) -> Self {
        Self {
            workspace,
            pinned: None,
            open: None,
            panels: Vec::new(),
        }
    }

    pub fn panels(&self) -> &[PanelFrame] {
        &self.panels
    }

    /// Final screen area of every recorded panel.
    pub fn layout(&self) -> Vec<(&PanelFrame, Rect)> {
        let free = self.panels.iter().filter(|p| p.region.is_none()).count();
        let bands = if free == 0 {
            Vec::new()
        } else {
            let constraints = vec![Constraint::Ratio(1, free as u32); free];
            Layout::default()
                .direction(Direction::Vertical)
                .constraints(constraints)
                .split(self.workspace)
                .to_vec()
        };

        let mut bands = bands.into_iter();
        self.panels
            .iter()
            .filter_map(|panel| {
                let area = match panel.region {
                    Some(region) => region,
                    None => bands.next()?,
                };
                Some((panel, area))
            })
            .collect()
    }

    pub fn draw(&self, f: &mut Frame) {
        for (panel, area) in self.layout() {
            if area.width == 0 || area.height == 0 {
                continue;
            }
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(rgb(COLOR_ACCENT)))
                .title(Span::styled(
                    format!(" {} ", panel.title),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            f.render_widget(block, area);
        }
    }
}

impl PanelSurface for TerminalSurface {
    fn pin_next_panel(&mut self, region: Rect) {
        self.pinned = Some(region);
    }

    fn begin_panel(&mut self, title: &str) {
        self.open = Some(PanelFrame {
            title: title.to_string(),
            region: self.pinned.take(),
        });
    }

    fn end_panel(&mut self) {
        if let Some(panel) = self.open.take() {
            self.panels.push(panel);
        }
    }
}

/// Host control panel: loaded plugins, mode, load errors and key hints.
pub struct ControlPanel<'a> {
    pub names: Vec<&'a str>,
    pub visibility: &'a VisibilityState,
    pub cursor: usize,
    pub errors: &'a [String],
}

impl ControlPanel<'_> {
    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(format!("Loaded plugins: {}", self.names.len()))];

        let exclusive = self.visibility.mode() == DisplayMode::Exclusive;
        for (index, name) in self.names.iter().enumerate() {
            let shown = self.visibility.is_visible(index);
            let marker = match (exclusive, shown) {
                (true, true) => "(*)",
                (true, false) => "( )",
                (false, true) => "[x]",
                (false, false) => "[ ]",
            };
            let pointer = if index == self.cursor { ">" } else { " " };
            let mut style = Style::default();
            if index == self.cursor {
                style = style.fg(rgb(COLOR_ACCENT)).add_modifier(Modifier::BOLD);
            }
            lines.push(Line::from(Span::styled(
                format!("{pointer} {marker} {}. {name}", index + 1),
                style,
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(format!("Mode: {}", self.visibility.mode().label())));

        if !self.errors.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from("Plugin load errors:"));
            for error in self.errors {
                lines.push(Line::from(Span::styled(
                    error.clone(),
                    Style::default().fg(rgb(COLOR_ERROR)),
                )));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "q quit  m mode  ↑/↓ move  space toggle",
            Style::default().fg(rgb(COLOR_HINT)),
        )));
        lines
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let paragraph = Paragraph::new(self.lines())
            .block(Block::default().borders(Borders::ALL).title(" Host "))
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }
}
