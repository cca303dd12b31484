//! Per-frame plugin dispatch and the visibility state it reads.

use ratatui::layout::Rect;

use crate::plugins::LoadedPlugin;

/// How plugin panels share the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// One plugin at a time, pinned to the workspace region.
    Exclusive,
    /// Each plugin shown or hidden on its own.
    Independent,
}

impl DisplayMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Exclusive => "single app",
            Self::Independent => "independent",
        }
    }
}

/// One visibility flag per loaded plugin plus the exclusive-mode selection.
///
/// In exclusive mode exactly one flag is set (none when there are no
/// plugins). In independent mode flags do not affect each other.
#[derive(Debug, Clone)]
pub struct VisibilityState {
    visible: Vec<bool>,
    selected: Option<usize>,
    mode: DisplayMode,
}

impl VisibilityState {
    /// All plugins start visible; exclusive mode then narrows that to one.
    pub fn new(count: usize, mode: DisplayMode) -> Self {
        let mut state = Self {
            visible: vec![true; count],
            selected: None,
            mode: DisplayMode::Independent,
        };
        state.set_mode(mode);
        state
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn visible_indices(&self) -> Vec<usize> {
        self.visible
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| v.then_some(i))
            .collect()
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        if mode == DisplayMode::Exclusive {
            self.enter_exclusive();
        }
    }

    pub fn toggle_mode(&mut self) {
        let next = match self.mode {
            DisplayMode::Exclusive => DisplayMode::Independent,
            DisplayMode::Independent => DisplayMode::Exclusive,
        };
        self.set_mode(next);
    }

    /// User toggle on one plugin. In exclusive mode this selects it.
    ///
    /// Returns `false` if `index` is out of range.
    pub fn toggle(&mut self, index: usize) -> bool {
        if index >= self.visible.len() {
            return false;
        }
        match self.mode {
            DisplayMode::Exclusive => self.apply_selection(Some(index)),
            DisplayMode::Independent => self.visible[index] = !self.visible[index],
        }
        true
    }

    /// Make `index` the selected plugin and show it.
    ///
    /// Returns `false` if `index` is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.visible.len() {
            return false;
        }
        match self.mode {
            DisplayMode::Exclusive => self.apply_selection(Some(index)),
            DisplayMode::Independent => {
                self.visible[index] = true;
                self.selected = Some(index);
            }
        }
        true
    }

    fn enter_exclusive(&mut self) {
        let count = self.visible.len();
        let choice = self
            .selected
            .filter(|&i| i < count)
            .or_else(|| self.visible.iter().position(|&v| v))
            .or((count > 0).then_some(0));
        self.apply_selection(choice);
    }

    fn apply_selection(&mut self, choice: Option<usize>) {
        self.visible.iter_mut().for_each(|v| *v = false);
        if let Some(index) = choice {
            self.visible[index] = true;
        }
        self.selected = choice;
    }
}

/// Something the dispatcher can draw once per frame.
pub trait Panel {
    fn name(&self) -> &str;
    fn render(&self);
}

impl<H> Panel for LoadedPlugin<H> {
    fn name(&self) -> &str {
        LoadedPlugin::name(self)
    }

    fn render(&self) {
        LoadedPlugin::render(self);
    }
}

/// Boundary to the UI stack: frames each panel's render call.
pub trait PanelSurface {
    /// Fix position and size of the next panel.
    fn pin_next_panel(&mut self, region: Rect);
    fn begin_panel(&mut self, title: &str);
    fn end_panel(&mut self);
}

/// Area of the display not taken by the host control panel on the left.
pub fn workspace_region(display: Rect, control_panel_width: u16) -> Rect {
    let taken = control_panel_width.min(display.width);
    Rect {
        x: display.x + taken,
        y: display.y,
        width: display.width - taken,
        height: display.height,
    }
}

/// Invokes visible panels in discovery order.
#[derive(Debug, Clone, Copy)]
pub struct FrameDispatcher {
    control_panel_width: u16,
}

impl FrameDispatcher {
    pub fn new(control_panel_width: u16) -> Self {
        Self {
            control_panel_width,
        }
    }

    pub fn control_panel_width(&self) -> u16 {
        self.control_panel_width
    }

    /// Render every visible panel once. Returns the number of render calls.
    pub fn dispatch<P, S>(
        &self,
        panels: &[P],
        state: &VisibilityState,
        display: Rect,
        surface: &mut S,
    ) -> usize
    where
        P: Panel,
        S: PanelSurface,
    {
        let pinned = (state.mode() == DisplayMode::Exclusive)
            .then(|| workspace_region(display, self.control_panel_width));

        let mut rendered = 0;
        for (index, panel) in panels.iter().enumerate() {
            if !state.is_visible(index) {
                continue;
            }
            if let Some(region) = pinned {
                surface.pin_next_panel(region);
            }
            surface.begin_panel(panel.name());
            panel.render();
            surface.end_panel();
            rendered += 1;
        }
        rendered
    }
}
