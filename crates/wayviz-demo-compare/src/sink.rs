//! Plain-text renderer behind the engine's sink seam.
//!
//! Each panel owns a fixed block of terminal lines; every sink event
//! repaints the whole stack in place by cursor-homing over the previous
//! paint. Piped output degrades to a frame-per-event scroll.

use std::collections::BTreeMap;
use std::io::{self, Write};

use wayviz_core::geo::GeoPoint;
use wayviz_core::grid::Cell;
use wayviz_runtime::{GridFrame, PanelId, RenderSink, StatusUpdate};

const ROUTE_BAR_WIDTH: usize = 24;

enum Surface {
    Grid {
        rows: u16,
        cols: u16,
        start: Cell,
        end: Cell,
        obstacles: Vec<Cell>,
        revealed: Vec<Cell>,
        frontier: Option<Cell>,
        path: Vec<Cell>,
        celebrated: bool,
    },
    Route {
        shown: usize,
        finished: bool,
    },
}

impl Surface {
    fn height(&self) -> usize {
        match self {
            Self::Grid { rows, .. } => *rows as usize,
            Self::Route { .. } => 1,
        }
    }
}

struct Slot {
    label: String,
    surface: Surface,
    status: String,
}

/// Renders every registered panel as a block of text lines.
pub struct TextSink {
    slots: BTreeMap<PanelId, Slot>,
    painted_lines: usize,
}

impl TextSink {
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            painted_lines: 0,
        }
    }

    pub fn add_grid(&mut self, id: PanelId, label: &str, rows: u16, cols: u16, start: Cell, end: Cell) {
        self.slots.insert(
            id,
            Slot {
                label: label.to_owned(),
                surface: Surface::Grid {
                    rows,
                    cols,
                    start,
                    end,
                    obstacles: Vec::new(),
                    revealed: Vec::new(),
                    frontier: None,
                    path: Vec::new(),
                    celebrated: false,
                },
                status: String::new(),
            },
        );
    }

    pub fn add_route(&mut self, id: PanelId, label: &str) {
        self.slots.insert(
            id,
            Slot {
                label: label.to_owned(),
                surface: Surface::Route {
                    shown: 0,
                    finished: false,
                },
                status: String::new(),
            },
        );
    }

    fn paint(&mut self) {
        let mut screen = String::new();
        if self.painted_lines > 0 {
            screen.push_str(&format!("\x1b[{}A", self.painted_lines));
        }

        let mut lines = 0;
        for (id, slot) in &self.slots {
            render_slot(&mut screen, *id, slot);
            lines += 2 + slot.surface.height();
        }

        let mut out = io::stdout().lock();
        let _ = out.write_all(screen.as_bytes());
        let _ = out.flush();
        self.painted_lines = lines;
    }
}

impl Default for TextSink {
    fn default() -> Self {
        Self::new()
    }
}

fn push_line(screen: &mut String, content: &str) {
    screen.push_str("\x1b[2K");
    screen.push_str(content);
    screen.push('\n');
}

fn render_slot(screen: &mut String, id: PanelId, slot: &Slot) {
    match &slot.surface {
        Surface::Grid {
            rows,
            cols,
            start,
            end,
            obstacles,
            revealed,
            frontier,
            path,
            celebrated,
        } => {
            let suffix = if *celebrated { "  \u{2714}" } else { "" };
            push_line(screen, &format!("[{id}] {}{suffix}", slot.label));
            for r in 0..*rows {
                let mut row = String::from("    ");
                for c in 0..*cols {
                    let cell = Cell::new(r, c);
                    let glyph = if cell == *start {
                        'S'
                    } else if cell == *end {
                        'E'
                    } else if obstacles.contains(&cell) {
                        '#'
                    } else if *frontier == Some(cell) {
                        '*'
                    } else if path.contains(&cell) {
                        '@'
                    } else if revealed.contains(&cell) {
                        'o'
                    } else {
                        '.'
                    };
                    row.push(glyph);
                    row.push(' ');
                }
                push_line(screen, &row);
            }
        }
        Surface::Route { shown, finished } => {
            push_line(screen, &format!("[{id}] {}", slot.label));
            let filled = (*shown).min(ROUTE_BAR_WIDTH);
            let mut bar = String::from("    [");
            bar.extend(std::iter::repeat_n('=', filled));
            bar.extend(std::iter::repeat_n(' ', ROUTE_BAR_WIDTH - filled));
            bar.push(']');
            bar.push_str(&format!(" {shown} pts"));
            if *finished {
                bar.push_str(" \u{00b7} final");
            }
            push_line(screen, &bar);
        }
    }
    push_line(screen, &format!("    status: {}", slot.status));
}

impl RenderSink for TextSink {
    fn grid_frame(&mut self, panel: PanelId, frame: GridFrame<'_>) {
        if let Some(slot) = self.slots.get_mut(&panel) {
            if let Surface::Grid {
                obstacles,
                revealed,
                frontier,
                path,
                ..
            } = &mut slot.surface
            {
                *obstacles = frame.obstacles.to_vec();
                *revealed = frame.revealed.to_vec();
                *frontier = frame.frontier;
                *path = frame.path.to_vec();
            }
        }
        self.paint();
    }

    fn route_progress(&mut self, panel: PanelId, points: &[GeoPoint]) {
        if let Some(slot) = self.slots.get_mut(&panel) {
            if let Surface::Route { shown, finished } = &mut slot.surface {
                *shown = points.len();
                *finished = false;
            }
        }
        self.paint();
    }

    fn route_final(&mut self, panel: PanelId, points: &[GeoPoint]) {
        if let Some(slot) = self.slots.get_mut(&panel) {
            if let Surface::Route { shown, finished } = &mut slot.surface {
                *shown = points.len();
                *finished = true;
            }
        }
        self.paint();
    }

    fn clear_transient(&mut self, panel: PanelId) {
        if let Some(slot) = self.slots.get_mut(&panel) {
            match &mut slot.surface {
                Surface::Grid {
                    revealed,
                    frontier,
                    path,
                    celebrated,
                    ..
                } => {
                    revealed.clear();
                    *frontier = None;
                    path.clear();
                    *celebrated = false;
                }
                Surface::Route { shown, .. } => *shown = 0,
            }
        }
        self.paint();
    }

    fn clear_final(&mut self, panel: PanelId) {
        if let Some(slot) = self.slots.get_mut(&panel) {
            match &mut slot.surface {
                Surface::Grid {
                    revealed,
                    frontier,
                    path,
                    celebrated,
                    ..
                } => {
                    revealed.clear();
                    *frontier = None;
                    path.clear();
                    *celebrated = false;
                }
                Surface::Route { shown, finished } => {
                    *shown = 0;
                    *finished = false;
                }
            }
        }
        self.paint();
    }

    fn celebrate(&mut self, panel: PanelId) {
        if let Some(slot) = self.slots.get_mut(&panel) {
            if let Surface::Grid { celebrated, .. } = &mut slot.surface {
                *celebrated = true;
            }
        }
        self.paint();
    }

    fn status(&mut self, panel: PanelId, update: StatusUpdate) {
        if let Some(slot) = self.slots.get_mut(&panel) {
            slot.status = update.message();
        }
        self.paint();
    }
}
