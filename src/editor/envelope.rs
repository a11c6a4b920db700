// Four draggable envelope handles over the waveform.
//
// Handle x is the parameter value scaled to the editor width; y is purely
// visual and free within the editor. Points are in screen orientation, y
// grows downwards.

use crate::instrument::automation::{Automation, ParamBatch};
use super::state::EditorState;

pub const NUM_POINTS: usize = 4;
pub const POINT_NAMES: [&str; NUM_POINTS] = ["start", "fade in", "fade out", "end"];

// smallest horizontal distance kept between neighbouring handles
pub const MIN_GAP: f32 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pos {
    pub x: f32,
    pub y: f32,
}

impl Pos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleState {
    Idle,
    Dragging,
}

pub struct EnvelopeEditor {
    width: f32,
    height: f32,
    handle_y: [f32; NUM_POINTS],
    handles: [HandleState; NUM_POINTS],
}

impl EnvelopeEditor {
    pub fn new(width: f32, height: f32) -> Self {
        let (width, height) = (sanitize(width), sanitize(height));
        Self {
            width,
            height,
            // silent at the ends, full level across the middle
            handle_y: [height, 0.0, 0.0, height],
            handles: [HandleState::Idle; NUM_POINTS],
        }
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        let (width, height) = (sanitize(width), sanitize(height));
        for y in &mut self.handle_y {
            *y = if self.height > 0.0 { *y / self.height * height } else { 0.0 };
        }
        self.width = width;
        self.height = height;
    }

    pub fn handle_state(&self, index: usize) -> Option<HandleState> {
        self.handles.get(index).copied()
    }

    pub fn dragging(&self) -> Option<usize> {
        self.handles.iter().position(|h| *h == HandleState::Dragging)
    }

    pub fn point(&self, index: usize, state: &EditorState) -> Pos {
        Pos::new(state.points[index] * self.width, self.handle_y[index])
    }

    pub fn points(&self, state: &EditorState) -> [Pos; NUM_POINTS] {
        std::array::from_fn(|i| self.point(i, state))
    }

    // nearest handle within `radius` of `pos`
    pub fn hit_test(&self, pos: Pos, state: &EditorState, radius: f32) -> Option<usize> {
        self.points(state)
            .iter()
            .enumerate()
            .map(|(i, p)| (i, (p.x - pos.x).hypot(p.y - pos.y)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    // Keep `raw` inside the editor and between the neighbouring handles
    pub fn constrain(&self, index: usize, raw: Pos, state: &EditorState) -> Pos {
        let current = self.point(index, state);
        let x = if raw.x.is_finite() { raw.x } else { current.x };
        let y = if raw.y.is_finite() { raw.y } else { current.y };
        let x = x.clamp(0.0, self.width);
        let y = y.clamp(0.0, self.height);

        let prev = index.checked_sub(1).map(|i| state.points[i] * self.width);
        let next = state.points.get(index + 1).map(|v| v * self.width);
        let lo = prev.map_or(0.0, |p| p + MIN_GAP);
        let hi = next.map_or(self.width, |n| n - MIN_GAP);

        let x = if lo <= hi {
            x.clamp(lo, hi)
        } else {
            // neighbours too close for the gap, split the difference
            let a = prev.unwrap_or(0.0);
            let b = next.unwrap_or(self.width);
            ((a + b) * 0.5).clamp(0.0, self.width)
        };
        Pos::new(x, y)
    }

    pub fn on_drag_start(&mut self, index: usize, state: &mut EditorState) -> bool {
        if index >= NUM_POINTS || self.dragging().is_some() {
            return false;
        }
        self.handles[index] = HandleState::Dragging;
        state.hold_automation = true;
        log::debug!("drag start on {}", POINT_NAMES[index]);
        true
    }

    // visual only; nothing reaches automation until the drag ends
    pub fn on_drag_move(&mut self, index: usize, raw: Pos, state: &mut EditorState) -> Option<Pos> {
        if self.handle_state(index) != Some(HandleState::Dragging) {
            return None;
        }
        let pos = self.constrain(index, raw, state);
        state.points[index] = pos.x / self.width;
        self.handle_y[index] = pos.y;
        Some(pos)
    }

    pub fn on_drag_end(&mut self, index: usize, state: &mut EditorState, automation: &mut Automation) -> bool {
        if self.handle_state(index) != Some(HandleState::Dragging) {
            return false;
        }
        self.handles[index] = HandleState::Idle;
        state.hold_automation = false;
        // all four at once so automation never holds half a drag
        automation.set_batch(ParamBatch::envelope(state.envelope()));
        log::debug!("drag end on {}, envelope {:?}", POINT_NAMES[index], state.points);
        true
    }
}

// zero or garbage sizes would turn positions into NaN on the way back
fn sanitize(extent: f32) -> f32 {
    if extent.is_finite() { extent.max(1.0) } else { 1.0 }
}
