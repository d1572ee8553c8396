use crate::geometry::{Point, Rect};
use crate::precompute::{FrameCache, FrameKey};
use crate::surface::{Canvas, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Background,
    /// The dial with the hour and minute hands composited on top. Opaque,
    /// so blitting it twice over the same pixels is harmless.
    Persistent,
    SecondHand(FrameKey),
}

/// One draw operation: copy `source` of `layer` to `dest`.
///
/// `dest` is in clock-local coordinates; it is re-referenced to the output
/// at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitOp {
    pub layer: Layer,
    pub source: Rect,
    pub dest: Rect,
}

impl BlitOp {
    pub fn clear(rect: Rect) -> Self {
        Self {
            layer: Layer::Background,
            source: rect,
            dest: rect,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.layer == Layer::Background
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    #[default]
    None,
    Summary,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Committed {
    Nothing,
    /// Whether any pixels were written.
    Summary(bool),
    /// Output-space rects actually written, one per executed op.
    List(Vec<Rect>),
}

pub struct Layers<'a> {
    pub background: &'a Surface,
    pub persistent: &'a Surface,
    pub cache: &'a FrameCache,
}

impl<'a> Layers<'a> {
    pub fn source(&self, layer: Layer) -> &'a Surface {
        match layer {
            Layer::Background => self.background,
            Layer::Persistent => self.persistent,
            Layer::SecondHand(key) => &self.cache.get(key).image,
        }
    }
}

/// Ordered draw operations accumulated for a single tick.
#[derive(Debug, Default)]
pub struct BlitList {
    ops: Vec<BlitOp>,
}

impl BlitList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[BlitOp] {
        &self.ops
    }

    pub fn push(&mut self, op: BlitOp) {
        self.ops.push(op);
    }

    /// Puts one background clear per rect at the front, keeping the rects'
    /// relative order.
    pub fn prepend_clears(&mut self, rects: &[Rect]) {
        self.ops.splice(0..0, rects.iter().copied().map(BlitOp::clear));
    }

    /// Runs every op against `target` with clock-local rects translated by
    /// `region`'s origin, then empties the list.
    pub fn commit(&mut self, layers: &Layers<'_>, target: &mut dyn Canvas, region: Rect, mode: CommitMode) -> Committed {
        let mut written = Vec::with_capacity(self.ops.len());
        for op in self.ops.drain(..) {
            let dest = op.dest.re_reference(&region);
            written.push(target.blit(layers.source(op.layer), dest.origin(), op.source));
        }
        match mode {
            CommitMode::None => Committed::Nothing,
            CommitMode::Summary => Committed::Summary(written.iter().any(|r| !r.is_empty())),
            CommitMode::List => Committed::List(written),
        }
    }
}

/// Restores `area` (output coordinates) of the clock from its layers,
/// independent of any pending blit list. `second` is the frame currently on
/// screen. Returns the part of the output that was rewritten, if any.
pub fn redraw_area(
    layers: &Layers<'_>,
    second: FrameKey,
    target: &mut dyn Canvas,
    region: Rect,
    area: Rect,
) -> Option<Rect> {
    let area = area.intersection(&region).intersection(&target.bounds());
    if area.is_empty() {
        return None;
    }
    let local = area.translate(-region.x, -region.y);
    target.blit(layers.persistent, area.origin(), local);

    let frame = layers.cache.get(second);
    let on_screen = frame.rect.re_reference(&region);
    if area.intersects(&on_screen) {
        let clipped = area.intersection(&on_screen);
        let source = clipped.translate(-on_screen.x, -on_screen.y);
        target.blit(&frame.image, Point::new(clipped.x, clipped.y), source);
    }
    Some(area)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clears_go_first_in_order() {
        let mut list = BlitList::new();
        let content = BlitOp {
            layer: Layer::Persistent,
            source: Rect::new(0, 0, 4, 4),
            dest: Rect::new(0, 0, 4, 4),
        };
        list.push(content);
        list.prepend_clears(&[Rect::new(1, 1, 1, 1), Rect::new(2, 2, 2, 2)]);
        let ops = list.ops();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0], BlitOp::clear(Rect::new(1, 1, 1, 1)));
        assert_eq!(ops[1], BlitOp::clear(Rect::new(2, 2, 2, 2)));
        assert_eq!(ops[2], content);
    }
}
