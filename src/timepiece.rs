//! The analog timepiece. Three layers are composited bottom to top: the
//! dial, the persistent layer (dial plus hour and minute hands) and the
//! second hand, picked every tick from frames rendered ahead of time.

use chrono::{NaiveDateTime, Timelike};
use log::{debug, trace};

use crate::compositor::{redraw_area, BlitList, BlitOp, CommitMode, Committed, Layer, Layers};
use crate::dirty::DirtyTracker;
use crate::draw::draw_radial_line;
use crate::error::ClockError;
use crate::font::{BitmapFont, GlyphSource};
use crate::geometry::{angle_for_unit, Rect};
use crate::precompute::{render_face, ClockGeometry, DateBox, FrameCache, FrameKey};
use crate::ramp::RampCurve;
use crate::surface::{Canvas, Color, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimepieceOptions {
    pub frame_rate: u32,
    /// Total border in pixels between the region edge and the dial.
    pub margin: u32,
    pub curve: RampCurve,
    /// Skip clearing and redrawing unchanged hour/minute hands, restoring
    /// them only where this tick's clears erased them.
    pub skip_idle_hands: bool,
}

impl Default for TimepieceOptions {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            margin: 150,
            curve: RampCurve::default(),
            skip_idle_hands: false,
        }
    }
}

/// Hour and minute hand angles in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AngleFrame {
    pub hour: f64,
    pub minute: f64,
}

impl AngleFrame {
    pub fn at(now: &NaiveDateTime) -> Self {
        let minute = f64::from(now.minute());
        Self {
            hour: angle_for_unit(f64::from(now.hour()) + minute / 60.0, 12.0),
            minute: angle_for_unit(minute, 60.0),
        }
    }
}

/// Everything built on the first tick.
#[derive(Debug)]
struct Prepared {
    cache: FrameCache,
    date_box: DateBox,
}

pub struct Timepiece {
    region: Rect,
    options: TimepieceOptions,
    geometry: ClockGeometry,
    font: Box<dyn GlyphSource>,
    background: Surface,
    /// Hour and minute hands on transparency.
    hands: Surface,
    /// `background` with `hands` composited over it.
    persistent: Surface,
    prepared: Option<Prepared>,
    tracker: DirtyTracker,
    angles: AngleFrame,
    showing: FrameKey,
    blits: BlitList,
}

impl Timepiece {
    /// Creates a clock drawn into `region` of a `target_width × target_height`
    /// output. The date box uses `font`, or the built-in bitmap digits when
    /// it is `None`. Nothing is rendered until the first `compute`.
    pub fn new(
        target_width: u32,
        target_height: u32,
        region: Rect,
        options: TimepieceOptions,
        font: Option<Box<dyn GlyphSource>>,
    ) -> Result<Self, ClockError> {
        if region.w != region.h || region.is_empty() {
            return Err(ClockError::NonSquareRegion {
                width: region.w,
                height: region.h,
            });
        }
        let target = Rect::new(0, 0, target_width as i32, target_height as i32);
        if !target.contains(&region) {
            return Err(ClockError::RegionOutsideTarget {
                region,
                width: target_width,
                height: target_height,
            });
        }
        if options.frame_rate == 0 {
            return Err(ClockError::ZeroFrameRate);
        }
        let side = region.w as u32;
        if options.margin >= side {
            return Err(ClockError::MarginTooLarge {
                margin: options.margin,
                side,
            });
        }
        let geometry = ClockGeometry::new(side, options.margin);
        let font = match font {
            Some(font) => font,
            None => Box::new(BitmapFont::with_height((3 * geometry.radius / 25).max(5) as u32)),
        };
        Ok(Self {
            region,
            options,
            geometry,
            font,
            background: Surface::new(side, side),
            hands: Surface::new(side, side),
            persistent: Surface::new(side, side),
            prepared: None,
            tracker: DirtyTracker::new(options.frame_rate),
            angles: AngleFrame::default(),
            showing: FrameKey::default(),
            blits: BlitList::new(),
        })
    }

    pub fn region(&self) -> Rect {
        self.region
    }

    pub fn geometry(&self) -> &ClockGeometry {
        &self.geometry
    }

    pub fn angles(&self) -> AngleFrame {
        self.angles
    }

    pub fn current_frame(&self) -> FrameKey {
        self.showing
    }

    pub fn pending(&self) -> &[BlitOp] {
        self.blits.ops()
    }

    /// Advances the clock to `now` and queues the blits for this tick.
    ///
    /// Must be called exactly once per loop iteration: repeated calls within
    /// a second advance the second-hand animation.
    pub fn compute(&mut self, now: &NaiveDateTime) {
        let first = self.prepared.is_none();
        if first {
            self.prepare(now);
        }
        let changes = self.tracker.observe(now);

        let mut date_clear = None;
        if changes.new_day && !first {
            if let Some(prepared) = &self.prepared {
                let rect = prepared.date_box.rect;
                prepared.date_box.draw(&mut self.background, self.font.as_ref(), now.date());
                self.recomposite(rect);
                date_clear = Some(rect);
            }
        }
        if changes.new_minute {
            self.redraw_hands(now);
        }

        let frame_rect = match &self.prepared {
            Some(prepared) => prepared.cache.get(changes.frame).rect,
            None => return,
        };
        self.showing = changes.frame;
        self.tracker.second_moved(frame_rect);

        let idle = self.options.skip_idle_hands && !changes.new_minute;
        let clears = self.tracker.clear_regions(date_clear, !idle);
        let restore = if idle {
            clears.clone()
        } else {
            vec![self.tracker.hour.current, self.tracker.minute_hand.current]
        };
        for rect in restore {
            self.blits.push(BlitOp {
                layer: Layer::Persistent,
                source: rect,
                dest: rect,
            });
        }
        self.blits.push(BlitOp {
            layer: Layer::SecondHand(changes.frame),
            source: Rect::new(0, 0, frame_rect.w, frame_rect.h),
            dest: frame_rect,
        });
        self.blits.prepend_clears(&clears);
        trace!("tick {:?}: {} clears", changes.frame, clears.len());
    }

    /// Draws the queued blits onto `target` and empties the queue.
    pub fn commit(&mut self, target: &mut dyn Canvas, mode: CommitMode) -> Committed {
        let Some(prepared) = &self.prepared else {
            return match mode {
                CommitMode::None => Committed::Nothing,
                CommitMode::Summary => Committed::Summary(false),
                CommitMode::List => Committed::List(Vec::new()),
            };
        };
        trace!(
            "committing {} blits, {} clears",
            self.pending().len(),
            self.pending().iter().filter(|op| op.is_clear()).count()
        );
        let layers = Layers {
            background: &self.background,
            persistent: &self.persistent,
            cache: &prepared.cache,
        };
        self.blits.commit(&layers, target, self.region, mode)
    }

    /// Repaints `area` of `target` (output coordinates) from the current
    /// layers, e.g. after an overlay drew on top of the clock. Areas outside
    /// the clock are ignored. Returns the rewritten rect.
    pub fn partial_redraw(&self, target: &mut dyn Canvas, area: Rect) -> Option<Rect> {
        let prepared = self.prepared.as_ref()?;
        let layers = Layers {
            background: &self.background,
            persistent: &self.persistent,
            cache: &prepared.cache,
        };
        redraw_area(&layers, self.showing, target, self.region, area)
    }

    fn prepare(&mut self, now: &NaiveDateTime) {
        render_face(&mut self.background, &self.geometry);
        let date_box = DateBox::layout(&self.geometry, self.font.as_ref());
        date_box.draw(&mut self.background, self.font.as_ref(), now.date());
        self.persistent = self.background.clone();
        let cache = FrameCache::build(&self.geometry, self.options.frame_rate, self.options.curve);
        let whole = Rect::new(0, 0, self.region.w, self.region.h);
        self.blits.push(BlitOp::clear(whole));
        self.prepared = Some(Prepared { cache, date_box });
    }

    /// Rebuilds `rect` of the persistent layer from the dial and the hands.
    fn recomposite(&mut self, rect: Rect) {
        self.persistent.blit(&self.background, rect.origin(), rect);
        self.persistent.blit(&self.hands, rect.origin(), rect);
    }

    fn redraw_hands(&mut self, now: &NaiveDateTime) {
        let stale = [self.tracker.hour.current, self.tracker.minute_hand.current];
        for rect in stale {
            self.hands.fill_rect(rect, Color::TRANSPARENT);
        }
        self.angles = AngleFrame::at(now);
        let center = self.geometry.center();
        let hour = draw_radial_line(
            &mut self.hands,
            center,
            self.geometry.hour_len,
            self.angles.hour,
            Color::BLACK,
            self.geometry.hour_stroke,
        );
        let minute = draw_radial_line(
            &mut self.hands,
            center,
            self.geometry.minute_len,
            self.angles.minute,
            Color::BLACK,
            self.geometry.minute_stroke,
        );
        debug!("hands moved to {:02}:{:02}", now.hour(), now.minute());
        self.tracker.hands_moved(hour, minute);
        for rect in stale.into_iter().chain([hour, minute]) {
            self.recomposite(rect);
        }
    }
}
