use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::geometry::Rect;
use crate::precompute::FrameKey;

/// Where one hand was drawn on the previous change and where it is now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandRects {
    pub previous: Rect,
    pub current: Rect,
}

impl HandRects {
    fn moved_to(&mut self, rect: Rect) {
        self.previous = self.current;
        self.current = rect;
    }

    pub fn clear_region(&self) -> Rect {
        self.previous.union(&self.current)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Changes {
    pub new_day: bool,
    pub new_minute: bool,
    pub frame: FrameKey,
}

#[derive(Debug)]
pub struct DirtyTracker {
    frame_rate: u32,
    day: Option<NaiveDate>,
    minute: Option<u32>,
    second: Option<u32>,
    sub_frame: u32,
    pub hour: HandRects,
    pub minute_hand: HandRects,
    pub second_hand: HandRects,
}

impl DirtyTracker {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame_rate,
            day: None,
            minute: None,
            second: None,
            sub_frame: 0,
            hour: HandRects::default(),
            minute_hand: HandRects::default(),
            second_hand: HandRects::default(),
        }
    }

    /// Records `now` and reports what differs from the previous call.
    pub fn observe(&mut self, now: &NaiveDateTime) -> Changes {
        let date = now.date();
        let new_day = self.day != Some(date);
        self.day = Some(date);

        let new_minute = self.minute != Some(now.minute());
        self.minute = Some(now.minute());

        // a leap second reports 59 with nanos >= 1e9, so this stays in range
        let second = now.second();
        if self.second == Some(second) {
            self.sub_frame = (self.sub_frame + 1).min(self.frame_rate - 1);
        } else {
            self.sub_frame = 0;
            self.second = Some(second);
        }

        Changes {
            new_day,
            new_minute,
            frame: FrameKey::new(second, self.sub_frame),
        }
    }

    pub fn hands_moved(&mut self, hour: Rect, minute: Rect) {
        self.hour.moved_to(hour);
        self.minute_hand.moved_to(minute);
    }

    pub fn second_moved(&mut self, rect: Rect) {
        self.second_hand.moved_to(rect);
    }

    /// Clear regions for this tick in drawing order: date box (if it
    /// changed), hour hand and minute hand (when `hands` is set), second
    /// hand. Empty regions are dropped.
    pub fn clear_regions(&self, date_box: Option<Rect>, hands: bool) -> Vec<Rect> {
        let hand_regions = if hands {
            [self.hour.clear_region(), self.minute_hand.clear_region()]
        } else {
            [Rect::default(); 2]
        };
        date_box
            .into_iter()
            .chain(hand_regions)
            .chain([self.second_hand.clear_region()])
            .filter(|r| !r.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 9, 13)
            .unwrap()
            .and_hms_milli_opt(h, m, s, ms)
            .unwrap()
    }

    #[test]
    fn first_observation_is_all_new() {
        let mut t = DirtyTracker::new(30);
        let c = t.observe(&at(12, 0, 0, 0));
        assert!(c.new_day && c.new_minute);
        assert_eq!(c.frame, FrameKey::new(0, 0));
    }

    #[test]
    fn sub_frame_advances_by_one_and_resets() {
        let mut t = DirtyTracker::new(30);
        let a = t.observe(&at(12, 0, 5, 0));
        let b = t.observe(&at(12, 0, 5, 33));
        assert_eq!(b.frame.sub_frame, a.frame.sub_frame + 1);
        let c = t.observe(&at(12, 0, 6, 0));
        assert_eq!(c.frame, FrameKey::new(6, 0));
        assert!(!c.new_minute);
    }

    #[test]
    fn sub_frame_saturates() {
        let mut t = DirtyTracker::new(3);
        let frames: Vec<_> = (0..10).map(|i| t.observe(&at(1, 2, 3, i)).frame.sub_frame).collect();
        assert_eq!(frames, vec![0, 1, 2, 2, 2, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn minute_and_day_changes() {
        let mut t = DirtyTracker::new(10);
        t.observe(&at(23, 59, 59, 0));
        let c = t.observe(&at(23, 59, 59, 500));
        assert!(!c.new_minute && !c.new_day);
        let next = NaiveDate::from_ymd_opt(2021, 9, 14).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let c = t.observe(&next);
        assert!(c.new_minute && c.new_day);
    }

    #[test]
    fn clear_regions_union_previous_and_current() {
        let mut t = DirtyTracker::new(10);
        t.hands_moved(Rect::new(0, 0, 5, 5), Rect::new(10, 10, 5, 5));
        t.hands_moved(Rect::new(3, 3, 5, 5), Rect::new(10, 10, 5, 5));
        t.second_moved(Rect::new(50, 50, 2, 2));
        let regions = t.clear_regions(Some(Rect::new(100, 100, 10, 4)), true);
        assert_eq!(
            regions,
            vec![
                Rect::new(100, 100, 10, 4),
                Rect::new(0, 0, 8, 8),
                Rect::new(10, 10, 5, 5),
                Rect::new(50, 50, 2, 2),
            ]
        );
        assert_eq!(t.clear_regions(None, false), vec![Rect::new(50, 50, 2, 2)]);
    }
}
