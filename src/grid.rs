use crate::occupancy::OccupancySampler;
use crate::slots::RecurringSlot;
use crate::week::{WeekWindow, DAYS_PER_WEEK};
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourRangeError {
    OutOfDay(u32),
    Inverted { first: u32, last: u32 },
}

impl fmt::Display for HourRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HourRangeError::OutOfDay(h) => write!(f, "hour {} is outside 0..=23", h),
            HourRangeError::Inverted { first, last } => {
                write!(f, "first hour {} is after last hour {}", first, last)
            }
        }
    }
}

impl std::error::Error for HourRangeError {}

/// Inclusive range of hour rows shown in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    first: u32,
    last: u32,
}

impl Default for HourRange {
    fn default() -> Self {
        Self { first: 8, last: 19 }
    }
}

impl HourRange {
    pub fn new(first: u32, last: u32) -> Result<Self, HourRangeError> {
        if first > 23 {
            return Err(HourRangeError::OutOfDay(first));
        }
        if last > 23 {
            return Err(HourRangeError::OutOfDay(last));
        }
        if first > last {
            return Err(HourRangeError::Inverted { first, last });
        }
        Ok(Self { first, last })
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    pub fn len(&self) -> usize {
        (self.last - self.first + 1) as usize
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u32> {
        self.first..=self.last
    }

    pub fn contains(&self, hour: u32) -> bool {
        (self.first..=self.last).contains(&hour)
    }

    #[cfg(test)]
    fn row_of(&self, hour: u32) -> Option<usize> {
        self.contains(hour).then(|| (hour - self.first) as usize)
    }
}

/// One occupied (day, hour) position. Borrows its slot from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell<'a> {
    slot: &'a RecurringSlot,
    date: NaiveDate,
    enrolled_count: u32,
}

impl<'a> GridCell<'a> {
    fn new(slot: &'a RecurringSlot, date: NaiveDate, sampled: u32) -> Self {
        let enrolled_count = if sampled > slot.capacity() {
            log::warn!(
                "occupancy {} for slot {} exceeds capacity {}; clamping",
                sampled,
                slot.id(),
                slot.capacity()
            );
            slot.capacity()
        } else {
            sampled
        };
        Self {
            slot,
            date,
            enrolled_count,
        }
    }

    pub fn slot(&self) -> &'a RecurringSlot {
        self.slot
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn enrolled_count(&self) -> u32 {
        self.enrolled_count
    }

    pub fn is_full(&self) -> bool {
        self.enrolled_count >= self.slot.capacity()
    }

    pub fn available_seats(&self) -> u32 {
        self.slot.capacity() - self.enrolled_count
    }

    pub fn status(&self) -> &'static str {
        if self.is_full() {
            "full"
        } else {
            "available"
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(self.slot.start())
    }

    pub fn end(&self) -> NaiveDateTime {
        self.date.and_time(self.slot.end())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSummary {
    pub sessions: u32,
    pub full_sessions: u32,
    pub available_sessions: u32,
    /// Seat totals are summed in `u64`: a week of `u32::MAX` capacities fits.
    pub enrolled: u64,
    pub capacity: u64,
    pub occupancy_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEvent {
    pub id: String,
    pub slot_id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub enrolled_count: u32,
    pub capacity: u32,
    pub status: &'static str,
}

/// A projected week: `cells[day][row]`, day in display order, row offset
/// from the first displayed hour.
#[derive(Debug, Clone)]
pub struct WeekGrid<'a> {
    window: WeekWindow,
    hours: HourRange,
    cells: Vec<Vec<Option<GridCell<'a>>>>,
}

impl<'a> WeekGrid<'a> {
    pub fn window(&self) -> &WeekWindow {
        &self.window
    }

    pub fn hours(&self) -> HourRange {
        self.hours
    }

    pub fn column(&self, day_index: usize) -> &[Option<GridCell<'a>>] {
        &self.cells[day_index]
    }

    #[cfg(test)]
    pub fn cell(&self, day_index: usize, hour: u32) -> Option<&GridCell<'a>> {
        let row = self.hours.row_of(hour)?;
        self.cells.get(day_index)?.get(row)?.as_ref()
    }

    /// Occupied cells as `(day_index, hour, cell)` in day-then-hour order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, u32, &GridCell<'a>)> + '_ {
        let first = self.hours.first();
        self.cells.iter().enumerate().flat_map(move |(d, col)| {
            col.iter()
                .enumerate()
                .filter_map(move |(r, c)| c.as_ref().map(|c| (d, first + r as u32, c)))
        })
    }

    pub fn summary(&self) -> GridSummary {
        let mut s = GridSummary::default();
        for (_, _, c) in self.occupied() {
            s.sessions += 1;
            if c.is_full() {
                s.full_sessions += 1;
            }
            s.enrolled += u64::from(c.enrolled_count());
            s.capacity += u64::from(c.slot().capacity());
        }
        s.available_sessions = s.sessions - s.full_sessions;
        if s.capacity > 0 {
            // enrolled <= capacity, so the quotient is at most 100.
            let percent = (u128::from(s.enrolled) * 100 + u128::from(s.capacity) / 2)
                / u128::from(s.capacity);
            s.occupancy_percent = u32::try_from(percent).unwrap_or(100);
        }
        s
    }

    pub fn events(&self, title: &str) -> Vec<ClassEvent> {
        self.occupied()
            .map(|(_, _, c)| ClassEvent {
                id: format!("event-{}", c.slot().id()),
                slot_id: c.slot().id().to_string(),
                title: title.to_string(),
                start: c.start(),
                end: c.end(),
                enrolled_count: c.enrolled_count(),
                capacity: c.slot().capacity(),
                status: c.status(),
            })
            .collect()
    }
}

/// Projects `slots` onto every (day, hour) position of `window`.
///
/// A cell is occupied by the first slot that recurs on that calendar date and
/// starts in that hour; the weekday comes from the date itself, not from the
/// display index. The sampler is the only source of non-determinism.
pub fn project_grid<'a, S>(
    window: &WeekWindow,
    slots: &'a [RecurringSlot],
    hours: HourRange,
    sampler: &mut S,
) -> WeekGrid<'a>
where
    S: OccupancySampler + ?Sized,
{
    let mut cells = Vec::with_capacity(DAYS_PER_WEEK);
    for date in window.days().iter().copied() {
        let column: Vec<Option<GridCell<'a>>> = hours
            .iter()
            .map(|hour| {
                slots
                    .iter()
                    .find(|s| s.occurs_on(date) && s.start_hour() == hour)
                    .map(|slot| GridCell::new(slot, date, sampler.sample(slot, date)))
            })
            .collect();
        cells.push(column);
    }
    WeekGrid {
        window: *window,
        hours,
        cells,
    }
}

/// Sessions from `now` onwards in date, then start-time order, looking at most
/// `horizon_days` calendar days ahead with today counted as the first. A
/// session that already ended today is skipped; one in progress is kept.
pub fn upcoming_sessions<'a, I, S>(
    slots: I,
    now: NaiveDateTime,
    horizon_days: u32,
    limit: usize,
    sampler: &mut S,
) -> Vec<GridCell<'a>>
where
    I: IntoIterator<Item = &'a RecurringSlot>,
    S: OccupancySampler + ?Sized,
{
    let slots: Vec<&'a RecurringSlot> = slots.into_iter().collect();
    let today = now.date();
    let mut out = Vec::new();
    for offset in 0..horizon_days {
        let Some(date) = today.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };
        let mut due: Vec<&'a RecurringSlot> = slots
            .iter()
            .copied()
            .filter(|s| s.occurs_on(date) && (date > today || s.end() > now.time()))
            .collect();
        due.sort_by_key(|s| s.start());
        for slot in due {
            if out.len() >= limit {
                return out;
            }
            out.push(GridCell::new(slot, date, sampler.sample(slot, date)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::RandomOccupancy;
    use crate::slots::{demo_registry, SlotRecord, SlotRegistry};
    use chrono::{NaiveTime, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn slot(id: &str, day: Weekday, start_h: u32, capacity: u32) -> RecurringSlot {
        RecurringSlot::new(
            id,
            day,
            NaiveTime::from_hms_opt(start_h, 0, 0).expect("time"),
            NaiveTime::from_hms_opt(start_h + 1, 0, 0).expect("time"),
            capacity,
        )
        .expect("slot")
    }

    fn week(d: NaiveDate, starts_on: Weekday) -> WeekWindow {
        WeekWindow::containing(d, starts_on).expect("window")
    }

    fn demo_hours() -> HourRange {
        HourRange::new(8, 19).expect("hours")
    }

    #[test]
    fn hour_range_validation() {
        assert_eq!(demo_hours().len(), 12);
        assert_eq!(HourRange::new(9, 8), Err(HourRangeError::Inverted { first: 9, last: 8 }));
        assert_eq!(HourRange::new(8, 24), Err(HourRangeError::OutOfDay(24)));
        assert_eq!(HourRange::new(12, 12).expect("single").len(), 1);
    }

    #[test]
    fn wednesday_evening_slot_is_the_only_cell() {
        let (reg, rejected) = SlotRegistry::load(vec![SlotRecord {
            id: Some("wed".into()),
            teacher_id: None,
            day_of_week: 3,
            start_time: "18:00".into(),
            end_time: "19:00".into(),
            capacity: 6,
            is_active: true,
            start_date: None,
            end_date: None,
        }]);
        assert!(rejected.is_empty());
        let window = week(date(2024, 10, 16), Weekday::Mon);
        let mut sampler = |_: &RecurringSlot, _: NaiveDate| 2;
        let grid = project_grid(&window, reg.as_slice(), demo_hours(), &mut sampler);

        let occupied: Vec<_> = grid.occupied().collect();
        assert_eq!(occupied.len(), 1);
        let (day, hour, cell) = occupied[0];
        assert_eq!(day, 2);
        assert_eq!(hour, 18);
        assert_eq!(cell.date(), date(2024, 10, 16));
        assert_eq!(cell.slot().capacity(), 6);

        let empty = (0..DAYS_PER_WEEK)
            .flat_map(|d| grid.column(d).iter())
            .filter(|c| c.is_none())
            .count();
        assert_eq!(empty, DAYS_PER_WEEK * 12 - 1);
    }

    #[test]
    fn monday_ten_oclock_slot_appears_exactly_once() {
        let slots = vec![slot("mon10", Weekday::Mon, 10, 4)];
        let window = week(date(2024, 1, 3), Weekday::Mon);
        let mut sampler = |_: &RecurringSlot, _: NaiveDate| 1;
        let grid = project_grid(&window, &slots, demo_hours(), &mut sampler);

        let cell = grid.cell(0, 10).expect("monday 10:00");
        assert_eq!(cell.slot().id(), "mon10");
        assert_eq!(grid.occupied().count(), 1);
        assert!(grid.cell(0, 11).is_none());
        assert!(grid.cell(1, 10).is_none());
        assert!(grid.cell(0, 7).is_none());
    }

    #[test]
    fn weekday_comes_from_the_date_not_the_column() {
        let slots = vec![slot("sun9", Weekday::Sun, 9, 3)];
        let hours = demo_hours();
        let mut sampler = |_: &RecurringSlot, _: NaiveDate| 0;

        let monday_first = week(date(2024, 1, 3), Weekday::Mon);
        let grid = project_grid(&monday_first, &slots, hours, &mut sampler);
        assert!(grid.cell(6, 9).is_some());
        assert!(grid.cell(0, 9).is_none());

        let sunday_first = week(date(2024, 1, 3), Weekday::Sun);
        let grid = project_grid(&sunday_first, &slots, hours, &mut sampler);
        assert!(grid.cell(0, 9).is_some());
        assert!(grid.cell(6, 9).is_none());
    }

    #[test]
    fn occupancy_invariants_hold_for_random_sampling() {
        let reg = demo_registry();
        let mut sampler = RandomOccupancy::seeded(3);
        let mut window = week(date(2024, 3, 1), Weekday::Mon);
        for _ in 0..20 {
            let grid = project_grid(&window, reg.as_slice(), demo_hours(), &mut sampler);
            assert_eq!(grid.occupied().count(), 6);
            for (_, _, c) in grid.occupied() {
                assert!(c.enrolled_count() <= c.slot().capacity());
                assert_eq!(c.is_full(), c.enrolled_count() >= c.slot().capacity());
            }
            window = week(window.end() + chrono::Duration::days(1), Weekday::Mon);
        }
    }

    #[test]
    fn out_of_range_sample_is_clamped() {
        let slots = vec![slot("a", Weekday::Tue, 10, 4)];
        let window = week(date(2024, 1, 2), Weekday::Mon);
        let mut sampler = |_: &RecurringSlot, _: NaiveDate| 99;
        let grid = project_grid(&window, &slots, demo_hours(), &mut sampler);
        let cell = grid.cell(1, 10).expect("tuesday");
        assert_eq!(cell.enrolled_count(), 4);
        assert!(cell.is_full());
        assert_eq!(cell.available_seats(), 0);
    }

    #[test]
    fn sampler_sees_each_occupied_cell_once() {
        let reg = demo_registry();
        let window = week(date(2024, 5, 8), Weekday::Mon);
        let mut seen = Vec::new();
        let mut sampler = |s: &RecurringSlot, d: NaiveDate| {
            seen.push((s.id().to_string(), d));
            0
        };
        project_grid(&window, reg.as_slice(), demo_hours(), &mut sampler);
        assert_eq!(seen.len(), 6);
        assert!(seen.contains(&("ts4".to_string(), date(2024, 5, 8))));
    }

    #[test]
    fn inactive_and_out_of_bounds_slots_stay_empty() {
        let slots = vec![
            slot("off", Weekday::Mon, 10, 4).with_active(false),
            slot("later", Weekday::Tue, 10, 4)
                .with_date_bounds(Some(date(2025, 1, 1)), None)
                .expect("bounds"),
        ];
        let window = week(date(2024, 1, 3), Weekday::Mon);
        let mut sampler = |_: &RecurringSlot, _: NaiveDate| 0;
        let grid = project_grid(&window, &slots, demo_hours(), &mut sampler);
        assert_eq!(grid.occupied().count(), 0);
    }

    #[test]
    fn first_match_wins_on_unvalidated_input() {
        let slots = vec![slot("first", Weekday::Mon, 10, 4), slot("second", Weekday::Mon, 10, 8)];
        let window = week(date(2024, 1, 1), Weekday::Mon);
        let mut sampler = |_: &RecurringSlot, _: NaiveDate| 0;
        let grid = project_grid(&window, &slots, demo_hours(), &mut sampler);
        assert_eq!(grid.cell(0, 10).expect("cell").slot().id(), "first");
    }

    #[test]
    fn summary_and_events_reflect_cells() {
        let slots = vec![slot("a", Weekday::Mon, 10, 4), slot("b", Weekday::Wed, 18, 6)];
        let window = week(date(2024, 1, 1), Weekday::Mon);
        let mut sampler = |s: &RecurringSlot, _: NaiveDate| if s.id() == "a" { 4 } else { 2 };
        let grid = project_grid(&window, &slots, demo_hours(), &mut sampler);

        let summary = grid.summary();
        assert_eq!(summary.sessions, 2);
        assert_eq!(summary.full_sessions, 1);
        assert_eq!(summary.available_sessions, 1);
        assert_eq!(summary.enrolled, 6);
        assert_eq!(summary.capacity, 10);
        assert_eq!(summary.occupancy_percent, 60);

        let events = grid.events("Archery Class");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "event-a");
        assert_eq!(events[0].status, "full");
        assert_eq!(events[1].status, "available");
        assert_eq!(
            events[1].start,
            date(2024, 1, 3).and_hms_opt(18, 0, 0).expect("datetime")
        );
        assert_eq!(
            events[1].end,
            date(2024, 1, 3).and_hms_opt(19, 0, 0).expect("datetime")
        );
    }

    #[test]
    fn summary_totals_do_not_overflow_on_huge_capacities() {
        let slots = vec![
            slot("mon", Weekday::Mon, 10, u32::MAX),
            slot("tue", Weekday::Tue, 10, u32::MAX),
        ];
        let window = week(date(2024, 1, 3), Weekday::Mon);
        let mut sampler = |s: &RecurringSlot, _: NaiveDate| s.capacity();
        let grid = project_grid(&window, &slots, demo_hours(), &mut sampler);

        let summary = grid.summary();
        assert_eq!(summary.sessions, 2);
        assert_eq!(summary.full_sessions, 2);
        assert_eq!(summary.capacity, 2 * u64::from(u32::MAX));
        assert_eq!(summary.enrolled, summary.capacity);
        assert_eq!(summary.occupancy_percent, 100);
    }

    #[test]
    fn upcoming_sessions_keep_classes_in_progress_and_honour_the_limit() {
        let reg = demo_registry();
        let mut sampler = |_: &RecurringSlot, _: NaiveDate| 1;

        // Wednesday 18:30, halfway through ts4.
        let now = date(2024, 1, 17).and_hms_opt(18, 30, 0).expect("now");
        let next = upcoming_sessions(reg.as_slice(), now, 7, 3, &mut sampler);
        let seen: Vec<(&str, NaiveDate)> = next.iter().map(|c| (c.slot().id(), c.date())).collect();
        assert_eq!(
            seen,
            vec![
                ("ts4", date(2024, 1, 17)),
                ("ts5", date(2024, 1, 18)),
                ("ts6", date(2024, 1, 19)),
            ]
        );

        let after_class = date(2024, 1, 17).and_hms_opt(19, 0, 0).expect("now");
        let week = upcoming_sessions(reg.as_slice(), after_class, 7, 100, &mut sampler);
        let ids: Vec<&str> = week.iter().map(|c| c.slot().id()).collect();
        assert_eq!(ids, vec!["ts5", "ts6", "ts1", "ts2", "ts3"]);
        assert!(week.iter().all(|c| c.enrolled_count() == 1));

        assert!(upcoming_sessions(reg.as_slice(), now, 0, 10, &mut sampler).is_empty());
        assert!(upcoming_sessions(reg.as_slice(), now, 7, 0, &mut sampler).is_empty());
    }

    #[test]
    fn upcoming_sessions_stop_at_the_last_representable_day() {
        let reg = demo_registry();
        let mut sampler = |_: &RecurringSlot, _: NaiveDate| 0;
        let now = NaiveDate::MAX.and_hms_opt(0, 0, 0).expect("now");
        let found = upcoming_sessions(reg.as_slice(), now, 30, 10, &mut sampler);
        assert!(found.iter().all(|c| c.date() == NaiveDate::MAX));
    }

    #[test]
    fn empty_week_summary_has_zero_occupancy() {
        let window = week(date(2024, 1, 1), Weekday::Mon);
        let mut sampler = |_: &RecurringSlot, _: NaiveDate| 0;
        let grid = project_grid(&window, &[], demo_hours(), &mut sampler);
        assert_eq!(grid.summary(), GridSummary::default());
        assert!(grid.events("x").is_empty());
    }
}
