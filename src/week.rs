use chrono::{Datelike, Days, NaiveDate, Weekday};

pub const DAYS_PER_WEEK: usize = 7;

/// Seven consecutive calendar days starting on the configured first weekday.
///
/// Dates are local calendar days; no timezone is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekWindow {
    days: [NaiveDate; DAYS_PER_WEEK],
}

/// The most recent `week_starts_on` on or before `reference`, followed by the
/// next six days.
///
/// `None` when part of that week falls outside chrono's representable dates.
pub fn compute_week_window(
    reference: NaiveDate,
    week_starts_on: Weekday,
) -> Option<[NaiveDate; DAYS_PER_WEEK]> {
    let back = (7 + reference.weekday().num_days_from_monday()
        - week_starts_on.num_days_from_monday())
        % 7;
    let start = reference.checked_sub_days(Days::new(u64::from(back)))?;
    let mut days = [start; DAYS_PER_WEEK];
    for (i, day) in days.iter_mut().enumerate().skip(1) {
        *day = start.checked_add_days(Days::new(i as u64))?;
    }
    Some(days)
}

impl WeekWindow {
    pub fn containing(reference: NaiveDate, week_starts_on: Weekday) -> Option<Self> {
        compute_week_window(reference, week_starts_on).map(|days| Self { days })
    }

    pub fn days(&self) -> &[NaiveDate; DAYS_PER_WEEK] {
        &self.days
    }

    pub fn start(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn end(&self) -> NaiveDate {
        self.days[DAYS_PER_WEEK - 1]
    }

    pub fn week_starts_on(&self) -> Weekday {
        self.days[0].weekday()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start()..=self.end()).contains(&date)
    }

}

/// Which week the schedule view is showing. Only the three navigation
/// triggers move it, and a move that would leave the representable calendar
/// is refused without changing the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCursor {
    reference: NaiveDate,
    week_starts_on: Weekday,
}

impl WeekCursor {
    pub fn new(reference: NaiveDate, week_starts_on: Weekday) -> Self {
        Self {
            reference,
            week_starts_on,
        }
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn week_starts_on(&self) -> Weekday {
        self.week_starts_on
    }

    pub fn set_week_starts_on(&mut self, week_starts_on: Weekday) {
        self.week_starts_on = week_starts_on;
    }

    pub fn window(&self) -> Option<WeekWindow> {
        WeekWindow::containing(self.reference, self.week_starts_on)
    }

    pub fn next_week(&mut self) -> Option<WeekWindow> {
        let reference = self.reference.checked_add_days(Days::new(7))?;
        self.move_to(reference)
    }

    pub fn previous_week(&mut self) -> Option<WeekWindow> {
        let reference = self.reference.checked_sub_days(Days::new(7))?;
        self.move_to(reference)
    }

    pub fn jump_to_today(&mut self, today: NaiveDate) -> Option<WeekWindow> {
        self.move_to(today)
    }

    fn move_to(&mut self, reference: NaiveDate) -> Option<WeekWindow> {
        let window = WeekWindow::containing(reference, self.week_starts_on)?;
        self.reference = reference;
        Some(window)
    }
}

pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    raw.trim().parse::<Weekday>().ok()
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
