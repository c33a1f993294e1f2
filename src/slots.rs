use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const TIME_FORMAT: &str = "%H:%M";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire shape of a slot as it arrives from configuration or the UI.
///
/// `dayOfWeek` counts from Sunday (0) to Saturday (6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    Malformed(String),
    InvalidDay(i64),
    InvalidTime(String),
    EmptyRange { start: NaiveTime, end: NaiveTime },
    NonPositiveCapacity(i64),
    InvalidDate(String),
    InvalidDateBounds { start: NaiveDate, end: NaiveDate },
    DuplicateId(String),
    Overlap { id: String, existing: String },
    NotFound(String),
}

impl SlotError {
    /// Stable error code reported over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            SlotError::Overlap { .. } => "slot_overlap",
            SlotError::DuplicateId(_) => "duplicate_slot",
            SlotError::NotFound(_) => "not_found",
            _ => "invalid_slot",
        }
    }
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::Malformed(msg) => write!(f, "malformed slot record: {}", msg),
            SlotError::InvalidDay(d) => write!(f, "dayOfWeek must be in 0..=6, got {}", d),
            SlotError::InvalidTime(raw) => write!(f, "time must be HH:MM, got {:?}", raw),
            SlotError::EmptyRange { start, end } => write!(
                f,
                "startTime {} must be before endTime {}",
                start.format(TIME_FORMAT),
                end.format(TIME_FORMAT)
            ),
            SlotError::NonPositiveCapacity(c) => write!(f, "capacity must be > 0, got {}", c),
            SlotError::InvalidDate(raw) => write!(f, "date must be YYYY-MM-DD, got {:?}", raw),
            SlotError::InvalidDateBounds { start, end } => {
                write!(f, "startDate {} is after endDate {}", start, end)
            }
            SlotError::DuplicateId(id) => write!(f, "slot id {} already exists", id),
            SlotError::Overlap { id, existing } => {
                write!(f, "slot {} overlaps existing slot {}", id, existing)
            }
            SlotError::NotFound(id) => write!(f, "slot {} not found", id),
        }
    }
}

impl std::error::Error for SlotError {}

/// Maps the Sunday-based day number used on the wire to a chrono weekday.
pub fn weekday_from_sunday(n: i64) -> Option<Weekday> {
    match n {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, SlotError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map_err(|_| SlotError::InvalidTime(raw.to_string()))
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, SlotError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| SlotError::InvalidDate(raw.to_string()))
}

/// A validated weekly-recurring bookable window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringSlot {
    id: String,
    teacher_id: Option<String>,
    day: Weekday,
    start: NaiveTime,
    end: NaiveTime,
    capacity: u32,
    is_active: bool,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl RecurringSlot {
    pub fn new(
        id: impl Into<String>,
        day: Weekday,
        start: NaiveTime,
        end: NaiveTime,
        capacity: u32,
    ) -> Result<Self, SlotError> {
        if start >= end {
            return Err(SlotError::EmptyRange { start, end });
        }
        if capacity == 0 {
            return Err(SlotError::NonPositiveCapacity(0));
        }
        Ok(Self {
            id: id.into(),
            teacher_id: None,
            day,
            start,
            end,
            capacity,
            is_active: true,
            start_date: None,
            end_date: None,
        })
    }

    /// Blank ids count as unassigned.
    pub fn with_teacher(mut self, teacher_id: Option<String>) -> Self {
        self.teacher_id = teacher_id.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn with_date_bounds(
        mut self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, SlotError> {
        if let (Some(s), Some(e)) = (start_date, end_date) {
            if s > e {
                return Err(SlotError::InvalidDateBounds { start: s, end: e });
            }
        }
        self.start_date = start_date;
        self.end_date = end_date;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn teacher_id(&self) -> Option<&str> {
        self.teacher_id.as_deref()
    }

    pub fn day(&self) -> Weekday {
        self.day
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn start_hour(&self) -> u32 {
        self.start.hour()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// True when the slot recurs on `date`: active, same weekday, inside the
    /// optional effective-date bounds.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.is_active
            && date.weekday() == self.day
            && self.start_date.map_or(true, |s| date >= s)
            && self.end_date.map_or(true, |e| date <= e)
    }

    fn date_bounds_intersect(&self, other: &RecurringSlot) -> bool {
        let lo = match (self.start_date, other.start_date) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let hi = match (self.end_date, other.end_date) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        match (lo, hi) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        }
    }

    /// Two active slots conflict when they share a weekday and either their
    /// time ranges intersect or they start in the same hour (both would claim
    /// the same grid row).
    pub fn conflicts_with(&self, other: &RecurringSlot) -> bool {
        if !self.is_active || !other.is_active || self.day != other.day {
            return false;
        }
        let intersects = self.start < other.end && other.start < self.end;
        let same_row = self.start_hour() == other.start_hour();
        (intersects || same_row) && self.date_bounds_intersect(other)
    }
}

impl TryFrom<SlotRecord> for RecurringSlot {
    type Error = SlotError;

    fn try_from(rec: SlotRecord) -> Result<Self, Self::Error> {
        let day = weekday_from_sunday(rec.day_of_week).ok_or(SlotError::InvalidDay(rec.day_of_week))?;
        let start = parse_time(&rec.start_time)?;
        let end = parse_time(&rec.end_time)?;
        if rec.capacity <= 0 {
            return Err(SlotError::NonPositiveCapacity(rec.capacity));
        }
        let capacity = u32::try_from(rec.capacity)
            .map_err(|_| SlotError::Malformed(format!("capacity {} is too large", rec.capacity)))?;
        let id = rec
            .id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let start_date = parse_optional_date(rec.start_date.as_deref())?;
        let end_date = parse_optional_date(rec.end_date.as_deref())?;

        Ok(RecurringSlot::new(id, day, start, end, capacity)?
            .with_teacher(rec.teacher_id)
            .with_active(rec.is_active)
            .with_date_bounds(start_date, end_date)?)
    }
}

impl From<&RecurringSlot> for SlotRecord {
    fn from(slot: &RecurringSlot) -> Self {
        SlotRecord {
            id: Some(slot.id.clone()),
            teacher_id: slot.teacher_id.clone(),
            day_of_week: i64::from(slot.day.num_days_from_sunday()),
            start_time: slot.start.format(TIME_FORMAT).to_string(),
            end_time: slot.end.format(TIME_FORMAT).to_string(),
            capacity: i64::from(slot.capacity),
            is_active: slot.is_active,
            start_date: slot.start_date.map(|d| d.format(DATE_FORMAT).to_string()),
            end_date: slot.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSlot {
    pub index: usize,
    pub id: Option<String>,
    pub error: SlotError,
}

/// Ordered collection of slots with unique ids and no conflicting active pairs.
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    slots: Vec<RecurringSlot>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from raw records. Entries that fail validation or
    /// conflict with an earlier entry are dropped, logged and reported back.
    pub fn load<I>(records: I) -> (Self, Vec<RejectedSlot>)
    where
        I: IntoIterator<Item = SlotRecord>,
    {
        let mut registry = Self::new();
        let mut rejected = Vec::new();
        for (index, rec) in records.into_iter().enumerate() {
            let id = rec.id.clone();
            let result = RecurringSlot::try_from(rec).and_then(|slot| registry.insert(slot).map(|_| ()));
            if let Err(error) = result {
                log::warn!(
                    "dropping slot #{} ({}): {}",
                    index,
                    id.as_deref().unwrap_or("<no id>"),
                    error
                );
                rejected.push(RejectedSlot { index, id, error });
            }
        }
        (registry, rejected)
    }

    /// Same as [`SlotRegistry::load`] but tolerates entries that are not even
    /// shaped like a slot record.
    pub fn load_values(values: &[serde_json::Value]) -> (Self, Vec<RejectedSlot>) {
        let mut records = Vec::with_capacity(values.len());
        let mut malformed = Vec::new();
        for (index, v) in values.iter().enumerate() {
            match serde_json::from_value::<SlotRecord>(v.clone()) {
                Ok(rec) => records.push((index, rec)),
                Err(e) => {
                    let id = v.get("id").and_then(|x| x.as_str()).map(|s| s.to_string());
                    log::warn!("dropping slot #{}: {}", index, e);
                    malformed.push(RejectedSlot {
                        index,
                        id,
                        error: SlotError::Malformed(e.to_string()),
                    });
                }
            }
        }

        let positions: Vec<usize> = records.iter().map(|(i, _)| *i).collect();
        let (registry, mut rejected) = Self::load(records.into_iter().map(|(_, r)| r));
        for r in rejected.iter_mut() {
            r.index = positions[r.index];
        }
        rejected.extend(malformed);
        rejected.sort_by_key(|r| r.index);
        (registry, rejected)
    }

    pub fn insert(&mut self, slot: RecurringSlot) -> Result<&RecurringSlot, SlotError> {
        if self.get(slot.id()).is_some() {
            return Err(SlotError::DuplicateId(slot.id));
        }
        if let Some(existing) = self.slots.iter().find(|s| s.conflicts_with(&slot)) {
            return Err(SlotError::Overlap {
                id: slot.id,
                existing: existing.id.clone(),
            });
        }
        self.slots.push(slot);
        let idx = self.slots.len() - 1;
        Ok(&self.slots[idx])
    }

    pub fn remove(&mut self, id: &str) -> Result<RecurringSlot, SlotError> {
        let idx = self
            .slots
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| SlotError::NotFound(id.to_string()))?;
        Ok(self.slots.remove(idx))
    }

    /// Re-activating a slot re-runs the conflict check against the others.
    pub fn set_active(&mut self, id: &str, active: bool) -> Result<&RecurringSlot, SlotError> {
        let idx = self
            .slots
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| SlotError::NotFound(id.to_string()))?;
        if active && !self.slots[idx].is_active {
            let candidate = self.slots[idx].clone().with_active(true);
            if let Some(existing) = self
                .slots
                .iter()
                .enumerate()
                .find(|(i, s)| *i != idx && s.conflicts_with(&candidate))
                .map(|(_, s)| s)
            {
                return Err(SlotError::Overlap {
                    id: id.to_string(),
                    existing: existing.id.clone(),
                });
            }
        }
        self.slots[idx].is_active = active;
        Ok(&self.slots[idx])
    }

    pub fn get(&self, id: &str) -> Option<&RecurringSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn as_slice(&self) -> &[RecurringSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn records(&self) -> Vec<SlotRecord> {
        self.slots.iter().map(SlotRecord::from).collect()
    }
}

/// The six weekly sessions the academy runs out of the box.
pub fn demo_registry() -> SlotRegistry {
    let demo = [
        ("ts1", 1, "10:00", "11:00", 4),
        ("ts2", 1, "17:00", "18:00", 4),
        ("ts3", 2, "10:00", "11:00", 4),
        ("ts4", 3, "18:00", "19:00", 6),
        ("ts5", 4, "17:00", "18:00", 4),
        ("ts6", 5, "16:00", "17:00", 4),
    ];
    let records = demo.iter().map(|(id, day, start, end, cap)| SlotRecord {
        id: Some(id.to_string()),
        teacher_id: Some("1".to_string()),
        day_of_week: *day,
        start_time: start.to_string(),
        end_time: end.to_string(),
        capacity: *cap,
        is_active: true,
        start_date: Some("2024-01-01".to_string()),
        end_date: None,
    });
    let (registry, rejected) = SlotRegistry::load(records);
    debug_assert!(rejected.is_empty());
    registry
}
