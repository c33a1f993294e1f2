use crate::config::{Settings, StartupConfig};
use crate::enrollments::Enrollments;
use crate::notifications::Inbox;
use crate::roster::Roster;
use crate::session::{Session, UserDirectory};
use crate::slots::{demo_registry, SlotRegistry};
use crate::week::WeekCursor;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub settings: Settings,
    pub registry: SlotRegistry,
    pub cursor: WeekCursor,
    pub directory: UserDirectory,
    pub session: Option<Session>,
    pub roster: Roster,
    pub inbox: Inbox,
    pub enrollments: Enrollments,
}

impl AppState {
    pub fn new(startup: StartupConfig, now: NaiveDateTime) -> Self {
        let registry = match startup.slots.as_deref() {
            Some(values) => {
                let (registry, rejected) = SlotRegistry::load_values(values);
                if !rejected.is_empty() {
                    log::warn!("{} configured slot(s) dropped", rejected.len());
                }
                registry
            }
            None => demo_registry(),
        };
        if registry.is_empty() {
            log::warn!("no slots configured; the schedule will be empty");
        }
        let today: NaiveDate = now.date();
        let cursor = WeekCursor::new(today, startup.settings.schedule().week_starts_on);
        Self {
            settings: startup.settings,
            registry,
            cursor,
            directory: UserDirectory::demo(),
            session: None,
            roster: Roster::demo(),
            inbox: Inbox::demo(now),
            enrollments: Enrollments::demo(),
        }
    }
}
