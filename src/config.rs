use crate::grid::HourRange;
use crate::week::{parse_weekday, weekday_name};
use anyhow::{Context, Result};
use chrono::Weekday;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "ACADEMYD_CONFIG";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupSection {
    Schedule,
    Academy,
}

impl SetupSection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "schedule" => Some(Self::Schedule),
            "academy" => Some(Self::Academy),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Academy => "academy",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Schedule => json!({
            "weekStartsOn": "monday",
            "firstHour": 8,
            "lastHour": 19,
            "classTitle": "Archery Class",
            "classDurationMinutes": 60
        }),
        SetupSection::Academy => json!({
            "name": "Archery Academy",
            "timezoneLabel": "local"
        }),
    }
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_non_empty(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = parse_string_max(v, key, max_len)?;
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    Ok(s)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())?;
    for (k, v) in patch {
        match section {
            SetupSection::Schedule => match k.as_str() {
                "weekStartsOn" => {
                    let raw = parse_string_max(v, k, 16)?;
                    let day = parse_weekday(&raw)
                        .ok_or_else(|| "weekStartsOn must be a weekday name".to_string())?;
                    obj.insert(k.clone(), Value::String(weekday_name(day).to_string()));
                }
                "firstHour" | "lastHour" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 23)?));
                }
                "classTitle" => {
                    obj.insert(k.clone(), Value::String(parse_non_empty(v, k, 80)?));
                }
                "classDurationMinutes" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 15, 240)?));
                }
                _ => return Err(format!("unknown schedule field: {}", k)),
            },
            SetupSection::Academy => match k.as_str() {
                "name" => {
                    obj.insert(k.clone(), Value::String(parse_non_empty(v, k, 120)?));
                }
                "timezoneLabel" => {
                    obj.insert(k.clone(), Value::String(parse_non_empty(v, k, 64)?));
                }
                _ => return Err(format!("unknown academy field: {}", k)),
            },
        }
    }
    if section == SetupSection::Schedule {
        let first = obj.get("firstHour").and_then(|v| v.as_i64()).unwrap_or(0);
        let last = obj.get("lastHour").and_then(|v| v.as_i64()).unwrap_or(23);
        if first > last {
            return Err(format!("firstHour {} must be <= lastHour {}", first, last));
        }
    }
    Ok(())
}

/// Typed view of the `schedule` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub week_starts_on: Weekday,
    pub hours: HourRange,
    pub class_title: String,
    pub class_duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    schedule: Value,
    academy: Value,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schedule: default_section(SetupSection::Schedule),
            academy: default_section(SetupSection::Academy),
        }
    }
}

impl Settings {
    pub fn section(&self, section: SetupSection) -> &Value {
        match section {
            SetupSection::Schedule => &self.schedule,
            SetupSection::Academy => &self.academy,
        }
    }

    /// Applies `patch` atomically: either every key is accepted or nothing
    /// changes.
    pub fn update(&mut self, section: SetupSection, patch: &Map<String, Value>) -> Result<(), String> {
        let mut next = self.section(section).clone();
        merge_section_patch(section, &mut next, patch)?;
        match section {
            SetupSection::Schedule => self.schedule = next,
            SetupSection::Academy => self.academy = next,
        }
        Ok(())
    }

    pub fn schedule(&self) -> ScheduleSettings {
        let obj = &self.schedule;
        let week_starts_on = obj
            .get("weekStartsOn")
            .and_then(|v| v.as_str())
            .and_then(parse_weekday)
            .unwrap_or(Weekday::Mon);
        let first = obj
            .get("firstHour")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(8);
        let last = obj
            .get("lastHour")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(19);
        let hours = HourRange::new(first, last).unwrap_or_default();
        let class_title = obj
            .get("classTitle")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Archery Class".to_string());
        let class_duration_minutes = obj
            .get("classDurationMinutes")
            .and_then(|v| v.as_i64())
            .filter(|v| *v > 0)
            .unwrap_or(60);
        ScheduleSettings {
            week_starts_on,
            hours,
            class_title,
            class_duration_minutes,
        }
    }

    pub fn academy_name(&self) -> String {
        self.academy
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("Archery Academy")
            .to_string()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "schedule": self.schedule,
            "academy": self.academy,
        })
    }
}

/// What the daemon starts from: settings plus an optional slot list that
/// replaces the demo registry.
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub settings: Settings,
    pub slots: Option<Vec<Value>>,
}

pub fn parse_config(text: &str) -> Result<StartupConfig> {
    let root: Value = serde_json::from_str(text).context("config is not valid JSON")?;
    let Some(root) = root.as_object() else {
        anyhow::bail!("config root must be a JSON object");
    };

    let mut settings = Settings::default();
    if let Some(setup) = root.get("setup") {
        let setup = setup
            .as_object()
            .context("config.setup must be an object")?;
        for (name, patch) in setup {
            let section = SetupSection::parse(name)
                .with_context(|| format!("unknown setup section: {}", name))?;
            let patch = patch
                .as_object()
                .with_context(|| format!("setup.{} must be an object", name))?;
            settings
                .update(section, patch)
                .map_err(|msg| anyhow::anyhow!("setup.{}: {}", name, msg))?;
        }
    }

    let slots = match root.get("slots") {
        None => None,
        Some(v) => Some(
            v.as_array()
                .cloned()
                .context("config.slots must be an array")?,
        ),
    };

    Ok(StartupConfig { settings, slots })
}

pub fn load_config_file(path: &Path) -> Result<StartupConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// `--config <path>` wins over the environment variable.
pub fn config_path<I>(args: I, env_value: Option<String>) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(a) = args.next() {
        if a == "--config" {
            if let Some(p) = args.next() {
                return Some(PathBuf::from(p));
            }
        } else if let Some(p) = a.strip_prefix("--config=") {
            return Some(PathBuf::from(p));
        }
    }
    env_value.filter(|s| !s.trim().is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn defaults_match_demo_display() {
        let s = Settings::default().schedule();
        assert_eq!(s.week_starts_on, Weekday::Mon);
        assert_eq!(s.hours, HourRange::new(8, 19).expect("hours"));
        assert_eq!(s.class_title, "Archery Class");
    }

    #[test]
    fn update_validates_and_canonicalises() {
        let mut settings = Settings::default();
        settings
            .update(SetupSection::Schedule, &patch(json!({"weekStartsOn": "Sunday", "lastHour": 21})))
            .expect("valid patch");
        let s = settings.schedule();
        assert_eq!(s.week_starts_on, Weekday::Sun);
        assert_eq!(s.hours.last(), 21);
        assert_eq!(
            settings.section(SetupSection::Schedule)["weekStartsOn"],
            json!("sunday")
        );
    }

    #[test]
    fn rejected_patch_changes_nothing() {
        let mut settings = Settings::default();
        let before = settings.clone();
        let err = settings
            .update(SetupSection::Schedule, &patch(json!({"lastHour": 22, "firstHour": 23})))
            .expect_err("inverted");
        assert!(err.contains("firstHour"));
        assert_eq!(settings, before);

        assert!(settings
            .update(SetupSection::Schedule, &patch(json!({"colour": "red"})))
            .is_err());
        assert!(settings
            .update(SetupSection::Academy, &patch(json!({"name": "   "})))
            .is_err());
        assert_eq!(settings, before);
    }

    #[test]
    fn config_file_sections_and_slots() {
        let cfg = parse_config(
            r#"{
                "setup": { "academy": { "name": "North Range" }, "schedule": { "firstHour": 7 } },
                "slots": [ { "id": "a", "dayOfWeek": 1, "startTime": "07:00", "endTime": "08:00", "capacity": 2 } ]
            }"#,
        )
        .expect("config");
        assert_eq!(cfg.settings.academy_name(), "North Range");
        assert_eq!(cfg.settings.schedule().hours.first(), 7);
        assert_eq!(cfg.slots.as_ref().map(|s| s.len()), Some(1));

        assert!(parse_config("[]").is_err());
        assert!(parse_config(r#"{"setup": {"nope": {}}}"#).is_err());
        assert!(parse_config(r#"{"slots": {}}"#).is_err());
    }

    #[test]
    fn config_path_prefers_cli_flag() {
        let args = vec!["academyd".to_string(), "--config".to_string(), "a.json".to_string()];
        assert_eq!(
            config_path(args, Some("b.json".into())),
            Some(PathBuf::from("a.json"))
        );
        let args = vec!["academyd".to_string(), "--config=c.json".to_string()];
        assert_eq!(config_path(args, None), Some(PathBuf::from("c.json")));
        assert_eq!(
            config_path(vec!["academyd".to_string()], Some("b.json".into())),
            Some(PathBuf::from("b.json"))
        );
        assert_eq!(config_path(Vec::<String>::new(), Some(" ".into())), None);
    }
}
