use crate::ipc::error::HandlerErr;
use crate::ipc::types::Request;
use crate::slots::DATE_FORMAT;
use chrono::NaiveDate;

pub fn required_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn required_bool(req: &Request, key: &str) -> Result<bool, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be boolean", key)))
}

pub fn parse_date(raw: &str, key: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key)))
}

pub fn optional_date(req: &Request, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    optional_str(req, key).map(|s| parse_date(&s, key)).transpose()
}

pub fn optional_seed(req: &Request) -> Result<Option<u64>, HandlerErr> {
    match req.params.get("seed") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params("seed must be a non-negative integer")),
    }
}

/// Integer param within `min..=max`, or `default` when absent.
pub fn optional_u32_in(
    req: &Request,
    key: &str,
    default: u32,
    min: u32,
    max: u32,
) -> Result<u32, HandlerErr> {
    let Some(v) = req.params.get(key).filter(|v| !v.is_null()) else {
        return Ok(default);
    };
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| (min..=max).contains(n))
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be in {}..={}", key, min, max)))
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}
