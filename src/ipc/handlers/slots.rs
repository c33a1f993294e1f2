use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{required_bool, required_str};
use crate::ipc::types::{AppState, Request};
use crate::session::Role;
use crate::slots::{parse_time, RecurringSlot, SlotRecord, SlotRegistry, TIME_FORMAT};
use chrono::Duration;
use serde_json::{json, Value};

fn slot_json(slot: &RecurringSlot) -> Value {
    json!(SlotRecord::from(slot))
}

fn handle_list(state: &AppState) -> Result<Value, HandlerErr> {
    Ok(json!({ "slots": state.registry.records() }))
}

fn handle_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let Some(obj) = req.params.as_object() else {
        return Err(HandlerErr::bad_params("params must be an object"));
    };
    let mut obj = obj.clone();

    // A missing end time means one standard class length.
    if obj.get("endTime").and_then(|v| v.as_str()).is_none() {
        let start = required_str(req, "startTime")?;
        let start = parse_time(&start)?;
        let minutes = state.settings.schedule().class_duration_minutes;
        let end = start + Duration::minutes(minutes);
        if end <= start {
            return Err(HandlerErr::bad_params("class would run past midnight"));
        }
        obj.insert("endTime".into(), json!(end.format(TIME_FORMAT).to_string()));
    }
    if !obj.contains_key("teacherId") {
        if let Some(session) = state.session.as_ref().filter(|s| s.role() == Role::Teacher) {
            obj.insert("teacherId".into(), json!(session.user().id));
        }
    }

    let record: SlotRecord = serde_json::from_value(Value::Object(obj))
        .map_err(|e| HandlerErr::bad_params(format!("invalid slot: {}", e)))?;
    let slot = RecurringSlot::try_from(record)?;
    let created = state.registry.insert(slot)?;
    log::info!(
        "slot {} created for {} {}",
        created.id(),
        created.day(),
        created.start().format(TIME_FORMAT)
    );
    if !state.settings.schedule().hours.contains(created.start_hour()) {
        log::warn!(
            "slot {} starts outside the visible hours and will not show in the grid",
            created.id()
        );
    }
    Ok(json!({ "slot": slot_json(created) }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let slot_id = required_str(req, "slotId")?;
    let removed = state.registry.remove(&slot_id)?;
    log::info!("slot {} deleted", removed.id());
    Ok(json!({ "deleted": removed.id() }))
}

fn handle_set_active(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let slot_id = required_str(req, "slotId")?;
    let active = required_bool(req, "isActive")?;
    let slot = state.registry.set_active(&slot_id, active)?;
    log::info!(
        "slot {} is now {}",
        slot.id(),
        if slot.is_active() { "active" } else { "inactive" }
    );
    Ok(json!({ "slot": slot_json(slot) }))
}

/// Replaces the whole registry. Entries that fail validation are reported
/// and skipped; the rest still load.
fn handle_load(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let values = req
        .params
        .get("slots")
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::bad_params("slots must be an array"))?;
    let (registry, rejected) = SlotRegistry::load_values(values);
    let rejected_json: Vec<Value> = rejected
        .iter()
        .map(|r| {
            json!({
                "index": r.index,
                "id": r.id,
                "code": r.error.code(),
                "message": r.error.to_string(),
            })
        })
        .collect();
    log::info!(
        "loaded {} slot(s), rejected {}",
        registry.len(),
        rejected.len()
    );
    let loaded = registry.len();
    state.registry = registry;
    Ok(json!({ "loaded": loaded, "rejected": rejected_json }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "slots.list" => handle_list(state),
        "slots.create" => handle_create(state, req),
        "slots.delete" => handle_delete(state, req),
        "slots.setActive" => handle_set_active(state, req),
        "slots.load" => handle_load(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
