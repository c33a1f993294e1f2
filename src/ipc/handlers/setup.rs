use crate::config::SetupSection;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, state.settings.to_json())
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    if let Err(msg) = state.settings.update(section, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if section == SetupSection::Schedule {
        let week_starts_on = state.settings.schedule().week_starts_on;
        if state.cursor.week_starts_on() != week_starts_on {
            log::info!("weeks now start on {}", week_starts_on);
            state.cursor.set_week_starts_on(week_starts_on);
        }
    }
    log::info!("{} updated", section.key());
    ok(
        &req.id,
        json!({ "section": section_raw, "value": state.settings.section(section) }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
