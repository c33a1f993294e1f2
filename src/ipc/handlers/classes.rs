use crate::grid::upcoming_sessions;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::schedule::{sampler_for, session_json};
use crate::ipc::helpers::optional_u32_in;
use crate::ipc::types::{AppState, Request};
use chrono::Local;
use serde_json::{json, Value};

/// The signed-in user's next booked sessions, each with its booking status.
fn handle_mine(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let user_id = state
        .session
        .as_ref()
        .map(|s| s.user().id.clone())
        .ok_or_else(|| HandlerErr::new("unauthenticated", "sign in first"))?;
    let limit = optional_u32_in(req, "limit", 10, 1, 50)?;
    let days = optional_u32_in(req, "days", 14, 1, 60)?;
    let mut sampler = sampler_for(req)?;

    let booked = state
        .registry
        .as_slice()
        .iter()
        .filter(|s| state.enrollments.active_booking(&user_id, s.id()).is_some());
    let now = Local::now().naive_local();
    let classes: Vec<Value> = upcoming_sessions(booked, now, days, limit as usize, &mut sampler)
        .iter()
        .filter_map(|c| {
            let booking = state.enrollments.active_booking(&user_id, c.slot().id())?;
            let mut row = session_json(state, c);
            row["enrollmentId"] = json!(booking.id);
            row["status"] = json!(booking.status);
            Some(row)
        })
        .collect();
    Ok(json!({ "count": classes.len(), "classes": classes }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "classes.mine" => Some(respond(&req.id, handle_mine(state, req))),
        _ => None,
    }
}
