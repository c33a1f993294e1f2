use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{format_date, optional_str};
use crate::ipc::types::{AppState, Request};
use crate::roster::{Level, Student};
use serde_json::{json, Value};

fn student_json(s: &Student) -> Value {
    json!({
        "id": s.id,
        "name": s.name,
        "email": s.email,
        "phone": s.phone,
        "level": s.level,
        "joined": format_date(s.joined),
    })
}

fn handle_students_list(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let query = optional_str(req, "query").unwrap_or_default();
    let level = match optional_str(req, "level").as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(Level::parse(raw).ok_or_else(|| {
            HandlerErr::bad_params("level must be one of: all, beginner, intermediate, advanced")
        })?),
    };

    let students: Vec<Value> = state
        .roster
        .filter(&query, level)
        .into_iter()
        .map(student_json)
        .collect();
    let mut counts = serde_json::Map::new();
    for (l, n) in state.roster.level_counts() {
        counts.insert(l.as_str().to_string(), json!(n));
    }
    Ok(json!({
        "students": students,
        "total": state.roster.all().len(),
        "levelCounts": counts,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "students.list" => Some(respond(&req.id, handle_students_list(state, req))),
        _ => None,
    }
}
