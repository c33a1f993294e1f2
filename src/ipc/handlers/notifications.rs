use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use chrono::NaiveDateTime;
use serde_json::{json, Value};

fn current_user_id(state: &AppState) -> Result<String, HandlerErr> {
    state
        .session
        .as_ref()
        .map(|s| s.user().id.clone())
        .ok_or_else(|| HandlerErr::new("unauthenticated", "sign in first"))
}

fn format_timestamp(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn handle_list(state: &AppState) -> Result<Value, HandlerErr> {
    let user_id = current_user_id(state)?;
    let items: Vec<Value> = state
        .inbox
        .for_user(&user_id)
        .into_iter()
        .map(|n| {
            json!({
                "id": n.id,
                "type": n.kind,
                "title": n.title,
                "message": n.message,
                "isRead": n.is_read,
                "createdAt": format_timestamp(n.created_at),
            })
        })
        .collect();
    Ok(json!({
        "notifications": items,
        "unreadCount": state.inbox.unread_count(&user_id),
    }))
}

fn handle_mark_read(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let user_id = current_user_id(state)?;
    let id = required_str(req, "notificationId")?;
    if !state.inbox.mark_read(&user_id, &id) {
        return Err(HandlerErr::new("not_found", "notification not found")
            .with_details(json!({ "notificationId": id })));
    }
    Ok(json!({ "unreadCount": state.inbox.unread_count(&user_id) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "notifications.list" => handle_list(state),
        "notifications.markRead" => handle_mark_read(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
