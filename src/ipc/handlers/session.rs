use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::session::{authorize, Role, Session};
use serde_json::{json, Value};

fn session_json(session: Option<&Session>) -> Value {
    match session {
        Some(s) => json!({
            "user": s.user(),
            "capabilities": s.capabilities(),
        }),
        None => Value::Null,
    }
}

fn handle_login(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let email = req
        .params
        .get("email")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let session = state.directory.login(email, password)?;
    log::info!(
        "{} signed in as {}",
        session.user().email,
        session.role().as_str()
    );
    let out = json!({ "session": session_json(Some(&session)) });
    state.session = Some(session);
    Ok(out)
}

fn handle_logout(state: &mut AppState) -> Result<Value, HandlerErr> {
    let was = state.session.take();
    if let Some(s) = &was {
        log::info!("{} signed out", s.user().email);
    }
    Ok(json!({ "signedOut": was.is_some() }))
}

fn handle_current(state: &AppState) -> Result<Value, HandlerErr> {
    Ok(json!({ "session": session_json(state.session.as_ref()) }))
}

fn handle_switch_role(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let raw = required_str(req, "role")?;
    let role = Role::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params("role must be one of: admin, teacher, student"))?;
    let user = state
        .directory
        .find_by_role(role)
        .cloned()
        .ok_or_else(|| HandlerErr::new("not_found", format!("no {} account", role.as_str())))?;
    let session = Session::new(user);
    let out = json!({ "session": session_json(Some(&session)) });
    state.session = Some(session);
    Ok(out)
}

fn handle_route_authorize(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let path = required_str(req, "path")?;
    let access = authorize(state.session.as_ref(), &path);
    Ok(json!({
        "path": path,
        "access": access.as_str(),
        "redirect": access.redirect_path(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "session.login" => handle_login(state, req),
        "session.logout" => handle_logout(state),
        "session.current" => handle_current(state),
        "session.switchRole" => handle_switch_role(state, req),
        "route.authorize" => handle_route_authorize(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
