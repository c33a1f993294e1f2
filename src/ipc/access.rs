use crate::ipc::error::HandlerErr;
use crate::session::{Capability, Session};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodAccess {
    Public,
    /// Any session, whatever its role.
    SignedIn,
    Requires(Capability),
}

/// Single source of truth for who may call what. Unlisted methods are unknown.
pub fn method_access(method: &str) -> Option<MethodAccess> {
    use Capability::*;
    use MethodAccess::*;
    let access = match method {
        "health" | "session.login" | "session.logout" | "session.current" | "route.authorize" => {
            Public
        }
        "session.switchRole" => SignedIn,
        "schedule.week" | "schedule.navigate" | "schedule.grid" | "schedule.events"
        | "schedule.slotClick" | "slots.list" => Requires(ViewSchedule),
        "slots.create" | "slots.delete" | "slots.setActive" | "slots.load" => {
            Requires(ManageSchedule)
        }
        "students.list" => Requires(ManageStudents),
        "notifications.list" | "notifications.markRead" | "setup.get" | "schedule.upcoming" => {
            Requires(ViewDashboard)
        }
        "classes.mine" => Requires(ViewOwnClasses),
        "setup.update" => Requires(ManageSettings),
        _ => return None,
    };
    Some(access)
}

pub fn check(session: Option<&Session>, access: MethodAccess) -> Result<(), HandlerErr> {
    let cap = match access {
        MethodAccess::Public => return Ok(()),
        MethodAccess::SignedIn => {
            return match session {
                Some(_) => Ok(()),
                None => Err(HandlerErr::new("unauthenticated", "log in first")),
            }
        }
        MethodAccess::Requires(cap) => cap,
    };
    match session {
        None => Err(HandlerErr::new("unauthenticated", "log in first")),
        Some(s) if s.has(cap) => Ok(()),
        Some(s) => Err(HandlerErr::new(
            "forbidden",
            format!("role {} may not do this", s.role().as_str()),
        )
        .with_details(json!({ "required": cap }))),
    }
}
