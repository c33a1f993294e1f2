use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "teacher" => Some(Self::Teacher),
            "student" => Some(Self::Student),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }

    pub fn capabilities(self) -> HashSet<Capability> {
        use Capability::*;
        let caps: &[Capability] = match self {
            Self::Admin | Self::Teacher => &[
                ViewDashboard,
                ViewSchedule,
                ManageSchedule,
                ManageStudents,
                ManageSettings,
                EditProfile,
            ],
            Self::Student => &[ViewDashboard, ViewSchedule, ViewOwnClasses, EditProfile],
        };
        caps.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    ViewDashboard,
    ViewSchedule,
    ManageSchedule,
    ManageStudents,
    ManageSettings,
    ViewOwnClasses,
    EditProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// The signed-in user plus the capability set derived from their role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
    capabilities: HashSet<Capability>,
}

impl Session {
    pub fn new(user: User) -> Self {
        let capabilities = user.role.capabilities();
        Self { user, capabilities }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn has(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        let mut v: Vec<Capability> = self.capabilities.iter().copied().collect();
        v.sort_by_key(|c| *c as u8);
        v
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    MissingEmail,
    MissingPassword,
    UnknownAccount(String),
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginError::MissingEmail => write!(f, "email is required"),
            LoginError::MissingPassword => write!(f, "password is required"),
            LoginError::UnknownAccount(email) => write!(f, "no account for {}", email),
        }
    }
}

impl std::error::Error for LoginError {}

/// Known accounts. Passwords are not checked.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    pub fn demo() -> Self {
        let user = |id: &str, email: &str, name: &str, role| User {
            id: id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            role,
        };
        Self::new(vec![
            user("1", "juanjo@archery.com", "Juanjo García", Role::Teacher),
            user("2", "alumno@test.com", "María López", Role::Student),
            user("3", "admin@archery.com", "Administrador", Role::Admin),
        ])
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        let needle = email.trim();
        self.users.iter().find(|u| u.email.eq_ignore_ascii_case(needle))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// First account holding `role`; used by the demo role switcher.
    pub fn find_by_role(&self, role: Role) -> Option<&User> {
        self.users.iter().find(|u| u.role == role)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Session, LoginError> {
        if email.trim().is_empty() {
            return Err(LoginError::MissingEmail);
        }
        if password.is_empty() {
            return Err(LoginError::MissingPassword);
        }
        self.find_by_email(email)
            .cloned()
            .map(Session::new)
            .ok_or_else(|| LoginError::UnknownAccount(email.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Dashboard,
    Schedule,
    Students,
    MyClasses,
    Settings,
    Profile,
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        match path.trim().trim_end_matches('/') {
            "" => Some(Self::Landing),
            "/login" => Some(Self::Login),
            "/dashboard" => Some(Self::Dashboard),
            "/schedule" => Some(Self::Schedule),
            "/students" => Some(Self::Students),
            "/my-classes" => Some(Self::MyClasses),
            "/settings" => Some(Self::Settings),
            "/profile" => Some(Self::Profile),
            _ => None,
        }
    }

    /// `None` for public routes.
    pub fn required_capability(self) -> Option<Capability> {
        match self {
            Self::Landing | Self::Login => None,
            Self::Dashboard => Some(Capability::ViewDashboard),
            Self::Schedule => Some(Capability::ManageSchedule),
            Self::Students => Some(Capability::ManageStudents),
            Self::MyClasses => Some(Capability::ViewOwnClasses),
            Self::Settings => Some(Capability::ManageSettings),
            Self::Profile => Some(Capability::EditProfile),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    RedirectToLogin,
    RedirectToDashboard,
    NotFound,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::RedirectToLogin => "redirectToLogin",
            Self::RedirectToDashboard => "redirectToDashboard",
            Self::NotFound => "notFound",
        }
    }

    pub fn redirect_path(self) -> Option<&'static str> {
        match self {
            Self::RedirectToLogin => Some("/login"),
            Self::RedirectToDashboard => Some("/dashboard"),
            _ => None,
        }
    }
}

pub fn authorize(session: Option<&Session>, path: &str) -> Access {
    let Some(route) = Route::parse(path) else {
        return Access::NotFound;
    };
    let Some(cap) = route.required_capability() else {
        return Access::Granted;
    };
    match session {
        None => Access::RedirectToLogin,
        Some(s) if s.has(cap) => Access::Granted,
        Some(_) => Access::RedirectToDashboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_matches_exact_email_only() {
        let dir = UserDirectory::demo();
        let s = dir.login("  Juanjo@Archery.com ", "x").expect("teacher");
        assert_eq!(s.role(), Role::Teacher);

        // Only exact emails match.
        assert_eq!(
            dir.login("someteacher@x.com", "x"),
            Err(LoginError::UnknownAccount("someteacher@x.com".into()))
        );
        assert_eq!(
            dir.login("superadmin@archery.com", "x"),
            Err(LoginError::UnknownAccount("superadmin@archery.com".into()))
        );
        assert_eq!(dir.login(" ", "x"), Err(LoginError::MissingEmail));
        assert_eq!(dir.login("alumno@test.com", ""), Err(LoginError::MissingPassword));
    }

    #[test]
    fn capability_sets_by_role() {
        let dir = UserDirectory::demo();
        let student = Session::new(dir.find_by_role(Role::Student).expect("student").clone());
        assert!(student.has(Capability::ViewSchedule));
        assert!(student.has(Capability::ViewOwnClasses));
        assert!(!student.has(Capability::ManageSchedule));

        let admin = Session::new(dir.find_by_role(Role::Admin).expect("admin").clone());
        assert!(admin.has(Capability::ManageSettings));
        assert!(!admin.has(Capability::ViewOwnClasses));
        assert_eq!(admin.capabilities()[0], Capability::ViewDashboard);
    }

    #[test]
    fn route_gating() {
        let dir = UserDirectory::demo();
        let teacher = dir.login("juanjo@archery.com", "pw").expect("teacher");
        let student = dir.login("alumno@test.com", "pw").expect("student");

        assert_eq!(authorize(None, "/"), Access::Granted);
        assert_eq!(authorize(None, "/login"), Access::Granted);
        assert_eq!(authorize(None, "/schedule"), Access::RedirectToLogin);
        assert_eq!(authorize(Some(&teacher), "/schedule"), Access::Granted);
        assert_eq!(authorize(Some(&student), "/schedule"), Access::RedirectToDashboard);
        assert_eq!(authorize(Some(&student), "/my-classes"), Access::Granted);
        assert_eq!(authorize(Some(&teacher), "/my-classes"), Access::RedirectToDashboard);
        assert_eq!(authorize(Some(&student), "/profile/"), Access::Granted);
        assert_eq!(authorize(Some(&teacher), "/nowhere"), Access::NotFound);
        assert_eq!(Access::RedirectToLogin.redirect_path(), Some("/login"));
    }

    #[test]
    fn role_names_round_trip() {
        for r in [Role::Admin, Role::Teacher, Role::Student] {
            assert_eq!(Role::parse(r.as_str()), Some(r));
        }
        assert_eq!(Role::parse("Teacher"), Some(Role::Teacher));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn users_resolve_by_id() {
        let dir = UserDirectory::demo();
        assert_eq!(dir.find_by_id("1").map(|u| u.name.as_str()), Some("Juanjo García"));
        assert!(dir.find_by_id("99").is_none());
    }
}
