use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Reminder,
    Confirmation,
    Reschedule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

/// In-memory inbox for every user.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    items: Vec<Notification>,
}

impl Inbox {
    pub fn new(items: Vec<Notification>) -> Self {
        Self { items }
    }

    pub fn demo(now: NaiveDateTime) -> Self {
        let n = |id: &str, kind, title: &str, message: &str, is_read, days_ago| Notification {
            id: id.to_string(),
            user_id: "1".to_string(),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            is_read,
            created_at: now - Duration::days(days_ago),
        };
        Self::new(vec![
            n(
                "n1",
                NotificationKind::Reminder,
                "Class reminder",
                "You have a class tomorrow at 10:00",
                false,
                0,
            ),
            n(
                "n2",
                NotificationKind::Reschedule,
                "Reschedule request",
                "María López asked to move her Monday class to Tuesday",
                false,
                1,
            ),
            n(
                "n3",
                NotificationKind::Confirmation,
                "New enrollment",
                "Carlos Ruiz enrolled in the Wednesday 18:00 class",
                true,
                2,
            ),
        ])
    }

    /// Newest first.
    pub fn for_user(&self, user_id: &str) -> Vec<&Notification> {
        let mut out: Vec<&Notification> = self.items.iter().filter(|n| n.user_id == user_id).collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub fn unread_count(&self, user_id: &str) -> usize {
        self.items
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count()
    }

    /// Marks one of `user_id`'s notifications as read. Returns `false` when no
    /// such notification belongs to the user.
    pub fn mark_read(&mut self, user_id: &str, id: &str) -> bool {
        match self
            .items
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 16)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("datetime")
    }

    #[test]
    fn inbox_lists_newest_first_per_user() {
        let inbox = Inbox::demo(now());
        let ids: Vec<&str> = inbox.for_user("1").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2", "n3"]);
        assert!(inbox.for_user("2").is_empty());
        assert_eq!(inbox.unread_count("1"), 2);
    }

    #[test]
    fn mark_read_is_scoped_to_owner() {
        let mut inbox = Inbox::demo(now());
        assert!(!inbox.mark_read("2", "n1"));
        assert_eq!(inbox.unread_count("1"), 2);
        assert!(inbox.mark_read("1", "n1"));
        assert!(inbox.mark_read("1", "n1"));
        assert_eq!(inbox.unread_count("1"), 1);
        assert!(!inbox.mark_read("1", "missing"));
    }
}
