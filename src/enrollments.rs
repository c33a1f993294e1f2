use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Confirmed,
    Pending,
    Waitlist,
    Cancelled,
}

/// A user's standing booking in a recurring slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub id: String,
    pub user_id: String,
    pub slot_id: String,
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct Enrollments {
    items: Vec<Enrollment>,
}

impl Enrollments {
    pub fn new(items: Vec<Enrollment>) -> Self {
        Self { items }
    }

    /// The demo student's bookings.
    pub fn demo() -> Self {
        let e = |id: &str, slot_id: &str, status| Enrollment {
            id: id.to_string(),
            user_id: "2".to_string(),
            slot_id: slot_id.to_string(),
            status,
        };
        Self::new(vec![
            e("e1", "ts2", EnrollmentStatus::Confirmed),
            e("e2", "ts4", EnrollmentStatus::Confirmed),
            e("e3", "ts5", EnrollmentStatus::Pending),
            e("e4", "ts6", EnrollmentStatus::Waitlist),
            e("e5", "ts1", EnrollmentStatus::Cancelled),
        ])
    }

    /// `user_id`'s booking in `slot_id`, ignoring cancelled ones.
    pub fn active_booking(&self, user_id: &str, slot_id: &str) -> Option<&Enrollment> {
        self.items
            .iter()
            .find(|e| {
                e.user_id == user_id
                    && e.slot_id == slot_id
                    && e.status != EnrollmentStatus::Cancelled
            })
    }
}
