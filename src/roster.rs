use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub level: Level,
    pub joined: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Self {
        Self { students }
    }

    pub fn demo() -> Self {
        let rows = [
            ("s1", "María López", "maria@email.com", "+34 612 345 678", Level::Intermediate, (2024, 1, 15)),
            ("s2", "Carlos Ruiz", "carlos@email.com", "+34 623 456 789", Level::Beginner, (2024, 2, 20)),
            ("s3", "Ana Martínez", "ana@email.com", "+34 634 567 890", Level::Advanced, (2023, 11, 10)),
            ("s4", "Pedro Sánchez", "pedro@email.com", "+34 645 678 901", Level::Beginner, (2024, 3, 5)),
            ("s5", "Lucía García", "lucia@email.com", "+34 656 789 012", Level::Intermediate, (2024, 1, 28)),
        ];
        let students = rows
            .iter()
            .filter_map(|(id, name, email, phone, level, (y, m, d))| {
                Some(Student {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: Some(phone.to_string()),
                    level: *level,
                    joined: NaiveDate::from_ymd_opt(*y, *m, *d)?,
                })
            })
            .collect();
        Self::new(students)
    }

    pub fn all(&self) -> &[Student] {
        &self.students
    }

    /// Case-insensitive substring match on name or email, optionally narrowed
    /// to one level. An empty query matches everyone.
    pub fn filter(&self, query: &str, level: Option<Level>) -> Vec<&Student> {
        let q = query.trim().to_lowercase();
        self.students
            .iter()
            .filter(|s| {
                q.is_empty()
                    || s.name.to_lowercase().contains(&q)
                    || s.email.to_lowercase().contains(&q)
            })
            .filter(|s| level.map_or(true, |l| s.level == l))
            .collect()
    }

    pub fn level_counts(&self) -> Vec<(Level, usize)> {
        Level::ALL
            .iter()
            .map(|l| (*l, self.students.iter().filter(|s| s.level == *l).count()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_case_insensitive_over_name_and_email() {
        let roster = Roster::demo();
        let hits: Vec<&str> = roster.filter("LÓPEZ", None).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(hits, vec!["s1"]);
        let hits: Vec<&str> = roster.filter("pedro@", None).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(hits, vec!["s4"]);
        assert_eq!(roster.filter("", None).len(), 5);
        assert!(roster.filter("nobody", None).is_empty());
    }

    #[test]
    fn level_filter_combines_with_query() {
        let roster = Roster::demo();
        let beginners = roster.filter("", Some(Level::Beginner));
        assert_eq!(beginners.len(), 2);
        let hits = roster.filter("carlos", Some(Level::Advanced));
        assert!(hits.is_empty());
    }

    #[test]
    fn counts_cover_every_level() {
        let counts = Roster::demo().level_counts();
        assert_eq!(
            counts,
            vec![(Level::Beginner, 2), (Level::Intermediate, 2), (Level::Advanced, 1)]
        );
        assert_eq!(Level::parse("Advanced"), Some(Level::Advanced));
        assert_eq!(Level::parse("all"), None);
    }
}
