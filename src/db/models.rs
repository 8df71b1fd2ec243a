use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Progress of a project or task.
///
/// Stored and reported by its display string ("Not Started", "In Progress",
/// "Completed").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::NotStarted, Status::InProgress, Status::Completed];

    pub const fn as_str(self) -> &'static str {
        match self {
            Status::NotStarted => "Not Started",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TrackerError::InvalidStatus(s.to_string()))
    }
}

impl TryFrom<String> for Status {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub status: Status,
    pub client_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: Status,
    pub project_id: i64,
}

/// Fields to overwrite on a project. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub client_id: Option<i64>,
}

/// Fields to overwrite on a task. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub project_id: Option<i64>,
}

#[cfg(test)]
pub mod test_helpers {
    use crate::db::{create_pool, run_migrations};
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    pub struct TestContext {
        pub pool: SqlitePool,
        pub _temp_dir: TempDir,
    }

    impl TestContext {
        pub async fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let db_path = temp_dir.path().join("tracker.db");

            let pool = create_pool(&db_path).await.unwrap();
            run_migrations(&pool).await.unwrap();

            Self {
                pool,
                _temp_dir: temp_dir,
            }
        }

        pub fn pool(&self) -> &SqlitePool {
            &self.pool
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_strings() {
        assert_eq!(Status::NotStarted.to_string(), "Not Started");
        assert_eq!(Status::InProgress.to_string(), "In Progress");
        assert_eq!(Status::Completed.to_string(), "Completed");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("In Progress".parse::<Status>().unwrap(), Status::InProgress);
        assert!("in progress".parse::<Status>().is_err());
        assert!("Paused".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_default_is_not_started() {
        assert_eq!(Status::default(), Status::NotStarted);
    }

    #[test]
    fn test_task_serialization_skips_missing_description() {
        let task = Task {
            id: 1,
            name: "Wireframes".to_string(),
            description: None,
            status: Status::Completed,
            project_id: 4,
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "Completed");
        assert!(json.get("description").is_none());
    }
}
