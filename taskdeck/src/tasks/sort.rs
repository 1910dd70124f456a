//! Sort presentation layer.
//!
//! [`derive`] is a pure function from the cached list to a display order; it
//! never mutates its input. The sort is stable, so tasks that compare equal
//! keep their cache order in both directions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use taskdeck_proto::task::{Priority, Task};

/// Field to order tasks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// High, medium, low, then unset.
    Priority,
    /// Earliest first; undated tasks last.
    DueDate,
    /// Pending before completed.
    TodoStatus,
    /// Case-insensitive title order.
    Title,
}

impl SortKey {
    /// Wire-style name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::DueDate => "dueDate",
            Self::TodoStatus => "todoStatus",
            Self::Title => "title",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" => Ok(Self::Priority),
            "due-date" | "due_date" | "duedate" | "due" => Ok(Self::DueDate),
            "status" | "todo-status" | "todo_status" | "todostatus" => Ok(Self::TodoStatus),
            "title" => Ok(Self::Title),
            other => Err(format!(
                "unknown sort key '{other}' (expected priority, due-date, status or title)"
            )),
        }
    }
}

/// Ascending keeps the comparator result, descending negates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// The other direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction '{other}' (expected asc or desc)")),
        }
    }
}

/// Current sort selection of a list view.
///
/// Starts at status ascending, so open tasks come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    key: SortKey,
    direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::TodoStatus,
            direction: SortDirection::Asc,
        }
    }
}

impl SortState {
    /// A state with an explicit key and direction.
    #[must_use]
    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Selected key.
    #[must_use]
    pub const fn key(&self) -> SortKey {
        self.key
    }

    /// Selected direction.
    #[must_use]
    pub const fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Handles a click on a sort control.
    ///
    /// Re-selecting the current key flips the direction; a new key starts
    /// descending.
    pub fn select(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.toggled();
        } else {
            self.key = key;
            self.direction = SortDirection::Desc;
        }
    }

    /// Applies this selection to `tasks`.
    #[must_use]
    pub fn derive(&self, tasks: &[Task]) -> Vec<Task> {
        derive(tasks, self.key, self.direction)
    }
}

/// Returns `tasks` ordered by `key` in `direction`, leaving the input alone.
#[must_use]
pub fn derive(tasks: &[Task], key: SortKey, direction: SortDirection) -> Vec<Task> {
    let mut ordered = tasks.to_vec();
    ordered.sort_by(|a, b| direction.apply(compare(a, b, key)));
    ordered
}

/// Ascending comparison of two tasks on a single key.
#[must_use]
pub fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::Priority => priority_rank(a.priority).cmp(&priority_rank(b.priority)),
        SortKey::DueDate => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::TodoStatus => a.todo_status.rank().cmp(&b.todo_status.rank()),
        SortKey::Title => compare_titles(&a.title, &b.title),
    }
}

/// Unset priority ranks below low.
fn priority_rank(priority: Option<Priority>) -> u8 {
    priority.map_or(0, Priority::rank)
}

/// Case-insensitive comparison; on a case-only tie lowercase sorts first.
fn compare_titles(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded.then_with(|| {
        a.chars()
            .zip(b.chars())
            .map(|(x, y)| match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => x.cmp(&y),
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

/// Returns `(completed, total)` for an "N of M tasks completed" header.
#[must_use]
pub fn completion_summary(tasks: &[Task]) -> (usize, usize) {
    let completed = tasks.iter().filter(|task| task.is_completed()).count();
    (completed, tasks.len())
}
