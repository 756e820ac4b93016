//! Task resources served by the backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Filter value meaning "do not filter on this field".
const ALL: &str = "all";

/// A checklist entry inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Backend id; absent for items not saved yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Item text.
    pub label: String,
    /// Whether the item is checked.
    #[serde(default)]
    pub done: bool,
    /// Position in the list.
    #[serde(default)]
    pub order: u32,
}

/// A task as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Backend id.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Free text description.
    #[serde(default)]
    pub description: String,
    /// Status, e.g. `pendente` or `concluida`.
    #[serde(default)]
    pub status: String,
    /// Importance, e.g. `baixa`, `media`, `alta`.
    #[serde(default)]
    pub importance: String,
    /// Category name.
    #[serde(default)]
    pub category: String,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Checklist.
    #[serde(default)]
    pub checklist_items: Vec<ChecklistItem>,
    /// Fields not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload for creating or updating a task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Title, trimmed before sending.
    pub title: String,
    /// Description.
    pub description: String,
    /// Importance.
    pub importance: String,
    /// Category.
    pub category: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Recurrence rule.
    pub recurrence: String,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Checklist, renumbered in list order before sending.
    pub checklist_items: Vec<ChecklistItem>,
}

impl TaskDraft {
    /// Creates a draft with the backend's defaults.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            importance: "media".to_string(),
            category: "pessoal".to_string(),
            recurrence: "nenhuma".to_string(),
            ..Self::default()
        }
    }

    /// Returns the draft ready to send: trimmed title, checklist ordered.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut draft = self.clone();
        draft.title = draft.title.trim().to_string();
        for (index, item) in draft.checklist_items.iter_mut().enumerate() {
            item.order = u32::try_from(index).unwrap_or(u32::MAX);
        }
        draft
    }

    /// Returns true if the title is blank.
    #[must_use]
    pub fn is_missing_title(&self) -> bool {
        self.title.trim().is_empty()
    }
}

/// Filters for listing tasks.
///
/// `None` or `"all"` leaves a field unfiltered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskFilter {
    /// Status filter.
    pub status: Option<String>,
    /// Importance filter.
    pub importance: Option<String>,
    /// Category filter.
    pub category: Option<String>,
    /// Earliest due date.
    pub due_from: Option<NaiveDate>,
    /// Latest due date.
    pub due_to: Option<NaiveDate>,
}

impl TaskFilter {
    /// Returns the query parameters for this filter.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let choices = [
            ("status", &self.status),
            ("importance", &self.importance),
            ("category", &self.category),
        ];
        for (key, value) in choices {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty() && *v != ALL) {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
        if let Some(from) = self.due_from {
            pairs.push(("due_from".to_string(), from.to_string()));
        }
        if let Some(to) = self.due_to {
            pairs.push(("due_to".to_string(), to.to_string()));
        }
        pairs
    }
}
