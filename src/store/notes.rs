//! Canned note operations built on [`QueryExecutor`].

use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};

use super::QueryExecutor;
use crate::envelope::Envelope;

/// A row of the `notes` table as returned by the list and search operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Store-assigned identifier
    pub id: i64,
    /// Note title
    pub title: String,
    /// Note body
    pub content: Option<String>,
    /// Insert timestamp (`YYYY-MM-DD HH:MM:SS`, UTC)
    pub created_at: String,
    /// Set on insert; not refreshed by later edits
    pub updated_at: String,
}

/// Note operations over a borrowed executor.
pub struct NoteStore<'a> {
    executor: &'a QueryExecutor,
}

impl<'a> NoteStore<'a> {
    /// Wrap an executor.
    pub fn new(executor: &'a QueryExecutor) -> Self {
        Self { executor }
    }

    /// Insert a note. Returns the mutation envelope (`affected_rows`, `last_row_id`).
    pub fn create(&self, title: &str, content: Option<&str>) -> Envelope {
        let content = content.map_or(SqlValue::Null, |c| SqlValue::Text(c.to_string()));
        self.executor.execute(
            "INSERT INTO notes (title, content) VALUES (?, ?)",
            &[SqlValue::Text(title.to_string()), content],
        )
    }

    /// Most recent notes first, at most `limit` of them.
    pub fn list_recent(&self, limit: i64) -> Envelope {
        self.executor.execute(
            "SELECT * FROM notes ORDER BY created_at DESC, id DESC LIMIT ?",
            &[SqlValue::Integer(limit)],
        )
    }

    /// Notes whose title or content contains `term`.
    ///
    /// `term` matches literally; SQLite's `LIKE` makes the match ASCII
    /// case-insensitive.
    pub fn search(&self, term: &str) -> Envelope {
        let pattern = SqlValue::Text(format!("%{}%", escape_like(term)));
        self.executor.execute(
            "SELECT * FROM notes \
             WHERE title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\' \
             ORDER BY created_at DESC, id DESC",
            &[pattern.clone(), pattern],
        )
    }
}

/// Escape `LIKE` metacharacters so `term` matches as a plain substring.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    fn notes_of(env: &Envelope) -> Vec<Note> {
        assert!(env.is_success(), "unexpected failure: {:?}", env.error());
        serde_json::from_value(env.get("data").cloned().unwrap()).unwrap()
    }

    fn test_store() -> (tempfile::TempDir, QueryExecutor) {
        let dir = tempfile::tempdir().unwrap();
        let executor = QueryExecutor::open(&Config::new(dir.path().join("notes.db"))).unwrap();
        (dir, executor)
    }

    #[test]
    fn test_create_then_list_recent() {
        let (_dir, executor) = test_store();
        let store = NoteStore::new(&executor);

        store.create("first", Some("one"));
        let env = store.create("second", Some("two"));
        assert_eq!(env.get("affected_rows"), Some(&json!(1)));
        let id = env.get("last_row_id").and_then(|v| v.as_i64()).unwrap();

        let notes = notes_of(&store.list_recent(1));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, id);
        assert_eq!(notes[0].title, "second");
        assert_eq!(notes[0].content.as_deref(), Some("two"));
        assert!(!notes[0].created_at.is_empty());
        assert_eq!(notes[0].created_at, notes[0].updated_at);
    }

    #[test]
    fn test_create_without_content() {
        let (_dir, executor) = test_store();
        let store = NoteStore::new(&executor);
        store.create("title only", None);
        let notes = notes_of(&store.list_recent(10));
        assert_eq!(notes[0].content, None);
    }

    #[test]
    fn test_search_matches_title_or_content() {
        let (_dir, executor) = test_store();
        let store = NoteStore::new(&executor);
        store.create("Groceries", Some("milk and eggs"));
        store.create("Standup", Some("discuss the release"));
        store.create("Ideas", Some("grow a garden"));

        let titles: Vec<String> = notes_of(&store.search("gro"))
            .into_iter()
            .map(|n| n.title)
            .collect();
        // ASCII case-insensitive: "Groceries" and "grow" both match.
        assert_eq!(titles, vec!["Ideas".to_string(), "Groceries".to_string()]);

        assert!(notes_of(&store.search("release"))
            .iter()
            .all(|n| n.title == "Standup"));
        assert!(notes_of(&store.search("nothing like this")).is_empty());
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let (_dir, executor) = test_store();
        let store = NoteStore::new(&executor);
        store.create("100% done", None);
        store.create("1000 done", None);
        store.create("a_b", None);
        store.create("axb", None);

        let hits = notes_of(&store.search("0%"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% done");

        let hits = notes_of(&store.search("a_b"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "a_b");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like(r"50%_a\b"), r"50\%\_a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
