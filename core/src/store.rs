//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database. Pipeline stages call
//! store methods — they never execute SQL directly.

use crate::error::PipelineResult;
use crate::event::EventLogEntry;
use crate::model::{ExperimentResult, Lead, Message, VariantLabel};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS run (
    run_id     TEXT PRIMARY KEY,
    seed       INTEGER NOT NULL,
    version    TEXT NOT NULL,
    started_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS lead (
    run_id          TEXT NOT NULL,
    name            TEXT NOT NULL,
    title           TEXT NOT NULL,
    company         TEXT NOT NULL,
    linkedin_url    TEXT,
    email           TEXT,
    triggers        TEXT NOT NULL,
    persona_profile TEXT NOT NULL,
    PRIMARY KEY (run_id, name)
);

CREATE TABLE IF NOT EXISTS message (
    run_id       TEXT NOT NULL,
    lead_id      TEXT NOT NULL,
    variant      TEXT NOT NULL,
    subject_line TEXT NOT NULL,
    content      TEXT NOT NULL,
    reasoning    TEXT NOT NULL,
    PRIMARY KEY (run_id, lead_id)
);

CREATE TABLE IF NOT EXISTS result (
    run_id         TEXT NOT NULL,
    lead_id        TEXT NOT NULL,
    variant        TEXT NOT NULL,
    sent           INTEGER NOT NULL,
    opened         INTEGER NOT NULL,
    replied        INTEGER NOT NULL,
    meeting_booked INTEGER NOT NULL,
    PRIMARY KEY (run_id, lead_id)
);

CREATE TABLE IF NOT EXISTS event_log (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id     TEXT NOT NULL,
    seq        INTEGER NOT NULL,
    stage      TEXT NOT NULL,
    event_type TEXT NOT NULL,
    payload    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_event_log_run ON event_log (run_id, seq);
";

impl ToSql for VariantLabel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for VariantLabel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| VariantLabel::parse(s).ok_or(FromSqlError::InvalidType))
    }
}

pub struct ExperimentStore {
    conn: Connection,
}

impl ExperimentStore {
    pub fn open(path: &str) -> PipelineResult<Self> {
        let conn = Connection::open(path)?;
        // WAL only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PipelineResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    /// Apply the schema. Idempotent.
    pub fn migrate(&self) -> PipelineResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, seq, stage, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                entry.seq as i64,
                entry.stage,
                entry.event_type,
                entry.payload
            ],
        )?;
        Ok(())
    }

    pub fn events_for_run(&self, run_id: &str) -> PipelineResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, stage, event_type, payload
             FROM event_log WHERE run_id = ?1 ORDER BY seq",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    seq: row.get::<_, i64>(2)? as u64,
                    stage: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Leads ──────────────────────────────────────────────────

    pub fn insert_lead(&self, run_id: &str, lead: &Lead) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO lead (run_id, name, title, company, linkedin_url, email,
                               triggers, persona_profile)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                lead.name,
                lead.title,
                lead.company,
                lead.linkedin_url,
                lead.email,
                serde_json::to_string(&lead.triggers)?,
                serde_json::to_string(&lead.persona_profile)?,
            ],
        )?;
        Ok(())
    }

    pub fn lead_count(&self, run_id: &str) -> PipelineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM lead WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Messages ───────────────────────────────────────────────

    pub fn insert_message(&self, run_id: &str, message: &Message) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO message (run_id, lead_id, variant, subject_line, content, reasoning)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                message.lead_id,
                message.variant_type,
                message.subject_line,
                message.content,
                message.reasoning
            ],
        )?;
        Ok(())
    }

    pub fn messages_for_run(&self, run_id: &str) -> PipelineResult<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT lead_id, variant, subject_line, content, reasoning
             FROM message WHERE run_id = ?1 ORDER BY lead_id",
        )?;
        let messages = stmt
            .query_map(params![run_id], |row| {
                Ok(Message {
                    lead_id: row.get(0)?,
                    variant_type: row.get(1)?,
                    subject_line: row.get(2)?,
                    content: row.get(3)?,
                    reasoning: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    // ── Results ────────────────────────────────────────────────

    pub fn insert_result(&self, run_id: &str, result: &ExperimentResult) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO result (run_id, lead_id, variant, sent, opened, replied, meeting_booked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                result.lead_id,
                result.variant_chosen,
                result.sent,
                result.opened,
                result.replied,
                result.meeting_booked
            ],
        )?;
        Ok(())
    }

    pub fn results_for_run(&self, run_id: &str) -> PipelineResult<Vec<ExperimentResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT lead_id, variant, sent, opened, replied, meeting_booked
             FROM result WHERE run_id = ?1 ORDER BY lead_id",
        )?;
        let results = stmt
            .query_map(params![run_id], |row| {
                Ok(ExperimentResult {
                    lead_id: row.get(0)?,
                    variant_chosen: row.get(1)?,
                    sent: row.get(2)?,
                    opened: row.get(3)?,
                    replied: row.get(4)?,
                    meeting_booked: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }

    pub fn result_count(&self, run_id: &str) -> PipelineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM result WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ExperimentStore {
        let store = ExperimentStore::in_memory().unwrap();
        store.migrate().unwrap();
        store.insert_run("test-run", 42, "0.1.0-test").unwrap();
        store
    }

    #[test]
    fn lead_round_trips_through_json_columns() {
        let store = store();
        let mut lead = Lead::new("Alice Chen", "VP Sales", "TechFlow");
        lead.triggers = vec!["raised Series B".to_string()];
        lead.persona_profile
            .insert("goals".to_string(), vec!["Increase pipeline".to_string()]);

        store.insert_lead("test-run", &lead).unwrap();
        assert_eq!(store.lead_count("test-run").unwrap(), 1);
    }

    #[test]
    fn results_and_messages_round_trip() {
        let store = store();
        let message = Message {
            content: "Hi".to_string(),
            subject_line: "Idea".to_string(),
            variant_type: VariantLabel::B,
            reasoning: "template".to_string(),
            lead_id: "Alice Chen".to_string(),
        };
        store.insert_message("test-run", &message).unwrap();

        let result = ExperimentResult {
            lead_id: "Alice Chen".to_string(),
            variant_chosen: VariantLabel::B,
            sent: true,
            opened: true,
            replied: false,
            meeting_booked: false,
        };
        store.insert_result("test-run", &result).unwrap();

        let messages = store.messages_for_run("test-run").unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].variant_type, VariantLabel::B);

        let results = store.results_for_run("test-run").unwrap();
        assert_eq!(results, vec![result]);
    }

    #[test]
    fn event_log_preserves_sequence_order() {
        let store = store();
        for seq in [3u64, 1, 2] {
            store
                .append_event(&EventLogEntry {
                    id: None,
                    run_id: "test-run".to_string(),
                    seq,
                    stage: "engine".to_string(),
                    event_type: "run_started".to_string(),
                    payload: format!("{{\"seq\":{seq}}}"),
                })
                .unwrap();
        }
        let events = store.events_for_run("test-run").unwrap();
        let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }
}
