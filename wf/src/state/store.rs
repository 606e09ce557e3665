//! SessionStore - session-scoped holder of the last intent and plan
//!
//! The map lock is held only to find or create a session's cell. Each cell
//! has its own lock, so commits to one session are serialized while
//! unrelated sessions commit concurrently. A commit swaps the cell's
//! `Arc<Session>` wholesale; readers clone the Arc and never see a
//! half-written session.
//!
//! Eviction unlinks a cell from the map and marks it evicted. A commit that
//! already holds an evicted cell retries against a fresh one, so a commit
//! racing an evict either lands before it (and is evicted with it) or after
//! it (and starts a new session). It never writes into an unlinked cell.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::error::SessionError;
use crate::domain::{Intent, Plan, Session, now_ms};

/// One session's slot; empty until the first commit lands
#[derive(Default)]
struct SessionCell {
    current: Mutex<Option<Arc<Session>>>,
    evicted: AtomicBool,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionCell>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session
    pub async fn get(&self, session_id: &str) -> Result<Arc<Session>, SessionError> {
        debug!(%session_id, "SessionStore::get: called");
        let cell = self.sessions.read().await.get(session_id).cloned();
        let Some(cell) = cell else {
            debug!(%session_id, "SessionStore::get: no cell");
            return Err(SessionError::NotFound(session_id.to_string()));
        };

        let current = cell.current.lock().await.clone();
        current.ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Create the session or replace its last intent and plan
    ///
    /// Last write wins. `created_at` survives replacement and `updated_at`
    /// never moves backwards.
    pub async fn commit(&self, session_id: &str, intent: Intent, plan: Plan) -> Arc<Session> {
        debug!(%session_id, kind = %intent.kind, "SessionStore::commit: called");
        loop {
            let cell = self.cell(session_id).await;
            let mut current = cell.current.lock().await;
            if cell.evicted.load(Ordering::SeqCst) {
                debug!(%session_id, "SessionStore::commit: cell evicted, retrying");
                continue;
            }

            let now = now_ms();
            let session = match current.as_ref() {
                Some(prev) => {
                    debug!(%session_id, "SessionStore::commit: replacing");
                    Session {
                        session_id: session_id.to_string(),
                        last_intent: intent,
                        last_plan: plan,
                        created_at: prev.created_at,
                        updated_at: now.max(prev.updated_at),
                    }
                }
                None => {
                    info!(%session_id, "Session created");
                    Session {
                        session_id: session_id.to_string(),
                        last_intent: intent,
                        last_plan: plan,
                        created_at: now,
                        updated_at: now,
                    }
                }
            };

            let session = Arc::new(session);
            *current = Some(session.clone());
            return session;
        }
    }

    /// Drop a session; holders of a snapshot keep their copy
    pub async fn evict(&self, session_id: &str) -> bool {
        debug!(%session_id, "SessionStore::evict: called");
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(cell) => {
                cell.evicted.store(true, Ordering::SeqCst);
                info!(%session_id, "Session evicted");
                true
            }
            None => false,
        }
    }

    /// Drop every session not updated within `max_idle`
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        debug!(?max_idle, "SessionStore::evict_idle: called");
        let cutoff = now_ms() - max_idle.as_millis() as i64;
        let mut sessions = self.sessions.write().await;

        let mut stale = Vec::new();
        for (id, cell) in sessions.iter() {
            let idle = match cell.current.lock().await.as_ref() {
                Some(session) => session.updated_at < cutoff,
                None => false,
            };
            if idle {
                stale.push(id.clone());
            }
        }

        for id in &stale {
            if let Some(cell) = sessions.remove(id) {
                cell.evicted.store(true, Ordering::SeqCst);
            }
        }
        if !stale.is_empty() {
            info!(count = stale.len(), "Evicted idle sessions");
        }
        stale.len()
    }

    /// Number of sessions with a committed plan
    pub async fn len(&self) -> usize {
        self.ids().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Ids of sessions with a committed plan, sorted
    pub async fn ids(&self) -> Vec<String> {
        let cells: Vec<(String, Arc<SessionCell>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, cell)| (id.clone(), cell.clone()))
            .collect();

        let mut ids = Vec::new();
        for (id, cell) in cells {
            if cell.current.lock().await.is_some() {
                ids.push(id);
            }
        }
        ids.sort();
        ids
    }

    /// Find or create the cell for a session
    async fn cell(&self, session_id: &str) -> Arc<SessionCell> {
        if let Some(cell) = self.sessions.read().await.get(session_id) {
            return cell.clone();
        }

        debug!(%session_id, "SessionStore::cell: creating");
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IntentKind, PlanSummary};

    fn plan(subject: &str) -> Plan {
        Plan {
            subject: Some(subject.to_string()),
            origin: None,
            party_size: 2,
            duration_days: 0,
            themes: vec![],
            days: vec![],
            summary: PlanSummary::default(),
            recommendations: vec![],
        }
    }

    fn intent(text: &str) -> Intent {
        Intent::new(IntentKind::NewPlan, text)
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = SessionStore::new();
        assert_eq!(
            store.get("nope").await.unwrap_err(),
            SessionError::NotFound("nope".to_string())
        );
    }

    #[tokio::test]
    async fn test_commit_creates_then_replaces() {
        let store = SessionStore::new();
        let first = store.commit("s1", intent("one"), plan("Rome")).await;
        let second = store.commit("s1", intent("two"), plan("Paris")).await;

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let session = store.get("s1").await.unwrap();
        assert_eq!(session.last_intent.raw_text, "two");
        assert_eq!(session.last_plan.subject.as_deref(), Some("Paris"));

        // The earlier snapshot is untouched
        assert_eq!(first.last_plan.subject.as_deref(), Some("Rome"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_commits_same_session_are_atomic() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let text = format!("req-{}", i);
                store.commit("shared", intent(&text), plan(&text)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Intent and plan always come from the same commit
        let session = store.get("shared").await.unwrap();
        assert_eq!(
            session.last_plan.subject.as_deref(),
            Some(session.last_intent.raw_text.as_str())
        );
        assert_eq!(store.ids().await, vec!["shared".to_string()]);
    }

    #[tokio::test]
    async fn test_unrelated_sessions_commit_concurrently() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("s{:02}", i);
                store.commit(&id, intent(&id), plan(&id)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 16);
        assert_eq!(store.get("s07").await.unwrap().last_intent.raw_text, "s07");
    }

    #[tokio::test]
    async fn test_evict() {
        let store = SessionStore::new();
        let snapshot = store.commit("s1", intent("one"), plan("Rome")).await;

        assert!(store.evict("s1").await);
        assert!(!store.evict("s1").await);
        assert!(store.get("s1").await.is_err());
        assert_eq!(snapshot.last_intent.raw_text, "one");
    }

    #[tokio::test]
    async fn test_evict_idle() {
        let store = SessionStore::new();
        store.commit("old", intent("one"), plan("Rome")).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        store.commit("fresh", intent("two"), plan("Oslo")).await;

        assert_eq!(store.evict_idle(Duration::from_millis(15)).await, 1);
        assert_eq!(store.ids().await, vec!["fresh".to_string()]);
        assert_eq!(store.evict_idle(Duration::from_secs(3600)).await, 0);
    }

    #[tokio::test]
    async fn test_commit_waiting_on_evicted_cell_lands_in_fresh_session() {
        let store = Arc::new(SessionStore::new());
        store.commit("s1", intent("one"), plan("Rome")).await;

        // Hold the cell so the next commit looks it up and then waits
        let cell = store.cell("s1").await;
        let guard = cell.current.lock().await;
        let pending = {
            let store = store.clone();
            tokio::spawn(async move { store.commit("s1", intent("two"), plan("Paris")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.evict("s1").await);
        drop(guard);
        let committed = pending.await.unwrap();

        let session = store.get("s1").await.unwrap();
        assert_eq!(session.last_intent.raw_text, "two");
        assert_eq!(session.created_at, committed.created_at);
        assert_eq!(store.ids().await, vec!["s1".to_string()]);
    }
}
