//! Leaderboard service
//!
//! Glue between the game loop and the backend: sign in at startup, save a
//! score when a run ends, re-read the board and hand it to the display.
//! Failures are logged here and go no further; the frame loop never sees
//! them.

use crate::identity::AnonymousAuth;
use crate::leaderboard::{LeaderboardView, ScoreRecord, fetch_top};
use crate::persistence::ScoreStore;
use crate::platform::{ClientStorage, now_ms};
use crate::session::Session;
use crate::settings::Settings;
use crate::submission::submit;

/// Where the ranked board is shown
pub trait LeaderboardSink {
    fn render(&self, view: &LeaderboardView);
}

/// Entry point the game loop calls when a run ends
#[allow(async_fn_in_trait)]
pub trait ScoreSink {
    async fn submit(&self, score: u64);
}

impl<T: LeaderboardSink + ?Sized> LeaderboardSink for &T {
    fn render(&self, view: &LeaderboardView) {
        (**self).render(view)
    }
}

/// Writes the board to the log (headless builds)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LeaderboardSink for LogSink {
    fn render(&self, view: &LeaderboardView) {
        if view.is_empty() {
            log::info!("Leaderboard is empty");
        }
        for line in view.lines() {
            log::info!("{}", line);
        }
    }
}

/// Owns the session and the backend handles for one page load
pub struct LeaderboardService<A, S, C, L> {
    auth: A,
    store: S,
    storage: C,
    sink: L,
    session: Session,
    settings: Settings,
}

impl<A, S, C, L> LeaderboardService<A, S, C, L>
where
    A: AnonymousAuth,
    S: ScoreStore,
    C: ClientStorage,
    L: LeaderboardSink,
{
    pub fn new(auth: A, store: S, storage: C, sink: L, settings: Settings) -> Self {
        let session = Session::new(&storage, &settings.username_key);
        Self {
            auth,
            store,
            storage,
            sink,
            session,
            settings,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sign in and show the current board
    pub async fn start(&self) {
        if let Err(e) = self.session.ensure_identity(&self.auth).await {
            log::warn!("Playing without an identity, scores will not be saved: {}", e);
        }
        self.refresh().await;
    }

    /// Save a finished run's score, then refresh the board.
    ///
    /// The refresh happens whether or not the save worked, so the display
    /// always reflects the last known board. Returns the stored record.
    pub async fn finish_run(&self, score: u64) -> Option<ScoreRecord> {
        let identity = self.session.identity();
        let name = self.session.display_name();

        let saved = match submit(
            &self.store,
            &self.settings.leaderboard_path,
            identity.as_ref(),
            &name,
            score,
            now_ms(),
        )
        .await
        {
            Ok(record) => {
                log::info!("Saved score {} for {}", record.score, record.display_name);
                Some(record)
            }
            Err(e) => {
                log::warn!("Score {} dropped: {}", score, e);
                None
            }
        };

        if let (Some(view), Some(id)) = (self.refresh().await, identity.as_ref()) {
            if let Some(rank) = view.rank_of(id) {
                log::info!("{} is #{} on the leaderboard", name, rank);
            }
        }
        saved
    }

    /// Re-read the top rows and render them.
    ///
    /// On failure nothing is rendered, leaving the previous board on screen.
    pub async fn refresh(&self) -> Option<LeaderboardView> {
        match fetch_top(
            &self.store,
            &self.settings.leaderboard_path,
            self.settings.leaderboard_size,
        )
        .await
        {
            Ok(view) => {
                log::debug!("Leaderboard refreshed ({} rows)", view.len());
                self.sink.render(&view);
                Some(view)
            }
            Err(e) => {
                log::warn!("Leaderboard refresh failed: {}", e);
                None
            }
        }
    }

    /// Player picked a new display name
    pub fn set_display_name(&self, raw: &str) -> bool {
        self.session.set_display_name(&self.storage, raw)
    }
}

impl<A, S, C, L> ScoreSink for LeaderboardService<A, S, C, L>
where
    A: AnonymousAuth,
    S: ScoreStore,
    C: ClientStorage,
    L: LeaderboardSink,
{
    async fn submit(&self, score: u64) {
        self.finish_run(score).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::fakes::{DownAuth, FixedAuth};
    use crate::persistence::MemoryStore;
    use crate::platform::MemoryStorage;
    use parking_lot::Mutex;
    use pollster::block_on;

    /// Keeps every text the board was rendered with
    #[derive(Default)]
    struct RecordingSink {
        renders: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn last(&self) -> Option<String> {
            self.renders.lock().last().cloned()
        }

        fn count(&self) -> usize {
            self.renders.lock().len()
        }
    }

    impl LeaderboardSink for RecordingSink {
        fn render(&self, view: &LeaderboardView) {
            self.renders.lock().push(view.display_text());
        }
    }

    type TestService<'a, A> =
        LeaderboardService<A, &'a MemoryStore, MemoryStorage, &'a RecordingSink>;

    fn service<'a, A: AnonymousAuth>(
        auth: A,
        store: &'a MemoryStore,
        sink: &'a RecordingSink,
        name: Option<&str>,
    ) -> TestService<'a, A> {
        let storage = match name {
            Some(n) => MemoryStorage::with_item("username", n),
            None => MemoryStorage::new(),
        };
        LeaderboardService::new(auth, store, storage, sink, Settings::default())
    }

    #[test]
    fn test_start_signs_in_and_renders() {
        let store = MemoryStore::new();
        let sink = RecordingSink::default();
        let svc = service(FixedAuth::new("A"), &store, &sink, Some("Alice"));

        block_on(svc.start());
        assert!(svc.session().identity().is_some());
        assert_eq!(sink.last().as_deref(), Some("Leaderboard:\n"));
    }

    #[test]
    fn test_finish_run_saves_and_refreshes() {
        let store = MemoryStore::new();
        let sink = RecordingSink::default();
        let svc = service(FixedAuth::new("A"), &store, &sink, Some("Alice"));
        block_on(svc.start());

        let record = block_on(svc.finish_run(500)).unwrap();
        assert_eq!(record.display_name, "Alice");
        assert_eq!(sink.last().as_deref(), Some("Leaderboard:\n1. Alice: 500"));
    }

    #[test]
    fn test_finish_run_without_identity_still_refreshes() {
        let store = MemoryStore::new();
        let sink = RecordingSink::default();
        let svc = service(DownAuth, &store, &sink, None);
        block_on(svc.start());
        assert_eq!(svc.session().identity(), None);

        assert!(block_on(svc.finish_run(700)).is_none());
        assert_eq!(store.child_count("leaderboard"), 0);
        // start + finish_run both rendered
        assert_eq!(sink.count(), 2);
    }

    #[test]
    fn test_store_outage_keeps_previous_board() {
        let store = MemoryStore::new();
        let sink = RecordingSink::default();
        let svc = service(FixedAuth::new("A"), &store, &sink, Some("Alice"));
        block_on(svc.start());
        block_on(svc.finish_run(500));
        let before = sink.count();

        store.set_available(false);
        assert!(block_on(svc.finish_run(900)).is_none());
        assert_eq!(sink.count(), before);
        assert_eq!(sink.last().as_deref(), Some("Leaderboard:\n1. Alice: 500"));

        store.set_available(true);
        assert!(block_on(svc.refresh()).is_some());
    }

    #[test]
    fn test_name_change_applies_to_next_submission_only() {
        let store = MemoryStore::new();
        let sink = RecordingSink::default();
        let svc = service(FixedAuth::new("A"), &store, &sink, None);
        block_on(svc.start());

        block_on(svc.finish_run(100));
        assert_eq!(sink.last().as_deref(), Some("Leaderboard:\n1. Guest: 100"));

        assert!(svc.set_display_name("Alice"));
        // Stored record untouched until the next run ends
        assert_eq!(
            store.get("leaderboard/A").unwrap()["username"],
            serde_json::json!("Guest")
        );

        block_on(svc.finish_run(50));
        assert_eq!(sink.last().as_deref(), Some("Leaderboard:\n1. Alice: 50"));
    }

    #[test]
    fn test_two_players_share_board() {
        let store = MemoryStore::new();
        let sink = RecordingSink::default();
        let alice = service(FixedAuth::new("A"), &store, &sink, Some("Alice"));
        let bob = service(FixedAuth::new("B"), &store, &sink, Some("Bob"));
        block_on(alice.start());
        block_on(bob.start());

        block_on(alice.finish_run(500));
        block_on(ScoreSink::submit(&bob, 900));
        assert_eq!(
            sink.last().as_deref(),
            Some("Leaderboard:\n1. Bob: 900\n2. Alice: 500")
        );
    }
}
