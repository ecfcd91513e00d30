//! Road Rush entry point
//!
//! The browser build is driven by the page through `WebGame`. Natively
//! there is no engine, so this runs a few headless runs against an
//! in-process store and logs the resulting leaderboard.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use road_rush::identity::LocalAnonymousAuth;
    use road_rush::platform::MemoryStorage;
    use road_rush::sim::{RunEvent, RunState, TickInput, tick};
    use road_rush::{LeaderboardService, LogSink, MemoryStore, ScoreSink, Settings, Tuning};

    env_logger::init();
    log::info!("Road Rush (native) starting...");
    log::info!("Native mode is headless - serve the web build for the playable game");

    let settings = Settings::load();
    let tuning = Tuning::default();
    let store = MemoryStore::new();
    let mut rng = Pcg32::seed_from_u64(2024);

    for name in ["Alice", "Bob", "Cara"] {
        let storage = MemoryStorage::with_item(&settings.username_key, name);
        let service =
            LeaderboardService::new(LocalAnonymousAuth, &store, storage, LogSink, settings.clone());
        pollster::block_on(service.start());

        let seed: u64 = rng.random();
        let crash_at: u64 = rng.random_range(300..2000);
        let mut run = RunState::new(seed, &tuning);
        let mut final_score = None;
        while final_score.is_none() {
            let input = TickInput {
                crashed: run.score >= crash_at,
                ..Default::default()
            };
            for event in tick(&mut run, &input, &tuning) {
                match event {
                    RunEvent::Crashed { score } => final_score = Some(score),
                    RunEvent::ChallengeCompleted { score } => {
                        log::info!("{} completed the challenge at {}", name, score)
                    }
                    _ => {}
                }
            }
        }

        if let Some(score) = final_score {
            log::info!("{} crashed with {} points", name, score);
            pollster::block_on(service.submit(score));
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_start in the library, this is just to satisfy the compiler
}
