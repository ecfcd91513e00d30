//! Browser bridge
//!
//! The page's game engine owns rendering, physics and input. It drives the
//! run through `WebGame` and gets the leaderboard back as element text.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use super::storage::LocalStorage;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::leaderboard::LeaderboardView;
use crate::persistence::firebase::{FirebaseAuth, FirebaseDatabase, SharedToken};
use crate::service::{LeaderboardService, LeaderboardSink};
use crate::settings::Settings;
use crate::sim::{RunEvent, RunState, Steer, TickInput, tick};
use crate::tuning::Tuning;

/// Sets an element's text to the rendered leaderboard
#[derive(Debug, Clone)]
pub struct DomTextSink {
    element_id: String,
}

impl DomTextSink {
    pub fn new(element_id: &str) -> Self {
        Self {
            element_id: element_id.to_string(),
        }
    }
}

impl LeaderboardSink for DomTextSink {
    fn render(&self, view: &LeaderboardView) {
        let el = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(&self.element_id));
        match el {
            Some(el) => el.set_text_content(Some(&view.display_text())),
            None => log::warn!("No #{} element for the leaderboard", self.element_id),
        }
    }
}

type WebService = LeaderboardService<FirebaseAuth, FirebaseDatabase, LocalStorage, DomTextSink>;

/// Run state and leaderboard handle exposed to the page
#[wasm_bindgen]
pub struct WebGame {
    run: RunState,
    tuning: Tuning,
    service: Rc<WebService>,
    accumulator: f32,
    input: TickInput,
}

#[wasm_bindgen]
impl WebGame {
    /// Create the game, sign in and show the board.
    ///
    /// `leaderboard_element` is the id of the element that receives the
    /// leaderboard text; `tuning_json` optionally overrides game balance.
    #[wasm_bindgen(constructor)]
    pub fn new(leaderboard_element: &str, tuning_json: Option<String>) -> WebGame {
        let settings = Settings::load();
        if !settings.has_remote() {
            log::warn!("No backend configured; leaderboard calls will fail");
        }

        let tuning = match tuning_json.as_deref().map(Tuning::from_json) {
            Some(Ok(t)) => t,
            Some(Err(e)) => {
                log::warn!("Ignoring tuning overrides: {}", e);
                Tuning::default()
            }
            None => Tuning::default(),
        };

        let token: SharedToken = Rc::new(RefCell::new(None));
        let service = Rc::new(LeaderboardService::new(
            FirebaseAuth::new(&settings, token.clone()),
            FirebaseDatabase::new(&settings, token),
            LocalStorage,
            DomTextSink::new(leaderboard_element),
            settings,
        ));

        {
            let service = service.clone();
            wasm_bindgen_futures::spawn_local(async move { service.start().await });
        }

        let seed = js_sys::Date::now() as u64;
        log::info!("Run started with seed: {}", seed);
        WebGame {
            run: RunState::new(seed, &tuning),
            tuning,
            service,
            accumulator: 0.0,
            input: TickInput::default(),
        }
    }

    /// Engine reports the car hit an obstacle
    pub fn crash(&mut self) {
        self.input.crashed = true;
    }

    /// Engine reports the car picked up a power-up
    pub fn collect_powerup(&mut self) {
        self.input.powerups_collected += 1;
    }

    /// Advance by `dt` seconds of frame time; returns the events as JSON.
    ///
    /// `steer` is -1 (left), 0 or 1 (right). When the run crashes its score
    /// is submitted in the background and a fresh run begins.
    pub fn update(&mut self, dt: f32, steer: i32) -> String {
        self.input.steer = Steer::from_axis(steer);
        self.accumulator += dt.min(0.1);

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            events.extend(tick(&mut self.run, &self.input, &self.tuning));
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.crashed = false;
            self.input.powerups_collected = 0;
        }

        if let Some(score) = events.iter().find_map(|e| match e {
            RunEvent::Crashed { score } => Some(*score),
            _ => None,
        }) {
            self.end_run(score);
        }

        serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
    }

    /// Save a new display name for this and later sessions
    pub fn set_username(&self, name: &str) -> bool {
        self.service.set_display_name(name)
    }

    pub fn username(&self) -> String {
        self.service.session().display_name()
    }

    pub fn score(&self) -> u64 {
        self.run.score
    }

    pub fn difficulty(&self) -> f32 {
        self.run.difficulty(&self.tuning)
    }

    pub fn player_velocity_x(&self) -> f32 {
        self.run.player_vel_x
    }

    pub fn road_offset(&self) -> f32 {
        self.run.road_offset
    }

    pub fn challenge_goal(&self) -> u64 {
        self.tuning.challenge_goal
    }

    pub fn challenge_complete(&self) -> bool {
        self.run.challenge_complete
    }

    pub fn raining(&self) -> bool {
        self.run.weather == crate::sim::Weather::Rain
    }
}

impl WebGame {
    fn end_run(&mut self, score: u64) {
        let service = self.service.clone();
        wasm_bindgen_futures::spawn_local(async move {
            service.finish_run(score).await;
        });

        let seed = js_sys::Date::now() as u64;
        self.run = RunState::new(seed, &self.tuning);
        self.accumulator = 0.0;
        self.input = TickInput::default();
        log::info!("Run restarted with seed: {}", seed);
    }
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
    log::info!("Road Rush starting...");
}
