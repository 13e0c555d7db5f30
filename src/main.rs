//! City Courier entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent};

    use city_courier::audio::{self, AudioManager};
    use city_courier::consts::NOMINAL_FRAME_DELTA;
    use city_courier::platform::{KeyAction, KeyState, autopilot_input};
    use city_courier::renderer::{BatchedRenderer, InstanceBatches, InstancedRenderState, RenderError};
    use city_courier::sim::random::RngState;
    use city_courier::sim::{FrameSnapshot, GameEvent, ProgressionState, SimulationLoop};
    use city_courier::{CourierProfile, Settings, SimConfig};

    /// Ground-plane position of the courier in a snapshot
    fn courier_ground(snapshot: &FrameSnapshot) -> Vec2 {
        let [x, _, z] = snapshot.courier.position;
        Vec2::new(x, z)
    }

    /// Game instance holding all state
    struct Game {
        sim: SimulationLoop,
        batches: InstanceBatches,
        render_state: Option<InstancedRenderState>,
        keys: KeyState,
        settings: Settings,
        audio: Rc<RefCell<AudioManager>>,
        profile: Rc<RefCell<CourierProfile>>,
        /// Where horns are heard from; updated before each tick
        listener: Rc<Cell<Vec2>>,
        last_time: f64,
        paused: bool,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64, settings: Settings, profile: CourierProfile) -> Self {
            let progression = profile.progression.clone();
            let mut audio = AudioManager::new();
            audio.set_master_volume(settings.master_volume);
            audio.set_sfx_volume(settings.sfx_volume);

            let sim = build_sim(&settings, seed, progression);
            let batches = InstanceBatches::new(&sim.config().world);
            let mut game = Self {
                sim,
                batches,
                render_state: None,
                keys: KeyState::new(),
                settings,
                audio: Rc::new(RefCell::new(audio)),
                profile: Rc::new(RefCell::new(profile)),
                listener: Rc::new(Cell::new(Vec2::ZERO)),
                last_time: 0.0,
                paused: false,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            };
            game.wire_listeners();
            game
        }

        /// Subscribe audio and the profile to simulation events
        fn wire_listeners(&mut self) {
            let audio = self.audio.clone();
            let listener = self.listener.clone();
            let horn_cues = self.settings.horn_cues;
            self.sim.subscribe(move |event: &GameEvent| {
                if !horn_cues && matches!(event, GameEvent::VehicleStoppedNearPlayer { .. }) {
                    return;
                }
                if let Some(cue) = audio::cue_for(event, listener.get()) {
                    audio.borrow().play(cue);
                }
            });

            let profile = self.profile.clone();
            self.sim.subscribe(move |event: &GameEvent| {
                profile.borrow_mut().record(event);
            });
        }

        /// Advance the simulation by one rendered frame
        fn update(&mut self, dt: f32, time: f64) {
            let input = if self.keys.autopilot {
                autopilot_input(self.sim.snapshot(), self.keys.locomotion)
            } else {
                self.keys.to_input()
            };
            self.sim.set_player_input(input);
            self.listener.set(courier_ground(self.sim.snapshot()));

            if !self.paused {
                let snapshot = self.sim.tick(dt);
                self.batches.update(snapshot);

                let progressed = snapshot.events.iter().any(|event| {
                    matches!(event, GameEvent::Delivery { .. } | GameEvent::LevelUp { .. })
                });
                for event in &snapshot.events {
                    if let GameEvent::LevelUp { level, .. } = event {
                        show_toast(&format!("Level {}!", level));
                    }
                }
                if progressed {
                    let mut profile = self.profile.borrow_mut();
                    profile.sync_progression(self.sim.state().progression.state());
                    profile.save();
                }
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            match render_state.draw_batches(&self.batches) {
                Ok(()) => {}
                Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                    let (w, h) = render_state.size;
                    render_state.resize(w, h);
                }
                Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {}", e),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let snapshot = self.sim.snapshot();
            let progression = &snapshot.progression;

            set_hud(&document, "hud-level", &progression.level.to_string());
            set_hud(
                &document,
                "hud-xp",
                &format!(
                    "{:.0} / {:.0}",
                    progression.experience, progression.experience_to_next
                ),
            );
            set_hud(
                &document,
                "hud-earnings",
                &format!("${:.2}", progression.total_earnings),
            );
            set_hud(&document, "hud-deliveries", &progression.deliveries.to_string());
            set_hud(&document, "hud-skill-points", &progression.skill_points.to_string());

            let hour = snapshot.hour;
            set_hud(
                &document,
                "hud-clock",
                &format!("{:02}:{:02}", hour.floor() as u32, (hour.fract() * 60.0) as u32),
            );
            set_hud(
                &document,
                "hud-energy",
                &format!("{:.0}%", 100.0 * snapshot.courier.energy / snapshot.courier.max_energy.max(1.0)),
            );
            set_hud(&document, "hud-mode", snapshot.courier.locomotion.as_str());
            set_hud(&document, "hud-quality", self.settings.quality.as_str());

            let objective = match (&snapshot.objective, &snapshot.gps) {
                (Some(objective), Some(gps)) => {
                    format!("{:?} ${:.0} ({:.0}m)", objective.kind, objective.reward_estimate, gps.distance)
                }
                (Some(objective), None) => {
                    format!("{:?} ${:.0}", objective.kind, objective.reward_estimate)
                }
                (None, _) => "-".to_string(),
            };
            set_hud(&document, "hud-objective", &objective);

            // Only show the chain once it is actually a chain
            if let Some(el) = document.get_element_by_id("hud-chain") {
                if progression.chain > 1 {
                    let _ = el.set_attribute("class", "hud-item");
                    set_hud(&document, "hud-chain", &format!("x{}", progression.chain));
                } else {
                    let _ = el.set_attribute("class", "hud-item hidden");
                }
            }

            if let Some(el) = document.get_element_by_id("hud-fps") {
                if self.settings.show_fps {
                    let _ = el.set_attribute("class", "hud-item");
                    set_hud(&document, "hud-fps", &self.fps.to_string());
                } else {
                    let _ = el.set_attribute("class", "hud-item hidden");
                }
            }

            if let Some(el) = document.get_element_by_id("pause-menu") {
                let _ = el.set_attribute("class", if self.paused { "" } else { "hidden" });
            }
        }

        /// Start over with a fresh courier
        fn restart(&mut self, seed: u64) {
            CourierProfile::clear();
            *self.profile.borrow_mut() = CourierProfile::new();
            self.sim = build_sim(&self.settings, seed, ProgressionState::default());
            self.keys = KeyState::new();
            self.paused = false;
            self.wire_listeners();
            log::info!("Restarted with seed: {}", seed);
        }

        /// Step to the next quality preset, persist it and respawn traffic
        fn cycle_quality(&mut self, seed: u64) {
            self.settings.quality = self.settings.quality.next();
            self.settings.save();
            let progression = self.sim.state().progression.state().clone();
            self.sim = build_sim(&self.settings, seed, progression);
            self.batches = InstanceBatches::new(&self.sim.config().world);
            self.wire_listeners();
            show_toast(&format!("Quality: {}", self.settings.quality.as_str()));
        }

        fn set_paused(&mut self, paused: bool) {
            if self.paused != paused {
                self.paused = paused;
                self.keys.release_all();
                log::info!("{}", if paused { "Paused" } else { "Resumed" });
            }
        }
    }

    fn build_sim(settings: &Settings, seed: u64, progression: ProgressionState) -> SimulationLoop {
        let mut config = SimConfig::default();
        settings.apply_to(&mut config);
        SimulationLoop::new(config, RngState::new(seed).to_rng()).with_progression(progression)
    }

    fn set_hud(document: &Document, id: &str, text: &str) {
        let selector = format!("#{} .hud-value", id);
        if let Some(el) = document.query_selector(&selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn show_toast(text: &str) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(el) = document.get_element_by_id("toast") {
            el.set_text_content(Some(text));
            let _ = el.set_attribute("class", "show");
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("City Courier starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element");
            return;
        };

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let profile = CourierProfile::load();
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, settings, profile)));
        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                return;
            }
        };

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::error!("Failed to get adapter: {}", e);
                return;
            }
        };

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match InstancedRenderState::new(surface, &adapter, width, height).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => {
                log::error!("Renderer unavailable: {}", e);
                return;
            }
        }

        setup_input_handlers(game.clone());
        setup_restart_button(game.clone());
        setup_auto_pause(game.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        // Start game loop
        request_animation_frame(game);

        log::info!("City Courier running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Key down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                g.audio.borrow().resume();
                let key = event.key();
                if key == "Escape" || key == "p" || key == "P" {
                    let paused = !g.paused;
                    g.set_paused(paused);
                    return;
                }
                match g.keys.key_down(&key) {
                    KeyAction::Move => event.prevent_default(),
                    KeyAction::SelectLocomotion(mode) => log::info!("Locomotion: {}", mode.as_str()),
                    KeyAction::SpendSkill(skill) => match g.sim.spend_skill_point(skill) {
                        Ok(tier) => {
                            log::info!("{} upgraded to tier {}", skill.as_str(), tier);
                            let mut profile = g.profile.borrow_mut();
                            profile.sync_progression(g.sim.state().progression.state());
                            profile.save();
                        }
                        Err(e) => log::info!("Cannot upgrade {}: {}", skill.as_str(), e),
                    },
                    KeyAction::ToggleAutopilot => log::info!("Autopilot: {}", g.keys.autopilot),
                    KeyAction::CycleQuality => g.cycle_quality(js_sys::Date::now() as u64),
                    KeyAction::Ignored => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().keys.key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // The simulation clamps oversized deltas itself
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                NOMINAL_FRAME_DELTA
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().restart(js_sys::Date::now() as u64);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().set_paused(true);
                    log::info!("Auto-paused (tab hidden)");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.keys.release_all();
                if g.settings.mute_on_blur {
                    g.audio.borrow_mut().set_muted(true);
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window focus
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow().audio.borrow_mut().set_muted(false);
            });
            let _ = window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless run: the courier drives itself toward each objective
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use city_courier::consts::NOMINAL_FRAME_DELTA;
    use city_courier::platform::autopilot_input;
    use city_courier::sim::random::RngState;
    use city_courier::sim::{GameEvent, LocomotionMode, SimulationLoop};
    use city_courier::{CourierProfile, QualityPreset, Settings, SimConfig};

    /// Ten minutes at 60 fps
    const DEMO_TICKS: u32 = 36_000;
    const DEFAULT_SEED: u64 = 42;

    env_logger::init();
    log::info!("City Courier (native) starting...");
    log::info!("Native mode runs headless - run with `trunk serve` for the web version");

    // Usage: city-courier [config.json] [seed] [low|medium|high]
    let mut args = std::env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| SimConfig::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => {
                log::error!("Cannot use config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);
    if let Some(name) = args.next() {
        match QualityPreset::from_str(&name) {
            Some(preset) => {
                Settings::from_preset(preset).apply_to(&mut config);
                log::info!("Quality preset: {}", preset.as_str());
            }
            None => log::warn!("Unknown quality preset {:?}, keeping config counts", name),
        }
    }

    let mut sim = SimulationLoop::new(config, RngState::new(seed).to_rng());
    let profile = Rc::new(RefCell::new(CourierProfile::load()));

    sim.subscribe(|event: &GameEvent| match event {
        GameEvent::VehicleStoppedNearPlayer { .. } => log::debug!("{:?}", event),
        _ => log::info!("{:?}", event),
    });
    {
        let profile = profile.clone();
        sim.subscribe(move |event: &GameEvent| {
            profile.borrow_mut().record(event);
        });
    }

    for _ in 0..DEMO_TICKS {
        let input = autopilot_input(sim.snapshot(), LocomotionMode::Bicycle);
        sim.set_player_input(input);
        sim.tick(NOMINAL_FRAME_DELTA);
    }

    let mut profile = profile.borrow_mut();
    profile.sync_progression(sim.state().progression.state());
    profile.save();

    match serde_json::to_string_pretty(&*profile) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Cannot print profile: {}", e),
    }
}
