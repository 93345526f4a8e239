//! Patopo Arcade entry point
//!
//! On the web this wires the DOM to an `Arcade` and runs the frame loop.
//! Natively it plays every game headless with the autoplay bots.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, PointerEvent, TouchEvent};

    use patopo_arcade::arcade::Arcade;
    use patopo_arcade::audio::AudioManager;
    use patopo_arcade::consts::SIM_DT;
    use patopo_arcade::persistence;
    use patopo_arcade::platform::{self, Pointer, action_for_key};
    use patopo_arcade::renderer::canvas::CanvasPainter;

    /// Everything the browser callbacks share
    struct App {
        arcade: Arcade,
        painter: CanvasPainter,
        audio: AudioManager,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl App {
        fn new(painter: CanvasPainter) -> Self {
            let arcade = Arcade::new(persistence::default_store(), platform::run_seed());
            let mut audio = AudioManager::new();
            audio.set_volume(arcade.settings.effective_volume());
            Self {
                arcade,
                painter,
                audio,
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Match the canvas backing store to its CSS size
        fn fit_canvas(&mut self) {
            let Some(window) = web_sys::window() else { return };
            let dpr = window.device_pixel_ratio();
            let canvas = self.painter.canvas();
            let (w, h) = (canvas.client_width().max(1), canvas.client_height().max(1));
            self.painter
                .resize((w as f64 * dpr) as u32, (h as f64 * dpr) as u32);
            self.arcade.resize(Vec2::new(w as f32, h as f32));
        }

        /// Client coordinates to the current view's logical coordinates
        fn to_logical(&self, client_x: i32, client_y: i32) -> Vec2 {
            let canvas = self.painter.canvas();
            let rect = canvas.get_bounding_client_rect();
            let scale_x = canvas.width() as f32 / rect.width().max(1.0) as f32;
            let scale_y = canvas.height() as f32 / rect.height().max(1.0) as f32;
            let screen = Vec2::new(
                (client_x as f32 - rect.left() as f32) * scale_x,
                (client_y as f32 - rect.top() as f32) * scale_y,
            );
            self.painter
                .viewport(self.arcade.view_size())
                .to_logical(screen)
        }

        fn update(&mut self, dt: f32, time: f64) {
            for event in self.arcade.frame(dt) {
                self.audio.handle(event);
            }

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

        fn render(&self) {
            self.painter.paint(&self.arcade.draw());
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            let hud = self.arcade.hud();
            if let Some(el) = document.get_element_by_id("hud") {
                let _ = el.set_attribute("class", if hud.is_some() { "" } else { "hidden" });
            }
            let Some(hud) = hud else { return };

            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&hud.score.to_string()));
            }
            if let Some(el) = document.query_selector("#hud-best .hud-value").ok().flatten() {
                el.set_text_content(Some(&hud.best.to_string()));
            }
            if let Some(el) = document.get_element_by_id("hud-info") {
                el.set_text_content(Some(&hud.info));
            }
            if let Some(el) = document.get_element_by_id("hud-fps") {
                if self.arcade.settings.show_fps {
                    let _ = el.set_attribute("class", "hud-item");
                    el.set_text_content(Some(&format!("{} FPS", self.fps)));
                } else {
                    let _ = el.set_attribute("class", "hud-item hidden");
                }
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"logger already initialised".into());
        }

        log::info!("Patopo Arcade starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("no document");
            return;
        };

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = find_or_create_canvas(&document) else {
            log::error!("no canvas available");
            return;
        };
        let Some(painter) = CanvasPainter::new(canvas.clone()) else {
            log::error!("Canvas 2D context unavailable");
            return;
        };

        let app = Rc::new(RefCell::new(App::new(painter)));
        app.borrow_mut().fit_canvas();

        setup_key_handlers(app.clone());
        setup_pointer_handlers(&canvas, app.clone());
        setup_resize(app.clone());
        setup_auto_pause(&document, app.clone());

        request_animation_frame(app);

        log::info!("Patopo Arcade running!");
    }

    fn find_or_create_canvas(document: &Document) -> Option<HtmlCanvasElement> {
        if let Some(el) = document.get_element_by_id("canvas") {
            return el.dyn_into().ok();
        }
        let canvas: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
        canvas.set_id("canvas");
        let _ = canvas.set_attribute(
            "style",
            "position:fixed;inset:0;width:100vw;height:100svh;touch-action:none",
        );
        document.body()?.append_child(&canvas).ok()?;
        Some(canvas)
    }

    fn setup_key_handlers(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let mut a = app.borrow_mut();
                a.audio.resume();
                match event.key().as_str() {
                    "m" | "M" => {
                        a.arcade.settings.muted = !a.arcade.settings.muted;
                        let vol = a.arcade.settings.effective_volume();
                        a.audio.set_volume(vol);
                        a.arcade.save_settings();
                        log::info!("Muted: {}", a.arcade.settings.muted);
                    }
                    "f" | "F" => {
                        a.arcade.settings.show_fps = !a.arcade.settings.show_fps;
                        a.arcade.save_settings();
                    }
                    "i" | "I" => {
                        a.arcade.autoplay = !a.arcade.autoplay;
                        log::info!("Autoplay: {}", a.arcade.autoplay);
                    }
                    key => {
                        if let Some(action) = action_for_key(key) {
                            event.prevent_default();
                            a.arcade.press(action);
                        }
                    }
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(action) = action_for_key(&event.key()) {
                    app.borrow_mut().arcade.release(action);
                }
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let events: [(&'static str, fn(Vec2) -> Pointer); 4] = [
            ("pointerdown", Pointer::Down),
            ("pointermove", Pointer::Move),
            ("pointerup", Pointer::Up),
            ("pointercancel", Pointer::Up),
        ];
        for (name, make) in events {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();
                if name == "pointerdown" {
                    a.audio.resume();
                    let _ = canvas_clone.set_pointer_capture(event.pointer_id());
                }
                let pos = a.to_logical(event.client_x(), event.client_y());
                a.arcade.pointer(make(pos));
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keep the page from scrolling under a swipe
        let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
            event.prevent_default();
        });
        let _ = canvas.add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().fit_canvas();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(document: &Document, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };

        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut a = app.borrow_mut();
                    if a.arcade.settings.mute_on_blur {
                        a.arcade.auto_pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document
                .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut a = app.borrow_mut();
                if a.arcade.settings.mute_on_blur {
                    a.arcade.auto_pause();
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            a.last_time = time;

            let vol = a.arcade.settings.effective_volume();
            a.audio.set_volume(vol);
            a.update(dt, time);
            a.render();
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                a.update_hud(&document);
            }
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {}

/// Simulated seconds per game in the headless demo
#[cfg(not(target_arch = "wasm32"))]
const DEMO_SECONDS: u32 = 90;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use patopo_arcade::arcade::Arcade;
    use patopo_arcade::consts::SIM_DT;
    use patopo_arcade::games::{GameEvent, GameKind};
    use patopo_arcade::persistence::MemoryStore;
    use patopo_arcade::platform;

    env_logger::init();
    log::info!("Patopo Arcade (native) starting...");
    log::info!("Native mode runs a headless autoplay demo - build for wasm32 to play");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(platform::run_seed);
    log::info!("Demo seed: {}", seed);

    let mut arcade = Arcade::new(Box::new(MemoryStore::default()), seed);
    arcade.autoplay = true;

    for kind in GameKind::ALL {
        arcade.launch_seeded(kind, seed);
        let mut game_overs = 0;
        for _ in 0..DEMO_SECONDS * 60 {
            let events = arcade.frame(SIM_DT);
            game_overs += events.iter().filter(|e| **e == GameEvent::GameOver).count();
        }
        let hud = arcade.hud().unwrap_or_default();
        let best = arcade
            .scores(kind)
            .and_then(|s| s.top_score())
            .unwrap_or(0);
        println!(
            "{:<18} score {:>6}  best {:>6}  game overs {:>3}  {}",
            kind.title(),
            hud.score,
            best,
            game_overs,
            hud.info
        );
        arcade.back_to_menu();
    }
}
