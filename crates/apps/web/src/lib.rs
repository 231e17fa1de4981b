//! Browser front end: mounts the globe on a host canvas and drives the
//! article feed. The host page reads feed and hover state as JSON and may
//! register listeners for feed changes and globe events.

pub mod fetch;
pub mod globe_controller;
pub mod globe_view;
pub mod pointer;
pub mod snapshot;
pub mod storage;
pub mod textures;
pub mod wgpu;

use std::cell::{Cell, RefCell};

use feed::cache::today_key;
use feed::query::{Filters, LabelFilter, SortKey};
use feed::{ApiConfig, ArticleCache, FeedState, Outcome};
use foundation::math::Vec2;
use foundation::time::Time;
use layers::markers::RandomJitter;
use layers::starfield::DEFAULT_STAR_COUNT;
use rand::SeedableRng;
use rand::rngs::StdRng;
use scene::components::TextureSlot;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlCanvasElement;

use crate::globe_controller::now_seconds;
use crate::globe_view::GlobeView;
use crate::storage::BrowserStore;
use crate::wgpu::WgpuContext;

struct Listener {
    target: web_sys::EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

struct App {
    generation: u64,
    view: GlobeView,
    gpu: Option<WgpuContext>,
    feed: FeedState,
    cache: ArticleCache<BrowserStore>,
    api: ApiConfig,
    listeners: Vec<Listener>,
    feed_listener: Option<js_sys::Function>,
    globe_listener: Option<js_sys::Function>,
    last_render_error: Option<String>,
}

impl App {
    fn note_render(&mut self, result: Result<(), JsValue>) {
        match result {
            Ok(()) => self.last_render_error = None,
            Err(err) => {
                let msg = format!("{err:?}");
                if self.last_render_error.as_deref() != Some(msg.as_str()) {
                    log_warn(&format!("render failed: {msg}"));
                    self.last_render_error = Some(msg);
                }
            }
        }
    }
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    static FRAME_CALLBACK: RefCell<Option<Closure<dyn FnMut(f64)>>> = const { RefCell::new(None) };
    static FRAME_REQUEST: Cell<Option<i32>> = const { Cell::new(None) };
    static GENERATION: Cell<u64> = const { Cell::new(0) };
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|cell| {
        let mut guard = cell.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
}

/// Like [`with_app`], but only for the mount that started the work.
fn with_mounted<R>(generation: u64, f: impl FnOnce(&mut App) -> R) -> Option<R> {
    with_app(|app| (app.generation == generation).then(|| f(app))).flatten()
}

fn is_mounted() -> bool {
    APP.with(|cell| cell.try_borrow().map(|a| a.is_some()).unwrap_or(true))
}

fn log_warn(msg: &str) {
    web_sys::console::warn_1(&JsValue::from_str(msg));
}

/// Report a failed DOM call and carry on.
fn warn_on_err<T, E: std::fmt::Debug>(what: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            let msg = format!("{what} failed: {err:?}");
            tracing::warn!("{msg}");
            log_warn(&msg);
            None
        }
    }
}

/// The frame chain ends when the app is gone or a newer mount started its
/// own chain during this frame.
fn keeps_frame_chain(started: u64, current: u64, mounted: bool) -> bool {
    mounted && started == current
}

fn log_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn notify(listener: &js_sys::Function, payload: &str) {
    if let Err(err) = listener.call1(&JsValue::NULL, &JsValue::from_str(payload)) {
        log_warn(&format!("host listener threw: {err:?}"));
    }
}

/// Absolute API base from whatever the host passed: empty means same
/// origin, a bare path is joined onto the origin.
fn resolve_api_base(origin: &str, raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        origin.to_string()
    } else if raw.contains("://") {
        raw.to_string()
    } else {
        format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            raw.trim_start_matches('/')
        )
    }
}

/// Match the backing store to the CSS box; returns the CSS size.
fn fit_canvas(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    let (w, h) = (rect.width().max(1.0), rect.height().max(1.0));
    let dpr = window.device_pixel_ratio().max(1.0);
    canvas.set_width((w * dpr).round() as u32);
    canvas.set_height((h * dpr).round() as u32);
    (w, h)
}

fn open_in_new_tab(url: &str) {
    if let Some(window) = web_sys::window()
        && let Err(err) = window.open_with_url_and_target(url, "_blank")
    {
        log_warn(&format!("could not open {url}: {err:?}"));
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Mount the globe on `canvas_id` and start loading articles from
/// `api_base_url`. Mounting again replaces the previous mount.
#[wasm_bindgen]
pub fn mount(canvas_id: &str, api_base_url: &str) -> Result<(), JsValue> {
    unmount();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("document missing"))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str("canvas missing"))?
        .dyn_into::<HtmlCanvasElement>()?;
    let origin = window.location().origin()?;

    let (css_w, css_h) = fit_canvas(&window, &canvas);
    let mut rng = StdRng::from_entropy();
    let jitter = RandomJitter::new(StdRng::from_entropy());
    let view = GlobeView::new(css_w, css_h, DEFAULT_STAR_COUNT, &mut rng, Box::new(jitter));

    let store = BrowserStore::open();
    if !store.is_persistent() {
        log_warn("localStorage unavailable; the article cache lasts for this page only");
    }

    let generation = GENERATION.with(|g| {
        g.set(g.get() + 1);
        g.get()
    });
    let app = App {
        generation,
        view,
        gpu: None,
        feed: FeedState::new(),
        cache: ArticleCache::new(store),
        api: ApiConfig::new(resolve_api_base(&origin, api_base_url)),
        listeners: attach_listeners(&window, &canvas)?,
        feed_listener: None,
        globe_listener: None,
        last_render_error: None,
    };
    APP.with(|cell| *cell.borrow_mut() = Some(app));

    start_frame_loop();
    init_gpu(canvas_id.to_string(), generation);
    refresh_articles(false);
    Ok(())
}

/// Stop the frame loop, remove listeners and release the globe.
#[wasm_bindgen]
pub fn unmount() {
    if let Some(id) = FRAME_REQUEST.with(Cell::take)
        && let Some(window) = web_sys::window()
    {
        warn_on_err("cancel frame", window.cancel_animation_frame(id));
    }
    let frame_callback = FRAME_CALLBACK.with(|slot| slot.borrow_mut().take());
    let app = APP.with(|cell| cell.try_borrow_mut().ok().and_then(|mut a| a.take()));

    let listeners = match app {
        Some(App {
            view,
            gpu,
            listeners,
            ..
        }) => {
            for l in &listeners {
                warn_on_err(
                    &format!("removing {} listener", l.kind),
                    l.target
                        .remove_event_listener_with_callback(l.kind, l.callback.as_ref().unchecked_ref()),
                );
            }
            drop(gpu);
            view.teardown();
            listeners
        }
        None => Vec::new(),
    };

    // The caller may be one of these closures; free them after it returns.
    if frame_callback.is_some() || !listeners.is_empty() {
        spawn_local(async move {
            drop(listeners);
            drop(frame_callback);
        });
    }
}

/// Client position plus the canvas box it is measured against.
fn pointer_geometry(canvas: &HtmlCanvasElement, ev: &web_sys::PointerEvent) -> (Vec2, Vec2, Vec2) {
    let rect = canvas.get_bounding_client_rect();
    (
        Vec2::new(ev.client_x() as f64, ev.client_y() as f64),
        Vec2::new(rect.left(), rect.top()),
        Vec2::new(rect.width(), rect.height()),
    )
}

fn listen(
    target: &web_sys::EventTarget,
    kind: &'static str,
    passive: bool,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<Listener, JsValue> {
    let callback = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    let opts = web_sys::AddEventListenerOptions::new();
    opts.set_passive(passive);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        kind,
        callback.as_ref().unchecked_ref(),
        &opts,
    )?;
    Ok(Listener {
        target: target.clone(),
        kind,
        callback,
    })
}

fn attach_listeners(
    window: &web_sys::Window,
    canvas: &HtmlCanvasElement,
) -> Result<Vec<Listener>, JsValue> {
    let target: &web_sys::EventTarget = canvas.as_ref();
    let mut out = Vec::new();

    let c = canvas.clone();
    out.push(listen(target, "pointermove", true, move |ev| {
        let Some(ev) = ev.dyn_ref::<web_sys::PointerEvent>() else {
            return;
        };
        let (client, origin, size) = pointer_geometry(&c, ev);
        with_app(|app| app.view.pointer_move(client, origin, size, now_seconds()));
    })?);

    let c = canvas.clone();
    out.push(listen(target, "pointerdown", true, move |ev| {
        let Some(ev) = ev.dyn_ref::<web_sys::PointerEvent>() else {
            return;
        };
        warn_on_err("pointer capture", c.set_pointer_capture(ev.pointer_id()));
        let (client, origin, size) = pointer_geometry(&c, ev);
        with_app(|app| {
            app.view
                .pointer_down(client, origin, size, ev.button(), now_seconds())
        });
    })?);

    out.push(listen(target, "pointerup", true, |_| {
        if let Some(url) = with_app(|app| app.view.pointer_up()).flatten() {
            open_in_new_tab(&url);
        }
    })?);

    out.push(listen(target, "pointerleave", true, |_| {
        with_app(|app| app.view.pointer_leave());
    })?);

    // Not passive: the page only scrolls when the globe lets the wheel go.
    out.push(listen(target, "wheel", false, |ev| {
        let Some(wheel) = ev.dyn_ref::<web_sys::WheelEvent>() else {
            return;
        };
        if with_app(|app| app.view.wheel(wheel.delta_y())).unwrap_or(false) {
            ev.prevent_default();
        }
    })?);

    // Right drag pans.
    out.push(listen(target, "contextmenu", false, |ev| ev.prevent_default())?);

    let c = canvas.clone();
    out.push(listen(window.as_ref(), "resize", true, move |_| {
        let Some(window) = web_sys::window() else {
            return;
        };
        let (w, h) = fit_canvas(&window, &c);
        let (pw, ph) = (c.width(), c.height());
        with_app(|app| {
            app.view.resize(w, h);
            if let Some(gpu) = app.gpu.as_mut() {
                wgpu::resize_wgpu(gpu, pw, ph);
            }
        });
    })?);

    Ok(out)
}

fn start_frame_loop() {
    let callback = Closure::<dyn FnMut(f64)>::new(|_timestamp: f64| {
        if tick() {
            request_frame();
        }
    });
    FRAME_CALLBACK.with(|slot| *slot.borrow_mut() = Some(callback));
    request_frame();
}

fn request_frame() {
    let id = FRAME_CALLBACK.with(|slot| {
        let slot = slot.borrow();
        let callback = slot.as_ref()?;
        web_sys::window()?
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .ok()
    });
    FRAME_REQUEST.with(|r| r.set(id));
}

/// One frame; `false` once the app is gone.
fn tick() -> bool {
    let started = GENERATION.with(Cell::get);
    let now = Time(now_seconds());
    let Some((listener, events)) = with_app(|app| {
        app.view
            .sync_articles(app.feed.visible(), app.feed.revision(), now);
        let out = app.view.frame(now);
        if let Some(gpu) = app.gpu.as_mut() {
            let result = wgpu::render_frame(gpu, &out.render, &out.camera);
            app.note_render(result);
        }
        let events: Vec<String> = app
            .view
            .drain_events()
            .iter()
            .map(|e| snapshot::event_value(e).to_string())
            .collect();
        (app.globe_listener.clone(), events)
    }) else {
        return false;
    };

    if let Some(listener) = listener {
        for event in &events {
            notify(&listener, event);
        }
    }
    keeps_frame_chain(started, GENERATION.with(Cell::get), is_mounted())
}

fn init_gpu(canvas_id: String, generation: u64) {
    spawn_local(async move {
        let ctx = match wgpu::init_wgpu_from_canvas_id(&canvas_id).await {
            Ok(ctx) => ctx,
            Err(err) => {
                log_error(&format!("wgpu init error: {err:?}"));
                return;
            }
        };
        let max_dim = wgpu::max_texture_dimension(&ctx);
        let attached = with_mounted(generation, move |app| {
            let mut ctx = ctx;
            wgpu::set_stars(&mut ctx, &app.view.star_vertices());
            app.gpu = Some(ctx);
        });
        if attached.is_some() {
            for slot in TextureSlot::ALL {
                load_texture(slot, max_dim, generation);
            }
        }
    });
}

/// Fetch and decode one globe texture; the placeholder stays on failure.
fn load_texture(slot: TextureSlot, max_dim: u32, generation: u64) {
    spawn_local(async move {
        let path = slot.asset_path();
        let bytes = match fetch::fetch_bytes(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                log_warn(&format!("texture {path} failed to load: {err}"));
                return;
            }
        };
        let decoded = match textures::decode_texture(&bytes, max_dim) {
            Ok(t) => t,
            Err(err) => {
                log_warn(&format!("texture {path} failed to decode: {err}"));
                return;
            }
        };
        with_mounted(generation, |app| {
            if let Some(gpu) = app.gpu.as_mut() {
                wgpu::set_texture(gpu, slot, &decoded);
            }
        });
    });
}

fn notify_feed() {
    let pending = with_app(|app| {
        app.feed_listener
            .clone()
            .map(|l| (l, snapshot::feed_json(&app.feed)))
    })
    .flatten();
    if let Some((listener, payload)) = pending {
        notify(&listener, &payload);
    }
}

fn notify_if_changed(outcome: Option<Outcome>) {
    if matches!(outcome, Some(Outcome::Applied | Outcome::Failed)) {
        notify_feed();
    }
}

/// Load the article list; a same-day cache hit is shown at once unless
/// `force` is set.
#[wasm_bindgen]
pub fn refresh_articles(force: bool) {
    let Some((plan, api, generation)) = with_app(|app| {
        let plan = app.feed.refresh(&app.cache, &today_key(), force);
        (plan, app.api.clone(), app.generation)
    }) else {
        return;
    };
    notify_feed();

    spawn_local(async move {
        let result = fetch::fetch_articles(&api).await;
        let outcome = with_mounted(generation, |app| {
            app.feed
                .complete_refresh(plan.token, result, &mut app.cache, &today_key())
        });
        notify_if_changed(outcome);
    });
}

/// Replace the list with search hits. A blank query reloads the feed.
#[wasm_bindgen]
pub fn search_articles(query: &str) {
    let query = query.trim().to_string();
    if query.is_empty() {
        refresh_articles(false);
        return;
    }
    let Some((token, api, generation)) =
        with_app(|app| (app.feed.begin_request(), app.api.clone(), app.generation))
    else {
        return;
    };

    spawn_local(async move {
        let result = fetch::fetch_search(&api, &query).await;
        let outcome = with_mounted(generation, |app| app.feed.complete_search(token, result));
        notify_if_changed(outcome);
    });
}

#[wasm_bindgen]
pub fn set_filters(location: &str, concept: &str) {
    let filters = Filters {
        location: LabelFilter::parse(location),
        concept: LabelFilter::parse(concept),
    };
    if with_app(|app| app.feed.set_filters(filters)).is_some() {
        notify_feed();
    }
}

#[wasm_bindgen]
pub fn set_sort(key: &str) -> Result<(), JsValue> {
    let sort = SortKey::parse(key)
        .ok_or_else(|| JsValue::from_str(&format!("unknown sort key {key:?}")))?;
    if with_app(|app| app.feed.set_sort(sort)).is_some() {
        notify_feed();
    }
    Ok(())
}

#[wasm_bindgen]
pub fn go_to_page(page: usize) {
    if with_app(|app| app.feed.go_to_page(page)).is_some() {
        notify_feed();
    }
}

#[wasm_bindgen]
pub fn next_page() {
    if with_app(|app| app.feed.next_page()).is_some() {
        notify_feed();
    }
}

#[wasm_bindgen]
pub fn previous_page() {
    if with_app(|app| app.feed.previous_page()).is_some() {
        notify_feed();
    }
}

#[wasm_bindgen]
pub fn select_headline_category(category: &str) {
    if with_app(|app| app.feed.headlines_mut().select(category)).is_some() {
        notify_feed();
    }
}

/// Open the article's source link; `false` when it has none.
#[wasm_bindgen]
pub fn open_article(uri: &str) -> bool {
    let link = with_app(|app| {
        app.feed
            .articles()
            .iter()
            .find(|a| a.uri == uri)
            .and_then(|a| a.link().map(str::to_string))
    })
    .flatten();
    match link {
        Some(url) => {
            open_in_new_tab(&url);
            true
        }
        None => false,
    }
}

/// Feed state as JSON, or `null` when nothing is mounted.
#[wasm_bindgen]
pub fn feed_state() -> String {
    with_app(|app| snapshot::feed_json(&app.feed)).unwrap_or_else(|| "null".to_string())
}

/// Hovered marker and tooltip position as JSON, or `null`.
#[wasm_bindgen]
pub fn hover_state() -> String {
    with_app(|app| snapshot::hover_value(app.view.hover()).to_string())
        .unwrap_or_else(|| "null".to_string())
}

#[wasm_bindgen]
pub fn set_feed_listener(listener: Option<js_sys::Function>) {
    with_app(|app| app.feed_listener = listener);
}

#[wasm_bindgen]
pub fn set_globe_listener(listener: Option<js_sys::Function>) {
    with_app(|app| app.globe_listener = listener);
}

#[cfg(test)]
mod tests {
    use super::{feed_state, hover_state, is_mounted, keeps_frame_chain, resolve_api_base, warn_on_err};

    #[test]
    fn api_base_resolution() {
        let origin = "https://flare.example";
        assert_eq!(resolve_api_base(origin, ""), "https://flare.example");
        assert_eq!(
            resolve_api_base(origin, "http://localhost:5000"),
            "http://localhost:5000"
        );
        assert_eq!(resolve_api_base(origin, "/api"), "https://flare.example/api");
        assert_eq!(resolve_api_base("https://x/", "api/"), "https://x/api/");
    }

    #[test]
    fn remount_during_a_frame_ends_the_old_chain() {
        assert!(keeps_frame_chain(4, 4, true));
        // A listener mounted again while this frame ran.
        assert!(!keeps_frame_chain(4, 5, true));
        assert!(!keeps_frame_chain(4, 4, false));
    }

    #[test]
    fn successful_dom_calls_pass_through() {
        assert_eq!(warn_on_err::<_, String>("capture", Ok(7)), Some(7));
    }

    #[test]
    fn getters_are_null_before_mount() {
        assert!(!is_mounted());
        assert_eq!(feed_state(), "null");
        assert_eq!(hover_state(), "null");
    }
}
