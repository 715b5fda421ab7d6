//! NeuroMatch entry point
//!
//! Wires the session to the DOM on the web; on native it plays one automated
//! game headlessly.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::time::Duration;

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlInputElement, KeyboardEvent, MouseEvent};

    use neuro_match::consts::PAIR_COUNT;
    use neuro_match::game::format_time;
    use neuro_match::platform::{KeyValueStore, LocalStorage, MemoryStore, StorageError};
    use neuro_match::timer::{Scheduler, TimerHandle, delay_millis};
    use neuro_match::{Screen, Session};

    /// LocalStorage when the browser allows it, otherwise a throwaway map
    enum BrowserStore {
        Local(LocalStorage),
        Memory(MemoryStore),
    }

    impl KeyValueStore for BrowserStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            match self {
                BrowserStore::Local(s) => s.get(key),
                BrowserStore::Memory(s) => s.get(key),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            match self {
                BrowserStore::Local(s) => s.set(key, value),
                BrowserStore::Memory(s) => s.set(key, value),
            }
        }
    }

    type TimerSink = Rc<RefCell<Option<Rc<dyn Fn(TimerHandle)>>>>;

    fn dispatch(sink: &TimerSink, handle: TimerHandle) {
        let callback = sink.borrow().clone();
        if let Some(callback) = callback {
            callback(handle);
        }
    }

    /// `setTimeout`/`setInterval` behind the `Scheduler` trait
    struct BrowserScheduler {
        next_id: u64,
        timeouts: HashMap<TimerHandle, i32>,
        intervals: HashMap<TimerHandle, (i32, Closure<dyn FnMut()>)>,
        sink: TimerSink,
    }

    impl BrowserScheduler {
        fn new(sink: TimerSink) -> Self {
            Self {
                next_id: 0,
                timeouts: HashMap::new(),
                intervals: HashMap::new(),
                sink,
            }
        }

        fn next_handle(&mut self) -> TimerHandle {
            self.next_id += 1;
            TimerHandle::new(self.next_id)
        }
    }

    impl Scheduler for BrowserScheduler {
        fn schedule_once(&mut self, delay: Duration) -> TimerHandle {
            let handle = self.next_handle();
            let sink = self.sink.clone();
            let callback = Closure::once_into_js(move || dispatch(&sink, handle));

            if let Some(window) = web_sys::window() {
                match window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback.unchecked_ref(),
                    delay_millis(delay),
                ) {
                    Ok(id) => {
                        self.timeouts.insert(handle, id);
                    }
                    Err(e) => log::error!("setTimeout failed: {:?}", e),
                }
            }
            handle
        }

        fn schedule_repeating(&mut self, period: Duration) -> TimerHandle {
            let handle = self.next_handle();
            let sink = self.sink.clone();
            let callback = Closure::<dyn FnMut()>::new(move || dispatch(&sink, handle));

            if let Some(window) = web_sys::window() {
                match window.set_interval_with_callback_and_timeout_and_arguments_0(
                    callback.as_ref().unchecked_ref(),
                    delay_millis(period),
                ) {
                    Ok(id) => {
                        self.intervals.insert(handle, (id, callback));
                    }
                    Err(e) => log::error!("setInterval failed: {:?}", e),
                }
            }
            handle
        }

        fn cancel(&mut self, handle: TimerHandle) {
            let Some(window) = web_sys::window() else {
                return;
            };
            if let Some(id) = self.timeouts.remove(&handle) {
                window.clear_timeout_with_handle(id);
            }
            if let Some((id, _callback)) = self.intervals.remove(&handle) {
                window.clear_interval_with_handle(id);
            }
        }
    }

    type Game = Session<BrowserStore, BrowserScheduler>;

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("NeuroMatch starting...");

        let store = match LocalStorage::open() {
            Ok(s) => BrowserStore::Local(s),
            Err(e) => {
                log::warn!("{} - scores will not persist", e);
                BrowserStore::Memory(MemoryStore::new())
            }
        };

        let sink: TimerSink = Rc::new(RefCell::new(None));
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Session::new(
            store,
            BrowserScheduler::new(sink.clone()),
            seed,
        )));
        log::info!("Session initialized with seed: {}", seed);

        // Weak: the sink lives inside the session's own scheduler
        let weak = Rc::downgrade(&game);
        let on_timer: Rc<dyn Fn(TimerHandle)> = Rc::new(move |handle| {
            if let Some(game) = weak.upgrade() {
                game.borrow_mut().on_timer(handle);
                render(&game.borrow());
            }
        });
        *sink.borrow_mut() = Some(on_timer);

        setup_home(game.clone());
        setup_board(game.clone());
        setup_game_over(game.clone());

        render(&game.borrow());

        log::info!("NeuroMatch running!");
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn alert(message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    fn on_click(id: &str, mut handler: impl FnMut(MouseEvent) + 'static) {
        let Some(el) = document().and_then(|d| d.get_element_by_id(id)) else {
            log::warn!("Missing element #{}", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| handler(event));
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn name_input() -> Option<HtmlInputElement> {
        document()?
            .get_element_by_id("name-input")?
            .dyn_into::<HtmlInputElement>()
            .ok()
    }

    fn try_start(game: &Rc<RefCell<Game>>) {
        let result = {
            let mut g = game.borrow_mut();
            if let Some(input) = name_input() {
                g.set_player_name(input.value());
            }
            g.start_game()
        };
        if let Err(e) = result {
            alert(&e.to_string());
        }
        render(&game.borrow());
    }

    fn setup_home(game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click("start-btn", move |_| try_start(&game));
        }

        if let Some(input) = name_input() {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.key() == "Enter" {
                    try_start(&game);
                }
            });
            let _ =
                input.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_board(game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click("menu-btn", move |_| {
                game.borrow_mut().return_home();
                render(&game.borrow());
            });
        }

        // One delegated listener for all sixteen cards
        on_click("cards-grid", move |event| {
            let card = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest(".card").ok().flatten());
            let Some(id) = card
                .and_then(|c| c.get_attribute("data-id"))
                .and_then(|s| s.parse::<usize>().ok())
            else {
                return;
            };
            game.borrow_mut().flip(id);
            render(&game.borrow());
        });
    }

    fn setup_game_over(game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click("play-again-btn", move |_| {
                let result = game.borrow_mut().play_again();
                if let Err(e) = result {
                    alert(&e.to_string());
                }
                render(&game.borrow());
            });
        }

        on_click("main-menu-btn", move |_| {
            game.borrow_mut().return_home();
            render(&game.borrow());
        });
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            if visible {
                let _ = el.remove_attribute("hidden");
            } else {
                let _ = el.set_attribute("hidden", "");
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn render(game: &Game) {
        let Some(document) = document() else {
            return;
        };

        let screen = game.screen();
        set_visible(&document, "home-screen", screen == Screen::Home);
        set_visible(&document, "game-screen", screen == Screen::Playing);
        set_visible(&document, "game-over-screen", screen == Screen::GameOver);

        match screen {
            Screen::Home => render_scores(&document, "home-scores", game, false),
            Screen::Playing => render_board(&document, game),
            Screen::GameOver => render_game_over(&document, game),
        }
    }

    fn render_board(document: &Document, game: &Game) {
        let Some(state) = game.game() else {
            return;
        };

        set_text(document, "stat-player", game.player_name().trim());
        set_text(document, "stat-time", &format_time(state.elapsed_secs));
        set_text(document, "stat-moves", &state.moves.to_string());
        set_text(
            document,
            "stat-matches",
            &format!("{}/{}", state.pairs_found(), PAIR_COUNT),
        );

        let Some(grid) = document.get_element_by_id("cards-grid") else {
            return;
        };

        // Rebuild only for a new deal; otherwise toggle classes so the CSS flip plays
        let deal = game.deal_count().to_string();
        let cards = grid.children();
        let current = grid.get_attribute("data-deal").as_deref() == Some(deal.as_str())
            && cards.length() as usize == state.deck.len();
        if !current {
            let mut html = String::new();
            for card in state.deck.cards() {
                html.push_str(&format!(
                    r#"<div class="{}" data-id="{}"><div class="card-inner"><div class="card-front"><div class="card-pattern"></div></div><div class="card-back"><span>{}</span></div></div></div>"#,
                    state.card_class(card.id),
                    card.id,
                    card.symbol.emoji()
                ));
            }
            grid.set_inner_html(&html);
            let _ = grid.set_attribute("data-deal", &deal);
            return;
        }

        for card in state.deck.cards() {
            if let Some(el) = cards.item(card.id as u32) {
                let class = state.card_class(card.id);
                if el.class_name() != class {
                    el.set_class_name(class);
                }
            }
        }
    }

    fn render_game_over(document: &Document, game: &Game) {
        if let Some(result) = game.last_result() {
            set_text(document, "result-score", &result.entry.score.to_string());
            set_text(document, "result-time", &format_time(result.entry.time));
            set_text(document, "result-moves", &result.entry.moves.to_string());
            set_text(document, "result-player", &result.entry.name);
        }
        render_scores(document, "final-scores", game, true);
    }

    fn render_scores(document: &Document, id: &str, game: &Game, highlight: bool) {
        let Some(list) = document.get_element_by_id(id) else {
            return;
        };
        list.set_inner_html("");

        let board = game.leaderboard();
        if board.is_empty() {
            if let Ok(p) = document.create_element("p") {
                p.set_class_name("no-scores");
                p.set_text_content(Some("No high scores yet!"));
                let _ = list.append_child(&p);
            }
            return;
        }

        for (i, entry) in board.entries().iter().enumerate() {
            let class = if highlight && game.is_current_player(entry) {
                "score-item highlighted"
            } else {
                "score-item"
            };
            let cells = [
                ("rank", (i + 1).to_string()),
                ("player-name", entry.name.clone()),
                (
                    "player-stats",
                    format!("{} moves · {}", entry.moves, format_time(entry.time)),
                ),
                ("score-value", entry.score.to_string()),
            ];
            if let Some(row) = score_row(document, class, &cells) {
                let _ = list.append_child(&row);
            }
        }
    }

    fn score_row(document: &Document, class: &str, cells: &[(&str, String)]) -> Option<Element> {
        let row = document.create_element("div").ok()?;
        row.set_class_name(class);
        for (cell_class, text) in cells {
            let cell = document.create_element("span").ok()?;
            cell.set_class_name(cell_class);
            cell.set_text_content(Some(text.as_str()));
            row.append_child(&cell).ok()?;
        }
        Some(row)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("NeuroMatch (native) starting...");
    log::info!("Native mode plays one automated game - run with `trunk serve` for web version");

    let name = std::env::args().nth(1).unwrap_or_else(|| "Player".to_string());
    autoplay(&name);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one game with perfect memory on a virtual clock
#[cfg(not(target_arch = "wasm32"))]
fn autoplay(name: &str) {
    use std::collections::HashMap;

    use neuro_match::game::{GameState, Symbol, format_time};
    use neuro_match::platform::MemoryStore;
    use neuro_match::timer::ManualScheduler;
    use neuro_match::{Screen, Session};

    /// First card still in play that has never been seen
    fn unknown(game: &GameState, known: &HashMap<usize, Symbol>, skip: Option<usize>) -> Option<usize> {
        (0..game.deck.len())
            .find(|&id| !game.is_matched(id) && !known.contains_key(&id) && Some(id) != skip)
    }

    fn known_twin(game: &GameState, known: &HashMap<usize, Symbol>, id: usize) -> Option<usize> {
        let symbol = known.get(&id)?;
        known
            .iter()
            .filter(|&(&other, s)| other != id && s == symbol && !game.is_matched(other))
            .map(|(&other, _)| other)
            .min()
    }

    let seed = rand::random::<u64>();
    let mut session = Session::new(MemoryStore::new(), ManualScheduler::new(), seed);
    session.set_player_name(name);
    if let Err(e) = session.start_game() {
        log::error!("{}", e);
        return;
    }

    let mut known: HashMap<usize, Symbol> = HashMap::new();
    let pause = session.settings().mismatch_delay();

    for _ in 0..64 {
        if session.screen() != Screen::Playing {
            break;
        }
        let Some(game) = session.game() else {
            break;
        };

        let pending_pair = known
            .keys()
            .copied()
            .filter(|&id| !game.is_matched(id))
            .find(|&id| known_twin(game, &known, id).is_some());
        let Some(first) = pending_pair.or_else(|| unknown(game, &known, None)) else {
            break;
        };

        session.flip(first);
        if let Some(symbol) = session.game().and_then(|g| g.deck.symbol(first)) {
            known.insert(first, symbol);
        }

        let Some(game) = session.game() else {
            break;
        };
        let second = known_twin(game, &known, first)
            .or_else(|| unknown(game, &known, Some(first)))
            .or_else(|| (0..game.deck.len()).find(|&id| id != first && !game.is_matched(id)));
        let Some(second) = second else {
            break;
        };

        session.flip(second);
        if let Some(symbol) = session.game().and_then(|g| g.deck.symbol(second)) {
            known.insert(second, symbol);
        }
        session.advance(pause);
    }

    match session.last_result() {
        Some(result) => {
            println!(
                "{} finished in {} with {} moves: score {}",
                result.entry.name,
                format_time(result.entry.time),
                result.entry.moves,
                result.entry.score
            );
            for (i, entry) in session.leaderboard().entries().iter().enumerate() {
                println!("{}. {} {}", i + 1, entry.name, entry.score);
            }
        }
        None => log::warn!("Autoplay did not finish the game"),
    }
}
