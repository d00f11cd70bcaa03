// Grupoj – A word grouping game
// Copyright (C) 2023, 2024  Neil Roberts
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use wasm_bindgen::prelude::*;
use web_sys::console;
use super::config::Config;
use super::engine::{Analytics, AnalyticsError, Event, Game, Scheduled};
use super::game_date::GameDate;
use super::positions::{GRID_SIZE, ORDERED_POSITIONS};
use super::session::TileStatus;
use super::sheet;
use super::storage::{self, SaveSlot};
use super::view::Board;
use js_sys::Reflect;
use rand::SeedableRng;
use rand::rngs::SmallRng;

const SHARE_TEXT_COPIED_ID: &'static str = "share-text-copied";
const SHARE_TEXT_ID: &'static str = "share-text";
const ONE_AWAY_MESSAGE: &'static str = "One away…";

fn show_error(message: &str) {
    console::log_1(&message.into());

    let Some(window) = web_sys::window()
    else {
        return;
    };

    let Some(document) = window.document()
    else {
        return;
    };

    let Some(message_elem) = document.get_element_by_id("message")
    else {
        return;
    };

    message_elem.set_text_content(Some("An error occurred"));
}

struct Context {
    document: web_sys::HtmlDocument,
    window: web_sys::Window,
}

impl Context {
    fn new() -> Result<Context, String> {
        let Some(window) = web_sys::window()
        else {
            return Err("failed to get window".to_string());
        };

        let Some(document) = window.document()
            .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
        else {
            return Err("failed to get document".to_string());
        };

        Ok(Context {
            document,
            window,
        })
    }

    fn html_element(&self, id: &str) -> Option<web_sys::HtmlElement> {
        self.document.get_element_by_id(id)
            .and_then(|c| c.dyn_into::<web_sys::HtmlElement>().ok())
    }
}

type PromiseClosure = Closure::<dyn FnMut(JsValue)>;

/// Collects one formatted log message and sends it to the console
/// when the formatter drops it.
struct ConsoleWriter(Vec<u8>);

impl std::io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let message = String::from_utf8_lossy(&self.0);
        let message = message.trim_end();

        if !message.is_empty() {
            console::log_1(&message.into());
        }
    }
}

fn init_tracing() {
    // There is no clock for the timestamps in the browser
    let result = tracing_subscriber::fmt()
        .with_writer(|| ConsoleWriter(Vec::new()))
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::WARN)
        .try_init();

    if result.is_err() {
        console::log_1(&"Error installing the log subscriber".into());
    }
}

/// The save slot backed by the browser’s local storage.
struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

impl LocalStorage {
    fn new(context: &Context) -> LocalStorage {
        LocalStorage { storage: get_local_storage(context) }
    }

    fn storage(&self) -> Result<&web_sys::Storage, storage::Error> {
        self.storage.as_ref().ok_or(storage::Error::Unavailable)
    }
}

impl SaveSlot for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, storage::Error> {
        self.storage()?.get_item(key).map_err(|_| {
            storage::Error::Backend("error getting item".to_string())
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), storage::Error> {
        self.storage()?.set_item(key, value).map_err(|_| {
            console::log_1(&"Error saving state".into());
            storage::Error::Backend("error setting item".to_string())
        })
    }

    fn delete(&mut self, key: &str) -> Result<(), storage::Error> {
        self.storage()?.remove_item(key).map_err(|_| {
            storage::Error::Backend("error removing item".to_string())
        })
    }
}

/// Sends the game result to Google Analytics if the page has it.
struct GtagAnalytics;

impl Analytics for GtagAnalytics {
    fn game_result(
        &mut self,
        won: bool,
        n_solutions: usize,
    ) -> Result<(), AnalyticsError> {
        let Some(gtag) = Reflect::get(&js_sys::global(), &"gtag".into())
            .ok()
            .and_then(|gtag| gtag.dyn_into::<js_sys::Function>().ok())
        else {
            return Err(AnalyticsError("gtag is not available".to_string()));
        };

        let params = js_sys::Object::new();
        let _ = Reflect::set(&params, &"won".into(), &won.into());
        let _ = Reflect::set(
            &params,
            &"num_solutions".into(),
            &(n_solutions as u32).into(),
        );

        gtag.call3(
            &JsValue::NULL,
            &"event".into(),
            &"game_result".into(),
            &params,
        ).map_err(|_| AnalyticsError("gtag failed".to_string()))?;

        Ok(())
    }
}

/// Applies the board to the elements of the page. The tiles are
/// created the first time there are some to show.
struct Renderer {
    document: web_sys::HtmlDocument,
    game_grid: web_sys::HtmlElement,
    tiles: Vec<web_sys::HtmlElement>,
    submit_button: Option<web_sys::HtmlButtonElement>,
    deselect_button: Option<web_sys::HtmlButtonElement>,
    shuffle_button: Option<web_sys::HtmlButtonElement>,
    mistakes: Option<web_sys::HtmlElement>,
    solutions: Option<web_sys::HtmlElement>,
    content: Option<web_sys::HtmlElement>,
}

impl Renderer {
    fn new(context: &Context, game_grid: web_sys::HtmlElement) -> Renderer {
        let button = |id: &str| {
            context.document.get_element_by_id(id)
                .and_then(|c| c.dyn_into::<web_sys::HtmlButtonElement>().ok())
        };

        Renderer {
            document: context.document.clone(),
            game_grid,
            tiles: Vec::new(),
            submit_button: button("submit-button"),
            deselect_button: button("deselect-button"),
            shuffle_button: button("shuffle-button"),
            mistakes: context.html_element("mistakes"),
            solutions: context.html_element("solutions"),
            content: context.html_element("content"),
        }
    }

    fn create_tiles(&mut self, n_tiles: usize) {
        while self.tiles.len() < n_tiles {
            let index = self.tiles.len();

            let Some(&home) = ORDERED_POSITIONS.get(index)
            else {
                return;
            };

            let Some(tile) = self.document.create_element("div").ok()
                .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok())
            else {
                console::log_1(&"Error creating tile".into());
                return;
            };

            let cell_percent = 100.0 / GRID_SIZE as f64;
            let style = tile.style();
            let _ = style.set_property(
                "left",
                &format!("{}%", home.col as f64 * cell_percent),
            );
            let _ = style.set_property(
                "top",
                &format!("{}%", home.row as f64 * cell_percent),
            );
            let _ = tile.set_attribute("data-index", &index.to_string());

            let _ = self.game_grid.append_with_node_1(&tile);

            self.tiles.push(tile);
        }
    }

    fn update_tiles(&self, board: &Board) {
        let cell_width = self.game_grid.client_width() as f64
            / GRID_SIZE as f64;
        let cell_height = self.game_grid.client_height() as f64
            / GRID_SIZE as f64;

        for (element, tile) in self.tiles.iter().zip(board.tiles.iter()) {
            let mut class = String::from("tile");

            if tile.selected {
                class.push_str(" selected");
            }

            class.push_str(match tile.status {
                TileStatus::Idle => "",
                TileStatus::Attempt => " attempt",
                TileStatus::Wrong => " wrong",
                TileStatus::Solved => " solved",
            });

            if !tile.in_play {
                class.push_str(" out-of-play");
            }

            let _ = element.set_attribute("class", &class);
            set_element_text(element, &tile.word);

            let (x, y) = tile.pixel_offset(cell_width, cell_height);
            let _ = element.style().set_property(
                "transform",
                &format!("translate({}px, {}px)", x, y),
            );
        }
    }

    fn update_solutions(&self, board: &Board) {
        let Some(solutions) = self.solutions.as_ref()
        else {
            return;
        };

        clear_element(solutions);

        for solution in board.solutions.iter() {
            let Ok(elem) = self.document.create_element("div")
            else {
                continue;
            };

            let _ = elem.set_attribute(
                "class",
                &format!("solution difficulty-{}", solution.difficulty),
            );
            set_element_text(
                &elem,
                &format!("{}: {}", solution.group, solution.words.join(", ")),
            );

            let _ = solutions.append_with_node_1(&elem);
        }
    }

    fn render(&mut self, board: &Board) {
        self.create_tiles(board.tiles.len());
        self.update_tiles(board);
        self.update_solutions(board);

        if let Some(button) = self.submit_button.as_ref() {
            button.set_disabled(!board.can_submit);
        }

        if let Some(button) = self.deselect_button.as_ref() {
            button.set_disabled(!board.can_deselect_all);
        }

        if let Some(button) = self.shuffle_button.as_ref() {
            button.set_disabled(board.ended);
        }

        if let Some(mistakes) = self.mistakes.as_ref() {
            set_element_text(
                mistakes,
                &format!(
                    "Mistakes remaining: {}",
                    "●".repeat(board.attempts_remaining),
                ),
            );
        }

        if let Some(content) = self.content.as_ref() {
            let class_list = content.class_list();

            if board.loading {
                let _ = class_list.add_1("loading");
            } else {
                let _ = class_list.remove_1("loading");
            }
        }

        if let Some(share_text) = board.share_text.as_ref() {
            if let Some(elem) = self.document.get_element_by_id(SHARE_TEXT_ID) {
                set_element_text(&elem, share_text);
            }
        }

        set_element_visibility(
            &self.document,
            "share-overlay",
            board.auto_solve_finished,
        );
    }
}

struct Grupoj {
    context: Context,
    game: Game,
    save_slot: LocalStorage,
    storage_key: String,
    sheet_url: String,
    date: GameDate,
    game_grid: web_sys::HtmlElement,

    tile_click_closure: Option<Closure::<dyn Fn(JsValue)>>,
    submit_closure: Option<Closure::<dyn Fn(JsValue)>>,
    deselect_closure: Option<Closure::<dyn Fn(JsValue)>>,
    shuffle_closure: Option<Closure::<dyn Fn(JsValue)>>,
    copy_closure: Option<Closure::<dyn Fn(JsValue)>>,

    data_response_closure: Option<PromiseClosure>,
    data_content_closure: Option<PromiseClosure>,
    data_error_closure: Option<PromiseClosure>,
}

impl Grupoj {
    fn new(context: Context, config: Config) -> Result<Box<Grupoj>, String> {
        let Some(date) = today()
        else {
            return Err("failed to get today’s date".to_string());
        };

        let Some(game_grid) = context.html_element("game-grid")
        else {
            return Err("failed to get game grid".to_string());
        };

        let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
        let mut game = Game::new(
            date.key(),
            &config,
            SmallRng::seed_from_u64(seed),
        );

        game.set_analytics(Box::new(GtagAnalytics));

        if let Some(one_away) = context.html_element("one-away-message") {
            game.set_one_away_notifier(Box::new(move || {
                set_element_text(&one_away, ONE_AWAY_MESSAGE);

                // Re-add the element to trigger the animation
                if let Some(parent) = one_away.parent_node() {
                    one_away.remove();
                    let _ = parent.append_child(&one_away);
                }
            }));
        }

        let mut renderer = Renderer::new(&context, game_grid.clone());
        game.subscribe(Box::new(move |board: &Board| renderer.render(board)));

        let save_slot = LocalStorage::new(&context);

        let mut grupoj = Box::new(Grupoj {
            context,
            game,
            save_slot,
            storage_key: config.storage_key,
            sheet_url: config.sheet_url,
            date,
            game_grid,
            tile_click_closure: None,
            submit_closure: None,
            deselect_closure: None,
            shuffle_closure: None,
            copy_closure: None,
            data_response_closure: None,
            data_content_closure: None,
            data_error_closure: None,
        });

        grupoj.create_closures();

        if let Some(session) = storage::load_session(
            &grupoj.save_slot,
            &grupoj.storage_key,
            &grupoj.date.key(),
        ) {
            grupoj.dispatch(Event::Restore(session));
        }

        grupoj.queue_data_load();

        Ok(grupoj)
    }

    fn dispatch(&mut self, event: Event) {
        self.game.apply_event(event);

        for scheduled in self.game.take_scheduled() {
            self.schedule(scheduled);
        }

        if let Some(session) = self.game.changed_session() {
            storage::save_session(
                &mut self.save_slot,
                &self.storage_key,
                &session,
            );
        }
    }

    fn schedule(&mut self, scheduled: Scheduled) {
        let grupoj_pointer = self as *mut Grupoj;
        let Scheduled { delay_ms, event } = scheduled;

        let callback = Closure::once_into_js(move || {
            let grupoj = unsafe { &mut *grupoj_pointer };
            grupoj.dispatch(Event::Timer(event));
        });

        if self.context.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                delay_ms as i32,
            ).is_err()
        {
            console::log_1(&"Error setting timeout".into());
        }
    }

    fn queue_data_load(&mut self) {
        let grupoj_pointer = self as *mut Grupoj;

        let response_closure = PromiseClosure::new(move |v: JsValue| {
            let grupoj = unsafe { &mut *grupoj_pointer };

            let Ok(response) = v.dyn_into::<web_sys::Response>()
            else {
                grupoj.data_failed("Error fetching puzzle sheet");
                return;
            };

            let promise = match response.text() {
                Ok(p) => p,
                Err(_) => {
                    grupoj.data_failed("Error reading puzzle sheet");
                    return;
                },
            };

            if let (Some(content_closure), Some(error_closure)) = (
                grupoj.data_content_closure.as_ref(),
                grupoj.data_error_closure.as_ref(),
            ) {
                let _ = promise.then2(content_closure, error_closure);
            }
        });

        let content_closure = PromiseClosure::new(move |v: JsValue| {
            let grupoj = unsafe { &mut *grupoj_pointer };

            match v.as_string() {
                Some(text) => grupoj.data_loaded(&text),
                None => grupoj.data_failed("Puzzle sheet is not text"),
            }
        });

        let error_closure = PromiseClosure::new(move |_| {
            let grupoj = unsafe { &mut *grupoj_pointer };
            grupoj.data_failed("Error loading puzzle sheet");
        });

        let mut request_init = web_sys::RequestInit::new();
        request_init.cache(web_sys::RequestCache::NoCache);

        let promise = self.context.window.fetch_with_str_and_init(
            &self.sheet_url,
            &request_init,
        );

        let _ = promise.then2(&response_closure, &error_closure);

        self.data_response_closure = Some(response_closure);
        self.data_content_closure = Some(content_closure);
        self.data_error_closure = Some(error_closure);
    }

    fn data_loaded(&mut self, text: &str) {
        let groupings = sheet::parse_rows(text)
            .and_then(|rows| sheet::groupings_for_date(&rows, self.date));

        match groupings {
            Ok(groupings) => self.dispatch(Event::GroupingsLoaded(groupings)),
            Err(e) => self.data_failed(&format!("Error in puzzle sheet: {}", e)),
        }
    }

    fn data_failed(&mut self, message: &str) {
        show_error(message);
        self.dispatch(Event::GroupingsFailed);
    }

    fn create_closures(&mut self) {
        let grupoj_pointer = self as *mut Grupoj;

        let tile_click_closure = Closure::<dyn Fn(JsValue)>::new(
            move |event: JsValue| {
                let grupoj = unsafe { &mut *grupoj_pointer };
                let Ok(event) = event.dyn_into::<web_sys::Event>()
                else {
                    return;
                };
                grupoj.handle_tile_click(event);
            }
        );

        let _ = self.game_grid.add_event_listener_with_callback(
            "click",
            tile_click_closure.as_ref().unchecked_ref(),
        );

        self.tile_click_closure = Some(tile_click_closure);

        self.submit_closure = self.add_button_event(
            "submit-button",
            Event::Submit,
        );
        self.deselect_closure = self.add_button_event(
            "deselect-button",
            Event::DeselectAll,
        );
        self.shuffle_closure = self.add_button_event(
            "shuffle-button",
            Event::Shuffle,
        );

        let copy_closure = Closure::<dyn Fn(JsValue)>::new(
            move |_event: JsValue| {
                let grupoj = unsafe { &*grupoj_pointer };
                grupoj.copy_share_text();
            }
        );

        if let Some(copy_button) =
            self.context.document.get_element_by_id("copy-share")
        {
            let _ = copy_button.add_event_listener_with_callback(
                "click",
                copy_closure.as_ref().unchecked_ref(),
            );
        }

        self.copy_closure = Some(copy_closure);
    }

    fn add_button_event(
        &mut self,
        id: &str,
        event: Event,
    ) -> Option<Closure::<dyn Fn(JsValue)>> {
        let grupoj_pointer = self as *mut Grupoj;

        let button = self.context.document.get_element_by_id(id)?;

        let closure = Closure::<dyn Fn(JsValue)>::new(
            move |_event: JsValue| {
                let grupoj = unsafe { &mut *grupoj_pointer };
                grupoj.dispatch(event.clone());
            }
        );

        let _ = button.add_event_listener_with_callback(
            "click",
            closure.as_ref().unchecked_ref(),
        );

        Some(closure)
    }

    fn handle_tile_click(&mut self, event: web_sys::Event) {
        let Some(index) = event.target()
            .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
            .and_then(|element| element.closest(".tile").ok().flatten())
            .and_then(|tile| tile.get_attribute("data-index"))
            .and_then(|index| index.parse::<usize>().ok())
        else {
            return;
        };

        let board = Board::new(&self.game, &ORDERED_POSITIONS);

        if let Some(event) = board.tiles.get(index)
            .and_then(|tile| tile.toggle())
        {
            self.dispatch(event);
        }
    }

    fn copy_share_text(&self) {
        let Some(share_text_elem) =
            self.context.document.get_element_by_id(SHARE_TEXT_ID)
            .and_then(|c| c.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        else {
            console::log_1(&"Error getting share text element".into());
            return;
        };

        share_text_elem.select();

        let copy_result = self.context.document.exec_command("copy");

        let _ = share_text_elem.set_selection_range(0, 0);

        if copy_result.is_err() {
            console::log_1(&"copy command failed".into());
        } else {
            set_element_visibility(
                &self.context.document,
                SHARE_TEXT_COPIED_ID,
                true,
            );
        }
    }
}

fn today() -> Option<GameDate> {
    let now = js_sys::Date::new_0();

    GameDate::from_ymd(
        now.get_utc_full_year() as i32,
        now.get_utc_month() + 1,
        now.get_utc_date(),
    )
}

fn set_element_visibility(
    document: &web_sys::HtmlDocument,
    id: &str,
    visibility: bool,
) {
    if let Some(elem) = document.get_element_by_id(id)
        .and_then(|c| c.dyn_into::<web_sys::HtmlElement>().ok())
    {
        let _ = elem.style().set_property(
            "display",
            if visibility { "block" } else { "none" },
        );
    }
}

fn clear_element(element: &web_sys::Element) {
    while let Some(child) = element.first_child() {
        let _ = element.remove_child(&child);
    }
}

fn set_element_text(element: &web_sys::Element, text: &str) {
    clear_element(element);

    if let Some(document) = element.owner_document() {
        let text = document.create_text_node(text);
        let _ = element.append_with_node_1(&text);
    }
}

fn get_local_storage(context: &Context) -> Option<web_sys::Storage> {
    match context.window.local_storage() {
        Ok(Some(local_storage)) => Some(local_storage),
        Ok(None) => {
            console::log_1(&"Local storage is None".into());
            None
        },
        Err(_) => {
            console::log_1(&"Error getting local storage".into());
            None
        },
    }
}

#[wasm_bindgen]
pub fn init_grupoj() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    init_tracing();

    let context = match Context::new() {
        Ok(c) => c,
        Err(e) => {
            show_error(&e);
            return;
        }
    };

    match Grupoj::new(context, Config::default()) {
        Ok(grupoj) => {
            // Leak the main grupoj object so that it will live as
            // long as the web page
            std::mem::forget(grupoj);
        },
        Err(e) => show_error(&e),
    }
}
