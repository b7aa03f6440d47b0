pub mod canvas;
pub mod components;
pub mod engine;
pub mod state;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use crate::components::app::App;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);

    let config = state::load_config();
    let query = state::load_query();
    engine::initialize(&config.engine);

    leptos::mount::mount_to_body(move || view! { <App config=config.clone() query=query.clone() /> });
}
