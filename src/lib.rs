/// Link Tagger - tagged link sharing and webhook registration forms
/// Built with Rust + WASM + Yew

pub mod api;
pub mod config;
pub mod error;
pub mod operations;
pub mod selector;
pub mod service;
pub mod storage;
pub mod tag;
pub mod ui;

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::api::{HttpSubmission, HttpTagDirectory};
use crate::config::FormConfig;
use crate::error::ShareError;
use crate::ui::share_form::{ShareForm, ShareFormProps};

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Mount a form described by a JS config object (see `FormConfig`)
#[wasm_bindgen]
pub fn start_form(config: JsValue) -> Result<(), JsValue> {
    let config = FormConfig::from_js(config).map_err(to_js)?;
    mount(config).map_err(to_js)
}

/// Mount the link sharing form against `api_base_url`
#[wasm_bindgen]
pub fn start_share_form(api_base_url: &str) -> Result<(), JsValue> {
    mount(FormConfig::share_link(api_base_url)).map_err(to_js)
}

/// Mount the webhook registration form against `api_base_url`
#[wasm_bindgen]
pub fn start_webhook_form(api_base_url: &str) -> Result<(), JsValue> {
    mount(FormConfig::webhook(api_base_url)).map_err(to_js)
}

fn to_js(error: ShareError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn mount(config: FormConfig) -> Result<(), ShareError> {
    config.validate()?;

    let props = ShareFormProps {
        directory: Rc::new(HttpTagDirectory::from_config(&config)?),
        submission: Rc::new(HttpSubmission::from_config(&config)?),
        config: Rc::new(config),
    };

    match props.config.mount_id.clone() {
        Some(id) => {
            let root = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(&id))
                .ok_or_else(|| ShareError::Config(format!("no element with id \"{}\"", id)))?;
            yew::Renderer::<ShareForm>::with_root_and_props(root, props).render();
        }
        None => {
            yew::Renderer::<ShareForm>::with_props(props).render();
        }
    }

    log::info!("Form mounted");
    Ok(())
}
