//! WASM bindings for in-browser truncation of HTML strings.
//!
//! This module exposes [`crate::truncate_html`] to JavaScript via wasm-bindgen.
//! Heights are estimated with [`TextLayout`]; pages that can measure real
//! layout should drive [`crate::truncate`] with their own [`crate::Layout`].

use wasm_bindgen::prelude::*;

use crate::layout::TextLayout;
use crate::truncate::{Options, OptionsFile};

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Truncate every element of `html` matching `selector`.
///
/// `options_json` uses the config file format; pass an empty string for
/// the defaults. Returns the serialized document.
#[wasm_bindgen]
pub fn truncate_html(html: &str, selector: &str, options_json: &str) -> Result<String, JsValue> {
    let options = if options_json.trim().is_empty() {
        Options::default()
    } else {
        OptionsFile::from_json(options_json)
            .and_then(OptionsFile::into_options)
            .map_err(to_js)?
    };

    crate::truncate_html(html, selector, &options, &TextLayout::default()).map_err(to_js)
}
