use gloo_timers::future::TimeoutFuture;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{js_sys, Document, HtmlScriptElement, Node, Window};

use crate::config::{AnalyticsConfig, GtmConfig, MetrikaConfig};
use crate::dom::listen_once;

pub const METRIKA_TAG: &str = "https://mc.yandex.ru/metrika/tag.js";
const GTM_BASE: &str = "https://www.googletagmanager.com/gtm.js";
const METRIKA_GLOBAL: &str = "ym";

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("no window available")]
    NoWindow,
    #[error("no document available")]
    NoDocument,
    #[error("javascript error: {0}")]
    Js(String),
    #[error("could not serialize tag payload: {0}")]
    Serialize(String),
}

impl From<JsValue> for AnalyticsError {
    fn from(value: JsValue) -> Self {
        Self::Js(format!("{:?}", value))
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetrikaOptions {
    pub webvisor: bool,
    pub clickmap: bool,
    pub accurate_track_bounce: bool,
    pub track_links: bool,
}

impl From<&MetrikaConfig> for MetrikaOptions {
    fn from(config: &MetrikaConfig) -> Self {
        Self {
            webvisor: config.webvisor,
            clickmap: config.clickmap,
            accurate_track_bounce: config.accurate_track_bounce,
            track_links: config.track_links,
        }
    }
}

/// First data-layer event GTM expects before its script arrives.
#[derive(Debug, Serialize, PartialEq)]
pub struct GtmStart {
    #[serde(rename = "gtm.start")]
    pub start: i64,
    pub event: &'static str,
}

impl GtmStart {
    pub fn at(start_ms: i64) -> Self {
        Self {
            start: start_ms,
            event: "gtm.js",
        }
    }
}

pub fn gtm_src(container_id: &str, data_layer: &str) -> String {
    let mut src = format!("{}?id={}", GTM_BASE, container_id);
    if data_layer != "dataLayer" {
        src.push_str("&l=");
        src.push_str(data_layer);
    }
    src
}

/// Queues both loaders to run after the window `load` event.
pub fn schedule(window: &Window, document: &Document, config: &AnalyticsConfig) {
    let config = config.clone();
    let start = move || {
        if let Some(metrika) = config.metrika.clone() {
            defer("metrika", metrika.delay_ms, move || load_metrika(&metrika));
        }
        if let Some(gtm) = config.gtm.clone() {
            defer("gtm", gtm.delay_ms, move || load_gtm(&gtm));
        }
    };

    if document.ready_state() == "complete" {
        start();
    } else {
        listen_once(window, "load", move |_| start());
    }
}

fn defer(name: &'static str, delay_ms: u32, load: impl FnOnce() -> Result<(), AnalyticsError> + 'static) {
    wasm_bindgen_futures::spawn_local(async move {
        TimeoutFuture::new(delay_ms).await;
        match load() {
            Ok(()) => info!("{} tag loaded", name),
            Err(err) => warn!("{} tag failed to load: {}", name, err),
        }
    });
}

fn page() -> Result<(Window, Document), AnalyticsError> {
    let window = web_sys::window().ok_or(AnalyticsError::NoWindow)?;
    let document = window.document().ok_or(AnalyticsError::NoDocument)?;
    Ok((window, document))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, AnalyticsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| AnalyticsError::Serialize(err.to_string()))
}

fn script_present(document: &Document, src: &str) -> bool {
    let scripts = document.scripts();
    (0..scripts.length())
        .filter_map(|i| scripts.item(i))
        .filter_map(|el| el.dyn_into::<HtmlScriptElement>().ok())
        .any(|script| script.src() == src)
}

/// Inserts an async script ahead of the first script on the page.
fn inject_script(document: &Document, src: &str) -> Result<(), AnalyticsError> {
    let script: HtmlScriptElement = document
        .create_element("script")?
        .dyn_into()
        .map_err(JsValue::from)?;
    script.set_async(true);
    script.set_src(src);

    let first = document.get_elements_by_tag_name("script").item(0);
    match first.and_then(|first| first.parent_node().map(|parent| (first, parent))) {
        Some((first, parent)) => {
            let anchor: &Node = &first;
            parent.insert_before(&script, Some(anchor))?;
        }
        None => {
            let head = document.head().ok_or(AnalyticsError::NoDocument)?;
            head.append_child(&script)?;
        }
    }
    Ok(())
}

/// Installs the `ym` command queue used until the real tag replaces it.
fn install_metrika_queue(window: &Window) -> Result<js_sys::Function, AnalyticsError> {
    let existing = js_sys::Reflect::get(window, &JsValue::from_str(METRIKA_GLOBAL))?;
    if let Some(function) = existing.dyn_ref::<js_sys::Function>() {
        return Ok(function.clone());
    }

    let queue = js_sys::Function::new_no_args(
        "var ym = window.ym; (ym.a = ym.a || []).push(arguments);",
    );
    js_sys::Reflect::set(&queue, &JsValue::from_str("l"), &JsValue::from_f64(js_sys::Date::now()))?;
    js_sys::Reflect::set(window, &JsValue::from_str(METRIKA_GLOBAL), &queue)?;
    Ok(queue)
}

pub fn load_metrika(config: &MetrikaConfig) -> Result<(), AnalyticsError> {
    let (window, document) = page()?;
    let ym = install_metrika_queue(&window)?;
    if !script_present(&document, METRIKA_TAG) {
        inject_script(&document, METRIKA_TAG)?;
    }

    let options = to_js(&MetrikaOptions::from(config))?;
    ym.call3(
        &JsValue::NULL,
        &JsValue::from_f64(config.counter_id as f64),
        &JsValue::from_str("init"),
        &options,
    )?;
    Ok(())
}

pub fn load_gtm(config: &GtmConfig) -> Result<(), AnalyticsError> {
    let (window, document) = page()?;
    let key = JsValue::from_str(&config.data_layer);
    let mut layer = js_sys::Reflect::get(&window, &key)?;
    if !js_sys::Array::is_array(&layer) {
        layer = js_sys::Array::new().into();
        js_sys::Reflect::set(&window, &key, &layer)?;
    }
    let layer: js_sys::Array = layer.dyn_into()?;

    let start = GtmStart::at(chrono::Utc::now().timestamp_millis());
    layer.push(&to_js(&start)?);
    inject_script(&document, &gtm_src(&config.container_id, &config.data_layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gtm_src_adds_layer_only_when_renamed() {
        assert_eq!(
            gtm_src("GTM-KRVNNK", "dataLayer"),
            "https://www.googletagmanager.com/gtm.js?id=GTM-KRVNNK"
        );
        assert_eq!(
            gtm_src("GTM-KRVNNK", "events"),
            "https://www.googletagmanager.com/gtm.js?id=GTM-KRVNNK&l=events"
        );
    }

    #[test]
    fn metrika_options_use_tag_field_names() {
        let options = MetrikaOptions::from(&MetrikaConfig::default());
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "webvisor": true,
                "clickmap": true,
                "accurateTrackBounce": true,
                "trackLinks": true,
            })
        );
    }

    #[test]
    fn gtm_start_event_shape() {
        let json = serde_json::to_value(GtmStart::at(1_700_000_000_000)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"gtm.start": 1_700_000_000_000i64, "event": "gtm.js"})
        );
    }

    #[test]
    fn js_errors_render_readably() {
        let err = AnalyticsError::Serialize("bad".into());
        assert_eq!(err.to_string(), "could not serialize tag payload: bad");
        assert_eq!(AnalyticsError::NoDocument.to_string(), "no document available");
    }
}
