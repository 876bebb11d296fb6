use std::rc::Rc;

use gloo_timers::callback::Timeout;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, MouseEvent};

use crate::config::{CandyRainConfig, HeadlineConfig, LandingConfig};
use crate::dom::{listen, OnceTarget, Scope, Surface};

const NBSP: &str = "\u{00A0}";

/// One falling glyph of the opening candy rain.
#[derive(Debug, Clone, PartialEq)]
pub struct CandyDrop {
    pub glyph: String,
    pub left_vw: f64,
    pub delay_s: f64,
    pub duration_s: f64,
}

impl CandyDrop {
    pub fn sample(rng: &mut impl Rng, glyphs: &[String]) -> Self {
        Self {
            glyph: glyphs.choose(rng).cloned().unwrap_or_default(),
            delay_s: rng.gen_range(0.0..0.8),
            duration_s: 1.8 + rng.gen_range(0.0..1.2),
            left_vw: rng.gen_range(0.0..100.0),
        }
    }

    pub fn apply(&self, el: &impl Surface) {
        el.set_class("candy", true);
        el.set_text(&self.glyph);
        el.set_style("left", &format!("{}vw", self.left_vw));
        el.set_style("animation-delay", &format!("{}s", self.delay_s));
        el.set_style("animation-duration", &format!("{}s", self.duration_s));
    }
}

/// One glyph thrown out of a clicked collage tile.
#[derive(Debug, Clone, PartialEq)]
pub struct CandyBurst {
    pub glyph: String,
    pub dx: f64,
    pub dy: f64,
    pub rot_deg: f64,
    pub left: f64,
    pub top: f64,
    pub delay_s: f64,
    pub duration_s: f64,
}

impl CandyBurst {
    pub fn sample(rng: &mut impl Rng, glyphs: &[String], x: f64, y: f64) -> Self {
        Self {
            glyph: glyphs.choose(rng).cloned().unwrap_or_default(),
            dx: rng.gen_range(-120.0..120.0),
            dy: rng.gen_range(80.0..200.0),
            rot_deg: rng.gen_range(-360.0..360.0),
            left: x + rng.gen_range(-10.0..10.0),
            top: y + rng.gen_range(-10.0..10.0),
            delay_s: rng.gen_range(0.0..0.15),
            duration_s: rng.gen_range(0.9..1.8),
        }
    }

    pub fn apply(&self, el: &impl Surface) {
        el.set_class("candy-fall", true);
        el.set_text(&self.glyph);
        el.set_style("--dx", &format!("{}px", self.dx));
        el.set_style("--dy", &format!("{}px", self.dy));
        el.set_style("--rot", &format!("{}deg", self.rot_deg));
        el.set_style("left", &format!("{}px", self.left));
        el.set_style("top", &format!("{}px", self.top));
        el.set_style("animation-delay", &format!("{}s", self.delay_s));
        el.set_style("animation-duration", &format!("{}s", self.duration_s));
    }
}

pub fn burst_size(rng: &mut impl Rng) -> usize {
    rng.gen_range(20..32)
}

/// Splits headline text into per-glyph spans and their reveal delays.
pub fn headline_glyphs(text: &str, step_ms: u32) -> Vec<(String, u32)> {
    text.chars()
        .enumerate()
        .map(|(i, ch)| {
            let glyph = if ch == ' ' { NBSP.to_string() } else { ch.to_string() };
            (glyph, step_ms.saturating_mul(i as u32))
        })
        .collect()
}

pub fn background_image(url: &str) -> String {
    format!("url(\"{}\")", url.replace('"', "%22"))
}

pub fn mount(document: &Document, config: &LandingConfig) {
    mount_step_backgrounds(document);
    start_candy_rain(document, &config.candy_rain, config.headline.clone());
    mount_collage_burst(document, &config.candy_rain.glyphs);
}

fn mount_step_backgrounds(document: &Document) {
    for el in document.find_all(".step-card-media") {
        if let Some(url) = el.attr("data-img").filter(|url| !url.is_empty()) {
            el.set_style("background-image", &background_image(&url));
        }
    }
}

fn start_candy_rain(document: &Document, rain: &CandyRainConfig, headline: HeadlineConfig) {
    let Some(container) = document.get_element_by_id("candyRain") else {
        start_headline(document, &headline);
        return;
    };

    let mut rng = rand::thread_rng();
    for _ in 0..rain.count {
        let Ok(span) = document.create_element("span") else {
            continue;
        };
        CandyDrop::sample(&mut rng, &rain.glyphs).apply(&span);
        let _ = container.append_child(&span);
    }
    debug!("candy rain started with {} drops", rain.count);

    let document = document.clone();
    let fade_out_ms = rain.fade_out_ms;
    Timeout::new(rain.hide_after_ms, move || {
        container.set_class("candy-rain--hide", true);
        start_headline(&document, &headline);
        Timeout::new(fade_out_ms, move || {
            container.set_style("display", "none");
        })
        .forget();
    })
    .forget();
}

fn start_headline(document: &Document, headline: &HeadlineConfig) {
    let Some(container) = document.get_element_by_id("liveHeadline") else {
        return;
    };
    container.set_inner_html("");

    for (glyph, delay) in headline_glyphs(&headline.text, headline.step_ms) {
        let Ok(span) = document.create_element("span") else {
            continue;
        };
        span.set_text(&glyph);
        let _ = container.append_child(&span);
        Timeout::new(delay, move || span.set_class("visible", true)).forget();
    }
}

fn mount_collage_burst(document: &Document, glyphs: &[String]) {
    let glyphs: Rc<[String]> = glyphs.into();
    for item in document.find_all(".step3-collage .collage-item") {
        item.set_style("position", "relative");
        let document = document.clone();
        let glyphs = glyphs.clone();
        let tile = item.clone();
        listen(&item, "click", move |event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let rect = tile.get_bounding_client_rect();
            let x = f64::from(event.client_x()) - rect.left();
            let y = f64::from(event.client_y()) - rect.top();
            spawn_burst(&document, &tile, &glyphs, x, y);
        });
    }
}

fn spawn_burst(document: &Document, tile: &Element, glyphs: &[String], x: f64, y: f64) {
    let mut rng = rand::thread_rng();
    for _ in 0..burst_size(&mut rng) {
        let Ok(candy) = document.create_element("span") else {
            continue;
        };
        CandyBurst::sample(&mut rng, glyphs, x, y).apply(&candy);
        let _ = tile.append_child(&candy);
        retire_on_animation_end(&candy, Element::remove);
    }
}

/// Hands `particle` to `retire` when its animation ends. The listener is
/// one-shot, so nothing outlives the particle.
pub fn retire_on_animation_end<P: OnceTarget + Clone + 'static>(
    particle: &P,
    retire: impl FnOnce(&P) + 'static,
) {
    let spent = particle.clone();
    particle.once("animationend", Box::new(move || retire(&spent)));
}
