use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlMediaElement};

use crate::dom::{listen, Scope, Surface};

pub const PLAY_ICON: &str = "▶";
pub const PAUSE_ICON: &str = "⏸";
pub const ERROR_ICON: &str = "✕";

/// A playable media resource.
pub trait Playback {
    fn is_paused(&self) -> bool;
    fn play(&self);
    fn pause(&self);
    /// Seconds; not finite until metadata has loaded.
    fn duration(&self) -> f64;
    fn current_time(&self) -> f64;
    fn seek(&self, seconds: f64);
}

impl Playback for HtmlMediaElement {
    fn is_paused(&self) -> bool {
        self.paused()
    }

    fn play(&self) {
        let Ok(promise) = HtmlMediaElement::play(self) else {
            warn!("media refused to start");
            return;
        };
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                warn!("media playback rejected: {:?}", err);
            }
        });
    }

    fn pause(&self) {
        let _ = HtmlMediaElement::pause(self);
    }

    fn duration(&self) -> f64 {
        HtmlMediaElement::duration(self)
    }

    fn current_time(&self) -> f64 {
        HtmlMediaElement::current_time(self)
    }

    fn seek(&self, seconds: f64) {
        self.set_current_time(seconds);
    }
}

fn known_duration(media: &impl Playback) -> Option<f64> {
    let duration = media.duration();
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

pub struct MediaCard<M, E> {
    id: String,
    media: M,
    toggle: E,
    scrubber: E,
    failed: bool,
}

impl<M: Playback, E: Surface> MediaCard<M, E> {
    pub fn new(id: impl Into<String>, media: M, toggle: E, scrubber: E) -> Self {
        Self {
            id: id.into(),
            media,
            toggle,
            scrubber,
            failed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn reset(&self) {
        self.toggle.set_text(PLAY_ICON);
        self.scrubber.set_value("0");
    }
}

/// All media cards on the page. At most one of them plays at a time.
pub struct MediaDeck<M, E> {
    cards: Vec<MediaCard<M, E>>,
    current: Option<usize>,
}

impl<M: Playback, E: Surface> MediaDeck<M, E> {
    pub fn new(cards: Vec<MediaCard<M, E>>) -> Self {
        Self {
            cards,
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Play/pause button. Starting a card pauses and rewinds whichever card
    /// owned playback before it.
    pub fn toggle(&mut self, index: usize) {
        let Some(card) = self.cards.get(index) else {
            return;
        };
        if card.failed {
            return;
        }

        if let Some(owner) = self.current.filter(|owner| *owner != index) {
            if let Some(previous) = self.cards.get(owner) {
                previous.media.pause();
                previous.reset();
            }
        }

        let card = &self.cards[index];
        if card.media.is_paused() {
            card.media.play();
            card.toggle.set_text(PAUSE_ICON);
            self.current = Some(index);
        } else {
            card.media.pause();
            card.toggle.set_text(PLAY_ICON);
        }
    }

    /// The scrubber moved: seek to the matching fraction of the track.
    pub fn scrub(&mut self, index: usize) {
        let Some(card) = self.cards.get(index).filter(|card| !card.failed) else {
            return;
        };
        let Some(duration) = known_duration(&card.media) else {
            return;
        };
        let Ok(percent) = card.scrubber.value().trim().parse::<f64>() else {
            return;
        };
        card.media.seek(duration * percent.clamp(0.0, 100.0) / 100.0);
    }

    /// Periodic progress report from the media element.
    pub fn progress(&mut self, index: usize) {
        let Some(card) = self.cards.get(index).filter(|card| !card.failed) else {
            return;
        };
        let Some(duration) = known_duration(&card.media) else {
            return;
        };
        let percent = card.media.current_time() / duration * 100.0;
        card.scrubber.set_value(&percent.to_string());
    }

    pub fn ended(&mut self, index: usize) {
        let Some(card) = self.cards.get(index) else {
            return;
        };
        card.reset();
        if self.current == Some(index) {
            self.current = None;
        }
    }

    /// Media errors are terminal for the card.
    pub fn failed(&mut self, index: usize) {
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        warn!("media error: {}", card.id);
        card.failed = true;
        card.toggle.set_text(ERROR_ICON);
        card.toggle.set_attr("disabled", "");
        card.scrubber.set_attr("disabled", "");
        if self.current == Some(index) {
            self.current = None;
        }
    }
}

pub fn mount(document: &Document) {
    let mut cards = Vec::new();
    for card in document.find_all(".audio-card") {
        let Some(id) = card.attr("data-audio-id").filter(|id| !id.is_empty()) else {
            continue;
        };
        let Some(media) = document
            .get_element_by_id(&id)
            .and_then(|el| el.dyn_into::<HtmlMediaElement>().ok())
        else {
            debug!("no media element #{id}, skipping card");
            continue;
        };
        let (Some(toggle), Some(scrubber)) = (card.find(".audio-btn"), card.find(".audio-slider"))
        else {
            continue;
        };
        cards.push(MediaCard::new(id, media, toggle, scrubber));
    }
    if cards.is_empty() {
        return;
    }

    let bindings: Vec<(HtmlMediaElement, Element, Element)> = cards
        .iter()
        .map(|card| (card.media.clone(), card.toggle.clone(), card.scrubber.clone()))
        .collect();
    let deck = Rc::new(RefCell::new(MediaDeck::new(cards)));
    debug!("media deck mounted with {} cards", deck.borrow().len());

    for (index, (media, toggle, scrubber)) in bindings.into_iter().enumerate() {
        {
            let deck = deck.clone();
            listen(&toggle, "click", move |event| {
                event.prevent_default();
                deck.borrow_mut().toggle(index);
            });
        }
        {
            let deck = deck.clone();
            listen(&scrubber, "input", move |_| deck.borrow_mut().scrub(index));
        }
        {
            let deck = deck.clone();
            listen(&media, "timeupdate", move |_| deck.borrow_mut().progress(index));
        }
        {
            let deck = deck.clone();
            listen(&media, "ended", move |_| deck.borrow_mut().ended(index));
        }
        let deck = deck.clone();
        listen(&media, "error", move |_| deck.borrow_mut().failed(index));
    }
}
