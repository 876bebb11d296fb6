use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, KeyboardEvent};

use crate::components::cursor::Cursor;
use crate::config::LandingConfig;
use crate::dom::{listen, Scope, Surface};

/// Full-screen viewer over a fixed list of image URLs.
pub struct Gallery<E> {
    images: Vec<String>,
    cursor: Cursor,
    open: bool,
    modal: E,
    image: E,
    alt_prefix: Option<String>,
}

impl<E: Surface> Gallery<E> {
    pub fn new(images: Vec<String>, modal: E, image: E, alt_prefix: Option<String>) -> Self {
        let cursor = Cursor::new(images.len());
        Self {
            images,
            cursor,
            open: false,
            modal,
            image,
            alt_prefix,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn current(&self) -> usize {
        self.cursor.get()
    }

    /// Opens at `index`. Indices outside the list are ignored.
    pub fn open(&mut self, index: usize) {
        if index >= self.images.len() {
            return;
        }
        self.cursor.show(index as isize);
        self.open = true;
        self.render();
        self.modal.set_class("open", true);
    }

    pub fn close(&mut self) {
        self.open = false;
        self.modal.set_class("open", false);
    }

    pub fn next(&mut self) {
        if self.cursor.next().is_some() {
            self.render();
        }
    }

    pub fn prev(&mut self) {
        if self.cursor.prev().is_some() {
            self.render();
        }
    }

    /// Keyboard shortcuts, honoured only while the modal is open.
    pub fn key(&mut self, key: &str) -> bool {
        if !self.open {
            return false;
        }
        match key {
            "Escape" => self.close(),
            "ArrowRight" => self.next(),
            "ArrowLeft" => self.prev(),
            _ => return false,
        }
        true
    }

    /// Clicks that land on the backdrop itself close the modal; clicks on
    /// its content do not.
    pub fn backdrop_click(&mut self, on_backdrop: bool) {
        if self.open && on_backdrop {
            self.close();
        }
    }

    fn render(&self) {
        let index = self.cursor.get();
        let Some(src) = self.images.get(index) else {
            return;
        };
        self.image.set_attr("src", src);
        if let Some(prefix) = &self.alt_prefix {
            self.image.set_attr("alt", &format!("{} {}", prefix, index + 1));
        }
    }
}

/// Maps each trigger to its position among the triggers that carry an image.
pub fn trigger_slots(sources: &[Option<String>]) -> (Vec<String>, Vec<Option<usize>>) {
    let mut images = Vec::new();
    let slots = sources
        .iter()
        .map(|source| match source.as_deref().filter(|s| !s.is_empty()) {
            Some(src) => {
                images.push(src.to_string());
                Some(images.len() - 1)
            }
            None => None,
        })
        .collect();
    (images, slots)
}

struct GalleryMarkup {
    name: &'static str,
    modal: &'static str,
    image: &'static str,
    close: &'static str,
    next: &'static str,
    prev: &'static str,
    triggers: &'static str,
    source_attr: &'static str,
    with_alt: bool,
}

const PHOTO_MODAL: GalleryMarkup = GalleryMarkup {
    name: "photo",
    modal: "#photoModal",
    image: "#modalImage",
    close: ".modal-close",
    next: ".modal-nav.next",
    prev: ".modal-nav.prev",
    triggers: ".step-card-media",
    source_attr: "data-img",
    with_alt: true,
};

const COLLAGE_MODAL: GalleryMarkup = GalleryMarkup {
    name: "collage",
    modal: "#collageModal",
    image: "#collageModalImg",
    close: ".collage-close",
    next: ".collage-nav.next",
    prev: ".collage-nav.prev",
    triggers: ".step3-collage .collage-item img",
    source_attr: "src",
    with_alt: false,
};

pub fn mount(document: &Document, config: &LandingConfig) {
    mount_one(document, &PHOTO_MODAL, config);
    mount_one(document, &COLLAGE_MODAL, config);
}

fn mount_one(document: &Document, markup: &GalleryMarkup, config: &LandingConfig) {
    let (Some(modal), Some(image), Some(close), Some(next), Some(prev)) = (
        document.find(markup.modal),
        document.find(markup.image),
        document.find(markup.close),
        document.find(markup.next),
        document.find(markup.prev),
    ) else {
        debug!("{} gallery markup incomplete, skipping", markup.name);
        return;
    };

    let triggers = document.find_all(markup.triggers);
    let sources: Vec<Option<String>> = triggers
        .iter()
        .map(|el| el.attr(markup.source_attr))
        .collect();
    let (images, slots) = trigger_slots(&sources);
    debug!("{} gallery mounted with {} images", markup.name, images.len());

    let alt_prefix = markup.with_alt.then(|| config.gallery.alt_prefix.clone());
    let gallery = Rc::new(RefCell::new(Gallery::new(images, modal.clone(), image, alt_prefix)));

    for (trigger, slot) in triggers.iter().zip(slots) {
        let Some(slot) = slot else { continue };
        trigger.set_style("cursor", "pointer");
        let gallery = gallery.clone();
        listen(trigger, "click", move |_| gallery.borrow_mut().open(slot));
    }

    {
        let gallery = gallery.clone();
        listen(&close, "click", move |_| gallery.borrow_mut().close());
    }
    {
        let gallery = gallery.clone();
        listen(&next, "click", move |_| gallery.borrow_mut().next());
    }
    {
        let gallery = gallery.clone();
        listen(&prev, "click", move |_| gallery.borrow_mut().prev());
    }
    {
        let gallery = gallery.clone();
        let backdrop = modal.clone();
        listen(&modal, "click", move |event| {
            let on_backdrop = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .is_some_and(|target| target == backdrop);
            gallery.borrow_mut().backdrop_click(on_backdrop);
        });
    }
    listen(document, "keydown", move |event| {
        if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
            gallery.borrow_mut().key(&event.key());
        }
    });
}
