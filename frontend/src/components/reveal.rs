use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use web_sys::{Document, Window};

use crate::config::LandingConfig;
use crate::dom::{self, EntryHandler, ObserveOptions, Scope, Surface};

pub const VISIBLE_CLASS: &str = "visible";

/// Elements that fade in the first time they scroll into view and then stay.
pub struct RevealSet<E> {
    items: Vec<E>,
    revealed: Vec<bool>,
}

impl<E: Surface> RevealSet<E> {
    pub fn new(items: Vec<E>) -> Self {
        let revealed = vec![false; items.len()];
        Self { items, revealed }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.get(index).copied().unwrap_or(false)
    }

    /// Returns `true` once the element has latched and needs no more reports.
    pub fn intersect(&mut self, index: usize, intersecting: bool) -> bool {
        let (Some(item), Some(latched)) = (self.items.get(index), self.revealed.get_mut(index))
        else {
            return false;
        };
        if intersecting && !*latched {
            item.set_class(VISIBLE_CLASS, true);
            *latched = true;
        }
        *latched
    }

    pub fn reveal_all(&mut self) {
        for (item, latched) in self.items.iter().zip(self.revealed.iter_mut()) {
            item.set_class(VISIBLE_CLASS, true);
            *latched = true;
        }
    }
}

/// Moves `data-src` into `src` the first time an image is needed.
pub fn promote_lazy_image(image: &impl Surface) {
    let Some(pending) = image.attr("data-src") else {
        return;
    };
    let has_src = image.attr("src").is_some_and(|src| !src.is_empty());
    if !has_src {
        image.set_attr("src", &pending);
        image.remove_attr("data-src");
    }
}

/// Hooks `set` up to an observer. `observe` reports whether observation
/// started; when it did not, every element is revealed at once.
pub fn watch_reveals<E: Surface + 'static>(
    set: Rc<RefCell<RevealSet<E>>>,
    observe: impl FnOnce(EntryHandler) -> bool,
) {
    let observed = set.clone();
    let started = observe(Box::new(move |index, intersecting| {
        observed.borrow_mut().intersect(index, intersecting)
    }));
    if !started {
        warn!("no intersection observer, revealing {} elements", set.borrow().len());
        set.borrow_mut().reveal_all();
    }
}

/// Same contract as [`watch_reveals`] for `data-src` images: without an
/// observer they are all loaded straight away.
pub fn watch_lazy_images<E: Surface + 'static>(
    images: Vec<E>,
    observe: impl FnOnce(EntryHandler) -> bool,
) {
    let images = Rc::new(images);
    let observed = images.clone();
    let started = observe(Box::new(move |index, intersecting| {
        if !intersecting {
            return false;
        }
        if let Some(image) = observed.get(index) {
            promote_lazy_image(image);
        }
        true
    }));
    if !started {
        warn!("no intersection observer, loading {} images now", images.len());
        images.iter().for_each(promote_lazy_image);
    }
}

pub fn mount(window: &Window, document: &Document, config: &LandingConfig) {
    mount_reveal(window, document, config);
    mount_lazy_images(window, document);
}

fn mount_reveal(window: &Window, document: &Document, config: &LandingConfig) {
    let elements = document.find_all(".reveal");
    if elements.is_empty() {
        return;
    }
    let set = Rc::new(RefCell::new(RevealSet::new(elements.clone())));
    let supported = dom::supports_intersection_observer(window);
    let options = ObserveOptions {
        threshold: Some(config.reveal.threshold),
        root_margin: Some(config.reveal.root_margin.clone()),
    };
    watch_reveals(set, |on_entry| {
        supported && dom::observe(&elements, &options, on_entry).is_some()
    });
}

fn mount_lazy_images(window: &Window, document: &Document) {
    let images = document.find_all("img[data-src]");
    if images.is_empty() {
        return;
    }
    let supported = dom::supports_intersection_observer(window);
    let targets = images.clone();
    watch_lazy_images(images, |on_entry| {
        supported && dom::observe(&targets, &ObserveOptions::default(), on_entry).is_some()
    });
}
