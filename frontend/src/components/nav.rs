use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Node, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, Window,
};

use crate::config::LandingConfig;
use crate::dom::{listen, Scope, Surface};

/// Resolves the in-page anchor a scroll link points at.
///
/// `data-scroll` wins over `href`; only fragment targets are honoured.
pub fn scroll_target(data_scroll: Option<String>, href: Option<String>) -> Option<String> {
    data_scroll
        .filter(|target| !target.is_empty())
        .or(href)
        .filter(|target| target.starts_with('#'))
}

pub fn scroll_to(document: &Document, selector: &str) {
    let Some(target) = document.find(selector) else {
        return;
    };
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::Start);
    target.scroll_into_view_with_scroll_into_view_options(&options);
}

/// Mobile navigation toggle.
pub struct BurgerMenu<E> {
    burger: E,
    links: E,
    open: bool,
}

impl<E: Surface> BurgerMenu<E> {
    pub fn new(burger: E, links: E) -> Self {
        Self {
            burger,
            links,
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
        self.render();
    }

    pub fn close(&mut self) {
        self.open = false;
        self.render();
    }

    fn render(&self) {
        self.burger.set_class("active", self.open);
        self.links.set_class("open", self.open);
    }
}

/// Lets at most one scroll update wait for the next animation frame.
#[derive(Debug, Default)]
pub struct FrameThrottle {
    ticking: Cell<bool>,
}

impl FrameThrottle {
    /// `true` when the caller should request a frame.
    pub fn request(&self) -> bool {
        !self.ticking.replace(true)
    }

    pub fn frame_done(&self) {
        self.ticking.set(false);
    }
}

pub struct BackToTop<E> {
    button: E,
    threshold: f64,
}

impl<E: Surface> BackToTop<E> {
    pub fn new(button: E, threshold: f64) -> Self {
        Self { button, threshold }
    }

    pub fn on_scroll(&self, scroll_y: f64) {
        self.button.set_class("visible", scroll_y > self.threshold);
    }
}

pub fn mount(window: &Window, document: &Document, config: &LandingConfig) {
    let menu = match (document.find("#navBurger"), document.find("#navLinks")) {
        (Some(burger), Some(links)) => Some((burger, links)),
        _ => {
            debug!("no burger menu markup");
            None
        }
    };
    let menu_state = menu
        .as_ref()
        .map(|(burger, links)| Rc::new(RefCell::new(BurgerMenu::new(burger.clone(), links.clone()))));

    mount_scroll_links(document, menu_state.clone());

    if let (Some((burger, links)), Some(state)) = (menu, menu_state) {
        {
            let state = state.clone();
            listen(&burger, "click", move |_| state.borrow_mut().toggle());
        }
        listen(document, "click", move |event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) else {
                return;
            };
            if !burger.contains(Some(&target)) && !links.contains(Some(&target)) {
                state.borrow_mut().close();
            }
        });
    }

    mount_back_to_top(window, document, config);
}

fn mount_scroll_links(document: &Document, menu: Option<Rc<RefCell<BurgerMenu<Element>>>>) {
    for link in document.find_all("[data-scroll]") {
        let doc = document.clone();
        let data_scroll = link.attr("data-scroll");
        let href = link.attr("href");
        listen(&link, "click", move |event| {
            event.prevent_default();
            if let Some(target) = scroll_target(data_scroll.clone(), href.clone()) {
                scroll_to(&doc, &target);
            }
        });
    }

    for link in document.find_all("a.nav-link") {
        let Some(href) = link.attr("href").filter(|href| href.starts_with('#')) else {
            continue;
        };
        let doc = document.clone();
        let menu = menu.clone();
        listen(&link, "click", move |event| {
            event.prevent_default();
            scroll_to(&doc, &href);
            if let Some(menu) = &menu {
                menu.borrow_mut().close();
            }
        });
    }
}

fn mount_back_to_top(window: &Window, document: &Document, config: &LandingConfig) {
    let button = document.find("#backToTop");
    let back_to_top = button
        .clone()
        .map(|button| Rc::new(BackToTop::new(button, config.back_to_top.threshold_px)));
    let throttle = Rc::new(FrameThrottle::default());

    let scroll_window = window.clone();
    listen(window, "scroll", move |_| {
        if !throttle.request() {
            return;
        }
        let throttle_frame = throttle.clone();
        let back_to_top = back_to_top.clone();
        let frame_window = scroll_window.clone();
        let frame = Closure::once_into_js(move || {
            if let Some(back_to_top) = &back_to_top {
                back_to_top.on_scroll(frame_window.scroll_y().unwrap_or(0.0));
            }
            throttle_frame.frame_done();
        });
        if scroll_window.request_animation_frame(frame.unchecked_ref()).is_err() {
            throttle.frame_done();
        }
    });

    if let Some(button) = button {
        let doc = document.clone();
        let target = config.back_to_top.target.clone();
        listen(&button, "click", move |_| scroll_to(&doc, &target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::mock::MockElement;

    #[test]
    fn data_scroll_beats_href() {
        assert_eq!(
            scroll_target(Some("#steps".into()), Some("#hero".into())).as_deref(),
            Some("#steps")
        );
        assert_eq!(
            scroll_target(Some(String::new()), Some("#hero".into())).as_deref(),
            Some("#hero")
        );
    }

    #[test]
    fn only_fragments_scroll() {
        assert_eq!(scroll_target(Some("/pricing".into()), None), None);
        assert_eq!(scroll_target(None, Some("https://example.com".into())), None);
        assert_eq!(scroll_target(None, None), None);
    }

    #[test]
    fn burger_toggles_both_parts() {
        let burger = MockElement::new();
        let links = MockElement::new();
        let mut menu = BurgerMenu::new(burger.clone(), links.clone());

        menu.toggle();
        assert!(menu.is_open());
        assert!(burger.has_class("active"));
        assert!(links.has_class("open"));

        menu.toggle();
        assert!(!burger.has_class("active"));

        menu.toggle();
        menu.close();
        assert!(!menu.is_open());
        assert!(!links.has_class("open"));
    }

    #[test]
    fn back_to_top_appears_past_threshold() {
        let button = MockElement::new();
        let back_to_top = BackToTop::new(button.clone(), 400.0);
        back_to_top.on_scroll(400.0);
        assert!(!button.has_class("visible"));
        back_to_top.on_scroll(401.0);
        assert!(button.has_class("visible"));
        back_to_top.on_scroll(10.0);
        assert!(!button.has_class("visible"));
    }

    #[test]
    fn throttle_allows_one_pending_frame() {
        let throttle = FrameThrottle::default();
        assert!(throttle.request());
        assert!(!throttle.request());
        throttle.frame_done();
        assert!(throttle.request());
    }
}
