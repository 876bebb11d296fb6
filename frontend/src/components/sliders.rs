use log::debug;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Window};

use crate::components::carousel::{
    watch_visibility, AutoplayGate, Carousel, Presentation, SlideDeck, Step,
};
use crate::config::LandingConfig;
use crate::dom::{self, listen, ObserveOptions, Scope, Surface};
use crate::timer::{AutoplayTimer, BrowserScheduler};

pub fn mount(window: &Window, document: &Document, config: &LandingConfig) {
    mount_fade_slider(window, document, config);
    mount_projects(window, document, config);
    mount_step_sliders(document);
}

/// `data-target` on a dot, falling back to the first slide like the markup does.
pub fn dot_target(raw: Option<String>) -> usize {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(0)
}

/// `data-interval` on the viewport, in milliseconds.
pub fn interval_from(raw: Option<String>, fallback: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(fallback)
}

/// Autoplay is on unless the markup says `data-autoplay="false"`.
pub fn autoplay_from(raw: Option<String>) -> bool {
    raw.as_deref() != Some("false")
}

fn mount_fade_slider(window: &Window, document: &Document, config: &LandingConfig) {
    let Some(root) = document.find("#fadeSlider") else {
        debug!("no #fadeSlider, skipping fade slider");
        return;
    };
    let slides = root.find_all(".fade-slide");
    let dots = root.find_all(".slider-dot");
    let prev = root.find(".slider-btn[data-dir='prev']");
    let next = root.find(".slider-btn[data-dir='next']");

    let deck = SlideDeck::new(
        slides,
        dots.clone(),
        Presentation::Classes {
            slide: "active",
            dot: "active",
        },
    );
    let gate = AutoplayGate::new(true, dom::prefers_reduced_motion(window), false);
    let timer = AutoplayTimer::new(BrowserScheduler, config.fade_slider.interval());
    let carousel = Carousel::new(deck, gate, timer);
    debug!("fade slider mounted with {} slides", carousel.borrow().len());

    for dot in dots {
        let carousel = carousel.clone();
        let target = dot_target(dot.attr("data-target"));
        listen(&dot, "click", move |_| {
            carousel.borrow_mut().navigate(Step::To(target));
        });
    }
    bind_step_button(prev.as_ref(), &carousel, Step::Prev);
    bind_step_button(next.as_ref(), &carousel, Step::Next);

    {
        let carousel = carousel.clone();
        listen(&root, "mouseenter", move |_| carousel.borrow_mut().pointer_enter());
    }
    listen(&root, "mouseleave", move |_| carousel.borrow_mut().pointer_leave());
}

fn mount_projects(window: &Window, document: &Document, config: &LandingConfig) {
    let Some(viewport) = document.find("#projects .projects-viewport") else {
        debug!("no project viewport, skipping project stage");
        return;
    };
    let Some(stage) = viewport.find(".projects-stage") else {
        return;
    };
    let cards = stage.find_all(".project-card");
    if cards.is_empty() {
        return;
    }
    let Some(dots_wrap) = viewport.find(".pr-dots") else {
        debug!("project stage has no .pr-dots, skipping");
        return;
    };

    dots_wrap.set_inner_html(&"<i></i>".repeat(cards.len()));
    let dots = dots_wrap.find_all("i");

    let interval = interval_from(viewport.attr("data-interval"), config.projects.interval());
    let autoplay = autoplay_from(viewport.attr("data-autoplay"));
    let observes = dom::supports_intersection_observer(window);

    let deck = SlideDeck::new(
        cards,
        dots.clone(),
        Presentation::Classes {
            slide: "is-active",
            dot: "is-on",
        },
    );
    let gate = AutoplayGate::new(autoplay, dom::prefers_reduced_motion(window), observes);
    let carousel = Carousel::new(deck, gate, AutoplayTimer::new(BrowserScheduler, interval));
    debug!(
        "project stage mounted: {} cards, {}ms, autoplay {}",
        carousel.borrow().len(),
        interval,
        autoplay
    );

    bind_step_button(viewport.find(".next").as_ref(), &carousel, Step::Next);
    bind_step_button(viewport.find(".prev").as_ref(), &carousel, Step::Prev);

    {
        let carousel = carousel.clone();
        listen(&dots_wrap, "click", move |event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            if let Some(index) = dots.iter().position(|dot| *dot == target) {
                carousel.borrow_mut().navigate(Step::To(index));
            }
        });
    }

    let handlers: [(&str, fn(&mut Carousel<Element, BrowserScheduler>)); 4] = [
        ("mouseenter", Carousel::pointer_enter),
        ("mouseleave", Carousel::pointer_leave),
        ("focusin", Carousel::focus_in),
        ("focusout", Carousel::focus_out),
    ];
    for (event, handler) in handlers {
        let carousel = carousel.clone();
        listen(&viewport, event, move |_| handler(&mut *carousel.borrow_mut()));
    }

    if observes {
        let options = ObserveOptions {
            threshold: Some(config.projects.visibility_threshold),
            root_margin: None,
        };
        watch_visibility(&carousel, |on_entry| {
            dom::observe(&[viewport], &options, on_entry).is_some()
        });
    }
}

fn mount_step_sliders(document: &Document) {
    for slider in document.find_all(".step3-slider") {
        let Some(track) = slider.find(".step3-slider-track") else {
            continue;
        };
        let slides = slider.find_all(".step3-slide");
        if slides.is_empty() {
            continue;
        }
        let deck = SlideDeck::new(slides, Vec::new(), Presentation::Track(track));
        let carousel = Carousel::new(
            deck,
            AutoplayGate::disabled(),
            AutoplayTimer::new(BrowserScheduler, 0),
        );
        bind_step_button(slider.find(".step3-slider-btn.next").as_ref(), &carousel, Step::Next);
        bind_step_button(slider.find(".step3-slider-btn.prev").as_ref(), &carousel, Step::Prev);
    }
}

fn bind_step_button(
    button: Option<&Element>,
    carousel: &std::rc::Rc<std::cell::RefCell<Carousel<Element, BrowserScheduler>>>,
    step: Step,
) {
    let Some(button) = button else { return };
    let carousel = carousel.clone();
    listen(button, "click", move |_| carousel.borrow_mut().navigate(step));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_targets_default_to_first_slide() {
        assert_eq!(dot_target(Some("2".into())), 2);
        assert_eq!(dot_target(Some(" 1 ".into())), 1);
        assert_eq!(dot_target(Some("two".into())), 0);
        assert_eq!(dot_target(None), 0);
    }

    #[test]
    fn interval_attribute_overrides_default() {
        assert_eq!(interval_from(Some("6000".into()), 5000), 6000);
        assert_eq!(interval_from(Some("0".into()), 5000), 5000);
        assert_eq!(interval_from(Some("soon".into()), 5000), 5000);
        assert_eq!(interval_from(None, 5000), 5000);
    }

    #[test]
    fn only_literal_false_disables_autoplay() {
        assert!(autoplay_from(None));
        assert!(autoplay_from(Some("true".into())));
        assert!(autoplay_from(Some("".into())));
        assert!(!autoplay_from(Some("false".into())));
    }
}
