use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::warn;

use crate::components::cursor::Cursor;
use crate::dom::{EntryHandler, Surface};
use crate::timer::{AutoplayTimer, Scheduler};

/// How the active slide is made visible.
pub enum Presentation<E> {
    /// Toggle a class on the active slide and a class on the active dot.
    Classes {
        slide: &'static str,
        dot: &'static str,
    },
    /// Translate a track element so the active slide fills the viewport.
    Track(E),
}

pub struct SlideDeck<E> {
    slides: Vec<E>,
    dots: Vec<E>,
    presentation: Presentation<E>,
    cursor: Cursor,
}

impl<E: Surface> SlideDeck<E> {
    pub fn new(slides: Vec<E>, dots: Vec<E>, presentation: Presentation<E>) -> Self {
        let cursor = Cursor::new(slides.len());
        Self {
            slides,
            dots,
            presentation,
            cursor,
        }
    }

    pub fn len(&self) -> usize {
        self.cursor.len()
    }

    pub fn current(&self) -> usize {
        self.cursor.get()
    }

    pub fn show(&mut self, index: isize) {
        let Some(active) = self.cursor.show(index) else {
            return;
        };
        match &self.presentation {
            Presentation::Classes { slide, dot } => {
                for (i, el) in self.slides.iter().enumerate() {
                    el.set_class(slide, i == active);
                }
                for (i, el) in self.dots.iter().enumerate() {
                    el.set_class(dot, i == active);
                }
            }
            Presentation::Track(track) => {
                track.set_style("transform", &format!("translateX(-{}%)", active * 100));
            }
        }
    }

    pub fn next(&mut self) {
        self.show(self.cursor.get() as isize + 1);
    }

    pub fn prev(&mut self) {
        self.show(self.cursor.get() as isize - 1);
    }
}

/// Decides whether autoplay may run right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplayGate {
    enabled: bool,
    reduced_motion: bool,
    hovered: bool,
    focused: bool,
    visible: bool,
}

impl AutoplayGate {
    /// `visibility_gated` widgets start hidden and wait for an intersection
    /// report before playing.
    pub fn new(enabled: bool, reduced_motion: bool, visibility_gated: bool) -> Self {
        Self {
            enabled,
            reduced_motion,
            hovered: false,
            focused: false,
            visible: !visibility_gated,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, false, false)
    }

    pub fn may_run(&self) -> bool {
        self.enabled && !self.reduced_motion && !self.hovered && !self.focused && self.visible
    }
}

/// Manual navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Prev,
    To(usize),
}

/// A slide deck plus its autoplay timer.
///
/// Every manual [`Step`] reschedules autoplay from the moment of the
/// interaction, so an advance never lands right after a click.
pub struct Carousel<E, S: Scheduler> {
    deck: SlideDeck<E>,
    gate: AutoplayGate,
    timer: AutoplayTimer<S>,
    this: Weak<RefCell<Self>>,
}

impl<E, S> Carousel<E, S>
where
    E: Surface + 'static,
    S: Scheduler + 'static,
    S::Handle: 'static,
{
    pub fn new(deck: SlideDeck<E>, gate: AutoplayGate, timer: AutoplayTimer<S>) -> Rc<RefCell<Self>> {
        let carousel = Rc::new_cyclic(|this| {
            RefCell::new(Self {
                deck,
                gate,
                timer,
                this: this.clone(),
            })
        });
        {
            let mut inner = carousel.borrow_mut();
            inner.deck.show(0);
            inner.sync();
        }
        carousel
    }

    pub fn current(&self) -> usize {
        self.deck.current()
    }

    pub fn len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_running()
    }

    pub fn navigate(&mut self, step: Step) {
        match step {
            Step::Next => self.deck.next(),
            Step::Prev => self.deck.prev(),
            Step::To(index) => self.deck.show(index as isize),
        }
        if self.gate.may_run() {
            self.restart();
        } else {
            self.timer.stop();
        }
    }

    pub fn pointer_enter(&mut self) {
        self.gate.hovered = true;
        self.sync();
    }

    pub fn pointer_leave(&mut self) {
        self.gate.hovered = false;
        self.sync();
    }

    pub fn focus_in(&mut self) {
        self.gate.focused = true;
        self.sync();
    }

    pub fn focus_out(&mut self) {
        self.gate.focused = false;
        self.sync();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.gate.visible = visible;
        self.sync();
    }

    fn sync(&mut self) {
        if !self.gate.may_run() {
            self.timer.stop();
        } else if !self.timer.is_running() {
            self.restart();
        }
    }

    fn restart(&mut self) {
        // Empty decks have nothing to rotate.
        if self.deck.len() < 2 {
            self.timer.stop();
            return;
        }
        let this = self.this.clone();
        self.timer.restart(Box::new(move || {
            if let Some(carousel) = this.upgrade() {
                carousel.borrow_mut().deck.next();
            }
        }));
    }
}

/// Feeds visibility reports from `observe` into `carousel`. If no observer
/// could be started the carousel is treated as permanently visible, so a
/// visibility-gated widget still plays.
pub fn watch_visibility<E, S>(
    carousel: &Rc<RefCell<Carousel<E, S>>>,
    observe: impl FnOnce(EntryHandler) -> bool,
) where
    E: Surface + 'static,
    S: Scheduler + 'static,
    S::Handle: 'static,
{
    let observed = carousel.clone();
    let started = observe(Box::new(move |_, visible| {
        observed.borrow_mut().set_visible(visible);
        false
    }));
    if !started {
        warn!("no intersection observer, autoplaying without visibility gating");
        carousel.borrow_mut().set_visible(true);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::dom::mock::{marked, MockElement};
    use crate::timer::manual::ManualScheduler;

    type TestCarousel = Rc<RefCell<Carousel<Rc<MockElement>, ManualScheduler>>>;

    fn stage(
        n: usize,
        period: u32,
        gate: AutoplayGate,
    ) -> (TestCarousel, Vec<Rc<MockElement>>, Vec<Rc<MockElement>>, ManualScheduler) {
        let slides = MockElement::many(n);
        let dots = MockElement::many(n);
        let clock = ManualScheduler::default();
        let deck = SlideDeck::new(
            slides.clone(),
            dots.clone(),
            Presentation::Classes {
                slide: "is-active",
                dot: "is-on",
            },
        );
        let carousel = Carousel::new(deck, gate, AutoplayTimer::new(clock.clone(), period));
        (carousel, slides, dots, clock)
    }

    fn autoplaying() -> AutoplayGate {
        AutoplayGate::new(true, false, false)
    }

    #[test]
    fn exactly_one_slide_and_dot_active() {
        let (carousel, slides, dots, _) = stage(4, 1000, AutoplayGate::disabled());
        assert_eq!(marked(&slides, "is-active"), vec![0]);

        for step in [Step::Prev, Step::Prev, Step::To(1), Step::Next, Step::To(9)] {
            carousel.borrow_mut().navigate(step);
            let active = carousel.borrow().current();
            assert_eq!(marked(&slides, "is-active"), vec![active]);
            assert_eq!(marked(&dots, "is-on"), vec![active]);
        }
        assert_eq!(carousel.borrow().current(), 1);
    }

    #[test]
    fn click_reschedules_next_advance() {
        let (carousel, slides, _, clock) = stage(5, 6000, autoplaying());

        clock.advance_to(1000);
        carousel.borrow_mut().navigate(Step::Next);
        assert_eq!(carousel.borrow().current(), 1);
        assert_eq!(clock.next_due(), Some(7000));

        clock.advance_to(6999);
        assert_eq!(carousel.borrow().current(), 1);
        clock.advance_to(7000);
        assert_eq!(carousel.borrow().current(), 2);
        assert_eq!(marked(&slides, "is-active"), vec![2]);
    }

    #[test]
    fn autoplay_wraps_around() {
        let (carousel, _, _, clock) = stage(3, 100, autoplaying());
        clock.advance_to(300);
        assert_eq!(carousel.borrow().current(), 0);
        clock.advance_to(400);
        assert_eq!(carousel.borrow().current(), 1);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn hover_pauses_until_leave() {
        let (carousel, _, _, clock) = stage(3, 1000, autoplaying());
        clock.advance_to(500);
        carousel.borrow_mut().pointer_enter();
        assert!(!carousel.borrow().is_playing());

        clock.advance_to(5000);
        assert_eq!(carousel.borrow().current(), 0);

        carousel.borrow_mut().pointer_leave();
        assert_eq!(clock.next_due(), Some(6000));
        clock.advance_to(6000);
        assert_eq!(carousel.borrow().current(), 1);
    }

    #[test]
    fn focus_and_hover_both_hold_the_pause() {
        let (carousel, _, _, _) = stage(3, 1000, autoplaying());
        carousel.borrow_mut().pointer_enter();
        carousel.borrow_mut().focus_in();
        carousel.borrow_mut().pointer_leave();
        assert!(!carousel.borrow().is_playing());
        carousel.borrow_mut().focus_out();
        assert!(carousel.borrow().is_playing());
    }

    #[test]
    fn manual_step_while_hovered_does_not_arm() {
        let (carousel, _, _, clock) = stage(3, 1000, autoplaying());
        carousel.borrow_mut().pointer_enter();
        carousel.borrow_mut().navigate(Step::Next);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn visibility_gates_autoplay() {
        let (carousel, _, _, clock) = stage(3, 1000, AutoplayGate::new(true, false, true));
        assert!(!carousel.borrow().is_playing());

        clock.advance_to(2000);
        carousel.borrow_mut().set_visible(true);
        assert_eq!(clock.next_due(), Some(3000));

        carousel.borrow_mut().set_visible(false);
        clock.advance_to(10_000);
        assert_eq!(carousel.borrow().current(), 0);
    }

    #[test]
    fn observer_reports_drive_visibility() {
        let (carousel, _, _, clock) = stage(3, 1000, AutoplayGate::new(true, false, true));
        let mut handler = None;
        watch_visibility(&carousel, |on_entry| {
            handler = Some(on_entry);
            true
        });
        assert!(!carousel.borrow().is_playing());

        let mut on_entry = handler.unwrap();
        assert!(!on_entry(0, true));
        assert!(carousel.borrow().is_playing());
        clock.advance_to(1000);
        assert_eq!(carousel.borrow().current(), 1);

        on_entry(0, false);
        assert!(!carousel.borrow().is_playing());
    }

    #[test]
    fn failed_observer_lets_gated_carousel_play() {
        let (carousel, _, _, clock) = stage(3, 1000, AutoplayGate::new(true, false, true));
        watch_visibility(&carousel, |_| false);
        assert!(carousel.borrow().is_playing());
        clock.advance_to(1000);
        assert_eq!(carousel.borrow().current(), 1);
    }

    #[test]
    fn reduced_motion_suppresses_autoplay() {
        let (carousel, _, _, clock) = stage(3, 1000, AutoplayGate::new(true, true, false));
        carousel.borrow_mut().navigate(Step::Next);
        carousel.borrow_mut().set_visible(true);
        assert_eq!(clock.pending(), 0);
        assert_eq!(carousel.borrow().current(), 1);
    }

    #[test]
    fn track_presentation_translates() {
        let track = MockElement::new();
        let deck = SlideDeck::new(
            MockElement::many(3),
            Vec::new(),
            Presentation::Track(track.clone()),
        );
        let clock = ManualScheduler::default();
        let carousel = Carousel::new(deck, AutoplayGate::disabled(), AutoplayTimer::new(clock, 0));
        carousel.borrow_mut().navigate(Step::Prev);
        assert_eq!(track.style("transform").as_deref(), Some("translateX(-200%)"));
    }

    #[test]
    fn empty_deck_is_inert() {
        let (carousel, _, _, clock) = stage(0, 1000, autoplaying());
        carousel.borrow_mut().navigate(Step::Next);
        assert_eq!(carousel.borrow().current(), 0);
        assert_eq!(clock.pending(), 0);
    }
}
