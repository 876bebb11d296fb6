use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    js_sys, AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, Window,
};

/// The slice of an element a widget is allowed to write to.
///
/// Controllers only ever talk to markup through this trait, so they can be
/// driven against [`mock::MockElement`] in tests.
pub trait Surface {
    fn set_class(&self, class: &str, on: bool);
    fn has_class(&self, class: &str) -> bool;
    fn set_text(&self, text: &str);
    fn attr(&self, name: &str) -> Option<String>;
    fn set_attr(&self, name: &str, value: &str);
    fn remove_attr(&self, name: &str);
    fn set_style(&self, property: &str, value: &str);
    fn value(&self) -> String;
    fn set_value(&self, value: &str);
}

impl<T: Surface + ?Sized> Surface for Rc<T> {
    fn set_class(&self, class: &str, on: bool) {
        (**self).set_class(class, on)
    }
    fn has_class(&self, class: &str) -> bool {
        (**self).has_class(class)
    }
    fn set_text(&self, text: &str) {
        (**self).set_text(text)
    }
    fn attr(&self, name: &str) -> Option<String> {
        (**self).attr(name)
    }
    fn set_attr(&self, name: &str, value: &str) {
        (**self).set_attr(name, value)
    }
    fn remove_attr(&self, name: &str) {
        (**self).remove_attr(name)
    }
    fn set_style(&self, property: &str, value: &str) {
        (**self).set_style(property, value)
    }
    fn value(&self) -> String {
        (**self).value()
    }
    fn set_value(&self, value: &str) {
        (**self).set_value(value)
    }
}

impl Surface for Element {
    fn set_class(&self, class: &str, on: bool) {
        let _ = self.class_list().toggle_with_force(class, on);
    }

    fn has_class(&self, class: &str) -> bool {
        self.class_list().contains(class)
    }

    fn set_text(&self, text: &str) {
        self.set_text_content(Some(text));
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }

    fn set_attr(&self, name: &str, value: &str) {
        let _ = self.set_attribute(name, value);
    }

    fn remove_attr(&self, name: &str) {
        let _ = self.remove_attribute(name);
    }

    fn set_style(&self, property: &str, value: &str) {
        if let Some(el) = self.dyn_ref::<HtmlElement>() {
            let _ = el.style().set_property(property, value);
        }
    }

    // Only inputs carry a live value; anything else reads as empty.
    fn value(&self) -> String {
        self.dyn_ref::<HtmlInputElement>()
            .map(|input| input.value())
            .unwrap_or_default()
    }

    fn set_value(&self, value: &str) {
        if let Some(input) = self.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        }
    }
}

/// Anything selectors can be run against: the document or a widget root.
pub trait Scope {
    fn find(&self, selector: &str) -> Option<Element>;
    fn find_all(&self, selector: &str) -> Vec<Element>;
}

fn collect(list: Result<web_sys::NodeList, JsValue>) -> Vec<Element> {
    let Ok(list) = list else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl Scope for Document {
    fn find(&self, selector: &str) -> Option<Element> {
        self.query_selector(selector).ok().flatten()
    }
    fn find_all(&self, selector: &str) -> Vec<Element> {
        collect(self.query_selector_all(selector))
    }
}

impl Scope for Element {
    fn find(&self, selector: &str) -> Option<Element> {
        self.query_selector(selector).ok().flatten()
    }
    fn find_all(&self, selector: &str) -> Vec<Element> {
        collect(self.query_selector_all(selector))
    }
}

pub fn window_and_document() -> Option<(Window, Document)> {
    let window = web_sys::window()?;
    let document = window.document()?;
    Some((window, document))
}

/// Attaches `handler` for the lifetime of the page.
pub fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    if target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .is_ok()
    {
        closure.forget();
    }
}

/// Attaches `handler` for the next `event` only. The browser drops the
/// listener after it fires and the closure is freed with it.
pub fn listen_once(target: &EventTarget, event: &str, handler: impl FnOnce(Event) + 'static) {
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    let callback = Closure::once_into_js(handler);
    let _ = target.add_event_listener_with_callback_and_add_event_listener_options(
        event,
        callback.unchecked_ref(),
        &options,
    );
}

/// Event sources that can run a handler on the next occurrence only.
pub trait OnceTarget {
    fn once(&self, event: &str, handler: Box<dyn FnOnce()>);
}

impl OnceTarget for Element {
    fn once(&self, event: &str, handler: Box<dyn FnOnce()>) {
        listen_once(self, event, move |_| handler());
    }
}

impl<T: OnceTarget + ?Sized> OnceTarget for Rc<T> {
    fn once(&self, event: &str, handler: Box<dyn FnOnce()>) {
        (**self).once(event, handler)
    }
}

/// Runs `f` once the document has been parsed.
pub fn on_ready(document: &Document, f: impl FnOnce() + 'static) {
    if document.ready_state() == "loading" {
        listen_once(document, "DOMContentLoaded", move |_| f());
    } else {
        f();
    }
}

pub fn supports_intersection_observer(window: &Window) -> bool {
    js_sys::Reflect::has(window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false)
}

pub fn prefers_reduced_motion(window: &Window) -> bool {
    window
        .match_media("(prefers-reduced-motion: reduce)")
        .ok()
        .flatten()
        .map(|query| query.matches())
        .unwrap_or(false)
}

/// Options for [`observe`]. `threshold` is the visible fraction that counts
/// as intersecting.
#[derive(Debug, Clone, Default)]
pub struct ObserveOptions {
    pub threshold: Option<f64>,
    pub root_margin: Option<String>,
}

/// Intersection callback as handed to [`observe`]: `(index, is_intersecting)`,
/// returning `true` to stop watching that target.
pub type EntryHandler = Box<dyn FnMut(usize, bool) -> bool>;

/// Observes `targets` and calls `on_entry(index, is_intersecting)` for every
/// reported entry. When the callback returns `true` the target is unobserved.
///
/// Returns `None` when the browser has no IntersectionObserver or refuses
/// to build one.
pub fn observe(
    targets: &[Element],
    options: &ObserveOptions,
    mut on_entry: impl FnMut(usize, bool) -> bool + 'static,
) -> Option<IntersectionObserver> {
    let window = web_sys::window()?;
    if !supports_intersection_observer(&window) {
        return None;
    }

    let watched: Vec<Element> = targets.to_vec();
    let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
        move |entries: js_sys::Array, observer: IntersectionObserver| {
            for entry in entries.iter() {
                let entry: IntersectionObserverEntry = entry.unchecked_into();
                let target = entry.target();
                let Some(index) = watched.iter().position(|el| *el == target) else {
                    continue;
                };
                if on_entry(index, entry.is_intersecting()) {
                    observer.unobserve(&target);
                }
            }
        },
    );

    let init = IntersectionObserverInit::new();
    if let Some(threshold) = options.threshold {
        init.set_threshold(&JsValue::from_f64(threshold));
    }
    if let Some(margin) = &options.root_margin {
        init.set_root_margin(margin);
    }

    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init).ok()?;
    callback.forget();
    for target in targets {
        observer.observe(target);
    }
    Some(observer)
}

#[cfg(test)]
pub mod mock {
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};
    use std::fmt;
    use std::rc::Rc;

    use super::{OnceTarget, Surface};

    #[derive(Default)]
    struct Listeners(RefCell<Vec<(String, Box<dyn FnOnce()>)>>);

    impl fmt::Debug for Listeners {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{} listeners", self.0.borrow().len())
        }
    }

    /// In-memory element used to drive controllers in tests.
    #[derive(Debug, Default)]
    pub struct MockElement {
        classes: RefCell<BTreeSet<String>>,
        text: RefCell<String>,
        attrs: RefCell<BTreeMap<String, String>>,
        style: RefCell<BTreeMap<String, String>>,
        value: RefCell<String>,
        listeners: Listeners,
    }

    impl MockElement {
        pub fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        pub fn with_attr(name: &str, value: &str) -> Rc<Self> {
            let el = Self::default();
            el.attrs.borrow_mut().insert(name.into(), value.into());
            Rc::new(el)
        }

        pub fn many(n: usize) -> Vec<Rc<Self>> {
            (0..n).map(|_| Self::new()).collect()
        }

        pub fn text(&self) -> String {
            self.text.borrow().clone()
        }

        pub fn style(&self, property: &str) -> Option<String> {
            self.style.borrow().get(property).cloned()
        }

        pub fn listener_count(&self) -> usize {
            self.listeners.0.borrow().len()
        }

        /// Dispatches `event`, running and discarding its one-shot handlers.
        pub fn fire(&self, event: &str) {
            let fired: Vec<_> = {
                let mut listeners = self.listeners.0.borrow_mut();
                let (fired, kept) = listeners.drain(..).partition(|(name, _)| name == event);
                *listeners = kept;
                fired
            };
            for (_, handler) in fired {
                handler();
            }
        }
    }

    impl OnceTarget for MockElement {
        fn once(&self, event: &str, handler: Box<dyn FnOnce()>) {
            self.listeners.0.borrow_mut().push((event.to_string(), handler));
        }
    }

    impl Surface for MockElement {
        fn set_class(&self, class: &str, on: bool) {
            let mut classes = self.classes.borrow_mut();
            if on {
                classes.insert(class.to_string());
            } else {
                classes.remove(class);
            }
        }
        fn has_class(&self, class: &str) -> bool {
            self.classes.borrow().contains(class)
        }
        fn set_text(&self, text: &str) {
            *self.text.borrow_mut() = text.to_string();
        }
        fn attr(&self, name: &str) -> Option<String> {
            self.attrs.borrow().get(name).cloned()
        }
        fn set_attr(&self, name: &str, value: &str) {
            self.attrs.borrow_mut().insert(name.into(), value.into());
        }
        fn remove_attr(&self, name: &str) {
            self.attrs.borrow_mut().remove(name);
        }
        fn set_style(&self, property: &str, value: &str) {
            self.style.borrow_mut().insert(property.into(), value.into());
        }
        fn value(&self) -> String {
            self.value.borrow().clone()
        }
        fn set_value(&self, value: &str) {
            *self.value.borrow_mut() = value.to_string();
        }
    }

    /// Indices of the elements carrying `class`.
    pub fn marked(elements: &[Rc<MockElement>], class: &str) -> Vec<usize> {
        elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.has_class(class))
            .map(|(i, _)| i)
            .collect()
    }
}
