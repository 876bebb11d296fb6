use log::{info, warn};

mod analytics;
mod config;
mod dom;
mod timer;
mod components {
    pub mod carousel;
    pub mod cursor;
    pub mod decor;
    pub mod gallery;
    pub mod media;
    pub mod nav;
    pub mod reveal;
    pub mod sliders;
}

use config::LandingConfig;

fn mount_page() {
    let Some((window, document)) = dom::window_and_document() else {
        warn!("no window or document, nothing to mount");
        return;
    };
    let config = LandingConfig::from_page(&document);

    components::nav::mount(&window, &document, &config);
    components::reveal::mount(&window, &document, &config);
    components::media::mount(&document);
    components::gallery::mount(&document, &config);
    analytics::schedule(&window, &document, &config.analytics);

    let ready_document = document.clone();
    dom::on_ready(&document, move || {
        components::decor::mount(&ready_document, &config);
        components::sliders::mount(&window, &ready_document, &config);
        info!("Landing page widgets mounted");
    });
}

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(config::log_level()).expect("error initializing log");

    info!("Starting landing page");
    mount_page();
}
