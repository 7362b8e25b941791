mod app;
mod audio;
mod config;
mod library;
mod mpris;
mod playback;
mod prefs;
mod runtime;
mod session;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
