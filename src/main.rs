use clap::Parser;
use iced::keyboard::{self, Key};
use iced::widget::{image, text_input};
use iced::{Element, Subscription, Task, Theme};
use tracing::{error, info, warn};

mod api;
mod config;
mod error;
mod state;
mod ui;

use api::{HttpBackend, ImageAsset};
use config::{Args, Config};
use error::ApiError;
use state::data::DisplayMode;
use state::effect::{self, Completion, Effect};
use state::resolution::Outcome;
use state::session::TaggingSession;
use ui::keyboard::{Modal, Shortcut};
use ui::view::{self, ImageCache};

/// Main application state
struct VinTagger {
    session: TaggingSession,
    backend: HttpBackend,
    /// Decoded image handles, pruned to what the session still shows
    images: ImageCache,
    /// Delete confirmation dialog is open
    confirm_delete: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// A backend exchange or timer finished
    Completed(Completion),
    Select(usize),
    Previous,
    Next,
    InputChanged(String),
    Submit,
    RequestDelete,
    ConfirmDelete,
    DismissDelete,
    SetMode(DisplayMode),
    Resolve(Outcome),
    Reload,
    /// Key press not captured by a focused widget
    KeyPressed(Key),
}

impl VinTagger {
    fn new(config: Config, backend: HttpBackend) -> (Self, Task<Message>) {
        info!("Using backend at {}", backend.base_url());

        let mut session = TaggingSession::new(config.session_settings());
        let effects = session.start();

        let app = VinTagger {
            session,
            backend,
            images: ImageCache::new(),
            confirm_delete: false,
        };
        let task = app.perform(effects);
        (app, task)
    }

    /// Run the session's effects on the iced executor
    fn perform(&self, effects: Vec<Effect>) -> Task<Message> {
        Task::batch(effects.into_iter().map(|effect| {
            Task::perform(effect::run(self.backend.clone(), effect), Message::Completed)
        }))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let before = self.session.current().map(|r| r.id);

        let effects = match message {
            Message::Completed(completion) => {
                if let Completion::ImageLoaded { asset, result } = &completion {
                    self.cache_image(asset, result);
                }
                self.session.handle(completion)
            }
            Message::Select(index) => self.session.select(index),
            Message::Previous => self.session.retreat(),
            Message::Next => self.session.advance(),
            Message::InputChanged(value) => {
                self.session.set_input(&value);
                Vec::new()
            }
            Message::Submit => self.session.submit(),
            Message::RequestDelete => {
                if self.session.accepts_input() && self.session.current().is_some() {
                    self.confirm_delete = true;
                }
                Vec::new()
            }
            Message::ConfirmDelete => {
                if std::mem::take(&mut self.confirm_delete) {
                    self.session.delete_current()
                } else {
                    Vec::new()
                }
            }
            Message::DismissDelete => {
                self.confirm_delete = false;
                Vec::new()
            }
            Message::SetMode(mode) => self.session.set_display_mode(mode),
            Message::Resolve(outcome) => self.session.resolve(outcome),
            Message::Reload => self.session.reload(),
            Message::KeyPressed(key) => return self.on_key(key),
        };

        let session = &self.session;
        self.images.retain(|asset, _| session.wants_image(asset));

        let task = self.perform(effects);
        let moved = self.session.current().map(|r| r.id) != before;
        if moved && self.session.accepts_input() {
            Task::batch([task, text_input::focus(view::vin_input_id())])
        } else {
            task
        }
    }

    fn on_key(&mut self, key: Key) -> Task<Message> {
        let modal = if self.session.challenge().is_some() {
            Modal::Challenge
        } else if self.confirm_delete {
            Modal::ConfirmDelete
        } else {
            Modal::None
        };

        let message = match ui::keyboard::route(&key, modal) {
            Some(Shortcut::Previous) => Message::Previous,
            Some(Shortcut::Next) => Message::Next,
            Some(Shortcut::Submit) => Message::Submit,
            Some(Shortcut::RequestDelete) => Message::RequestDelete,
            Some(Shortcut::ConfirmDelete) => Message::ConfirmDelete,
            Some(Shortcut::DismissDelete) => Message::DismissDelete,
            Some(Shortcut::Mode(mode)) => Message::SetMode(mode),
            Some(Shortcut::Resolve(outcome)) => Message::Resolve(outcome),
            None => return Task::none(),
        };
        self.update(message)
    }

    fn cache_image(&mut self, asset: &ImageAsset, result: &Result<Vec<u8>, ApiError>) {
        match result {
            Ok(bytes) if self.session.wants_image(asset) => {
                self.images
                    .insert(asset.clone(), image::Handle::from_bytes(bytes.clone()));
            }
            Ok(_) => {}
            Err(err) => warn!("Failed to load image {}: {}", asset.filename, err),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        view::screen(&self.session, &self.images, self.confirm_delete)
    }

    fn subscription(&self) -> Subscription<Message> {
        keyboard::on_key_press(|key, _modifiers| Some(Message::KeyPressed(key)))
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vin_tagger=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = Config::resolve(&args).unwrap_or_else(|err| {
        warn!("{}; using defaults", err);
        Config::merge(&args, Default::default())
    });

    let backend = match HttpBackend::new(&config.backend_url, config.request_timeout) {
        Ok(backend) => backend,
        Err(err) => {
            error!("Cannot use backend URL {}: {}", config.backend_url, err);
            std::process::exit(2);
        }
    };

    iced::application("VIN Tagger", VinTagger::update, VinTagger::view)
        .subscription(VinTagger::subscription)
        .theme(VinTagger::theme)
        .centered()
        .run_with(move || VinTagger::new(config, backend))
}
