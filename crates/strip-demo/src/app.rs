//! Main app state

use crate::{
    gallery::{self, Gallery, THUMBNAIL_CAPACITY, THUMBNAIL_EDGE},
    message::Message,
    nav,
};
use cosmic::{
    Action, Application, ApplicationExt, Core, Element, Task,
    cosmic_config::{Config, CosmicConfigEntry},
    iced::{Alignment, Length, Subscription},
    theme,
    widget::{column, container, icon, row, text},
};
use std::{
    path::PathBuf,
    rc::Rc,
    time::{Duration, Instant},
};
use strip_config::{APP_ID, StripConfig};
use strip_core::{ImageGrid, downgrade};
use strip_widgets::image_strip;

const APP_TITLE: &str = "Photostrip";

/// Height of the strip widget
const STRIP_HEIGHT: f32 = 260.0;

/// Thumbnails decoded concurrently
const BATCH_SIZE: usize = 8;

/// A wheel gesture is over once no delta arrived for this long
const WHEEL_SETTLE: Duration = Duration::from_millis(150);

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub struct Photostrip {
    core: Core,
    config: StripConfig,
    config_handler: Option<Config>,
    gallery: Rc<Gallery>,
    grid: ImageGrid,
    dir: Option<PathBuf>,
    is_scanning: bool,
    last_wheel: Option<Instant>,
}

impl Photostrip {
    fn scan(&mut self, path: PathBuf) -> Task<Action<Message>> {
        let dir = nav::get_image_dir(&path);
        let target = path.is_file().then_some(path);
        let include_hidden = self.config.show_hidden_files;
        self.is_scanning = true;

        cosmic::task::future(async move {
            let images = if let Some(dir) = dir.as_ref() {
                nav::scan_dir(dir, include_hidden).await
            } else {
                Vec::new()
            };

            Message::DirectoryScanned {
                dir,
                images,
                target,
            }
        })
    }

    /// Tops the decoder up to [`BATCH_SIZE`] jobs, visible images first
    fn load_thumbnails(&mut self) -> Task<Action<Message>> {
        let limit = BATCH_SIZE.saturating_sub(self.gallery.in_flight());
        if limit == 0 || self.gallery.is_empty() {
            return Task::none();
        }

        let visible = self.grid.visible_indices();
        let tasks: Vec<_> = self
            .gallery
            .claim_pending(&visible, limit)
            .into_iter()
            .map(|(index, path)| {
                cosmic::task::future(async move {
                    match gallery::load_thumbnail(path.clone(), THUMBNAIL_EDGE).await {
                        Ok(image) => Message::ThumbnailReady { index, path, image },
                        Err(e) => Message::ThumbnailFailed {
                            index,
                            path,
                            error: e.to_string(),
                        },
                    }
                })
            })
            .collect();

        Task::batch(tasks)
    }

    fn save_config(&self) {
        if let Some(ref handler) = self.config_handler
            && let Err(e) = self.config.write_entry(handler)
        {
            tracing::warn!("Failed to save config: {e}");
        }
    }

    fn update_title(&mut self) -> Task<Action<Message>> {
        let title = match self
            .gallery
            .selected()
            .and_then(|index| self.gallery.path(index))
        {
            Some(path) => match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => format!("{name} - {APP_TITLE}"),
                None => APP_TITLE.to_string(),
            },
            None => APP_TITLE.to_string(),
        };

        match self.core.main_window_id() {
            Some(id) => self.set_window_title(title, id),
            None => Task::none(),
        }
    }

    fn status_line(&self) -> String {
        if self.is_scanning {
            return "Loading...".to_string();
        }

        let dir = self
            .dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();

        match (self.gallery.len(), self.gallery.in_flight()) {
            (0, _) => format!("No images in {dir}"),
            (count, 0) => format!("{count} images in {dir}"),
            (count, loading) => format!("{count} images in {dir}, loading {loading}"),
        }
    }
}

impl Application for Photostrip {
    type Executor = cosmic::executor::Default;
    type Flags = Option<PathBuf>;
    type Message = Message;

    const APP_ID: &'static str = APP_ID;

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn init(core: Core, flags: Self::Flags) -> (Self, Task<Action<Self::Message>>) {
        let (config, config_handler) = strip_config::load();

        let gallery = Rc::new(Gallery::new(
            config.item_width_fraction(),
            THUMBNAIL_CAPACITY,
        ));
        let mut grid = ImageGrid::with_style(config.to_style());
        grid.configure(Some(downgrade(&gallery)), None);

        let mut app = Self {
            core,
            config,
            config_handler,
            gallery,
            grid,
            dir: None,
            is_scanning: false,
            last_wheel: None,
        };

        let startup_path = if let Some(path) = flags {
            Some(path)
        } else if app.config.remember_last_dir {
            app.config.last_dir.as_ref().map(PathBuf::from)
        } else {
            None
        };

        let startup_path = startup_path.or_else(dirs::picture_dir);

        let mut tasks = vec![app.update_title()];
        match startup_path {
            Some(path) => tasks.push(app.scan(path)),
            None => tracing::warn!("No directory given and no picture directory found"),
        }

        (app, Task::batch(tasks))
    }

    fn view(&self) -> Element<'_, Self::Message> {
        let spacing = theme::active().cosmic().spacing;

        let header = if self.gallery.is_empty() && !self.is_scanning {
            row()
                .push(icon::from_name("folder-pictures-symbolic").size(16))
                .push(text::body(self.status_line()))
                .spacing(spacing.space_xs)
                .align_y(Alignment::Center)
        } else {
            row().push(text::body(self.status_line()))
        };

        // Always laid out, so the grid knows its bounds before the first images arrive
        let strip = image_strip(&self.grid)
            .width(Length::Fill)
            .height(Length::Fixed(STRIP_HEIGHT))
            .on_bounds(Message::Bounds)
            .on_tap(Message::Tap)
            .on_scroll(|dx, dy| Message::Drag { dx, dy })
            .on_scroll_end(|velocity_x| Message::DragEnd { velocity_x })
            .on_wheel(Message::Wheel);

        container(
            column()
                .push(header)
                .push(strip)
                .spacing(spacing.space_s)
                .width(Length::Fill),
        )
        .padding(spacing.space_m)
        .center_y(Length::Fill)
        .width(Length::Fill)
        .into()
    }

    fn update(&mut self, message: Message) -> Task<Action<Self::Message>> {
        let mut tasks = Vec::new();

        match message {
            Message::DirectoryScanned {
                dir,
                images,
                target,
            } => {
                self.is_scanning = false;
                tracing::info!(count = images.len(), "Showing images");

                if self.config.remember_last_dir
                    && let Some(ref dir) = dir
                {
                    self.config.last_dir = Some(dir.display().to_string());
                    self.save_config();
                }
                self.dir = dir;

                self.gallery.set_paths(images);
                let selected = target.and_then(|path| self.gallery.position(&path));
                self.grid
                    .configure(Some(downgrade(&self.gallery)), selected);

                if self.grid.has_deferred() {
                    tasks.push(cosmic::task::future(async { Message::RunDeferred }));
                }
                tasks.push(self.load_thumbnails());
                tasks.push(self.update_title());
            }
            Message::ThumbnailReady { index, path, image } => {
                let visible = self.grid.visible_indices().contains(&index);
                if self.gallery.set_image(index, &path, image) && visible {
                    self.grid
                        .reload_data_with(|| tracing::trace!(index, "Strip refreshed"));
                }
                tasks.push(self.load_thumbnails());
            }
            Message::ThumbnailFailed { index, path, error } => {
                tracing::warn!("Failed to load {}: {error}", path.display());
                self.gallery.mark_failed(index, &path);
                tasks.push(self.load_thumbnails());
            }
            Message::Bounds(bounds) => {
                self.grid.set_bounds(bounds);
                tasks.push(self.load_thumbnails());
            }
            Message::Tap(point) => {
                if self.grid.tap(point).is_some() {
                    tasks.push(self.update_title());
                }
            }
            Message::Drag { dx, dy } => {
                self.grid.scroll_by(dx, dy);
                tasks.push(self.load_thumbnails());
            }
            Message::DragEnd { velocity_x } => self.grid.end_scrolling(velocity_x),
            Message::Wheel(dx) => {
                self.grid.scroll_by(dx, 0.0);
                self.last_wheel = Some(Instant::now());
                tasks.push(self.load_thumbnails());
            }
            Message::RunDeferred => {
                self.grid.run_deferred();
                tasks.push(self.load_thumbnails());
            }
            Message::Frame(now) => {
                if let Some(at) = self.last_wheel
                    && now.saturating_duration_since(at) >= WHEEL_SETTLE
                {
                    self.last_wheel = None;
                    self.grid.end_scrolling(0.0);
                }
                self.grid.advance_animation(now);
                tasks.push(self.load_thumbnails());
            }
            Message::ConfigChanged(config) => {
                tracing::debug!("Config changed, restyling strip");
                self.gallery
                    .set_item_width_fraction(config.item_width_fraction());
                self.grid.set_style(config.to_style());
                self.grid.reload_data();
                self.config = config;
            }
        }

        Task::batch(tasks)
    }

    fn subscription(&self) -> Subscription<Self::Message> {
        let config_sub = self
            .core()
            .watch_config::<StripConfig>(APP_ID)
            .map(|update| Message::ConfigChanged(update.config));

        // Animation frames, only while something moves
        let frame_sub = if self.grid.is_animating() || self.last_wheel.is_some() {
            cosmic::iced::time::every(FRAME_INTERVAL).map(Message::Frame)
        } else {
            Subscription::none()
        };

        Subscription::batch([config_sub, frame_sub])
    }

    fn on_app_exit(&mut self) -> Option<Self::Message> {
        self.save_config();
        None
    }
}
