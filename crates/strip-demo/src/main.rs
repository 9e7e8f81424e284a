pub mod app;
pub mod gallery;
pub mod message;
pub mod nav;

use app::Photostrip;
use std::path::PathBuf;

fn main() -> cosmic::iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let settings = cosmic::app::Settings::default().size_limits(
        cosmic::iced::Limits::NONE
            .min_width(400.0)
            .min_height(360.0),
    );

    let start_dir = std::env::args().nth(1).map(PathBuf::from);

    cosmic::app::run::<Photostrip>(settings, start_dir)
}
