mod app;
mod screens;
mod settings;
mod theme;
mod workers;

use app::App;

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("FaceCheck")
        .theme(App::theme)
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: iced::Size::new(560.0, 720.0),
            min_size: Some(iced::Size::new(420.0, 560.0)),
            ..Default::default()
        })
        .run()
}
