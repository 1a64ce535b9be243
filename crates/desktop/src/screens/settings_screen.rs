use iced::widget::{button, checkbox, column, pick_list, row, slider, text, text_input, Space};
use iced::Element;

use crate::app::{scaled, Message};
use crate::settings::{Appearance, MultipleFaces, Settings};

pub fn view<'a>(settings: &'a Settings) -> Element<'a, Message> {
    let fs = settings.font_scale;

    column![
        text("Servidor").size(scaled(16.0, fs)),
        Space::new().height(8),
        text_input("http://localhost:8000", &settings.backend_url)
            .on_input(Message::BackendUrlChanged)
            .padding(8)
            .size(scaled(13.0, fs)),
        Space::new().height(20),
        text("Cámara").size(scaled(16.0, fs)),
        Space::new().height(8),
        text_input("/dev/video0", &settings.camera_device)
            .on_input(Message::CameraDeviceChanged)
            .padding(8)
            .size(scaled(13.0, fs)),
        Space::new().height(8),
        text(format!(
            "Resolución solicitada: {}x{}",
            settings.camera_width, settings.camera_height
        ))
        .size(scaled(12.0, fs)),
        Space::new().height(20),
        text("Detección").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Fotos con varias caras").size(scaled(13.0, fs)),
            pick_list(MultipleFaces::ALL, Some(settings.multiple_faces), |m| {
                Message::MultipleFacesChanged(m)
            })
            .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(20),
        text("Apariencia").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Modo").size(scaled(13.0, fs)),
            pick_list(Appearance::ALL, Some(settings.appearance), |a| {
                Message::AppearanceChanged(a)
            })
            .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(12),
        checkbox(settings.high_contrast)
            .label("Alto contraste")
            .on_toggle(Message::HighContrastChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(12),
        row![
            text("Tamaño de letra").size(scaled(13.0, fs)),
            slider(0.8..=1.5, settings.font_scale, Message::FontScaleChanged).step(0.05),
            text(format!("{:.0}%", settings.font_scale * 100.0)).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(24),
        button(text("Restaurar valores predeterminados").size(scaled(13.0, fs)))
            .on_press(Message::RestoreDefaults)
            .padding([8, 16])
            .style(button::secondary),
    ]
    .spacing(0)
    .into()
}
