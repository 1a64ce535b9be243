pub mod compare_screen;
pub mod register_screen;
pub mod settings_screen;

use iced::border::Border;
use iced::widget::{column, container, image, text, text_input};
use iced::{Element, Length, Theme};

use crate::app::{scaled, CameraView, Message, ModelView};
use crate::theme::{muted_color, surface_color};

/// Live camera well: the annotated preview, or a blank box with a status line.
pub fn camera_well<'a>(
    fs: f32,
    camera: Option<&'a CameraView>,
    model: &ModelView,
    theme: &Theme,
) -> Element<'a, Message> {
    let muted = muted_color(theme);
    let content: Element<'a, Message> = match camera.and_then(|c| c.handle.as_ref().map(|h| (c, h))) {
        Some((c, handle)) => column![
            image(handle.clone()).width(Length::Fill).height(Length::Fill),
            text(format!("Caras detectadas: {}", c.faces))
                .size(scaled(12.0, fs))
                .color(muted),
        ]
        .spacing(4)
        .into(),
        None => {
            let status = match (camera, model) {
                (_, ModelView::Loading(pct)) => match pct {
                    Some(pct) => format!("Descargando modelo de detección... {pct}%"),
                    None => "Cargando modelo de detección...".to_string(),
                },
                (_, ModelView::Failed(_)) => "Detección de caras no disponible".to_string(),
                (Some(c), _) if c.error.is_some() => "Cámara no disponible".to_string(),
                _ => "Iniciando cámara...".to_string(),
            };
            text(status).size(scaled(13.0, fs)).color(muted).into()
        }
    };

    let surface = surface_color(theme);
    container(content)
        .width(Length::Fill)
        .height(scaled(300.0, fs))
        .center_x(Length::Fill)
        .center_y(scaled(300.0, fs))
        .style(move |_theme: &Theme| container::Style {
            background: Some(surface.into()),
            border: Border {
                radius: 10.0.into(),
                ..Border::default()
            },
            ..container::Style::default()
        })
        .into()
}

/// A labelled single-line input.
pub fn field<'a>(
    fs: f32,
    label: &'a str,
    value: &'a str,
    on_input: fn(String) -> Message,
) -> Element<'a, Message> {
    column![
        text(label).size(scaled(13.0, fs)),
        text_input(label, value)
            .on_input(on_input)
            .padding(10)
            .size(scaled(14.0, fs)),
    ]
    .spacing(6)
    .into()
}
