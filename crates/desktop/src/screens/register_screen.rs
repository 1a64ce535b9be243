use iced::widget::{button, column, image, row, text, Space};
use iced::{Element, Length, Theme};

use facecheck_core::form::register_form::{PhotoSource, RegisterForm};

use crate::app::{scaled, CameraView, Message, ModelView};
use crate::screens::{camera_well, field};
use crate::theme::muted_color;

pub fn view<'a>(
    fs: f32,
    form: &'a RegisterForm,
    camera: Option<&'a CameraView>,
    thumbnail: Option<&'a image::Handle>,
    model: &ModelView,
    busy: bool,
    theme: &Theme,
) -> Element<'a, Message> {
    let muted = muted_color(theme);
    let ready = !busy && model.is_ready();
    // Camera mode without a photo captures on submit, which needs the detector.
    let can_submit = match form.source() {
        PhotoSource::Camera if form.photo().is_none() => ready,
        _ => !busy,
    };

    let source_toggle = row![
        source_button(fs, "Elegir archivo", PhotoSource::File, form.source()),
        source_button(fs, "Usar Cámara", PhotoSource::Camera, form.source()),
    ]
    .spacing(8);

    let photo_input: Element<'a, Message> = match form.source() {
        PhotoSource::File => {
            let chosen = form
                .photo()
                .map(|p| p.file_name.clone())
                .unwrap_or_else(|| "Ningún archivo seleccionado".to_string());
            row![
                button(text("Seleccionar foto...").size(scaled(13.0, fs)))
                    .on_press_maybe(ready.then_some(Message::ChooseFile))
                    .padding([8, 16])
                    .style(button::secondary),
                text(chosen).size(scaled(13.0, fs)).color(muted),
            ]
            .spacing(12)
            .align_y(iced::Alignment::Center)
            .into()
        }
        PhotoSource::Camera => column![
            camera_well(fs, camera, model, theme),
            Space::new().height(8),
            button(text("Tomar Foto").size(scaled(14.0, fs)))
                .on_press_maybe(ready.then_some(Message::TakePhoto))
                .padding([10, 24])
                .width(Length::Fill)
                .style(button::secondary),
        ]
        .into(),
    };

    let submit_label = if busy {
        "Registrando..."
    } else {
        "Registrar Estudiante"
    };
    let form_column = column![
        text("Registrar Estudiante").size(scaled(20.0, fs)),
        Space::new().height(16),
        field(fs, "Nombre", &form.nombre, Message::NombreChanged),
        Space::new().height(10),
        field(fs, "Apellido", &form.apellido, Message::ApellidoChanged),
        Space::new().height(10),
        field(fs, "Correo", &form.correo, Message::CorreoChanged),
        Space::new().height(10),
        field(
            fs,
            "Número de Matrícula",
            &form.numero_matricula,
            Message::MatriculaChanged
        ),
        Space::new().height(12),
        text("Foto").size(scaled(13.0, fs)),
        Space::new().height(6),
        source_toggle,
        Space::new().height(8),
        photo_input,
        Space::new().height(16),
        button(text(submit_label).size(scaled(14.0, fs)))
            .on_press_maybe(can_submit.then_some(Message::RegisterSubmit))
            .padding([12, 24])
            .width(Length::Fill),
    ]
    .width(Length::FillPortion(3));

    match thumbnail {
        Some(handle) => row![
            form_column,
            column![image(handle.clone()).width(scaled(160.0, fs))]
                .width(Length::FillPortion(2))
                .align_x(iced::Alignment::Center),
        ]
        .spacing(24)
        .into(),
        None => form_column.into(),
    }
}

fn source_button<'a>(
    fs: f32,
    label: &'a str,
    source: PhotoSource,
    active: PhotoSource,
) -> Element<'a, Message> {
    let message = match source {
        PhotoSource::File => Message::UseFile,
        PhotoSource::Camera => Message::UseCamera,
    };
    let btn = button(text(label).size(scaled(13.0, fs)))
        .on_press(message)
        .padding([6, 14]);
    if source == active {
        btn.style(button::primary).into()
    } else {
        btn.style(button::text).into()
    }
}
