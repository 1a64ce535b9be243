use iced::widget::{button, column, container, text, Space};
use iced::{Element, Length, Theme};

use facecheck_core::form::compare_form::CompareForm;

use crate::app::{scaled, CameraView, Message, ModelView};
use crate::screens::{camera_well, field};

pub fn view<'a>(
    fs: f32,
    form: &'a CompareForm,
    camera: Option<&'a CameraView>,
    model: &ModelView,
    busy: bool,
    theme: &Theme,
) -> Element<'a, Message> {
    let submit_label = if busy {
        "Comparando..."
    } else {
        "Comparar Estudiante"
    };
    let submit = button(text(submit_label).size(scaled(14.0, fs)))
        .on_press_maybe((!busy && model.is_ready()).then_some(Message::CompareSubmit))
        .padding([12, 24])
        .width(Length::Fill);

    let mut content = column![
        text("Comparar Estudiante").size(scaled(20.0, fs)),
        Space::new().height(16),
        field(fs, "ID del Estudiante", &form.student_id, Message::StudentIdChanged),
        Space::new().height(12),
        text("Foto").size(scaled(13.0, fs)),
        Space::new().height(6),
        camera_well(fs, camera, model, theme),
        Space::new().height(16),
        submit,
    ];

    if let Some(result) = &form.result {
        content = content.push(Space::new().height(16)).push(
            container(text(result.as_str()).size(scaled(15.0, fs)))
                .padding(16)
                .width(Length::Fill)
                .style(container::rounded_box),
        );
    }

    content.spacing(0).into()
}
