use iced::color;
use iced::theme::Palette;
use iced::{Color, Theme};

use crate::settings::Appearance;

/// Resolve the iced Theme from appearance + high_contrast settings.
pub fn resolve_theme(appearance: Appearance, high_contrast: bool) -> Theme {
    let dark = match appearance {
        Appearance::Dark => true,
        Appearance::Light => false,
        Appearance::System => system_prefers_dark(),
    };
    Theme::custom("FaceCheck", palette(dark, high_contrast))
}

fn palette(dark: bool, high_contrast: bool) -> Palette {
    match (dark, high_contrast) {
        (true, false) => Palette {
            background: color!(0x17, 0x1b, 0x1f),
            text: color!(0xd6, 0xda, 0xde),
            primary: color!(0x2f, 0xb8, 0x9a),
            success: color!(0x3c, 0xc7, 0x6b),
            warning: color!(0xf2, 0xb7, 0x05),
            danger: color!(0xf0, 0x55, 0x4d),
        },
        (false, false) => Palette {
            background: color!(0xf4, 0xf6, 0xf5),
            text: color!(0x1e, 0x24, 0x22),
            primary: color!(0x14, 0x8f, 0x77),
            success: color!(0x2a, 0x9d, 0x4f),
            warning: color!(0xd9, 0x8c, 0x00),
            danger: color!(0xd6, 0x3a, 0x31),
        },
        // High contrast keeps pure black/white backgrounds.
        (true, true) => Palette {
            background: Color::BLACK,
            text: Color::WHITE,
            primary: color!(0x5c, 0xe1, 0xc2),
            success: color!(0x4a, 0xe0, 0x7a),
            warning: color!(0xff, 0xd6, 0x0a),
            danger: color!(0xff, 0x5c, 0x52),
        },
        (false, true) => Palette {
            background: Color::WHITE,
            text: Color::BLACK,
            primary: color!(0x00, 0x5e, 0x4c),
            success: color!(0x1b, 0x6e, 0x34),
            warning: color!(0x8a, 0x4b, 0x00),
            danger: color!(0xb0, 0x00, 0x12),
        },
    }
}

/// Best-effort OS dark-mode query. Falls back to dark when unknown.
fn system_prefers_dark() -> bool {
    #[cfg(target_os = "macos")]
    {
        command_output("defaults", &["read", "-g", "AppleInterfaceStyle"])
            .map(|out| out.trim().eq_ignore_ascii_case("dark"))
            .unwrap_or(false)
    }
    #[cfg(target_os = "linux")]
    {
        command_output(
            "gsettings",
            &["get", "org.gnome.desktop.interface", "color-scheme"],
        )
        .map(|out| out.contains("dark"))
        .unwrap_or(true)
    }
    #[cfg(target_os = "windows")]
    {
        command_output(
            "reg",
            &[
                "query",
                r"HKCU\Software\Microsoft\Windows\CurrentVersion\Themes\Personalize",
                "/v",
                "AppsUseLightTheme",
            ],
        )
        .map(|out| out.contains("0x0"))
        .unwrap_or(true)
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        true
    }
}

#[cfg(any(target_os = "macos", target_os = "linux", target_os = "windows"))]
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = std::process::Command::new(program).args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Secondary text color: the theme's text at reduced opacity.
pub fn muted_color(theme: &Theme) -> Color {
    Color {
        a: 0.6,
        ..theme.palette().text
    }
}

/// Background of the camera well.
pub fn surface_color(theme: &Theme) -> Color {
    theme.extended_palette().background.weak.color
}
