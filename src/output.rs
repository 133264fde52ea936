use std::io::{BufRead, Write};
use std::path::Path;

use log::info;
use strum::{Display, EnumString};
use tempfile::NamedTempFile;

use crate::convert::HsvColor;
use crate::error::{ExtractError, Result};
use crate::quantize::PaletteEntry;

pub const COLOR_RESET: &str = "\x1b[0m";

const WHITE: [u8; 3] = [255, 255, 255];
const BLACK: [u8; 3] = [0, 0, 0];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum ColorFormat {
    #[default]
    Hex,
    Rgb,
    Hsv,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    pub format: ColorFormat,
    /// Prefix hex colors with `#`.
    pub hash_prefix: bool,
}

impl FormatOptions {
    /// Width the color text is centred in on its swatch.
    fn swatch_width(&self) -> usize {
        match self.format {
            ColorFormat::Hex if self.hash_prefix => 9,
            ColorFormat::Hex => 8,
            ColorFormat::Rgb | ColorFormat::Hsv => 17,
        }
    }
}

pub fn format_color(color: &HsvColor, opts: &FormatOptions) -> String {
    match opts.format {
        ColorFormat::Hex if opts.hash_prefix => format!("#{}", color.to_hex()),
        ColorFormat::Hex => color.to_hex(),
        ColorFormat::Rgb => {
            let [r, g, b] = color.to_rgb();
            format!("({r}, {g}, {b})")
        }
        ColorFormat::Hsv => format!(
            "({}, {}, {})",
            (color.hue.round() as i32).rem_euclid(360),
            color.saturation.round() as i32,
            color.value.round() as i32
        ),
    }
}

/// White on dark backgrounds, black on light ones.
pub fn text_color(color: &HsvColor) -> [u8; 3] {
    if color.value < 128.0 { WHITE } else { BLACK }
}

fn ansi_fg([r, g, b]: [u8; 3]) -> String {
    format!("\x1b[38;2;{r};{g};{b}m")
}

fn ansi_bg([r, g, b]: [u8; 3]) -> String {
    format!("\x1b[48;2;{r};{g};{b}m")
}

/// `[NN] ` followed by the formatted color on its own background.
/// `label` is 1-based and zero-padded to the width of `total`.
pub fn render_swatch(label: usize, total: usize, color: &HsvColor, opts: &FormatOptions) -> String {
    let digits = total.to_string().len();
    let text = format_color(color, opts);
    let width = opts.swatch_width();
    format!(
        "[{label:0digits$}] {}{}{text:^width$}{COLOR_RESET}",
        ansi_fg(text_color(color)),
        ansi_bg(color.to_rgb()),
    )
}

/// One swatch line per entry, in the order given.
pub fn render_palette(entries: &[PaletteEntry], opts: &FormatOptions) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| render_swatch(i + 1, entries.len(), &e.color, opts))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// The file existed and the user did not agree to overwrite it.
    Declined,
}

/// Write `colors` to `path`, one per line.
///
/// An existing file is only replaced when `force` is set or the user answers
/// `y` on `input`. See [`write_palette`] for how the file is written.
pub fn save_palette<R: BufRead, W: Write>(
    path: &Path,
    colors: &[String],
    force: bool,
    input: &mut R,
    prompt: &mut W,
) -> Result<SaveOutcome> {
    if !confirm_destination(path, force, input, prompt)? {
        return Ok(SaveOutcome::Declined);
    }
    write_palette(path, colors)?;
    Ok(SaveOutcome::Written)
}

/// Check that `path` can be written and, if it already exists and `force` is
/// not set, ask on `prompt` whether to overwrite it. Returns `false` when the
/// user declines.
pub fn confirm_destination<R: BufRead, W: Write>(
    path: &Path,
    force: bool,
    input: &mut R,
    prompt: &mut W,
) -> Result<bool> {
    output_dir(path)?;
    if path.exists() && !force {
        return confirm_overwrite(path, input, prompt).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(true)
}

/// Replace `path` with `colors`, one per line, without asking.
///
/// The content goes to a temporary file in the target directory first and
/// is then renamed over `path`, so an interrupted run never leaves a
/// truncated file behind.
pub fn write_palette(path: &Path, colors: &[String]) -> Result<()> {
    let dir = output_dir(path)?;
    let io_err = |source: std::io::Error| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut body = String::new();
    for color in colors {
        body.push_str(color);
        body.push('\n');
    }

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(body.as_bytes()).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    info!("Saved to {}", path.display());
    Ok(())
}

/// Directory `path` will be created in; an empty parent means the current one.
fn output_dir(path: &Path) -> Result<&Path> {
    let dir = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(ExtractError::InvalidOutputPath(path.to_path_buf())),
    };
    if !dir.is_dir() {
        return Err(ExtractError::InvalidOutputPath(dir.to_path_buf()));
    }
    Ok(dir)
}

fn confirm_overwrite<R: BufRead, W: Write>(
    path: &Path,
    input: &mut R,
    prompt: &mut W,
) -> std::io::Result<bool> {
    write!(
        prompt,
        "[!] Output file {} already exists. Do you want to overwrite? (y/n): ",
        path.display()
    )?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::rgb_to_hsv;
    use std::fs;
    use std::io::Cursor;

    fn magenta() -> HsvColor {
        rgb_to_hsv(255.0, 0.0, 128.0)
    }

    #[test]
    fn formats() {
        let c = magenta();
        let hex = FormatOptions::default();
        assert_eq!(format_color(&c, &hex), "ff0080");

        let hashed = FormatOptions {
            hash_prefix: true,
            ..hex
        };
        assert_eq!(format_color(&c, &hashed), "#ff0080");

        let rgb = FormatOptions {
            format: ColorFormat::Rgb,
            hash_prefix: true,
        };
        assert_eq!(format_color(&c, &rgb), "(255, 0, 128)");

        let hsv = FormatOptions {
            format: ColorFormat::Hsv,
            hash_prefix: false,
        };
        assert_eq!(format_color(&c, &hsv), "(330, 255, 255)");
    }

    #[test]
    fn hsv_hue_stays_below_360() {
        let hsv = FormatOptions {
            format: ColorFormat::Hsv,
            hash_prefix: false,
        };
        assert_eq!(format_color(&HsvColor::new(359.7, 255.0, 255.0), &hsv), "(0, 255, 255)");
        assert_eq!(format_color(&HsvColor::new(359.4, 255.0, 255.0), &hsv), "(359, 255, 255)");
    }

    #[test]
    fn parses_formats() {
        assert_eq!("hex".parse::<ColorFormat>().unwrap(), ColorFormat::Hex);
        assert_eq!("RGB".parse::<ColorFormat>().unwrap(), ColorFormat::Rgb);
        assert_eq!(ColorFormat::Hsv.to_string(), "hsv");
        assert!("cmyk".parse::<ColorFormat>().is_err());
    }

    #[test]
    fn text_contrasts_with_background() {
        assert_eq!(text_color(&HsvColor::new(0.0, 0.0, 20.0)), WHITE);
        assert_eq!(text_color(&HsvColor::new(0.0, 0.0, 127.9)), WHITE);
        assert_eq!(text_color(&HsvColor::new(0.0, 0.0, 128.0)), BLACK);
    }

    #[test]
    fn swatch_layout() {
        let line = render_swatch(3, 12, &magenta(), &FormatOptions::default());
        assert_eq!(
            line,
            "[03] \x1b[38;2;0;0;0m\x1b[48;2;255;0;128m ff0080 \x1b[0m"
        );
    }

    #[test]
    fn palette_labels_count_up() {
        let entries = vec![
            PaletteEntry {
                color: magenta(),
                count: 9,
            };
            3
        ];
        let lines = render_palette(&entries, &FormatOptions::default());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[1] "));
        assert!(lines[2].starts_with("[3] "));
    }

    fn colors() -> Vec<String> {
        vec!["ff0080".to_string(), "00ff00".to_string()]
    }

    #[test]
    fn writes_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.txt");
        let mut prompt = Vec::new();

        let outcome = save_palette(&path, &colors(), false, &mut Cursor::new(""), &mut prompt).unwrap();
        assert_eq!(outcome, SaveOutcome::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "ff0080\n00ff00\n");
        assert!(prompt.is_empty());
    }

    #[test]
    fn declined_overwrite_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.txt");
        fs::write(&path, "original\n").unwrap();

        for answer in ["n\n", "\n", "maybe\n", ""] {
            let mut prompt = Vec::new();
            let outcome =
                save_palette(&path, &colors(), false, &mut Cursor::new(answer), &mut prompt).unwrap();
            assert_eq!(outcome, SaveOutcome::Declined, "{answer:?}");
            assert_eq!(fs::read_to_string(&path).unwrap(), "original\n");
            assert!(String::from_utf8(prompt).unwrap().contains("already exists"));
        }
    }

    #[test]
    fn confirmed_overwrite_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.txt");
        fs::write(&path, "original\n").unwrap();

        let outcome =
            save_palette(&path, &colors(), false, &mut Cursor::new("y\n"), &mut Vec::new()).unwrap();
        assert_eq!(outcome, SaveOutcome::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "ff0080\n00ff00\n");
    }

    #[test]
    fn force_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.txt");
        fs::write(&path, "original\n").unwrap();
        let mut prompt = Vec::new();

        let outcome = save_palette(&path, &colors(), true, &mut Cursor::new(""), &mut prompt).unwrap();
        assert_eq!(outcome, SaveOutcome::Written);
        assert!(prompt.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "ff0080\n00ff00\n");
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("palette.txt");

        let err = save_palette(&path, &colors(), true, &mut Cursor::new(""), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidOutputPath(_)));
        assert!(!path.exists());
    }

    #[test]
    fn write_leaves_only_the_palette_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.txt");
        fs::write(&path, "original\n").unwrap();

        write_palette(&path, &colors()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "ff0080\n00ff00\n");

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("palette.txt")]);
    }

    #[test]
    fn confirm_destination_asks_only_for_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.txt");
        let mut prompt = Vec::new();

        assert!(confirm_destination(&path, false, &mut Cursor::new(""), &mut prompt).unwrap());
        assert!(prompt.is_empty());

        fs::write(&path, "original\n").unwrap();
        assert!(!confirm_destination(&path, false, &mut Cursor::new("n\n"), &mut prompt).unwrap());
        assert!(confirm_destination(&path, false, &mut Cursor::new("yes\n"), &mut Vec::new()).unwrap());
        assert!(confirm_destination(&path, true, &mut Cursor::new(""), &mut Vec::new()).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "original\n");
    }
}
