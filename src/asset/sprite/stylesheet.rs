//! SCSS fragment describing a sprite sheet.
//!
//! The variable layout follows the classic spritesmith SCSS template, so
//! existing `sprite-*` mixins keep working:
//!
//! ```scss
//! $icon-home: (0px, 0px, 0px, 0px, 16px, 16px, 32px, 16px, '/build/sprites/sprites.png', 'icon-home', );
//! ```
//!
//! followed by one ready-to-use rule per sprite.

use std::fmt::Write;

use super::pack::{Frame, SpriteSheet};

/// First line of every generated fragment.
pub const HEADER: &str = "// Generated by assetline. Do not edit, changes are overwritten.\n";

fn px(value: i64) -> String {
    format!("{value}px")
}

/// Render the fragment for `sheet`, referencing the image as `image_url`.
pub fn render(sheet: &SpriteSheet, image_url: &str) -> String {
    let mut out = String::from(HEADER);
    if sheet.frames.is_empty() {
        return out;
    }

    let total_w = px(i64::from(sheet.width()));
    let total_h = px(i64::from(sheet.height()));

    out.push('\n');
    for frame in &sheet.frames {
        write_variables(&mut out, frame, &total_w, &total_h, image_url);
    }

    let list: String = sheet
        .frames
        .iter()
        .map(|f| format!("${}, ", f.name))
        .collect();
    let _ = writeln!(out, "$spritesheet-width: {total_w};");
    let _ = writeln!(out, "$spritesheet-height: {total_h};");
    let _ = writeln!(out, "$spritesheet-image: '{image_url}';");
    let _ = writeln!(out, "$spritesheet-sprites: ({list});");
    let _ = writeln!(
        out,
        "$spritesheet: ({total_w}, {total_h}, '{image_url}', $spritesheet-sprites, );"
    );

    for frame in &sheet.frames {
        out.push('\n');
        write_rule(&mut out, frame, image_url);
    }
    out
}

fn write_variables(out: &mut String, frame: &Frame, total_w: &str, total_h: &str, url: &str) {
    let name = &frame.name;
    let (x, y) = (px(i64::from(frame.x)), px(i64::from(frame.y)));
    let (ox, oy) = (px(-i64::from(frame.x)), px(-i64::from(frame.y)));
    let (w, h) = (px(i64::from(frame.width)), px(i64::from(frame.height)));

    let _ = writeln!(out, "${name}-name: '{name}';");
    let _ = writeln!(out, "${name}-x: {x};");
    let _ = writeln!(out, "${name}-y: {y};");
    let _ = writeln!(out, "${name}-offset-x: {ox};");
    let _ = writeln!(out, "${name}-offset-y: {oy};");
    let _ = writeln!(out, "${name}-width: {w};");
    let _ = writeln!(out, "${name}-height: {h};");
    let _ = writeln!(out, "${name}-total-width: {total_w};");
    let _ = writeln!(out, "${name}-total-height: {total_h};");
    let _ = writeln!(out, "${name}-image: '{url}';");
    let _ = writeln!(
        out,
        "${name}: ({x}, {y}, {ox}, {oy}, {w}, {h}, {total_w}, {total_h}, '{url}', '{name}', );"
    );
}

fn write_rule(out: &mut String, frame: &Frame, url: &str) {
    let _ = writeln!(out, ".{} {{", frame.name);
    let _ = writeln!(out, "  background-image: url('{url}');");
    let _ = writeln!(
        out,
        "  background-position: {} {};",
        px(-i64::from(frame.x)),
        px(-i64::from(frame.y))
    );
    let _ = writeln!(out, "  width: {}px;", frame.width);
    let _ = writeln!(out, "  height: {}px;", frame.height);
    out.push_str("}\n");
}
