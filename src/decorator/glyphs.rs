//! A 3x5 bitmap font covering the characters of sample numbers and
//! timestamps.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;

/// Horizontal advance per character, in font pixels
const ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Rows of a glyph, most significant of the low three bits is the left column
fn glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        _ => [0; 5],
    }
}

/// Size in image pixels of `text` rendered at `scale`
pub fn text_size(text: &str, scale: u32) -> (u32, u32) {
    let chars = text.chars().count() as u32;
    let width = (chars * ADVANCE).saturating_sub(1) * scale;
    (width, GLYPH_HEIGHT * scale)
}

/// Draw `text` with its top-left corner at `origin`. Characters outside the
/// font render as blanks; anything past the image edge is clipped.
pub fn draw_text(canvas: &mut RgbImage, text: &str, origin: (i32, i32), scale: u32, color: Rgb<u8>) {
    let step = scale as i32;
    for (i, c) in text.chars().enumerate() {
        let left = origin.0 + (i as i32) * (ADVANCE as i32) * step;
        for (row, bits) in glyph(c).into_iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let x = left + col as i32 * step;
                let y = origin.1 + row as i32 * step;
                draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(scale, scale), color);
            }
        }
    }
}
