//! Frame decoration: position markers, sample number, wall-clock timestamp
//! and a binary sample code drawn onto a copy of each frame.

pub mod glyphs;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::models::{Frame, Position2D};

pub const MARKER_RADIUS: i32 = 10;
const CROSS_ARM: f32 = 5.0;

const TEXT_SCALE: u32 = 2;
const MARGIN: u32 = 4;

/// Width and height of one sample code cell
pub const CODE_CELL: u32 = 6;
pub const CODE_BITS: u32 = 32;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Marker colors, cycled through by position source index
const PALETTE: [Rgb<u8>; 6] = [
    Rgb([0, 255, 0]),
    Rgb([255, 0, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 255, 0]),
    Rgb([0, 255, 255]),
    Rgb([255, 0, 255]),
];

/// What to draw besides position markers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecorateOptions {
    pub timestamp: bool,
    pub sample_number: bool,
    pub sample_code: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Decorator {
    options: DecorateOptions,
}

impl Decorator {
    pub fn new(options: DecorateOptions) -> Self {
        Self { options }
    }

    pub fn name(&self) -> &str {
        "decorate"
    }

    /// Decorated copy of `frame`. `positions[i]` is drawn in the i-th
    /// palette color; invalid positions are skipped.
    pub fn decorate(&self, frame: &Frame, positions: &[Position2D]) -> Frame {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.decorate_at(frame, positions, &now)
    }

    /// Like [`Decorator::decorate`] with a fixed timestamp text
    pub fn decorate_at(&self, frame: &Frame, positions: &[Position2D], timestamp: &str) -> Frame {
        let mut image = frame.image.clone();

        for (i, position) in positions.iter().enumerate() {
            if let Some(center) = position.coords() {
                draw_marker(&mut image, center, PALETTE[i % PALETTE.len()]);
            }
        }

        let mut line_top = MARGIN;
        if self.options.sample_number {
            line_top += draw_label(&mut image, &frame.sample.to_string(), line_top);
        }
        if self.options.timestamp {
            draw_label(&mut image, timestamp, line_top);
        }
        if self.options.sample_code {
            draw_sample_code(&mut image, frame.sample);
        }

        Frame::new(frame.sample, image)
    }
}

/// Hollow circle with a cross at its center. Markers that cannot touch the
/// image are skipped.
pub fn draw_marker(image: &mut RgbImage, (x, y): (f64, f64), color: Rgb<u8>) {
    let reach = f64::from(MARKER_RADIUS);
    let near = |v: f64, extent: u32| (-reach..=f64::from(extent) + reach).contains(&v);
    if !(near(x, image.width()) && near(y, image.height())) {
        return;
    }

    let (cx, cy) = (x as f32, y as f32);
    draw_hollow_circle_mut(image, (x.round() as i32, y.round() as i32), MARKER_RADIUS, color);
    draw_line_segment_mut(image, (cx - CROSS_ARM, cy), (cx + CROSS_ARM, cy), color);
    draw_line_segment_mut(image, (cx, cy - CROSS_ARM), (cx, cy + CROSS_ARM), color);
}

/// White text on a black box at the left margin; returns the height used
fn draw_label(image: &mut RgbImage, text: &str, top: u32) -> u32 {
    let (width, height) = glyphs::text_size(text, TEXT_SCALE);
    let pad = TEXT_SCALE;
    let backing = Rect::at(MARGIN as i32, top as i32).of_size(width + 2 * pad, height + 2 * pad);
    draw_filled_rect_mut(image, backing, BLACK);
    glyphs::draw_text(
        image,
        text,
        ((MARGIN + pad) as i32, (top + pad) as i32),
        TEXT_SCALE,
        WHITE,
    );
    height + 2 * pad + MARGIN
}

/// Low 32 bits of `sample` as a row of cells along the bottom edge, most
/// significant bit first. A set bit is white, a clear bit black.
pub fn draw_sample_code(image: &mut RgbImage, sample: u64) {
    for i in 0..CODE_BITS {
        let bit = (sample >> (CODE_BITS - 1 - i)) & 1;
        let (x, y) = code_cell_origin(image.height(), i);
        let cell = Rect::at(x, y).of_size(CODE_CELL, CODE_CELL);
        draw_filled_rect_mut(image, cell, if bit == 1 { WHITE } else { BLACK });
    }
}

/// Top-left corner of sample code cell `i`
pub fn code_cell_origin(image_height: u32, i: u32) -> (i32, i32) {
    (
        (MARGIN + i * CODE_CELL) as i32,
        image_height as i32 - (MARGIN + CODE_CELL) as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(w: u32, h: u32, v: u8) -> Frame {
        Frame::new(5, RgbImage::from_pixel(w, h, Rgb([v, v, v])))
    }

    #[test]
    fn invalid_positions_leave_frame_untouched() {
        let frame = gray(40, 40, 30);
        let out = Decorator::default().decorate(&frame, &[Position2D::invalid()]);
        assert_eq!(out, frame);
    }

    #[test]
    fn marker_is_drawn_around_position() {
        let frame = gray(40, 40, 0);
        let out = Decorator::default().decorate(&frame, &[Position2D::new(20.0, 20.0)]);

        assert_eq!(out.image.get_pixel(20, 20), &PALETTE[0]);
        assert_eq!(out.image.get_pixel(30, 20), &PALETTE[0]);
        assert_eq!(out.image.get_pixel(20, 10), &PALETTE[0]);
        assert_eq!(out.image.get_pixel(25, 25), &Rgb([0, 0, 0]));
    }

    #[test]
    fn each_source_gets_its_own_color() {
        let frame = gray(80, 40, 0);
        let positions = [Position2D::new(15.0, 20.0), Position2D::new(60.0, 20.0)];
        let out = Decorator::default().decorate(&frame, &positions);

        assert_eq!(out.image.get_pixel(15, 20), &PALETTE[0]);
        assert_eq!(out.image.get_pixel(60, 20), &PALETTE[1]);
    }

    #[test]
    fn positions_off_the_frame_are_skipped() {
        let frame = gray(16, 16, 0);
        let out = Decorator::default().decorate(&frame, &[Position2D::new(-500.0, 1e12)]);
        assert_eq!(out, frame);
    }

    #[test]
    fn sample_code_spells_the_sample_in_binary() {
        let decorator = Decorator::new(DecorateOptions {
            sample_code: true,
            ..Default::default()
        });
        let out = decorator.decorate(&gray(200, 40, 128), &[]);

        let cell = |i: u32| {
            let (x, y) = code_cell_origin(40, i);
            *out.image.get_pixel(x as u32 + 1, y as u32 + 1)
        };
        // sample 5 = ...101
        assert_eq!(cell(31), WHITE);
        assert_eq!(cell(30), BLACK);
        assert_eq!(cell(29), WHITE);
        assert_eq!(cell(0), BLACK);
    }

    #[test]
    fn labels_stack_from_the_top_margin() {
        let decorator = Decorator::new(DecorateOptions {
            timestamp: true,
            sample_number: true,
            sample_code: false,
        });
        let frame = gray(200, 60, 128);
        let out = decorator.decorate_at(&frame, &[], "2024-01-01 00:00:00");

        // sample number "5" on the first line, backing box starts at the margin
        assert_eq!(out.image.get_pixel(MARGIN, MARGIN), &BLACK);
        // timestamp backing box on the second line extends well past "5"
        let second_line = MARGIN + glyphs::GLYPH_HEIGHT * TEXT_SCALE + 2 * TEXT_SCALE + MARGIN;
        assert_eq!(out.image.get_pixel(100, second_line), &BLACK);
        assert_eq!(out.image.get_pixel(100, MARGIN), &Rgb([128, 128, 128]));
        assert_eq!(out.image.get_pixel(199, 59), &Rgb([128, 128, 128]));
    }
}
