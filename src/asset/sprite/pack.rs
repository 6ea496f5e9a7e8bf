//! Shelf packing.
//!
//! Images are sorted tallest first and laid left to right on horizontal
//! shelves. The sheet width is bounded by
//! `max(widest image, ceil(sqrt(total padded area)))`, which keeps the sheet
//! roughly square without needing a second pass.

use image::{RgbaImage, imageops};

/// A sprite to be packed.
#[derive(Debug)]
pub struct SpriteInput {
    pub name: String,
    pub image: RgbaImage,
}

/// Position and size of one sprite within the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A packed sprite sheet. Frames keep the input order.
#[derive(Debug)]
pub struct SpriteSheet {
    pub image: RgbaImage,
    pub frames: Vec<Frame>,
}

impl SpriteSheet {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[derive(Debug)]
struct Shelf {
    y: u32,
    height: u32,
    /// Next free x, including trailing padding.
    cursor: u32,
}

/// Pack `sprites` into one sheet with `padding` pixels between neighbours.
pub fn pack(sprites: &[SpriteInput], padding: u32) -> SpriteSheet {
    let positions = layout(
        &sprites
            .iter()
            .map(|s| (s.image.width(), s.image.height()))
            .collect::<Vec<_>>(),
        padding,
    );

    let width = positions
        .iter()
        .zip(sprites)
        .map(|(&(x, _), s)| x + s.image.width())
        .max()
        .unwrap_or(0);
    let height = positions
        .iter()
        .zip(sprites)
        .map(|(&(_, y), s)| y + s.image.height())
        .max()
        .unwrap_or(0);

    let mut image = RgbaImage::new(width, height);
    let frames = sprites
        .iter()
        .zip(&positions)
        .map(|(sprite, &(x, y))| {
            imageops::replace(&mut image, &sprite.image, i64::from(x), i64::from(y));
            Frame {
                name: sprite.name.clone(),
                x,
                y,
                width: sprite.image.width(),
                height: sprite.image.height(),
            }
        })
        .collect();

    SpriteSheet { image, frames }
}

/// Compute the top-left corner of every `(width, height)` box, in input order.
fn layout(sizes: &[(u32, u32)], padding: u32) -> Vec<(u32, u32)> {
    let widest = sizes.iter().map(|&(w, _)| w).max().unwrap_or(0);
    let area: u64 = sizes
        .iter()
        .map(|&(w, h)| u64::from(w + padding) * u64::from(h + padding))
        .sum();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let side = (area as f64).sqrt().ceil() as u32;
    let max_width = widest.max(side);

    // Tallest first; ties keep input order.
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| sizes[b].1.cmp(&sizes[a].1));

    let mut shelves: Vec<Shelf> = Vec::new();
    let mut positions = vec![(0, 0); sizes.len()];

    for index in order {
        let (w, h) = sizes[index];
        let fits = |shelf: &Shelf| h <= shelf.height && shelf.cursor + w <= max_width;

        let slot = match shelves.iter().position(fits) {
            Some(slot) => slot,
            None => {
                let y = shelves
                    .last()
                    .map(|s| s.y + s.height + padding)
                    .unwrap_or(0);
                shelves.push(Shelf {
                    y,
                    height: h,
                    cursor: 0,
                });
                shelves.len() - 1
            }
        };

        let shelf = &mut shelves[slot];
        positions[index] = (shelf.cursor, shelf.y);
        shelf.cursor += w + padding;
    }

    positions
}
