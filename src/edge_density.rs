//! Edge-density scoring.
//!
//! The score of an image is the number of pixels a Canny detector marks as
//! edges on its grayscale version. Flat, blank or heavily blurred images have
//! few edges and score low; detailed images score high.
//!
//! The detector runs on the unsmoothed image: 3x3 Sobel gradients with
//! replicated borders, L1 magnitude `|gx| + |gy|`, non-maximum suppression
//! along four quantized directions, then hysteresis with 8-connectivity. The
//! thresholds are compared strictly against that integer magnitude, so a
//! crisp step of height `h` has magnitude `4h`.
//!
//! The hysteresis thresholds are fixed. Changing them changes which images
//! get classified as blurry.

use crate::image_files::decode_image;
use image::{GrayImage, Luma, RgbImage};
use imageproc::definitions::Image;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use std::path::Path;

/// Low hysteresis threshold of the Canny detector.
pub const CANNY_LOW_THRESHOLD: i32 = 100;

/// High hysteresis threshold of the Canny detector.
pub const CANNY_HIGH_THRESHOLD: i32 = 200;

/// `tan(22.5°)` in 15-bit fixed point.
const TAN_22_5: i64 = 13573;
const DIRECTION_SHIFT: u32 = 15;

/// Scores the image at `path`.
///
/// Unreadable, corrupt or unsupported files score exactly `0`. That is not
/// reported as an error: with any positive threshold such a file is simply
/// classified as blurry.
pub fn edge_density(path: &Path) -> u64 {
    match decode_image(path) {
        Ok(image) => {
            let gray = to_grayscale(&image.to_rgb8());
            count_edge_pixels(&gray)
        }
        Err(e) => {
            tracing::debug!(file = %path.display(), error = %e, "undecodable image scores 0");
            0
        }
    }
}

/// Converts to grayscale with BT.601 luma weights
/// (`0.299 R + 0.587 G + 0.114 B`), rounded in 14-bit fixed point.
pub fn to_grayscale(rgb: &RgbImage) -> GrayImage {
    const R_WEIGHT: u32 = 4899;
    const G_WEIGHT: u32 = 9617;
    const B_WEIGHT: u32 = 1868;
    const SHIFT: u32 = 14;

    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (u32::from(r) * R_WEIGHT
            + u32::from(g) * G_WEIGHT
            + u32::from(b) * B_WEIGHT
            + (1 << (SHIFT - 1)))
            >> SHIFT;
        Luma([luma.min(255) as u8])
    })
}

/// Runs the Canny detector and counts the pixels of the edge map.
pub fn count_edge_pixels(gray: &GrayImage) -> u64 {
    let gradients = Gradients::new(gray);
    let classes = gradients.suppress_non_maxima(CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
    hysteresis(&classes, gradients.width, gradients.height)
        .iter()
        .filter(|&&edge| edge)
        .count() as u64
}

/// Classification of a pixel after non-maximum suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeClass {
    /// Not a local maximum, or not above the low threshold.
    Suppressed,
    /// Local maximum above the low threshold only.
    Weak,
    /// Local maximum above the high threshold.
    Strong,
}

/// Sobel gradients and their L1 magnitude, stored row-major.
struct Gradients {
    width: usize,
    height: usize,
    gx: Vec<i32>,
    gy: Vec<i32>,
    magnitude: Vec<i32>,
}

impl Gradients {
    fn new(gray: &GrayImage) -> Self {
        let gx = flatten(&horizontal_sobel(gray));
        let gy = flatten(&vertical_sobel(gray));
        let magnitude = gx.iter().zip(&gy).map(|(h, v)| h.abs() + v.abs()).collect();
        Self {
            width: gray.width() as usize,
            height: gray.height() as usize,
            gx,
            gy,
            magnitude,
        }
    }

    /// Magnitude at `(x, y)`; zero outside the image.
    fn magnitude_at(&self, x: isize, y: isize) -> i32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0;
        }
        self.magnitude[y as usize * self.width + x as usize]
    }

    /// Keeps pixels whose magnitude is above `low` and is a maximum across the
    /// edge, comparing against the two neighbours along the gradient.
    ///
    /// Ties are broken towards the first pixel of a plateau: the neighbour
    /// before must be strictly smaller, the one after smaller or equal.
    /// Diagonal neighbours must both be strictly smaller.
    fn suppress_non_maxima(&self, low: i32, high: i32) -> Vec<EdgeClass> {
        let mut classes = vec![EdgeClass::Suppressed; self.magnitude.len()];

        for y in 0..self.height {
            for x in 0..self.width {
                let i = y * self.width + x;
                let m = self.magnitude[i];
                if m <= low {
                    continue;
                }

                let (dx, dy) = (self.gx[i], self.gy[i]);
                let (xi, yi) = (x as isize, y as isize);
                let ax = i64::from(dx.abs());
                let ay = i64::from(dy.abs()) << DIRECTION_SHIFT;
                let tg22 = ax * TAN_22_5;

                let is_maximum = if ay < tg22 {
                    m > self.magnitude_at(xi - 1, yi) && m >= self.magnitude_at(xi + 1, yi)
                } else {
                    let tg67 = tg22 + (ax << (DIRECTION_SHIFT + 1));
                    if ay > tg67 {
                        m > self.magnitude_at(xi, yi - 1) && m >= self.magnitude_at(xi, yi + 1)
                    } else {
                        let s = if (dx ^ dy) < 0 { -1 } else { 1 };
                        m > self.magnitude_at(xi - s, yi - 1)
                            && m > self.magnitude_at(xi + s, yi + 1)
                    }
                };

                if is_maximum {
                    classes[i] = if m > high {
                        EdgeClass::Strong
                    } else {
                        EdgeClass::Weak
                    };
                }
            }
        }
        classes
    }
}

fn flatten(gradient: &Image<Luma<i16>>) -> Vec<i32> {
    gradient.pixels().map(|p| i32::from(p[0])).collect()
}

/// Grows edges from every strong pixel into 8-connected weak pixels.
fn hysteresis(classes: &[EdgeClass], width: usize, height: usize) -> Vec<bool> {
    let mut edges = vec![false; classes.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (i, class) in classes.iter().enumerate() {
        if *class == EdgeClass::Strong {
            edges[i] = true;
            stack.push(i);
        }
    }

    while let Some(i) = stack.pop() {
        let (x, y) = ((i % width) as isize, (i / width) as isize);
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
                    continue;
                }
                let n = ny as usize * width + nx as usize;
                if !edges[n] && classes[n] == EdgeClass::Weak {
                    edges[n] = true;
                    stack.push(n);
                }
            }
        }
    }
    edges
}
