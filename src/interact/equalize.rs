//! Image loading and contrast normalization
//!
//! Microscope channels are typically 12 or 16 bit with most of the signal
//! packed into a narrow band, so they are equalized with contrast limited
//! adaptive histogram equalization (CLAHE) before being reduced to 8 bit
//! for display.

use super::error::Result;
use image::{GrayImage, Luma};
use ndarray::Array2;
use std::path::Path;
use std::time::Instant;

/// CLAHE parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqualizeParams {
    /// Tile size (rows, cols); None = 1/8 of each image dimension
    pub kernel_size: Option<(usize, usize)>,
    /// Normalized clip limit in [0, 1]; 0 disables clipping
    pub clip_limit: f64,
    /// Histogram bins per tile
    pub nbins: usize,
}

impl Default for EqualizeParams {
    fn default() -> Self {
        Self {
            kernel_size: None,
            clip_limit: 0.01,
            nbins: 256,
        }
    }
}

/// Decode an image file into a luminance array scaled to [0, 1]
///
/// The scale follows the stored bit depth: 8-bit data is divided by 255,
/// 16-bit by 65535. Colour images are reduced to luminance.
pub fn load_gray(path: &Path) -> Result<Array2<f64>> {
    let img = image::open(path)?;
    let luma = img.to_luma16();
    let (w, h) = luma.dimensions();
    log::debug!("Decoded {} ({}×{}, {:?})", path.display(), w, h, img.color());

    Ok(Array2::from_shape_fn((h as usize, w as usize), |(r, c)| {
        luma.get_pixel(c as u32, r as u32)[0] as f64 / u16::MAX as f64
    }))
}

/// Stretch finite values to [0, 1]; constant images are returned clamped
pub fn rescale_intensity(img: &Array2<f64>) -> Array2<f64> {
    let (min, max) = img
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if !(max > min) {
        return img.mapv(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 });
    }

    let span = max - min;
    img.mapv(|v| {
        if v.is_finite() {
            ((v - min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    })
}

#[inline]
fn bin_of(v: f64, nbins: usize) -> usize {
    ((v.clamp(0.0, 1.0) * nbins as f64) as usize).min(nbins - 1)
}

/// Clip a tile histogram at `clip` and spread the excess evenly
fn clip_histogram(hist: &mut [u32], clip: u32) {
    let nbins = hist.len();
    let mut excess: u64 = 0;
    for h in hist.iter_mut() {
        if *h > clip {
            excess += (*h - clip) as u64;
            *h = clip;
        }
    }
    if excess == 0 {
        return;
    }

    let incr = (excess / nbins as u64) as u32;
    let upper = clip.saturating_sub(incr);
    let mut remaining = excess;
    for h in hist.iter_mut() {
        if *h < upper {
            *h += incr;
            remaining -= incr as u64;
        } else if *h < clip {
            remaining -= (clip - *h) as u64;
            *h = clip;
        }
    }

    // Leftover counts go one at a time to bins still under the limit
    while remaining > 0 {
        let mut added = false;
        for h in hist.iter_mut() {
            if remaining == 0 {
                break;
            }
            if *h < clip {
                *h += 1;
                remaining -= 1;
                added = true;
            }
        }
        if !added {
            break;
        }
    }
}

/// Contrast limited adaptive histogram equalization
///
/// The image is first stretched to [0, 1], then split into tiles of
/// `kernel_size`. Each tile gets a clipped, renormalized CDF, and every
/// pixel is mapped by bilinear interpolation between the CDFs of the four
/// nearest tile centres. Output is in [0, 1].
pub fn equalize_adapthist(img: &Array2<f64>, params: &EqualizeParams) -> Array2<f64> {
    let norm = rescale_intensity(img);
    let (rows, cols) = norm.dim();
    let nbins = params.nbins.max(2);
    if rows == 0 || cols == 0 {
        return norm;
    }

    let (kh, kw) = params
        .kernel_size
        .unwrap_or(((rows / 8).max(1), (cols / 8).max(1)));
    let kh = kh.clamp(1, rows);
    let kw = kw.clamp(1, cols);
    let tiles_y = rows.div_ceil(kh);
    let tiles_x = cols.div_ceil(kw);

    let mut cdfs: Vec<Vec<f64>> = Vec::with_capacity(tiles_x * tiles_y);

    for ty in 0..tiles_y {
        let r0 = ty * kh;
        let r1 = ((ty + 1) * kh).min(rows);
        for tx in 0..tiles_x {
            let c0 = tx * kw;
            let c1 = ((tx + 1) * kw).min(cols);

            let mut hist = vec![0u32; nbins];
            for r in r0..r1 {
                for c in c0..c1 {
                    hist[bin_of(norm[(r, c)], nbins)] += 1;
                }
            }

            let tile_pixels = ((r1 - r0) * (c1 - c0)) as f64;
            if params.clip_limit > 0.0 {
                let clip = (params.clip_limit * tile_pixels).max(1.0) as u32;
                clip_histogram(&mut hist, clip);
            }

            let total: f64 = hist.iter().map(|&h| h as f64).sum::<f64>().max(1.0);
            let mut acc = 0.0;
            let cdf: Vec<f64> = hist
                .iter()
                .map(|&h| {
                    acc += h as f64;
                    (acc / total).clamp(0.0, 1.0)
                })
                .collect();
            cdfs.push(cdf);
        }
    }

    let sample_cdf = |r: usize, c: usize, bin: usize| -> f64 {
        let rf = (r as f64 + 0.5) / kh as f64 - 0.5;
        let cf = (c as f64 + 0.5) / kw as f64 - 0.5;
        let ty = rf.floor().max(0.0) as usize;
        let tx = cf.floor().max(0.0) as usize;
        let dy = (rf - ty as f64).clamp(0.0, 1.0);
        let dx = (cf - tx as f64).clamp(0.0, 1.0);

        let ty0 = ty.min(tiles_y - 1);
        let tx0 = tx.min(tiles_x - 1);
        let ty1 = (ty + 1).min(tiles_y - 1);
        let tx1 = (tx + 1).min(tiles_x - 1);

        let c00 = cdfs[ty0 * tiles_x + tx0][bin];
        let c01 = cdfs[ty0 * tiles_x + tx1][bin];
        let c10 = cdfs[ty1 * tiles_x + tx0][bin];
        let c11 = cdfs[ty1 * tiles_x + tx1][bin];

        let top = c00 * (1.0 - dx) + c01 * dx;
        let bottom = c10 * (1.0 - dx) + c11 * dx;
        top * (1.0 - dy) + bottom * dy
    };

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        sample_cdf(r, c, bin_of(norm[(r, c)], nbins)).clamp(0.0, 1.0)
    })
}

/// Convert a [0, 1] array to an 8-bit image (values are rounded)
pub fn to_ubyte(img: &Array2<f64>) -> GrayImage {
    let (rows, cols) = img.dim();
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let v = img[(y as usize, x as usize)];
        let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Luma([(v * 255.0).round() as u8])
    })
}

/// Open an image, optionally equalize it, and reduce it to 8 bit
pub fn open_equalize(path: &Path, params: &EqualizeParams, equalize: bool) -> Result<GrayImage> {
    let t0 = Instant::now();
    let raw = load_gray(path)?;
    let out = if equalize {
        to_ubyte(&equalize_adapthist(&raw, params))
    } else {
        to_ubyte(&raw)
    };
    log::debug!(
        "open_equalize {} [{:.3}s, equalize: {}]",
        path.display(),
        t0.elapsed().as_secs_f64(),
        equalize
    );
    Ok(out)
}
