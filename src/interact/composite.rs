//! Channel stacking
//!
//! Equalized 8-bit channels are stacked into an RGB composite: up to three
//! channels go straight into red, green and blue; longer channel lists are
//! blended additively with a colour per channel.

use super::channels::{ChannelSlot, ChannelSpec};
use super::error::{Result, ViewerError};
use image::{GrayImage, Rgb, RgbImage, RgbaImage};

/// One equalized channel of a sample
#[derive(Debug, Clone)]
pub struct EqualizedChannel {
    /// Facet label (column name, plus slot for slot maps)
    pub label: String,
    /// Display colour of this channel in the composite
    pub color: [u8; 3],
    pub pixels: GrayImage,
}

/// Image shown for a sample
#[derive(Debug, Clone)]
pub enum Composite {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl Composite {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Composite::Gray(img) => img.dimensions(),
            Composite::Rgb(img) => img.dimensions(),
        }
    }

    /// RGB view, grey replicated across channels
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Composite::Gray(img) => gray_to_rgb(img),
            Composite::Rgb(img) => img.clone(),
        }
    }

    /// Opaque RGBA for display surfaces
    pub fn to_rgba(&self) -> RgbaImage {
        to_rgba(&self.to_rgb())
    }

    /// Build the composite for a channel spec
    ///
    /// `channels` must be in `spec.columns()` order.
    pub fn from_channels(spec: &ChannelSpec, channels: &[EqualizedChannel]) -> Result<Self> {
        check_shapes(channels)?;

        if spec.is_grayscale() {
            return Ok(Composite::Gray(channels[0].pixels.clone()));
        }

        match spec.slots() {
            Some(slots) => {
                let mut stack: [Option<&GrayImage>; 3] = [None, None, None];
                for (slot, ch) in slots.iter().zip(channels) {
                    stack[slot.index()] = Some(&ch.pixels);
                }
                Ok(Composite::Rgb(stack_rgb(stack)?))
            }
            None => Ok(Composite::Rgb(blend(channels)?)),
        }
    }
}

/// Display colour for the i-th column of a spec
///
/// Greyscale specs are white, slot-mapped columns use their slot colour
/// and blended lists take colours from `palette`.
pub fn channel_color(spec: &ChannelSpec, i: usize, palette: &[[u8; 3]]) -> [u8; 3] {
    if spec.is_grayscale() {
        return [255, 255, 255];
    }
    match spec.slots() {
        Some(slots) => slots.get(i).map(|s| s.color()).unwrap_or([255, 255, 255]),
        None => palette
            .get(i % palette.len().max(1))
            .copied()
            .unwrap_or([255, 255, 255]),
    }
}

fn check_shapes(channels: &[EqualizedChannel]) -> Result<()> {
    let first = channels.first().ok_or(ViewerError::NoChannels)?;
    let expected = first.pixels.dimensions();
    for ch in &channels[1..] {
        let got = ch.pixels.dimensions();
        if got != expected {
            return Err(ViewerError::ShapeMismatch {
                label: ch.label.clone(),
                expected,
                got,
            });
        }
    }
    Ok(())
}

/// Stack up to three grey frames into one RGB image
///
/// Empty slots are black. All present frames must share dimensions.
pub fn stack_rgb(slots: [Option<&GrayImage>; 3]) -> Result<RgbImage> {
    let first = slots
        .iter()
        .flatten()
        .next()
        .ok_or(ViewerError::NoChannels)?;
    let (w, h) = first.dimensions();

    for (i, img) in slots.iter().enumerate() {
        if let Some(img) = img {
            if img.dimensions() != (w, h) {
                return Err(ViewerError::ShapeMismatch {
                    label: ChannelSlot::ALL[i].to_string(),
                    expected: (w, h),
                    got: img.dimensions(),
                });
            }
        }
    }

    Ok(RgbImage::from_fn(w, h, |x, y| {
        let mut px = [0u8; 3];
        for (i, img) in slots.iter().enumerate() {
            if let Some(img) = img {
                px[i] = img.get_pixel(x, y)[0];
            }
        }
        Rgb(px)
    }))
}

/// Additive colour blend; each channel is tinted with its colour and the
/// sum saturates at 255
pub fn blend(channels: &[EqualizedChannel]) -> Result<RgbImage> {
    check_shapes(channels)?;
    let (w, h) = channels[0].pixels.dimensions();

    Ok(RgbImage::from_fn(w, h, |x, y| {
        let mut acc = [0u32; 3];
        for ch in channels {
            let v = ch.pixels.get_pixel(x, y)[0] as u32;
            for (a, c) in acc.iter_mut().zip(ch.color) {
                *a += v * c as u32 / 255;
            }
        }
        Rgb(acc.map(|a| a.min(255) as u8))
    }))
}

/// Replicate a grey frame into an RGB facet
pub fn gray_to_rgb(img: &GrayImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let v = img.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

/// Append an opaque alpha channel
pub fn to_rgba(img: &RgbImage) -> RgbaImage {
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        image::Rgba([r, g, b, 255])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn flat(w: u32, h: u32, v: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([v]))
    }

    fn channel(label: &str, color: [u8; 3], img: GrayImage) -> EqualizedChannel {
        EqualizedChannel {
            label: label.to_string(),
            color,
            pixels: img,
        }
    }

    #[test]
    fn test_stack_rgb_zero_fills() {
        let g = flat(4, 3, 200);
        let rgb = stack_rgb([None, Some(&g), None]).unwrap();
        assert_eq!(rgb.dimensions(), (4, 3));
        assert_eq!(rgb.get_pixel(2, 1).0, [0, 200, 0]);
    }

    #[test]
    fn test_stack_rgb_shape_mismatch() {
        let a = flat(4, 3, 1);
        let b = flat(3, 4, 1);
        let err = stack_rgb([Some(&a), None, Some(&b)]).unwrap_err();
        match err {
            ViewerError::ShapeMismatch { label, expected, got } => {
                assert_eq!(label, "blue");
                assert_eq!(expected, (4, 3));
                assert_eq!(got, (3, 4));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stack_rgb_requires_a_channel() {
        assert!(matches!(
            stack_rgb([None, None, None]),
            Err(ViewerError::NoChannels)
        ));
    }

    #[test]
    fn test_from_channels_list_order() {
        let spec = ChannelSpec::List(vec!["W5".into(), "W4".into(), "W1".into()]);
        let channels = vec![
            channel("W5", [255, 0, 0], flat(2, 2, 10)),
            channel("W4", [0, 255, 0], flat(2, 2, 20)),
            channel("W1", [0, 0, 255], flat(2, 2, 30)),
        ];
        match Composite::from_channels(&spec, &channels).unwrap() {
            Composite::Rgb(img) => assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30]),
            Composite::Gray(_) => panic!("expected RGB"),
        }
    }

    #[test]
    fn test_from_channels_map_slots() {
        let spec = ChannelSpec::from_map(vec![("blue", "W1")]).unwrap();
        let channels = vec![channel("W1", [0, 0, 255], flat(2, 2, 77))];
        let composite = Composite::from_channels(&spec, &channels).unwrap();
        assert_eq!(composite.to_rgb().get_pixel(1, 1).0, [0, 0, 77]);
    }

    #[test]
    fn test_from_channels_single_is_gray() {
        let spec = ChannelSpec::Single("W1".into());
        let channels = vec![channel("W1", [255, 255, 255], flat(3, 1, 9))];
        let composite = Composite::from_channels(&spec, &channels).unwrap();
        assert!(matches!(composite, Composite::Gray(_)));
        assert_eq!(composite.dimensions(), (3, 1));
        assert_eq!(composite.to_rgb().get_pixel(0, 0).0, [9, 9, 9]);
        assert_eq!(composite.to_rgba().get_pixel(0, 0).0, [9, 9, 9, 255]);
    }

    #[test]
    fn test_from_channels_one_column_list_is_gray() {
        let list = ChannelSpec::List(vec!["W1".into()]);
        let prefix = ChannelSpec::Prefix {
            prefix: "FullPath_W".into(),
            numbers: vec![1],
        };
        for spec in [list, prefix] {
            let color = channel_color(&spec, 0, &[]);
            assert_eq!(color, [255, 255, 255]);
            let channels = vec![channel("W1", color, flat(2, 2, 40))];
            let composite = Composite::from_channels(&spec, &channels).unwrap();
            assert!(matches!(composite, Composite::Gray(_)));
            assert_eq!(composite.to_rgb().get_pixel(1, 0).0, [40, 40, 40]);
        }

        // An explicit one-slot map keeps its slot
        let map = ChannelSpec::from_map(vec![("red", "W1")]).unwrap();
        assert_eq!(channel_color(&map, 0, &[]), [255, 0, 0]);
        let channels = vec![channel("W1", [255, 0, 0], flat(2, 2, 40))];
        let composite = Composite::from_channels(&map, &channels).unwrap();
        assert_eq!(composite.to_rgb().get_pixel(1, 0).0, [40, 0, 0]);
    }

    #[test]
    fn test_blend_five_channels_saturates() {
        let spec = ChannelSpec::Prefix {
            prefix: "W".into(),
            numbers: vec![1, 2, 3, 4, 5],
        };
        let palette = [
            [0, 0, 255],
            [0, 255, 0],
            [255, 0, 0],
            [255, 255, 0],
            [255, 0, 255],
        ];
        let channels: Vec<EqualizedChannel> = (0..5)
            .map(|i| channel(&format!("W{}", i + 1), channel_color(&spec, i, &palette), flat(2, 2, 200)))
            .collect();
        let composite = Composite::from_channels(&spec, &channels).unwrap();
        // Red gets 3 × 200, green 2 × 200, blue 2 × 200: all saturate
        assert_eq!(composite.to_rgb().get_pixel(0, 0).0, [255, 255, 255]);

        let dim: Vec<EqualizedChannel> = vec![
            channel("a", [255, 255, 0], flat(1, 1, 100)),
            channel("b", [0, 0, 255], flat(1, 1, 50)),
        ];
        assert_eq!(blend(&dim).unwrap().get_pixel(0, 0).0, [100, 100, 50]);
    }

    #[test]
    fn test_channel_color() {
        let map = ChannelSpec::from_map(vec![("green", "W2")]).unwrap();
        assert_eq!(channel_color(&map, 0, &[]), [0, 255, 0]);

        let list = ChannelSpec::List(vec!["a".into(), "b".into()]);
        assert_eq!(channel_color(&list, 1, &[]), [0, 255, 0]);

        let single = ChannelSpec::Single("a".into());
        assert_eq!(channel_color(&single, 0, &[]), [255, 255, 255]);
    }
}
