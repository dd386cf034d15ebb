//! Option state.
//!
//! Options describe the camera, the image and the display. They may only
//! change outside of a world block and are scoped by frame blocks.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use rman_core::{ErrorCode, ParameterList, Result, RiError, Token, tokens};

use crate::attributes::{ColorValue, ShaderBinding};
use crate::stack::impl_state_record;

/// Conversion between custom color spaces and RGB.
///
/// With no matrices set, the first three components pass through and the
/// missing channels are 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSamples {
    components: usize,
    /// `components x 3`, row-major: custom to RGB.
    n_rgb: Vec<f32>,
    /// `3 x components`, row-major: RGB to custom.
    rgb_n: Vec<f32>,
}

impl Default for ColorSamples {
    fn default() -> Self {
        Self {
            components: 3,
            n_rgb: Vec::new(),
            rgb_n: Vec::new(),
        }
    }
}

impl ColorSamples {
    /// Installs the conversion matrices for `n`-component colors.
    pub fn new(n: usize, n_rgb: &[f32], rgb_n: &[f32]) -> Result<Self> {
        if n == 0 {
            return Err(RiError::error(
                ErrorCode::Range,
                "ColorSamples needs at least one component",
            ));
        }
        if n_rgb.len() != n * 3 || rgb_n.len() != n * 3 {
            return Err(RiError::error(
                ErrorCode::Consistency,
                format!(
                    "ColorSamples {n}: expected {} matrix entries, got {} and {}",
                    n * 3,
                    n_rgb.len(),
                    rgb_n.len()
                ),
            ));
        }
        Ok(Self {
            components: n,
            n_rgb: n_rgb.to_vec(),
            rgb_n: rgb_n.to_vec(),
        })
    }

    #[inline]
    #[must_use]
    pub fn components(&self) -> usize {
        self.components
    }

    #[must_use]
    pub fn has_matrices(&self) -> bool {
        !self.n_rgb.is_empty()
    }

    #[must_use]
    pub fn n_rgb(&self) -> &[f32] {
        &self.n_rgb
    }

    #[must_use]
    pub fn rgb_n(&self) -> &[f32] {
        &self.rgb_n
    }

    /// Converts a custom color to RGB.
    #[must_use]
    pub fn color_rgb(&self, custom: &[f32]) -> [f32; 3] {
        let mut rgb = [1.0; 3];
        if self.has_matrices() {
            for (j, out) in rgb.iter_mut().enumerate() {
                *out = custom
                    .iter()
                    .take(self.components)
                    .enumerate()
                    .map(|(i, c)| c * self.n_rgb[i * 3 + j])
                    .sum();
            }
        } else {
            for (out, c) in rgb.iter_mut().zip(custom) {
                *out = *c;
            }
        }
        rgb
    }

    /// Converts an RGB color to the custom color space.
    #[must_use]
    pub fn color_custom(&self, rgb: [f32; 3]) -> ColorValue {
        let n = self.components;
        if self.has_matrices() {
            (0..n)
                .map(|i| (0..3).map(|j| rgb[j] * self.rgb_n[j * n + i]).sum::<f32>())
                .collect()
        } else {
            (0..n).map(|i| rgb.get(i).copied().unwrap_or(1.0)).collect()
        }
    }
}

/// One `Display` request.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayDesc {
    pub name: String,
    pub ty: Token,
    pub mode: Token,
    pub params: ParameterList,
}

/// The option record.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub x_resolution: i32,
    pub y_resolution: i32,
    pub pixel_aspect_ratio: f32,
    pub frame_aspect_ratio: Option<f32>,
    pub screen_window: Option<[f32; 4]>,
    pub crop_window: [f32; 4],
    pub projection: Token,
    pub projection_params: ParameterList,
    pub clipping: (f32, f32),
    pub clipping_planes: Vec<[f32; 6]>,
    /// `fstop focallength focaldistance`
    pub depth_of_field: Option<[f32; 3]>,
    pub shutter: (f32, f32),
    pub pixel_variance: f32,
    pub pixel_samples: (f32, f32),
    pub pixel_filter: (Token, f32, f32),
    pub exposure: (f32, f32),
    pub imager: Option<ShaderBinding>,
    /// `one min max ditheramplitude` per quantized channel type.
    pub quantize: FxHashMap<Token, [f32; 4]>,
    pub displays: SmallVec<[DisplayDesc; 1]>,
    pub hider: Token,
    pub hider_params: ParameterList,
    pub color_samples: ColorSamples,
    pub relative_detail: f32,
    /// Implementation-specific options set with `Option(name, ...)`.
    pub user: FxHashMap<Token, ParameterList>,
}

impl_state_record!(Options, Options);

impl Default for Options {
    fn default() -> Self {
        let mut quantize = FxHashMap::default();
        quantize.insert(Token::new(tokens::RGBA), [255.0, 0.0, 255.0, 0.5]);
        quantize.insert(Token::new(tokens::Z), [0.0, 0.0, 0.0, 0.0]);
        Self {
            x_resolution: 640,
            y_resolution: 480,
            pixel_aspect_ratio: 1.0,
            frame_aspect_ratio: None,
            screen_window: None,
            crop_window: [0.0, 1.0, 0.0, 1.0],
            projection: Token::new(tokens::ORTHOGRAPHIC),
            projection_params: ParameterList::new(),
            clipping: (f32::EPSILON, f32::INFINITY),
            clipping_planes: Vec::new(),
            depth_of_field: None,
            shutter: (0.0, 0.0),
            pixel_variance: 0.0,
            pixel_samples: (2.0, 2.0),
            pixel_filter: (Token::new(tokens::GAUSSIAN_FILTER), 2.0, 2.0),
            exposure: (1.0, 1.0),
            imager: None,
            quantize,
            displays: SmallVec::new(),
            hider: Token::new(tokens::HIDDEN),
            hider_params: ParameterList::new(),
            color_samples: ColorSamples::default(),
            relative_detail: 1.0,
            user: FxHashMap::default(),
        }
    }
}

impl Options {
    /// Number of color components of `Color`/`Opacity` and `color` parameters.
    #[inline]
    #[must_use]
    pub fn color_components(&self) -> usize {
        self.color_samples.components()
    }

    pub fn set_format(&mut self, x: i32, y: i32, aspect: f32) -> Result<()> {
        if x <= 0 || y <= 0 {
            return Err(RiError::error(
                ErrorCode::Range,
                format!("Format {x}x{y} must be positive"),
            ));
        }
        self.x_resolution = x;
        self.y_resolution = y;
        if aspect > 0.0 {
            self.pixel_aspect_ratio = aspect;
        }
        Ok(())
    }

    pub fn set_crop_window(&mut self, window: [f32; 4]) -> Result<()> {
        let [xmin, xmax, ymin, ymax] = window;
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !(xmin < xmax && ymin < ymax && window.iter().all(|&v| in_unit(v))) {
            return Err(RiError::error(
                ErrorCode::Range,
                format!("CropWindow {window:?} out of range"),
            ));
        }
        self.crop_window = window;
        Ok(())
    }

    pub fn set_clipping(&mut self, near: f32, far: f32) -> Result<()> {
        if near <= 0.0 || far <= near {
            return Err(RiError::error(
                ErrorCode::Range,
                format!("Clipping {near} {far}: need 0 < near < far"),
            ));
        }
        self.clipping = (near, far);
        Ok(())
    }

    pub fn set_pixel_samples(&mut self, x: f32, y: f32) -> Result<()> {
        if x < 1.0 || y < 1.0 {
            return Err(RiError::error(
                ErrorCode::Range,
                format!("PixelSamples {x} {y} must be at least 1"),
            ));
        }
        self.pixel_samples = (x, y);
        Ok(())
    }

    pub fn set_shutter(&mut self, open: f32, close: f32) -> Result<()> {
        if close < open {
            return Err(RiError::error(
                ErrorCode::Range,
                format!("Shutter closes ({close}) before it opens ({open})"),
            ));
        }
        self.shutter = (open, close);
        Ok(())
    }

    /// Frame aspect ratio, explicit or derived from the format.
    #[must_use]
    pub fn effective_frame_aspect_ratio(&self) -> f32 {
        self.frame_aspect_ratio.unwrap_or_else(|| {
            self.x_resolution as f32 * self.pixel_aspect_ratio / self.y_resolution as f32
        })
    }

    /// Screen window, explicit or derived from the frame aspect ratio.
    #[must_use]
    pub fn effective_screen_window(&self) -> [f32; 4] {
        self.screen_window.unwrap_or_else(|| {
            let aspect = self.effective_frame_aspect_ratio();
            if aspect >= 1.0 {
                [-aspect, aspect, -1.0, 1.0]
            } else {
                [-1.0, 1.0, -1.0 / aspect, 1.0 / aspect]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn pass_through_without_matrices() {
        let samples = ColorSamples::default();
        assert_eq!(samples.color_rgb(&[0.1, 0.2, 0.3]), [0.1, 0.2, 0.3]);

        let two = ColorSamples {
            components: 2,
            ..ColorSamples::default()
        };
        assert_eq!(two.color_rgb(&[0.1, 0.2]), [0.1, 0.2, 1.0]);

        let five = ColorSamples {
            components: 5,
            ..ColorSamples::default()
        };
        assert_eq!(five.color_custom([0.1, 0.2, 0.3]).as_slice(), &[0.1, 0.2, 0.3, 1.0, 1.0]);
    }

    #[test]
    fn matrices_convert_both_ways() {
        // Single gray channel: gray -> (g, g, g), rgb -> average.
        let third = 1.0 / 3.0;
        let samples = ColorSamples::new(1, &[1.0, 1.0, 1.0], &[third, third, third]).unwrap();
        assert_eq!(samples.color_rgb(&[0.5]), [0.5, 0.5, 0.5]);
        let gray = samples.color_custom([0.3, 0.6, 0.9]);
        assert_eq!(gray.len(), 1);
        assert!((gray[0] - 0.6).abs() < EPSILON);
    }

    #[test]
    fn matrix_sizes_are_checked() {
        assert_eq!(
            ColorSamples::new(2, &[1.0; 6], &[1.0; 5]).unwrap_err().code,
            ErrorCode::Consistency
        );
        assert_eq!(ColorSamples::new(0, &[], &[]).unwrap_err().code, ErrorCode::Range);
    }

    #[test]
    fn derived_screen_window() {
        let mut options = Options::default();
        options.set_format(800, 400, 1.0).unwrap();
        assert_eq!(options.effective_screen_window(), [-2.0, 2.0, -1.0, 1.0]);
        options.set_format(400, 800, 1.0).unwrap();
        assert_eq!(options.effective_screen_window(), [-1.0, 1.0, -2.0, 2.0]);
    }

    #[test]
    fn range_checks() {
        let mut options = Options::default();
        assert!(options.set_clipping(0.0, 1.0).is_err());
        assert!(options.set_crop_window([0.5, 0.2, 0.0, 1.0]).is_err());
        assert!(options.set_pixel_samples(0.5, 1.0).is_err());
        assert!(options.set_shutter(1.0, 0.0).is_err());
        assert!(options.set_format(0, 10, 1.0).is_err());
    }
}
