use crate::types::Rgb;

/// Linear interpolation between two f64 values
pub fn lerp(start: f64, end: f64, alpha: f64) -> f64 {
    start + (end - start) * alpha
}

/// Even mix of two colors, used for spell-clash beams
pub fn blend_colors(a: Rgb, b: Rgb) -> Rgb {
    let mix = |x: u8, y: u8| lerp(x as f64, y as f64, 0.5).round() as u8;
    Rgb::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}

/// Scale a color toward black; zone lighting uses this for fallback fills
pub fn shade(color: Rgb, lighting: f32) -> Rgb {
    let f = lighting.clamp(0.0, 1.0) as f64;
    let scale = |c: u8| lerp(0.0, c as f64, f).round() as u8;
    Rgb::new(scale(color.r), scale(color.g), scale(color.b))
}
