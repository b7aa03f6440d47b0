/// Golden-angle hue step so neighbouring class indices stay far apart.
const HUE_STEP_DEG: f64 = 137.5;
const SATURATION: f64 = 0.70;
const LIGHTNESS: f64 = 0.50;

/// Display hue (degrees) for the class at `index`.
pub fn class_hue(index: usize) -> f64 {
    (index as f64 * HUE_STEP_DEG) % 360.0
}

/// CSS colour for legend swatches, e.g. `hsl(137.5, 70%, 50%)`.
pub fn class_color_css(index: usize) -> String {
    format!(
        "hsl({}, {}%, {}%)",
        class_hue(index),
        (SATURATION * 100.0).round(),
        (LIGHTNESS * 100.0).round()
    )
}

/// Same colour as [`class_color_css`] as RGB bytes, for rasterising overlays.
pub fn class_color_rgb(index: usize) -> [u8; 3] {
    hsl_to_rgb(class_hue(index), SATURATION, LIGHTNESS)
}

fn hsl_to_rgb(hue_deg: f64, s: f64, l: f64) -> [u8; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h = (hue_deg.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_byte(r), to_byte(g), to_byte(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hue_sequence() {
        assert_eq!(class_hue(0), 0.0);
        assert_eq!(class_hue(1), 137.5);
        assert_eq!(class_hue(3), 52.5);
    }

    #[test]
    fn test_css_text() {
        assert_eq!(class_color_css(1), "hsl(137.5, 70%, 50%)");
        assert_eq!(class_color_css(0), "hsl(0, 70%, 50%)");
    }

    #[test]
    fn test_rgb_matches_hsl() {
        assert_eq!(class_color_rgb(0), [217, 38, 38]);
        // hue 120 is pure green at this saturation
        assert_eq!(hsl_to_rgb(120.0, SATURATION, LIGHTNESS), [38, 217, 38]);
    }
}
