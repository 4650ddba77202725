// Driver color conversion for the replay payload

/// Fallback when the timing feed has no usable color for a driver.
const NEUTRAL_GRAY: &str = "#808080";

/// Convert a timing-feed RGB triple into the `#rrggbb` form the viewer
/// expects. Anything that is not exactly three channels is treated as
/// missing and falls back to neutral gray.
pub fn rgb_to_hex(rgb: Option<&[u8]>) -> String {
    match rgb {
        Some([r, g, b]) => format!("#{:02x}{:02x}{:02x}", r, g, b),
        _ => NEUTRAL_GRAY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_triple_converts_to_hex() {
        assert_eq!(rgb_to_hex(Some(&[255, 0, 0])), "#ff0000");
        assert_eq!(rgb_to_hex(Some(&[0, 128, 255])), "#0080ff");
        assert_eq!(rgb_to_hex(Some(&[0, 0, 0])), "#000000");
    }

    #[test]
    fn test_absent_color_falls_back_to_gray() {
        assert_eq!(rgb_to_hex(None), "#808080");
    }

    #[test]
    fn test_malformed_color_falls_back_to_gray() {
        assert_eq!(rgb_to_hex(Some(&[])), "#808080");
        assert_eq!(rgb_to_hex(Some(&[255, 0])), "#808080");
        assert_eq!(rgb_to_hex(Some(&[255, 0, 0, 128])), "#808080");
    }
}
