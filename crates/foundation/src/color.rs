use serde::{Deserialize, Serialize};

/// 8-bit RGBA colour as consumed by the rendering engine.
///
/// Serializes as a plain `[r, g, b, a]` array so style files stay readable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub const fn r(self) -> u8 {
        self.0[0]
    }

    pub const fn g(self) -> u8 {
        self.0[1]
    }

    pub const fn b(self) -> u8 {
        self.0[2]
    }

    pub const fn a(self) -> u8 {
        self.0[3]
    }

    /// Per-channel linear interpolation.
    ///
    /// Exact midpoints round toward the lower value (`193.5 -> 193`).
    /// `t` is clamped to `[0, 1]`; a NaN `t` yields `self`.
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mut out = [0u8; 4];
        for (i, c) in out.iter_mut().enumerate() {
            let c0 = f64::from(self.0[i]);
            let c1 = f64::from(other.0[i]);
            *c = round_half_down(c0 + t * (c1 - c0)).clamp(0.0, 255.0) as u8;
        }
        Rgba(out)
    }
}

fn round_half_down(v: f64) -> f64 {
    (v - 0.5).ceil()
}

impl From<[u8; 4]> for Rgba {
    fn from(value: [u8; 4]) -> Self {
        Rgba(value)
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(value: Rgba) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::Rgba;

    #[test]
    fn lerp_endpoints_are_exact() {
        let a = Rgba::new(65, 182, 196, 220);
        let b = Rgba::new(127, 205, 187, 220);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn lerp_midpoint_ties_round_down() {
        let a = Rgba::new(65, 182, 196, 220);
        let b = Rgba::new(127, 205, 187, 220);
        assert_eq!(a.lerp(b, 0.5), Rgba::new(96, 193, 191, 220));
    }

    #[test]
    fn lerp_non_ties_round_to_nearest() {
        let a = Rgba::new(0, 0, 0, 0);
        let b = Rgba::new(10, 10, 10, 10);
        assert_eq!(a.lerp(b, 0.46), Rgba::new(5, 5, 5, 5));
        assert_eq!(a.lerp(b, 0.44), Rgba::new(4, 4, 4, 4));
    }

    #[test]
    fn lerp_nan_stays_at_start() {
        let a = Rgba::new(1, 2, 3, 4);
        assert_eq!(a.lerp(Rgba::new(9, 9, 9, 9), f64::NAN), a);
    }

    #[test]
    fn serializes_as_array() {
        let json = serde_json::to_string(&Rgba::new(1, 2, 3, 4)).expect("json");
        assert_eq!(json, "[1,2,3,4]");
        let back: Rgba = serde_json::from_str("[5,6,7,8]").expect("parse");
        assert_eq!(back, Rgba::new(5, 6, 7, 8));
    }
}
