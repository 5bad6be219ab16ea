use std::fmt;
use std::str::FromStr;

const BACK_OVERSHOOT: f32 = 1.70158;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EaseCurve {
    Linear,
    /// `power1`..`power4`: polynomial of degree n + 1.
    Power(u8),
    Sine,
    Expo,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EaseDirection {
    In,
    Out,
    InOut,
}

/// Normalized-progress mapping, written with the timeline names (`"expo.out"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ease {
    curve: EaseCurve,
    direction: EaseDirection,
}

impl Default for Ease {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl Ease {
    pub const LINEAR: Ease = Ease::new(EaseCurve::Linear, EaseDirection::Out);
    pub const EXPO_OUT: Ease = Ease::new(EaseCurve::Expo, EaseDirection::Out);
    pub const POWER1_OUT: Ease = Ease::new(EaseCurve::Power(1), EaseDirection::Out);
    pub const SINE_IN_OUT: Ease = Ease::new(EaseCurve::Sine, EaseDirection::InOut);

    pub const fn new(curve: EaseCurve, direction: EaseDirection) -> Self {
        Self { curve, direction }
    }

    /// Maps `t` (clamped to [0, 1]) through the curve. `0 -> 0` and `1 -> 1`
    /// exactly; `back` overshoots in between.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if self.curve == EaseCurve::Linear {
            return t;
        }
        match self.direction {
            EaseDirection::In => self.ease_in(t),
            EaseDirection::Out => 1.0 - self.ease_in(1.0 - t),
            EaseDirection::InOut => {
                if t < 0.5 {
                    self.ease_in(t * 2.0) / 2.0
                } else {
                    1.0 - self.ease_in((1.0 - t) * 2.0) / 2.0
                }
            }
        }
    }

    fn ease_in(self, t: f32) -> f32 {
        match self.curve {
            EaseCurve::Linear => t,
            EaseCurve::Power(power) => t.powi(i32::from(power) + 1),
            EaseCurve::Sine => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - (t * std::f32::consts::FRAC_PI_2).cos()
                }
            }
            EaseCurve::Expo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * (t - 1.0))
                }
            }
            EaseCurve::Back => {
                if t >= 1.0 {
                    1.0
                } else {
                    t * t * ((BACK_OVERSHOOT + 1.0) * t - BACK_OVERSHOOT)
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown ease: {0}")]
pub struct EaseParseError(String);

impl FromStr for Ease {
    type Err = EaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if matches!(name, "none" | "linear") {
            return Ok(Self::LINEAR);
        }
        let (curve, direction) = name.split_once('.').unwrap_or((name, "out"));
        let curve = match curve {
            "power0" => return Ok(Self::LINEAR),
            "power1" | "quad" => EaseCurve::Power(1),
            "power2" | "cubic" => EaseCurve::Power(2),
            "power3" | "quart" => EaseCurve::Power(3),
            "power4" | "quint" => EaseCurve::Power(4),
            "sine" => EaseCurve::Sine,
            "expo" => EaseCurve::Expo,
            "back" => EaseCurve::Back,
            _ => return Err(EaseParseError(s.to_string())),
        };
        let direction = match direction {
            "in" => EaseDirection::In,
            "out" => EaseDirection::Out,
            "inOut" => EaseDirection::InOut,
            _ => return Err(EaseParseError(s.to_string())),
        };
        Ok(Self::new(curve, direction))
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let curve = match self.curve {
            EaseCurve::Linear => return f.write_str("none"),
            EaseCurve::Power(power) => return write!(f, "power{power}.{}", direction_name(self.direction)),
            EaseCurve::Sine => "sine",
            EaseCurve::Expo => "expo",
            EaseCurve::Back => "back",
        };
        write!(f, "{curve}.{}", direction_name(self.direction))
    }
}

fn direction_name(direction: EaseDirection) -> &'static str {
    match direction {
        EaseDirection::In => "in",
        EaseDirection::Out => "out",
        EaseDirection::InOut => "inOut",
    }
}

impl TryFrom<String> for Ease {
    type Error = EaseParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(ease: Ease) -> Self {
        ease.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<Ease> {
        let mut eases = vec![Ease::LINEAR];
        for curve in [
            EaseCurve::Power(1),
            EaseCurve::Power(2),
            EaseCurve::Power(3),
            EaseCurve::Power(4),
            EaseCurve::Sine,
            EaseCurve::Expo,
            EaseCurve::Back,
        ] {
            for direction in [EaseDirection::In, EaseDirection::Out, EaseDirection::InOut] {
                eases.push(Ease::new(curve, direction));
            }
        }
        eases
    }

    #[test]
    fn endpoints_are_exact() {
        for ease in catalogue() {
            assert_eq!(ease.apply(0.0), 0.0, "{ease}");
            assert_eq!(ease.apply(1.0), 1.0, "{ease}");
        }
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(Ease::EXPO_OUT.apply(-3.0), 0.0);
        assert_eq!(Ease::EXPO_OUT.apply(7.0), 1.0);
    }

    #[test]
    fn monotonic_spot_check() {
        for ease in catalogue() {
            if ease.curve == EaseCurve::Back {
                continue;
            }
            let a = ease.apply(0.25);
            let b = ease.apply(0.5);
            let c = ease.apply(0.75);
            assert!(a < b, "{ease}");
            assert!(b < c, "{ease}");
        }
    }

    #[test]
    fn back_out_overshoots() {
        let back_out: Ease = "back.out".parse().unwrap();
        assert!(back_out.apply(0.7) > 1.0);
    }

    #[test]
    fn expo_out_front_loads_progress() {
        assert!(Ease::EXPO_OUT.apply(0.2) > 0.7);
        assert!((Ease::LINEAR.apply(0.5) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn names_round_trip() {
        for name in ["none", "power1.out", "power3.inOut", "sine.inOut", "expo.out", "back.in"] {
            let ease: Ease = name.parse().unwrap();
            assert_eq!(ease.to_string(), name);
        }
        assert_eq!("expo".parse::<Ease>().unwrap(), Ease::EXPO_OUT);
        assert_eq!("linear".parse::<Ease>().unwrap(), Ease::LINEAR);
        assert!("bounce.out".parse::<Ease>().is_err());
        assert!("expo.sideways".parse::<Ease>().is_err());
    }

    #[test]
    fn deserializes_from_json_name() {
        let ease: Ease = serde_json::from_str("\"expo.out\"").unwrap();
        assert_eq!(ease, Ease::EXPO_OUT);
        assert_eq!(serde_json::to_string(&Ease::SINE_IN_OUT).unwrap(), "\"sine.inOut\"");
    }
}
