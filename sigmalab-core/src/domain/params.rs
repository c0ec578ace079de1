//! Parameter set: the eleven tier sizing fractions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the eleven sizing tiers: 1–5 buy, 6–11 sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Base1,
    Base2,
    Base3,
    Base4,
    Base5,
    Base6,
    Base7,
    Base8,
    Base9,
    Base10,
    Base11,
}

impl Tier {
    pub const ALL: [Tier; 11] = [
        Tier::Base1,
        Tier::Base2,
        Tier::Base3,
        Tier::Base4,
        Tier::Base5,
        Tier::Base6,
        Tier::Base7,
        Tier::Base8,
        Tier::Base9,
        Tier::Base10,
        Tier::Base11,
    ];

    /// 1-based tier number.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    /// Rule label, e.g. `"Base 7"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Base1 => "Base 1",
            Self::Base2 => "Base 2",
            Self::Base3 => "Base 3",
            Self::Base4 => "Base 4",
            Self::Base5 => "Base 5",
            Self::Base6 => "Base 6",
            Self::Base7 => "Base 7",
            Self::Base8 => "Base 8",
            Self::Base9 => "Base 9",
            Self::Base10 => "Base 10",
            Self::Base11 => "Base 11",
        }
    }
}

/// Errors from validating a parameter set.
#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("tier {tier} fraction {value} is outside (0, 1]")]
    OutOfRange { tier: u8, value: f64 },
}

/// Sizing fraction per tier.
///
/// Buys are a fraction of the cash balance, sells a fraction of the asset
/// balance. Monotonicity across tiers is conventional, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    #[serde(rename = "B1")]
    pub b1: f64,
    #[serde(rename = "B2")]
    pub b2: f64,
    #[serde(rename = "B3")]
    pub b3: f64,
    #[serde(rename = "B4")]
    pub b4: f64,
    #[serde(rename = "B5")]
    pub b5: f64,
    #[serde(rename = "B6")]
    pub b6: f64,
    #[serde(rename = "B7")]
    pub b7: f64,
    #[serde(rename = "B8")]
    pub b8: f64,
    #[serde(rename = "B9")]
    pub b9: f64,
    #[serde(rename = "B10")]
    pub b10: f64,
    #[serde(rename = "B11")]
    pub b11: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::from_array([
            0.22796, 0.21397, 0.19943, 0.18088, 0.12229, 0.00157, 0.00200, 0.00441, 0.01287,
            0.03300, 0.09572,
        ])
    }
}

impl ParameterSet {
    /// Build from fractions ordered tier 1 through tier 11.
    pub fn from_array(v: [f64; 11]) -> Self {
        Self {
            b1: v[0],
            b2: v[1],
            b3: v[2],
            b4: v[3],
            b5: v[4],
            b6: v[5],
            b7: v[6],
            b8: v[7],
            b9: v[8],
            b10: v[9],
            b11: v[10],
        }
    }

    pub fn to_array(&self) -> [f64; 11] {
        [
            self.b1, self.b2, self.b3, self.b4, self.b5, self.b6, self.b7, self.b8, self.b9,
            self.b10, self.b11,
        ]
    }

    /// Same fraction for every tier. Handy for tests.
    pub fn uniform(fraction: f64) -> Self {
        Self::from_array([fraction; 11])
    }

    pub fn fraction(&self, tier: Tier) -> f64 {
        self.to_array()[tier as usize]
    }

    /// Every tier must be finite and in (0, 1].
    pub fn validate(&self) -> Result<(), ParamError> {
        for tier in Tier::ALL {
            let value = self.fraction(tier);
            if !(value.is_finite() && value > 0.0 && value <= 1.0) {
                return Err(ParamError::OutOfRange {
                    tier: tier.number(),
                    value,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_numbering() {
        assert_eq!(Tier::Base1.number(), 1);
        assert_eq!(Tier::Base11.number(), 11);
        assert_eq!(Tier::Base10.label(), "Base 10");
    }

    #[test]
    fn default_set_is_valid_and_conventional() {
        let p = ParameterSet::default();
        assert!(p.validate().is_ok());
        let a = p.to_array();
        assert!(a[..5].windows(2).all(|w| w[0] >= w[1]));
        assert!(a[5..].windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn fraction_lookup_matches_fields() {
        let p = ParameterSet::default();
        assert_eq!(p.fraction(Tier::Base3), p.b3);
        assert_eq!(p.fraction(Tier::Base11), p.b11);
    }

    #[test]
    fn zero_and_above_one_rejected() {
        let mut p = ParameterSet::default();
        p.b4 = 0.0;
        assert_eq!(
            p.validate(),
            Err(ParamError::OutOfRange { tier: 4, value: 0.0 })
        );
        p.b4 = 1.0;
        assert!(p.validate().is_ok());
        p.b9 = 1.5;
        assert!(p.validate().is_err());
        p.b9 = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn serde_uses_tier_names() {
        let json = serde_json::to_value(ParameterSet::default()).unwrap();
        assert!(json.get("B1").is_some());
        assert!(json.get("B11").is_some());
        let back: ParameterSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, ParameterSet::default());
    }
}
