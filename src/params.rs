//! Parameter records for bikes and riders.
//!
//! Both records are plain values validated at construction. Angles in
//! [`GeometryParams`] are in degrees; the geometry solver converts them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One of the fifteen named geometry parameters.
///
/// The declaration order is the canonical enumeration order used by genomes
/// and by the brute-force search (first attribute varies slowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Wheelbase,
    HipAngle,
    HeadtubeAngle,
    CrankRadius,
    CrankXOffset,
    CrankZOffset,
    ForkOffset,
    SeatHeight,
    HandlebarRadius,
    FrontWheelRadius,
    RearWheelRadius,
    FrameMass,
    CrankMass,
    FrontWheelMass,
    RearWheelMass,
}

impl Attribute {
    pub const COUNT: usize = 15;

    pub const ALL: [Attribute; Attribute::COUNT] = [
        Attribute::Wheelbase,
        Attribute::HipAngle,
        Attribute::HeadtubeAngle,
        Attribute::CrankRadius,
        Attribute::CrankXOffset,
        Attribute::CrankZOffset,
        Attribute::ForkOffset,
        Attribute::SeatHeight,
        Attribute::HandlebarRadius,
        Attribute::FrontWheelRadius,
        Attribute::RearWheelRadius,
        Attribute::FrameMass,
        Attribute::CrankMass,
        Attribute::FrontWheelMass,
        Attribute::RearWheelMass,
    ];

    /// Position of this attribute in [`Attribute::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Configuration key for this attribute.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Wheelbase => "wheelbase",
            Attribute::HipAngle => "hip_angle",
            Attribute::HeadtubeAngle => "headtube_angle",
            Attribute::CrankRadius => "crank_radius",
            Attribute::CrankXOffset => "crank_x_offset",
            Attribute::CrankZOffset => "crank_z_offset",
            Attribute::ForkOffset => "fork_offset",
            Attribute::SeatHeight => "seat_height",
            Attribute::HandlebarRadius => "handlebar_radius",
            Attribute::FrontWheelRadius => "front_wheel_radius",
            Attribute::RearWheelRadius => "rear_wheel_radius",
            Attribute::FrameMass => "frame_mass",
            Attribute::CrankMass => "crank_mass",
            Attribute::FrontWheelMass => "front_wheel_mass",
            Attribute::RearWheelMass => "rear_wheel_mass",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .iter()
            .copied()
            .find(|attr| attr.name() == s)
            .ok_or_else(|| ConfigError::UnknownAttribute(s.to_string()))
    }
}

/// Concrete bike geometry for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeometryParams {
    /// Distance between wheel centers (m)
    pub wheelbase: f64,
    /// Angle between seat back and seat bottom (degrees)
    pub hip_angle: f64,
    /// Steering axis angle from vertical (degrees)
    pub headtube_angle: f64,
    pub crank_radius: f64,
    /// Crank center offset forward of the front wheel center (m)
    pub crank_x_offset: f64,
    /// Crank center height above ground (m)
    pub crank_z_offset: f64,
    pub fork_offset: f64,
    pub seat_height: f64,
    pub handlebar_radius: f64,
    pub front_wheel_radius: f64,
    pub rear_wheel_radius: f64,
    /// Mass of all frame tubes together (kg)
    pub frame_mass: f64,
    pub crank_mass: f64,
    pub front_wheel_mass: f64,
    pub rear_wheel_mass: f64,
}

impl GeometryParams {
    /// Build from values ordered as [`Attribute::ALL`].
    pub fn from_values(values: [f64; Attribute::COUNT]) -> Self {
        Self {
            wheelbase: values[0],
            hip_angle: values[1],
            headtube_angle: values[2],
            crank_radius: values[3],
            crank_x_offset: values[4],
            crank_z_offset: values[5],
            fork_offset: values[6],
            seat_height: values[7],
            handlebar_radius: values[8],
            front_wheel_radius: values[9],
            rear_wheel_radius: values[10],
            frame_mass: values[11],
            crank_mass: values[12],
            front_wheel_mass: values[13],
            rear_wheel_mass: values[14],
        }
    }

    /// Build from a name → value map holding exactly the fifteen keys.
    pub fn from_map(map: &BTreeMap<String, f64>) -> Result<Self, ConfigError> {
        if let Some(extra) = map.keys().find(|key| key.parse::<Attribute>().is_err()) {
            return Err(ConfigError::UnexpectedKey(extra.clone()));
        }

        let mut values = [0.0; Attribute::COUNT];
        for attr in Attribute::ALL {
            let value = map
                .get(attr.name())
                .copied()
                .ok_or_else(|| ConfigError::MissingKey(attr.name().to_string()))?;
            values[attr.index()] = value;
        }

        let params = Self::from_values(values);
        params.validate()?;
        Ok(params)
    }

    pub fn get(&self, attr: Attribute) -> f64 {
        match attr {
            Attribute::Wheelbase => self.wheelbase,
            Attribute::HipAngle => self.hip_angle,
            Attribute::HeadtubeAngle => self.headtube_angle,
            Attribute::CrankRadius => self.crank_radius,
            Attribute::CrankXOffset => self.crank_x_offset,
            Attribute::CrankZOffset => self.crank_z_offset,
            Attribute::ForkOffset => self.fork_offset,
            Attribute::SeatHeight => self.seat_height,
            Attribute::HandlebarRadius => self.handlebar_radius,
            Attribute::FrontWheelRadius => self.front_wheel_radius,
            Attribute::RearWheelRadius => self.rear_wheel_radius,
            Attribute::FrameMass => self.frame_mass,
            Attribute::CrankMass => self.crank_mass,
            Attribute::FrontWheelMass => self.front_wheel_mass,
            Attribute::RearWheelMass => self.rear_wheel_mass,
        }
    }

    pub fn values(&self) -> [f64; Attribute::COUNT] {
        Attribute::ALL.map(|attr| self.get(attr))
    }

    /// Every value must be finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for attr in Attribute::ALL {
            let value = self.get(attr);
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteValue {
                    key: attr.name().to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Keys of a rider record, excluding the name.
pub const RIDER_KEYS: [&str; 9] = [
    "rider_mass",
    "head_diameter",
    "torso_length",
    "torso_depth",
    "torso_width",
    "arm_length",
    "arm_diameter",
    "leg_length",
    "leg_diameter",
];

/// Body measurements of one rider. Lengths in meters, mass in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiderParams {
    #[serde(rename = "rider_name")]
    pub name: String,
    pub rider_mass: f64,
    pub head_diameter: f64,
    pub torso_length: f64,
    pub torso_depth: f64,
    pub torso_width: f64,
    pub arm_length: f64,
    pub arm_diameter: f64,
    pub leg_length: f64,
    pub leg_diameter: f64,
}

impl RiderParams {
    /// Build from a name and a map holding exactly the nine measurement keys.
    pub fn from_map(name: impl Into<String>, map: &BTreeMap<String, f64>) -> Result<Self, ConfigError> {
        if let Some(extra) = map.keys().find(|key| !RIDER_KEYS.contains(&key.as_str())) {
            return Err(ConfigError::UnexpectedKey(extra.clone()));
        }

        let get = |key: &str| {
            map.get(key)
                .copied()
                .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
        };

        let rider = Self {
            name: name.into(),
            rider_mass: get("rider_mass")?,
            head_diameter: get("head_diameter")?,
            torso_length: get("torso_length")?,
            torso_depth: get("torso_depth")?,
            torso_width: get("torso_width")?,
            arm_length: get("arm_length")?,
            arm_diameter: get("arm_diameter")?,
            leg_length: get("leg_length")?,
            leg_diameter: get("leg_diameter")?,
        };
        rider.validate()?;
        Ok(rider)
    }

    fn measurements(&self) -> [(&'static str, f64); 9] {
        [
            ("rider_mass", self.rider_mass),
            ("head_diameter", self.head_diameter),
            ("torso_length", self.torso_length),
            ("torso_depth", self.torso_depth),
            ("torso_width", self.torso_width),
            ("arm_length", self.arm_length),
            ("arm_diameter", self.arm_diameter),
            ("leg_length", self.leg_length),
            ("leg_diameter", self.leg_diameter),
        ]
    }

    /// Every measurement must be finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in self.measurements() {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteValue {
                    key: key.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Share of total rider mass carried by each body segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentMassFractions {
    pub head: f64,
    pub torso: f64,
    /// Per arm
    pub arm: f64,
    /// Per leg
    pub leg: f64,
}

impl Default for SegmentMassFractions {
    fn default() -> Self {
        Self {
            head: 0.07,
            torso: 0.47,
            arm: 0.06,
            leg: 0.17,
        }
    }
}

impl SegmentMassFractions {
    const SUM_TOL: f64 = 1e-9;

    /// Head, torso, two arms and two legs must account for the whole rider.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.head + self.torso + 2.0 * self.arm + 2.0 * self.leg;
        if (sum - 1.0).abs() > Self::SUM_TOL {
            return Err(ConfigError::MassFractionSum(sum));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_geometry() -> GeometryParams {
        GeometryParams {
            wheelbase: 1.0,
            hip_angle: 100.0,
            headtube_angle: 15.0,
            crank_radius: 0.1,
            crank_x_offset: 0.45,
            crank_z_offset: 0.55,
            fork_offset: 0.04,
            seat_height: 0.9,
            handlebar_radius: 0.3,
            front_wheel_radius: 0.35,
            rear_wheel_radius: 0.35,
            frame_mass: 8.0,
            crank_mass: 1.0,
            front_wheel_mass: 1.5,
            rear_wheel_mass: 1.5,
        }
    }

    pub(crate) fn sample_rider() -> RiderParams {
        RiderParams {
            name: "alice".to_string(),
            rider_mass: 70.0,
            head_diameter: 0.2,
            torso_length: 0.6,
            torso_depth: 0.25,
            torso_width: 0.4,
            arm_length: 0.6,
            arm_diameter: 0.08,
            leg_length: 0.9,
            leg_diameter: 0.12,
        }
    }

    fn geometry_map() -> BTreeMap<String, f64> {
        let params = sample_geometry();
        Attribute::ALL
            .iter()
            .map(|attr| (attr.name().to_string(), params.get(*attr)))
            .collect()
    }

    #[test]
    fn attribute_names_round_trip() {
        for (i, attr) in Attribute::ALL.iter().enumerate() {
            assert_eq!(attr.index(), i);
            assert_eq!(attr.name().parse::<Attribute>().unwrap(), *attr);
        }
        assert!("seat_angle".parse::<Attribute>().is_err());
    }

    #[test]
    fn geometry_from_map_accepts_exact_keys() {
        let params = GeometryParams::from_map(&geometry_map()).unwrap();
        assert_eq!(params, sample_geometry());
    }

    #[test]
    fn geometry_from_map_rejects_missing_key() {
        let mut map = geometry_map();
        map.remove("fork_offset");
        let err = GeometryParams::from_map(&map).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(key) if key == "fork_offset"));
    }

    #[test]
    fn geometry_from_map_rejects_extra_key() {
        let mut map = geometry_map();
        map.insert("stem_length".to_string(), 0.1);
        let err = GeometryParams::from_map(&map).unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedKey(key) if key == "stem_length"));
    }

    #[test]
    fn geometry_json_rejects_unknown_fields() {
        let mut value = serde_json::to_value(sample_geometry()).unwrap();
        value["extra"] = serde_json::json!(1.0);
        assert!(serde_json::from_value::<GeometryParams>(value).is_err());
    }

    #[test]
    fn rider_from_map_requires_all_measurements() {
        let rider = sample_rider();
        let mut map: BTreeMap<String, f64> = rider
            .measurements()
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        assert_eq!(RiderParams::from_map("alice", &map).unwrap(), rider);

        map.remove("arm_length");
        assert!(matches!(
            RiderParams::from_map("alice", &map),
            Err(ConfigError::MissingKey(_))
        ));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut params = sample_geometry();
        params.seat_height = f64::NAN;
        assert!(params.validate().is_err());
    }

    #[test]
    fn default_mass_fractions_cover_whole_body() {
        assert!(SegmentMassFractions::default().validate().is_ok());

        let skewed = SegmentMassFractions {
            head: 0.5,
            ..SegmentMassFractions::default()
        };
        assert!(matches!(skewed.validate(), Err(ConfigError::MassFractionSum(_))));
    }
}
