//! JSON input file: the planning domain and the algorithm parameters.
//!
//! Obstacles and goals are JSON objects keyed by name; their declared order is kept
//! because goals are reported in that order.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer, MapAccess};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::geometry::{Circle, Domain, FreeForm, Point, Rectangle, Region, Shape};

/// Per-iteration retry ceiling used when the input does not set one.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Full input file as read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFile {
    #[serde(rename = "DomainInfo")]
    pub domain: ShapeInfo,

    #[serde(rename = "OriginGoalInfo")]
    pub origin_goal: OriginGoalInfo,

    #[serde(rename = "ObstaclesInfo", default)]
    pub obstacles: NamedShapes,

    #[serde(rename = "RRTAlgorithmInfo")]
    pub algorithm: AlgorithmInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginGoalInfo {
    pub origin: Vec<f64>,
    pub goals: NamedShapes,
}

/// Geometry of one region, tagged by `shape_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape_type", rename_all = "snake_case")]
pub enum ShapeInfo {
    Circle {
        dim: usize,
        radius: f64,
        center: Vec<f64>,
    },
    Rectangle {
        dim: usize,
        lower_left: Vec<f64>,
        upper_right: Vec<f64>,
    },
    FreeForm {
        dim: usize,
        /// Relative paths resolve against the input file's directory.
        bitmap_file: PathBuf,
        bb_lower_left: Vec<f64>,
        bb_upper_right: Vec<f64>,
    },
}

impl ShapeInfo {
    pub fn dim(&self) -> usize {
        match self {
            ShapeInfo::Circle { dim, .. }
            | ShapeInfo::Rectangle { dim, .. }
            | ShapeInfo::FreeForm { dim, .. } => *dim,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ShapeInfo::Circle { .. } => "circle",
            ShapeInfo::Rectangle { .. } => "rectangle",
            ShapeInfo::FreeForm { .. } => "free_form",
        }
    }

    fn coordinates(&self) -> Vec<(&'static str, &[f64])> {
        match self {
            ShapeInfo::Circle { center, .. } => vec![("center", center.as_slice())],
            ShapeInfo::Rectangle {
                lower_left,
                upper_right,
                ..
            } => vec![
                ("lower_left", lower_left.as_slice()),
                ("upper_right", upper_right.as_slice()),
            ],
            ShapeInfo::FreeForm {
                bb_lower_left,
                bb_upper_right,
                ..
            } => vec![
                ("bb_lower_left", bb_lower_left.as_slice()),
                ("bb_upper_right", bb_upper_right.as_slice()),
            ],
        }
    }

    /// Construct the concrete shape.
    pub fn build<const D: usize>(&self, base_dir: &Path) -> Result<Box<dyn Shape<D>>> {
        let shape: Box<dyn Shape<D>> = match self {
            ShapeInfo::Circle { radius, center, .. } => {
                Box::new(Circle::new(to_point(center, "center")?, *radius)?)
            }
            ShapeInfo::Rectangle {
                lower_left,
                upper_right,
                ..
            } => Box::new(Rectangle::new(
                to_point(lower_left, "lower_left")?,
                to_point(upper_right, "upper_right")?,
            )?),
            ShapeInfo::FreeForm {
                bitmap_file,
                bb_lower_left,
                bb_upper_right,
                ..
            } => Box::new(FreeForm::open(
                &base_dir.join(bitmap_file),
                to_point(bb_lower_left, "bb_lower_left")?,
                to_point(bb_upper_right, "bb_upper_right")?,
            )?),
        };
        Ok(shape)
    }
}

/// Shapes keyed by name, in declared order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedShapes(pub Vec<(String, ShapeInfo)>);

impl NamedShapes {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShapeInfo)> + '_ {
        self.0.iter().map(|(name, shape)| (name.as_str(), shape))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn build<const D: usize>(&self, base_dir: &Path) -> Result<Vec<Region<D>>> {
        self.iter()
            .map(|(name, info)| Ok(Region::boxed(name, info.build(base_dir)?)))
            .collect()
    }
}

impl<'de> Deserialize<'de> for NamedShapes {
    fn deserialize<De>(deserializer: De) -> std::result::Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        struct NamedShapesVisitor;

        impl<'de> de::Visitor<'de> for NamedShapesVisitor {
            type Value = NamedShapes;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from region name to shape")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut shapes = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, ShapeInfo>()? {
                    shapes.push(entry);
                }
                Ok(NamedShapes(shapes))
            }
        }

        deserializer.deserialize_map(NamedShapesVisitor)
    }
}

impl Serialize for NamedShapes {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, shape) in &self.0 {
            map.serialize_entry(name, shape)?;
        }
        map.end()
    }
}

/// Tree growth strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[serde(alias = "basic")]
    RrtBasic,
    #[serde(alias = "optimizing")]
    RrtStar,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::RrtBasic => write!(f, "rrt_basic"),
            Method::RrtStar => write!(f, "rrt_star"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmInfo {
    pub method: Method,

    /// Tree capacity, the origin included.
    pub n_trials: usize,

    /// Longest allowed edge.
    pub step_size: f64,

    pub dim: usize,

    /// Rewiring radius, required by `rrt_star`.
    #[serde(default)]
    pub neighborhood: Option<f64>,

    /// Rejected samples tolerated per iteration before it counts as stalled.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

impl InputFile {
    /// Read and validate an input file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse and validate JSON input.
    pub fn from_json(json: &str) -> Result<Self> {
        let input: InputFile = serde_json::from_str(json)
            .map_err(|e| PlanError::Config(format!("invalid input file: {e}")))?;
        input.validate()?;
        Ok(input)
    }

    pub fn dim(&self) -> usize {
        self.domain.dim()
    }

    /// Checks that need no geometry: dimensions, vector lengths and parameter ranges.
    pub fn validate(&self) -> Result<()> {
        let dim = self.dim();
        if !(2..=3).contains(&dim) {
            return Err(PlanError::Config(format!(
                "dim must be 2 or 3, got {dim}"
            )));
        }
        if self.algorithm.dim != dim {
            return Err(PlanError::Config(format!(
                "RRTAlgorithmInfo dim {} does not match DomainInfo dim {dim}",
                self.algorithm.dim
            )));
        }
        if matches!(self.domain, ShapeInfo::FreeForm { .. }) {
            return Err(PlanError::Config(format!(
                "the domain must be a circle or a rectangle, not {}",
                self.domain.kind()
            )));
        }
        check_length(&self.origin_goal.origin, dim, "origin")?;

        let named = std::iter::once(("DomainInfo", &self.domain))
            .chain(self.obstacles.iter())
            .chain(self.origin_goal.goals.iter());
        for (name, shape) in named {
            if shape.dim() != dim {
                return Err(PlanError::Config(format!(
                    "{} '{name}' has dim {}, expected {dim}",
                    shape.kind(),
                    shape.dim()
                )));
            }
            for (field, values) in shape.coordinates() {
                check_length(values, dim, &format!("{name}.{field}"))?;
            }
        }
        check_unique_names(&self.obstacles, "obstacle")?;
        check_unique_names(&self.origin_goal.goals, "goal")?;

        let algorithm = &self.algorithm;
        if algorithm.n_trials == 0 {
            return Err(PlanError::Config("n_trials must be at least 1".to_string()));
        }
        if !(algorithm.step_size.is_finite() && algorithm.step_size > 0.0) {
            return Err(PlanError::Config(format!(
                "step_size must be positive, got {}",
                algorithm.step_size
            )));
        }
        if algorithm.max_attempts == 0 {
            return Err(PlanError::Config("max_attempts must be at least 1".to_string()));
        }
        if algorithm.method == Method::RrtStar {
            match algorithm.neighborhood {
                Some(radius) if radius.is_finite() && radius > 0.0 => {}
                Some(radius) => {
                    return Err(PlanError::Config(format!(
                        "neighborhood must be positive, got {radius}"
                    )))
                }
                None => {
                    return Err(PlanError::Config(
                        "rrt_star requires a neighborhood radius".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Build the planning domain in `D` dimensions; bitmaps resolve against `base_dir`.
    pub fn build_domain<const D: usize>(&self, base_dir: &Path) -> Result<Domain<D>> {
        if self.dim() != D {
            return Err(PlanError::Config(format!(
                "input is {}-dimensional, cannot build a {D}-dimensional domain",
                self.dim()
            )));
        }
        Domain::new(
            self.domain.build(base_dir)?,
            to_point(&self.origin_goal.origin, "origin")?,
            self.obstacles.build(base_dir)?,
            self.origin_goal.goals.build(base_dir)?,
        )
    }
}

fn check_length(values: &[f64], dim: usize, what: &str) -> Result<()> {
    if values.len() != dim {
        return Err(PlanError::Config(format!(
            "{what} has {} coordinates, expected {dim}",
            values.len()
        )));
    }
    Ok(())
}

fn check_unique_names(shapes: &NamedShapes, kind: &str) -> Result<()> {
    for (i, (name, _)) in shapes.0.iter().enumerate() {
        if shapes.0[..i].iter().any(|(other, _)| other == name) {
            return Err(PlanError::Config(format!("duplicate {kind} name '{name}'")));
        }
    }
    Ok(())
}

fn to_point<const D: usize>(values: &[f64], what: &str) -> Result<Point<D>> {
    check_length(values, D, what)?;
    Ok(Point::<D>::from_column_slice(values))
}
