#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("a polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("boundary coordinates must be finite")]
    NonFinite,
    #[error("rectangle extents must be positive, got {width} x {height}")]
    NonPositiveExtent { width: f64, height: f64 },
    #[error("boundary encloses no area")]
    Degenerate,
    #[error("polygon edges {first} and {second} intersect")]
    SelfIntersecting { first: usize, second: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("population must be positive")]
    NonPositivePopulation,
    #[error("{active} active and {latent} latent agents do not fit in a population of {population}")]
    TooManySeeded {
        active: u32,
        latent: u32,
        population: u32,
    },
    #[error("ticks per day must be positive")]
    ZeroTicksPerDay,
    #[error("checks per day must be positive")]
    ZeroChecksPerDay,
    #[error("{checks} checks per day exceed {ticks} ticks per day")]
    ChecksExceedTicks { checks: u32, ticks: u32 },
    #[error("infection period must be at least one day")]
    ZeroInfectionPeriod,
    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("{name} must be finite and positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("probability must be within [0, 1], got {0}")]
    Probability(f64),
    #[error("invalid boundary: {0}")]
    Geometry(#[from] GeometryError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("could not place agent {agent} inside the boundary after {attempts} attempts")]
pub struct PlacementError {
    pub agent: usize,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
}

impl From<GeometryError> for WorldError {
    fn from(e: GeometryError) -> Self {
        WorldError::Config(e.into())
    }
}
