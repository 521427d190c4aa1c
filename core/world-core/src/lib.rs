pub mod error;
pub mod stat;
pub mod util;
pub mod world;

pub use error::{ConfigError, GeometryError, PlacementError, WorldError};
pub use math::Point;
pub use stat::{DailyRecord, HealthCount, HealthDiff};
pub use world::{
    agent::{AgentId, AgentView},
    boundary::{Boundary, Polygon},
    commons::{DischargePolicy, HealthType, PairScan, Probability, RuntimeParams, WorldParams},
    contact::Exposure,
    World,
};
