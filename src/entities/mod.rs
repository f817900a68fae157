mod location;
mod place;
mod plan;
mod route;
mod stop;

pub use location::Coordinates;
pub use place::{Category, Place};
pub use plan::{AnnotatedPlan, RouteSummary, StopWithPlaces, TravelPlan};
pub use route::Route;
pub use stop::{Stop, StopKind};
