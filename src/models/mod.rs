mod destination;
mod trip;

pub use destination::Destination;
pub use trip::{parse_date, Trip, TripLength, DATE_FORMAT};
