//! Upstream weather providers.

pub mod open_meteo;

pub use open_meteo::OpenMeteoGridSource;
