//! Physical unit conversions.
//!
//! The simulation engine reports and accepts speeds in m/s, while the
//! advisory control law and its reference paper work in km/h.

/// Factor converting a speed in m/s to km/h.
pub const MS_TO_KMH: f64 = 3.6;

/// Converts a speed in m/s to km/h.
pub fn ms_to_kmh(speed: f64) -> f64 {
    speed * MS_TO_KMH
}

/// Converts a speed in km/h to m/s.
pub fn kmh_to_ms(speed: f64) -> f64 {
    speed / MS_TO_KMH
}

/// The average speed in km/h required to cover `length` metres in `duration` seconds.
pub fn average_speed_kmh(length: f64, duration: f64) -> f64 {
    (length / duration) * MS_TO_KMH
}
