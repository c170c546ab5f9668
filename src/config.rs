use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub dispatch: DispatchSettings,
}

/// Search radii of the two-phase automatic dispatch, in kilometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchSettings {
    pub phase1_radius_km: f64,
    pub phase2_radius_km: f64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            phase1_radius_km: 750.0,
            phase2_radius_km: 1500.0,
        }
    }
}

impl DispatchSettings {
    pub fn new(phase1_radius_km: f64, phase2_radius_km: f64) -> Result<Self, AppError> {
        if !(phase1_radius_km.is_finite() && phase1_radius_km > 0.0) {
            return Err(AppError::Internal(format!(
                "phase 1 radius must be positive, got {phase1_radius_km}"
            )));
        }
        if !(phase2_radius_km.is_finite() && phase1_radius_km < phase2_radius_km) {
            return Err(AppError::Internal(format!(
                "phase 2 radius ({phase2_radius_km}) must exceed phase 1 radius ({phase1_radius_km})"
            )));
        }

        Ok(Self {
            phase1_radius_km,
            phase2_radius_km,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = DispatchSettings::default();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            dispatch: DispatchSettings::new(
                parse_or_default("DISPATCH_PHASE1_RADIUS_KM", defaults.phase1_radius_km)?,
                parse_or_default("DISPATCH_PHASE2_RADIUS_KM", defaults.phase2_radius_km)?,
            )?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
