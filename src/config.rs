use crate::attendance::geo::OfficeLocation;
use crate::attendance::policy::LatePolicy;
use chrono::NaiveTime;
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Attendance engine
    pub office: OfficeLocation,
    /// Single time zone used for every work-day boundary computation.
    pub timezone: Tz,
    pub late_policy: LatePolicy,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),
            refresh_token_ttl: env::var("REFRESH_TOKEN_TTL")
                .unwrap_or_else(|_| "604800".to_string()) // default 7 days
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_refresh_per_min: env::var("RATE_REFRESH_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            office: OfficeLocation {
                latitude: env::var("OFFICE_LAT")
                    .unwrap_or_else(|_| "5.848864439722045".to_string())
                    .parse()
                    .expect("OFFICE_LAT must be a number"),
                longitude: env::var("OFFICE_LNG")
                    .unwrap_or_else(|_| "0.6102520623942992".to_string())
                    .parse()
                    .expect("OFFICE_LNG must be a number"),
                allowed_radius_m: env::var("OFFICE_RADIUS_M")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .expect("OFFICE_RADIUS_M must be a number"),
            },
            timezone: env::var("SERVICE_TZ")
                .unwrap_or_else(|_| "UTC".to_string())
                .parse()
                .expect("SERVICE_TZ must be a valid IANA time zone"),
            late_policy: match env::var("LATE_CUTOFF") {
                Ok(raw) => LatePolicy::CutoffAt(
                    NaiveTime::parse_from_str(&raw, "%H:%M")
                        .expect("LATE_CUTOFF must be HH:MM"),
                ),
                Err(_) => LatePolicy::AlwaysOnTime,
            },
        }
    }
}
