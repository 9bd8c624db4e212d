// ============================================================
// Layer 3 — Bike-share Schema
// ============================================================
// Fixed column layout of the hourly bike-share CSV and the
// column groups the feature encoder works with.
//
// Raw input (17 columns):
//   instant, dteday, season, yr, mnth, hr, holiday, weekday,
//   workingday, weathersit, temp, atemp, hum, windspeed,
//   casual, registered, cnt

/// Every column of the raw hourly dataset, in file order
pub const RAW_COLUMNS: [&str; 17] = [
    "instant", "dteday", "season", "yr", "mnth", "hr", "holiday", "weekday",
    "workingday", "weathersit", "temp", "atemp", "hum", "windspeed",
    "casual", "registered", "cnt",
];

/// Raw name → canonical name
pub const RENAMES: [(&str, &str); 6] = [
    ("weathersit", "weather"),
    ("yr",         "year"),
    ("mnth",       "month"),
    ("hr",         "hour"),
    ("hum",        "humidity"),
    ("cnt",        "count"),
];

/// Identifier, date and redundant columns removed after renaming
pub const DROPPED: [&str; 3] = ["instant", "dteday", "year"];

/// Columns treated as categorical and one-hot encoded, in encoding order
pub const CATEGORICAL: [&str; 7] = [
    "season", "month", "hour", "holiday", "weekday", "workingday", "weather",
];

/// Numeric columns kept in the table but not used as features
pub const UNUSED_FEATURES: [&str; 4] = ["atemp", "windspeed", "casual", "registered"];

/// Canonical name of the regression target
pub const TARGET: &str = "count";
