// Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::{Days, NaiveDate};

pub const HEADER: &str = "No,year,month,day,hour,PM2.5,PM10,SO2,NO2,CO,O3,TEMP,PRES,DEWP,RAIN,wd,WSPM,station";

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2013, 3, 1).unwrap()
}

pub fn day(offset: u64) -> NaiveDate {
    start_date() + Days::new(offset)
}

/// Deterministic pseudo-random PM2.5 readings between 20 and 180
pub fn readings(seed: u64, len: usize) -> Vec<f64> {
    let mut state = seed;
    (0..len)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
            let seasonal = 40.0 * (i as f64 * 0.3).sin();
            (100.0 + seasonal + 40.0 * (unit - 0.5)).round()
        })
        .collect()
}

/// One CSV row in the date-part layout; `None` writes NA
pub fn date_part_row(no: usize, station: &str, date: NaiveDate, hour: u32, pm25: Option<f64>) -> String {
    use chrono::Datelike;
    let pm25 = pm25.map_or_else(|| "NA".to_string(), |v| v.to_string());
    format!(
        "{no},{},{},{},{hour},{pm25},30,4,12,300,77,1.5,1020.3,-18.8,0,NNW,4.4,{station}",
        date.year(),
        date.month(),
        date.day()
    )
}

/// Daily rows at noon for consecutive days starting at `start_date()`
pub fn daily_csv(station: &str, values: &[Option<f64>]) -> String {
    let mut lines = vec![HEADER.to_string()];
    for (i, value) in values.iter().enumerate() {
        lines.push(date_part_row(i + 1, station, day(i as u64), 12, *value));
    }
    lines.join("\n")
}
