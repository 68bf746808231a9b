//! HTML fragments for map popups and page captions
//!
//! All markup is produced with `maud`, so every value coming from a remote
//! service or from configuration is escaped.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use maud::{Markup, html};

use crate::MapError;
use crate::models::forecast::{ForecastResponse, TimeStep, ms_to_kmh};
use crate::models::PointOfInterest;

/// Offsets into the time series shown in the icon strip: every third hour of
/// the coming day, both ends included.
pub const ICON_STEPS: std::ops::RangeInclusive<usize> = 0..=24;
pub const ICON_STEP_HOURS: usize = 3;

/// Local date and time as shown in the page, e.g. `01.05.2024, 13:00:00`
#[must_use]
pub fn format_local(time: DateTime<Utc>, tz: Tz) -> String {
    time.with_timezone(&tz)
        .format("%d.%m.%Y, %H:%M:%S")
        .to_string()
}

fn value(v: Option<f64>) -> String {
    v.map_or_else(|| "–".to_string(), |v| v.to_string())
}

/// Relative icon path for a MET Norway symbol code
#[must_use]
pub fn icon_path(symbol_code: &str) -> String {
    format!("icons/{symbol_code}.svg")
}

/// `(symbol, localized time)` for every third time step of the next 24 hours
/// that exists in the series and has a symbol.
#[must_use]
pub fn icon_strip(series: &[TimeStep], tz: Tz) -> Vec<(String, String)> {
    ICON_STEPS
        .step_by(ICON_STEP_HOURS)
        .filter_map(|i| series.get(i))
        .filter_map(|step| {
            step.symbol_code()
                .map(|code| (code.to_string(), format_local(step.time, tz)))
        })
        .collect()
}

/// Popup content for a point forecast: current conditions, a 24 hour icon
/// strip and a link to the raw data.
pub fn forecast_popup(
    response: &ForecastResponse,
    request_url: &str,
    tz: Tz,
) -> crate::Result<Markup> {
    let series = response.timeseries();
    let first = series
        .first()
        .ok_or_else(|| MapError::parse("forecast contains no time series"))?;
    let details = &first.data.instant.details;
    let wind_kmh = details
        .wind_speed
        .map_or_else(|| "–".to_string(), |s| ms_to_kmh(s).to_string());

    Ok(html! {
        h4 { "Wettervorhersage für " (format_local(first.time, tz)) }
        @if let Some(symbol) = first.symbol_code() {
            img src=(icon_path(symbol)) alt=(symbol) style="width:48px;float:right";
        }
        ul {
            li { "Luftdruck Meereshöhe (hPa): " (value(details.air_pressure_at_sea_level)) }
            li { "Lufttemperatur (°C): " (value(details.air_temperature)) }
            li { "Bewölkungsgrad (%): " (value(details.cloud_area_fraction)) }
            li { "Niederschlagsmenge (mm): " (value(first.precipitation_amount())) }
            li { "Luftfeuchtigkeit (%): " (value(details.relative_humidity)) }
            li { "Windrichtung (°): " (value(details.wind_from_direction)) }
            li { "Windgeschwindigkeit (km/h): " (wind_kmh) }
        }
        @for (symbol, time) in icon_strip(series, tz) {
            img src=(icon_path(&symbol)) alt=(symbol) style="width:32px" title=(time);
        }
        p { a href=(request_url) target="met.no" { "Daten downloaden" } }
    })
}

/// Caption next to the wind layer name: `(Stand <time>)` linking the source
#[must_use]
pub fn wind_caption(source_url: &str, valid_time: DateTime<Utc>, tz: Tz) -> Markup {
    html! {
        "(" a href=(source_url) target="met.no" { "Stand " (format_local(valid_time, tz)) } ")"
    }
}

/// Popup of a park marker. Missing image or attribution are left out.
#[must_use]
pub fn park_popup(park: &PointOfInterest) -> Markup {
    html! {
        h4 { (park.name) }
        @if let Some(image) = park.image.as_deref().filter(|s| !s.trim().is_empty()) {
            img src=(image) alt=(park.name) style="width:200px";
        }
        @if let Some(attribution) = &park.attribution {
            p class="attribution" {
                @match attribution.url.as_deref().filter(|s| !s.trim().is_empty()) {
                    Some(url) => {
                        a href=(url) target="_blank" { (attribution.text) }
                    }
                    None => {
                        (attribution.text)
                    }
                }
            }
        }
    }
}
