//! Gridded wind field in the grib2json layout consumed by velocity layers

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::MapError;

/// GRIB2 parameter number of the eastward (U) component
pub const PARAMETER_U: u8 = 2;
/// GRIB2 parameter number of the northward (V) component
pub const PARAMETER_V: u8 = 3;

/// One wind-field snapshot: a list of component grids sharing a header layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindField {
    pub records: Vec<WindRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindRecord {
    pub header: WindHeader,
    pub data: Vec<f64>,
}

/// Record header. Unknown keys are kept so the velocity layer receives the
/// document unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindHeader {
    #[serde(default)]
    pub parameter_category: Option<u8>,
    pub parameter_number: u8,
    pub ref_time: DateTime<Utc>,
    /// Hours after `ref_time`
    pub forecast_time: i64,
    pub nx: usize,
    pub ny: usize,
    pub lo1: f64,
    pub la1: f64,
    #[serde(default)]
    pub lo2: Option<f64>,
    #[serde(default)]
    pub la2: Option<f64>,
    pub dx: f64,
    pub dy: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WindHeader {
    /// Valid time of the field: reference time plus forecast offset.
    /// `None` when the offset leaves the representable date range.
    #[must_use]
    pub fn valid_time(&self) -> Option<DateTime<Utc>> {
        forecast_valid_time(self.ref_time, self.forecast_time)
    }

    /// Number of grid points, `None` on overflow
    #[must_use]
    pub fn grid_len(&self) -> Option<usize> {
        self.nx.checked_mul(self.ny)
    }
}

/// `ref_time + forecast_hours`, `None` on overflow
#[must_use]
pub fn forecast_valid_time(ref_time: DateTime<Utc>, forecast_hours: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_hours(forecast_hours).and_then(|offset| ref_time.checked_add_signed(offset))
}

impl WindField {
    /// Header of the first record; all records of a snapshot share it
    #[must_use]
    pub fn header(&self) -> Option<&WindHeader> {
        self.records.first().map(|r| &r.header)
    }

    #[must_use]
    pub fn component(&self, parameter_number: u8) -> Option<&WindRecord> {
        self.records
            .iter()
            .find(|r| r.header.parameter_number == parameter_number)
    }

    #[must_use]
    pub fn valid_time(&self) -> Option<DateTime<Utc>> {
        self.header().and_then(WindHeader::valid_time)
    }

    /// Check that both components exist, their grids match the header size
    /// and the valid time can be computed.
    pub fn validate(&self) -> crate::Result<()> {
        let Some(header) = self.header() else {
            return Err(MapError::parse("wind field contains no records"));
        };
        if header.valid_time().is_none() {
            return Err(MapError::parse(format!(
                "wind field valid time out of range: {} + {} h",
                header.ref_time, header.forecast_time
            )));
        }

        for (name, number) in [("U", PARAMETER_U), ("V", PARAMETER_V)] {
            let record = self.component(number).ok_or_else(|| {
                MapError::parse(format!("wind field has no {name} component"))
            })?;
            let expected = record.header.grid_len().ok_or_else(|| {
                MapError::parse(format!(
                    "{name} component grid {}x{} is too large",
                    record.header.nx, record.header.ny
                ))
            })?;
            if record.data.len() != expected {
                return Err(MapError::parse(format!(
                    "{name} component has {} values, header declares {}x{}",
                    record.data.len(),
                    record.header.nx,
                    record.header.ny
                )));
            }
        }

        Ok(())
    }
}
