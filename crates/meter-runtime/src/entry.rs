//! Manually typed readings.

use meter_core::dates::normalize_date;
use meter_core::error::{MeterError, Result};
use meter_core::models::{CellValue, ConsumptionRecord, SourceCategory};
use meter_core::numbers::parse_number_str;
use meter_core::settings::Settings;

/// A reading as typed by the user, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualEntry {
    pub date: String,
    pub source: String,
    pub consumption: String,
}

impl ManualEntry {
    pub fn new(
        date: impl Into<String>,
        source: impl Into<String>,
        consumption: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            source: source.into(),
            consumption: consumption.into(),
        }
    }

    /// Build from a `--entry DATE,SOURCE,CONSUMPTION` argument.
    pub fn from_cli(raw: &str) -> Self {
        let (date, source, consumption) = Settings::split_entry(raw);
        Self {
            date,
            source,
            consumption,
        }
    }

    /// Turn the entry into a record.
    ///
    /// The date accepts everything the importer does (`DD/MM/YYYY`, ISO and
    /// the other fallbacks). The daily delta of a manual reading is its
    /// consumption.
    pub fn validate(&self) -> Result<ConsumptionRecord> {
        let date = self.date.trim();
        let source = self.source.trim();
        let consumption = self.consumption.trim();

        if date.is_empty() || source.is_empty() || consumption.is_empty() {
            return Err(MeterError::Validation(
                "date, source and consumption are all required".to_string(),
            ));
        }

        let source = SourceCategory::parse(source)
            .ok_or_else(|| MeterError::Validation(format!("unknown source '{source}'")))?;
        let date = normalize_date(&CellValue::text(date))
            .ok_or_else(|| MeterError::Validation(format!("unreadable date '{date}'")))?;
        let consumption = parse_number_str(consumption).ok_or_else(|| {
            MeterError::Validation(format!("consumption '{consumption}' is not a number"))
        })?;

        Ok(ConsumptionRecord::new(date, source, consumption, consumption))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_valid_entry() {
        let record = ManualEntry::new("05/03/2024", "Coelba", "12.5").validate().unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(record.source, SourceCategory::Energy);
        assert_eq!(record.consumption, 12.5);
        assert_eq!(record.daily_delta, 12.5);
    }

    #[test]
    fn test_iso_date_and_water_alias() {
        let record = ManualEntry::new("2024-03-05", "água", "0,8").validate().unwrap();
        assert_eq!(record.source, SourceCategory::Water);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(record.consumption, 0.8);
    }

    #[test]
    fn test_from_cli_keeps_decimal_comma() {
        let entry = ManualEntry::from_cli("01/03/2024, embasa, 1234,5");
        assert_eq!(entry.consumption, "1234,5");
        assert_eq!(entry.validate().unwrap().consumption, 1234.5);
    }

    #[test]
    fn test_rejections() {
        let cases = [
            ManualEntry::new("", "coelba", "1"),
            ManualEntry::new("01/03/2024", "gas", "1"),
            ManualEntry::new("31/02/2024", "coelba", "1"),
            ManualEntry::new("01/03/2024", "coelba", "abc"),
            ManualEntry::from_cli("01/03/2024,coelba"),
        ];
        for entry in cases {
            assert!(
                matches!(entry.validate(), Err(MeterError::Validation(_))),
                "{entry:?} should be rejected"
            );
        }
    }
}
