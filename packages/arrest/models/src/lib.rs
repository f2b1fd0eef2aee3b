#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Arrest record schema and demographic label domains.
//!
//! This crate defines the fixed tabular schema of the historic NYPD arrest
//! dataset: the raw CSV column names, the canonical lower-case names every
//! downstream consumer uses, and the enumerated label domains of the three
//! demographic dimensions (race, gender, age group).
//!
//! Record fields keep the raw source encoding as strings. The label enums
//! describe the *declared* domains that aggregations iterate over; they do
//! not constrain what a loaded record may contain.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Error returned when a label is not part of a fixed label domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLabelError {
    /// Name of the domain the label was checked against (e.g. `"race"`).
    pub domain: &'static str,
    /// The label that was provided.
    pub value: String,
}

impl std::fmt::Display for InvalidLabelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} label '{}'", self.domain, self.value)
    }
}

impl std::error::Error for InvalidLabelError {}

/// Perpetrator race as encoded in the `PERP_RACE` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Race {
    #[serde(rename = "BLACK")]
    #[strum(serialize = "BLACK")]
    Black,
    #[serde(rename = "ASIAN / PACIFIC ISLANDER")]
    #[strum(serialize = "ASIAN / PACIFIC ISLANDER")]
    AsianPacificIslander,
    #[serde(rename = "WHITE")]
    #[strum(serialize = "WHITE")]
    White,
    #[serde(rename = "WHITE HISPANIC")]
    #[strum(serialize = "WHITE HISPANIC")]
    WhiteHispanic,
    #[serde(rename = "BLACK HISPANIC")]
    #[strum(serialize = "BLACK HISPANIC")]
    BlackHispanic,
    #[serde(rename = "UNKNOWN")]
    #[strum(serialize = "UNKNOWN")]
    Unknown,
    #[serde(rename = "AMERICAN INDIAN/ALASKAN NATIVE")]
    #[strum(serialize = "AMERICAN INDIAN/ALASKAN NATIVE")]
    AmericanIndianAlaskanNative,
    #[serde(rename = "OTHER")]
    #[strum(serialize = "OTHER")]
    Other,
}

impl Race {
    /// Returns the raw label as it appears in the source data.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Black => "BLACK",
            Self::AsianPacificIslander => "ASIAN / PACIFIC ISLANDER",
            Self::White => "WHITE",
            Self::WhiteHispanic => "WHITE HISPANIC",
            Self::BlackHispanic => "BLACK HISPANIC",
            Self::Unknown => "UNKNOWN",
            Self::AmericanIndianAlaskanNative => "AMERICAN INDIAN/ALASKAN NATIVE",
            Self::Other => "OTHER",
        }
    }

    /// Returns the human-readable name used by chart legends.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Black => "Black",
            Self::AsianPacificIslander => "Asian/Pacific Islander",
            Self::White => "White",
            Self::WhiteHispanic => "White Hispanic",
            Self::BlackHispanic => "Black Hispanic",
            Self::Unknown => "Unknown",
            Self::AmericanIndianAlaskanNative => "American Indian/Alaskan Native",
            Self::Other => "Other",
        }
    }

    /// Parses a raw race label.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLabelError`] if the label is not one of the eight
    /// declared race labels.
    pub fn from_label(label: &str) -> Result<Self, InvalidLabelError> {
        label.parse().map_err(|_| InvalidLabelError {
            domain: "race",
            value: label.to_string(),
        })
    }

    /// Returns all variants in declared order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Black,
            Self::AsianPacificIslander,
            Self::White,
            Self::WhiteHispanic,
            Self::BlackHispanic,
            Self::Unknown,
            Self::AmericanIndianAlaskanNative,
            Self::Other,
        ]
    }
}

/// Perpetrator sex as encoded in the `PERP_SEX` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Gender {
    #[serde(rename = "M")]
    #[strum(serialize = "M")]
    Male,
    #[serde(rename = "F")]
    #[strum(serialize = "F")]
    Female,
}

impl Gender {
    /// Returns the raw label as it appears in the source data.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    /// Returns the human-readable name used by chart legends.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Returns all variants in declared order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Male, Self::Female]
    }
}

/// Perpetrator age bracket as encoded in the `AGE_GROUP` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AgeGroup {
    #[serde(rename = "<18")]
    #[strum(serialize = "<18")]
    Under18,
    #[serde(rename = "18-24")]
    #[strum(serialize = "18-24")]
    From18To24,
    #[serde(rename = "25-44")]
    #[strum(serialize = "25-44")]
    From25To44,
    #[serde(rename = "45-64")]
    #[strum(serialize = "45-64")]
    From45To64,
    #[serde(rename = "65+")]
    #[strum(serialize = "65+")]
    Over65,
}

impl AgeGroup {
    /// Returns the raw label as it appears in the source data.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Under18 => "<18",
            Self::From18To24 => "18-24",
            Self::From25To44 => "25-44",
            Self::From45To64 => "45-64",
            Self::Over65 => "65+",
        }
    }

    /// Returns all variants in declared order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Under18,
            Self::From18To24,
            Self::From25To44,
            Self::From45To64,
            Self::Over65,
        ]
    }
}

/// A demographic dimension that records can be grouped along.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Dimension {
    #[serde(rename = "race")]
    #[strum(serialize = "race")]
    Race,
    #[serde(rename = "gender")]
    #[strum(serialize = "gender")]
    Gender,
    #[serde(rename = "age group")]
    #[strum(to_string = "age group", serialize = "age_group")]
    AgeGroup,
}

impl Dimension {
    /// Returns the declared labels of this dimension, in declared order.
    #[must_use]
    pub fn labels(self) -> Vec<&'static str> {
        match self {
            Self::Race => Race::all().iter().map(|r| r.label()).collect(),
            Self::Gender => Gender::all().iter().map(|g| g.label()).collect(),
            Self::AgeGroup => AgeGroup::all().iter().map(|a| a.label()).collect(),
        }
    }

    /// Returns the canonical column this dimension reads from.
    #[must_use]
    pub const fn column(self) -> Column {
        match self {
            Self::Race => Column::Race,
            Self::Gender => Column::Gender,
            Self::AgeGroup => Column::AgeGroup,
        }
    }

    /// Parses a dimension selector (`race`, `gender` or `age group`).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLabelError`] if the selector names no dimension.
    pub fn from_selector(selector: &str) -> Result<Self, InvalidLabelError> {
        selector.parse().map_err(|_| InvalidLabelError {
            domain: "dimension",
            value: selector.to_string(),
        })
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Race, Self::Gender, Self::AgeGroup]
    }
}

/// A column of the arrest schema.
///
/// Each column has a raw name (as found in the CSV header) and a canonical
/// lower-case name used by every component after the year filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    ArrestDate,
    OffenseDescription,
    AgeGroup,
    Gender,
    Race,
    LawCode,
    Longitude,
    Latitude,
}

impl Column {
    /// Returns the column name in the raw CSV header.
    #[must_use]
    pub const fn raw_name(self) -> &'static str {
        match self {
            Self::ArrestDate => "ARREST_DATE",
            Self::OffenseDescription => "OFNS_DESC",
            Self::AgeGroup => "AGE_GROUP",
            Self::Gender => "PERP_SEX",
            Self::Race => "PERP_RACE",
            Self::LawCode => "LAW_CODE",
            Self::Longitude => "Longitude",
            Self::Latitude => "Latitude",
        }
    }

    /// Returns the canonical lower-case column name.
    #[must_use]
    pub const fn canonical_name(self) -> &'static str {
        match self {
            Self::ArrestDate => "arrest date",
            Self::OffenseDescription => "offense description",
            Self::AgeGroup => "age group",
            Self::Gender => "gender",
            Self::Race => "race",
            Self::LawCode => "law code",
            Self::Longitude => "longitude",
            Self::Latitude => "latitude",
        }
    }

    /// Columns every loaded record is guaranteed to carry.
    #[must_use]
    pub const fn required() -> &'static [Self] {
        &[
            Self::ArrestDate,
            Self::OffenseDescription,
            Self::AgeGroup,
            Self::Gender,
            Self::Race,
            Self::Longitude,
            Self::Latitude,
        ]
    }
}

/// A single arrest event.
///
/// Serializes under the canonical column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrestRecord {
    /// Arrest date as encoded in the source (`MM/DD/YYYY`).
    #[serde(rename = "arrest date")]
    pub arrest_date: String,
    /// Offense description (e.g. `"DANGEROUS DRUGS"`).
    #[serde(rename = "offense description")]
    pub offense_description: String,
    /// Age group label (e.g. `"25-44"`).
    #[serde(rename = "age group")]
    pub age_group: String,
    /// Sex label (`"M"` or `"F"`).
    pub gender: String,
    /// Race label (e.g. `"WHITE HISPANIC"`).
    pub race: String,
    /// Penal law code, when the source carries it.
    #[serde(rename = "law code", default, skip_serializing_if = "Option::is_none")]
    pub law_code: Option<String>,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

impl ArrestRecord {
    /// Returns the raw value of the field backing `dimension`.
    #[must_use]
    pub fn field(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Race => &self.race,
            Dimension::Gender => &self.gender,
            Dimension::AgeGroup => &self.age_group,
        }
    }

    /// Returns the arrest location.
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Squared Euclidean distance in degree space.
    #[must_use]
    pub fn distance_sq(&self, other: &Self) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlng = self.longitude - other.longitude;
        dlat.mul_add(dlat, dlng * dlng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn race_labels_round_trip_through_parse() {
        for race in Race::all() {
            assert_eq!(Race::from_label(race.label()).unwrap(), *race);
            assert_eq!(race.to_string(), race.label());
        }
    }

    #[test]
    fn rejects_unknown_race_label() {
        let err = Race::from_label("PURPLE").unwrap_err();
        assert_eq!(err.domain, "race");
        assert_eq!(err.value, "PURPLE");
    }

    #[test]
    fn dimension_labels_preserve_declared_order() {
        assert_eq!(Dimension::Gender.labels(), vec!["M", "F"]);
        assert_eq!(
            Dimension::AgeGroup.labels(),
            vec!["<18", "18-24", "25-44", "45-64", "65+"]
        );
        assert_eq!(Dimension::Race.labels().len(), 8);
        assert_eq!(Dimension::Race.labels()[0], "BLACK");
    }

    #[test]
    fn parses_dimension_selectors() {
        assert_eq!(Dimension::from_selector("race").unwrap(), Dimension::Race);
        assert_eq!(
            Dimension::from_selector("age group").unwrap(),
            Dimension::AgeGroup
        );
        assert_eq!(
            Dimension::from_selector("age_group").unwrap(),
            Dimension::AgeGroup
        );
        assert!(Dimension::from_selector("height").is_err());
    }

    #[test]
    fn canonical_names_are_lowercase() {
        for column in Column::required() {
            let name = column.canonical_name();
            assert_eq!(name, name.to_lowercase(), "{column:?}");
        }
    }

    #[test]
    fn record_serializes_with_canonical_names() {
        let record = ArrestRecord {
            arrest_date: "01/02/2016".to_string(),
            offense_description: "ROBBERY".to_string(),
            age_group: "25-44".to_string(),
            gender: "M".to_string(),
            race: "BLACK".to_string(),
            law_code: None,
            latitude: 40.7,
            longitude: -73.9,
        };
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        for column in Column::required() {
            assert!(
                obj.contains_key(column.canonical_name()),
                "missing {}",
                column.canonical_name()
            );
        }
        assert!(!obj.contains_key("law code"));
    }
}
