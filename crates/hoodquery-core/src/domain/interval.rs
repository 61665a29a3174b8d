use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Bar width accepted by the historicals endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "5minute")]
    FiveMinutes,
    #[serde(rename = "10minute")]
    TenMinutes,
    #[serde(rename = "hour")]
    Hour,
    #[default]
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "week")]
    Week,
}

impl Interval {
    pub const ALL: [Self; 5] = [
        Self::FiveMinutes,
        Self::TenMinutes,
        Self::Hour,
        Self::Day,
        Self::Week,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FiveMinutes => "5minute",
            Self::TenMinutes => "10minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }

    pub fn allowed_values() -> String {
        join_values(Self::ALL.iter().map(|value| value.as_str()))
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidInterval {
                value: value.to_owned(),
                allowed: Self::allowed_values(),
            })
    }
}

/// Lookback window accepted by the historicals endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Span {
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "week")]
    Week,
    #[default]
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "3month")]
    ThreeMonths,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "5year")]
    FiveYears,
}

impl Span {
    pub const ALL: [Self; 6] = [
        Self::Day,
        Self::Week,
        Self::Month,
        Self::ThreeMonths,
        Self::Year,
        Self::FiveYears,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::ThreeMonths => "3month",
            Self::Year => "year",
            Self::FiveYears => "5year",
        }
    }

    pub fn allowed_values() -> String {
        join_values(Self::ALL.iter().map(|value| value.as_str()))
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Span {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidSpan {
                value: value.to_owned(),
                allowed: Self::allowed_values(),
            })
    }
}

fn join_values<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(", ")
}
