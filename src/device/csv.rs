// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! `GetState.csv` wire format decoder.
//!
//! The device returns its entire state as one fixed-layout CSV document.
//! There is no header row; each line has a fixed semantic role:
//!
//! | row | content                                          |
//! |-----|--------------------------------------------------|
//! | 0   | SYSINFO: firmware version, device id, flags      |
//! | 1   | column labels (`n.a.` for unconnected channels)  |
//! | 2   | unit strings (`C`, `Bar`, `mV`, `pH`, `%`, `--`) |
//! | 3   | calibration offsets                              |
//! | 4   | scale factors                                    |
//! | 5   | raw integer readings                             |
//!
//! The displayed value of column i is `offset[i] + factor[i] * raw[i]`,
//! precomputed once per snapshot.
//!
//! Columns are positional: the device always sends the same layout and
//! labels unconnected channels `n.a.` instead of omitting them.

use std::ops::Range;
use std::str::FromStr;

use crate::device::relay::{self, RelayMode};
use crate::errors::ServiceError;

/// Internal processing timer (hours)
pub const COL_RANGE_TIME: Range<usize> = 0..1;
/// General purpose analog channels (mV, Bar or C depending on hardware)
pub const COL_RANGE_ANALOG: Range<usize> = 1..6;
/// Redox (mV) and pH electrodes
pub const COL_RANGE_ELECTRODES: Range<usize> = 6..8;
/// Up to eight temperature probes (C)
pub const COL_RANGE_TEMPERATURES: Range<usize> = 8..16;
/// Eight software switched relay outputs
pub const COL_RANGE_RELAYS: Range<usize> = 16..24;
/// Flow sensor (l/h) and digital I/O
pub const COL_RANGE_DIGITAL_INPUTS: Range<usize> = 24..28;
/// Eight optional external relay outputs
pub const COL_RANGE_EXTERNAL_RELAYS: Range<usize> = 28..36;
/// Chemical canister fill levels (%)
pub const COL_RANGE_CANISTERS: Range<usize> = 36..39;
/// Cumulative chemical usage (ml)
pub const COL_RANGE_CONSUMPTION: Range<usize> = 39..42;

/// Immutable snapshot of one `GetState.csv` response.
///
/// A new snapshot replaces the previous one on every poll cycle; it is
/// never mutated in place.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot {
    /// Tokens from row 0, e.g. `["SYSINFO", "1.7.6", "30217075", ...]`
    pub sysinfo: Vec<String>,
    /// Column labels from row 1, `n.a.` for unconnected channels
    pub names: Vec<String>,
    /// Unit strings from row 2
    pub units: Vec<String>,
    /// Per-column calibration offsets from row 3
    pub offsets: Vec<f64>,
    /// Per-column scale factors from row 4
    pub factors: Vec<f64>,
    /// Raw integer readings from row 5
    pub raws: Vec<i64>,
    /// Precomputed `offsets[i] + factors[i] * raws[i]`
    pub values: Vec<f64>,
}

impl FromStr for StateSnapshot {
    type Err = ServiceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        // some firmware versions append trailing blank lines
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if lines.len() < 6 {
            return Err(ServiceError::MalformedResponse(format!(
                "expected at least 6 rows in GetState.csv, got {}",
                lines.len()
            )));
        }

        let sysinfo = split_row(lines[0]);
        let names = split_row(lines[1]);
        let units = split_row(lines[2]);
        let offsets = parse_floats(lines[3], "offset")?;
        let factors = parse_floats(lines[4], "factor")?;
        // some firmware versions format the raw readings as floats ("124.0")
        let raws: Vec<i64> = parse_floats(lines[5], "raw")?
            .into_iter()
            .map(|v| v as i64)
            .collect();

        // an offset or factor row shorter than the raw row would drive an
        // out-of-range index below; fail instead of zero-padding
        if offsets.len() < raws.len() || factors.len() < raws.len() {
            return Err(ServiceError::MalformedResponse(format!(
                "inconsistent row lengths: {} raw values but {} offsets / {} factors",
                raws.len(),
                offsets.len(),
                factors.len()
            )));
        }

        let values = raws
            .iter()
            .enumerate()
            .map(|(i, &raw)| offsets[i] + factors[i] * raw as f64)
            .collect();

        Ok(Self {
            sysinfo,
            names,
            units,
            offsets,
            factors,
            raws,
            values,
        })
    }
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',').map(|token| token.trim().to_string()).collect()
}

fn parse_floats(line: &str, row: &str) -> Result<Vec<f64>, ServiceError> {
    line.split(',')
        .enumerate()
        .map(|(col, token)| {
            token.trim().parse::<f64>().map_err(|_| {
                ServiceError::MalformedResponse(format!(
                    "invalid {row} value '{}' in column {col}",
                    token.trim()
                ))
            })
        })
        .collect()
}

impl StateSnapshot {
    /// Firmware version from SYSINFO index 1, e.g. `1.7.6`.
    pub fn firmware(&self) -> &str {
        self.sysinfo.get(1).map(String::as_str).unwrap_or("unknown")
    }

    /// Unique device identifier from SYSINFO index 2, e.g. `30217075`.
    ///
    /// Stays stable across IP address changes; empty on very old firmware.
    pub fn device_id(&self) -> &str {
        self.sysinfo.get(2).map(String::as_str).unwrap_or_default()
    }

    /// Number of columns carrying a reading.
    pub fn column_count(&self) -> usize {
        self.raws.len()
    }

    /// `true` when column `col` has a real, non-placeholder label.
    ///
    /// The device labels channels that are not physically wired `n.a.`;
    /// those columns must not produce entities.
    pub fn is_active(&self, col: usize) -> bool {
        match self.names.get(col) {
            Some(name) => {
                let name = name.trim().to_lowercase();
                !(name.is_empty() || name == "n.a.")
            }
            None => false,
        }
    }

    /// Column label.
    pub fn name(&self, col: usize) -> &str {
        self.names.get(col).map(String::as_str).unwrap_or_default()
    }

    /// Raw CSV unit string of a column.
    pub fn unit(&self, col: usize) -> &str {
        self.units.get(col).map(String::as_str).unwrap_or_default()
    }

    /// Precomputed display value, `None` when the column is out of range.
    pub fn value(&self, col: usize) -> Option<f64> {
        self.values.get(col).copied()
    }

    /// Decoded mode of a relay column; out-of-range columns read as raw 0.
    pub fn relay_mode(&self, col: usize) -> RelayMode {
        relay::decode_mode(self.raws.get(col).copied().unwrap_or_default())
    }

    /// `true` when any external relay channel is wired up.
    pub fn has_external_relays(&self) -> bool {
        COL_RANGE_EXTERNAL_RELAYS.into_iter().any(|col| self.is_active(col))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::StateSnapshot;

    pub(crate) const COLS: usize = 42;

    /// CSV body resembling a typical installation: a handful of wired
    /// channels, two internal relays, one dimensionless digital input and
    /// everything else reported as `n.a.`.
    pub(crate) fn pool_csv() -> String {
        let mut names = vec!["n.a."; COLS];
        names[0] = "Zeit";
        names[1] = "Messwasser";
        names[6] = "Redox";
        names[7] = "pH";
        names[8] = "Pool";
        names[16] = "FilterPumpe N1";
        names[17] = "Waermepumpe";
        names[24] = "Durchfluss";
        names[25] = "Poolabdeckung";
        names[36] = "Kanister pH-";
        names[39] = "Verbrauch pH-";

        let mut units = vec!["--"; COLS];
        units[0] = "h";
        units[1] = "Bar";
        units[6] = "mV";
        units[7] = "pH";
        units[8] = "C";
        units[24] = "l/h";
        units[36] = "%";
        units[39] = "ml";

        let mut offsets = vec!["0.0"; COLS];
        offsets[8] = "-2.5";

        let mut factors = vec!["1.0"; COLS];
        factors[7] = "0.01";
        factors[8] = "0.25";

        let mut raws = vec!["0"; COLS];
        raws[0] = "2333";
        raws[6] = "681";
        raws[7] = "735";
        raws[8] = "100";
        raws[16] = "1";
        raws[17] = "3";
        raws[24] = "120";
        raws[25] = "1";
        raws[36] = "85";

        format!(
            "SYSINFO,1.7.6,30217075,0\n{}\n{}\n{}\n{}\n{}\n",
            names.join(","),
            units.join(","),
            offsets.join(","),
            factors.join(","),
            raws.join(",")
        )
    }

    pub(crate) fn pool_snapshot() -> StateSnapshot {
        pool_csv().parse().expect("fixture must parse")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{COLS, pool_csv, pool_snapshot};
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_decodes_sysinfo_and_values() {
        let snapshot = pool_snapshot();
        assert_eq!("1.7.6", snapshot.firmware());
        assert_eq!("30217075", snapshot.device_id());
        assert_eq!(COLS, snapshot.column_count());
        // -2.5 + 0.25 * 100
        assert_eq!(Some(22.5), snapshot.value(8));

        for i in 0..COLS {
            assert_eq!(
                snapshot.offsets[i] + snapshot.factors[i] * snapshot.raws[i] as f64,
                snapshot.values[i]
            );
        }
    }

    #[test]
    fn parse_is_deterministic() {
        assert_eq!(pool_snapshot(), pool_snapshot());
    }

    #[test]
    fn short_sysinfo_row_is_not_an_error() {
        let body = pool_csv().replacen("SYSINFO,1.7.6,30217075,0", "SYSINFO", 1);
        let snapshot: StateSnapshot = body.parse().unwrap();
        assert_eq!("unknown", snapshot.firmware());
        assert_eq!("", snapshot.device_id());
    }

    #[test]
    fn fewer_than_six_rows_is_malformed() {
        let body = pool_csv();
        let five_rows = body.lines().take(5).collect::<Vec<_>>().join("\n");
        assert!(matches!(
            five_rows.parse::<StateSnapshot>(),
            Err(ServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn blank_lines_and_crlf_are_tolerated() {
        let body = pool_csv().replace('\n', "\r\n") + "\r\n\r\n";
        assert_eq!(pool_snapshot(), body.parse::<StateSnapshot>().unwrap());
    }

    #[test]
    fn float_formatted_raw_values_truncate() {
        let body = "SYSINFO,1.0,1\na,b\n--,--\n0.0,0.0\n1.0,1.0\n3.0,124.9\n";
        let snapshot: StateSnapshot = body.parse().unwrap();
        assert_eq!(vec![3, 124], snapshot.raws);
        assert_eq!(RelayMode::On, relay::decode_mode(snapshot.raws[0]));
    }

    #[test]
    fn non_numeric_raw_is_malformed() {
        let body = "SYSINFO,1.0,1\na\n--\n0.0\n1.0\nxyz\n";
        assert!(matches!(
            body.parse::<StateSnapshot>(),
            Err(ServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn offsets_shorter_than_raws_is_malformed() {
        let body = "SYSINFO,1.0,1\na,b\n--,--\n0.0\n1.0,1.0\n5,6\n";
        assert!(matches!(
            body.parse::<StateSnapshot>(),
            Err(ServiceError::MalformedResponse(_))
        ));
    }

    #[rstest]
    #[case(0, true)] // "Zeit"
    #[case(2, false)] // "n.a."
    #[case(99, false)] // out of range
    fn active_columns(#[case] col: usize, #[case] expected: bool) {
        assert_eq!(expected, pool_snapshot().is_active(col));
    }

    #[test]
    fn external_relays_inactive_in_fixture() {
        let mut snapshot = pool_snapshot();
        assert!(!snapshot.has_external_relays());

        snapshot.names[28] = "Gartenlicht".to_string();
        assert!(snapshot.has_external_relays());
    }
}
