//! Standard 10-05 electrode montage on a spherical head.
//!
//! Positions are derived from the electrode name: the row prefix fixes the
//! sagittal step away from Cz (one 10% step is 22.5 degrees of arc, Fpz and Oz
//! sit on the equator) and the number fixes how far the electrode lies along
//! the arc from the midline to the row's 7/8 electrode on the equator. Odd
//! numbers are left (negative x), even numbers right. Coordinates are in
//! metres in a head frame with x right, y anterior and z up.

use crate::error::{DatasetError, Result};
use crate::signal::{ChannelKind, Raw};
use std::collections::BTreeMap;

pub const HEAD_RADIUS: f64 = 0.095;

const SAGITTAL_STEP_DEG: f64 = 22.5;
const CIRCUMFERENCE_STEP_DEG: f64 = 18.0;

/// (prefix, prefix used from column 7 outward, signed 10% steps from Cz).
const ROWS: [(&str, &str, f64); 19] = [
    ("Fp", "Fp", -4.0),
    ("AFp", "AFp", -3.5),
    ("AF", "AF", -3.0),
    ("AFF", "AFF", -2.5),
    ("F", "F", -2.0),
    ("FFC", "FFT", -1.5),
    ("FC", "FT", -1.0),
    ("FCC", "FTT", -0.5),
    ("C", "T", 0.0),
    ("CCP", "TTP", 0.5),
    ("CP", "TP", 1.0),
    ("CPP", "TPP", 1.5),
    ("P", "P", 2.0),
    ("PPO", "PPO", 2.5),
    ("PO", "PO", 3.0),
    ("POO", "POO", 3.5),
    ("O", "O", 4.0),
    ("OI", "OI", 4.5),
    ("I", "I", 5.0),
];

/// Pre-10-10 temporal labels still found in older recordings.
const LEGACY_ALIASES: [(&str, &str); 4] = [("T3", "T7"), ("T4", "T8"), ("T5", "P7"), ("T6", "P8")];

/// Electrode name to 3-D position.
#[derive(Debug, Clone)]
pub struct Montage {
    kind: String,
    positions: BTreeMap<String, [f64; 3]>,
}

impl Montage {
    /// The 10-05 system, including the 10-10 and 10-20 subsets.
    pub fn standard_1005() -> Self {
        let mut positions = BTreeMap::new();
        for &(prefix, lateral_prefix, row) in &ROWS {
            if row.abs() >= 4.0 {
                insert_ring_row(&mut positions, prefix, row);
            } else {
                insert_arc_row(&mut positions, prefix, lateral_prefix, row);
            }
        }
        positions.insert("Nz".to_string(), scaled(spherical(5.0 * SAGITTAL_STEP_DEG, 0.0)));
        for (alias, target) in LEGACY_ALIASES {
            if let Some(pos) = positions.get(target).copied() {
                positions.insert(alias.to_string(), pos);
            }
        }
        Self {
            kind: "standard_1005".to_string(),
            positions,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Case-sensitive lookup.
    pub fn position(&self, name: &str) -> Option<[f64; 3]> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }
}

impl Raw {
    /// Attach positions from `montage` to every EEG channel.
    ///
    /// Fails without modifying the recording when any EEG channel name is not in
    /// the montage. Stim channels are left without a position.
    pub fn set_montage(&mut self, montage: &Montage) -> Result<()> {
        let missing: Vec<String> = self
            .channels()
            .iter()
            .filter(|ch| ch.kind == ChannelKind::Eeg && !montage.contains(&ch.name))
            .map(|ch| ch.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(DatasetError::Montage { missing });
        }
        for ch in self.channels_mut() {
            if ch.kind == ChannelKind::Eeg {
                ch.position = montage.position(&ch.name);
            }
        }
        Ok(())
    }
}

/// Rows that follow the head circumference (Fp, O) or run below it (OI, I).
/// Only the midline and the first electrode pair exist there.
fn insert_ring_row(positions: &mut BTreeMap<String, [f64; 3]>, prefix: &str, row: f64) {
    let polar = row.abs() * SAGITTAL_STEP_DEG;
    let posterior = row > 0.0;
    positions.insert(format!("{prefix}z"), scaled(midline(polar, posterior)));
    for (suffix, steps) in [("1", 1.0), ("1h", 0.5), ("2", 1.0), ("2h", 0.5)] {
        let left = suffix.starts_with('1');
        let offset = CIRCUMFERENCE_STEP_DEG * steps;
        let azimuth = if posterior { 180.0 - offset } else { offset };
        let azimuth = if left { -azimuth } else { azimuth };
        positions.insert(format!("{prefix}{suffix}"), scaled(spherical(polar, azimuth)));
    }
}

/// Rows whose electrodes lie on the great circle from the midline electrode to
/// the 7/8 electrode on the equator. Column 9/10 continues past the equator.
fn insert_arc_row(
    positions: &mut BTreeMap<String, [f64; 3]>,
    prefix: &str,
    lateral_prefix: &str,
    row: f64,
) {
    let posterior = row > 0.0;
    let mid = midline(row.abs() * SAGITTAL_STEP_DEG, posterior);
    positions.insert(format!("{prefix}z"), scaled(mid));
    let equator_azimuth = 90.0 + CIRCUMFERENCE_STEP_DEG * row;
    for number in 1u32..=10 {
        let left = number % 2 == 1;
        let label_prefix = if number >= 7 { lateral_prefix } else { prefix };
        let edge = spherical(
            90.0,
            if left { -equator_azimuth } else { equator_azimuth },
        );
        let steps = f64::from((number + 1) / 2);
        for (suffix, steps) in [("", steps), ("h", steps - 0.5)] {
            let pos = slerp(mid, edge, steps / 4.0);
            positions.insert(format!("{label_prefix}{number}{suffix}"), scaled(pos));
        }
    }
}

fn midline(polar: f64, posterior: bool) -> [f64; 3] {
    spherical(polar, if posterior { 180.0 } else { 0.0 })
}

/// Unit vector from polar angle (off +z) and azimuth (from +y toward +x), degrees.
fn spherical(polar_deg: f64, azimuth_deg: f64) -> [f64; 3] {
    let (theta, phi) = (polar_deg.to_radians(), azimuth_deg.to_radians());
    [
        theta.sin() * phi.sin(),
        theta.sin() * phi.cos(),
        theta.cos(),
    ]
}

fn slerp(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    let dot = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]).clamp(-1.0, 1.0);
    let omega = dot.acos();
    if omega < 1e-9 {
        return a;
    }
    let wa = ((1.0 - t) * omega).sin() / omega.sin();
    let wb = (t * omega).sin() / omega.sin();
    [
        wa * a[0] + wb * b[0],
        wa * a[1] + wb * b[1],
        wa * a[2] + wb * b[2],
    ]
}

fn scaled(unit: [f64; 3]) -> [f64; 3] {
    [unit[0] * HEAD_RADIUS, unit[1] * HEAD_RADIUS, unit[2] * HEAD_RADIUS]
}
