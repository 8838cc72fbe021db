//! Channel label cleanup for the BCI2000 EDF exports.
//!
//! Labels arrive padded with dots (`Fc5.`, `Cz..`) and in mixed case. They are
//! stripped, uppercased and then the electrodes whose 10-05 spelling carries a
//! lowercase letter are mapped back to that spelling.

use crate::signal::Raw;

/// Uppercased label to canonical 10-05 spelling.
pub const CANONICAL_NAMES: [(&str, &str); 12] = [
    ("AFZ", "AFz"),
    ("PZ", "Pz"),
    ("FPZ", "Fpz"),
    ("FCZ", "FCz"),
    ("FP1", "Fp1"),
    ("CZ", "Cz"),
    ("OZ", "Oz"),
    ("POZ", "POz"),
    ("IZ", "Iz"),
    ("CPZ", "CPz"),
    ("FP2", "Fp2"),
    ("FZ", "Fz"),
];

/// Normalize one channel label. Labels outside the canonical table pass through
/// stripped and uppercased.
pub fn normalize_channel_name(name: &str) -> String {
    let upper = name.trim_matches('.').to_uppercase();
    CANONICAL_NAMES
        .iter()
        .find(|(from, _)| *from == upper)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or(upper)
}

/// Apply [`normalize_channel_name`] to every channel of `raw`.
pub fn normalize_channel_names(raw: &mut Raw) {
    raw.rename_channels(normalize_channel_name);
}
