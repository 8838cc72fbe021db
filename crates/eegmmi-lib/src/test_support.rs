use crate::error::Result;
use crate::fetch::RunSource;
use crate::signal::{Annotation, ChannelInfo, Raw};
use std::cell::Cell;
use std::path::{Path, PathBuf};

/// Labels as they appear in the eegmmidb EDF headers.
pub(crate) const EEGMMIDB_LABELS: [&str; 64] = [
    "Fc5.", "Fc3.", "Fc1.", "Fcz.", "Fc2.", "Fc4.", "Fc6.", "C5..", "C3..", "C1..", "Cz..", "C2..",
    "C4..", "C6..", "Cp5.", "Cp3.", "Cp1.", "Cpz.", "Cp2.", "Cp4.", "Cp6.", "Fp1.", "Fpz.", "Fp2.",
    "Af7.", "Af3.", "Afz.", "Af4.", "Af8.", "F7..", "F5..", "F3..", "F1..", "Fz..", "F2..", "F4..",
    "F6..", "F8..", "Ft7.", "Ft8.", "T7..", "T8..", "T9..", "T10.", "Tp7.", "Tp8.", "P7..", "P5..",
    "P3..", "P1..", "Pz..", "P2..", "P4..", "P6..", "P8..", "Po7.", "Po3.", "Poz.", "Po4.", "Po8.",
    "O1..", "Oz..", "O2..", "Iz..",
];

const SFREQ: f64 = 160.0;
const N_TIMES: usize = 160 * 30;

/// In-memory stand-in for the PhysioNet archive. Baseline runs carry only
/// `T0`; task runs cycle `T0, T1, T0, T2` every 4.2 s.
pub(crate) struct FakeSource {
    calls: Cell<usize>,
    extra_label: Option<&'static str>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self {
            calls: Cell::new(0),
            extra_label: None,
        }
    }

    pub(crate) fn with_extra_label(mut self, label: &'static str) -> Self {
        self.extra_label = Some(label);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

fn run_from_path(path: &Path) -> u8 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.split_once('R'))
        .and_then(|(_, run)| run.parse().ok())
        .unwrap_or(0)
}

impl RunSource for FakeSource {
    fn locate(&self, subject: u32, run: u8) -> Result<PathBuf> {
        self.calls.set(self.calls.get() + 1);
        Ok(PathBuf::from(format!("S{subject:03}")).join(format!("S{subject:03}R{run:02}.edf")))
    }

    fn read(&self, path: &Path) -> Result<Raw> {
        let run = run_from_path(path);
        let mut labels: Vec<&str> = EEGMMIDB_LABELS.to_vec();
        labels.extend(self.extra_label);
        let channels = labels.into_iter().map(ChannelInfo::eeg).collect::<Vec<_>>();
        let data = (0..channels.len())
            .map(|ch| {
                (0..N_TIMES)
                    .map(|t| ((t + ch) as f64 / SFREQ).sin() * 1e-5)
                    .collect()
            })
            .collect();
        let annotations = if run <= 2 {
            vec![Annotation {
                onset: 0.0,
                duration: 60.0,
                description: "T0".into(),
            }]
        } else {
            (0..7)
                .map(|i| Annotation {
                    onset: i as f64 * 4.2,
                    duration: 4.1,
                    description: ["T0", "T1", "T0", "T2"][i % 4].into(),
                })
                .collect()
        };
        Ok(Raw::new(SFREQ, channels, data)?.with_annotations(annotations))
    }
}
