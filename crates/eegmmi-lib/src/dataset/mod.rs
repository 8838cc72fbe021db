//! PhysioNet EEG Motor Movement/Imagery dataset.
//!
//! 109 volunteers, 64-channel EEG recorded with BCI2000. Each subject performed
//! 14 runs: two one-minute baselines (eyes open, eyes closed) and three
//! two-minute runs of each task:
//!
//! 1. open and close the left or right fist (hand, executed),
//! 2. imagine opening and closing the left or right fist (hand, imagined),
//! 3. open and close both fists or both feet (feet, executed),
//! 4. imagine opening and closing both fists or both feet (feet, imagined).
//!
//! Schalk et al., "BCI2000: a general-purpose brain-computer interface (BCI)
//! system", IEEE TBME 51(6), 2004.

pub mod runs;

pub use runs::{resolve_run_set, RunRole, RunSelectionPolicy, RunSpec};

use crate::channels::normalize_channel_names;
use crate::config::DatasetConfig;
use crate::error::{DatasetError, Result};
use crate::fetch::{PhysioNetSource, RunSource};
use crate::montage::Montage;
use crate::signal::{remap_marker_codes, Raw};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const SUBJECT_COUNT: u32 = 109;

/// The only session key ever produced.
pub const SESSION: &str = "session_0";

/// Run label to recording.
pub type SessionData = BTreeMap<String, Raw>;

/// Session key to runs, e.g. `{"session_0": {"run_4": ..}}`.
pub type SubjectData = BTreeMap<String, SessionData>;

/// Class labels carried by the marker channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCode {
    Rest = 1,
    LeftHand = 2,
    RightHand = 3,
    Hands = 4,
    Feet = 5,
}

impl EventCode {
    pub const ALL: [EventCode; 5] = [
        EventCode::Rest,
        EventCode::LeftHand,
        EventCode::RightHand,
        EventCode::Hands,
        EventCode::Feet,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            EventCode::Rest => "rest",
            EventCode::LeftHand => "left_hand",
            EventCode::RightHand => "right_hand",
            EventCode::Hands => "hands",
            EventCode::Feet => "feet",
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.code() == code)
    }
}

/// Feet runs share T1/T2 with hand runs; their decoded 2/3 mean hands/feet.
///
/// Assumes both `T1` and `T2` occur in the run. Without `T1`, `T2` decodes
/// to 2 and is mapped to hands.
pub fn feet_code_remap() -> BTreeMap<i32, i32> {
    BTreeMap::from([
        (EventCode::LeftHand.code(), EventCode::Hands.code()),
        (EventCode::RightHand.code(), EventCode::Feet.code()),
    ])
}

/// Descriptive metadata consumed by paradigm/evaluation code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetMetadata {
    pub code: String,
    pub subjects: Vec<u32>,
    pub sessions_per_subject: u32,
    pub events: BTreeMap<String, i32>,
    /// Trial window in seconds relative to the marker. Trials are 4 s apart;
    /// the task duration itself is not documented upstream.
    pub interval: [f64; 2],
    pub paradigm: String,
    pub doi: String,
}

pub fn validate_subject(subject: u32) -> Result<()> {
    if (1..=SUBJECT_COUNT).contains(&subject) {
        Ok(())
    } else {
        Err(DatasetError::InvalidSubject(subject))
    }
}

/// Dataset adapter: resolves runs, fetches them through a [`RunSource`] and
/// shapes them into [`SubjectData`].
pub struct PhysionetMI<S = PhysioNetSource> {
    policy: RunSelectionPolicy,
    source: S,
    montage: Montage,
}

impl PhysionetMI<PhysioNetSource> {
    pub fn new(policy: RunSelectionPolicy, config: DatasetConfig) -> Self {
        Self::with_source(policy, PhysioNetSource::new(config))
    }
}

impl<S: RunSource> PhysionetMI<S> {
    pub fn with_source(policy: RunSelectionPolicy, source: S) -> Self {
        Self {
            policy,
            source,
            montage: Montage::standard_1005(),
        }
    }

    pub fn policy(&self) -> &RunSelectionPolicy {
        &self.policy
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn metadata(&self) -> DatasetMetadata {
        DatasetMetadata {
            code: "Physionet Motor Imagery".to_string(),
            subjects: (1..=SUBJECT_COUNT).collect(),
            sessions_per_subject: 1,
            events: EventCode::ALL
                .into_iter()
                .map(|event| (event.name().to_string(), event.code()))
                .collect(),
            interval: [0.0, 3.0],
            paradigm: "imagery".to_string(),
            doi: "10.1109/TBME.2004.827072".to_string(),
        }
    }

    /// Runs fetched per subject under this adapter's policy.
    pub fn runs(&self) -> Vec<RunSpec> {
        resolve_run_set(&self.policy)
    }

    /// Fetch one run with normalized channel names, the 10-05 montage and a
    /// `STI 014` marker channel built from the annotations. Codes are the raw
    /// decoded ones; no per-run remapping happens here.
    pub fn fetch_run(&self, subject: u32, run: RunSpec) -> Result<Raw> {
        let path = self.source.locate(subject, run.index)?;
        let mut raw = self.source.read(&path)?;
        normalize_channel_names(&mut raw);
        raw.set_montage(&self.montage)?;
        let (events, event_id) = raw.events_from_annotations();
        debug!(
            "subject {subject} run {}: {} events, ids {:?}",
            run.index,
            events.len(),
            event_id
        );
        raw.add_marker_channel(&events)?;
        Ok(raw)
    }

    /// Fetch every run of the run set into `{"session_0": {label: raw}}`.
    /// Feet runs have their marker codes remapped to hands/feet.
    pub fn fetch_subject(&self, subject: u32) -> Result<SubjectData> {
        let remap = feet_code_remap();
        let mut session = SessionData::new();
        for run in self.runs() {
            let mut raw = self.fetch_run(subject, run)?;
            if run.role.is_feet() {
                raw = remap_marker_codes(&raw, &remap);
            }
            session.insert(run.label(), raw);
        }
        info!("subject {subject}: loaded {} runs", session.len());
        Ok(SubjectData::from([(SESSION.to_string(), session)]))
    }

    /// Local paths for `runs` of `subject`, fetching missing files; nothing is decoded.
    pub fn resolve_paths(&self, subject: u32, runs: &[RunSpec]) -> Result<Vec<PathBuf>> {
        validate_subject(subject)?;
        runs.iter()
            .map(|run| self.source.locate(subject, run.index))
            .collect()
    }

    /// [`resolve_paths`](Self::resolve_paths) for this adapter's run set.
    pub fn data_path(&self, subject: u32) -> Result<Vec<PathBuf>> {
        self.resolve_paths(subject, &self.runs())
    }

    /// Subject-level mapping for several subjects. All ids are validated before
    /// anything is fetched.
    pub fn get_data(&self, subjects: &[u32]) -> Result<BTreeMap<u32, SubjectData>> {
        for &subject in subjects {
            validate_subject(subject)?;
        }
        subjects
            .iter()
            .map(|&subject| Ok((subject, self.fetch_subject(subject)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{ChannelKind, STIM_CHANNEL_NAME};
    use crate::test_support::FakeSource;
    use std::collections::BTreeSet;

    fn stim_values(raw: &Raw) -> BTreeSet<i32> {
        let idx = raw.channel_index(STIM_CHANNEL_NAME).unwrap();
        raw.channel_data(idx)
            .unwrap()
            .iter()
            .map(|v| *v as i32)
            .collect()
    }

    #[test]
    fn subject_data_has_expected_labels() {
        let dataset = PhysionetMI::with_source(RunSelectionPolicy::default(), FakeSource::new());
        let data = dataset.fetch_subject(1).unwrap();
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["session_0"]);
        let session = &data[SESSION];
        let labels: BTreeSet<&str> = session.keys().map(String::as_str).collect();
        let expected: BTreeSet<&str> = [
            "baseline_eye_open",
            "baseline_eye_closed",
            "run_4",
            "run_8",
            "run_12",
            "run_6",
            "run_10",
            "run_14",
        ]
        .into_iter()
        .collect();
        assert_eq!(labels, expected);
        assert_eq!(dataset.source().calls(), 8);
    }

    #[test]
    fn every_run_gains_exactly_one_marker_channel() {
        let source = FakeSource::new();
        let decoded = source.read(&source.locate(1, 4).unwrap()).unwrap();
        let dataset = PhysionetMI::with_source(RunSelectionPolicy::default(), source);
        for (label, raw) in &dataset.fetch_subject(1).unwrap()[SESSION] {
            assert_eq!(raw.n_channels(), decoded.n_channels() + 1, "{label}");
            let stims: Vec<_> = raw
                .channels()
                .iter()
                .filter(|ch| ch.kind == ChannelKind::Stim)
                .collect();
            assert_eq!(stims.len(), 1);
            assert_eq!(stims[0].name, STIM_CHANNEL_NAME);
            assert_eq!(raw.channel_data(raw.n_channels() - 1).unwrap().len(), raw.n_times());
        }
    }

    #[test]
    fn feet_runs_carry_hands_and_feet_codes() {
        let policy = RunSelectionPolicy {
            imagined: true,
            executed: true,
        };
        let dataset = PhysionetMI::with_source(policy, FakeSource::new());
        let data = dataset.fetch_subject(12).unwrap();
        for run in dataset.runs() {
            let values = stim_values(&data[SESSION][&run.label()]);
            if run.role.is_feet() {
                assert_eq!(values, BTreeSet::from([0, 1, 4, 5]), "run {}", run.index);
            } else if run.role.is_baseline() {
                assert_eq!(values, BTreeSet::from([0, 1]), "run {}", run.index);
            } else {
                assert_eq!(values, BTreeSet::from([0, 1, 2, 3]), "run {}", run.index);
            }
        }
    }

    #[test]
    fn fetched_runs_use_canonical_names_and_positions() {
        let dataset = PhysionetMI::with_source(RunSelectionPolicy::default(), FakeSource::new());
        let raw = dataset
            .fetch_run(1, RunSpec::from_index(4).unwrap())
            .unwrap();
        assert!(raw.channel_index("Fpz").is_some());
        assert!(raw.channel_index("FCz").is_some());
        assert!(raw.channel_index("Fc5.").is_none());
        assert!(raw
            .channels()
            .iter()
            .filter(|ch| ch.kind == ChannelKind::Eeg)
            .all(|ch| ch.position.is_some()));
    }

    #[test]
    fn unknown_channel_fails_montage() {
        let source = FakeSource::new().with_extra_label("Xx1.");
        let dataset = PhysionetMI::with_source(RunSelectionPolicy::default(), source);
        let err = dataset
            .fetch_run(1, RunSpec::from_index(1).unwrap())
            .unwrap_err();
        match err {
            DatasetError::Montage { missing } => assert_eq!(missing, vec!["XX1".to_string()]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn resolve_paths_validates_subject_before_fetching() {
        let dataset = PhysionetMI::with_source(RunSelectionPolicy::default(), FakeSource::new());
        for subject in [0, 110] {
            let err = dataset.data_path(subject).unwrap_err();
            assert!(matches!(err, DatasetError::InvalidSubject(s) if s == subject));
        }
        assert_eq!(dataset.source().calls(), 0);
        for subject in [1, 109] {
            let paths = dataset.data_path(subject).unwrap();
            assert_eq!(paths.len(), 8);
            assert!(paths[2].ends_with(format!("S{subject:03}R04.edf")));
        }
    }

    #[test]
    fn get_data_rejects_any_invalid_subject_up_front() {
        let dataset = PhysionetMI::with_source(RunSelectionPolicy::default(), FakeSource::new());
        let err = dataset.get_data(&[1, 2, 200]).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidSubject(200)));
        assert_eq!(dataset.source().calls(), 0);
        let data = dataset.get_data(&[3, 4]).unwrap();
        assert_eq!(data.keys().copied().collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn metadata_declares_vocabulary() {
        let dataset = PhysionetMI::with_source(RunSelectionPolicy::default(), FakeSource::new());
        let meta = dataset.metadata();
        assert_eq!(meta.subjects.len(), 109);
        assert_eq!(meta.subjects.first(), Some(&1));
        assert_eq!(meta.subjects.last(), Some(&109));
        assert_eq!(meta.events["left_hand"], 2);
        assert_eq!(meta.events["feet"], 5);
        assert_eq!(meta.events["rest"], 1);
        assert_eq!(meta.interval, [0.0, 3.0]);
        assert_eq!(meta.paradigm, "imagery");
        assert_eq!(EventCode::from_code(4), Some(EventCode::Hands));
        assert_eq!(EventCode::from_code(0), None);
    }
}
