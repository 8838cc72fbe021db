use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name of the synthetic marker channel appended to every run.
pub const STIM_CHANNEL_NAME: &str = "STI 014";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Eeg,
    Stim,
}

/// Per-channel metadata. `position` is filled in by a montage (metres, head frame).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    pub kind: ChannelKind,
    pub position: Option<[f64; 3]>,
}

impl ChannelInfo {
    pub fn eeg(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ChannelKind::Eeg,
            position: None,
        }
    }

    pub fn stim(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ChannelKind::Stim,
            position: None,
        }
    }
}

/// Free-text annotation with onset and duration in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub onset: f64,
    pub duration: f64,
    pub description: String,
}

/// Discrete event: sample offset plus integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub sample: usize,
    pub code: i32,
}

/// Continuous multichannel recording (channels x samples) with its metadata.
#[derive(Debug, Clone)]
pub struct Raw {
    sfreq: f64,
    channels: Vec<ChannelInfo>,
    data: Vec<Vec<f64>>,
    annotations: Vec<Annotation>,
}

impl Raw {
    /// Build a recording; every row of `data` must match the channel list and share one length.
    pub fn new(sfreq: f64, channels: Vec<ChannelInfo>, data: Vec<Vec<f64>>) -> Result<Self> {
        if channels.len() != data.len() {
            return Err(DatasetError::Shape(format!(
                "{} channel descriptors for {} data rows",
                channels.len(),
                data.len()
            )));
        }
        if let Some(first) = data.first() {
            if let Some((idx, row)) = data.iter().enumerate().find(|(_, r)| r.len() != first.len())
            {
                return Err(DatasetError::Shape(format!(
                    "channel {} has {} samples, expected {}",
                    channels[idx].name,
                    row.len(),
                    first.len()
                )));
            }
        }
        if sfreq.is_nan() || sfreq <= 0.0 {
            return Err(DatasetError::Shape(format!(
                "sampling rate must be positive, got {sfreq}"
            )));
        }
        Ok(Self {
            sfreq,
            channels,
            data,
            annotations: Vec::new(),
        })
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn sfreq(&self) -> f64 {
        self.sfreq
    }

    pub fn n_times(&self) -> usize {
        self.data.first().map(Vec::len).unwrap_or(0)
    }

    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn duration(&self) -> f64 {
        self.n_times() as f64 / self.sfreq
    }

    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [ChannelInfo] {
        &mut self.channels
    }

    pub fn ch_names(&self) -> Vec<&str> {
        self.channels.iter().map(|ch| ch.name.as_str()).collect()
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|ch| ch.name == name)
    }

    pub fn channel_data(&self, index: usize) -> Option<&[f64]> {
        self.data.get(index).map(Vec::as_slice)
    }

    pub fn data(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Rename every channel through `rename`.
    pub fn rename_channels<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> String,
    {
        for ch in &mut self.channels {
            ch.name = rename(&ch.name);
        }
    }

    /// Append one channel; the sample count must match the recording.
    pub fn add_channel(&mut self, info: ChannelInfo, samples: Vec<f64>) -> Result<()> {
        if !self.data.is_empty() && samples.len() != self.n_times() {
            return Err(DatasetError::Shape(format!(
                "channel {} has {} samples, recording has {}",
                info.name,
                samples.len(),
                self.n_times()
            )));
        }
        self.channels.push(info);
        self.data.push(samples);
        Ok(())
    }

    /// Convert annotations to events.
    ///
    /// Descriptions starting with `BAD` or `EDGE` are skipped, the remaining unique
    /// descriptions are sorted and numbered from 1. Onsets are rounded to the nearest
    /// sample and events falling outside the recording are dropped.
    pub fn events_from_annotations(&self) -> (Vec<Event>, BTreeMap<String, i32>) {
        let kept: Vec<&Annotation> = self
            .annotations
            .iter()
            .filter(|ann| !is_rejected_description(&ann.description))
            .collect();
        let event_id: BTreeMap<String, i32> = kept
            .iter()
            .map(|ann| ann.description.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .zip(1..)
            .collect();
        let n_times = self.n_times() as f64;
        let mut events: Vec<Event> = kept
            .iter()
            .filter_map(|ann| {
                let sample = (ann.onset * self.sfreq).round();
                if !sample.is_finite() || sample < 0.0 || sample >= n_times {
                    return None;
                }
                Some(Event {
                    sample: sample as usize,
                    code: event_id[&ann.description],
                })
            })
            .collect();
        events.sort_by_key(|event| event.sample);
        (events, event_id)
    }

    /// Append a `STI 014` stim channel carrying `events`.
    pub fn add_marker_channel(&mut self, events: &[Event]) -> Result<()> {
        let samples = marker_channel(self.n_times(), events);
        self.add_channel(ChannelInfo::stim(STIM_CHANNEL_NAME), samples)
    }

    /// Onsets of non-zero runs on the first stim channel.
    pub fn find_events(&self) -> Vec<Event> {
        let Some(idx) = self
            .channels
            .iter()
            .position(|ch| ch.kind == ChannelKind::Stim)
        else {
            return Vec::new();
        };
        let mut previous = 0.0;
        let mut events = Vec::new();
        for (sample, &value) in self.data[idx].iter().enumerate() {
            if value != 0.0 && value != previous {
                events.push(Event {
                    sample,
                    code: value as i32,
                });
            }
            previous = value;
        }
        events
    }
}

fn is_rejected_description(description: &str) -> bool {
    let lower = description.to_ascii_lowercase();
    lower.starts_with("bad") || lower.starts_with("edge")
}

/// Zero-filled channel of length `n_times` with each event's code written at its sample.
pub fn marker_channel(n_times: usize, events: &[Event]) -> Vec<f64> {
    let mut samples = vec![0.0; n_times];
    for event in events {
        if let Some(slot) = samples.get_mut(event.sample) {
            *slot = event.code as f64;
        }
    }
    samples
}

/// Copy of `raw` with stim channel codes replaced through `mapping`.
///
/// Lookup is against the original value, so `{2: 4, 4: 6}` never chains 2 to 6.
/// Non-stim channels are copied unchanged.
pub fn remap_marker_codes(raw: &Raw, mapping: &BTreeMap<i32, i32>) -> Raw {
    let mut out = raw.clone();
    for (info, row) in out.channels.iter().zip(out.data.iter_mut()) {
        if info.kind != ChannelKind::Stim {
            continue;
        }
        for value in row.iter_mut() {
            if let Some(&to) = mapping.get(&(*value as i32)) {
                *value = to as f64;
            }
        }
    }
    out
}
