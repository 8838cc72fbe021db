use crate::error::{DatasetError, Result};
use crate::signal::{Annotation, ChannelInfo, Raw};
use edfplus::EdfReader;
use log::debug;
use std::path::Path;

/// Label of the EDF+ signal that carries time-stamped annotation lists.
pub const ANNOTATION_LABEL: &str = "EDF Annotations";

/// EDF+ times are counted in units of 100 ns.
const TIME_UNITS_PER_SECOND: f64 = 10_000_000.0;

fn edf_error(path: &Path, message: impl ToString) -> DatasetError {
    DatasetError::Edf {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn unit_scale(dimension: &str) -> f64 {
    match dimension.trim() {
        "uV" | "µV" => 1e-6,
        "mV" => 1e-3,
        "nV" => 1e-9,
        _ => 1.0,
    }
}

/// Per-signal header fields needed once the reader starts consuming samples.
struct SignalLayout {
    label: String,
    samples_per_record: i32,
    samples_in_file: i64,
    scale: f64,
}

fn to_annotation(ann: &edfplus::Annotation) -> Annotation {
    Annotation {
        onset: ann.onset as f64 / TIME_UNITS_PER_SECOND,
        // negative duration marks "unknown"
        duration: ann.duration.max(0) as f64 / TIME_UNITS_PER_SECOND,
        description: ann.description.clone(),
    }
}

/// Read every signal of an EDF+ file into a [`Raw`].
///
/// Signals are converted to volts when their physical dimension is a known
/// voltage unit. The `EDF Annotations` signal is not kept as a channel; its
/// TALs become the recording's annotations. Channel labels are returned as
/// stored (trimmed), without any renaming.
pub fn read_raw_edf(path: &Path) -> Result<Raw> {
    let mut reader = EdfReader::open(path).map_err(|e| edf_error(path, e))?;
    let header = reader.header();
    if header.datarecord_duration <= 0 {
        return Err(edf_error(path, "data record duration is zero"));
    }
    let record_seconds = header.datarecord_duration as f64 / TIME_UNITS_PER_SECOND;
    let signals: Vec<SignalLayout> = header
        .signals
        .iter()
        .map(|signal| SignalLayout {
            label: signal.label.trim().to_string(),
            samples_per_record: signal.samples_per_record,
            samples_in_file: signal.samples_in_file,
            scale: unit_scale(&signal.physical_dimension),
        })
        .collect();

    let mut sfreq: Option<f64> = None;
    for signal in &signals {
        let fs = signal.samples_per_record as f64 / record_seconds;
        match sfreq {
            None => sfreq = Some(fs),
            Some(existing) if (existing - fs).abs() > 1e-9 => {
                return Err(edf_error(
                    path,
                    format!(
                        "mixed sampling rates ({existing} Hz and {fs} Hz on {})",
                        signal.label
                    ),
                ));
            }
            Some(_) => {}
        }
    }
    let sfreq = sfreq.ok_or_else(|| edf_error(path, "file contains no data signals"))?;

    let mut channels = Vec::with_capacity(signals.len());
    let mut data = Vec::with_capacity(signals.len());
    for (idx, signal) in signals.iter().enumerate() {
        let count = usize::try_from(signal.samples_in_file)
            .map_err(|_| edf_error(path, format!("bad sample count on {}", signal.label)))?;
        let samples = reader
            .read_physical_samples(idx, count)
            .map_err(|e| edf_error(path, format!("{}: {e}", signal.label)))?;
        channels.push(ChannelInfo::eeg(signal.label.as_str()));
        data.push(samples.into_iter().map(|v| v * signal.scale).collect());
    }

    let annotations: Vec<Annotation> = reader.annotations().iter().map(to_annotation).collect();
    debug!(
        "read {} ({} channels, {} Hz, {} annotations)",
        path.display(),
        channels.len(),
        sfreq,
        annotations.len()
    );
    Ok(Raw::new(sfreq, channels, data)?.with_annotations(annotations))
}
