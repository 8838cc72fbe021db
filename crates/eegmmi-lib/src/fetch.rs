use crate::config::DatasetConfig;
use crate::error::{DatasetError, Result};
use crate::io::edf::read_raw_edf;
use crate::signal::Raw;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where run recordings come from.
pub trait RunSource {
    /// Local path of the recording for `(subject, run)`, fetching it first if needed.
    fn locate(&self, subject: u32, run: u8) -> Result<PathBuf>;

    /// Decode a located recording.
    fn read(&self, path: &Path) -> Result<Raw>;
}

/// PhysioNet archive mirrored into the MNE cache layout.
pub struct PhysioNetSource {
    config: DatasetConfig,
    agent: ureq::Agent,
}

impl PhysioNetSource {
    pub fn new(config: DatasetConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .build();
        let agent = ureq::Agent::new_with_config(agent_config);
        Self { config, agent }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// `<base>S001/S001R04.edf`
    pub fn run_url(&self, subject: u32, run: u8) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/S{subject:03}/S{subject:03}R{run:02}.edf")
    }

    /// Cache path mirroring the URL path below the data directory.
    pub fn local_path(&self, subject: u32, run: u8) -> PathBuf {
        let url = self.run_url(subject, run);
        let mut path = self.config.data_dir();
        path.extend(url_path_segments(&url));
        path
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        info!("downloading {} -> {}", url, dest.display());
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|source| DatasetError::Download {
                url: url.to_string(),
                source: Box::new(source),
            })?;
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| DatasetError::io(parent, e))?;
        let mut body = response.body_mut().as_reader();
        std::io::copy(&mut body, &mut tmp).map_err(|e| DatasetError::io(dest, e))?;
        tmp.persist(dest)
            .map_err(|e| DatasetError::io(dest, e.error))?;
        Ok(())
    }
}

impl RunSource for PhysioNetSource {
    fn locate(&self, subject: u32, run: u8) -> Result<PathBuf> {
        let path = self.local_path(subject, run);
        if path.is_file() && !self.config.force_update {
            debug!("cache hit {}", path.display());
            return Ok(path);
        }
        let url = self.run_url(subject, run);
        self.download(&url, &path)?;
        Ok(path)
    }

    fn read(&self, path: &Path) -> Result<Raw> {
        read_raw_edf(path)
    }
}

/// Path segments after the host, e.g. `physiobank/database/eegmmidb/S001/S001R01.edf`.
fn url_path_segments(url: &str) -> impl Iterator<Item = &str> {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = without_scheme
        .split_once('/')
        .map(|(_, path)| path)
        .unwrap_or("");
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn source_in(dir: &Path) -> PhysioNetSource {
        PhysioNetSource::new(DatasetConfig::default().with_cache_dir(dir))
    }

    #[test]
    fn builds_physionet_urls() {
        let dir = tempdir().unwrap();
        let source = source_in(dir.path());
        assert_eq!(
            source.run_url(1, 4),
            "http://www.physionet.org/physiobank/database/eegmmidb/S001/S001R04.edf"
        );
        assert_eq!(
            source.run_url(109, 14),
            "http://www.physionet.org/physiobank/database/eegmmidb/S109/S109R14.edf"
        );
    }

    #[test]
    fn local_path_mirrors_url_below_cache() {
        let dir = tempdir().unwrap();
        let source = source_in(dir.path());
        let expected = dir
            .path()
            .join("MNE-eegbci-data")
            .join("physiobank")
            .join("database")
            .join("eegmmidb")
            .join("S007")
            .join("S007R02.edf");
        assert_eq!(source.local_path(7, 2), expected);
    }

    #[test]
    fn cached_file_is_returned_without_download() {
        let dir = tempdir().unwrap();
        let source = source_in(dir.path());
        let path = source.local_path(3, 1);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"cached").unwrap();
        assert_eq!(source.locate(3, 1).unwrap(), path);
    }

    #[test]
    fn url_segments_skip_host_and_dot_segments() {
        let segments: Vec<&str> =
            url_path_segments("https://example.org/a/../b//c.edf").collect();
        assert_eq!(segments, vec!["a", "b", "c.edf"]);
    }
}
