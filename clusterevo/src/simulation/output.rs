//! Info and data files written during a run
//!
//! Both files are truncated when `OutputFiles::create` runs so that an invalid
//! path fails before any integration. The data file is then reopened for append
//! and written row by row through a `DataWriter`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Deserialize;

use super::error::EvolutionError;
use super::integrator::IntegrationMethod;

/// Columns of the data file, in order
pub const OUTPUT_COLUMNS: [&str; 8] = ["t", "M", "rh", "rc", "rJ", "rv", "x", "y"];

/// Where the info and data files go
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OutputOptions {
    pub path: String,
    pub filename: String,
    pub data_extension: String,
    pub info_extension: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            path: String::new(),
            filename: "evolve".to_string(),
            data_extension: "dat".to_string(),
            info_extension: "info".to_string(),
        }
    }
}

impl OutputOptions {
    pub fn info_path(&self) -> PathBuf {
        Path::new(&self.path).join(format!("{}.{}", self.filename, self.info_extension))
    }

    pub fn data_path(&self) -> PathBuf {
        Path::new(&self.path).join(format!("{}.{}", self.filename, self.data_extension))
    }
}

/// Fast-mode orbit details for the info file
#[derive(Debug, Clone, Copy)]
pub struct OrbitInfo {
    pub initial_true_anomaly: f64,
    pub mean_motion: f64,
    pub period: f64,
}

/// Everything the info file reports about a run
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub initial_stars: f64,
    pub mean_mass: f64,
    pub initial_mass: f64,
    pub initial_half_mass_radius: f64,
    pub apogalacticon: f64,
    pub perigalacticon: f64,
    pub eccentricity: f64,
    pub fast: Option<OrbitInfo>,
    pub initial_time: f64,
    pub final_time: f64,
    pub time_step: f64,
    pub critical_mass_fraction: f64,
    pub critical_half_mass_radius: f64,
    pub method: IntegrationMethod,
    pub started: DateTime<Local>,
}

/// Validated output locations
#[derive(Debug, Clone)]
pub struct OutputFiles {
    pub options: OutputOptions,
    pub info_path: PathBuf,
    pub data_path: PathBuf,
}

impl OutputFiles {
    /// Create or truncate both files
    pub fn create(options: &OutputOptions) -> Result<Self, EvolutionError> {
        let info_path = options.info_path();
        let data_path = options.data_path();
        for path in [&info_path, &data_path] {
            File::create(path).map_err(|e| EvolutionError::io(path, e))?;
        }
        Ok(Self { options: options.clone(), info_path, data_path })
    }

    fn append(path: &Path) -> Result<BufWriter<File>, EvolutionError> {
        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| EvolutionError::io(path, e))?;
        Ok(BufWriter::new(file))
    }

    pub fn write_info(&self, info: &RunInfo) -> Result<(), EvolutionError> {
        let mut out = Self::append(&self.info_path)?;
        let dir = if self.options.path.is_empty() { "." } else { self.options.path.as_str() };
        let abs_dir = fs::canonicalize(dir).unwrap_or_else(|_| PathBuf::from(dir));

        let mut lines: Vec<(&str, String)> = vec![
            ("initial number of stars", format!("{}", info.initial_stars.round())),
            ("average mass of stars", format!("{} [Msun]", info.mean_mass)),
            ("initial mass of stars", format!("{} [Msun]", info.initial_mass)),
            ("initial half-mass radius", format!("{} [pc]", info.initial_half_mass_radius)),
            ("apogalactic distance", format!("{} [pc]", info.apogalacticon)),
            ("perigalactic distance", format!("{} [pc]", info.perigalacticon)),
        ];
        if let Some(orbit) = &info.fast {
            lines.push(("initial true anomaly", format!("{} [rad]", orbit.initial_true_anomaly)));
        }
        lines.push(("eccentricity", format!("{}", info.eccentricity)));
        if let Some(orbit) = &info.fast {
            lines.push(("mean angular velocity", format!("{} [Myr^-1]", orbit.mean_motion)));
            lines.push(("orbital period", format!("{} [Myr]", orbit.period)));
        }
        lines.extend([
            ("initial time", format!("{} [Myr]", info.initial_time)),
            ("final time", format!("{} [Myr]", info.final_time)),
            ("initial time step", format!("{} [Myr]", info.time_step)),
            ("critical mass fraction", format!("{}", info.critical_mass_fraction)),
            ("critical half-mass radius", format!("{}", info.critical_half_mass_radius)),
            ("output path", abs_dir.display().to_string()),
            ("output filename", self.options.filename.clone()),
            ("output data file extension", self.options.data_extension.clone()),
            ("output info file extension", self.options.info_extension.clone()),
            ("integration method", info.method.to_string()),
            ("simulation started", info.started.to_string()),
        ]);

        for (label, value) in lines {
            writeln!(out, "{label:>26}: {value}").map_err(|e| EvolutionError::io(&self.info_path, e))?;
        }
        out.flush().map_err(|e| EvolutionError::io(&self.info_path, e))
    }

    pub fn open_data(&self) -> Result<DataWriter, EvolutionError> {
        Ok(DataWriter {
            path: self.data_path.clone(),
            out: Self::append(&self.data_path)?,
            rows: 0,
        })
    }
}

/// Tab-separated data file, flushed and closed on drop
pub struct DataWriter {
    path: PathBuf,
    out: BufWriter<File>,
    rows: usize,
}

impl DataWriter {
    pub fn write_header(&mut self) -> Result<(), EvolutionError> {
        let header: Vec<String> = OUTPUT_COLUMNS.iter().map(|c| format!("{c:^12}")).collect();
        writeln!(self.out, "{}", header.join("\t")).map_err(|e| EvolutionError::io(&self.path, e))
    }

    pub fn write_row(&mut self, values: &[f64; 8]) -> Result<(), EvolutionError> {
        let row: Vec<String> = values.iter().map(|&v| format_scientific(v)).collect();
        writeln!(self.out, "{}", row.join("\t")).map_err(|e| EvolutionError::io(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and close, returning the number of data rows written
    pub fn finish(mut self) -> Result<usize, EvolutionError> {
        self.out.flush().map_err(|e| EvolutionError::io(&self.path, e))?;
        Ok(self.rows)
    }
}

/// Signed scientific notation with five decimals and a two-digit exponent,
/// e.g. `+1.00000e+05`, always 12 characters for finite values
pub fn format_scientific(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value:>12}");
    }
    let s = format!("{value:+.5e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scientific_format_is_fixed_width() {
        assert_eq!(format_scientific(1e5), "+1.00000e+05");
        assert_eq!(format_scientific(-0.0012345), "-1.23450e-03");
        assert_eq!(format_scientific(0.0), "+0.00000e+00");
        assert_eq!(format_scientific(6.02e123), "+6.02000e+123");
        assert_eq!(format_scientific(3.14159), "+3.14159e+00");
    }

    #[test]
    fn files_are_created_and_written() {
        let dir = tempdir().unwrap();
        let options = OutputOptions {
            path: dir.path().to_string_lossy().into_owned(),
            filename: "run".into(),
            ..Default::default()
        };
        let files = OutputFiles::create(&options).unwrap();
        assert!(files.info_path.ends_with("run.info"));
        assert!(files.data_path.ends_with("run.dat"));

        let mut data = files.open_data().unwrap();
        data.write_header().unwrap();
        data.write_row(&[0.0, 1e5, 3.0, 1.2, 10.0, 3.9, 500.0, 0.0]).unwrap();
        assert_eq!(data.finish().unwrap(), 1);

        let text = fs::read_to_string(&files.data_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split('\t').map(str::trim).collect::<Vec<_>>(), OUTPUT_COLUMNS);
        assert_eq!(lines[1].split('\t').count(), 8);
        assert!(lines[1].starts_with("+0.00000e+00\t+1.00000e+05"));
    }

    #[test]
    fn info_file_has_labelled_lines() {
        let dir = tempdir().unwrap();
        let options = OutputOptions { path: dir.path().to_string_lossy().into_owned(), ..Default::default() };
        let files = OutputFiles::create(&options).unwrap();
        let info = RunInfo {
            initial_stars: 2e5,
            mean_mass: 0.5,
            initial_mass: 1e5,
            initial_half_mass_radius: 3.0,
            apogalacticon: 1000.0,
            perigalacticon: 500.0,
            eccentricity: 1.0 / 3.0,
            fast: None,
            initial_time: 0.0,
            final_time: 1000.0,
            time_step: 1.0,
            critical_mass_fraction: 0.5,
            critical_half_mass_radius: 0.0,
            method: IntegrationMethod::Rk4,
            started: Local::now(),
        };
        files.write_info(&info).unwrap();

        let text = fs::read_to_string(&files.info_path).unwrap();
        assert!(text.contains("   initial number of stars: 200000\n"));
        assert!(text.contains("        integration method: RK4\n"));
        assert!(!text.contains("orbital period"));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempdir().unwrap();
        let options = OutputOptions {
            path: dir.path().join("no/such/dir").to_string_lossy().into_owned(),
            ..Default::default()
        };
        assert!(matches!(OutputFiles::create(&options), Err(EvolutionError::Io { .. })));
    }
}
