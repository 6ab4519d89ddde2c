//! Scripted headless runs: frame loop, scheduled user actions, optional Wokwi
//! co-simulation, and CSV/JSONL output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use incunest_shared::config::{ConfigError, SimulationConfig};
use incunest_shared::{SimClock, SimulationData, SimulationEngine};
use serde::Serialize;
use thiserror::Error;

use crate::readout::Readouts;
use crate::shell::{UserAction, VisualizationShell};
use crate::wokwi::WokwiBridge;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid option: {0}")]
    Invalid(String),
}

/// A user action fired once simulated time reaches `at_secs`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledAction {
    pub at_secs: f64,
    pub action: UserAction,
}

impl FromStr for ScheduledAction {
    type Err = String;

    /// `<seconds>:<action>`, e.g. `12.5:toggle-heater` or `30:setpoint=35`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (at, action) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid action '{s}': expected <seconds>:<action>"))?;
        let at_secs: f64 = at
            .trim()
            .parse()
            .map_err(|e| format!("Invalid time '{at}': {e}"))?;
        if !at_secs.is_finite() || at_secs < 0.0 {
            return Err(format!("Invalid time '{at}': must be non-negative"));
        }
        Ok(Self {
            at_secs,
            action: action.parse()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub duration_secs: f64,
    pub fps: f64,
    pub actions: Vec<ScheduledAction>,
    pub wokwi: bool,
    /// Record every n-th frame.
    pub sample_every: u32,
    pub output_dir: Option<PathBuf>,
    pub simulation: SimulationConfig,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            duration_secs: 60.0,
            fps: 60.0,
            actions: Vec::new(),
            wokwi: false,
            sample_every: 60,
            output_dir: None,
            simulation: SimulationConfig::default(),
        }
    }
}

impl RunOptions {
    fn validate(&self) -> Result<(), HarnessError> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(HarnessError::Invalid("fps must be positive".to_string()));
        }
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(HarnessError::Invalid("duration must be non-negative".to_string()));
        }
        if self.sample_every == 0 {
            return Err(HarnessError::Invalid("sample-every must be at least 1".to_string()));
        }
        self.simulation.validate().map_err(HarnessError::Invalid)
    }
}

/// One recorded frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    pub frame: u64,
    pub time: f64,
    pub temperature: f64,
    pub setpoint: f64,
    pub humidity: f64,
    pub heater_on: bool,
    pub fan_on: bool,
    pub door_z: f64,
    pub temp_internal: String,
    pub humidity_text: String,
}

#[derive(Debug, Serialize)]
struct TraceLine<'a> {
    time: f64,
    #[serde(flatten)]
    data: &'a SimulationData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub simulated_secs: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// Fraction of frames with the heater on.
    pub heater_duty: f64,
    pub actions_applied: usize,
    pub final_state: SimulationData,
}

struct Outputs {
    csv: csv::Writer<File>,
    trace: BufWriter<File>,
}

impl Outputs {
    fn create(dir: &Path) -> Result<Self, HarnessError> {
        std::fs::create_dir_all(dir)?;
        let csv = csv::Writer::from_path(dir.join("frames.csv"))?;
        let trace = BufWriter::new(File::create(dir.join("trace.jsonl"))?);
        Ok(Self { csv, trace })
    }

    fn record(&mut self, record: &FrameRecord, data: &SimulationData) -> Result<(), HarnessError> {
        self.csv.serialize(record)?;
        serde_json::to_writer(&mut self.trace, &TraceLine { time: record.time, data })?;
        self.trace.write_all(b"\n")?;
        Ok(())
    }

    fn finish(mut self) -> Result<(), HarnessError> {
        self.csv.flush()?;
        self.trace.flush()?;
        Ok(())
    }
}

/// Run the shell headless for `duration_secs` of simulated time.
pub fn run(options: &RunOptions) -> Result<RunSummary, HarnessError> {
    options.validate()?;

    let clock = Arc::new(SimClock::new());
    let engine = SimulationEngine::with_clock(options.simulation.clone(), clock.clone());
    let mut shell = VisualizationShell::new(engine);
    let mut bridge = options.wokwi.then(WokwiBridge::new);

    let mut actions = options.actions.clone();
    actions.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
    let mut pending = actions.into_iter().peekable();
    let mut actions_applied = 0;

    let mut outputs = match &options.output_dir {
        Some(dir) => Some(Outputs::create(dir)?),
        None => None,
    };

    let frame_dt = 1.0 / options.fps;
    let total_frames = (options.duration_secs * options.fps).round() as u64;
    tracing::info!(
        "Running {} frames ({:.1}s at {} fps, wokwi={})",
        total_frames,
        options.duration_secs,
        options.fps,
        options.wokwi
    );

    let initial = shell.data();
    let mut min_temperature = initial.temperature;
    let mut max_temperature = initial.temperature;
    let mut heater_frames = 0u64;

    for frame in 0..total_frames {
        let time = frame as f64 * frame_dt;
        while let Some(scheduled) = pending.next_if(|a| a.at_secs <= time) {
            shell.apply(&scheduled.action);
            actions_applied += 1;
        }

        if let Some(bridge) = bridge.as_mut() {
            if let Some(update) = bridge.advance(frame_dt, shell.data().setpoint) {
                shell.apply_wokwi(&update);
            }
        }

        clock.advance_secs(frame_dt);
        let readouts: Readouts = shell.frame();
        let data = shell.data();

        min_temperature = min_temperature.min(data.temperature);
        max_temperature = max_temperature.max(data.temperature);
        if data.heater_on {
            heater_frames += 1;
        }

        if frame % options.sample_every as u64 == 0 {
            let record = FrameRecord {
                frame,
                time: time + frame_dt,
                temperature: data.temperature,
                setpoint: data.setpoint,
                humidity: data.humidity,
                heater_on: data.heater_on,
                fan_on: data.fan_on,
                door_z: shell.door().position_z,
                temp_internal: readouts.temp_internal.clone(),
                humidity_text: readouts.humidity.clone(),
            };
            tracing::debug!(
                "t={:.2}s T={} setpoint={} RH={} heater={} fan={}",
                record.time,
                readouts.temp_internal,
                readouts.temp_setpoint,
                readouts.humidity,
                readouts.heater_status,
                readouts.fan_status
            );
            if let Some(outputs) = outputs.as_mut() {
                outputs.record(&record, &data)?;
            }
        }
    }

    if let Some(outputs) = outputs {
        outputs.finish()?;
    }

    let summary = RunSummary {
        frames: total_frames,
        simulated_secs: clock.elapsed().as_secs_f64(),
        min_temperature,
        max_temperature,
        heater_duty: if total_frames > 0 {
            heater_frames as f64 / total_frames as f64
        } else {
            0.0
        },
        actions_applied,
        final_state: shell.data(),
    };
    tracing::info!(
        "Run complete: T range {:.2}..{:.2}°C, heater duty {:.0}%",
        summary.min_temperature,
        summary.max_temperature,
        summary.heater_duty * 100.0
    );
    Ok(summary)
}
