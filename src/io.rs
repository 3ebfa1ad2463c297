use crate::profile_scope;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Cursor, Read, Write};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::carrier::Carrier;
use crate::config::{ConfigError, SimConfig};
use crate::geometry::{GeometryError, REGION_COUNT};
use crate::lattice::{DopingMap, LatticeLayout};
use crate::simulation::Simulation;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaveFormat {
    #[default]
    Json,
    Binary,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("not a valid JSON or binary simulation state")]
    UnrecognizedFormat,
    #[error("saved doping map has the wrong number of sites")]
    MalformedDoping,
    #[error("saved carrier refers to region {0}")]
    MalformedCarrier(usize),
    #[error("saved config is invalid: {0}")]
    Config(#[from] ConfigError),
    #[error("saved canvas is unusable: {0}")]
    Geometry(#[from] GeometryError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub electrons: Vec<Carrier>,
    pub holes: Vec<Carrier>,
    pub doping: DopingMap,
    pub config: SimConfig,
    pub canvas_width: f32,
    pub canvas_height: f32,
    #[serde(default)]
    pub tick: u64,
    #[serde(default)]
    pub now_ms: f64,
}

impl SimulationState {
    pub fn from_simulation(sim: &Simulation) -> Self {
        Self {
            electrons: sim.electrons.clone(),
            holes: sim.holes.clone(),
            doping: sim.doping.clone(),
            config: sim.config.clone(),
            canvas_width: sim.layout.width,
            canvas_height: sim.layout.height,
            tick: sim.tick,
            now_ms: sim.now_ms,
        }
    }

    /// Replace the simulation's state. Nothing is touched unless the whole
    /// state checks out.
    pub fn apply_to(self, sim: &mut Simulation) -> Result<(), StateError> {
        self.config.validate()?;
        if !self.doping.is_well_formed() {
            return Err(StateError::MalformedDoping);
        }
        if let Some(bad) = self
            .electrons
            .iter()
            .chain(&self.holes)
            .find(|c| c.region() >= REGION_COUNT)
        {
            return Err(StateError::MalformedCarrier(bad.region()));
        }
        let layout = LatticeLayout::compute(self.canvas_width, self.canvas_height)?;

        sim.electrons = self.electrons;
        sim.holes = self.holes;
        sim.doping = self.doping;
        sim.layout = layout;
        sim.tick = self.tick;
        sim.now_ms = self.now_ms;
        if let Some(seed) = self.config.seed {
            sim.reseed(seed);
        }
        sim.config = self.config;
        Ok(())
    }
}

pub fn save_state<P: AsRef<Path>>(
    path: P,
    sim: &Simulation,
    format: SaveFormat,
    compress: bool,
) -> Result<(), StateError> {
    profile_scope!("save_state");
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let state = SimulationState::from_simulation(sim);

    // Write to a sibling first so an interrupted save never truncates the target.
    let tmp_path = tmp_sibling(path);
    let written = write_state(&tmp_path, &state, format, compress)
        .and_then(|()| std::fs::rename(&tmp_path, path).map_err(StateError::from));
    if let Err(err) = written {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err);
    }
    info!(path = %path.display(), ?format, compress, "state saved");
    Ok(())
}

/// `dir/name` -> `dir/name.tmp`, keeping any existing extension.
fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_state(path: &Path, state: &SimulationState, format: SaveFormat, compress: bool) -> Result<(), StateError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    match (format, compress) {
        (SaveFormat::Json, false) => {
            serde_json::to_writer(&mut writer, state)?;
        }
        (SaveFormat::Json, true) => {
            let mut encoder = GzEncoder::new(&mut writer, Compression::fast());
            serde_json::to_writer(&mut encoder, state)?;
            encoder.finish()?;
        }
        (SaveFormat::Binary, false) => {
            bincode::serialize_into(&mut writer, state)?;
        }
        (SaveFormat::Binary, true) => {
            let mut encoder = GzEncoder::new(&mut writer, Compression::fast());
            bincode::serialize_into(&mut encoder, state)?;
            encoder.finish()?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn load_state<P: AsRef<Path>>(path: P) -> Result<SimulationState, StateError> {
    profile_scope!("load_state");
    let data = std::fs::read(path.as_ref())?;
    let state = match maybe_decompress_gzip(&data)? {
        Some(decoded) => parse_state_bytes(&decoded)?,
        None => parse_state_bytes(&data)?,
    };
    debug!(
        path = %path.as_ref().display(),
        electrons = state.electrons.len(),
        holes = state.holes.len(),
        "state loaded"
    );
    Ok(state)
}

fn parse_state_bytes(bytes: &[u8]) -> Result<SimulationState, StateError> {
    if let Ok(state) = serde_json::from_slice::<SimulationState>(bytes) {
        return Ok(state);
    }
    if let Ok(state) = bincode::deserialize::<SimulationState>(bytes) {
        return Ok(state);
    }
    Err(StateError::UnrecognizedFormat)
}

fn maybe_decompress_gzip(data: &[u8]) -> std::io::Result<Option<Vec<u8>>> {
    if data.len() < 2 || data[0] != 0x1f || data[1] != 0x8b {
        return Ok(None);
    }

    let mut decoder = GzDecoder::new(Cursor::new(data));
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded)?;
    Ok(Some(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::Species;
    use crate::lattice::Dopant;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("npn_drift_{}_{}", std::process::id(), name))
    }

    fn populated() -> Simulation {
        let config = SimConfig { seed: Some(11), ..SimConfig::default() };
        let mut sim = Simulation::new(config, 1280.0, 720.0).unwrap();
        let spacing = sim.layout.spacing;
        let start = sim.layout.start;
        sim.place_dopant(Dopant::Phosphorus, start.x + spacing, start.y + spacing);
        sim.place_dopant(Dopant::Boron, start.x + 7.0 * spacing, start.y + 3.0 * spacing);
        for _ in 0..5 {
            sim.step();
        }
        sim
    }

    fn assert_restores(format: SaveFormat, compress: bool, name: &str) {
        let sim = populated();
        let path = temp_path(name);
        save_state(&path, &sim, format, compress).unwrap();
        let state = load_state(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(state, SimulationState::from_simulation(&sim));

        let mut fresh = Simulation::new(SimConfig::default(), 640.0, 480.0).unwrap();
        state.apply_to(&mut fresh).unwrap();
        assert_eq!(fresh.electrons, sim.electrons);
        assert_eq!(fresh.holes, sim.holes);
        assert_eq!(fresh.doping, sim.doping);
        assert_eq!(fresh.layout, sim.layout);
        assert_eq!(fresh.tick, sim.tick);
        assert_eq!(fresh.now_ms, sim.now_ms);
    }

    #[test]
    fn json_state_restores() {
        assert_restores(SaveFormat::Json, false, "plain.json");
    }

    #[test]
    fn gzipped_binary_state_restores() {
        assert_restores(SaveFormat::Binary, true, "state.bin.gz");
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let sim = populated();
        let path = temp_path("tidy.json");
        save_state(&path, &sim, SaveFormat::Json, false).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn garbage_is_unrecognized() {
        let path = temp_path("garbage");
        std::fs::write(&path, b"definitely not a state").unwrap();
        let err = load_state(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, StateError::UnrecognizedFormat));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_state(temp_path("does_not_exist")).unwrap_err();
        assert!(matches!(err, StateError::Io(_)));
    }

    #[test]
    fn bad_region_is_rejected_without_side_effects() {
        let sim = populated();
        let mut state = SimulationState::from_simulation(&sim);
        let json = serde_json::to_string(&state.electrons[0]).unwrap();
        let broken = json.replacen("\"region\":0", "\"region\":7", 1);
        state.electrons[0] = serde_json::from_str(&broken).unwrap();

        let mut target = Simulation::new(SimConfig::default(), 1280.0, 720.0).unwrap();
        target.spawn_carrier(Species::Hole, 1, 0.5, 0.5).unwrap();
        let err = state.apply_to(&mut target).unwrap_err();
        assert!(matches!(err, StateError::MalformedCarrier(7)));
        assert_eq!(target.holes.len(), 1);
        assert!(target.electrons.is_empty());
    }

    #[test]
    fn invalid_saved_config_is_rejected_without_side_effects() {
        let mut source = Simulation::new(SimConfig::default(), 1280.0, 720.0).unwrap();
        source.spawn_carrier(Species::Electron, 1, 0.5, 0.5).unwrap();
        source.spawn_carrier(Species::Hole, 1, 0.5, 0.5).unwrap();
        let mut state = SimulationState::from_simulation(&source);
        state.config.softening = 0.0;
        state.config.species.electron.jitter = 0.0;
        state.config.species.hole.jitter = 0.0;
        let json = serde_json::to_vec(&state).unwrap();
        let state: SimulationState = serde_json::from_slice(&json).unwrap();

        let mut target = Simulation::new(SimConfig { seed: Some(4), ..SimConfig::default() }, 1280.0, 720.0).unwrap();
        target.spawn_carrier(Species::Hole, 0, 0.25, 0.75).unwrap();
        let before = target.holes.clone();

        let err = state.apply_to(&mut target).unwrap_err();
        assert!(matches!(err, StateError::Config(_)));
        assert_eq!(target.holes, before);
        assert!(target.electrons.is_empty());
        assert_eq!(target.config.softening, SimConfig::default().softening);
        target.config.validate().unwrap();
    }

    #[test]
    fn damping_of_one_in_saved_config_is_rejected() {
        let mut state = SimulationState::from_simulation(&populated());
        state.config.species.electron.damping = 1.0;
        let mut target = Simulation::new(SimConfig::default(), 1280.0, 720.0).unwrap();
        assert!(matches!(state.apply_to(&mut target), Err(StateError::Config(_))));
    }

    #[test]
    fn temp_name_keeps_the_full_file_name() {
        assert_eq!(tmp_sibling(Path::new("out/state.json.gz")), PathBuf::from("out/state.json.gz.tmp"));
        assert_eq!(tmp_sibling(Path::new("out/state")), PathBuf::from("out/state.tmp"));
    }

    #[test]
    fn failed_save_removes_the_temp_file() {
        let sim = populated();
        // A directory in the way makes the final rename fail.
        let path = temp_path("blocked");
        std::fs::create_dir_all(path.join("inner")).unwrap();
        let err = save_state(&path, &sim, SaveFormat::Binary, false).unwrap_err();
        let leftover = tmp_sibling(&path).exists();
        std::fs::remove_dir_all(&path).ok();
        assert!(matches!(err, StateError::Io(_)));
        assert!(!leftover);
    }
}
