//! Persisted network representation.
//!
//! The writer always produces well-formed JSON of the shape
//!
//! ```json
//! { "neurons": [ { "id": 0, "potential": 0.0000, "spiked": false, "spike_count": 0,
//!                  "connections": [ { "target": 1, "weight": 0.2500 } ] } ] }
//! ```
//!
//! with potentials and weights written with exactly four decimals. The reader is lenient: a
//! malformed field is skipped on its own without discarding the rest of its entry, and
//! documents that are not valid JSON, or carry no top-level `neurons` list, are recovered by
//! scanning each `{...}` object for the `id`, `target` and `weight` keys. Loading restores
//! topology and weights only. Potentials, spike flags and spike counts are written for
//! inspection but every loaded neuron starts at rest.
//!
//! [`StepRecorder`] writes one snapshot per simulation step, named `<base>_step<t>.json`.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{
    ser::{Formatter, PrettyFormatter, Serializer},
    Value,
};
use simple_error::SimpleError;
use thiserror::Error;

use crate::{
    network::Network,
    params::{NeuronParams, StdpParams},
    types::HashSet,
    util::round_to_decimals,
};

const DECIMALS: i32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub neurons: Vec<NeuronSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronSnapshot {
    pub id: usize,
    pub potential: f64,
    pub spiked: bool,
    pub spike_count: usize,
    pub connections: Vec<ConnectionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub target: usize,
    pub weight: f64,
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("cannot {action} snapshot '{path}': {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Format(String),

    #[error("invalid network parameters: {0}")]
    InvalidParams(#[from] SimpleError),
}

impl SnapshotError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        SnapshotError::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Pretty printer that writes every float with exactly four decimals.
struct FixedDecimalsFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl FixedDecimalsFormatter<'_> {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::new(),
        }
    }
}

impl Formatter for FixedDecimalsFormatter<'_> {
    // non-finite values never get here, the serializer writes them as null
    fn write_f64<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        value: f64,
    ) -> io::Result<()> {
        write!(writer, "{:.*}", DECIMALS as usize, value)
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }
}

fn write_snapshot<W: Write>(writer: W, snapshot: &NetworkSnapshot) -> serde_json::Result<()> {
    let mut serializer = Serializer::with_formatter(writer, FixedDecimalsFormatter::new());
    snapshot.serialize(&mut serializer)
}

impl NetworkSnapshot {
    pub fn to_json_string(&self) -> String {
        let mut buffer = Vec::new();

        // serializing plain structs into memory cannot fail
        if write_snapshot(&mut buffer, self).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Network {
    pub fn snapshot(&self) -> NetworkSnapshot {
        let neurons = self
            .neurons()
            .iter()
            .enumerate()
            .map(|(id, neuron)| NeuronSnapshot {
                id,
                potential: round_to_decimals(neuron.potential(), DECIMALS),
                spiked: neuron.spiked(),
                spike_count: neuron.spike_count(),
                connections: neuron
                    .connections()
                    .iter()
                    .map(|syn| ConnectionSnapshot {
                        target: syn.target,
                        weight: round_to_decimals(syn.weight, DECIMALS),
                    })
                    .collect(),
            })
            .collect();

        NetworkSnapshot { neurons }
    }

    pub fn to_json_string(&self) -> String {
        self.snapshot().to_json_string()
    }

    pub fn write_json<W: Write>(&self, writer: W) -> SnapshotResult<()> {
        write_snapshot(writer, &self.snapshot())
            .map_err(|err| SnapshotError::Io {
                action: "write",
                path: String::from("<stream>"),
                source: err.into(),
            })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> SnapshotResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|err| SnapshotError::io("create", path, err))?;
        let mut writer = BufWriter::new(file);

        write_snapshot(&mut writer, &self.snapshot())
            .map_err(|err| SnapshotError::io("write", path, err.into()))?;
        writer
            .flush()
            .map_err(|err| SnapshotError::io("write", path, err))?;

        info!(
            "saved snapshot of {} neurons and {} synapses to {}",
            self.len(),
            self.connection_count(),
            path.display()
        );

        Ok(())
    }

    pub fn from_json_str(text: &str) -> SnapshotResult<Network> {
        Self::from_json_str_with_params(text, NeuronParams::default(), StdpParams::default())
    }

    pub fn from_json_str_with_params(
        text: &str,
        neuron_params: NeuronParams,
        stdp_params: StdpParams,
    ) -> SnapshotResult<Network> {
        let entries = recover_entries(text);
        rebuild_network(&entries, neuron_params, stdp_params)
    }

    pub fn read_json<R: Read>(mut reader: R) -> SnapshotResult<Network> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|err| SnapshotError::Io {
                action: "read",
                path: String::from("<stream>"),
                source: err,
            })?;
        Self::from_json_str(&text)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> SnapshotResult<Network> {
        Self::load_with_params(path, NeuronParams::default(), StdpParams::default())
    }

    pub fn load_with_params<P: AsRef<Path>>(
        path: P,
        neuron_params: NeuronParams,
        stdp_params: StdpParams,
    ) -> SnapshotResult<Network> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| SnapshotError::io("open", path, err))?;

        let mut text = String::new();
        BufReader::new(file)
            .read_to_string(&mut text)
            .map_err(|err| SnapshotError::io("read", path, err))?;

        let network = Self::from_json_str_with_params(&text, neuron_params, stdp_params)?;

        info!(
            "loaded snapshot of {} neurons and {} synapses from {}",
            network.len(),
            network.connection_count(),
            path.display()
        );

        Ok(network)
    }
}

/// Path of the snapshot for `step` in a series starting at `base`: `<base>_step<step>.json`.
pub fn step_snapshot_path<P: AsRef<Path>>(base: P, step: usize) -> PathBuf {
    let mut name = base.as_ref().as_os_str().to_owned();
    name.push(format!("_step{}.json", step));
    PathBuf::from(name)
}

/// Writes one snapshot file per recorded step. After the first failure no further files are
/// written and `finish` returns the error.
#[derive(Debug)]
pub struct StepRecorder {
    base: PathBuf,
    written: Vec<PathBuf>,
    error: Option<SnapshotError>,
}

impl StepRecorder {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base: base.into(),
            written: Vec::new(),
            error: None,
        }
    }

    pub fn record(&mut self, step: usize, network: &Network) {
        if self.error.is_some() {
            return;
        }

        let path = step_snapshot_path(&self.base, step);

        match network.save(&path) {
            Ok(()) => self.written.push(path),
            Err(err) => {
                warn!("stopping step snapshots at step {}: {}", step, err);
                self.error = Some(err);
            }
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn finish(self) -> SnapshotResult<Vec<PathBuf>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.written),
        }
    }
}

/// A neuron entry as far as it could be read. `None` marks a missing or malformed field.
#[derive(Debug, Default, PartialEq)]
struct RecoveredNeuron {
    id: Option<usize>,
    connections: Vec<RecoveredConnection>,
}

#[derive(Debug, Default, PartialEq)]
struct RecoveredConnection {
    target: Option<usize>,
    weight: Option<f64>,
}

fn recover_entries(text: &str) -> Vec<RecoveredNeuron> {
    match serde_json::from_str::<Value>(text) {
        Ok(document) => {
            let entries = entries_from_document(&document);
            if entries.is_empty() {
                debug!("no top-level neuron list, scanning for fields");
                scan_entries(text)
            } else {
                entries
            }
        }
        Err(err) => {
            warn!("snapshot is not valid json ({}), scanning for fields", err);
            scan_entries(text)
        }
    }
}

fn entries_from_document(document: &Value) -> Vec<RecoveredNeuron> {
    let neurons = match document.get("neurons").and_then(Value::as_array) {
        Some(neurons) => neurons,
        None => return Vec::new(),
    };

    neurons
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| RecoveredNeuron {
            id: entry.get("id").and_then(value_as_index),
            connections: entry
                .get("connections")
                .and_then(Value::as_array)
                .map(|connections| {
                    connections
                        .iter()
                        .map(|conn| RecoveredConnection {
                            target: conn.get("target").and_then(value_as_index),
                            weight: conn.get("weight").and_then(value_as_weight),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

fn value_as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_weight(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Key {
    Id,
    Target,
    Weight,
}

impl Key {
    fn from_name(name: &str) -> Option<Key> {
        match name {
            "id" => Some(Key::Id),
            "target" => Some(Key::Target),
            "weight" => Some(Key::Weight),
            _ => None,
        }
    }
}

/// An object opened but not yet closed during the scan.
#[derive(Debug, Default)]
struct ScanFrame {
    has_id: bool,
    has_connection_field: bool,
    neuron: RecoveredNeuron,
    connection: RecoveredConnection,
}

impl ScanFrame {
    fn set(&mut self, key: Key, raw_value: Option<&str>) {
        match key {
            Key::Id => {
                if !self.has_id {
                    self.has_id = true;
                    self.neuron.id = raw_value.and_then(|raw| raw.parse().ok());
                }
            }
            Key::Target => {
                self.has_connection_field = true;
                if self.connection.target.is_none() {
                    self.connection.target = raw_value.and_then(|raw| raw.parse().ok());
                }
            }
            Key::Weight => {
                self.has_connection_field = true;
                if self.connection.weight.is_none() {
                    self.connection.weight = raw_value.and_then(|raw| raw.parse().ok());
                }
            }
        }
    }
}

/// Objects with an `id` or with nested connections are neuron entries. Objects with a
/// `target` or `weight` are connections of the innermost enclosing object.
fn close_frame(frame: ScanFrame, open: &mut [ScanFrame], entries: &mut Vec<RecoveredNeuron>) {
    if frame.has_id || !frame.neuron.connections.is_empty() {
        entries.push(frame.neuron);
    } else if frame.has_connection_field {
        match open.last_mut() {
            Some(parent) => parent.neuron.connections.push(frame.connection),
            None => warn!("skipping connection outside of any neuron entry"),
        }
    }
}

/// Offset of the quote closing a string literal whose contents start at `from`.
fn closing_quote(text: &str, from: usize) -> Option<usize> {
    let mut escaped = false;

    for (offset, &byte) in text.as_bytes()[from..].iter().enumerate() {
        match byte {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'"' => return Some(from + offset),
            _ => {}
        }
    }

    None
}

/// Brace-aware scan over raw snapshot text. Fields are attached to the object
/// they appear in, so key order inside an object does not matter. Objects left open at the
/// end of the text are closed implicitly.
fn scan_entries(text: &str) -> Vec<RecoveredNeuron> {
    let mut open: Vec<ScanFrame> = Vec::new();
    let mut entries: Vec<RecoveredNeuron> = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find(|c: char| matches!(c, '{' | '}' | '"')) {
        let start = pos + offset;

        match text.as_bytes()[start] {
            b'{' => {
                open.push(ScanFrame::default());
                pos = start + 1;
            }
            b'}' => {
                if let Some(frame) = open.pop() {
                    close_frame(frame, &mut open, &mut entries);
                }
                pos = start + 1;
            }
            _ => {
                let Some(end) = closing_quote(text, start + 1) else {
                    break;
                };
                let key = Key::from_name(&text[start + 1..end]);
                let rest = &text[end + 1..];

                if let (Some(key), Some(frame)) = (key, open.last_mut()) {
                    if rest.trim_start().starts_with(':') {
                        frame.set(key, scan_value(rest));
                    }
                }
                pos = end + 1;
            }
        }
    }

    while let Some(frame) = open.pop() {
        close_frame(frame, &mut open, &mut entries);
    }

    entries
}

fn scan_value(rest: &str) -> Option<&str> {
    let rest = rest.trim_start().strip_prefix(':')?;
    let end = rest
        .find(|c: char| matches!(c, ',' | '}' | ']' | '\n' | '\r'))
        .unwrap_or(rest.len());
    let raw = rest[..end].trim().trim_matches('"').trim();

    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}

fn rebuild_network(
    entries: &[RecoveredNeuron],
    neuron_params: NeuronParams,
    stdp_params: StdpParams,
) -> SnapshotResult<Network> {
    let ids: HashSet<usize> = entries.iter().filter_map(|entry| entry.id).collect();

    let max_id = match ids.iter().max() {
        Some(max_id) => *max_id,
        None => {
            return Err(SnapshotError::Format(String::from(
                "empty or malformed snapshot",
            )))
        }
    };

    if let Some(missing_id) = (0..=max_id).find(|id| !ids.contains(id)) {
        return Err(SnapshotError::Format(format!(
            "neuron ids are not dense: id {} missing below maximum id {}",
            missing_id, max_id
        )));
    }

    let mut network = Network::with_params(max_id + 1, neuron_params, stdp_params)?;

    for entry in entries {
        let from = match entry.id {
            Some(from) => from,
            None => {
                if !entry.connections.is_empty() {
                    warn!(
                        "skipping {} connections of neuron entry without valid id",
                        entry.connections.len()
                    );
                }
                continue;
            }
        };

        for conn in &entry.connections {
            let Some(to) = conn.target else {
                warn!("skipping connection of neuron {} without valid target", from);
                continue;
            };

            let weight = conn.weight.unwrap_or_else(|| {
                warn!(
                    "connection {} -> {} has no valid weight, using 0.0",
                    from, to
                );
                0.0
            });

            network.connect(from, to, weight);
        }
    }

    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn sample_network() -> Network {
        let mut network = Network::new(3);
        network.connect(0, 1, 0.123456);
        network.connect(0, 2, 0.5);
        network.connect(2, 1, 0.25);
        network.apply_input(1, 0.3);
        network
    }

    #[test]
    fn snapshot_contents() {
        let snapshot = sample_network().snapshot();

        assert_eq!(snapshot.neurons.len(), 3);
        assert_eq!(snapshot.neurons[0].id, 0);
        assert_approx_eq!(f64, snapshot.neurons[1].potential, 0.3);
        assert!(!snapshot.neurons[1].spiked);
        assert_eq!(
            snapshot.neurons[0].connections,
            vec![
                ConnectionSnapshot {
                    target: 1,
                    weight: 0.1235
                },
                ConnectionSnapshot {
                    target: 2,
                    weight: 0.5
                },
            ]
        );
    }

    #[test]
    fn writer_output_is_valid_json() {
        let text = sample_network().to_json_string();
        let parsed: NetworkSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, sample_network().snapshot());
    }

    #[test]
    fn structured_recovery() {
        let text = r#"{"neurons": [
            {"id": 1, "connections": [{"target": 0, "weight": 0.7}]},
            {"id": 0, "potential": 0.5, "connections": []}
        ]}"#;

        let network = Network::from_json_str(text).unwrap();
        assert_eq!(network.len(), 2);
        assert_eq!(network.connection_count(), 1);
        assert_approx_eq!(
            f64,
            network.get_neuron(1).unwrap().connections()[0].weight,
            0.7
        );
    }

    #[test]
    fn runtime_state_not_restored() {
        let mut network = sample_network();
        network.apply_input(0, 2.0);
        network.update();

        let loaded = Network::from_json_str(&network.to_json_string()).unwrap();

        for neuron in loaded.neurons() {
            assert_approx_eq!(f64, neuron.potential(), 0.0);
            assert_eq!(neuron.spike_count(), 0);
        }
    }

    #[test]
    fn malformed_weight_in_valid_json() {
        let text = r#"{"neurons": [
            {"id": 0, "connections": [{"target": 1, "weight": "heavy"}, {"target": 2, "weight": 0.2}]},
            {"id": 1, "connections": []},
            {"id": 2, "connections": []}
        ]}"#;

        let network = Network::from_json_str(text).unwrap();
        let connections = network.get_neuron(0).unwrap().connections();
        assert_eq!(connections.len(), 2);
        assert_approx_eq!(f64, connections[0].weight, 0.0);
        assert_approx_eq!(f64, connections[1].weight, 0.2);
    }

    #[test]
    fn scan_recovers_from_broken_json() {
        let text = r#"
        {
          "neurons": [
            {
              "id":   0,
              "potential": nan,
              "connections": [
                {"target": 1, "weight": 0.25},
                {"target": x, "weight": 0.5}
              ]
            },
            {
              "id": 1,
              "connections": [ {"target": 0 , "weight": 0.75 } ]
            }
          ]
        "#;

        let entries = scan_entries(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].connections.len(), 2);
        assert_eq!(entries[0].connections[1].target, None);

        let network = Network::from_json_str(text).unwrap();
        assert_eq!(network.len(), 2);
        assert_eq!(network.connection_count(), 2);
        assert_approx_eq!(
            f64,
            network.get_neuron(1).unwrap().connections()[0].weight,
            0.75
        );
    }

    #[test]
    fn scan_reads_fields_in_any_order() {
        let text = r#"{"neurons": [
            {"id": 0, "connections": [{"weight": 0.5, "target": 1}, {"weight": 0.7, "target": 2},]},
            {"id": 1, "connections": []},
            {"id": 2, "connections": []}
        ]}"#;

        let entries = scan_entries(text);
        assert_eq!(
            entries[0].connections,
            vec![
                RecoveredConnection {
                    target: Some(1),
                    weight: Some(0.5)
                },
                RecoveredConnection {
                    target: Some(2),
                    weight: Some(0.7)
                },
            ]
        );

        let network = Network::from_json_str(text).unwrap();
        let connections = network.get_neuron(0).unwrap().connections();
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].target, 1);
        assert_approx_eq!(f64, connections[0].weight, 0.5);
        assert_eq!(connections[1].target, 2);
        assert_approx_eq!(f64, connections[1].weight, 0.7);
    }

    #[test]
    fn scan_attaches_trailing_id_to_its_entry() {
        let text = r#"{"neurons": [
            {"connections": [{"target": 1, "weight": 0.5}], "id": 0},
            {"connections": [{"target": 0, "weight": 0.9}], "id": 1},
        ]}"#;

        let network = Network::from_json_str(text).unwrap();
        assert_eq!(network.len(), 2);
        assert_eq!(network.connection_count(), 2);

        let from_zero = &network.get_neuron(0).unwrap().connections()[0];
        assert_eq!(from_zero.target, 1);
        assert_approx_eq!(f64, from_zero.weight, 0.5);

        let from_one = &network.get_neuron(1).unwrap().connections()[0];
        assert_eq!(from_one.target, 0);
        assert_approx_eq!(f64, from_one.weight, 0.9);
    }

    #[test]
    fn scan_ignores_braces_inside_strings() {
        let text = r#"{"label": "{\"id\": 7}", "neurons": [{"id": 0, "connections": []}"#;
        let entries = scan_entries(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, Some(0));
    }

    #[test]
    fn nested_neuron_list() {
        let text = r#"{"network": {"neurons": [
            {"id": 0, "connections": [{"target": 1, "weight": 0.3}]},
            {"id": 1, "connections": []}
        ]}}"#;

        let network = Network::from_json_str(text).unwrap();
        assert_eq!(network.len(), 2);
        assert_approx_eq!(
            f64,
            network.get_neuron(0).unwrap().connections()[0].weight,
            0.3
        );
    }

    #[test]
    fn numbers_written_with_four_decimals() {
        let mut network = Network::new(2);
        network.connect(0, 1, 0.5);

        let text = network.to_json_string();
        assert!(text.contains("\"weight\": 0.5000"));
        assert!(text.contains("\"potential\": 0.0000"));
        assert!(text.contains("\"spike_count\": 0,"));

        let parsed: NetworkSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, network.snapshot());
    }

    #[test]
    fn step_recorder_writes_one_file_per_step() {
        let base = std::env::temp_dir().join(format!("lifnet-steps-{}", std::process::id()));
        let mut network = Network::new(2);
        network.connect(0, 1, 0.5);
        network.apply_input(0, 1.0);

        let mut recorder = StepRecorder::new(&base);
        for step in 0..3 {
            network.update();
            recorder.record(step, &network);
        }
        assert_eq!(recorder.written().len(), 3);

        let paths = recorder.finish().unwrap();
        let snapshots: Vec<NetworkSnapshot> = paths
            .iter()
            .map(|path| serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap())
            .collect();
        for path in &paths {
            std::fs::remove_file(path).ok();
        }

        assert_eq!(paths[2], step_snapshot_path(&base, 2));
        assert!(paths[0].to_string_lossy().ends_with("_step0.json"));
        assert!(snapshots[0].neurons[0].spiked);
        assert!(!snapshots[1].neurons[0].spiked);
        assert_approx_eq!(f64, snapshots[0].neurons[1].potential, 0.45);
    }

    #[test]
    fn step_recorder_stops_at_first_failure() {
        let mut recorder = StepRecorder::new("/nonexistent/dir/run");
        let network = Network::new(1);

        recorder.record(0, &network);
        recorder.record(1, &network);

        assert!(recorder.written().is_empty());
        let err = recorder.finish().unwrap_err();
        assert!(matches!(err, SnapshotError::Io { action: "create", .. }));
        assert!(err.to_string().contains("run_step0.json"));
    }

    #[test]
    fn scan_value_handles_whitespace() {
        assert_eq!(scan_value("  :   12 ,"), Some("12"));
        assert_eq!(scan_value(": \"7\"}"), Some("7"));
        assert_eq!(scan_value(":,"), None);
        assert_eq!(scan_value(" 12"), None);
    }

    #[test]
    fn empty_document() {
        let result = Network::from_json_str(r#"{"neurons": []}"#);
        assert!(matches!(result, Err(SnapshotError::Format(_))));
        assert_eq!(result.unwrap_err().to_string(), "empty or malformed snapshot");
    }

    #[test]
    fn garbage_document() {
        let result = Network::from_json_str("not a snapshot");
        assert_eq!(result.unwrap_err().to_string(), "empty or malformed snapshot");
    }

    #[test]
    fn id_gap() {
        let text = r#"{"neurons": [{"id": 0, "connections": []}, {"id": 2, "connections": []}]}"#;
        let result = Network::from_json_str(text);
        assert!(matches!(result, Err(SnapshotError::Format(_))));
    }

    #[test]
    fn out_of_range_target_ignored() {
        let text = r#"{"neurons": [{"id": 0, "connections": [{"target": 5, "weight": 0.1}]}, {"id": 1}]}"#;
        let network = Network::from_json_str(text).unwrap();
        assert_eq!(network.len(), 2);
        assert_eq!(network.connection_count(), 0);
    }

    #[test]
    fn missing_file() {
        let result = Network::load("/nonexistent/dir/network.json");
        let err = result.unwrap_err();
        assert!(matches!(err, SnapshotError::Io { action: "open", .. }));
        assert!(err.to_string().contains("/nonexistent/dir/network.json"));
    }
}
