//! `.pcn` network persistence
//!
//! Layout (little-endian):
//!
//! ```text
//! magic "PCAN" | version u32 | size u32 | learning_rate f32
//! num_inputs u32 | num_outputs u32
//! gamma f32 x 4 x size | weight f32 x size x size (row-major)
//! threshold f32 x size | activation f32 x size | mod_weight f32 x size
//! inputs f32 x num_inputs | activation_function u8 x size
//! mod_target u32 x size | crc32 u32
//! ```
//!
//! The checksum covers every byte before it. Loading either produces a
//! complete network or an error, never a partial one.

use crate::error::{Result, StorageError};
use crate::schemas::{
    calculate_checksum, magic, validate_checksum, validate_magic, ByteReader, ByteWriter,
};
use cann_runtime::{Network, NetworkSnapshot, SchedulerConfig, GAMMA_COUNT};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Current `.pcn` format version
pub const PCN_VERSION: u32 = 1;

/// Bytes before the first array
pub const HEADER_SIZE: usize = 24;

const CHECKSUM_SIZE: usize = 4;

/// Fixed-size `.pcn` header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcnHeader {
    /// Format version
    pub version: u32,
    /// Neuron count
    pub size: u32,
    /// Global plasticity multiplier
    pub learning_rate: f32,
    /// Length of the clamped input prefix
    pub num_inputs: u32,
    /// Length of the read-out suffix
    pub num_outputs: u32,
}

impl PcnHeader {
    fn parse(reader: &mut ByteReader<'_>) -> Result<Self> {
        validate_magic(reader.take(4)?, magic::PCN)?;
        let version = reader.u32()?;
        if version != PCN_VERSION {
            return Err(StorageError::UnsupportedVersion {
                version,
                supported: PCN_VERSION,
            });
        }
        Ok(Self {
            version,
            size: reader.u32()?,
            learning_rate: reader.f32()?,
            num_inputs: reader.u32()?,
            num_outputs: reader.u32()?,
        })
    }

    /// Total encoded length implied by this header, checksum included
    pub fn encoded_len(&self) -> Option<usize> {
        let n = self.size as usize;
        let per_neuron = GAMMA_COUNT * 4 + 3 * 4 + 1 + 4;
        n.checked_mul(n)?
            .checked_mul(4)?
            .checked_add(n.checked_mul(per_neuron)?)?
            .checked_add((self.num_inputs as usize).checked_mul(4)?)?
            .checked_add(HEADER_SIZE + CHECKSUM_SIZE)
    }
}

fn dimension(name: &str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        StorageError::invalid_format(format!("{} {} does not fit in u32", name, value))
    })
}

/// Encode a snapshot into `.pcn` bytes
pub fn encode(snapshot: &NetworkSnapshot) -> Result<Vec<u8>> {
    snapshot.validate()?;
    let header = PcnHeader {
        version: PCN_VERSION,
        size: dimension("size", snapshot.size)?,
        learning_rate: snapshot.learning_rate,
        num_inputs: dimension("num_inputs", snapshot.num_inputs)?,
        num_outputs: dimension("num_outputs", snapshot.num_outputs)?,
    };
    let len = header
        .encoded_len()
        .ok_or_else(|| StorageError::invalid_format("network too large to encode"))?;

    let mut w = ByteWriter::with_capacity(len);
    w.put_bytes(&magic::PCN);
    w.put_u32(header.version);
    w.put_u32(header.size);
    w.put_f32(header.learning_rate);
    w.put_u32(header.num_inputs);
    w.put_u32(header.num_outputs);
    for gammas in &snapshot.gammas {
        w.put_f32s(gammas);
    }
    w.put_f32s(&snapshot.weights);
    w.put_f32s(&snapshot.thresholds);
    w.put_f32s(&snapshot.activations);
    w.put_f32s(&snapshot.mod_weights);
    w.put_f32s(&snapshot.inputs);
    w.put_bytes(&snapshot.activation_functions);
    for &target in &snapshot.mod_targets {
        w.put_u32(target);
    }
    let checksum = calculate_checksum(w.as_slice());
    w.put_u32(checksum);

    Ok(w.into_inner())
}

/// Decode `.pcn` bytes into a validated snapshot
pub fn decode(data: &[u8]) -> Result<NetworkSnapshot> {
    let mut reader = ByteReader::new(data);
    let header = PcnHeader::parse(&mut reader)?;

    let expected_len = header
        .encoded_len()
        .ok_or_else(|| StorageError::invalid_format("declared size overflows"))?;
    if data.len() != expected_len {
        return Err(StorageError::invalid_format(format!(
            "expected {} bytes for {} neurons, found {}",
            expected_len,
            header.size,
            data.len()
        )));
    }

    let (body, trailer) = data.split_at(data.len() - CHECKSUM_SIZE);
    let mut crc = [0u8; CHECKSUM_SIZE];
    crc.copy_from_slice(trailer);
    validate_checksum(body, u32::from_le_bytes(crc))?;

    let n = header.size as usize;
    let mut gammas = Vec::with_capacity(n);
    for _ in 0..n {
        let mut g = [0.0f32; GAMMA_COUNT];
        for value in &mut g {
            *value = reader.f32()?;
        }
        gammas.push(g);
    }

    let snapshot = NetworkSnapshot {
        size: n,
        learning_rate: header.learning_rate,
        num_inputs: header.num_inputs as usize,
        num_outputs: header.num_outputs as usize,
        gammas,
        weights: reader.f32s(n * n)?,
        thresholds: reader.f32s(n)?,
        activations: reader.f32s(n)?,
        mod_weights: reader.f32s(n)?,
        inputs: reader.f32s(header.num_inputs as usize)?,
        activation_functions: reader.take(n)?.to_vec(),
        mod_targets: reader.u32s(n)?,
    };
    debug_assert_eq!(reader.remaining(), CHECKSUM_SIZE);
    snapshot.validate()?;
    Ok(snapshot)
}

/// Write a network in `.pcn` format
pub fn save<W: Write>(network: &Network, mut writer: W) -> Result<()> {
    let bytes = encode(&network.snapshot())?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    log::debug!("Saved {}-neuron network ({} bytes)", network.size(), bytes.len());
    Ok(())
}

/// Read a `.pcn` network and start it with the given scheduler settings
pub fn load<R: Read>(mut reader: R, scheduler: SchedulerConfig) -> Result<Network> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let snapshot = decode(&data)?;
    let network = Network::from_snapshot(&snapshot, scheduler)?;
    log::debug!("Loaded {}-neuron network ({} bytes)", network.size(), data.len());
    Ok(network)
}

/// Save to a file, replacing it if present
pub fn save_to_path<P: AsRef<Path>>(network: &Network, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    save(network, BufWriter::new(file))
}

/// Load from a file
pub fn load_from_path<P: AsRef<Path>>(path: P, scheduler: SchedulerConfig) -> Result<Network> {
    let file = File::open(path.as_ref())?;
    load(BufReader::new(file), scheduler)
}

/// Read and check only the header
pub fn read_header<R: Read>(mut reader: R) -> Result<PcnHeader> {
    let mut buf = [0u8; HEADER_SIZE];
    reader.read_exact(&mut buf)?;
    PcnHeader::parse(&mut ByteReader::new(&buf))
}
