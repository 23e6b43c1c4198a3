//! `.rnn` export for embedded controllers
//!
//! Write-only. Carries only what a controller needs to run the network
//! forward: no activations, inputs or modulatory connections.
//!
//! ```text
//! tag "RN" | version u8 | size u16 | num_inputs u16 | num_outputs u16
//! learning_rate f32 | gamma f32 x 4 x size | weight f32 x size x size
//! threshold f32 x size | activation_function u8 x size
//! ```

use crate::error::{Result, StorageError};
use crate::schemas::{magic, ByteWriter};
use cann_runtime::{Network, NetworkSnapshot, GAMMA_COUNT};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Current `.rnn` format version
pub const RNN_VERSION: u8 = 1;

/// Bytes before the first array
pub const RNN_HEADER_SIZE: usize = 13;

fn narrow(name: &str, value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        StorageError::invalid_format(format!(
            "{} {} exceeds the embedded limit of {}",
            name,
            value,
            u16::MAX
        ))
    })
}

/// Encode a snapshot into `.rnn` bytes
pub fn encode_embedded(snapshot: &NetworkSnapshot) -> Result<Vec<u8>> {
    snapshot.validate()?;
    let size = narrow("size", snapshot.size)?;
    let num_inputs = narrow("num_inputs", snapshot.num_inputs)?;
    let num_outputs = narrow("num_outputs", snapshot.num_outputs)?;

    let n = snapshot.size;
    let per_neuron = GAMMA_COUNT * 4 + 4 + 1;
    let mut w = ByteWriter::with_capacity(RNN_HEADER_SIZE + n * per_neuron + n * n * 4);
    w.put_bytes(&magic::RNN);
    w.put_u8(RNN_VERSION);
    w.put_u16(size);
    w.put_u16(num_inputs);
    w.put_u16(num_outputs);
    w.put_f32(snapshot.learning_rate);
    for gammas in &snapshot.gammas {
        w.put_f32s(gammas);
    }
    w.put_f32s(&snapshot.weights);
    w.put_f32s(&snapshot.thresholds);
    w.put_bytes(&snapshot.activation_functions);
    Ok(w.into_inner())
}

/// Write a network in `.rnn` format
pub fn export_embedded<W: Write>(network: &Network, mut writer: W) -> Result<()> {
    let bytes = encode_embedded(&network.snapshot())?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    log::debug!(
        "Exported {}-neuron network for embedded use ({} bytes)",
        network.size(),
        bytes.len()
    );
    Ok(())
}

/// Export to a file, replacing it if present
pub fn export_embedded_to_path<P: AsRef<Path>>(network: &Network, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    export_embedded(network, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cann_runtime::{ActivationFunction, NetworkConfig};

    #[test]
    fn test_layout() {
        let mut net = Network::new(NetworkConfig::new(2, 1, 1)).unwrap();
        net.set_learning_rate(0.25);
        net.set_weight(1, 0, 2.0);
        net.set_threshold(1, 0.5);
        net.set_activation_function(1, ActivationFunction::Linear);

        let mut bytes = Vec::new();
        export_embedded(&net, &mut bytes).unwrap();

        assert_eq!(bytes.len(), RNN_HEADER_SIZE + 2 * 16 + 4 * 4 + 2 * 4 + 2);
        assert_eq!(&bytes[..2], b"RN");
        assert_eq!(bytes[2], RNN_VERSION);
        assert_eq!(u16::from_le_bytes([bytes[3], bytes[4]]), 2);
        assert_eq!(u16::from_le_bytes([bytes[5], bytes[6]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[7], bytes[8]]), 1);
        assert_eq!(f32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]), 0.25);

        // weight[1][0] is the third weight
        let w10 = RNN_HEADER_SIZE + 2 * 16 + 2 * 4;
        assert_eq!(
            f32::from_le_bytes([bytes[w10], bytes[w10 + 1], bytes[w10 + 2], bytes[w10 + 3]]),
            2.0
        );
        assert_eq!(bytes[bytes.len() - 1], ActivationFunction::Linear.code());
    }

    #[test]
    fn test_rejects_oversized_dimensions() {
        let mut snapshot = Network::new(NetworkConfig::new(1, 0, 0)).unwrap().snapshot();
        assert!(encode_embedded(&snapshot).is_ok());
        assert!(narrow("size", u16::MAX as usize + 1).is_err());

        snapshot.size = 70_000;
        assert!(encode_embedded(&snapshot).is_err());
    }
}
