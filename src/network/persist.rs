//! Saving and loading the learned state of a network.
//!
//! Only the flattened parameter vector is stored, under the key
//! `"parameter"`. The layer stack must be rebuilt with the same shape before
//! the parameters are loaded back.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::Network;
use crate::error::Result;
use crate::output::OutputLayer;
use crate::tensor::SampleBatch;

/// Serialized form of a network's learned state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterArchive {
    pub parameter: Vec<f64>,
}

impl<B: SampleBatch, O: OutputLayer> Network<'_, B, O> {
    pub fn archive(&self) -> ParameterArchive {
        ParameterArchive {
            parameter: self.parameters().to_vec(),
        }
    }

    /// Loads `archive` into the network and its layers. Fails without
    /// changing anything if the length does not match the network size.
    pub fn restore(&mut self, archive: ParameterArchive) -> Result<()> {
        self.set_parameters(archive.parameter)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, &self.archive())?;
        Ok(())
    }

    pub fn read_json<R: Read>(&mut self, reader: R) -> Result<()> {
        let archive: ParameterArchive = serde_json::from_reader(reader)?;
        self.restore(archive)
    }

    /// Writes the parameter archive to `path` as JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        debug!(
            "saved {} parameters to {}",
            self.network_size(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Reads a parameter archive written by [`save_json`](Self::save_json).
    pub fn load_json<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        self.read_json(reader)?;
        debug!(
            "loaded {} parameters from {}",
            self.network_size(),
            path.as_ref().display()
        );
        Ok(())
    }
}
