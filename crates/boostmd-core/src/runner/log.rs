//! The per-chunk energy/boost log (`gamd.log`).
//!
//! One tab-separated record per completed chunk, fixed field order, energies
//! converted from the engine's native kJ/mol to kcal/mol. The file is opened
//! once for the run: truncated on a fresh run, appended on a restart, and
//! never re-indexed, so the full history of a many-restart campaign reads as
//! a single file. Each record is flushed as it is written; chunks are large
//! relative to the I/O cost, and durability of completed records wins.

use crate::engine::EnergyReport;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Native-unit energies are divided by this to report kcal/mol.
const KJ_PER_KCAL: f64 = 4.184;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate/create; the header follows.
    Fresh,
    /// Append; the header already exists from the original run.
    Append,
}

pub struct EnergyLog {
    writer: BufWriter<File>,
}

impl EnergyLog {
    /// Open the log for the run's duration. The handle is the logger's sole
    /// owned resource; dropping the logger releases it on every exit path.
    pub fn open(path: &Path, mode: WriteMode) -> std::io::Result<Self> {
        let file = match mode {
            WriteMode::Fresh => File::create(path)?,
            WriteMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
        };
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Column/unit documentation. Fresh runs only, before any record.
    pub fn write_header(&mut self) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "# Gaussian accelerated Molecular Dynamics log file"
        )?;
        writeln!(
            self.writer,
            "# All energy terms are stored in unit of kcal/mol"
        )?;
        writeln!(
            self.writer,
            "# ntwx,total_nstep,Unboosted-Potential-Energy,\
             Unboosted-Dihedral-Energy,Total-Force-Weight,\
             Dihedral-Force-Weight,Boost-Energy-Potential,Boost-Energy-Dihedral"
        )?;
        self.writer.flush()
    }

    /// Append the record for the chunk that just completed at `cumulative_step`.
    pub fn write_record(
        &mut self,
        chunk_size: u64,
        cumulative_step: u64,
        report: &EnergyReport,
    ) -> std::io::Result<()> {
        write!(self.writer, "{}\t{}\t", chunk_size, cumulative_step)?;
        self.write_values(report)
    }

    /// Append the failure-marked record: the marker replaces the normal
    /// step field. Called at most once per run, right before the process
    /// stops with the fatal status.
    pub fn write_failure(
        &mut self,
        cumulative_step: u64,
        report: &EnergyReport,
    ) -> std::io::Result<()> {
        write!(self.writer, "Fail Step: {}\t", cumulative_step)?;
        self.write_values(report)
    }

    fn write_values(&mut self, report: &EnergyReport) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            report.potential_energy / KJ_PER_KCAL,
            report.dihedral_energy / KJ_PER_KCAL,
            report.total_force_scale,
            report.dihedral_force_scale,
            report.boost_potential / KJ_PER_KCAL,
            report.dihedral_boost / KJ_PER_KCAL,
        )?;
        self.writer.flush()
    }
}
