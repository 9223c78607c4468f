//! Runs every configured stage in order

// crate modules
use crate::config::{AssemblyConfig, CaseConfig, Config, DerivedConfig, DerivedJob, MappingConfig};
use crate::error::Result;

// datafoam modules
use datafoam::case::materialize;
use datafoam::closure::jobs::{
    calc_basis_regression, calc_basis_tensors, calc_calibration_ratio, calc_eddy_viscosity,
    calc_invariants, calc_k_b_a, calc_prescribed_eddy_viscosity, calc_strain_rotation,
    BasisInputs, ClosureInputs,
};
use datafoam::closure::{BasisRegression, Constraint, Execution, FitOptions, K_FLOOR};
use datafoam::dataset::Assembler;
use datafoam::mapping::{map_fields, Location, MapOptions};
use datafoam::store::FoamCase;

// external crates
use log::info;

/// Options shared by every stage
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub execution: Execution,
    pub progress: bool,
}

/// Cases, then derived fields, then mappings, then the dataset
pub fn run(config: &Config, options: &RunOptions) -> Result<()> {
    for case in &config.cases {
        extract(config, case)?;
    }
    for derived in &config.derived {
        derive(config, derived, options)?;
    }
    for mapping in &config.mappings {
        map(config, mapping, options)?;
    }
    match &config.assembly {
        Some(assembly) => assemble(config, assembly),
        None => {
            info!("No assembly configured");
            Ok(())
        }
    }
}

fn extract(config: &Config, case: &CaseConfig) -> Result<()> {
    let mut foam = FoamCase::open(&case.path)?;
    if let Some(time) = &case.time {
        foam = foam.with_time(time);
    }

    let store = config.store(&case.target.source);
    let summary = materialize(&foam, case.case_type, &store, &case.target.prefix())?;
    info!(
        "Saved {} fields for {} cells as {}",
        summary.fields.len(),
        summary.n_cells,
        summary.prefix
    );
    Ok(())
}

fn derive(config: &Config, derived: &DerivedConfig, options: &RunOptions) -> Result<()> {
    let store = config.store(&derived.target.source);
    let prefix = derived.target.prefix();

    match &derived.job {
        DerivedJob::KBA { tau, k_floor } => calc_k_b_a(&store, &prefix, tau, *k_floor)?,
        DerivedJob::StrainRotation { grad_u } => calc_strain_rotation(&store, &prefix, grad_u)?,
        DerivedJob::EddyViscosity { unconstrained, les } => {
            let constraint = match unconstrained {
                true => Constraint::Unconstrained,
                false => Constraint::NonNegative,
            };
            let fit = FitOptions {
                constraint,
                execution: options.execution,
                progress: options.progress,
            };
            calc_eddy_viscosity(&store, &prefix, &closure_inputs(*les), &fit)?
        }
        DerivedJob::PrescribedEddyViscosity {
            coarse,
            k_floor,
            les,
        } => calc_prescribed_eddy_viscosity(
            &store,
            &prefix,
            &config.store(&coarse.source),
            &coarse.prefix(),
            &closure_inputs(*les),
            k_floor.unwrap_or(K_FLOOR),
        )?,
        DerivedJob::BasisTensors { k_floor } => {
            calc_basis_tensors(&store, &prefix, &BasisInputs::default(), *k_floor)?
        }
        DerivedJob::Invariants => calc_invariants(&store, &prefix, &BasisInputs::default())?,
        DerivedJob::BasisRegression {
            basis,
            bperp,
            alpha,
        } => {
            let regression = BasisRegression {
                alpha: *alpha,
                execution: options.execution,
                progress: options.progress,
            };
            calc_basis_regression(&store, &prefix, basis, bperp, &regression)?
        }
        DerivedJob::CalibrationRatio {
            coarse,
            nut,
            coarse_nut,
        } => calc_calibration_ratio(
            &store,
            &prefix,
            nut,
            &config.store(&coarse.source),
            &coarse.prefix(),
            coarse_nut,
        )?,
    }
    Ok(())
}

fn closure_inputs(les: bool) -> ClosureInputs {
    match les {
        true => ClosureInputs::les(),
        false => ClosureInputs::default(),
    }
}

fn map(config: &Config, mapping: &MappingConfig, options: &RunOptions) -> Result<()> {
    let (fine, coarse, output) = (
        config.store(&mapping.fine.source),
        config.store(&mapping.coarse.source),
        config.store(&mapping.output.source),
    );
    let (fine_prefix, coarse_prefix, output_prefix) = (
        mapping.fine.prefix(),
        mapping.coarse.prefix(),
        mapping.output.prefix(),
    );

    let map_options = MapOptions {
        method: mapping.method,
        geometry: mapping.geometry,
        progress: options.progress,
    };
    let report = map_fields(
        Location::new(&fine, &fine_prefix),
        Location::new(&coarse, &coarse_prefix),
        Location::new(&output, &output_prefix),
        &mapping.fields,
        &map_options,
    )?;

    info!(
        "Mapped {} fields onto {output_prefix}, {} values filled by nearest neighbour",
        report.fields.len(),
        report.total_fallback()
    );
    Ok(())
}

fn assemble(config: &Config, assembly: &AssemblyConfig) -> Result<()> {
    let mut assembler = Assembler::new(&config.data).with_symmetric_names(config.symmetric_names());
    if let Some(name) = &assembly.coordinates {
        assembler = assembler.with_coordinates(name);
    }

    let table = assembler.write_csv(&assembly.sources, &assembly.cases, &assembly.output)?;
    info!(
        "Wrote {} rows to {}",
        table.n_rows(),
        assembly.output.display()
    );
    Ok(())
}
