use anyhow::{Context, Result};
use brainspin::distance::{get_surface_distance, DistanceOpts};
use brainspin::hemi::hemiid_from_ints;
use brainspin::mesh::Mesh;
use brainspin::parcel::Parcellation;
use brainspin::spins::{gen_spinsamples, load_matrix, save_cost, save_matrix, save_spins, SpinCfg};
use brainspin::stats::{compare_images, CompareOpts};
use brainspin::Vec3 as Vector3;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;
mod table;

use provenance::{Artifact, RunRecord};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "brainspin")]
#[command(about = "Spatial null models for brain maps", version = brainspin::VERSION)]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Generate a resampling array from coordinates (columns x, y, z, hemi)
    Spins {
        #[arg(long)]
        coords: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = brainspin::cfg::DEFAULT_N_ROTATE)]
        n_rotate: usize,
        /// original | vasa | hungarian
        #[arg(long, default_value = "original")]
        method: String,
        #[arg(long)]
        seed: Option<u64>,
        /// Draw rotations on all cores (skips duplicate checking)
        #[arg(long)]
        parallel: bool,
        /// Also write the reassignment cost array here
        #[arg(long)]
        cost: Option<PathBuf>,
    },
    /// Surface distance matrix for one hemisphere mesh
    Distance {
        /// Vertex table with columns x, y, z
        #[arg(long)]
        vertices: PathBuf,
        /// Triangle table with columns v0, v1, v2
        #[arg(long)]
        triangles: PathBuf,
        /// Optional per-vertex table with column `label` (and `name`)
        #[arg(long)]
        labels: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 1)]
        n_proc: usize,
    },
    /// Correlate two maps (columns src, trg), optionally against null maps
    Compare {
        #[arg(long)]
        maps: PathBuf,
        /// `.npy` null maps for `src`, one per column
        #[arg(long)]
        nulls: Option<PathBuf>,
        /// pearsonr | spearmanr
        #[arg(long, default_value = "pearsonr")]
        metric: String,
        #[arg(long)]
        ignore_zero: bool,
        /// propagate | raise | omit
        #[arg(long, default_value = "propagate")]
        nan_policy: String,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Spins {
            coords,
            out,
            n_rotate,
            method,
            seed,
            parallel,
            cost,
        } => spins(&coords, &out, n_rotate, &method, seed, parallel, cost.as_deref()),
        Action::Distance {
            vertices,
            triangles,
            labels,
            out,
            n_proc,
        } => distance(&vertices, &triangles, labels.as_deref(), &out, n_proc),
        Action::Compare {
            maps,
            nulls,
            metric,
            ignore_zero,
            nan_policy,
        } => compare(&maps, nulls.as_deref(), &metric, ignore_zero, &nan_policy),
        Action::Report => report(),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct SpinParams<'a> {
    coords: &'a Path,
    n_rotate: usize,
    method: &'a str,
    seed: Option<u64>,
    parallel: bool,
}

fn spins(
    coords: &Path,
    out: &Path,
    n_rotate: usize,
    method: &str,
    seed: Option<u64>,
    parallel: bool,
    cost_out: Option<&Path>,
) -> Result<()> {
    let df = table::read_table(coords)?;
    let (x, y, z) = (
        table::f64_column(&df, "x")?,
        table::f64_column(&df, "y")?,
        table::f64_column(&df, "z")?,
    );
    let points: Vec<Vector3<f64>> = (0..x.len()).map(|i| Vector3::new(x[i], y[i], z[i])).collect();
    let hemiid = hemiid_from_ints(&table::i64_column(&df, "hemi")?)?;
    tracing::info!(points = points.len(), n_rotate, method, seed = ?seed, "spins");

    let cfg = SpinCfg {
        n_rotate,
        method: method.parse()?,
        seed,
        parallel,
        return_cost: cost_out.is_some(),
        ..Default::default()
    };
    let samples = gen_spinsamples(&points, &hemiid, &cfg)?;
    for warning in &samples.warnings {
        tracing::warn!(?warning, "spin sampling");
    }

    ensure_parent(out)?;
    save_spins(out, &samples.spins)?;
    let params = SpinParams {
        coords,
        n_rotate,
        method,
        seed,
        parallel,
    };
    let mut record = RunRecord::new("spins", params).artifact(Artifact::new(out, samples.spins.shape()));
    if let (Some(path), Some(cost)) = (cost_out, samples.cost.as_ref()) {
        ensure_parent(path)?;
        save_cost(path, cost)?;
        record = record.artifact(Artifact::new(path, cost.shape()));
    }
    record.warnings = samples.warnings.iter().map(|w| format!("{w:?}")).collect();
    let sidecar = record.save()?;
    tracing::info!(sidecar = %sidecar.display(), "wrote resampling array");
    Ok(())
}

fn read_parcellation(path: &Path) -> Result<Parcellation> {
    let df = table::read_table(path)?;
    let labels = table::i64_column(&df, "label")?
        .into_iter()
        .map(|l| i32::try_from(l).with_context(|| format!("label {l} out of range")))
        .collect::<Result<Vec<_>>>()?;
    let Some(names) = table::str_column(&df, "name")? else {
        return Ok(Parcellation::from_labels(labels));
    };
    let table: BTreeMap<i32, String> = labels.iter().copied().zip(names).collect();
    Ok(Parcellation::new(labels, table))
}

#[derive(Serialize)]
struct DistanceParams<'a> {
    vertices: &'a Path,
    triangles: &'a Path,
    labels: Option<&'a Path>,
    n_proc: usize,
}

fn distance(vertices: &Path, triangles: &Path, labels: Option<&Path>, out: &Path, n_proc: usize) -> Result<()> {
    let vdf = table::read_table(vertices)?;
    let (x, y, z) = (
        table::f64_column(&vdf, "x")?,
        table::f64_column(&vdf, "y")?,
        table::f64_column(&vdf, "z")?,
    );
    let tdf = table::read_table(triangles)?;
    let corners = ["v0", "v1", "v2"]
        .into_iter()
        .map(|c| table::i64_column(&tdf, c))
        .collect::<Result<Vec<_>>>()?;
    let tris = (0..tdf.height())
        .map(|t| -> Result<[usize; 3]> {
            let idx = |k: usize| usize::try_from(corners[k][t]).context("negative triangle index");
            Ok([idx(0)?, idx(1)?, idx(2)?])
        })
        .collect::<Result<Vec<_>>>()?;
    let mesh = Mesh::new((0..x.len()).map(|i| Vector3::new(x[i], y[i], z[i])).collect(), tris)?;
    let parcellation = labels.map(read_parcellation).transpose()?;
    tracing::info!(vertices = mesh.n_vertices(), parcellated = parcellation.is_some(), n_proc, "distance");

    let opts = DistanceOpts {
        parcellation: parcellation.as_ref(),
        n_proc,
        ..Default::default()
    };
    let dist = get_surface_distance(&mesh, &opts)?;
    ensure_parent(out)?;
    save_matrix(out, &dist)?;
    let params = DistanceParams {
        vertices,
        triangles,
        labels,
        n_proc,
    };
    RunRecord::new("distance", params)
        .artifact(Artifact::new(out, dist.shape()))
        .save()?;
    Ok(())
}

#[derive(Serialize)]
struct CompareSummary {
    similarity: f64,
    pvalue: Option<f64>,
    n_perm: Option<usize>,
}

fn compare(maps: &Path, nulls: Option<&Path>, metric: &str, ignore_zero: bool, nan_policy: &str) -> Result<()> {
    let df = table::read_table(maps)?;
    let src = table::f64_column(&df, "src")?;
    let trg = table::f64_column(&df, "trg")?;
    let null_maps = nulls.map(|p| load_matrix(p, None)).transpose()?;
    let opts = CompareOpts {
        metric: metric.parse()?,
        ignore_zero,
        nulls: null_maps.as_ref(),
        nan_policy: nan_policy.parse()?,
    };
    tracing::info!(n = src.len(), metric, with_nulls = nulls.is_some(), "compare");
    let cmp = compare_images(&src, &trg, &opts)?;
    let summary = CompareSummary {
        similarity: cmp.similarity,
        pvalue: cmp.pvalue,
        n_perm: null_maps.as_ref().map(|m| m.ncols()),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn report() -> Result<()> {
    let obj = serde_json::json!({
        "code_rev": provenance::code_rev(),
        "version": brainspin::VERSION,
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
