use std::path::PathBuf;

use anyhow::Context as _;
use threes_agent::{agent::TupleVariant, weights::WeightStore};

use crate::{
    schema::weight_report::{TableReport, WeightReport},
    util::Output,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InspectWeightsArg {
    /// Weight file written by a learning slider
    path: PathBuf,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) fn run(arg: &InspectWeightsArg) -> anyhow::Result<()> {
    let weights = WeightStore::load(&arg.path)
        .with_context(|| format!("Failed to load weights from {}", arg.path.display()))?;
    let report = build_report(arg.path.clone(), &weights);

    if arg.json {
        return Output::save_json(&report, None);
    }

    println!("{}", report.path.display());
    if report.compatible_with.is_empty() {
        println!("compatible with: (none)");
    } else {
        println!("compatible with: {}", report.compatible_with.join(", "));
    }
    println!("table\tentries\tnonzero\tmin\tmax\tmean |w|");
    for table in &report.tables {
        println!(
            "{}\t{}\t{}\t{:.4}\t{:.4}\t{:.6}",
            table.index, table.entries, table.nonzero, table.min, table.max, table.mean_abs
        );
    }
    Ok(())
}

fn build_report(path: PathBuf, weights: &WeightStore) -> WeightReport {
    let compatible_with = [TupleVariant::FourTuple, TupleVariant::SixTuple]
        .into_iter()
        .filter(|variant| variant.network().check_layout(weights).is_ok())
        .map(|variant| variant.to_string())
        .collect();

    let tables = weights
        .tables()
        .iter()
        .enumerate()
        .map(|(index, table)| {
            let mut report = TableReport {
                index,
                entries: table.len(),
                nonzero: 0,
                min: f32::INFINITY,
                max: f32::NEG_INFINITY,
                mean_abs: 0.0,
            };
            let mut abs_sum = 0.0;
            for w in table.iter() {
                if w != 0.0 {
                    report.nonzero += 1;
                }
                report.min = report.min.min(w);
                report.max = report.max.max(w);
                abs_sum += f64::from(w.abs());
            }
            #[expect(clippy::cast_precision_loss)]
            let entries = table.len() as f64;
            report.mean_abs = abs_sum / entries;
            report
        })
        .collect();

    WeightReport {
        path,
        compatible_with,
        tables,
    }
}
