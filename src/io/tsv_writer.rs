use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::dvh::Dvh;

pub fn write_tsv(path: &Path, dvhs: &[Arc<Dvh>]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    writeln!(w, "structure\tdose_gy\tvolume_fraction\tvolume_cc")?;
    for dvh in dvhs {
        let total = dvh.total_volume_cc();
        for (dose, fraction) in dvh.points() {
            if fraction.is_nan() {
                bail!("NaN in cumulative DVH of '{}'", dvh.structure());
            }
            writeln!(
                w,
                "{}\t{:.4}\t{:.6}\t{:.4}",
                dvh.structure(),
                dose,
                fraction,
                fraction * total
            )?;
        }
    }
    w.flush()?;
    Ok(())
}
