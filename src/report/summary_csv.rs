use crate::core::metrics::CoverageSummary;
use crate::report::fmt_stat;
use anyhow::Result;
use std::io::Write;

pub fn header(summary: &CoverageSummary) -> String {
    let mut cols = vec![
        "GenomeSize".to_string(),
        "TotalBases".to_string(),
        "Breadth1x".to_string(),
    ];
    cols.extend(
        summary
            .breadth
            .iter()
            .map(|b| format!("Breadth{}x", b.threshold)),
    );
    cols.extend(
        [
            "MeanDepth",
            "MeanDepthCovered",
            "MeanGapSize",
            "MedianDepth",
            "MedianDepthCovered",
            "MedianGapSize",
        ]
        .map(String::from),
    );
    cols.join(",")
}

pub fn row(summary: &CoverageSummary) -> String {
    let mut cells = vec![
        summary.genome_size.to_string(),
        summary.total_bases.to_string(),
        fmt_stat(summary.breadth_1x),
    ];
    cells.extend(summary.breadth.iter().map(|b| fmt_stat(b.percent)));
    cells.extend(
        [
            summary.mean_depth,
            summary.mean_depth_covered,
            summary.mean_gap_size,
            summary.median_depth,
            summary.median_depth_covered,
            summary.median_gap_size,
        ]
        .map(fmt_stat),
    );
    cells.join(",")
}

pub fn write(w: &mut dyn Write, summary: &CoverageSummary) -> Result<()> {
    writeln!(w, "{}", header(summary))?;
    writeln!(w, "{}", row(summary))?;
    Ok(())
}
