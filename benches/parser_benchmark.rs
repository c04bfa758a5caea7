//! Performance benchmarks for SAR parsing
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sar_parser::{Catalog, MalformedLinePolicy, ParseOptions, SarParser, SarSource};
use std::fmt::Write as _;
use std::io::Write;
use tempfile::NamedTempFile;

/// Generate a day of `sar -u -w -b -r -S` output sampled every `interval` seconds
fn generate_sar_text(interval: u32, cpus: usize, include_errors: bool) -> String {
    let times: Vec<String> = (1..86_400 / interval)
        .map(|i| {
            let t = i * interval;
            format!("{:02}:{:02}:{:02}", t / 3600, t / 60 % 60, t % 60)
        })
        .collect();

    let mut text = String::from("Linux 5.4.0-150-generic (bench) \t2023-01-01 \t_x86_64_\t(8 CPU)\n\n");

    text.push_str("00:00:01        CPU     %user     %nice   %system   %iowait    %steal     %idle\n");
    for (i, time) in times.iter().enumerate() {
        let ids = std::iter::once("all".to_string()).chain((0..cpus).map(|c| c.to_string()));
        for id in ids {
            let usr = (i % 50) as f64 / 2.0;
            let _ = writeln!(text, "{}  {:>7}  {:8.2}  0.00  1.00  0.20  0.00  {:8.2}", time, id, usr, 98.8 - usr);
        }
    }

    text.push_str("\n00:00:01       proc/s   cswch/s\n");
    for (i, time) in times.iter().enumerate() {
        if include_errors && i % 10 == 5 {
            // Malformed row every 10th sample
            let _ = writeln!(text, "{}  n/a  n/a", time);
        } else {
            let _ = writeln!(text, "{}  {:.2}  {:.2}", time, (i % 7) as f64, (300 + i % 90) as f64);
        }
    }

    text.push_str("\n00:00:01          tps      rtps      wtps   bread/s   bwrtn/s\n");
    for (i, time) in times.iter().enumerate() {
        let _ = writeln!(
            text,
            "{}  {:.2}  1.00  {:.2}  20.00  {:.2}",
            time,
            (2 + i % 9) as f64,
            (1 + i % 8) as f64,
            (40 + i % 100) as f64
        );
    }

    text.push_str("\n00:00:01    kbmemfree kbmemused  %memused kbbuffers  kbcached  kbcommit   %commit\n");
    for (i, time) in times.iter().enumerate() {
        let used = 3_000_000 + (i % 1000) * 100;
        let _ = writeln!(
            text,
            "{}  {}  {}  {:.2}  102400  819200  2048000  40.00",
            time,
            4_096_000 - used,
            used,
            used as f64 / 40_960.0
        );
    }

    text.push_str("\n00:00:01    kbswpfree kbswpused  %swpused  kbswpcad   %swpcad\n");
    for time in &times {
        let _ = writeln!(text, "{}  2097148  0  0.00  0  0.00", time);
    }

    text
}

fn create_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn benchmark_sar_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("sar_parser");

    for interval in [600, 60, 10].iter() {
        let temp_file = create_temp_file(&generate_sar_text(*interval, 8, false));

        group.bench_with_input(BenchmarkId::from_parameter(interval), interval, |b, _| {
            b.iter(|| {
                let mut parser = SarParser::new(SarSource::file(black_box(temp_file.path())));
                parser.load().map(|report| report.sections.len()).unwrap_or(0)
            });
        });
    }

    group.finish();
}

fn benchmark_malformed_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("malformed_lines");

    let text = generate_sar_text(60, 8, true);
    let options = ParseOptions {
        malformed_lines: MalformedLinePolicy::Skip,
        ..Default::default()
    };

    group.bench_function("skip_policy", |b| {
        b.iter(|| {
            let mut parser =
                SarParser::with_catalog(SarSource::memory(black_box(text.as_str())), Catalog::standard(), options.clone());
            parser.load().map(|report| report.total_skipped()).unwrap_or(0)
        });
    });

    group.finish();
}

fn benchmark_extraction_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction_modes");

    let text = generate_sar_text(10, 32, false);
    for parallel in [false, true] {
        let options = ParseOptions {
            parallel,
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::new("parallel", parallel), &parallel, |b, _| {
            b.iter(|| {
                let mut parser =
                    SarParser::with_catalog(SarSource::memory(text.as_str()), Catalog::standard(), options.clone());
                parser.load().map(|report| report.sections.len()).unwrap_or(0)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sar_parser, benchmark_malformed_lines, benchmark_extraction_modes);
criterion_main!(benches);
