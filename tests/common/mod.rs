#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// `sar -u -w -b -r -S` output for one day, 24-hour clock, with a reboot
/// between the two sampling runs.
pub const SAR_24H: &str = "\
Linux 5.4.0-150-generic (web01) \t2023-01-01 \t_x86_64_\t(2 CPU)

00:00:01        CPU     %user     %nice   %system   %iowait    %steal     %idle
00:10:01        all      2.50      0.00      1.00      0.20      0.00     96.30
00:10:01          0      3.00      0.00      1.20      0.30      0.00     95.50
00:10:01          1      2.00      0.00      0.80      0.10      0.00     97.10
00:20:01        all      4.00      0.10      2.00      0.50      0.00     93.40
00:20:01          0      5.00      0.20      2.50      0.60      0.00     91.70
00:20:01          1      3.00      0.00      1.50      0.40      0.00     95.10

00:00:01       proc/s   cswch/s
00:10:01         1.25    350.40
00:20:01         0.80    298.10

00:00:01          tps      rtps      wtps   bread/s   bwrtn/s
00:10:01         5.20      1.10      4.10     20.50     80.25
00:20:01         3.00      0.50      2.50      8.00     40.00

00:00:01    kbmemfree kbmemused  %memused kbbuffers  kbcached  kbcommit   %commit
00:10:01      1024000   3072000     75.00    102400    819200   2048000     40.00
00:20:01      1000000   3096000     75.59    102500    820000   2050000     40.10

00:00:01    kbswpfree kbswpused  %swpused  kbswpcad   %swpcad
00:10:01      2097148         0      0.00         0      0.00
00:20:01      2096124      1024      0.05         0      0.00

00:30:01     LINUX RESTART\t(2 CPU)

00:30:01        CPU     %user     %nice   %system   %iowait    %steal     %idle
00:40:01        all      1.00      0.00      0.50      0.10      0.00     98.40
00:40:01          0      1.20      0.00      0.60      0.10      0.00     98.10
00:40:01          1      0.80      0.00      0.40      0.10      0.00     98.70
Average:        all      2.50      0.03      1.17      0.27      0.00     96.03
Average:          0      3.07      0.07      1.43      0.33      0.00     95.10
Average:          1      1.93      0.00      0.90      0.20      0.00     96.97

00:30:01       proc/s   cswch/s
00:40:01         2.00    410.00
Average:         1.35    352.83

00:30:01          tps      rtps      wtps   bread/s   bwrtn/s
00:40:01         9.00      4.00      5.00    160.00    120.00
Average:         5.73      1.87      3.87     62.83     80.08

00:30:01    kbmemfree kbmemused  %memused kbbuffers  kbcached  kbcommit   %commit
00:40:01      2048000   2048000     50.00     51200    409600   1024000     20.00
Average:      1357333   2738667     66.86     85367    682933   1707333     33.37

00:30:01    kbswpfree kbswpused  %swpused  kbswpcad   %swpcad
00:40:01      2097148         0      0.00         0      0.00
Average:      2096807       341      0.02         0      0.00
";

/// The same sections on a 12-hour clock, ending with a reboot marker.
pub const SAR_12H: &str = "\
Linux 3.10.0-1160.el7.x86_64 (db01) \t06/05/2024 \t_x86_64_\t(4 CPU)

12:00:01 AM     CPU     %user     %nice   %system   %iowait    %steal     %idle
12:10:01 AM     all      1.00      0.00      0.50      0.10      0.00     98.40
12:10:01 AM       0      1.50      0.00      0.70      0.20      0.00     97.60
01:10:01 PM     all      6.00      0.00      3.00      0.40      0.00     90.60
01:10:01 PM       0      7.00      0.00      3.50      0.50      0.00     89.00
Average:        all      3.50      0.00      1.75      0.25      0.00     94.50
Average:          0      4.25      0.00      2.10      0.35      0.00     93.30

12:00:01 AM   proc/s   cswch/s
12:10:01 AM     0.50    120.00
01:10:01 PM     3.10    980.50
Average:        1.80    550.25

12:00:01 AM       tps      rtps      wtps   bread/s   bwrtn/s
12:10:01 AM      2.00      0.50      1.50     10.00     30.00
01:10:01 PM     12.00      2.00     10.00     50.00    400.00
Average:         7.00      1.25      5.75     30.00    215.00

12:00:01 AM kbmemfree kbmemused  %memused kbbuffers  kbcached  kbcommit   %commit
12:10:01 AM   8000000   8000000     50.00    200000   4000000   6000000     37.50
01:10:01 PM   6000000  10000000     62.50    210000   5000000   7000000     43.75
Average:      7000000   9000000     56.25    205000   4500000   6500000     40.63

12:00:01 AM kbswpfree kbswpused  %swpused  kbswpcad   %swpcad
12:10:01 AM   4194300         0      0.00         0      0.00
01:10:01 PM   4190204      4096      0.10       512     12.50
Average:      4192252      2048      0.05       256      6.25

02:00:01 PM       LINUX RESTART
";

/// [`SAR_24H`] with the swap section removed.
pub fn sar_without_swap() -> String {
    SAR_24H
        .split("\n\n")
        .filter(|chunk| !chunk.contains("kbswpfree"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// [`SAR_24H`] with one unparseable task row.
pub fn sar_with_bad_task_row() -> String {
    SAR_24H.replacen("00:20:01         0.80    298.10", "00:20:01          n/a    298.10", 1)
}

pub fn write_sar_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}
