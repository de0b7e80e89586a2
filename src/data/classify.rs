//! Severity classification for individual telemetry fields.
//!
//! Every function here is pure: it takes already-decoded numbers and returns
//! a [`Classified`] value holding a severity tier and the text to display.
//! Thresholds are fixed.

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;

const BYTE_UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Shown in place of a NaN or infinite reading.
pub const UNREADABLE: &str = "n/a";

/// Network throughput above this many MiB/s is critical.
pub const NET_CRITICAL_MIBPS: f64 = 120.0;
/// Network throughput above this many MiB/s is a caution.
pub const NET_CAUTION_MIBPS: f64 = 100.0;
/// Disk throughput above this many MiB/s is critical.
pub const DISK_IO_CRITICAL_MIBPS: f64 = 1000.0;
/// Disk throughput above this many MiB/s is a caution.
pub const DISK_IO_CAUTION_MIBPS: f64 = 500.0;
/// Per-core load ratio at or above which load is critical.
pub const LOAD_CRITICAL_RATIO: f64 = 0.8;
/// Per-core load ratio at or above which load is a caution.
pub const LOAD_CAUTION_RATIO: f64 = 0.6;
pub const MEMORY_CRITICAL_PCT: f64 = 90.0;
pub const MEMORY_CAUTION_PCT: f64 = 75.0;
pub const DISK_CRITICAL_PCT: f64 = 95.0;
pub const DISK_CAUTION_PCT: f64 = 80.0;

/// Severity tier of a classified field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Normal,
    Caution,
    Critical,
}

impl Severity {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Normal => "OK",
            Severity::Caution => "WARN",
            Severity::Critical => "CRIT",
        }
    }
}

/// A severity tier together with its display text.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub severity: Severity,
    pub text: String,
}

impl Classified {
    fn new(severity: Severity, text: String) -> Self {
        Self { severity, text }
    }
}

/// Network throughput in bytes per second. Zero traffic means the node is
/// cut off, so it is critical rather than idle. So is a reading that is not
/// a number.
pub fn network_throughput(bytes_per_sec: f64) -> Classified {
    let mibps = bytes_per_sec / MIB;
    let severity = if !bytes_per_sec.is_finite()
        || bytes_per_sec <= 0.0
        || mibps > NET_CRITICAL_MIBPS
    {
        Severity::Critical
    } else if mibps > NET_CAUTION_MIBPS {
        Severity::Caution
    } else {
        Severity::Normal
    };
    Classified::new(severity, format_rate(bytes_per_sec))
}

/// Disk throughput in bytes per second. Zero is normal: the node may be
/// running with an in-memory store. A non-finite reading is critical.
pub fn disk_throughput(bytes_per_sec: f64) -> Classified {
    let mibps = bytes_per_sec / MIB;
    let severity = if !bytes_per_sec.is_finite() {
        Severity::Critical
    } else if bytes_per_sec <= 0.0 {
        Severity::Normal
    } else if mibps > DISK_IO_CRITICAL_MIBPS {
        Severity::Critical
    } else if mibps > DISK_IO_CAUTION_MIBPS {
        Severity::Caution
    } else {
        Severity::Normal
    };
    Classified::new(severity, format_rate(bytes_per_sec))
}

/// Load average judged against the number of cores.
pub fn load_average(load: f64, cpu_cores: u32) -> Classified {
    if !load.is_finite() {
        return Classified::new(Severity::Critical, UNREADABLE.to_string());
    }
    let ratio = load / f64::from(cpu_cores.max(1));
    let severity = if ratio >= LOAD_CRITICAL_RATIO {
        Severity::Critical
    } else if ratio >= LOAD_CAUTION_RATIO {
        Severity::Caution
    } else {
        Severity::Normal
    };
    Classified::new(severity, format!("{:.2}", load))
}

/// Memory in use as a share of the total.
pub fn memory_usage(used: u64, total: u64) -> Classified {
    usage(used, total, MEMORY_CAUTION_PCT, MEMORY_CRITICAL_PCT)
}

/// Disk space in use as a share of the total.
pub fn disk_usage(used: u64, total: u64) -> Classified {
    usage(used, total, DISK_CAUTION_PCT, DISK_CRITICAL_PCT)
}

fn usage(used: u64, total: u64, caution: f64, critical: f64) -> Classified {
    let pct = percent(used, total);
    let severity = if pct >= critical {
        Severity::Critical
    } else if pct >= caution {
        Severity::Caution
    } else {
        Severity::Normal
    };
    Classified::new(severity, format!("{:.1}%", pct))
}

/// `used / total` as a percentage; zero when the total is unknown.
pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

/// Format a byte count with binary units, e.g. "0 B", "1.50 KiB".
pub fn format_bytes(bytes: u64) -> String {
    format_scaled(bytes as f64)
}

/// Format a byte rate, e.g. "12.00 MiB/s". Negative rates show as zero.
pub fn format_rate(bytes_per_sec: f64) -> String {
    if !bytes_per_sec.is_finite() {
        return UNREADABLE.to_string();
    }
    format!("{}/s", format_scaled(bytes_per_sec.max(0.0)))
}

fn format_scaled(value: f64) -> String {
    let mut scaled = value;
    let mut unit = 0;
    while scaled >= KIB && unit < BYTE_UNITS.len() - 1 {
        scaled /= KIB;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", scaled.round() as u64, BYTE_UNITS[0])
    } else {
        format!("{:.2} {}", scaled, BYTE_UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_uses_binary_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KiB");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GiB");
    }

    #[test]
    fn format_bytes_stops_at_tebibytes() {
        let pib = 1024u64.pow(5);
        assert_eq!(format_bytes(pib), "1024.00 TiB");
    }

    #[test]
    fn network_zero_is_critical() {
        assert_eq!(network_throughput(0.0).severity, Severity::Critical);
        assert_eq!(network_throughput(0.0).text, "0 B/s");
    }

    #[test]
    fn network_thresholds() {
        assert_eq!(network_throughput(10.0 * MIB).severity, Severity::Normal);
        assert_eq!(network_throughput(100.0 * MIB).severity, Severity::Normal);
        assert_eq!(network_throughput(101.0 * MIB).severity, Severity::Caution);
        assert_eq!(network_throughput(121.0 * MIB).severity, Severity::Critical);
    }

    #[test]
    fn disk_io_zero_is_normal() {
        assert_eq!(disk_throughput(0.0).severity, Severity::Normal);
    }

    #[test]
    fn disk_io_thresholds() {
        assert_eq!(disk_throughput(400.0 * MIB).severity, Severity::Normal);
        assert_eq!(disk_throughput(600.0 * MIB).severity, Severity::Caution);
        assert_eq!(disk_throughput(1200.0 * MIB).severity, Severity::Critical);
        assert_eq!(disk_throughput(12.0 * MIB).text, "12.00 MiB/s");
    }

    #[test]
    fn non_finite_rates_are_flagged_not_zero() {
        for rate in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let net = network_throughput(rate);
            assert_eq!(net.severity, Severity::Critical);
            assert_eq!(net.text, "n/a");

            let disk = disk_throughput(rate);
            assert_eq!(disk.severity, Severity::Critical);
            assert_eq!(disk.text, "n/a");
        }
        assert_eq!(format_rate(f64::NAN), "n/a");
    }

    #[test]
    fn non_finite_load_is_flagged() {
        let c = load_average(f64::NAN, 4);
        assert_eq!(c.severity, Severity::Critical);
        assert_eq!(c.text, "n/a");
    }

    #[test]
    fn load_is_judged_per_core() {
        assert_eq!(load_average(2.0, 4).severity, Severity::Normal);
        assert_eq!(load_average(2.4, 4).severity, Severity::Caution);
        assert_eq!(load_average(3.2, 4).severity, Severity::Critical);
        assert_eq!(load_average(3.2, 4).text, "3.20");
    }

    #[test]
    fn load_with_unknown_cores_does_not_divide_by_zero() {
        assert_eq!(load_average(0.5, 0).severity, Severity::Normal);
        assert_eq!(load_average(0.9, 0).severity, Severity::Critical);
    }

    #[test]
    fn memory_thresholds() {
        assert_eq!(memory_usage(50, 100).severity, Severity::Normal);
        assert_eq!(memory_usage(75, 100).severity, Severity::Caution);
        assert_eq!(memory_usage(90, 100).severity, Severity::Critical);
        assert_eq!(memory_usage(1, 3).text, "33.3%");
    }

    #[test]
    fn disk_usage_thresholds() {
        assert_eq!(disk_usage(79, 100).severity, Severity::Normal);
        assert_eq!(disk_usage(80, 100).severity, Severity::Caution);
        assert_eq!(disk_usage(95, 100).severity, Severity::Critical);
    }

    #[test]
    fn usage_with_zero_total_is_normal() {
        let c = memory_usage(10, 0);
        assert_eq!(c.severity, Severity::Normal);
        assert_eq!(c.text, "0.0%");
    }

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Critical > Severity::Caution);
        assert!(Severity::Caution > Severity::Normal);
    }
}
