const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Human-readable byte count: whole units up to GB, one decimal in TB.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{size:.0} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}
