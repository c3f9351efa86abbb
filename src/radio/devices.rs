use std::fs;
use std::io;
use std::path::Path;

pub const DEFAULT_DEVICE_DIR: &str = "/dev";
pub const DEFAULT_DEVICE_FILTER: &str = "tty.usb";

/// Names of the entries in `dir` containing `filter`, sorted.
pub fn list_devices(dir: &Path, filter: Option<&str>) -> io::Result<Vec<String>> {
    let mut devices = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if filter.map_or(true, |f| name.contains(f)) {
            devices.push(name);
        }
    }
    devices.sort();
    Ok(devices)
}
