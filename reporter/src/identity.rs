use crate::notice::{Notice, NoticeSender};

use std::fs;
use std::path::Path;

use uuid::Uuid;

const MODEL_SOURCES: [&str; 2] = [
    "/sys/firmware/devicetree/base/model",
    "/sys/devices/virtual/dmi/id/product_name",
];

/// Who is reporting: resolved once and fixed for the life of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub device_id: String,
    pub model: String,
}

impl DeviceInfo {
    pub fn resolve(
        id_override: Option<&str>,
        id_file: &Path,
        model_override: Option<&str>,
        notices: &NoticeSender,
    ) -> DeviceInfo {
        let device_id = match id_override {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            Some(_) => {
                let _ = notices.send(Notice::DeviceIdUnavailable);
                persistent_id(id_file)
            }
            None => persistent_id(id_file),
        };

        let model = match model_override {
            Some(m) if !m.trim().is_empty() => m.trim().to_string(),
            _ => detect_model(&MODEL_SOURCES),
        };

        DeviceInfo { device_id, model }
    }
}

/*
 * Read the device id from `path`. If the file is missing or does not hold a
 * valid UUID, a new one is generated and written back. A failed write still
 * yields the generated id; it just won't survive a restart.
 */
pub fn persistent_id(path: &Path) -> String {
    if let Ok(contents) = fs::read_to_string(path) {
        match Uuid::parse_str(contents.trim()) {
            Ok(id) => return id.to_string(),
            Err(e) => log::debug!("ignoring invalid device id in {}: {}", path.display(), e),
        }
    }

    let id = Uuid::new_v4().to_string();

    if let Err(e) = fs::write(path, &id) {
        log::warn!("could not persist device id to {}: {}", path.display(), e);
    }

    id
}

pub fn detect_model(sources: &[&str]) -> String {
    for source in sources {
        if let Ok(raw) = fs::read_to_string(source) {
            // devicetree strings are NUL terminated
            let model = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            if !model.is_empty() {
                return model.to_string();
            }
        }
    }

    String::from("unknown")
}
