use serde::Serialize;

/// Информация об устройстве по sysObjectID
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub device_type: String,
    pub description: String,
}

impl DeviceInfo {
    pub fn generic() -> Self {
        Self {
            device_type: "generic".to_string(),
            description: "Unknown Device".to_string(),
        }
    }
}

/// Известные enterprise-ветки производителей PDU/UPS
const VENDORS: &[(&str, &str, &str)] = &[
    ("1.3.6.1.4.1.318.", "apc", "APC / Schneider Electric"),
    ("1.3.6.1.4.1.534.", "eaton", "Eaton"),
    ("1.3.6.1.4.1.13742.", "raritan", "Raritan PDU"),
    ("1.3.6.1.4.1.21239.", "vertiv", "Vertiv / Geist PDU"),
    ("1.3.6.1.4.1.1718.", "servertech", "Server Technology PDU"),
    ("1.3.6.1.4.1.3808.", "cyberpower", "CyberPower"),
    ("1.3.6.1.4.1.850.", "tripplite", "Tripp Lite"),
    ("1.3.6.1.4.1.8072.", "linux", "Linux Net-SNMP Agent"),
];

/// Детектор типа устройства
pub struct DeviceDetector;

impl DeviceDetector {
    /// Определяет производителя по sysObjectID (ведущая точка допускается)
    pub fn detect_device_type(sys_object_id: &str) -> DeviceInfo {
        let oid = sys_object_id.trim().trim_start_matches('.');

        VENDORS
            .iter()
            .find(|(prefix, _, _)| oid.starts_with(prefix))
            .map(|(_, device_type, description)| DeviceInfo {
                device_type: device_type.to_string(),
                description: description.to_string(),
            })
            .unwrap_or_else(DeviceInfo::generic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_apc_rack_pdu() {
        let info = DeviceDetector::detect_device_type(".1.3.6.1.4.1.318.1.3.4.6");
        assert_eq!(info.device_type, "apc");
    }

    #[test]
    fn prefix_must_end_on_arc_boundary() {
        assert_eq!(
            DeviceDetector::detect_device_type("1.3.6.1.4.1.3180.1").device_type,
            "generic"
        );
        assert_eq!(DeviceDetector::detect_device_type("").device_type, "generic");
    }
}
