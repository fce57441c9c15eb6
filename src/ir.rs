use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Router,
    Switch,
    Firewall,
    Server,
    Hypervisor,
    Vpn,
    Storage,
    Unknown,
}

/// Cell size and spacing used when packing a device into its site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceMetrics {
    pub width: f32,
    pub height: f32,
    pub gap_x: f32,
    pub gap_y: f32,
}

const ROUTER_METRICS: DeviceMetrics = DeviceMetrics {
    width: 120.0,
    height: 70.0,
    gap_x: 40.0,
    gap_y: 40.0,
};
const SWITCH_METRICS: DeviceMetrics = DeviceMetrics {
    width: 130.0,
    height: 60.0,
    gap_x: 36.0,
    gap_y: 36.0,
};
const SERVER_METRICS: DeviceMetrics = DeviceMetrics {
    width: 120.0,
    height: 80.0,
    gap_x: 32.0,
    gap_y: 32.0,
};
const HYPERVISOR_METRICS: DeviceMetrics = DeviceMetrics {
    width: 180.0,
    height: 150.0,
    gap_x: 40.0,
    gap_y: 40.0,
};
const STORAGE_METRICS: DeviceMetrics = DeviceMetrics {
    width: 130.0,
    height: 80.0,
    gap_x: 32.0,
    gap_y: 32.0,
};

impl DeviceKind {
    pub fn from_type(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "router" => Self::Router,
            "switch" => Self::Switch,
            "firewall" => Self::Firewall,
            "server" => Self::Server,
            "hypervisor" => Self::Hypervisor,
            "vpn" => Self::Vpn,
            "storage" => Self::Storage,
            _ => Self::Unknown,
        }
    }

    /// Bucket used for sizing, grouping and ordering. Unknown types share the
    /// server bucket.
    pub fn layout_class(self) -> Self {
        match self {
            Self::Unknown => Self::Server,
            other => other,
        }
    }

    /// Group order inside a site, lowest first.
    pub fn priority(self) -> u8 {
        match self.layout_class() {
            Self::Router => 0,
            Self::Firewall => 1,
            Self::Vpn => 2,
            Self::Switch => 3,
            Self::Server | Self::Unknown => 4,
            Self::Hypervisor => 5,
            Self::Storage => 6,
        }
    }

    pub fn metrics(self) -> DeviceMetrics {
        match self.layout_class() {
            Self::Router | Self::Firewall | Self::Vpn => ROUTER_METRICS,
            Self::Switch => SWITCH_METRICS,
            Self::Hypervisor => HYPERVISOR_METRICS,
            Self::Storage => STORAGE_METRICS,
            Self::Server | Self::Unknown => SERVER_METRICS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Switch => "switch",
            Self::Firewall => "firewall",
            Self::Server => "server",
            Self::Hypervisor => "hypervisor",
            Self::Vpn => "vpn",
            Self::Storage => "storage",
            Self::Unknown => "unknown",
        }
    }

    pub fn all() -> [DeviceKind; 7] {
        [
            Self::Router,
            Self::Firewall,
            Self::Vpn,
            Self::Switch,
            Self::Server,
            Self::Hypervisor,
            Self::Storage,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Standard,
    Vpn,
    Trunk,
    San,
}

impl ConnectionKind {
    pub fn default_label(self) -> Option<&'static str> {
        match self {
            Self::Standard => None,
            Self::Vpn => Some("VPN"),
            Self::Trunk => Some("Trunk"),
            Self::San => Some("SAN"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Vpn => "vpn",
            Self::Trunk => "trunk",
            Self::San => "san",
        }
    }

    pub fn all() -> [ConnectionKind; 4] {
        [Self::Standard, Self::Vpn, Self::Trunk, Self::San]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(deserialize_with = "scalar_string")]
    pub to: String,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VpnLink {
    #[serde(deserialize_with = "scalar_string")]
    pub to_site: String,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachine {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub os: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(deserialize_with = "scalar_string")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "scalar_string")]
    pub device_type: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub os: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub hypervisor_type: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub virtual_machines: Vec<VirtualMachine>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub connections: Vec<Link>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub vpn_connections: Vec<VpnLink>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub trunk_connections: Vec<Link>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub san_connections: Vec<Link>,
}

impl Device {
    pub fn new(id: &str, device_type: &str) -> Self {
        Self {
            id: id.to_string(),
            device_type: device_type.to_string(),
            name: id.to_string(),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> DeviceKind {
        DeviceKind::from_type(&self.device_type)
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Device-to-device link lists, in routing order.
    pub fn device_links(&self) -> [(ConnectionKind, &[Link]); 3] {
        [
            (ConnectionKind::Standard, self.connections.as_slice()),
            (ConnectionKind::Trunk, self.trunk_connections.as_slice()),
            (ConnectionKind::San, self.san_connections.as_slice()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(deserialize_with = "scalar_string")]
    pub id: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub location: String,
    #[serde(deserialize_with = "nullable_list")]
    pub devices: Vec<Device>,
}

impl Site {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// First router in declaration order; the endpoint for VPN tunnels.
    pub fn gateway_router(&self) -> Option<&Device> {
        self.devices
            .iter()
            .find(|device| device.kind() == DeviceKind::Router)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub description: String,
    #[serde(deserialize_with = "nullable_list")]
    pub sites: Vec<Site>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device_count(&self) -> usize {
        self.sites.iter().map(|site| site.devices.len()).sum()
    }

    pub fn find_site(&self, id: &str) -> Option<&Site> {
        self.sites.iter().find(|site| site.id == id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(value) => value,
            Scalar::Integer(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
            Scalar::Bool(value) => value.to_string(),
        }
    }
}

// YAML happily turns `id: 10` or `ip: 10.0` into numbers; ids stay strings.
// Floats are lossy: the parser has already dropped their source text, so
// `model: 1.10` reads as "1.1" and `os: 2.0` as "2". Quote such values.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(Scalar::into_string).unwrap_or_default())
}

fn optional_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(Scalar::into_string))
}

fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_types_fall_into_server_bucket() {
        let kind = DeviceKind::from_type("gateway");
        assert_eq!(kind, DeviceKind::Unknown);
        assert_eq!(kind.layout_class(), DeviceKind::Server);
        assert_eq!(kind.priority(), DeviceKind::Server.priority());
        assert_eq!(kind.metrics(), DeviceKind::Server.metrics());
    }

    #[test]
    fn type_matching_ignores_case_and_padding() {
        assert_eq!(DeviceKind::from_type(" Router "), DeviceKind::Router);
        assert_eq!(DeviceKind::from_type("VPN"), DeviceKind::Vpn);
    }

    #[test]
    fn priority_follows_group_order() {
        let order: Vec<u8> = DeviceKind::all().iter().map(|kind| kind.priority()).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert!(DeviceKind::Firewall.priority() < DeviceKind::Switch.priority());
    }

    #[test]
    fn hypervisors_get_the_largest_cells() {
        let hv = DeviceKind::Hypervisor.metrics();
        for kind in DeviceKind::all() {
            let metrics = kind.metrics();
            assert!(hv.width >= metrics.width);
            assert!(hv.height >= metrics.height);
        }
    }

    #[test]
    fn gateway_router_is_first_router_in_order() {
        let mut site = Site::new("hq");
        site.devices.push(Device::new("fw1", "firewall"));
        site.devices.push(Device::new("r1", "router"));
        site.devices.push(Device::new("r2", "router"));
        assert_eq!(site.gateway_router().map(|d| d.id.as_str()), Some("r1"));

        let mut empty = Site::new("lab");
        empty.devices.push(Device::new("s1", "switch"));
        assert!(empty.gateway_router().is_none());
    }

    #[test]
    fn default_labels_per_kind() {
        assert_eq!(ConnectionKind::Standard.default_label(), None);
        assert_eq!(ConnectionKind::Vpn.default_label(), Some("VPN"));
        assert_eq!(ConnectionKind::Trunk.default_label(), Some("Trunk"));
        assert_eq!(ConnectionKind::San.default_label(), Some("SAN"));
    }

    #[test]
    fn unknown_kinds_sort_with_servers() {
        assert_eq!(DeviceKind::Unknown.priority(), DeviceKind::Server.priority());
        assert!(DeviceKind::Unknown.priority() < DeviceKind::Hypervisor.priority());
    }

    #[test]
    fn numeric_scalars_become_strings() {
        let yaml = "id: 10\ntype: server\nmodel: 1.10\nos: 2.0\nip: \"1.10\"\n";
        let device: Device = serde_yaml::from_str(yaml).expect("device");
        assert_eq!(device.id, "10");
        assert_eq!(device.model.as_deref(), Some("1.1"));
        assert_eq!(device.os.as_deref(), Some("2"));
        assert_eq!(device.ip.as_deref(), Some("1.10"));
    }
}
