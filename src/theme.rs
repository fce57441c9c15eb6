use crate::ir::{ConnectionKind, DeviceKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub device_fill: String,
    pub device_border: String,
    pub router_accent: String,
    pub firewall_accent: String,
    pub vpn_accent: String,
    pub switch_accent: String,
    pub server_accent: String,
    pub hypervisor_accent: String,
    pub storage_accent: String,
    pub standard_line: String,
    pub trunk_line: String,
    pub san_line: String,
    pub vpn_line: String,
    pub edge_label_background: String,
    pub edge_label_border: String,
    pub handle_color: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 13.0,
            background: "#FFFFFF".to_string(),
            text_color: "#1F2937".to_string(),
            muted_text_color: "#6B7280".to_string(),
            device_fill: "#FFFFFF".to_string(),
            device_border: "#9CA3AF".to_string(),
            router_accent: "#2563EB".to_string(),
            firewall_accent: "#DC2626".to_string(),
            vpn_accent: "#7C3AED".to_string(),
            switch_accent: "#059669".to_string(),
            server_accent: "#4B5563".to_string(),
            hypervisor_accent: "#D97706".to_string(),
            storage_accent: "#0891B2".to_string(),
            standard_line: "#4B5563".to_string(),
            trunk_line: "#1F2937".to_string(),
            san_line: "#0891B2".to_string(),
            vpn_line: "#F59E0B".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            edge_label_border: "#D1D5DB".to_string(),
            handle_color: "#EF4444".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            background: "#F8FAFC".to_string(),
            text_color: "#0F172A".to_string(),
            muted_text_color: "#64748B".to_string(),
            device_fill: "#FFFFFF".to_string(),
            device_border: "#CBD5E1".to_string(),
            router_accent: "#3B82F6".to_string(),
            firewall_accent: "#EF4444".to_string(),
            vpn_accent: "#8B5CF6".to_string(),
            switch_accent: "#10B981".to_string(),
            server_accent: "#64748B".to_string(),
            hypervisor_accent: "#F59E0B".to_string(),
            storage_accent: "#06B6D4".to_string(),
            standard_line: "#64748B".to_string(),
            trunk_line: "#334155".to_string(),
            san_line: "#06B6D4".to_string(),
            vpn_line: "#F97316".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            edge_label_border: "#E2E8F0".to_string(),
            handle_color: "#F43F5E".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "classic" | "default" => Some(Self::classic()),
            "modern" => Some(Self::modern()),
            _ => None,
        }
    }

    pub fn device_accent(&self, kind: DeviceKind) -> &str {
        match kind.layout_class() {
            DeviceKind::Router => &self.router_accent,
            DeviceKind::Firewall => &self.firewall_accent,
            DeviceKind::Vpn => &self.vpn_accent,
            DeviceKind::Switch => &self.switch_accent,
            DeviceKind::Hypervisor => &self.hypervisor_accent,
            DeviceKind::Storage => &self.storage_accent,
            DeviceKind::Server | DeviceKind::Unknown => &self.server_accent,
        }
    }

    pub fn line_color(&self, kind: ConnectionKind) -> &str {
        match kind {
            ConnectionKind::Standard => &self.standard_line,
            ConnectionKind::Trunk => &self.trunk_line,
            ConnectionKind::San => &self.san_line,
            ConnectionKind::Vpn => &self.vpn_line,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
