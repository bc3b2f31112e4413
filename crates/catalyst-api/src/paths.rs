// Controller resource paths.
//
// Intent API (`/dna/intent/...`) serves inventory; the assurance data API
// (`/dna/data/...`) serves client telemetry with time-windowed queries.

pub const NETWORK_DEVICES: &str = "/dna/intent/api/v1/network-device";
pub const SITES: &str = "/dna/intent/api/v1/site";
pub const CLIENTS: &str = "/dna/data/api/v1/clients";
pub const CLIENT_COUNT: &str = "/dna/data/api/v1/clients/count";

/// Interfaces of one network device.
pub fn device_interfaces(device_id: &str) -> String {
    format!("/dna/intent/api/v1/interface/network-device/{device_id}")
}

/// A single client, addressed by MAC address.
pub fn client(mac: &str) -> String {
    format!("{CLIENTS}/{mac}")
}
