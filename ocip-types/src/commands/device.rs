//! Shared device composites.

crate::entity! {
    /// A provisioned access device, reusable across requests and responses.
    pub struct AccessDevice: Type, "AccessDevice" {
        device_level, "deviceLevel": scalar(String), required;
        device_name, "deviceName": scalar(String), required;
    }
}
