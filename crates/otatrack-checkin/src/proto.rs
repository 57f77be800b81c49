//! Protobuf messages exchanged with the check-in endpoint
//!
//! Only the fields this crate reads or writes are declared; unknown fields in a
//! response are skipped by the decoder.

/// Build section of a check-in
#[derive(Clone, PartialEq, prost::Message)]
pub struct AndroidBuildProto {
    /// Build fingerprint
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    /// Build time in seconds since the epoch
    #[prost(int64, optional, tag = "7")]
    pub timestamp: Option<i64>,
    /// Device codename
    #[prost(string, optional, tag = "9")]
    pub device: Option<String>,
}

/// Device state reported in a check-in
#[derive(Clone, PartialEq, prost::Message)]
pub struct AndroidCheckinProto {
    /// Build being reported
    #[prost(message, optional, tag = "1")]
    pub build: Option<AndroidBuildProto>,
    /// Roaming descriptor, `WIFI::` for a Wi-Fi only handset
    #[prost(string, optional, tag = "8")]
    pub roaming: Option<String>,
    /// Android user number
    #[prost(int32, optional, tag = "9")]
    pub user_number: Option<i32>,
    /// Device type
    #[prost(int32, optional, tag = "12")]
    pub device_type: Option<i32>,
    /// Whether the handset can place voice calls
    #[prost(bool, optional, tag = "18")]
    pub voice_capable: Option<bool>,
}

/// Check-in request
#[derive(Clone, PartialEq, prost::Message)]
pub struct AndroidCheckinRequest {
    /// IMEI
    #[prost(string, optional, tag = "1")]
    pub imei: Option<String>,
    /// Android ID, zero for a first check-in
    #[prost(int64, optional, tag = "2")]
    pub id: Option<i64>,
    /// Digest of the last settings received
    #[prost(string, optional, tag = "3")]
    pub digest: Option<String>,
    /// Device state
    #[prost(message, optional, tag = "4")]
    pub checkin: Option<AndroidCheckinProto>,
    /// Locale such as `en-US`
    #[prost(string, optional, tag = "6")]
    pub locale: Option<String>,
    /// Hardware addresses
    #[prost(string, repeated, tag = "9")]
    pub mac_addr: Vec<String>,
    /// Olson time zone
    #[prost(string, optional, tag = "12")]
    pub time_zone: Option<String>,
    /// Protocol version
    #[prost(int32, optional, tag = "14")]
    pub version: Option<i32>,
    /// Hardware serial number
    #[prost(string, optional, tag = "16")]
    pub serial_number: Option<String>,
    /// Kind of each entry in `mac_addr`
    #[prost(string, repeated, tag = "19")]
    pub mac_addr_type: Vec<String>,
    /// Fragment number
    #[prost(int32, optional, tag = "20")]
    pub fragment: Option<i32>,
    /// Serial of the Android user
    #[prost(int32, optional, tag = "22")]
    pub user_serial_number: Option<i32>,
    /// Ask the endpoint to include system update settings
    #[prost(int32, optional, tag = "23")]
    pub fetch_system_updates: Option<i32>,
}

/// One name/value setting pushed by the endpoint
#[derive(Clone, PartialEq, prost::Message)]
pub struct GservicesSetting {
    /// Setting name
    #[prost(bytes = "vec", optional, tag = "1")]
    pub name: Option<Vec<u8>>,
    /// Setting value
    #[prost(bytes = "vec", optional, tag = "2")]
    pub value: Option<Vec<u8>>,
}

/// Check-in response
#[derive(Clone, PartialEq, prost::Message)]
pub struct AndroidCheckinResponse {
    /// Whether the reported statistics were accepted
    #[prost(bool, optional, tag = "1")]
    pub stats_ok: Option<bool>,
    /// Server time in milliseconds
    #[prost(int64, optional, tag = "3")]
    pub time_msec: Option<i64>,
    /// Digest of the settings in this response
    #[prost(string, optional, tag = "4")]
    pub digest: Option<String>,
    /// Settings for the device
    #[prost(message, repeated, tag = "5")]
    pub setting: Vec<GservicesSetting>,
    /// Android ID assigned to the device
    #[prost(fixed64, optional, tag = "7")]
    pub android_id: Option<u64>,
    /// Security token assigned to the device
    #[prost(fixed64, optional, tag = "8")]
    pub security_token: Option<u64>,
    /// Whether `setting` is a diff against the previous digest
    #[prost(bool, optional, tag = "9")]
    pub settings_diff: Option<bool>,
}
