use serde::{Deserialize, Serialize};

/// Geographic part of a delivery address
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressLocation {
    /// Street-level description
    #[serde(default)]
    pub address: String,

    /// `[longitude, latitude]` when known
    #[serde(default)]
    pub location: Vec<f64>,
}

/// Delivery address from the user's address book
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: String,

    #[serde(default)]
    pub station_id: String,

    #[serde(default)]
    pub city_number: String,

    #[serde(default)]
    pub addr_detail: String,

    #[serde(default)]
    pub is_default: bool,

    #[serde(default)]
    pub location: AddressLocation,
}

impl Address {
    /// Longitude and latitude, only when the location carries exactly both
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match self.location.location.as_slice() {
            [longitude, latitude] => Some((*longitude, *latitude)),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        format!("{} {}", self.location.address, self.addr_detail)
    }
}

/// Payment channel used for the order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayType {
    Alipay,
    Wechat,
}

impl PayType {
    pub fn code(&self) -> i32 {
        match self {
            PayType::Alipay => 2,
            PayType::Wechat => 4,
        }
    }
}

impl Default for PayType {
    fn default() -> Self {
        PayType::Wechat
    }
}

impl std::str::FromStr for PayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alipay" => Ok(PayType::Alipay),
            "wechat" => Ok(PayType::Wechat),
            other => Err(format!("unknown payment type: {other}")),
        }
    }
}
