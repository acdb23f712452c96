use std::fmt;

/// Which platform host serves an endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Host {
    /// Shopping API (cart, order, reservation)
    Api,
    /// Account API (user profile, address book)
    User,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Remote operations the racer performs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    UserDetail,
    AddressList,
    Cart,
    CartAllCheck,
    FlashSaleCheck,
    CheckOrder,
    ReserveTimes,
    SubmitOrder,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::UserDetail,
        Endpoint::AddressList,
        Endpoint::Cart,
        Endpoint::CartAllCheck,
        Endpoint::FlashSaleCheck,
        Endpoint::CheckOrder,
        Endpoint::ReserveTimes,
        Endpoint::SubmitOrder,
    ];

    pub fn host(&self) -> Host {
        match self {
            Endpoint::UserDetail | Endpoint::AddressList => Host::User,
            _ => Host::Api,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::UserDetail => "/api/v1/user/detail/",
            Endpoint::AddressList => "/api/v1/user/address/",
            Endpoint::Cart => "/cart/index",
            Endpoint::CartAllCheck => "/cart/allCheck",
            Endpoint::FlashSaleCheck => "/orderFlashSale/check",
            Endpoint::CheckOrder => "/order/checkOrder",
            Endpoint::ReserveTimes => "/order/getMultiReserveTime",
            Endpoint::SubmitOrder => "/order/addNewOrder",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::UserDetail
            | Endpoint::AddressList
            | Endpoint::Cart
            | Endpoint::CartAllCheck
            | Endpoint::FlashSaleCheck => HttpMethod::Get,
            Endpoint::CheckOrder | Endpoint::ReserveTimes | Endpoint::SubmitOrder => {
                HttpMethod::Post
            }
        }
    }

    /// Short action name, used as a log field and metric label
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::UserDetail => "user/detail",
            Endpoint::AddressList => "user/address",
            Endpoint::Cart => "cart/index",
            Endpoint::CartAllCheck => "cart/allCheck",
            Endpoint::FlashSaleCheck => "orderFlashSale/check",
            Endpoint::CheckOrder => "order/checkOrder",
            Endpoint::ReserveTimes => "order/getMultiReserveTime",
            Endpoint::SubmitOrder => "order/addNewOrder",
        }
    }

    /// Whether the endpoint needs the chosen address in its parameters
    pub fn needs_address(&self) -> bool {
        !matches!(self, Endpoint::UserDetail | Endpoint::AddressList)
    }

    pub fn is_submission(&self) -> bool {
        matches!(self, Endpoint::SubmitOrder)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
