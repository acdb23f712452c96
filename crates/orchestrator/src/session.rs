use arc_swap::{ArcSwap, ArcSwapOption};
use slotrace_api::{
    read_addresses, read_cart, read_order_price, read_reserve_times, read_user_id, ApiRequest,
    ClientProfile, RequestBuilder, SessionIdentity, SubmissionTag,
};
use slotrace_types::{
    Address, Cart, CartMode, Order, PackageOrder, PackageOrderContext, PayType, ReserveTime,
    WindowBounds,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::{ExecutionGateway, SessionError};

/// User selections applied when a session is prepared
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    pub profile: ClientProfile,
    pub pay_type: PayType,
    pub cart_mode: CartMode,
    /// Address book position used when no address is flagged as default
    pub address_index: usize,
}

/// Mutable order-construction state, published as whole snapshots
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub cart: Cart,
    pub order: Order,
    pub package_order: PackageOrder,
    /// Windows found by the last slot discovery
    pub windows: Vec<ReserveTime>,
}

/// One logged-in shopper: identity, selections and the live order state
///
/// State and the prebuilt request templates live in snapshot-swap cells.
/// Writers publish a complete new snapshot; readers get either the previous
/// or the new one, never a half-built value. Race participants take their
/// own copy of the package order, so nothing mutable is shared between them.
pub struct Session {
    gateway: Arc<ExecutionGateway>,
    identity: SessionIdentity,
    pay_type: PayType,
    cart_mode: CartMode,
    state: ArcSwap<SessionState>,
    check_order_template: ArcSwapOption<ApiRequest>,
    submit_templates: ArcSwap<HashMap<WindowBounds, ApiRequest>>,
}

impl Session {
    /// Resolve the user id and delivery address, then build the session
    pub async fn prepare(
        gateway: Arc<ExecutionGateway>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let mut identity = SessionIdentity {
            profile: options.profile,
            ..SessionIdentity::default()
        };

        let request = RequestBuilder::new(&identity).user_detail()?;
        let response = gateway.execute(&request).await?;
        identity.uid = read_user_id(&response.json()?)?;
        info!(uid = %identity.uid, "User profile loaded");

        let request = RequestBuilder::new(&identity).address_list()?;
        let response = gateway.execute(&request).await?;
        let addresses = read_addresses(&response.json()?)?;
        let address =
            choose_address(addresses, options.address_index).ok_or(SessionError::NoAddress)?;
        info!(
            address = %address.describe(),
            station_id = %address.station_id,
            "Delivery address chosen"
        );
        identity.address = Some(address);

        Ok(Self::new(
            gateway,
            identity,
            options.pay_type,
            options.cart_mode,
        ))
    }

    pub fn new(
        gateway: Arc<ExecutionGateway>,
        identity: SessionIdentity,
        pay_type: PayType,
        cart_mode: CartMode,
    ) -> Self {
        Self {
            gateway,
            identity,
            pay_type,
            cart_mode,
            state: ArcSwap::from_pointee(SessionState::default()),
            check_order_template: ArcSwapOption::empty(),
            submit_templates: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn gateway(&self) -> &Arc<ExecutionGateway> {
        &self.gateway
    }

    /// Current state snapshot
    pub fn snapshot(&self) -> Arc<SessionState> {
        self.state.load_full()
    }

    fn requests(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.identity)
    }

    fn package_context<'a>(&'a self, cart: &'a Cart) -> PackageOrderContext<'a> {
        PackageOrderContext {
            address_id: self
                .identity
                .address
                .as_ref()
                .map(|a| a.id.as_str())
                .unwrap_or_default(),
            parent_order_sign: &cart.parent_order_sign,
            pay_type: self.pay_type,
        }
    }

    /// Fetch the cart; its products become the order's products
    pub async fn fetch_cart(&self) -> Result<Cart, SessionError> {
        let request = self.requests().cart(self.cart_mode)?;
        let response = self.gateway.execute(&request).await?;
        let cart = read_cart(&response.json()?, self.cart_mode)?;

        self.state.rcu(|state| {
            let mut next = SessionState::clone(state);
            next.order.products = cart.products.clone();
            next.cart = cart.clone();
            next
        });
        debug!(products = cart.products.len(), count = cart.total_count(), "Cart fetched");
        Ok(cart)
    }

    /// Check every cart line for checkout
    pub async fn select_all(&self) -> Result<(), SessionError> {
        let request = self.requests().cart_all_check()?;
        self.gateway.execute(&request).await?;
        Ok(())
    }

    /// Delivery capacity probe
    pub async fn probe_capacity(&self) -> Result<(), SessionError> {
        let request = self.requests().flash_sale_check()?;
        self.gateway.execute(&request).await?;
        Ok(())
    }

    /// Build an order-check request from the current order products
    pub fn build_check_order_request(&self) -> Result<ApiRequest, SessionError> {
        let state = self.state.load();
        Ok(self.requests().check_order(&state.order)?)
    }

    /// Publish a fresh order-check template
    pub fn refresh_check_order_template(&self) -> Result<(), SessionError> {
        let request = self.build_check_order_request()?;
        self.check_order_template.store(Some(Arc::new(request)));
        Ok(())
    }

    /// Price the order; the package order is regenerated keeping its bound window
    pub async fn check_order(&self) -> Result<Order, SessionError> {
        let request = match self.check_order_template.load_full() {
            Some(template) => template,
            None => Arc::new(self.build_check_order_request()?),
        };

        let started = Instant::now();
        let response = self.gateway.execute(&request).await?;
        let price = read_order_price(&response.json()?)?;
        info!(
            price = %price,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Order checked"
        );

        let mut priced = Order::default();
        self.state.rcu(|state| {
            let mut next = SessionState::clone(state);
            next.order.price = price;
            next.package_order = state
                .package_order
                .regenerate(&next.order, &self.package_context(&next.cart));
            priced = next.order.clone();
            next
        });
        Ok(priced)
    }

    /// Discover open reservation windows for the current order
    pub async fn discover_windows(&self) -> Result<Vec<ReserveTime>, SessionError> {
        let request = {
            let state = self.state.load();
            self.requests().reserve_times(&state.order.products)?
        };

        let started = Instant::now();
        let response = self.gateway.execute(&request).await?;
        let windows = read_reserve_times(&response.json()?);
        info!(
            windows = windows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Reservation windows fetched"
        );

        self.state.rcu(|state| {
            let mut next = SessionState::clone(state);
            next.windows = windows.clone();
            next
        });
        Ok(windows)
    }

    /// Rebuild one submission template per discovered window from a single snapshot
    pub fn refresh_submit_templates(&self) -> Result<usize, SessionError> {
        let state = self.state.load_full();
        let mut templates = HashMap::with_capacity(state.windows.len());
        for window in &state.windows {
            let bound = state.package_order.with_window(window);
            templates.insert(window.bounds(), self.requests().submit_order(&bound)?);
        }
        let built = templates.len();
        self.submit_templates.store(Arc::new(templates));
        Ok(built)
    }

    pub fn submit_template(&self, bounds: WindowBounds) -> Option<ApiRequest> {
        self.submit_templates.load().get(&bounds).cloned()
    }

    /// Submit `package_order`, preferring the prebuilt template for its window
    pub async fn submit_order(
        &self,
        package_order: &PackageOrder,
    ) -> Result<SubmissionTag, SessionError> {
        let request = match self.submit_template(package_order.window()) {
            Some(template) => template,
            None => self.requests().submit_order(package_order)?,
        };
        let tag = request.tag.clone().unwrap_or_else(|| SubmissionTag {
            window: package_order.window().label(),
            price: package_order.price(),
        });

        self.gateway.execute(&request).await?;
        Ok(tag)
    }
}

/// The default address, else the one at `index`, else the first
fn choose_address(mut addresses: Vec<Address>, index: usize) -> Option<Address> {
    if let Some(position) = addresses.iter().position(|a| a.is_default) {
        return Some(addresses.swap_remove(position));
    }
    if index < addresses.len() {
        return Some(addresses.swap_remove(index));
    }
    addresses.into_iter().next()
}
