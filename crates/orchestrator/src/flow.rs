use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    DaemonSet, FlowError, RaceControl, RaceReport, RaceSettings, Session, SlotRaceCoordinator,
};

/// One pass of the checkout sequence, ending in a slot race
///
/// Each step aborts the cycle on error, except the capacity probe whose
/// outcome is only logged. The pollers are started on the first successful
/// cart fetch and order check; later cycles reuse them.
pub struct FlowSequencer {
    session: Arc<Session>,
    daemons: Arc<DaemonSet>,
    coordinator: SlotRaceCoordinator,
}

impl FlowSequencer {
    pub fn new(session: Arc<Session>, control: Arc<RaceControl>, settings: &RaceSettings) -> Self {
        let daemons = Arc::new(DaemonSet::new(session.clone(), control.clone(), settings));
        let coordinator = SlotRaceCoordinator::new(
            session.clone(),
            control,
            daemons.clone(),
            settings.slot_multiplier,
        );
        Self {
            session,
            daemons,
            coordinator,
        }
    }

    pub async fn run_once(&self) -> Result<RaceReport, FlowError> {
        info!("Fetching cart");
        let cart = self
            .session
            .fetch_cart()
            .await
            .map_err(|e| FlowError::step("fetch cart", e))?;
        if cart.is_empty() {
            return Err(FlowError::NoValidProduct);
        }
        self.daemons.ensure_cart_poller();

        info!(products = cart.products.len(), "Selecting all cart items");
        self.session
            .select_all()
            .await
            .map_err(|e| FlowError::step("select cart items", e))?;

        info!("Probing delivery capacity");
        if let Err(error) = self.session.probe_capacity().await {
            debug!(error = %error, "Capacity probe failed");
        }

        info!("Checking order");
        self.session
            .check_order()
            .await
            .map_err(|e| FlowError::step("check order", e))?;
        self.daemons.ensure_check_order_poller();
        self.daemons.ensure_check_order_template();

        info!("Fetching reservation windows");
        let windows = self
            .session
            .discover_windows()
            .await
            .map_err(|e| FlowError::step("fetch reservation windows", e))?;
        if windows.is_empty() {
            return Err(FlowError::NoReserveTime);
        }

        Ok(self.coordinator.race(&windows).await?)
    }
}
