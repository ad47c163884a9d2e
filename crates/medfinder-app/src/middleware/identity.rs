use salvo::Depot;

use crate::app::api::response::render_error;
use crate::config::{AuthMethod, get_config_from_depot};
use medfinder_service::identity::{Caller, depot_keys};

/// ## Summary
/// Resolves the caller's identity and stores it in the depot.
///
/// In proxy mode the configured header carries the caller's pharmacy id. A
/// missing or unparsable header leaves the caller anonymous, so reads still
/// work and mutations are refused downstream.
///
/// ## Side Effects
/// Inserts a [`Caller`] under [`depot_keys::CALLER`].
///
/// ## Errors
/// Renders the HTTP 500 error envelope if the configuration is missing from
/// the depot.
#[salvo::async_trait]
impl salvo::Handler for IdentityMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        let config = match get_config_from_depot(depot) {
            Ok(cfg) => cfg,
            Err(e) => {
                render_error(res, &e);
                ctrl.skip_rest();
                return;
            }
        };

        let caller = match (config.auth.method, config.auth.proxy.as_ref()) {
            (AuthMethod::Proxy, Some(proxy)) => {
                match req.header::<String>(proxy.header.as_str()) {
                    Some(raw) => match uuid::Uuid::parse_str(raw.trim()) {
                        Ok(id) => Caller::Pharmacy(id),
                        Err(e) => {
                            tracing::warn!(error = %e, header = %proxy.header, "Ignoring malformed identity header");
                            Caller::Anonymous
                        }
                    },
                    None => Caller::Anonymous,
                }
            }
            _ => Caller::Anonymous,
        };

        tracing::trace!(?caller, "Caller resolved");
        depot.insert(depot_keys::CALLER, caller);
    }
}

/// ## Summary
/// Middleware handler that resolves caller identity.
pub struct IdentityMiddleware;
